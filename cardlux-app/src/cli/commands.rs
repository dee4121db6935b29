use crate::cli::import;
use crate::cli::opts::*;

use anyhow::{anyhow, bail, Context, Result};
use cardlux_core::{
    filter_by_review_status, filter_by_text, CardFilter, CardKind, Catalog, Difficulty,
    Direction, InputMode, MatchQuality, ProgressStore, Register, ReviewStatus, StudyConfig,
    StudyEngine, Topic, UserId,
};
use cardlux_json::JsonStore;
use chrono::Utc;
use std::collections::HashMap;
use std::io::{stdin, stdout, Write};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

pub async fn run_cli(args: Cli) -> Result<()> {
    let store = open_store(args.store_path.clone()).await?;
    let user = user_id(&args.user);
    let config = StudyConfig {
        almost_counts_as_correct: args.almost_counts,
        ..StudyConfig::default()
    };

    match args.cmd.clone() {
        Command::Topic(cmd) => topic_cmd(store, cmd).await,
        Command::Card(cmd) => card_cmd(store, cmd).await,
        Command::Import(cmd) => import::import_cmd(store, cmd).await,
        Command::Study(cmd) => study_cmd(store, user, config, cmd).await,
        Command::Stats => stats_cmd(store, user).await,
    }
}

pub async fn open_store(path: Option<PathBuf>) -> Result<Arc<JsonStore>> {
    let store = match path {
        Some(p) => {
            let backups = p
                .parent()
                .map(|d| d.join("backups"))
                .unwrap_or_else(|| PathBuf::from("backups"));
            JsonStore::open_with(p, backups, 10).await?
        }
        None => JsonStore::open_default().await?,
    };
    Ok(Arc::new(store))
}

/// Stable per-name user id; no accounts, just a namespace-derived uuid.
pub fn user_id(name: &str) -> UserId {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.trim().to_lowercase().as_bytes())
}

async fn topic_cmd(store: Arc<JsonStore>, cmd: TopicCmd) -> Result<()> {
    match cmd {
        TopicCmd::Add { name, description } => {
            let t = store.create_topic(&name, &description).await?;
            println!("{}", t.id);
        }
        TopicCmd::List => {
            for t in store.list_topics().await? {
                let count = store.topic_card_count(t.id).await?;
                println!("{}\t{}\t{} card(s)", t.id, t.name, count);
            }
        }
        TopicCmd::Rm { topic } => {
            let t = resolve_topic(&*store, &topic).await?;
            store.delete_topic(t.id).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn card_cmd(store: Arc<JsonStore>, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add(a) => {
            let topic = resolve_topic(&*store, &a.topic).await?;
            let difficulty = Difficulty::from_level(a.difficulty)
                .ok_or_else(|| anyhow!("difficulty must be 1, 2, or 3"))?;
            let kind = match a.kind {
                KindArg::Vocabulary => CardKind::Vocabulary,
                KindArg::Phrase => CardKind::Phrase {
                    register: a.register.map(to_register).unwrap_or_default(),
                },
            };
            let c = store
                .add_card(topic.id, &a.front, &a.back, difficulty, kind)
                .await?;
            println!("{}", c.id);
        }
        CardCmd::List { topic, search } => {
            let filter = if let Some(sel) = topic {
                CardFilter::in_topic(resolve_topic(&*store, &sel).await?.id)
            } else {
                CardFilter {
                    include_suspended: true,
                    ..CardFilter::default()
                }
            };
            let mut cards = store.list_cards(&filter).await?;
            if let Some(q) = search {
                cards = filter_by_text(&cards, &q);
            }
            for c in cards {
                let kind = match &c.kind {
                    CardKind::Vocabulary => "vocabulary".to_string(),
                    CardKind::Phrase { register } => format!("phrase/{register:?}").to_lowercase(),
                };
                println!(
                    "{}\t{}\t{}\tlevel={}\t{}\tsuspended={}",
                    c.id,
                    c.front,
                    c.back,
                    c.difficulty.as_level(),
                    kind,
                    c.suspended
                );
            }
        }
        CardCmd::Rm { card_id } => {
            let id = parse_uuid(&card_id)?;
            store.delete_card(id).await?;
            println!("ok");
        }
        CardCmd::Edit(e) => {
            let id = parse_uuid(&e.card_id)?;
            let mut card = store.get_card(id).await?;

            if let Some(f) = e.front {
                card.front = f;
            }
            if let Some(b) = e.back {
                card.back = b;
            }
            if let Some(level) = e.difficulty {
                card.difficulty = Difficulty::from_level(level)
                    .ok_or_else(|| anyhow!("difficulty must be 1, 2, or 3"))?;
            }

            if e.suspend && e.unsuspend {
                bail!("cannot use --suspend and --unsuspend together");
            } else if e.suspend {
                card.suspended = true;
            } else if e.unsuspend {
                card.suspended = false;
            }

            let _ = store.update_card(&card).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn study_cmd(
    store: Arc<JsonStore>,
    user: UserId,
    config: StudyConfig,
    cmd: StudyCmd,
) -> Result<()> {
    let topic = match &cmd.topic {
        Some(sel) => Some(resolve_topic(&*store, sel).await?.id),
        None => None,
    };
    let direction = match cmd.direction {
        DirectionArg::FrontToBack => Direction::FrontToBack,
        DirectionArg::BackToFront => Direction::BackToFront,
    };

    let engine = StudyEngine::new(store, config);
    let mut session = engine.select_session(user, topic, cmd.size).await?;
    if session.cards.is_empty() {
        println!("no cards to study");
        return Ok(());
    }

    while let Some(card) = session.current().cloned() {
        let prompt = engine.present_card(&card, direction).await?;
        println!("\n[{}/{}]", session.position + 1, session.cards.len());
        println!("Q: {}", prompt.question);

        let (input_mode, answer) = match prompt.input_mode {
            InputMode::MultipleChoice => {
                let options = prompt.options.context("multiple choice without options")?;
                for (i, opt) in options.iter().enumerate() {
                    println!("  {}) {}", i + 1, opt);
                }
                let picked = loop {
                    let line = read_line("choice (or q)> ")?;
                    let t = line.trim();
                    if t.eq_ignore_ascii_case("q") {
                        return finish(&session);
                    }
                    if let Ok(n) = t.parse::<usize>() {
                        if (1..=options.len()).contains(&n) {
                            break options[n - 1].clone();
                        }
                    }
                    println!("enter 1-{} or q", options.len());
                };
                (InputMode::MultipleChoice, picked)
            }
            InputMode::TextInput => {
                let line = read_line("answer (or q)> ")?;
                let t = line.trim();
                if t.eq_ignore_ascii_case("q") {
                    return finish(&session);
                }
                (InputMode::TextInput, t.to_string())
            }
        };

        let outcome = engine.submit_answer(&card, direction, input_mode, &answer);
        match outcome.match_quality {
            MatchQuality::Exact => println!("✓ correct"),
            MatchQuality::Close => {
                println!("~ almost: {}", outcome.expected_answer);
            }
            MatchQuality::Incorrect => {
                println!("✗ wrong, expected: {}", outcome.expected_answer);
            }
        }

        let progress = engine
            .record_outcome(user, &card, direction, &answer, outcome.match_quality)
            .await?;
        println!("→ next review in {} day(s)", progress.interval_days);

        session.advance(outcome.is_correct);
    }

    finish(&session)
}

fn finish(session: &cardlux_core::SessionState) -> Result<()> {
    println!(
        "\nsession done: {} correct, {} incorrect",
        session.correct, session.incorrect
    );
    Ok(())
}

async fn stats_cmd(store: Arc<JsonStore>, user: UserId) -> Result<()> {
    let now = Utc::now();
    let cards = store.list_cards(&CardFilter::active()).await?;
    let progress = store.list_progress(user).await?;
    let by_card: HashMap<_, _> = progress.into_iter().map(|p| (p.card_id, p)).collect();

    let due = filter_by_review_status(&cards, &by_card, now, ReviewStatus::Due).len();
    let fresh = filter_by_review_status(&cards, &by_card, now, ReviewStatus::New).len();

    match store.get_stats(user).await? {
        Some(s) => {
            println!("cards studied:   {}", s.cards_studied);
            println!("correct:         {}", s.total_correct);
            println!("incorrect:       {}", s.total_incorrect);
            println!("accuracy:        {:.0}%", s.accuracy() * 100.0);
            println!("current streak:  {} day(s)", s.current_streak);
            println!("longest streak:  {} day(s)", s.longest_streak);
        }
        None => println!("no reviews yet"),
    }
    println!("due now:         {due}");
    println!("never seen:      {fresh}");

    for topic in store.list_topics().await? {
        if let Some(tp) = store.get_topic_progress(user, topic.id).await? {
            let total = store.topic_card_count(topic.id).await?;
            let done = if tp.completed_at.is_some() { " (completed)" } else { "" };
            println!("topic {}: {}/{} seen{}", topic.name, tp.cards_seen, total, done);
        }
    }
    Ok(())
}

// ===== Helpers =====

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| anyhow!("invalid uuid"))
}

async fn resolve_topic<C: Catalog + ?Sized>(catalog: &C, sel: &str) -> Result<Topic> {
    if let Ok(id) = Uuid::parse_str(sel) {
        if let Ok(t) = catalog.get_topic(id).await {
            return Ok(t);
        }
    }
    if let Some(t) = catalog.find_topic(sel).await? {
        return Ok(t);
    }
    bail!("topic not found: {}", sel)
}

fn to_register(r: RegisterArg) -> Register {
    match r {
        RegisterArg::Neutral => Register::Neutral,
        RegisterArg::Formal => Register::Formal,
        RegisterArg::Informal => Register::Informal,
    }
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    stdin().read_line(&mut s)?;
    Ok(s)
}
