use crate::cli::opts::ImportCmd;
use anyhow::{Context, Result};
use cardlux_core::{CardFilter, CardKind, Catalog, Difficulty, Register, Topic};
use cardlux_json::JsonStore;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct VocabularyRow {
    front: String,
    back: String,
    difficulty: u8,
    topic: String,
}

#[derive(Debug, Deserialize)]
struct PhraseRow {
    front: String,
    back: String,
    difficulty: u8,
    topic: String,
    register: Option<String>,
}

#[derive(Debug, Default)]
struct ImportReport {
    imported: usize,
    skipped: usize,
    errors: Vec<String>,
}

impl ImportReport {
    fn print(&self, dry_run: bool) {
        let verb = if dry_run { "would import" } else { "imported" };
        println!("{} {}, skipped {} duplicate(s)", verb, self.imported, self.skipped);
        for e in &self.errors {
            println!("error: {e}");
        }
    }
}

pub async fn import_cmd(store: Arc<JsonStore>, cmd: ImportCmd) -> Result<()> {
    match cmd {
        ImportCmd::Vocabulary { path, dry_run } => {
            let report = import_vocabulary(store, &path, dry_run).await?;
            report.print(dry_run);
        }
        ImportCmd::Phrases { path, dry_run } => {
            let report = import_phrases(store, &path, dry_run).await?;
            report.print(dry_run);
        }
    }
    Ok(())
}

/// Vocabulary cannot be advanced; an advanced row is capped at intermediate
/// rather than rejected, matching how the catalog pipeline has always
/// handled over-graded word lists.
fn vocabulary_difficulty(level: u8) -> Result<Difficulty, String> {
    let d = Difficulty::from_level(level)
        .ok_or_else(|| format!("difficulty {level} is not 1, 2, or 3"))?;
    Ok(match d {
        Difficulty::Advanced => Difficulty::Intermediate,
        other => other,
    })
}

fn parse_register(raw: Option<&str>) -> Result<Register, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Register::Neutral),
        Some("neutral") => Ok(Register::Neutral),
        Some("formal") => Ok(Register::Formal),
        Some("informal") => Ok(Register::Informal),
        Some(other) => Err(format!("unknown register: {other}")),
    }
}

async fn import_vocabulary(
    store: Arc<JsonStore>,
    path: &Path,
    dry_run: bool,
) -> Result<ImportReport> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let mut seen = existing_pairs(&store).await?;
    let mut topics = TopicCache::default();
    let mut report = ImportReport::default();

    for (idx, rec) in rdr.deserialize::<VocabularyRow>().enumerate() {
        let line = idx + 2; // header is line 1
        let row = match rec {
            Ok(r) => r,
            Err(e) => {
                report.errors.push(format!("line {line}: {e}"));
                continue;
            }
        };
        if row.front.trim().is_empty() || row.back.trim().is_empty() {
            report.errors.push(format!("line {line}: empty front or back"));
            continue;
        }
        let difficulty = match vocabulary_difficulty(row.difficulty) {
            Ok(d) => d,
            Err(e) => {
                report.errors.push(format!("line {line}: {e}"));
                continue;
            }
        };
        let pair = (row.front.trim().to_string(), row.back.trim().to_string());
        if !seen.insert(pair.clone()) {
            report.skipped += 1;
            continue;
        }

        if !dry_run {
            let topic = topics.ensure(&store, &row.topic).await?;
            store
                .add_card(topic.id, &pair.0, &pair.1, difficulty, CardKind::Vocabulary)
                .await?;
        }
        report.imported += 1;
    }

    info!(file = %path.display(), imported = report.imported, "vocabulary import finished");
    Ok(report)
}

async fn import_phrases(
    store: Arc<JsonStore>,
    path: &Path,
    dry_run: bool,
) -> Result<ImportReport> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let mut seen = existing_pairs(&store).await?;
    let mut topics = TopicCache::default();
    let mut report = ImportReport::default();

    for (idx, rec) in rdr.deserialize::<PhraseRow>().enumerate() {
        let line = idx + 2;
        let row = match rec {
            Ok(r) => r,
            Err(e) => {
                report.errors.push(format!("line {line}: {e}"));
                continue;
            }
        };
        if row.front.trim().is_empty() || row.back.trim().is_empty() {
            report.errors.push(format!("line {line}: empty front or back"));
            continue;
        }
        if Difficulty::from_level(row.difficulty).is_none() {
            report
                .errors
                .push(format!("line {line}: difficulty {} is not 1, 2, or 3", row.difficulty));
            continue;
        }
        let register = match parse_register(row.register.as_deref()) {
            Ok(r) => r,
            Err(e) => {
                report.errors.push(format!("line {line}: {e}"));
                continue;
            }
        };
        let pair = (row.front.trim().to_string(), row.back.trim().to_string());
        if !seen.insert(pair.clone()) {
            report.skipped += 1;
            continue;
        }

        if !dry_run {
            let topic = topics.ensure(&store, &row.topic).await?;
            // Phrases are advanced by definition, whatever the row says.
            store
                .add_card(
                    topic.id,
                    &pair.0,
                    &pair.1,
                    Difficulty::Advanced,
                    CardKind::Phrase { register },
                )
                .await?;
        }
        report.imported += 1;
    }

    info!(file = %path.display(), imported = report.imported, "phrase import finished");
    Ok(report)
}

async fn existing_pairs(store: &JsonStore) -> Result<HashSet<(String, String)>> {
    let filter = CardFilter {
        include_suspended: true,
        ..CardFilter::default()
    };
    Ok(store
        .list_cards(&filter)
        .await?
        .into_iter()
        .map(|c| (c.front, c.back))
        .collect())
}

#[derive(Default)]
struct TopicCache {
    by_name: HashMap<String, Topic>,
}

impl TopicCache {
    async fn ensure(&mut self, store: &JsonStore, name: &str) -> Result<Topic> {
        let key = name.trim().to_lowercase();
        if let Some(t) = self.by_name.get(&key) {
            return Ok(t.clone());
        }
        let topic = match store.find_topic(name.trim()).await? {
            Some(t) => t,
            None => store.create_topic(name.trim(), "").await?,
        };
        self.by_name.insert(key, topic.clone());
        Ok(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advanced_vocabulary_rows_are_capped() {
        assert_eq!(vocabulary_difficulty(1).unwrap(), Difficulty::Beginner);
        assert_eq!(vocabulary_difficulty(2).unwrap(), Difficulty::Intermediate);
        assert_eq!(vocabulary_difficulty(3).unwrap(), Difficulty::Intermediate);
        assert!(vocabulary_difficulty(4).is_err());
    }

    #[test]
    fn register_parsing_defaults_to_neutral() {
        assert_eq!(parse_register(None).unwrap(), Register::Neutral);
        assert_eq!(parse_register(Some("")).unwrap(), Register::Neutral);
        assert_eq!(parse_register(Some("formal")).unwrap(), Register::Formal);
        assert_eq!(parse_register(Some("informal")).unwrap(), Register::Informal);
        assert!(parse_register(Some("slang")).is_err());
    }

    async fn store_in(dir: &Path) -> Arc<JsonStore> {
        Arc::new(
            JsonStore::open_with(dir.join("cardlux.json"), dir.join("backups"), 2)
                .await
                .unwrap(),
        )
    }

    fn write_csv(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn vocabulary_file_imports_and_skips_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let csv = write_csv(
            dir.path(),
            "vocab.csv",
            "front,back,difficulty,topic\n\
             Moien,hello,1,Greetings\n\
             Kaz,cat,3,Animals\n\
             Moien,hello,1,Greetings\n",
        );

        let report = import_vocabulary(store.clone(), &csv, false).await.unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 1);
        assert!(report.errors.is_empty());

        let cards = store.list_cards(&CardFilter::active()).await.unwrap();
        assert_eq!(cards.len(), 2);
        // Level-3 vocabulary row is capped on the way in.
        let kaz = cards.iter().find(|c| c.front == "Kaz").unwrap();
        assert_eq!(kaz.difficulty, Difficulty::Intermediate);
        assert!(store.find_topic("Greetings").await.unwrap().is_some());
        assert!(store.find_topic("Animals").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn bad_rows_are_reported_with_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let csv = write_csv(
            dir.path(),
            "vocab.csv",
            "front,back,difficulty,topic\n\
             Moien,hello,1,Greetings\n\
             Haus,house,9,Home\n\
             Kaz,,1,Animals\n",
        );

        let report = import_vocabulary(store.clone(), &csv, false).await.unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("line 3:"));
        assert!(report.errors[1].starts_with("line 4:"));

        let cards = store.list_cards(&CardFilter::active()).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].front, "Moien");
    }

    #[tokio::test]
    async fn dry_run_counts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let csv = write_csv(
            dir.path(),
            "vocab.csv",
            "front,back,difficulty,topic\n\
             Moien,hello,1,Greetings\n\
             Kaz,cat,2,Animals\n",
        );

        let report = import_vocabulary(store.clone(), &csv, true).await.unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 0);

        assert!(store.list_cards(&CardFilter::active()).await.unwrap().is_empty());
        assert!(store.list_topics().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn phrase_rows_are_forced_advanced() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let csv = write_csv(
            dir.path(),
            "phrases.csv",
            "front,back,difficulty,topic,register\n\
             Wéi geet et?,How are you?,1,Phrases,formal\n\
             Gudde Moien,Good morning,2,Phrases,\n",
        );

        let report = import_phrases(store.clone(), &csv, false).await.unwrap();
        assert_eq!(report.imported, 2);
        assert!(report.errors.is_empty());

        let cards = store.list_cards(&CardFilter::active()).await.unwrap();
        assert_eq!(cards.len(), 2);
        assert!(cards.iter().all(|c| c.difficulty == Difficulty::Advanced));
        let formal = cards.iter().find(|c| c.front == "Wéi geet et?").unwrap();
        assert_eq!(formal.kind, CardKind::Phrase { register: Register::Formal });
        let plain = cards.iter().find(|c| c.front == "Gudde Moien").unwrap();
        assert_eq!(plain.kind, CardKind::Phrase { register: Register::Neutral });
    }

    #[tokio::test]
    async fn reimport_skips_rows_already_in_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let csv = write_csv(
            dir.path(),
            "vocab.csv",
            "front,back,difficulty,topic\n\
             Moien,hello,1,Greetings\n",
        );

        let first = import_vocabulary(store.clone(), &csv, false).await.unwrap();
        assert_eq!(first.imported, 1);

        let second = import_vocabulary(store.clone(), &csv, false).await.unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(store.list_cards(&CardFilter::active()).await.unwrap().len(), 1);
    }
}
