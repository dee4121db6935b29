use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    FrontToBack,
    BackToFront,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Vocabulary,
    Phrase,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RegisterArg {
    Neutral,
    Formal,
    Informal,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "cardlux", version, about = "Cardlux spaced-repetition CLI")]
pub struct Cli {
    /// Store file (defaults to the app data dir)
    #[arg(long)]
    pub store_path: Option<PathBuf>,

    /// Learner name; progress and stats are tracked per user
    #[arg(long, default_value = "default")]
    pub user: String,

    /// Count near-miss (typo) answers as correct for scheduling
    #[arg(long)]
    pub almost_counts: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Topic operations
    #[command(subcommand)]
    Topic(TopicCmd),
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// Import cards from CSV
    #[command(subcommand)]
    Import(ImportCmd),
    /// Run an interactive study session
    Study(StudyCmd),
    /// Show learning statistics
    Stats,
}

#[derive(Debug, Subcommand, Clone)]
pub enum TopicCmd {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List,
    Rm {
        topic: String,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    List {
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    Rm {
        card_id: String,
    },
    Edit(CardEdit),
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub topic: String,
    #[arg(long)]
    pub front: String,
    #[arg(long)]
    pub back: String,
    /// 1=beginner, 2=intermediate, 3=advanced
    #[arg(long, default_value_t = 1)]
    pub difficulty: u8,
    #[arg(long, value_enum, default_value_t = KindArg::Vocabulary)]
    pub kind: KindArg,
    /// Phrase register (phrases only)
    #[arg(long, value_enum)]
    pub register: Option<RegisterArg>,
}

#[derive(Debug, Args, Clone)]
pub struct CardEdit {
    pub card_id: String,
    #[arg(long)]
    pub front: Option<String>,
    #[arg(long)]
    pub back: Option<String>,
    /// 1=beginner, 2=intermediate, 3=advanced
    #[arg(long)]
    pub difficulty: Option<u8>,
    #[arg(long)]
    pub suspend: bool,
    #[arg(long)]
    pub unsuspend: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImportCmd {
    /// Vocabulary CSV: front,back,difficulty,topic
    Vocabulary {
        path: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Phrase CSV: front,back,difficulty,topic,register
    Phrases {
        path: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Args, Clone)]
pub struct StudyCmd {
    #[arg(long)]
    pub topic: Option<String>,
    #[arg(long, default_value_t = cardlux_core::DEFAULT_SESSION_SIZE)]
    pub size: usize,
    #[arg(long, value_enum, default_value_t = DirectionArg::FrontToBack)]
    pub direction: DirectionArg,
}
