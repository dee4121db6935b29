use async_trait::async_trait;
use cardlux_core::{
    Card, CardFilter, CardId, CardKind, Catalog, CoreError, Difficulty, OutcomeWrite,
    ProgressRecord, ProgressStore, ReviewEvent, Topic, TopicId, TopicProgress, UserId, UserStats,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;
use tracing::debug;

pub mod paths;

const FILE_VERSION: u32 = 1;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    topics: Vec<Topic>,
    cards: Vec<Card>,
    progress: Vec<ProgressRecord>,
    reviews: Vec<ReviewEvent>,
    stats: Vec<UserStats>,
    topic_progress: Vec<TopicProgress>,
}

#[derive(Default, Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    topics: HashMap<TopicId, Topic>,
    cards: HashMap<CardId, Card>,
    progress: HashMap<(UserId, CardId), ProgressRecord>,
    reviews: Vec<ReviewEvent>,
    stats: HashMap<UserId, UserStats>,
    topic_progress: HashMap<(UserId, TopicId), TopicProgress>,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }

    fn to_image(&self) -> FileImage {
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            topics: self.topics.values().cloned().collect(),
            cards: self.cards.values().cloned().collect(),
            progress: self.progress.values().cloned().collect(),
            reviews: self.reviews.clone(),
            stats: self.stats.values().cloned().collect(),
            topic_progress: self.topic_progress.values().cloned().collect(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        let mut state = State {
            created_at: img.created_at,
            updated_at: img.updated_at,
            ..State::default()
        };
        for t in img.topics {
            state.topics.insert(t.id, t);
        }
        for c in img.cards {
            state.cards.insert(c.id, c);
        }
        for p in img.progress {
            state.progress.insert((p.user_id, p.card_id), p);
        }
        state.reviews = img.reviews;
        for s in img.stats {
            state.stats.insert(s.user_id, s);
        }
        for tp in img.topic_progress {
            state.topic_progress.insert((tp.user_id, tp.topic_id), tp);
        }
        state
    }

    fn apply_outcome(&mut self, write: &OutcomeWrite) {
        self.progress.insert(
            (write.progress.user_id, write.progress.card_id),
            write.progress.clone(),
        );
        self.reviews.push(write.review.clone());
        self.stats.insert(write.stats.user_id, write.stats.clone());
        self.topic_progress.insert(
            (write.topic_progress.user_id, write.topic_progress.topic_id),
            write.topic_progress.clone(),
        );
    }
}

/// Whole-state JSON file store. Writes go through a temp file and land
/// atomically; every save also drops a timestamped backup with rotation.
pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
    // Serializes outcome commits and saves so writes never interleave.
    commit_lock: Mutex<()>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, 10).await
    }

    pub async fn open_with(
        path: PathBuf,
        backups_dir: PathBuf,
        max_backups: usize,
    ) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let state = load_or_init(&path).await?;
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            state: RwLock::new(state),
            commit_lock: Mutex::new(()),
        })
    }

    async fn save(&self) -> Result<(), CoreError> {
        // Same lock as commit_outcome, so every image on disk reflects all
        // outcomes committed before this save.
        let _guard = self.commit_lock.lock().await;
        let snapshot = {
            let mut s = self.state.write();
            s.updated_at = Utc::now();
            s.to_image()
        };
        self.persist(snapshot).await
    }

    async fn persist(&self, img: FileImage) -> Result<(), CoreError> {
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        // Join error -> CoreError, inner io::Error -> CoreError
        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &img))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|_| CoreError::Storage("io"))?;
        Ok(())
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

async fn load_or_init(path: &Path) -> Result<State, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img: FileImage = task::spawn_blocking(move || {
            let mut f = fs::File::open(&p)?;
            let mut buf = String::new();
            f.read_to_string(&mut buf)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))
        .and_then(|r| r.map_err(|_| CoreError::Storage("io")))?;
        let mut st = State::from_image(img);
        st.updated_at = Utc::now();
        Ok(st)
    } else {
        let st = State::new_empty();
        let img = st.to_image();
        write_with_backup(path, &path.with_extension("backups"), 1, &img)
            .map_err(|_| CoreError::Storage("io"))?;
        Ok(st)
    }
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    max_backups: usize,
    img: &FileImage,
) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    let _ = fs::remove_file(path);
    tmp.persist(path)?;

    // Backup rotation
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let backup_name = format!("cardlux-{ts}.json");
    let backup_path = backups_dir.join(backup_name);
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    let _ = fs::remove_file(&backup_path);
    btmp.persist(&backup_path)?;

    rotate_backups(backups_dir, max_backups)?;

    Ok(())
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    entries.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}

#[async_trait]
impl Catalog for JsonStore {
    async fn create_topic(&self, name: &str, description: &str) -> Result<Topic, CoreError> {
        let topic = Topic::new(name, description);
        {
            let mut s = self.state.write();
            if s.topics.values().any(|t| t.name.eq_ignore_ascii_case(name)) {
                return Err(CoreError::Conflict("topic name already exists"));
            }
            s.topics.insert(topic.id, topic.clone());
        }
        self.save().await?;
        Ok(topic)
    }

    async fn get_topic(&self, id: TopicId) -> Result<Topic, CoreError> {
        let s = self.state.read();
        s.topics.get(&id).cloned().ok_or(CoreError::NotFound("topic"))
    }

    async fn find_topic(&self, name: &str) -> Result<Option<Topic>, CoreError> {
        let s = self.state.read();
        Ok(s.topics
            .values()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<Topic> = s.topics.values().cloned().collect();
        v.sort_by(|a, b| (a.created_at, &a.name).cmp(&(b.created_at, &b.name)));
        Ok(v)
    }

    async fn delete_topic(&self, id: TopicId) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if s.topics.remove(&id).is_none() {
                return Err(CoreError::NotFound("topic"));
            }
            let to_remove: Vec<CardId> = s
                .cards
                .values()
                .filter(|c| c.topic_id == id)
                .map(|c| c.id)
                .collect();
            for cid in to_remove {
                s.cards.remove(&cid);
            }
        }
        self.save().await
    }

    async fn add_card(
        &self,
        topic_id: TopicId,
        front: &str,
        back: &str,
        difficulty: Difficulty,
        kind: CardKind,
    ) -> Result<Card, CoreError> {
        let card = Card::new(topic_id, front, back, difficulty, kind);
        card.validate()?;
        {
            let mut s = self.state.write();
            if !s.topics.contains_key(&topic_id) {
                return Err(CoreError::NotFound("topic"));
            }
            s.cards.insert(card.id, card.clone());
        }
        self.save().await?;
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        let s = self.state.read();
        s.cards.get(&id).cloned().ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self, filter: &CardFilter) -> Result<Vec<Card>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<Card> = s.cards.values().filter(|c| filter.matches(c)).cloned().collect();
        v.sort_by_key(|c| (c.difficulty, c.created_at));
        Ok(v)
    }

    async fn update_card(&self, card: &Card) -> Result<Card, CoreError> {
        card.validate()?;
        {
            let mut s = self.state.write();
            if !s.cards.contains_key(&card.id) {
                return Err(CoreError::NotFound("card"));
            }
            s.cards.insert(card.id, card.clone());
        }
        self.save().await?;
        Ok(card.clone())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if s.cards.remove(&id).is_none() {
                return Err(CoreError::NotFound("card"));
            }
            s.progress.retain(|(_, cid), _| *cid != id);
        }
        self.save().await
    }

    async fn set_suspended(&self, id: CardId, suspended: bool) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            let Some(c) = s.cards.get_mut(&id) else {
                return Err(CoreError::NotFound("card"));
            };
            c.suspended = suspended;
        }
        self.save().await
    }

    async fn topic_card_count(&self, topic_id: TopicId) -> Result<usize, CoreError> {
        let s = self.state.read();
        Ok(s.cards
            .values()
            .filter(|c| c.topic_id == topic_id && !c.suspended)
            .count())
    }
}

#[async_trait]
impl ProgressStore for JsonStore {
    async fn get_progress(
        &self,
        user_id: UserId,
        card_id: CardId,
    ) -> Result<Option<ProgressRecord>, CoreError> {
        let s = self.state.read();
        Ok(s.progress.get(&(user_id, card_id)).cloned())
    }

    async fn list_progress(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, CoreError> {
        let s = self.state.read();
        Ok(s.progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_stats(&self, user_id: UserId) -> Result<Option<UserStats>, CoreError> {
        let s = self.state.read();
        Ok(s.stats.get(&user_id).cloned())
    }

    async fn get_topic_progress(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> Result<Option<TopicProgress>, CoreError> {
        let s = self.state.read();
        Ok(s.topic_progress.get(&(user_id, topic_id)).cloned())
    }

    async fn list_reviews(
        &self,
        user_id: UserId,
        card_id: Option<CardId>,
    ) -> Result<Vec<ReviewEvent>, CoreError> {
        let s = self.state.read();
        Ok(s.reviews
            .iter()
            .filter(|r| r.user_id == user_id && card_id.map_or(true, |c| r.card_id == c))
            .cloned()
            .collect())
    }

    /// All-or-nothing: the image with the outcome applied is persisted first,
    /// and the in-memory state only advances once the file write succeeded.
    async fn commit_outcome(&self, write: OutcomeWrite) -> Result<(), CoreError> {
        let _guard = self.commit_lock.lock().await;

        let img = {
            let s = self.state.read();
            let mut next = s.clone();
            next.apply_outcome(&write);
            next.updated_at = Utc::now();
            next.to_image()
        };
        self.persist(img).await?;

        let mut s = self.state.write();
        s.apply_outcome(&write);
        s.updated_at = Utc::now();
        debug!(user = %write.progress.user_id, card = %write.progress.card_id, "outcome committed");
        Ok(())
    }
}
