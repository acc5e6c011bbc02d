use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::engine::Engine;
use crate::error::StoreError;
use crate::keys::KeyStroke;
use crate::metrics::Tier;

/// Opaque drill identifier owned by the surrounding application
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DrillId(String);

impl DrillId {
    /// `"{lesson_id}-{drill_index}"`
    pub fn new(lesson_id: &str, drill_index: usize) -> Self {
        Self(format!("{lesson_id}-{drill_index}"))
    }

    pub fn custom(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DrillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one finished attempt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrillResult {
    pub wpm: u32,
    pub accuracy: i32,
    pub tier: Tier,
    pub timestamp: DateTime<Local>,
}

/// Persistence for finished drills. The latest save for an id wins.
pub trait ResultStore {
    fn save(&mut self, id: &DrillId, result: &DrillResult) -> Result<(), StoreError>;
    fn get(&self, id: &DrillId) -> Result<Option<DrillResult>, StoreError>;
    fn all(&self) -> Result<Vec<(DrillId, DrillResult)>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryResultStore {
    results: HashMap<DrillId, DrillResult>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryResultStore {
    fn save(&mut self, id: &DrillId, result: &DrillResult) -> Result<(), StoreError> {
        self.results.insert(id.clone(), result.clone());
        Ok(())
    }

    fn get(&self, id: &DrillId) -> Result<Option<DrillResult>, StoreError> {
        Ok(self.results.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<(DrillId, DrillResult)>, StoreError> {
        let mut all: Vec<_> = self
            .results
            .iter()
            .map(|(id, r)| (id.clone(), r.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all)
    }
}

/// SQLite-backed store: one row per drill plus an append-only attempt log
#[derive(Debug)]
pub struct SqliteResultStore {
    conn: Connection,
}

impl SqliteResultStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS drill_results (
                drill_id TEXT PRIMARY KEY,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                tier TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS drill_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                drill_id TEXT NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                tier TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_drill_attempts_drill ON drill_attempts(drill_id);
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Every saved attempt for a drill, oldest first
    pub fn attempts(&self, id: &DrillId) -> Result<Vec<DrillResult>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT wpm, accuracy, tier, timestamp FROM drill_attempts WHERE drill_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([id.as_str()], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut attempts = Vec::new();
        for row in rows {
            attempts.push(decode_row(row?)?);
        }
        Ok(attempts)
    }
}

type RawRow = (u32, i32, String, String);

fn decode_row((wpm, accuracy, tier, timestamp): RawRow) -> Result<DrillResult, StoreError> {
    let tier = Tier::from_name(&tier).ok_or(StoreError::InvalidTier(tier))?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)?.with_timezone(&Local);
    Ok(DrillResult {
        wpm,
        accuracy,
        tier,
        timestamp,
    })
}

impl ResultStore for SqliteResultStore {
    fn save(&mut self, id: &DrillId, result: &DrillResult) -> Result<(), StoreError> {
        let tier = result.tier.to_string();
        let timestamp = result.timestamp.to_rfc3339();
        let values = params![id.as_str(), result.wpm, result.accuracy, tier, timestamp];

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO drill_results (drill_id, wpm, accuracy, tier, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
            values,
        )?;
        tx.execute(
            "INSERT INTO drill_attempts (drill_id, wpm, accuracy, tier, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
            values,
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get(&self, id: &DrillId) -> Result<Option<DrillResult>, StoreError> {
        let raw = self
            .conn
            .query_row(
                "SELECT wpm, accuracy, tier, timestamp FROM drill_results WHERE drill_id = ?1",
                [id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, i32>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        raw.map(decode_row).transpose()
    }

    fn all(&self) -> Result<Vec<(DrillId, DrillResult)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT drill_id, wpm, accuracy, tier, timestamp FROM drill_results ORDER BY drill_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                (
                    row.get::<_, u32>(1)?,
                    row.get::<_, i32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ),
            ))
        })?;

        let mut all = Vec::new();
        for row in rows {
            let (id, raw) = row?;
            all.push((DrillId::custom(id), decode_row(raw)?));
        }
        Ok(all)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub drills: usize,
    pub mastered: usize,
    pub proficient: usize,
    pub needs_practice: usize,
    pub avg_wpm: f64,
    pub avg_accuracy: f64,
}

impl ProgressSummary {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a DrillResult>,
    {
        let mut summary = Self::default();
        let (mut wpm_total, mut accuracy_total) = (0u64, 0i64);
        for result in results {
            summary.drills += 1;
            match result.tier {
                Tier::Mastered => summary.mastered += 1,
                Tier::Proficient => summary.proficient += 1,
                Tier::NeedsPractice => summary.needs_practice += 1,
            }
            wpm_total += result.wpm as u64;
            accuracy_total += result.accuracy as i64;
        }
        if summary.drills > 0 {
            summary.avg_wpm = wpm_total as f64 / summary.drills as f64;
            summary.avg_accuracy = accuracy_total as f64 / summary.drills as f64;
        }
        summary
    }
}

/// Couples an engine with a store so finished drills get saved
pub struct Trainer<S: ResultStore> {
    pub engine: Engine,
    store: S,
    drill: DrillId,
}

impl<S: ResultStore> Trainer<S> {
    pub fn new(engine: Engine, store: S, drill: DrillId) -> Self {
        Self {
            engine,
            store,
            drill,
        }
    }

    pub fn drill(&self) -> &DrillId {
        &self.drill
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a new drill's text under a new id
    pub fn load(&mut self, drill: DrillId, text: Option<&str>) {
        self.drill = drill;
        self.engine.load_target(text);
    }

    /// Forward a key and save the result if it finished the drill.
    /// Save failures are logged and never reach the engine.
    pub fn handle_key(&mut self, key: KeyStroke) -> Option<DrillResult> {
        self.engine.handle_key(key);
        let result = self.engine.take_completion()?;
        if let Err(err) = self.store.save(&self.drill, &result) {
            tracing::warn!(drill = %self.drill, %err, "failed to save drill result");
        }
        Some(result)
    }

    pub fn on_tick(&mut self) {
        self.engine.on_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn result(wpm: u32, accuracy: i32) -> DrillResult {
        DrillResult {
            wpm,
            accuracy,
            tier: crate::metrics::tier(wpm, accuracy),
            timestamp: Local::now(),
        }
    }

    #[test]
    fn drill_id_concatenates() {
        assert_eq!(DrillId::new("home-row", 3).as_str(), "home-row-3");
        assert_eq!(DrillId::custom("abc").to_string(), "abc");
    }

    #[test]
    fn memory_store_latest_wins() {
        let mut store = MemoryResultStore::new();
        let id = DrillId::new("l1", 0);
        store.save(&id, &result(20, 90)).unwrap();
        store.save(&id, &result(60, 99)).unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap().wpm, 60);
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn sqlite_store_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("progress.db");
        let id = DrillId::new("l1", 2);
        let saved = result(55, 99);
        {
            let mut store = SqliteResultStore::open(&path).unwrap();
            store.save(&id, &result(25, 80)).unwrap();
            store.save(&id, &saved).unwrap();
        }

        let store = SqliteResultStore::open(&path).unwrap();
        let loaded = store.get(&id).unwrap().unwrap();
        assert_eq!(loaded.wpm, 55);
        assert_eq!(loaded.accuracy, 99);
        assert_eq!(loaded.tier, Tier::Mastered);
        assert_eq!(loaded.timestamp.timestamp(), saved.timestamp.timestamp());
        assert_eq!(store.attempts(&id).unwrap().len(), 2);
        assert_eq!(store.get(&DrillId::custom("missing")).unwrap(), None);
    }

    #[test]
    fn sqlite_store_keeps_negative_accuracy() {
        let mut store = SqliteResultStore::open_in_memory().unwrap();
        let id = DrillId::custom("fumbled");
        store.save(&id, &result(12, -200)).unwrap();

        let loaded = store.get(&id).unwrap().unwrap();
        assert_eq!(loaded.accuracy, -200);
        assert_eq!(loaded.tier, Tier::NeedsPractice);
        assert_eq!(store.attempts(&id).unwrap()[0].accuracy, -200);
    }

    #[test]
    fn sqlite_store_lists_all() {
        let mut store = SqliteResultStore::open_in_memory().unwrap();
        store.save(&DrillId::new("b", 0), &result(40, 96)).unwrap();
        store.save(&DrillId::new("a", 1), &result(10, 50)).unwrap();

        let all = store.all().unwrap();
        let ids: Vec<_> = all.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a-1", "b-0"]);
    }

    #[test]
    fn sqlite_rejects_unknown_tier() {
        let store = SqliteResultStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO drill_results VALUES ('x', 1, 1, 'legendary', ?1)",
                [Local::now().to_rfc3339()],
            )
            .unwrap();
        assert_matches!(
            store.get(&DrillId::custom("x")),
            Err(StoreError::InvalidTier(t)) if t == "legendary"
        );
    }

    #[test]
    fn summary_counts_tiers() {
        let results = [result(60, 99), result(35, 96), result(10, 70), result(15, 80)];
        let summary = ProgressSummary::from_results(&results);
        assert_eq!(summary.drills, 4);
        assert_eq!(summary.mastered, 1);
        assert_eq!(summary.proficient, 1);
        assert_eq!(summary.needs_practice, 2);
        assert_eq!(summary.avg_wpm, 30.0);
        assert_eq!(summary.avg_accuracy, 86.25);
    }

    #[test]
    fn empty_summary() {
        let summary = ProgressSummary::from_results(&Vec::<DrillResult>::new());
        assert_eq!(summary, ProgressSummary::default());
    }

    #[test]
    fn trainer_saves_completion() {
        let clock = ManualClock::new(0);
        let engine = Engine::new(&Config::default()).with_clock(clock.clone());
        let mut trainer = Trainer::new(engine, MemoryResultStore::new(), DrillId::new("l", 0));
        trainer.load(DrillId::new("l", 1), Some("ok"));

        assert_eq!(trainer.handle_key(KeyStroke::from_char('o')), None);
        clock.advance(500);
        let result = trainer.handle_key(KeyStroke::from_char('k')).unwrap();

        let stored = trainer.store().get(&DrillId::new("l", 1)).unwrap().unwrap();
        assert_eq!(stored, result);
        assert!(trainer.store().get(&DrillId::new("l", 0)).unwrap().is_none());
    }

    struct FailingStore;

    impl ResultStore for FailingStore {
        fn save(&mut self, _id: &DrillId, _result: &DrillResult) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
        fn get(&self, _id: &DrillId) -> Result<Option<DrillResult>, StoreError> {
            Ok(None)
        }
        fn all(&self) -> Result<Vec<(DrillId, DrillResult)>, StoreError> {
            Ok(vec![])
        }
    }

    #[test]
    fn save_failure_leaves_engine_intact() {
        let engine = Engine::new(&Config::default()).with_clock(ManualClock::new(0));
        let mut trainer = Trainer::new(engine, FailingStore, DrillId::custom("x"));
        trainer.load(DrillId::custom("x"), Some("a"));

        assert!(trainer.handle_key(KeyStroke::from_char('a')).is_some());
        assert_eq!(
            trainer.engine.state(),
            crate::session::SessionState::Finished
        );
        assert_eq!(trainer.engine.session().typed_text(), "a");
    }
}
