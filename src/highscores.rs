//! High score leaderboard
//!
//! The simulation only produces a `(name, score)` pair at game over; where it
//! goes is up to a [`ScoreStore`]. [`HighScores`] is the stock store: an
//! ordered in-memory table, optionally mirrored to a JSON file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: i64,
    /// Unix time (ms) when the score was recorded
    pub timestamp_ms: u64,
}

impl ScoreEntry {
    /// Whether this entry ranks ahead of `other`: higher score first, then
    /// the earlier achiever
    fn outranks(&self, other: &ScoreEntry) -> bool {
        self.score > other.score || (self.score == other.score && self.timestamp_ms < other.timestamp_ms)
    }
}

/// Where finished sessions are recorded
pub trait ScoreStore {
    fn add_score(&mut self, name: &str, score: i64) -> Result<()>;

    /// Best `limit` entries, best first
    fn get_top_scores(&self, limit: usize) -> Vec<ScoreEntry>;
}

/// Leaderboard ordered by score (descending) then timestamp (ascending)
#[derive(Debug, Clone, Default)]
pub struct HighScores {
    entries: Vec<ScoreEntry>,
    path: Option<PathBuf>,
}

impl HighScores {
    /// Create an empty, memory-only leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file-backed leaderboard; a missing file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut entries: Vec<ScoreEntry> = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).map_err(|source| Error::Json {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No score file at {}, starting fresh", path.display());
                Vec::new()
            }
            Err(source) => return Err(Error::Io { path, source }),
        };
        // Stable sort keeps file order for exact ties
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.timestamp_ms.cmp(&b.timestamp_ms)));
        log::info!("Loaded {} high scores", entries.len());
        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<i64> {
        self.entries.first().map(|e| e.score)
    }

    /// Rank (1-indexed) a score recorded now would get
    pub fn potential_rank(&self, score: i64) -> usize {
        self.entries.iter().take_while(|e| e.score >= score).count() + 1
    }

    /// Record a score with an explicit timestamp; returns its rank (1-indexed).
    ///
    /// Blank names are rejected. With a file, the score is kept only if the
    /// rewritten table reaches the disk.
    pub fn add_score_at(&mut self, name: &str, score: i64, timestamp_ms: u64) -> Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            log::warn!("Rejected score {score} with an empty player name");
            return Err(Error::InvalidName(name.to_string()));
        }

        let entry = ScoreEntry {
            name: name.to_string(),
            score,
            timestamp_ms,
        };
        // Insert after every entry that is not beaten, so exact ties keep insertion order
        let pos = self
            .entries
            .iter()
            .position(|e| entry.outranks(e))
            .unwrap_or(self.entries.len());
        // The table only changes once the new version is on disk
        let mut updated = self.entries.clone();
        updated.insert(pos, entry);
        self.write(&updated)?;
        self.entries = updated;
        log::info!("Score added for {name}: {score} (rank {})", pos + 1);
        Ok(pos + 1)
    }

    /// Write the table to its file; memory-only leaderboards do nothing
    pub fn save(&self) -> Result<()> {
        self.write(&self.entries)
    }

    fn write(&self, entries: &[ScoreEntry]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(entries).map_err(|source| Error::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(path, json).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("High scores saved ({} entries)", entries.len());
        Ok(())
    }
}

impl ScoreStore for HighScores {
    fn add_score(&mut self, name: &str, score: i64) -> Result<()> {
        self.add_score_at(name, score, now_ms()).map(|_| ())
    }

    fn get_top_scores(&self, limit: usize) -> Vec<ScoreEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_score_then_time() {
        let mut hs = HighScores::new();
        hs.add_score_at("A", 100, 10).unwrap();
        hs.add_score_at("B", 200, 20).unwrap();
        hs.add_score_at("C", 150, 30).unwrap();
        assert_eq!(hs.add_score_at("D", 200, 5).unwrap(), 1);
        assert_eq!(hs.add_score_at("E", 200, 40).unwrap(), 3);

        let names: Vec<_> = hs.get_top_scores(10).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["D", "B", "E", "C", "A"]);
        assert_eq!(hs.get_top_scores(2).len(), 2);
        assert!(hs.get_top_scores(0).is_empty());
    }

    #[test]
    fn test_exact_tie_keeps_insertion_order() {
        let mut hs = HighScores::new();
        hs.add_score_at("first", 50, 7).unwrap();
        hs.add_score_at("second", 50, 7).unwrap();
        assert_eq!(hs.entries()[0].name, "first");
        assert_eq!(hs.entries()[1].name, "second");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut hs = HighScores::new();
        assert!(matches!(hs.add_score("   ", 10), Err(Error::InvalidName(_))));
        assert!(hs.is_empty());
    }

    #[test]
    fn test_potential_rank() {
        let mut hs = HighScores::new();
        assert_eq!(hs.potential_rank(5), 1);
        hs.add_score_at("A", 10, 1).unwrap();
        hs.add_score_at("B", 5, 2).unwrap();
        assert_eq!(hs.potential_rank(11), 1);
        assert_eq!(hs.potential_rank(5), 3);
        assert_eq!(hs.top_score(), Some(10));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        {
            let mut hs = HighScores::open(&path).unwrap();
            assert!(hs.is_empty());
            hs.add_score("Ann", 42).unwrap();
        }
        let hs = HighScores::open(&path).unwrap();
        let top = hs.get_top_scores(1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Ann");
        assert_eq!(top[0].score, 42);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(HighScores::open(&path), Err(Error::Json { .. })));
    }
}
