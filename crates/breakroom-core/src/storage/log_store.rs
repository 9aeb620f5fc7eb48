//! Break history: one JSON file capped at the most recent entries.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LogError;
use crate::events::{BreakLogKind, Event};
use crate::tier::TierColor;

use super::data_dir;

/// Most recent entries kept on disk.
const MAX_ENTRIES: usize = 1000;

/// One recorded break outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakLogEntry {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub tier_name: String,
    pub tier_color: TierColor,
    pub kind: BreakLogKind,
    /// e.g. "microphone", "Zoom (focused)", "5 min".
    pub reason: Option<String>,
}

impl BreakLogEntry {
    pub fn new(
        tier_name: impl Into<String>,
        tier_color: TierColor,
        kind: BreakLogKind,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            at,
            tier_name: tier_name.into(),
            tier_color,
            kind,
            reason,
        }
    }

    /// Convert a session event into a log entry. Only
    /// [`Event::BreakLogged`] maps to one.
    pub fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::BreakLogged {
                tier_name,
                tier_color,
                kind,
                reason,
                at,
            } => Some(Self::new(
                tier_name.clone(),
                *tier_color,
                *kind,
                reason.clone(),
                *at,
            )),
            _ => None,
        }
    }
}

pub struct BreakLogStore {
    path: PathBuf,
}

impl BreakLogStore {
    /// Store under the standard data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn new() -> crate::error::Result<Self> {
        Ok(Self {
            path: data_dir()?.join("break-log.json"),
        })
    }

    /// Store at an explicit path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored entries, oldest first. A missing file is an empty log.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn entries(&self) -> Result<Vec<BreakLogEntry>, LogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| LogError::ReadFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| LogError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Append one entry, trimming to the newest [`MAX_ENTRIES`].
    /// An unreadable existing log starts fresh rather than blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated log cannot be written.
    pub fn append(&self, entry: BreakLogEntry) -> Result<(), LogError> {
        let mut entries = match self.entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "break log unreadable, starting fresh");
                Vec::new()
            }
        };
        entries.push(entry);
        if entries.len() > MAX_ENTRIES {
            let excess = entries.len() - MAX_ENTRIES;
            entries.drain(..excess);
        }
        self.save(&entries)
    }

    /// Delete the log file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and cannot be removed.
    pub fn clear(&self) -> Result<(), LogError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| LogError::WriteFailed {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn save(&self, entries: &[BreakLogEntry]) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LogError::WriteFailed {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        }
        let content =
            serde_json::to_string_pretty(entries).map_err(|e| LogError::WriteFailed {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        std::fs::write(&self.path, content).map_err(|e| LogError::WriteFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: BreakLogKind) -> BreakLogEntry {
        BreakLogEntry::new(name, TierColor::Yellow, kind, None, Utc::now())
    }

    fn store_in(dir: &tempfile::TempDir) -> BreakLogStore {
        BreakLogStore::with_path(dir.path().join("break-log.json"))
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.append(entry("Stretch", BreakLogKind::Started)).unwrap();
        store.append(entry("Stretch", BreakLogKind::Completed)).unwrap();
        store.append(entry("Walk", BreakLogKind::Skipped)).unwrap();

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, BreakLogKind::Started);
        assert_eq!(entries[2].tier_name, "Walk");
    }

    #[test]
    fn log_is_capped_at_the_newest_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let batch: Vec<BreakLogEntry> = (0..(MAX_ENTRIES + 5))
            .map(|i| entry(&format!("T{i}"), BreakLogKind::Completed))
            .collect();
        store.save(&batch).unwrap();
        store.append(entry("newest", BreakLogKind::Completed)).unwrap();

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), MAX_ENTRIES);
        // The oldest six rolled off; the fresh entry is last.
        assert_eq!(entries[0].tier_name, "T6");
        assert_eq!(entries.last().unwrap().tier_name, "newest");
    }

    #[test]
    fn corrupt_log_errors_on_read_but_not_on_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.entries(), Err(LogError::Corrupt { .. })));

        store.append(entry("Stretch", BreakLogKind::Started)).unwrap();
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(entry("Stretch", BreakLogKind::Started)).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(store.entries().unwrap().is_empty());
        // Clearing an absent log is fine.
        store.clear().unwrap();
    }

    #[test]
    fn from_event_maps_only_log_events() {
        let now = Utc::now();
        let event = Event::BreakLogged {
            tier_name: "Walk".into(),
            tier_color: TierColor::Red,
            kind: BreakLogKind::Deferred,
            reason: Some("microphone".into()),
            at: now,
        };
        let entry = BreakLogEntry::from_event(&event).unwrap();
        assert_eq!(entry.tier_name, "Walk");
        assert_eq!(entry.kind, BreakLogKind::Deferred);
        assert_eq!(entry.reason.as_deref(), Some("microphone"));
        assert_eq!(entry.at, now);

        assert!(BreakLogEntry::from_event(&Event::BreakEnded { at: now }).is_none());
    }
}
