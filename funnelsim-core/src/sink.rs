//! Event sinks.
//!
//! Defines the `EventSink` trait the driver hands finished runs to, plus an
//! in-memory implementation and an append-only JSON-lines file.
//! Both de-duplicate by `event_id`, within a batch and across batches.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CoreError;
use crate::events::Event;

/// Outcome of a single `insert_events` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertStats {
    pub inserted: usize,
    pub duplicates: usize,
}

pub trait EventSink {
    fn insert_events(&mut self, events: &[Event]) -> Result<InsertStats, CoreError>;
}

#[derive(Debug, Default)]
pub struct InMemorySink {
    events: Vec<Event>,
    seen: HashSet<String>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for InMemorySink {
    fn insert_events(&mut self, events: &[Event]) -> Result<InsertStats, CoreError> {
        let mut stats = InsertStats::default();
        for event in events {
            if self.seen.insert(event.event_id.clone()) {
                self.events.push(event.clone());
                stats.inserted += 1;
            } else {
                stats.duplicates += 1;
            }
        }
        Ok(stats)
    }
}

/// Append-only newline-delimited JSON file.
///
/// Ids already present in the file are loaded on open, so re-running a
/// seed against the same file inserts nothing new.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    seen: HashSet<String>,
}

impl JsonLinesSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();
        let mut seen = HashSet::new();

        if path.exists() {
            let file = File::open(&path).map_err(|source| CoreError::SinkIo {
                path: path.clone(),
                source,
            })?;
            for (idx, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|source| CoreError::SinkIo {
                    path: path.clone(),
                    source,
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                let event: Event =
                    serde_json::from_str(&line).map_err(|source| CoreError::MalformedRecord {
                        path: path.clone(),
                        line: idx + 1,
                        source,
                    })?;
                seen.insert(event.event_id);
            }
            debug!(path = %path.display(), existing = seen.len(), "Opened existing event file");
        }

        Ok(Self { path, seen })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct event ids stored in the file.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl EventSink for JsonLinesSink {
    fn insert_events(&mut self, events: &[Event]) -> Result<InsertStats, CoreError> {
        let io_err = |source| CoreError::SinkIo {
            path: self.path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        let mut writer = BufWriter::new(file);

        // Ids become known only once the batch is on disk, so a failed
        // write can be retried.
        let mut written: HashSet<&str> = HashSet::new();
        let mut stats = InsertStats::default();
        for event in events {
            let id = event.event_id.as_str();
            if self.seen.contains(id) || !written.insert(id) {
                stats.duplicates += 1;
                continue;
            }
            serde_json::to_writer(&mut writer, event)?;
            writer.write_all(b"\n").map_err(io_err)?;
            stats.inserted += 1;
        }
        writer.flush().map_err(io_err)?;
        self.seen.extend(written.into_iter().map(str::to_owned));
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventType, Properties};
    use chrono::{TimeZone, Utc};

    fn event(id: &str) -> Event {
        Event::new(
            id.to_string(),
            "user_00000",
            EventType::PageView,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Properties::new(),
        )
    }

    #[test]
    fn in_memory_dedups_within_and_across_batches() {
        let mut sink = InMemorySink::new();
        let stats = sink
            .insert_events(&[event("a"), event("b"), event("a")])
            .unwrap();
        assert_eq!(stats, InsertStats { inserted: 2, duplicates: 1 });

        let stats = sink.insert_events(&[event("b"), event("c")]).unwrap();
        assert_eq!(stats, InsertStats { inserted: 1, duplicates: 1 });
        assert_eq!(sink.len(), 3);
        let ids: Vec<_> = sink.events().iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn json_lines_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let mut sink = JsonLinesSink::open(&path).unwrap();
        assert!(sink.is_empty());
        let stats = sink.insert_events(&[event("a"), event("b")]).unwrap();
        assert_eq!(stats.inserted, 2);

        let mut reopened = JsonLinesSink::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        let stats = reopened.insert_events(&[event("a"), event("c")]).unwrap();
        assert_eq!(stats, InsertStats { inserted: 1, duplicates: 1 });

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn json_lines_retries_after_failed_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("events.jsonl");

        let mut sink = JsonLinesSink::open(&path).unwrap();
        let batch = [event("a"), event("b"), event("a")];
        assert!(matches!(
            sink.insert_events(&batch),
            Err(CoreError::SinkIo { .. })
        ));
        assert!(sink.is_empty());

        std::fs::create_dir(dir.path().join("missing")).unwrap();
        let stats = sink.insert_events(&batch).unwrap();
        assert_eq!(stats, InsertStats { inserted: 2, duplicates: 1 });
        assert_eq!(sink.len(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn json_lines_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jsonl");
        std::fs::write(&path, "{\"not\": \"an event\"}\n").unwrap();

        match JsonLinesSink::open(&path) {
            Err(CoreError::MalformedRecord { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected malformed record, got {:?}", other),
        }
    }
}
