//! Read-only knowledge snapshots and the repository that swaps them.

pub mod category;
pub mod source;

pub use source::{FileKnowledgeSource, KnowledgeSource, StaticKnowledgeSource};

use crate::matcher::{normalize, token_set};
use crate::schema::KnowledgeEntry;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("failed to read knowledge file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse knowledge file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("unsupported knowledge file format: {path} (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },
    #[error("invalid knowledge entry #{index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

/// Immutable view of the knowledge store at one point in time.
#[derive(Debug)]
pub struct KnowledgeSnapshot {
    entries: Vec<KnowledgeEntry>,
    exact_index: HashMap<String, usize>,
    name_tokens: Vec<Vec<BTreeSet<String>>>,
    loaded_at: DateTime<Utc>,
}

impl KnowledgeSnapshot {
    /// Build a snapshot, normalizing entries at the boundary.
    ///
    /// Names and aliases are trimmed, blank aliases dropped and categories
    /// normalized. An entry without a canonical name is rejected.
    pub fn new(entries: Vec<KnowledgeEntry>) -> Result<Self, KnowledgeError> {
        let mut cleaned = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            cleaned.push(clean_entry(index, entry)?);
        }

        let mut exact_index = HashMap::new();
        let mut name_tokens = Vec::with_capacity(cleaned.len());
        for (i, entry) in cleaned.iter().enumerate() {
            let mut names = Vec::new();
            for name in entry.names() {
                let key = normalize(name);
                if key.is_empty() {
                    continue;
                }
                // First entry in store order owns a shared name
                exact_index.entry(key.clone()).or_insert(i);
                names.push(token_set(&key));
            }
            name_tokens.push(names);
        }

        Ok(Self {
            entries: cleaned,
            exact_index,
            name_tokens,
            loaded_at: Utc::now(),
        })
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            exact_index: HashMap::new(),
            name_tokens: Vec::new(),
            loaded_at: Utc::now(),
        }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Look up an already-normalized name.
    pub fn exact(&self, normalized: &str) -> Option<&KnowledgeEntry> {
        self.exact_index.get(normalized).map(|&i| &self.entries[i])
    }

    /// Entries in store order with the token sets of each of their names.
    pub fn indexed_names(&self) -> impl Iterator<Item = (&KnowledgeEntry, &[BTreeSet<String>])> {
        self.entries
            .iter()
            .zip(self.name_tokens.iter().map(Vec::as_slice))
    }
}

fn clean_entry(index: usize, mut entry: KnowledgeEntry) -> Result<KnowledgeEntry, KnowledgeError> {
    entry.canonical_name = entry.canonical_name.trim().to_string();
    if entry.canonical_name.is_empty() {
        return Err(KnowledgeError::InvalidEntry {
            index,
            reason: "canonical_name is empty".to_string(),
        });
    }
    if normalize(&entry.canonical_name).is_empty() {
        return Err(KnowledgeError::InvalidEntry {
            index,
            reason: format!(
                "canonical_name {:?} has no letters or digits",
                entry.canonical_name
            ),
        });
    }
    entry.aliases = entry
        .aliases
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    entry.category = category::normalize_category(&entry.category, &entry.canonical_name);
    Ok(entry)
}

/// Provides the current snapshot and replaces it wholesale on request.
pub trait KnowledgeRepository: Send + Sync {
    fn snapshot(&self) -> Arc<KnowledgeSnapshot>;

    fn reload(&self) -> Result<Arc<KnowledgeSnapshot>, KnowledgeError>;
}

/// Single-writer, many-reader holder of the current snapshot.
///
/// Readers clone the `Arc` and keep using it for the whole call; a reload
/// builds the replacement outside the lock and swaps the pointer, so nobody
/// ever sees a partially loaded store.
pub struct SharedKnowledge<S: KnowledgeSource> {
    source: S,
    current: RwLock<Arc<KnowledgeSnapshot>>,
}

impl<S: KnowledgeSource> SharedKnowledge<S> {
    pub fn new(source: S) -> Result<Self, KnowledgeError> {
        let snapshot = KnowledgeSnapshot::new(source.load()?)?;
        tracing::info!(
            "loaded {} knowledge entries from {}",
            snapshot.len(),
            source.describe()
        );
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Like [`SharedKnowledge::new`] but starts empty when the first load fails.
    pub fn new_or_empty(source: S) -> Self {
        let snapshot = match source.load().and_then(KnowledgeSnapshot::new) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    "knowledge unavailable from {}, continuing without it: {}",
                    source.describe(),
                    e
                );
                KnowledgeSnapshot::empty()
            }
        };
        Self {
            source,
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl SharedKnowledge<StaticKnowledgeSource> {
    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Result<Self, KnowledgeError> {
        Self::new(StaticKnowledgeSource::new(entries))
    }

    pub fn empty() -> Self {
        Self {
            source: StaticKnowledgeSource::new(Vec::new()),
            current: RwLock::new(Arc::new(KnowledgeSnapshot::empty())),
        }
    }
}

impl<S: KnowledgeSource> KnowledgeRepository for SharedKnowledge<S> {
    fn snapshot(&self) -> Arc<KnowledgeSnapshot> {
        Arc::clone(&self.current.read())
    }

    fn reload(&self) -> Result<Arc<KnowledgeSnapshot>, KnowledgeError> {
        let fresh = match self.source.load().and_then(KnowledgeSnapshot::new) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                tracing::warn!(
                    "knowledge reload from {} failed, keeping previous snapshot: {}",
                    self.source.describe(),
                    e
                );
                return Err(e);
            }
        };
        *self.current.write() = Arc::clone(&fresh);
        tracing::info!(
            "reloaded {} knowledge entries from {}",
            fresh.len(),
            self.source.describe()
        );
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedSource {
        batches: Mutex<Vec<Result<Vec<KnowledgeEntry>, String>>>,
    }

    impl KnowledgeSource for ScriptedSource {
        fn load(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
            let next = self.batches.lock().unwrap().remove(0);
            next.map_err(|reason| KnowledgeError::Parse {
                path: PathBuf::from("scripted"),
                reason,
            })
        }

        fn describe(&self) -> String {
            "scripted".into()
        }
    }

    fn scripted(batches: Vec<Result<Vec<KnowledgeEntry>, String>>) -> ScriptedSource {
        ScriptedSource {
            batches: Mutex::new(batches),
        }
    }

    #[test]
    fn snapshot_normalizes_entries() {
        let snapshot = KnowledgeSnapshot::new(vec![
            KnowledgeEntry::new("  GRAY WOLF ")
                .with_aliases(["wolf ", "", "  "])
                .with_category("Mammalia"),
        ])
        .unwrap();
        let entry = &snapshot.entries()[0];
        assert_eq!(entry.canonical_name, "GRAY WOLF");
        assert_eq!(entry.aliases.len(), 1);
        assert!(entry.aliases.contains("wolf"));
        assert_eq!(entry.category, "Mammal");
    }

    #[test]
    fn snapshot_rejects_blank_canonical_name() {
        let err = KnowledgeSnapshot::new(vec![KnowledgeEntry::new("ok"), KnowledgeEntry::new(" ")])
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::InvalidEntry { index: 1, .. }));
    }

    #[test]
    fn snapshot_rejects_punctuation_only_canonical_name() {
        let entries = vec![KnowledgeEntry::new("狼"), KnowledgeEntry::new("?!")];
        let err = KnowledgeSnapshot::new(entries).unwrap_err();
        assert!(matches!(err, KnowledgeError::InvalidEntry { index: 1, .. }));
    }

    #[test]
    fn shared_name_resolves_to_first_entry() {
        let snapshot = KnowledgeSnapshot::new(vec![
            KnowledgeEntry::new("GRAY WOLF").with_aliases(["wolf"]),
            KnowledgeEntry::new("RED WOLF").with_aliases(["wolf"]),
        ])
        .unwrap();
        assert_eq!(snapshot.exact("wolf").unwrap().canonical_name, "GRAY WOLF");
        assert_eq!(snapshot.exact("red wolf").unwrap().canonical_name, "RED WOLF");
    }

    #[test]
    fn reload_swaps_whole_snapshot() {
        let repo = SharedKnowledge::new(scripted(vec![
            Ok(vec![KnowledgeEntry::new("LION")]),
            Ok(vec![KnowledgeEntry::new("TIGER"), KnowledgeEntry::new("LEOPARD")]),
        ]))
        .unwrap();

        let before = repo.snapshot();
        assert_eq!(before.len(), 1);

        let after = repo.reload().unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(repo.snapshot().len(), 2);
        // Holders of the old Arc keep a consistent view
        assert_eq!(before.entries()[0].canonical_name, "LION");
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let repo = SharedKnowledge::new(scripted(vec![
            Ok(vec![KnowledgeEntry::new("LION")]),
            Err("disk on fire".into()),
        ]))
        .unwrap();

        assert!(repo.reload().is_err());
        assert_eq!(repo.snapshot().entries()[0].canonical_name, "LION");
    }

    #[test]
    fn new_or_empty_degrades_to_empty_snapshot() {
        let repo = SharedKnowledge::new_or_empty(scripted(vec![Err("missing".into())]));
        assert!(repo.snapshot().is_empty());
    }
}
