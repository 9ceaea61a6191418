use super::KnowledgeError;
use crate::schema::KnowledgeEntry;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where snapshots come from. Loading happens outside any classify call.
pub trait KnowledgeSource: Send + Sync {
    fn load(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;
}

/// In-memory entries, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticKnowledgeSource {
    entries: Vec<KnowledgeEntry>,
}

impl StaticKnowledgeSource {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }
}

impl KnowledgeSource for StaticKnowledgeSource {
    fn load(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        Ok(self.entries.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory entries", self.entries.len())
    }
}

/// A TOML (`[[entries]]`) or JSON (array, or `{"entries": [...]}`) file,
/// re-read on every load.
#[derive(Debug, Clone)]
pub struct FileKnowledgeSource {
    path: PathBuf,
}

#[derive(Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    entries: Vec<KnowledgeEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonKnowledge {
    List(Vec<KnowledgeEntry>),
    Wrapped(KnowledgeFile),
}

impl FileKnowledgeSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_error(&self, reason: impl ToString) -> KnowledgeError {
        KnowledgeError::Parse {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl KnowledgeSource for FileKnowledgeSource {
    fn load(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let content = std::fs::read_to_string(&self.path).map_err(|source| KnowledgeError::Io {
            path: self.path.clone(),
            source,
        })?;

        match extension.as_deref() {
            Some("toml") => toml::from_str::<KnowledgeFile>(&content)
                .map(|file| file.entries)
                .map_err(|e| self.parse_error(e)),
            Some("json") => match serde_json::from_str::<JsonKnowledge>(&content) {
                Ok(JsonKnowledge::List(entries)) => Ok(entries),
                Ok(JsonKnowledge::Wrapped(file)) => Ok(file.entries),
                Err(e) => Err(self.parse_error(e)),
            },
            _ => Err(KnowledgeError::UnsupportedFormat {
                path: self.path.clone(),
            }),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
