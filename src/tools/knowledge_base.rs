use super::traits::{Tool, ToolArgs, ToolFuture, string_arg};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("'query' parameter is required for knowledge base search")]
    MissingQuery,

    #[error("no entries found for query: '{0}'")]
    NoMatch(String),

    #[error("error loading knowledge base {}: {reason}", .path.display())]
    Loading { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub name: String,
    pub summary: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl KnowledgeEntry {
    fn characters(&self) -> BTreeSet<char> {
        character_set(&self.name)
    }
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    entries: Vec<KnowledgeEntry>,
}

fn character_set(text: &str) -> BTreeSet<char> {
    text.trim().to_lowercase().chars().collect()
}

/// Jaccard index of two character sets; two empty sets score zero.
pub fn jaccard_similarity(a: &BTreeSet<char>, b: &BTreeSet<char>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let score = a.intersection(b).count() as f64 / union as f64;
    score
}

/// Fuzzy factual lookup over a small local entry list.
pub struct KnowledgeBaseTool {
    entries: Vec<KnowledgeEntry>,
    threshold: f64,
}

impl KnowledgeBaseTool {
    pub fn new(entries: Vec<KnowledgeEntry>, threshold: f64) -> Self {
        Self { entries, threshold }
    }

    /// Loads `{"entries": [...]}` from `path`. A missing file yields an
    /// empty knowledge base.
    pub fn load(path: &Path, threshold: f64) -> Result<Self, KnowledgeBaseError> {
        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "knowledge base file not found; starting with an empty knowledge base"
            );
            return Ok(Self::new(Vec::new(), threshold));
        }

        let loading = |reason: String| KnowledgeBaseError::Loading {
            path: path.to_path_buf(),
            reason,
        };
        let contents = std::fs::read_to_string(path).map_err(|error| loading(error.to_string()))?;
        let file: KnowledgeFile =
            serde_json::from_str(&contents).map_err(|error| loading(error.to_string()))?;

        let entries: Vec<KnowledgeEntry> = file
            .entries
            .into_iter()
            .filter_map(|entry| {
                let name = entry.name.trim().to_string();
                let summary = entry.summary.trim().to_string();
                if name.is_empty() || summary.is_empty() {
                    tracing::warn!(name = %entry.name, "skipping knowledge base entry with empty name or summary");
                    return None;
                }
                Some(KnowledgeEntry {
                    name,
                    summary,
                    category: entry.category,
                })
            })
            .collect();

        tracing::debug!(path = %path.display(), entries = entries.len(), "knowledge base loaded");
        Ok(Self::new(entries, threshold))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best entry whose name scores at least the threshold. Earlier entries
    /// win ties.
    pub fn search(&self, query: &str) -> Option<(&KnowledgeEntry, f64)> {
        let query_chars = character_set(query);
        self.entries
            .iter()
            .map(|entry| (entry, jaccard_similarity(&query_chars, &entry.characters())))
            .filter(|(_, score)| *score >= self.threshold)
            .fold(None, |best, candidate| match best {
                Some((_, best_score)) if best_score >= candidate.1 => best,
                _ => Some(candidate),
            })
    }

    fn lookup(&self, args: &ToolArgs) -> Result<Value, KnowledgeBaseError> {
        let query = string_arg(args, "query")
            .or_else(|| string_arg(args, "q"))
            .ok_or(KnowledgeBaseError::MissingQuery)?;
        let (entry, score) = self
            .search(query)
            .ok_or_else(|| KnowledgeBaseError::NoMatch(query.to_string()))?;

        tracing::debug!(query, entry = %entry.name, score, "knowledge base match");
        Ok(json!({
            "name": entry.name,
            "summary": entry.summary,
            "category": entry.category,
        }))
    }
}

impl Tool for KnowledgeBaseTool {
    fn name(&self) -> &str {
        "knowledge_base"
    }

    fn description(&self) -> &str {
        "Look up a short factual summary about a person or entity by name"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Name of the person or entity, e.g. \"Ada Lovelace\""
                }
            },
            "required": ["query"]
        })
    }

    fn execute<'a>(&'a self, args: ToolArgs) -> ToolFuture<'a> {
        Box::pin(async move { Ok(self.lookup(&args)?) })
    }
}
