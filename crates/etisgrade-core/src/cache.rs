//! Completed-analysis cache shared by the serving layer.
//!
//! Entries are keyed by who asked and which terms they asked for. An entry is
//! overwritten when the same key is analysed again and is never evicted, so a
//! long-running server grows without bound; eviction is the host's concern.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Which terms an analysis covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermSelector {
    All,
    Term(u32),
}

impl From<Option<u32>> for TermSelector {
    fn from(term: Option<u32>) -> Self {
        term.map_or(TermSelector::All, TermSelector::Term)
    }
}

impl TermSelector {
    pub fn term(self) -> Option<u32> {
        match self {
            TermSelector::All => None,
            TermSelector::Term(term) => Some(term),
        }
    }
}

impl fmt::Display for TermSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermSelector::All => write!(f, "all"),
            TermSelector::Term(term) => write!(f, "{term}"),
        }
    }
}

/// Cache key: identity plus term selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisKey {
    pub identity: String,
    pub terms: TermSelector,
}

impl AnalysisKey {
    pub fn new(identity: impl Into<String>, term: Option<u32>) -> Self {
        Self {
            identity: identity.into(),
            terms: term.into(),
        }
    }
}

impl fmt::Display for AnalysisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.identity, self.terms)
    }
}

/// A downloadable artifact produced by an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    TableCsv,
    TableXlsx,
    ChartBarPng,
    ChartLinePng,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::TableCsv,
        ArtifactKind::TableXlsx,
        ArtifactKind::ChartBarPng,
        ArtifactKind::ChartLinePng,
    ];

    /// Name used in download URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::TableCsv => "csv",
            ArtifactKind::TableXlsx => "xlsx",
            ArtifactKind::ChartBarPng => "avg_grades",
            ArtifactKind::ChartLinePng => "term_dynamics",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::TableCsv => "grades.csv",
            ArtifactKind::TableXlsx => "grades.xlsx",
            ArtifactKind::ChartBarPng => "avg_grades.png",
            ArtifactKind::ChartLinePng => "term_dynamics.png",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ArtifactKind::TableCsv => "text/csv",
            ArtifactKind::TableXlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ArtifactKind::ChartBarPng | ArtifactKind::ChartLinePng => "image/png",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown artifact: {s} (expected csv, xlsx, avg_grades or term_dynamics)"))
    }
}

/// The four rendered artifacts of one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactBundle {
    pub table_csv: Vec<u8>,
    pub table_xlsx: Vec<u8>,
    pub chart_bar_png: Vec<u8>,
    pub chart_line_png: Vec<u8>,
}

impl ArtifactBundle {
    pub fn get(&self, kind: ArtifactKind) -> &[u8] {
        match kind {
            ArtifactKind::TableCsv => &self.table_csv,
            ArtifactKind::TableXlsx => &self.table_xlsx,
            ArtifactKind::ChartBarPng => &self.chart_bar_png,
            ArtifactKind::ChartLinePng => &self.chart_line_png,
        }
    }
}

/// Process-wide map from analysis key to its rendered artifacts.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<AnalysisKey, ArtifactBundle>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a bundle, replacing any earlier one under the same key.
    pub fn insert(&self, key: AnalysisKey, bundle: ArtifactBundle) {
        self.lock().insert(key, bundle);
    }

    /// Copy out one artifact of a cached analysis.
    pub fn artifact(&self, key: &AnalysisKey, kind: ArtifactKind) -> Result<Vec<u8>, AnalysisError> {
        self.lock()
            .get(key)
            .map(|bundle| bundle.get(kind).to_vec())
            .ok_or_else(|| AnalysisError::NotFound(key.clone()))
    }

    pub fn contains(&self, key: &AnalysisKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still consistent.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AnalysisKey, ArtifactBundle>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
