//! Core data model types for etisgrade.
//!
//! These are the normalized shapes scraped grade tables are converted into,
//! plus the derived statistics and chart series built from them.

use serde::{Deserialize, Serialize};

/// Number of positional text cells a grade table row must provide.
pub const GRADE_CELLS: usize = 9;

/// Column titles for tabular exports, in export order.
///
/// The nine grade cells come first, followed by subject and term.
pub const COLUMN_TITLES: [&str; GRADE_CELLS + 2] = [
    "Тема",
    "Тип работы",
    "Тип контроля",
    "Оценка",
    "Проходной балл",
    "Текущий балл",
    "Макс. балл",
    "Дата",
    "Преподаватель",
    "Предмет",
    "Семестр",
];

/// A grade row as it appears on the portal page, before numeric coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGradeRow {
    /// Trimmed text of the first nine cells, in table order.
    pub cells: [String; GRADE_CELLS],
    /// Heading text of the enclosing subject section.
    pub subject: String,
    /// Term the page was fetched for.
    pub term: u32,
}

impl RawGradeRow {
    /// Build a raw row from the cells of a table row.
    ///
    /// Returns `None` when fewer than nine cells are present; any cells past
    /// the ninth are ignored.
    pub fn from_cells<I, S>(cells: I, subject: &str, term: u32) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let texts: Vec<String> = cells
            .into_iter()
            .take(GRADE_CELLS)
            .map(|c| c.as_ref().trim().to_string())
            .collect();
        let cells: [String; GRADE_CELLS] = texts.try_into().ok()?;
        Some(Self {
            cells,
            subject: subject.to_string(),
            term,
        })
    }

    /// Coerce the numeric columns and produce the normalized row.
    pub fn into_grade_row(self) -> GradeRow {
        let [topic, work_type, control_type, grade, passing_score, current_score, max_score, date, instructor] =
            self.cells;
        GradeRow {
            topic,
            work_type,
            control_type,
            grade: parse_score(&grade),
            passing_score,
            current_score: parse_score(&current_score),
            max_score: parse_score(&max_score),
            date,
            instructor,
            subject: self.subject,
            term: self.term,
        }
    }
}

/// One grade entry (a control point) of one subject in one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRow {
    pub topic: String,
    pub work_type: String,
    pub control_type: String,
    /// Awarded grade; `None` when the cell was empty or not a number.
    pub grade: Option<f64>,
    /// Kept as text: the portal mixes numbers and notes in this column.
    pub passing_score: String,
    pub current_score: Option<f64>,
    pub max_score: Option<f64>,
    pub date: String,
    pub instructor: String,
    /// Course name, taken from the section heading.
    pub subject: String,
    /// Academic term identifier.
    pub term: u32,
}

/// Parse a score cell. Anything that is not a finite decimal number is absent.
///
/// ```
/// use etisgrade_core::model::parse_score;
///
/// assert_eq!(parse_score(" 4.5 "), Some(4.5));
/// assert_eq!(parse_score("зачтено"), None);
/// assert_eq!(parse_score(""), None);
/// ```
pub fn parse_score(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// The flattened grade entries of one analysis run.
///
/// Order is term, then subject section, then table row, as discovered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeSet {
    rows: Vec<GradeRow>,
}

impl GradeSet {
    pub fn new(rows: Vec<GradeRow>) -> Self {
        Self { rows }
    }

    /// Coerce a batch of raw rows, preserving their order.
    pub fn from_raw(raw: Vec<RawGradeRow>) -> Self {
        Self::new(raw.into_iter().map(RawGradeRow::into_grade_row).collect())
    }

    pub fn rows(&self) -> &[GradeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Restrict to a single term, or return everything when `term` is `None`.
    pub fn for_term(&self, term: Option<u32>) -> GradeSet {
        match term {
            Some(term) => GradeSet::new(
                self.rows
                    .iter()
                    .filter(|row| row.term == term)
                    .cloned()
                    .collect(),
            ),
            None => self.clone(),
        }
    }

    /// Distinct terms present in the set, ascending.
    pub fn terms(&self) -> Vec<u32> {
        let mut terms: Vec<u32> = self.rows.iter().map(|row| row.term).collect();
        terms.sort_unstable();
        terms.dedup();
        terms
    }
}

impl FromIterator<GradeRow> for GradeSet {
    fn from_iter<T: IntoIterator<Item = GradeRow>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Mean grade and control point count for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStat {
    pub subject: String,
    /// Mean of the numeric grades; 0 when the subject has none.
    pub mean_grade: f64,
    /// Number of grade entries, including ones without a numeric grade.
    pub count: usize,
    /// Subject name annotated with the entry count, e.g. `"Math (2 КТ)"`.
    pub label: String,
}

/// Average of per-subject grade totals within one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermDynamicsPoint {
    pub term: u32,
    pub mean_of_subject_totals: f64,
}

/// A label list with a matching value list, ready for client-side charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData<L> {
    pub labels: Vec<L>,
    pub values: Vec<f64>,
}

impl<L> ChartData<L> {
    /// Zip labels with values, replacing NaN with `0.0`.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (L, f64)>) -> Self {
        let (labels, values): (Vec<L>, Vec<f64>) = pairs
            .into_iter()
            .map(|(label, value)| (label, if value.is_nan() { 0.0 } else { value }))
            .unzip();
        Self { labels, values }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
