//! Per-subject and per-term grade statistics.
//!
//! Groupings are keyed in ascending order (subject text, then term), so the
//! output of [`aggregate`] is reproducible for a given [`GradeSet`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ChartData, GradeSet, SubjectStat, TermDynamicsPoint};

/// Everything derived from a grade set for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// One entry per subject, ascending by subject name.
    pub subjects: Vec<SubjectStat>,
    /// One entry per term, ascending.
    pub dynamics: Vec<TermDynamicsPoint>,
}

impl AnalysisStats {
    /// Subject labels against mean grades.
    pub fn bar_chart(&self) -> ChartData<String> {
        ChartData::from_pairs(
            self.subjects
                .iter()
                .map(|s| (s.label.clone(), s.mean_grade)),
        )
    }

    /// Terms against the mean of subject totals.
    pub fn line_chart(&self) -> ChartData<u32> {
        ChartData::from_pairs(
            self.dynamics
                .iter()
                .map(|p| (p.term, p.mean_of_subject_totals)),
        )
    }
}

/// Running sum and count of numeric grades plus the number of entries.
#[derive(Debug, Default, Clone, Copy)]
struct GradeAccumulator {
    sum: f64,
    numeric: usize,
    entries: usize,
}

impl GradeAccumulator {
    fn push(&mut self, grade: Option<f64>) {
        self.entries += 1;
        if let Some(grade) = grade {
            self.sum += grade;
            self.numeric += 1;
        }
    }

    fn mean(&self) -> f64 {
        if self.numeric == 0 {
            0.0
        } else {
            self.sum / self.numeric as f64
        }
    }
}

/// Label shown on the bar chart for a subject.
pub fn subject_label(subject: &str, count: usize) -> String {
    format!("{subject} ({count} КТ)")
}

/// Compute subject statistics and term dynamics.
///
/// When `term_filter` is set only rows of that term take part.
pub fn aggregate(grades: &GradeSet, term_filter: Option<u32>) -> AnalysisStats {
    let rows = grades
        .rows()
        .iter()
        .filter(|row| term_filter.is_none_or(|term| row.term == term));

    let mut per_subject: BTreeMap<&str, GradeAccumulator> = BTreeMap::new();
    let mut per_term_subject: BTreeMap<(u32, &str), GradeAccumulator> = BTreeMap::new();

    for row in rows {
        per_subject
            .entry(row.subject.as_str())
            .or_default()
            .push(row.grade);
        per_term_subject
            .entry((row.term, row.subject.as_str()))
            .or_default()
            .push(row.grade);
    }

    let subjects = per_subject
        .into_iter()
        .map(|(subject, acc)| SubjectStat {
            subject: subject.to_string(),
            mean_grade: acc.mean(),
            count: acc.entries,
            label: subject_label(subject, acc.entries),
        })
        .collect();

    // Subject totals per term; an all-absent subject still counts with 0.
    let mut per_term: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for ((term, _), acc) in &per_term_subject {
        let entry = per_term.entry(*term).or_default();
        entry.0 += acc.sum;
        entry.1 += 1;
    }

    let dynamics = per_term
        .into_iter()
        .map(|(term, (total, subjects))| {
            let mean = if subjects == 0 {
                0.0
            } else {
                total / subjects as f64
            };
            TermDynamicsPoint {
                term,
                mean_of_subject_totals: if mean.is_nan() { 0.0 } else { mean },
            }
        })
        .collect();

    AnalysisStats { subjects, dynamics }
}
