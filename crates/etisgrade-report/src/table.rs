//! Tabular exports of a grade set.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use etisgrade_core::error::AnalysisError;
use etisgrade_core::model::{GradeRow, GradeSet, COLUMN_TITLES};

/// Format a score cell for text output.
///
/// Absent scores are empty; integral scores keep one decimal (`5.0`).
pub fn format_score(score: Option<f64>) -> String {
    match score {
        None => String::new(),
        Some(value) if value.fract() == 0.0 && value.abs() < 1e15 => format!("{value:.1}"),
        Some(value) => value.to_string(),
    }
}

fn record(row: &GradeRow) -> [String; COLUMN_TITLES.len()] {
    [
        row.topic.clone(),
        row.work_type.clone(),
        row.control_type.clone(),
        format_score(row.grade),
        row.passing_score.clone(),
        format_score(row.current_score),
        format_score(row.max_score),
        row.date.clone(),
        row.instructor.clone(),
        row.subject.clone(),
        row.term.to_string(),
    ]
}

/// Render the grade set as UTF-8 CSV with a header row.
pub fn write_csv(grades: &GradeSet) -> Result<Vec<u8>, AnalysisError> {
    let err = |e: csv::Error| AnalysisError::render("csv", e);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMN_TITLES).map_err(err)?;
    for row in grades.rows() {
        writer.write_record(record(row)).map_err(err)?;
    }
    writer
        .into_inner()
        .map_err(|e| AnalysisError::render("csv", e.error()))
}

/// Render the grade set as an XLSX workbook with a single `Sheet1`.
pub fn write_xlsx(grades: &GradeSet) -> Result<Vec<u8>, AnalysisError> {
    build_workbook(grades).map_err(|e| AnalysisError::render("xlsx", e))
}

fn build_workbook(grades: &GradeSet) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, title) in COLUMN_TITLES.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (i, row) in grades.rows().iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, &row.topic)?;
        sheet.write_string(r, 1, &row.work_type)?;
        sheet.write_string(r, 2, &row.control_type)?;
        if let Some(grade) = row.grade {
            sheet.write_number(r, 3, grade)?;
        }
        sheet.write_string(r, 4, &row.passing_score)?;
        if let Some(score) = row.current_score {
            sheet.write_number(r, 5, score)?;
        }
        if let Some(score) = row.max_score {
            sheet.write_number(r, 6, score)?;
        }
        sheet.write_string(r, 7, &row.date)?;
        sheet.write_string(r, 8, &row.instructor)?;
        sheet.write_string(r, 9, &row.subject)?;
        sheet.write_number(r, 10, f64::from(row.term))?;
    }

    workbook.save_to_buffer()
}
