//! Grade page scraping.
//!
//! A grades page holds one section per subject: an `h3` heading followed,
//! somewhere later in the document, by a `table.common` with the control
//! points. Other tables may sit in between and are ignored.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use etisgrade_core::error::AnalysisError;
use etisgrade_core::model::{GradeSet, RawGradeRow};

use crate::session::EtisSession;

static SECTION_PARTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h3, table.common").expect("valid section selector")
});
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid row selector"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid cell selector"));

/// Header and column-title rows at the top of every grade table.
const HEADER_ROWS: usize = 2;

/// Fetch and parse the grade pages of `terms`, in order.
///
/// Numeric coercion happens once all pages are parsed. Returns
/// [`AnalysisError::NoData`] when no page produced a row.
pub async fn scrape(session: &EtisSession, terms: &[u32]) -> Result<GradeSet, AnalysisError> {
    let mut raw = Vec::new();
    for &term in terms {
        let html = session.grades_page(term).await?;
        let rows = parse_grade_page(&html, term);
        debug!(term, rows = rows.len(), "parsed grades page");
        raw.extend(rows);
    }

    if raw.is_empty() {
        return Err(AnalysisError::NoData);
    }
    info!(rows = raw.len(), terms = terms.len(), "scraped grade rows");
    Ok(GradeSet::from_raw(raw))
}

/// Pair each heading with the first unclaimed table after it.
///
/// `headings` and `tables` are ascending document positions. Returns
/// `(heading index, table index)` pairs in heading order; headings with no
/// table left after them are left out.
pub fn pair_sections(headings: &[usize], tables: &[usize]) -> Vec<(usize, usize)> {
    let mut claimed = vec![false; tables.len()];
    let mut pairs = Vec::new();

    for (h, &heading_pos) in headings.iter().enumerate() {
        let next = tables
            .iter()
            .enumerate()
            .find(|&(t, &table_pos)| table_pos > heading_pos && !claimed[t]);
        if let Some((t, _)) = next {
            claimed[t] = true;
            pairs.push((h, t));
        }
    }
    pairs
}

/// Extract the raw grade rows of one term's page.
pub fn parse_grade_page(html: &str, term: u32) -> Vec<RawGradeRow> {
    let document = Html::parse_document(html);

    let mut headings: Vec<(usize, String)> = Vec::new();
    let mut tables: Vec<(usize, ElementRef<'_>)> = Vec::new();
    for (pos, element) in document.select(&SECTION_PARTS).enumerate() {
        if element.value().name() == "h3" {
            headings.push((pos, element_text(element)));
        } else {
            tables.push((pos, element));
        }
    }

    let heading_pos: Vec<usize> = headings.iter().map(|(pos, _)| *pos).collect();
    let table_pos: Vec<usize> = tables.iter().map(|(pos, _)| *pos).collect();

    pair_sections(&heading_pos, &table_pos)
        .into_iter()
        .flat_map(|(h, t)| table_rows(tables[t].1, &headings[h].1, term))
        .collect()
}

fn table_rows(table: ElementRef<'_>, subject: &str, term: u32) -> Vec<RawGradeRow> {
    table
        .select(&ROW)
        .skip(HEADER_ROWS)
        .filter_map(|row| {
            let cells = row.select(&CELL).map(element_text);
            RawGradeRow::from_cells(cells, subject, term)
        })
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
