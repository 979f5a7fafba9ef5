//! Term discovery from the portal's "current status" page.
//!
//! The submenu lists terms in two shapes: links carrying a `p_term=` query
//! parameter, and plain labels such as "2 семестр" for the term being shown.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use etisgrade_core::error::AnalysisError;

use crate::session::EtisSession;

static SUBMENU_ITEM: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.submenu span.submenu-item").expect("valid submenu selector")
});
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid anchor selector"));

const TERM_PARAM: &str = "p_term=";
const TERM_WORD: &str = "семестр";

/// Fetch the status page and extract the available terms.
pub async fn list_terms(session: &EtisSession) -> Result<Vec<u32>, AnalysisError> {
    let html = session.status_page().await?;
    let terms = parse_terms(&html);
    debug!(?terms, "parsed status page");
    Ok(terms)
}

/// Distinct terms mentioned in the status page submenu, ascending.
///
/// A page without any submenu terms gives an empty list.
pub fn parse_terms(html: &str) -> Vec<u32> {
    let document = Html::parse_document(html);
    let terms: BTreeSet<u32> = document
        .select(&SUBMENU_ITEM)
        .filter_map(term_of_item)
        .collect();
    terms.into_iter().collect()
}

fn term_of_item(item: ElementRef<'_>) -> Option<u32> {
    let href = item
        .select(&ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .filter(|href| href.contains(TERM_PARAM));

    match href {
        Some(href) => term_from_href(href),
        None => term_from_label(&item.text().collect::<String>()),
    }
}

/// The digits after the last `p_term=`; anything else after it rejects the link.
fn term_from_href(href: &str) -> Option<u32> {
    let tail = href.rsplit(TERM_PARAM).next()?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// All digits of a label mentioning the word "семестр", joined together.
fn term_from_label(text: &str) -> Option<u32> {
    let text = text.trim();
    if !text.to_lowercase().contains(TERM_WORD) {
        return None;
    }
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
