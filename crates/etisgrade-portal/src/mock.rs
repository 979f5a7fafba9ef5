//! Mock portal for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use etisgrade_core::error::AnalysisError;
use etisgrade_core::model::GradeSet;
use etisgrade_core::traits::{Credentials, PortalConnector, PortalSession};

use crate::grades::parse_grade_page;
use crate::terms::parse_terms;

/// A portal serving canned HTML pages, parsed with the real scrapers.
///
/// Lets the analysis engine run end to end without network access.
pub struct MockPortal {
    password: String,
    status_page: String,
    grade_pages: HashMap<u32, String>,
    logins: Arc<AtomicU32>,
}

impl MockPortal {
    /// A portal that accepts any username with `password`.
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            status_page: String::new(),
            grade_pages: HashMap::new(),
            logins: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_status_page(mut self, html: &str) -> Self {
        self.status_page = html.to_string();
        self
    }

    pub fn with_grade_page(mut self, term: u32, html: &str) -> Self {
        self.grade_pages.insert(term, html.to_string());
        self
    }

    /// Number of successful logins so far.
    pub fn login_count(&self) -> u32 {
        self.logins.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PortalConnector for MockPortal {
    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn PortalSession>, AnalysisError> {
        if credentials.password != self.password {
            return Err(AnalysisError::Auth);
        }
        self.logins.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MockSession {
            status_page: self.status_page.clone(),
            grade_pages: self.grade_pages.clone(),
        }))
    }
}

struct MockSession {
    status_page: String,
    grade_pages: HashMap<u32, String>,
}

#[async_trait]
impl PortalSession for MockSession {
    async fn list_terms(&mut self) -> Result<Vec<u32>, AnalysisError> {
        Ok(parse_terms(&self.status_page))
    }

    async fn scrape(&mut self, terms: &[u32]) -> Result<GradeSet, AnalysisError> {
        let raw: Vec<_> = terms
            .iter()
            .filter_map(|term| self.grade_pages.get(term).map(|html| (*term, html)))
            .flat_map(|(term, html)| parse_grade_page(html, term))
            .collect();
        if raw.is_empty() {
            return Err(AnalysisError::NoData);
        }
        Ok(GradeSet::from_raw(raw))
    }
}
