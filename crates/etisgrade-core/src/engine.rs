//! Analysis pipeline and the API a serving layer calls into.
//!
//! One analysis runs sequentially: log in, discover terms (unless a term was
//! requested), scrape, aggregate, render, then store the artifacts in the
//! shared [`ResultCache`]. Any failing stage aborts the rest.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::cache::{AnalysisKey, ArtifactKind, ResultCache};
use crate::error::AnalysisError;
use crate::model::{ChartData, SubjectStat, TermDynamicsPoint};
use crate::statistics::aggregate;
use crate::traits::{ArtifactRenderer, Credentials, PortalConnector};

/// Result of a completed analysis, minus the binary artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Key the artifacts were cached under.
    pub key: AnalysisKey,
    /// Subject labels against mean grades.
    pub bar_data: ChartData<String>,
    /// Terms against mean subject totals.
    pub line_data: ChartData<u32>,
    pub subjects: Vec<SubjectStat>,
    pub dynamics: Vec<TermDynamicsPoint>,
    /// Grade rows that took part in the analysis.
    pub rows: usize,
}

/// The scrape-and-aggregate engine.
pub struct AnalysisEngine {
    connector: Arc<dyn PortalConnector>,
    renderer: Arc<dyn ArtifactRenderer>,
    cache: Arc<ResultCache>,
}

impl AnalysisEngine {
    pub fn new(connector: Arc<dyn PortalConnector>, renderer: Arc<dyn ArtifactRenderer>) -> Self {
        Self {
            connector,
            renderer,
            cache: Arc::new(ResultCache::new()),
        }
    }

    /// Share an existing cache, e.g. one owned by a server.
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Log in and list the terms the portal offers.
    #[instrument(skip_all, fields(user = %credentials.username))]
    pub async fn discover_terms(&self, credentials: &Credentials) -> Result<Vec<u32>, AnalysisError> {
        let mut session = self.connector.login(credentials).await?;
        let terms = session.list_terms().await?;
        info!(?terms, "discovered terms");
        Ok(terms)
    }

    /// Run the whole pipeline and cache the rendered artifacts.
    #[instrument(skip_all, fields(user = %credentials.username, term = ?term_filter))]
    pub async fn run_analysis(
        &self,
        credentials: &Credentials,
        term_filter: Option<u32>,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let start = Instant::now();
        let mut session = self.connector.login(credentials).await?;

        let terms = match term_filter {
            Some(term) => vec![term],
            None => session.list_terms().await?,
        };
        info!(?terms, "scraping grade pages");

        let grades = session.scrape(&terms).await?;
        drop(session);

        let stats = aggregate(&grades, term_filter);
        let in_scope = grades.for_term(term_filter);
        let rows = in_scope.len();

        let renderer = Arc::clone(&self.renderer);
        let render_stats = stats.clone();
        let bundle = tokio::task::spawn_blocking(move || renderer.render(&in_scope, &render_stats))
            .await
            .map_err(|e| AnalysisError::render("artifacts", e))??;

        let key = AnalysisKey::new(credentials.username.clone(), term_filter);
        self.cache.insert(key.clone(), bundle);

        info!(
            rows,
            subjects = stats.subjects.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis complete"
        );

        Ok(AnalysisOutcome {
            key,
            bar_data: stats.bar_chart(),
            line_data: stats.line_chart(),
            subjects: stats.subjects,
            dynamics: stats.dynamics,
            rows,
        })
    }

    /// Fetch one artifact of an earlier analysis.
    pub fn export(&self, key: &AnalysisKey, kind: ArtifactKind) -> Result<Vec<u8>, AnalysisError> {
        self.cache.artifact(key, kind)
    }
}
