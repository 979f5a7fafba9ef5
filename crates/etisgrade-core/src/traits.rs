//! Core trait definitions for portal access and artifact rendering.
//!
//! The portal traits are implemented by `etisgrade-portal`, the renderer by
//! `etisgrade-report`.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::ArtifactBundle;
use crate::error::AnalysisError;
use crate::model::GradeSet;
use crate::statistics::AnalysisStats;

// ---------------------------------------------------------------------------
// Portal traits
// ---------------------------------------------------------------------------

/// Login credentials for the student portal.
///
/// Note: Custom Debug impl masks the password to keep it out of logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Opens authenticated portal sessions.
#[async_trait]
pub trait PortalConnector: Send + Sync {
    /// Log in and return a fresh session owning its own cookies.
    async fn login(&self, credentials: &Credentials)
        -> Result<Box<dyn PortalSession>, AnalysisError>;
}

/// An authenticated session. Never shared between analyses.
#[async_trait]
pub trait PortalSession: Send {
    /// Terms the portal offers, distinct and ascending.
    async fn list_terms(&mut self) -> Result<Vec<u32>, AnalysisError>;

    /// Scrape the grade pages of `terms`, in the given order.
    ///
    /// Fails with [`AnalysisError::NoData`] when no rows were found at all.
    async fn scrape(&mut self, terms: &[u32]) -> Result<GradeSet, AnalysisError>;
}

// ---------------------------------------------------------------------------
// Renderer trait
// ---------------------------------------------------------------------------

/// Serializes grades and statistics into downloadable artifacts.
pub trait ArtifactRenderer: Send + Sync {
    /// `grades` is already restricted to the analysed terms.
    fn render(&self, grades: &GradeSet, stats: &AnalysisStats)
        -> Result<ArtifactBundle, AnalysisError>;
}
