//! Analysis error types.
//!
//! These are the only failures a caller of the pipeline ever sees. Structural
//! oddities in scraped pages (missing tables, short rows, non-numeric cells)
//! are absorbed during parsing and never become errors.

use thiserror::Error;

use crate::cache::AnalysisKey;

/// Errors that can occur while analysing a student's grades.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The portal answered the login with its login form again.
    #[error("invalid credentials")]
    Auth,

    /// A network or TLS failure talking to the portal.
    #[error("transport error: {0}")]
    Transport(String),

    /// A portal request exceeded the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Scraping finished without a single grade row.
    #[error("no grade data found; check the selected terms or the login")]
    NoData,

    /// No completed analysis is cached under this key.
    #[error("no analysis results for {0}; run the analysis first")]
    NotFound(AnalysisKey),

    /// An artifact could not be serialized.
    #[error("failed to render {artifact}: {message}")]
    Render { artifact: String, message: String },
}

impl AnalysisError {
    pub fn render(artifact: impl Into<String>, message: impl ToString) -> Self {
        AnalysisError::Render {
            artifact: artifact.into(),
            message: message.to_string(),
        }
    }

    /// HTTP status a serving layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AnalysisError::Auth => 401,
            AnalysisError::NoData => 400,
            AnalysisError::NotFound(_) => 404,
            AnalysisError::Transport(_) => 502,
            AnalysisError::Timeout(_) => 504,
            AnalysisError::Render { .. } => 500,
        }
    }

    /// Returns `true` for failures the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AnalysisError::Auth.status_code(), 401);
        assert_eq!(AnalysisError::NoData.status_code(), 400);
        assert_eq!(
            AnalysisError::NotFound(AnalysisKey::new("u", None)).status_code(),
            404
        );
        assert_eq!(AnalysisError::Transport("reset".into()).status_code(), 502);
        assert_eq!(AnalysisError::Timeout(30).status_code(), 504);
    }

    #[test]
    fn client_errors() {
        assert!(AnalysisError::Auth.is_client_error());
        assert!(AnalysisError::NoData.is_client_error());
        assert!(!AnalysisError::Transport("dns".into()).is_client_error());
        assert!(!AnalysisError::render("grades.csv", "io").is_client_error());
    }

    #[test]
    fn messages() {
        assert_eq!(AnalysisError::Auth.to_string(), "invalid credentials");
        assert!(AnalysisError::NotFound(AnalysisKey::new("ivan", Some(3)))
            .to_string()
            .contains("ivan_3"));
    }
}
