//! etisgrade-core — Grade data model, aggregation, and the analysis engine.
//!
//! This crate defines the normalized grade shapes, the error taxonomy, the
//! traits the portal and report crates implement, and the pipeline that ties
//! them together.

pub mod cache;
pub mod engine;
pub mod error;
pub mod model;
pub mod statistics;
pub mod traits;

pub use cache::{AnalysisKey, ArtifactBundle, ArtifactKind, ResultCache, TermSelector};
pub use engine::{AnalysisEngine, AnalysisOutcome};
pub use error::AnalysisError;
pub use model::{ChartData, GradeRow, GradeSet, RawGradeRow, SubjectStat, TermDynamicsPoint};
pub use statistics::{aggregate, AnalysisStats};
pub use traits::{ArtifactRenderer, Credentials, PortalConnector, PortalSession};
