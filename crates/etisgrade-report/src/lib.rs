//! etisgrade-report — Artifact rendering for etisgrade.
//!
//! Turns a grade set and its statistics into the four downloadable
//! artifacts: a CSV table, an XLSX workbook and two PNG charts.

pub mod charts;
pub mod renderer;
pub mod table;

pub use charts::ChartStyle;
pub use renderer::StandardRenderer;
