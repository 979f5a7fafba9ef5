pub mod analyze;
pub mod init;
pub mod terms;

use std::sync::Arc;

use etisgrade_core::AnalysisEngine;
use etisgrade_portal::{EtisConfig, EtisPortal};
use etisgrade_report::{ChartStyle, StandardRenderer};

/// Wire the live portal and the standard renderer into an engine.
fn build_engine(config: &EtisConfig) -> AnalysisEngine {
    let defaults = ChartStyle::default();
    let style = ChartStyle {
        font_path: config.charts.font_path.clone(),
        bar_size: config.charts.bar_size.unwrap_or(defaults.bar_size),
        line_size: config.charts.line_size.unwrap_or(defaults.line_size),
    };

    AnalysisEngine::new(
        Arc::new(EtisPortal::new(config.portal.clone())),
        Arc::new(StandardRenderer::new(style)),
    )
}
