//! The default artifact renderer.

use tracing::debug;

use etisgrade_core::cache::ArtifactBundle;
use etisgrade_core::error::AnalysisError;
use etisgrade_core::model::GradeSet;
use etisgrade_core::statistics::AnalysisStats;
use etisgrade_core::traits::ArtifactRenderer;

use crate::charts::{render_bar_chart, render_line_chart, ChartStyle};
use crate::table::{write_csv, write_xlsx};

/// Renders CSV, XLSX and both PNG charts.
#[derive(Debug, Clone, Default)]
pub struct StandardRenderer {
    style: ChartStyle,
}

impl StandardRenderer {
    pub fn new(style: ChartStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }
}

impl ArtifactRenderer for StandardRenderer {
    fn render(&self, grades: &GradeSet, stats: &AnalysisStats) -> Result<ArtifactBundle, AnalysisError> {
        let bundle = ArtifactBundle {
            table_csv: write_csv(grades)?,
            table_xlsx: write_xlsx(grades)?,
            chart_bar_png: render_bar_chart(&stats.bar_chart(), &self.style)?,
            chart_line_png: render_line_chart(&stats.line_chart(), &self.style)?,
        };
        debug!(
            csv = bundle.table_csv.len(),
            xlsx = bundle.table_xlsx.len(),
            bar = bundle.chart_bar_png.len(),
            line = bundle.chart_line_png.len(),
            "rendered artifacts"
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etisgrade_core::model::GradeRow;
    use etisgrade_core::statistics::aggregate;

    fn row(subject: &str, grade: Option<f64>, term: u32) -> GradeRow {
        GradeRow {
            topic: "КТ".into(),
            work_type: "ЛР".into(),
            control_type: "Защита".into(),
            grade,
            passing_score: "3".into(),
            current_score: grade,
            max_score: Some(5.0),
            date: "01.10.2024".into(),
            instructor: "Иванов".into(),
            subject: subject.into(),
            term,
        }
    }

    #[test]
    fn default_renderer_uses_default_style() {
        assert_eq!(StandardRenderer::default().style(), &ChartStyle::default());
        let custom = ChartStyle {
            line_size: (640, 480),
            ..ChartStyle::default()
        };
        assert_eq!(StandardRenderer::new(custom.clone()).style(), &custom);
    }

    #[test]
    fn renders_all_four_artifacts() {
        let set = GradeSet::new(vec![
            row("Математика", Some(5.0), 1),
            row("Математика", None, 1),
            row("Физика", Some(3.0), 2),
        ]);
        let stats = aggregate(&set, None);
        let renderer = StandardRenderer::new(ChartStyle {
            bar_size: (400, 300),
            line_size: (400, 300),
            ..ChartStyle::default()
        });

        let bundle = renderer.render(&set, &stats).unwrap();
        let csv = String::from_utf8(bundle.table_csv).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.contains(",Математика,1"));
        assert!(bundle.table_xlsx.starts_with(b"PK"));
        assert!(bundle.chart_bar_png.starts_with(b"\x89PNG"));
        assert!(bundle.chart_line_png.starts_with(b"\x89PNG"));
    }
}
