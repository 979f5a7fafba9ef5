//! PNG chart rendering.
//!
//! Charts are drawn into an in-memory RGB buffer and PNG-encoded, so nothing
//! touches the filesystem. Text needs a TrueType font; when none can be
//! loaded the charts are drawn without captions, tick labels or axis titles.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Result;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle, FontTransform};
use tracing::{debug, warn};

use etisgrade_core::error::AnalysisError;
use etisgrade_core::model::ChartData;

const FONT_FAMILY: &str = "sans-serif";

/// Checked in order when no font is configured or the configured one fails.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub const BAR_TITLE: &str = "Средний балл за КТ по предметам";
pub const BAR_X_AXIS: &str = "Предмет";
pub const BAR_Y_AXIS: &str = "Средний балл за КТ";
pub const LINE_TITLE: &str = "Динамика по семестрам";
pub const LINE_X_AXIS: &str = "Семестр";
pub const LINE_Y_AXIS: &str = "Средний балл";

/// Image sizes and font for chart rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub font_path: Option<PathBuf>,
    pub bar_size: (u32, u32),
    pub line_size: (u32, u32),
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            font_path: None,
            bar_size: (1000, 600),
            line_size: (800, 500),
        }
    }
}

static TEXT_ENABLED: OnceLock<bool> = OnceLock::new();

/// Register a font for chart text, once per process.
///
/// The first call decides; later calls reuse its outcome whatever path they
/// pass.
fn text_enabled(font_path: Option<&Path>) -> bool {
    *TEXT_ENABLED.get_or_init(|| {
        let candidates = font_path
            .into_iter()
            .map(Path::to_path_buf)
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            // Registered fonts must outlive every chart; this runs once.
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
                debug!(font = %path.display(), "registered chart font");
                return true;
            }
            warn!(font = %path.display(), "not a usable TrueType font");
        }

        warn!("no usable chart font found; charts are rendered without text");
        false
    })
}

/// Upper bound of the value axis, leaving headroom above the tallest point.
fn value_ceiling(values: &[f64]) -> f64 {
    let top = values.iter().copied().fold(0.0, f64::max);
    if top > 0.0 {
        top * 1.1
    } else {
        1.0
    }
}

/// Byte length of an RGB buffer for `size`.
fn buffer_len((width, height): (u32, u32)) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| anyhow::anyhow!("chart size {width}x{height} is too large"))
}

fn encode_png(buffer: &[u8], (width, height): (u32, u32)) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(buffer, width, height, ExtendedColorType::Rgb8)?;
    Ok(png)
}

/// Bar chart of mean grade per subject.
pub fn render_bar_chart(data: &ChartData<String>, style: &ChartStyle) -> Result<Vec<u8>, AnalysisError> {
    let text = text_enabled(style.font_path.as_deref());
    draw_bar_chart(data, style.bar_size, text).map_err(|e| AnalysisError::render("avg_grades", format!("{e:#}")))
}

fn draw_bar_chart(data: &ChartData<String>, size: (u32, u32), text: bool) -> Result<Vec<u8>> {
    let mut buffer = vec![255u8; buffer_len(size)?];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
        root.fill(&WHITE)?;

        if !data.is_empty() {
            let count = data.len() as u32;
            let mut builder = ChartBuilder::on(&root);
            builder.margin(20);
            if text {
                builder
                    .caption(BAR_TITLE, (FONT_FAMILY, 26))
                    .x_label_area_size(200)
                    .y_label_area_size(60);
            }

            let mut chart = builder
                .build_cartesian_2d((0..count).into_segmented(), 0.0..value_ceiling(&data.values))?;

            let subject_label = |value: &SegmentValue<u32>| match value {
                SegmentValue::CenterOf(i) => data.labels.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            };

            let mut mesh = chart.configure_mesh();
            mesh.disable_x_mesh().x_labels(data.len());
            if text {
                mesh.x_desc(BAR_X_AXIS)
                    .y_desc(BAR_Y_AXIS)
                    .x_label_style((FONT_FAMILY, 14).into_font().transform(FontTransform::Rotate90))
                    .x_label_formatter(&subject_label);
            }
            mesh.draw()?;

            chart.draw_series(
                Histogram::vertical(&chart)
                    .style(BLUE.mix(0.8).filled())
                    .margin(8)
                    .data(data.values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
            )?;
        }

        root.present()?;
    }

    encode_png(&buffer, size)
}

/// Line chart of the mean of subject totals per term.
pub fn render_line_chart(data: &ChartData<u32>, style: &ChartStyle) -> Result<Vec<u8>, AnalysisError> {
    let text = text_enabled(style.font_path.as_deref());
    draw_line_chart(data, style.line_size, text).map_err(|e| AnalysisError::render("term_dynamics", format!("{e:#}")))
}

fn draw_line_chart(data: &ChartData<u32>, size: (u32, u32), text: bool) -> Result<Vec<u8>> {
    let mut buffer = vec![255u8; buffer_len(size)?];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
        root.fill(&WHITE)?;

        if !data.is_empty() {
            // Terms sit on a categorical axis: one slot per term, whatever
            // their numeric values.
            let count = data.len() as u32;
            let points: Vec<(SegmentValue<u32>, f64)> = data
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (SegmentValue::CenterOf(i as u32), *v))
                .collect();

            let mut builder = ChartBuilder::on(&root);
            builder.margin(20);
            if text {
                builder
                    .caption(LINE_TITLE, (FONT_FAMILY, 24))
                    .x_label_area_size(50)
                    .y_label_area_size(60);
            }

            let mut chart = builder
                .build_cartesian_2d((0..count).into_segmented(), 0.0..value_ceiling(&data.values))?;

            let term_label = |value: &SegmentValue<u32>| match value {
                SegmentValue::CenterOf(i) => data
                    .labels
                    .get(*i as usize)
                    .map(u32::to_string)
                    .unwrap_or_default(),
                _ => String::new(),
            };

            let mut mesh = chart.configure_mesh();
            mesh.x_labels(data.len());
            if text {
                mesh.x_desc(LINE_X_AXIS)
                    .y_desc(LINE_Y_AXIS)
                    .x_label_formatter(&term_label);
            }
            mesh.draw()?;

            chart.draw_series(LineSeries::new(points.iter().cloned(), BLUE.stroke_width(2)))?;
            chart.draw_series(
                points
                    .iter()
                    .map(|point| Circle::new(point.clone(), 5, BLUE.filled())),
            )?;
        }

        root.present()?;
    }

    encode_png(&buffer, size)
}
