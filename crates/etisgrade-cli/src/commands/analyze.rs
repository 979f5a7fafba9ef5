//! The `etisgrade analyze` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use etisgrade_core::{AnalysisOutcome, ArtifactKind};
use etisgrade_portal::load_config_from;

pub async fn execute(
    config_path: Option<PathBuf>,
    username: Option<String>,
    term: Option<u32>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let credentials = config.credentials(username.as_deref())?;
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let engine = super::build_engine(&config);
    let outcome = engine.run_analysis(&credentials, term).await?;

    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory: {}", output.display()))?;
    for kind in ArtifactKind::ALL {
        let bytes = engine.export(&outcome.key, kind)?;
        let path = output.join(kind.file_name());
        std::fs::write(&path, &bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_summary(&outcome);
        eprintln!("Artifacts saved to: {}", output.display());
    }

    Ok(())
}

fn print_summary(outcome: &AnalysisOutcome) {
    use comfy_table::{Cell, Table};

    println!("{} grade entries ({})", outcome.rows, outcome.key);

    let mut subjects = Table::new();
    subjects.set_header(vec!["Предмет", "Средний балл", "КТ"]);
    for stat in &outcome.subjects {
        subjects.add_row(vec![
            Cell::new(&stat.subject),
            Cell::new(format!("{:.2}", stat.mean_grade)),
            Cell::new(stat.count),
        ]);
    }
    println!("\n{subjects}");

    let mut dynamics = Table::new();
    dynamics.set_header(vec!["Семестр", "Средний балл"]);
    for point in &outcome.dynamics {
        dynamics.add_row(vec![
            Cell::new(point.term),
            Cell::new(format!("{:.2}", point.mean_of_subject_totals)),
        ]);
    }
    println!("\n{dynamics}");
}
