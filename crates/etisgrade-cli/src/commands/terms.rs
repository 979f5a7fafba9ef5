//! The `etisgrade terms` command.

use std::path::PathBuf;

use anyhow::Result;

use etisgrade_portal::load_config_from;

pub async fn execute(config_path: Option<PathBuf>, username: Option<String>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let credentials = config.credentials(username.as_deref())?;

    let terms = super::build_engine(&config)
        .discover_terms(&credentials)
        .await?;

    if terms.is_empty() {
        println!("No terms found.");
    }
    for term in terms {
        println!("{term}");
    }

    Ok(())
}
