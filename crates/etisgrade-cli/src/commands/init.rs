//! The `etisgrade init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("etisgrade.toml").exists() {
        println!("etisgrade.toml already exists, skipping.");
    } else {
        std::fs::write("etisgrade.toml", SAMPLE_CONFIG)?;
        println!("Created etisgrade.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set your login in etisgrade.toml and export ETISGRADE_PASSWORD");
    println!("  2. Run: etisgrade terms");
    println!("  3. Run: etisgrade analyze");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# etisgrade configuration

output_dir = "./etisgrade-out"

[portal]
base_url = "https://student.psu.ru/pls/stu_cus_et"
timeout_secs = 30
# Only for portals with a broken certificate chain.
accept_invalid_certs = false

[credentials]
username = "student@example.com"
password = "${ETISGRADE_PASSWORD}"

[charts]
# TrueType font with Cyrillic glyphs; system fonts are tried when unset.
# font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
bar_size = [1000, 600]
line_size = [800, 500]
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses() {
        let config = etisgrade_portal::config::parse_config(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.portal.timeout_secs, 30);
        assert!(!config.portal.accept_invalid_certs);
        assert_eq!(config.charts.bar_size, Some((1000, 600)));
        assert_eq!(
            config.output_dir,
            std::path::PathBuf::from("./etisgrade-out")
        );
    }
}
