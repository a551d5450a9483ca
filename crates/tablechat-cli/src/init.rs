//! `tablechat init`: write a default config file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use tablechat_core::config::{get_config_path, save_settings, AppSettings};
use tablechat_core::utils::get_data_path;
use tablechat_providers::PROVIDERS;

/// Run the init command.
pub fn run(config_path: Option<&Path>, force: bool) -> Result<()> {
    println!();
    println!("{}", "📊 tablechat — Setup".cyan().bold());
    println!();

    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    if write_default_config(&config_path, force)? {
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        println!(
            "  {} config already exists at {} (use --force to overwrite)",
            "✓".green(),
            config_path.display()
        );
    }

    let history_dir = get_data_path().join("history");
    std::fs::create_dir_all(&history_dir)
        .with_context(|| format!("failed to create {}", history_dir.display()))?;

    println!();
    let env_keys: Vec<&str> = PROVIDERS
        .iter()
        .flat_map(|spec| spec.env_keys.iter().copied())
        .collect();
    println!(
        "{}",
        format!(
            "Next: add credentials to the config file or export them ({}).",
            env_keys.join(", ")
        )
        .dimmed()
    );
    println!();

    Ok(())
}

/// Write default settings to `path`. Returns `false` if a file already
/// exists and `force` is not set.
fn write_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    save_settings(&AppSettings::default(), Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}
