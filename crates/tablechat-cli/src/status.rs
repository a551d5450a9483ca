//! `tablechat status`: show settings and provider status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use tablechat_core::config::{get_config_path, AppSettings, ProviderSettings, SettingsSource};
use tablechat_core::utils::mask_secret;
use tablechat_providers::registry::{ProviderRegistry, PROVIDERS};

/// Run the status command.
pub fn run(
    settings: &AppSettings,
    registry: &ProviderRegistry,
    config_path: Option<&Path>,
) -> Result<()> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "📊 tablechat Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );
    println!("  {:<18} {}", "Default provider:".bold(), settings.default_provider);

    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let Some(provider) = settings.provider_settings(spec.name) else {
            continue;
        };
        let marker = if spec.name == settings.default_provider {
            "*"
        } else {
            " "
        };
        println!(
            "   {marker}{:<14} {:<44} {}",
            spec.display_name,
            provider.default_model().dimmed(),
            credential_status(&provider)
        );
    }

    println!();
    println!(
        "  {:<18} {}",
        "Registered:".bold(),
        registry.names().join(", ")
    );
    println!();

    Ok(())
}

/// One-line credential summary with secrets masked.
fn credential_status(provider: &ProviderSettings) -> String {
    let detail = match provider {
        ProviderSettings::OpenAi(s) => key_detail(&s.api_key),
        ProviderSettings::Anthropic(s) => key_detail(&s.api_key),
        ProviderSettings::Ollama(s) => {
            let base = if s.base_url.is_empty() {
                "localhost"
            } else {
                s.base_url.as_str()
            };
            format!("({base})")
        }
        ProviderSettings::Bedrock(s) => {
            let region = if s.default_region.is_empty() {
                "no region"
            } else {
                s.default_region.as_str()
            };
            format!("{} ({region})", key_detail(&s.access_key_id))
        }
    };

    if provider.has_credentials() {
        format!("{} {detail}", "✓".green())
    } else {
        format!("{} {}", "·".dimmed(), format!("not configured {detail}").dimmed())
    }
}

fn key_detail(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else {
        format!("key {}", mask_secret(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_status_masks_key() {
        let mut settings = AppSettings::default();
        settings.openai.api_key = "sk-proj-abcdefghijklmnop".to_string();

        let status = credential_status(&settings.provider_settings("openai").unwrap());
        assert!(status.contains("sk-p…mnop"));
        assert!(!status.contains("abcdefghijkl"));
    }

    #[test]
    fn credential_status_bedrock_region() {
        let mut settings = AppSettings::default();
        settings.bedrock.default_region = "eu-central-1".to_string();

        let status = credential_status(&settings.provider_settings("bedrock").unwrap());
        assert!(status.contains("not configured"));
        assert!(status.contains("eu-central-1"));
    }

    #[test]
    fn run_prints_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let registry = ProviderRegistry::with_builtin_clients();
        run(&AppSettings::default(), &registry, Some(&path)).unwrap();
    }
}
