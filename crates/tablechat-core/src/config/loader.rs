//! Settings loader: reads `~/.tablechat/config.json`, a `.env` file, and
//! environment variables.
//!
//! # Loading precedence
//! 1. Defaults (from `AppSettings::default()`)
//! 2. JSON file at `~/.tablechat/config.json`
//! 3. Provider environment variables (`OPENAI_API_KEY`, `AWS_DEFAULT_REGION`, ...),
//!    including those loaded from a `.env` file
//! 4. Environment variables `TABLECHAT_<SECTION>__<FIELD>`

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use tracing::{debug, info, warn};

use super::schema::{
    AnthropicSettings, AppSettings, BedrockSettings, OllamaSettings, OpenAiSettings,
};

static SETTINGS: OnceLock<AppSettings> = OnceLock::new();

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Process-wide settings, loaded from the default locations on first access.
///
/// Concurrent first callers all observe the same instance; loading runs once.
pub fn get_settings() -> &'static AppSettings {
    SETTINGS.get_or_init(|| load_settings(None))
}

/// Install `settings` as the process-wide settings.
///
/// Returns the installed instance. If settings were already initialized,
/// the existing instance wins and `settings` is dropped.
pub fn init_settings(settings: AppSettings) -> &'static AppSettings {
    let mut candidate = Some(settings);
    let installed = SETTINGS.get_or_init(|| candidate.take().unwrap_or_default());
    if candidate.is_some() {
        debug!("Settings already initialized, keeping the existing instance");
    }
    installed
}

/// Load settings from the given (or default) path + `.env` + env vars.
///
/// Falls back to defaults if the file doesn't exist or can't be parsed.
pub fn load_settings(path: Option<&Path>) -> AppSettings {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_dotenv();
    let settings = load_settings_from_path(&config_path);
    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

/// Load `.env` from the working directory or one of its ancestors.
///
/// Variables already present in the environment are not overridden.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }
}

/// Load a specific `.env` file. Same override rules as [`load_dotenv`].
pub fn load_dotenv_from(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file at {}", path.display()),
        Err(e) => warn!("Failed to load {}: {}", path.display(), e),
    }
}

/// Load settings from a specific file path (no environment applied).
fn load_settings_from_path(path: &Path) -> AppSettings {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return AppSettings::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return AppSettings::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(settings) => reset_zero_max_tokens(settings),
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            AppSettings::default()
        }
    }
}

/// `maxTokens: 0` is never a usable limit; fall back to the section default.
fn reset_zero_max_tokens(mut settings: AppSettings) -> AppSettings {
    let sections = [
        ("openai", &mut settings.openai.max_tokens, OpenAiSettings::default().max_tokens),
        ("anthropic", &mut settings.anthropic.max_tokens, AnthropicSettings::default().max_tokens),
        ("ollama", &mut settings.ollama.max_tokens, OllamaSettings::default().max_tokens),
        ("bedrock", &mut settings.bedrock.max_tokens, BedrockSettings::default().max_tokens),
    ];
    for (name, max_tokens, default) in sections {
        if *max_tokens == Some(0) {
            warn!("Ignoring {name}.maxTokens: must be positive");
            *max_tokens = default;
        }
    }
    settings
}

/// Save settings to disk (pretty-printed JSON with camelCase keys).
pub fn save_settings(settings: &AppSettings, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment overrides on top of loaded settings.
///
/// `lookup` returns the value of an environment variable; empty values are
/// treated as unset.
///
/// Provider credentials:
/// - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `OLLAMA_API_KEY`, `OLLAMA_BASE_URL`
/// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`, `AWS_DEFAULT_REGION`
///
/// Explicit overrides:
/// - `TABLECHAT_DEFAULT_PROVIDER` → `default_provider`
/// - `TABLECHAT_<PROVIDER>__DEFAULT_MODEL` / `__TEMPERATURE` / `__MAX_TOKENS` / `__MAX_RETRIES`
/// - `TABLECHAT_<PROVIDER>__API_KEY`, `TABLECHAT_<PROVIDER>__BASE_URL` (OpenAI, Anthropic, Ollama)
fn apply_env_overrides(
    mut settings: AppSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> AppSettings {
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    // Provider credentials
    if let Some(val) = get("OPENAI_API_KEY") {
        settings.openai.api_key = val;
    }
    if let Some(val) = get("ANTHROPIC_API_KEY") {
        settings.anthropic.api_key = val;
    }
    if let Some(val) = get("OLLAMA_API_KEY") {
        settings.ollama.api_key = val;
    }
    if let Some(val) = get("OLLAMA_BASE_URL") {
        settings.ollama.base_url = val;
    }
    if let Some(val) = get("AWS_ACCESS_KEY_ID") {
        settings.bedrock.access_key_id = val;
    }
    if let Some(val) = get("AWS_SECRET_ACCESS_KEY") {
        settings.bedrock.secret_access_key = val;
    }
    if let Some(val) = get("AWS_SESSION_TOKEN") {
        settings.bedrock.session_token = Some(val);
    }
    if let Some(val) = get("AWS_DEFAULT_REGION") {
        settings.bedrock.default_region = val;
    }

    if let Some(val) = get("TABLECHAT_DEFAULT_PROVIDER") {
        settings.default_provider = val;
    }

    let o = &mut settings.openai;
    apply_common_env(
        &get,
        "OPENAI",
        (&mut o.default_model, &mut o.temperature, &mut o.max_tokens, &mut o.max_retries),
    );
    if let Some(val) = get("TABLECHAT_OPENAI__API_KEY") {
        o.api_key = val;
    }
    if let Some(val) = get("TABLECHAT_OPENAI__BASE_URL") {
        o.base_url = Some(val);
    }

    let a = &mut settings.anthropic;
    apply_common_env(
        &get,
        "ANTHROPIC",
        (&mut a.default_model, &mut a.temperature, &mut a.max_tokens, &mut a.max_retries),
    );
    if let Some(val) = get("TABLECHAT_ANTHROPIC__API_KEY") {
        a.api_key = val;
    }
    if let Some(val) = get("TABLECHAT_ANTHROPIC__BASE_URL") {
        a.base_url = Some(val);
    }

    let l = &mut settings.ollama;
    apply_common_env(
        &get,
        "OLLAMA",
        (&mut l.default_model, &mut l.temperature, &mut l.max_tokens, &mut l.max_retries),
    );
    if let Some(val) = get("TABLECHAT_OLLAMA__API_KEY") {
        l.api_key = val;
    }
    if let Some(val) = get("TABLECHAT_OLLAMA__BASE_URL") {
        l.base_url = val;
    }

    let b = &mut settings.bedrock;
    apply_common_env(
        &get,
        "BEDROCK",
        (&mut b.default_model, &mut b.temperature, &mut b.max_tokens, &mut b.max_retries),
    );

    settings
}

/// Apply the `TABLECHAT_<NAME>__*` overrides shared by every provider.
fn apply_common_env(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    (model, temperature, max_tokens, max_retries): (&mut String, &mut f64, &mut Option<u32>, &mut u32),
) {
    if let Some(val) = get(&format!("TABLECHAT_{name}__DEFAULT_MODEL")) {
        *model = val;
    }
    if let Some(t) = parse_env(get, &format!("TABLECHAT_{name}__TEMPERATURE")) {
        *temperature = t;
    }
    let key = format!("TABLECHAT_{name}__MAX_TOKENS");
    match parse_env::<u32>(get, &key) {
        Some(0) => warn!("Ignoring {key}: max tokens must be positive"),
        Some(n) => *max_tokens = Some(n),
        None => {}
    }
    if let Some(n) = parse_env(get, &format!("TABLECHAT_{name}__MAX_RETRIES")) {
        *max_retries = n;
    }
}

fn parse_env<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = get(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}: cannot parse '{}'", key, raw);
            None
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_missing_file() {
        let settings = load_settings_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "defaultProvider": "openai",
            "openai": {
                "defaultModel": "gpt-4o-mini",
                "maxTokens": 2048
            }
        }"#,
        );

        let settings = load_settings_from_path(file.path());
        assert_eq!(settings.default_provider, "openai");
        assert_eq!(settings.openai.default_model, "gpt-4o-mini");
        assert_eq!(settings.openai.max_tokens, Some(2048));
        // Default preserved
        assert_eq!(settings.openai.temperature, 0.0);
        assert_eq!(settings.ollama.request_timeout_secs, 240);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let settings = load_settings_from_path(file.path());
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let settings = load_settings_from_path(file.path());
        assert_eq!(settings.bedrock.context_window, 8192);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut settings = AppSettings::default();
        settings.anthropic.default_model = "claude-3-5-haiku-latest".to_string();
        settings.anthropic.api_key = "sk-ant-test".to_string();
        settings.bedrock.session_token = Some("token".to_string());

        save_settings(&settings, Some(&path)).unwrap();

        let reloaded = load_settings_from_path(&path);
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_save_and_reload_unset_bedrock_max_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut settings = AppSettings::default();
        settings.bedrock.max_tokens = None;
        save_settings(&settings, Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(raw["bedrock"]["maxTokens"].is_null());

        let reloaded = load_settings_from_path(&path);
        assert_eq!(reloaded.bedrock.max_tokens, None);
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_zero_max_tokens_in_file_uses_default() {
        let file = write_temp_json(
            r#"{
            "openai": { "maxTokens": 0 },
            "bedrock": { "maxTokens": 0 },
            "ollama": { "maxTokens": 512 }
        }"#,
        );

        let settings = load_settings_from_path(file.path());
        assert_eq!(settings.openai.max_tokens, None);
        assert_eq!(settings.bedrock.max_tokens, Some(1024));
        assert_eq!(settings.ollama.max_tokens, Some(512));
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_settings(&AppSettings::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["bedrock"].get("maxTokens").is_some());
        assert!(raw["bedrock"].get("max_tokens").is_none());
        assert!(raw["ollama"].get("requestTimeoutSecs").is_some());
        assert!(raw.get("defaultProvider").is_some());
    }

    #[test]
    fn test_env_provider_credentials() {
        let settings = apply_env_overrides(
            AppSettings::default(),
            env(&[
                ("OPENAI_API_KEY", "sk-openai"),
                ("ANTHROPIC_API_KEY", "sk-ant"),
                ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
                ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
                ("AWS_SECRET_ACCESS_KEY", "secret"),
                ("AWS_SESSION_TOKEN", "session"),
                ("AWS_DEFAULT_REGION", "ap-southeast-2"),
            ]),
        );

        assert_eq!(settings.openai.api_key, "sk-openai");
        assert_eq!(settings.anthropic.api_key, "sk-ant");
        assert_eq!(settings.ollama.base_url, "http://gpu-box:11434");
        assert_eq!(settings.bedrock.access_key_id, "AKIAEXAMPLE");
        assert_eq!(settings.bedrock.secret_access_key, "secret");
        assert_eq!(settings.bedrock.session_token.as_deref(), Some("session"));
        assert_eq!(settings.bedrock.default_region, "ap-southeast-2");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut base = AppSettings::default();
        base.openai.api_key = "from-file".to_string();

        let settings = apply_env_overrides(base, env(&[("OPENAI_API_KEY", "from-env")]));
        assert_eq!(settings.openai.api_key, "from-env");
    }

    #[test]
    fn test_empty_env_value_is_unset() {
        let mut base = AppSettings::default();
        base.openai.api_key = "from-file".to_string();

        let settings = apply_env_overrides(base, env(&[("OPENAI_API_KEY", "")]));
        assert_eq!(settings.openai.api_key, "from-file");
        assert!(settings.bedrock.session_token.is_none());
    }

    #[test]
    fn test_env_tablechat_overrides() {
        let settings = apply_env_overrides(
            AppSettings::default(),
            env(&[
                ("TABLECHAT_DEFAULT_PROVIDER", "ollama"),
                ("TABLECHAT_OLLAMA__DEFAULT_MODEL", "llama3.1:8b"),
                ("TABLECHAT_OLLAMA__TEMPERATURE", "0.2"),
                ("TABLECHAT_BEDROCK__MAX_TOKENS", "2048"),
                ("TABLECHAT_ANTHROPIC__MAX_RETRIES", "0"),
                ("TABLECHAT_OPENAI__BASE_URL", "https://proxy.internal/v1"),
            ]),
        );

        assert_eq!(settings.default_provider, "ollama");
        assert_eq!(settings.ollama.default_model, "llama3.1:8b");
        assert_eq!(settings.ollama.temperature, 0.2);
        assert_eq!(settings.bedrock.max_tokens, Some(2048));
        assert_eq!(settings.anthropic.max_retries, 0);
        assert_eq!(
            settings.openai.base_url.as_deref(),
            Some("https://proxy.internal/v1")
        );
    }

    #[test]
    fn test_env_unparseable_number_ignored() {
        let settings = apply_env_overrides(
            AppSettings::default(),
            env(&[("TABLECHAT_OPENAI__MAX_TOKENS", "lots")]),
        );
        assert_eq!(settings.openai.max_tokens, None);
    }

    #[test]
    fn test_env_zero_max_tokens_ignored() {
        let settings = apply_env_overrides(
            AppSettings::default(),
            env(&[
                ("TABLECHAT_OPENAI__MAX_TOKENS", "0"),
                ("TABLECHAT_BEDROCK__MAX_TOKENS", "0"),
            ]),
        );
        assert_eq!(settings.openai.max_tokens, None);
        assert_eq!(settings.bedrock.max_tokens, Some(1024));
    }

    #[test]
    fn test_load_dotenv_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "TABLECHAT_DOTENV_TEST_KEY=from-dotenv-file\nTABLECHAT_DOTENV_TEST_KEPT=from-dotenv-file\n",
        )
        .unwrap();
        std::env::set_var("TABLECHAT_DOTENV_TEST_KEPT", "from-process");

        load_dotenv_from(&path);

        assert_eq!(
            std::env::var("TABLECHAT_DOTENV_TEST_KEY").as_deref(),
            Ok("from-dotenv-file")
        );
        assert_eq!(
            std::env::var("TABLECHAT_DOTENV_TEST_KEPT").as_deref(),
            Ok("from-process")
        );
    }

    #[test]
    fn test_load_dotenv_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        load_dotenv_from(&dir.path().join(".env"));
        assert!(std::env::var("TABLECHAT_DOTENV_TEST_MISSING").is_err());
    }

    #[test]
    fn test_get_settings_is_computed_once() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| get_settings() as *const AppSettings as usize))
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
        assert!(std::ptr::eq(get_settings(), init_settings(AppSettings::default())));
    }
}
