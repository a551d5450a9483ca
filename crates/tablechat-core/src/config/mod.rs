//! Settings system: schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use tablechat_core::config::{self, SettingsSource};
//!
//! let settings = config::get_settings();
//! let openai = settings.provider_settings("openai").unwrap();
//! println!("Model: {}", openai.default_model());
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{
    get_config_path, get_settings, init_settings, load_dotenv, load_dotenv_from, load_settings,
    save_settings,
};
pub use schema::{
    AnthropicSettings, AppSettings, BedrockSettings, LlmSettings, OllamaSettings,
    OpenAiSettings, ProviderSettings, SettingsSource, PROVIDER_NAMES,
};
