//! Utility helpers: path resolution and secret masking.

use std::path::PathBuf;

/// Get the tablechat data directory (e.g. `~/.tablechat/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".tablechat")
}

/// Mask a credential for display, keeping at most four characters at each end.
///
/// Short secrets are masked entirely. Empty input stays empty.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= 12 {
        return "*".repeat(count);
    }
    let head: String = secret.chars().take(4).collect();
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{head}…{tail}")
}

/// Helper to get home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
