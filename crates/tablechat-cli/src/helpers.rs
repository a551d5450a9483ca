//! Shared CLI helpers: path expansion, response printing, banner.

use std::path::PathBuf;

use colored::Colorize;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a model answer to stdout, headed by the provider's name.
pub fn print_response(provider: &str, response: &str) {
    println!();
    println!("{}", format!("📊 {provider}").cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", response.trim());
    }
    println!();
}

/// Report whether the prompt was judged to ask for a plot.
pub fn print_plot_intent(wants_plot: bool) {
    if wants_plot {
        println!("{} {}", "📈".green(), "Plot requested".green());
    } else {
        println!("{}", "· no plot requested".dimmed());
    }
}

/// Print the banner shown at REPL start.
pub fn print_banner(provider: &str, model: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "📊 tablechat".cyan().bold(), version.dimmed());
    println!("{}", format!("{provider} · {model}").dimmed());
    println!(
        "{}",
        "Type a message, \"/reset\" to clear history, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder (for non-log mode).
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
