//! Interactive chat REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history and
//! keeps the conversation so every turn is sent with its context.

use std::sync::Arc;

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use tablechat_core::types::Message;
use tablechat_providers::{CompletionOptions, LlmClient};

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

const RESET_COMMAND: &str = "/reset";

const SYSTEM_PROMPT: &str = "You are a data analyst. Answer questions about the user's \
tabular data concisely and show your reasoning when you compute values.";

/// Conversation history sent with every turn.
#[derive(Debug)]
struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    fn new() -> Self {
        Self {
            messages: vec![Message::system(SYSTEM_PROMPT)],
        }
    }

    fn push_user(&mut self, content: &str) {
        self.messages.push(Message::user(content));
    }

    fn push_assistant(&mut self, content: &str) {
        self.messages.push(Message::assistant(content));
    }

    /// Drop the last user turn after a failed request.
    fn pop_user(&mut self) {
        if matches!(self.messages.last(), Some(Message::User { .. })) {
            self.messages.pop();
        }
    }

    fn reset(&mut self) {
        self.messages.truncate(1);
    }

    fn turns(&self) -> usize {
        self.messages.len() - 1
    }
}

/// Run the interactive REPL loop.
pub async fn run(client: Arc<dyn LlmClient>) -> Result<()> {
    helpers::print_banner(client.display_name(), client.model());

    let mut editor = create_editor()?;
    let mut conversation = Conversation::new();
    let options = CompletionOptions::default();

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye! 👋");
            break;
        }

        let _ = editor.add_history_entry(&input);

        if trimmed.eq_ignore_ascii_case(RESET_COMMAND) {
            conversation.reset();
            println!("History cleared.\n");
            continue;
        }

        conversation.push_user(trimmed);
        debug!(turns = conversation.turns(), input = trimmed, "sending turn");
        helpers::print_thinking();

        match client.chat(&conversation.messages, &options).await {
            Ok(response) => {
                helpers::clear_thinking();
                conversation.push_assistant(&response.content);
                helpers::print_response(client.display_name(), &response.content);
            }
            Err(e) => {
                helpers::clear_thinking();
                conversation.pop_user();
                eprintln!("\n❌ Error: {e}\n");
            }
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    tablechat_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("EXIT"));
        assert!(is_exit_command("/quit"));
        assert!(is_exit_command(":q"));
        assert!(!is_exit_command("hello"));
        assert!(!is_exit_command(""));
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".tablechat"));
        assert!(path.ends_with("history/cli_history"));
    }

    #[test]
    fn conversation_keeps_system_prompt() {
        let mut conversation = Conversation::new();
        conversation.push_user("How many rows?");
        conversation.push_assistant("120");
        assert_eq!(conversation.turns(), 2);
        assert!(conversation.messages[0].is_system());

        conversation.reset();
        assert_eq!(conversation.turns(), 0);
        assert!(conversation.messages[0].is_system());
    }

    #[test]
    fn failed_turn_is_dropped() {
        let mut conversation = Conversation::new();
        conversation.push_user("first");
        conversation.push_assistant("ok");
        conversation.push_user("second");

        conversation.pop_user();
        assert_eq!(conversation.turns(), 2);
        assert_eq!(conversation.messages.last().unwrap().content(), "ok");

        conversation.pop_user();
        assert_eq!(conversation.turns(), 2);
    }
}
