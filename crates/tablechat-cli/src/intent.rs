//! Plot-intent detection: ask the model a yes/no question about a prompt.

use tablechat_providers::{ClientError, CompletionOptions, LlmClient};
use tracing::debug;

/// The yes/no answer needs only a handful of tokens.
const INTENT_MAX_TOKENS: u32 = 10;

pub fn plot_intent_prompt(message: &str) -> String {
    format!(
        "Does the following message explicitly ask for a graph, plot or visualisation? \
         {message}. Answer Yes or No only."
    )
}

/// Whether a model answer counts as "yes". Any answer containing "yes"
/// in any case does.
pub fn is_affirmative(answer: &str) -> bool {
    answer.to_lowercase().contains("yes")
}

/// Ask `client` whether `message` requests a plot.
pub async fn detect_plot_request(
    client: &dyn LlmClient,
    message: &str,
) -> Result<bool, ClientError> {
    let answer = client
        .complete(
            &plot_intent_prompt(message),
            &CompletionOptions::with_max_tokens(INTENT_MAX_TOKENS),
        )
        .await?;
    let wants_plot = is_affirmative(&answer);
    debug!(answer = %answer.trim(), wants_plot, "Plot intent");
    Ok(wants_plot)
}
