use anyhow::{Context, Result};

use crate::core::state::AppState;
use crate::db::types::ChatRole;
use crate::repositories;
use crate::services::anthropic::ChatTurn;

const TUTOR_SYSTEM_PROMPT: &str = "\
You are a patient programming tutor for students in an intensive web-development \
cohort. Explain concepts step by step, prefer guiding questions over finished \
answers, and keep replies focused on the student's question. Use short code \
examples where they help.";

const TITLE_SYSTEM_PROMPT: &str = "\
Name this conversation. Reply with only a short title of at most five words, \
no quotes and no trailing punctuation.";

/// Answers the newest message in the chat using the recent history as
/// context. The caller persists the user turn before asking for a reply, so
/// the history always ends with it.
pub(crate) async fn reply(state: &AppState, chat_id: &str) -> Result<String> {
    let limit = state.settings().ai().tutor_history_limit as i64;
    let history = repositories::chats::recent_messages(state.db(), chat_id, limit)
        .await
        .context("Failed to load chat history")?;

    if history.is_empty() {
        anyhow::bail!("Chat has no messages to answer");
    }

    let turns: Vec<ChatTurn> = history
        .into_iter()
        .map(|message| match message.role {
            ChatRole::User => ChatTurn::user(message.content),
            ChatRole::Assistant => ChatTurn::assistant(message.content),
        })
        .collect();

    let completion = state.ai().complete(TUTOR_SYSTEM_PROMPT, &turns).await?;
    Ok(completion.text)
}

/// Names a new chat after its opening message. Falls back to plain
/// truncation whenever the model is unavailable or answers garbage.
pub(crate) async fn generate_chat_title(state: &AppState, first_message: &str) -> String {
    match state
        .ai()
        .complete(TITLE_SYSTEM_PROMPT, &[ChatTurn::user(first_message.to_string())])
        .await
    {
        Ok(completion) => {
            let title = sanitize_title(&completion.text);
            if title.is_empty() {
                fallback_title(first_message)
            } else {
                title
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "Title generation failed; using truncation");
            fallback_title(first_message)
        }
    }
}

fn sanitize_title(raw: &str) -> String {
    let first_line = raw.trim().lines().next().unwrap_or_default();
    let stripped = first_line.trim_matches(|c| c == '"' || c == '\'' || c == '`').trim();
    stripped.chars().take(60).collect::<String>().trim_end().to_string()
}

/// First five words of the message, punctuation stripped, capped at 30
/// characters.
pub(crate) fn fallback_title(message: &str) -> String {
    let cleaned: String = message
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let title: String = cleaned
        .split_whitespace()
        .take(5)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(30)
        .collect();

    let title = title.trim_end().to_string();
    if title.is_empty() {
        "New chat".to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_takes_first_five_words() {
        assert_eq!(
            fallback_title("how do I center a div in css"),
            "how do I center a"
        );
    }

    #[test]
    fn fallback_strips_punctuation() {
        assert_eq!(fallback_title("what's up, doc?"), "what s up doc");
    }

    #[test]
    fn fallback_caps_at_thirty_characters() {
        let title = fallback_title("supercalifragilisticexpialidocious antidisestablishmentarianism word");
        assert!(title.chars().count() <= 30);
        assert!(!title.ends_with(' '));
    }

    #[test]
    fn fallback_on_empty_message() {
        assert_eq!(fallback_title(""), "New chat");
        assert_eq!(fallback_title("!!! ???"), "New chat");
    }

    #[test]
    fn sanitize_trims_quotes_and_extra_lines() {
        assert_eq!(sanitize_title("\"CSS Centering Help\"\nextra"), "CSS Centering Help");
        assert_eq!(sanitize_title("  `Rust ownership`  "), "Rust ownership");
    }
}
