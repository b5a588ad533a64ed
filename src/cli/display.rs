//! Turn activity summary
//!
//! Renders the messages a turn appended so the user can see which tools the
//! model asked for and what came back.

use crate::core::{Message, Role};

/// Longest tool result shown before truncation
const MAX_RESULT_CHARS: usize = 500;

/// Format the messages appended by one turn
///
/// The user message itself is skipped. With `include_final` unset the
/// assistant's closing text is left out, for when it was already streamed.
pub fn format_activity(messages: &[Message], include_final: bool) -> String {
    let mut lines = Vec::new();

    for message in messages {
        match message.role {
            Role::Assistant => {
                if let Some(ref calls) = message.tool_calls {
                    for call in calls {
                        lines.push(format!(
                            "[Calling tool {} with arguments: {}]",
                            call.name,
                            if call.arguments.trim().is_empty() {
                                "{}"
                            } else {
                                call.arguments.as_str()
                            }
                        ));
                    }
                } else if include_final {
                    if let Some(ref text) = message.content {
                        lines.push(text.clone());
                    }
                }
            }
            Role::Tool => {
                lines.push(format!(
                    "[Tool result {}]: {}",
                    message.tool_call_id.as_deref().unwrap_or("?"),
                    truncate(message.text(), MAX_RESULT_CHARS)
                ));
            }
            Role::User | Role::System => {}
        }
    }

    lines.join("\n")
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
