//! CLI input handling
//!
//! Classifies a line read at the prompt before anything reaches the model.

/// What a line of user input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Leave the loop
    Exit,
    /// Nothing to send
    Empty,
    /// Send this text as a user turn
    Prompt(String),
}

/// Parse one line of user input
pub fn parse_input(line: &str) -> Input {
    let input = line.trim();

    if input.is_empty() {
        Input::Empty
    } else if input.eq_ignore_ascii_case("exit") {
        Input::Exit
    } else {
        Input::Prompt(input.to_string())
    }
}
