//! Parsing of the lines typed at the chat prompt.
//!
//! Anything that does not start with `/` is a message for the model.

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    /// `Some` sets the knowledge-base toggle, `None` flips it.
    KnowledgeBase(Option<bool>),
    TestConnections,
    Clear,
    LoadMore,
    ShowConfig,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  /kb [on|off]   toggle or set use of the knowledge base
  /test          test connections to the chat model and knowledge base
  /clear         clear the current chat history
  /more          load the full chat history
  /config        show the active configuration
  /help          show this help
  /quit          exit
Anything else is sent to the model.";

/// Parse one input line. Returns `None` for a blank line.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Ask(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::to_lowercase);

    let command = match (name.as_str(), arg.as_deref()) {
        ("kb", None) => Command::KnowledgeBase(None),
        ("kb", Some("on")) => Command::KnowledgeBase(Some(true)),
        ("kb", Some("off")) => Command::KnowledgeBase(Some(false)),
        ("test", None) => Command::TestConnections,
        ("clear", None) => Command::Clear,
        ("more", None) => Command::LoadMore,
        ("config", None) => Command::ShowConfig,
        ("help" | "?", None) => Command::Help,
        ("quit" | "exit" | "q", None) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}
