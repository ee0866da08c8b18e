//! Routing of inbound text to command grammars.

/// Which grammar a text message should be handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCommand {
    Create,
    Admin,
}

/// Check if a message is a bot command (starts with `/`).
pub fn is_command(text: &str) -> bool {
    text.starts_with('/')
}

/// Classify a text message by its prefix.
///
/// Admin commands are checked first. Matching is a plain prefix test on
/// the trimmed text, so `/party@RallyBot` reaches the creation grammar as
/// well.
pub fn classify(text: &str, creation_prefixes: &[String], admin_prefix: &str) -> Option<TextCommand> {
    let text = text.trim();
    if !is_command(text) {
        return None;
    }
    if text.starts_with(admin_prefix) {
        return Some(TextCommand::Admin);
    }
    creation_prefixes
        .iter()
        .any(|prefix| text.starts_with(prefix.as_str()))
        .then_some(TextCommand::Create)
}
