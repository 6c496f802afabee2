pub mod telegram;

use serde::Serialize;

/// Formatting modes the Bot API is asked to apply to message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    /// Recognized mode names only; anything else yields `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "MarkdownV2" => Some(ParseMode::MarkdownV2),
            "HTML" => Some(ParseMode::Html),
            _ => None,
        }
    }
}

/// A message to deliver to the configured chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// The message text
    pub text: String,
    /// How the text should be formatted, plain text when unset
    pub parse_mode: Option<ParseMode>,
    /// Suppress link previews (on by default)
    pub disable_web_page_preview: bool,
    /// Deliver without a notification sound
    pub silent: bool,
}

impl OutgoingMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: None,
            disable_web_page_preview: true,
            silent: false,
        }
    }

    pub fn with_parse_mode(mut self, parse_mode: Option<ParseMode>) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    pub fn with_link_preview(mut self, enabled: bool) -> Self {
        self.disable_web_page_preview = !enabled;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}
