use super::CiEvent;

pub const SUCCESS_GLYPH: &str = "✅";
pub const FAILURE_GLYPH: &str = "❌";

/// Characters that must be backslash-escaped in MarkdownV2 text.
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

fn escape_with(text: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape plain text for MarkdownV2.
pub fn escape_text(text: &str) -> String {
    escape_with(text, MARKDOWN_V2_SPECIAL)
}

/// Escape the inside of a `code` span.
pub fn escape_code(text: &str) -> String {
    escape_with(text, &['`', '\\'])
}

/// Escape the target of an inline link.
pub fn escape_link_target(url: &str) -> String {
    escape_with(url, &[')', '\\'])
}

/// Render the CI status message in Telegram MarkdownV2.
///
/// `additional_info` is appended as its own section when non-empty.
pub fn build_ci_summary(event: &CiEvent, additional_info: Option<&str>) -> String {
    let (glyph, status_text) = if event.is_success() {
        (SUCCESS_GLYPH, "SUCCESS")
    } else {
        (FAILURE_GLYPH, "FAILED")
    };

    let mut message = format!(
        "{glyph} *{project} \\- {status_text}*\n\
         🔹 *Workflow*: `{workflow}`\n\
         🔹 *Event*: `{trigger}`\n\
         🔹 *Branch*: `{branch}`\n\
         🔹 *Commit*: [{hash}]({commit_url})\n\
         🔹 *Message*: {commit_message}\n\
         🔹 *Author*: {author}\n\
         🔹 *Time*: {timestamp}\n\n\
         [View log]({run_url})",
        project = escape_text(&event.project.to_uppercase()),
        workflow = escape_code(&event.workflow),
        trigger = escape_code(&event.event),
        branch = escape_code(&event.branch),
        hash = escape_text(&event.commit_hash),
        commit_url = escape_link_target(&event.commit_url),
        commit_message = escape_text(&event.commit_message),
        author = escape_text(&event.author),
        timestamp = escape_text(&event.timestamp),
        run_url = escape_link_target(&event.run_url),
    );

    if let Some(info) = additional_info.filter(|info| !info.is_empty()) {
        message.push_str("\n\nℹ️ *Additional info:*\n");
        message.push_str(&escape_text(info));
    }

    message
}
