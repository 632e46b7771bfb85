//! Reply sanitizer: turns raw model output into a short human-safe line.
//!
//! The extraction pipeline reads the raw text separately; this pass only decides
//! what is safe to echo on the chat/notice channel.

const FENCE: &str = "```";

/// Maximum characters echoed to the notice channel.
pub const REPLY_MAX_CHARS: usize = 240;
const ELLIPSIS: &str = "...";

/// Boilerplate openers that are never worth echoing.
const DISALLOWED_PREAMBLES: [&str; 5] = [
    "as an ai",
    "as a language model",
    "i'm sorry, but",
    "i am sorry, but",
    "here is the json",
];

/// Strips fences and the first brace-delimited blob, collapses whitespace, and
/// bounds the result to [`REPLY_MAX_CHARS`]. Pure; never fails.
pub fn sanitize_reply(raw: &str) -> String {
    let text = strip_fenced_blocks(raw);
    let text = strip_first_brace_span(&text);

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return String::new();
    }

    let lowered = collapsed.to_lowercase();
    if DISALLOWED_PREAMBLES.iter().any(|p| lowered.starts_with(p)) {
        return String::new();
    }

    truncate_chars(&collapsed)
}

/// Removes every fenced region, fence markers included. An unterminated fence
/// swallows the rest of the text rather than risk echoing half a payload.
fn strip_fenced_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(open) = rest.find(FENCE) else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..open]);
        let after_open = &rest[open + FENCE.len()..];
        let Some(close) = after_open.find(FENCE) else {
            return out;
        };
        rest = &after_open[close + FENCE.len()..];
    }
}

/// Removes the first greedy `{...}` span (first `{` through last `}`), single
/// non-recursive pass. Leaves the text alone if no complete span exists.
fn strip_first_brace_span(text: &str) -> String {
    let Some(start) = text.find('{') else {
        return text.to_string();
    };
    let Some(end) = text.rfind('}') else {
        return text.to_string();
    };
    if end < start {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    out.push_str(&text[end + 1..]);
    out
}

fn truncate_chars(text: &str) -> String {
    if text.chars().count() <= REPLY_MAX_CHARS {
        return text.to_string();
    }
    let mut out: String = text
        .chars()
        .take(REPLY_MAX_CHARS - ELLIPSIS.len())
        .collect();
    out.push_str(ELLIPSIS);
    out
}
