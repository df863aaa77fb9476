//! Chunk sanitization applied before producer text reaches viewers.

use std::borrow::Cow;

pub trait Sanitizer: Send + Sync {
    fn sanitize<'a>(&self, text: &'a str) -> Cow<'a, str>;
}

/// Neutralises `<` and `>` so streamed text cannot inject markup
///
/// Markdown syntax is left untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupEscaper;

impl Sanitizer for MarkupEscaper {
    fn sanitize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.contains(['<', '>']) {
            return Cow::Borrowed(text);
        }
        let mut out = String::with_capacity(text.len() + 8);
        for c in text.chars() {
            match c {
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ => out.push(c),
            }
        }
        Cow::Owned(out)
    }
}
