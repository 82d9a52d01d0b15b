use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::palette::Palette;

const MARKER: char = '*';

/// The `{reason, edit}` object the edit prompt asks the model to produce.
///
/// Reading a reply this way is up to the caller; [`super::request_edit`]
/// always hands back the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSuggestion {
    pub reason: String,
    pub edit: String,
}

impl EditSuggestion {
    /// Reads the first `{` through the last `}` of the reply, so code fences
    /// or chatter around the object are tolerated.
    pub fn parse(raw: &str) -> Result<Self> {
        let start = raw
            .find('{')
            .ok_or_else(|| anyhow!("No JSON object found in model reply: {raw}"))?;
        let end = raw
            .rfind('}')
            .filter(|end| *end > start)
            .ok_or_else(|| anyhow!("Unterminated JSON object in model reply: {raw}"))?;

        serde_json::from_str(&raw[start..=end])
            .with_context(|| format!("Model reply is not a valid edit suggestion: {raw}"))
    }

    pub fn marked_spans(&self) -> Vec<(usize, usize)> {
        find_marked_spans(&self.edit)
    }

    pub fn plain_edit(&self) -> String {
        strip_markers(&self.edit)
    }

    /// The edit with each marked span painted and its markers dropped.
    pub fn highlighted(&self) -> String {
        rewrite_spans(&self.edit, |inner| Palette::paint(Palette::WARNING, inner))
    }
}

/// Byte ranges of `*...*` and `**...**` spans, markers included. A run of
/// asterisks counts as one marker; an unclosed marker is ignored.
pub fn find_marked_spans(edit: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open = None;
    let mut chars = edit.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        if ch != MARKER {
            continue;
        }
        let mut end = i + ch.len_utf8();
        while let Some(&(j, MARKER)) = chars.peek() {
            end = j + MARKER.len_utf8();
            chars.next();
        }
        match open.take() {
            Some(start) => spans.push((start, end)),
            None => open = Some(i),
        }
    }

    spans
}

pub fn strip_markers(edit: &str) -> String {
    rewrite_spans(edit, str::to_string)
}

fn rewrite_spans<F>(edit: &str, render: F) -> String
where
    F: Fn(&str) -> String,
{
    let mut out = String::with_capacity(edit.len());
    let mut cursor = 0;

    for (start, end) in find_marked_spans(edit) {
        out.push_str(&edit[cursor..start]);
        out.push_str(&render(edit[start..end].trim_matches(MARKER)));
        cursor = end;
    }
    out.push_str(&edit[cursor..]);

    out
}
