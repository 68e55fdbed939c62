//! Pulls a JSON value out of free-form model output.
//!
//! Models asked for strict JSON still wrap it in prose or markdown fences. Extraction is a
//! two-stage fallback: parse the whole reply, and failing that parse the first balanced
//! `{...}` block found in it. Neither stage is an error path; a reply with no usable JSON is
//! simply `None`.


use serde_json::Value;
use tracing::debug;

/// Returns the JSON carried by `raw`, if any.
pub fn extract(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }

    let block = first_balanced_object(raw)?;
    match serde_json::from_str::<Value>(block) {
        Ok(value) => {
            debug!(
                raw_len = raw.len(),
                block_len = block.len(),
                "Extracted embedded JSON block"
            );
            Some(value)
        }
        Err(e) => {
            debug!(error = %e, "Embedded brace block is not valid JSON");
            None
        }
    }
}

/// Longest prefix of a reply searched for an embedded object.
pub const MAX_SCAN_BYTES: usize = 64 * 1024;

/// Finds the first `{` that opens a balanced block and returns that block.
///
/// Braces inside JSON string literals (including escaped quotes) do not count. An opening
/// brace that never closes is skipped and the search resumes at the next one. Only the first
/// [`MAX_SCAN_BYTES`] of `text` are searched.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let text = scan_window(text);
    // Scan outcome per opening-brace offset; `Some(end)` means the block closes at `end`.
    let mut settled: Vec<Option<Option<usize>>> = vec![None; text.len()];

    for (start, _) in text.match_indices('{') {
        let end = match settled[start] {
            Some(outcome) => outcome,
            None => scan_from(text, start, &mut settled),
        };
        if let Some(end) = end {
            return Some(&text[start..end]);
        }
    }
    None
}

fn scan_window(text: &str) -> &str {
    if text.len() <= MAX_SCAN_BYTES {
        return text;
    }
    let mut end = MAX_SCAN_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    debug!(
        raw_len = text.len(),
        scanned = end,
        "Reply exceeds scan window, searching prefix only"
    );
    &text[..end]
}

/// Scans from the `{` at `start` until it closes or the text ends.
///
/// Every brace opened outside a string on the way is settled too: it starts in the same
/// lexical state a fresh scan would, so its outcome is already known when the loop reaches it.
fn scan_from(text: &str, start: usize, settled: &mut [Option<Option<usize>>]) -> Option<usize> {
    let mut open: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        let at = start + i;
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => open.push(at),
            '}' => {
                let Some(opened) = open.pop() else {
                    continue;
                };
                settled[opened] = Some(Some(at + 1));
                if open.is_empty() {
                    return Some(at + 1);
                }
            }
            _ => {}
        }
    }

    for opened in open {
        settled[opened] = Some(None);
    }
    None
}
