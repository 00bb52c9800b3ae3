//! Input sanitization functions
//!
//! Markup is removed with a small scanner rather than a regex chain so
//! that quoted attributes, comments, unterminated tags and `<script>`
//! bodies are handled in one pass. A `<` whose meaning depends on what
//! follows it is held back until the markup after it has been removed,
//! so text glued together by a removal is classified as one piece. The
//! output therefore contains no markup and sanitizing it again is a
//! no-op. Every byte of input is scanned a bounded number of times.

use serde_json::Value;

/// Sanitize an arbitrary JSON value
///
/// - `null` becomes an empty string
/// - numbers and booleans become their string form
/// - strings have markup stripped
/// - arrays and objects are sanitized element by element, keys untouched
pub fn sanitize_input(value: &Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::String(s) => Value::String(strip_markup(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_input).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| (key.clone(), sanitize_input(v)))
                .collect(),
        ),
    }
}

/// Remove all markup from a string, keeping the text between tags
pub fn strip_markup(input: &str) -> String {
    let scanner = Scanner::new(input);
    let mut out = String::with_capacity(input.len());
    // Trailing `<` characters of `out` not yet known to be text
    let mut pending = 0usize;
    let mut rest = input;

    loop {
        if pending > 0 && !rest.starts_with('<') {
            match scanner.classify(rest) {
                Markup::Skip(len) => {
                    out.pop();
                    pending -= 1;
                    rest = &rest[len..];
                    continue;
                }
                Markup::Text => pending = 0,
            }
        }

        let Some(lt) = rest.find('<') else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..lt]);
        let after = &rest[lt + 1..];

        if after.starts_with('<') {
            out.push('<');
            pending += 1;
            rest = after;
            continue;
        }

        match scanner.classify(after) {
            Markup::Skip(len) => rest = &after[len..],
            Markup::Text => {
                out.push('<');
                pending = 0;
                rest = after;
            }
        }
    }
}

/// Trim leading and trailing whitespace from a string
pub fn trim(value: &str) -> String {
    value.trim().to_string()
}

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

enum Markup {
    /// A `<` that does not open a tag; kept as text
    Text,
    /// Byte length of markup to drop after the `<`
    Skip(usize),
}

struct Scanner<'a> {
    input: &'a str,
    last_gt: Option<usize>,
    last_attr: Option<usize>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            last_gt: input.rfind('>'),
            last_attr: input.rfind(|c: char| matches!(c, '=' | '"' | '\'')),
        }
    }

    /// Whether byte index `last` of the input lies within the suffix `s`
    fn ahead(&self, last: Option<usize>, s: &str) -> bool {
        let offset = self.input.len() - s.len();
        last.is_some_and(|i| i >= offset)
    }

    /// Classify the markup opened by a `<` directly before `after`
    fn classify(&self, after: &str) -> Markup {
        let Some(next) = after.chars().next() else {
            return Markup::Text;
        };

        if let Some(comment) = after.strip_prefix("!--") {
            return match comment.find("-->") {
                Some(end) => Markup::Skip(3 + end + 3),
                None => Markup::Skip(after.len()),
            };
        }

        if next == '!' || next == '?' {
            return match after.find('>') {
                Some(end) => Markup::Skip(end + 1),
                None => Markup::Skip(after.len()),
            };
        }

        if next != '/' && !next.is_ascii_alphabetic() {
            return Markup::Text;
        }

        // Nothing can close the tag: prose like `S<M` stays, a dangling
        // attribute list is dropped.
        if !self.ahead(self.last_gt, after) {
            return if self.ahead(self.last_attr, after) {
                Markup::Skip(after.len())
            } else {
                Markup::Text
            };
        }

        let Some(tag_end) = find_tag_end(after) else {
            return Markup::Skip(after.len());
        };

        let tag = &after[..tag_end];
        let closing = next == '/';
        let self_closing = tag.ends_with("/>");
        if !closing && !self_closing && tag_name(tag).eq_ignore_ascii_case("script") {
            return match find_script_close(&after[tag_end..]) {
                Some(close_len) => Markup::Skip(tag_end + close_len),
                None => Markup::Skip(after.len()),
            };
        }

        Markup::Skip(tag_end)
    }
}

/// Byte offset just past the `>` that ends the tag whose `<` precedes `s`
///
/// Quotes only open after `=`, so apostrophes in malformed attribute
/// lists cannot swallow the rest of the input.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut prev_significant = '<';

    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '>' => return Some(i + 1),
            None if (c == '"' || c == '\'') && prev_significant == '=' => quote = Some(c),
            None => {}
        }
        if !c.is_whitespace() {
            prev_significant = c;
        }
    }

    None
}

fn tag_name(tag: &str) -> &str {
    let body = tag.trim_start_matches('/');
    let end = body
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '-')
        .unwrap_or(body.len());
    &body[..end]
}

/// Length of script content plus its closing tag, if one exists
fn find_script_close(body: &str) -> Option<usize> {
    const CLOSE: &[u8] = b"</script";
    let bytes = body.as_bytes();
    let mut from = 0;

    while let Some(pos) = body[from..].find('<') {
        let start = from + pos;
        let after = start + CLOSE.len();
        if after <= bytes.len() && bytes[start..after].eq_ignore_ascii_case(CLOSE) {
            let boundary = body[after..]
                .chars()
                .next()
                .map_or(true, |c| c == '>' || c == '/' || c.is_whitespace());
            if boundary {
                return Some(match find_tag_end(&body[start + 1..]) {
                    Some(end) => start + 1 + end,
                    None => body.len(),
                });
            }
        }
        from = start + 1;
    }

    None
}
