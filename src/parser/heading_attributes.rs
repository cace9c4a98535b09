//! Trailing `{#id .class key="value"}` blocks on ATX headings.

use crate::action::{ActionSpans, ActionsAt};
use crate::strings;

/// Looks for an attribute block closing `content`.  Returns the index at
/// which the block starts, and the attributes it holds in the order they
/// were written.  Several classes are joined into one `class` attribute.
///
/// The block must open with a single `{`; a trailing template action is
/// never taken for one.
pub fn split_trailing(content: &[u8], action_aware: bool) -> Option<(usize, Vec<(String, String)>)> {
    let trimmed = strings::rtrim_slice(content);
    if trimmed.last() != Some(&b'}') {
        return None;
    }

    let spans = if action_aware {
        ActionSpans::scan(trimmed)
    } else {
        ActionSpans::default()
    };

    let mut i = 0;
    while i < trimmed.len() {
        if let Some(end) = spans.end_of(i) {
            i = end;
            continue;
        }
        if trimmed[i] == b'{' {
            if let Some((attrs, consumed)) = parse_block(&trimmed[i..], spans.at(i)) {
                if i + consumed == trimmed.len() {
                    return Some((i, attrs));
                }
            }
        }
        i += 1;
    }
    None
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':')
}

// A bare word: anything up to whitespace, a quote or the closing brace, with
// template actions taken whole.
fn bare_word(input: &[u8], mut i: usize, actions: ActionsAt<'_>) -> usize {
    while i < input.len() {
        if let Some(end) = actions.end_of(i) {
            i = end;
            continue;
        }
        match input[i] {
            b' ' | b'\t' | b'}' | b'"' | b'\'' | b'{' => break,
            _ => i += 1,
        }
    }
    i
}

// A quoted value starting at the quote at `input[i]`.  Returns the bytes
// between the quotes and the index just past the closing one.
fn quoted<'i>(input: &'i [u8], i: usize, actions: ActionsAt<'_>) -> Option<(&'i [u8], usize)> {
    let quote = input[i];
    let mut j = i + 1;
    while j < input.len() {
        if let Some(end) = actions.end_of(j) {
            j = end;
            continue;
        }
        match input[j] {
            b'\\' => j += 2,
            b if b == quote => return Some((&input[i + 1..j], j + 1)),
            _ => j += 1,
        }
    }
    None
}

// Undoes the backslash escapes a quoted value may use for its own quote
// character.  Anything else, template actions included, stays as written.
fn unquote(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' && matches!(raw.get(i + 1), Some(b'"' | b'\'' | b'\\')) {
            i += 1;
        }
        out.push(raw[i]);
        i += 1;
    }
    out
}

fn push_class(attrs: &mut Vec<(String, String)>, class: String) {
    match attrs.iter_mut().find(|(k, _)| k == "class") {
        Some((_, v)) => {
            v.push(' ');
            v.push_str(&class);
        }
        None => attrs.push(("class".to_string(), class)),
    }
}

fn parse_block(input: &[u8], actions: ActionsAt<'_>) -> Option<(Vec<(String, String)>, usize)> {
    let mut attrs: Vec<(String, String)> = vec![];
    let mut i = 1;

    loop {
        while input.get(i).map_or(false, |&b| strings::is_space_or_tab(b)) {
            i += 1;
        }

        match *input.get(i)? {
            b'}' => return Some((attrs, i + 1)),
            b'#' | b'.' => {
                let end = bare_word(input, i + 1, actions);
                if end == i + 1 {
                    return None;
                }
                let word = strings::to_string(input[i + 1..end].to_vec());
                if input[i] == b'#' {
                    attrs.retain(|(k, _)| k != "id");
                    attrs.push(("id".to_string(), word));
                } else {
                    push_class(&mut attrs, word);
                }
                i = end;
            }
            b if is_name_byte(b) => {
                let start = i;
                while input.get(i).map_or(false, |&b| is_name_byte(b)) {
                    i += 1;
                }
                let key = strings::to_string(input[start..i].to_vec());
                if input.get(i) != Some(&b'=') {
                    return None;
                }
                i += 1;

                let raw = match *input.get(i)? {
                    b'"' | b'\'' => {
                        let (raw, next) = quoted(input, i, actions)?;
                        i = next;
                        raw
                    }
                    _ => {
                        let end = bare_word(input, i, actions);
                        let raw = &input[i..end];
                        i = end;
                        raw
                    }
                };
                let value = strings::to_string(unquote(raw));

                if key == "class" {
                    push_class(&mut attrs, value);
                } else {
                    attrs.retain(|(k, _)| *k != key);
                    attrs.push((key, value));
                }
            }
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(v: &[(&str, &str)]) -> Vec<(String, String)> {
        v.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn ids_and_classes() {
        assert_eq!(
            split_trailing(b"Hi {#top .big .bold}", true),
            Some((3, pairs(&[("id", "top"), ("class", "big bold")])))
        );
    }

    #[test]
    fn quoted_values_keep_actions() {
        let line = br#"Heading {data-msg="{{ printf \"Hello %s\" .Name }}"}"#;
        assert_eq!(
            split_trailing(line, true),
            Some((
                8,
                pairs(&[("data-msg", r#"{{ printf "Hello %s" .Name }}"#)])
            ))
        );
    }

    #[test]
    fn quotes_inside_actions_do_not_close_values() {
        let line = br#"T {title="{{ .T "x" }}" .c}"#;
        assert_eq!(
            split_trailing(line, true),
            Some((2, pairs(&[("title", r#"{{ .T "x" }}"#), ("class", "c")])))
        );
    }

    #[test]
    fn trailing_action_is_not_a_block() {
        assert_eq!(split_trailing(b"Hello {{ .Name }}", true), None);
        assert_eq!(split_trailing(b"Hello {x}", true), None);
        assert_eq!(split_trailing(b"Hello", true), None);
    }

    #[test]
    fn unclosed_quote_is_not_a_block() {
        assert_eq!(split_trailing(br#"Hi {id="x}"#, true), None);
    }
}
