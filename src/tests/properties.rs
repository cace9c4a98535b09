use proptest::prelude::*;

use crate::action::{self, ActionSpans, Piece};
use crate::html::writer::{self, ActionWriter, AttributeKind};
use crate::html::{escape, escape_href};
use crate::strings;

use super::*;

// Action bodies that contain no delimiters or quotes of their own.
fn action_body() -> impl Strategy<Value = String> {
    "[ .A-Za-z0-9|()$-]{0,20}"
}

fn render(md: &str, template_actions: bool) -> String {
    let mut options = Options::default();
    options.extension.template_actions = template_actions;
    markdown_to_html(md, &options)
}

// Pairs up braces the slow way, with no notion of string literals.  Only
// meaningful for input without quotes.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    if !bytes[start..].starts_with(b"{{") {
        return None;
    }
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"{{") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"}}") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return Some(i);
            }
        } else {
            i += 1;
        }
    }
    None
}

fn written<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut ActionWriter<'_>) -> std::io::Result<()>,
{
    let mut out: Vec<u8> = vec![];
    f(&mut ActionWriter::new(&mut out)).unwrap();
    out
}

fn escaped(f: fn(&mut dyn std::io::Write, &[u8]) -> std::io::Result<()>, s: &[u8]) -> Vec<u8> {
    let mut out: Vec<u8> = vec![];
    f(&mut out, s).unwrap();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn pieces_reassemble_the_input(s in "[{}a \"'`\\\\]{0,40}") {
        let mut joined = vec![];
        for piece in action::pieces(s.as_bytes()) {
            match piece {
                Piece::Text(t) => joined.extend_from_slice(t),
                Piece::Action(a) => {
                    prop_assert!(a.starts_with(b"{{"));
                    prop_assert!(a.ends_with(b"}}"));
                    prop_assert_eq!(action::find_action_end(a, 0), Some(a.len()));
                    joined.extend_from_slice(a);
                }
            }
        }
        prop_assert_eq!(joined, s.as_bytes().to_vec());
    }

    #[test]
    fn found_ends_are_balanced(s in "[{}a \\\\]{0,40}") {
        let bytes = s.as_bytes();
        for start in 0..bytes.len() {
            prop_assert_eq!(
                action::find_action_end(bytes, start),
                balanced_end(bytes, start),
                "opener at {}", start
            );
        }
    }

    #[test]
    fn found_ends_close_a_pair(s in "[{}a \"'`\\\\]{0,40}") {
        let bytes = s.as_bytes();
        for start in 0..bytes.len() {
            if let Some(end) = action::find_action_end(bytes, start) {
                prop_assert!(bytes[start..].starts_with(b"{{"));
                prop_assert!(start + 4 <= end && end <= bytes.len());
                prop_assert_eq!(&bytes[end - 2..end], b"}}");
            }
        }
    }

    #[test]
    fn span_table_matches_single_scans(s in "[{}a \"'`\\\\\n]{0,60}") {
        let bytes = s.as_bytes();
        let spans = ActionSpans::scan(bytes);
        let line_spans = ActionSpans::scan_lines(bytes);
        for start in 0..bytes.len() {
            prop_assert_eq!(spans.end_of(start), action::find_action_end(bytes, start));

            let line_end = bytes[start..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |p| start + p);
            prop_assert_eq!(
                line_spans.end_of(start),
                action::find_action_end(&bytes[..line_end], start)
            );
        }
    }

    #[test]
    fn detection_is_substring_search(s in "[{}a \"]{0,20}") {
        let bytes = s.as_bytes();
        let expected = bytes.windows(2).any(|w| w == b"{{");
        prop_assert_eq!(action::contains_action(bytes), expected);
        if (0..bytes.len()).any(|i| action::find_action_end(bytes, i).is_some()) {
            prop_assert!(action::contains_action(bytes));
        }
    }

    #[test]
    fn writer_matches_host_escapers_without_actions(s in "[^{]{0,40}") {
        let bytes = s.as_bytes();

        prop_assert_eq!(written(|w| w.raw_write(bytes)), escaped(escape, bytes));
        prop_assert_eq!(
            written(|w| w.write(bytes)),
            escaped(escape, &strings::resolve_text(bytes))
        );
        prop_assert_eq!(
            written(|w| w.secure_write(bytes)),
            escaped(writer::escape_secure, bytes)
        );

        let mut href = b" href=\"".to_vec();
        href.extend(escaped(escape_href, bytes));
        href.push(b'"');
        prop_assert_eq!(
            written(|w| w.write_attribute("href", bytes, AttributeKind::Url)),
            href
        );

        let mut title = b" title=\"".to_vec();
        title.extend(escaped(escape, bytes));
        title.push(b'"');
        prop_assert_eq!(
            written(|w| w.write_attribute("title", bytes, AttributeKind::Text)),
            title
        );
    }

    #[test]
    fn writer_leaves_actions_between_escaped_text(
        a in "[^{}]{0,20}",
        body in action_body(),
        b in "[^{}]{0,20}",
    ) {
        let action = format!("{{{{{}}}}}", body);
        let input = format!("{}{}{}", a, action, b);

        let mut expected = escaped(escape, a.as_bytes());
        expected.extend_from_slice(action.as_bytes());
        expected.extend(escaped(escape, b.as_bytes()));
        prop_assert_eq!(written(|w| w.raw_write(input.as_bytes())), expected);

        let mut expected = escaped(escape_href, a.as_bytes());
        expected.extend_from_slice(action.as_bytes());
        expected.extend(escaped(escape_href, b.as_bytes()));
        prop_assert_eq!(
            written(|w| w.write_attribute("src", input.as_bytes(), AttributeKind::Url)),
            [&b" src=\""[..], &expected[..], &b"\""[..]].concat()
        );
    }

    #[test]
    fn markdown_without_actions_renders_as_plain(s in "[a-z*_`\\\\\\[\\]()<>&#!:/\"\n -]{0,60}") {
        prop_assert_eq!(render(&s, true), render(&s, false));
    }

    #[test]
    fn actions_are_preserved_verbatim(body in action_body(), before in "[a-z ]{0,8}") {
        let action = format!("{{{{{}}}}}", body);
        let md = format!("x{} {} y\n", before, action);
        let out = render(&md, true);
        prop_assert!(out.contains(&action), "{:?} lost from {:?}", action, out);
    }

    #[test]
    fn arbitrary_input_terminates(s in "(?s).{0,80}") {
        let _ = render(&s, true);
    }
}
