use std::borrow::Cow;
use std::str;

use crate::action::{self, Piece};
use crate::ctype::{isspace, ispunct};
use crate::entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutolinkType {
    Uri,
    Email,
}

/// Resolves backslash escapes and character references, the way CommonMark
/// cleans link destinations and titles.  With `action_aware`, the
/// bytes of well-formed template actions are left exactly as written.
pub fn resolve_escapes(src: &[u8], action_aware: bool) -> Vec<u8> {
    if !action_aware {
        return resolve_text(src).into_owned();
    }

    let mut out = Vec::with_capacity(src.len());
    for piece in action::pieces(src) {
        match piece {
            Piece::Text(text) => out.extend_from_slice(&resolve_text(text)),
            Piece::Action(span) => out.extend_from_slice(span),
        }
    }
    out
}

pub fn resolve_entities(src: &[u8], action_aware: bool) -> Vec<u8> {
    if !action_aware {
        return entity::unescape_html(src).into_owned();
    }

    let mut out = Vec::with_capacity(src.len());
    for piece in action::pieces(src) {
        match piece {
            Piece::Text(text) => out.extend_from_slice(&entity::unescape_html(text)),
            Piece::Action(span) => out.extend_from_slice(span),
        }
    }
    out
}

/// Resolves backslash escapes and character references together, in a single
/// left-to-right pass, as text is cleaned on its way to the output.  `\&amp;`
/// is therefore a literal `&amp;`.
pub fn resolve_text(src: &[u8]) -> Cow<'_, [u8]> {
    if !src.iter().any(|&b| b == b'\\' || b == b'&') {
        return Cow::Borrowed(src);
    }

    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        match src[i] {
            b'\\' if i + 1 < src.len() && ispunct(src[i + 1]) => {
                out.push(src[i + 1]);
                i += 2;
            }
            b'&' => match entity::unescape(&src[i + 1..]) {
                Some((chs, consumed)) => {
                    out.extend_from_slice(chs.as_bytes());
                    i += 1 + consumed;
                }
                None => {
                    out.push(b'&');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Cow::Owned(out)
}

pub fn clean_autolink(url: &[u8], kind: AutolinkType, action_aware: bool) -> String {
    let url = trim_slice(url);
    if url.is_empty() {
        return String::new();
    }

    let mut buf = Vec::with_capacity(url.len());
    if kind == AutolinkType::Email {
        buf.extend_from_slice(b"mailto:");
    }
    buf.extend_from_slice(&resolve_entities(url, action_aware));
    to_string(buf)
}

pub fn normalize_code(v: &[u8]) -> Vec<u8> {
    let mut r = Vec::with_capacity(v.len());
    let mut contains_nonspace = false;

    for (i, &c) in v.iter().enumerate() {
        match c {
            b'\r' => {
                if v.get(i + 1) != Some(&b'\n') {
                    r.push(b' ');
                }
            }
            b'\n' => r.push(b' '),
            c => {
                if c != b' ' {
                    contains_nonspace = true;
                }
                r.push(c)
            }
        }
    }

    if contains_nonspace && r.len() > 1 && r[0] == b' ' && r[r.len() - 1] == b' ' {
        r.remove(0);
        r.pop();
    }

    r
}

pub fn remove_trailing_blank_lines(line: &mut Vec<u8>) {
    let mut i = match line.len().checked_sub(1) {
        Some(i) => i,
        None => return,
    };

    loop {
        let c = line[i];
        if c != b' ' && c != b'\t' && !is_line_end_char(c) {
            break;
        }
        if i == 0 {
            line.clear();
            return;
        }
        i -= 1;
    }

    if let Some(nl) = line[i..].iter().position(|&c| is_line_end_char(c)) {
        line.truncate(i + nl);
    }
}

#[inline]
pub fn is_line_end_char(ch: u8) -> bool {
    matches!(ch, b'\n' | b'\r')
}

#[inline]
pub fn is_space_or_tab(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t')
}

pub fn chop_trailing_hashtags(line: &mut Vec<u8>) {
    rtrim(line);

    let orig_n = match line.len().checked_sub(1) {
        Some(n) => n,
        None => return,
    };
    let mut n = orig_n;

    while line[n] == b'#' {
        if n == 0 {
            line.clear();
            return;
        }
        n -= 1;
    }

    if n != orig_n && is_space_or_tab(line[n]) {
        line.truncate(n);
        rtrim(line);
    }
}

pub fn rtrim(line: &mut Vec<u8>) {
    let len = rtrim_slice(line).len();
    line.truncate(len);
}

pub fn ltrim_slice(mut i: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = i {
        if isspace(*first) {
            i = rest;
        } else {
            break;
        }
    }
    i
}

pub fn rtrim_slice(mut i: &[u8]) -> &[u8] {
    while let [rest @ .., last] = i {
        if isspace(*last) {
            i = rest;
        } else {
            break;
        }
    }
    i
}

pub fn trim_slice(i: &[u8]) -> &[u8] {
    rtrim_slice(ltrim_slice(i))
}

pub fn clean_url(url: &[u8], action_aware: bool) -> String {
    let url = trim_slice(url);
    let url_len = url.len();
    if url_len == 0 {
        return String::new();
    }

    let inner = if url[0] == b'<' && url[url_len - 1] == b'>' && url_len > 1 {
        &url[1..url_len - 1]
    } else {
        url
    };
    to_string(resolve_escapes(inner, action_aware))
}

pub fn clean_title(title: &[u8], action_aware: bool) -> String {
    let title_len = title.len();
    if title_len == 0 {
        return String::new();
    }

    let first = title[0];
    let last = title[title_len - 1];
    let inner = if title_len > 1
        && ((first == b'\'' && last == b'\'')
            || (first == b'(' && last == b')')
            || (first == b'"' && last == b'"'))
    {
        &title[1..title_len - 1]
    } else {
        title
    };
    to_string(resolve_escapes(inner, action_aware))
}

pub fn is_blank(s: &[u8]) -> bool {
    s.iter().all(|&c| matches!(c, b' ' | b'\t' | b'\n' | b'\r'))
}

pub fn normalize_label(i: &str) -> String {
    let i = match str::from_utf8(trim_slice(i.as_bytes())) {
        Ok(i) => i,
        Err(_) => i.trim(),
    };
    let mut v = String::with_capacity(i.len());
    let mut last_was_whitespace = false;
    for c in i.chars() {
        if c.is_whitespace() {
            if !last_was_whitespace {
                last_was_whitespace = true;
                v.push(' ');
            }
        } else {
            last_was_whitespace = false;
            v.push(c);
        }
    }
    caseless::default_case_fold_str(&v)
}

/// Converts bytes cut from valid UTF-8 at ASCII boundaries back to a
/// `String`.
pub fn to_string(v: Vec<u8>) -> String {
    String::from_utf8(v).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn normalize_label_fold_test() {
        assert_eq!(normalize_label("  Foo\u{A0}BAR  "), "foo bar");
        assert_eq!(normalize_label("ẞ"), "ss");
        assert_eq!(normalize_label("{{ .Ref }}"), "{{ .ref }}");
    }

    #[test]
    fn resolve_leaves_actions_alone() {
        assert_eq!(
            resolve_escapes(br#"a\*&amp;{{ "\"&amp;" }}"#, true),
            br#"a*&{{ "\"&amp;" }}"#.to_vec()
        );
        assert_eq!(
            resolve_escapes(br#"{{ "\"" }}"#, false),
            br#"{{ """ }}"#.to_vec()
        );
    }

    #[test]
    fn text_resolution_is_one_pass() {
        assert_eq!(&*resolve_text(br"\&amp; &amp; \* \a"), br"&amp; & * \a");
        assert_eq!(&*resolve_text(b"&bogus; &#65;"), b"&bogus; A");
    }

    #[test]
    fn clean_url_strips_pointy_braces() {
        assert_eq!(clean_url(b"  <{{ .URL }}> ", true), "{{ .URL }}");
        assert_eq!(clean_url(b"/a\\_b", true), "/a_b");
        assert_eq!(clean_url(b"", true), "");
    }

    #[test]
    fn clean_title_strips_quotes() {
        assert_eq!(clean_title(br#""Title: {{.Title}}""#, true), "Title: {{.Title}}");
        assert_eq!(clean_title(b"(a &amp; b)", true), "a & b");
        assert_eq!(clean_title(b"'x'", false), "x");
    }

    #[test]
    fn code_normalization() {
        assert_eq!(normalize_code(b" a\nb "), b"a b");
        assert_eq!(normalize_code(b"  "), b"  ");
        assert_eq!(normalize_code(b" {{ .A }} "), b"{{ .A }}");
    }

    #[test]
    fn trailing_hashtags() {
        let mut v = b"Heading ##  ".to_vec();
        chop_trailing_hashtags(&mut v);
        assert_eq!(v, b"Heading");

        let mut v = b"C#".to_vec();
        chop_trailing_hashtags(&mut v);
        assert_eq!(v, b"C#");

        let mut v = b"###".to_vec();
        chop_trailing_hashtags(&mut v);
        assert_eq!(v, b"");
    }

    #[test]
    fn trailing_blank_lines() {
        let mut v = b"code\n\n  \n".to_vec();
        remove_trailing_blank_lines(&mut v);
        assert_eq!(v, b"code");

        let mut v = b" \n\n".to_vec();
        remove_trailing_blank_lines(&mut v);
        assert_eq!(v, b"");
    }
}
