//! The GFM autolink extension: bare `www.` domains, `http://`, `https://` and
//! `ftp://` URLs, and email addresses in text.
//!
//! Only `Text` nodes are searched, so a template action never ends up inside
//! a link it did not open.

use std::cell::RefCell;

use typed_arena::Arena;
use unicode_categories::UnicodeCategories;

use crate::ctype::{isalnum, isalpha, isspace};
use crate::nodes::{Ast, AstNode, NodeLink, NodeValue};

const SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// Links every URL and email address in `contents`, the text of `node`.
/// The links, and text nodes with whatever lies between and after them, are
/// inserted after `node`; `contents` keeps what precedes the first link.
pub(crate) fn process_autolinks<'a>(
    arena: &'a Arena<AstNode<'a>>,
    node: &'a AstNode<'a>,
    contents: &mut String,
) {
    let len = contents.len();
    let mut last = node;
    let mut kept = None;
    let mut placed = 0;
    let mut i = 0;

    while i < len {
        let found = match contents.as_bytes()[i] {
            b':' => url_match(arena, contents, i),
            b'w' => www_match(arena, contents, i),
            b'@' => email_match(arena, contents, i),
            _ => None,
        };

        match found {
            Some((link, reverse, skip)) if i - reverse >= placed => {
                let start = i - reverse;
                tracing::trace!(start, len = skip, "autolinked");

                if kept.is_none() {
                    kept = Some(start);
                } else if start > placed {
                    let between = contents[placed..start].to_string();
                    let between = make_inline(arena, NodeValue::Text(between));
                    last.insert_after(between);
                    last = between;
                }
                last.insert_after(link);
                last = link;

                placed = start + skip;
                i = placed;
            }
            _ => i += 1,
        }
    }

    if let Some(end) = kept {
        if placed < len {
            let rest = contents[placed..].to_string();
            last.insert_after(make_inline(arena, NodeValue::Text(rest)));
        }
        contents.truncate(end);
    }
}

fn make_inline<'a>(arena: &'a Arena<AstNode<'a>>, value: NodeValue) -> &'a AstNode<'a> {
    let mut ast = Ast::new(value, 0);
    ast.open = false;
    arena.alloc(AstNode::new(RefCell::new(ast)))
}

fn make_link<'a>(arena: &'a Arena<AstNode<'a>>, url: String, text: &str) -> &'a AstNode<'a> {
    let inl = make_inline(
        arena,
        NodeValue::Link(NodeLink {
            url,
            title: String::new(),
        }),
    );
    inl.append(make_inline(arena, NodeValue::Text(text.to_string())));
    inl
}

fn www_match<'a>(
    arena: &'a Arena<AstNode<'a>>,
    contents: &str,
    i: usize,
) -> Option<(&'a AstNode<'a>, usize, usize)> {
    let bytes = contents.as_bytes();
    if i > 0 && !isspace(bytes[i - 1]) && !matches!(bytes[i - 1], b'*' | b'_' | b'~' | b'(' | b'[')
    {
        return None;
    }

    if !contents[i..].starts_with("www.") {
        return None;
    }

    let mut link_end = check_domain(&contents[i..])?;
    while i + link_end < bytes.len() && !isspace(bytes[i + link_end]) {
        link_end += 1;
    }
    link_end = autolink_delim(&bytes[i..], link_end);

    let text = &contents[i..i + link_end];
    Some((make_link(arena, format!("http://{}", text), text), 0, link_end))
}

// The length of the domain at the start of `data`.  It needs at least one
// `.`, and no `_` in its last two labels.
fn check_domain(data: &str) -> Option<usize> {
    let mut np = 0;
    let mut uscore1 = 0;
    let mut uscore2 = 0;

    for (i, c) in data.char_indices() {
        if c == '_' {
            uscore2 += 1;
        } else if c == '.' {
            uscore1 = uscore2;
            uscore2 = 0;
            np += 1;
        } else if !is_valid_hostchar(c) && c != '-' {
            if uscore1 == 0 && uscore2 == 0 && np > 0 {
                return Some(i);
            }
            return None;
        }
    }

    if uscore1 == 0 && uscore2 == 0 && np > 0 {
        Some(data.len())
    } else {
        None
    }
}

fn is_valid_hostchar(ch: char) -> bool {
    !ch.is_whitespace() && !ch.is_punctuation()
}

// Trims trailing punctuation, unmatched `)`s and a trailing entity off the
// candidate link `data[..link_end]`.
fn autolink_delim(data: &[u8], mut link_end: usize) -> usize {
    if let Some(lt) = data[..link_end].iter().position(|&b| b == b'<') {
        link_end = lt;
    }

    let opening = data[..link_end].iter().filter(|&&b| b == b'(').count();
    let mut closing = data[..link_end].iter().filter(|&&b| b == b')').count();

    while link_end > 0 {
        match data[link_end - 1] {
            b'?' | b'!' | b'.' | b',' | b':' | b'*' | b'_' | b'~' | b'\'' | b'"' => link_end -= 1,
            b';' => {
                let mut new_end = link_end - 1;
                while new_end > 0 && isalpha(data[new_end - 1]) {
                    new_end -= 1;
                }

                if new_end > 0 && new_end < link_end - 1 && data[new_end - 1] == b'&' {
                    link_end = new_end - 1;
                } else {
                    link_end -= 1;
                }
            }
            b')' => {
                if closing <= opening {
                    break;
                }
                closing -= 1;
                link_end -= 1;
            }
            _ => break,
        }
    }

    link_end
}

fn url_match<'a>(
    arena: &'a Arena<AstNode<'a>>,
    contents: &str,
    i: usize,
) -> Option<(&'a AstNode<'a>, usize, usize)> {
    let bytes = contents.as_bytes();
    let size = bytes.len();

    if size - i < 4 || bytes[i + 1] != b'/' || bytes[i + 2] != b'/' {
        return None;
    }

    let mut rewind = 0;
    while rewind < i && isalpha(bytes[i - rewind - 1]) {
        rewind += 1;
    }

    if !SCHEMES.contains(&&contents[i - rewind..i]) {
        return None;
    }

    let mut link_end = 3 + check_domain(&contents[i + 3..])?;
    while i + link_end < size && !isspace(bytes[i + link_end]) {
        link_end += 1;
    }
    link_end = autolink_delim(&bytes[i..], link_end);

    let url = &contents[i - rewind..i + link_end];
    Some((make_link(arena, url.to_string(), url), rewind, rewind + link_end))
}

fn email_match<'a>(
    arena: &'a Arena<AstNode<'a>>,
    contents: &str,
    i: usize,
) -> Option<(&'a AstNode<'a>, usize, usize)> {
    let bytes = contents.as_bytes();
    let size = bytes.len();

    let mut rewind = 0;
    while rewind < i {
        let c = bytes[i - rewind - 1];
        if isalnum(c) || matches!(c, b'.' | b'+' | b'-' | b'_') {
            rewind += 1;
            continue;
        }
        if c == b'/' {
            return None;
        }
        break;
    }

    if rewind == 0 {
        return None;
    }

    let mut link_end = 1;
    let mut np = 0;

    while i + link_end < size {
        let c = bytes[i + link_end];

        if isalnum(c) {
            // part of the domain
        } else if c == b'@' {
            // A second `@` can't be part of this address.
            return None;
        } else if c == b'.' && i + link_end < size - 1 {
            np += 1;
        } else if c != b'-' && c != b'_' {
            break;
        }

        link_end += 1;
    }

    let last = bytes[i + link_end - 1];
    if link_end < 2 || np == 0 || (!isalpha(last) && last != b'.') {
        return None;
    }

    link_end = autolink_delim(&bytes[i..], link_end);
    if link_end < 2 {
        return None;
    }

    let text = &contents[i - rewind..i + link_end];
    Some((
        make_link(arena, format!("mailto:{}", text), text),
        rewind,
        rewind + link_end,
    ))
}
