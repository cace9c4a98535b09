use std::borrow::Cow;
use std::char;
use std::cmp::min;

use crate::ctype::{isdigit, isxdigit};

include!(concat!(env!("OUT_DIR"), "/entitydata.rs"));

// Longest named entity is "CounterClockwiseContourIntegral".
const ENTITY_MIN_LENGTH: usize = 2;
const ENTITY_MAX_LENGTH: usize = 32;

/// Decodes the character reference at the start of `text`, which is the
/// input just after an `&`.  Returns the decoded text and the number of bytes
/// consumed, including the trailing `;`.
pub fn unescape(text: &[u8]) -> Option<(Cow<'static, str>, usize)> {
    if text.len() >= 3 && text[0] == b'#' {
        let mut codepoint: u32 = 0;
        let mut i = 0;

        let num_digits = if isdigit(text[1]) {
            i = 1;
            while i < text.len() && isdigit(text[i]) {
                codepoint = (codepoint * 10) + (text[i] as u32 - '0' as u32);
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 1
        } else if text[1] == b'x' || text[1] == b'X' {
            i = 2;
            while i < text.len() && isxdigit(text[i]) {
                codepoint = (codepoint * 16) + ((text[i] as u32 | 32) % 39 - 9);
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 2
        } else {
            0
        };

        if (1..=8).contains(&num_digits) && i < text.len() && text[i] == b';' {
            if codepoint == 0 || (0xD800..=0xE000).contains(&codepoint) || codepoint >= 0x11_0000
            {
                codepoint = 0xFFFD;
            }
            let c = char::from_u32(codepoint).unwrap_or('\u{FFFD}');
            return Some((Cow::Owned(c.to_string()), i + 1));
        }
    }

    let size = min(text.len(), ENTITY_MAX_LENGTH);
    for i in ENTITY_MIN_LENGTH..size {
        if text[i] == b' ' {
            return None;
        }

        if text[i] == b';' {
            return lookup(&text[..i]).map(|e| (Cow::Borrowed(e), i + 1));
        }
    }

    None
}

fn lookup(text: &[u8]) -> Option<&'static str> {
    let text = std::str::from_utf8(text).ok()?;
    TRANSLATED_ENTITIES.get(text).copied()
}

/// Replaces every valid character reference in `src` with what it stands for.
pub fn unescape_html(src: &[u8]) -> Cow<'_, [u8]> {
    let size = src.len();
    let mut i = 0;
    let mut v: Option<Vec<u8>> = None;

    while i < size {
        let org = i;
        while i < size && src[i] != b'&' {
            i += 1;
        }

        if i > org {
            if org == 0 && i >= size {
                return Cow::Borrowed(src);
            }
            v.get_or_insert_with(|| Vec::with_capacity(size))
                .extend_from_slice(&src[org..i]);
        }

        if i >= size {
            break;
        }

        i += 1;
        let out = v.get_or_insert_with(|| Vec::with_capacity(size));
        match unescape(&src[i..]) {
            Some((chs, consumed)) => {
                out.extend_from_slice(chs.as_bytes());
                i += consumed;
            }
            None => out.push(b'&'),
        }
    }

    match v {
        Some(v) => Cow::Owned(v),
        None => Cow::Borrowed(src),
    }
}
