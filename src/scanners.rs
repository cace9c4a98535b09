use jetscii::ByteSubstring;
use once_cell::sync::Lazy;
use phf::phf_set;
use regex::bytes::Regex;
use std::str;

fn search(re: &Regex, line: &[u8]) -> Option<usize> {
    re.find(line).map(|m| m.end() - m.start())
}

fn is_match(re: &Regex, line: &[u8]) -> bool {
    re.is_match(line)
}

fn contains(line: &[u8], needle: &[u8]) -> bool {
    ByteSubstring::new(needle).find(line).is_some()
}

const SPACE_CHAR: &str = r"[ \t\x0B\x0C\r\n]";
const TAG_NAME: &str = r"[A-Za-z][A-Za-z0-9-]*";
const ATTRIBUTE_NAME: &str = r"[a-zA-Z_:][a-zA-Z0-9:._-]*";
const ATTRIBUTE_VALUE: &str = r#"(?:[^"'=<>`\x00 \t\n\r\x0B\x0C]+|'[^'\x00]*'|"[^"\x00]*")"#;
const SCHEME: &str = r"[A-Za-z][A-Za-z0-9.+-]{1,31}";

static OPEN_TAG: Lazy<String> = Lazy::new(|| {
    let attribute = format!(
        r"(?:{sp}+{name}(?:{sp}*={sp}*{value})?)",
        sp = SPACE_CHAR,
        name = ATTRIBUTE_NAME,
        value = ATTRIBUTE_VALUE
    );
    format!(r"(?:{}{}*{}*/?>)", TAG_NAME, attribute, SPACE_CHAR)
});

static CLOSE_TAG: Lazy<String> = Lazy::new(|| format!(r"(?:/{}{}*>)", TAG_NAME, SPACE_CHAR));

pub fn atx_heading_start(line: &[u8]) -> Option<usize> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A#{1,6}(?:[ \t]+|[\r\n])").unwrap());
    search(&RE, line)
}

/// Matches an opening fence and returns the length of the fence itself,
/// not counting the info string.
pub fn open_code_fence(line: &[u8]) -> Option<usize> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\A(?:(`{3,})[^`\r\n\x00]*|(~{3,})[^\r\n\x00]*)[\r\n]").unwrap()
    });
    let caps = RE.captures(line)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.len())
}

pub fn close_code_fence(line: &[u8]) -> Option<usize> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\A(`{3,}|~{3,})[ \t]*[\r\n]").unwrap());
    RE.captures(line).and_then(|caps| caps.get(1)).map(|m| m.len())
}

static BLOCK_TAGS: phf::Set<&'static str> = phf_set! {
    "address", "article", "aside", "base", "basefont", "blockquote", "body",
    "caption", "center", "col", "colgroup", "dd", "details", "dialog", "dir",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form",
    "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hr", "html", "iframe", "legend", "li", "link", "main", "menu", "menuitem",
    "nav", "noframes", "ol", "optgroup", "option", "p", "param", "search",
    "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead",
    "title", "tr", "track", "ul",
};

/// Recognises the start conditions of HTML block kinds 1 to 6.
pub fn html_block_start(line: &[u8]) -> Option<usize> {
    static RE_1: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\A<(?:script|pre|textarea|style)(?:[ \t\x0B\x0C\r\n]|>)").unwrap()
    });
    static RE_4: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A<![A-Za-z]").unwrap());
    static RE_6: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\A</?([A-Za-z][A-Za-z0-9]*)(?:[ \t\x0B\x0C\r\n]|/?>)").unwrap()
    });

    if !line.starts_with(b"<") {
        return None;
    }

    if is_match(&RE_1, line) {
        Some(1)
    } else if line.starts_with(b"<!--") {
        Some(2)
    } else if line.starts_with(b"<?") {
        Some(3)
    } else if line.starts_with(b"<![CDATA[") {
        Some(5)
    } else if is_match(&RE_4, line) {
        Some(4)
    } else {
        let caps = RE_6.captures(line)?;
        let name = str::from_utf8(caps.get(1)?.as_bytes()).ok()?;
        if BLOCK_TAGS.contains(name.to_ascii_lowercase().as_str()) {
            Some(6)
        } else {
            None
        }
    }
}

/// A complete open or closing tag alone on its line.
pub fn html_block_start_7(line: &[u8]) -> Option<usize> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(
            r"\A<(?:{}|{})[ \t\x0B\x0C]*[\r\n]",
            *OPEN_TAG, *CLOSE_TAG
        ))
        .unwrap()
    });

    if is_match(&RE, line) {
        Some(7)
    } else {
        None
    }
}

pub fn html_block_end_1(line: &[u8]) -> bool {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)</(?:script|pre|textarea|style)>").unwrap());
    is_match(&RE, line)
}

pub fn html_block_end_2(line: &[u8]) -> bool {
    contains(line, b"-->")
}

pub fn html_block_end_3(line: &[u8]) -> bool {
    contains(line, b"?>")
}

pub fn html_block_end_4(line: &[u8]) -> bool {
    line.contains(&b'>')
}

pub fn html_block_end_5(line: &[u8]) -> bool {
    contains(line, b"]]>")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetextChar {
    Equals,
    Hyphen,
}

pub fn setext_heading_line(line: &[u8]) -> Option<SetextChar> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A(?:=+|-+)[ \t]*[\r\n]").unwrap());

    if is_match(&RE, line) {
        if line[0] == b'=' {
            Some(SetextChar::Equals)
        } else {
            Some(SetextChar::Hyphen)
        }
    } else {
        None
    }
}

pub fn scheme(line: &[u8]) -> Option<usize> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"\A{}:", SCHEME)).unwrap());
    search(&RE, line)
}

/// Matches the remainder of a URI autolink after its `<`, closing `>`
/// included.
pub fn autolink_uri(line: &[u8]) -> Option<usize> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"\A{}:[^\x00-\x20<>]*>", SCHEME)).unwrap());
    search(&RE, line)
}

pub fn autolink_email(line: &[u8]) -> Option<usize> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(concat!(
            r"\A",
            "[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+",
            r"@",
            r"[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?",
            r"(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*",
            r">",
        ))
        .unwrap()
    });
    search(&RE, line)
}

/// Matches inline raw HTML following a `<`.
pub fn html_tag(line: &[u8]) -> Option<usize> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        let comment = r"!--(?:-?>|(?s-u:.)*?-->)";
        let processing = r"\?(?s-u:.)*?\?>";
        let declaration = r"![A-Za-z][^>\x00]*>";
        let cdata = r"!\[CDATA\[(?s-u:.)*?\]\]>";
        Regex::new(&format!(
            r"\A(?:{}|{}|{}|{}|{}|{})",
            *OPEN_TAG, *CLOSE_TAG, comment, processing, declaration, cdata
        ))
        .unwrap()
    });
    search(&RE, line)
}

pub fn spacechars(line: &[u8]) -> Option<usize> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A[ \t\x0B\x0C\r\n]+").unwrap());
    search(&RE, line)
}

/// Whether following `url` could run script or read local files.
/// Embedded images in common formats are allowed.
pub fn dangerous_url(url: &[u8]) -> bool {
    static SCHEMES: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\A(?:javascript|vbscript|file|data):").unwrap());
    static SAFE_DATA: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\Adata:image/(?:png|gif|jpeg|webp)").unwrap());
    is_match(&SCHEMES, url) && !is_match(&SAFE_DATA, url)
}
