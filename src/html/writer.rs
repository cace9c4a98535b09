//! Escaping that passes template actions through untouched.
//!
//! Every method splits its input into runs of ordinary text and complete
//! `{{ ... }}` actions.  Text runs get the escaping the method is named for;
//! actions are written byte for byte.  A `{{` that never closes is ordinary
//! text.  With action preservation turned off, each method is exactly the
//! escaping primitive it wraps.

use std::io::{self, Write};

use crate::action::{self, Piece};
use crate::html::{escape, escape_href};
use crate::strings;

/// How the text runs of an attribute value are escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// `href` and `src`: percent-escaped, then HTML-escaped.
    Url,
    /// Everything else: HTML-escaped.
    Text,
}

/// Writes into `output`, leaving template actions verbatim.
///
/// ```
/// use actionmark::html::writer::{ActionWriter, AttributeKind};
///
/// let mut out: Vec<u8> = vec![];
/// let mut w = ActionWriter::new(&mut out);
/// w.raw_write(b"<b>{{ if lt .A .B }}</b>").unwrap();
/// w.write_attribute("href", b"/a b/{{ .Slug }}", AttributeKind::Url).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     r#"&lt;b&gt;{{ if lt .A .B }}&lt;/b&gt; href="/a%20b/{{ .Slug }}""#
/// );
/// ```
pub struct ActionWriter<'w> {
    output: &'w mut dyn Write,
    preserve: bool,
}

impl<'w> ActionWriter<'w> {
    pub fn new(output: &'w mut dyn Write) -> Self {
        ActionWriter {
            output,
            preserve: true,
        }
    }

    /// Turns action preservation on or off.  On by default.
    pub fn preserve_actions(mut self, preserve: bool) -> Self {
        self.preserve = preserve;
        self
    }

    /// Full text escaping: backslash escapes and character references are
    /// resolved, and the result is HTML-escaped.
    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.each_run(bytes, |out, run| escape(out, &strings::resolve_text(run)))
    }

    /// HTML escaping only, for content whose escapes were resolved while
    /// parsing.
    pub fn raw_write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.each_run(bytes, escape)
    }

    /// HTML escaping, with NUL written as U+FFFD.
    pub fn secure_write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.each_run(bytes, escape_secure)
    }

    /// Writes ` name="value"`.
    pub fn write_attribute(
        &mut self,
        name: &str,
        value: &[u8],
        kind: AttributeKind,
    ) -> io::Result<()> {
        write!(self.output, " {}=\"", name)?;
        match kind {
            AttributeKind::Url => self.each_run(value, escape_href)?,
            AttributeKind::Text => self.each_run(value, escape)?,
        }
        self.output.write_all(b"\"")
    }

    fn each_run<F>(&mut self, bytes: &[u8], mut policy: F) -> io::Result<()>
    where
        F: FnMut(&mut dyn Write, &[u8]) -> io::Result<()>,
    {
        if !self.preserve {
            return policy(&mut *self.output, bytes);
        }

        for piece in action::pieces(bytes) {
            match piece {
                Piece::Text(run) => policy(&mut *self.output, run)?,
                Piece::Action(span) => self.output.write_all(span)?,
            }
        }
        Ok(())
    }
}

impl<'w> std::fmt::Debug for ActionWriter<'w> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionWriter")
            .field("preserve", &self.preserve)
            .finish_non_exhaustive()
    }
}

pub(crate) fn escape_secure(output: &mut dyn Write, buffer: &[u8]) -> io::Result<()> {
    let mut runs = buffer.split(|&b| b == 0);
    if let Some(first) = runs.next() {
        escape(output, first)?;
    }
    for run in runs {
        output.write_all("\u{FFFD}".as_bytes())?;
        escape(output, run)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with<F>(preserve: bool, f: F) -> String
    where
        F: FnOnce(&mut ActionWriter<'_>) -> io::Result<()>,
    {
        let mut out: Vec<u8> = vec![];
        {
            let mut w = ActionWriter::new(&mut out).preserve_actions(preserve);
            f(&mut w).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn raw_write_keeps_actions() {
        assert_eq!(
            with(true, |w| w.raw_write(br#"a<{{ if gt .X "<" }}>&"#)),
            r#"a&lt;{{ if gt .X "<" }}&gt;&amp;"#
        );
        assert_eq!(
            with(false, |w| w.raw_write(b"<{{ .X }}>")),
            "&lt;{{ .X }}&gt;"
        );
    }

    #[test]
    fn unterminated_actions_are_text() {
        assert_eq!(
            with(true, |w| w.raw_write(b"{{ <b> {{ .X }}")),
            "{{ &lt;b&gt; {{ .X }}"
        );
        assert_eq!(with(true, |w| w.raw_write(b"a {{")), "a {{");
    }

    #[test]
    fn write_resolves_outside_actions() {
        assert_eq!(
            with(true, |w| w.write(br#"\*&amp; {{ "\*&amp;" }}"#)),
            r#"*&amp; {{ "\*&amp;" }}"#
        );
    }

    #[test]
    fn secure_write_replaces_nul() {
        assert_eq!(
            with(true, |w| w.secure_write(b"a\0b{{ \"\0\" }}")),
            "a\u{FFFD}b{{ \"\0\" }}"
        );
    }

    #[test]
    fn attributes() {
        assert_eq!(
            with(true, |w| w.write_attribute(
                "href",
                br#"/p?q="x"&{{ .Q }}"#,
                AttributeKind::Url
            )),
            r#" href="/p?q=%22x%22&amp;{{ .Q }}""#
        );
        assert_eq!(
            with(true, |w| w.write_attribute(
                "title",
                br#"say "{{ .Hi "there" }}""#,
                AttributeKind::Text
            )),
            r#" title="say &quot;{{ .Hi "there" }}&quot;""#
        );
    }

    #[test]
    fn plain_input_matches_escape() {
        let input = b"x < y & \"z\" {not an action}";
        let mut expected: Vec<u8> = vec![];
        escape(&mut expected, input).unwrap();
        assert_eq!(
            with(true, |w| w.raw_write(input)),
            String::from_utf8(expected).unwrap()
        );
    }
}
