//! The inline syntaxes, one recognizer per [`Role`](crate::parser::registry::Role).
//!
//! Each is a thin adapter from the registry's calling convention onto the
//! matching handler on [`Subject`].

use crate::nodes::AstNode;
use crate::parser::inlines::Subject;
use crate::parser::registry::{InlineRecognizer, Parsed};

fn from_option<'a>(node: Option<&'a AstNode<'a>>) -> Parsed<'a> {
    match node {
        Some(n) => Parsed::Node(n),
        None => Parsed::Declined,
    }
}

pub struct LineBreakRecognizer;

impl InlineRecognizer for LineBreakRecognizer {
    fn trigger(&self) -> &'static [u8] {
        b"\r\n"
    }

    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a> {
        Parsed::Node(subj.handle_newline())
    }
}

pub struct EscapeRecognizer;

impl InlineRecognizer for EscapeRecognizer {
    fn trigger(&self) -> &'static [u8] {
        b"\\"
    }

    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a> {
        Parsed::Node(subj.handle_backslash())
    }
}

pub struct EntityRecognizer;

impl InlineRecognizer for EntityRecognizer {
    fn trigger(&self) -> &'static [u8] {
        b"&"
    }

    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a> {
        Parsed::Node(subj.handle_entity())
    }
}

pub struct CodeSpanRecognizer;

impl InlineRecognizer for CodeSpanRecognizer {
    fn trigger(&self) -> &'static [u8] {
        b"`"
    }

    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a> {
        Parsed::Node(subj.handle_backticks())
    }
}

/// `[`, `![` and `]`.  With `action_aware`, destinations, titles and labels
/// skip over template actions.
pub struct LinkRecognizer {
    pub action_aware: bool,
}

impl InlineRecognizer for LinkRecognizer {
    fn trigger(&self) -> &'static [u8] {
        b"[]!"
    }

    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a> {
        match subj.peek_byte() {
            Some(b'[') => Parsed::Node(subj.handle_open_bracket()),
            Some(b'!') => from_option(subj.handle_bang()),
            Some(b']') => subj.handle_close_bracket(self.action_aware),
            _ => Parsed::Declined,
        }
    }
}

/// `<...>` autolinks.  Declines, leaving the way open for raw HTML, when
/// the content is neither a URI nor an email address.
pub struct AutolinkRecognizer {
    pub action_aware: bool,
}

impl InlineRecognizer for AutolinkRecognizer {
    fn trigger(&self) -> &'static [u8] {
        b"<"
    }

    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a> {
        from_option(subj.handle_autolink(self.action_aware))
    }
}

pub struct RawHtmlRecognizer;

impl InlineRecognizer for RawHtmlRecognizer {
    fn trigger(&self) -> &'static [u8] {
        b"<"
    }

    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a> {
        from_option(subj.handle_raw_html())
    }
}

pub struct EmphasisRecognizer;

impl InlineRecognizer for EmphasisRecognizer {
    fn trigger(&self) -> &'static [u8] {
        b"*_"
    }

    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a> {
        match subj.peek_byte() {
            Some(c) => Parsed::Node(subj.handle_delim(c)),
            None => Parsed::Declined,
        }
    }
}

/// `~` runs, paired like emphasis but only with a run of the same length.
pub struct StrikethroughRecognizer;

impl InlineRecognizer for StrikethroughRecognizer {
    fn trigger(&self) -> &'static [u8] {
        b"~"
    }

    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a> {
        Parsed::Node(subj.handle_delim(b'~'))
    }
}

/// `{{ ... }}`, closed on the same line.
pub struct TemplateActionRecognizer;

impl InlineRecognizer for TemplateActionRecognizer {
    fn trigger(&self) -> &'static [u8] {
        b"{"
    }

    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a> {
        from_option(subj.handle_template_action())
    }
}
