//! The ordered set of inline recognizers consulted by the inline parser.
//!
//! Every recognizer is registered under a [`Role`].  A role has at most one
//! recognizer; registering a second one for the same role replaces the first,
//! so there is never any guessing about which implementation is live.  When a
//! trigger byte is seen, the recognizers that listen for it are tried in
//! ascending priority order until one of them accepts.

use smallvec::SmallVec;
use std::fmt;

use crate::nodes::AstNode;
use crate::parser::inlines::recognizers::{
    AutolinkRecognizer, CodeSpanRecognizer, EmphasisRecognizer, EntityRecognizer,
    EscapeRecognizer, LineBreakRecognizer, LinkRecognizer, RawHtmlRecognizer,
    StrikethroughRecognizer, TemplateActionRecognizer,
};
use crate::parser::inlines::Subject;
use crate::parser::options::Options;

/// The job a recognizer does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    LineBreak,
    Escape,
    Entity,
    CodeSpan,
    Link,
    Autolink,
    RawHtml,
    Emphasis,
    Strikethrough,
    TemplateAction,
}

/// What a recognizer did with the input at the cursor.
pub enum Parsed<'a> {
    /// Not recognised.  The cursor is rewound and the next candidate tried.
    Declined,
    /// Recognised; the node is appended to the current container.
    Node(&'a AstNode<'a>),
    /// Recognised, and the recognizer has already placed whatever it built
    /// into the tree.
    Consumed,
}

/// An inline syntax that starts on one of a fixed set of bytes.
pub trait InlineRecognizer: Send + Sync {
    /// The bytes this recognizer can start on.
    fn trigger(&self) -> &'static [u8];

    /// Attempt to parse at `subj.pos`, which holds one of the trigger bytes.
    /// A declining recognizer may move the cursor; it is restored before the
    /// next candidate runs.
    fn try_parse<'a>(&self, subj: &mut Subject<'a, '_>) -> Parsed<'a>;
}

struct Entry {
    role: Role,
    priority: u16,
    recognizer: Box<dyn InlineRecognizer>,
}

pub struct Registry {
    entries: Vec<Entry>,
    by_trigger: Vec<SmallVec<[usize; 2]>>,
    special: [bool; 256],
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.roles()).finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        let mut special = [false; 256];
        special[b'\n' as usize] = true;
        special[b'\r' as usize] = true;
        Registry {
            entries: vec![],
            by_trigger: vec![SmallVec::new(); 256],
            special,
        }
    }

    /// The recognizers for `options`: the CommonMark inline syntaxes, plus
    /// template actions and strikethrough when those extensions are on.
    pub fn for_options(options: &Options) -> Self {
        let action_aware = options.extension.template_actions;

        let mut registry = Registry::new();
        registry.register(Role::LineBreak, 10, Box::new(LineBreakRecognizer));
        registry.register(Role::Escape, 20, Box::new(EscapeRecognizer));
        registry.register(Role::Entity, 30, Box::new(EntityRecognizer));
        registry.register(Role::CodeSpan, 100, Box::new(CodeSpanRecognizer));
        registry.register(Role::Link, 200, Box::new(LinkRecognizer { action_aware }));
        registry.register(
            Role::Autolink,
            300,
            Box::new(AutolinkRecognizer { action_aware }),
        );
        registry.register(Role::RawHtml, 400, Box::new(RawHtmlRecognizer));
        registry.register(Role::Emphasis, 500, Box::new(EmphasisRecognizer));
        if options.extension.strikethrough {
            registry.register(Role::Strikethrough, 550, Box::new(StrikethroughRecognizer));
        }
        if action_aware {
            registry.register(
                Role::TemplateAction,
                600,
                Box::new(TemplateActionRecognizer),
            );
        }
        registry
    }

    /// Installs `recognizer` for `role`, replacing any recognizer already
    /// registered for it.
    pub fn register(&mut self, role: Role, priority: u16, recognizer: Box<dyn InlineRecognizer>) {
        self.entries.retain(|e| e.role != role);
        let at = self.entries.partition_point(|e| e.priority <= priority);
        self.entries.insert(
            at,
            Entry {
                role,
                priority,
                recognizer,
            },
        );
        self.reindex();
    }

    fn reindex(&mut self) {
        for slot in self.by_trigger.iter_mut() {
            slot.clear();
        }
        self.special = [false; 256];
        self.special[b'\n' as usize] = true;
        self.special[b'\r' as usize] = true;
        for (ix, entry) in self.entries.iter().enumerate() {
            for &b in entry.recognizer.trigger() {
                self.by_trigger[b as usize].push(ix);
                self.special[b as usize] = true;
            }
        }
    }

    /// The recognizers listening for `b`, in priority order.
    pub(crate) fn candidates(&self, b: u8) -> impl Iterator<Item = &dyn InlineRecognizer> + '_ {
        self.by_trigger[b as usize]
            .iter()
            .map(move |&ix| &*self.entries[ix].recognizer)
    }

    /// Whether `b` ends a run of plain text.
    pub(crate) fn is_special(&self, b: u8) -> bool {
        self.special[b as usize]
    }

    /// The registered roles, in the order they are consulted.
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.entries.iter().map(|e| e.role)
    }

    #[cfg(test)]
    pub fn contains(&self, role: Role) -> bool {
        self.entries.iter().any(|e| e.role == role)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}
