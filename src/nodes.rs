//! The CommonMark AST, with template actions as leaf inlines.

use crate::action::Segment;
use crate::arena_tree::Node;
use std::cell::RefCell;

/// What a node is.  Blocks hold other blocks or inlines; inlines hold
/// inlines or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// The root.  Holds blocks.
    Document,

    /// Block.  `> quoted`.  Holds blocks.
    BlockQuote,

    /// Block.  A run of items sharing one kind of marker.
    ///
    /// ``` md
    /// - {{ .First }}
    /// - {{ .Second }}
    /// ```
    List(NodeList),

    /// Block.  One entry of a `List`.  Holds blocks.
    Item(NodeList),

    /// Block.  Fenced or indented code, stored unparsed in `literal`.
    CodeBlock(NodeCodeBlock),

    /// Block.  Raw HTML, one of the seven CommonMark kinds, stored unparsed.
    HtmlBlock(NodeHtmlBlock),

    /// Block.  Holds inlines.
    Paragraph,

    /// Block.  ATX (`# Title`) or setext (underlined).  Holds inlines.
    Heading(NodeHeading),

    /// Block.  `---`.  A leaf.
    ThematicBreak,

    /// Block.  A table, with the extension on.  Holds `TableRow`s, the first
    /// of which is the header.
    ///
    /// ``` md
    /// | Name | Value         |
    /// |------|---------------|
    /// | User | {{ .UserName }} |
    /// ```
    Table(NodeTable),

    /// Block.  `true` for the header row.  Holds `TableCell`s.
    TableRow(bool),

    /// Block.  One cell of a row.  Holds inlines.
    TableCell,

    /// Block.  A list item whose first paragraph began with `[ ]` or `[x]`,
    /// with the tasklist extension on.  Holds blocks.
    TaskItem(NodeTaskItem),

    /// Inline.  Literal text, escapes and character references already
    /// resolved.
    Text(String),

    /// Inline.  A line ending inside a paragraph.  Rendered as a newline,
    /// or as `<br />` with `render.hardbreaks`.
    SoftBreak,

    /// Inline.  Two trailing spaces or a backslash before a line ending.
    LineBreak,

    /// Inline.  `` `code` ``.
    Code(NodeCode),

    /// Inline.  A raw HTML tag, comment or similar.
    HtmlInline(String),

    /// Inline.  `*text*` or `_text_`.
    Emph,

    /// Inline.  `**text**` or `__text__`.
    Strong,

    /// Inline.  `~text~` or `~~text~~`, with the strikethrough extension on.
    Strikethrough,

    /// Inline.  Holds the link text.
    Link(NodeLink),

    /// Inline.  Holds the description, which becomes the `alt` text.
    Image(NodeLink),

    /// Inline.  A template action, `{{ ... }}`, kept exactly as written.
    ///
    /// ``` md
    /// Hello, {{ .Name }}!
    /// ```
    TemplateAction(NodeTemplateAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCode {
    /// Length of the backtick string that opened the span.
    pub num_backticks: usize,

    /// The span's content, with line endings turned into spaces and one
    /// leading and trailing space stripped.
    pub literal: String,
}

/// Destination and title of a link or image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLink {
    /// Escapes and references resolved outside template actions.
    pub url: String,

    /// Empty when the source gave none.
    pub title: String,
}

/// A template action as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTemplateAction {
    /// The action, delimiters included.
    pub content: String,

    /// Where the action sits in the source document.
    pub segment: Segment,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeList {
    pub list_type: ListType,

    /// Columns of indentation before the marker.
    pub marker_offset: usize,

    /// Columns from the start of the marker to the start of the item's
    /// content.
    pub padding: usize,

    /// First number of an ordered list.
    pub start: usize,

    pub delimiter: ListDelimType,

    /// `-`, `+` or `*`.
    pub bullet_char: u8,

    /// A tight list renders its paragraphs without `<p>` tags.
    pub tight: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    #[default]
    Bullet,
    Ordered,
}

/// What follows the number in an ordered list marker.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ListDelimType {
    /// `1.`
    #[default]
    Period,
    /// `1)`
    Paren,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct NodeCodeBlock {
    pub fenced: bool,

    /// `` ` `` or `~`; zero for indented code.
    pub fence_char: u8,

    pub fence_length: usize,

    /// Indentation of the opening fence, removed from each content line.
    pub fence_offset: usize,

    /// Text after the opening fence, trimmed but otherwise as written.  The
    /// renderer resolves escapes in it outside template actions.
    pub info: String,

    pub literal: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeTable {
    /// One entry per column, from the delimiter row.
    pub alignments: Vec<TableAlignment>,

    pub num_columns: usize,
}

/// Alignment of a table column.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TableAlignment {
    /// `---`
    #[default]
    None,
    /// `:--`
    Left,
    /// `:-:`
    Center,
    /// `--:`
    Right,
}

impl TableAlignment {
    /// The value of the cell's `align` attribute, if it has one.
    pub fn xml_name(&self) -> Option<&'static str> {
        match *self {
            TableAlignment::None => None,
            TableAlignment::Left => Some("left"),
            TableAlignment::Center => Some("center"),
            TableAlignment::Right => Some("right"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeTaskItem {
    /// `None` for `[ ]`, otherwise the mark between the brackets.
    pub symbol: Option<char>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct NodeHeading {
    /// 1 to 6.  Setext headings are only ever 1 or 2.
    pub level: u8,

    pub setext: bool,

    /// Attributes from a trailing `{...}` block, in source order.  Only filled
    /// in when heading attributes are enabled.
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeHtmlBlock {
    /// Which of the seven start conditions opened the block.
    pub block_type: u8,

    pub literal: String,
}

impl NodeValue {
    /// True for block nodes, false for inlines.
    pub fn block(&self) -> bool {
        matches!(
            *self,
            NodeValue::Document
                | NodeValue::BlockQuote
                | NodeValue::List(..)
                | NodeValue::Item(..)
                | NodeValue::CodeBlock(..)
                | NodeValue::HtmlBlock(..)
                | NodeValue::Paragraph
                | NodeValue::Heading(..)
                | NodeValue::ThematicBreak
                | NodeValue::Table(..)
                | NodeValue::TableRow(..)
                | NodeValue::TableCell
                | NodeValue::TaskItem(..)
        )
    }

    /// Paragraphs, headings and table cells; the nodes the inline pass runs
    /// over.
    pub fn contains_inlines(&self) -> bool {
        matches!(
            *self,
            NodeValue::Paragraph | NodeValue::Heading(..) | NodeValue::TableCell
        )
    }

    pub fn text(&self) -> Option<&String> {
        match *self {
            NodeValue::Text(ref t) => Some(t),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match *self {
            NodeValue::Text(ref mut t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn accepts_lines(&self) -> bool {
        matches!(
            *self,
            NodeValue::Paragraph | NodeValue::Heading(..) | NodeValue::CodeBlock(..)
        )
    }
}

/// The data carried by every tree node: its value, and the parser's
/// bookkeeping while the node is open.
#[derive(Debug, Clone)]
pub struct Ast {
    pub value: NodeValue,

    /// 1-based line of the source the node starts on.
    pub start_line: usize,

    pub(crate) content: Vec<u8>,
    // (index into `content`, absolute source offset) for every run added to
    // `content`, in increasing order.
    pub(crate) content_offsets: Vec<(usize, usize)>,
    pub(crate) open: bool,
    pub(crate) last_line_blank: bool,
}

impl Ast {
    /// An open node with no content yet.
    pub fn new(value: NodeValue, start_line: usize) -> Self {
        Ast {
            value,
            start_line,
            content: vec![],
            content_offsets: vec![],
            open: true,
            last_line_blank: false,
        }
    }

    // Drops the first `n` bytes of content, keeping the runs in step.
    pub(crate) fn remove_content_prefix(&mut self, n: usize) {
        let n = n.min(self.content.len());
        self.content.drain(..n);

        let first_kept = self.content_offsets.partition_point(|&(off, _)| off <= n);
        let mut runs = Vec::with_capacity(self.content_offsets.len() + 1 - first_kept);
        if let Some(&(off, src)) = first_kept.checked_sub(1).map(|ix| &self.content_offsets[ix]) {
            runs.push((0, src + (n - off)));
        }
        runs.extend(
            self.content_offsets[first_kept..]
                .iter()
                .map(|&(off, src)| (off - n, src)),
        );
        self.content_offsets = runs;
    }
}

/// A node of the document tree, living as long as the `Arena` that holds
/// it.  The `RefCell` lets the parser and callers edit nodes in place.
///
/// ```no_run
/// # use actionmark::nodes::{AstNode, NodeValue};
/// let root = AstNode::from(NodeValue::Document);
/// ```
pub type AstNode<'a> = Node<'a, RefCell<Ast>>;

impl<'a> From<NodeValue> for AstNode<'a> {
    fn from(value: NodeValue) -> Self {
        Node::new(RefCell::new(Ast::new(value, 0)))
    }
}

/// Maps an index into a block's accumulated content back to an absolute
/// offset in the source document, given the block's content runs.
pub(crate) fn source_offset(runs: &[(usize, usize)], content_index: usize) -> usize {
    let ix = runs.partition_point(|&(content_off, _)| content_off <= content_index);
    match ix.checked_sub(1).map(|ix| runs[ix]) {
        Some((content_off, source_off)) => source_off + (content_index - content_off),
        None => content_index,
    }
}

pub(crate) fn last_child_is_open<'a>(node: &'a AstNode<'a>) -> bool {
    node.last_child().map_or(false, |n| n.data.borrow().open)
}

/// Whether `node` may hold a child of the given kind.
pub fn can_contain_type<'a>(node: &'a AstNode<'a>, child: &NodeValue) -> bool {
    if let NodeValue::Document = *child {
        return false;
    }

    match node.data.borrow().value {
        NodeValue::Document
        | NodeValue::BlockQuote
        | NodeValue::Item(..)
        | NodeValue::TaskItem(..) => {
            child.block()
                && !matches!(
                    *child,
                    NodeValue::Item(..)
                        | NodeValue::TaskItem(..)
                        | NodeValue::TableRow(..)
                        | NodeValue::TableCell
                )
        }

        NodeValue::List(..) => matches!(*child, NodeValue::Item(..) | NodeValue::TaskItem(..)),

        NodeValue::Table(..) => matches!(*child, NodeValue::TableRow(..)),

        NodeValue::TableRow(..) => matches!(*child, NodeValue::TableCell),

        NodeValue::Paragraph
        | NodeValue::Heading(..)
        | NodeValue::TableCell
        | NodeValue::Emph
        | NodeValue::Strong
        | NodeValue::Strikethrough
        | NodeValue::Link(..)
        | NodeValue::Image(..) => !child.block(),

        _ => false,
    }
}

pub(crate) fn ends_with_blank_line<'a>(node: &'a AstNode<'a>) -> bool {
    let mut it = Some(node);
    while let Some(cur) = it {
        if cur.data.borrow().last_line_blank {
            return true;
        }
        match cur.data.borrow().value {
            NodeValue::List(..) | NodeValue::Item(..) | NodeValue::TaskItem(..) => {
                it = cur.last_child()
            }
            _ => it = None,
        };
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_offsets_follow_runs() {
        let runs = [(0, 10), (4, 20)];

        assert_eq!(source_offset(&runs, 0), 10);
        assert_eq!(source_offset(&runs, 2), 12);
        assert_eq!(source_offset(&runs, 4), 20);
        assert_eq!(source_offset(&runs, 6), 22);
        assert_eq!(source_offset(&[], 3), 3);
    }

    #[test]
    fn removing_a_prefix_keeps_offsets() {
        let mut ast = Ast::new(NodeValue::Paragraph, 1);
        ast.content = b"[a]: /u\nText\n".to_vec();
        ast.content_offsets = vec![(0, 0), (8, 10)];

        ast.remove_content_prefix(8);
        assert_eq!(ast.content, b"Text\n");
        assert_eq!(ast.content_offsets, vec![(0, 10)]);

        ast.remove_content_prefix(2);
        assert_eq!(ast.content_offsets, vec![(0, 12)]);
    }
}
