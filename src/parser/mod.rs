mod autolink;
mod heading_attributes;
mod inlines;
pub mod options;
pub(crate) mod registry;
mod table;

use std::cell::RefCell;
use std::cmp::min;
use std::mem;

use typed_arena::Arena;

use crate::action::ActionSpans;
use crate::ctype::{isdigit, isspace};
use crate::nodes::{
    self, Ast, AstNode, ListDelimType, ListType, NodeCodeBlock, NodeHeading, NodeHtmlBlock,
    NodeList, NodeTaskItem, NodeValue,
};
use crate::parser::inlines::{RefMap, ResolvedReference};
pub use crate::parser::options::Options;
use crate::parser::registry::Registry;
use crate::scanners;
use crate::strings;

const TAB_STOP: usize = 4;
const CODE_INDENT: usize = 4;

// Very deeply nested lists can cause quadratic performance issues.
// This constant is used in open_new_blocks() to limit the nesting
// depth. It is unlikely that a non-contrived markdown document will
// be nested this deeply.
const MAX_LIST_DEPTH: usize = 100;

/// Parse a Markdown document to an AST.
///
/// See the documentation of the crate root for an example.
pub fn parse_document<'a>(
    arena: &'a Arena<AstNode<'a>>,
    md: &str,
    options: &Options,
) -> &'a AstNode<'a> {
    let root = arena.alloc(AstNode::new(RefCell::new(Ast::new(NodeValue::Document, 1))));
    Parser::new(arena, root, options).parse(md)
}

/// Return whether the byte at the given offset passes the callback.
///
/// Returns `false` if the offset is out of bounds.
fn byte_matches<F>(bytes: &[u8], offset: usize, predicate: F) -> bool
where
    F: Fn(u8) -> bool,
{
    bytes.get(offset).map_or(false, |&b| predicate(b))
}

pub struct Parser<'a, 'o> {
    arena: &'a Arena<AstNode<'a>>,
    options: &'o Options,
    registry: Registry,
    refmap: RefMap,
    root: &'a AstNode<'a>,
    current: &'a AstNode<'a>,
    line_number: usize,
    // Source offset of the first byte of the line being processed.
    line_start: usize,
    offset: usize,
    column: usize,
    thematic_break_kill_pos: usize,
    first_nonspace: usize,
    first_nonspace_column: usize,
    indent: usize,
    blank: bool,
    partially_consumed_tab: bool,
}

enum AddTextResult {
    LiteralText,
    HtmlBlock(u8),
    Otherwise,
}

impl<'a, 'o> Parser<'a, 'o> {
    fn new(arena: &'a Arena<AstNode<'a>>, root: &'a AstNode<'a>, options: &'o Options) -> Self {
        Parser {
            arena,
            options,
            registry: Registry::for_options(options),
            refmap: RefMap::new(),
            root,
            current: root,
            line_number: 0,
            line_start: 0,
            offset: 0,
            column: 0,
            thematic_break_kill_pos: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
        }
    }

    fn parse(mut self, s: &str) -> &'a AstNode<'a> {
        let sb = s.as_bytes();
        let end = sb.len();
        let matcher = jetscii::bytes!(b'\r', b'\n');

        tracing::trace!(len = end, "parsing document");

        let mut ix = 0;
        while ix < end {
            let mut eol = match matcher.find(&sb[ix..]) {
                Some(offset) => ix + offset,
                None => end,
            };
            if eol < end {
                if sb[eol] == b'\r' {
                    eol += 1;
                    if eol < end && sb[eol] == b'\n' {
                        eol += 1;
                    }
                } else {
                    eol += 1;
                }
            }

            self.line_start = ix;
            if eol == end && !strings::is_line_end_char(sb[eol - 1]) {
                let mut line = sb[ix..eol].to_vec();
                line.push(b'\n');
                self.process_line(&line);
            } else {
                self.process_line(&sb[ix..eol]);
            }

            ix = eol;
        }

        self.finalize_document();
        self.postprocess_text_nodes(self.root);
        self.root
    }

    fn process_line(&mut self, line: &[u8]) {
        self.offset = 0;
        self.column = 0;
        self.first_nonspace = 0;
        self.first_nonspace_column = 0;
        self.indent = 0;
        self.thematic_break_kill_pos = 0;
        self.blank = false;
        self.partially_consumed_tab = false;

        if self.line_number == 0 && line.starts_with(b"\xef\xbb\xbf") {
            self.offset += 3;
        }

        self.line_number += 1;

        if let Some((last_matched_container, all_matched)) = self.check_open_blocks(line) {
            let mut container = last_matched_container;
            let current = self.current;
            self.open_new_blocks(&mut container, line, all_matched);

            if current.same_node(self.current) {
                self.add_text_to_container(container, last_matched_container, line);
            }
        }
    }

    ///////////////////////
    // Check open blocks //
    ///////////////////////

    fn check_open_blocks(&mut self, line: &[u8]) -> Option<(&'a AstNode<'a>, bool)> {
        let (all_matched, mut container) = self.check_open_blocks_inner(self.root, line)?;

        if !all_matched {
            container = container.parent().unwrap_or(self.root);
        }

        Some((container, all_matched))
    }

    fn check_open_blocks_inner(
        &mut self,
        mut container: &'a AstNode<'a>,
        line: &[u8],
    ) -> Option<(bool, &'a AstNode<'a>)> {
        let mut all_matched = false;

        loop {
            container = match container.last_child() {
                Some(child) if nodes::last_child_is_open(container) => child,
                _ => {
                    all_matched = true;
                    break;
                }
            };

            self.find_first_nonspace(line);

            let value = container.data.borrow().value.clone();
            match value {
                NodeValue::BlockQuote => {
                    if !self.parse_block_quote_prefix(line) {
                        break;
                    }
                }
                NodeValue::Item(ref nl) => {
                    if !self.parse_node_item_prefix(line, container, nl) {
                        break;
                    }
                }
                NodeValue::CodeBlock(ref ncb) => {
                    if !self.parse_code_block_prefix(line, container, ncb)? {
                        break;
                    }
                }
                NodeValue::HtmlBlock(ref nhb) => {
                    if !self.parse_html_block_prefix(nhb.block_type) {
                        break;
                    }
                }
                NodeValue::Paragraph => {
                    if self.blank {
                        break;
                    }
                }
                NodeValue::Table(..) => {
                    if !table::matches(
                        &line[self.first_nonspace..],
                        self.options.extension.template_actions,
                    ) {
                        break;
                    }
                }
                NodeValue::Heading(..) | NodeValue::TableRow(..) | NodeValue::TableCell => {
                    break;
                }
                _ => {}
            }
        }

        Some((all_matched, container))
    }

    fn find_first_nonspace(&mut self, line: &[u8]) {
        let mut chars_to_tab = TAB_STOP - (self.column % TAB_STOP);

        if self.first_nonspace <= self.offset {
            self.first_nonspace = self.offset;
            self.first_nonspace_column = self.column;

            loop {
                match line.get(self.first_nonspace) {
                    Some(b' ') => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += 1;
                        chars_to_tab -= 1;
                        if chars_to_tab == 0 {
                            chars_to_tab = TAB_STOP;
                        }
                    }
                    Some(b'\t') => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += chars_to_tab;
                        chars_to_tab = TAB_STOP;
                    }
                    _ => break,
                }
            }
        }

        self.indent = self.first_nonspace_column - self.column;
        self.blank = line
            .get(self.first_nonspace)
            .map_or(true, |&b| strings::is_line_end_char(b));
    }

    fn parse_block_quote_prefix(&mut self, line: &[u8]) -> bool {
        let indent = self.indent;
        if indent <= 3 && line.get(self.first_nonspace) == Some(&b'>') {
            self.advance_offset(line, indent + 1, true);

            if byte_matches(line, self.offset, strings::is_space_or_tab) {
                self.advance_offset(line, 1, true);
            }

            return true;
        }

        false
    }

    fn parse_node_item_prefix(
        &mut self,
        line: &[u8],
        container: &'a AstNode<'a>,
        nl: &NodeList,
    ) -> bool {
        if self.indent >= nl.marker_offset + nl.padding {
            self.advance_offset(line, nl.marker_offset + nl.padding, true);
            true
        } else if self.blank && container.first_child().is_some() {
            let offset = self.first_nonspace - self.offset;
            self.advance_offset(line, offset, false);
            true
        } else {
            false
        }
    }

    // `None` means the line closed a fenced block and nothing more is to be
    // done with it.
    fn parse_code_block_prefix(
        &mut self,
        line: &[u8],
        container: &'a AstNode<'a>,
        ncb: &NodeCodeBlock,
    ) -> Option<bool> {
        if !ncb.fenced {
            if self.indent >= CODE_INDENT {
                self.advance_offset(line, CODE_INDENT, true);
                return Some(true);
            } else if self.blank {
                let offset = self.first_nonspace - self.offset;
                self.advance_offset(line, offset, false);
                return Some(true);
            }
            return Some(false);
        }

        let matched = if self.indent <= 3 && line.get(self.first_nonspace) == Some(&ncb.fence_char)
        {
            scanners::close_code_fence(&line[self.first_nonspace..]).unwrap_or(0)
        } else {
            0
        };

        if matched >= ncb.fence_length {
            self.advance_offset(line, matched, false);
            self.current = self.finalize(container).unwrap_or(self.root);
            return None;
        }

        let mut i = ncb.fence_offset;
        while i > 0 && byte_matches(line, self.offset, strings::is_space_or_tab) {
            self.advance_offset(line, 1, true);
            i -= 1;
        }
        Some(true)
    }

    fn parse_html_block_prefix(&self, t: u8) -> bool {
        match t {
            1..=5 => true,
            _ => !self.blank,
        }
    }

    /////////////////////
    // Open new blocks //
    /////////////////////

    fn open_new_blocks(&mut self, container: &mut &'a AstNode<'a>, line: &[u8], all_matched: bool) {
        let mut maybe_lazy = node_matches!(self.current, NodeValue::Paragraph);
        let mut depth = 0;

        while !node_matches!(
            container,
            NodeValue::CodeBlock(..) | NodeValue::HtmlBlock(..)
        ) {
            depth += 1;
            self.find_first_nonspace(line);
            let indented = self.indent >= CODE_INDENT;

            if !((!indented
                && (self.handle_blockquote(container, line)
                    || self.handle_atx_heading(container, line)
                    || self.handle_code_fence(container, line)
                    || self.handle_html_block(container, line)
                    || self.handle_setext_heading(container, line)
                    || self.handle_thematic_break(container, line, all_matched)))
                || self.handle_list(container, line, indented, depth)
                || self.handle_code_block(container, line, indented, maybe_lazy)
                || self.handle_table(container, line, indented))
            {
                break;
            }

            if container.data.borrow().value.accepts_lines() {
                break;
            }

            maybe_lazy = false;
        }
    }

    fn handle_blockquote(&mut self, container: &mut &'a AstNode<'a>, line: &[u8]) -> bool {
        if line.get(self.first_nonspace) != Some(&b'>') {
            return false;
        }

        let offset = self.first_nonspace + 1 - self.offset;
        self.advance_offset(line, offset, false);
        if byte_matches(line, self.offset, strings::is_space_or_tab) {
            self.advance_offset(line, 1, true);
        }
        *container = self.add_child(container, NodeValue::BlockQuote);

        true
    }

    fn handle_atx_heading(&mut self, container: &mut &'a AstNode<'a>, line: &[u8]) -> bool {
        let matched = match scanners::atx_heading_start(&line[self.first_nonspace..]) {
            Some(matched) => matched,
            None => return false,
        };

        let heading_startpos = self.first_nonspace;
        let offset = self.offset;
        self.advance_offset(line, heading_startpos + matched - offset, false);

        let level = line[heading_startpos..]
            .iter()
            .take_while(|&&c| c == b'#')
            .count() as u8;

        *container = self.add_child(
            container,
            NodeValue::Heading(NodeHeading {
                level,
                setext: false,
                attributes: vec![],
            }),
        );

        true
    }

    fn handle_code_fence(&mut self, container: &mut &'a AstNode<'a>, line: &[u8]) -> bool {
        let matched = match scanners::open_code_fence(&line[self.first_nonspace..]) {
            Some(matched) => matched,
            None => return false,
        };

        let first_nonspace = self.first_nonspace;
        let offset = self.offset;
        let ncb = NodeCodeBlock {
            fenced: true,
            fence_char: line[first_nonspace],
            fence_length: matched,
            fence_offset: first_nonspace - offset,
            info: String::new(),
            literal: String::new(),
        };
        *container = self.add_child(container, NodeValue::CodeBlock(ncb));
        self.advance_offset(line, first_nonspace + matched - offset, false);

        true
    }

    fn handle_html_block(&mut self, container: &mut &'a AstNode<'a>, line: &[u8]) -> bool {
        let rest = &line[self.first_nonspace..];
        let matched = match scanners::html_block_start(rest).or_else(|| {
            if !node_matches!(container, NodeValue::Paragraph) {
                scanners::html_block_start_7(rest)
            } else {
                None
            }
        }) {
            Some(matched) => matched,
            None => return false,
        };

        let nhb = NodeHtmlBlock {
            block_type: matched as u8,
            literal: String::new(),
        };
        *container = self.add_child(container, NodeValue::HtmlBlock(nhb));

        true
    }

    fn handle_setext_heading(&mut self, container: &mut &'a AstNode<'a>, line: &[u8]) -> bool {
        if !node_matches!(container, NodeValue::Paragraph) {
            return false;
        }
        let sc = match scanners::setext_heading_line(&line[self.first_nonspace..]) {
            Some(sc) => sc,
            None => return false,
        };

        let has_content = {
            let mut ast = container.data.borrow_mut();
            self.resolve_reference_link_definitions(&mut ast)
        };
        if has_content {
            container.data.borrow_mut().value = NodeValue::Heading(NodeHeading {
                level: match sc {
                    scanners::SetextChar::Equals => 1,
                    scanners::SetextChar::Hyphen => 2,
                },
                setext: true,
                attributes: vec![],
            });
            let adv = line.len() - 1 - self.offset;
            self.advance_offset(line, adv, false);
        }

        true
    }

    fn handle_thematic_break(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        all_matched: bool,
    ) -> bool {
        if (node_matches!(container, NodeValue::Paragraph) && !all_matched)
            || self.thematic_break_kill_pos > self.first_nonspace
        {
            return false;
        }

        let (offset, found) = self.scan_thematic_break_inner(line);
        if !found {
            self.thematic_break_kill_pos = offset;
            return false;
        }

        *container = self.add_child(container, NodeValue::ThematicBreak);
        let adv = line.len() - 1 - self.offset;
        self.advance_offset(line, adv, false);

        true
    }

    // Returns how far the scan got and whether it found a break.  A failed
    // scan records its stopping point so the same line is not rescanned from
    // every nested container.
    fn scan_thematic_break_inner(&self, line: &[u8]) -> (usize, bool) {
        let mut i = self.first_nonspace;

        if i >= line.len() {
            return (i, false);
        }

        let b = line[i];
        if b != b'*' && b != b'_' && b != b'-' {
            return (i, false);
        }

        let mut count = 1;
        let mut nextb;
        loop {
            i += 1;
            if i >= line.len() {
                nextb = 255;
                break;
            }
            nextb = line[i];

            if nextb == b {
                count += 1;
            } else if nextb != b' ' && nextb != b'\t' {
                break;
            }
        }

        if count >= 3 && (nextb == 255 || nextb == b'\r' || nextb == b'\n') {
            ((i - self.first_nonspace) + 1, true)
        } else {
            (i, false)
        }
    }

    fn handle_list(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
        depth: usize,
    ) -> bool {
        if !((!indented || node_matches!(container, NodeValue::List(..)))
            && self.indent < 4
            && depth < MAX_LIST_DEPTH)
        {
            return false;
        }
        let (matched, mut nl) = match parse_list_marker(
            line,
            self.first_nonspace,
            node_matches!(container, NodeValue::Paragraph),
        ) {
            Some(found) => found,
            None => return false,
        };

        let offset = self.first_nonspace + matched - self.offset;
        self.advance_offset(line, offset, false);
        let (save_partially_consumed_tab, save_offset, save_column) =
            (self.partially_consumed_tab, self.offset, self.column);

        while self.column - save_column <= 5
            && byte_matches(line, self.offset, strings::is_space_or_tab)
        {
            self.advance_offset(line, 1, true);
        }

        let i = self.column - save_column;
        if !(1..5).contains(&i) || byte_matches(line, self.offset, strings::is_line_end_char) {
            nl.padding = matched + 1;
            self.offset = save_offset;
            self.column = save_column;
            self.partially_consumed_tab = save_partially_consumed_tab;
            if i > 0 {
                self.advance_offset(line, 1, true);
            }
        } else {
            nl.padding = matched + i;
        }

        nl.marker_offset = self.indent;

        let continues = match container.data.borrow().value {
            NodeValue::List(ref mnl) => lists_match(&nl, mnl),
            _ => false,
        };
        if !continues {
            *container = self.add_child(container, NodeValue::List(nl));
        }

        *container = self.add_child(container, NodeValue::Item(nl));

        true
    }

    fn handle_code_block(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
        maybe_lazy: bool,
    ) -> bool {
        if !indented || maybe_lazy || self.blank {
            return false;
        }

        self.advance_offset(line, CODE_INDENT, true);
        *container = self.add_child(container, NodeValue::CodeBlock(NodeCodeBlock::default()));

        true
    }

    fn handle_table(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
    ) -> bool {
        if indented || !self.options.extension.table {
            return false;
        }

        match table::try_opening_block(self, container, line) {
            Some(table) => {
                *container = table;
                true
            }
            None => false,
        }
    }

    //////////
    // Core //
    //////////

    fn advance_offset(&mut self, line: &[u8], mut count: usize, columns: bool) {
        while count > 0 {
            match line[self.offset] {
                b'\t' => {
                    let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                    if columns {
                        self.partially_consumed_tab = chars_to_tab > count;
                        let chars_to_advance = min(count, chars_to_tab);
                        self.column += chars_to_advance;
                        if !self.partially_consumed_tab {
                            self.offset += 1;
                        }
                        count -= chars_to_advance;
                    } else {
                        self.partially_consumed_tab = false;
                        self.column += chars_to_tab;
                        self.offset += 1;
                        count -= 1;
                    }
                }
                _ => {
                    self.partially_consumed_tab = false;
                    self.offset += 1;
                    self.column += 1;
                    count -= 1;
                }
            }
        }
    }

    fn add_child(&mut self, mut parent: &'a AstNode<'a>, value: NodeValue) -> &'a AstNode<'a> {
        while !nodes::can_contain_type(parent, &value) {
            parent = match self.finalize(parent) {
                Some(p) => p,
                None => break,
            };
        }

        let node = self
            .arena
            .alloc(AstNode::new(RefCell::new(Ast::new(value, self.line_number))));
        parent.append(node);
        node
    }

    fn add_text_to_container(
        &mut self,
        mut container: &'a AstNode<'a>,
        last_matched_container: &'a AstNode<'a>,
        line: &[u8],
    ) {
        self.find_first_nonspace(line);

        if self.blank {
            if let Some(last_child) = container.last_child() {
                last_child.data.borrow_mut().last_line_blank = true;
            }
        }

        let last_line_blank = self.blank
            && match container.data.borrow().value {
                NodeValue::BlockQuote
                | NodeValue::Heading(..)
                | NodeValue::ThematicBreak
                | NodeValue::Table(..) => false,
                NodeValue::CodeBlock(ref ncb) => !ncb.fenced,
                NodeValue::Item(..) => {
                    container.first_child().is_some()
                        || container.data.borrow().start_line != self.line_number
                }
                _ => true,
            };
        container.data.borrow_mut().last_line_blank = last_line_blank;

        let mut tmp = container;
        while let Some(parent) = tmp.parent() {
            parent.data.borrow_mut().last_line_blank = false;
            tmp = parent;
        }

        if !self.current.same_node(last_matched_container)
            && container.same_node(last_matched_container)
            && !self.blank
            && node_matches!(self.current, NodeValue::Paragraph)
        {
            // Lazy paragraph continuation.
            self.add_line(self.current, line);
            return;
        }

        while !self.current.same_node(last_matched_container) {
            self.current = match self.finalize(self.current) {
                Some(parent) => parent,
                None => break,
            };
        }

        let add_text_result = match container.data.borrow().value {
            NodeValue::CodeBlock(..) => AddTextResult::LiteralText,
            NodeValue::HtmlBlock(ref nhb) => AddTextResult::HtmlBlock(nhb.block_type),
            _ => AddTextResult::Otherwise,
        };

        match add_text_result {
            AddTextResult::LiteralText => {
                self.add_line(container, line);
            }
            AddTextResult::HtmlBlock(block_type) => {
                self.add_line(container, line);

                let rest = &line[self.first_nonspace..];
                let matches_end_condition = match block_type {
                    1 => scanners::html_block_end_1(rest),
                    2 => scanners::html_block_end_2(rest),
                    3 => scanners::html_block_end_3(rest),
                    4 => scanners::html_block_end_4(rest),
                    5 => scanners::html_block_end_5(rest),
                    _ => false,
                };

                if matches_end_condition {
                    container = self.finalize(container).unwrap_or(self.root);
                }
            }
            AddTextResult::Otherwise => {
                if self.blank {
                    // do nothing
                } else if container.data.borrow().value.accepts_lines() {
                    let mut chopped;
                    let mut line = line;
                    if node_matches!(container, NodeValue::Heading(NodeHeading { setext: false, .. }))
                    {
                        chopped = line.to_vec();
                        strings::chop_trailing_hashtags(&mut chopped);
                        line = &chopped;
                    }

                    // `chop_trailing_hashtags` can leave the line shorter than
                    // `first_nonspace`, as in `###     ###`, in which case
                    // there is no text to add.
                    if self.first_nonspace <= line.len() {
                        let count = self.first_nonspace - self.offset;
                        self.advance_offset(line, count, false);
                        self.add_line(container, line);
                    }
                } else {
                    container = self.add_child(container, NodeValue::Paragraph);
                    let count = self.first_nonspace - self.offset;
                    self.advance_offset(line, count, false);
                    self.add_line(container, line);
                }
            }
        }

        self.current = container;
    }

    fn add_line(&mut self, node: &'a AstNode<'a>, line: &[u8]) {
        let mut ast = node.data.borrow_mut();
        debug_assert!(ast.open);
        if self.partially_consumed_tab {
            self.offset += 1;
            let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
            ast.content.extend(std::iter::repeat(b' ').take(chars_to_tab));
        }
        if self.offset < line.len() {
            // Leading whitespace and container markers are not part of the
            // content; remember where this run really came from.
            let at = ast.content.len();
            ast.content_offsets.push((at, self.line_start + self.offset));
            ast.content.extend_from_slice(&line[self.offset..]);
        }
    }

    fn finalize_document(&mut self) {
        while !self.current.same_node(self.root) {
            self.current = match self.finalize(self.current) {
                Some(parent) => parent,
                None => break,
            };
        }

        self.finalize(self.root);
        self.process_inlines();
    }

    fn finalize(&mut self, node: &'a AstNode<'a>) -> Option<&'a AstNode<'a>> {
        let mut borrow = node.data.borrow_mut();
        let ast: &mut Ast = &mut borrow;
        ast.open = false;

        let parent = node.parent();

        match ast.value {
            NodeValue::Paragraph => {
                if !self.resolve_reference_link_definitions(ast) {
                    node.detach();
                }
            }
            NodeValue::Heading(ref mut nh) => {
                if !nh.setext && self.options.parse.heading_attributes {
                    if let Some((at, attributes)) = heading_attributes::split_trailing(
                        &ast.content,
                        self.options.extension.template_actions,
                    ) {
                        ast.content.truncate(at);
                        strings::rtrim(&mut ast.content);
                        nh.attributes = attributes;
                    }
                }
            }
            NodeValue::CodeBlock(ref mut ncb) => {
                let content = &mut ast.content;
                if !ncb.fenced {
                    strings::remove_trailing_blank_lines(content);
                    content.push(b'\n');
                } else {
                    let pos = content
                        .iter()
                        .position(|&c| strings::is_line_end_char(c))
                        .unwrap_or(content.len());

                    ncb.info = strings::to_string(strings::trim_slice(&content[..pos]).to_vec());

                    let mut pos = pos;
                    if content.get(pos) == Some(&b'\r') {
                        pos += 1;
                    }
                    if content.get(pos) == Some(&b'\n') {
                        pos += 1;
                    }
                    content.drain(..pos);
                }
                ncb.literal = strings::to_string(mem::take(content));
            }
            NodeValue::HtmlBlock(ref mut nhb) => {
                nhb.literal = strings::to_string(mem::take(&mut ast.content));
            }
            NodeValue::List(ref mut nl) => {
                nl.tight = determine_list_tight(node);
            }
            _ => (),
        }

        parent
    }

    // Peels link reference definitions off the start of a paragraph.  Returns
    // whether anything is left.
    fn resolve_reference_link_definitions(&mut self, ast: &mut Ast) -> bool {
        let mut pos = 0;
        let spans = if self.options.extension.template_actions {
            ActionSpans::scan(&ast.content)
        } else {
            ActionSpans::default()
        };

        while pos < ast.content.len() && ast.content[pos] == b'[' {
            match self.parse_reference_inline(&ast.content[pos..], &spans, pos) {
                Some((offset, rr)) => {
                    pos += offset;
                    if let Some((lab, rr)) = rr {
                        self.refmap.map.entry(lab).or_insert(rr);
                    }
                }
                None => break,
            }
        }

        if pos != 0 {
            ast.remove_content_prefix(pos);
        }

        !strings::is_blank(&ast.content)
    }

    // `spans` indexes the whole paragraph, of which `content` starts at
    // `base`.
    fn parse_reference_inline(
        &self,
        content: &[u8],
        spans: &ActionSpans,
        base: usize,
    ) -> Option<(usize, Option<(String, ResolvedReference)>)> {
        let action_aware = self.options.extension.template_actions;
        let mut scanner = inlines::Scanner::new();

        let lab = match scanner.link_label(content, spans.at(base)) {
            Some(lab) if !lab.is_empty() => strings::to_string(lab.to_vec()),
            _ => return None,
        };

        if scanner.peek_byte(content) != Some(b':') {
            return None;
        }

        scanner.pos += 1;
        scanner.spnl(content);
        let (url, matchlen) = inlines::manual_scan_link_url(
            &content[scanner.pos..],
            spans.at(base + scanner.pos),
        )?;
        scanner.pos += matchlen;

        let beforetitle = scanner.pos;
        scanner.spnl(content);
        let title_search = if scanner.pos == beforetitle {
            None
        } else {
            inlines::scan_link_title(&content[scanner.pos..], spans.at(base + scanner.pos))
        };
        let title: &[u8] = match title_search {
            Some(matchlen) => {
                let t = &content[scanner.pos..scanner.pos + matchlen];
                scanner.pos += matchlen;
                t
            }
            None => {
                scanner.pos = beforetitle;
                b""
            }
        };

        scanner.skip_spaces(content);
        if !scanner.skip_line_end(content) {
            if !title.is_empty() {
                scanner.pos = beforetitle;
                scanner.skip_spaces(content);
                if !scanner.skip_line_end(content) {
                    return None;
                }
            } else {
                return None;
            }
        }

        let lab = strings::normalize_label(&lab);
        let mut rr = None;
        if !lab.is_empty() && !self.refmap.map.contains_key(&lab) {
            tracing::trace!(label = %lab, "link reference definition");
            let title = if title_search.is_some() { title } else { b"" };
            rr = Some((
                lab,
                ResolvedReference {
                    url: strings::clean_url(url, action_aware),
                    title: strings::clean_title(title, action_aware),
                },
            ));
        }
        Some((scanner.pos, rr))
    }

    fn process_inlines(&mut self) {
        for node in self.root.descendants() {
            if node.data.borrow().value.contains_inlines() {
                self.parse_inlines(node);
            }
        }
    }

    fn parse_inlines(&self, node: &'a AstNode<'a>) {
        let (mut content, runs) = {
            let mut ast = node.data.borrow_mut();
            (
                mem::take(&mut ast.content),
                mem::take(&mut ast.content_offsets),
            )
        };
        strings::rtrim(&mut content);

        let mut subj = inlines::Subject::new(
            self.arena,
            self.options,
            &self.registry,
            &content,
            &runs,
            &self.refmap,
        );

        while subj.parse_inline(node) {}
        subj.process_emphasis(0);
    }

    // Joins adjacent text nodes, runs the tasklist and autolink extensions
    // over the result, and drops text left empty.
    fn postprocess_text_nodes(&self, root: &'a AstNode<'a>) {
        let mut stack = vec![(root, false)];

        while let Some((parent, in_link)) = stack.pop() {
            let mut it = parent.first_child();

            while let Some(node) = it {
                let is_text = node.data.borrow().value.text().is_some();
                if is_text {
                    self.postprocess_text_node(node, in_link);
                } else {
                    // Text under a link is never linked again.
                    let link = node_matches!(node, NodeValue::Link(..) | NodeValue::Image(..));
                    stack.push((node, in_link || link));
                }

                it = node.next_sibling();

                let emptied = node
                    .data
                    .borrow()
                    .value
                    .text()
                    .map_or(false, |t| t.is_empty());
                if emptied {
                    node.detach();
                }
            }
        }
    }

    fn postprocess_text_node(&self, node: &'a AstNode<'a>, in_link: bool) {
        let mut text = match node.data.borrow_mut().value.text_mut() {
            Some(t) => mem::take(t),
            None => return,
        };

        while let Some(next) = node.next_sibling() {
            match next.data.borrow().value {
                NodeValue::Text(ref adj) => text.push_str(adj),
                _ => break,
            }
            next.detach();
        }

        if self.options.extension.tasklist {
            self.process_tasklist(node, &mut text);
        }

        if self.options.extension.autolink && !in_link {
            autolink::process_autolinks(self.arena, node, &mut text);
        }

        if let Some(t) = node.data.borrow_mut().value.text_mut() {
            *t = text;
        }
    }

    // Turns the item holding `node` into a task item when `node` opens the
    // item's first paragraph with `[ ]`, `[x]` or `[X]` and a space.
    fn process_tasklist(&self, node: &'a AstNode<'a>, text: &mut String) {
        let (symbol, end) = match tasklist_marker(text.as_bytes()) {
            Some(found) => found,
            None => return,
        };

        let paragraph = match node.parent() {
            Some(p) if node_matches!(p, NodeValue::Paragraph) => p,
            _ => return,
        };
        if node.previous_sibling().is_some() || paragraph.previous_sibling().is_some() {
            return;
        }

        let item = match paragraph.parent() {
            Some(item) if node_matches!(item, NodeValue::Item(..)) => item,
            _ => return,
        };
        if !item
            .parent()
            .map_or(false, |list| node_matches!(list, NodeValue::List(..)))
        {
            return;
        }

        text.drain(..end);
        item.data.borrow_mut().value = NodeValue::TaskItem(NodeTaskItem { symbol });
    }
}

fn tasklist_marker(text: &[u8]) -> Option<(Option<char>, usize)> {
    match *text {
        [b'[', mark, b']', b' ' | b'\t', ..] => match mark {
            b' ' => Some((None, 4)),
            b'x' | b'X' => Some((Some(mark as char), 4)),
            _ => None,
        },
        _ => None,
    }
}

fn determine_list_tight<'a>(node: &'a AstNode<'a>) -> bool {
    let mut ch = node.first_child();

    while let Some(item) = ch {
        if item.data.borrow().last_line_blank && item.next_sibling().is_some() {
            return false;
        }

        let mut subch = item.first_child();
        while let Some(subitem) = subch {
            if (item.next_sibling().is_some() || subitem.next_sibling().is_some())
                && nodes::ends_with_blank_line(subitem)
            {
                return false;
            }
            subch = subitem.next_sibling();
        }

        ch = item.next_sibling();
    }

    true
}

fn parse_list_marker(
    line: &[u8],
    mut pos: usize,
    interrupts_paragraph: bool,
) -> Option<(usize, NodeList)> {
    let bytes = line;
    if pos >= line.len() {
        return None;
    }
    let mut c = bytes[pos];
    let startpos = pos;

    if c == b'*' || c == b'-' || c == b'+' {
        pos += 1;
        if !bytes.get(pos).map_or(true, |&b| isspace(b)) {
            return None;
        }

        if interrupts_paragraph {
            // "However, an empty list item cannot interrupt a paragraph:"
            let mut i = pos;
            if i == bytes.len() {
                return None;
            }

            while strings::is_space_or_tab(bytes[i]) {
                i += 1;
                if i == bytes.len() {
                    return None;
                }
            }
            if strings::is_line_end_char(bytes[i]) {
                return None;
            }
        }

        return Some((
            pos - startpos,
            NodeList {
                list_type: ListType::Bullet,
                marker_offset: 0,
                padding: 0,
                start: 1,
                delimiter: ListDelimType::Period,
                bullet_char: c,
                tight: false,
            },
        ));
    } else if isdigit(c) {
        let mut start: usize = 0;
        let mut digits = 0;

        loop {
            start = (10 * start) + (bytes[pos] - b'0') as usize;
            pos += 1;
            digits += 1;

            if pos == bytes.len() {
                return None;
            }

            if !(digits < 9 && isdigit(bytes[pos])) {
                break;
            }
        }

        if interrupts_paragraph && start != 1 {
            return None;
        }

        c = bytes[pos];
        if c != b'.' && c != b')' {
            return None;
        }

        pos += 1;

        if pos == bytes.len() || !isspace(bytes[pos]) {
            return None;
        }

        if interrupts_paragraph {
            let mut i = pos;
            while strings::is_space_or_tab(bytes[i]) {
                i += 1;
                if i == bytes.len() {
                    return None;
                }
            }
            if strings::is_line_end_char(bytes[i]) {
                return None;
            }
        }

        return Some((
            pos - startpos,
            NodeList {
                list_type: ListType::Ordered,
                marker_offset: 0,
                padding: 0,
                start,
                delimiter: if c == b'.' {
                    ListDelimType::Period
                } else {
                    ListDelimType::Paren
                },
                bullet_char: 0,
                tight: false,
            },
        ));
    }

    None
}

fn lists_match(list_data: &NodeList, item_data: &NodeList) -> bool {
    list_data.list_type == item_data.list_type
        && list_data.delimiter == item_data.delimiter
        && list_data.bullet_char == item_data.bullet_char
}
