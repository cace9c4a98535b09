use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::str;
use typed_arena::Arena;
use unicode_categories::UnicodeCategories;

use crate::action::{self, ActionSpans, ActionsAt, Segment};
use crate::ctype::{ispunct, isspace};
use crate::entity;
use crate::nodes::{self, Ast, AstNode, NodeCode, NodeLink, NodeTemplateAction, NodeValue};
use crate::parser::options::Options;
use crate::parser::registry::{Parsed, Registry};
use crate::scanners;
use crate::strings::{self, AutolinkType};

pub mod recognizers;

const MAXBACKTICKS: usize = 80;
const MAX_LINK_LABEL_LENGTH: usize = 1000;

trait FlankingCheckHelper {
    fn is_cmark_punctuation(&self) -> bool;
}

impl FlankingCheckHelper for char {
    #[inline]
    fn is_cmark_punctuation(&self) -> bool {
        self.is_punctuation() || self.is_symbol()
    }
}

/// A link reference definition, ready for use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Default)]
pub struct RefMap {
    pub map: FxHashMap<String, ResolvedReference>,
}

impl RefMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, lab: &str) -> Option<ResolvedReference> {
        self.map.get(lab).cloned()
    }
}

/// The state of inline parsing over the content of one leaf block.
pub struct Subject<'a, 'r> {
    pub arena: &'a Arena<AstNode<'a>>,
    registry: &'r Registry,
    pub input: &'r [u8],
    pub pos: usize,
    // Where each action in `input` closes, across lines and within one.
    actions: ActionSpans,
    line_actions: ActionSpans,
    // The block's content runs, for mapping positions back to the source.
    runs: &'r [(usize, usize)],
    refmap: &'r RefMap,
    delimiters: Vec<Delimiter<'a>>,
    last_delimiter: Option<usize>,
    brackets: Vec<Bracket<'a>>,
    backticks: [usize; MAXBACKTICKS + 1],
    scanned_for_backticks: bool,
    no_link_openers: bool,
}

struct Delimiter<'a> {
    inl: &'a AstNode<'a>,
    position: usize,
    length: usize,
    delim_char: u8,
    can_open: bool,
    can_close: bool,
    prev: Option<usize>,
    next: Option<usize>,
}

impl std::fmt::Debug for Delimiter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[pos {}, len {}, delim_char {:?}, open? {} close? {}]",
            self.position, self.length, self.delim_char as char, self.can_open, self.can_close,
        )
    }
}

struct Bracket<'a> {
    inl_text: &'a AstNode<'a>,
    position: usize,
    image: bool,
    bracket_after: bool,
}

impl<'a, 'r> Subject<'a, 'r> {
    pub fn new(
        arena: &'a Arena<AstNode<'a>>,
        options: &'r Options,
        registry: &'r Registry,
        input: &'r [u8],
        runs: &'r [(usize, usize)],
        refmap: &'r RefMap,
    ) -> Self {
        let (actions, line_actions) = if options.extension.template_actions {
            (ActionSpans::scan(input), ActionSpans::scan_lines(input))
        } else {
            Default::default()
        };

        Subject {
            arena,
            registry,
            input,
            pos: 0,
            actions,
            line_actions,
            runs,
            refmap,
            delimiters: vec![],
            last_delimiter: None,
            brackets: vec![],
            backticks: [0; MAXBACKTICKS + 1],
            scanned_for_backticks: false,
            no_link_openers: true,
        }
    }

    /// Parses one inline at the cursor and appends whatever it produced to
    /// `node`.  Returns false at the end of input.
    pub fn parse_inline(&mut self, node: &'a AstNode<'a>) -> bool {
        let b = match self.peek_byte() {
            None => return false,
            Some(b) => b,
        };

        let start = self.pos;
        let registry = self.registry;
        for recognizer in registry.candidates(b) {
            match recognizer.try_parse(self) {
                Parsed::Declined => self.pos = start,
                Parsed::Node(inl) => {
                    node.append(inl);
                    return true;
                }
                Parsed::Consumed => return true,
            }
        }

        if registry.is_special(b) {
            self.pos += 1;
            let inl = self.make_inline(NodeValue::Text((b as char).to_string()));
            node.append(inl);
            return true;
        }

        let endpos = self.find_special_char();
        let mut contents = self.input[self.pos..endpos].to_vec();
        self.pos = endpos;

        if self
            .peek_byte()
            .map_or(false, strings::is_line_end_char)
        {
            strings::rtrim(&mut contents);
        }

        if !contents.is_empty() {
            let inl = self.make_inline(NodeValue::Text(strings::to_string(contents)));
            node.append(inl);
        }

        true
    }

    // Walks the delimiter list from `stack_bottom` upwards looking for
    // closers, and from each closer back down for its opener.  Matched runs
    // have their text nodes shortened or removed and everything between them
    // moved into a new `Emph`, `Strong` or `Strikethrough` node; unmatched
    // runs stay as text.
    //
    // `openers_bottom` remembers, per kind of closer, how far down a failed
    // search went, so the same stretch is never searched twice.
    pub fn process_emphasis(&mut self, stack_bottom: usize) {
        let mut openers_bottom: [usize; 8] = [stack_bottom; 8];

        let mut candidate = self.last_delimiter;
        let mut closer: Option<usize> = None;
        while let Some(c) = candidate {
            if self.delimiters[c].position < stack_bottom {
                break;
            }
            closer = candidate;
            candidate = self.delimiters[c].prev;
        }

        while let Some(c) = closer {
            if !self.delimiters[c].can_close {
                closer = self.delimiters[c].next;
                continue;
            }

            let mut opener = self.delimiters[c].prev;
            let mut opener_found = false;
            let mut mod_three_rule_invoked = false;

            let ix = match self.delimiters[c].delim_char {
                b'_' => 0,
                b'~' => 1,
                _ => {
                    2 + (if self.delimiters[c].can_open { 3 } else { 0 })
                        + (self.delimiters[c].length % 3)
                }
            };

            while let Some(o) = opener {
                if self.delimiters[o].position < openers_bottom[ix] {
                    break;
                }
                if self.delimiters[o].can_open
                    && self.delimiters[o].delim_char == self.delimiters[c].delim_char
                {
                    // A run that can both open and close can't pair with a
                    // run whose combined length is a multiple of three,
                    // unless both are.
                    let odd_match = (self.delimiters[c].can_open || self.delimiters[o].can_close)
                        && ((self.delimiters[o].length + self.delimiters[c].length) % 3 == 0)
                        && !(self.delimiters[o].length % 3 == 0
                            && self.delimiters[c].length % 3 == 0);
                    if !odd_match {
                        opener_found = true;
                        break;
                    }
                    mod_three_rule_invoked = true;
                }
                opener = self.delimiters[o].prev;
            }

            let old_c = c;

            closer = match opener {
                Some(o) if opener_found => self.insert_emph(o, c),
                _ => self.delimiters[c].next,
            };

            if !opener_found {
                if !mod_three_rule_invoked {
                    openers_bottom[ix] = self.delimiters[old_c].position;
                }

                // Searches from here on up will look at `old_c` as a
                // potential opener; if it can't be one, it's just text.
                if !self.delimiters[old_c].can_open {
                    self.remove_delimiter(old_c);
                }
            }
        }

        self.remove_delimiters(stack_bottom);
    }

    fn remove_delimiter(&mut self, delimiter: usize) {
        let prev = self.delimiters[delimiter].prev;
        let next = self.delimiters[delimiter].next;
        match next {
            None => {
                debug_assert_eq!(Some(delimiter), self.last_delimiter);
                self.last_delimiter = prev;
            }
            Some(next) => self.delimiters[next].prev = prev,
        }
        if let Some(prev) = prev {
            self.delimiters[prev].next = next;
        }
    }

    fn remove_delimiters(&mut self, stack_bottom: usize) {
        while let Some(d) = self.last_delimiter {
            if self.delimiters[d].position < stack_bottom {
                break;
            }
            self.remove_delimiter(d);
        }
    }

    #[inline]
    pub fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn peek_byte(&self) -> Option<u8> {
        self.peek_byte_n(0)
    }

    #[inline]
    pub fn peek_byte_n(&self, n: usize) -> Option<u8> {
        self.input.get(self.pos + n).copied()
    }

    /// The absolute source offset of `input[pos]`.
    pub fn source_offset(&self, pos: usize) -> usize {
        nodes::source_offset(self.runs, pos)
    }

    fn find_special_char(&self) -> usize {
        self.input[self.pos..]
            .iter()
            .position(|&b| self.registry.is_special(b))
            .map_or(self.input.len(), |n| self.pos + n)
    }

    pub fn make_inline(&self, value: NodeValue) -> &'a AstNode<'a> {
        let mut ast = Ast::new(value, 0);
        ast.open = false;
        self.arena.alloc(AstNode::new(RefCell::new(ast)))
    }

    pub fn handle_newline(&mut self) -> &'a AstNode<'a> {
        let nlpos = self.pos;
        if self.peek_byte() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek_byte() == Some(b'\n') {
            self.pos += 1;
        }
        let inl = if nlpos > 1 && self.input[nlpos - 1] == b' ' && self.input[nlpos - 2] == b' '
        {
            self.make_inline(NodeValue::LineBreak)
        } else {
            self.make_inline(NodeValue::SoftBreak)
        };
        self.skip_spaces();
        inl
    }

    fn take_while(&mut self, c: u8) -> usize {
        let start_pos = self.pos;
        while self.peek_byte() == Some(c) {
            self.pos += 1;
        }
        self.pos - start_pos
    }

    fn scan_to_closing_backtick(&mut self, openticklength: usize) -> Option<usize> {
        if openticklength > MAXBACKTICKS {
            return None;
        }

        if self.scanned_for_backticks && self.backticks[openticklength] <= self.pos {
            return None;
        }

        loop {
            while self.peek_byte().map_or(false, |c| c != b'`') {
                self.pos += 1;
            }
            if self.eof() {
                self.scanned_for_backticks = true;
                return None;
            }
            let numticks = self.take_while(b'`');
            if numticks <= MAXBACKTICKS {
                self.backticks[numticks] = self.pos - numticks;
            }
            if numticks == openticklength {
                return Some(self.pos);
            }
        }
    }

    pub fn handle_backticks(&mut self) -> &'a AstNode<'a> {
        let startpos = self.pos;
        let openticks = self.take_while(b'`');
        let endpos = self.scan_to_closing_backtick(openticks);

        match endpos {
            None => {
                self.pos = startpos + openticks;
                self.make_inline(NodeValue::Text("`".repeat(openticks)))
            }
            Some(endpos) => {
                let buf = &self.input[startpos + openticks..endpos - openticks];
                let buf = strings::normalize_code(buf);
                self.make_inline(NodeValue::Code(NodeCode {
                    num_backticks: openticks,
                    literal: strings::to_string(buf),
                }))
            }
        }
    }

    pub fn skip_spaces(&mut self) -> bool {
        let mut skipped = false;
        while self.peek_byte().map_or(false, |c| c == b' ' || c == b'\t') {
            self.pos += 1;
            skipped = true;
        }
        skipped
    }

    pub fn skip_line_end(&mut self) -> bool {
        let old_pos = self.pos;
        if self.peek_byte() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek_byte() == Some(b'\n') {
            self.pos += 1;
        }
        self.pos > old_pos || self.eof()
    }

    pub fn handle_delim(&mut self, c: u8) -> &'a AstNode<'a> {
        let (numdelims, can_open, can_close) = self.scan_delims(c);

        let contents = strings::to_string(self.input[self.pos - numdelims..self.pos].to_vec());
        let inl = self.make_inline(NodeValue::Text(contents));

        if can_open || can_close {
            self.push_delimiter(c, numdelims, can_open, can_close, inl);
        }

        inl
    }

    fn char_before(&self, pos: usize) -> char {
        if pos == 0 {
            return '\n';
        }
        let mut before_char_pos = pos - 1;
        while before_char_pos > 0 && self.input[before_char_pos] >> 6 == 2 {
            before_char_pos -= 1;
        }
        str::from_utf8(&self.input[before_char_pos..pos])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or('\n')
    }

    fn char_at(&self, pos: usize) -> char {
        let width = match self.input.get(pos) {
            None => return '\n',
            Some(&b) if b < 0x80 => 1,
            Some(&b) if b < 0xE0 => 2,
            Some(&b) if b < 0xF0 => 3,
            Some(_) => 4,
        };
        let end = (pos + width).min(self.input.len());
        str::from_utf8(&self.input[pos..end])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or('\n')
    }

    fn scan_delims(&mut self, c: u8) -> (usize, bool, bool) {
        let before_char = self.char_before(self.pos);
        let numdelims = self.take_while(c);
        let after_char = self.char_at(self.pos);

        let left_flanking = numdelims > 0
            && !after_char.is_whitespace()
            && (!after_char.is_cmark_punctuation()
                || before_char.is_whitespace()
                || before_char.is_cmark_punctuation());
        let right_flanking = numdelims > 0
            && !before_char.is_whitespace()
            && (!before_char.is_cmark_punctuation()
                || after_char.is_whitespace()
                || after_char.is_cmark_punctuation());

        if c == b'_' {
            (
                numdelims,
                left_flanking && (!right_flanking || before_char.is_cmark_punctuation()),
                right_flanking && (!left_flanking || after_char.is_cmark_punctuation()),
            )
        } else {
            (numdelims, left_flanking, right_flanking)
        }
    }

    fn push_delimiter(
        &mut self,
        c: u8,
        length: usize,
        can_open: bool,
        can_close: bool,
        inl: &'a AstNode<'a>,
    ) {
        let d = self.delimiters.len();
        self.delimiters.push(Delimiter {
            inl,
            position: self.pos,
            length,
            delim_char: c,
            can_open,
            can_close,
            prev: self.last_delimiter,
            next: None,
        });
        if let Some(prev) = self.last_delimiter {
            self.delimiters[prev].next = Some(d);
        }
        self.last_delimiter = Some(d);
    }

    fn delimiter_text_len(&self, d: usize) -> usize {
        self.delimiters[d]
            .inl
            .data
            .borrow()
            .value
            .text()
            .map_or(0, |t| t.len())
    }

    // Creates the emphasis node for a matched opener and closer, moves the
    // nodes between them into it, and returns the next closer to consider.
    // Runs longer than the pair used are shortened in place and, for the
    // closer, handed back to be matched again.
    fn insert_emph(&mut self, opener: usize, closer: usize) -> Option<usize> {
        let mut opener_num_chars = self.delimiter_text_len(opener);
        let mut closer_num_chars = self.delimiter_text_len(closer);
        let use_delims = if closer_num_chars >= 2 && opener_num_chars >= 2 {
            2
        } else {
            1
        };

        opener_num_chars -= use_delims;
        closer_num_chars -= use_delims;

        let opener_char = self.delimiters[opener].delim_char;
        if opener_char == b'~' && (opener_num_chars != closer_num_chars || opener_num_chars > 0) {
            // `~` and `~~` only pair with a run of the same length.
            return self.delimiters[closer].next;
        }

        let opener_inl = self.delimiters[opener].inl;
        let closer_inl = self.delimiters[closer].inl;
        if let Some(t) = opener_inl.data.borrow_mut().value.text_mut() {
            t.truncate(opener_num_chars);
        }
        if let Some(t) = closer_inl.data.borrow_mut().value.text_mut() {
            t.truncate(closer_num_chars);
        }

        // Everything between the pair was scanned already and matched
        // nothing.
        let mut delim = self.delimiters[closer].prev;
        while let Some(d) = delim {
            if d == opener {
                break;
            }
            self.remove_delimiter(d);
            delim = self.delimiters[d].prev;
        }

        let emph = self.make_inline(if opener_char == b'~' {
            NodeValue::Strikethrough
        } else if use_delims == 1 {
            NodeValue::Emph
        } else {
            NodeValue::Strong
        });

        let mut tmp = opener_inl.next_sibling();
        while let Some(n) = tmp {
            if n.same_node(closer_inl) {
                break;
            }
            tmp = n.next_sibling();
            emph.append(n);
        }
        opener_inl.insert_after(emph);

        if opener_num_chars == 0 {
            opener_inl.detach();
            self.remove_delimiter(opener);
        }

        if closer_num_chars == 0 {
            closer_inl.detach();
            let next = self.delimiters[closer].next;
            self.remove_delimiter(closer);
            next
        } else {
            Some(closer)
        }
    }

    pub fn handle_backslash(&mut self) -> &'a AstNode<'a> {
        self.pos += 1;

        if self.peek_byte().map_or(false, ispunct) {
            self.pos += 1;
            self.make_inline(NodeValue::Text(
                (self.input[self.pos - 1] as char).to_string(),
            ))
        } else if !self.eof() && self.skip_line_end() {
            let inl = self.make_inline(NodeValue::LineBreak);
            self.skip_spaces();
            inl
        } else {
            self.make_inline(NodeValue::Text("\\".to_string()))
        }
    }

    pub fn handle_entity(&mut self) -> &'a AstNode<'a> {
        self.pos += 1;

        match entity::unescape(&self.input[self.pos..]) {
            None => self.make_inline(NodeValue::Text("&".to_string())),
            Some((entity, len)) => {
                self.pos += len;
                self.make_inline(NodeValue::Text(entity.into_owned()))
            }
        }
    }

    /// Claims the template action starting at the cursor, if one closes on
    /// the current line.
    pub fn handle_template_action(&mut self) -> Option<&'a AstNode<'a>> {
        let rest = &self.input[self.pos..];
        if !rest.starts_with(action::ACTION_OPEN) {
            return None;
        }

        let start = self.source_offset(self.pos);
        let end = match self.line_actions.end_of(self.pos) {
            Some(end) => end - self.pos,
            None => {
                tracing::debug!(offset = start, "unterminated action kept as text");
                return None;
            }
        };

        let segment = Segment::new(start, start + end);
        tracing::trace!(start = segment.start, stop = segment.stop, "template action");

        self.pos += end;
        Some(self.make_inline(NodeValue::TemplateAction(NodeTemplateAction {
            content: strings::to_string(rest[..end].to_vec()),
            segment,
        })))
    }

    /// Tries an autolink at the `<` under the cursor.
    ///
    /// When `action_aware`, the closing `>` is looked for outside template
    /// actions, and content that starts with an action, or is a scheme
    /// followed by anything containing one, is taken as a URL.
    pub fn handle_autolink(&mut self, action_aware: bool) -> Option<&'a AstNode<'a>> {
        let rest = &self.input[self.pos + 1..];

        if action_aware {
            if let Some(close) = find_autolink_close(rest, self.actions.at(self.pos + 1)) {
                let content = &rest[..close];
                if content.starts_with(action::ACTION_OPEN)
                    || (scanners::scheme(content).is_some() && action::contains_action(content))
                {
                    self.pos += 1 + close + 1;
                    return Some(self.make_autolink(content, AutolinkType::Uri, true));
                }
            }
        }

        if let Some(matchlen) = scanners::autolink_uri(rest) {
            self.pos += 1 + matchlen;
            return Some(self.make_autolink(
                &rest[..matchlen - 1],
                AutolinkType::Uri,
                action_aware,
            ));
        }

        if let Some(matchlen) = scanners::autolink_email(rest) {
            self.pos += 1 + matchlen;
            return Some(self.make_autolink(
                &rest[..matchlen - 1],
                AutolinkType::Email,
                action_aware,
            ));
        }

        None
    }

    fn make_autolink(
        &self,
        url: &[u8],
        kind: AutolinkType,
        action_aware: bool,
    ) -> &'a AstNode<'a> {
        let inl = self.make_inline(NodeValue::Link(NodeLink {
            url: strings::clean_autolink(url, kind, action_aware),
            title: String::new(),
        }));
        let tnode = self.make_inline(NodeValue::Text(strings::to_string(
            strings::resolve_entities(url, action_aware),
        )));
        inl.append(tnode);
        inl
    }

    pub fn handle_raw_html(&mut self) -> Option<&'a AstNode<'a>> {
        let matchlen = scanners::html_tag(&self.input[self.pos + 1..])?;
        let contents = self.input[self.pos..self.pos + 1 + matchlen].to_vec();
        self.pos += 1 + matchlen;
        Some(self.make_inline(NodeValue::HtmlInline(strings::to_string(contents))))
    }

    pub fn handle_open_bracket(&mut self) -> &'a AstNode<'a> {
        self.pos += 1;
        let inl = self.make_inline(NodeValue::Text("[".to_string()));
        self.push_bracket(false, inl);
        inl
    }

    pub fn handle_bang(&mut self) -> Option<&'a AstNode<'a>> {
        if self.peek_byte_n(1) != Some(b'[') {
            return None;
        }
        self.pos += 2;
        let inl = self.make_inline(NodeValue::Text("![".to_string()));
        self.push_bracket(true, inl);
        Some(inl)
    }

    fn push_bracket(&mut self, image: bool, inl_text: &'a AstNode<'a>) {
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        self.brackets.push(Bracket {
            inl_text,
            position: self.pos,
            image,
            bracket_after: false,
        });
        if !image {
            self.no_link_openers = false;
        }
    }

    /// Handles a `]`: closes an inline or reference link or image if the
    /// text after it allows, or else leaves a literal `]`.
    pub fn handle_close_bracket(&mut self, action_aware: bool) -> Parsed<'a> {
        self.pos += 1;
        let initial_pos = self.pos;

        let (is_image, bracket_position, bracket_after) = match self.brackets.last() {
            Some(b) => (b.image, b.position, b.bracket_after),
            None => return Parsed::Node(self.make_inline(NodeValue::Text("]".to_string()))),
        };

        if !is_image && self.no_link_openers {
            self.brackets.pop();
            return Parsed::Node(self.make_inline(NodeValue::Text("]".to_string())));
        }

        let after_link_text_pos = self.pos;

        // Try to find a link destination within parentheses.
        if self.peek_byte() == Some(b'(') {
            let sps = scanners::spacechars(&self.input[self.pos + 1..]).unwrap_or(0);
            let starturl = self.pos + 1 + sps;
            if let Some((url, n)) = self
                .input
                .get(starturl..)
                .and_then(|rest| {
                    manual_scan_link_url(rest, self.actions_at(starturl, action_aware))
                })
            {
                let endurl = starturl + n;
                let starttitle =
                    endurl + scanners::spacechars(&self.input[endurl..]).unwrap_or(0);
                let endtitle = if starttitle == endurl {
                    starttitle
                } else {
                    starttitle
                        + scan_link_title(
                            &self.input[starttitle..],
                            self.actions_at(starttitle, action_aware),
                        )
                        .unwrap_or(0)
                };
                let endall =
                    endtitle + scanners::spacechars(&self.input[endtitle..]).unwrap_or(0);

                if endall < self.input.len() && self.input[endall] == b')' {
                    self.pos = endall + 1;
                    let url = strings::clean_url(url, action_aware);
                    let title =
                        strings::clean_title(&self.input[starttitle..endtitle], action_aware);
                    self.close_bracket_match(is_image, url, title);
                    return Parsed::Consumed;
                }
            }
            self.pos = after_link_text_pos;
        }

        // Try a reference link.
        let label_actions = self.actions_at(self.pos, action_aware);
        let (mut lab, mut found_label) = match link_label(&self.input[self.pos..], label_actions) {
            Some((lab, consumed)) => {
                self.pos += consumed;
                (strings::to_string(lab.to_vec()), true)
            }
            None => (String::new(), false),
        };

        if !found_label {
            self.pos = initial_pos;
        }

        if (!found_label || lab.is_empty()) && !bracket_after {
            lab = strings::to_string(self.input[bracket_position..initial_pos - 1].to_vec());
            found_label = true;
        }

        let lab = strings::normalize_label(&lab);
        let reff = if found_label {
            self.refmap.lookup(&lab)
        } else {
            None
        };

        if let Some(reff) = reff {
            self.close_bracket_match(is_image, reff.url, reff.title);
            return Parsed::Consumed;
        }

        self.brackets.pop();
        self.pos = initial_pos;
        Parsed::Node(self.make_inline(NodeValue::Text("]".to_string())))
    }

    fn actions_at(&self, pos: usize, action_aware: bool) -> ActionsAt<'_> {
        if action_aware {
            self.actions.at(pos)
        } else {
            ActionsAt::NONE
        }
    }

    fn close_bracket_match(&mut self, is_image: bool, url: String, title: String) {
        let bracket = match self.brackets.last() {
            Some(b) => (b.inl_text, b.position),
            None => return,
        };
        let (inl_text, position) = bracket;

        let nl = NodeLink { url, title };
        let inl = self.make_inline(if is_image {
            NodeValue::Image(nl)
        } else {
            NodeValue::Link(nl)
        });

        inl_text.insert_before(inl);
        let mut tmpch = inl_text.next_sibling();
        while let Some(tmp) = tmpch {
            tmpch = tmp.next_sibling();
            inl.append(tmp);
        }
        inl_text.detach();
        self.process_emphasis(position);
        self.brackets.pop();

        if !is_image {
            self.no_link_openers = true;
        }
    }
}

fn find_autolink_close(input: &[u8], actions: ActionsAt<'_>) -> Option<usize> {
    let mut i = 0;
    while i < input.len() {
        if let Some(end) = actions.end_of(i) {
            i = end;
            continue;
        }
        match input[i] {
            b'>' => return Some(i),
            b'<' => return None,
            c if c <= b' ' => return None,
            _ => i += 1,
        }
    }
    None
}

/// Scans a link label, `[...]`, at the start of `input`.  Returns the
/// trimmed label and the number of bytes consumed, brackets included.
pub fn link_label<'i>(input: &'i [u8], actions: ActionsAt<'_>) -> Option<(&'i [u8], usize)> {
    if input.first() != Some(&b'[') {
        return None;
    }

    let mut i = 1;
    let mut length = 0;
    while i < input.len() {
        if let Some(end) = actions.end_of(i) {
            length += end - i;
            i = end;
        } else {
            match input[i] {
                b'[' => return None,
                b']' => {
                    let raw_label = strings::trim_slice(&input[1..i]);
                    return Some((raw_label, i + 1));
                }
                b'\\' if input.get(i + 1).map_or(false, |&c| ispunct(c)) => {
                    i += 2;
                    length += 2;
                }
                _ => {
                    i += 1;
                    length += 1;
                }
            }
        }
        if length > MAX_LINK_LABEL_LENGTH {
            return None;
        }
    }
    None
}

/// Scans a link destination at the start of `input`, either `<...>` or a
/// bare run with balanced parentheses.  Returns the destination, without
/// any pointy braces, and the number of bytes consumed.
pub fn manual_scan_link_url<'i>(
    input: &'i [u8],
    actions: ActionsAt<'_>,
) -> Option<(&'i [u8], usize)> {
    let len = input.len();
    let mut i = 0;

    if i < len && input[i] == b'<' {
        i += 1;
        while i < len {
            if let Some(end) = actions.end_of(i) {
                i = end;
                continue;
            }
            let b = input[i];
            if b == b'>' {
                i += 1;
                break;
            } else if b == b'\\' {
                i += 2;
            } else if b == b'\n' || b == b'<' {
                return None;
            } else {
                i += 1;
            }
        }
    } else {
        return manual_scan_link_url_2(input, actions);
    }

    if i >= len || input[i - 1] != b'>' {
        None
    } else {
        Some((&input[1..i - 1], i))
    }
}

fn manual_scan_link_url_2<'i>(
    input: &'i [u8],
    actions: ActionsAt<'_>,
) -> Option<(&'i [u8], usize)> {
    let len = input.len();
    let mut i = 0;
    let mut nb_p = 0;

    while i < len {
        if let Some(end) = actions.end_of(i) {
            i = end;
        } else if input[i] == b'\\' && i + 1 < len && ispunct(input[i + 1]) {
            i += 2;
        } else if input[i] == b'(' {
            nb_p += 1;
            i += 1;
            if nb_p > 32 {
                return None;
            }
        } else if input[i] == b')' {
            if nb_p == 0 {
                break;
            }
            nb_p -= 1;
            i += 1;
        } else if isspace(input[i]) || input[i].is_ascii_control() {
            if i == 0 {
                return None;
            }
            break;
        } else {
            i += 1;
        }
    }

    if i >= len || nb_p != 0 {
        None
    } else {
        Some((&input[..i], i))
    }
}

/// Scans a link title at the start of `input`: `"..."`, `'...'` or
/// `(...)`.  Returns the number of bytes consumed, delimiters included.
pub fn scan_link_title(input: &[u8], actions: ActionsAt<'_>) -> Option<usize> {
    let close = match input.first()? {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };

    let mut i = 1;
    while i < input.len() {
        if let Some(end) = actions.end_of(i) {
            i = end;
            continue;
        }
        let b = input[i];
        if b == b'\\' && input.get(i + 1).map_or(false, |&c| ispunct(c)) {
            i += 2;
        } else if b == close {
            return Some(i + 1);
        } else if close == b')' && b == b'(' {
            return None;
        } else {
            i += 1;
        }
    }
    None
}

/// A bare cursor over the content of a paragraph, used to peel link
/// reference definitions off its start.
pub struct Scanner {
    pub pos: usize,
}

impl Scanner {
    pub fn new() -> Self {
        Scanner { pos: 0 }
    }

    pub fn peek_byte(&self, input: &[u8]) -> Option<u8> {
        input.get(self.pos).copied()
    }

    pub fn link_label<'i>(
        &mut self,
        input: &'i [u8],
        actions: ActionsAt<'_>,
    ) -> Option<&'i [u8]> {
        let (lab, consumed) = link_label(&input[self.pos..], actions)?;
        self.pos += consumed;
        Some(lab)
    }

    pub fn skip_spaces(&mut self, input: &[u8]) -> bool {
        let mut skipped = false;
        while self
            .peek_byte(input)
            .map_or(false, |c| c == b' ' || c == b'\t')
        {
            self.pos += 1;
            skipped = true;
        }
        skipped
    }

    pub fn skip_line_end(&mut self, input: &[u8]) -> bool {
        let old_pos = self.pos;
        if self.peek_byte(input) == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek_byte(input) == Some(b'\n') {
            self.pos += 1;
        }
        self.pos > old_pos || self.pos >= input.len()
    }

    pub fn spnl(&mut self, input: &[u8]) {
        self.skip_spaces(input);
        if self.skip_line_end(input) {
            self.skip_spaces(input);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(input: &[u8], aware: bool) -> Option<(&[u8], usize)> {
        let spans = ActionSpans::scan(input);
        manual_scan_link_url(input, if aware { spans.at(0) } else { ActionsAt::NONE })
    }

    fn title(input: &[u8], aware: bool) -> Option<usize> {
        let spans = ActionSpans::scan(input);
        scan_link_title(input, if aware { spans.at(0) } else { ActionsAt::NONE })
    }

    fn label(input: &[u8]) -> Option<(&[u8], usize)> {
        let spans = ActionSpans::scan(input);
        link_label(input, spans.at(0))
    }

    #[test]
    fn destinations_skip_actions() {
        assert_eq!(
            url(b"{{.Func(arg)}})", true),
            Some((&b"{{.Func(arg)}}"[..], 14))
        );
        assert_eq!(
            url(br#"{{ .F "a b" }})"#, true),
            Some((&br#"{{ .F "a b" }}"#[..], 14))
        );
        assert_eq!(
            url(br#"{{ .F "a b" }})"#, false),
            Some((&b"{{"[..], 2))
        );
        assert_eq!(
            url(b"<{{ .F \">\" }}> x", true),
            Some((&b"{{ .F \">\" }}"[..], 14))
        );
        assert_eq!(url(b"<a\nb>", true), None);
    }

    #[test]
    fn offset_views_line_up() {
        let input = b"[a]({{ .U }})";
        let spans = ActionSpans::scan(input);
        assert_eq!(
            manual_scan_link_url(&input[4..], spans.at(4)),
            Some((&b"{{ .U }}"[..], 8))
        );

        let autolink = b"{{ .A }}>";
        let spans = ActionSpans::scan(autolink);
        assert_eq!(find_autolink_close(autolink, spans.at(0)), Some(8));
    }

    #[test]
    fn titles_skip_actions() {
        assert_eq!(title(br#""{{ "x" }}")"#, true), Some(11));
        assert_eq!(title(br#""{{ "x" }}")"#, false), Some(5));
        assert_eq!(title(b"(a (b))", true), None);
        assert_eq!(title(br#"'it\'s'"#, true), Some(7));
    }

    #[test]
    fn labels_skip_actions() {
        assert_eq!(
            label(br#"[{{ index .M "]" }}]:"#),
            Some((&br#"{{ index .M "]" }}"#[..], 20))
        );
        assert_eq!(label(b"[ a ]"), Some((&b"a"[..], 5)));
        assert_eq!(label(b"[a[b]"), None);
    }
}
