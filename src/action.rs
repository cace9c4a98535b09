//! Template action spans.
//!
//! An action is a region of text delimited by `{{` and `}}`, written in the Go
//! `text/template` style:
//!
//! ```text
//! {{ if .Show }}{{ printf "%s }}" .Name }}{{ end }}
//! ```
//!
//! Actions nest, and string literals inside them (`"..."`, `'...'` and
//! `` `...` ``) may contain delimiter characters without closing the action.
//! Everything in this module works on raw bytes; the only bytes ever
//! interpreted are ASCII, so multi-byte UTF-8 sequences pass through untouched.
//!
//! [`find_action_end`] is the single boundary scanner used by the inline
//! parser, the link and autolink scanners, and the HTML writer.

use jetscii::ByteSubstring;

/// The two-byte sequence that opens an action.
pub const ACTION_OPEN: &[u8] = b"{{";

/// The two-byte sequence that closes an action.
pub const ACTION_CLOSE: &[u8] = b"}}";

/// Which kind of string literal, if any, the scanner is currently inside.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum QuoteMode {
    /// Not inside a literal.
    #[default]
    None,
    /// Inside an interpreted string, `"..."`.
    Double,
    /// Inside a rune literal, `'...'`.
    Single,
    /// Inside a raw string, `` `...` ``.  Backslashes have no effect here.
    Backtick,
}

impl QuoteMode {
    fn terminator(self) -> Option<u8> {
        match self {
            QuoteMode::None => None,
            QuoteMode::Double => Some(b'"'),
            QuoteMode::Single => Some(b'\''),
            QuoteMode::Backtick => Some(b'`'),
        }
    }
}

/// The state of a scan through (possibly) action-bearing bytes.
///
/// Feed it consecutive positions with [`ActionState::process_byte`]. After a
/// `{{` is seen outside any action, [`in_action`](ActionState::in_action) is
/// true until the `}}` that balances it; the state flips back to false on the
/// first byte of that closing pair.
///
/// ```
/// use actionmark::action::ActionState;
///
/// let line = br#"a {{ "}}" }} b"#;
/// let mut state = ActionState::new();
/// let inside = (0..line.len())
///     .map(|i| {
///         state.process_byte(line, i);
///         state.in_action()
///     })
///     .collect::<Vec<_>>();
/// assert!(!inside[0]);
/// assert!(inside[2]);
/// assert!(inside[6]);
/// assert!(!inside[12]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ActionState {
    in_action: bool,
    depth: usize,
    quote: QuoteMode,
    // The previous byte was an unescaped backslash inside a "..." or '...'
    // literal.
    escaped: bool,
    // The previous byte began a `{{` or `}}` pair; this one completes it.
    pair_tail: bool,
}

impl ActionState {
    /// A fresh state, outside any action.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the scan is currently inside an unterminated action.
    pub fn in_action(&self) -> bool {
        self.in_action
    }

    /// How many `{{` are open, counting the outermost one.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The literal the scan is currently inside, if any.
    pub fn quote_mode(&self) -> QuoteMode {
        self.quote
    }

    /// Advances the state over `bytes[i]`.
    ///
    /// Positions must be fed in order without gaps; the state remembers
    /// whether the previous byte began a delimiter pair or escaped this one.
    pub fn process_byte(&mut self, bytes: &[u8], i: usize) {
        let c = match bytes.get(i) {
            Some(&c) => c,
            None => return,
        };
        let next = bytes.get(i + 1).copied();

        if !self.in_action {
            if self.pair_tail {
                self.pair_tail = false;
            } else if c == b'{' && next == Some(b'{') {
                *self = ActionState::opened();
                self.depth = 1;
            }
            return;
        }

        match self.step(c, next) {
            Step::Open => self.depth += 1,
            Step::Close => {
                self.depth -= 1;
                if self.depth == 0 {
                    self.in_action = false;
                }
            }
            Step::Other => (),
        }
    }

    // The state just after the first byte of an opening `{{`.
    fn opened() -> Self {
        ActionState {
            in_action: true,
            depth: 0,
            quote: QuoteMode::None,
            escaped: false,
            pair_tail: true,
        }
    }

    // Moves over one byte inside an action.  Depth is left to the caller.
    fn step(&mut self, c: u8, next: Option<u8>) -> Step {
        if self.pair_tail {
            self.pair_tail = false;
            return Step::Other;
        }

        match self.quote {
            QuoteMode::Backtick => {
                if c == b'`' {
                    self.quote = QuoteMode::None;
                }
            }
            QuoteMode::Double | QuoteMode::Single => {
                if self.escaped {
                    self.escaped = false;
                } else if c == b'\\' {
                    self.escaped = true;
                } else if Some(c) == self.quote.terminator() {
                    self.quote = QuoteMode::None;
                }
            }
            QuoteMode::None => match c {
                b'"' => self.quote = QuoteMode::Double,
                b'\'' => self.quote = QuoteMode::Single,
                b'`' => self.quote = QuoteMode::Backtick,
                b'{' if next == Some(b'{') => {
                    self.pair_tail = true;
                    return Step::Open;
                }
                b'}' if next == Some(b'}') => {
                    self.pair_tail = true;
                    return Step::Close;
                }
                _ => (),
            },
        }
        Step::Other
    }

    // Two scans with equal keys at the same position see the same delimiters
    // from then on.
    fn key(&self) -> (QuoteMode, bool, bool) {
        (self.quote, self.escaped, self.pair_tail)
    }
}

enum Step {
    Open,
    Close,
    Other,
}

/// Returns the offset just past the `}}` that closes the action opened at
/// `start`.
///
/// `bytes[start..start + 2]` must be `{{`; otherwise, and whenever the input
/// ends before the action is balanced (including when it ends inside a
/// quoted literal), `None` is returned and the caller should treat the `{{`
/// as ordinary text.
///
/// This scans from `start` each time it is called.  Callers that look up
/// many openers in one buffer should build an [`ActionSpans`] instead.
///
/// ```
/// use actionmark::action::find_action_end;
///
/// assert_eq!(find_action_end(b"x {{ .A }} y", 2), Some(10));
/// assert_eq!(find_action_end(br#"{{ "}}" }}"#, 0), Some(10));
/// assert_eq!(find_action_end(b"{{ .A", 0), None);
/// ```
pub fn find_action_end(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes.get(start..start.checked_add(2)?) != Some(ACTION_OPEN) {
        return None;
    }

    let mut state = ActionState::new();
    state.process_byte(bytes, start);
    for i in start + 1..bytes.len() {
        state.process_byte(bytes, i);
        if !state.in_action() {
            return Some(i + ACTION_CLOSE.len());
        }
    }
    None
}

/// Whether `bytes` contains `{{` anywhere.  No attempt is made to check that
/// the action is well formed.
pub fn contains_action(bytes: &[u8]) -> bool {
    find_action_start(bytes).is_some()
}

pub(crate) fn find_action_start(bytes: &[u8]) -> Option<usize> {
    ByteSubstring::new(ACTION_OPEN).find(bytes)
}

/// The end of every well-formed action in a buffer, keyed by where it opens.
///
/// For each `{{` in the buffer the table holds exactly what
/// [`find_action_end`] would return for it, but is built in one pass: scans
/// that reach the same quoting state at the same byte are merged, and from
/// then on they close in nesting order, like brackets on a stack.
///
/// ```
/// use actionmark::action::ActionSpans;
///
/// let spans = ActionSpans::scan(b"{{ {{ .A }} b");
/// assert_eq!(spans.end_of(0), None);
/// assert_eq!(spans.end_of(3), Some(11));
/// ```
#[derive(Debug, Default, Clone)]
pub struct ActionSpans {
    // (open, end), sorted by open.
    spans: Vec<(usize, usize)>,
}

// Scans that are in step with each other.  The last level holds the scans
// one `}}` away from closing; each level below needs one more.
struct Group {
    state: ActionState,
    levels: Vec<Vec<usize>>,
}

impl Group {
    fn absorb(&mut self, mut other: Group) {
        if other.levels.len() > self.levels.len() {
            std::mem::swap(&mut self.levels, &mut other.levels);
        }
        let skip = self.levels.len() - other.levels.len();
        for (target, mut level) in self.levels[skip..].iter_mut().zip(other.levels) {
            if target.len() < level.len() {
                std::mem::swap(target, &mut level);
            }
            target.extend(level);
        }
    }
}

impl ActionSpans {
    /// Indexes every action in `bytes`.
    pub fn scan(bytes: &[u8]) -> Self {
        Self::build(bytes, false)
    }

    /// Indexes the actions in `bytes` that open and close on the same line.
    pub fn scan_lines(bytes: &[u8]) -> Self {
        Self::build(bytes, true)
    }

    fn build(bytes: &[u8], by_line: bool) -> Self {
        let first = match find_action_start(bytes) {
            Some(first) => first,
            None => return ActionSpans::default(),
        };

        let mut spans = vec![];
        let mut groups: Vec<Group> = vec![];

        for i in first..bytes.len() {
            let c = bytes[i];
            if by_line && matches!(c, b'\n' | b'\r') {
                groups.clear();
                continue;
            }
            let next = bytes.get(i + 1).copied();

            let mut opened = false;
            for group in groups.iter_mut() {
                match group.state.step(c, next) {
                    Step::Open => {
                        group.levels.push(vec![i]);
                        opened = true;
                    }
                    Step::Close => {
                        if let Some(level) = group.levels.pop() {
                            spans.extend(level.into_iter().map(|open| (open, i + ACTION_CLOSE.len())));
                        }
                    }
                    Step::Other => (),
                }
            }
            groups.retain(|g| !g.levels.is_empty());

            if !opened && c == b'{' && next == Some(b'{') {
                groups.push(Group {
                    state: ActionState::opened(),
                    levels: vec![vec![i]],
                });
            }

            let mut k = 1;
            while k < groups.len() {
                let key = groups[k].state.key();
                match groups[..k].iter().position(|g| g.state.key() == key) {
                    Some(j) => {
                        let other = groups.swap_remove(k);
                        groups[j].absorb(other);
                    }
                    None => k += 1,
                }
            }
        }

        spans.sort_unstable();
        ActionSpans { spans }
    }

    /// Where the action opening at `open` ends, if it is well formed.
    pub fn end_of(&self, open: usize) -> Option<usize> {
        self.spans
            .binary_search_by_key(&open, |&(o, _)| o)
            .ok()
            .map(|k| self.spans[k].1)
    }

    /// A view of the table for a scanner working on `bytes[base..]`.
    pub fn at(&self, base: usize) -> ActionsAt<'_> {
        let from = self.spans.partition_point(|&(o, _)| o < base);
        ActionsAt {
            spans: &self.spans[from..],
            base,
        }
    }
}

/// An [`ActionSpans`] table seen from an offset into its buffer.  Positions
/// passed to and returned from it are relative to that offset.
#[derive(Debug, Clone, Copy)]
pub struct ActionsAt<'s> {
    spans: &'s [(usize, usize)],
    base: usize,
}

impl ActionsAt<'_> {
    /// A view in which nothing is an action.
    pub const NONE: ActionsAt<'static> = ActionsAt {
        spans: &[],
        base: 0,
    };

    /// Where the action opening at relative offset `i` ends.
    pub fn end_of(&self, i: usize) -> Option<usize> {
        let open = self.base.checked_add(i)?;
        self.spans
            .binary_search_by_key(&open, |&(o, _)| o)
            .ok()
            .map(|k| self.spans[k].1 - self.base)
    }
}

/// A run of bytes produced by [`pieces`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    /// Bytes outside any well-formed action.
    Text(&'a [u8]),
    /// A complete action, delimiters included.
    Action(&'a [u8]),
}

/// Splits `bytes` into alternating runs of text and well-formed actions.
///
/// A `{{` that never closes stays part of the surrounding text.
/// Concatenating the pieces always gives back the input.
pub fn pieces(bytes: &[u8]) -> Pieces<'_> {
    Pieces {
        bytes,
        spans: ActionSpans::scan(bytes).spans,
        next: 0,
        pos: 0,
    }
}

/// Iterator returned by [`pieces`].
#[derive(Debug)]
pub struct Pieces<'a> {
    bytes: &'a [u8],
    spans: Vec<(usize, usize)>,
    // The first span not yet passed.
    next: usize,
    pos: usize,
}

impl<'a> Iterator for Pieces<'a> {
    type Item = Piece<'a>;

    fn next(&mut self) -> Option<Piece<'a>> {
        let len = self.bytes.len();
        if self.pos >= len {
            return None;
        }

        while self.spans.get(self.next).map_or(false, |&(o, _)| o < self.pos) {
            self.next += 1;
        }

        let org = self.pos;
        let stop = match self.spans.get(self.next) {
            Some(&(open, end)) if open == org => {
                self.pos = end;
                return Some(Piece::Action(&self.bytes[open..end]));
            }
            Some(&(open, _)) => open,
            None => len,
        };

        let text = &self.bytes[org..stop];
        if let Some(off) = find_action_start(text) {
            tracing::debug!(offset = org + off, "unterminated action kept as text");
        }
        self.pos = stop;
        Some(Piece::Text(text))
    }
}

/// A half-open byte range, `[start, stop)`, into a source buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// The first byte of the range.
    pub start: usize,
    /// One past the last byte of the range.
    pub stop: usize,
}

impl Segment {
    /// Creates a segment covering `start..stop`.
    pub fn new(start: usize, stop: usize) -> Self {
        Segment { start, stop }
    }

    /// The same segment with a different end.
    pub fn with_stop(self, stop: usize) -> Self {
        Segment { stop, ..self }
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.stop.saturating_sub(self.start)
    }

    /// Whether the segment is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bytes of `source` the segment covers, or `None` if it reaches
    /// past the end of `source`.
    pub fn value<'s>(&self, source: &'s [u8]) -> Option<&'s [u8]> {
        source.get(self.start..self.stop)
    }
}
