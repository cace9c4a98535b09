//! GFM tables.  A `|` inside a template action is part of the action, never
//! a cell boundary, and `\|` is only unescaped outside actions.

use std::cell::RefCell;

use crate::action::{ActionSpans, ActionsAt};
use crate::nodes::{self, Ast, AstNode, NodeTable, NodeValue, TableAlignment};
use crate::parser::Parser;
use crate::strings;

/// One cell's content with its `\|` escapes removed.  `runs` pairs indexes
/// into `content` with indexes into the row it was split from.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub content: Vec<u8>,
    pub runs: Vec<(usize, usize)>,
}

/// Opens a table on the paragraph `container`, or a row in the table
/// `container`.  Returns the table.
pub(crate) fn try_opening_block<'a>(
    parser: &mut Parser<'a, '_>,
    container: &'a AstNode<'a>,
    line: &[u8],
) -> Option<&'a AstNode<'a>> {
    let num_columns = match container.data.borrow().value {
        NodeValue::Paragraph => None,
        NodeValue::Table(ref nt) => Some(nt.num_columns),
        _ => return None,
    };

    match num_columns {
        None => try_opening_header(parser, container, line),
        Some(n) => try_opening_row(parser, container, n, line),
    }
}

fn try_opening_header<'a>(
    parser: &mut Parser<'a, '_>,
    container: &'a AstNode<'a>,
    line: &[u8],
) -> Option<&'a AstNode<'a>> {
    let alignments = delimiter_row(&line[parser.first_nonspace..])?;
    let aware = parser.options.extension.template_actions;

    // The header is the last line of the paragraph; anything above it stays
    // a paragraph.
    let (header_start, header) = {
        let ast = container.data.borrow();
        let mut end = ast.content.len();
        while end > 0 && strings::is_line_end_char(ast.content[end - 1]) {
            end -= 1;
        }
        let start = ast.content[..end]
            .iter()
            .rposition(|&b| strings::is_line_end_char(b))
            .map_or(0, |p| p + 1);

        let cells = row(&ast.content[start..end], aware)?;
        if cells.len() != alignments.len() {
            return None;
        }
        let cells = cells
            .into_iter()
            .map(|cell| rebase(cell, |i| nodes::source_offset(&ast.content_offsets, start + i)))
            .collect::<Vec<_>>();
        (start, cells)
    };

    tracing::trace!(columns = alignments.len(), line = parser.line_number, "table");

    let start_line = parser.line_number.saturating_sub(1);
    let table = parser.arena.alloc(AstNode::new(RefCell::new(Ast::new(
        NodeValue::Table(NodeTable {
            num_columns: alignments.len(),
            alignments,
        }),
        start_line,
    ))));
    container.insert_after(table);

    {
        let mut ast = container.data.borrow_mut();
        ast.content.truncate(header_start);
        ast.content_offsets.retain(|&(off, _)| off < header_start);
    }
    // Detaches the paragraph if nothing but link reference definitions is
    // left of it.
    parser.finalize(container);

    let header_row = append_row(parser, table, true, start_line);
    for cell in header {
        append_cell(parser, header_row, cell, start_line);
    }

    let offset = line.len() - 1 - parser.offset;
    parser.advance_offset(line, offset, false);

    Some(table)
}

fn try_opening_row<'a>(
    parser: &mut Parser<'a, '_>,
    container: &'a AstNode<'a>,
    num_columns: usize,
    line: &[u8],
) -> Option<&'a AstNode<'a>> {
    if parser.blank {
        return None;
    }

    let base = parser.line_start + parser.first_nonspace;
    let cells = row(
        &line[parser.first_nonspace..],
        parser.options.extension.template_actions,
    )?;

    let line_number = parser.line_number;
    let new_row = append_row(parser, container, false, line_number);
    let mut cells = cells.into_iter();
    for _ in 0..num_columns {
        let cell = match cells.next() {
            Some(cell) => rebase(cell, |i| base + i),
            None => Cell {
                content: vec![],
                runs: vec![],
            },
        };
        append_cell(parser, new_row, cell, line_number);
    }

    let offset = line.len() - 1 - parser.offset;
    parser.advance_offset(line, offset, false);

    Some(container)
}

fn append_row<'a>(
    parser: &Parser<'a, '_>,
    table: &'a AstNode<'a>,
    header: bool,
    line_number: usize,
) -> &'a AstNode<'a> {
    let mut ast = Ast::new(NodeValue::TableRow(header), line_number);
    ast.open = false;
    let node = parser.arena.alloc(AstNode::new(RefCell::new(ast)));
    table.append(node);
    node
}

fn append_cell<'a>(parser: &Parser<'a, '_>, row: &'a AstNode<'a>, cell: Cell, line_number: usize) {
    let mut ast = Ast::new(NodeValue::TableCell, line_number);
    ast.open = false;
    ast.content = cell.content;
    ast.content_offsets = cell.runs;
    row.append(parser.arena.alloc(AstNode::new(RefCell::new(ast))));
}

fn rebase<F>(mut cell: Cell, to_source: F) -> Cell
where
    F: Fn(usize) -> usize,
{
    for run in cell.runs.iter_mut() {
        run.1 = to_source(run.1);
    }
    cell
}

/// Whether `line` can continue a table.
pub(crate) fn matches(line: &[u8], action_aware: bool) -> bool {
    row(line, action_aware).is_some()
}

/// Splits a row into trimmed cells.  `None` if it has none.
pub(crate) fn row(line: &[u8], action_aware: bool) -> Option<Vec<Cell>> {
    let spans = if action_aware {
        ActionSpans::scan_lines(line)
    } else {
        ActionSpans::default()
    };
    let actions = spans.at(0);

    let end = line
        .iter()
        .position(|&b| strings::is_line_end_char(b))
        .unwrap_or(line.len());
    let mut cells = vec![];
    let mut start = usize::from(line.first() == Some(&b'|'));
    let mut i = start;

    while i < end {
        match line[i] {
            b'\\' if i + 1 < end => i += 2,
            b'|' => {
                cells.push(cell(line, start, i, actions));
                start = i + 1;
                i += 1;
            }
            _ => i = actions.end_of(i).unwrap_or(i + 1),
        }
    }

    if !strings::is_blank(&line[start.min(end)..end]) {
        cells.push(cell(line, start, end, actions));
    }

    if cells.is_empty() {
        None
    } else {
        Some(cells)
    }
}

fn cell(line: &[u8], mut start: usize, mut end: usize, actions: ActionsAt<'_>) -> Cell {
    while start < end && strings::is_space_or_tab(line[start]) {
        start += 1;
    }
    while end > start && strings::is_space_or_tab(line[end - 1]) {
        end -= 1;
    }

    let mut content = Vec::with_capacity(end - start);
    let mut runs = vec![(0, start)];
    let mut i = start;
    while i < end {
        if let Some(close) = actions.end_of(i) {
            content.extend_from_slice(&line[i..close]);
            i = close;
        } else if line[i] == b'\\' && i + 1 < end {
            if line[i + 1] == b'|' {
                runs.push((content.len(), i + 1));
                content.push(b'|');
            } else {
                content.extend_from_slice(&line[i..i + 2]);
            }
            i += 2;
        } else {
            content.push(line[i]);
            i += 1;
        }
    }

    if content.is_empty() {
        runs.clear();
    }
    Cell { content, runs }
}

/// The column alignments of a delimiter row such as `| :-- | :-: |`.  The
/// row must hold at least one `|`.
pub(crate) fn delimiter_row(line: &[u8]) -> Option<Vec<TableAlignment>> {
    if !line.contains(&b'|') {
        return None;
    }

    row(line, false)?
        .iter()
        .map(|cell| alignment(&cell.content))
        .collect()
}

fn alignment(cell: &[u8]) -> Option<TableAlignment> {
    let left = cell.first() == Some(&b':');
    let right = cell.len() > 1 && cell.last() == Some(&b':');
    let dashes = &cell[usize::from(left)..cell.len() - usize::from(right)];
    if dashes.is_empty() || dashes.iter().any(|&b| b != b'-') {
        return None;
    }

    Some(match (left, right) {
        (true, true) => TableAlignment::Center,
        (true, false) => TableAlignment::Left,
        (false, true) => TableAlignment::Right,
        (false, false) => TableAlignment::None,
    })
}
