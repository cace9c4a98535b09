//! The HTML renderer.

mod context;
pub mod writer;

use std::io::{self, Write};

use crate::action::ActionSpans;
use crate::ctype::isspace;
use crate::nodes::{AstNode, ListType, NodeTaskItem, NodeValue};
use crate::parser::Options;
use crate::scanners;

pub use context::Context;
use writer::AttributeKind;

/// Formats an AST as HTML, modified by the given options.
pub fn format_document<'a>(
    root: &'a AstNode<'a>,
    options: &Options,
    output: &mut dyn Write,
) -> io::Result<()> {
    let mut context = Context::new(output, options);

    enum Phase {
        Pre,
        Post,
    }
    let mut stack = vec![(root, Phase::Pre)];

    while let Some((node, phase)) = stack.pop() {
        match phase {
            Phase::Pre => {
                stack.push((node, Phase::Post));
                if format_node(&mut context, node, true)? {
                    for ch in node.children().collect::<Vec<_>>().into_iter().rev() {
                        stack.push((ch, Phase::Pre));
                    }
                }
            }
            Phase::Post => {
                format_node(&mut context, node, false)?;
            }
        }
    }

    context.flush()
}

// Returns whether the children of `node` should be rendered.
fn format_node<'a>(
    context: &mut Context<'_>,
    node: &'a AstNode<'a>,
    entering: bool,
) -> io::Result<bool> {
    match node.data.borrow().value {
        NodeValue::Document => (),
        NodeValue::BlockQuote => {
            if entering {
                context.cr()?;
                context.write_all(b"<blockquote>\n")?;
            } else {
                context.cr()?;
                context.write_all(b"</blockquote>\n")?;
            }
        }
        NodeValue::List(ref nl) => {
            if entering {
                context.cr()?;
                match nl.list_type {
                    ListType::Bullet => context.write_all(b"<ul>\n")?,
                    ListType::Ordered if nl.start == 1 => context.write_all(b"<ol>\n")?,
                    ListType::Ordered => writeln!(context, "<ol start=\"{}\">", nl.start)?,
                }
            } else {
                match nl.list_type {
                    ListType::Bullet => context.write_all(b"</ul>\n")?,
                    ListType::Ordered => context.write_all(b"</ol>\n")?,
                }
            }
        }
        NodeValue::Item(..) | NodeValue::TaskItem(..) => {
            if entering {
                context.cr()?;
                context.write_all(b"<li>")?;
            } else {
                context.write_all(b"</li>\n")?;
            }
        }
        NodeValue::Heading(ref nh) => {
            if entering {
                context.cr()?;
                write!(context, "<h{}", nh.level)?;
                let mut w = context.writer();
                for (name, value) in &nh.attributes {
                    w.write_attribute(name, value.as_bytes(), AttributeKind::Text)?;
                }
                context.write_all(b">")?;
            } else {
                writeln!(context, "</h{}>", nh.level)?;
            }
        }
        NodeValue::CodeBlock(ref ncb) => {
            if entering {
                context.cr()?;
                context.write_all(b"<pre><code")?;
                let lang = info_word(
                    ncb.info.as_bytes(),
                    context.options.extension.template_actions,
                );
                if !lang.is_empty() {
                    context.write_all(b" class=\"language-")?;
                    context.writer().write(lang)?;
                    context.write_all(b"\"")?;
                }
                context.write_all(b">")?;
                context.writer().raw_write(ncb.literal.as_bytes())?;
                context.write_all(b"</code></pre>\n")?;
            }
        }
        NodeValue::HtmlBlock(ref nhb) => {
            if entering {
                context.cr()?;
                if context.options.render.r#unsafe {
                    context.write_all(nhb.literal.as_bytes())?;
                } else {
                    context.write_all(b"<!-- raw HTML omitted -->")?;
                }
                context.cr()?;
            }
        }
        NodeValue::ThematicBreak => {
            if entering {
                context.cr()?;
                context.write_all(b"<hr />\n")?;
            }
        }
        NodeValue::Paragraph => {
            let tight = match node
                .parent()
                .and_then(|n| n.parent())
                .map(|n| n.data.borrow().value.clone())
            {
                Some(NodeValue::List(nl)) => nl.tight,
                _ => false,
            };

            if !tight {
                if entering {
                    context.cr()?;
                    context.write_all(b"<p>")?;
                } else {
                    context.write_all(b"</p>\n")?;
                }
            }

            if entering && node.previous_sibling().is_none() {
                if let Some(task) = node.parent().and_then(task_item) {
                    context.write_all(b"<input type=\"checkbox\" disabled=\"\"")?;
                    if task.symbol.is_some() {
                        context.write_all(b" checked=\"\"")?;
                    }
                    context.write_all(b" /> ")?;
                }
            }
        }
        NodeValue::Table(..) => {
            if entering {
                context.cr()?;
                context.write_all(b"<table>\n")?;
            } else {
                let has_body = node
                    .first_child()
                    .map_or(false, |header| header.next_sibling().is_some());
                if has_body {
                    context.cr()?;
                    context.write_all(b"</tbody>\n")?;
                }
                context.cr()?;
                context.write_all(b"</table>\n")?;
            }
        }
        NodeValue::TableRow(header) => {
            if entering {
                context.cr()?;
                if header {
                    context.write_all(b"<thead>\n")?;
                } else if node
                    .previous_sibling()
                    .map_or(false, |prev| node_matches!(prev, NodeValue::TableRow(true)))
                {
                    context.write_all(b"<tbody>\n")?;
                }
                context.write_all(b"<tr>\n")?;
                context.table_cell_index = 0;
            } else {
                context.cr()?;
                context.write_all(b"</tr>\n")?;
                if header {
                    context.write_all(b"</thead>\n")?;
                }
            }
        }
        NodeValue::TableCell => {
            let (header, align) = table_cell_info(node, context.table_cell_index);
            let tag = if header { "th" } else { "td" };
            if entering {
                context.cr()?;
                write!(context, "<{}", tag)?;
                if let Some(align) = align {
                    write!(context, " align=\"{}\"", align)?;
                }
                context.write_all(b">")?;
            } else {
                writeln!(context, "</{}>", tag)?;
                context.table_cell_index += 1;
            }
        }
        NodeValue::Text(ref literal) => {
            if entering {
                context.writer().secure_write(literal.as_bytes())?;
            }
        }
        NodeValue::LineBreak => {
            if entering {
                context.write_all(b"<br />\n")?;
            }
        }
        NodeValue::SoftBreak => {
            if entering {
                if context.options.render.hardbreaks {
                    context.write_all(b"<br />\n")?;
                } else {
                    context.write_all(b"\n")?;
                }
            }
        }
        NodeValue::Code(ref nc) => {
            if entering {
                context.write_all(b"<code>")?;
                context.writer().raw_write(nc.literal.as_bytes())?;
                context.write_all(b"</code>")?;
            }
        }
        NodeValue::HtmlInline(ref literal) => {
            if entering {
                if context.options.render.r#unsafe {
                    context.write_all(literal.as_bytes())?;
                } else {
                    context.write_all(b"<!-- raw HTML omitted -->")?;
                }
            }
        }
        NodeValue::Strong => {
            if entering {
                context.write_all(b"<strong>")?;
            } else {
                context.write_all(b"</strong>")?;
            }
        }
        NodeValue::Emph => {
            if entering {
                context.write_all(b"<em>")?;
            } else {
                context.write_all(b"</em>")?;
            }
        }
        NodeValue::Strikethrough => {
            if entering {
                context.write_all(b"<del>")?;
            } else {
                context.write_all(b"</del>")?;
            }
        }
        NodeValue::Link(ref nl) => {
            if entering {
                context.write_all(b"<a")?;
                let url = safe_url(context, nl.url.as_bytes());
                let mut w = context.writer();
                w.write_attribute("href", url, AttributeKind::Url)?;
                if !nl.title.is_empty() {
                    w.write_attribute("title", nl.title.as_bytes(), AttributeKind::Text)?;
                }
                context.write_all(b">")?;
            } else {
                context.write_all(b"</a>")?;
            }
        }
        NodeValue::Image(ref nl) => {
            if entering {
                context.write_all(b"<img")?;
                let url = safe_url(context, nl.url.as_bytes());
                let mut alt = vec![];
                collect_plain(node, &mut alt);
                let mut w = context.writer();
                w.write_attribute("src", url, AttributeKind::Url)?;
                w.write_attribute("alt", &alt, AttributeKind::Text)?;
                if !nl.title.is_empty() {
                    w.write_attribute("title", nl.title.as_bytes(), AttributeKind::Text)?;
                }
                context.write_all(b" />")?;
            }
            return Ok(false);
        }
        NodeValue::TemplateAction(ref ta) => {
            if entering {
                context.write_all(ta.content.as_bytes())?;
            }
        }
    }
    Ok(true)
}

fn task_item<'a>(node: &'a AstNode<'a>) -> Option<NodeTaskItem> {
    match node.data.borrow().value {
        NodeValue::TaskItem(task) => Some(task),
        _ => None,
    }
}

// Whether a cell is in the header row, and the alignment of its column.
fn table_cell_info<'a>(node: &'a AstNode<'a>, column: usize) -> (bool, Option<&'static str>) {
    let row = match node.parent() {
        Some(row) => row,
        None => return (false, None),
    };
    let header = node_matches!(row, NodeValue::TableRow(true));

    let align = row.parent().and_then(|table| match table.data.borrow().value {
        NodeValue::Table(ref nt) => nt.alignments.get(column).and_then(|a| a.xml_name()),
        _ => None,
    });

    (header, align)
}

fn safe_url<'u>(context: &Context<'_>, url: &'u [u8]) -> &'u [u8] {
    if context.options.render.r#unsafe || !scanners::dangerous_url(url) {
        url
    } else {
        b""
    }
}

// The text of an image description, with markup dropped.  Actions are kept
// as written.
fn collect_plain<'a>(node: &'a AstNode<'a>, out: &mut Vec<u8>) {
    for n in node.descendants().skip(1) {
        match n.data.borrow().value {
            NodeValue::Text(ref literal) | NodeValue::HtmlInline(ref literal) => {
                out.extend_from_slice(literal.as_bytes())
            }
            NodeValue::Code(ref nc) => out.extend_from_slice(nc.literal.as_bytes()),
            NodeValue::TemplateAction(ref ta) => out.extend_from_slice(ta.content.as_bytes()),
            NodeValue::LineBreak | NodeValue::SoftBreak => out.push(b' '),
            _ => (),
        }
    }
}

// The first word of a fence's info string.  Spaces inside an action do not
// end the word.
fn info_word(info: &[u8], action_aware: bool) -> &[u8] {
    let spans = if action_aware {
        ActionSpans::scan(info)
    } else {
        ActionSpans::default()
    };
    let mut i = 0;
    while i < info.len() && !isspace(info[i]) {
        i = spans.end_of(i).unwrap_or(i + 1);
    }
    &info[..i]
}

const fn byte_set(members: &[u8]) -> [bool; 256] {
    let mut set = [false; 256];
    let mut i = 0;
    while i < members.len() {
        set[members[i] as usize] = true;
        i += 1;
    }
    set
}

/// Writes buffer to output, escaping anything that could be interpreted as an
/// HTML tag.
///
/// Namely:
///
/// * U+0022 QUOTATION MARK " is rendered as &quot;
/// * U+0026 AMPERSAND & is rendered as &amp;
/// * U+003C LESS-THAN SIGN < is rendered as &lt;
/// * U+003E GREATER-THAN SIGN > is rendered as &gt;
/// * Everything else is passed through unchanged.
///
/// Note that this is appropriate and sufficient for free text, but not for
/// URLs in attributes.  See escape_href.
pub fn escape(output: &mut dyn Write, buffer: &[u8]) -> io::Result<()> {
    let mut offset = 0;
    for (i, &byte) in buffer.iter().enumerate() {
        let esc: &[u8] = match byte {
            b'"' => b"&quot;",
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            _ => continue,
        };
        output.write_all(&buffer[offset..i])?;
        output.write_all(esc)?;
        offset = i + 1;
    }
    output.write_all(&buffer[offset..])
}

/// Writes buffer to output, escaping in a manner appropriate for URLs in HTML
/// attributes.
///
/// Namely:
///
/// * U+0026 AMPERSAND & is rendered as &amp;
/// * U+0027 APOSTROPHE ' is rendered as &#x27;
/// * Alphanumeric and a range of non-URL safe characters.
///
/// The inclusion of characters like "%" in those which are not escaped is
/// explained somewhat here:
///
/// <https://github.com/github/cmark-gfm/blob/c32ef78bae851cb83b7ad52d0fbff880acdcd44a/src/houdini_href_e.c#L7-L31>
///
/// In other words, if a CommonMark user enters:
///
/// ```markdown
/// [hi](https://ddg.gg/?q=a%20b)
/// ```
///
/// We assume they actually want the query string "?q=a%20b", a search for
/// the string "a b", rather than "?q=a%2520b", a search for the literal
/// string "a%20b".
pub fn escape_href(output: &mut dyn Write, buffer: &[u8]) -> io::Result<()> {
    const HREF_SAFE: [bool; 256] = byte_set(
        b"-_.+!*(),%#@?=;:/,+$~abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
    );

    let size = buffer.len();
    let mut i = 0;

    while i < size {
        let org = i;
        while i < size && HREF_SAFE[buffer[i] as usize] {
            i += 1;
        }

        if i > org {
            output.write_all(&buffer[org..i])?;
        }

        if i >= size {
            break;
        }

        match buffer[i] {
            b'&' => output.write_all(b"&amp;")?,
            b'\'' => output.write_all(b"&#x27;")?,
            b => write!(output, "%{:02X}", b)?,
        }

        i += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(f: fn(&mut dyn Write, &[u8]) -> io::Result<()>, input: &[u8]) -> String {
        let mut out: Vec<u8> = vec![];
        f(&mut out, input).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn escapes() {
        assert_eq!(escaped(escape, br#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
        assert_eq!(escaped(escape_href, b"/a b/'&\xc3\xa9"), "/a%20b/&#x27;&amp;%C3%A9");
    }

    #[test]
    fn info_words() {
        assert_eq!(info_word(b"rust yum", true), b"rust");
        assert_eq!(info_word(b"{{ .Lang }} x", true), b"{{ .Lang }}");
        assert_eq!(info_word(b"{{ .Lang }} x", false), b"{{");
        assert_eq!(info_word(b"{{ .Lang x", true), b"{{");
    }
}
