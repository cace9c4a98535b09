//! A [CommonMark](https://commonmark.org/) parser and HTML renderer that
//! leaves Go-style template actions alone.
//!
//! Documents that are later fed to a template engine are full of `{{ ... }}`
//! actions.  actionmark treats each action as an opaque span: its delimiters
//! never start or end Markdown syntax, and its bytes reach the output without
//! any HTML or URL escaping.  Everything else renders exactly as CommonMark
//! says it should.
//!
//! ```
//! use actionmark::{markdown_to_html, Options};
//!
//! assert_eq!(
//!     markdown_to_html("Hello, **{{ .Name }}**!", &Options::default()),
//!     "<p>Hello, <strong>{{ .Name }}</strong>!</p>\n"
//! );
//! assert_eq!(
//!     markdown_to_html(r#"[go]({{ .URL "a b" }})"#, &Options::default()),
//!     "<p><a href=\"{{ .URL \"a b\" }}\">go</a></p>\n"
//! );
//! ```
//!
//! The parsed tree can be walked between parsing and rendering:
//!
//! ```
//! use actionmark::nodes::NodeValue;
//! use actionmark::{format_html, parse_document, Arena, Options};
//!
//! let arena = Arena::new();
//! let md = "Dear {{ .Name }},\n";
//! let root = parse_document(&arena, md, &Options::default());
//!
//! let actions: Vec<String> = root
//!     .descendants()
//!     .filter_map(|n| match n.data.borrow().value {
//!         NodeValue::TemplateAction(ref ta) => Some(ta.content.clone()),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(actions, ["{{ .Name }}"]);
//!
//! let mut html: Vec<u8> = vec![];
//! format_html(root, &Options::default(), &mut html).unwrap();
//! assert_eq!(String::from_utf8(html).unwrap(), "<p>Dear {{ .Name }},</p>\n");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]
#![allow(
    unknown_lints,
    clippy::doc_lazy_continuation,
    clippy::new_without_default
)]

macro_rules! node_matches {
    ($node:expr, $( $pat:pat )|+) => {{
        matches!($node.data.borrow().value, $( $pat )|+)
    }};
}

pub mod action;
pub mod arena_tree;
mod ctype;
mod entity;
pub mod html;
pub mod nodes;
mod parser;
mod scanners;
mod strings;
#[cfg(test)]
mod tests;

pub use html::format_document as format_html;
pub use parser::options::{Extension, Parse, Render};
pub use parser::{parse_document, Options};
pub use typed_arena::Arena;

/// Render Markdown to HTML.
///
/// See the documentation of the crate root for an example.
pub fn markdown_to_html(md: &str, options: &Options) -> String {
    let arena = Arena::new();
    let root = parse_document(&arena, md, options);
    let mut bw: Vec<u8> = Vec::new();
    // Writing into a Vec cannot fail.
    if format_html(root, options, &mut bw).is_err() {
        tracing::debug!("render into memory failed");
    }
    strings::to_string(bw)
}
