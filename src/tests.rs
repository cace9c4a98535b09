use crate::nodes::{AstNode, NodeValue};
use crate::*;

mod api;
mod html;
mod images;
mod pathological;
mod properties;
mod references;
mod scenarios;
mod strikethrough;
mod table;

#[track_caller]
fn compare_strs(output: &str, expected: &str, kind: &str, original_input: &str) {
    if output != expected {
        println!("Running {} test", kind);
        println!("Original input:");
        println!("==============================");
        println!("{}", original_input);
        println!("==============================");
    }

    pretty_assertions::assert_eq!(output, expected);
}

#[track_caller]
fn html(input: &str, expected: &str) {
    html_opts_i(input, expected, |_| ());
}

#[track_caller]
fn html_opts_i<F>(input: &str, expected: &str, opts: F)
where
    F: FnOnce(&mut Options),
{
    let mut options = Options::default();
    opts(&mut options);

    html_opts_w(input, expected, &options);
}

#[track_caller]
fn html_opts_w(input: &str, expected: &str, options: &Options) {
    let arena = Arena::new();

    let root = parse_document(&arena, input, options);
    let mut output: Vec<u8> = vec![];
    crate::html::format_document(root, options, &mut output).unwrap();
    compare_strs(&String::from_utf8(output).unwrap(), expected, "regular", input);

    // The convenience entry point must agree with the two-step one.
    compare_strs(
        &markdown_to_html(input, options),
        expected,
        "markdown_to_html",
        input,
    );
}

/// Renders with the named boolean options switched on.
macro_rules! html_opts {
    ([$($optclass:ident.$optname:ident),*], $lhs:expr, $rhs:expr $(,)?) => {
        crate::tests::html_opts_i($lhs, $rhs, |opts| {
            $(opts.$optclass.$optname = true;)*
        });
    };
}

pub(crate) use html_opts;

/// Renders as plain CommonMark, with template actions turned off.
#[track_caller]
fn html_plain(input: &str, expected: &str) {
    html_opts_i(input, expected, |opts| {
        opts.extension.template_actions = false;
    });
}

#[track_caller]
fn assert_node_eq<'a>(node: &'a AstNode<'a>, location: &[usize], expected: &NodeValue) {
    let node = location
        .iter()
        .fold(node, |node, &n| node.children().nth(n).unwrap());

    let data = node.data.borrow();
    let actual = format!("{:?}", data.value);
    let expected = format!("{:?}", expected);

    compare_strs(&actual, &expected, "ast comparison", "");
}

/// Every template action in the document, in order.
fn actions<'a>(root: &'a AstNode<'a>) -> Vec<crate::nodes::NodeTemplateAction> {
    root.descendants()
        .filter_map(|n| match n.data.borrow().value {
            NodeValue::TemplateAction(ref ta) => Some(ta.clone()),
            _ => None,
        })
        .collect()
}
