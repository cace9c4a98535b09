use std::io::{self, Write};

use crate::action::{contains_action, find_action_end};
use crate::html::writer::{ActionWriter, AttributeKind};

use super::*;

#[test]
fn two_step_rendering() {
    let arena = Arena::new();
    let options = Options::default();
    let root = parse_document(&arena, "Hi **{{ .Name }}**\n", &options);

    let mut out: Vec<u8> = vec![];
    format_html(root, &options, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<p>Hi <strong>{{ .Name }}</strong></p>\n"
    );
}

#[test]
fn segments_point_into_the_source() {
    let input = "a\n  {{ .B }}\n\n> x {{ .C }}\n";
    let arena = Arena::new();
    let root = parse_document(&arena, input, &Options::default());

    for ta in actions(root) {
        assert_eq!(ta.segment.value(input.as_bytes()), Some(ta.content.as_bytes()));
    }
    let found = actions(root);
    assert_eq!(found.len(), 2);
    assert_eq!((found[0].segment.start, found[0].segment.stop), (4, 12));
}

#[test]
fn no_action_nodes_in_plain_mode() {
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.template_actions = false;
    let root = parse_document(&arena, "Hi {{ .Name }}\n", &options);
    assert!(actions(root).is_empty());
    assert_node_eq(root, &[0, 0], &NodeValue::Text("Hi {{ .Name }}".to_string()));
}

#[test]
fn scanner_entry_points() {
    assert_eq!(find_action_end(b"{{ .A }} tail", 0), Some(8));
    assert_eq!(find_action_end(b"x{{ .A }}", 0), None);
    assert!(contains_action(b"x {{ y"));
    assert!(!contains_action(b"x { { y"));
}

#[test]
fn writer_without_preservation_is_the_host_escaper() {
    let input = br#"<a href="{{ .X }}">"#;

    let mut ours: Vec<u8> = vec![];
    ActionWriter::new(&mut ours)
        .preserve_actions(false)
        .raw_write(input)
        .unwrap();

    let mut host: Vec<u8> = vec![];
    crate::html::escape(&mut host, input).unwrap();

    assert_eq!(ours, host);
}

#[test]
fn writer_attribute_kinds() {
    let mut out: Vec<u8> = vec![];
    {
        let mut w = ActionWriter::new(&mut out);
        w.write_attribute("src", b"a b{{ .C \"d e\" }}", AttributeKind::Url)
            .unwrap();
        w.write_attribute("alt", b"a b{{ .C \"d e\" }}", AttributeKind::Text)
            .unwrap();
    }
    assert_eq!(
        String::from_utf8(out).unwrap(),
        " src=\"a%20b{{ .C \"d e\" }}\" alt=\"a b{{ .C \"d e\" }}\""
    );
}

struct Broken;

impl Write for Broken {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn sink_errors_propagate() {
    let arena = Arena::new();
    let options = Options::default();
    let root = parse_document(&arena, "{{ .A }}\n", &options);

    let err = format_html(root, &options, &mut Broken).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Other);
}

#[test]
fn options_are_plain_data() {
    let mut options = Options::default();
    assert!(options.extension.template_actions);
    assert!(!options.parse.heading_attributes);
    assert!(!options.render.hardbreaks);
    assert!(!options.render.r#unsafe);

    options.render.r#unsafe = true;
    let copy = options.clone();
    assert!(copy.render.r#unsafe);
    assert!(format!("{:?}", copy).contains("template_actions: true"));
}

#[cfg(feature = "bon")]
#[test]
fn builders() {
    let mut render = Render::builder().hardbreaks(false).build();
    render.r#unsafe = true;
    let options = Options {
        extension: Extension::builder().build(),
        parse: Parse::builder().heading_attributes(true).build(),
        render,
    };
    assert!(options.extension.template_actions);

    assert_eq!(
        markdown_to_html("# <i>{{ .T }}</i> {.x}\n", &options),
        "<h1 class=\"x\"><i>{{ .T }}</i></h1>\n"
    );
}
