use super::*;

#[test]
fn definition_with_actions() {
    html(
        concat!("[ref]: {{ .URL }} \"{{ .Title }}\"\n", "\n", "[Go][ref]\n"),
        "<p><a href=\"{{ .URL }}\" title=\"{{ .Title }}\">Go</a></p>\n",
    );
}

#[test]
fn pointy_definition_with_spaces_in_action() {
    html(
        concat!("[r]: <{{ .U \"x y\" }}>\n", "\n", "[r]\n"),
        "<p><a href=\"{{ .U \"x y\" }}\">r</a></p>\n",
    );
}

#[test]
fn bare_definition_with_spaces_in_action() {
    html(
        concat!("[r]: {{ .U \"x y\" }}\n", "\n", "[r][]\n"),
        "<p><a href=\"{{ .U \"x y\" }}\">r</a></p>\n",
    );
}

#[test]
fn label_containing_action() {
    html(
        concat!("[{{ .K }}]: /u\n", "\n", "[{{ .K }}]\n"),
        "<p><a href=\"/u\">{{ .K }}</a></p>\n",
    );
}

#[test]
fn title_on_next_line() {
    html(
        concat!("[r]: /u\n", "  '{{ .T }}'\n", "\n", "[r]\n"),
        "<p><a href=\"/u\" title=\"{{ .T }}\">r</a></p>\n",
    );
}

#[test]
fn first_definition_wins() {
    html(
        concat!("[a]: /one\n", "[A]: /two\n", "\n", "[a]\n"),
        "<p><a href=\"/one\">a</a></p>\n",
    );
}

#[test]
fn image_reference() {
    html(
        concat!("![alt][r]\n", "\n", "[r]: {{ .Img }}\n"),
        "<p><img src=\"{{ .Img }}\" alt=\"alt\" /></p>\n",
    );
}

#[test]
fn undefined_reference_is_text() {
    html("[nope]\n", "<p>[nope]</p>\n");
    html("[nope][{{ .X }}]\n", "<p>[nope][{{ .X }}]</p>\n");
}

#[test]
fn definitions_cannot_interrupt_a_paragraph() {
    html(
        concat!("Para\n", "[r]: /u\n", "\n", "[r]\n"),
        "<p>Para\n[r]: /u</p>\n<p>[r]</p>\n",
    );
}
