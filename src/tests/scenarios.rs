use super::*;

#[test]
fn simple_action_in_code_span() {
    html("`{{ .Name }}`\n", "<p><code>{{ .Name }}</code></p>\n");
}

#[test]
fn quoted_braces_in_code_span() {
    html(
        "`{{ \"a string with }}\" }}`\n",
        "<p><code>{{ \"a string with }}\" }}</code></p>\n",
    );
}

#[test]
fn nested_actions_in_code_span() {
    html(
        "`{{ if .A }}{{ if .B }}{{ .C }}{{ end }}{{ end }}`\n",
        "<p><code>{{ if .A }}{{ if .B }}{{ .C }}{{ end }}{{ end }}</code></p>\n",
    );
}

#[test]
fn action_in_html_attribute() {
    html_opts!(
        [render.r#unsafe],
        "<div id=\"{{ .ID }}\">Content</div>",
        "<div id=\"{{ .ID }}\">Content</div>\n",
    );
}

#[test]
fn action_as_link_destination() {
    html(
        "[Link]({{ .URL }})\n",
        "<p><a href=\"{{ .URL }}\">Link</a></p>\n",
    );
}

#[test]
fn unterminated_action_in_code_span() {
    html(
        "`{{ .Name` without closing\n",
        "<p><code>{{ .Name</code> without closing</p>\n",
    );
}

#[test]
fn action_in_paragraph() {
    html(
        "Dear {{ .Name }}, your total is {{ printf \"%.2f\" .Total }}.\n",
        "<p>Dear {{ .Name }}, your total is {{ printf \"%.2f\" .Total }}.</p>\n",
    );
}

#[test]
fn actions_are_nodes() {
    let arena = Arena::new();
    let root = parse_document(
        &arena,
        "Hi {{ .Name }}, {{ if .Admin }}welcome back{{ end }}.\n",
        &Options::default(),
    );

    let contents: Vec<String> = actions(root).into_iter().map(|ta| ta.content).collect();
    assert_eq!(contents, ["{{ .Name }}", "{{ if .Admin }}", "{{ end }}"]);
}
