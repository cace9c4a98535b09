use super::*;

#[test]
fn raw_html_is_omitted_by_default() {
    html(
        "<div id=\"{{ .ID }}\">\n",
        "<!-- raw HTML omitted -->\n",
    );
    html(
        "a <span title=\"{{ .T }}\">b</span>\n",
        "<p>a <!-- raw HTML omitted -->b<!-- raw HTML omitted --></p>\n",
    );
}

#[test]
fn html_block_with_actions() {
    html_opts!(
        [render.r#unsafe],
        concat!(
            "<table>\n",
            "<tr><td>{{ .Cell \"<\" }}</td></tr>\n",
            "</table>\n"
        ),
        concat!(
            "<table>\n",
            "<tr><td>{{ .Cell \"<\" }}</td></tr>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn comment_with_action() {
    html_opts!(
        [render.r#unsafe],
        "<!-- {{ .Note }} -->\n",
        "<!-- {{ .Note }} -->\n",
    );
}

#[test]
fn inline_html_with_actions() {
    html_opts!(
        [render.r#unsafe],
        "Hi <b class=\"{{ .C }}\">{{ .Name }}</b>!\n",
        "<p>Hi <b class=\"{{ .C }}\">{{ .Name }}</b>!</p>\n",
    );
}

#[test]
fn action_at_line_start_is_not_html() {
    html(
        "{{ \"<div>\" }}\n",
        "<p>{{ \"<div>\" }}</p>\n",
    );
}
