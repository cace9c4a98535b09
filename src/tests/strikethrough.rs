use super::*;

#[test]
fn strikethrough() {
    html_opts!(
        [extension.strikethrough],
        concat!(
            "This is ~strikethrough~.\n",
            "\n",
            "As is ~~this, okay~~?\n"
        ),
        concat!(
            "<p>This is <del>strikethrough</del>.</p>\n",
            "<p>As is <del>this, okay</del>?</p>\n"
        ),
    );
}

#[test]
fn strikethrough_action() {
    html_opts!(
        [extension.strikethrough],
        "~~{{ .DeletedText }}~~",
        "<p><del>{{ .DeletedText }}</del></p>\n",
    );
}

#[test]
fn strikethrough_mixed_content() {
    html_opts!(
        [extension.strikethrough],
        "~~Delete {{ .Item }} now~~",
        "<p><del>Delete {{ .Item }} now</del></p>\n",
    );
}

#[test]
fn strikethrough_beside_code() {
    html_opts!(
        [extension.strikethrough],
        "~~old~~ `{{ .New }}`",
        "<p><del>old</del> <code>{{ .New }}</code></p>\n",
    );
}

#[test]
fn strikethrough_around_emphasis() {
    html_opts!(
        [extension.strikethrough],
        "~~*{{ .A }}*~~\n",
        "<p><del><em>{{ .A }}</em></del></p>\n",
    );
}

#[test]
fn runs_must_match() {
    html_opts!([extension.strikethrough], "x ~a~~\n", "<p>x ~a~~</p>\n");
    html_opts!([extension.strikethrough], "x ~~~a~~~\n", "<p>x ~~~a~~~</p>\n");
}

#[test]
fn tildes_inside_actions() {
    html_opts!(
        [extension.strikethrough],
        "~~a {{ \"~~\" }}~~ b\n",
        "<p><del>a {{ \"~~\" }}</del> b</p>\n",
    );
}

#[test]
fn strikethrough_is_opt_in() {
    html("~~a~~\n", "<p>~~a~~</p>\n");
}
