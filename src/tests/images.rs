use super::*;

#[test]
fn actions_in_alt_and_source() {
    html(
        "![{{ .Alt }} & more]({{ .URL }}&param=test)\n",
        "<p><img src=\"{{ .URL }}&amp;param=test\" alt=\"{{ .Alt }} &amp; more\" /></p>\n",
    );
}

#[test]
fn title_with_action() {
    html(
        "![a]({{ .Src }} \"{{ .T }}\")\n",
        "<p><img src=\"{{ .Src }}\" alt=\"a\" title=\"{{ .T }}\" /></p>\n",
    );
}

#[test]
fn alt_drops_markup_but_keeps_actions() {
    html(
        "![*{{ .A }}* and `c`](/i.png)\n",
        "<p><img src=\"/i.png\" alt=\"{{ .A }} and c\" /></p>\n",
    );
    html(
        "![{{ .A \"q\" }} \"q\"](/i.png)\n",
        "<p><img src=\"/i.png\" alt=\"{{ .A \"q\" }} &quot;q&quot;\" /></p>\n",
    );
}

#[test]
fn image_inside_link() {
    html(
        "[![{{ .Alt }}]({{ .Img }})]({{ .Href }})\n",
        "<p><a href=\"{{ .Href }}\"><img src=\"{{ .Img }}\" alt=\"{{ .Alt }}\" /></a></p>\n",
    );
}

#[test]
fn unsafe_image_sources_are_dropped() {
    html(
        "![x](javascript:{{ .Evil }})\n",
        "<p><img src=\"\" alt=\"x\" /></p>\n",
    );
    html(
        "![x](data:image/png;base64,{{ .Data }})\n",
        "<p><img src=\"data:image/png;base64,{{ .Data }}\" alt=\"x\" /></p>\n",
    );
}
