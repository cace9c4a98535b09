use super::*;

#[test]
fn table() {
    html_opts!(
        [extension.table],
        concat!("| a | b |\n", "|---|:-:|\n", "| c | d |\n"),
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "<th align=\"center\">b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>c</td>\n",
            "<td align=\"center\">d</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn table_regression() {
    html_opts!(
        [extension.table],
        concat!("123\n", "456\n", "| a | b |\n", "| ---| --- |\n", "d | e\n"),
        concat!(
            "<p>123\n",
            "456</p>\n",
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "<th>b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>d</td>\n",
            "<td>e</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn table_misparse_1() {
    html_opts!([extension.table], "a\n-b", "<p>a\n-b</p>\n");
}

#[test]
fn table_misparse_2() {
    html_opts!([extension.table], "a\n-b\n-c", "<p>a\n-b\n-c</p>\n");
}

#[test]
fn table_needs_the_extension() {
    html(
        concat!("| a |\n", "|---|\n"),
        concat!("<p>| a |\n", "|---|</p>\n"),
    );
}

#[test]
fn header_and_delimiter_must_agree() {
    html_opts!(
        [extension.table],
        concat!("| a | b |\n", "|---|\n"),
        concat!("<p>| a | b |\n", "|---|</p>\n"),
    );
}

#[test]
fn nested_tables_1() {
    html_opts!(
        [extension.table],
        concat!("- p\n", "\n", "    |a|b|\n", "    |-|-|\n", "    |c|d|\n",),
        concat!(
            "<ul>\n",
            "<li>\n",
            "<p>p</p>\n",
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "<th>b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>c</td>\n",
            "<td>d</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n",
            "</li>\n",
            "</ul>\n",
        ),
    );
}

#[test]
fn nested_tables_2() {
    html_opts!(
        [extension.table],
        concat!("- |a|b|\n", "  |-|-|\n", "  |c|d|\n",),
        concat!(
            "<ul>\n",
            "<li>\n",
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "<th>b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>c</td>\n",
            "<td>d</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n",
            "</li>\n",
            "</ul>\n",
        ),
    );
}

#[test]
fn nested_tables_3() {
    html_opts!(
        [extension.table],
        concat!("> |a|b|\n", "> |-|-|\n", "> |c|d|\n",),
        concat!(
            "<blockquote>\n",
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "<th>b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>c</td>\n",
            "<td>d</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n",
            "</blockquote>\n",
        ),
    );
}

#[test]
fn actions_in_cells() {
    html_opts!(
        [extension.table],
        concat!(
            "| Name | Value |\n",
            "|------|-------|\n",
            "| User | {{ .UserName }} |\n",
            "| Age  | {{ .UserAge }} |"
        ),
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>Name</th>\n",
            "<th>Value</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>User</td>\n",
            "<td>{{ .UserName }}</td>\n",
            "</tr>\n",
            "<tr>\n",
            "<td>Age</td>\n",
            "<td>{{ .UserAge }}</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn actions_in_headers() {
    html_opts!(
        [extension.table],
        concat!(
            "| {{ .ColumnA }} | {{ .ColumnB }} |\n",
            "|----------------|----------------|\n",
            "| Value 1        | Value 2        |"
        ),
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>{{ .ColumnA }}</th>\n",
            "<th>{{ .ColumnB }}</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>Value 1</td>\n",
            "<td>Value 2</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn action_in_code_span_cell() {
    html_opts!(
        [extension.table],
        "| Col |\n|-----|\n| `{{ .Value }}` |",
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>Col</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td><code>{{ .Value }}</code></td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn pipeline_is_not_a_cell_boundary() {
    html_opts!(
        [extension.table],
        concat!("| Name | Shout |\n", "|---|---|\n", "| x | {{ .Name | upper }} |\n"),
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>Name</th>\n",
            "<th>Shout</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>x</td>\n",
            "<td>{{ .Name | upper }}</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn escaped_pipe_in_cell() {
    html_opts!(
        [extension.table],
        concat!("| a \\| b | 1 < 2 |\n", "|---|---|\n"),
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a | b</th>\n",
            "<th>1 &lt; 2</th>\n",
            "</tr>\n",
            "</thead>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn rows_fit_the_header() {
    html_opts!(
        [extension.table],
        concat!("| a | b |\n", "|---|--:|\n", "| c |\n", "| d | e | f |\n"),
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "<th align=\"right\">b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>c</td>\n",
            "<td align=\"right\"></td>\n",
            "</tr>\n",
            "<tr>\n",
            "<td>d</td>\n",
            "<td align=\"right\">e</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn blank_line_ends_the_table() {
    html_opts!(
        [extension.table],
        concat!("| a |\n", "|---|\n", "| b |\n", "\n", "after\n"),
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>b</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n",
            "<p>after</p>\n"
        ),
    );
}

#[test]
fn cell_segments_point_into_the_source() {
    let input = concat!("| {{ .A }} | a \\| {{ .X }} |\n", "|---|---|\n", "| c | {{ .D }} |\n");
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.table = true;
    let root = parse_document(&arena, input, &options);

    let found = actions(root);
    assert_eq!(found.len(), 3);
    for ta in &found {
        assert_eq!(ta.segment.value(input.as_bytes()), Some(ta.content.as_bytes()));
    }
    assert_eq!(found[0].segment.start, 2);
    assert_eq!(found[1].segment.start, 18);
}
