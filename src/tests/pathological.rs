use super::*;
use ntest::timeout;

// Every `{{` opens a deeper action that never closes.
#[test]
#[timeout(4000)]
fn pathological_unterminated_opens() {
    let n = 50_000;
    let input = "{{ ".repeat(n);
    let exp = format!("<p>{}</p>\n", input.trim_end());

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_unterminated_quotes() {
    let n = 50_000;
    let input = "{{ \"".repeat(n);
    let exp = format!("<p>{}</p>\n", "{{ &quot;".repeat(n));

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_unterminated_opens_in_code() {
    let n = 50_000;
    let input = format!("```\n{}\n```\n", "{{ ".repeat(n));
    let exp = format!("<pre><code>{}\n</code></pre>\n", "{{ ".repeat(n));

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_unterminated_destinations() {
    let n = 50_000;
    let input = "[a]({{ ".repeat(n);
    let exp = format!("<p>{}</p>\n", input.trim_end());

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_unterminated_autolinks() {
    let n = 50_000;
    let input = "<{{ ".repeat(n);
    let exp = format!("<p>{}</p>\n", "&lt;{{ ".repeat(n).trim_end());

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_unterminated_opens_across_lines() {
    let n = 50_000;
    let input = "{{ a\n".repeat(n);
    let exp = format!("<p>{}</p>\n", input.trim_end());

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_deep_nesting() {
    let n = 50_000;
    let input = format!("{}{}", "{{ if ".repeat(n), "}}".repeat(n));
    let exp = format!("<p>{}</p>\n", input);

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_many_actions() {
    let n = 50_000;
    let input = "{{ .A }} ".repeat(n);
    let exp = format!("<p>{}</p>\n", input.trim_end());

    html(&input, &exp);
}

// input: python3 -c 'n = 50000; print("*a_ " * n)'
#[test]
#[timeout(4000)]
fn pathological_emphases() {
    let n = 50_000;
    let input = "*a_ ".repeat(n);
    let mut exp = format!("<p>{}", input);
    // Right-most space is trimmed in output.
    exp.pop();
    exp += "</p>\n";

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_link_openers() {
    let n = 50_000;
    let input = "[a".repeat(n);
    let exp = format!("<p>{}</p>\n", input);

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_link_closers() {
    let n = 50_000;
    let input = "a]".repeat(n);
    let exp = format!("<p>{}</p>\n", input);

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_nested_brackets() {
    let n = 50_000;
    let input = format!("{}a{}", "[".repeat(n), "]".repeat(n));
    let exp = format!("<p>{}</p>\n", input);

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_unclosed_destinations() {
    let n = 50_000;
    let input = "[a](<b".repeat(n);
    let exp = format!("<p>{}</p>\n", "[a](&lt;b".repeat(n));

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_table_columns() {
    let n = 50_000;
    let input = format!("{}\n{}\n", "| {{ ".repeat(n), "|---".repeat(n));
    let exp = format!(
        "<table>\n<thead>\n<tr>\n{}</tr>\n</thead>\n</table>\n",
        "<th>{{</th>\n".repeat(n)
    );

    html_opts!([extension.table], &input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_email_ats() {
    let n = 50_000;
    let input = "a@".repeat(n);
    let exp = format!("<p>{}</p>\n", input);

    html_opts!([extension.autolink], &input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_bare_links() {
    let n = 50_000;
    let input = "www.a.com ".repeat(n);
    let exp = format!(
        "<p>{}</p>\n",
        vec!["<a href=\"http://www.a.com\">www.a.com</a>"; n].join(" ")
    );

    html_opts!([extension.autolink], &input, &exp);
}
