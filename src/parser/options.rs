//! Configuration for the parser and renderer.  Extensions affect both.

#[cfg(feature = "bon")]
use bon::Builder;

#[derive(Default, Debug, Clone)]
/// Umbrella options struct.
pub struct Options {
    /// Enable extensions.
    pub extension: Extension,

    /// Configure parse-time options.
    pub parse: Parse,

    /// Configure render-time options.
    pub render: Render,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "bon", derive(Builder))]
/// Options to select extensions.
pub struct Extension {
    /// Recognises Go-template-style actions, `{{ ... }}`, and keeps them
    /// exactly as written.  On by default.
    ///
    /// Action delimiters never start or end Markdown syntax, and the bytes
    /// inside an action are never escaped.
    ///
    /// ```rust
    /// # use actionmark::{markdown_to_html, Options};
    /// let mut options = Options::default();
    /// assert_eq!(markdown_to_html("*{{ .Text }}*\n", &options),
    ///            "<p><em>{{ .Text }}</em></p>\n");
    /// assert_eq!(markdown_to_html("[a]({{ .Func \"x y\" }})\n", &options),
    ///            "<p><a href=\"{{ .Func \"x y\" }}\">a</a></p>\n");
    ///
    /// options.extension.template_actions = false;
    /// assert_eq!(markdown_to_html("[a]({{ .Func \"x y\" }})\n", &options),
    ///            "<p>[a]({{ .Func &quot;x y&quot; }})</p>\n");
    /// ```
    #[cfg_attr(feature = "bon", builder(default = true))]
    pub template_actions: bool,

    /// Enables the
    /// [strikethrough extension](https://github.github.com/gfm/#strikethrough-extension-)
    /// from the GFM spec.
    ///
    /// ```rust
    /// # use actionmark::{markdown_to_html, Options};
    /// let mut options = Options::default();
    /// options.extension.strikethrough = true;
    /// assert_eq!(markdown_to_html("Hello ~~{{ .Old }}~~ there.\n", &options),
    ///            "<p>Hello <del>{{ .Old }}</del> there.</p>\n");
    /// ```
    #[cfg_attr(feature = "bon", builder(default))]
    pub strikethrough: bool,

    /// Enables the [table extension](https://github.github.com/gfm/#tables-extension-)
    /// from the GFM spec.  A `|` inside a template action does not end a
    /// cell.
    ///
    /// ```rust
    /// # use actionmark::{markdown_to_html, Options};
    /// let mut options = Options::default();
    /// options.extension.table = true;
    /// assert_eq!(markdown_to_html("| a | b |\n|---|---|\n| {{ .C | upper }} | d |\n", &options),
    ///            "<table>\n<thead>\n<tr>\n<th>a</th>\n<th>b</th>\n</tr>\n</thead>\n\
    ///             <tbody>\n<tr>\n<td>{{ .C | upper }}</td>\n<td>d</td>\n</tr>\n</tbody>\n</table>\n");
    /// ```
    #[cfg_attr(feature = "bon", builder(default))]
    pub table: bool,

    /// Enables the [autolink extension](https://github.github.com/gfm/#autolinks-extension-)
    /// from the GFM spec.  Only plain text is linked; a template action is
    /// never part of a link.
    ///
    /// ```rust
    /// # use actionmark::{markdown_to_html, Options};
    /// let mut options = Options::default();
    /// options.extension.autolink = true;
    /// assert_eq!(markdown_to_html("Hello www.github.com.\n", &options),
    ///            "<p>Hello <a href=\"http://www.github.com\">www.github.com</a>.</p>\n");
    /// ```
    #[cfg_attr(feature = "bon", builder(default))]
    pub autolink: bool,

    /// Enables the
    /// [task list items extension](https://github.github.com/gfm/#task-list-items-extension-)
    /// from the GFM spec.
    ///
    /// ```rust
    /// # use actionmark::{markdown_to_html, Options};
    /// let mut options = Options::default();
    /// options.extension.tasklist = true;
    /// assert_eq!(markdown_to_html("* [x] Done\n* [ ] {{ .Todo }}\n", &options),
    ///            "<ul>\n<li><input type=\"checkbox\" disabled=\"\" checked=\"\" /> Done</li>\n\
    ///            <li><input type=\"checkbox\" disabled=\"\" /> {{ .Todo }}</li>\n</ul>\n");
    /// ```
    #[cfg_attr(feature = "bon", builder(default))]
    pub tasklist: bool,
}

impl Default for Extension {
    fn default() -> Self {
        Extension {
            template_actions: true,
            strikethrough: false,
            table: false,
            autolink: false,
            tasklist: false,
        }
    }
}

#[derive(Default, Debug, Clone)]
#[cfg_attr(feature = "bon", derive(Builder))]
/// Options for parser functions.
pub struct Parse {
    /// Parse a trailing `{...}` block on ATX headings as attributes:
    /// `#id`, `.class` and `key="value"` pairs.
    ///
    /// ```rust
    /// # use actionmark::{markdown_to_html, Options};
    /// let mut options = Options::default();
    /// options.parse.heading_attributes = true;
    /// assert_eq!(markdown_to_html("# Hi {#top .big}\n", &options),
    ///            "<h1 id=\"top\" class=\"big\">Hi</h1>\n");
    /// ```
    #[cfg_attr(feature = "bon", builder(default))]
    pub heading_attributes: bool,
}

#[derive(Default, Debug, Clone, Copy)]
#[cfg_attr(feature = "bon", derive(Builder))]
/// Options for formatter functions.
pub struct Render {
    /// [Soft line breaks](http://spec.commonmark.org/0.31.2/#soft-line-breaks) in the input
    /// translate into hard line breaks in the output.
    ///
    /// ```rust
    /// # use actionmark::{markdown_to_html, Options};
    /// let mut options = Options::default();
    /// assert_eq!(markdown_to_html("Hello.\nWorld.\n", &options),
    ///            "<p>Hello.\nWorld.</p>\n");
    ///
    /// options.render.hardbreaks = true;
    /// assert_eq!(markdown_to_html("Hello.\nWorld.\n", &options),
    ///            "<p>Hello.<br />\nWorld.</p>\n");
    /// ```
    #[cfg_attr(feature = "bon", builder(default))]
    pub hardbreaks: bool,

    /// Allow rendering of raw HTML and potentially dangerous links.
    ///
    /// ```rust
    /// # use actionmark::{markdown_to_html, Options};
    /// let mut options = Options::default();
    /// let input = "<script>\nalert('xyz');\n</script>\n\n\
    ///              Possibly <marquee>annoying</marquee>.\n\n\
    ///              [Dangerous](javascript:alert(document.cookie)).\n\n\
    ///              [Safe](http://commonmark.org).\n";
    ///
    /// assert_eq!(markdown_to_html(input, &options),
    ///            "<!-- raw HTML omitted -->\n\
    ///             <p>Possibly <!-- raw HTML omitted -->annoying<!-- raw HTML omitted -->.</p>\n\
    ///             <p><a href=\"\">Dangerous</a>.</p>\n\
    ///             <p><a href=\"http://commonmark.org\">Safe</a>.</p>\n");
    ///
    /// options.render.r#unsafe = true;
    /// assert_eq!(markdown_to_html(input, &options),
    ///            "<script>\nalert(\'xyz\');\n</script>\n\
    ///             <p>Possibly <marquee>annoying</marquee>.</p>\n\
    ///             <p><a href=\"javascript:alert(document.cookie)\">Dangerous</a>.</p>\n\
    ///             <p><a href=\"http://commonmark.org\">Safe</a>.</p>\n");
    /// ```
    #[cfg_attr(feature = "bon", builder(default))]
    pub r#unsafe: bool,
}
