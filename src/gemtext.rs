//! Streaming `text/gemini`→HTML conversion (§4.10), line-oriented so the
//! Gemini/Spartan driver can feed it one network read's worth of lines at a
//! time without buffering a whole page.

use crate::url::{resolve_reference, ParsedUrl};

pub const HTML_HEADER: &str = "<html><head><meta charset=\"utf-8\"></head><body>";
pub const HTML_FOOTER: &str = "</body></html>";

/// Per-response conversion state: just whether a preformatted block is
/// currently open, since that's the only thing that carries across lines.
pub struct GemtextConverter {
    in_pre: bool,
}

impl GemtextConverter {
    pub fn new() -> Self {
        Self { in_pre: false }
    }

    /// Converts one line (no trailing CR/LF) to its HTML fragment. `None`
    /// means the line produces no output (a blank line, or a markup line
    /// with no remaining text after trimming).
    pub fn convert_line(&mut self, line: &str, base: &ParsedUrl) -> Option<String> {
        if line.len() >= 3 && line.starts_with("```") {
            self.in_pre = !self.in_pre;
            return Some(if self.in_pre { "<pre>".to_string() } else { "</pre>".to_string() });
        }
        if self.in_pre {
            return Some(format!("{}\n", escape_html(line)));
        }
        if let Some((level, text)) = heading(line) {
            return if text.is_empty() { None } else { Some(format!("<h{level}>{}</h{level}>", escape_html(text))) };
        }
        if let Some(rest) = line.strip_prefix("=>") {
            return self.convert_link(rest, base);
        }
        if let Some(text) = line.strip_prefix("* ") {
            return if text.is_empty() { None } else { Some(format!("<li>{}</li>", escape_html(text))) };
        }
        if let Some(rest) = line.strip_prefix('>') {
            let text = rest.strip_prefix(' ').unwrap_or(rest);
            return if text.is_empty() { None } else { Some(format!("<blockquote><p>{}</p></blockquote>", escape_html(text))) };
        }
        if line.is_empty() {
            return None;
        }
        Some(format!("<p>{}</p>", escape_html(line)))
    }

    fn convert_link(&self, rest: &str, base: &ParsedUrl) -> Option<String> {
        let rest = rest.trim_start_matches([' ', '\t']);
        let (url_part, desc) = match rest.find([' ', '\t']) {
            Some(idx) => {
                let desc = rest[idx..].trim_start_matches([' ', '\t']);
                (&rest[..idx], if desc.is_empty() { None } else { Some(desc) })
            }
            None => (rest.trim_end_matches([' ', '\t']), None),
        };
        if url_part.is_empty() {
            return None;
        }

        let href = if url_part.contains("://") {
            url_part.to_string()
        } else {
            match resolve_reference(base, url_part) {
                Ok(resolved) => format_link(&resolved),
                Err(_) => url_part.to_string(),
            }
        };
        let label = desc.unwrap_or(url_part);
        Some(format!("<p><a href=\"{}\">{}</a></p>", escape_html(&href), escape_html(label)))
    }

    /// Closes a still-open preformatted block at end of body, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.in_pre {
            self.in_pre = false;
            Some("</pre>".to_string())
        } else {
            None
        }
    }
}

impl Default for GemtextConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// `###`/`##`/`#` heading level and trimmed text, longest prefix first so a
/// `###` line is never read as an `#` heading with `##` left in the text.
fn heading(line: &str) -> Option<(u8, &str)> {
    if let Some(rest) = line.strip_prefix("###") {
        Some((3, rest.trim()))
    } else if let Some(rest) = line.strip_prefix("##") {
        Some((2, rest.trim()))
    } else if let Some(rest) = line.strip_prefix('#') {
        Some((1, rest.trim()))
    } else {
        None
    }
}

/// Formats a resolved link target as `scheme://host[:port]path`, omitting
/// the port when it's the scheme default (§4.10: "default ports omitted").
fn format_link(url: &ParsedUrl) -> String {
    match url.port {
        Some(p) if p != url.default_port() => format!("{}://{}:{p}{}", url.scheme, url.host, url.path_and_query),
        _ => format!("{}://{}{}", url.scheme, url.host, url.path_and_query),
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ParsedUrl {
        ParsedUrl::parse("gemini://example.test/dir/page").unwrap()
    }

    #[test]
    fn headings_trim_and_rank_by_longest_prefix() {
        let mut c = GemtextConverter::new();
        assert_eq!(c.convert_line("# Title ", &base()), Some("<h1>Title</h1>".to_string()));
        assert_eq!(c.convert_line("## Sub", &base()), Some("<h2>Sub</h2>".to_string()));
        assert_eq!(c.convert_line("### Deep", &base()), Some("<h3>Deep</h3>".to_string()));
        assert_eq!(c.convert_line("#", &base()), None);
    }

    #[test]
    fn preformatted_block_toggles_and_passes_through_verbatim() {
        let mut c = GemtextConverter::new();
        assert_eq!(c.convert_line("```", &base()), Some("<pre>".to_string()));
        assert_eq!(c.convert_line("raw <code>", &base()), Some("raw &lt;code&gt;\n".to_string()));
        assert_eq!(c.convert_line("```", &base()), Some("</pre>".to_string()));
    }

    #[test]
    fn unterminated_preformatted_block_closes_on_finish() {
        let mut c = GemtextConverter::new();
        c.convert_line("```", &base());
        assert_eq!(c.finish(), Some("</pre>".to_string()));
    }

    #[test]
    fn link_with_description() {
        let mut c = GemtextConverter::new();
        let html = c.convert_line("=> other.gmi More stuff", &base()).unwrap();
        assert_eq!(html, "<p><a href=\"gemini://example.test/dir/other.gmi\">More stuff</a></p>");
    }

    #[test]
    fn link_without_description_uses_url_as_label() {
        let mut c = GemtextConverter::new();
        let html = c.convert_line("=> /root.gmi", &base()).unwrap();
        assert_eq!(html, "<p><a href=\"gemini://example.test/root.gmi\">/root.gmi</a></p>");
    }

    #[test]
    fn absolute_link_passed_through_unresolved() {
        let mut c = GemtextConverter::new();
        let html = c.convert_line("=> https://other.test/x See X", &base()).unwrap();
        assert_eq!(html, "<p><a href=\"https://other.test/x\">See X</a></p>");
    }

    #[test]
    fn spartan_base_emits_spartan_links() {
        let base = ParsedUrl::parse("spartan://example.test/dir/page").unwrap();
        let mut c = GemtextConverter::new();
        let html = c.convert_line("=> other.gmi", &base).unwrap();
        assert_eq!(html, "<p><a href=\"spartan://example.test/dir/other.gmi\">other.gmi</a></p>");
    }

    #[test]
    fn list_item_and_blockquote() {
        let mut c = GemtextConverter::new();
        assert_eq!(c.convert_line("* one", &base()), Some("<li>one</li>".to_string()));
        assert_eq!(c.convert_line(">quoted", &base()), Some("<blockquote><p>quoted</p></blockquote>".to_string()));
        assert_eq!(c.convert_line("> quoted", &base()), Some("<blockquote><p>quoted</p></blockquote>".to_string()));
    }

    #[test]
    fn plain_paragraph_is_escaped() {
        let mut c = GemtextConverter::new();
        assert_eq!(c.convert_line("a < b & c", &base()), Some("<p>a &lt; b &amp; c</p>".to_string()));
    }

    #[test]
    fn blank_line_emits_nothing() {
        let mut c = GemtextConverter::new();
        assert_eq!(c.convert_line("", &base()), None);
    }
}
