//! Turns chunk markup into plain text before it reaches any view.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Strip all markup from `input`, keeping only text.
///
/// Script-like subtrees are dropped entirely; block elements become line
/// breaks and runs of whitespace collapse to one space.
pub fn sanitize_markup(input: &str) -> String {
    if !input.contains('<') && !input.contains('&') {
        let mut out = TextBuilder::default();
        out.append_text(input);
        return out.finish();
    }
    let fragment = Html::parse_fragment(input);
    let mut out = TextBuilder::default();
    for child in fragment.root_element().children() {
        visit_node(child, &mut out);
    }
    out.finish()
}

fn visit_node(node: NodeRef<'_, Node>, out: &mut TextBuilder) {
    match node.value() {
        Node::Text(text) => out.append_text(text),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, out);
            }
        }
        _ => {
            for child in node.children() {
                visit_node(child, out);
            }
        }
    }
}

fn visit_element(element: ElementRef<'_>, out: &mut TextBuilder) {
    let tag = element.value().name().to_ascii_lowercase();
    match tag.as_str() {
        "script" | "style" | "noscript" | "iframe" | "template" | "object" | "embed" => {}
        "br" | "hr" => out.ensure_newline(),
        "p" | "div" | "section" | "article" | "header" | "footer" | "li" | "ul" | "ol"
        | "table" | "thead" | "tbody" | "tr" | "blockquote" | "pre" | "figure"
        | "figcaption" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            out.ensure_newline();
            visit_children(element, out);
            out.ensure_newline();
        }
        "td" | "th" => {
            visit_children(element, out);
            out.append_text(" ");
        }
        _ => visit_children(element, out),
    }
}

fn visit_children(element: ElementRef<'_>, out: &mut TextBuilder) {
    for child in element.children() {
        visit_node(child, out);
    }
}

#[derive(Default)]
struct TextBuilder {
    text: String,
    last_char: Option<char>,
}

impl TextBuilder {
    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if self.last_char.is_none()
                    || self.last_char == Some(' ')
                    || self.last_char == Some('\n')
                {
                    continue;
                }
                self.push_char(' ');
            } else {
                self.push_char(ch);
            }
        }
    }

    fn ensure_newline(&mut self) {
        if self.last_char == Some(' ') {
            self.text.pop();
            self.last_char = self.text.chars().last();
        }
        if self.last_char == Some('\n') || self.text.is_empty() {
            return;
        }
        self.push_char('\n');
    }

    fn push_char(&mut self, ch: char) {
        self.text.push(ch);
        self.last_char = Some(ch);
    }

    fn finish(self) -> String {
        self.text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_markup;

    #[test]
    fn plain_text_is_whitespace_normalised() {
        assert_eq!(sanitize_markup("  Total   due:\n 42  "), "Total due: 42");
    }

    #[test]
    fn scripts_and_handlers_never_survive() {
        let input = r#"<p onclick="steal()">Invoice</p><script>alert(1)</script><img src=x onerror="boom()">"#;
        let text = sanitize_markup(input);
        assert_eq!(text, "Invoice");
        assert!(!text.contains('<'));
    }

    #[test]
    fn blocks_become_lines_and_entities_decode() {
        let input = "<h2>Summary</h2><p>Fish &amp; chips</p><ul><li>one</li><li>two</li></ul>";
        assert_eq!(sanitize_markup(input), "Summary\nFish & chips\none\ntwo");
    }

    #[test]
    fn table_cells_are_space_separated() {
        let input = "<table><tr><td>Item</td><td>Qty</td></tr><tr><td>Bolt</td><td>4</td></tr></table>";
        assert_eq!(sanitize_markup(input), "Item Qty\nBolt 4");
    }

    #[test]
    fn unclosed_markup_is_tolerated() {
        assert_eq!(sanitize_markup("<b>bold <i>nested"), "bold nested");
    }
}
