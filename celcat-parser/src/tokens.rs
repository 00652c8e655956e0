use std::iter::FusedIterator;

use ego_tree::iter::{Edge, Traverse};
use scraper::{node::Element, ElementRef, Node};

const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "em", "font", "i", "small", "span", "strong", "sub", "sup", "u",
];

/// Ordered text lines of one event block.
///
/// Text runs are joined until a `<br>` or the edge of a block element ends
/// the line, so inline markup such as `<b>` never splits one. The `fc-time`
/// and `fc-title` wrappers count as block elements even when they are spans.
/// Whitespace inside a line is collapsed, empty lines are skipped and lines
/// that are only a time or a time range are dropped, since times are read
/// from the dedicated time element instead.
///
/// The iterator borrows the block and can be cloned to restart from the
/// current position.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    inner: Traverse<'a, Node>,
    line: String,
}

pub fn tokens(block: ElementRef<'_>) -> Tokens<'_> {
    Tokens {
        inner: block.traverse(),
        line: String::new(),
    }
}

/// Whether `token` is nothing but `H:MM`, optionally with `AM`/`PM`, or a
/// range of two such times.
pub fn is_time_token(token: &str) -> bool {
    regex!(r"^\d{1,2}:\d{2}(\s*[AaPp][Mm]?)?(\s*[-–]\s*\d{1,2}:\d{2}(\s*[AaPp][Mm]?)?)?$")
        .is_match(token.trim())
}

fn ends_line(element: &Element) -> bool {
    !INLINE_TAGS.contains(&element.name())
        || element
            .classes()
            .any(|class| class == "fc-time" || class == "fc-title")
}

impl Tokens<'_> {
    fn take_line(&mut self) -> Option<String> {
        let line = self.line.split_whitespace().collect::<Vec<_>>().join(" ");
        self.line.clear();

        (!line.is_empty() && !is_time_token(&line)).then_some(line)
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(edge) = self.inner.next() {
            let boundary = match edge {
                Edge::Open(node) => match node.value() {
                    Node::Text(text) => {
                        self.line.push_str(text);
                        false
                    }
                    Node::Element(element) => ends_line(element),
                    _ => false,
                },
                Edge::Close(node) => {
                    matches!(node.value(), Node::Element(element) if ends_line(element))
                }
            };

            if boundary {
                if let Some(line) = self.take_line() {
                    return Some(line);
                }
            }
        }

        self.take_line()
    }
}

impl FusedIterator for Tokens<'_> {}
