// src/extractors/text.rs
//! Rendered-text approximation for parsed pages.
//!
//! Label patterns such as `Székhely: ...` end at a line break, so the text
//! has to keep the line structure a browser would show: block elements and
//! `<br>` start new lines, table cells are tab separated, runs of spaces
//! collapse.

use scraper::{node::Node, ElementRef, Html};

const SKIPPED: &[&str] = &["script", "style", "head", "noscript", "template"];

const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "tbody", "thead", "tfoot", "tr", "ul", "caption",
];

/// Visible text of the whole document.
pub fn document_text(document: &Html) -> String {
    visible_text(document.root_element())
}

/// Visible text of one element, one rendered line per output line.
pub fn visible_text(element: ElementRef) -> String {
    let mut raw = String::new();
    render(element, &mut raw);
    tidy(&raw)
}

/// Visible text of a single cell, flattened onto one line.
pub fn cell_text(element: ElementRef) -> String {
    visible_text(element).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lines of an element where both `<br>` and literal newlines in the markup separate entries.
/// Used for result cells that stack several registered names.
pub fn text_lines(element: ElementRef) -> Vec<String> {
    let mut raw = String::new();
    collect_lines(element, &mut raw);
    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

fn render(element: ElementRef, out: &mut String) {
    let name = element.value().name();
    if SKIPPED.contains(&name) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }

    let is_block = BLOCKS.contains(&name);
    if is_block {
        out.push('\n');
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                // Whitespace inside text nodes renders as single spaces.
                let mut last_space = out.ends_with(' ');
                for c in text.chars() {
                    if c.is_whitespace() && c != '\u{a0}' {
                        if !last_space {
                            out.push(' ');
                            last_space = true;
                        }
                    } else {
                        out.push(if c == '\u{a0}' { ' ' } else { c });
                        last_space = false;
                    }
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    render(child_el, out);
                }
            }
            _ => {}
        }
    }

    if name == "td" || name == "th" {
        out.push('\t');
    }
    if is_block {
        out.push('\n');
    }
}

fn collect_lines(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_lines(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn tidy(raw: &str) -> String {
    raw.split('\n')
        .map(|line| {
            line.split('\t')
                .map(|cell| cell.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
                .join("\t")
                .trim_matches(|c| c == ' ' || c == '\t')
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
