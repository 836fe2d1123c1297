//! Deterministic markup serialization

use crate::xml::model::{Content, Document, Element};

const INDENT: &str = "  ";
const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Serialize a document with a declaration and two-space indentation
pub fn write_document(doc: &Document) -> String {
    let mut output = String::from(DECLARATION);
    output.push('\n');
    write_element(&doc.root, 0, &mut output);
    output
}

fn write_element(element: &Element, depth: usize, output: &mut String) {
    push_indent(depth, output);
    output.push('<');
    output.push_str(&element.name);

    for (key, value) in &element.attributes {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        output.push_str(&escape(value));
        output.push('"');
    }

    if element.children.is_empty() {
        output.push_str(" />\n");
        return;
    }

    output.push('>');
    if let [Content::Text(text)] = element.children.as_slice() {
        output.push_str(&escape(text));
    } else {
        output.push('\n');
        for child in &element.children {
            match child {
                Content::Element(child) => write_element(child, depth + 1, output),
                // mixed content is re-indented
                Content::Text(text) => {
                    push_indent(depth + 1, output);
                    output.push_str(&escape(text.trim()));
                    output.push('\n');
                }
                Content::Comment(comment) => {
                    push_indent(depth + 1, output);
                    output.push_str("<!--");
                    output.push_str(comment);
                    output.push_str("-->\n");
                }
            }
        }
        push_indent(depth, output);
    }
    output.push_str("</");
    output.push_str(&element.name);
    output.push_str(">\n");
}

fn push_indent(depth: usize, output: &mut String) {
    for _ in 0..depth {
        output.push_str(INDENT);
    }
}

fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
