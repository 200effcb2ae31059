//! Minimal HTML reader/writer for [`FakeDocument`].
//!
//! Handles elements, quoted or bare attributes, text and the five basic
//! entities. Anything fancier (comments, scripts, doctype) is out of scope.
//! `data-test-rect="top left width height"` sets an explicit rect instead
//! of an attribute.

use motionflow_core::{Document, ElementId, Rect};

use crate::fake::{is_void, FakeDocument, Kind};

pub const TEST_RECT_ATTR: &str = "data-test-rect";

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&f) {
            self.bump();
        }
        &self.src[start..self.pos]
    }
}

/// Parses `html` and appends the nodes to `parent`. Returns the new
/// top-level elements.
pub(crate) fn parse_into(doc: &mut FakeDocument, parent: ElementId, html: &str) -> Vec<ElementId> {
    let mut reader = Reader { src: html, pos: 0 };
    let mut top = Vec::new();
    parse_nodes(doc, parent, &mut reader, Some(&mut top));
    top
}

fn parse_nodes(
    doc: &mut FakeDocument,
    parent: ElementId,
    r: &mut Reader<'_>,
    mut top: Option<&mut Vec<ElementId>>,
) {
    while !r.eof() {
        if r.rest().starts_with("</") {
            // Closing tag: consume it and hand control back to the opener.
            r.take_while(|c| c != '>');
            r.bump();
            return;
        }
        if r.rest().starts_with('<') {
            r.bump();
            let el = parse_element(doc, r);
            doc.append_child(parent, el);
            if let Some(top) = top.as_deref_mut() {
                top.push(el);
            }
            continue;
        }
        let text = r.take_while(|c| c != '<');
        doc.push_text(parent, &unescape(text));
    }
}

fn parse_element(doc: &mut FakeDocument, r: &mut Reader<'_>) -> ElementId {
    let tag = r
        .take_while(|c| c.is_ascii_alphanumeric() || c == '-')
        .to_ascii_lowercase();
    let el = doc.create_element(&tag);
    let mut self_closing = false;
    loop {
        r.skip_ws();
        match r.peek() {
            None => break,
            Some('>') => {
                r.bump();
                break;
            }
            Some('/') => {
                self_closing = true;
                r.bump();
                continue;
            }
            _ => {}
        }
        let name = r
            .take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
            .to_ascii_lowercase();
        if name.is_empty() {
            r.bump();
            continue;
        }
        let mut value = String::new();
        if r.peek() == Some('=') {
            r.bump();
            value = match r.peek() {
                Some(q @ ('"' | '\'')) => {
                    r.bump();
                    let v = r.take_while(|c| c != q);
                    r.bump();
                    unescape(v)
                }
                _ => unescape(r.take_while(|c| !c.is_whitespace() && c != '>')),
            };
        }
        apply_attr(doc, el, &name, &value);
    }
    if !self_closing && !is_void(&tag) {
        parse_nodes(doc, el, r, None);
    }
    el
}

fn apply_attr(doc: &mut FakeDocument, el: ElementId, name: &str, value: &str) {
    match name {
        "class" => {
            for class in value.split_whitespace() {
                doc.add_class(el, class);
            }
        }
        "style" => {
            for decl in value.split(';') {
                if let Some((k, v)) = decl.split_once(':') {
                    doc.set_style(el, k.trim(), v.trim());
                }
            }
        }
        TEST_RECT_ATTR => {
            let n: Vec<f64> = value
                .split_whitespace()
                .filter_map(|v| v.parse().ok())
                .collect();
            if let [top, left, width, height] = n[..] {
                doc.set_rect(el, Rect::new(top, left, width, height));
            }
        }
        _ => doc.set_attr(el, name, value),
    }
}

/// Serializes the children of `el` back to markup.
pub(crate) fn serialize_children(doc: &FakeDocument, el: ElementId) -> String {
    let mut out = String::new();
    if let Some(node) = doc.node(el) {
        for child in &node.children {
            write_node(doc, *child, &mut out);
        }
    }
    out
}

fn write_node(doc: &FakeDocument, id: ElementId, out: &mut String) {
    let Some(node) = doc.node(id) else {
        return;
    };
    let tag = match &node.kind {
        Kind::Text(t) => {
            out.push_str(&escape(t));
            return;
        }
        Kind::Element(tag) => tag,
    };
    out.push('<');
    out.push_str(tag);
    if !node.classes.is_empty() {
        out.push_str(&format!(" class=\"{}\"", escape(&node.classes.join(" "))));
    }
    for (k, v) in &node.attrs {
        out.push_str(&format!(" {k}=\"{}\"", escape(v)));
    }
    if !node.styles.is_empty() {
        let decls: Vec<String> = node.styles.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        out.push_str(&format!(" style=\"{}\"", escape(&decls.join("; "))));
    }
    if let Some(r) = node.rect {
        out.push_str(&format!(
            " {TEST_RECT_ATTR}=\"{} {} {} {}\"",
            r.top, r.left, r.width, r.height
        ));
    }
    out.push('>');
    if is_void(tag) {
        return;
    }
    for child in &node.children {
        write_node(doc, *child, out);
    }
    out.push_str(&format!("</{tag}>"));
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_markup_and_attributes() {
        let doc = FakeDocument::from_html(
            r#"<div class="a b" data-mf-count-to="1,234"><span>x &amp; y</span><img src=a.png></div>"#,
        );
        let div = doc.children(doc.body())[0];
        assert_eq!(doc.classes(div), vec!["a", "b"]);
        assert_eq!(doc.attr(div, "data-mf-count-to").as_deref(), Some("1,234"));
        assert_eq!(doc.children(div).len(), 2);
        assert_eq!(doc.text(div), "x & y");
    }

    #[test]
    fn bare_attribute_is_empty_string() {
        let doc = FakeDocument::from_html("<div data-mf-ticker></div>");
        let div = doc.children(doc.body())[0];
        assert_eq!(doc.attr(div, "data-mf-ticker").as_deref(), Some(""));
    }

    #[test]
    fn inner_html_round_trips_through_set_inner_html() {
        let mut doc = FakeDocument::from_html(
            r#"<p id="t"><span>One</span><span data-test-rect="0 0 10 5">Two</span></p>"#,
        );
        let p = doc.children(doc.body())[0];
        let html = doc.inner_html(p);
        doc.set_text(p, "gone");
        doc.set_inner_html(p, &html);
        assert_eq!(doc.inner_html(p), html);
        assert_eq!(doc.text(p), "OneTwo");
        assert_eq!(doc.rect(doc.children(p)[1]).width, 10.0);
    }
}
