//! Small helpers for reading WordprocessingML with roxmltree and splicing
//! edits back into the original XML text.

use std::ops::Range;

use crate::error::Error;

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(crate) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub(crate) const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const CONTENT_TYPES_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/content-types";

pub(crate) const XML_DECLARATION: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

pub(crate) fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

pub(crate) fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

pub(crate) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, attr: &str) -> Option<&'a str> {
    node.attribute((WML_NS, attr))
}

/// Whether XML 1.0 can carry `c` at all. Anything else is dropped from text.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

pub(crate) fn escape_text(value: &str) -> String {
    value
        .chars()
        .filter(|c| is_xml_char(*c))
        .collect::<String>()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;").replace('\'', "&apos;")
}

/// ` xmlns:prefix="uri"` when `prefix` is not already bound to `uri` at `node`.
pub(crate) fn xmlns_if_unbound(node: roxmltree::Node, prefix: &str, uri: &str) -> String {
    if node.lookup_namespace_uri(Some(prefix)) == Some(uri) {
        String::new()
    } else {
        format!(" xmlns:{prefix}=\"{uri}\"")
    }
}

/// Where new children go at the end of an element.
pub(crate) struct ChildInsertion {
    /// Byte offset at which to insert the children.
    pub offset: usize,
    /// Text that replaces the element's self-closing `/>` before inserting, if any.
    pub expand: Option<(Range<usize>, String)>,
}

impl ChildInsertion {
    pub(crate) fn apply(self, xml: &mut String, fragment: &str) -> usize {
        let mut offset = self.offset;
        if let Some((range, replacement)) = self.expand {
            offset = range.start + 1;
            xml.replace_range(range, &replacement);
        }
        xml.insert_str(offset, fragment);
        offset + fragment.len()
    }
}

fn qualified_name(element_text: &str) -> &str {
    let rest = &element_text[1..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Locate the point just before the closing tag of `node`, or describe how to
/// open it up if it is written as `<x/>`.
pub(crate) fn append_point(xml: &str, node: roxmltree::Node) -> Result<ChildInsertion, Error> {
    let range = node.range();
    let text = &xml[range.clone()];
    if text.ends_with("/>") && !text[..text.len() - 2].contains('>') {
        let name = qualified_name(text);
        let slash = range.end - 2;
        return Ok(ChildInsertion {
            offset: slash + 1,
            expand: Some((slash..range.end, format!("></{name}>"))),
        });
    }
    let close = text
        .rfind("</")
        .ok_or_else(|| Error::InvalidDocx(format!("unterminated <{}>", node.tag_name().name())))?;
    Ok(ChildInsertion { offset: range.start + close, expand: None })
}

/// Locate the point just after the opening tag of `node`.
pub(crate) fn prepend_point(xml: &str, node: roxmltree::Node) -> Result<ChildInsertion, Error> {
    let range = node.range();
    let text = &xml[range.clone()];
    let open_end = text
        .find('>')
        .ok_or_else(|| Error::InvalidDocx(format!("malformed <{}>", node.tag_name().name())))?;
    if text[..open_end].ends_with('/') {
        return append_point(xml, node);
    }
    Ok(ChildInsertion { offset: range.start + open_end + 1, expand: None })
}

/// Remove byte ranges from `xml`. Ranges must not overlap.
pub(crate) fn remove_ranges(xml: &mut String, mut ranges: Vec<Range<usize>>) {
    ranges.sort_by_key(|r| r.start);
    for range in ranges.into_iter().rev() {
        xml.replace_range(range, "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_text("A & B <C>"), "A &amp; B &lt;C&gt;");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn drops_characters_xml_cannot_hold() {
        assert_eq!(escape_text("A.\u{0B}Ram\u{0}irez\u{FFFF}"), "A.Ramirez");
        assert_eq!(escape_text("tab\there\nñ"), "tab\there\nñ");
        assert_eq!(escape_attr("x\u{1F}y"), "xy");
    }

    #[test]
    fn append_point_before_closing_tag() {
        let xml = r#"<w:ftr xmlns:w="x"><w:p/></w:ftr>"#.to_string();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let point = append_point(&xml, doc.root_element()).unwrap();
        let mut out = xml.clone();
        point.apply(&mut out, "<w:tbl/>");
        assert_eq!(out, r#"<w:ftr xmlns:w="x"><w:p/><w:tbl/></w:ftr>"#);
    }

    #[test]
    fn append_point_opens_self_closing_element() {
        let xml = r#"<w:ftr xmlns:w="x"/>"#.to_string();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let point = append_point(&xml, doc.root_element()).unwrap();
        let mut out = xml.clone();
        let end = point.apply(&mut out, "<w:p/>");
        assert_eq!(out, r#"<w:ftr xmlns:w="x"><w:p/></w:ftr>"#);
        assert_eq!(&out[end..], "</w:ftr>");
    }

    #[test]
    fn prepend_point_after_opening_tag() {
        let xml = r#"<w:sectPr xmlns:w="x"><w:pgSz/></w:sectPr>"#.to_string();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let point = prepend_point(&xml, doc.root_element()).unwrap();
        let mut out = xml.clone();
        point.apply(&mut out, "<w:footerReference/>");
        assert_eq!(out, r#"<w:sectPr xmlns:w="x"><w:footerReference/><w:pgSz/></w:sectPr>"#);
    }

    #[test]
    fn removes_ranges_back_to_front() {
        let mut xml = "0123456789".to_string();
        remove_ranges(&mut xml, vec![6..8, 1..3]);
        assert_eq!(xml, "034589");
    }
}
