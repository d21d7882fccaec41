use std::collections::HashSet;

use crate::xml::{PKG_REL_NS, XML_DECLARATION, escape_attr};

pub(crate) const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const FOOTER_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
pub(crate) const IMAGE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub(crate) const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

pub(crate) fn parse_rels_xml(xml_content: &str) -> Vec<Relationship> {
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return Vec::new();
    };
    xml.root_element()
        .children()
        .filter(|n| n.tag_name().name() == "Relationship")
        .filter_map(|n| {
            Some(Relationship {
                id: n.attribute("Id")?.to_string(),
                rel_type: n.attribute("Type")?.to_string(),
                target: n.attribute("Target")?.to_string(),
                external: n.attribute("TargetMode") == Some("External"),
            })
        })
        .collect()
}

/// "word/footer1.xml" → "word/_rels/footer1.xml.rels"; "" (the package) → "_rels/.rels"
pub(crate) fn rels_path_for(part: &str) -> String {
    let (dir, file) = match part.rsplit_once('/') {
        Some((d, f)) => (d, f),
        None => ("", part),
    };
    if dir.is_empty() {
        format!("_rels/{file}.rels")
    } else {
        format!("{dir}/_rels/{file}.rels")
    }
}

/// Inverse of [`rels_path_for`].
pub(crate) fn source_part_for(rels_path: &str) -> Option<String> {
    let without_ext = rels_path.strip_suffix(".rels")?;
    let (dir, file) = without_ext.rsplit_once("_rels/")?;
    Some(format!("{dir}{file}"))
}

/// Resolve a relationship target against the part that owns the relationship.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Target for `part` as written in the relationships of `source_part`.
pub(crate) fn relative_target(source_part: &str, part: &str) -> String {
    match source_part.rsplit_once('/') {
        Some((dir, _)) => match part.strip_prefix(dir).and_then(|p| p.strip_prefix('/')) {
            Some(relative) => relative.to_string(),
            None => format!("/{part}"),
        },
        None => part.to_string(),
    }
}

pub(crate) fn next_relationship_id(existing: &[Relationship]) -> String {
    let ids: HashSet<&str> = existing.iter().map(|r| r.id.as_str()).collect();
    let mut next = existing
        .iter()
        .filter_map(|r| r.id.strip_prefix("rId"))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    loop {
        let candidate = format!("rId{next}");
        if !ids.contains(candidate.as_str()) {
            return candidate;
        }
        next += 1;
    }
}

fn relationship_xml(rel: &Relationship) -> String {
    let mut xml = format!(
        "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"",
        escape_attr(&rel.id),
        escape_attr(&rel.rel_type),
        escape_attr(&rel.target)
    );
    if rel.external {
        xml.push_str(" TargetMode=\"External\"");
    }
    xml.push_str("/>");
    xml
}

/// Append a relationship to an existing rels document, or start a new one.
pub(crate) fn append_relationship(rels_xml: Option<&str>, rel: &Relationship) -> String {
    let snippet = relationship_xml(rel);
    if let Some(existing) = rels_xml {
        if let Some(close) = existing.rfind("</Relationships>") {
            let mut updated = String::with_capacity(existing.len() + snippet.len());
            updated.push_str(&existing[..close]);
            updated.push_str(&snippet);
            updated.push_str(&existing[close..]);
            return updated;
        }
        if let Some(open_end) = existing.rfind("/>")
            && existing[open_end..].trim() == "/>"
            && existing.contains("<Relationships")
        {
            let mut updated = existing[..open_end].to_string();
            updated.push('>');
            updated.push_str(&snippet);
            updated.push_str("</Relationships>");
            return updated;
        }
    }
    format!("{XML_DECLARATION}<Relationships xmlns=\"{PKG_REL_NS}\">{snippet}</Relationships>")
}

/// Drop the relationships with the given ids. Returns the rewritten XML.
pub(crate) fn remove_relationships(rels_xml: &str, ids: &HashSet<String>) -> Option<String> {
    let xml = roxmltree::Document::parse(rels_xml).ok()?;
    let ranges: Vec<_> = xml
        .root_element()
        .children()
        .filter(|n| n.tag_name().name() == "Relationship")
        .filter(|n| n.attribute("Id").is_some_and(|id| ids.contains(id)))
        .map(|n| n.range())
        .collect();
    let mut updated = rels_xml.to_string();
    crate::xml::remove_ranges(&mut updated, ranges);
    Some(updated)
}
