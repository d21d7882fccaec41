//! Locating and clearing the footer of a document's first section.

use std::collections::HashSet;

use crate::error::Error;
use crate::package::{Package, empty_footer_xml};
use crate::rels::{self, FOOTER_REL, IMAGE_REL};
use crate::xml::{self, REL_NS, WML_NS, WPD_NS, is_wml, wml};

const FOOTER_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";

const BLOCK_ELEMENTS: &[&str] = &["p", "tbl", "sdt"];

fn is_block(node: roxmltree::Node) -> bool {
    BLOCK_ELEMENTS.iter().any(|name| is_wml(node, name))
}

/// The footer part being rewritten. Blocks are appended in order; nothing
/// reaches the package until [`FooterRegion::finish`].
pub struct FooterRegion<'p> {
    package: &'p mut Package,
    part_name: String,
    xml: String,
    insert_at: usize,
    namespaces: String,
    next_drawing_id: u32,
}

impl<'p> FooterRegion<'p> {
    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn package(&self) -> &Package {
        &*self.package
    }

    /// Number of block-level elements currently in the footer.
    pub fn block_count(&self) -> Result<usize, Error> {
        let doc = roxmltree::Document::parse(&self.xml)?;
        Ok(doc.root_element().children().filter(|n| is_block(*n)).count())
    }

    /// Namespace declarations a generated block root needs for the `w`, `r`
    /// and `wp` prefixes to resolve inside this footer.
    pub(crate) fn namespaces(&self) -> &str {
        &self.namespaces
    }

    pub(crate) fn append_block(&mut self, fragment: &str) {
        self.xml.insert_str(self.insert_at, fragment);
        self.insert_at += fragment.len();
    }

    pub(crate) fn next_drawing_id(&mut self) -> u32 {
        self.next_drawing_id += 1;
        self.next_drawing_id
    }

    /// Store `data` as a new media part next to the footer and relate it to
    /// the footer. Returns the relationship id.
    pub(crate) fn add_media(
        &mut self,
        stem: &str,
        extension: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String, Error> {
        let dir = self.part_name.rsplit_once('/').map(|(d, _)| d).unwrap_or("word");
        let media_name = self
            .package
            .unused_part_name(&format!("{dir}/media/{stem}"), extension);
        self.package.ensure_default_content_type(extension, content_type)?;
        self.package.set_part(&media_name, data);
        let id = self.package.add_relationship(&self.part_name, IMAGE_REL, &media_name);
        log::debug!("added {media_name} as {id} of {}", self.part_name);
        Ok(id)
    }

    /// Write the rewritten footer back into the package.
    pub fn finish(self) -> Result<(), Error> {
        roxmltree::Document::parse(&self.xml)?;
        self.package.set_part(&self.part_name, self.xml.into_bytes());
        Ok(())
    }
}

/// Clear every block from the first section's default footer, creating the
/// footer if the section has none.
pub fn reset(package: &mut Package) -> Result<FooterRegion<'_>, Error> {
    let part_name = first_section_footer(package)?;
    let original = package.read_text(&part_name)?;

    let (cleared, removed) = {
        let doc = roxmltree::Document::parse(&original)?;
        let root = doc.root_element();
        if !is_wml(root, "ftr") {
            return Err(Error::InvalidDocx(format!("{part_name} is not a footer")));
        }
        let ranges: Vec<_> = root.children().filter(|n| is_block(*n)).map(|n| n.range()).collect();
        let removed = ranges.len();
        let mut cleared = original.clone();
        xml::remove_ranges(&mut cleared, ranges);
        (cleared, removed)
    };
    log::debug!("removed {removed} block(s) from {part_name}");

    let (xml, insert_at, namespaces) = {
        let doc = roxmltree::Document::parse(&cleared)?;
        let root = doc.root_element();
        let namespaces = [("w", WML_NS), ("r", REL_NS), ("wp", WPD_NS)]
            .iter()
            .map(|(prefix, uri)| xml::xmlns_if_unbound(root, prefix, uri))
            .collect::<String>();
        let point = xml::append_point(&cleared, root)?;
        let mut xml = cleared.clone();
        let insert_at = point.apply(&mut xml, "");
        prune_orphan_images(package, &part_name, &doc);
        (xml, insert_at, namespaces)
    };

    let next_drawing_id = package.max_drawing_id();
    Ok(FooterRegion { package, part_name, xml, insert_at, namespaces, next_drawing_id })
}

/// Part name of the default footer of the first section.
pub fn first_section_footer(package: &mut Package) -> Result<String, Error> {
    let main = package.main_document_part();
    let doc_xml = package.read_text(&main)?;
    let doc = roxmltree::Document::parse(&doc_xml)?;
    let body = wml(doc.root_element(), "body")
        .ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;
    let sect = first_section_properties(body)
        .ok_or_else(|| Error::InvalidDocx("document has no section properties".into()))?;

    let reference = sect.children().find(|n| {
        is_wml(*n, "footerReference")
            && n.attribute((WML_NS, "type")).is_none_or(|t| t == "default")
    });
    if let Some(reference) = reference {
        let id = reference
            .attribute((REL_NS, "id"))
            .ok_or_else(|| Error::InvalidDocx("footer reference without r:id".into()))?;
        let part = package
            .related_part(&main, id)
            .ok_or_else(|| Error::InvalidDocx(format!("footer relationship {id} not found")))?;
        if !package.contains(&part) {
            return Err(Error::InvalidDocx(format!("footer part {part} is missing")));
        }
        return Ok(part);
    }

    let part = package.unused_part_name("word/footer", "xml");
    log::info!("first section has no footer, creating {part}");
    package.set_part(&part, empty_footer_xml().into_bytes());
    package.add_override_content_type(&part, FOOTER_CONTENT_TYPE)?;
    let id = package.add_relationship(&main, FOOTER_REL, &part);

    let reference = format!(
        "<w:footerReference{}{} w:type=\"default\" r:id=\"{id}\"/>",
        xml::xmlns_if_unbound(sect, "w", WML_NS),
        xml::xmlns_if_unbound(sect, "r", REL_NS),
    );
    let mut updated = doc_xml.clone();
    xml::prepend_point(&doc_xml, sect)?.apply(&mut updated, &reference);
    package.set_part(&main, updated.into_bytes());
    Ok(part)
}

fn first_section_properties<'a>(body: roxmltree::Node<'a, 'a>) -> Option<roxmltree::Node<'a, 'a>> {
    body.children().find_map(|node| {
        if is_wml(node, "sectPr") {
            Some(node)
        } else if is_wml(node, "p") {
            wml(node, "pPr").and_then(|ppr| wml(ppr, "sectPr"))
        } else {
            None
        }
    })
}

/// Drop image relationships the cleared footer no longer uses, and media
/// parts nothing in the package points at any more.
fn prune_orphan_images(package: &mut Package, part_name: &str, footer: &roxmltree::Document) {
    let in_use: HashSet<&str> = footer
        .descendants()
        .flat_map(|n| n.attributes())
        .filter(|a| a.namespace() == Some(REL_NS))
        .map(|a| a.value())
        .collect();
    let orphans: Vec<_> = package
        .relationships(part_name)
        .into_iter()
        .filter(|r| r.rel_type == IMAGE_REL && !r.external && !in_use.contains(r.id.as_str()))
        .collect();
    if orphans.is_empty() {
        return;
    }

    let rels_path = rels::rels_path_for(part_name);
    let ids: HashSet<String> = orphans.iter().map(|r| r.id.clone()).collect();
    let Some(updated) = package
        .read_text(&rels_path)
        .ok()
        .and_then(|xml| rels::remove_relationships(&xml, &ids))
    else {
        return;
    };
    package.set_part(&rels_path, updated.into_bytes());

    let referenced = package.referenced_parts();
    for rel in orphans {
        let media = rels::resolve_target(part_name, &rel.target);
        if !referenced.contains(&media) && package.remove_part(&media) {
            log::debug!("removed orphaned {media}");
        }
    }
}
