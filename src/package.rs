//! The DOCX container: an ordered set of named parts loaded fully into memory.
//!
//! Parts are kept in archive order so a saved package lists its entries the
//! way the source did, with new parts appended at the end.

use std::collections::HashSet;
use std::io::{Read, Seek, Write};
use std::path::Path;

use crate::error::Error;
use crate::rels::{self, OFFICE_DOCUMENT_REL, Relationship, STYLES_REL};
use crate::xml::{CONTENT_TYPES_NS, XML_DECLARATION, WML_NS, escape_attr, wml, wml_attr};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const DEFAULT_MAIN_PART: &str = "word/document.xml";

struct Part {
    name: String,
    data: Vec<u8>,
}

pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.push(Part { name, data });
        }
        if !parts.iter().any(|p| p.name == CONTENT_TYPES_PART) {
            return Err(Error::InvalidDocx(format!("missing {CONTENT_TYPES_PART}")));
        }
        log::debug!("loaded package with {} parts", parts.len());
        Ok(Package { parts })
    }

    /// Write to a temporary file beside `path`, then rename it into place, so
    /// a failed save never leaves a truncated file at `path`.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        self.write_to(staged.as_file_mut())?;
        staged.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Media is stored, everything else deflated, the way Word writes packages.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W, Error> {
        let mut zip = zip::ZipWriter::new(writer);
        let deflated = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for part in &self.parts {
            let options = if part.name.contains("/media/") { stored } else { deflated };
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }
        Ok(zip.finish()?)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.iter().find(|p| p.name == name).map(|p| p.data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    pub(crate) fn read_text(&self, name: &str) -> Result<String, Error> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::InvalidDocx(format!("missing part {name}")))?;
        String::from_utf8(data.to_vec())
            .map_err(|_| Error::InvalidDocx(format!("{name} is not UTF-8")))
    }

    pub(crate) fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part { name: name.to_string(), data }),
        }
    }

    pub(crate) fn remove_part(&mut self, name: &str) -> bool {
        let before = self.parts.len();
        self.parts.retain(|p| p.name != name);
        self.parts.len() != before
    }

    /// First `{stem}{n}.{ext}` not yet present, counting from 1.
    pub(crate) fn unused_part_name(&self, stem: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{stem}{n}.{ext}"))
            .find(|name| !self.contains(name))
            .unwrap_or_else(|| format!("{stem}.{ext}"))
    }

    pub(crate) fn relationships(&self, source_part: &str) -> Vec<Relationship> {
        let rels_path = rels::rels_path_for(source_part);
        match self.read_text(&rels_path) {
            Ok(xml) => rels::parse_rels_xml(&xml),
            Err(_) => Vec::new(),
        }
    }

    /// Register `target_part` as a relationship of `source_part`; returns the new id.
    pub(crate) fn add_relationship(
        &mut self,
        source_part: &str,
        rel_type: &str,
        target_part: &str,
    ) -> String {
        let rels_path = rels::rels_path_for(source_part);
        let existing_xml = self.read_text(&rels_path).ok();
        let existing = existing_xml.as_deref().map(rels::parse_rels_xml).unwrap_or_default();
        let rel = Relationship {
            id: rels::next_relationship_id(&existing),
            rel_type: rel_type.to_string(),
            target: rels::relative_target(source_part, target_part),
            external: false,
        };
        let updated = rels::append_relationship(existing_xml.as_deref(), &rel);
        self.set_part(&rels_path, updated.into_bytes());
        rel.id
    }

    /// Resolve an internal relationship of `source_part` to a part name.
    pub(crate) fn related_part(&self, source_part: &str, id: &str) -> Option<String> {
        self.relationships(source_part)
            .into_iter()
            .find(|r| r.id == id && !r.external)
            .map(|r| rels::resolve_target(source_part, &r.target))
    }

    pub fn main_document_part(&self) -> String {
        self.relationships("")
            .into_iter()
            .find(|r| r.rel_type == OFFICE_DOCUMENT_REL)
            .map(|r| rels::resolve_target("", &r.target))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string())
    }

    /// Every part some internal relationship in the package points at.
    pub(crate) fn referenced_parts(&self) -> HashSet<String> {
        let mut referenced = HashSet::new();
        for rels_path in self.part_names().filter(|n| n.ends_with(".rels")) {
            let Some(source) = rels::source_part_for(rels_path) else {
                continue;
            };
            for rel in self.relationships(&source) {
                if !rel.external {
                    referenced.insert(rels::resolve_target(&source, &rel.target));
                }
            }
        }
        referenced
    }

    pub(crate) fn ensure_default_content_type(
        &mut self,
        extension: &str,
        content_type: &str,
    ) -> Result<(), Error> {
        let xml = self.read_text(CONTENT_TYPES_PART)?;
        let types = roxmltree::Document::parse(&xml)?;
        let known = types.root_element().children().any(|n| {
            n.tag_name().name() == "Default"
                && n.attribute("Extension").is_some_and(|e| e.eq_ignore_ascii_case(extension))
        });
        if known {
            return Ok(());
        }
        let entry = format!(
            "<Default Extension=\"{}\" ContentType=\"{}\"/>",
            escape_attr(extension),
            escape_attr(content_type)
        );
        self.insert_content_type(&xml, &types, &entry)
    }

    pub(crate) fn add_override_content_type(
        &mut self,
        part_name: &str,
        content_type: &str,
    ) -> Result<(), Error> {
        let xml = self.read_text(CONTENT_TYPES_PART)?;
        let types = roxmltree::Document::parse(&xml)?;
        let part_path = format!("/{part_name}");
        let known = types.root_element().children().any(|n| {
            n.tag_name().name() == "Override" && n.attribute("PartName") == Some(part_path.as_str())
        });
        if known {
            return Ok(());
        }
        let entry = format!(
            "<Override PartName=\"{}\" ContentType=\"{}\"/>",
            escape_attr(&part_path),
            escape_attr(content_type)
        );
        self.insert_content_type(&xml, &types, &entry)
    }

    fn insert_content_type(
        &mut self,
        xml: &str,
        types: &roxmltree::Document,
        entry: &str,
    ) -> Result<(), Error> {
        let root = types.root_element();
        if root.tag_name().namespace() != Some(CONTENT_TYPES_NS) {
            return Err(Error::InvalidDocx(format!("{CONTENT_TYPES_PART} has no Types root")));
        }
        let mut updated = xml.to_string();
        crate::xml::append_point(xml, root)?.apply(&mut updated, entry);
        self.set_part(CONTENT_TYPES_PART, updated.into_bytes());
        Ok(())
    }

    /// Capability query for a table style by display name (or id). Returns the
    /// style id to reference from `w:tblStyle`, or `None` when the document's
    /// style catalog does not define it.
    pub fn find_table_style(&self, name: &str) -> Option<String> {
        let main = self.main_document_part();
        let styles_part = self
            .relationships(&main)
            .into_iter()
            .find(|r| r.rel_type == STYLES_REL)
            .map(|r| rels::resolve_target(&main, &r.target))
            .unwrap_or_else(|| "word/styles.xml".to_string());
        let xml_content = self.read_text(&styles_part).ok()?;
        let xml = roxmltree::Document::parse(&xml_content).ok()?;

        xml.root_element()
            .children()
            .filter(|n| crate::xml::is_wml(*n, "style"))
            .filter(|n| wml_attr(*n, "type") == Some("table"))
            .find(|n| {
                let id_matches = wml_attr(*n, "styleId") == Some(name);
                let name_matches = wml(*n, "name")
                    .and_then(|s| wml_attr(s, "val"))
                    .is_some_and(|v| v.eq_ignore_ascii_case(name));
                id_matches || name_matches
            })
            .and_then(|n| wml_attr(n, "styleId"))
            .map(str::to_string)
    }

    /// Highest `wp:docPr/@id` in any WordprocessingML part.
    pub(crate) fn max_drawing_id(&self) -> u32 {
        self.parts
            .iter()
            .filter(|p| p.name.starts_with("word/") && p.name.ends_with(".xml"))
            .filter_map(|p| std::str::from_utf8(&p.data).ok())
            .filter(|text| text.contains("docPr"))
            .filter_map(|text| roxmltree::Document::parse(text).ok().map(|xml| max_doc_pr_id(&xml)))
            .max()
            .unwrap_or(0)
    }
}

fn max_doc_pr_id(xml: &roxmltree::Document) -> u32 {
    xml.descendants()
        .filter(|n| n.tag_name().name() == "docPr")
        .filter_map(|n| n.attribute("id"))
        .filter_map(|v| v.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

/// A brand-new, empty footer part.
pub(crate) fn empty_footer_xml() -> String {
    format!(
        "{XML_DECLARATION}<w:ftr xmlns:w=\"{WML_NS}\" xmlns:r=\"{}\"></w:ftr>",
        crate::xml::REL_NS
    )
}
