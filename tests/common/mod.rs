#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>{footer_override}</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

pub struct Fixture {
    pub footer_text: Option<&'static str>,
    pub table_grid_style: bool,
}

impl Default for Fixture {
    fn default() -> Self {
        Fixture { footer_text: Some("OLD FOOTER"), table_grid_style: true }
    }
}

impl Fixture {
    pub fn write(&self, path: &Path) {
        let mut doc_rels = String::from(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        );
        let mut sect_pr = String::from("<w:sectPr>");
        let mut footer_override = "";
        if self.footer_text.is_some() {
            doc_rels.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>"#);
            sect_pr.push_str(r#"<w:footerReference w:type="default" r:id="rId2"/>"#);
            footer_override = r#"<Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#;
        }
        sect_pr.push_str(r#"<w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#);

        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{WML_NS}" xmlns:r="{REL_NS}"><w:body><w:p><w:r><w:t>Quality procedure</w:t></w:r></w:p><w:p><w:r><w:t>Body text that must survive signing.</w:t></w:r></w:p>{sect_pr}</w:body></w:document>"#
        );
        let mut styles = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{WML_NS}"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#
        );
        if self.table_grid_style {
            styles.push_str(r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/></w:style>"#);
        }
        styles.push_str("</w:styles>");

        let mut parts: Vec<(&str, String)> = vec![
            ("[Content_Types].xml", CONTENT_TYPES.replace("{footer_override}", footer_override)),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            ("word/document.xml", document),
            (
                "word/_rels/document.xml.rels",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{doc_rels}</Relationships>"#
                ),
            ),
            ("word/styles.xml", styles),
        ];
        if let Some(text) = self.footer_text {
            parts.push((
                "word/footer1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:ftr xmlns:w="{WML_NS}" xmlns:r="{REL_NS}"><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p></w:ftr>"#
                ),
            ));
        }

        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data) in parts {
            zip.start_file(name, zip::write::SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
}

pub fn write_png(path: &Path) -> PathBuf {
    let img = image::RgbaImage::from_pixel(150, 80, image::Rgba([10, 10, 90, 255]));
    img.save(path).unwrap();
    path.to_path_buf()
}

pub fn read_entry(docx: &Path, name: &str) -> Option<String> {
    let mut zip = zip::ZipArchive::new(fs::File::open(docx).unwrap()).unwrap();
    let mut entry = zip.by_name(name).ok()?;
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    Some(text)
}

pub fn entry_names(docx: &Path) -> Vec<String> {
    let zip = zip::ZipArchive::new(fs::File::open(docx).unwrap()).unwrap();
    zip.file_names().map(String::from).collect()
}

/// The signed footer, reduced to what the tests look at.
pub struct FooterView {
    pub xml: String,
}

pub struct CellView {
    pub text: String,
    pub drawings: usize,
    pub runs: usize,
    pub extents: Vec<(u64, u64)>,
}

impl FooterView {
    pub fn load(docx: &Path) -> Self {
        let mut package = docx_signature::Package::open(docx).unwrap();
        let part = docx_signature::footer::first_section_footer(&mut package).unwrap();
        let xml = String::from_utf8(package.part(&part).unwrap().to_vec()).unwrap();
        FooterView { xml }
    }

    fn with_doc<T>(&self, f: impl FnOnce(roxmltree::Node) -> T) -> T {
        let doc = roxmltree::Document::parse(&self.xml).unwrap();
        f(doc.root_element())
    }

    /// Names of the block elements directly under `w:ftr`.
    pub fn blocks(&self) -> Vec<String> {
        self.with_doc(|root| {
            root.children()
                .filter(|n| n.is_element() && matches!(n.tag_name().name(), "p" | "tbl" | "sdt"))
                .map(|n| n.tag_name().name().to_string())
                .collect()
        })
    }

    /// Cells of the first table, row by row.
    pub fn table(&self) -> Vec<Vec<CellView>> {
        self.with_doc(|root| {
            let tbl = root.children().find(|n| n.tag_name().name() == "tbl").unwrap();
            tbl.children()
                .filter(|n| n.tag_name().name() == "tr")
                .map(|tr| {
                    tr.children()
                        .filter(|n| n.tag_name().name() == "tc")
                        .map(cell_view)
                        .collect()
                })
                .collect()
        })
    }

    /// Paragraphs directly under the footer.
    pub fn paragraphs(&self) -> Vec<CellView> {
        self.with_doc(|root| {
            root.children()
                .filter(|n| n.tag_name().name() == "p")
                .map(cell_view)
                .collect()
        })
    }

    pub fn text(&self) -> String {
        self.with_doc(|root| cell_view(root).text)
    }
}

fn cell_view(node: roxmltree::Node) -> CellView {
    let text: String = node
        .descendants()
        .filter(|n| n.tag_name().name() == "t" && n.tag_name().namespace() == Some(WML_NS))
        .filter_map(|n| n.text())
        .collect();
    let drawings = node.descendants().filter(|n| n.tag_name().name() == "drawing").count();
    let runs = node.descendants().filter(|n| n.tag_name().name() == "r").count();
    let extents = node
        .descendants()
        .filter(|n| n.tag_name().name() == "extent")
        .filter_map(|n| {
            let cx = n.attribute("cx")?.parse::<u64>().ok()?;
            let cy = n.attribute("cy")?.parse::<u64>().ok()?;
            Some((cx, cy))
        })
        .collect();
    CellView { text, drawings, runs, extents }
}
