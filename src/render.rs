//! WordprocessingML fragments for the signature block. Every run and
//! paragraph goes through [`text_run`] and [`Paragraph::to_xml`], so the
//! formatting of a cell is decided by its [`TextStyle`] alone.

use crate::model::{Alignment, TextStyle};
use crate::xml::escape_text;

fn half_points(points: f32) -> u32 {
    (points * 2.0).round() as u32
}

fn run_properties(style: &TextStyle) -> String {
    let mut rpr = String::new();
    if style.bold {
        rpr.push_str("<w:b/><w:bCs/>");
    }
    if style.italic {
        rpr.push_str("<w:i/><w:iCs/>");
    }
    if let Some(size) = style.font_size {
        let hp = half_points(size);
        rpr.push_str(&format!("<w:sz w:val=\"{hp}\"/><w:szCs w:val=\"{hp}\"/>"));
    }
    if rpr.is_empty() { rpr } else { format!("<w:rPr>{rpr}</w:rPr>") }
}

pub(crate) fn text_run(text: &str, style: &TextStyle) -> String {
    format!(
        "<w:r>{}<w:t xml:space=\"preserve\">{}</w:t></w:r>",
        run_properties(style),
        escape_text(text)
    )
}

/// One paragraph under construction.
pub(crate) struct Paragraph {
    alignment: Alignment,
    runs: Vec<String>,
}

impl Paragraph {
    pub(crate) fn new(alignment: Alignment) -> Self {
        Paragraph { alignment, runs: Vec::new() }
    }

    pub(crate) fn styled(text: &str, style: &TextStyle) -> Self {
        let mut p = Paragraph::new(style.alignment);
        p.push_run(text_run(text, style));
        p
    }

    pub(crate) fn push_run(&mut self, run: String) {
        self.runs.push(run);
    }

    pub(crate) fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub(crate) fn to_xml(&self, namespaces: &str) -> String {
        format!(
            "<w:p{namespaces}><w:pPr><w:jc w:val=\"{}\"/></w:pPr>{}</w:p>",
            self.alignment.wml_value(),
            self.runs.concat()
        )
    }
}

/// A grid of paragraphs rendered as `w:tbl` with equal column widths.
pub(crate) struct Table {
    style_id: Option<String>,
    width: u32,
    rows: Vec<Vec<Paragraph>>,
}

impl Table {
    pub(crate) fn new(style_id: Option<String>, width: u32) -> Self {
        Table { style_id, width, rows: Vec::new() }
    }

    pub(crate) fn push_row(&mut self, cells: Vec<Paragraph>) {
        self.rows.push(cells);
    }

    pub(crate) fn to_xml(&self, namespaces: &str) -> String {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let col_width = self.width / columns as u32;

        let mut xml = format!("<w:tbl{namespaces}><w:tblPr>");
        if let Some(id) = &self.style_id {
            xml.push_str(&format!("<w:tblStyle w:val=\"{}\"/>", crate::xml::escape_attr(id)));
        }
        xml.push_str(&format!(
            "<w:tblW w:w=\"{}\" w:type=\"dxa\"/><w:jc w:val=\"center\"/>\
             <w:tblLook w:val=\"04A0\" w:firstRow=\"1\" w:lastRow=\"0\" w:firstColumn=\"1\" \
             w:lastColumn=\"0\" w:noHBand=\"0\" w:noVBand=\"1\"/></w:tblPr><w:tblGrid>",
            self.width
        ));
        for _ in 0..columns {
            xml.push_str(&format!("<w:gridCol w:w=\"{col_width}\"/>"));
        }
        xml.push_str("</w:tblGrid>");
        for row in &self.rows {
            xml.push_str("<w:tr>");
            for cell in row {
                xml.push_str(&format!(
                    "<w:tc><w:tcPr><w:tcW w:w=\"{col_width}\" w:type=\"dxa\"/></w:tcPr>{}</w:tc>",
                    cell.to_xml("")
                ));
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_properties_follow_style() {
        let style = TextStyle::plain(Alignment::Center).bold().sized(8.0);
        assert_eq!(
            text_run("A & B", &style),
            "<w:r><w:rPr><w:b/><w:bCs/><w:sz w:val=\"16\"/><w:szCs w:val=\"16\"/></w:rPr>\
             <w:t xml:space=\"preserve\">A &amp; B</w:t></w:r>"
        );
        let plain = TextStyle::plain(Alignment::Left);
        assert_eq!(text_run("x", &plain), "<w:r><w:t xml:space=\"preserve\">x</w:t></w:r>");
    }

    #[test]
    fn paragraph_carries_alignment() {
        let style = TextStyle::plain(Alignment::Left).italic();
        let xml = Paragraph::styled("SIGNATURE", &style).to_xml("");
        assert!(xml.starts_with("<w:p><w:pPr><w:jc w:val=\"left\"/></w:pPr>"));
        assert!(xml.contains("<w:i/>"));
    }

    #[test]
    fn table_splits_width_across_columns() {
        let style = TextStyle::plain(Alignment::Center);
        let mut table = Table::new(Some("TableGrid".into()), 8640);
        table.push_row((0..3).map(|i| Paragraph::styled(&i.to_string(), &style)).collect());
        let xml = table.to_xml("");
        assert!(xml.contains("<w:tblStyle w:val=\"TableGrid\"/>"));
        assert_eq!(xml.matches("<w:gridCol w:w=\"2880\"/>").count(), 3);
        assert_eq!(xml.matches("<w:tc>").count(), 3);
        roxmltree::Document::parse(&table.to_xml(
            " xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"",
        ))
        .unwrap();
    }
}
