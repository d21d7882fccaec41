//! Putting a signature image, or the placeholder text standing in for it,
//! into a paragraph of the footer.

use std::io::Cursor;
use std::path::Path;

use image::ImageFormat;

use crate::error::Error;
use crate::footer::FooterRegion;
use crate::model::{Alignment, Fallback, ImageSize, InsertionOutcome, TextStyle};
use crate::render::{Paragraph, text_run};
use crate::xml::{DML_NS, PIC_NS, escape_attr};

/// Image bytes ready to be stored in the package.
pub(crate) struct PreparedImage {
    pub data: Vec<u8>,
    pub extension: &'static str,
    pub content_type: &'static str,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Read and decode an image. Formats Word renders natively are kept
/// byte-for-byte; anything else the decoder understands is re-encoded as PNG.
pub(crate) fn prepare(path: &Path) -> Result<PreparedImage, Error> {
    let data = std::fs::read(path)?;
    let format = image::guess_format(&data)?;
    let decoded = image::load_from_memory_with_format(&data, format)?;
    let (pixel_width, pixel_height) = (decoded.width(), decoded.height());

    let native = match format {
        ImageFormat::Png => Some(("png", "image/png")),
        ImageFormat::Jpeg => Some(("jpeg", "image/jpeg")),
        ImageFormat::Gif => Some(("gif", "image/gif")),
        ImageFormat::Bmp => Some(("bmp", "image/bmp")),
        _ => None,
    };
    if let Some((extension, content_type)) = native {
        return Ok(PreparedImage { data, extension, content_type, pixel_width, pixel_height });
    }

    log::debug!("re-encoding {:?} image {} as PNG", format, path.display());
    let mut png = Cursor::new(Vec::new());
    decoded.write_to(&mut png, ImageFormat::Png)?;
    Ok(PreparedImage {
        data: png.into_inner(),
        extension: "png",
        content_type: "image/png",
        pixel_width,
        pixel_height,
    })
}

pub(crate) struct Insertion {
    pub outcome: InsertionOutcome,
    pub fallback: Option<Fallback>,
}

/// Places exactly one run per call: the embedded image, or the italic placeholder.
pub(crate) struct ImageInserter<'a> {
    size: ImageSize,
    placeholder: &'a str,
}

impl<'a> ImageInserter<'a> {
    pub(crate) fn new(size: ImageSize, placeholder: &'a str) -> Self {
        ImageInserter { size, placeholder }
    }

    pub(crate) fn insert(
        &self,
        region: &mut FooterRegion,
        paragraph: &mut Paragraph,
        slot: usize,
        path: Option<&Path>,
    ) -> Insertion {
        let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
            log::info!("slot {slot}: no signature image, using text");
            return self.placeholder(paragraph, Fallback::NoImage { slot });
        };
        if !path.is_file() {
            let fallback = Fallback::MissingImage { slot, path: path.to_path_buf() };
            log::warn!("{fallback}");
            return self.placeholder(paragraph, fallback);
        }

        match self.embed(region, path) {
            Ok(run) => {
                paragraph.push_run(run);
                log::info!("slot {slot}: embedded signature image {}", path.display());
                Insertion { outcome: InsertionOutcome::Embedded, fallback: None }
            }
            Err(e) => {
                let fallback = Fallback::UnreadableImage {
                    slot,
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                };
                log::warn!("{fallback}");
                self.placeholder(paragraph, fallback)
            }
        }
    }

    fn placeholder(&self, paragraph: &mut Paragraph, fallback: Fallback) -> Insertion {
        let style = TextStyle::plain(Alignment::Center).italic();
        paragraph.push_run(text_run(self.placeholder, &style));
        Insertion { outcome: InsertionOutcome::Placeholder, fallback: Some(fallback) }
    }

    fn embed(&self, region: &mut FooterRegion, path: &Path) -> Result<String, Error> {
        let image = prepare(path)?;
        log::debug!(
            "{}: {}x{} px {}",
            path.display(),
            image.pixel_width,
            image.pixel_height,
            image.content_type
        );
        let rel_id = region.add_media("signature", image.extension, image.content_type, image.data)?;
        let drawing_id = region.next_drawing_id();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("signature.{}", image.extension));
        Ok(inline_picture_run(&rel_id, drawing_id, &name, self.size))
    }
}

fn inline_picture_run(rel_id: &str, drawing_id: u32, name: &str, size: ImageSize) -> String {
    let ImageSize { width, height } = size;
    let name = escape_attr(name);
    format!(
        "<w:r><w:drawing><wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">\
         <wp:extent cx=\"{width}\" cy=\"{height}\"/>\
         <wp:docPr id=\"{drawing_id}\" name=\"Picture {drawing_id}\" descr=\"{name}\"/>\
         <wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a=\"{DML_NS}\" noChangeAspect=\"1\"/></wp:cNvGraphicFramePr>\
         <a:graphic xmlns:a=\"{DML_NS}\"><a:graphicData uri=\"{PIC_NS}\">\
         <pic:pic xmlns:pic=\"{PIC_NS}\">\
         <pic:nvPicPr><pic:cNvPr id=\"0\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>\
         <pic:blipFill><a:blip r:embed=\"{rel_id}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>\
         <pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{width}\" cy=\"{height}\"/></a:xfrm>\
         <a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>\
         </pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"
    )
}
