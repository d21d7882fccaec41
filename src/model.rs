use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
}

impl Alignment {
    pub(crate) fn wml_value(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
        }
    }
}

/// Formatting for one paragraph of generated text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub alignment: Alignment,
    pub bold: bool,
    pub italic: bool,
    pub font_size: Option<f32>, // points; None = inherit
}

impl TextStyle {
    pub const fn plain(alignment: Alignment) -> Self {
        TextStyle { alignment, bold: false, italic: false, font_size: None }
    }

    pub const fn bold(self) -> Self {
        TextStyle { bold: true, ..self }
    }

    pub const fn italic(self) -> Self {
        TextStyle { italic: true, ..self }
    }

    pub const fn sized(self, points: f32) -> Self {
        TextStyle { font_size: Some(points), ..self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateKind {
    Issue,
    Application,
    Validity,
}

impl DateKind {
    /// Kind used when a slot does not name one: first issue, second application,
    /// everything after that validity.
    pub fn for_position(index: usize) -> Self {
        match index {
            0 => DateKind::Issue,
            1 => DateKind::Application,
            _ => DateKind::Validity,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignatureSlot {
    pub role_title: String,
    pub position_label: String,
    pub image_path: Option<PathBuf>,
    pub date_label: String,
    pub date_kind: Option<DateKind>,
}

impl SignatureSlot {
    pub fn new(role_title: impl Into<String>, position_label: impl Into<String>) -> Self {
        SignatureSlot {
            role_title: role_title.into(),
            position_label: position_label.into(),
            image_path: None,
            date_label: String::new(),
            date_kind: None,
        }
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn with_date(mut self, label: impl Into<String>) -> Self {
        self.date_label = label.into();
        self
    }

    pub fn with_date_kind(mut self, kind: DateKind) -> Self {
        self.date_kind = Some(kind);
        self
    }

    /// The image path, treating an empty path as "no image".
    pub fn image(&self) -> Option<&Path> {
        self.image_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn effective_date_kind(&self, index: usize) -> DateKind {
        self.date_kind.unwrap_or_else(|| DateKind::for_position(index))
    }

    /// The three columns of a freshly signed document: the signer, then the
    /// reviewer and approver still pending.
    pub fn standard_set(
        signer_name: &str,
        image_path: Option<PathBuf>,
        date: NaiveDate,
        labels: &Labels,
    ) -> Vec<SignatureSlot> {
        let date_label = date.format(DATE_FORMAT).to_string();
        let mut signer = SignatureSlot::new(&labels.prepared_by, signer_name)
            .with_date(&date_label)
            .with_date_kind(DateKind::Issue);
        signer.image_path = image_path;
        vec![
            signer,
            SignatureSlot::new(&labels.reviewed_by, &labels.pending)
                .with_date(&date_label)
                .with_date_kind(DateKind::Application),
            SignatureSlot::new(&labels.approved_by, &labels.pending)
                .with_date(&date_label)
                .with_date_kind(DateKind::Validity),
        ]
    }

    /// Single slot for the paragraph layout, dated with a timestamp.
    pub fn signer(
        signer_name: &str,
        image_path: Option<PathBuf>,
        signed_at: NaiveDateTime,
        labels: &Labels,
    ) -> SignatureSlot {
        let mut slot = SignatureSlot::new(&labels.prepared_by, signer_name)
            .with_date(signed_at.format(TIMESTAMP_FORMAT).to_string());
        slot.image_path = image_path;
        slot
    }
}

/// Every piece of fixed text the signature block prints.
#[derive(Clone, Debug, PartialEq)]
pub struct Labels {
    pub placeholder: String,
    pub issue: String,
    pub application: String,
    pub validity: String,
    pub signed_on: String,
    pub prepared_by: String,
    pub reviewed_by: String,
    pub approved_by: String,
    pub pending: String,
}

impl Labels {
    pub fn english() -> Self {
        Labels {
            placeholder: "SIGNATURE".into(),
            issue: "Date of Issue".into(),
            application: "Date of Application".into(),
            validity: "Validity".into(),
            signed_on: "Signed on".into(),
            prepared_by: "PREPARED BY".into(),
            reviewed_by: "REVIEWED BY".into(),
            approved_by: "APPROVED BY".into(),
            pending: "Pending".into(),
        }
    }

    pub fn spanish() -> Self {
        Labels {
            placeholder: "FIRMA DIGITAL".into(),
            issue: "Fecha de Emisión".into(),
            application: "Fecha de Aplicación".into(),
            validity: "Vigencia".into(),
            signed_on: "Firmado el".into(),
            prepared_by: "ELABORÓ".into(),
            reviewed_by: "REVISÓ".into(),
            approved_by: "APROBÓ".into(),
            pending: "Pendiente".into(),
        }
    }

    pub fn date_prefix(&self, kind: DateKind) -> &str {
        match kind {
            DateKind::Issue => &self.issue,
            DateKind::Application => &self.application,
            DateKind::Validity => &self.validity,
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Labels::english()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    #[default]
    Table,
    Paragraph,
}

/// Display size of an embedded signature, in EMU (914 400 per inch).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u64,
    pub height: u64,
}

impl Default for ImageSize {
    fn default() -> Self {
        // 1.5in × 0.8in
        ImageSize { width: 1_371_600, height: 731_520 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignOptions {
    pub layout: Layout,
    pub table_style: String,
    pub labels: Labels,
    pub image_size: ImageSize,
    pub table_width: u32, // twips
}

impl Default for SignOptions {
    fn default() -> Self {
        SignOptions {
            layout: Layout::Table,
            table_style: "Table Grid".into(),
            labels: Labels::english(),
            image_size: ImageSize::default(),
            table_width: 8640, // 6in
        }
    }
}

/// Shape of the block written into the footer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureBlock {
    Table { rows: usize, columns: usize },
    Paragraphs { count: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertionOutcome {
    Embedded,
    Placeholder,
}

/// A resource that could not be used and what was used instead.
#[derive(Clone, Debug, PartialEq)]
pub enum Fallback {
    NoImage { slot: usize },
    MissingImage { slot: usize, path: PathBuf },
    UnreadableImage { slot: usize, path: PathBuf, reason: String },
    UnknownTableStyle { name: String },
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::NoImage { slot } => write!(f, "slot {slot}: no signature image, using text"),
            Fallback::MissingImage { slot, path } => {
                write!(f, "slot {slot}: signature image not found at {}, using text", path.display())
            }
            Fallback::UnreadableImage { slot, path, reason } => {
                write!(f, "slot {slot}: cannot use {} ({reason}), using text", path.display())
            }
            Fallback::UnknownTableStyle { name } => {
                write!(f, "table style \"{name}\" not defined, using default table appearance")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_kind_falls_back_by_position() {
        let slot = SignatureSlot::new("R", "P");
        assert_eq!(slot.effective_date_kind(0), DateKind::Issue);
        assert_eq!(slot.effective_date_kind(1), DateKind::Application);
        assert_eq!(slot.effective_date_kind(2), DateKind::Validity);
        assert_eq!(slot.effective_date_kind(7), DateKind::Validity);
        let fixed = slot.with_date_kind(DateKind::Validity);
        assert_eq!(fixed.effective_date_kind(0), DateKind::Validity);
    }

    #[test]
    fn empty_image_path_counts_as_none() {
        let slot = SignatureSlot::new("R", "P").with_image("");
        assert_eq!(slot.image(), None);
        let slot = SignatureSlot::new("R", "P").with_image("sig.png");
        assert_eq!(slot.image(), Some(Path::new("sig.png")));
    }

    #[test]
    fn standard_set_has_signer_then_pending_reviewers() {
        let labels = Labels::spanish();
        let date = NaiveDate::from_ymd_opt(2017, 6, 26).unwrap();
        let slots = SignatureSlot::standard_set("A. Ramirez", Some("firma.png".into()), date, &labels);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].role_title, "ELABORÓ");
        assert_eq!(slots[0].position_label, "A. Ramirez");
        assert_eq!(slots[0].image(), Some(Path::new("firma.png")));
        assert_eq!(slots[1].position_label, "Pendiente");
        assert_eq!(slots[2].role_title, "APROBÓ");
        assert!(slots[1].image_path.is_none() && slots[2].image_path.is_none());
        assert!(slots.iter().all(|s| s.date_label == "26/06/2017"));
    }

    #[test]
    fn signer_slot_carries_a_timestamp() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 7, 0)
            .unwrap();
        let slot = SignatureSlot::signer("B. Lopez", None, at, &Labels::english());
        assert_eq!(slot.date_label, "05/03/2024 09:07");
    }
}
