//! Laying out the signature block inside an emptied footer.

use crate::error::Error;
use crate::footer::FooterRegion;
use crate::model::{
    Alignment, Fallback, InsertionOutcome, Layout, SignOptions, SignatureBlock, SignatureSlot,
    TextStyle,
};
use crate::render::{Paragraph, Table};
use crate::signature_image::ImageInserter;

pub const TABLE_ROWS: usize = 4;

const TITLE: TextStyle = TextStyle::plain(Alignment::Center).bold();
const POSITION: TextStyle = TextStyle::plain(Alignment::Center).sized(8.0);
const SIGNATURE_CELL: Alignment = Alignment::Center;
const DATE: TextStyle = TextStyle::plain(Alignment::Center).sized(7.0);

const NAME_LINE: TextStyle = TextStyle::plain(Alignment::Left).bold().sized(8.0);
const TIMESTAMP_LINE: TextStyle = TextStyle::plain(Alignment::Left).sized(7.0);
const SIGNATURE_LINE: Alignment = Alignment::Left;

/// What was written and which resources had to be substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub block: SignatureBlock,
    pub outcomes: Vec<InsertionOutcome>,
    pub fallbacks: Vec<Fallback>,
}

pub fn compose(
    region: &mut FooterRegion,
    slots: &[SignatureSlot],
    options: &SignOptions,
) -> Result<Composition, Error> {
    if slots.is_empty() {
        return Err(Error::Layout("no signature slots given".into()));
    }
    let existing = region.block_count()?;
    if existing != 0 {
        return Err(Error::Layout(format!(
            "footer {} still holds {existing} block(s)",
            region.part_name()
        )));
    }
    match options.layout {
        Layout::Table => compose_table(region, slots, options),
        Layout::Paragraph => compose_paragraphs(region, slots, options),
    }
}

fn compose_table(
    region: &mut FooterRegion,
    slots: &[SignatureSlot],
    options: &SignOptions,
) -> Result<Composition, Error> {
    let labels = &options.labels;
    let mut fallbacks = Vec::new();

    let style_id = region.package().find_table_style(&options.table_style);
    match &style_id {
        Some(id) => log::debug!("table style \"{}\" resolved to {id}", options.table_style),
        None => {
            let fallback = Fallback::UnknownTableStyle { name: options.table_style.clone() };
            log::info!("{fallback}");
            fallbacks.push(fallback);
        }
    }

    let inserter = ImageInserter::new(options.image_size, &labels.placeholder);
    let mut outcomes = Vec::with_capacity(slots.len());
    let mut signature_row = Vec::with_capacity(slots.len());
    for (i, slot) in slots.iter().enumerate() {
        let mut cell = Paragraph::new(SIGNATURE_CELL);
        let insertion = inserter.insert(region, &mut cell, i, slot.image());
        outcomes.push(insertion.outcome);
        fallbacks.extend(insertion.fallback);
        signature_row.push(cell);
    }

    let mut table = Table::new(style_id, options.table_width);
    table.push_row(slots.iter().map(|s| Paragraph::styled(&s.role_title, &TITLE)).collect());
    table.push_row(slots.iter().map(|s| Paragraph::styled(&s.position_label, &POSITION)).collect());
    table.push_row(signature_row);
    table.push_row(
        slots
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let prefix = labels.date_prefix(s.effective_date_kind(i));
                Paragraph::styled(&format!("{prefix}: {}", s.date_label), &DATE)
            })
            .collect(),
    );

    let xml = table.to_xml(region.namespaces());
    region.append_block(&xml);
    log::info!("wrote {TABLE_ROWS}x{} signature table into {}", slots.len(), region.part_name());

    Ok(Composition {
        block: SignatureBlock::Table { rows: TABLE_ROWS, columns: slots.len() },
        outcomes,
        fallbacks,
    })
}

fn compose_paragraphs(
    region: &mut FooterRegion,
    slots: &[SignatureSlot],
    options: &SignOptions,
) -> Result<Composition, Error> {
    let labels = &options.labels;
    if slots.len() > 1 {
        log::warn!("paragraph layout signs with one slot, ignoring {} more", slots.len() - 1);
    }
    let slot = &slots[0];

    let inserter = ImageInserter::new(options.image_size, &labels.placeholder);
    let mut signature = Paragraph::new(SIGNATURE_LINE);
    let insertion = inserter.insert(region, &mut signature, 0, slot.image());
    debug_assert_eq!(signature.run_count(), 1);

    let paragraphs = [
        signature,
        Paragraph::styled(&slot.position_label, &NAME_LINE),
        Paragraph::styled(&format!("{} {}", labels.signed_on, slot.date_label), &TIMESTAMP_LINE),
    ];
    let namespaces = region.namespaces().to_string();
    for paragraph in &paragraphs {
        region.append_block(&paragraph.to_xml(&namespaces));
    }
    log::info!("wrote signature paragraphs into {}", region.part_name());

    Ok(Composition {
        block: SignatureBlock::Paragraphs { count: paragraphs.len() },
        outcomes: vec![insertion.outcome],
        fallbacks: insertion.fallback.into_iter().collect(),
    })
}
