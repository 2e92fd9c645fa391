pub mod ui;

mod composer;
mod note_card;
mod ocr_panel;
mod sticky;

pub(crate) use composer::Composer;
pub(crate) use note_card::NoteCard;
pub(crate) use ocr_panel::OcrPanel;
pub(crate) use sticky::StickyOverlay;
