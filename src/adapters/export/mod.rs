//! Export adapters: Anki-style CSV for decks, Markdown for any study set.

pub mod csv_export;
pub mod markdown;

pub use csv_export::flashcards_to_csv;
pub use markdown::render_markdown;
