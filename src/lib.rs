//! tessglyph - extract detailed glyph information from images via Tesseract
//!
//! A command-line front end over the Tesseract OCR engine. Recognition runs
//! entirely inside the engine; this crate parses arguments, maps small
//! integer codes to the engine's segmentation and backend modes, and walks
//! the engine's result cursor to serialize an ALTO-inspired XML description
//! of the recognized glyphs (or the whole-page plain text, or both).
//!
//! The library builds without Tesseract installed: the real backend in
//! [`engine::tesseract`] is gated behind the `tesseract` cargo feature, and
//! the serializer in [`alto`] works against any [`engine::SymbolCursor`].

pub mod alto;
pub mod config;
pub mod engine;
