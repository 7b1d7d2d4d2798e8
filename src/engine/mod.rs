//! Engine-facing data model
//!
//! Everything the serializer consumes from the OCR engine is defined here:
//! the mode lookup tables, the per-symbol geometry and choice types, and the
//! [`SymbolCursor`] trait the result walk is written against. The concrete
//! Tesseract binding lives in [`tesseract`] behind the `tesseract` feature;
//! tests drive the same trait with an in-memory cursor.

#[cfg(feature = "tesseract")]
pub mod tesseract;

use std::path::PathBuf;

use thiserror::Error;

/// Page segmentation mode: the layout assumption the engine partitions the
/// image under before recognition.
///
/// Codes accepted on the command line are this tool's own numbering, not
/// Tesseract's `--help-psm` numbering; see [`PageSegMode::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegMode {
    /// Automatic layout analysis, no orientation/script detection.
    Auto,
    /// Layout analysis only, no recognition.
    AutoOnly,
    /// Automatic layout analysis with orientation and script detection.
    AutoOsd,
    /// Word in a circle.
    CircleWord,
    /// Raw line, bypassing engine-specific hacks.
    RawLine,
    /// Single uniform block of text.
    SingleBlock,
    /// Single block of vertically aligned text.
    SingleBlockVertText,
    /// Single character.
    SingleChar,
    /// Single column of text of variable sizes.
    SingleColumn,
    /// Single text line.
    SingleLine,
    /// Single word.
    SingleWord,
    /// Sparse text in no particular order.
    SparseText,
    /// Sparse text with orientation and script detection.
    SparseTextOsd,
}

impl PageSegMode {
    /// Map a command-line segmentation code to a mode.
    ///
    /// Total over all of `i32`; anything outside 0..=13 falls back to
    /// [`PageSegMode::AutoOsd`]. Code 4 has always aliased code 2 and
    /// existing callers depend on it, so the collision stays.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => PageSegMode::Auto,
            1 => PageSegMode::AutoOnly,
            2 | 4 => PageSegMode::AutoOsd,
            3 => PageSegMode::CircleWord,
            5 => PageSegMode::RawLine,
            6 => PageSegMode::SingleBlock,
            7 => PageSegMode::SingleBlockVertText,
            8 => PageSegMode::SingleChar,
            9 => PageSegMode::SingleColumn,
            10 => PageSegMode::SingleLine,
            11 => PageSegMode::SingleWord,
            12 => PageSegMode::SparseText,
            13 => PageSegMode::SparseTextOsd,
            _ => PageSegMode::AutoOsd,
        }
    }
}

/// Recognition backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Legacy pattern-matching engine only.
    TesseractOnly,
    /// Neural-network (LSTM) engine only.
    LstmOnly,
    /// Legacy and LSTM engines combined.
    TesseractLstmCombined,
    /// Whatever the installed engine considers its default.
    Default,
    /// Cube engine only (3.x engines; modern builds have no cube).
    CubeOnly,
    /// Legacy and cube engines combined (3.x engines).
    TesseractCubeCombined,
}

impl EngineMode {
    /// Map a command-line engine code to a backend.
    ///
    /// Codes 4 and 5 select the 3.x-era cube backends and are kept for
    /// compatibility with older engine builds; anything else outside 0..=3
    /// falls back to [`EngineMode::Default`].
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => EngineMode::TesseractOnly,
            1 => EngineMode::LstmOnly,
            2 => EngineMode::TesseractLstmCombined,
            3 => EngineMode::Default,
            4 => EngineMode::CubeOnly,
            5 => EngineMode::TesseractCubeCombined,
            _ => EngineMode::Default,
        }
    }
}

/// Axis-aligned box in image pixels, as the engine reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// One ranked alternative reading for a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub text: String,
    /// Confidence in 0..=100, engine scale.
    pub confidence: f32,
}

/// Font attributes the engine reports for a word.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontAttributes {
    /// Font family name; `None` when the engine detected no font.
    pub name: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underlined: bool,
    pub monospace: bool,
    pub serif: bool,
    pub smallcaps: bool,
    pub point_size: i32,
    /// Engine-internal font identifier.
    pub font_id: i32,
}

/// Word-level metadata, queried once when the cursor enters a new word.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordInfo {
    pub text: String,
    /// Word confidence in 0..=100, engine scale.
    pub confidence: f32,
    pub bounds: BoundingBox,
    pub font: FontAttributes,
}

/// Forward-only, single-pass cursor over symbol-level recognition results.
///
/// This is the whole interface the result walk consumes. The cursor starts
/// positioned on the first symbol (if any); [`SymbolCursor::advance`]
/// returning `false` is the sole termination signal, after which the cursor
/// must not be queried again. There is no "has more" predicate, matching
/// the engine's iterator contract.
pub trait SymbolCursor {
    /// Recognized text of the current symbol, `None` when the engine has
    /// nothing at this position (e.g. an empty page).
    fn symbol_text(&self) -> Option<String>;

    /// Is the current symbol the first symbol of a word?
    fn at_word_start(&self) -> bool;

    /// Bounding box of the current symbol.
    fn symbol_bounds(&self) -> BoundingBox;

    /// Metadata of the word containing the current symbol. Only meaningful
    /// at a word start.
    fn word(&self) -> WordInfo;

    /// Ranked alternative readings for the current symbol, best first, in
    /// engine order. The serializer trusts that order and never reorders.
    fn choices(&self) -> Box<dyn Iterator<Item = Choice> + '_>;

    /// Move to the next symbol. `false` means the cursor is exhausted.
    fn advance(&mut self) -> bool;
}

/// Failures crossing the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be initialized for the requested language or
    /// config file. Fatal; the process exits nonzero.
    #[error("could not initialize tesseract for language {lang:?}")]
    Init { lang: String },

    /// The image could not be decoded. The original tool fed the null
    /// image straight to the engine; we fail fast instead.
    #[error("could not read image {}", path.display())]
    Decode { path: PathBuf },

    /// The blocking recognition call reported failure.
    #[error("recognition failed")]
    Recognize,

    /// The engine returned no page text.
    #[error("engine returned no page text")]
    PageText,
}

impl EngineError {
    /// Process exit code for this failure: decode failures get their own
    /// code so callers can tell them from engine trouble.
    pub fn exit_code(&self) -> u8 {
        match self {
            EngineError::Decode { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psm_table() {
        assert_eq!(PageSegMode::from_code(0), PageSegMode::Auto);
        assert_eq!(PageSegMode::from_code(1), PageSegMode::AutoOnly);
        assert_eq!(PageSegMode::from_code(3), PageSegMode::CircleWord);
        assert_eq!(PageSegMode::from_code(5), PageSegMode::RawLine);
        assert_eq!(PageSegMode::from_code(6), PageSegMode::SingleBlock);
        assert_eq!(PageSegMode::from_code(7), PageSegMode::SingleBlockVertText);
        assert_eq!(PageSegMode::from_code(8), PageSegMode::SingleChar);
        assert_eq!(PageSegMode::from_code(9), PageSegMode::SingleColumn);
        assert_eq!(PageSegMode::from_code(10), PageSegMode::SingleLine);
        assert_eq!(PageSegMode::from_code(11), PageSegMode::SingleWord);
        assert_eq!(PageSegMode::from_code(12), PageSegMode::SparseText);
        assert_eq!(PageSegMode::from_code(13), PageSegMode::SparseTextOsd);
    }

    #[test]
    fn test_psm_code_4_aliases_code_2() {
        assert_eq!(PageSegMode::from_code(4), PageSegMode::from_code(2));
        assert_eq!(PageSegMode::from_code(4), PageSegMode::AutoOsd);
    }

    #[test]
    fn test_psm_out_of_range_falls_back() {
        assert_eq!(PageSegMode::from_code(-1), PageSegMode::AutoOsd);
        assert_eq!(PageSegMode::from_code(14), PageSegMode::AutoOsd);
        assert_eq!(PageSegMode::from_code(i32::MAX), PageSegMode::AutoOsd);
    }

    #[test]
    fn test_engine_mode_table() {
        assert_eq!(EngineMode::from_code(0), EngineMode::TesseractOnly);
        assert_eq!(EngineMode::from_code(1), EngineMode::LstmOnly);
        assert_eq!(EngineMode::from_code(2), EngineMode::TesseractLstmCombined);
        assert_eq!(EngineMode::from_code(3), EngineMode::Default);
    }

    #[test]
    fn test_engine_mode_legacy_cube_codes() {
        assert_eq!(EngineMode::from_code(4), EngineMode::CubeOnly);
        assert_eq!(EngineMode::from_code(5), EngineMode::TesseractCubeCombined);
    }

    #[test]
    fn test_engine_mode_out_of_range_falls_back() {
        assert_eq!(EngineMode::from_code(-1), EngineMode::Default);
        assert_eq!(EngineMode::from_code(6), EngineMode::Default);
        assert_eq!(EngineMode::from_code(99), EngineMode::Default);
    }

    #[test]
    fn test_bounding_box_dimensions() {
        let b = BoundingBox::new(10, 20, 35, 70);
        assert_eq!(b.width(), 25);
        assert_eq!(b.height(), 50);
    }

    #[test]
    fn test_decode_error_exit_code() {
        let decode = EngineError::Decode { path: "x.png".into() };
        let init = EngineError::Init { lang: "eng".into() };
        assert_eq!(decode.exit_code(), 2);
        assert_eq!(init.exit_code(), 1);
        assert_eq!(EngineError::Recognize.exit_code(), 1);
    }
}
