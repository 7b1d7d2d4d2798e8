//! Tesseract backend
//!
//! Thin RAII binding over the Tesseract C API (`tesseract-sys`) and
//! Leptonica (`leptonica-sys`). The safe wrappers around these libraries do
//! not expose the result/choice iterators the glyph walk needs, so this
//! module talks to the C API directly and keeps every raw handle behind an
//! owner with a `Drop` impl: the session owns the `TessBaseAPI` and the
//! decoded `Pix`, the cursor owns its `TessResultIterator`, and the choice
//! iterator owns its `TessChoiceIterator`. Whatever the caller does, each
//! handle is released exactly once.

use std::ffi::{c_char, c_int, CStr, CString};
use std::marker::PhantomData;
use std::path::Path;
use std::ptr;

use leptonica_sys as lept;
use tesseract_sys as sys;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::{
    BoundingBox, Choice, EngineError, EngineMode, FontAttributes, PageSegMode,
    SymbolCursor, WordInfo,
};

fn psm_value(mode: PageSegMode) -> sys::TessPageSegMode {
    match mode {
        PageSegMode::Auto => sys::TessPageSegMode_PSM_AUTO,
        PageSegMode::AutoOnly => sys::TessPageSegMode_PSM_AUTO_ONLY,
        PageSegMode::AutoOsd => sys::TessPageSegMode_PSM_AUTO_OSD,
        PageSegMode::CircleWord => sys::TessPageSegMode_PSM_CIRCLE_WORD,
        PageSegMode::RawLine => sys::TessPageSegMode_PSM_RAW_LINE,
        PageSegMode::SingleBlock => sys::TessPageSegMode_PSM_SINGLE_BLOCK,
        PageSegMode::SingleBlockVertText => {
            sys::TessPageSegMode_PSM_SINGLE_BLOCK_VERT_TEXT
        }
        PageSegMode::SingleChar => sys::TessPageSegMode_PSM_SINGLE_CHAR,
        PageSegMode::SingleColumn => sys::TessPageSegMode_PSM_SINGLE_COLUMN,
        PageSegMode::SingleLine => sys::TessPageSegMode_PSM_SINGLE_LINE,
        PageSegMode::SingleWord => sys::TessPageSegMode_PSM_SINGLE_WORD,
        PageSegMode::SparseText => sys::TessPageSegMode_PSM_SPARSE_TEXT,
        PageSegMode::SparseTextOsd => sys::TessPageSegMode_PSM_SPARSE_TEXT_OSD,
    }
}

fn oem_value(mode: EngineMode) -> sys::TessOcrEngineMode {
    match mode {
        EngineMode::TesseractOnly => sys::TessOcrEngineMode_OEM_TESSERACT_ONLY,
        EngineMode::LstmOnly => sys::TessOcrEngineMode_OEM_LSTM_ONLY,
        EngineMode::TesseractLstmCombined => {
            sys::TessOcrEngineMode_OEM_TESSERACT_LSTM_COMBINED
        }
        EngineMode::Default => sys::TessOcrEngineMode_OEM_DEFAULT,
        // Cube backends were removed from Tesseract 4+; honor the request
        // as well as the installed engine can.
        EngineMode::CubeOnly | EngineMode::TesseractCubeCombined => {
            warn!("cube engine modes are not available in this engine, using default");
            sys::TessOcrEngineMode_OEM_DEFAULT
        }
    }
}

/// Copy an engine-owned UTF-8 string that must be freed with
/// `TessDeleteText`. Returns `None` for a null pointer.
unsafe fn take_tess_text(raw: *mut c_char) -> Option<String> {
    if raw.is_null() {
        return None;
    }
    let text = CStr::from_ptr(raw).to_string_lossy().into_owned();
    sys::TessDeleteText(raw);
    Some(text)
}

/// One recognition session: the engine handle plus the decoded image.
///
/// Must not be used for a second image; create a fresh session per run.
pub struct TesseractSession {
    api: *mut sys::TessBaseAPI,
    pix: *mut lept::Pix,
}

impl TesseractSession {
    /// Create the engine handle and load the language model, engine mode,
    /// and optional config file from `config`.
    pub fn init(config: &Config) -> Result<Self, EngineError> {
        let init_error = || EngineError::Init { lang: config.lang.clone() };

        let lang = CString::new(config.lang.as_str()).map_err(|_| init_error())?;
        let config_file = config
            .config_file
            .as_deref()
            .map(CString::new)
            .transpose()
            .map_err(|_| init_error())?;

        let mut configs: Vec<*mut c_char> = config_file
            .iter()
            .map(|c| c.as_ptr() as *mut c_char)
            .collect();
        let configs_size = configs.len() as c_int;
        let configs_ptr = if configs.is_empty() {
            ptr::null_mut()
        } else {
            configs.as_mut_ptr()
        };

        let oem = oem_value(EngineMode::from_code(config.engine));
        let psm = psm_value(PageSegMode::from_code(config.psm));

        unsafe {
            let api = sys::TessBaseAPICreate();
            let rc = sys::TessBaseAPIInit4(
                api,
                ptr::null(),
                lang.as_ptr(),
                oem,
                configs_ptr,
                configs_size,
                ptr::null_mut(),
                ptr::null_mut(),
                0,
                0,
            );
            if rc != 0 {
                sys::TessBaseAPIDelete(api);
                return Err(init_error());
            }
            sys::TessBaseAPISetPageSegMode(api, psm);

            info!(lang = %config.lang, psm = config.psm, engine = config.engine,
                "tesseract initialized");
            Ok(Self { api, pix: ptr::null_mut() })
        }
    }

    /// Decode `path` with Leptonica and hand the raster to the engine.
    ///
    /// A decode failure is reported instead of feeding the engine a null
    /// image.
    pub fn set_image(&mut self, path: &Path) -> Result<(), EngineError> {
        let decode_error = || EngineError::Decode { path: path.to_owned() };

        let c_path = CString::new(path.to_string_lossy().as_bytes())
            .map_err(|_| decode_error())?;
        unsafe {
            let pix = lept::pixRead(c_path.as_ptr());
            if pix.is_null() {
                return Err(decode_error());
            }
            if !self.pix.is_null() {
                lept::pixDestroy(&mut self.pix);
            }
            self.pix = pix;
            sys::TessBaseAPISetImage2(self.api, self.pix);
        }
        debug!(path = %path.display(), "image decoded");
        Ok(())
    }

    /// Run recognition. One blocking call, no progress reporting.
    pub fn recognize(&mut self) -> Result<(), EngineError> {
        let rc = unsafe { sys::TessBaseAPIRecognize(self.api, ptr::null_mut()) };
        if rc != 0 {
            return Err(EngineError::Recognize);
        }
        Ok(())
    }

    /// Whole-page recognized text, exactly as the engine returns it.
    pub fn page_text(&mut self) -> Result<String, EngineError> {
        unsafe {
            take_tess_text(sys::TessBaseAPIGetUTF8Text(self.api))
                .ok_or(EngineError::PageText)
        }
    }

    /// Symbol-level result cursor. A session with no recognition results
    /// yields an empty cursor, not an error.
    pub fn symbols(&mut self) -> TesseractCursor<'_> {
        let iter = unsafe { sys::TessBaseAPIGetIterator(self.api) };
        TesseractCursor { iter, _session: PhantomData }
    }
}

impl Drop for TesseractSession {
    fn drop(&mut self) {
        unsafe {
            sys::TessBaseAPIEnd(self.api);
            sys::TessBaseAPIDelete(self.api);
            if !self.pix.is_null() {
                lept::pixDestroy(&mut self.pix);
            }
        }
    }
}

/// Cursor over the session's `TessResultIterator`, valid only while the
/// session lives.
pub struct TesseractCursor<'a> {
    iter: *mut sys::TessResultIterator,
    _session: PhantomData<&'a mut TesseractSession>,
}

impl TesseractCursor<'_> {
    fn page_iter(&self) -> *const sys::TessPageIterator {
        unsafe { sys::TessResultIteratorGetPageIteratorConst(self.iter) }
    }

    fn bounds_at(&self, level: sys::TessPageIteratorLevel) -> BoundingBox {
        let mut b = BoundingBox::default();
        unsafe {
            sys::TessPageIteratorBoundingBox(
                self.page_iter(),
                level,
                &mut b.left,
                &mut b.top,
                &mut b.right,
                &mut b.bottom,
            );
        }
        b
    }
}

impl SymbolCursor for TesseractCursor<'_> {
    fn symbol_text(&self) -> Option<String> {
        if self.iter.is_null() {
            return None;
        }
        unsafe {
            take_tess_text(sys::TessResultIteratorGetUTF8Text(
                self.iter,
                sys::TessPageIteratorLevel_RIL_SYMBOL,
            ))
        }
    }

    fn at_word_start(&self) -> bool {
        if self.iter.is_null() {
            return false;
        }
        unsafe {
            sys::TessPageIteratorIsAtBeginningOf(
                self.page_iter(),
                sys::TessPageIteratorLevel_RIL_WORD,
            ) != 0
        }
    }

    fn symbol_bounds(&self) -> BoundingBox {
        if self.iter.is_null() {
            return BoundingBox::default();
        }
        self.bounds_at(sys::TessPageIteratorLevel_RIL_SYMBOL)
    }

    fn word(&self) -> WordInfo {
        if self.iter.is_null() {
            return WordInfo::default();
        }
        let word_level = sys::TessPageIteratorLevel_RIL_WORD;
        let text = unsafe {
            take_tess_text(sys::TessResultIteratorGetUTF8Text(self.iter, word_level))
        }
        .unwrap_or_default();
        let confidence =
            unsafe { sys::TessResultIteratorConfidence(self.iter, word_level) };
        let bounds = self.bounds_at(word_level);

        let mut bold: c_int = 0;
        let mut italic: c_int = 0;
        let mut underlined: c_int = 0;
        let mut monospace: c_int = 0;
        let mut serif: c_int = 0;
        let mut smallcaps: c_int = 0;
        let mut point_size: c_int = 0;
        let mut font_id: c_int = 0;
        let name = unsafe {
            // Engine-owned string, not freed by the caller.
            let raw = sys::TessResultIteratorWordFontAttributes(
                self.iter,
                &mut bold,
                &mut italic,
                &mut underlined,
                &mut monospace,
                &mut serif,
                &mut smallcaps,
                &mut point_size,
                &mut font_id,
            );
            if raw.is_null() {
                None
            } else {
                Some(CStr::from_ptr(raw).to_string_lossy().into_owned())
            }
        };

        WordInfo {
            text,
            confidence,
            bounds,
            font: FontAttributes {
                name,
                bold: bold != 0,
                italic: italic != 0,
                underlined: underlined != 0,
                monospace: monospace != 0,
                serif: serif != 0,
                smallcaps: smallcaps != 0,
                point_size,
                font_id,
            },
        }
    }

    fn choices(&self) -> Box<dyn Iterator<Item = Choice> + '_> {
        if self.iter.is_null() {
            return Box::new(std::iter::empty());
        }
        let raw = unsafe { sys::TessResultIteratorGetChoiceIterator(self.iter) };
        Box::new(ChoiceIter { iter: raw, started: false, _cursor: PhantomData })
    }

    fn advance(&mut self) -> bool {
        if self.iter.is_null() {
            return false;
        }
        unsafe {
            sys::TessResultIteratorNext(
                self.iter,
                sys::TessPageIteratorLevel_RIL_SYMBOL,
            ) != 0
        }
    }
}

impl Drop for TesseractCursor<'_> {
    fn drop(&mut self) {
        if !self.iter.is_null() {
            unsafe { sys::TessResultIteratorDelete(self.iter) };
        }
    }
}

/// Ranked alternative readings for the symbol the cursor is on.
///
/// The C iterator starts positioned on the best choice, so the first call
/// reads before advancing.
struct ChoiceIter<'a> {
    iter: *mut sys::TessChoiceIterator,
    started: bool,
    _cursor: PhantomData<&'a TesseractCursor<'a>>,
}

impl Iterator for ChoiceIter<'_> {
    type Item = Choice;

    fn next(&mut self) -> Option<Choice> {
        if self.iter.is_null() {
            return None;
        }
        if self.started {
            let more = unsafe { sys::TessChoiceIteratorNext(self.iter) } != 0;
            if !more {
                return None;
            }
        }
        self.started = true;
        unsafe {
            // Choice text is owned by the iterator, not freed here.
            let raw = sys::TessChoiceIteratorGetUTF8Text(self.iter);
            if raw.is_null() {
                return None;
            }
            let text = CStr::from_ptr(raw).to_string_lossy().into_owned();
            let confidence = sys::TessChoiceIteratorConfidence(self.iter);
            Some(Choice { text, confidence })
        }
    }
}

impl Drop for ChoiceIter<'_> {
    fn drop(&mut self) {
        if !self.iter.is_null() {
            unsafe { sys::TessChoiceIteratorDelete(self.iter) };
        }
    }
}
