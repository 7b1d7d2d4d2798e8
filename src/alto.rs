//! ALTO-inspired glyph serialization
//!
//! Drains a [`SymbolCursor`] exactly once and emits one `TextBlock` of
//! `String` (word) / `Glyph` (symbol) / `Variant` (alternative reading)
//! elements. The engine only offers a flat "next symbol" cursor with
//! word-boundary predicates, so the nesting is reconstructed by a small
//! state machine: at most one `String` is ever open, and it closes either
//! when the next word begins or when the cursor is exhausted.
//!
//! Two historical output shapes exist and both are kept selectable through
//! [`Policy`] rather than unified; see the constructor docs.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;
use tracing::debug;

use crate::engine::{Choice, SymbolCursor};

/// Comment block emitted at the top of every document.
const ALTO_COMMENT: &str = "Simple layout based on ALTO, see: https://www.loc.gov/standards/alto/\n\
                            see also Glyph discussion: https://github.com/altoxml/schema/issues/26";

/// Serialization failures.
#[derive(Debug, Error)]
pub enum AltoError {
    /// The output file could not be created. Callers treat this as a
    /// degraded run, not a failed one: they log it and still exit 0.
    #[error("error creating the xml sink at {}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to an already-open sink failed.
    #[error("error writing xml")]
    Write(#[from] io::Error),
}

/// Output-shape policy for the glyph walk.
///
/// The two constructors reproduce the two historical variants of this
/// serializer. Their inconsistencies (notably whether the best reading is
/// duplicated into the `Variant` list) are deliberate and kept selectable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Attach word text, confidence, and font attributes to each `String`.
    pub word_metadata: bool,
    /// Fold the best reading into the `Variant` list instead of writing it
    /// as `CONTENT`/`GC` attributes on the `Glyph` itself.
    pub fold_primary_choice: bool,
    /// Optional `ID` attribute for the root `TextBlock`.
    pub block_id: Option<String>,
}

impl Policy {
    /// Rich output: word metadata on every `String`, best reading as
    /// `Glyph` attributes, alternatives only as `Variant` children.
    pub fn detailed() -> Self {
        Self {
            word_metadata: true,
            fold_primary_choice: false,
            block_id: None,
        }
    }

    /// Bare output: geometry-only `Glyph` elements under an `ID="A1"`
    /// block, every reading (best included) as a `Variant` child.
    pub fn minimal() -> Self {
        Self {
            word_metadata: false,
            fold_primary_choice: true,
            block_id: Some("A1".to_string()),
        }
    }
}

/// Serialize the cursor into a freshly created file at `path`.
pub fn write_glyph_xml<C: SymbolCursor + ?Sized>(
    path: &Path,
    cursor: &mut C,
    policy: &Policy,
) -> Result<(), AltoError> {
    let file = File::create(path).map_err(|source| AltoError::Sink {
        path: path.to_owned(),
        source,
    })?;
    serialize_into(BufWriter::new(file), cursor, policy)
}

/// Serialize the cursor into any sink. Drains the cursor; it must not be
/// reused afterwards.
pub fn serialize_into<W: Write, C: SymbolCursor + ?Sized>(
    sink: W,
    cursor: &mut C,
    policy: &Policy,
) -> Result<(), AltoError> {
    let mut writer = Writer::new_with_indent(sink, b' ', 1);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Comment(BytesText::new(ALTO_COMMENT)))?;

    let mut block = BytesStart::new("TextBlock");
    if let Some(id) = &policy.block_id {
        block.push_attribute(("ID", id.as_str()));
    }
    writer.write_event(Event::Start(block))?;

    // Invariant: at most one String open at any point of the walk.
    let mut in_word = false;
    loop {
        let symbol = cursor.symbol_text().filter(|s| !s.is_empty());

        if symbol.is_some() && cursor.at_word_start() {
            if in_word {
                writer.write_event(Event::End(BytesEnd::new("String")))?;
            }
            writer.write_event(Event::Start(string_element(&*cursor, policy)))?;
            in_word = true;
        }

        if let Some(symbol) = &symbol {
            write_glyph(&mut writer, &*cursor, policy, symbol)?;
        }

        if !cursor.advance() {
            break;
        }
    }

    if in_word {
        writer.write_event(Event::End(BytesEnd::new("String")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("TextBlock")))?;
    writer.into_inner().flush()?;
    Ok(())
}

/// Open a `String` element for the word under the cursor.
fn string_element<C: SymbolCursor + ?Sized>(cursor: &C, policy: &Policy) -> BytesStart<'static> {
    let mut element = BytesStart::new("String");
    if !policy.word_metadata {
        return element;
    }

    let word = cursor.word();
    debug!(
        word = %word.text,
        confidence = word.confidence,
        left = word.bounds.left,
        top = word.bounds.top,
        right = word.bounds.right,
        bottom = word.bounds.bottom,
        font = word.font.name.as_deref().unwrap_or("no font detected"),
        point_size = word.font.point_size,
        font_id = word.font.font_id,
        "word boundary"
    );

    element.push_attribute(("CONTENT", word.text.as_str()));
    element.push_attribute(("WC", confidence(word.confidence).as_str()));
    element.push_attribute(("BOLD", flag(word.font.bold)));
    element.push_attribute(("ITALIC", flag(word.font.italic)));
    element.push_attribute(("UNDERLINED", flag(word.font.underlined)));
    element.push_attribute(("MONOSPACE", flag(word.font.monospace)));
    element.push_attribute(("SERIF", flag(word.font.serif)));
    element.push_attribute(("SMALLCAPS", flag(word.font.smallcaps)));
    element.push_attribute(("POINTSIZE", word.font.point_size.to_string().as_str()));
    // No FONT attribute at all when the engine reported no font name.
    if let Some(name) = &word.font.name {
        element.push_attribute(("FONT", name.as_str()));
    }
    element
}

/// Emit one `Glyph` with its `Variant` children, in engine order.
fn write_glyph<W: Write, C: SymbolCursor + ?Sized>(
    writer: &mut Writer<W>,
    cursor: &C,
    policy: &Policy,
    symbol: &str,
) -> Result<(), AltoError> {
    let bounds = cursor.symbol_bounds();
    let mut choices = cursor.choices();
    let first = choices.next();

    let mut glyph = BytesStart::new("Glyph");
    if !policy.fold_primary_choice {
        // The symbol text itself only stands in when the engine reports no
        // choices at all.
        let content = first.as_ref().map_or(symbol, |c| c.text.as_str());
        glyph.push_attribute(("CONTENT", content));
    }
    glyph.push_attribute(("HPOS", bounds.left.to_string().as_str()));
    glyph.push_attribute(("VPOS", bounds.top.to_string().as_str()));
    glyph.push_attribute(("WIDTH", bounds.width().to_string().as_str()));
    glyph.push_attribute(("HEIGHT", bounds.height().to_string().as_str()));
    if !policy.fold_primary_choice {
        if let Some(first) = &first {
            glyph.push_attribute(("GC", confidence(first.confidence).as_str()));
        }
    }
    writer.write_event(Event::Start(glyph))?;

    if policy.fold_primary_choice {
        if let Some(first) = &first {
            write_variant(writer, first)?;
        }
    }
    for alternative in choices {
        write_variant(writer, &alternative)?;
    }

    writer.write_event(Event::End(BytesEnd::new("Glyph")))?;
    Ok(())
}

fn write_variant<W: Write>(writer: &mut Writer<W>, choice: &Choice) -> Result<(), AltoError> {
    let mut element = BytesStart::new("Variant");
    element.push_attribute(("VC", confidence(choice.confidence).as_str()));
    writer.write_event(Event::Start(element))?;
    writer.write_event(Event::Text(BytesText::new(&choice.text)))?;
    writer.write_event(Event::End(BytesEnd::new("Variant")))?;
    Ok(())
}

/// Confidences always render with exactly 6 fractional digits.
fn confidence(value: f32) -> String {
    format!("{value:.6}")
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
