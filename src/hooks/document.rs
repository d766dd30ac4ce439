use std::borrow::Cow;
use std::ops::Range;

use resvg::usvg;

use super::layout::GlyphTransform;
use super::HookError;
use crate::ffi::{FT_GlyphSlotRec, FT_SVG_DocumentRec};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// The SVG document FreeType attached to a glyph slot.
#[derive(Debug, Clone, Copy)]
pub struct SvgDocument<'a> {
    pub data: &'a [u8],
    pub units_per_em: u16,
    pub x_ppem: u16,
    pub y_ppem: u16,
    pub start_glyph_id: u16,
    pub end_glyph_id: u16,
    pub glyph_index: u32,
    pub transform: GlyphTransform,
}

/// Identifies what a prepared glyph was prepared from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphKey {
    document: usize,
    glyph_index: u32,
    x_ppem: u16,
    y_ppem: u16,
    transform: GlyphTransform,
}

impl<'a> SvgDocument<'a> {
    /// Reads the document record from `slot.other`.
    ///
    /// # Safety
    ///
    /// `slot` must be a glyph slot FreeType passed to an SVG hook, so that
    /// `other` is null or points to a live `FT_SVG_DocumentRec`.
    pub unsafe fn from_slot(slot: &'a FT_GlyphSlotRec) -> Result<Self, HookError> {
        let record = (slot.other as *const FT_SVG_DocumentRec)
            .as_ref()
            .ok_or(HookError::MissingDocument)?;
        if record.svg_document.is_null() || record.svg_document_length == 0 {
            return Err(HookError::InvalidDocument("empty document".into()));
        }
        let data =
            std::slice::from_raw_parts(record.svg_document, record.svg_document_length as usize);
        Ok(Self {
            data,
            units_per_em: record.units_per_EM,
            x_ppem: record.metrics.x_ppem,
            y_ppem: record.metrics.y_ppem,
            start_glyph_id: record.start_glyph_id,
            end_glyph_id: record.end_glyph_id,
            glyph_index: slot.glyph_index,
            transform: GlyphTransform::from_fixed(&record.transform, &record.delta),
        })
    }

    /// Whether the document holds more than one glyph.
    pub fn is_shared(&self) -> bool {
        self.start_glyph_id != self.end_glyph_id
    }

    pub fn key(&self) -> GlyphKey {
        GlyphKey {
            document: self.data.as_ptr() as usize,
            glyph_index: self.glyph_index,
            x_ppem: self.x_ppem,
            y_ppem: self.y_ppem,
            transform: self.transform,
        }
    }

    /// The SVG source of the slot's glyph, decompressed and, for shared
    /// documents, with every other glyph moved out of the render tree.
    pub fn source(&self) -> Result<Cow<'a, str>, HookError> {
        let text = if self.data.starts_with(&GZIP_MAGIC) {
            let bytes = usvg::decompress_svgz(self.data)?;
            Cow::Owned(String::from_utf8(bytes).map_err(|_| not_utf8())?)
        } else {
            Cow::Borrowed(std::str::from_utf8(self.data).map_err(|_| not_utf8())?)
        };
        if !self.is_shared() {
            return Ok(text);
        }
        let isolated = match isolate_glyph(&text, self.glyph_index)? {
            Cow::Borrowed(_) => None,
            Cow::Owned(isolated) => Some(isolated),
        };
        Ok(isolated.map_or(text, Cow::Owned))
    }

    /// The size of the SVG viewport the em square maps onto.
    ///
    /// A root `<svg>` without a `viewBox` and without an absolute width or
    /// height takes `units_per_em` on that axis; otherwise the parsed size
    /// stands.
    pub fn viewport_size(
        &self,
        text: &str,
        parsed: usvg::Size,
    ) -> Result<usvg::Size, HookError> {
        let document = roxmltree::Document::parse_with_options(text, parsing_options())?;
        let root = document.root_element();
        if root.has_attribute("viewBox") {
            return Ok(parsed);
        }
        let is_unsized = |name: &str| {
            root.attribute(name)
                .map(str::trim)
                .map_or(true, |value| value.is_empty() || value.ends_with('%'))
        };
        let em = f32::from(self.units_per_em.max(1));
        let width = if is_unsized("width") { em } else { parsed.width() };
        let height = if is_unsized("height") { em } else { parsed.height() };
        usvg::Size::from_wh(width, height)
            .ok_or_else(|| HookError::InvalidDocument("empty viewport".into()))
    }
}

fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    }
}

fn not_utf8() -> HookError {
    HookError::InvalidDocument("document is not UTF-8".into())
}

fn is_glyph_id(id: &str) -> bool {
    id.strip_prefix("glyph")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Wraps every `glyph<N>` element other than `glyph<glyph_id>` in `<defs>`.
///
/// Hidden glyphs stay addressable by `<use>` but are no longer painted.
pub fn isolate_glyph(text: &str, glyph_id: u32) -> Result<Cow<'_, str>, HookError> {
    let document = roxmltree::Document::parse_with_options(text, parsing_options())?;
    let target_id = format!("glyph{glyph_id}");
    let target = document
        .descendants()
        .find(|node| node.attribute("id") == Some(target_id.as_str()))
        .ok_or(HookError::GlyphNotFound(glyph_id))?;

    let mut hidden: Vec<Range<usize>> = Vec::new();
    for node in document.descendants().filter(|node| node.is_element()) {
        if node == target || !node.attribute("id").is_some_and(is_glyph_id) {
            continue;
        }
        let range = node.range();
        if hidden.last().is_some_and(|last| last.contains(&range.start)) {
            continue;
        }
        // ancestors() starts at the node itself
        let wraps_target = target.ancestors().any(|a| a == node);
        let inside_target = node.ancestors().any(|a| a == target);
        let in_defs = node.ancestors().any(|a| a.has_tag_name("defs"));
        if !(wraps_target || inside_target || in_defs) {
            hidden.push(range);
        }
    }

    if hidden.is_empty() {
        return Ok(Cow::Borrowed(text));
    }
    let mut isolated = String::with_capacity(text.len() + hidden.len() * "<defs></defs>".len());
    let mut cursor = 0;
    for range in hidden {
        isolated.push_str(&text[cursor..range.start]);
        isolated.push_str("<defs>");
        isolated.push_str(&text[range.clone()]);
        isolated.push_str("</defs>");
        cursor = range.end;
    }
    isolated.push_str(&text[cursor..]);
    Ok(Cow::Owned(isolated))
}
