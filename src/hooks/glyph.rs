use resvg::tiny_skia::{PixmapMut, Transform};
use resvg::usvg;

use super::document::{GlyphKey, SvgDocument};
use super::layout::{map_bounds, output_transform, GlyphLayout};
use super::HookError;

/// A parsed glyph document, placed and ready to paint.
pub struct PreparedGlyph {
    key: GlyphKey,
    tree: usvg::Tree,
    transform: Transform,
    layout: GlyphLayout,
}

impl PreparedGlyph {
    pub fn prepare(document: &SvgDocument<'_>) -> Result<Self, HookError> {
        let source = document.source()?;
        let tree = usvg::Tree::from_str(&source, &usvg::Options::default())?;
        let viewport = document.viewport_size(&source, tree.size())?;
        let transform = output_transform(
            &document.transform,
            viewport,
            document.x_ppem,
            document.y_ppem,
        );
        let root = tree.root();
        let layout = if root.has_children() {
            GlyphLayout::from_ink(map_bounds(&transform, &root.abs_stroke_bounding_box()))?
        } else {
            GlyphLayout::default()
        };
        log::trace!(
            "prepared SVG glyph {} at {}x{} ppem: {:?}",
            document.glyph_index,
            document.x_ppem,
            document.y_ppem,
            layout
        );
        Ok(Self {
            key: document.key(),
            tree,
            transform,
            layout,
        })
    }

    pub fn key(&self) -> &GlyphKey {
        &self.key
    }

    pub fn layout(&self) -> GlyphLayout {
        self.layout
    }

    /// Paints into a premultiplied BGRA buffer of exactly `layout().byte_len()` bytes.
    pub fn paint(&self, buffer: &mut [u8]) -> Result<(), HookError> {
        if self.layout.is_empty() {
            return Ok(());
        }
        if Some(buffer.len()) != self.layout.byte_len() {
            return Err(HookError::BufferMismatch);
        }
        buffer.fill(0);
        {
            let mut pixmap =
                PixmapMut::from_bytes(buffer, self.layout.width, self.layout.rows)
                    .ok_or(HookError::BufferMismatch)?;
            let origin = Transform::from_translate(
                -self.layout.left as f32,
                -self.layout.top as f32,
            );
            resvg::render(&self.tree, origin.pre_concat(self.transform), &mut pixmap);
        }
        swap_red_blue(buffer);
        Ok(())
    }
}

/// Converts RGBA pixels to BGRA in place, and back.
pub(crate) fn swap_red_blue(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }
}
