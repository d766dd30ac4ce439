use resvg::tiny_skia::Transform;
use resvg::usvg;

use super::HookError;
use crate::ffi::{FT_Glyph_Metrics, FT_Matrix, FT_Pos, FT_Vector};

/// The font-side transform FreeType applies to a glyph, in y-up space.
///
/// `dx`/`dy` are in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphTransform {
    pub xx: f32,
    pub xy: f32,
    pub yx: f32,
    pub yy: f32,
    pub dx: f32,
    pub dy: f32,
}

impl GlyphTransform {
    pub const IDENTITY: Self = Self {
        xx: 1.0,
        xy: 0.0,
        yx: 0.0,
        yy: 1.0,
        dx: 0.0,
        dy: 0.0,
    };

    /// Converts a 16.16 matrix and a 26.6 delta.
    pub fn from_fixed(matrix: &FT_Matrix, delta: &FT_Vector) -> Self {
        const FIXED_ONE: f32 = 65536.0;
        Self {
            xx: matrix.xx as f32 / FIXED_ONE,
            xy: matrix.xy as f32 / FIXED_ONE,
            yx: matrix.yx as f32 / FIXED_ONE,
            yy: matrix.yy as f32 / FIXED_ONE,
            dx: delta.x as f32 / 64.0,
            dy: delta.y as f32 / 64.0,
        }
    }
}

/// Maps SVG user space (y-down, `svg_size` wide) to output pixels.
///
/// The glyph transform is applied in SVG units first, with its y axis
/// flipped, then the document is scaled to the requested ppem.
pub fn output_transform(
    glyph: &GlyphTransform,
    svg_size: usvg::Size,
    x_ppem: u16,
    y_ppem: u16,
) -> Transform {
    let x_scale = f32::from(x_ppem) / svg_size.width();
    let y_scale = f32::from(y_ppem) / svg_size.height();
    let font = Transform::from_row(
        glyph.xx,
        -glyph.yx,
        -glyph.xy,
        glyph.yy,
        glyph.dx / x_scale,
        -glyph.dy / y_scale,
    );
    Transform::from_scale(x_scale, y_scale).pre_concat(font)
}

/// Axis-aligned bounds of `rect` after `transform`, as (left, top, right, bottom).
pub fn map_bounds(transform: &Transform, rect: &usvg::Rect) -> (f32, f32, f32, f32) {
    let corners = [
        (rect.left(), rect.top()),
        (rect.right(), rect.top()),
        (rect.left(), rect.bottom()),
        (rect.right(), rect.bottom()),
    ];
    let mut bounds = (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
    for (x, y) in corners {
        let mx = transform.sx * x + transform.kx * y + transform.tx;
        let my = transform.ky * x + transform.sy * y + transform.ty;
        bounds.0 = bounds.0.min(mx);
        bounds.1 = bounds.1.min(my);
        bounds.2 = bounds.2.max(mx);
        bounds.3 = bounds.3.max(my);
    }
    bounds
}

/// Pixel placement of a rendered glyph, relative to the pen position.
///
/// `top` grows downwards, so ink above the baseline has a negative `top`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphLayout {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub rows: u32,
}

impl GlyphLayout {
    /// Snaps ink bounds outwards to whole pixels.
    ///
    /// Ink too large for a FreeType bitmap is an invalid document.
    pub fn from_ink(bounds: (f32, f32, f32, f32)) -> Result<Self, HookError> {
        let (x0, y0, x1, y1) = bounds;
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) || x1 <= x0 || y1 <= y0 {
            return Ok(Self::default());
        }
        let too_large =
            || HookError::InvalidDocument(format!("glyph ink {bounds:?} is too large"));
        // f32 rounds i32::MAX up to 2^31
        if [x0, y0, x1, y1].iter().any(|v| v.abs() >= i32::MAX as f32) {
            return Err(too_large());
        }
        let left = x0.floor() as i32;
        let top = y0.floor() as i32;
        let width = i64::from(x1.ceil() as i32) - i64::from(left);
        let rows = i64::from(y1.ceil() as i32) - i64::from(top);
        let layout = Self {
            left,
            top,
            width: u32::try_from(width).map_err(|_| too_large())?,
            rows: u32::try_from(rows).map_err(|_| too_large())?,
        };
        if layout.byte_len().is_none() {
            return Err(too_large());
        }
        Ok(layout)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.rows == 0
    }

    /// Bytes per BGRA row, if it fits FreeType's `int` pitch.
    pub fn pitch(&self) -> Option<i32> {
        i32::try_from(self.width).ok()?.checked_mul(4)
    }

    /// `pitch * rows`, the size FreeType allocates for the bitmap.
    ///
    /// Capped at `i32::MAX` since `FT_Long` is 32 bits on some targets.
    pub fn byte_len(&self) -> Option<usize> {
        let len = self.pitch()?.checked_mul(i32::try_from(self.rows).ok()?)?;
        usize::try_from(len).ok()
    }

    pub fn bitmap_top(&self) -> i32 {
        -self.top
    }

    /// Fills the bitmap-derived metrics, keeping FreeType's advances.
    pub fn apply_metrics(&self, metrics: &mut FT_Glyph_Metrics) {
        metrics.width = FT_Pos::from(self.width) * 64;
        metrics.height = FT_Pos::from(self.rows) * 64;
        metrics.horiBearingX = FT_Pos::from(self.left) * 64;
        metrics.horiBearingY = FT_Pos::from(self.bitmap_top()) * 64;
        metrics.vertBearingX = -metrics.width / 2;
        metrics.vertBearingY = (metrics.vertAdvance - metrics.height) / 2;
        if metrics.vertAdvance == 0 {
            metrics.vertAdvance = (metrics.height as f32 * 1.2) as FT_Pos;
        }
    }
}
