//! FreeType OT-SVG renderer hooks backed by resvg.
//!
//! FreeType calls `preset_slot` to size a glyph (from `FT_Load_Glyph`, and
//! again with `cache` set right before rendering), allocates the bitmap, then
//! calls `render_svg` to fill it.

mod document;
mod glyph;
mod layout;

use std::panic::{self, AssertUnwindSafe};
use std::ptr;

pub use document::{isolate_glyph, GlyphKey, SvgDocument};
pub use glyph::PreparedGlyph;
pub(crate) use glyph::swap_red_blue;
pub use layout::{GlyphLayout, GlyphTransform};

use crate::ffi::{
    self, FT_Bool, FT_Error, FT_GlyphSlot, FT_GlyphSlotRec, FT_Pointer, SVG_RendererHooks,
};


/// The hook table installed by [`crate::bind_svg_hooks`].
pub static SVG_HOOKS: SVG_RendererHooks = SVG_RendererHooks {
    init_svg: Some(init_svg),
    free_svg: Some(free_svg),
    render_svg: Some(render_svg),
    preset_slot: Some(preset_slot),
};

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("glyph slot carries no SVG document")]
    MissingDocument,
    #[error("invalid SVG document: {0}")]
    InvalidDocument(String),
    #[error("failed to parse SVG document: {0}")]
    Parse(#[from] resvg::usvg::Error),
    #[error("malformed SVG document: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("no element with id \"glyph{0}\" in the SVG document")]
    GlyphNotFound(u32),
    #[error("bitmap does not match the preset glyph layout")]
    BufferMismatch,
    #[error("null glyph slot or hook state")]
    NullPointer,
    #[error("SVG hook panicked")]
    Panicked,
}

impl HookError {
    /// The FreeType error code reported back to FreeType.
    pub fn code(&self) -> FT_Error {
        match self {
            HookError::NullPointer | HookError::BufferMismatch => ffi::FT_Err_Invalid_Argument,
            HookError::MissingDocument
            | HookError::InvalidDocument(_)
            | HookError::Parse(_)
            | HookError::Xml(_)
            | HookError::GlyphNotFound(_)
            | HookError::Panicked => ffi::FT_Err_Invalid_SVG_Document,
        }
    }
}

/// Per-library state behind FreeType's `svg_renderer->state`.
#[derive(Default)]
pub struct HookState {
    cached: Option<PreparedGlyph>,
}

impl HookState {
    pub fn store(&mut self, glyph: PreparedGlyph) {
        self.cached = Some(glyph);
    }

    /// Takes the cached glyph if it was prepared for `key`.
    pub fn take_matching(&mut self, key: &GlyphKey) -> Option<PreparedGlyph> {
        match self.cached.take() {
            Some(glyph) if glyph.key() == key => Some(glyph),
            _ => None,
        }
    }
}

fn guard(hook: &'static str, f: impl FnOnce() -> Result<(), HookError>) -> FT_Error {
    let result = panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or(Err(HookError::Panicked));
    match result {
        Ok(()) => ffi::FT_Err_Ok,
        Err(e) => {
            log::warn!("{hook}: {e}");
            e.code()
        }
    }
}

unsafe fn hook_state<'a>(state: *mut FT_Pointer) -> Result<&'a mut HookState, HookError> {
    if state.is_null() {
        return Err(HookError::NullPointer);
    }
    ((*state) as *mut HookState)
        .as_mut()
        .ok_or(HookError::NullPointer)
}

unsafe extern "C" fn init_svg(data_pointer: *mut FT_Pointer) -> FT_Error {
    guard("init_svg", || {
        if data_pointer.is_null() {
            return Err(HookError::NullPointer);
        }
        let state = Box::new(HookState::default());
        unsafe { *data_pointer = Box::into_raw(state).cast() };
        log::debug!("SVG hook state initialized");
        Ok(())
    })
}

unsafe extern "C" fn free_svg(data_pointer: *mut FT_Pointer) {
    if data_pointer.is_null() || (*data_pointer).is_null() {
        return;
    }
    drop(Box::from_raw((*data_pointer).cast::<HookState>()));
    *data_pointer = ptr::null_mut();
    log::debug!("SVG hook state released");
}

unsafe extern "C" fn preset_slot(
    slot: FT_GlyphSlot,
    cache: FT_Bool,
    state: *mut FT_Pointer,
) -> FT_Error {
    guard("preset_slot", || {
        let slot = unsafe { slot.as_mut() }.ok_or(HookError::NullPointer)?;
        let glyph = PreparedGlyph::prepare(&unsafe { SvgDocument::from_slot(slot) }?)?;
        write_layout(slot, glyph.layout())?;
        if cache != 0 {
            unsafe { hook_state(state) }?.store(glyph);
        }
        Ok(())
    })
}

unsafe extern "C" fn render_svg(slot: FT_GlyphSlot, data_pointer: *mut FT_Pointer) -> FT_Error {
    guard("render_svg", || {
        let slot = unsafe { slot.as_mut() }.ok_or(HookError::NullPointer)?;
        let state = unsafe { hook_state(data_pointer) }?;
        let document = unsafe { SvgDocument::from_slot(slot) }?;
        let glyph = match state.take_matching(&document.key()) {
            Some(glyph) => glyph,
            None => PreparedGlyph::prepare(&document)?,
        };
        let layout = glyph.layout();
        let byte_len = layout.byte_len().ok_or(HookError::BufferMismatch)?;
        let bitmap = &mut slot.bitmap;
        if bitmap.width != layout.width
            || bitmap.rows != layout.rows
            || Some(bitmap.pitch) != layout.pitch()
        {
            return Err(HookError::BufferMismatch);
        }
        if !layout.is_empty() {
            if bitmap.buffer.is_null() {
                return Err(HookError::BufferMismatch);
            }
            let buffer = unsafe { std::slice::from_raw_parts_mut(bitmap.buffer, byte_len) };
            glyph.paint(buffer)?;
        }
        bitmap.pixel_mode = ffi::FT_PIXEL_MODE_BGRA;
        bitmap.num_grays = 256;
        slot.format = ffi::FT_GLYPH_FORMAT_BITMAP;
        Ok(())
    })
}

fn write_layout(slot: &mut FT_GlyphSlotRec, layout: GlyphLayout) -> Result<(), HookError> {
    let pitch = layout
        .pitch()
        .filter(|_| layout.byte_len().is_some())
        .ok_or_else(|| HookError::InvalidDocument("glyph bitmap is too large".into()))?;
    slot.bitmap.rows = layout.rows;
    slot.bitmap.width = layout.width;
    slot.bitmap.pitch = pitch;
    slot.bitmap.pixel_mode = ffi::FT_PIXEL_MODE_BGRA;
    slot.bitmap.num_grays = 256;
    slot.bitmap_left = layout.left;
    slot.bitmap_top = layout.bitmap_top();
    layout.apply_metrics(&mut slot.metrics);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::{FT_Matrix, FT_SVG_DocumentRec};

    const DOT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle cx="50" cy="-50" r="50"/></svg>"#;

    fn document(glyph_index: u32) -> SvgDocument<'static> {
        SvgDocument {
            data: DOT.as_bytes(),
            units_per_em: 100,
            x_ppem: 20,
            y_ppem: 20,
            start_glyph_id: 0,
            end_glyph_id: 0,
            glyph_index,
            transform: GlyphTransform::IDENTITY,
        }
    }

    /// A glyph slot carrying `DOT` the way FreeType hands it to the hooks.
    struct SvgSlot {
        record: Box<FT_SVG_DocumentRec>,
        slot: Box<FT_GlyphSlotRec>,
        buffer: Vec<u8>,
    }

    impl SvgSlot {
        fn new(glyph_index: u32) -> Self {
            let mut record: Box<FT_SVG_DocumentRec> = Box::new(unsafe { std::mem::zeroed() });
            record.svg_document = DOT.as_ptr().cast_mut();
            record.svg_document_length = DOT.len() as ffi::FT_ULong;
            record.units_per_EM = 100;
            record.metrics.x_ppem = 20;
            record.metrics.y_ppem = 20;
            record.start_glyph_id = glyph_index as u16;
            record.end_glyph_id = glyph_index as u16;
            record.transform = FT_Matrix {
                xx: 0x10000,
                xy: 0,
                yx: 0,
                yy: 0x10000,
            };
            let mut slot: Box<FT_GlyphSlotRec> = Box::new(unsafe { std::mem::zeroed() });
            slot.glyph_index = glyph_index;
            slot.format = ffi::FT_GLYPH_FORMAT_SVG;
            slot.other = (&mut *record as *mut FT_SVG_DocumentRec).cast();
            Self {
                record,
                slot,
                buffer: Vec::new(),
            }
        }

        fn as_ptr(&mut self) -> FT_GlyphSlot {
            &mut *self.slot
        }

        // FreeType allocates pitch * rows zeroed bytes between the two hooks
        fn allocate(&mut self) {
            let bitmap = &mut self.slot.bitmap;
            self.buffer = vec![0; bitmap.pitch as usize * bitmap.rows as usize];
            bitmap.buffer = self.buffer.as_mut_ptr();
        }

        fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
            let offset = y * self.slot.bitmap.pitch as usize + x * 4;
            self.buffer[offset..offset + 4].try_into().unwrap()
        }
    }

    fn cached(state: &mut FT_Pointer) -> bool {
        unsafe { hook_state(state) }.unwrap().cached.is_some()
    }

    #[test]
    fn test_preset_writes_layout_and_metrics() {
        let mut state: FT_Pointer = ptr::null_mut();
        unsafe { init_svg(&mut state) };
        let mut glyph = SvgSlot::new(5);

        let status = unsafe { preset_slot(glyph.as_ptr(), 0, &mut state) };
        assert_eq!(status, ffi::FT_Err_Ok);

        let slot = &glyph.slot;
        assert_eq!((slot.bitmap.width, slot.bitmap.rows), (20, 20));
        assert_eq!(slot.bitmap.pitch, 80);
        assert_eq!(slot.bitmap.pixel_mode, ffi::FT_PIXEL_MODE_BGRA);
        assert_eq!(slot.bitmap.num_grays, 256);
        assert_eq!((slot.bitmap_left, slot.bitmap_top), (0, 20));
        assert_eq!((slot.metrics.width, slot.metrics.height), (1280, 1280));
        assert_eq!(slot.metrics.horiBearingX, 0);
        assert_eq!(slot.metrics.horiBearingY, 1280);
        assert_eq!(slot.metrics.vertBearingX, -640);
        assert_eq!(slot.metrics.vertAdvance, 1536);
        // still SVG until rendered
        assert_eq!(slot.format, ffi::FT_GLYPH_FORMAT_SVG);
        assert!(!cached(&mut state));

        unsafe { free_svg(&mut state) };
    }

    #[test]
    fn test_preset_then_render_paints_bitmap() {
        let mut state: FT_Pointer = ptr::null_mut();
        unsafe { init_svg(&mut state) };
        let mut glyph = SvgSlot::new(5);

        assert_eq!(unsafe { preset_slot(glyph.as_ptr(), 1, &mut state) }, 0);
        assert!(cached(&mut state));
        glyph.allocate();
        assert_eq!(unsafe { render_svg(glyph.as_ptr(), &mut state) }, 0);
        assert!(!cached(&mut state));

        assert_eq!(glyph.slot.format, ffi::FT_GLYPH_FORMAT_BITMAP);
        assert_eq!(glyph.slot.bitmap.pixel_mode, ffi::FT_PIXEL_MODE_BGRA);
        assert_eq!(glyph.pixel(10, 10), [0, 0, 0, 255]);
        assert_eq!(glyph.pixel(0, 0), [0, 0, 0, 0]);

        unsafe { free_svg(&mut state) };
    }

    #[test]
    fn test_render_prepares_uncached_glyph() {
        let mut state: FT_Pointer = ptr::null_mut();
        unsafe { init_svg(&mut state) };
        let mut glyph = SvgSlot::new(5);

        assert_eq!(unsafe { preset_slot(glyph.as_ptr(), 0, &mut state) }, 0);
        glyph.allocate();
        assert_eq!(unsafe { render_svg(glyph.as_ptr(), &mut state) }, 0);
        assert_eq!(glyph.pixel(10, 10), [0, 0, 0, 255]);

        unsafe { free_svg(&mut state) };
    }

    #[test]
    fn test_render_ignores_glyph_cached_at_other_size() {
        let mut state: FT_Pointer = ptr::null_mut();
        unsafe { init_svg(&mut state) };
        let mut glyph = SvgSlot::new(5);

        assert_eq!(unsafe { preset_slot(glyph.as_ptr(), 1, &mut state) }, 0);
        glyph.record.metrics.x_ppem = 40;
        glyph.record.metrics.y_ppem = 40;
        assert_eq!(unsafe { preset_slot(glyph.as_ptr(), 0, &mut state) }, 0);
        glyph.allocate();
        assert_eq!(unsafe { render_svg(glyph.as_ptr(), &mut state) }, 0);
        assert_eq!((glyph.slot.bitmap.width, glyph.slot.bitmap.rows), (40, 40));
        assert_eq!(glyph.pixel(20, 20), [0, 0, 0, 255]);

        unsafe { free_svg(&mut state) };
    }

    #[test]
    fn test_render_rejects_mismatched_bitmap() {
        let mut state: FT_Pointer = ptr::null_mut();
        unsafe { init_svg(&mut state) };
        let mut glyph = SvgSlot::new(5);

        assert_eq!(unsafe { preset_slot(glyph.as_ptr(), 1, &mut state) }, 0);
        glyph.allocate();
        glyph.slot.bitmap.width = 10;
        let status = unsafe { render_svg(glyph.as_ptr(), &mut state) };
        assert_eq!(status, ffi::FT_Err_Invalid_Argument);
        assert_eq!(glyph.slot.format, ffi::FT_GLYPH_FORMAT_SVG);
        assert!(glyph.buffer.iter().all(|&b| b == 0));

        unsafe { free_svg(&mut state) };
    }

    #[test]
    fn test_render_rejects_missing_buffer() {
        let mut state: FT_Pointer = ptr::null_mut();
        unsafe { init_svg(&mut state) };
        let mut glyph = SvgSlot::new(5);

        assert_eq!(unsafe { preset_slot(glyph.as_ptr(), 1, &mut state) }, 0);
        let status = unsafe { render_svg(glyph.as_ptr(), &mut state) };
        assert_eq!(status, ffi::FT_Err_Invalid_Argument);

        unsafe { free_svg(&mut state) };
    }

    #[test]
    fn test_slot_without_document_is_invalid() {
        let mut state: FT_Pointer = ptr::null_mut();
        unsafe { init_svg(&mut state) };
        let mut glyph = SvgSlot::new(5);
        glyph.slot.other = ptr::null_mut();

        let status = unsafe { preset_slot(glyph.as_ptr(), 1, &mut state) };
        assert_eq!(status, ffi::FT_Err_Invalid_SVG_Document);

        unsafe { free_svg(&mut state) };
    }

    #[test]
    fn test_table_is_complete() {
        assert!(SVG_HOOKS.init_svg.is_some());
        assert!(SVG_HOOKS.free_svg.is_some());
        assert!(SVG_HOOKS.render_svg.is_some());
        assert!(SVG_HOOKS.preset_slot.is_some());
    }

    #[test]
    fn test_init_and_free_state() {
        let mut state: FT_Pointer = ptr::null_mut();
        let status = unsafe { init_svg(&mut state) };
        assert_eq!(status, ffi::FT_Err_Ok);
        assert!(!state.is_null());
        unsafe { free_svg(&mut state) };
        assert!(state.is_null());
        // freeing twice is a no-op
        unsafe { free_svg(&mut state) };
        unsafe { free_svg(ptr::null_mut()) };
    }

    #[test]
    fn test_init_rejects_null() {
        let status = unsafe { init_svg(ptr::null_mut()) };
        assert_eq!(status, ffi::FT_Err_Invalid_Argument);
    }

    #[test]
    fn test_hooks_reject_null_slot() {
        let mut state: FT_Pointer = ptr::null_mut();
        unsafe { init_svg(&mut state) };
        let preset = unsafe { preset_slot(ptr::null_mut(), 1, &mut state) };
        let render = unsafe { render_svg(ptr::null_mut(), &mut state) };
        assert_eq!(preset, ffi::FT_Err_Invalid_Argument);
        assert_eq!(render, ffi::FT_Err_Invalid_Argument);
        unsafe { free_svg(&mut state) };
    }

    #[test]
    fn test_state_reuses_matching_glyph() {
        let mut state = HookState::default();
        let doc = document(3);
        state.store(PreparedGlyph::prepare(&doc).unwrap());
        assert!(state.take_matching(&doc.key()).is_some());
        assert!(state.take_matching(&doc.key()).is_none());
    }

    #[test]
    fn test_state_drops_stale_glyph() {
        let mut state = HookState::default();
        state.store(PreparedGlyph::prepare(&document(3)).unwrap());
        assert!(state.take_matching(&document(4).key()).is_none());
        assert!(state.take_matching(&document(3).key()).is_none());
    }

    #[test]
    fn test_guard_maps_errors_and_panics() {
        assert_eq!(guard("test", || Ok(())), ffi::FT_Err_Ok);
        assert_eq!(
            guard("test", || Err(HookError::GlyphNotFound(1))),
            ffi::FT_Err_Invalid_SVG_Document
        );
        assert_eq!(
            guard("test", || panic!("boom")),
            ffi::FT_Err_Invalid_SVG_Document
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(HookError::NullPointer.code(), ffi::FT_Err_Invalid_Argument);
        assert_eq!(HookError::BufferMismatch.code(), ffi::FT_Err_Invalid_Argument);
        assert_eq!(
            HookError::MissingDocument.code(),
            ffi::FT_Err_Invalid_SVG_Document
        );
    }
}
