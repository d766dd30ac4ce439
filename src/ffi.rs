//! Raw FreeType declarations for the OT-SVG module.
//!
//! `freetype-sys` predates FreeType's SVG support, so the renderer hook
//! table, the SVG document record and a glyph slot layout that exposes
//! `glyph_index` are declared here. Layouts follow `ftsvg.h`, `otsvg.h` and
//! `freetype.h` from FreeType 2.12 and later.

#![allow(non_camel_case_types, non_snake_case)]

use std::ffi::{c_char, c_int, c_long, c_short, c_uchar, c_uint, c_ulong, c_ushort, c_void};

pub use freetype::ffi::FT_Library;

pub type FT_Error = c_int;
pub type FT_Pointer = *mut c_void;
pub type FT_Bool = c_uchar;
pub type FT_Pos = c_long;
pub type FT_Fixed = c_long;
pub type FT_Int = c_int;
pub type FT_UInt = c_uint;
pub type FT_UShort = c_ushort;
pub type FT_ULong = c_ulong;
pub type FT_Glyph_Format = c_uint;
pub type FT_GlyphSlot = *mut FT_GlyphSlotRec;
pub type FT_Module = *mut c_void;

pub const FT_Err_Ok: FT_Error = 0x00;
pub const FT_Err_Invalid_Argument: FT_Error = 0x06;
pub const FT_Err_Invalid_SVG_Document: FT_Error = 0xC0;

pub const FT_PIXEL_MODE_BGRA: c_uchar = 7;

const fn image_tag(tag: &[u8; 4]) -> FT_Glyph_Format {
    ((tag[0] as u32) << 24) | ((tag[1] as u32) << 16) | ((tag[2] as u32) << 8) | (tag[3] as u32)
}

pub const FT_GLYPH_FORMAT_BITMAP: FT_Glyph_Format = image_tag(b"bits");
pub const FT_GLYPH_FORMAT_SVG: FT_Glyph_Format = image_tag(b"SVG ");

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FT_Vector {
    pub x: FT_Pos,
    pub y: FT_Pos,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FT_Matrix {
    pub xx: FT_Fixed,
    pub xy: FT_Fixed,
    pub yx: FT_Fixed,
    pub yy: FT_Fixed,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FT_Size_Metrics {
    pub x_ppem: FT_UShort,
    pub y_ppem: FT_UShort,
    pub x_scale: FT_Fixed,
    pub y_scale: FT_Fixed,
    pub ascender: FT_Pos,
    pub descender: FT_Pos,
    pub height: FT_Pos,
    pub max_advance: FT_Pos,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FT_Glyph_Metrics {
    pub width: FT_Pos,
    pub height: FT_Pos,
    pub horiBearingX: FT_Pos,
    pub horiBearingY: FT_Pos,
    pub horiAdvance: FT_Pos,
    pub vertBearingX: FT_Pos,
    pub vertBearingY: FT_Pos,
    pub vertAdvance: FT_Pos,
}

#[repr(C)]
#[derive(Debug)]
pub struct FT_Bitmap {
    pub rows: c_uint,
    pub width: c_uint,
    pub pitch: c_int,
    pub buffer: *mut c_uchar,
    pub num_grays: c_ushort,
    pub pixel_mode: c_uchar,
    pub palette_mode: c_uchar,
    pub palette: *mut c_void,
}

#[repr(C)]
#[derive(Debug)]
pub struct FT_Generic {
    pub data: *mut c_void,
    pub finalizer: Option<unsafe extern "C" fn(object: *mut c_void)>,
}

#[repr(C)]
#[derive(Debug)]
pub struct FT_Outline {
    pub n_contours: c_short,
    pub n_points: c_short,
    pub points: *mut FT_Vector,
    pub tags: *mut c_char,
    pub contours: *mut c_short,
    pub flags: c_int,
}

#[repr(C)]
#[derive(Debug)]
pub struct FT_GlyphSlotRec {
    pub library: FT_Library,
    pub face: *mut c_void,
    pub next: FT_GlyphSlot,
    pub glyph_index: FT_UInt,
    pub generic: FT_Generic,
    pub metrics: FT_Glyph_Metrics,
    pub linearHoriAdvance: FT_Fixed,
    pub linearVertAdvance: FT_Fixed,
    pub advance: FT_Vector,
    pub format: FT_Glyph_Format,
    pub bitmap: FT_Bitmap,
    pub bitmap_left: FT_Int,
    pub bitmap_top: FT_Int,
    pub outline: FT_Outline,
    pub num_subglyphs: FT_UInt,
    pub subglyphs: *mut c_void,
    pub control_data: *mut c_void,
    pub control_len: c_long,
    pub lsb_delta: FT_Pos,
    pub rsb_delta: FT_Pos,
    pub other: *mut c_void,
    pub internal: *mut c_void,
}

/// The document FreeType stores in `slot->other` for `FT_GLYPH_FORMAT_SVG`.
#[repr(C)]
#[derive(Debug)]
pub struct FT_SVG_DocumentRec {
    pub svg_document: *mut u8,
    pub svg_document_length: FT_ULong,
    pub metrics: FT_Size_Metrics,
    pub units_per_EM: FT_UShort,
    pub start_glyph_id: FT_UShort,
    pub end_glyph_id: FT_UShort,
    pub transform: FT_Matrix,
    pub delta: FT_Vector,
}

pub type SVG_Lib_Init_Func = unsafe extern "C" fn(data_pointer: *mut FT_Pointer) -> FT_Error;
pub type SVG_Lib_Free_Func = unsafe extern "C" fn(data_pointer: *mut FT_Pointer);
pub type SVG_Lib_Render_Func =
    unsafe extern "C" fn(slot: FT_GlyphSlot, data_pointer: *mut FT_Pointer) -> FT_Error;
pub type SVG_Lib_Preset_Slot_Func =
    unsafe extern "C" fn(slot: FT_GlyphSlot, cache: FT_Bool, state: *mut FT_Pointer) -> FT_Error;

/// The value of the `svg-hooks` property of the `ot-svg` module.
#[repr(C)]
#[derive(Debug)]
pub struct SVG_RendererHooks {
    pub init_svg: Option<SVG_Lib_Init_Func>,
    pub free_svg: Option<SVG_Lib_Free_Func>,
    pub render_svg: Option<SVG_Lib_Render_Func>,
    pub preset_slot: Option<SVG_Lib_Preset_Slot_Func>,
}

extern "C" {
    pub fn FT_Property_Set(
        library: FT_Library,
        module_name: *const c_char,
        property_name: *const c_char,
        value: *const c_void,
    ) -> FT_Error;

    pub fn FT_Get_Module(library: FT_Library, module_name: *const c_char) -> FT_Module;
}
