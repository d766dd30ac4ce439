//! Installs the SVG hook table into FreeType's `ot-svg` module.

use std::ffi::{c_int, c_void, CStr};

use crate::ffi::{self, FT_Error, FT_Library, SVG_RendererHooks};
use crate::hooks::SVG_HOOKS;

pub const SVG_MODULE: &CStr = c"ot-svg";
pub const SVG_HOOKS_PROPERTY: &CStr = c"svg-hooks";

/// FreeType's string-keyed module property mechanism.
pub trait ModuleProperties {
    /// Sets `property` of `module` to `value`, returning FreeType's status.
    fn set_property(&mut self, module: &CStr, property: &CStr, value: *const c_void) -> FT_Error;
}

impl ModuleProperties for freetype::Library {
    fn set_property(&mut self, module: &CStr, property: &CStr, value: *const c_void) -> FT_Error {
        unsafe { ffi::FT_Property_Set(self.raw(), module.as_ptr(), property.as_ptr(), value) }
    }
}

/// A borrowed `FT_Library` owned by someone else, typically C code.
///
/// The handle is neither checked nor released.
#[derive(Debug)]
pub struct RawLibrary {
    raw: FT_Library,
}

impl RawLibrary {
    /// # Safety
    ///
    /// `raw` must point to an initialized FreeType library that outlives the
    /// returned wrapper.
    pub unsafe fn from_raw(raw: FT_Library) -> Self {
        Self { raw }
    }

    pub fn as_ptr(&self) -> FT_Library {
        self.raw
    }
}

impl ModuleProperties for RawLibrary {
    fn set_property(&mut self, module: &CStr, property: &CStr, value: *const c_void) -> FT_Error {
        unsafe { ffi::FT_Property_Set(self.raw, module.as_ptr(), property.as_ptr(), value) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("FreeType rejected the SVG hooks (error {0:#04x})")]
    Rejected(FT_Error),
}

/// Makes `engine` render OT-SVG glyphs through [`SVG_HOOKS`].
///
/// Calling this again on the same engine re-registers the same table.
pub fn bind_svg_hooks<P: ModuleProperties + ?Sized>(engine: &mut P) -> Result<(), BindError> {
    let hooks: *const SVG_RendererHooks = &SVG_HOOKS;
    match engine.set_property(SVG_MODULE, SVG_HOOKS_PROPERTY, hooks.cast()) {
        ffi::FT_Err_Ok => Ok(()),
        code => Err(BindError::Rejected(code)),
    }
}

/// Whether `library` was built with the `ot-svg` module.
///
/// A library without it rejects [`bind_svg_hooks`].
pub fn has_svg_module(library: &freetype::Library) -> bool {
    !unsafe { ffi::FT_Get_Module(library.raw(), SVG_MODULE.as_ptr()) }.is_null()
}

/// C entry point for [`bind_svg_hooks`]. Returns `0` on success, `-1` otherwise.
///
/// # Safety
///
/// `library` must be an initialized FreeType library. Null or dangling
/// handles are not checked here; what happens is up to FreeType.
#[no_mangle]
pub unsafe extern "C" fn bind_resvg_freetype(library: FT_Library) -> c_int {
    let mut library = RawLibrary::from_raw(library);
    match bind_svg_hooks(&mut library) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}
