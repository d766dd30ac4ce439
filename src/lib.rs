//! Installs resvg as the OpenType-SVG renderer of a FreeType library.
//!
//! FreeType's `ot-svg` module rasterizes nothing on its own; it delegates to
//! a hook table set through the `svg-hooks` module property. This crate
//! provides that table and a single call to install it, from Rust via
//! [`bind_svg_hooks`] or from C via [`bind::bind_resvg_freetype`].

pub mod bind;
pub mod cli;
pub mod config;
pub mod ffi;
pub mod hooks;
pub mod render;

pub use bind::{bind_svg_hooks, has_svg_module, BindError, ModuleProperties, RawLibrary};
pub use hooks::SVG_HOOKS;

use log::info;

use crate::cli::Command;
use crate::config::Config;
use crate::render::{RenderError, RenderRequest};

pub fn run(command: Command, config: &Config) -> Result<(), RenderError> {
    match command {
        Command::Probe => {
            render::probe()?;
            info!("FreeType accepted the SVG hooks");
            println!("ok");
        }
        Command::Render(args) => {
            let request = RenderRequest::resolve(args, &config.render);
            let path = render::render_to_png(&request)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
