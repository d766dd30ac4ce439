//! Glyph rendering for the command-line tool.

use std::path::{Path, PathBuf};

use freetype::bitmap::PixelMode;
use freetype::face::LoadFlag;
use freetype::{Face, Library};
use resvg::tiny_skia::{IntSize, Pixmap};

use crate::cli::RenderArgs;
use crate::config::RenderSettings;
use crate::hooks::swap_red_blue;
use crate::{bind_svg_hooks, has_svg_module, BindError};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("FreeType error: {0}")]
    FreeType(#[from] freetype::Error),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("font has no glyph for {0:?}")]
    MissingCharacter(char),
    #[error("glyph {0} did not render to a color bitmap")]
    NotColor(u32),
    #[error("glyph {0} has no ink")]
    Empty(u32),
    #[error("failed to encode PNG: {0}")]
    Png(String),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphSelector {
    Index(u32),
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub font: PathBuf,
    pub face_index: isize,
    pub glyph: GlyphSelector,
    pub pixel_size: u32,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl RenderRequest {
    /// Fills unset arguments from the config file.
    pub fn resolve(args: RenderArgs, settings: &RenderSettings) -> Self {
        let glyph = match (args.glyph, args.character) {
            (Some(index), _) => GlyphSelector::Index(index),
            (None, Some(c)) => GlyphSelector::Char(c),
            (None, None) => GlyphSelector::Index(0),
        };
        Self {
            font: args.font,
            face_index: args.face,
            glyph,
            pixel_size: args.size.filter(|&s| s > 0).unwrap_or(settings.pixel_size()),
            output: args.output,
            output_dir: settings.output_dir.clone(),
        }
    }

    fn output_path(&self, glyph_index: u32) -> PathBuf {
        let file_name = format!("glyph-{glyph_index}.png");
        match (&self.output, &self.output_dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => dir.join(file_name),
            (None, None) => PathBuf::from(file_name),
        }
    }
}

/// A rendered color glyph as premultiplied RGBA.
pub struct RenderedGlyph {
    pub glyph_index: u32,
    pub left: i32,
    pub top: i32,
    pub pixmap: Pixmap,
}

/// Checks whether a fresh FreeType library accepts the hooks, twice.
pub fn probe() -> Result<(), RenderError> {
    let mut library = Library::init()?;
    if !has_svg_module(&library) {
        log::warn!("FreeType was built without the ot-svg module");
    }
    bind_svg_hooks(&mut library)?;
    bind_svg_hooks(&mut library)?;
    Ok(())
}

pub fn render_glyph(request: &RenderRequest) -> Result<RenderedGlyph, RenderError> {
    let mut library = Library::init()?;
    bind_svg_hooks(&mut library)?;

    let face = library.new_face(&request.font, request.face_index)?;
    face.set_pixel_sizes(request.pixel_size, request.pixel_size)?;
    let glyph_index = glyph_index(&face, request.glyph)?;
    log::debug!(
        "rendering glyph {} of {} at {}px",
        glyph_index,
        request.font.display(),
        request.pixel_size
    );
    face.load_glyph(glyph_index, LoadFlag::RENDER | LoadFlag::COLOR)?;

    let slot = face.glyph();
    let bitmap = slot.bitmap();
    if !matches!(bitmap.pixel_mode()?, PixelMode::Bgra) {
        return Err(RenderError::NotColor(glyph_index));
    }
    let width = bitmap.width().max(0) as u32;
    let rows = bitmap.rows().max(0) as u32;
    let size = IntSize::from_wh(width, rows).ok_or(RenderError::Empty(glyph_index))?;
    let pixels = bgra_to_rgba(
        bitmap.buffer(),
        width as usize,
        rows as usize,
        bitmap.pitch().unsigned_abs() as usize,
    );
    let pixmap = Pixmap::from_vec(pixels, size).ok_or(RenderError::Empty(glyph_index))?;

    Ok(RenderedGlyph {
        glyph_index,
        left: slot.bitmap_left(),
        top: slot.bitmap_top(),
        pixmap,
    })
}

/// Renders the requested glyph and writes it as PNG, returning the path.
pub fn render_to_png(request: &RenderRequest) -> Result<PathBuf, RenderError> {
    let glyph = render_glyph(request)?;
    let path = request.output_path(glyph.glyph_index);
    write_png(&glyph.pixmap, &path)?;
    log::info!(
        "wrote {}x{} glyph {} (left {}, top {}) to {}",
        glyph.pixmap.width(),
        glyph.pixmap.height(),
        glyph.glyph_index,
        glyph.left,
        glyph.top,
        path.display()
    );
    Ok(path)
}

fn glyph_index(face: &Face, selector: GlyphSelector) -> Result<u32, RenderError> {
    match selector {
        GlyphSelector::Index(index) => Ok(index),
        GlyphSelector::Char(c) => {
            // index 0 is .notdef
            let index: Option<u32> = face.get_char_index(c as usize).into();
            index
                .filter(|&index| index != 0)
                .ok_or(RenderError::MissingCharacter(c))
        }
    }
}

/// Copies `rows` lines of premultiplied BGRA out of a pitched buffer as RGBA.
fn bgra_to_rgba(buffer: &[u8], width: usize, rows: usize, pitch: usize) -> Vec<u8> {
    let line = width * 4;
    let mut pixels = Vec::with_capacity(line * rows);
    for row in buffer.chunks(pitch.max(line)).take(rows) {
        pixels.extend_from_slice(&row[..line.min(row.len())]);
    }
    pixels.resize(line * rows, 0);
    swap_red_blue(&mut pixels);
    pixels
}

fn write_png(pixmap: &Pixmap, path: &Path) -> Result<(), RenderError> {
    let data = pixmap
        .encode_png()
        .map_err(|e| RenderError::Png(e.to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| RenderError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, data).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}
