use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ft-svg-bind")]
#[command(version)]
#[command(about = "Render OpenType-SVG glyphs through FreeType with resvg", long_about = None)]
#[command(after_help = "\
CONFIG:
    Defaults for `render` are read from $XDG_CONFIG_HOME/ft-svg-bind/config.toml:

        [render]
        pixel_size = 64
        output_dir = \"/tmp/glyphs\"

    Set RUST_LOG=debug to trace the SVG hooks.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that the linked FreeType accepts the SVG hooks
    Probe,
    /// Render one glyph of an OpenType-SVG font to PNG
    Render(RenderArgs),
}

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["glyph", "character"])))]
pub struct RenderArgs {
    /// Font file to load
    pub font: PathBuf,

    /// Glyph index to render
    #[arg(long)]
    pub glyph: Option<u32>,

    /// Character to render, looked up in the font's cmap
    #[arg(long = "char")]
    pub character: Option<char>,

    /// Pixel size (ppem)
    #[arg(long)]
    pub size: Option<u32>,

    /// Face index within a font collection
    #[arg(long, default_value_t = 0)]
    pub face: isize,

    /// Output PNG path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
