use crate::config::load_config;
use crate::ir::EdgeRouterKind;
use crate::load_session;
use crate::render::{render_svg, write_output_svg};
use crate::route_dump::write_route_dump;
use crate::session::DiagramSession;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "toporoute", version, about = "Orthogonal edge routing for topology scenes")]
pub struct Args {
    /// Scene file (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Zoom level to settle at; overrides the scene viewport
    #[arg(long = "zoom")]
    pub zoom: Option<f32>,

    /// Force one edge router for every edge
    #[arg(long = "router", value_enum)]
    pub router: Option<RouterArg>,

    /// Width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Height
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum RouterArg {
    SmoothStep,
    Pathfinding,
}

impl From<RouterArg> for EdgeRouterKind {
    fn from(value: RouterArg) -> Self {
        match value {
            RouterArg::SmoothStep => EdgeRouterKind::SmoothStep,
            RouterArg::Pathfinding => EdgeRouterKind::Pathfinding,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;
    if let Some(router) = args.router {
        config.edges.default_router = router.into();
        config.edges.router_by_type.clear();
    }

    let input = read_input(args.input.as_deref())?;
    let session = load_session(config, &input, args.zoom)?;

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&session);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Json => {
            write_route_dump(args.output.as_deref(), &session)?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&session, &output)?;
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(session: &DiagramSession, output: &Path) -> Result<()> {
    let svg = render_svg(session);
    let config = session.config();
    crate::render::write_output_png(&svg, output, &config.render, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_: &DiagramSession, _: &Path) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}
