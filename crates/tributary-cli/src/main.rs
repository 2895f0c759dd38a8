use serde_json::json;
use std::io::{Read, Write};
use std::str::FromStr;
use tributary::render::raster::{RasterError, RasterOptions};
use tributary::render::{HeadlessError, SankeyRenderer};
use tributary::{FlowConfig, FlowData};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Model(tributary::Error),
    Headless(HeadlessError),
    Raster(RasterError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Model(err) => write!(f, "{err}"),
            CliError::Headless(err) => write!(f, "{err}"),
            CliError::Raster(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<tributary::Error> for CliError {
    fn from(value: tributary::Error) -> Self {
        Self::Model(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Headless(value)
    }
}

impl From<RasterError> for CliError {
    fn from(value: RasterError) -> Self {
        Self::Raster(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    Layout,
    #[default]
    Render,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Json,
    Csv,
}

impl FromStr for InputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum RenderFormat {
    #[default]
    Svg,
    Png,
    Jpeg,
    Pdf,
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            _ => Err(()),
        }
    }
}

impl RenderFormat {
    fn extension(self) -> &'static str {
        match self {
            RenderFormat::Svg => "svg",
            RenderFormat::Png => "png",
            RenderFormat::Jpeg => "jpg",
            RenderFormat::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    input_format: Option<InputFormat>,
    config: Option<String>,
    /// `sankey.*` keys set from individual flags; applied over `--config`.
    overrides: Vec<(&'static str, serde_json::Value)>,
    days: Option<f64>,
    pretty: bool,
    render_format: RenderFormat,
    render_scale: f32,
    background: Option<String>,
    diagram_id: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "tributary-cli\n\
\n\
USAGE:\n\
  tributary-cli layout [--pretty] [OPTIONS] [<path>|-]\n\
  tributary-cli [render] [--format svg|png|jpg|pdf] [--scale <n>] [--background <color>] [--id <diagram-id>] [--out <path>] [OPTIONS] [<path>|-]\n\
\n\
OPTIONS:\n\
  --input-format json|csv       defaults to the file extension, then to JSON\n\
  --config <path>               JSON config, e.g. {\"sankey\": {\"linkColor\": \"source\"}}\n\
  --align left|right|justify|center\n\
  --interval asGiven|monthly    monthly rescales totals over --days to a monthly average\n\
  --days <n>                    period length of the input totals\n\
  --width <px> --height <px>\n\
  --link-color gradient|source|target|none\n\
  --palette category10|tableau10\n\
  --units <text>\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - layout prints the computed node/link geometry as JSON.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - PNG/JPG/PDF output defaults to writing next to the input file (or ./out.<ext> for stdin).\n\
  - Set RUST_LOG=debug to trace the pipeline on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        render_scale: 1.0,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        let mut value = || it.next().ok_or(CliError::Usage(usage()));
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--input-format" => {
                args.input_format = Some(
                    value()?
                        .parse::<InputFormat>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--config" => args.config = Some(value()?.clone()),
            "--align" => args.overrides.push(("sankey.nodeAlignment", json!(value()?))),
            "--interval" => args.overrides.push(("sankey.interval", json!(value()?))),
            "--link-color" => args.overrides.push(("sankey.linkColor", json!(value()?))),
            "--palette" => args.overrides.push(("sankey.palette", json!(value()?))),
            "--units" => args.overrides.push(("sankey.units", json!(value()?))),
            "--width" | "--height" => {
                let px = parse_positive(value()?)?;
                let key = if a == "--width" {
                    "sankey.width"
                } else {
                    "sankey.height"
                };
                args.overrides.push((key, json!(px)));
            }
            "--days" => args.days = Some(parse_positive(value()?)?),
            "--format" => {
                args.render_format = value()?
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => args.render_scale = parse_positive(value()?)? as f32,
            "--background" => {
                let bg = value()?.trim();
                if !bg.is_empty() {
                    args.background = Some(bg.to_string());
                }
            }
            "--id" => args.diagram_id = Some(value()?.clone()),
            "--out" => args.out = Some(value()?.clone()),
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn parse_positive(raw: &str) -> Result<f64, CliError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(CliError::Usage(usage())),
    }
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn detect_input_format(input: Option<&str>, text: &str) -> InputFormat {
    let by_extension = input
        .map(std::path::Path::new)
        .and_then(|p| p.extension())
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse::<InputFormat>().ok());
    match by_extension {
        Some(format) => format,
        None if text.trim_start().starts_with(['{', '[']) => InputFormat::Json,
        None if text.trim().is_empty() => InputFormat::Json,
        None => InputFormat::Csv,
    }
}

fn load_data(args: &Args) -> Result<FlowData, CliError> {
    let text = read_input(args.input.as_deref())?;
    let format = args
        .input_format
        .unwrap_or_else(|| detect_input_format(args.input.as_deref(), &text));
    tracing::debug!(?format, bytes = text.len(), "reading flow data");
    let mut data = match format {
        InputFormat::Json => FlowData::from_json_str(&text)?,
        InputFormat::Csv => tributary::csv::parse_flow_csv(&text)?,
    };
    if let Some(days) = args.days {
        data.days = Some(days);
    }
    Ok(data)
}

fn build_renderer(args: &Args) -> Result<SankeyRenderer, CliError> {
    let mut config = match args.config.as_deref() {
        Some(path) => FlowConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => FlowConfig::empty_object(),
    };
    for (key, value) in &args.overrides {
        config.set_value(key, value.clone());
    }
    let mut renderer = SankeyRenderer::new().with_config(&config);
    if let Some(id) = args.diagram_id.as_deref() {
        renderer = renderer.with_diagram_id(id);
    }
    Ok(renderer)
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn write_bytes(bytes: &[u8], out: &str) -> Result<(), CliError> {
    if out == "-" {
        std::io::stdout().lock().write_all(bytes)?;
    } else {
        std::fs::write(out, bytes)?;
    }
    Ok(())
}

fn default_raster_out_path(input: Option<&str>, ext: &str) -> std::path::PathBuf {
    match input {
        Some(path) if path != "-" => std::path::PathBuf::from(path).with_extension(ext),
        _ => std::path::PathBuf::from(format!("out.{ext}")),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let data = load_data(&args)?;
    let renderer = build_renderer(&args)?;

    match args.command {
        Command::Layout => {
            let layout = renderer.layout_sync(&data, renderer.configured_size())?;
            let stdout = std::io::stdout().lock();
            if args.pretty {
                serde_json::to_writer_pretty(stdout, &layout)?;
            } else {
                serde_json::to_writer(stdout, &layout)?;
            }
            Ok(())
        }
        Command::Render => {
            let raster = RasterOptions {
                scale: args.render_scale,
                background: args.background.clone(),
                ..Default::default()
            };
            let bytes = match args.render_format {
                RenderFormat::Svg => {
                    let svg = renderer.render_svg_sync(&data)?;
                    return write_text(&svg, args.out.as_deref());
                }
                RenderFormat::Png => renderer.render_png_sync(&data, &raster)?,
                RenderFormat::Jpeg => renderer.render_jpeg_sync(&data, &raster)?,
                RenderFormat::Pdf => renderer.render_pdf_sync(&data)?,
            };
            let out = args.out.clone().unwrap_or_else(|| {
                default_raster_out_path(args.input.as_deref(), args.render_format.extension())
                    .to_string_lossy()
                    .to_string()
            });
            write_bytes(&bytes, &out)
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
