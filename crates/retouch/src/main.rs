//! Apply a scripted edit session to an image: managed filter edits,
//! crop/rotate bakes, and undo/redo steps, in the order given, then
//! save the final preview.

use std::path::PathBuf;

use clap::Parser;
use image::RgbaImage;
use retouch_core::{FilterKind, ParamValue};
use retouch_engine::{AnalysisHub, EditOrchestrator, PreviewState};
use retouch_filters::{BuiltinFilters, Crop, Rotate};
use tracing::info;

/// Apply a scripted retouch edit session to an image.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input image path.
    input: PathBuf,

    /// Output image path (PNG recommended).
    #[arg(short, long)]
    output: PathBuf,

    /// A managed filter edit as "filter.param=value", e.g.
    /// "color_controls.brightness=0.2". Repeatable; applied in order.
    /// Values parse as true/false, a number, or "r,g,b,a" color
    /// components in 0.0–1.0.
    #[arg(long = "edit", value_name = "SPEC")]
    edits: Vec<String>,

    /// Crop to "X,Y,WxH" in pixels, applied after the edits.
    #[arg(long, value_name = "X,Y,WxH")]
    crop: Option<String>,

    /// Rotate clockwise by this many quarter turns, applied after the
    /// crop.
    #[arg(long, value_name = "TURNS", default_value_t = 0)]
    rotate: u32,

    /// Undo this many steps at the end of the session.
    #[arg(long, value_name = "N", default_value_t = 0)]
    undo: u32,

    /// Redo this many steps after the undos.
    #[arg(long, value_name = "N", default_value_t = 0)]
    redo: u32,
}

// ---------------------------------------------------------------------------
// Edit-spec parsing
// ---------------------------------------------------------------------------

/// One parsed "filter.param=value" edit.
struct EditSpec {
    kind: FilterKind,
    name: String,
    value: ParamValue,
}

impl EditSpec {
    fn parse(spec: &str) -> Result<Self, String> {
        let (target, value_str) = spec
            .split_once('=')
            .ok_or_else(|| format!("edit must be 'filter.param=value', got: '{spec}'"))?;
        let (kind_str, name) = target
            .split_once('.')
            .ok_or_else(|| format!("edit target must be 'filter.param', got: '{target}'"))?;

        let kind = FilterKind::from_name(kind_str)
            .ok_or_else(|| format!("unknown filter '{kind_str}'"))?;

        Ok(Self {
            kind,
            name: name.to_owned(),
            value: parse_value(value_str)?,
        })
    }
}

/// Parse a parameter value: bool, color ("r,g,b,a"), or float.
fn parse_value(s: &str) -> Result<ParamValue, String> {
    match s {
        "true" => return Ok(ParamValue::Bool(true)),
        "false" => return Ok(ParamValue::Bool(false)),
        _ => {}
    }
    if s.contains(',') {
        let components: Vec<f32> = s
            .split(',')
            .map(|c| {
                c.trim()
                    .parse()
                    .map_err(|e| format!("invalid color component '{c}': {e}"))
            })
            .collect::<Result<_, String>>()?;
        let [r, g, b, a] = components[..] else {
            return Err(format!("color must have 4 components, got {}", components.len()));
        };
        return Ok(ParamValue::Color([r, g, b, a]));
    }
    let value: f32 = s.parse().map_err(|e| format!("invalid value '{s}': {e}"))?;
    Ok(ParamValue::Float(value))
}

/// Parse `--crop "X,Y,WxH"`.
fn parse_crop(s: &str) -> Result<Crop, String> {
    let parts: Vec<&str> = s.split(',').collect();
    let [x_str, y_str, size_str] = parts[..] else {
        return Err(format!("crop must be 'X,Y,WxH', got: '{s}'"));
    };
    let (w_str, h_str) = size_str
        .split_once('x')
        .ok_or_else(|| format!("crop size must be 'WxH', got: '{size_str}'"))?;

    let parse = |label: &str, value: &str| -> Result<u32, String> {
        value
            .trim()
            .parse()
            .map_err(|e| format!("invalid crop {label} '{value}': {e}"))
    };
    Ok(Crop {
        x: parse("x", x_str)?,
        y: parse("y", y_str)?,
        width: parse("width", w_str)?,
        height: parse("height", h_str)?,
    })
}

// ---------------------------------------------------------------------------
// Session driver
// ---------------------------------------------------------------------------

fn run_session(args: &Args, image: RgbaImage) -> Result<PreviewState, Box<dyn std::error::Error>> {
    let analysis = AnalysisHub::new();
    let measure = analysis.spawn_average_luminance(image.clone());
    let mut session = EditOrchestrator::new(image, Box::new(BuiltinFilters), analysis);

    // Scripted sessions want the measured luminance, not the default.
    if measure.join().is_err() {
        return Err("luminance measurement thread panicked".into());
    }

    for spec in &args.edits {
        let edit = EditSpec::parse(spec).map_err(|e| format!("--edit: {e}"))?;
        info!(kind = %edit.kind, name = edit.name, "applying edit");
        session.set_parameter(edit.kind, &edit.name, edit.value)?;
    }

    if let Some(crop_spec) = &args.crop {
        let crop = parse_crop(crop_spec).map_err(|e| format!("--crop: {e}"))?;
        info!(crop.x, crop.y, crop.width, crop.height, "applying crop");
        session.apply_unmanaged_edit(&crop)?;
    }

    if args.rotate % 4 != 0 {
        info!(quarter_turns = args.rotate, "applying rotation");
        session.apply_unmanaged_edit(&Rotate {
            quarter_turns: args.rotate,
        })?;
    }

    for _ in 0..args.undo {
        session.undo()?;
    }
    for _ in 0..args.redo {
        session.redo()?;
    }

    Ok(session.preview_state())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!(input = %args.input.display(), "loading image");
    let image = image::open(&args.input)?.to_rgba8();

    let preview = run_session(&args, image)?;

    info!(
        output = %args.output.display(),
        width = preview.image.width(),
        height = preview.image.height(),
        undo_able = preview.undo_able,
        redo_able = preview.redo_able,
        "saving result",
    );
    preview.image.save(&args.output)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn edit_spec_parses_filter_param_and_value() {
        let edit = EditSpec::parse("color_controls.brightness=0.2").unwrap();
        assert_eq!(edit.kind, FilterKind::ColorControls);
        assert_eq!(edit.name, "brightness");
        assert_eq!(edit.value, ParamValue::Float(0.2));
    }

    #[test]
    fn edit_spec_parses_bool_and_color_values() {
        assert_eq!(parse_value("true").unwrap(), ParamValue::Bool(true));
        assert_eq!(
            parse_value("0.1, 0.2, 0.3, 1.0").unwrap(),
            ParamValue::Color([0.1, 0.2, 0.3, 1.0]),
        );
    }

    #[test]
    fn malformed_edit_specs_are_rejected() {
        assert!(EditSpec::parse("brightness=0.2").is_err());
        assert!(EditSpec::parse("color_controls.brightness").is_err());
        assert!(EditSpec::parse("no_such_filter.x=1").is_err());
        assert!(parse_value("0.1,0.2").is_err());
        assert!(parse_value("loud").is_err());
    }

    #[test]
    fn crop_spec_parses_origin_and_size() {
        let crop = parse_crop("10,20,640x480").unwrap();
        assert_eq!((crop.x, crop.y), (10, 20));
        assert_eq!((crop.width, crop.height), (640, 480));
    }

    #[test]
    fn malformed_crop_specs_are_rejected() {
        assert!(parse_crop("10,20").is_err());
        assert!(parse_crop("10,20,640").is_err());
        assert!(parse_crop("a,b,cxd").is_err());
    }
}
