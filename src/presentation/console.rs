//! Line-oriented operator console.
//!
//! Turns typed lines into [`CameraCommand`]s and renders [`AppEvent`]s and
//! snapshots as text.

use thiserror::Error;

use crate::domain::models::{
    AppEvent, CameraCommand, ColorChannels, ColorGroup, DeviceAddress, MessageSeverity,
    MetadataField, StateField,
};
use crate::infrastructure::bluetooth::driver::CameraSnapshot;
use crate::infrastructure::bluetooth::protocol::codec;

pub const HELP: &str = "\
commands:
  scan | stop-scan | devices
  connect <address|index> | disconnect
  record | stop | play | next | prev | still
  af | focus <delta> | auto-iris | iris <f> | iris-norm <0..1> | iris-step <n>
  iso <n> | shutter <n> | gain <db>
  wb <kelvin> <tint> | auto-wb | restore-wb
  lift|gamma|cgain|offset <r> <g> <b> <l> | color-reset
  tc-display <on|off>
  meta <field> <text>
    fields: scene camera-id operator director project lens-type lens-iris
            focal-length distance filter slate
  name <text> | status | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Camera(CameraCommand),
    Devices,
    Status,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),
    #[error("'{0}' expects {1}")]
    MissingArgument(&'static str, &'static str),
    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },
}

fn arg<'a>(
    args: &[&'a str],
    index: usize,
    command: &'static str,
    usage: &'static str,
) -> Result<&'a str, ParseError> {
    args.get(index)
        .copied()
        .ok_or(ParseError::MissingArgument(command, usage))
}

fn number<N: std::str::FromStr>(value: &str, name: &'static str) -> Result<N, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn on_off(value: &str) -> Result<bool, ParseError> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(ParseError::InvalidValue {
            name: "switch",
            value: value.to_string(),
        }),
    }
}

fn metadata_field(value: &str) -> Result<MetadataField, ParseError> {
    Ok(match value.to_lowercase().as_str() {
        "scene" => MetadataField::Scene,
        "camera-id" => MetadataField::CameraId,
        "operator" => MetadataField::CameraOperator,
        "director" => MetadataField::Director,
        "project" => MetadataField::ProjectName,
        "lens-type" => MetadataField::LensType,
        "lens-iris" => MetadataField::LensIris,
        "focal-length" => MetadataField::LensFocalLength,
        "distance" => MetadataField::LensDistance,
        "filter" => MetadataField::LensFilter,
        "slate" => MetadataField::SlateTarget,
        _ => {
            return Err(ParseError::InvalidValue {
                name: "metadata field",
                value: value.to_string(),
            })
        }
    })
}

fn color(
    group: ColorGroup,
    command: &'static str,
    args: &[&str],
) -> Result<CameraCommand, ParseError> {
    const USAGE: &str = "<r> <g> <b> <l>";
    let red = number(arg(args, 0, command, USAGE)?, "red")?;
    let green = number(arg(args, 1, command, USAGE)?, "green")?;
    let blue = number(arg(args, 2, command, USAGE)?, "blue")?;
    let luma = number(arg(args, 3, command, USAGE)?, "luma")?;
    Ok(CameraCommand::ColorCorrection {
        group,
        channels: ColorChannels {
            red,
            green,
            blue,
            luma,
        },
    })
}

/// Free text after the command word, with inner spacing preserved.
fn rest_of_line<'a>(line: &'a str, command: &str) -> &'a str {
    line.trim_start()[command.len()..].trim()
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, ParseError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(ConsoleCommand::Empty);
    };
    let args: Vec<&str> = words.collect();
    let lowered = command.to_lowercase();

    let camera = match lowered.as_str() {
        "devices" => return Ok(ConsoleCommand::Devices),
        "status" => return Ok(ConsoleCommand::Status),
        "help" | "?" => return Ok(ConsoleCommand::Help),
        "quit" | "exit" => return Ok(ConsoleCommand::Quit),

        "scan" => CameraCommand::StartDiscovery,
        "stop-scan" => CameraCommand::StopDiscovery,
        "connect" => {
            let target = arg(&args, 0, "connect", "<address|index>")?;
            match target.parse::<usize>() {
                Ok(index) if target.len() <= 3 => CameraCommand::ConnectIndex(index),
                _ => CameraCommand::Connect(target.parse::<DeviceAddress>().map_err(|_| {
                    ParseError::InvalidValue {
                        name: "address",
                        value: target.to_string(),
                    }
                })?),
            }
        }
        "disconnect" => CameraCommand::Disconnect,

        "record" => CameraCommand::Record(true),
        "stop" => CameraCommand::Record(false),
        "play" => CameraCommand::Play(true),
        "next" => CameraCommand::Playback { next: true },
        "prev" => CameraCommand::Playback { next: false },
        "still" => CameraCommand::CaptureStill,

        "af" => CameraCommand::AutoFocus,
        "focus" => CameraCommand::Focus(number(arg(&args, 0, "focus", "<delta>")?, "focus")?),
        "auto-iris" => CameraCommand::AutoAperture,
        "iris" => CameraCommand::Aperture(number(arg(&args, 0, "iris", "<f>")?, "f-stop")?),
        "iris-norm" => CameraCommand::ApertureNormalized(number(
            arg(&args, 0, "iris-norm", "<0..1>")?,
            "normalized aperture",
        )?),
        "iris-step" => CameraCommand::ApertureStep(number(
            arg(&args, 0, "iris-step", "<n>")?,
            "aperture step",
        )?),

        "iso" => CameraCommand::Iso(number(arg(&args, 0, "iso", "<n>")?, "ISO")?),
        "shutter" => {
            CameraCommand::ShutterSpeed(number(arg(&args, 0, "shutter", "<n>")?, "shutter speed")?)
        }
        "gain" => CameraCommand::Gain(number(arg(&args, 0, "gain", "<db>")?, "gain")?),
        "wb" => CameraCommand::WhiteBalance {
            kelvin: number(arg(&args, 0, "wb", "<kelvin> <tint>")?, "white balance")?,
            tint: number(arg(&args, 1, "wb", "<kelvin> <tint>")?, "tint")?,
        },
        "auto-wb" => CameraCommand::AutoWhiteBalance,
        "restore-wb" => CameraCommand::RestoreAutoWhiteBalance,

        "lift" => color(ColorGroup::Lift, "lift", &args)?,
        "gamma" => color(ColorGroup::Gamma, "gamma", &args)?,
        "cgain" => color(ColorGroup::Gain, "cgain", &args)?,
        "offset" => color(ColorGroup::Offset, "offset", &args)?,
        "color-reset" => CameraCommand::ColorCorrectionReset,

        "tc-display" => {
            CameraCommand::TimecodeDisplay(on_off(arg(&args, 0, "tc-display", "<on|off>")?)?)
        }
        "meta" => {
            let field = metadata_field(arg(&args, 0, "meta", "<field> <text>")?)?;
            let text = rest_of_line(line, command);
            let text = text[args[0].len()..].trim();
            CameraCommand::Metadata(field, text.to_string())
        }
        "name" => {
            let name = rest_of_line(line, command);
            if name.is_empty() {
                return Err(ParseError::MissingArgument("name", "<text>"));
            }
            CameraCommand::CameraName(name.to_string())
        }

        _ => return Err(ParseError::Unknown(command.to_string())),
    };

    Ok(ConsoleCommand::Camera(camera))
}

/// One-line rendering of an event, `None` for events not worth printing.
pub fn describe_event(event: &AppEvent) -> Option<String> {
    Some(match event {
        AppEvent::StateChanged(field) => format!("changed: {:?}", field),
        AppEvent::ConnectionState(state) => format!("connection: {}", state),
        AppEvent::ConnectedChanged(true) => "camera ready".to_string(),
        AppEvent::ConnectedChanged(false) => "camera no longer ready".to_string(),
        AppEvent::NameChanged(name) if name.is_empty() => return None,
        AppEvent::NameChanged(name) => format!("camera name: {}", name),
        AppEvent::Disconnected => "disconnected".to_string(),
        AppEvent::ConnectionFailure(reason) => format!("connection failed: {}", reason),
        AppEvent::ControllerError(reason) => format!("controller error: {}", reason),
        AppEvent::ControllerErrorChanged(true) => return None,
        AppEvent::ControllerErrorChanged(false) => "controller error cleared".to_string(),
        AppEvent::DiscoveringChanged(_) | AppEvent::DevicesUpdated => return None,
        AppEvent::DiscoveryStarted => "scanning...".to_string(),
        AppEvent::DiscoveryFinished { devices } => {
            let mut out = format!("scan finished, {} camera(s)", devices.len());
            for (i, device) in devices.iter().enumerate() {
                out.push_str(&format!("\n  [{}] {} {}", i, device.address, device.name));
            }
            out
        }
        AppEvent::DiscoveryError(reason) => format!("discovery error: {}", reason),
        AppEvent::WriteFailed {
            characteristic,
            reason,
        } => format!("write to {} failed: {}", characteristic, reason),
        AppEvent::LogMessage(msg) => {
            let tag = match msg.severity {
                MessageSeverity::Info => "info",
                MessageSeverity::Success => "ok",
                MessageSeverity::Warning => "warn",
                MessageSeverity::Error => "error",
            };
            format!("[{}] {}", tag, msg.message)
        }
    })
}

/// Value of a changed field, where a single value describes it.
pub fn describe_field(snapshot: &CameraSnapshot, field: StateField) -> Option<String> {
    let state = &snapshot.state;
    Some(match field {
        StateField::Recording => format!("recording: {}", state.media.recording),
        StateField::Playing => format!("playing: {}", state.media.playing),
        StateField::Iso => format!("ISO {}", state.video.iso),
        StateField::ShutterSpeed => format!("shutter 1/{}", state.video.shutter_speed),
        StateField::WhiteBalance => format!(
            "white balance {}K tint {}",
            state.video.white_balance, state.video.tint
        ),
        StateField::Aperture => {
            let fstop = state.lens.aperture_units.map(codec::units_to_fstop)?;
            format!("aperture f/{:.1}", fstop)
        }
        StateField::Zoom => format!("zoom {}mm", state.lens.zoom),
        _ => return None,
    })
}

pub fn format_devices(snapshot: &CameraSnapshot) -> String {
    if snapshot.devices.is_empty() {
        return "no cameras found".to_string();
    }
    snapshot
        .devices
        .iter()
        .enumerate()
        .map(|(i, d)| match d.rssi {
            Some(rssi) => format!("[{}] {} {} ({} dBm)", i, d.address, d.name, rssi),
            None => format!("[{}] {} {}", i, d.address, d.name),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_status(snapshot: &CameraSnapshot) -> String {
    let state = &snapshot.state;
    let aperture = state
        .lens
        .aperture_units
        .map(|units| format!("f/{:.1}", codec::units_to_fstop(units)))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "connection: {}{}\n\
         name: {}\n\
         recording: {}  playing: {}  timecode: {}\n\
         ISO {}  shutter 1/{}  gain {} dB  WB {}K tint {}\n\
         aperture {}  zoom {}mm  focus {:.2}",
        snapshot.connection,
        if snapshot.controller_error { " (controller error)" } else { "" },
        if snapshot.name.is_empty() { "-" } else { &snapshot.name },
        state.media.recording,
        state.media.playing,
        state.timecode,
        state.video.iso,
        state.video.shutter_speed,
        state.video.gain,
        state.video.white_balance,
        state.video.tint,
        aperture,
        state.lens.zoom,
        state.lens.focus,
    )
}
