//! Telemetry Decoder
//!
//! Turns inbound notifications into typed [`Telemetry`] values. Decoding never
//! touches camera state: a buffer either decodes completely or yields an error,
//! so a malformed notification can't leave a half-applied update behind.

use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

use super::codec::{self, CodecError};
use super::{
    CameraCharacteristic, Category, ColorGroup, DataType, MetadataField, TransportMode,
    HEADER_LEN, PAYLOAD_OFFSET, PROTOCOL_MARKER,
};
pub use crate::domain::models::TransportStatus;
use crate::domain::models::{ColorChannels, PowerStatus, Timecode, VideoMode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    #[error("buffer of {0} bytes is shorter than the 8-byte header")]
    TooShort(usize),

    #[error("missing protocol marker, got {0:#04x}")]
    BadMarker(u8),

    #[error("unknown category {0}")]
    UnknownCategory(u8),

    #[error("value {0} does not fit a 32-bit field")]
    IntegerOverflow(i64),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    Timecode(Timecode),
    CameraStatus(u8),
    Lens(LensTelemetry),
    Video(VideoTelemetry),
    Audio(AudioTelemetry),
    Display(DisplayTelemetry),
    Tally(TallyTelemetry),
    Reference(ReferenceTelemetry),
    Config(ConfigTelemetry),
    Color(ColorTelemetry),
    Power(PowerStatus),
    Media(MediaTelemetry),
    Metadata(MetadataTelemetry),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LensTelemetry {
    Focus(f64),
    AutoFocusTriggered,
    Aperture { units: u16 },
    ApertureNormalized(f64),
    ApertureOrdinal(i16),
    AutoApertureTriggered,
    ImageStabilisation(bool),
    Zoom(i16),
    ZoomNormalized(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoTelemetry {
    Mode(VideoMode),
    WhiteBalance { kelvin: i16, tint: i16 },
    AutoWhiteBalanceTriggered,
    AutoWhiteBalanceRestored,
    /// Exposure time in microseconds.
    Exposure(i32),
    DynamicRange(i8),
    Sharpening(i8),
    AutoExposureMode(i8),
    /// Shutter angle in hundredths of a degree.
    ShutterAngle(i32),
    ShutterSpeed(i32),
    Gain(i8),
    Iso(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioTelemetry {
    MicLevel(f64),
    HeadphoneLevel(f64),
    HeadphoneProgramMix(f64),
    SpeakerLevel(f64),
    InputType(i8),
    InputLevels { left: f64, right: f64 },
    PhantomPower(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayTelemetry {
    Brightness(f64),
    /// Bit flags: zebra, focus assist (peaking), false color.
    Tools(i16),
    ZebraLevel(f64),
    PeakingLevel(f64),
    ColorBarsSeconds(i8),
    FocusAssist { method: i8, color: i8 },
    TimecodeDisplay(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TallyTelemetry {
    Brightness(f64),
    Front(f64),
    Rear(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceTelemetry {
    Source(i8),
    Offset(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigTelemetry {
    /// BCD-packed time of day and date.
    Clock { time: i32, date: i32 },
    Language(String),
    /// Minutes offset from UTC.
    Timezone(i32),
    Location { latitude: i64, longitude: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorTelemetry {
    Channels(ColorGroup, ColorChannels),
    Contrast { pivot: f64, adjust: f64 },
    LumaMix(f64),
    HueSaturation { hue: f64, saturation: f64 },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaTelemetry {
    Codec { codec: u8, variant: u8 },
    Transport(TransportStatus),
    Playback { next: bool, frame: bool },
    StillCaptured,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataTelemetry {
    Reel(i16),
    SceneTags { tags: i8, location: i8, day: i8 },
    Take { number: i8, tags: i8 },
    GoodTake(bool),
    SlateMode(i8),
    Text(MetadataField, String),
}

/// Decode a notification from any camera characteristic.
///
/// `Ok(None)` means the buffer was understood but carries nothing to apply
/// (an unknown parameter, an unimplemented category, or a characteristic that
/// never carries telemetry).
pub fn decode(characteristic: Uuid, value: &[u8]) -> Result<Option<Telemetry>, TelemetryError> {
    match CameraCharacteristic::from_uuid(characteristic) {
        Some(CameraCharacteristic::Timecode) => {
            decode_timecode(value).map(|tc| Some(Telemetry::Timecode(tc)))
        }
        Some(CameraCharacteristic::IncomingControl) => decode_control(value),
        Some(CameraCharacteristic::CameraStatus) => {
            Ok(Some(Telemetry::CameraStatus(codec::u8_at(value, 0)?)))
        }
        _ => {
            trace!("Ignoring notification from {}", characteristic);
            Ok(None)
        }
    }
}

/// Timecode notification: BCD frames, seconds, minutes, hours at offsets 8-11.
pub fn decode_timecode(value: &[u8]) -> Result<Timecode, TelemetryError> {
    Ok(Timecode {
        frames: codec::bcd_to_int(codec::u8_at(value, 8)?)?,
        seconds: codec::bcd_to_int(codec::u8_at(value, 9)?)?,
        minutes: codec::bcd_to_int(codec::u8_at(value, 10)?)?,
        hours: codec::bcd_to_int(codec::u8_at(value, 11)?)?,
    })
}

/// Decode an incoming-control notification by category, then parameter.
pub fn decode_control(value: &[u8]) -> Result<Option<Telemetry>, TelemetryError> {
    let frame = Frame::parse(value)?;
    trace!(
        "Control notification {}.{} type {:#04x}: {:02X?}",
        frame.category,
        frame.parameter,
        frame.data_type,
        value
    );

    let category =
        Category::try_from(frame.category).map_err(TelemetryError::UnknownCategory)?;

    let telemetry = match category {
        Category::Lens => lens(&frame)?.map(Telemetry::Lens),
        Category::Video => video(&frame)?.map(Telemetry::Video),
        Category::Audio => audio(&frame)?.map(Telemetry::Audio),
        Category::Display => display(&frame)?.map(Telemetry::Display),
        Category::Tally => tally(&frame)?.map(Telemetry::Tally),
        Category::Reference => reference(&frame)?.map(Telemetry::Reference),
        Category::Configuration => config(&frame)?.map(Telemetry::Config),
        Category::ColorCorrection => color(&frame)?.map(Telemetry::Color),
        Category::Status => status(&frame)?.map(Telemetry::Power),
        Category::Media => media(&frame)?.map(Telemetry::Media),
        Category::Metadata => metadata(&frame)?.map(Telemetry::Metadata),
        Category::Output | Category::PanTiltZoom => None,
    };

    if telemetry.is_none() {
        debug!(
            "Unhandled {:?} parameter {}: {:02X?}",
            category, frame.parameter, value
        );
    }
    Ok(telemetry)
}

/// View over an inbound control buffer.
struct Frame<'a> {
    bytes: &'a [u8],
    category: u8,
    parameter: u8,
    data_type: u8,
}

impl<'a> Frame<'a> {
    fn parse(bytes: &'a [u8]) -> Result<Self, TelemetryError> {
        if bytes.len() < PAYLOAD_OFFSET {
            return Err(TelemetryError::TooShort(bytes.len()));
        }
        if bytes[0] != PROTOCOL_MARKER {
            return Err(TelemetryError::BadMarker(bytes[0]));
        }
        Ok(Self {
            bytes,
            category: bytes[4],
            parameter: bytes[5],
            data_type: bytes[6],
        })
    }

    fn i8(&self, index: usize) -> Result<i8, CodecError> {
        codec::i8_at(self.bytes, PAYLOAD_OFFSET + index)
    }

    fn u8(&self, index: usize) -> Result<u8, CodecError> {
        codec::u8_at(self.bytes, PAYLOAD_OFFSET + index)
    }

    fn bool(&self) -> Result<bool, CodecError> {
        codec::bool_at(self.bytes, PAYLOAD_OFFSET)
    }

    fn i16(&self, index: usize) -> Result<i16, CodecError> {
        codec::i16_at(self.bytes, PAYLOAD_OFFSET + 2 * index)
    }

    fn u16(&self, index: usize) -> Result<u16, CodecError> {
        codec::u16_at(self.bytes, PAYLOAD_OFFSET + 2 * index)
    }

    fn fixed(&self, index: usize) -> Result<f64, CodecError> {
        self.i16(index).map(codec::fixed_to_float)
    }

    fn i32(&self, index: usize) -> Result<i32, CodecError> {
        codec::i32_at(self.bytes, PAYLOAD_OFFSET + 4 * index)
    }

    fn i64(&self, index: usize) -> Result<i64, CodecError> {
        codec::i64_at(self.bytes, PAYLOAD_OFFSET + 8 * index)
    }

    /// Read a single integer whose width follows the data-type byte, falling
    /// back to `default` when the type byte is not an integer type.
    fn integer(&self, default: DataType) -> Result<i32, TelemetryError> {
        let data_type = match DataType::try_from(self.data_type) {
            Ok(t @ (DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64)) => t,
            _ => default,
        };
        Ok(match data_type {
            DataType::Int8 => i32::from(self.i8(0)?),
            DataType::Int16 => i32::from(self.i16(0)?),
            DataType::Int64 => {
                let value = self.i64(0)?;
                i32::try_from(value).map_err(|_| TelemetryError::IntegerOverflow(value))?
            }
            _ => self.i32(0)?,
        })
    }

    /// Variable-length text: the bytes from offset 8 up to the length declared in
    /// the header, without trailing NUL padding.
    fn text(&self) -> String {
        let declared = HEADER_LEN + usize::from(self.bytes[1]);
        let end = declared.clamp(PAYLOAD_OFFSET, self.bytes.len());
        let raw = &self.bytes[PAYLOAD_OFFSET..end];
        let len = raw.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
        String::from_utf8_lossy(&raw[..len]).into_owned()
    }
}

fn lens(frame: &Frame) -> Result<Option<LensTelemetry>, TelemetryError> {
    Ok(Some(match frame.parameter {
        0 => LensTelemetry::Focus(frame.fixed(0)?),
        1 => LensTelemetry::AutoFocusTriggered,
        2 => LensTelemetry::Aperture {
            units: frame.u16(0)?,
        },
        3 => LensTelemetry::ApertureNormalized(frame.fixed(0)?),
        4 => LensTelemetry::ApertureOrdinal(frame.i16(0)?),
        5 => LensTelemetry::AutoApertureTriggered,
        6 => LensTelemetry::ImageStabilisation(frame.bool()?),
        7 => LensTelemetry::Zoom(frame.i16(0)?),
        8 => LensTelemetry::ZoomNormalized(frame.fixed(0)?),
        _ => return Ok(None),
    }))
}

fn video(frame: &Frame) -> Result<Option<VideoTelemetry>, TelemetryError> {
    Ok(Some(match frame.parameter {
        0 => VideoTelemetry::Mode(VideoMode {
            frame_rate: frame.i8(0)?,
            m_rate: frame.i8(1)?,
            dimensions: frame.i8(2)?,
            interlaced: frame.i8(3)? != 0,
            color_space: frame.i8(4)?,
        }),
        2 => VideoTelemetry::WhiteBalance {
            kelvin: frame.i16(0)?,
            tint: frame.i16(1)?,
        },
        3 => VideoTelemetry::AutoWhiteBalanceTriggered,
        4 => VideoTelemetry::AutoWhiteBalanceRestored,
        5 => VideoTelemetry::Exposure(frame.i32(0)?),
        7 => VideoTelemetry::DynamicRange(frame.i8(0)?),
        8 => VideoTelemetry::Sharpening(frame.i8(0)?),
        10 => VideoTelemetry::AutoExposureMode(frame.i8(0)?),
        11 => VideoTelemetry::ShutterAngle(frame.integer(DataType::Int32)?),
        12 => VideoTelemetry::ShutterSpeed(frame.integer(DataType::Int32)?),
        13 => VideoTelemetry::Gain(frame.i8(0)?),
        14 => VideoTelemetry::Iso(frame.integer(DataType::Int32)?),
        _ => return Ok(None),
    }))
}

fn audio(frame: &Frame) -> Result<Option<AudioTelemetry>, TelemetryError> {
    Ok(Some(match frame.parameter {
        0 => AudioTelemetry::MicLevel(frame.fixed(0)?),
        1 => AudioTelemetry::HeadphoneLevel(frame.fixed(0)?),
        2 => AudioTelemetry::HeadphoneProgramMix(frame.fixed(0)?),
        3 => AudioTelemetry::SpeakerLevel(frame.fixed(0)?),
        4 => AudioTelemetry::InputType(frame.i8(0)?),
        5 => AudioTelemetry::InputLevels {
            left: frame.fixed(0)?,
            right: frame.fixed(1)?,
        },
        6 => AudioTelemetry::PhantomPower(frame.bool()?),
        _ => return Ok(None),
    }))
}

fn display(frame: &Frame) -> Result<Option<DisplayTelemetry>, TelemetryError> {
    Ok(Some(match frame.parameter {
        0 => DisplayTelemetry::Brightness(frame.fixed(0)?),
        1 => DisplayTelemetry::Tools(frame.i16(0)?),
        2 => DisplayTelemetry::ZebraLevel(frame.fixed(0)?),
        3 => DisplayTelemetry::PeakingLevel(frame.fixed(0)?),
        4 => DisplayTelemetry::ColorBarsSeconds(frame.i8(0)?),
        5 => DisplayTelemetry::FocusAssist {
            method: frame.i8(0)?,
            color: frame.i8(1)?,
        },
        7 => DisplayTelemetry::TimecodeDisplay(frame.i8(0)? != 0),
        _ => return Ok(None),
    }))
}

fn tally(frame: &Frame) -> Result<Option<TallyTelemetry>, TelemetryError> {
    Ok(Some(match frame.parameter {
        0 => TallyTelemetry::Brightness(frame.fixed(0)?),
        1 => TallyTelemetry::Front(frame.fixed(0)?),
        2 => TallyTelemetry::Rear(frame.fixed(0)?),
        _ => return Ok(None),
    }))
}

fn reference(frame: &Frame) -> Result<Option<ReferenceTelemetry>, TelemetryError> {
    Ok(Some(match frame.parameter {
        0 => ReferenceTelemetry::Source(frame.i8(0)?),
        1 => ReferenceTelemetry::Offset(frame.i32(0)?),
        _ => return Ok(None),
    }))
}

fn config(frame: &Frame) -> Result<Option<ConfigTelemetry>, TelemetryError> {
    Ok(Some(match frame.parameter {
        0 => ConfigTelemetry::Clock {
            time: frame.i32(0)?,
            date: frame.i32(1)?,
        },
        1 => ConfigTelemetry::Language(frame.text()),
        2 => ConfigTelemetry::Timezone(frame.i32(0)?),
        3 => ConfigTelemetry::Location {
            latitude: frame.i64(0)?,
            longitude: frame.i64(1)?,
        },
        _ => return Ok(None),
    }))
}

fn color(frame: &Frame) -> Result<Option<ColorTelemetry>, TelemetryError> {
    if let Some(group) = ColorGroup::from_parameter(frame.parameter) {
        return Ok(Some(ColorTelemetry::Channels(
            group,
            ColorChannels {
                red: frame.fixed(0)?,
                green: frame.fixed(1)?,
                blue: frame.fixed(2)?,
                luma: frame.fixed(3)?,
            },
        )));
    }
    Ok(Some(match frame.parameter {
        4 => ColorTelemetry::Contrast {
            pivot: frame.fixed(0)?,
            adjust: frame.fixed(1)?,
        },
        5 => ColorTelemetry::LumaMix(frame.fixed(0)?),
        6 => ColorTelemetry::HueSaturation {
            hue: frame.fixed(0)?,
            saturation: frame.fixed(1)?,
        },
        7 => ColorTelemetry::Reset,
        _ => return Ok(None),
    }))
}

fn status(frame: &Frame) -> Result<Option<PowerStatus>, TelemetryError> {
    match frame.parameter {
        0 => Ok(Some(PowerStatus {
            ticker: frame.u8(0)?,
            charge: frame.u8(1)?,
            power_source: frame.u8(4)?,
        })),
        _ => Ok(None),
    }
}

fn media(frame: &Frame) -> Result<Option<MediaTelemetry>, TelemetryError> {
    Ok(Some(match frame.parameter {
        0 => MediaTelemetry::Codec {
            codec: frame.u8(0)?,
            variant: frame.u8(1)?,
        },
        1 => MediaTelemetry::Transport(TransportStatus {
            mode: TransportMode::from(frame.i8(0)?),
            speed: frame.i8(1).unwrap_or(0),
            flags: frame.u8(2).unwrap_or(0),
            slot_1: frame.u8(3).unwrap_or(0),
            slot_2: frame.u8(4).unwrap_or(0),
        }),
        2 => MediaTelemetry::Playback {
            next: frame.i8(0)? != 0,
            frame: frame.i8(1).unwrap_or(0) != 0,
        },
        3 => MediaTelemetry::StillCaptured,
        _ => return Ok(None),
    }))
}

fn metadata(frame: &Frame) -> Result<Option<MetadataTelemetry>, TelemetryError> {
    if let Some(field) = MetadataField::from_parameter(frame.parameter) {
        return Ok(Some(MetadataTelemetry::Text(field, frame.text())));
    }
    Ok(Some(match frame.parameter {
        0 => MetadataTelemetry::Reel(frame.i16(0)?),
        1 => MetadataTelemetry::SceneTags {
            tags: frame.i8(0)?,
            location: frame.i8(1).unwrap_or(0),
            day: frame.i8(2).unwrap_or(0),
        },
        3 => MetadataTelemetry::Take {
            number: frame.i8(0)?,
            tags: frame.i8(1).unwrap_or(0),
        },
        4 => MetadataTelemetry::GoodTake(frame.bool()?),
        14 => MetadataTelemetry::SlateMode(frame.i8(0)?),
        _ => return Ok(None),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bluetooth::protocol::{
        CAMERA_STATUS_UUID, DEVICE_NAME_UUID, INCOMING_CONTROL_UUID, TIMECODE_UUID,
    };

    fn control(category: u8, parameter: u8, data_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![
            0xFF,
            (4 + payload.len()) as u8,
            0,
            0,
            category,
            parameter,
            data_type,
            0,
        ];
        bytes.extend_from_slice(payload);
        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }
        bytes
    }

    #[test]
    fn test_timecode_bcd() {
        let value = [0, 0, 0, 0, 0, 0, 0, 0, 0x15, 0x30, 0x45, 0x12];
        let tc = decode_timecode(&value).unwrap();
        assert_eq!(
            tc,
            Timecode {
                hours: 12,
                minutes: 45,
                seconds: 30,
                frames: 15
            }
        );
        assert_eq!(
            decode(TIMECODE_UUID, &value).unwrap(),
            Some(Telemetry::Timecode(tc))
        );
    }

    #[test]
    fn test_timecode_rejects_bad_input() {
        let mut value = [0u8; 12];
        value[8] = 0x1A;
        assert_eq!(
            decode_timecode(&value),
            Err(TelemetryError::Codec(CodecError::InvalidBcd(0x1A)))
        );
        assert!(decode_timecode(&[0u8; 11]).is_err());
    }

    #[test]
    fn test_recording_transport() {
        let value = control(10, 1, 0x01, &[2, 0, 0, 1, 0]);
        let Some(Telemetry::Media(MediaTelemetry::Transport(status))) =
            decode(INCOMING_CONTROL_UUID, &value).unwrap()
        else {
            panic!("expected transport telemetry");
        };
        assert_eq!(status.mode, TransportMode::Record);
        assert_eq!(status.slot_1, 1);
    }

    #[test]
    fn test_transport_with_only_mode_byte() {
        let value = [0xFF, 0x05, 0, 0, 10, 1, 0x01, 0, 1];
        let telemetry = decode_control(&value).unwrap();
        assert!(matches!(
            telemetry,
            Some(Telemetry::Media(MediaTelemetry::Transport(TransportStatus {
                mode: TransportMode::Play,
                ..
            })))
        ));
    }

    #[test]
    fn test_white_balance_and_iso() {
        let value = control(1, 2, 0x02, &[0xE0, 0x15, 0xF6, 0xFF]);
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Video(VideoTelemetry::WhiteBalance {
                kelvin: 5600,
                tint: -10
            }))
        );

        let value = control(1, 14, 0x03, &1600i32.to_le_bytes());
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Video(VideoTelemetry::Iso(1600)))
        );
    }

    #[test]
    fn test_wide_iso_outside_i32_is_rejected() {
        let value = control(1, 14, 0x04, &3200i64.to_le_bytes());
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Video(VideoTelemetry::Iso(3200)))
        );

        let too_big = i64::from(i32::MAX) + 1;
        let value = control(1, 14, 0x04, &too_big.to_le_bytes());
        assert_eq!(
            decode_control(&value),
            Err(TelemetryError::IntegerOverflow(too_big))
        );
    }

    #[test]
    fn test_shutter_speed_width_follows_type() {
        let value = control(1, 12, 0x02, &50i16.to_le_bytes());
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Video(VideoTelemetry::ShutterSpeed(50)))
        );
        let value = control(1, 12, 0x03, &2000i32.to_le_bytes());
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Video(VideoTelemetry::ShutterSpeed(2000)))
        );
    }

    #[test]
    fn test_aperture_units() {
        let value = control(0, 2, 0x80, &8192u16.to_le_bytes());
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Lens(LensTelemetry::Aperture { units: 8192 }))
        );
    }

    #[test]
    fn test_color_channels() {
        let mut payload = Vec::new();
        for v in [1024i16, -1024, 0, 2048] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        let value = control(8, 0, 0x80, &payload);
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Color(ColorTelemetry::Channels(
                ColorGroup::Lift,
                ColorChannels {
                    red: 0.5,
                    green: -0.5,
                    blue: 0.0,
                    luma: 1.0
                }
            )))
        );
    }

    #[test]
    fn test_metadata_text_uses_declared_length() {
        let value = control(12, 6, 0x05, b"Jo Smith");
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Metadata(MetadataTelemetry::Text(
                MetadataField::CameraOperator,
                "Jo Smith".to_string()
            )))
        );

        // declared length larger than the buffer: take what is there
        let mut value = control(12, 2, 0x05, b"12B");
        value[1] = 40;
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Metadata(MetadataTelemetry::Text(
                MetadataField::Scene,
                "12B".to_string()
            )))
        );
    }

    #[test]
    fn test_config_location_uses_i64() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&(-1234567890123i64).to_le_bytes());
        payload.extend_from_slice(&987654321i64.to_le_bytes());
        let value = control(7, 3, 0x04, &payload);
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Config(ConfigTelemetry::Location {
                latitude: -1234567890123,
                longitude: 987654321
            }))
        );
    }

    #[test]
    fn test_power_status() {
        let value = control(9, 0, 0x01, &[7, 80, 0, 0, 0x19]);
        assert_eq!(
            decode_control(&value).unwrap(),
            Some(Telemetry::Power(PowerStatus {
                ticker: 7,
                charge: 80,
                power_source: 0x19
            }))
        );
    }

    #[test]
    fn test_camera_status_characteristic() {
        assert_eq!(
            decode(CAMERA_STATUS_UUID, &[0x21]).unwrap(),
            Some(Telemetry::CameraStatus(0x21))
        );
        assert!(decode(CAMERA_STATUS_UUID, &[]).is_err());
        assert_eq!(decode(DEVICE_NAME_UUID, b"A").unwrap(), None);
    }

    #[test]
    fn test_unknown_parameters_are_ignored() {
        assert_eq!(decode_control(&control(0, 99, 0, &[])).unwrap(), None);
        assert_eq!(decode_control(&control(11, 0, 0, &[])).unwrap(), None);
        assert_eq!(decode_control(&control(3, 0, 0x02, &[1, 0])).unwrap(), None);
    }

    #[test]
    fn test_malformed_buffers() {
        assert_eq!(decode_control(&[0xFF, 4, 0, 0]), Err(TelemetryError::TooShort(4)));
        assert_eq!(
            decode_control(&[0x00, 4, 0, 0, 0, 1, 0, 0]),
            Err(TelemetryError::BadMarker(0x00))
        );
        assert_eq!(
            decode_control(&control(13, 0, 0, &[])),
            Err(TelemetryError::UnknownCategory(13))
        );
        // white balance needs 4 payload bytes
        assert!(decode_control(&[0xFF, 6, 0, 0, 1, 2, 2, 0, 0xE0, 0x15]).is_err());
        // ISO needs 4 payload bytes
        assert!(decode_control(&[0xFF, 6, 0, 0, 1, 14, 3, 0, 0x40, 0x06]).is_err());
        // transport needs the mode byte
        assert!(decode_control(&[0xFF, 4, 0, 0, 10, 1, 1, 0]).is_err());
    }
}
