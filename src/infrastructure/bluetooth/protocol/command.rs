//! Camera Commands
//!
//! Builders for every outbound operation. Each builder validates its arguments
//! before a [`Command`] exists, so nothing out of range is ever transmitted.

use std::ops::RangeInclusive;

use thiserror::Error;

use super::codec::{float_to_fixed, fstop_to_units};
use super::{
    Category, ColorGroup, DataType, MetadataField, TransportMode, HEADER_LEN, MAX_CAMERA_NAME_LEN,
    MAX_PAYLOAD_LEN, PAYLOAD_OFFSET, PROTOCOL_MARKER,
};
use crate::infrastructure::bluetooth::transport::TransportError;

pub const APERTURE_RANGE: RangeInclusive<f64> = 1.0..=22.0;
pub const APERTURE_NORMALIZED_RANGE: RangeInclusive<f64> = 0.0..=1.0;
pub const FOCUS_OFFSET_RANGE: RangeInclusive<f64> = -1.0..=1.0;
pub const WHITE_BALANCE_RANGE: RangeInclusive<i16> = 2500..=10000;
pub const TINT_RANGE: RangeInclusive<i16> = -50..=50;
pub const SHUTTER_SPEED_RANGE: RangeInclusive<i32> = 24..=5000;
pub const ISO_RANGE: RangeInclusive<i32> = 100..=25600;
/// Widest per-channel color value whose fixed-point form still fits in 16 bits
/// with headroom; covers lift (±2), gamma (±4), gain and offset (±8).
pub const COLOR_CHANNEL_RANGE: RangeInclusive<f64> = -8.0..=8.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("{name} {value} is outside {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("payload of {0} bytes exceeds the {MAX_PAYLOAD_LEN} byte limit")]
    PayloadTooLarge(usize),

    #[error("invalid camera name: {0}")]
    InvalidName(&'static str),

    #[error("transport unavailable: {0}")]
    TransportUnavailable(&'static str),

    #[error("transport write failed: {0}")]
    Transport(#[from] TransportError),
}

fn check<T>(name: &'static str, value: T, range: RangeInclusive<T>) -> Result<T, CommandError>
where
    T: PartialOrd + Copy + Into<f64>,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(CommandError::OutOfRange {
            name,
            value: value.into(),
            min: (*range.start()).into(),
            max: (*range.end()).into(),
        })
    }
}

/// A fully-formed outbound command. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    category: Category,
    parameter: u8,
    data_type: DataType,
    payload: Vec<u8>,
}

impl Command {
    pub fn new(
        category: Category,
        parameter: u8,
        data_type: DataType,
        payload: Vec<u8>,
    ) -> Result<Self, CommandError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(CommandError::PayloadTooLarge(payload.len()));
        }
        Ok(Self {
            category,
            parameter,
            data_type,
            payload,
        })
    }

    fn void(category: Category, parameter: u8) -> Self {
        Self {
            category,
            parameter,
            data_type: DataType::Void,
            payload: Vec::new(),
        }
    }

    fn int8(category: Category, parameter: u8, values: &[i8]) -> Self {
        Self {
            category,
            parameter,
            data_type: DataType::Int8,
            payload: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn int16(category: Category, parameter: u8, data_type: DataType, values: &[i16]) -> Self {
        Self {
            category,
            parameter,
            data_type,
            payload: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn int32(category: Category, parameter: u8, value: i32) -> Self {
        Self {
            category,
            parameter,
            data_type: DataType::Int32,
            payload: value.to_le_bytes().to_vec(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn parameter(&self) -> u8 {
        self.parameter
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Serialize to the wire: header, selector block, payload, zero padding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let unpadded = PAYLOAD_OFFSET + self.payload.len();
        let total = unpadded.next_multiple_of(4);

        let mut bytes = Vec::with_capacity(total);
        bytes.push(PROTOCOL_MARKER);
        bytes.push((unpadded - HEADER_LEN) as u8);
        bytes.push(0x00); // command id
        bytes.push(0x00); // reserved
        bytes.push(self.category as u8);
        bytes.push(self.parameter);
        bytes.push(self.data_type as u8);
        bytes.push(0x00); // operation: assign
        bytes.extend_from_slice(&self.payload);
        bytes.resize(total, 0);
        bytes
    }
}

pub fn auto_focus() -> Command {
    Command::void(Category::Lens, 1)
}

/// Move focus by a normalized offset.
pub fn focus(offset: f64) -> Result<Command, CommandError> {
    let offset = check("focus offset", offset, FOCUS_OFFSET_RANGE)?;
    Ok(Command::int16(
        Category::Lens,
        0,
        DataType::Fixed16,
        &[float_to_fixed(offset)],
    ))
}

pub fn auto_aperture() -> Command {
    Command::void(Category::Lens, 5)
}

/// Set the iris by f-number.
pub fn aperture(fstop: f64) -> Result<Command, CommandError> {
    let fstop = check("aperture", fstop, APERTURE_RANGE)?;
    Ok(Command::int16(
        Category::Lens,
        2,
        DataType::Fixed16,
        &[fstop_to_units(fstop)],
    ))
}

/// Set the iris on a 0.0 (open) to 1.0 (closed) scale.
pub fn aperture_normalized(value: f64) -> Result<Command, CommandError> {
    let value = check("normalized aperture", value, APERTURE_NORMALIZED_RANGE)?;
    Ok(Command::int16(
        Category::Lens,
        3,
        DataType::Int16,
        &[float_to_fixed(value)],
    ))
}

/// Set the iris by lens step index.
pub fn aperture_step(step: i16) -> Result<Command, CommandError> {
    let step = check("aperture step", step, 0..=i16::MAX)?;
    Ok(Command::int16(Category::Lens, 4, DataType::Int16, &[step]))
}

/// Manual white balance in Kelvin with tint.
///
/// The camera expects data type 0x03 here even though the payload is two 16-bit
/// values.
pub fn white_balance(kelvin: i16, tint: i16) -> Result<Command, CommandError> {
    let kelvin = check("white balance", kelvin, WHITE_BALANCE_RANGE)?;
    let tint = check("tint", tint, TINT_RANGE)?;
    Ok(Command::int16(
        Category::Video,
        2,
        DataType::Int32,
        &[kelvin, tint],
    ))
}

pub fn auto_white_balance() -> Command {
    Command::void(Category::Video, 3)
}

pub fn restore_auto_white_balance() -> Command {
    Command::void(Category::Video, 4)
}

/// Shutter speed as the denominator of 1/x seconds.
pub fn shutter_speed(denominator: i32) -> Result<Command, CommandError> {
    let denominator = check("shutter speed", denominator, SHUTTER_SPEED_RANGE)?;
    Ok(Command::int16(
        Category::Video,
        12,
        DataType::Int16,
        &[denominator as i16],
    ))
}

/// Sensor gain in decibels.
pub fn gain(db: i8) -> Command {
    Command::int8(Category::Video, 13, &[db])
}

pub fn iso(iso: i32) -> Result<Command, CommandError> {
    let iso = check("ISO", iso, ISO_RANGE)?;
    Ok(Command::int32(Category::Video, 14, iso))
}

/// Timecode source on the camera display: clip time or timecode.
pub fn timecode_display(timecode: bool) -> Command {
    Command::int8(Category::Display, 7, &[i8::from(timecode)])
}

/// Lift, gamma, gain or offset for red, green, blue and luma.
pub fn color_correction(
    group: ColorGroup,
    red: f64,
    green: f64,
    blue: f64,
    luma: f64,
) -> Result<Command, CommandError> {
    let mut channels = [0i16; 4];
    for (slot, (name, value)) in channels.iter_mut().zip([
        ("red", red),
        ("green", green),
        ("blue", blue),
        ("luma", luma),
    ]) {
        *slot = float_to_fixed(check(name, value, COLOR_CHANNEL_RANGE)?);
    }
    Ok(Command::int16(
        Category::ColorCorrection,
        group as u8,
        DataType::Fixed16,
        &channels,
    ))
}

pub fn color_correction_reset() -> Command {
    Command::void(Category::ColorCorrection, 7)
}

pub fn capture_still() -> Command {
    Command::void(Category::Media, 3)
}

pub fn transport(mode: TransportMode) -> Command {
    Command::int8(Category::Media, 1, &[i8::from(mode)])
}

pub fn record(start: bool) -> Command {
    transport(if start {
        TransportMode::Record
    } else {
        TransportMode::Preview
    })
}

pub fn play(start: bool) -> Command {
    transport(if start {
        TransportMode::Play
    } else {
        TransportMode::Preview
    })
}

/// Skip to the next or previous clip during playback.
pub fn playback(next: bool) -> Command {
    Command::int8(Category::Media, 2, &[i8::from(next), 0])
}

pub fn metadata_text(field: MetadataField, text: &str) -> Result<Command, CommandError> {
    Command::new(
        Category::Metadata,
        field.parameter(),
        DataType::Utf8,
        text.as_bytes().to_vec(),
    )
}

/// Raw bytes for the device-name characteristic.
pub fn camera_name(name: &str) -> Result<Vec<u8>, CommandError> {
    if name.is_empty() {
        return Err(CommandError::InvalidName("name is empty"));
    }
    if !name.is_ascii() {
        return Err(CommandError::InvalidName("name must be ASCII"));
    }
    if name.len() > MAX_CAMERA_NAME_LEN {
        return Err(CommandError::InvalidName("name is longer than 32 bytes"));
    }
    Ok(name.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_framed(bytes: &[u8]) {
        assert!(!bytes.is_empty());
        assert_eq!(bytes.len() % 4, 0);
        assert!(bytes.len() <= 64);
        assert_eq!(bytes[0], 0xFF);
        assert_eq!(&bytes[2..4], &[0x00, 0x00]);
    }

    #[test]
    fn test_white_balance_scenario() {
        let bytes = white_balance(5600, 10).unwrap().to_bytes();
        assert_eq!(
            bytes,
            vec![0xFF, 0x08, 0x00, 0x00, 0x01, 0x02, 0x03, 0x00, 0xE0, 0x15, 0x0A, 0x00]
        );
    }

    #[test]
    fn test_void_commands() {
        assert_eq!(
            auto_focus().to_bytes(),
            vec![0xFF, 0x04, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00]
        );
        assert_eq!(auto_aperture().to_bytes()[4..6], [0x00, 0x05]);
        assert_eq!(auto_white_balance().to_bytes()[4..6], [0x01, 0x03]);
        assert_eq!(restore_auto_white_balance().to_bytes()[4..6], [0x01, 0x04]);
        assert_eq!(color_correction_reset().to_bytes()[4..6], [0x08, 0x07]);
        assert_eq!(capture_still().to_bytes()[4..6], [0x0A, 0x03]);
    }

    #[test]
    fn test_record_and_play() {
        assert_eq!(
            record(true).to_bytes(),
            vec![0xFF, 0x05, 0x00, 0x00, 0x0A, 0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00]
        );
        assert_eq!(record(false).to_bytes()[8], 0);
        assert_eq!(play(true).to_bytes()[8], 1);
        assert_eq!(play(false).to_bytes()[8], 0);
        assert_eq!(playback(true).to_bytes()[1..10], [0x06, 0, 0, 0x0A, 0x02, 0x01, 0, 1, 0]);
    }

    #[test]
    fn test_numeric_commands() {
        assert_eq!(
            iso(800).unwrap().to_bytes(),
            vec![0xFF, 0x08, 0x00, 0x00, 0x01, 0x0E, 0x03, 0x00, 0x20, 0x03, 0x00, 0x00]
        );
        assert_eq!(
            shutter_speed(50).unwrap().to_bytes(),
            vec![0xFF, 0x06, 0x00, 0x00, 0x01, 0x0C, 0x02, 0x00, 0x32, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            gain(-6).to_bytes(),
            vec![0xFF, 0x05, 0x00, 0x00, 0x01, 0x0D, 0x01, 0x00, 0xFA, 0x00, 0x00, 0x00]
        );
        assert_eq!(timecode_display(true).to_bytes()[4..9], [0x04, 0x07, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_aperture_encoding() {
        // log2(4^2) = 4.0 -> 4 * 2048
        let bytes = aperture(4.0).unwrap().to_bytes();
        assert_eq!(bytes[4..8], [0x00, 0x02, 0x80, 0x00]);
        assert_eq!(i16::from_le_bytes([bytes[8], bytes[9]]), 8192);

        let bytes = aperture_normalized(0.5).unwrap().to_bytes();
        assert_eq!(bytes[4..7], [0x00, 0x03, 0x02]);
        assert_eq!(i16::from_le_bytes([bytes[8], bytes[9]]), 1024);

        assert_eq!(aperture_step(3).unwrap().to_bytes()[8..10], [3, 0]);
    }

    #[test]
    fn test_color_correction_layout() {
        let bytes = color_correction(ColorGroup::Gamma, 0.5, -0.5, 0.0, 1.0)
            .unwrap()
            .to_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes[1], 12);
        assert_eq!(bytes[4..7], [0x08, 0x01, 0x80]);
        let channels: Vec<i16> = bytes[8..16]
            .chunks(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(channels, vec![1024, -1024, 0, 2048]);
    }

    #[test]
    fn test_relative_focus() {
        let bytes = focus(-0.25).unwrap().to_bytes();
        assert_eq!(bytes[4..8], [0x00, 0x00, 0x80, 0x00]);
        assert_eq!(i16::from_le_bytes([bytes[8], bytes[9]]), -512);
    }

    #[test]
    fn test_range_validation_rejects() {
        assert!(shutter_speed(23).is_err());
        assert!(shutter_speed(5001).is_err());
        assert!(shutter_speed(24).is_ok());
        assert!(shutter_speed(5000).is_ok());
        assert!(iso(99).is_err());
        assert!(iso(25601).is_err());
        assert!(white_balance(2499, 0).is_err());
        assert!(white_balance(10001, 0).is_err());
        assert!(white_balance(5600, 51).is_err());
        assert!(white_balance(5600, -51).is_err());
        assert!(aperture(0.9).is_err());
        assert!(aperture(22.1).is_err());
        assert!(aperture(f64::NAN).is_err());
        assert!(aperture_normalized(1.5).is_err());
        assert!(focus(2.0).is_err());
        assert!(color_correction(ColorGroup::Lift, 0.0, 9.0, 0.0, 0.0).is_err());
        assert!(aperture_step(-1).is_err());
    }

    #[test]
    fn test_out_of_range_message() {
        let err = iso(50).unwrap_err();
        assert_eq!(err.to_string(), "ISO 50 is outside 100..=25600");
    }

    #[test]
    fn test_every_builder_is_framed() {
        let commands = vec![
            auto_focus(),
            focus(0.1).unwrap(),
            auto_aperture(),
            aperture(2.8).unwrap(),
            aperture_normalized(0.3).unwrap(),
            aperture_step(2).unwrap(),
            white_balance(3200, -10).unwrap(),
            auto_white_balance(),
            restore_auto_white_balance(),
            shutter_speed(48).unwrap(),
            gain(12),
            iso(25600).unwrap(),
            timecode_display(false),
            color_correction(ColorGroup::Offset, 1.0, 1.0, 1.0, 1.0).unwrap(),
            color_correction_reset(),
            capture_still(),
            record(true),
            play(true),
            playback(false),
            metadata_text(MetadataField::Director, "A. Director").unwrap(),
            metadata_text(MetadataField::ProjectName, &"x".repeat(56)).unwrap(),
        ];
        for command in commands {
            let bytes = command.to_bytes();
            assert_framed(&bytes);
            assert_eq!(usize::from(bytes[1]), 4 + command.payload().len());
        }
    }

    #[test]
    fn test_metadata_payload_limit() {
        assert_eq!(
            metadata_text(MetadataField::Scene, &"x".repeat(57)),
            Err(CommandError::PayloadTooLarge(57))
        );
        let bytes = metadata_text(MetadataField::Scene, "12A").unwrap().to_bytes();
        assert_eq!(bytes, vec![0xFF, 0x07, 0, 0, 0x0C, 0x02, 0x05, 0, b'1', b'2', b'A', 0]);
    }

    #[test]
    fn test_camera_name_validation() {
        assert_eq!(camera_name("A-Cam").unwrap(), b"A-Cam".to_vec());
        assert!(camera_name("").is_err());
        assert!(camera_name("Kamera\u{e9}").is_err());
        assert!(camera_name(&"n".repeat(33)).is_err());
        assert!(camera_name(&"n".repeat(32)).is_ok());
    }
}
