//! Blackmagic Camera Control Protocol
//!
//! GATT identifiers and the framing shared by outbound commands and inbound
//! telemetry.
//!
//! ```text
//! [0]   destination (0xFF = all / protocol marker)
//! [1]   length of everything after the 4-byte header, excluding padding
//! [2]   command id (0)
//! [3]   reserved (0)
//! [4]   category
//! [5]   parameter
//! [6]   data type
//! [7]   operation (0 = assign)
//! [8..] payload, zero padded to a multiple of 4 bytes
//! ```

pub mod codec;
pub mod command;
pub mod telemetry;

use uuid::Uuid;

pub use crate::domain::models::{ColorGroup, MetadataField, TransportMode};

/// Generic Access service.
pub const GENERIC_SERVICE_UUID: Uuid = Uuid::from_u128(0x00001800_0000_1000_8000_00805f9b34fb);

/// Device Information service.
pub const DEVICE_INFORMATION_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000180a_0000_1000_8000_00805f9b34fb);

/// Blackmagic Camera Service, advertised by every compatible camera.
pub const CAMERA_SERVICE_UUID: Uuid = Uuid::from_u128(0x291d567a_6d75_11e6_8b77_86f30ca893d3);

/// Commands are written here.
pub const OUTGOING_CONTROL_UUID: Uuid = Uuid::from_u128(0x5dd3465f_1aee_4299_8493_d2eca2f8e1bb);

/// Telemetry notifications arrive here.
pub const INCOMING_CONTROL_UUID: Uuid = Uuid::from_u128(0xb864e140_76a0_416a_bf30_5876504537d9);

pub const TIMECODE_UUID: Uuid = Uuid::from_u128(0x6d8f2110_86f1_41bf_9afb_451d87e976c8);

pub const CAMERA_STATUS_UUID: Uuid = Uuid::from_u128(0x7fe8691d_95dc_4fc5_8abd_ca74339b51b9);

pub const DEVICE_NAME_UUID: Uuid = Uuid::from_u128(0xffac0c52_c9fb_41a0_b063_cc76282eb89c);

/// Destination byte of every outbound command and marker byte of every inbound one.
pub const PROTOCOL_MARKER: u8 = 0xFF;

pub const HEADER_LEN: usize = 4;

/// Header plus the category/parameter/type/operation block.
pub const PAYLOAD_OFFSET: usize = 8;

pub const MAX_PACKET_LEN: usize = 64;

pub const MAX_PAYLOAD_LEN: usize = MAX_PACKET_LEN - PAYLOAD_OFFSET;

/// The camera name characteristic takes at most this many bytes.
pub const MAX_CAMERA_NAME_LEN: usize = 32;

/// Which of the camera service characteristics a UUID names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCharacteristic {
    OutgoingControl,
    IncomingControl,
    Timecode,
    CameraStatus,
    DeviceName,
}

impl CameraCharacteristic {
    pub const ALL: [Self; 5] = [
        Self::OutgoingControl,
        Self::IncomingControl,
        Self::Timecode,
        Self::CameraStatus,
        Self::DeviceName,
    ];

    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.uuid() == uuid)
    }

    pub fn uuid(self) -> Uuid {
        match self {
            Self::OutgoingControl => OUTGOING_CONTROL_UUID,
            Self::IncomingControl => INCOMING_CONTROL_UUID,
            Self::Timecode => TIMECODE_UUID,
            Self::CameraStatus => CAMERA_STATUS_UUID,
            Self::DeviceName => DEVICE_NAME_UUID,
        }
    }
}

/// Top-level protocol selector (byte 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Category {
    Lens = 0,
    Video = 1,
    Audio = 2,
    Output = 3,
    Display = 4,
    Tally = 5,
    Reference = 6,
    Configuration = 7,
    ColorCorrection = 8,
    /// Undocumented; carries power/battery status.
    Status = 9,
    Media = 10,
    PanTiltZoom = 11,
    Metadata = 12,
}

impl TryFrom<u8> for Category {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Lens,
            1 => Self::Video,
            2 => Self::Audio,
            3 => Self::Output,
            4 => Self::Display,
            5 => Self::Tally,
            6 => Self::Reference,
            7 => Self::Configuration,
            8 => Self::ColorCorrection,
            9 => Self::Status,
            10 => Self::Media,
            11 => Self::PanTiltZoom,
            12 => Self::Metadata,
            other => return Err(other),
        })
    }
}

/// Payload encoding discriminator (byte 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    /// Void or boolean
    Void = 0x00,
    Int8 = 0x01,
    Int16 = 0x02,
    Int32 = 0x03,
    Int64 = 0x04,
    Utf8 = 0x05,
    Fixed16 = 0x80,
}

impl TryFrom<u8> for DataType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Self::Void,
            0x01 => Self::Int8,
            0x02 => Self::Int16,
            0x03 => Self::Int32,
            0x04 => Self::Int64,
            0x05 => Self::Utf8,
            0x80 => Self::Fixed16,
            other => return Err(other),
        })
    }
}

/// Color-correction groups are category 8, parameters 0-3.
impl ColorGroup {
    pub fn from_parameter(parameter: u8) -> Option<Self> {
        match parameter {
            0 => Some(Self::Lift),
            1 => Some(Self::Gamma),
            2 => Some(Self::Gain),
            3 => Some(Self::Offset),
            _ => None,
        }
    }
}

/// Media transport mode is the first byte of category 10, parameter 1.
impl From<i8> for TransportMode {
    fn from(value: i8) -> Self {
        match value {
            0 => Self::Preview,
            1 => Self::Play,
            2 => Self::Record,
            other => Self::Other(other),
        }
    }
}

impl From<TransportMode> for i8 {
    fn from(mode: TransportMode) -> Self {
        match mode {
            TransportMode::Preview => 0,
            TransportMode::Play => 1,
            TransportMode::Record => 2,
            TransportMode::Other(v) => v,
        }
    }
}

/// Free-text metadata fields live in category 12.
impl MetadataField {
    pub fn parameter(self) -> u8 {
        match self {
            Self::Scene => 2,
            Self::CameraId => 5,
            Self::CameraOperator => 6,
            Self::Director => 7,
            Self::ProjectName => 8,
            Self::LensType => 9,
            Self::LensIris => 10,
            Self::LensFocalLength => 11,
            Self::LensDistance => 12,
            Self::LensFilter => 13,
            Self::SlateTarget => 15,
        }
    }

    pub fn from_parameter(parameter: u8) -> Option<Self> {
        Some(match parameter {
            2 => Self::Scene,
            5 => Self::CameraId,
            6 => Self::CameraOperator,
            7 => Self::Director,
            8 => Self::ProjectName,
            9 => Self::LensType,
            10 => Self::LensIris,
            11 => Self::LensFocalLength,
            12 => Self::LensDistance,
            13 => Self::LensFilter,
            15 => Self::SlateTarget,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristic_lookup() {
        for c in CameraCharacteristic::ALL {
            assert_eq!(CameraCharacteristic::from_uuid(c.uuid()), Some(c));
        }
        assert_eq!(CameraCharacteristic::from_uuid(CAMERA_SERVICE_UUID), None);
    }

    #[test]
    fn test_service_uuid_text() {
        assert_eq!(
            CAMERA_SERVICE_UUID.to_string(),
            "291d567a-6d75-11e6-8b77-86f30ca893d3"
        );
    }

    #[test]
    fn test_category_bytes() {
        assert_eq!(Category::try_from(10), Ok(Category::Media));
        assert_eq!(Category::try_from(13), Err(13));
        assert_eq!(Category::Metadata as u8, 12);
    }

    #[test]
    fn test_metadata_parameters_are_symmetric() {
        for p in 0..=16 {
            if let Some(field) = MetadataField::from_parameter(p) {
                assert_eq!(field.parameter(), p);
            }
        }
        assert_eq!(MetadataField::from_parameter(3), None);
    }

    #[test]
    fn test_color_group_parameters() {
        for group in [ColorGroup::Lift, ColorGroup::Gamma, ColorGroup::Gain, ColorGroup::Offset] {
            assert_eq!(ColorGroup::from_parameter(group as u8), Some(group));
        }
        assert_eq!(ColorGroup::from_parameter(4), None);
    }

    #[test]
    fn test_transport_mode_bytes() {
        assert_eq!(TransportMode::from(2), TransportMode::Record);
        assert_eq!(TransportMode::from(7), TransportMode::Other(7));
        assert_eq!(i8::from(TransportMode::Play), 1);
    }
}
