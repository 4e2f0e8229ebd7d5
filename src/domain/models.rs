use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid Bluetooth address '{0}'")]
pub struct AddressError(pub String);

/// 48-bit link-layer address, kept in the low bits of a `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress(pub u64);

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0.to_be_bytes();
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[2], b[3], b[4], b[5], b[6], b[7]
        )
    }
}

impl FromStr for DeviceAddress {
    type Err = AddressError;

    /// Accepts `AA:BB:CC:DD:EE:FF`, `AA-BB-...` or plain hex (`0xAABBCCDDEEFF`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressError(s.to_string());
        let s = s.trim();
        let hex: String = if s.contains(':') || s.contains('-') {
            let parts: Vec<&str> = s.split([':', '-']).collect();
            if parts.len() != 6 || parts.iter().any(|p| p.len() != 2) {
                return Err(invalid());
            }
            parts.concat()
        } else {
            s.trim_start_matches("0x").trim_start_matches("0X").to_string()
        };
        if hex.is_empty() || hex.len() > 12 {
            return Err(invalid());
        }
        u64::from_str_radix(&hex, 16)
            .map(DeviceAddress)
            .map_err(|_| invalid())
    }
}

/// The four color-correction groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorGroup {
    Lift = 0,
    Gamma = 1,
    Gain = 2,
    Offset = 3,
}

/// Media transport mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    Preview,
    Play,
    Record,
    Other(i8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportStatus {
    pub mode: TransportMode,
    pub speed: i8,
    pub flags: u8,
    pub slot_1: u8,
    pub slot_2: u8,
}

/// Free-text metadata fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Scene,
    CameraId,
    CameraOperator,
    Director,
    ProjectName,
    LensType,
    LensIris,
    LensFocalLength,
    LensDistance,
    LensFilter,
    SlateTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timecode {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoMode {
    pub frame_rate: i8,
    /// 0 = regular, 1 = M-rate (fps / 1.001)
    pub m_rate: i8,
    pub dimensions: i8,
    pub interlaced: bool,
    pub color_space: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorChannels {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub luma: f64,
}

impl ColorChannels {
    pub const fn uniform(value: f64) -> Self {
        Self {
            red: value,
            green: value,
            blue: value,
            luma: value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerStatus {
    pub ticker: u8,
    /// Battery charge, percent.
    pub charge: u8,
    pub power_source: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LensState {
    pub focus: f64,
    /// Raw aperture units as reported by the camera.
    pub aperture_units: Option<u16>,
    pub aperture_normalized: f64,
    pub aperture_ordinal: i16,
    pub image_stabilisation: bool,
    /// Focal length in mm.
    pub zoom: i16,
    pub zoom_normalized: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoState {
    pub mode: Option<VideoMode>,
    pub white_balance: i16,
    pub tint: i16,
    pub exposure_us: i32,
    pub shutter_angle: i32,
    /// Denominator of 1/x seconds.
    pub shutter_speed: i32,
    pub gain: i8,
    pub iso: i32,
    pub dynamic_range: i8,
    pub sharpening: i8,
    pub auto_exposure_mode: i8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioState {
    pub mic_level: f64,
    pub headphone_level: f64,
    pub headphone_program_mix: f64,
    pub speaker_level: f64,
    pub input_type: i8,
    pub input_levels: (f64, f64),
    pub phantom_power: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayState {
    pub brightness: f64,
    pub tools: i16,
    pub zebra_level: f64,
    pub peaking_level: f64,
    pub color_bars_seconds: i8,
    pub focus_assist_method: i8,
    pub focus_assist_color: i8,
    /// true = timecode, false = clip time
    pub timecode_display: bool,
}

impl DisplayState {
    pub fn zebra(&self) -> bool {
        self.tools & 0x1 != 0
    }

    pub fn peaking(&self) -> bool {
        self.tools & 0x2 != 0
    }

    pub fn false_color(&self) -> bool {
        self.tools & 0x4 != 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TallyState {
    pub brightness: f64,
    pub front: f64,
    pub rear: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceState {
    pub source: i8,
    pub offset: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigState {
    pub time: i32,
    pub date: i32,
    pub language: String,
    pub timezone_minutes: i32,
    pub location: Option<(i64, i64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorState {
    pub lift: ColorChannels,
    pub gamma: ColorChannels,
    pub gain: ColorChannels,
    pub offset: ColorChannels,
    pub contrast_pivot: f64,
    pub contrast_adjust: f64,
    pub luma_mix: f64,
    pub hue: f64,
    pub saturation: f64,
}

impl Default for ColorState {
    fn default() -> Self {
        Self {
            lift: ColorChannels::default(),
            gamma: ColorChannels::default(),
            gain: ColorChannels::uniform(1.0),
            offset: ColorChannels::default(),
            contrast_pivot: 0.5,
            contrast_adjust: 1.0,
            luma_mix: 1.0,
            hue: 0.0,
            saturation: 1.0,
        }
    }
}

impl ColorState {
    pub fn group(&self, group: ColorGroup) -> &ColorChannels {
        match group {
            ColorGroup::Lift => &self.lift,
            ColorGroup::Gamma => &self.gamma,
            ColorGroup::Gain => &self.gain,
            ColorGroup::Offset => &self.offset,
        }
    }

    pub fn group_mut(&mut self, group: ColorGroup) -> &mut ColorChannels {
        match group {
            ColorGroup::Lift => &mut self.lift,
            ColorGroup::Gamma => &mut self.gamma,
            ColorGroup::Gain => &mut self.gain,
            ColorGroup::Offset => &mut self.offset,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaState {
    pub codec: u8,
    pub codec_variant: u8,
    pub transport: TransportStatus,
    pub recording: bool,
    pub playing: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataState {
    pub reel: i16,
    pub scene_tags: i8,
    pub location: i8,
    pub day: i8,
    pub take: i8,
    pub take_tags: i8,
    pub good_take: bool,
    pub slate_mode: i8,
    pub scene: String,
    pub camera_id: String,
    pub camera_operator: String,
    pub director: String,
    pub project_name: String,
    pub lens_type: String,
    pub lens_iris: String,
    pub lens_focal_length: String,
    pub lens_distance: String,
    pub lens_filter: String,
    pub slate_target: String,
}

impl MetadataState {
    pub fn text(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::Scene => &self.scene,
            MetadataField::CameraId => &self.camera_id,
            MetadataField::CameraOperator => &self.camera_operator,
            MetadataField::Director => &self.director,
            MetadataField::ProjectName => &self.project_name,
            MetadataField::LensType => &self.lens_type,
            MetadataField::LensIris => &self.lens_iris,
            MetadataField::LensFocalLength => &self.lens_focal_length,
            MetadataField::LensDistance => &self.lens_distance,
            MetadataField::LensFilter => &self.lens_filter,
            MetadataField::SlateTarget => &self.slate_target,
        }
    }

    pub fn text_mut(&mut self, field: MetadataField) -> &mut String {
        match field {
            MetadataField::Scene => &mut self.scene,
            MetadataField::CameraId => &mut self.camera_id,
            MetadataField::CameraOperator => &mut self.camera_operator,
            MetadataField::Director => &mut self.director,
            MetadataField::ProjectName => &mut self.project_name,
            MetadataField::LensType => &mut self.lens_type,
            MetadataField::LensIris => &mut self.lens_iris,
            MetadataField::LensFocalLength => &mut self.lens_focal_length,
            MetadataField::LensDistance => &mut self.lens_distance,
            MetadataField::LensFilter => &mut self.lens_filter,
            MetadataField::SlateTarget => &mut self.slate_target,
        }
    }
}

/// Observable groups of [`CameraState`]; one is reported per change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    Focus,
    Aperture,
    Zoom,
    ImageStabilisation,
    VideoMode,
    WhiteBalance,
    Exposure,
    ShutterSpeed,
    ShutterAngle,
    Gain,
    Iso,
    ImageProcessing,
    Audio,
    Display,
    TimecodeDisplay,
    Tally,
    Reference,
    Config,
    Color,
    Power,
    Codec,
    MediaSlots,
    Recording,
    Playing,
    Metadata,
    Timecode,
    Status,
}

/// Decoded projection of camera telemetry.
///
/// Fields are updated one notification at a time; nothing here is a
/// consistent snapshot of the camera.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraState {
    pub lens: LensState,
    pub video: VideoState,
    pub audio: AudioState,
    pub display: DisplayState,
    pub tally: TallyState,
    pub reference: ReferenceState,
    pub config: ConfigState,
    pub color: ColorState,
    pub power: Option<PowerStatus>,
    pub media: MediaState,
    pub metadata: MetadataState,
    pub timecode: Timecode,
    /// Raw camera-status characteristic byte.
    pub status: u8,
}

/// A camera seen during discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDevice {
    pub address: DeviceAddress,
    pub name: String,
    pub rssi: Option<i16>,
    pub last_seen: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    ServiceDiscovery,
    CharacteristicNegotiation,
    Ready,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::ServiceDiscovery => "discovering services",
            Self::CharacteristicNegotiation => "negotiating characteristics",
            Self::Ready => "ready",
        };
        f.write_str(text)
    }
}

/// Operator requests routed to the camera session.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraCommand {
    StartDiscovery,
    StopDiscovery,
    Connect(DeviceAddress),
    /// Connect to the n-th device of the last discovery.
    ConnectIndex(usize),
    Disconnect,
    AutoFocus,
    Focus(f64),
    AutoAperture,
    Aperture(f64),
    ApertureNormalized(f64),
    ApertureStep(i16),
    Gain(i8),
    Iso(i32),
    ShutterSpeed(i32),
    WhiteBalance { kelvin: i16, tint: i16 },
    AutoWhiteBalance,
    RestoreAutoWhiteBalance,
    Record(bool),
    Play(bool),
    Playback { next: bool },
    CaptureStill,
    ColorCorrection { group: ColorGroup, channels: ColorChannels },
    ColorCorrectionReset,
    TimecodeDisplay(bool),
    Metadata(MetadataField, String),
    CameraName(String),
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    StateChanged(StateField),
    ConnectionState(ConnectionState),
    ConnectedChanged(bool),
    NameChanged(String),
    Disconnected,
    ConnectionFailure(String),
    ControllerError(String),
    ControllerErrorChanged(bool),
    DiscoveringChanged(bool),
    DiscoveryStarted,
    DiscoveryFinished { devices: Vec<DiscoveredDevice> },
    DiscoveryError(String),
    DevicesUpdated,
    WriteFailed { characteristic: Uuid, reason: String },
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timecode_display() {
        let tc = Timecode {
            hours: 1,
            minutes: 2,
            seconds: 3,
            frames: 4,
        };
        assert_eq!(tc.to_string(), "01:02:03:04");
    }

    #[test]
    fn test_display_tool_flags() {
        let display = DisplayState {
            tools: 0b101,
            ..DisplayState::default()
        };
        assert!(display.zebra());
        assert!(!display.peaking());
        assert!(display.false_color());
    }

    #[test]
    fn test_color_groups() {
        let mut color = ColorState::default();
        color.group_mut(ColorGroup::Lift).red = -0.5;
        assert_eq!(color.lift.red, -0.5);
        assert_eq!(*color.group(ColorGroup::Gain), ColorChannels::uniform(1.0));
    }

    #[test]
    fn test_metadata_text_fields() {
        let mut metadata = MetadataState::default();
        *metadata.text_mut(MetadataField::Director) = "Ana".to_string();
        assert_eq!(metadata.text(MetadataField::Director), "Ana");
        assert_eq!(metadata.director, "Ana");
    }

    #[test]
    fn test_address_round_trip() {
        let address = DeviceAddress(0x00A1_B2C3_D4E5);
        assert_eq!(address.to_string(), "00:A1:B2:C3:D4:E5");
        assert_eq!("00:a1:b2:c3:d4:e5".parse::<DeviceAddress>(), Ok(address));
        assert_eq!("00-A1-B2-C3-D4-E5".parse::<DeviceAddress>(), Ok(address));
        assert_eq!("0xA1B2C3D4E5".parse::<DeviceAddress>(), Ok(address));
    }

    #[test]
    fn test_address_rejects_garbage() {
        assert!("".parse::<DeviceAddress>().is_err());
        assert!("00:A1:B2".parse::<DeviceAddress>().is_err());
        assert!("GG:A1:B2:C3:D4:E5".parse::<DeviceAddress>().is_err());
        assert_eq!(
            "1234567890ABC".parse::<DeviceAddress>(),
            Err(AddressError("1234567890ABC".to_string()))
        );
    }
}
