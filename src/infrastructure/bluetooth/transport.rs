//! BLE Transport Interface
//!
//! The narrow capability surface the camera engine needs from a BLE stack.
//! Every call only submits a request; its outcome comes back later as a
//! [`TransportEvent`] delivered on the channel the backend was built with.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no Bluetooth adapter available")]
    NoAdapter,

    #[error("no device connected")]
    NotConnected,

    #[error("characteristic {0} is not known to the transport")]
    UnknownCharacteristic(Uuid),

    #[error("{0}")]
    Backend(String),
}

pub use crate::domain::models::DeviceAddress;

/// Identifies one connection attempt. A backend hands out a fresh id from every
/// [`BleTransport::connect`] and tags that link's events with it, so events
/// from a superseded link can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link #{}", self.0)
    }
}

/// Link-layer technology reported with an advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    LowEnergy,
    Classic,
    Dual,
}

/// One advertisement as seen by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Advertisement {
    pub address: DeviceAddress,
    pub name: String,
    pub service_uuids: Vec<Uuid>,
    pub link_type: LinkType,
    /// dBm; `None` when the stack did not report one.
    pub rssi: Option<i16>,
}

/// GATT characteristic property bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharProperties(pub u8);

impl CharProperties {
    pub const READ: Self = Self(0x02);
    pub const WRITE_WITHOUT_RESPONSE: Self = Self(0x04);
    pub const WRITE: Self = Self(0x08);
    pub const NOTIFY: Self = Self(0x10);
    pub const INDICATE: Self = Self(0x20);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn can_write(self) -> bool {
        self.contains(Self::WRITE) || self.contains(Self::WRITE_WITHOUT_RESPONSE)
    }
}

impl std::ops::BitOr for CharProperties {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacteristicInfo {
    pub uuid: Uuid,
    pub properties: CharProperties,
    /// Value the stack already holds for the characteristic, if any.
    pub value: Option<Vec<u8>>,
}

/// How a characteristic's CCCD should be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Notify,
    Indicate,
}

/// Controller-level failures reported by the stack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The peripheral closed the link. A normal disconnect.
    #[error("remote host closed the connection")]
    RemoteHostClosed,

    /// The link could not be established or was lost abnormally.
    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Advertisement(Advertisement),
    ScanFinished,
    ScanError(String),

    Connected {
        link: LinkId,
    },
    Disconnected {
        link: LinkId,
    },

    ServiceDiscovered(Uuid),
    ServiceDiscoveryFinished,
    CharacteristicsDiscovered {
        service: Uuid,
        characteristics: Vec<CharacteristicInfo>,
    },

    CharacteristicChanged {
        characteristic: Uuid,
        value: Vec<u8>,
    },
    /// Outcome of a CCCD write requested through [`BleTransport::subscribe`].
    DescriptorWritten {
        characteristic: Uuid,
        success: bool,
    },
    WriteCompleted {
        characteristic: Uuid,
    },
    WriteFailed {
        characteristic: Uuid,
        error: String,
    },

    Error(ControllerError),
}

/// Requests a backend must accept without blocking.
///
/// `Err` means the request could not even be submitted. Anything that fails
/// after submission is reported as an event.
pub trait BleTransport {
    fn start_scan(&mut self, timeout: Duration) -> Result<(), TransportError>;

    fn stop_scan(&mut self) -> Result<(), TransportError>;

    /// Start connecting. The returned id tags the `Connected` and
    /// `Disconnected` events of this link.
    fn connect(&mut self, address: DeviceAddress) -> Result<LinkId, TransportError>;

    /// Drop the link and every handle derived from it. Must be safe to call
    /// when nothing is connected.
    fn disconnect(&mut self) -> Result<(), TransportError>;

    fn discover_services(&mut self) -> Result<(), TransportError>;

    fn discover_characteristics(&mut self, service: Uuid) -> Result<(), TransportError>;

    fn write_characteristic(&mut self, characteristic: Uuid, value: &[u8])
        -> Result<(), TransportError>;

    fn subscribe(&mut self, characteristic: Uuid, mode: Subscription)
        -> Result<(), TransportError>;
}
