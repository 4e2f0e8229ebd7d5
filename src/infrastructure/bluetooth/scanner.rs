//! BLE Scanner Module
//!
//! Discovery of Blackmagic cameras: filters advertisements to low-energy devices
//! that advertise the camera service and keeps one entry per address.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::models::{AppEvent, DiscoveredDevice, MessageSeverity, StatusMessage};
use crate::infrastructure::bluetooth::protocol::CAMERA_SERVICE_UUID;
use crate::infrastructure::bluetooth::transport::{
    Advertisement, BleTransport, LinkType, TransportError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiscoveryState {
    Idle,
    Scanning,
}

/// Scan lifecycle and the discovered device set
pub struct DiscoveryController {
    state: DiscoveryState,
    devices: Vec<DiscoveredDevice>,
    timeout: Duration,
    ignore_offline_devices: bool,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl DiscoveryController {
    pub fn new(
        event_sender: mpsc::UnboundedSender<AppEvent>,
        timeout: Duration,
        ignore_offline_devices: bool,
    ) -> Self {
        Self {
            state: DiscoveryState::Idle,
            devices: Vec::new(),
            timeout,
            ignore_offline_devices,
            event_sender,
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.state == DiscoveryState::Scanning
    }

    pub fn devices(&self) -> &[DiscoveredDevice] {
        &self.devices
    }

    /// Start a scan. A second start while scanning is ignored.
    pub fn start<T: BleTransport>(&mut self, transport: &mut T) -> Result<(), TransportError> {
        if self.is_scanning() {
            debug!("Discovery already running, ignoring start request");
            return Ok(());
        }

        self.devices.clear();
        let _ = self.event_sender.send(AppEvent::DevicesUpdated);

        info!(
            "Starting camera discovery ({} ms window)",
            self.timeout.as_millis()
        );
        transport.start_scan(self.timeout)?;

        self.state = DiscoveryState::Scanning;
        let _ = self.event_sender.send(AppEvent::DiscoveringChanged(true));
        let _ = self.event_sender.send(AppEvent::DiscoveryStarted);
        self.send_log("Scanning for cameras...", MessageSeverity::Info);
        Ok(())
    }

    /// Stop scanning and publish what was found. No-op when idle.
    pub fn stop<T: BleTransport>(&mut self, transport: &mut T) {
        if !self.is_scanning() {
            return;
        }
        info!("Stopping camera discovery");
        if let Err(e) = transport.stop_scan() {
            warn!("Failed to stop scan: {}", e);
        }
        self.finish();
    }

    /// Returns true when the advertisement was accepted into the device list.
    pub fn handle_advertisement(&mut self, advertisement: Advertisement) -> bool {
        if !self.is_scanning() {
            return false;
        }
        if advertisement.link_type != LinkType::LowEnergy
            || !advertisement.service_uuids.contains(&CAMERA_SERVICE_UUID)
        {
            return false;
        }
        if self.ignore_offline_devices && advertisement.rssi == Some(0) {
            debug!("Dropping cached advertisement from {}", advertisement.address);
            return false;
        }

        let device = DiscoveredDevice {
            address: advertisement.address,
            name: if advertisement.name.is_empty() {
                "Unknown".to_string()
            } else {
                advertisement.name
            },
            rssi: advertisement.rssi,
            last_seen: Instant::now(),
        };

        match self.devices.iter_mut().find(|d| d.address == device.address) {
            Some(existing) => *existing = device,
            None => {
                info!("Found camera {} ({})", device.name, device.address);
                self.devices.push(device);
            }
        }
        let _ = self.event_sender.send(AppEvent::DevicesUpdated);
        true
    }

    pub fn handle_scan_finished(&mut self) {
        if self.is_scanning() {
            info!("Discovery window elapsed");
            self.finish();
        }
    }

    /// Scan failure: back to idle, keeping whatever was found so far.
    pub fn handle_scan_error(&mut self, error: String) {
        warn!("Discovery error: {}", error);
        if self.is_scanning() {
            self.state = DiscoveryState::Idle;
            let _ = self.event_sender.send(AppEvent::DiscoveringChanged(false));
        }
        self.send_log(&format!("Scan failed: {}", error), MessageSeverity::Error);
        let _ = self.event_sender.send(AppEvent::DiscoveryError(error));
    }

    fn finish(&mut self) {
        self.state = DiscoveryState::Idle;
        info!("Discovery finished with {} camera(s)", self.devices.len());
        let _ = self.event_sender.send(AppEvent::DiscoveringChanged(false));
        let _ = self.event_sender.send(AppEvent::DiscoveryFinished {
            devices: self.devices.clone(),
        });
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
            message: message.to_string(),
            severity,
        }));
    }
}
