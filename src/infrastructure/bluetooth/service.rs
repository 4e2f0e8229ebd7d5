//! Camera Service Module
//!
//! The explicitly owned camera session: discovery, the connection state machine
//! and the decoded camera state behind one value. Command methods validate and
//! submit synchronously; their effect on the camera shows up later as telemetry.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::domain::models::{
    AppEvent, CameraState, ConnectionState, DiscoveredDevice, MessageSeverity, StatusMessage,
    Timecode,
};
use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::{
    connection::{ConnectionController, ConnectionSession},
    protocol::{
        codec,
        command::{self, Command, CommandError},
        telemetry, ColorGroup, MetadataField,
    },
    scanner::DiscoveryController,
    transport::{BleTransport, ControllerError, DeviceAddress, TransportEvent},
};

/// One camera session over a BLE transport
pub struct CameraService<T: BleTransport> {
    transport: T,
    discovery: DiscoveryController,
    connection: ConnectionController,
    state: CameraState,
    controller_error: bool,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    settings: Arc<Mutex<SettingsService>>,
}

impl<T: BleTransport> CameraService<T> {
    pub fn new(
        transport: T,
        event_sender: mpsc::UnboundedSender<AppEvent>,
        settings: Arc<Mutex<SettingsService>>,
    ) -> Self {
        let (timeout, ignore_offline, gate_ready) = match settings.lock() {
            Ok(settings) => {
                let s = settings.get();
                (
                    s.discovery_timeout(),
                    s.ignore_offline_devices,
                    s.gate_ready_on_subscriptions,
                )
            }
            Err(_) => {
                warn!("Settings lock poisoned, using defaults");
                let s = crate::domain::settings::Settings::default();
                (
                    s.discovery_timeout(),
                    s.ignore_offline_devices,
                    s.gate_ready_on_subscriptions,
                )
            }
        };

        Self {
            transport,
            discovery: DiscoveryController::new(event_sender.clone(), timeout, ignore_offline),
            connection: ConnectionController::new(event_sender.clone(), gate_ready),
            state: CameraState::default(),
            controller_error: false,
            event_sender,
            settings,
        }
    }

    // ---- Properties ----

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Connected means ready for commands.
    pub fn is_connected(&self) -> bool {
        self.connection.is_ready()
    }

    pub fn is_discovering(&self) -> bool {
        self.discovery.is_scanning()
    }

    pub fn devices(&self) -> &[DiscoveredDevice] {
        self.discovery.devices()
    }

    pub fn name(&self) -> &str {
        self.connection.session().map_or("", |s| s.name())
    }

    pub fn has_controller_error(&self) -> bool {
        self.controller_error
    }

    pub fn is_recording(&self) -> bool {
        self.state.media.recording
    }

    pub fn is_playing(&self) -> bool {
        self.state.media.playing
    }

    pub fn status(&self) -> u8 {
        self.state.status
    }

    pub fn white_balance(&self) -> i16 {
        self.state.video.white_balance
    }

    pub fn tint(&self) -> i16 {
        self.state.video.tint
    }

    pub fn aperture(&self) -> Option<f64> {
        self.state.lens.aperture_units.map(codec::units_to_fstop)
    }

    pub fn iso(&self) -> i32 {
        self.state.video.iso
    }

    pub fn shutter_speed(&self) -> i32 {
        self.state.video.shutter_speed
    }

    pub fn zoom(&self) -> i16 {
        self.state.lens.zoom
    }

    pub fn timecode(&self) -> Timecode {
        self.state.timecode
    }

    pub fn timecode_display(&self) -> bool {
        self.state.display.timecode_display
    }

    pub fn metadata(&self, field: MetadataField) -> &str {
        self.state.metadata.text(field)
    }

    // ---- Discovery and connection ----

    pub fn start_device_discovery(&mut self) -> Result<(), CommandError> {
        if let Err(e) = self.discovery.start(&mut self.transport) {
            self.discovery.handle_scan_error(e.to_string());
            return Err(e.into());
        }
        Ok(())
    }

    pub fn stop_device_discovery(&mut self) {
        self.discovery.stop(&mut self.transport);
    }

    /// Connect to a camera, superseding any current session.
    pub fn connect_device(&mut self, address: DeviceAddress) -> Result<(), CommandError> {
        let name = self
            .discovery
            .devices()
            .iter()
            .find(|d| d.address == address)
            .map_or_else(|| address.to_string(), |d| d.name.clone());
        self.set_controller_error(false);
        self.connection
            .connect(&mut self.transport, address, &name)
            .map_err(CommandError::from)
    }

    pub fn disconnect_from_device(&mut self) {
        self.connection.disconnect(&mut self.transport);
    }

    // ---- Camera commands ----

    pub fn auto_focus(&mut self) -> Result<(), CommandError> {
        self.write_command(command::auto_focus())
    }

    /// Relative focus move, -1.0..=1.0.
    pub fn focus(&mut self, offset: f64) -> Result<(), CommandError> {
        self.write_command(command::focus(offset)?)
    }

    pub fn auto_aperture(&mut self) -> Result<(), CommandError> {
        self.write_command(command::auto_aperture())
    }

    pub fn set_aperture(&mut self, fstop: f64) -> Result<(), CommandError> {
        self.write_command(command::aperture(fstop)?)
    }

    pub fn set_aperture_normalized(&mut self, value: f64) -> Result<(), CommandError> {
        self.write_command(command::aperture_normalized(value)?)
    }

    pub fn set_aperture_step(&mut self, step: i16) -> Result<(), CommandError> {
        self.write_command(command::aperture_step(step)?)
    }

    pub fn set_gain(&mut self, db: i8) -> Result<(), CommandError> {
        self.write_command(command::gain(db))
    }

    pub fn set_iso(&mut self, iso: i32) -> Result<(), CommandError> {
        self.write_command(command::iso(iso)?)
    }

    pub fn set_shutter_speed(&mut self, denominator: i32) -> Result<(), CommandError> {
        self.write_command(command::shutter_speed(denominator)?)
    }

    pub fn set_white_balance(&mut self, kelvin: i16, tint: i16) -> Result<(), CommandError> {
        self.write_command(command::white_balance(kelvin, tint)?)
    }

    pub fn auto_white_balance(&mut self) -> Result<(), CommandError> {
        self.write_command(command::auto_white_balance())
    }

    pub fn restore_auto_white_balance(&mut self) -> Result<(), CommandError> {
        self.write_command(command::restore_auto_white_balance())
    }

    pub fn record(&mut self, start: bool) -> Result<(), CommandError> {
        self.write_command(command::record(start))
    }

    pub fn play(&mut self, start: bool) -> Result<(), CommandError> {
        self.write_command(command::play(start))
    }

    pub fn playback(&mut self, next: bool) -> Result<(), CommandError> {
        self.write_command(command::playback(next))
    }

    pub fn capture_still(&mut self) -> Result<(), CommandError> {
        self.write_command(command::capture_still())
    }

    pub fn color_lift(&mut self, r: f64, g: f64, b: f64, l: f64) -> Result<(), CommandError> {
        self.write_command(command::color_correction(ColorGroup::Lift, r, g, b, l)?)
    }

    pub fn color_gamma(&mut self, r: f64, g: f64, b: f64, l: f64) -> Result<(), CommandError> {
        self.write_command(command::color_correction(ColorGroup::Gamma, r, g, b, l)?)
    }

    pub fn color_gain(&mut self, r: f64, g: f64, b: f64, l: f64) -> Result<(), CommandError> {
        self.write_command(command::color_correction(ColorGroup::Gain, r, g, b, l)?)
    }

    pub fn color_offset(&mut self, r: f64, g: f64, b: f64, l: f64) -> Result<(), CommandError> {
        self.write_command(command::color_correction(ColorGroup::Offset, r, g, b, l)?)
    }

    pub fn color_correction_reset(&mut self) -> Result<(), CommandError> {
        self.write_command(command::color_correction_reset())
    }

    /// Show timecode (true) or clip time (false) on the camera display.
    pub fn set_display(&mut self, timecode: bool) -> Result<(), CommandError> {
        self.write_command(command::timecode_display(timecode))
    }

    pub fn set_metadata(&mut self, field: MetadataField, text: &str) -> Result<(), CommandError> {
        self.write_command(command::metadata_text(field, text)?)
    }

    pub fn set_camera_name(&mut self, name: &str) -> Result<(), CommandError> {
        let bytes = command::camera_name(name)?;
        let characteristic = self
            .ready_session_handle(|s| s.name_characteristic())
            .ok_or(CommandError::TransportUnavailable("device name characteristic"))?;
        self.transport.write_characteristic(characteristic, &bytes)?;
        info!("Camera name set to '{}'", name);
        self.connection.rename(name);
        Ok(())
    }

    /// Submit one command to the outgoing-control characteristic.
    fn write_command(&mut self, command: Command) -> Result<(), CommandError> {
        let Some(characteristic) = self.ready_session_handle(|s| s.control_characteristic()) else {
            warn!(
                "Dropping {:?} command {}: camera not ready",
                command.category(),
                command.parameter()
            );
            return Err(CommandError::TransportUnavailable("outgoing control characteristic"));
        };
        let bytes = command.to_bytes();
        trace!("Writing {:02X?}", bytes);
        self.transport.write_characteristic(characteristic, &bytes)?;
        Ok(())
    }

    fn ready_session_handle(
        &self,
        handle: impl Fn(&ConnectionSession) -> Option<Uuid>,
    ) -> Option<Uuid> {
        self.connection
            .session()
            .filter(|s| s.state() == ConnectionState::Ready)
            .and_then(handle)
    }

    // ---- Transport events ----

    /// Process one transport event. Handlers never block.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        let was_ready = self.connection.is_ready();

        match event {
            TransportEvent::Advertisement(advertisement) => {
                self.discovery.handle_advertisement(advertisement);
            }
            TransportEvent::ScanFinished => self.discovery.handle_scan_finished(),
            TransportEvent::ScanError(error) => self.discovery.handle_scan_error(error),
            TransportEvent::Connected { link } => {
                self.connection.handle_connected(&mut self.transport, link)
            }
            TransportEvent::Disconnected { link } => {
                self.connection.handle_disconnected(&mut self.transport, link)
            }
            TransportEvent::ServiceDiscovered(service) => {
                self.connection.handle_service_discovered(service)
            }
            TransportEvent::ServiceDiscoveryFinished => self
                .connection
                .handle_service_discovery_finished(&mut self.transport),
            TransportEvent::CharacteristicsDiscovered {
                service,
                characteristics,
            } => {
                let initial =
                    self.connection
                        .handle_characteristics(&mut self.transport, service, characteristics);
                for (characteristic, value) in initial {
                    self.handle_notification(characteristic, &value);
                }
            }
            TransportEvent::CharacteristicChanged {
                characteristic,
                value,
            } => {
                if self.connection.accepts_telemetry() {
                    self.handle_notification(characteristic, &value);
                } else {
                    debug!("Notification from {} outside a session", characteristic);
                }
            }
            TransportEvent::DescriptorWritten {
                characteristic,
                success,
            } => self
                .connection
                .handle_descriptor_written(characteristic, success),
            TransportEvent::WriteCompleted { characteristic } => {
                trace!("Write to {} completed", characteristic);
            }
            TransportEvent::WriteFailed {
                characteristic,
                error,
            } => {
                warn!("Write to {} failed: {}", characteristic, error);
                let _ = self.event_sender.send(AppEvent::WriteFailed {
                    characteristic,
                    reason: error,
                });
            }
            TransportEvent::Error(error) => {
                if error != ControllerError::RemoteHostClosed {
                    self.set_controller_error(true);
                }
                self.connection.handle_error(&mut self.transport, error);
            }
        }

        if !was_ready && self.connection.is_ready() {
            self.set_controller_error(false);
            self.remember_camera();
        }
    }

    fn set_controller_error(&mut self, value: bool) {
        if self.controller_error != value {
            self.controller_error = value;
            let _ = self.event_sender.send(AppEvent::ControllerErrorChanged(value));
        }
    }

    fn handle_notification(&mut self, characteristic: Uuid, value: &[u8]) {
        match telemetry::decode(characteristic, value) {
            Ok(Some(update)) => {
                for field in self.state.apply(update) {
                    let _ = self.event_sender.send(AppEvent::StateChanged(field));
                }
            }
            Ok(None) => {}
            Err(e) => trace!("Dropping malformed notification from {}: {}", characteristic, e),
        }
    }

    fn remember_camera(&self) {
        let Some(session) = self.connection.session() else {
            return;
        };
        let result = self
            .settings
            .lock()
            .map_err(|_| anyhow::anyhow!("Lock error"))
            .and_then(|mut settings| {
                settings.record_connection(session.target().0, session.name())
            });
        if let Err(e) = result {
            warn!("Failed to remember camera: {}", e);
            let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
                message: format!("Could not save settings: {}", e),
                severity: MessageSeverity::Warning,
            }));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::models::StateField;
    use crate::infrastructure::bluetooth::protocol::{
        CAMERA_SERVICE_UUID, CAMERA_STATUS_UUID, DEVICE_NAME_UUID, INCOMING_CONTROL_UUID,
        OUTGOING_CONTROL_UUID, TIMECODE_UUID,
    };
    use crate::infrastructure::bluetooth::transport::testing::{RecordingTransport, FIRST_LINK};
    use crate::infrastructure::bluetooth::transport::{
        Advertisement, CharProperties, CharacteristicInfo, LinkType,
    };
    use std::path::PathBuf;

    pub(crate) const CAMERA: DeviceAddress = DeviceAddress(0x00A1_B2C3_D4E5);

    pub(crate) fn test_settings(name: &str) -> Arc<Mutex<SettingsService>> {
        let mut path: PathBuf = std::env::temp_dir();
        path.push(format!(
            "bmd_camera_remote_service_{}_{}.json",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        Arc::new(Mutex::new(SettingsService::with_path(path)))
    }

    /// Event sequence a camera produces from the first connect request of a
    /// transport to fully subscribed.
    pub(crate) fn ready_sequence() -> Vec<TransportEvent> {
        let characteristics = vec![
            CharacteristicInfo {
                uuid: OUTGOING_CONTROL_UUID,
                properties: CharProperties::WRITE,
                value: None,
            },
            CharacteristicInfo {
                uuid: INCOMING_CONTROL_UUID,
                properties: CharProperties::INDICATE,
                value: None,
            },
            CharacteristicInfo {
                uuid: TIMECODE_UUID,
                properties: CharProperties::NOTIFY,
                value: None,
            },
            CharacteristicInfo {
                uuid: CAMERA_STATUS_UUID,
                properties: CharProperties::READ | CharProperties::NOTIFY,
                value: Some(vec![0x21]),
            },
            CharacteristicInfo {
                uuid: DEVICE_NAME_UUID,
                properties: CharProperties::WRITE,
                value: None,
            },
        ];
        let mut events = vec![
            TransportEvent::Connected { link: FIRST_LINK },
            TransportEvent::ServiceDiscovered(CAMERA_SERVICE_UUID),
            TransportEvent::ServiceDiscoveryFinished,
            TransportEvent::CharacteristicsDiscovered {
                service: CAMERA_SERVICE_UUID,
                characteristics,
            },
        ];
        for characteristic in [INCOMING_CONTROL_UUID, TIMECODE_UUID, CAMERA_STATUS_UUID] {
            events.push(TransportEvent::DescriptorWritten {
                characteristic,
                success: true,
            });
        }
        events
    }

    fn setup(name: &str) -> (
        CameraService<RecordingTransport>,
        RecordingTransport,
        mpsc::UnboundedReceiver<AppEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = RecordingTransport::new();
        let service = CameraService::new(transport.clone(), tx, test_settings(name));
        (service, transport, rx)
    }

    fn ready(name: &str) -> (
        CameraService<RecordingTransport>,
        RecordingTransport,
        mpsc::UnboundedReceiver<AppEvent>,
    ) {
        let (mut service, transport, rx) = setup(name);
        service.connect_device(CAMERA).unwrap();
        for event in ready_sequence() {
            service.handle_transport_event(event);
        }
        assert!(service.is_connected());
        transport.clear();
        (service, transport, rx)
    }

    #[test]
    fn test_commands_rejected_until_ready() {
        let (mut service, transport, _rx) = setup("not_ready");
        assert_eq!(
            service.auto_focus(),
            Err(CommandError::TransportUnavailable(
                "outgoing control characteristic"
            ))
        );
        service.connect_device(CAMERA).unwrap();
        assert!(service.record(true).is_err());
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn test_validation_precedes_transport_check() {
        let (mut service, _transport, _rx) = setup("validation");
        assert!(matches!(
            service.set_iso(50),
            Err(CommandError::OutOfRange { name: "ISO", .. })
        ));
    }

    #[test]
    fn test_white_balance_scenario() {
        let (mut service, transport, _rx) = ready("wb");
        service.set_white_balance(5600, 10).unwrap();
        assert_eq!(
            transport.writes(),
            vec![(
                OUTGOING_CONTROL_UUID,
                vec![0xFF, 0x08, 0x00, 0x00, 0x01, 0x02, 0x03, 0x00, 0xE0, 0x15, 0x0A, 0x00]
            )]
        );
    }

    #[test]
    fn test_invalid_command_writes_nothing() {
        let (mut service, transport, _rx) = ready("invalid");
        assert!(service.set_white_balance(12000, 0).is_err());
        assert!(service.set_shutter_speed(10).is_err());
        assert!(service.set_aperture(0.5).is_err());
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn test_recording_telemetry_updates_state() {
        let (mut service, _transport, mut rx) = ready("recording");
        while rx.try_recv().is_ok() {}

        service.handle_transport_event(TransportEvent::CharacteristicChanged {
            characteristic: INCOMING_CONTROL_UUID,
            value: vec![0xFF, 0x05, 0, 0, 10, 1, 0x01, 0, 2, 0, 0, 0],
        });
        assert!(service.is_recording());
        assert!(!service.is_playing());
        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::StateChanged(StateField::Recording))));
    }

    #[test]
    fn test_malformed_telemetry_keeps_state() {
        let (mut service, _transport, _rx) = ready("malformed");
        service.handle_transport_event(TransportEvent::CharacteristicChanged {
            characteristic: INCOMING_CONTROL_UUID,
            value: vec![0xFF, 0x08, 0, 0, 1, 2, 2, 0, 0xE0, 0x15, 0x0A, 0x00],
        });
        let before = service.state().clone();
        for value in [
            vec![0xFF, 0x08, 0x00],
            vec![0xFF, 0x06, 0, 0, 1, 2, 2, 0, 0x10],
            vec![0xFF, 0x08, 0, 0, 1, 14, 3, 0, 0x40, 0x06],
            vec![0x00; 12],
        ] {
            service.handle_transport_event(TransportEvent::CharacteristicChanged {
                characteristic: INCOMING_CONTROL_UUID,
                value,
            });
        }
        service.handle_transport_event(TransportEvent::CharacteristicChanged {
            characteristic: TIMECODE_UUID,
            value: vec![0, 0, 0, 0, 0, 0, 0, 0, 0x1A, 0x00, 0x00, 0x00],
        });
        assert_eq!(service.state(), &before);
        assert_eq!(service.white_balance(), 5600);
        assert_eq!(service.tint(), 10);
    }

    #[test]
    fn test_timecode_and_status() {
        let (mut service, _transport, _rx) = ready("timecode");
        assert_eq!(service.status(), 0x21);
        service.handle_transport_event(TransportEvent::CharacteristicChanged {
            characteristic: TIMECODE_UUID,
            value: vec![0, 0, 0, 0, 0, 0, 0, 0, 0x15, 0x30, 0x45, 0x12],
        });
        assert_eq!(service.timecode().to_string(), "12:45:30:15");
    }

    #[test]
    fn test_camera_name_write() {
        let (mut service, transport, _rx) = ready("name");
        assert!(service.set_camera_name("").is_err());
        assert!(service.set_camera_name(&"x".repeat(33)).is_err());
        service.set_camera_name("A-cam").unwrap();
        assert_eq!(
            transport.writes(),
            vec![(DEVICE_NAME_UUID, b"A-cam".to_vec())]
        );
        assert_eq!(service.name(), "A-cam");
    }

    #[test]
    fn test_transport_write_failure_is_surfaced() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut service =
            CameraService::new(RecordingTransport::failing_writes(), tx, test_settings("fail"));
        service.connect_device(CAMERA).unwrap();
        for event in ready_sequence() {
            service.handle_transport_event(event);
        }
        assert!(matches!(
            service.capture_still(),
            Err(CommandError::Transport(_))
        ));
    }

    #[test]
    fn test_ready_remembers_camera() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let settings = test_settings("remember");
        let mut service = CameraService::new(RecordingTransport::new(), tx, settings.clone());
        service.start_device_discovery().unwrap();
        service.handle_transport_event(TransportEvent::Advertisement(Advertisement {
            address: CAMERA,
            name: "Pocket 6K".to_string(),
            service_uuids: vec![CAMERA_SERVICE_UUID],
            link_type: LinkType::LowEnergy,
            rssi: Some(-48),
        }));
        service.connect_device(CAMERA).unwrap();
        assert_eq!(service.name(), "Pocket 6K");
        for event in ready_sequence() {
            service.handle_transport_event(event);
        }

        let settings = settings.lock().unwrap();
        assert_eq!(settings.get().last_connected_address, Some(CAMERA.0));
        assert_eq!(settings.get().known_cameras[0].name, "Pocket 6K");
    }

    #[test]
    fn test_disconnect_resets_name_but_keeps_state() {
        let (mut service, transport, _rx) = ready("disconnect");
        service.handle_transport_event(TransportEvent::CharacteristicChanged {
            characteristic: INCOMING_CONTROL_UUID,
            value: vec![0xFF, 0x08, 0, 0, 1, 14, 3, 0, 0x40, 0x06, 0, 0],
        });
        service.disconnect_from_device();
        assert_eq!(service.name(), "");
        assert!(!service.is_connected());
        assert_eq!(service.iso(), 1600);
        assert!(service.set_iso(800).is_err());
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn test_controller_error_flag() {
        let (mut service, _transport, _rx) = ready("controller_error");
        service.handle_transport_event(TransportEvent::Error(ControllerError::Other(
            "adapter reset".into(),
        )));
        assert!(service.has_controller_error());
        assert!(service.is_connected());
    }

    #[test]
    fn test_controller_error_flag_reset_is_reported() {
        let (mut service, _transport, mut rx) = ready("controller_error_reset");
        let flag_events = |rx: &mut mpsc::UnboundedReceiver<AppEvent>| -> Vec<bool> {
            std::iter::from_fn(|| rx.try_recv().ok())
                .filter_map(|e| match e {
                    AppEvent::ControllerErrorChanged(v) => Some(v),
                    _ => None,
                })
                .collect()
        };
        flag_events(&mut rx);

        for _ in 0..2 {
            service.handle_transport_event(TransportEvent::Error(ControllerError::Other(
                "adapter reset".into(),
            )));
        }
        assert_eq!(flag_events(&mut rx), vec![true]);

        // a new connect request starts with a clean flag
        service.connect_device(CAMERA).unwrap();
        assert!(!service.has_controller_error());
        assert_eq!(flag_events(&mut rx), vec![false]);
    }

    #[test]
    fn test_stale_disconnect_keeps_new_session() {
        let (mut service, _transport, _rx) = ready("stale_link");
        service.connect_device(CAMERA).unwrap();
        assert_eq!(service.connection_state(), ConnectionState::Connecting);

        service.handle_transport_event(TransportEvent::Disconnected { link: FIRST_LINK });
        assert_eq!(service.connection_state(), ConnectionState::Connecting);
        assert_eq!(service.name(), CAMERA.to_string());
    }
}
