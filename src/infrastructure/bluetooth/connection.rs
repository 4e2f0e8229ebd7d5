//! BLE Connection Module
//!
//! The per-device state machine:
//!
//! ```text
//! Disconnected -> Connecting -> ServiceDiscovery -> CharacteristicNegotiation -> Ready
//!       ^______________________________|_______________________|_______________|
//!                      disconnect request, remote close, fatal error
//! ```
//!
//! Every transition is driven synchronously by a transport event or an operator
//! request. At most one [`ConnectionSession`] exists at a time.

use std::collections::BTreeSet;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::models::{AppEvent, ConnectionState, MessageSeverity, StatusMessage};
use crate::infrastructure::bluetooth::protocol::{CameraCharacteristic, CAMERA_SERVICE_UUID};
use crate::infrastructure::bluetooth::transport::{
    BleTransport, CharProperties, CharacteristicInfo, ControllerError, DeviceAddress, LinkId,
    Subscription, TransportError,
};

/// The one live link to a camera.
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    target: DeviceAddress,
    link: Option<LinkId>,
    name: String,
    state: ConnectionState,
    services: BTreeSet<Uuid>,
    control: Option<Uuid>,
    name_characteristic: Option<Uuid>,
    status_characteristic: Option<Uuid>,
    pending_subscriptions: BTreeSet<Uuid>,
    active_subscriptions: BTreeSet<Uuid>,
}

impl ConnectionSession {
    fn new(target: DeviceAddress, name: String) -> Self {
        Self {
            target,
            link: None,
            name,
            state: ConnectionState::Connecting,
            services: BTreeSet::new(),
            control: None,
            name_characteristic: None,
            status_characteristic: None,
            pending_subscriptions: BTreeSet::new(),
            active_subscriptions: BTreeSet::new(),
        }
    }

    pub fn target(&self) -> DeviceAddress {
        self.target
    }

    /// Link handed out by the transport, once the connect request was accepted.
    pub fn link(&self) -> Option<LinkId> {
        self.link
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn services(&self) -> &BTreeSet<Uuid> {
        &self.services
    }

    pub fn control_characteristic(&self) -> Option<Uuid> {
        self.control
    }

    pub fn name_characteristic(&self) -> Option<Uuid> {
        self.name_characteristic
    }

    pub fn status_characteristic(&self) -> Option<Uuid> {
        self.status_characteristic
    }

    pub fn is_subscribed(&self, characteristic: Uuid) -> bool {
        self.active_subscriptions.contains(&characteristic)
    }
}

/// Drives the connection state machine against a [`BleTransport`].
pub struct ConnectionController {
    session: Option<ConnectionSession>,
    gate_ready_on_subscriptions: bool,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl ConnectionController {
    pub fn new(
        event_sender: mpsc::UnboundedSender<AppEvent>,
        gate_ready_on_subscriptions: bool,
    ) -> Self {
        Self {
            session: None,
            gate_ready_on_subscriptions,
            event_sender,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.session
            .as_ref()
            .map_or(ConnectionState::Disconnected, |s| s.state)
    }

    pub fn session(&self) -> Option<&ConnectionSession> {
        self.session.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    /// Whether `link` is the link of the live session.
    fn is_current(&self, link: LinkId) -> bool {
        self.session.as_ref().and_then(|s| s.link) == Some(link)
    }

    /// Whether inbound notifications belong to the current session.
    pub fn accepts_telemetry(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::CharacteristicNegotiation | ConnectionState::Ready
        )
    }

    /// Connect to `address`, tearing down any existing session first.
    pub fn connect<T: BleTransport>(
        &mut self,
        transport: &mut T,
        address: DeviceAddress,
        name: &str,
    ) -> Result<(), TransportError> {
        if self.session.is_some() {
            info!("Superseding current session before connecting to {}", address);
            self.teardown(transport);
        }

        info!("Connecting to camera {} ({})", name, address);
        self.session = Some(ConnectionSession::new(address, name.to_string()));
        self.send(AppEvent::ConnectionState(ConnectionState::Connecting));
        self.send(AppEvent::NameChanged(name.to_string()));
        self.send_log("Connecting to camera...", MessageSeverity::Info);

        match transport.connect(address) {
            Ok(link) => {
                debug!("Connect request accepted as {}", link);
                if let Some(session) = self.session.as_mut() {
                    session.link = Some(link);
                }
                Ok(())
            }
            Err(e) => {
                error!("Connect request failed: {}", e);
                self.fail(transport, e.to_string());
                Err(e)
            }
        }
    }

    /// Explicit disconnect. No-op without a session.
    pub fn disconnect<T: BleTransport>(&mut self, transport: &mut T) {
        if self.session.is_some() {
            info!("Disconnecting from camera");
            self.teardown(transport);
        }
    }

    /// Record a new camera name after it was written to the camera.
    pub fn rename(&mut self, name: &str) {
        if let Some(session) = self.session.as_mut() {
            session.name = name.to_string();
            self.send(AppEvent::NameChanged(name.to_string()));
        }
    }

    pub fn handle_connected<T: BleTransport>(&mut self, transport: &mut T, link: LinkId) {
        if !self.is_current(link) {
            debug!("Ignoring connected event from stale {}", link);
            return;
        }
        if self.state() != ConnectionState::Connecting {
            warn!("Unexpected connected event in state {:?}", self.state());
            return;
        }
        self.set_state(ConnectionState::ServiceDiscovery);
        if let Err(e) = transport.discover_services() {
            error!("Service discovery request failed: {}", e);
            self.fail(transport, e.to_string());
        }
    }

    pub fn handle_service_discovered(&mut self, service: Uuid) {
        if let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.state == ConnectionState::ServiceDiscovery)
        {
            debug!("Discovered service {}", service);
            session.services.insert(service);
        }
    }

    pub fn handle_service_discovery_finished<T: BleTransport>(&mut self, transport: &mut T) {
        let Some(session) = self
            .session
            .as_ref()
            .filter(|s| s.state == ConnectionState::ServiceDiscovery)
        else {
            return;
        };

        if !session.services.contains(&CAMERA_SERVICE_UUID) {
            error!(
                "Camera service not found among {} service(s)",
                session.services.len()
            );
            self.fail(transport, "camera control service not found".to_string());
            return;
        }

        self.set_state(ConnectionState::CharacteristicNegotiation);
        if let Err(e) = transport.discover_characteristics(CAMERA_SERVICE_UUID) {
            error!("Characteristic discovery request failed: {}", e);
            self.fail(transport, e.to_string());
        }
    }

    /// Classify the camera service characteristics and request subscriptions.
    ///
    /// Returns the values the stack already held for readable characteristics
    /// (the camera status) so they can be decoded like notifications.
    pub fn handle_characteristics<T: BleTransport>(
        &mut self,
        transport: &mut T,
        service: Uuid,
        characteristics: Vec<CharacteristicInfo>,
    ) -> Vec<(Uuid, Vec<u8>)> {
        let mut initial_values = Vec::new();
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.state == ConnectionState::CharacteristicNegotiation)
        else {
            return initial_values;
        };
        if service != CAMERA_SERVICE_UUID {
            debug!("Ignoring characteristics of service {}", service);
            return initial_values;
        }

        for characteristic in characteristics {
            let uuid = characteristic.uuid;
            match CameraCharacteristic::from_uuid(uuid) {
                Some(CameraCharacteristic::OutgoingControl) => session.control = Some(uuid),
                Some(CameraCharacteristic::DeviceName) => session.name_characteristic = Some(uuid),
                Some(CameraCharacteristic::CameraStatus) => {
                    session.status_characteristic = Some(uuid);
                    if let Some(value) = characteristic.value.filter(|v| !v.is_empty()) {
                        initial_values.push((uuid, value));
                    }
                }
                _ => {}
            }

            let mode = if characteristic.properties.contains(CharProperties::NOTIFY) {
                Some(Subscription::Notify)
            } else if characteristic.properties.contains(CharProperties::INDICATE) {
                Some(Subscription::Indicate)
            } else {
                None
            };

            match mode {
                Some(mode) => match transport.subscribe(uuid, mode) {
                    Ok(()) => {
                        debug!("Requested {:?} on {}", mode, uuid);
                        session.pending_subscriptions.insert(uuid);
                    }
                    Err(e) => warn!("Could not subscribe to {}: {}", uuid, e),
                },
                None => debug!("Characteristic {} needs no subscription", uuid),
            }
        }

        if session.control.is_none() {
            warn!("Camera did not expose the outgoing control characteristic");
        }

        if !self.gate_ready_on_subscriptions || session.pending_subscriptions.is_empty() {
            self.mark_ready();
        }
        initial_values
    }

    pub fn handle_descriptor_written(&mut self, characteristic: Uuid, success: bool) {
        let Some(session) = self.session.as_mut() else {
            debug!("Descriptor write for {} arrived without a session", characteristic);
            return;
        };
        if !session.pending_subscriptions.remove(&characteristic) {
            return;
        }
        if success {
            session.active_subscriptions.insert(characteristic);
        } else {
            warn!("Camera rejected subscription to {}", characteristic);
        }

        if session.state == ConnectionState::CharacteristicNegotiation
            && session.pending_subscriptions.is_empty()
        {
            self.mark_ready();
        }
    }

    /// The link dropped underneath us. Events from a superseded link are ignored.
    pub fn handle_disconnected<T: BleTransport>(&mut self, transport: &mut T, link: LinkId) {
        if !self.is_current(link) {
            debug!("Ignoring disconnect of stale {}", link);
            return;
        }
        info!("Camera disconnected");
        self.teardown(transport);
    }

    pub fn handle_error<T: BleTransport>(&mut self, transport: &mut T, error: ControllerError) {
        match error {
            ControllerError::RemoteHostClosed => {
                info!("Remote host closed the connection");
                self.teardown(transport);
            }
            ControllerError::ConnectionError(reason) => {
                error!("Connection error: {}", reason);
                if self.session.is_some() {
                    self.fail(transport, reason);
                } else {
                    self.send(AppEvent::ConnectionFailure(reason));
                }
            }
            ControllerError::Other(reason) => {
                error!("Controller error: {}", reason);
                self.send(AppEvent::ControllerError(reason));
            }
        }
    }

    fn mark_ready(&mut self) {
        self.set_state(ConnectionState::Ready);
        info!("Camera ready");
        self.send(AppEvent::ConnectedChanged(true));
        self.send_log("Camera connected", MessageSeverity::Success);
    }

    fn fail<T: BleTransport>(&mut self, transport: &mut T, reason: String) {
        self.teardown(transport);
        self.send_log(&format!("Connection failed: {}", reason), MessageSeverity::Error);
        self.send(AppEvent::ConnectionFailure(reason));
    }

    /// Release the link and every handle, then report the disconnect once.
    fn teardown<T: BleTransport>(&mut self, transport: &mut T) {
        let Some(session) = self.session.take() else {
            return;
        };
        if let Err(e) = transport.disconnect() {
            warn!("Disconnect request failed: {}", e);
        }

        self.send(AppEvent::Disconnected);
        self.send(AppEvent::ConnectionState(ConnectionState::Disconnected));
        if session.state == ConnectionState::Ready {
            self.send(AppEvent::ConnectedChanged(false));
        }
        if !session.name.is_empty() {
            self.send(AppEvent::NameChanged(String::new()));
        }
        self.send_log(
            &format!("Disconnected from {}", session.target),
            MessageSeverity::Info,
        );
    }

    fn set_state(&mut self, state: ConnectionState) {
        if let Some(session) = self.session.as_mut() {
            debug!("Connection state {:?} -> {:?}", session.state, state);
            session.state = state;
            self.send(AppEvent::ConnectionState(state));
        }
    }

    fn send(&self, event: AppEvent) {
        let _ = self.event_sender.send(event);
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        self.send(AppEvent::LogMessage(StatusMessage {
            message: message.to_string(),
            severity,
        }));
    }
}
