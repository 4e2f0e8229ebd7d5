//! Camera Driver
//!
//! One task owns the [`CameraService`] and feeds it transport events and
//! operator requests one at a time, so no state is ever shared or locked.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::domain::models::{
    AppEvent, CameraCommand, CameraState, ConnectionState, DiscoveredDevice, MessageSeverity,
    StatusMessage,
};
use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::protocol::command::CommandError;
use crate::infrastructure::bluetooth::protocol::ColorGroup;
use crate::infrastructure::bluetooth::service::CameraService;
use crate::infrastructure::bluetooth::transport::{BleTransport, TransportEvent};

#[derive(Debug)]
pub enum DriverRequest {
    Command(CameraCommand),
    Snapshot(oneshot::Sender<CameraSnapshot>),
    Shutdown,
}

/// Point-in-time copy of everything the session exposes.
#[derive(Debug, Clone)]
pub struct CameraSnapshot {
    pub connection: ConnectionState,
    pub name: String,
    pub discovering: bool,
    pub controller_error: bool,
    pub devices: Vec<DiscoveredDevice>,
    pub state: CameraState,
}

pub struct CameraDriver<T: BleTransport> {
    service: CameraService<T>,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    requests: mpsc::UnboundedReceiver<DriverRequest>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl<T: BleTransport> CameraDriver<T> {
    pub fn new(
        service: CameraService<T>,
        transport_events: mpsc::UnboundedReceiver<TransportEvent>,
        requests: mpsc::UnboundedReceiver<DriverRequest>,
        event_sender: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            service,
            transport_events,
            requests,
            event_sender,
        }
    }

    /// Pump events until shutdown, then release the link and hand the service back.
    pub async fn run(mut self) -> CameraService<T> {
        loop {
            tokio::select! {
                biased;
                Some(event) = self.transport_events.recv() => {
                    self.service.handle_transport_event(event);
                }
                request = self.requests.recv() => match request {
                    Some(DriverRequest::Command(command)) => self.execute(command),
                    Some(DriverRequest::Snapshot(reply)) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Some(DriverRequest::Shutdown) | None => break,
                },
            }
        }

        info!("Camera driver shutting down");
        self.service.stop_device_discovery();
        self.service.disconnect_from_device();
        self.service
    }

    fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            connection: self.service.connection_state(),
            name: self.service.name().to_string(),
            discovering: self.service.is_discovering(),
            controller_error: self.service.has_controller_error(),
            devices: self.service.devices().to_vec(),
            state: self.service.state().clone(),
        }
    }

    fn execute(&mut self, command: CameraCommand) {
        let service = &mut self.service;
        let result = match command.clone() {
            CameraCommand::StartDiscovery => service.start_device_discovery(),
            CameraCommand::StopDiscovery => {
                service.stop_device_discovery();
                Ok(())
            }
            CameraCommand::Connect(address) => service.connect_device(address),
            CameraCommand::ConnectIndex(index) => {
                match service.devices().get(index).map(|d| d.address) {
                    Some(address) => service.connect_device(address),
                    None => Err(CommandError::TransportUnavailable("no device at that index")),
                }
            }
            CameraCommand::Disconnect => {
                service.disconnect_from_device();
                Ok(())
            }
            CameraCommand::AutoFocus => service.auto_focus(),
            CameraCommand::Focus(offset) => service.focus(offset),
            CameraCommand::AutoAperture => service.auto_aperture(),
            CameraCommand::Aperture(fstop) => service.set_aperture(fstop),
            CameraCommand::ApertureNormalized(value) => service.set_aperture_normalized(value),
            CameraCommand::ApertureStep(step) => service.set_aperture_step(step),
            CameraCommand::Gain(db) => service.set_gain(db),
            CameraCommand::Iso(iso) => service.set_iso(iso),
            CameraCommand::ShutterSpeed(speed) => service.set_shutter_speed(speed),
            CameraCommand::WhiteBalance { kelvin, tint } => service.set_white_balance(kelvin, tint),
            CameraCommand::AutoWhiteBalance => service.auto_white_balance(),
            CameraCommand::RestoreAutoWhiteBalance => service.restore_auto_white_balance(),
            CameraCommand::Record(start) => service.record(start),
            CameraCommand::Play(start) => service.play(start),
            CameraCommand::Playback { next } => service.playback(next),
            CameraCommand::CaptureStill => service.capture_still(),
            CameraCommand::ColorCorrection { group, channels } => {
                let c = channels;
                match group {
                    ColorGroup::Lift => {
                        service.color_lift(c.red, c.green, c.blue, c.luma)
                    }
                    ColorGroup::Gamma => {
                        service.color_gamma(c.red, c.green, c.blue, c.luma)
                    }
                    ColorGroup::Gain => {
                        service.color_gain(c.red, c.green, c.blue, c.luma)
                    }
                    ColorGroup::Offset => {
                        service.color_offset(c.red, c.green, c.blue, c.luma)
                    }
                }
            }
            CameraCommand::ColorCorrectionReset => service.color_correction_reset(),
            CameraCommand::TimecodeDisplay(timecode) => service.set_display(timecode),
            CameraCommand::Metadata(field, text) => service.set_metadata(field, &text),
            CameraCommand::CameraName(name) => service.set_camera_name(&name),
        };

        if let Err(e) = result {
            warn!("{:?} rejected: {}", command, e);
            let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
                message: format!("Command rejected: {}", e),
                severity: MessageSeverity::Warning,
            }));
        }
    }
}

/// Run the driver on a dedicated thread with its own current-thread runtime.
///
/// `make_transport` builds the backend on that thread, given the sender it must
/// report [`TransportEvent`]s on.
pub fn spawn<T, F>(
    make_transport: F,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    settings: Arc<Mutex<SettingsService>>,
) -> (mpsc::UnboundedSender<DriverRequest>, JoinHandle<()>)
where
    T: BleTransport + 'static,
    F: FnOnce(mpsc::UnboundedSender<TransportEvent>) -> anyhow::Result<T> + Send + 'static,
{
    let (request_tx, request_rx) = mpsc::unbounded_channel();

    let handle = std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create runtime for the camera driver: {}", e);
                return;
            }
        };

        rt.block_on(async move {
            let (transport_tx, transport_rx) = mpsc::unbounded_channel();
            let transport = match make_transport(transport_tx) {
                Ok(transport) => transport,
                Err(e) => {
                    error!("Failed to initialise Bluetooth: {}", e);
                    let _ = event_sender.send(AppEvent::ControllerError(e.to_string()));
                    return;
                }
            };

            let service = CameraService::new(transport, event_sender.clone(), settings);
            CameraDriver::new(service, transport_rx, request_rx, event_sender)
                .run()
                .await;
        });
    });

    (request_tx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bluetooth::protocol::{
        CAMERA_SERVICE_UUID, INCOMING_CONTROL_UUID, OUTGOING_CONTROL_UUID,
    };
    use crate::infrastructure::bluetooth::service::tests::{ready_sequence, test_settings, CAMERA};
    use crate::infrastructure::bluetooth::transport::testing::{RecordingTransport, TransportCall};
    use crate::infrastructure::bluetooth::transport::{Advertisement, LinkType};

    struct Harness {
        transport: RecordingTransport,
        transport_tx: mpsc::UnboundedSender<TransportEvent>,
        request_tx: mpsc::UnboundedSender<DriverRequest>,
        events: mpsc::UnboundedReceiver<AppEvent>,
        task: tokio::task::JoinHandle<CameraService<RecordingTransport>>,
    }

    fn start(name: &str) -> Harness {
        let transport = RecordingTransport::new();
        let (event_tx, events) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let service = CameraService::new(transport.clone(), event_tx.clone(), test_settings(name));
        let driver = CameraDriver::new(service, transport_rx, request_rx, event_tx);
        let task = tokio::spawn(driver.run());
        Harness {
            transport,
            transport_tx,
            request_tx,
            events,
            task,
        }
    }

    async fn snapshot(h: &Harness) -> CameraSnapshot {
        let (tx, rx) = oneshot::channel();
        h.request_tx.send(DriverRequest::Snapshot(tx)).unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_discovery_connect_and_record() {
        let h = start("driver_flow");
        h.request_tx
            .send(DriverRequest::Command(CameraCommand::StartDiscovery))
            .unwrap();
        // requests and transport events are separate queues; sync on a snapshot
        assert!(snapshot(&h).await.discovering);

        h.transport_tx
            .send(TransportEvent::Advertisement(Advertisement {
                address: CAMERA,
                name: "Pocket 4K".to_string(),
                service_uuids: vec![CAMERA_SERVICE_UUID],
                link_type: LinkType::LowEnergy,
                rssi: Some(-60),
            }))
            .unwrap();
        h.transport_tx.send(TransportEvent::ScanFinished).unwrap();
        let snap = snapshot(&h).await;
        assert!(!snap.discovering);
        assert_eq!(snap.devices.len(), 1);

        h.request_tx
            .send(DriverRequest::Command(CameraCommand::ConnectIndex(0)))
            .unwrap();
        assert_eq!(snapshot(&h).await.connection, ConnectionState::Connecting);
        for event in ready_sequence() {
            h.transport_tx.send(event).unwrap();
        }
        let snap = snapshot(&h).await;
        assert_eq!(snap.connection, ConnectionState::Ready);
        assert_eq!(snap.name, "Pocket 4K");

        h.request_tx
            .send(DriverRequest::Command(CameraCommand::Record(true)))
            .unwrap();
        h.transport_tx
            .send(TransportEvent::CharacteristicChanged {
                characteristic: INCOMING_CONTROL_UUID,
                value: vec![0xFF, 0x05, 0, 0, 10, 1, 0x01, 0, 2, 0, 0, 0],
            })
            .unwrap();
        assert!(snapshot(&h).await.state.media.recording);

        h.request_tx.send(DriverRequest::Shutdown).unwrap();
        let service = h.task.await.unwrap();
        assert!(!service.is_connected());

        let calls = h.transport.calls();
        assert!(calls.contains(&TransportCall::Write(
            OUTGOING_CONTROL_UUID,
            vec![0xFF, 0x05, 0, 0, 10, 1, 0x01, 0, 2, 0, 0, 0]
        )));
        assert_eq!(calls.last(), Some(&TransportCall::Disconnect));
    }

    #[tokio::test]
    async fn test_rejected_command_is_reported() {
        let mut h = start("driver_rejected");
        h.request_tx
            .send(DriverRequest::Command(CameraCommand::Iso(800)))
            .unwrap();
        snapshot(&h).await;

        let mut rejected = false;
        while let Ok(event) = h.events.try_recv() {
            if let AppEvent::LogMessage(msg) = event {
                rejected |= msg.severity == MessageSeverity::Warning
                    && msg.message.contains("transport unavailable");
            }
        }
        assert!(rejected);
        assert!(h.transport.writes().is_empty());

        drop(h.request_tx);
        h.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_index_out_of_range() {
        let mut h = start("driver_index");
        h.request_tx
            .send(DriverRequest::Command(CameraCommand::ConnectIndex(3)))
            .unwrap();
        let snap = snapshot(&h).await;
        assert_eq!(snap.connection, ConnectionState::Disconnected);
        assert!(h.transport.calls().is_empty());
        assert!(std::iter::from_fn(|| h.events.try_recv().ok())
            .any(|e| matches!(e, AppEvent::LogMessage(_))));
        h.request_tx.send(DriverRequest::Shutdown).unwrap();
        h.task.await.unwrap();
    }
}
