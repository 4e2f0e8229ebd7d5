//! WinRT BLE Backend
//!
//! [`BleTransport`] on top of the Windows Bluetooth APIs. Requests start a WinRT
//! operation on a spawned task and return at once; completions are reported as
//! [`TransportEvent`]s.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use windows::core::{Ref, GUID};
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisementReceivedEventArgs, BluetoothLEAdvertisementWatcher,
    BluetoothLEAdvertisementWatcherStoppedEventArgs, BluetoothLEScanningMode,
};
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattCharacteristicProperties,
    GattClientCharacteristicConfigurationDescriptorValue, GattCommunicationStatus,
    GattDeviceService, GattValueChangedEventArgs,
};
use windows::Devices::Bluetooth::{
    BluetoothCacheMode, BluetoothConnectionStatus, BluetoothError, BluetoothLEDevice,
};
use windows::Foundation::TypedEventHandler;
use windows::Storage::Streams::{DataReader, DataWriter, IBuffer};

use crate::infrastructure::bluetooth::transport::{
    Advertisement, BleTransport, CharProperties, CharacteristicInfo, ControllerError,
    DeviceAddress, LinkId, LinkType, Subscription, TransportError, TransportEvent,
};

fn to_guid(uuid: Uuid) -> GUID {
    GUID::from_u128(uuid.as_u128())
}

fn to_uuid(guid: GUID) -> Uuid {
    Uuid::from_u128(guid.to_u128())
}

fn read_buffer(buffer: &IBuffer) -> Result<Vec<u8>> {
    let reader = DataReader::FromBuffer(buffer)?;
    let length = reader.UnconsumedBufferLength()? as usize;
    let mut bytes = vec![0u8; length];
    reader.ReadBytes(&mut bytes)?;
    Ok(bytes)
}

/// Handles belonging to the current link. `generation` changes on every
/// connect and disconnect, and doubles as the [`LinkId`] reported to the
/// controller, so results of operations started for an old link are dropped.
#[derive(Default)]
struct Link {
    generation: u64,
    device: Option<BluetoothLEDevice>,
    status_token: Option<i64>,
    services: HashMap<Uuid, GattDeviceService>,
    characteristics: HashMap<Uuid, GattCharacteristic>,
    value_tokens: Vec<(GattCharacteristic, i64)>,
}

impl Link {
    /// Unregister every handler and close every handle of the current link.
    fn release(&mut self) {
        for (gatt, token) in self.value_tokens.drain(..) {
            let _ = gatt.RemoveValueChanged(token);
        }
        self.characteristics.clear();
        for (_, service) in self.services.drain() {
            let _ = service.Close();
        }
        let token = self.status_token.take();
        if let Some(device) = self.device.take() {
            if let Some(token) = token {
                let _ = device.RemoveConnectionStatusChanged(token);
            }
            info!("Closing BLE device");
            let _ = device.Close();
        }
    }
}

#[derive(Clone)]
struct Shared {
    link: Arc<Mutex<Link>>,
    event_sender: mpsc::UnboundedSender<TransportEvent>,
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, Link>, TransportError> {
        self.link
            .lock()
            .map_err(|_| TransportError::Backend("link state poisoned".to_string()))
    }

    fn generation(&self) -> u64 {
        self.lock().map(|l| l.generation).unwrap_or(u64::MAX)
    }

    /// Send only if the link that started the operation is still current.
    fn send_for(&self, generation: u64, event: TransportEvent) {
        if self.generation() == generation {
            let _ = self.event_sender.send(event);
        } else {
            debug!("Dropping stale {:?}", event);
        }
    }

    fn fail_for(&self, generation: u64, reason: String) {
        self.send_for(
            generation,
            TransportEvent::Error(ControllerError::ConnectionError(reason)),
        );
    }
}

pub struct WinRtTransport {
    shared: Shared,
    watcher: Option<BluetoothLEAdvertisementWatcher>,
    scan_timer: Option<JoinHandle<()>>,
}

impl WinRtTransport {
    pub fn new(event_sender: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            shared: Shared {
                link: Arc::new(Mutex::new(Link::default())),
                event_sender,
            },
            watcher: None,
            scan_timer: None,
        }
    }

    fn backend(e: windows::core::Error) -> TransportError {
        TransportError::Backend(e.message().to_string())
    }

    fn start_watcher(&mut self, timeout: Duration) -> windows::core::Result<()> {
        let watcher = BluetoothLEAdvertisementWatcher::new()?;
        watcher.SetScanningMode(BluetoothLEScanningMode::Active)?;

        let sender = self.shared.event_sender.clone();
        let received = TypedEventHandler::new(
            move |_: Ref<BluetoothLEAdvertisementWatcher>,
                  args: Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let adv = args.Advertisement()?;
                    let uuids = adv.ServiceUuids()?;
                    let mut service_uuids = Vec::with_capacity(uuids.Size()? as usize);
                    for i in 0..uuids.Size()? {
                        service_uuids.push(to_uuid(uuids.GetAt(i)?));
                    }

                    let _ = sender.send(TransportEvent::Advertisement(Advertisement {
                        address: DeviceAddress(args.BluetoothAddress()?),
                        name: adv.LocalName()?.to_string(),
                        service_uuids,
                        // the advertisement watcher only sees LE traffic
                        link_type: LinkType::LowEnergy,
                        rssi: Some(args.RawSignalStrengthInDBm()?),
                    }));
                }
                Ok(())
            },
        );

        let sender = self.shared.event_sender.clone();
        let stopped = TypedEventHandler::new(
            move |_: Ref<BluetoothLEAdvertisementWatcher>,
                  args: Ref<BluetoothLEAdvertisementWatcherStoppedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let status = args.Error()?;
                    if status != BluetoothError::Success {
                        let _ = sender.send(TransportEvent::ScanError(format!(
                            "advertisement watcher stopped: {:?}",
                            status
                        )));
                    }
                }
                Ok(())
            },
        );

        watcher.Received(&received)?;
        watcher.Stopped(&stopped)?;
        watcher.Start()?;

        let timer_watcher = watcher.clone();
        let sender = self.shared.event_sender.clone();
        self.scan_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Err(e) = timer_watcher.Stop() {
                warn!("Failed to stop advertisement watcher: {}", e);
            }
            let _ = sender.send(TransportEvent::ScanFinished);
        }));
        self.watcher = Some(watcher);
        Ok(())
    }
}

impl BleTransport for WinRtTransport {
    fn start_scan(&mut self, timeout: Duration) -> Result<(), TransportError> {
        self.stop_scan()?;
        info!("Starting BLE advertisement watcher");
        self.start_watcher(timeout).map_err(Self::backend)
    }

    fn stop_scan(&mut self) -> Result<(), TransportError> {
        if let Some(timer) = self.scan_timer.take() {
            timer.abort();
        }
        if let Some(watcher) = self.watcher.take() {
            info!("Stopping BLE advertisement watcher");
            watcher.Stop().map_err(Self::backend)?;
        }
        Ok(())
    }

    fn connect(&mut self, address: DeviceAddress) -> Result<LinkId, TransportError> {
        let generation = {
            let mut link = self.shared.lock()?;
            link.release();
            link.generation = link.generation.wrapping_add(1);
            link.generation
        };
        let shared = self.shared.clone();
        tokio::spawn(async move {
            match open_device(&shared, generation, address).await {
                Ok((device, token)) => match shared.lock() {
                    Ok(mut link) if link.generation == generation => {
                        link.device = Some(device);
                        link.status_token = Some(token);
                        drop(link);
                        let event = TransportEvent::Connected {
                            link: LinkId(generation),
                        };
                        shared.send_for(generation, event);
                    }
                    _ => {
                        debug!("Closing {} opened for a superseded link", address);
                        let _ = device.RemoveConnectionStatusChanged(token);
                        let _ = device.Close();
                    }
                },
                Err(e) => {
                    error!("Failed to open {}: {}", address, e);
                    shared.fail_for(generation, e.to_string());
                }
            }
        });
        Ok(LinkId(generation))
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        let mut link = self.shared.lock()?;
        link.generation = link.generation.wrapping_add(1);
        link.release();
        Ok(())
    }

    fn discover_services(&mut self) -> Result<(), TransportError> {
        let device = self
            .shared
            .lock()?
            .device
            .clone()
            .ok_or(TransportError::NotConnected)?;
        let shared = self.shared.clone();
        let generation = shared.generation();
        tokio::spawn(async move {
            if let Err(e) = discover_services(&shared, generation, device).await {
                error!("Service discovery failed: {}", e);
                shared.fail_for(generation, e.to_string());
            }
        });
        Ok(())
    }

    fn discover_characteristics(&mut self, service: Uuid) -> Result<(), TransportError> {
        let gatt_service = self
            .shared
            .lock()?
            .services
            .get(&service)
            .cloned()
            .ok_or(TransportError::NotConnected)?;
        let shared = self.shared.clone();
        let generation = shared.generation();
        tokio::spawn(async move {
            let result = discover_characteristics(&shared, generation, service, gatt_service);
            if let Err(e) = result.await {
                error!("Characteristic discovery failed: {}", e);
                shared.fail_for(generation, e.to_string());
            }
        });
        Ok(())
    }

    fn write_characteristic(
        &mut self,
        characteristic: Uuid,
        value: &[u8],
    ) -> Result<(), TransportError> {
        let gatt = self.characteristic(characteristic)?;
        let writer = DataWriter::new().map_err(Self::backend)?;
        writer.WriteBytes(value).map_err(Self::backend)?;
        let buffer = writer.DetachBuffer().map_err(Self::backend)?;
        let operation = gatt.WriteValueAsync(&buffer).map_err(Self::backend)?;

        let shared = self.shared.clone();
        let generation = shared.generation();
        tokio::spawn(async move {
            let event = match operation.await {
                Ok(GattCommunicationStatus::Success) => {
                    TransportEvent::WriteCompleted { characteristic }
                }
                Ok(status) => TransportEvent::WriteFailed {
                    characteristic,
                    error: format!("{:?}", status),
                },
                Err(e) => TransportEvent::WriteFailed {
                    characteristic,
                    error: e.message().to_string(),
                },
            };
            shared.send_for(generation, event);
        });
        Ok(())
    }

    fn subscribe(
        &mut self,
        characteristic: Uuid,
        mode: Subscription,
    ) -> Result<(), TransportError> {
        type Cccd = GattClientCharacteristicConfigurationDescriptorValue;
        let gatt = self.characteristic(characteristic)?;
        let value = match mode {
            Subscription::Notify => Cccd::Notify,
            Subscription::Indicate => Cccd::Indicate,
        };
        let operation = gatt
            .WriteClientCharacteristicConfigurationDescriptorAsync(value)
            .map_err(Self::backend)?;

        let shared = self.shared.clone();
        let generation = shared.generation();
        tokio::spawn(async move {
            let success = match operation.await {
                Ok(status) => status == GattCommunicationStatus::Success,
                Err(e) => {
                    warn!("CCCD write on {} failed: {}", characteristic, e);
                    false
                }
            };
            shared.send_for(
                generation,
                TransportEvent::DescriptorWritten {
                    characteristic,
                    success,
                },
            );
        });
        Ok(())
    }
}

impl WinRtTransport {
    fn characteristic(&self, uuid: Uuid) -> Result<GattCharacteristic, TransportError> {
        self.shared
            .lock()?
            .characteristics
            .get(&uuid)
            .cloned()
            .ok_or(TransportError::UnknownCharacteristic(uuid))
    }
}

impl Drop for WinRtTransport {
    fn drop(&mut self) {
        let _ = self.stop_scan();
        let _ = self.disconnect();
    }
}

/// Open the device and register its status handler. Returns the device with
/// the handler's registration token.
async fn open_device(
    shared: &Shared,
    generation: u64,
    address: DeviceAddress,
) -> Result<(BluetoothLEDevice, i64)> {
    info!("Opening BLE device {}", address);
    let device = BluetoothLEDevice::FromBluetoothAddressAsync(address.0)?.await?;

    let handler_shared = shared.clone();
    let status_handler = TypedEventHandler::new(move |dev: Ref<BluetoothLEDevice>, _| {
        if let Some(dev) = dev.as_ref() {
            if dev.ConnectionStatus()? == BluetoothConnectionStatus::Disconnected {
                let event = TransportEvent::Disconnected {
                    link: LinkId(generation),
                };
                handler_shared.send_for(generation, event);
            }
        }
        Ok(())
    });
    let token = device.ConnectionStatusChanged(&status_handler)?;
    Ok((device, token))
}

async fn discover_services(
    shared: &Shared,
    generation: u64,
    device: BluetoothLEDevice,
) -> Result<()> {
    let result = device
        .GetGattServicesWithCacheModeAsync(BluetoothCacheMode::Uncached)?
        .await?;
    if result.Status()? != GattCommunicationStatus::Success {
        anyhow::bail!("Failed to get GATT services: {:?}", result.Status()?);
    }

    let services = result.Services()?;
    info!("Found {} GATT service(s)", services.Size()?);
    for i in 0..services.Size()? {
        let service = services.GetAt(i)?;
        let uuid = to_uuid(service.Uuid()?);
        if let Ok(mut link) = shared.lock() {
            if link.generation != generation {
                return Ok(());
            }
            link.services.insert(uuid, service);
        }
        shared.send_for(generation, TransportEvent::ServiceDiscovered(uuid));
    }
    shared.send_for(generation, TransportEvent::ServiceDiscoveryFinished);
    Ok(())
}

async fn discover_characteristics(
    shared: &Shared,
    generation: u64,
    service_uuid: Uuid,
    service: GattDeviceService,
) -> Result<()> {
    let access = service.RequestAccessAsync()?.await?;
    debug!("Service access status: {:?}", access);

    let result = service.GetCharacteristicsAsync()?.await?;
    if result.Status()? != GattCommunicationStatus::Success {
        anyhow::bail!("Failed to get characteristics: {:?}", result.Status()?);
    }

    let list = result.Characteristics()?;
    let mut characteristics = Vec::with_capacity(list.Size()? as usize);
    for i in 0..list.Size()? {
        let gatt = list.GetAt(i)?;
        let uuid = to_uuid(gatt.Uuid()?);
        let raw = gatt.CharacteristicProperties()?;
        let properties = CharProperties((raw.0 & 0xFF) as u8);

        let value = if raw.contains(GattCharacteristicProperties::Read) {
            let read = gatt.ReadValueAsync()?.await?;
            if read.Status()? == GattCommunicationStatus::Success {
                Some(read_buffer(&read.Value()?)?)
            } else {
                None
            }
        } else {
            None
        };

        let handler_shared = shared.clone();
        let handler = TypedEventHandler::new(
            move |_: Ref<GattCharacteristic>, args: Ref<GattValueChangedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let value = read_buffer(&args.CharacteristicValue()?).unwrap_or_default();
                    let event = TransportEvent::CharacteristicChanged {
                        characteristic: uuid,
                        value,
                    };
                    handler_shared.send_for(generation, event);
                }
                Ok(())
            },
        );
        let token = gatt.ValueChanged(&handler)?;

        match shared.lock() {
            Ok(mut link) if link.generation == generation => {
                link.value_tokens.push((gatt.clone(), token));
                link.characteristics.insert(uuid, gatt);
            }
            _ => {
                let _ = gatt.RemoveValueChanged(token);
                return Ok(());
            }
        }
        characteristics.push(CharacteristicInfo {
            uuid,
            properties,
            value,
        });
    }

    info!("Found {} characteristic(s)", characteristics.len());
    shared.send_for(
        generation,
        TransportEvent::CharacteristicsDiscovered {
            service: service_uuid,
            characteristics,
        },
    );
    Ok(())
}
