use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use bmd_camera_remote::domain::models::AppEvent;
use bmd_camera_remote::domain::settings::SettingsService;
use bmd_camera_remote::infrastructure::bluetooth::driver::{CameraSnapshot, DriverRequest};
use bmd_camera_remote::infrastructure::logging::init_logger;
use bmd_camera_remote::presentation::console::{self, ConsoleCommand};

type DriverHandle = (mpsc::UnboundedSender<DriverRequest>, std::thread::JoinHandle<()>);

#[cfg(windows)]
fn start_driver(
    event_sender: mpsc::UnboundedSender<AppEvent>,
    settings: Arc<Mutex<SettingsService>>,
) -> Result<DriverHandle> {
    use bmd_camera_remote::infrastructure::bluetooth::driver;
    use bmd_camera_remote::infrastructure::bluetooth::winrt::WinRtTransport;

    Ok(driver::spawn(
        |transport_events| Ok(WinRtTransport::new(transport_events)),
        event_sender,
        settings,
    ))
}

#[cfg(not(windows))]
fn start_driver(
    _event_sender: mpsc::UnboundedSender<AppEvent>,
    _settings: Arc<Mutex<SettingsService>>,
) -> Result<DriverHandle> {
    anyhow::bail!("no Bluetooth LE backend is available on this platform")
}

async fn snapshot(requests: &mpsc::UnboundedSender<DriverRequest>) -> Option<CameraSnapshot> {
    let (tx, rx) = oneshot::channel();
    requests.send(DriverRequest::Snapshot(tx)).ok()?;
    rx.await.ok()
}

async fn print_event(requests: &mpsc::UnboundedSender<DriverRequest>, event: &AppEvent) {
    let line = match event {
        AppEvent::StateChanged(field) => match snapshot(requests).await {
            Some(snap) => console::describe_field(&snap, *field),
            None => None,
        },
        other => console::describe_event(other),
    };
    if let Some(line) = line {
        println!("{}", line);
    }
}

/// Returns `false` once the operator asked to quit.
async fn handle_line(requests: &mpsc::UnboundedSender<DriverRequest>, line: &str) -> bool {
    match console::parse_command(line) {
        Ok(ConsoleCommand::Empty) => {}
        Ok(ConsoleCommand::Quit) => return false,
        Ok(ConsoleCommand::Help) => println!("{}", console::HELP),
        Ok(ConsoleCommand::Devices) => {
            if let Some(snap) = snapshot(requests).await {
                println!("{}", console::format_devices(&snap));
            }
        }
        Ok(ConsoleCommand::Status) => {
            if let Some(snap) = snapshot(requests).await {
                println!("{}", console::format_status(&snap));
            }
        }
        Ok(ConsoleCommand::Camera(command)) => {
            if requests.send(DriverRequest::Command(command)).is_err() {
                error!("Camera driver is no longer running");
                return false;
            }
        }
        Err(e) => println!("{}", e),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = SettingsService::new()?;
    let _guard = init_logger(&settings.get().log_settings)?;
    info!("Starting BMD Camera Remote");

    let settings = Arc::new(Mutex::new(settings));
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (requests, driver_thread) = start_driver(event_tx, settings)?;

    println!("{}", console::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => print_event(&requests, &event).await,
                None => break,
            },
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !handle_line(&requests, &line).await {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    info!("Shutting down");
    let _ = requests.send(DriverRequest::Shutdown);
    if driver_thread.join().is_err() {
        error!("Camera driver thread panicked");
    }
    Ok(())
}
