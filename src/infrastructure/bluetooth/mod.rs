//! Bluetooth Module
//!
//! BLE control of a Blackmagic camera.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      CameraDriver                        │
//! │      (event loop - transport events and requests)        │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                     CameraService                        │
//! │    (commands, telemetry decoding, camera state)          │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌───────────┐
//! │  Scanner  │  │ Connection │  │ Protocol  │
//! │           │  │            │  │           │
//! │ - device  │  │ - GATT     │  │ - UUIDs   │
//! │   list    │  │   session  │  │ - commands│
//! │ - timeout │  │ - CCCD     │  │ - telemetry│
//! └───────────┘  └────────────┘  └───────────┘
//!                       │
//!                       ▼
//!               ┌──────────────┐
//!               │ BleTransport │  (WinRT on Windows)
//!               └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Wire format, command encoding and telemetry decoding
//! - [`transport`] - Backend-neutral BLE interface and its events
//! - [`scanner`] - Device discovery
//! - [`connection`] - Connection lifecycle and subscription negotiation
//! - [`service`] - Main service coordinator
//! - [`state`] - Folding telemetry into the camera state
//! - [`driver`] - Background event loop

pub mod connection;
pub mod driver;
pub mod protocol;
pub mod scanner;
pub mod service;
pub mod state;
pub mod transport;
#[cfg(windows)]
pub mod winrt;

pub use service::CameraService;
