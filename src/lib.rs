//! Remote control of Blackmagic cameras over Bluetooth LE.

pub mod domain;
pub mod infrastructure;
pub mod presentation;
