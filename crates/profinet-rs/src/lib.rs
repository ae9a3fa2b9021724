//! # `profinet-rs` - device-side PROFINET IO real-time core
//!
//! This crate implements the two tightly coupled real-time subsystems
//! of a PROFINET IO-Device:
//!
//! - The [`ppm`] module is the cyclic Provider Protocol Machine: one
//!   transmitter per provider IOCR, emitting VLAN-tagged real-time
//!   frames on the negotiated `send_clock_factor * reduction_ratio`
//!   grid of 31.25 us ticks.
//! - The [`lldp`] module broadcasts the device's LLDP frame, tracks
//!   the peer seen on the port and raises PROFINET diagnosis alarms
//!   when the peer changes or disappears.
//!
//! Both sit on the [`frame`] codec layer and are owned by an
//! [`IoDevice`], which the embedding drives with a time source and a
//! [`NetworkInterface`] implementation:
//!
//! ```no_run
//! use profinet_rs::{DeviceConfig, IoDevice};
//! use profinet_rs::diag::{NoOpDiagnosticsPort, NoOpEventSink};
//! # struct Driver;
//! # impl profinet_rs::NetworkInterface for Driver {
//! #     fn send_frame(&mut self, f: &[u8]) -> Result<usize, profinet_rs::ProfinetError> { Ok(f.len()) }
//! #     fn send_lldp_frame(&mut self, f: &[u8]) -> Result<usize, profinet_rs::ProfinetError> { Ok(f.len()) }
//! #     fn local_mac_address(&self) -> [u8; 6] { [0; 6] }
//! # }
//! # fn now_us() -> u64 { 0 }
//!
//! let mut device = IoDevice::new(DeviceConfig::default());
//! let mut driver = Driver;
//! let mut diag = NoOpDiagnosticsPort;
//! let mut events = NoOpEventSink;
//!
//! device.lldp_start_broadcast(now_us()).unwrap();
//! loop {
//!     device.poll(now_us(), &mut driver, &mut diag, &mut events);
//!     // sleep until device.next_action_time()
//! }
//! ```
//!
//! Connection establishment, configuration storage, the alarm delivery
//! pipeline and the diagnosis record store are external collaborators,
//! reached through the traits in [`diag`] and [`hal`].

// --- Foundation modules ---
pub mod hal;
pub mod types;

// --- Wire layer ---
pub mod frame;

// --- Protocol machines ---
pub mod lldp;
pub mod ppm;

// --- Device model and driving ---
pub mod ar;
pub mod device;
pub mod diag;
pub mod scheduler;

pub use ar::{Ar, Iocr, IocrParam, IocrType, IodataObject};
pub use device::{DeviceConfig, InterfaceStats, IoDevice};
pub use frame::{MacAddress, VlanTag};
pub use hal::{NetworkInterface, ProfinetError};
pub use scheduler::{SchedulerConfig, SchedulerMode};
pub use types::{ClassifiedError, DataStatus, ErrorClass, ErrorCode};
