#![cfg(target_os = "linux")]

//! Raw-socket port driver for Linux, built on `pnet`.
//!
//! The port enforces the two traffic shapes this stack produces:
//! cyclic real-time frames leave VLAN-tagged with EtherType 0x8892,
//! LLDP frames leave untagged to the reserved multicast address with
//! EtherType 0x88CC. A frame that matches neither is refused before it
//! reaches the wire, since it can only be a framing bug upstream.
//!
//! On the receive side the driver classifies traffic for the stack:
//! LLDP frames come back with the offset of their first TLV (the tag,
//! if a switch added one, shifts it), real-time frames with their
//! frame ID. Everything else on the segment is dropped here, including
//! our own transmissions echoed by the promiscuous socket.

use log::warn;
use pnet::datalink::{self, Channel, DataLinkReceiver, DataLinkSender};
use profinet_rs::types::{
    ETHTYPE_LLDP, ETHTYPE_PROFINET, ETHTYPE_VLAN, FRAME_BUFFER_SIZE, LLDP_MULTICAST_ADDR,
};
use profinet_rs::{MacAddress, NetworkInterface, ProfinetError};
use std::sync::Mutex;
use std::time::Duration;

/// Smallest frame the wire accepts (without FCS). Short cyclic frames
/// are zero-padded up to this.
const MIN_WIRE_FRAME: usize = 60;

/// How long one receive call may block. Short enough that a cyclic
/// main loop polling the port stays responsive.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// A received frame the stack consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// An LLDP frame; `tlv_start` is the offset of the first TLV,
    /// ready to hand to `IoDevice::lldp_recv`.
    Lldp { frame: Vec<u8>, tlv_start: usize },
    /// A PROFINET real-time frame and its frame ID.
    Rt { frame: Vec<u8>, frame_id: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Lldp { tlv_start: usize },
    Rt { frame_id: u16 },
}

/// One physical PROFINET port bound to a Linux network interface.
pub struct LinuxRawPort {
    tx: Mutex<Box<dyn DataLinkSender>>,
    rx: Mutex<Box<dyn DataLinkReceiver>>,
    mac: MacAddress,
}

impl LinuxRawPort {
    /// Binds the port to the named interface.
    ///
    /// The socket is opened promiscuous: the LLDP multicast of the
    /// neighborhood is not addressed to us and would be filtered
    /// otherwise.
    pub fn open(interface_name: &str) -> Result<Self, ProfinetError> {
        let Some(interface) = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
        else {
            warn!("No network interface named '{}'", interface_name);
            return Err(ProfinetError::IoError);
        };
        let Some(mac) = interface.mac else {
            warn!("Interface '{}' has no MAC address", interface_name);
            return Err(ProfinetError::IoError);
        };

        let config = datalink::Config {
            read_timeout: Some(READ_TIMEOUT),
            promiscuous: true,
            ..datalink::Config::default()
        };
        match datalink::channel(&interface, config) {
            Ok(Channel::Ethernet(tx, rx)) => Ok(Self {
                tx: Mutex::new(tx),
                rx: Mutex::new(rx),
                mac: MacAddress::new(mac.octets()),
            }),
            Ok(_) => {
                warn!("Interface '{}' is not an Ethernet channel", interface_name);
                Err(ProfinetError::IoError)
            }
            Err(e) => {
                warn!("Could not open '{}': {}", interface_name, e);
                Err(ProfinetError::IoError)
            }
        }
    }

    fn push_to_wire(&self, frame: &[u8]) -> Result<usize, ProfinetError> {
        let mut padded = [0u8; MIN_WIRE_FRAME];
        let on_wire: &[u8] = if frame.len() < MIN_WIRE_FRAME {
            padded[..frame.len()].copy_from_slice(frame);
            &padded
        } else {
            frame
        };

        let mut tx = self.tx.lock().map_err(|_| ProfinetError::IoError)?;
        match tx.send_to(on_wire, None) {
            Some(Ok(())) => Ok(frame.len()),
            Some(Err(e)) => {
                warn!("Raw send failed: {}", e);
                Err(ProfinetError::IoError)
            }
            None => Err(ProfinetError::IoError),
        }
    }

    /// Receives and classifies one frame. Returns `Ok(None)` on a read
    /// timeout and for traffic the stack does not consume.
    pub fn poll_inbound(&self) -> Result<Option<InboundFrame>, ProfinetError> {
        let mut rx = self.rx.lock().map_err(|_| ProfinetError::IoError)?;
        let bytes = match rx.next() {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(None),
            Err(e) => {
                warn!("Receive error on the raw channel: {}", e);
                return Err(ProfinetError::IoError);
            }
        };

        // The promiscuous socket echoes our own transmissions.
        if bytes.get(6..12) == Some(&self.mac.0[..]) {
            return Ok(None);
        }

        Ok(classify(bytes).map(|kind| match kind {
            FrameKind::Lldp { tlv_start } => InboundFrame::Lldp {
                frame: bytes.to_vec(),
                tlv_start,
            },
            FrameKind::Rt { frame_id } => InboundFrame::Rt {
                frame: bytes.to_vec(),
                frame_id,
            },
        }))
    }
}

impl NetworkInterface for LinuxRawPort {
    fn send_frame(&mut self, frame: &[u8]) -> Result<usize, ProfinetError> {
        check_rt_frame(frame)?;
        self.push_to_wire(frame)
    }

    fn send_lldp_frame(&mut self, frame: &[u8]) -> Result<usize, ProfinetError> {
        check_lldp_frame(frame)?;
        self.push_to_wire(frame)
    }

    fn local_mac_address(&self) -> [u8; 6] {
        self.mac.0
    }
}

fn ethertype_at(frame: &[u8], offset: usize) -> Option<u16> {
    let bytes = frame.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// A cyclic frame must leave VLAN-tagged with the PROFINET EtherType;
/// anything else is a framing bug upstream of the driver.
fn check_rt_frame(frame: &[u8]) -> Result<(), ProfinetError> {
    if frame.len() > FRAME_BUFFER_SIZE {
        return Err(ProfinetError::FrameTooLarge);
    }
    if ethertype_at(frame, 12) != Some(ETHTYPE_VLAN)
        || ethertype_at(frame, 16) != Some(ETHTYPE_PROFINET)
    {
        warn!("Refusing a cyclic frame without VLAN tag + PROFINET EtherType");
        return Err(ProfinetError::InvalidEthernetFrame);
    }
    Ok(())
}

/// LLDP leaves untagged, addressed to the reserved multicast.
fn check_lldp_frame(frame: &[u8]) -> Result<(), ProfinetError> {
    if frame.len() > FRAME_BUFFER_SIZE {
        return Err(ProfinetError::FrameTooLarge);
    }
    if frame.get(0..6) != Some(&LLDP_MULTICAST_ADDR[..])
        || ethertype_at(frame, 12) != Some(ETHTYPE_LLDP)
    {
        warn!("Refusing an LLDP frame with wrong destination or EtherType");
        return Err(ProfinetError::InvalidEthernetFrame);
    }
    Ok(())
}

/// Classifies a received frame, looking through one VLAN tag if a
/// switch inserted it.
fn classify(frame: &[u8]) -> Option<FrameKind> {
    let outer = ethertype_at(frame, 12)?;
    let (ethertype, payload_start) = if outer == ETHTYPE_VLAN {
        (ethertype_at(frame, 16)?, 18)
    } else {
        (outer, 14)
    };

    if ethertype == ETHTYPE_LLDP {
        return Some(FrameKind::Lldp {
            tlv_start: payload_start,
        });
    }
    if ethertype == ETHTYPE_PROFINET {
        let bytes = frame.get(payload_start..payload_start + 2)?;
        return Some(FrameKind::Rt {
            frame_id: u16::from_be_bytes([bytes[0], bytes[1]]),
        });
    }
    None
}
