// crates/profinet-rs/tests/simulator/mod.rs
//! In-memory collaborators for driving the device in tests: a capturing
//! Ethernet interface and recording diagnostics/event mocks.

use profinet_rs::diag::{ConnectionEventSink, DiagItem, DiagnosticsPort, SubmoduleAddr};
use profinet_rs::{ClassifiedError, NetworkInterface, ProfinetError};
use std::collections::HashSet;

/// A simulated network interface that buffers transmitted frames.
pub struct SimulatedInterface {
    mac: [u8; 6],
    /// Captured real-time frames, oldest first.
    pub rt_frames: Vec<Vec<u8>>,
    /// Captured LLDP frames, oldest first.
    pub lldp_frames: Vec<Vec<u8>>,
    /// When set, every send fails as if the driver rejected the frame.
    pub fail_sends: bool,
}

impl SimulatedInterface {
    pub fn new(mac: [u8; 6]) -> Self {
        Self {
            mac,
            rt_frames: Vec::new(),
            lldp_frames: Vec::new(),
            fail_sends: false,
        }
    }
}

impl NetworkInterface for SimulatedInterface {
    fn send_frame(&mut self, frame: &[u8]) -> Result<usize, ProfinetError> {
        if self.fail_sends {
            return Err(ProfinetError::IoError);
        }
        self.rt_frames.push(frame.to_vec());
        Ok(frame.len())
    }

    fn send_lldp_frame(&mut self, frame: &[u8]) -> Result<usize, ProfinetError> {
        if self.fail_sends {
            return Err(ProfinetError::IoError);
        }
        self.lldp_frames.push(frame.to_vec());
        Ok(frame.len())
    }

    fn local_mac_address(&self) -> [u8; 6] {
        self.mac
    }
}

/// One delivered diagnosis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagCall {
    pub ar: usize,
    pub addr: SubmoduleAddr,
    pub item: DiagItem,
}

/// One delivered port change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub ar: usize,
    pub addr: SubmoduleAddr,
    pub module_ident: u32,
    pub submodule_ident: u32,
    pub item: DiagItem,
}

/// Records every diagnosis interaction. `update` only succeeds for a
/// record that was `add`ed before, mirroring the real record store.
#[derive(Default)]
pub struct RecordingDiagnostics {
    existing: HashSet<(usize, u16, u16, u16, u16)>,
    pub updates: Vec<DiagCall>,
    pub adds: Vec<DiagCall>,
    pub notifications: Vec<Notification>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(ar: usize, addr: SubmoduleAddr, item: &DiagItem) -> (usize, u16, u16, u16, u16) {
        (
            ar,
            addr.slot,
            addr.subslot,
            item.ch_error_type,
            item.ext_ch_error_type,
        )
    }
}

impl DiagnosticsPort for RecordingDiagnostics {
    fn update(
        &mut self,
        ar: usize,
        addr: SubmoduleAddr,
        item: &DiagItem,
    ) -> Result<(), ProfinetError> {
        if !self.existing.contains(&Self::key(ar, addr, item)) {
            return Err(ProfinetError::NoSuchAddress);
        }
        self.updates.push(DiagCall {
            ar,
            addr,
            item: *item,
        });
        Ok(())
    }

    fn add(
        &mut self,
        ar: usize,
        addr: SubmoduleAddr,
        item: &DiagItem,
    ) -> Result<(), ProfinetError> {
        self.existing.insert(Self::key(ar, addr, item));
        self.adds.push(DiagCall {
            ar,
            addr,
            item: *item,
        });
        Ok(())
    }

    fn send_port_change_notification(
        &mut self,
        ar: usize,
        addr: SubmoduleAddr,
        module_ident: u32,
        submodule_ident: u32,
        item: &DiagItem,
    ) {
        self.notifications.push(Notification {
            ar,
            addr,
            module_ident,
            submodule_ident,
            item: *item,
        });
    }
}

/// Records classified PPM faults delivered to the connection manager.
#[derive(Default)]
pub struct RecordingEvents {
    pub ppm_errors: Vec<(usize, ClassifiedError)>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConnectionEventSink for RecordingEvents {
    fn ppm_error_ind(&mut self, ar: usize, error: ClassifiedError) {
        self.ppm_errors.push((ar, error));
    }
}
