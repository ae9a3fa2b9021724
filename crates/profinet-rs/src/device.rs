// crates/profinet-rs/src/device.rs
//! The IO-Device instance: owns the application relations, the PPM and
//! LLDP engines, the timeout queue and the interface statistics.
//!
//! The embedding drives the device by calling [`IoDevice::poll`] with
//! the current time, either from a software scheduler tick or from OS
//! timer callbacks; [`IoDevice::next_action_time`] tells it when the
//! next deadline is due.

use crate::ar::Ar;
use crate::diag::{ConnectionEventSink, DiagnosticsPort};
use crate::frame::MacAddress;
use crate::hal::{NetworkInterface, ProfinetError};
use crate::lldp::{self, LldpConfig, LldpEngine};
use crate::ppm::{self, PpmEngine};
use crate::scheduler::{Scheduler, SchedulerConfig, TimeoutKind};

/// Static device parameters.
#[derive(Debug, Clone, Default)]
pub struct DeviceConfig {
    /// Interface MAC address; source of every transmitted frame.
    pub mac: MacAddress,
    pub lldp: LldpConfig,
    pub scheduler: SchedulerConfig,
}

/// Transmit counters of the physical interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterfaceStats {
    pub if_out_octets: u64,
    pub if_out_errors: u64,
}

/// One PROFINET IO-Device.
pub struct IoDevice {
    cfg: DeviceConfig,
    /// Current IPv4 address, advertised in the LLDP management TLV.
    ip_addr: u32,
    ars: Vec<Ar>,
    ppm: PpmEngine,
    lldp: LldpEngine,
    sched: Scheduler,
    stats: InterfaceStats,
}

impl IoDevice {
    pub fn new(cfg: DeviceConfig) -> Self {
        let sched = Scheduler::new(cfg.scheduler);
        Self {
            cfg,
            ip_addr: 0,
            ars: Vec::new(),
            ppm: PpmEngine::new(),
            lldp: LldpEngine::new(),
            sched,
            stats: InterfaceStats::default(),
        }
    }

    // --- Connection management ---

    /// Registers an AR and returns its index.
    pub fn add_ar(&mut self, ar: Ar) -> usize {
        self.ars.push(ar);
        self.ars.len() - 1
    }

    pub fn ars(&self) -> &[Ar] {
        &self.ars
    }

    pub fn ar(&self, ar_ix: usize) -> Option<&Ar> {
        self.ars.get(ar_ix)
    }

    pub fn ar_mut(&mut self, ar_ix: usize) -> Option<&mut Ar> {
        self.ars.get_mut(ar_ix)
    }

    /// Updates the device IPv4 address (network byte order as a u32).
    pub fn set_ip_addr(&mut self, ip_addr: u32) {
        self.ip_addr = ip_addr;
    }

    // --- PPM ---

    /// Starts cyclic transmission for IOCR `crep` of AR `ar_ix`.
    pub fn ppm_activate<C: ConnectionEventSink>(
        &mut self,
        ar_ix: usize,
        crep: usize,
        events: &mut C,
        now_us: u64,
    ) -> Result<(), ProfinetError> {
        let ar = self.ars.get_mut(ar_ix).ok_or(ProfinetError::NoSuchIocr)?;
        ppm::activate(&mut self.ppm, &mut self.sched, ar, ar_ix, crep, events, now_us)
    }

    /// Stops cyclic transmission for IOCR `crep` of AR `ar_ix`.
    pub fn ppm_close(&mut self, ar_ix: usize, crep: usize) -> Result<(), ProfinetError> {
        let ar = self.ars.get_mut(ar_ix).ok_or(ProfinetError::NoSuchIocr)?;
        ppm::close(&mut self.ppm, &mut self.sched, ar, crep)
    }

    pub fn set_data_and_iops(
        &mut self,
        api_id: u32,
        slot: u16,
        subslot: u16,
        data: &[u8],
        iops: &[u8],
    ) -> Result<(), ProfinetError> {
        ppm::set_data_and_iops(&self.ppm, &mut self.ars, api_id, slot, subslot, data, iops)
    }

    pub fn set_iocs(
        &mut self,
        api_id: u32,
        slot: u16,
        subslot: u16,
        iocs: &[u8],
    ) -> Result<(), ProfinetError> {
        ppm::set_iocs(&self.ppm, &mut self.ars, api_id, slot, subslot, iocs)
    }

    pub fn get_data_and_iops(
        &mut self,
        api_id: u32,
        slot: u16,
        subslot: u16,
        data: &mut [u8],
        iops: &mut [u8],
    ) -> Result<(u16, u8), ProfinetError> {
        ppm::get_data_and_iops(&self.ppm, &mut self.ars, api_id, slot, subslot, data, iops)
    }

    pub fn get_iocs(
        &mut self,
        api_id: u32,
        slot: u16,
        subslot: u16,
        iocs: &mut [u8],
    ) -> Result<u8, ProfinetError> {
        ppm::get_iocs(&self.ppm, &mut self.ars, api_id, slot, subslot, iocs)
    }

    pub fn set_data_status_state(&mut self, ar_ix: usize, primary: bool) {
        if let Some(ar) = self.ars.get_mut(ar_ix) {
            ppm::set_data_status_state(ar, primary);
        }
    }

    pub fn set_data_status_redundancy(&mut self, ar_ix: usize, redundant: bool) {
        if let Some(ar) = self.ars.get_mut(ar_ix) {
            ppm::set_data_status_redundancy(ar, redundant);
        }
    }

    pub fn set_data_status_provider(&mut self, ar_ix: usize, run: bool) {
        if let Some(ar) = self.ars.get_mut(ar_ix) {
            ppm::set_data_status_provider(ar, run);
        }
    }

    pub fn set_problem_indicator(&mut self, ar_ix: usize, problem: bool) {
        if let Some(ar) = self.ars.get_mut(ar_ix) {
            ppm::set_problem_indicator(ar, problem);
        }
    }

    pub fn get_data_status(&self, ar_ix: usize, crep: usize) -> Result<u8, ProfinetError> {
        let ar = self.ars.get(ar_ix).ok_or(ProfinetError::NoSuchIocr)?;
        ppm::get_data_status(ar, crep)
    }

    pub fn ppm_engine(&self) -> &PpmEngine {
        &self.ppm
    }

    // --- LLDP ---

    /// Transmits one LLDP frame immediately.
    pub fn lldp_send<N: NetworkInterface>(&mut self, ifc: &mut N) -> Result<(), ProfinetError> {
        lldp::send(
            &self.lldp,
            &self.cfg.lldp,
            self.cfg.mac,
            self.ip_addr,
            &mut self.stats,
            ifc,
        )
    }

    /// Starts the periodic LLDP broadcast.
    pub fn lldp_start_broadcast(&mut self, now_us: u64) -> Result<(), ProfinetError> {
        lldp::start_broadcast(&mut self.lldp, &mut self.sched, now_us)
    }

    /// Feeds a received LLDP frame into the peer database. `start` is
    /// the offset of the first TLV (after the Ethernet header).
    pub fn lldp_recv<D: DiagnosticsPort>(
        &mut self,
        now_us: u64,
        frame: &[u8],
        start: usize,
        diag: &mut D,
    ) -> Result<(), ProfinetError> {
        lldp::recv(
            &mut self.lldp,
            &mut self.ars,
            &mut self.sched,
            diag,
            now_us,
            frame,
            start,
        )
    }

    /// Peer boundary flag: suppresses LLDP transmission when set.
    pub fn set_lldp_transmit_suppressed(&mut self, suppress: bool) {
        self.lldp.set_transmit_suppressed(suppress);
    }

    pub fn lldp_engine(&self) -> &LldpEngine {
        &self.lldp
    }

    // --- Driving ---

    /// Absolute time of the next pending deadline, if any.
    pub fn next_action_time(&self) -> Option<u64> {
        self.sched.next_deadline()
    }

    /// Dispatches every timeout due at `now_us`.
    pub fn poll<N, D, C>(&mut self, now_us: u64, ifc: &mut N, diag: &mut D, events: &mut C)
    where
        N: NetworkInterface,
        D: DiagnosticsPort,
        C: ConnectionEventSink,
    {
        while let Some((_, kind)) = self.sched.pop_due(now_us) {
            match kind {
                TimeoutKind::PpmSend { ar, crep } => {
                    if let Some(ar_ref) = self.ars.get_mut(ar) {
                        ppm::send(
                            &self.ppm,
                            &mut self.sched,
                            &mut self.stats,
                            ar_ref,
                            ar,
                            crep,
                            ifc,
                            events,
                            now_us,
                        );
                    }
                }
                TimeoutKind::LldpBroadcast => {
                    lldp::on_broadcast_timeout(
                        &mut self.lldp,
                        &self.cfg.lldp,
                        self.cfg.mac,
                        self.ip_addr,
                        &mut self.stats,
                        ifc,
                        &mut self.sched,
                        now_us,
                    );
                }
                TimeoutKind::LldpPeerExpiry => {
                    lldp::on_peer_expiry(&mut self.lldp, &mut self.ars, diag);
                }
            }
        }
    }

    pub fn stats(&self) -> &InterfaceStats {
        &self.stats
    }
}
