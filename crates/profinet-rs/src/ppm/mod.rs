// crates/profinet-rs/src/ppm/mod.rs
//! Cyclic Provider Protocol Machine (PPM).
//!
//! One PPM instance exists per provider IOCR. It owns a pre-framed
//! transmit buffer whose Ethernet, VLAN and frame-ID bytes are written
//! once at activation; every cycle only the staged payload and the
//! trailing cycle counter / status bytes are patched before the buffer
//! is handed to the driver.
//!
//! A single engine-wide mutex serialises the staged payload of all
//! instances. The locking window is one `memcpy`, so contention is not
//! a concern. The mutex is created when the first instance activates
//! and dropped when the last one closes.

use crate::ar::Ar;
use crate::device::InterfaceStats;
use crate::diag::ConnectionEventSink;
use crate::frame::FrameWriter;
use crate::hal::{NetworkInterface, ProfinetError};
use crate::scheduler::{Scheduler, SchedulerMode, TimeoutId, TimeoutKind};
use crate::types::{
    ClassifiedError, DataStatus, ETHTYPE_PROFINET, ETHTYPE_VLAN, FRAME_BUFFER_SIZE,
    MAC_ADDRESS_SIZE,
};
use log::{debug, error};
use std::sync::{Arc, Mutex, PoisonError};

/// Bytes preceding the cyclic payload: destination MAC, source MAC,
/// VLAN tag, EtherType, PROFINET frame ID.
pub const RT_HEADER_SIZE: usize = 2 * MAC_ADDRESS_SIZE + 4 + 2 + 2;

/// Data status installed at activation: PRIMARY, data valid, no
/// station problem.
pub const DEFAULT_DATA_STATUS: DataStatus = DataStatus(
    DataStatus::STATE.0 | DataStatus::DATA_VALID.0 | DataStatus::PROBLEM_INDICATOR.0,
);

/// PPM life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpmState {
    WaitStart,
    Run,
}

/// Per-IOCR provider state.
#[derive(Debug)]
pub struct Ppm {
    pub(crate) state: PpmState,
    /// Pre-framed transmit buffer; allocated at activation, freed at close.
    pub(crate) send_buffer: Option<Vec<u8>>,
    /// Staging area mutated by the application, copied into the frame
    /// each cycle under the engine buffer lock.
    pub(crate) buffer_data: Vec<u8>,
    pub(crate) buffer_pos: usize,
    pub(crate) cycle_counter_offset: usize,
    pub(crate) data_status_offset: usize,
    pub(crate) transfer_status_offset: usize,
    pub(crate) buffer_length: usize,
    pub(crate) data_status: DataStatus,
    pub(crate) transfer_status: u8,
    /// Last transmitted cycle counter.
    pub(crate) cycle: u16,
    pub(crate) send_clock_factor: u16,
    pub(crate) reduction_ratio: u16,
    /// Target transmit period in microseconds.
    pub(crate) control_interval: u32,
    /// Transmit period adjusted to the stack tick grid.
    pub(crate) compensated_control_interval: u32,
    pub(crate) first_transmit: bool,
    pub(crate) ci_running: bool,
    pub(crate) ci_timer: Option<TimeoutId>,
    pub(crate) trx_cnt: u32,
    pub(crate) errcnt: u32,
}

impl Ppm {
    pub(crate) fn new(c_sdu_length: u16) -> Self {
        Self {
            state: PpmState::WaitStart,
            send_buffer: None,
            buffer_data: vec![0; usize::from(c_sdu_length)],
            buffer_pos: 0,
            cycle_counter_offset: 0,
            data_status_offset: 0,
            transfer_status_offset: 0,
            buffer_length: 0,
            data_status: DataStatus::empty(),
            transfer_status: 0,
            cycle: 0,
            send_clock_factor: 0,
            reduction_ratio: 0,
            control_interval: 0,
            compensated_control_interval: 0,
            first_transmit: false,
            ci_running: false,
            ci_timer: None,
            trx_cnt: 0,
            errcnt: 0,
        }
    }

    pub fn state(&self) -> PpmState {
        self.state
    }

    pub fn data_status(&self) -> DataStatus {
        self.data_status
    }

    /// Introspection snapshot of the instance.
    pub fn status(&self) -> PpmStatus {
        PpmStatus {
            state: self.state,
            cycle: self.cycle,
            control_interval: self.control_interval,
            compensated_control_interval: self.compensated_control_interval,
            trx_cnt: self.trx_cnt,
            errcnt: self.errcnt,
            first_transmit: self.first_transmit,
            ci_running: self.ci_running,
            buffer_length: self.buffer_length,
        }
    }
}

/// Read-only summary of one PPM instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpmStatus {
    pub state: PpmState,
    pub cycle: u16,
    pub control_interval: u32,
    pub compensated_control_interval: u32,
    pub trx_cnt: u32,
    pub errcnt: u32,
    pub first_transmit: bool,
    pub ci_running: bool,
    pub buffer_length: usize,
}

fn set_state(ppm: &mut Ppm, state: PpmState) {
    debug!("[PPM] New state {:?}", state);
    ppm.state = state;
}

/// Engine-wide PPM bookkeeping: the active instance count and the
/// shared transmit-buffer lock whose lifetime is tied to it.
#[derive(Debug, Default)]
pub struct PpmEngine {
    instance_count: u32,
    buf_lock: Option<Arc<Mutex<()>>>,
}

impl PpmEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    /// The shared buffer lock. Exists exactly while at least one
    /// instance is active.
    pub fn buf_lock(&self) -> Option<&Arc<Mutex<()>>> {
        self.buf_lock.as_ref()
    }

    fn instance_started(&mut self) {
        if self.instance_count == 0 {
            self.buf_lock = Some(Arc::new(Mutex::new(())));
        }
        self.instance_count += 1;
    }

    /// Returns true on the 1 -> 0 transition.
    fn instance_stopped(&mut self) -> bool {
        self.instance_count = self.instance_count.saturating_sub(1);
        if self.instance_count == 0 {
            self.buf_lock = None;
            true
        } else {
            false
        }
    }
}

// --- Timing ---

/// Cycle counter for a frame transmitted at `now_us`, snapped down to
/// the `send_clock_factor * reduction_ratio` grid of 31.25 us ticks.
pub fn cycle_counter(now_us: u64, send_clock_factor: u16, reduction_ratio: u16) -> u16 {
    let raw = now_us * 4 / 125;
    let ratio = u64::from(send_clock_factor) * u64::from(reduction_ratio);
    let snapped = if raw < ratio { ratio } else { raw - raw % ratio };
    snapped as u16
}

/// Scheduler delay realising `wanted_delay_us` on a driver with a tick
/// granularity of `stack_cycle_time_us`.
///
/// Scheduling a delay close to a multiple of the tick is risky on a
/// cooperative scheduler: the timeout sometimes lands just before the
/// tick and sometimes just after, spacing events by one or two ticks.
/// The cooperative formula therefore aims half a tick early. A
/// preemptive driver fires at its programmed time and gets the full
/// multiple.
pub fn compensated_delay(
    wanted_delay_us: u32,
    stack_cycle_time_us: u32,
    mode: SchedulerMode,
) -> u32 {
    // We must wait at least one tick.
    let mut number_of_stack_ticks: u32 = 1;

    if wanted_delay_us > stack_cycle_time_us + stack_cycle_time_us / 2 {
        number_of_stack_ticks = (wanted_delay_us + stack_cycle_time_us / 2) / stack_cycle_time_us;
    }

    match mode {
        SchedulerMode::Preemptive => number_of_stack_ticks * stack_cycle_time_us,
        SchedulerMode::Cooperative => {
            number_of_stack_ticks * stack_cycle_time_us - stack_cycle_time_us / 2
        }
    }
}

// --- Error indication ---

/// Classifies a runtime PPM fault on the AR and notifies the
/// connection manager. Cyclic transmission for the instance has
/// stopped when this is called.
fn fault_ind<C: ConnectionEventSink>(ar: &mut Ar, ar_ix: usize, events: &mut C) {
    ar.err = Some(ClassifiedError::PPM_INVALID);
    events.ppm_error_ind(ar_ix, ClassifiedError::PPM_INVALID);
}

// --- Activation and close ---

/// Initialises and starts the PPM of IOCR `crep` in `ar`.
///
/// On success the fixed frame header is written, the instance enters
/// `RUN` and the first transmit timeout is armed at the compensated
/// control interval.
pub fn activate<C: ConnectionEventSink>(
    engine: &mut PpmEngine,
    sched: &mut Scheduler,
    ar: &mut Ar,
    ar_ix: usize,
    crep: usize,
    events: &mut C,
    now_us: u64,
) -> Result<(), ProfinetError> {
    let state = ar
        .iocrs
        .get(crep)
        .and_then(|iocr| iocr.provider())
        .map(|cr| cr.ppm.state)
        .ok_or(ProfinetError::NoSuchIocr)?;

    if state == PpmState::Run {
        debug!("[PPM] Activate in wrong state: {:?}", state);
        ar.err = Some(ClassifiedError::PPM_INVALID_STATE);
        return Err(ProfinetError::InvalidState);
    }

    let param = ar.iocrs[crep].param;
    let initiator_mac = ar.initiator_mac;
    let responder_mac = ar.responder_mac;

    // Pre-compute the offsets into the send buffer.
    let buffer_pos = RT_HEADER_SIZE;
    let c_sdu_length = usize::from(param.c_sdu_length);
    let cycle_counter_offset = buffer_pos + c_sdu_length;
    let data_status_offset = cycle_counter_offset + 2;
    let transfer_status_offset = data_status_offset + 1;
    let buffer_length = transfer_status_offset + 1;

    if buffer_length > FRAME_BUFFER_SIZE {
        return Err(ProfinetError::FrameTooLarge);
    }

    // The header bytes are written exactly once; cyclic sending only
    // touches the payload region and the trailing status fields.
    let mut send_buffer = vec![0u8; buffer_length];
    {
        let mut writer = FrameWriter::new(&mut send_buffer);
        writer.put_bytes(&initiator_mac.0)?;
        writer.put_bytes(&responder_mac.0)?;
        writer.put_u16_be(ETHTYPE_VLAN)?;
        writer.put_u16_be(param.tag_header.tci())?;
        writer.put_u16_be(ETHTYPE_PROFINET)?;
        writer.put_u16_be(param.frame_id)?;
    }

    let control_interval =
        u32::from(param.send_clock_factor) * u32::from(param.reduction_ratio) * 1000 / 32;
    let compensated_control_interval =
        compensated_delay(control_interval, sched.tick_interval_us(), sched.mode());

    engine.instance_started();

    let schedule_result = {
        let Some(cr) = ar.iocrs[crep].provider_mut() else {
            return Err(ProfinetError::NoSuchIocr);
        };
        let ppm = &mut cr.ppm;
        ppm.first_transmit = false;
        ppm.buffer_pos = buffer_pos;
        ppm.cycle_counter_offset = cycle_counter_offset;
        ppm.data_status_offset = data_status_offset;
        ppm.transfer_status_offset = transfer_status_offset;
        ppm.buffer_length = buffer_length;
        ppm.cycle = 0;
        ppm.transfer_status = 0;
        ppm.data_status = DEFAULT_DATA_STATUS;
        ppm.send_buffer = Some(send_buffer);
        ppm.send_clock_factor = param.send_clock_factor;
        ppm.reduction_ratio = param.reduction_ratio;
        ppm.control_interval = control_interval;
        ppm.compensated_control_interval = compensated_control_interval;

        debug!(
            "[PPM] Starting cyclic sending for CREP {} with period {} microseconds",
            crep, control_interval
        );
        set_state(ppm, PpmState::Run);
        ppm.ci_running = true;

        let result = sched.schedule(
            now_us,
            u64::from(compensated_control_interval),
            TimeoutKind::PpmSend { ar: ar_ix, crep },
        );
        ppm.ci_timer = result.ok();
        result
    };

    match schedule_result {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("[PPM] Could not arm the transmit timer for CREP {}", crep);
            fault_ind(ar, ar_ix, events);
            Err(e)
        }
    }
}

/// Stops cyclic transmission for IOCR `crep` and releases its buffers.
pub fn close(
    engine: &mut PpmEngine,
    sched: &mut Scheduler,
    ar: &mut Ar,
    crep: usize,
) -> Result<(), ProfinetError> {
    debug!("[PPM] close");
    let cr = ar
        .iocrs
        .get_mut(crep)
        .and_then(|iocr| iocr.provider_mut())
        .ok_or(ProfinetError::NoSuchIocr)?;

    let was_running = cr.ppm.state == PpmState::Run;
    cr.ppm.ci_running = false;
    if let Some(id) = cr.ppm.ci_timer.take() {
        sched.cancel(id);
    }
    cr.ppm.send_buffer = None;
    set_state(&mut cr.ppm, PpmState::WaitStart);

    if was_running && engine.instance_stopped() {
        cr.ppm.data_status = DataStatus::empty();
    }

    Ok(())
}

// --- Cyclic send ---

/// Transmit step, dispatched when a `PpmSend` timeout fires.
///
/// Copies the staged payload under the buffer lock, patches the cycle
/// counter and status fields, hands the frame to the driver and
/// re-arms the timer. A stopped instance (`ci_running == false`) does
/// nothing and is not re-armed.
pub(crate) fn send<N: NetworkInterface, C: ConnectionEventSink>(
    engine: &PpmEngine,
    sched: &mut Scheduler,
    stats: &mut InterfaceStats,
    ar: &mut Ar,
    ar_ix: usize,
    crep: usize,
    ifc: &mut N,
    events: &mut C,
    now_us: u64,
) {
    let mode = sched.mode();

    let (send_result, compensated_control_interval) = {
        let Some(cr) = ar.iocrs.get_mut(crep).and_then(|iocr| iocr.provider_mut()) else {
            return;
        };
        cr.ppm.ci_timer = None;
        if !cr.ppm.ci_running {
            return;
        }

        let in_length = usize::from(cr.in_length);
        let ppm = &mut cr.ppm;
        ppm.cycle = cycle_counter(now_us, ppm.send_clock_factor, ppm.reduction_ratio);

        let cycle = ppm.cycle;
        let buffer_pos = ppm.buffer_pos;
        let cycle_counter_offset = ppm.cycle_counter_offset;
        let data_status_offset = ppm.data_status_offset;
        let transfer_status_offset = ppm.transfer_status_offset;
        let data_status = ppm.data_status.0;
        let transfer_status = ppm.transfer_status;
        let compensated_control_interval = ppm.compensated_control_interval;

        let buffer_data = &ppm.buffer_data;
        let Some(buffer) = ppm.send_buffer.as_mut() else {
            return;
        };

        if let Some(lock) = engine.buf_lock() {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            buffer[buffer_pos..buffer_pos + in_length].copy_from_slice(&buffer_data[..in_length]);
        }

        buffer[cycle_counter_offset..cycle_counter_offset + 2]
            .copy_from_slice(&cycle.to_be_bytes());
        buffer[data_status_offset] = data_status;
        buffer[transfer_status_offset] = transfer_status;

        (ifc.send_frame(buffer), compensated_control_interval)
    };

    let rearm = |sched: &mut Scheduler| {
        sched.schedule(
            now_us,
            u64::from(compensated_control_interval),
            TimeoutKind::PpmSend { ar: ar_ix, crep },
        )
    };

    match send_result {
        Err(_) => {
            stats.if_out_errors += 1;
            error!("[PPM] Error from the Ethernet driver");
            if let Some(cr) = ar.iocrs[crep].provider_mut() {
                cr.ppm.errcnt += 1;
            }
            match mode {
                // The buffer is retained; try again next period.
                SchedulerMode::Preemptive => match rearm(sched) {
                    Ok(id) => {
                        if let Some(cr) = ar.iocrs[crep].provider_mut() {
                            cr.ppm.ci_timer = Some(id);
                        }
                    }
                    Err(_) => fault_ind(ar, ar_ix, events),
                },
                SchedulerMode::Cooperative => fault_ind(ar, ar_ix, events),
            }
        }
        Ok(bytes_sent) => {
            stats.if_out_octets += bytes_sent as u64;
            match rearm(sched) {
                Ok(id) => {
                    if let Some(cr) = ar.iocrs[crep].provider_mut() {
                        cr.ppm.ci_timer = Some(id);
                        cr.ppm.trx_cnt += 1;
                        if !cr.ppm.first_transmit {
                            debug!("[PPM] First frame transmitted for CREP {}", crep);
                            cr.ppm.first_transmit = true;
                        }
                    }
                }
                Err(_) => fault_ind(ar, ar_ix, events),
            }
        }
    }
}

// --- Set and get data, IOPS and IOCS ---

/// Finds the AR, provider IOCR and IODATA descriptor for a sub-slot.
fn find_iodata(ars: &[Ar], api_id: u32, slot: u16, subslot: u16) -> Option<(usize, usize, usize)> {
    for (ar_ix, ar) in ars.iter().enumerate() {
        if !ar.in_use {
            continue;
        }
        for (crep, iocr) in ar.iocrs.iter().enumerate() {
            let Some(cr) = iocr.provider() else {
                continue;
            };
            for (iodata_ix, desc) in cr.data_desc.iter().enumerate() {
                if desc.in_use
                    && desc.api_id == api_id
                    && desc.slot == slot
                    && desc.subslot == subslot
                {
                    return Some((ar_ix, crep, iodata_ix));
                }
            }
        }
    }
    None
}

/// Writes input data and its IOPS into the staging area of the owning
/// provider CR.
pub fn set_data_and_iops(
    engine: &PpmEngine,
    ars: &mut [Ar],
    api_id: u32,
    slot: u16,
    subslot: u16,
    data: &[u8],
    iops: &[u8],
) -> Result<(), ProfinetError> {
    let Some((ar_ix, crep, iodata_ix)) = find_iodata(ars, api_id, slot, subslot) else {
        // May happen after an ABORT.
        debug!("[PPM] No data descriptor found for set data");
        return Err(ProfinetError::NoSuchAddress);
    };
    let ar = &mut ars[ar_ix];

    let state = ar.iocrs[crep]
        .provider()
        .map(|cr| cr.ppm.state)
        .ok_or(ProfinetError::NoSuchIocr)?;
    match state {
        PpmState::WaitStart => {
            debug!("[PPM] Set data in wrong state: {:?}", state);
            ar.err = Some(ClassifiedError::PPM_INVALID_STATE);
            Err(ProfinetError::InvalidState)
        }
        PpmState::Run => {
            let Some(cr) = ar.iocrs[crep].provider_mut() else {
                return Err(ProfinetError::NoSuchIocr);
            };
            let desc = cr.data_desc[iodata_ix];
            if data.len() != usize::from(desc.data_length) {
                error!(
                    "[PPM] data_len {} does not match expected length {}",
                    data.len(),
                    desc.data_length
                );
                return Err(ProfinetError::LengthMismatch {
                    given: data.len() as u16,
                    expected: desc.data_length,
                });
            }
            if iops.len() != usize::from(desc.iops_length) {
                error!(
                    "[PPM] iops_len {} does not match expected length {}",
                    iops.len(),
                    desc.iops_length
                );
                return Err(ProfinetError::LengthMismatch {
                    given: iops.len() as u16,
                    expected: u16::from(desc.iops_length),
                });
            }

            let lock = engine.buf_lock().ok_or(ProfinetError::InvalidState)?;
            {
                let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                if !data.is_empty() {
                    let off = usize::from(desc.data_offset);
                    cr.ppm.buffer_data[off..off + data.len()].copy_from_slice(data);
                }
                if !iops.is_empty() {
                    let off = usize::from(desc.iops_offset);
                    cr.ppm.buffer_data[off..off + iops.len()].copy_from_slice(iops);
                }
            }
            cr.data_desc[iodata_ix].data_avail = true;
            Ok(())
        }
    }
}

/// Writes the consumer status for a sub-slot into the staging area.
pub fn set_iocs(
    engine: &PpmEngine,
    ars: &mut [Ar],
    api_id: u32,
    slot: u16,
    subslot: u16,
    iocs: &[u8],
) -> Result<(), ProfinetError> {
    let Some((ar_ix, crep, iodata_ix)) = find_iodata(ars, api_id, slot, subslot) else {
        error!("[PPM] No data descriptor found for set iocs");
        return Err(ProfinetError::NoSuchAddress);
    };
    let ar = &mut ars[ar_ix];

    let state = ar.iocrs[crep]
        .provider()
        .map(|cr| cr.ppm.state)
        .ok_or(ProfinetError::NoSuchIocr)?;
    match state {
        PpmState::WaitStart => {
            debug!("[PPM] Set iocs in wrong state: {:?}", state);
            ar.err = Some(ClassifiedError::PPM_INVALID_STATE);
            Err(ProfinetError::InvalidState)
        }
        PpmState::Run => {
            let Some(cr) = ar.iocrs[crep].provider_mut() else {
                return Err(ProfinetError::NoSuchIocr);
            };
            let desc = cr.data_desc[iodata_ix];
            if desc.iocs_length == 0 {
                // Sub-slot carries no consumer status.
                debug!("[PPM] iocs_len is zero");
                return Ok(());
            }
            if iocs.len() != usize::from(desc.iocs_length) {
                error!(
                    "[PPM] iocs_len {} does not match expected length {}",
                    iocs.len(),
                    desc.iocs_length
                );
                return Err(ProfinetError::LengthMismatch {
                    given: iocs.len() as u16,
                    expected: u16::from(desc.iocs_length),
                });
            }

            let lock = engine.buf_lock().ok_or(ProfinetError::InvalidState)?;
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let off = usize::from(desc.iocs_offset);
            cr.ppm.buffer_data[off..off + iocs.len()].copy_from_slice(iocs);
            Ok(())
        }
    }
}

/// Reads back the staged input data and IOPS for a sub-slot. Returns
/// the actual `(data, iops)` lengths.
pub fn get_data_and_iops(
    engine: &PpmEngine,
    ars: &mut [Ar],
    api_id: u32,
    slot: u16,
    subslot: u16,
    data: &mut [u8],
    iops: &mut [u8],
) -> Result<(u16, u8), ProfinetError> {
    let Some((ar_ix, crep, iodata_ix)) = find_iodata(ars, api_id, slot, subslot) else {
        error!("[PPM] No data descriptor found for get data");
        return Err(ProfinetError::NoSuchAddress);
    };
    let ar = &mut ars[ar_ix];

    let state = ar.iocrs[crep]
        .provider()
        .map(|cr| cr.ppm.state)
        .ok_or(ProfinetError::NoSuchIocr)?;
    match state {
        PpmState::WaitStart => {
            debug!("[PPM] Get data in wrong state: {:?}", state);
            ar.err = Some(ClassifiedError::PPM_INVALID_STATE);
            Err(ProfinetError::InvalidState)
        }
        PpmState::Run => {
            let Some(cr) = ar.iocrs[crep].provider() else {
                return Err(ProfinetError::NoSuchIocr);
            };
            let desc = cr.data_desc[iodata_ix];
            if data.len() < usize::from(desc.data_length) {
                error!(
                    "[PPM] data buffer {} too small for length {}",
                    data.len(),
                    desc.data_length
                );
                return Err(ProfinetError::BufferTooShort);
            }
            if iops.len() < usize::from(desc.iops_length) {
                error!(
                    "[PPM] iops buffer {} too small for length {}",
                    iops.len(),
                    desc.iops_length
                );
                return Err(ProfinetError::BufferTooShort);
            }

            let lock = engine.buf_lock().ok_or(ProfinetError::InvalidState)?;
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let data_off = usize::from(desc.data_offset);
            let iops_off = usize::from(desc.iops_offset);
            data[..usize::from(desc.data_length)]
                .copy_from_slice(&cr.ppm.buffer_data[data_off..data_off + usize::from(desc.data_length)]);
            iops[..usize::from(desc.iops_length)]
                .copy_from_slice(&cr.ppm.buffer_data[iops_off..iops_off + usize::from(desc.iops_length)]);
            Ok((desc.data_length, desc.iops_length))
        }
    }
}

/// Reads back the staged IOCS for a sub-slot. Returns its length.
pub fn get_iocs(
    engine: &PpmEngine,
    ars: &mut [Ar],
    api_id: u32,
    slot: u16,
    subslot: u16,
    iocs: &mut [u8],
) -> Result<u8, ProfinetError> {
    let Some((ar_ix, crep, iodata_ix)) = find_iodata(ars, api_id, slot, subslot) else {
        error!("[PPM] No data descriptor found for get iocs");
        return Err(ProfinetError::NoSuchAddress);
    };
    let ar = &mut ars[ar_ix];

    let state = ar.iocrs[crep]
        .provider()
        .map(|cr| cr.ppm.state)
        .ok_or(ProfinetError::NoSuchIocr)?;
    match state {
        PpmState::WaitStart => {
            debug!("[PPM] Get iocs in wrong state: {:?}", state);
            ar.err = Some(ClassifiedError::PPM_INVALID_STATE);
            Err(ProfinetError::InvalidState)
        }
        PpmState::Run => {
            let Some(cr) = ar.iocrs[crep].provider() else {
                return Err(ProfinetError::NoSuchIocr);
            };
            let desc = cr.data_desc[iodata_ix];
            if iocs.len() < usize::from(desc.iocs_length) {
                error!(
                    "[PPM] iocs buffer {} too small for length {}",
                    iocs.len(),
                    desc.iocs_length
                );
                return Err(ProfinetError::BufferTooShort);
            }

            let lock = engine.buf_lock().ok_or(ProfinetError::InvalidState)?;
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let off = usize::from(desc.iocs_offset);
            iocs[..usize::from(desc.iocs_length)]
                .copy_from_slice(&cr.ppm.buffer_data[off..off + usize::from(desc.iocs_length)]);
            Ok(desc.iocs_length)
        }
    }
}

// --- Data status ---

fn for_each_provider(ar: &mut Ar, mut f: impl FnMut(&mut Ppm)) {
    for iocr in &mut ar.iocrs {
        if let Some(cr) = iocr.provider_mut() {
            f(&mut cr.ppm);
        }
    }
}

/// Sets or clears the PRIMARY bit in every provider CR of the AR.
pub fn set_data_status_state(ar: &mut Ar, primary: bool) {
    for_each_provider(ar, |ppm| ppm.data_status.set(DataStatus::STATE, primary));
}

/// Sets or clears the redundancy bit in every provider CR of the AR.
pub fn set_data_status_redundancy(ar: &mut Ar, redundant: bool) {
    for_each_provider(ar, |ppm| {
        ppm.data_status.set(DataStatus::REDUNDANCY, redundant)
    });
}

/// Sets or clears the provider RUN bit in every provider CR of the AR.
pub fn set_data_status_provider(ar: &mut Ar, run: bool) {
    for_each_provider(ar, |ppm| {
        ppm.data_status.set(DataStatus::PROVIDER_STATE, run)
    });
}

/// Reflects the station problem indicator in every provider CR of the
/// AR. A problem clears bit 5; normal operation sets it.
pub fn set_problem_indicator(ar: &mut Ar, problem: bool) {
    for_each_provider(ar, |ppm| {
        ppm.data_status.set(DataStatus::PROBLEM_INDICATOR, !problem)
    });
}

/// The current data status byte of IOCR `crep`.
pub fn get_data_status(ar: &Ar, crep: usize) -> Result<u8, ProfinetError> {
    ar.iocrs
        .get(crep)
        .and_then(|iocr| iocr.provider())
        .map(|cr| cr.ppm.data_status.0)
        .ok_or(ProfinetError::NoSuchIocr)
}
