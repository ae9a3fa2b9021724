// crates/profinet-rs/tests/cyclic_data.rs
//! End-to-end scenarios for the cyclic provider machinery.

mod simulator;

use profinet_rs::ar::{Ar, Iocr, IocrParam, IocrType, IodataObject};
use profinet_rs::ppm::PpmState;
use profinet_rs::{
    ClassifiedError, DeviceConfig, IoDevice, MacAddress, ProfinetError, SchedulerConfig,
    SchedulerMode, VlanTag,
};
use simulator::{RecordingDiagnostics, RecordingEvents, SimulatedInterface};

const INITIATOR_MAC: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x01];
const RESPONDER_MAC: [u8; 6] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

fn input_iodata(c_sdu_length: u16) -> IodataObject {
    IodataObject {
        in_use: true,
        api_id: 0,
        slot: 1,
        subslot: 1,
        data_offset: 0,
        data_length: c_sdu_length - 1,
        iops_offset: c_sdu_length - 1,
        iops_length: 1,
        iocs_offset: 0,
        iocs_length: 0,
        data_avail: false,
    }
}

fn device(mode: SchedulerMode) -> IoDevice {
    let mut device = IoDevice::new(DeviceConfig {
        mac: MacAddress::new(RESPONDER_MAC),
        scheduler: SchedulerConfig {
            tick_interval_us: 1000,
            mode,
        },
        ..DeviceConfig::default()
    });

    let param = IocrParam::new(
        IocrType::Input,
        0x8001,
        40,
        32,
        1,
        VlanTag {
            vlan_id: 0,
            priority: 6,
        },
    )
    .unwrap();
    device.add_ar(Ar::new(
        MacAddress::new(INITIATOR_MAC),
        MacAddress::new(RESPONDER_MAC),
        vec![Iocr::new(param, vec![input_iodata(40)])],
    ));
    device
}

#[test]
fn activate_then_single_send_produces_the_exact_frame() {
    let mut dev = device(SchedulerMode::Cooperative);
    let mut ifc = SimulatedInterface::new(RESPONDER_MAC);
    let mut diag = RecordingDiagnostics::new();
    let mut events = RecordingEvents::new();

    dev.ppm_activate(0, 0, &mut events, 0).unwrap();
    // The application brings the provider to RUN and stages its data.
    dev.set_data_status_provider(0, true);
    let payload = [0x5A; 39];
    dev.set_data_and_iops(0, 1, 1, &payload, &[0x80]).unwrap();

    // 1000 us wanted on a 1000 us cooperative tick aims half a tick
    // early.
    assert_eq!(dev.next_action_time(), Some(500));
    dev.poll(500, &mut ifc, &mut diag, &mut events);

    assert_eq!(ifc.rt_frames.len(), 1);
    let frame = &ifc.rt_frames[0];
    assert_eq!(frame.len(), 64);
    assert_eq!(&frame[0..6], &INITIATOR_MAC);
    assert_eq!(&frame[6..12], &RESPONDER_MAC);
    assert_eq!(&frame[12..14], &[0x81, 0x00]);
    assert_eq!(&frame[14..16], &[0xC0, 0x00]);
    assert_eq!(&frame[16..18], &[0x88, 0x92]);
    assert_eq!(&frame[18..20], &[0x80, 0x01]);
    assert_eq!(&frame[20..59], &payload);
    assert_eq!(frame[59], 0x80);
    // One full send clock: 32 ticks of 31.25 us, big-endian at the
    // cycle counter offset.
    assert_eq!(&frame[60..62], &[0x00, 0x20]);
    assert_eq!(frame[62], 0x35);
    assert_eq!(frame[63], 0x00);

    assert_eq!(dev.stats().if_out_octets, 64);
    assert_eq!(dev.stats().if_out_errors, 0);
    assert!(events.ppm_errors.is_empty());
}

#[test]
fn set_data_before_activate_writes_classified_error() {
    let mut dev = device(SchedulerMode::Cooperative);

    let result = dev.set_data_and_iops(0, 1, 1, &[0u8; 39], &[0x80]);
    assert_eq!(result, Err(ProfinetError::InvalidState));
    assert_eq!(dev.ar(0).unwrap().err, Some(ClassifiedError::PPM_INVALID_STATE));
}

#[test]
fn close_cleans_all_state() {
    let mut dev = device(SchedulerMode::Cooperative);
    let mut events = RecordingEvents::new();

    dev.ppm_activate(0, 0, &mut events, 0).unwrap();
    assert_eq!(dev.ppm_engine().instance_count(), 1);
    assert!(dev.ppm_engine().buf_lock().is_some());

    dev.ppm_close(0, 0).unwrap();
    assert_eq!(dev.ppm_engine().instance_count(), 0);
    assert!(dev.ppm_engine().buf_lock().is_none());
    let ppm = &dev.ar(0).unwrap().iocrs[0].provider().unwrap().ppm;
    assert_eq!(ppm.state(), PpmState::WaitStart);
    assert_eq!(ppm.data_status().0, 0);
    assert_eq!(dev.next_action_time(), None);
}

#[test]
fn cycle_counters_stay_on_the_grid_across_sends() {
    let mut dev = device(SchedulerMode::Cooperative);
    let mut ifc = SimulatedInterface::new(RESPONDER_MAC);
    let mut diag = RecordingDiagnostics::new();
    let mut events = RecordingEvents::new();

    dev.ppm_activate(0, 0, &mut events, 0).unwrap();

    // Drive the software scheduler on its tick grid.
    for tick in 1..=8u64 {
        dev.poll(tick * 1000, &mut ifc, &mut diag, &mut events);
    }

    assert_eq!(ifc.rt_frames.len(), 8);
    let mut previous = 0u16;
    for frame in &ifc.rt_frames {
        let cycle = u16::from_be_bytes([frame[60], frame[61]]);
        assert_eq!(cycle % 32, 0);
        assert!(cycle >= previous);
        previous = cycle;
    }

    let ppm = &dev.ar(0).unwrap().iocrs[0].provider().unwrap().ppm;
    assert_eq!(ppm.status().trx_cnt, 8);
    assert!(ppm.status().first_transmit);
    assert_eq!(dev.stats().if_out_octets, 8 * 64);
}

#[test]
fn driver_failure_on_cooperative_path_is_fatal_for_the_instance() {
    let mut dev = device(SchedulerMode::Cooperative);
    let mut ifc = SimulatedInterface::new(RESPONDER_MAC);
    let mut diag = RecordingDiagnostics::new();
    let mut events = RecordingEvents::new();

    dev.ppm_activate(0, 0, &mut events, 0).unwrap();
    ifc.fail_sends = true;
    dev.poll(500, &mut ifc, &mut diag, &mut events);

    assert_eq!(dev.stats().if_out_errors, 1);
    assert_eq!(events.ppm_errors, vec![(0, ClassifiedError::PPM_INVALID)]);
    assert_eq!(dev.ar(0).unwrap().err, Some(ClassifiedError::PPM_INVALID));
    // Transmission halted: no timer is re-armed.
    assert_eq!(dev.next_action_time(), None);
}

#[test]
fn driver_failure_on_preemptive_path_retries_next_period() {
    let mut dev = device(SchedulerMode::Preemptive);
    let mut ifc = SimulatedInterface::new(RESPONDER_MAC);
    let mut diag = RecordingDiagnostics::new();
    let mut events = RecordingEvents::new();

    dev.ppm_activate(0, 0, &mut events, 0).unwrap();
    assert_eq!(dev.next_action_time(), Some(1000));

    ifc.fail_sends = true;
    dev.poll(1000, &mut ifc, &mut diag, &mut events);
    assert_eq!(dev.stats().if_out_errors, 1);
    assert!(events.ppm_errors.is_empty());
    // The buffer is retained and the timer re-armed.
    assert_eq!(dev.next_action_time(), Some(2000));

    ifc.fail_sends = false;
    dev.poll(2000, &mut ifc, &mut diag, &mut events);
    assert_eq!(ifc.rt_frames.len(), 1);
    assert_eq!(dev.ar(0).unwrap().err, None);
}

#[test]
fn a_send_after_close_does_nothing() {
    let mut dev = device(SchedulerMode::Cooperative);
    let mut ifc = SimulatedInterface::new(RESPONDER_MAC);
    let mut diag = RecordingDiagnostics::new();
    let mut events = RecordingEvents::new();

    dev.ppm_activate(0, 0, &mut events, 0).unwrap();
    dev.ppm_close(0, 0).unwrap();

    // Even a stale poll past the old deadline must not transmit.
    dev.poll(10_000, &mut ifc, &mut diag, &mut events);
    assert!(ifc.rt_frames.is_empty());
}

#[test]
fn get_reflects_the_latest_set_under_the_lock() {
    let mut dev = device(SchedulerMode::Cooperative);
    let mut events = RecordingEvents::new();

    dev.ppm_activate(0, 0, &mut events, 0).unwrap();
    dev.set_data_and_iops(0, 1, 1, &[7u8; 39], &[0x80]).unwrap();

    let mut data = [0u8; 64];
    let mut iops = [0u8; 4];
    let (data_len, iops_len) = dev.get_data_and_iops(0, 1, 1, &mut data, &mut iops).unwrap();
    assert_eq!(data_len, 39);
    assert_eq!(iops_len, 1);
    assert!(data[..39].iter().all(|&b| b == 7));
    assert_eq!(iops[0], 0x80);
}
