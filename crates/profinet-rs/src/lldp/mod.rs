// crates/profinet-rs/src/lldp/mod.rs
//! Link Layer Discovery Protocol engine for neighborhood detection.
//!
//! Periodically broadcasts the device's LLDP frame and maintains a
//! record of the peer seen on the port. A peer whose port alias changes
//! raises a remote-mismatch diagnosis; a peer whose TTL expires without
//! a refresh raises a no-peer-detected diagnosis. Diagnosis records are
//! delivered update-first through the [`DiagnosticsPort`] so repeats
//! never duplicate a record.
//!
//! This implementation tracks a single physical port.

pub mod tlv;

use crate::ar::{ApiDiff, Ar, ModuleDiff, SubmoduleDiff};
use crate::device::InterfaceStats;
use crate::diag::{
    AlarmSpecifier, DiagItem, DiagnosisSpecifier, DiagnosticsPort, SubmoduleAddr,
    CH_ERROR_REMOTE_MISMATCH, EXT_CH_ERROR_NO_PEER_DETECTED, EXT_CH_ERROR_PEER_PORTID_MISMATCH,
};
use crate::frame::{FrameWriter, MacAddress};
use crate::hal::{NetworkInterface, ProfinetError};
use crate::scheduler::{Scheduler, TimeoutId, TimeoutKind};
use crate::types::{
    ETHTYPE_LLDP, FRAME_BUFFER_SIZE, LLDP_MULTICAST_ADDR, MOD_DAP_IDENT, SLOT_DAP_IDENT,
    SUBMOD_DAP_INTERFACE_1_PORT_1_IDENT, SUBSLOT_DAP_INTERFACE_1_PORT_1_IDENT,
};
use log::{debug, error, info};

/// Interval between LLDP broadcasts.
pub const LLDP_BROADCAST_RATE_US: u64 = 5_000_000;

/// Static LLDP parameters of the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LldpConfig {
    /// Station name; an empty string selects the MAC-address chassis
    /// ID subtype on the wire.
    pub chassis_id: String,
    pub port_id: String,
    /// Advertised time to live in seconds.
    pub ttl: u16,
    pub rtclass_2_status: u16,
    pub rtclass_3_status: u16,
    /// Autonegotiation support/status bits.
    pub cap_aneg: u8,
    /// Autonegotiation advertised capability.
    pub cap_phy: u16,
    /// Operational MAU type.
    pub mau_type: u16,
}

impl Default for LldpConfig {
    fn default() -> Self {
        Self {
            chassis_id: String::new(),
            port_id: String::from("port-001"),
            ttl: 20,
            rtclass_2_status: 0,
            rtclass_3_status: 0,
            cap_aneg: 0x03,
            cap_phy: 0x0020,
            mau_type: 0x0010,
        }
    }
}

/// Line delays measured by the peer (nanoseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerDelays {
    pub rx_delay_local: u32,
    pub rx_delay_remote: u32,
    pub tx_delay_local: u32,
    pub tx_delay_remote: u32,
    pub cable_delay_local: u32,
}

/// Peer autonegotiation and MAU data from the IEEE 802.3 MAC/PHY TLV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerMacPhyConfig {
    pub cap_aneg: u8,
    pub cap_phy: u16,
    pub mau_type: u16,
}

/// Peer RT class port status from the PROFINET port status TLV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerPortStatus {
    pub rtclass_2: u16,
    pub rtclass_3: u16,
}

/// Everything learned about the peer on this port.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeerRecord {
    pub chassis_id: String,
    pub port_id: String,
    pub delays: PeerDelays,
    pub port_status: PeerPortStatus,
    pub mac_addr: MacAddress,
    pub mac_phy: PeerMacPhyConfig,
    /// Last received time to live in seconds.
    pub ttl: u16,
}

/// Process-wide LLDP state.
#[derive(Debug, Default)]
pub struct LldpEngine {
    peer: PeerRecord,
    /// Alias derived from the most recent Port ID TLV.
    temp_alias: String,
    /// Alias confirmed while no AR was in use.
    perm_alias: String,
    broadcast_timer: Option<TimeoutId>,
    peer_timer: Option<TimeoutId>,
    /// Peer boundary flag: suppress LLDP transmission entirely.
    suppress_tx: bool,
}

impl LldpEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the peer record and derived aliases.
    pub fn reset_peer(&mut self) {
        self.peer = PeerRecord::default();
        self.temp_alias.clear();
        self.perm_alias.clear();
    }

    pub fn peer(&self) -> &PeerRecord {
        &self.peer
    }

    pub fn temp_alias(&self) -> &str {
        &self.temp_alias
    }

    pub fn perm_alias(&self) -> &str {
        &self.perm_alias
    }

    pub fn set_transmit_suppressed(&mut self, suppress: bool) {
        self.suppress_tx = suppress;
    }

    pub fn transmit_suppressed(&self) -> bool {
        self.suppress_tx
    }

    pub fn broadcast_armed(&self) -> bool {
        self.broadcast_timer.is_some()
    }

    pub fn peer_timer_armed(&self) -> bool {
        self.peer_timer.is_some()
    }
}

// --- Alias derivation ---

/// Alias name of the peer port.
///
/// A Port ID that already contains a '.' is used verbatim; otherwise
/// the alias is `port_id.chassis_id`.
pub fn derive_alias(port_id: &str, chassis_id: &str) -> String {
    if port_id.contains('.') {
        port_id.to_string()
    } else {
        format!("{}.{}", port_id, chassis_id)
    }
}

// --- Frame construction ---

/// Builds the complete LLDP frame into `buf` and returns its length.
///
/// LLDP-PDU ::= LLDPChassis, LLDPPort, LLDPTTL, LLDP-PNIO-PDU, LLDPEnd
/// with the PROFINET port status, chassis MAC, IEEE 802.3 MAC/PHY and
/// management TLVs in between (IEC 61158-6-10, IEEE 802.1AB-2016).
pub fn build_frame(
    cfg: &LldpConfig,
    mac: MacAddress,
    ip_addr: u32,
    buf: &mut [u8],
) -> Result<usize, ProfinetError> {
    let mut writer = FrameWriter::new(buf);

    writer.put_bytes(&LLDP_MULTICAST_ADDR)?;
    writer.put_bytes(&mac.0)?;
    writer.put_u16_be(ETHTYPE_LLDP)?;

    // Chassis ID: the station name, or the MAC address when no name is
    // configured.
    if cfg.chassis_id.is_empty() {
        tlv::put_tlv_header(&mut writer, tlv::TLV_TYPE_CHASSIS_ID, 1 + 6)?;
        writer.put_u8(tlv::SUBTYPE_CHASSIS_ID_MAC)?;
        writer.put_bytes(&mac.0)?;
    } else {
        tlv::put_tlv_header(
            &mut writer,
            tlv::TLV_TYPE_CHASSIS_ID,
            1 + cfg.chassis_id.len() as u16,
        )?;
        writer.put_u8(tlv::SUBTYPE_CHASSIS_ID_NAME)?;
        writer.put_bytes(cfg.chassis_id.as_bytes())?;
    }

    // Port ID, always locally assigned.
    tlv::put_tlv_header(
        &mut writer,
        tlv::TLV_TYPE_PORT_ID,
        1 + cfg.port_id.len() as u16,
    )?;
    writer.put_u8(tlv::SUBTYPE_PORT_ID_LOCAL)?;
    writer.put_bytes(cfg.port_id.as_bytes())?;

    // Time to live.
    tlv::put_tlv_header(&mut writer, tlv::TLV_TYPE_TTL, 2)?;
    writer.put_u16_be(cfg.ttl)?;

    // PROFINET port status.
    tlv::put_pnio_header(&mut writer, 5)?;
    writer.put_u8(tlv::PNIO_SUBTYPE_PORT_STATUS)?;
    writer.put_u16_be(cfg.rtclass_2_status)?;
    writer.put_u16_be(cfg.rtclass_3_status)?;

    // PROFINET chassis MAC.
    tlv::put_pnio_header(&mut writer, 1 + 6)?;
    writer.put_u8(tlv::PNIO_SUBTYPE_INTERFACE_MAC)?;
    writer.put_bytes(&mac.0)?;

    // IEEE 802.3 MAC/PHY configuration.
    tlv::put_ieee_header(&mut writer, 6)?;
    writer.put_u8(tlv::IEEE_SUBTYPE_MACPHY_CONFIG)?;
    writer.put_u8(cfg.cap_aneg)?;
    writer.put_u16_be(cfg.cap_phy)?;
    writer.put_u16_be(cfg.mau_type)?;

    // Management address: the current IPv4 address.
    tlv::put_tlv_header(&mut writer, tlv::TLV_TYPE_MANAGEMENT, 12)?;
    writer.put_u8(1 + 4)?; // address string length (incl. subtype)
    writer.put_u8(1)?; // address subtype: IPv4
    writer.put_u32_be(ip_addr)?;
    writer.put_u8(1)?; // interface subtype: unknown
    writer.put_u32_be(0)?; // interface number: unknown
    writer.put_u8(0)?; // OID string length: not supported

    tlv::put_tlv_header(&mut writer, tlv::TLV_TYPE_END, 0)?;

    Ok(writer.position())
}

/// Builds and transmits one LLDP frame, unless the peer boundary
/// suppresses transmission.
pub fn send<N: NetworkInterface>(
    engine: &LldpEngine,
    cfg: &LldpConfig,
    mac: MacAddress,
    ip_addr: u32,
    stats: &mut InterfaceStats,
    ifc: &mut N,
) -> Result<(), ProfinetError> {
    if engine.suppress_tx {
        info!("[LLDP] Sending LLDP frame skipped");
        return Ok(());
    }

    info!("[LLDP] Sending LLDP frame");
    let mut buf = vec![0u8; FRAME_BUFFER_SIZE];
    let len = build_frame(cfg, mac, ip_addr, &mut buf)?;

    match ifc.send_lldp_frame(&buf[..len]) {
        Ok(bytes_sent) => {
            stats.if_out_octets += bytes_sent as u64;
            Ok(())
        }
        Err(e) => {
            error!("[LLDP] Error from the Ethernet driver");
            stats.if_out_errors += 1;
            Err(e)
        }
    }
}

/// Arms the periodic broadcast timer.
pub fn start_broadcast(
    engine: &mut LldpEngine,
    sched: &mut Scheduler,
    now_us: u64,
) -> Result<(), ProfinetError> {
    let id = sched.schedule(now_us, LLDP_BROADCAST_RATE_US, TimeoutKind::LldpBroadcast)?;
    engine.broadcast_timer = Some(id);
    Ok(())
}

/// Broadcast timeout: transmit and re-arm, or stop when suppressed.
pub(crate) fn on_broadcast_timeout<N: NetworkInterface>(
    engine: &mut LldpEngine,
    cfg: &LldpConfig,
    mac: MacAddress,
    ip_addr: u32,
    stats: &mut InterfaceStats,
    ifc: &mut N,
    sched: &mut Scheduler,
    now_us: u64,
) {
    engine.broadcast_timer = None;
    if engine.suppress_tx {
        debug!("[LLDP] Broadcast stopped by peer boundary");
        return;
    }

    // A driver hiccup is already counted; the broadcast keeps running.
    let _ = send(engine, cfg, mac, ip_addr, stats, ifc);

    match sched.schedule(now_us, LLDP_BROADCAST_RATE_US, TimeoutKind::LldpBroadcast) {
        Ok(id) => engine.broadcast_timer = Some(id),
        Err(_) => error!("[LLDP] Could not re-arm the broadcast timer"),
    }
}

// --- Receive path ---

/// Parses a received LLDP frame starting at `start` (the first TLV
/// after the Ethernet header) and updates the peer record.
pub fn recv<D: DiagnosticsPort>(
    engine: &mut LldpEngine,
    ars: &mut [Ar],
    sched: &mut Scheduler,
    diag: &mut D,
    now_us: u64,
    frame: &[u8],
    start: usize,
) -> Result<(), ProfinetError> {
    let tlvs = frame.get(start..).ok_or(ProfinetError::BufferTooShort)?;

    for item in tlv::TlvIter::new(tlvs) {
        let item = item?;
        match item.typ {
            tlv::TLV_TYPE_CHASSIS_ID => {
                let Some(name) = item.payload.get(1..) else {
                    return Err(ProfinetError::InvalidTlv);
                };
                engine.peer.chassis_id = String::from_utf8_lossy(name).into_owned();
            }
            tlv::TLV_TYPE_PORT_ID => {
                let Some(name) = item.payload.get(1..) else {
                    return Err(ProfinetError::InvalidTlv);
                };
                engine.peer.port_id = String::from_utf8_lossy(name).into_owned();

                let alias = derive_alias(&engine.peer.port_id, &engine.peer.chassis_id);
                if alias != engine.temp_alias {
                    debug!(
                        "[LLDP] Peer alias changed from '{}' to '{}'",
                        engine.temp_alias, alias
                    );
                    engine.temp_alias = alias;
                    remote_mismatch_alarm(engine, ars, diag);
                }
            }
            tlv::TLV_TYPE_TTL => {
                if item.payload.len() < 2 {
                    return Err(ProfinetError::InvalidTlv);
                }
                engine.peer.ttl = u16::from_be_bytes([item.payload[0], item.payload[1]]);
                rearm_peer_timer(engine, sched, now_us)?;
            }
            tlv::TLV_TYPE_ORG_SPEC => decode_org_specific(engine, item.payload),
            _ => {}
        }
    }

    Ok(())
}

fn decode_org_specific(engine: &mut LldpEngine, payload: &[u8]) {
    let Some((oui, rest)) = payload.split_first_chunk::<3>() else {
        return;
    };
    let Some((&subtype, data)) = rest.split_first() else {
        return;
    };

    if *oui == tlv::OUI_PROFINET {
        match subtype {
            tlv::PNIO_SUBTYPE_MEAS_DELAY_VALUES => {
                if data.len() >= 20 {
                    let u32_at = |off: usize| {
                        u32::from_be_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
                    };
                    engine.peer.delays = PeerDelays {
                        rx_delay_local: u32_at(0),
                        rx_delay_remote: u32_at(4),
                        tx_delay_local: u32_at(8),
                        tx_delay_remote: u32_at(12),
                        cable_delay_local: u32_at(16),
                    };
                }
            }
            tlv::PNIO_SUBTYPE_PORT_STATUS => {
                if data.len() >= 4 {
                    engine.peer.port_status = PeerPortStatus {
                        rtclass_2: u16::from_be_bytes([data[0], data[1]]),
                        rtclass_3: u16::from_be_bytes([data[2], data[3]]),
                    };
                }
            }
            tlv::PNIO_SUBTYPE_INTERFACE_MAC => {
                if let Some(mac) = data.first_chunk::<6>() {
                    engine.peer.mac_addr = MacAddress::new(*mac);
                }
            }
            _ => {}
        }
    } else if *oui == tlv::OUI_IEEE_8023 && subtype == tlv::IEEE_SUBTYPE_MACPHY_CONFIG {
        if data.len() >= 5 {
            engine.peer.mac_phy = PeerMacPhyConfig {
                cap_aneg: data[0],
                cap_phy: u16::from_be_bytes([data[1], data[2]]),
                mau_type: u16::from_be_bytes([data[3], data[4]]),
            };
        }
    }
}

/// (Re)arms the one-shot peer timeout at `TTL` seconds.
fn rearm_peer_timer(
    engine: &mut LldpEngine,
    sched: &mut Scheduler,
    now_us: u64,
) -> Result<(), ProfinetError> {
    if let Some(id) = engine.peer_timer.take() {
        sched.cancel(id);
    }
    let delay_us = u64::from(engine.peer.ttl) * 1_000_000;
    let id = sched.schedule(now_us, delay_us, TimeoutKind::LldpPeerExpiry)?;
    engine.peer_timer = Some(id);
    Ok(())
}

// --- Alarm emission ---

fn port_submodule_addr() -> SubmoduleAddr {
    SubmoduleAddr {
        api: 0,
        slot: SLOT_DAP_IDENT,
        subslot: SUBSLOT_DAP_INTERFACE_1_PORT_1_IDENT,
    }
}

/// Delivers a port diagnosis for one AR: update the record, fall back
/// to adding it, then send the port change notification.
fn emit_port_diagnosis<D: DiagnosticsPort>(diag: &mut D, ar_ix: usize, item: &DiagItem) {
    let addr = port_submodule_addr();
    if diag.update(ar_ix, addr, item).is_err() {
        // The record does not exist yet.
        if let Err(e) = diag.add(ar_ix, addr, item) {
            error!("[LLDP] Could not add port diagnosis: {}", e);
        }
    }
    diag.send_port_change_notification(
        ar_ix,
        addr,
        MOD_DAP_IDENT,
        SUBMOD_DAP_INTERFACE_1_PORT_1_IDENT,
        item,
    );
}

/// Remote mismatch: the peer's alias no longer matches the persisted
/// one (or matches it again). With no AR in use, the new alias is
/// simply persisted.
fn remote_mismatch_alarm<D: DiagnosticsPort>(
    engine: &mut LldpEngine,
    ars: &mut [Ar],
    diag: &mut D,
) {
    let mut alarm_sent = false;

    for (ar_ix, ar) in ars.iter().enumerate() {
        if !ar.in_use {
            continue;
        }
        let (specifier, asserted) = if engine.temp_alias != engine.perm_alias {
            (DiagnosisSpecifier::Appears, true)
        } else {
            (DiagnosisSpecifier::Disappears, false)
        };
        let item = DiagItem::extended_channel(
            specifier,
            CH_ERROR_REMOTE_MISMATCH,
            EXT_CH_ERROR_PEER_PORTID_MISMATCH,
            AlarmSpecifier {
                channel_diagnosis: asserted,
                submodule_diagnosis: asserted,
                ar_diagnosis: asserted,
                manufacturer_diagnosis: false,
            },
        );
        emit_port_diagnosis(diag, ar_ix, &item);
        alarm_sent = true;
    }

    if !alarm_sent {
        engine.perm_alias = engine.temp_alias.clone();
    }
}

/// Peer timeout: no LLDP refresh arrived within the advertised TTL.
/// Records a module diff for the port submodule and raises the
/// no-peer-detected diagnosis on every AR in use.
pub(crate) fn on_peer_expiry<D: DiagnosticsPort>(
    engine: &mut LldpEngine,
    ars: &mut [Ar],
    diag: &mut D,
) {
    engine.peer_timer = None;
    debug!("[LLDP] Peer TTL expired");

    for (ar_ix, ar) in ars.iter_mut().enumerate() {
        if !ar.in_use {
            continue;
        }
        let Some(exp) = ar
            .exp_submodules
            .iter()
            .find(|s| {
                s.slot == SLOT_DAP_IDENT && s.subslot == SUBSLOT_DAP_INTERFACE_1_PORT_1_IDENT
            })
            .copied()
        else {
            continue;
        };

        ar.api_diffs.push(ApiDiff {
            api: 0,
            modules: vec![ModuleDiff {
                slot: exp.slot,
                module_ident: exp.module_ident,
                submodules: vec![SubmoduleDiff {
                    subslot: exp.subslot,
                    submodule_ident: exp.submodule_ident,
                    fault: true,
                }],
            }],
        });

        let item = DiagItem::extended_channel(
            DiagnosisSpecifier::Appears,
            CH_ERROR_REMOTE_MISMATCH,
            EXT_CH_ERROR_NO_PEER_DETECTED,
            AlarmSpecifier {
                channel_diagnosis: true,
                submodule_diagnosis: true,
                ar_diagnosis: true,
                manufacturer_diagnosis: false,
            },
        );
        emit_port_diagnosis(diag, ar_ix, &item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_alias_with_dot_is_port_id_verbatim() {
        assert_eq!(derive_alias("port-003.dut", "peer"), "port-003.dut");
    }

    #[test]
    fn test_alias_without_dot_concatenates() {
        assert_eq!(derive_alias("port-003", "dut"), "port-003.dut");
    }

    proptest! {
        #[test]
        fn prop_alias_rules(
            port_id in "[a-z0-9.-]{1,32}",
            chassis_id in "[a-z0-9-]{1,32}",
        ) {
            let alias = derive_alias(&port_id, &chassis_id);
            if port_id.contains('.') {
                prop_assert_eq!(alias, port_id);
            } else {
                prop_assert_eq!(alias, format!("{}.{}", port_id, chassis_id));
            }
        }
    }

    #[test]
    fn test_frame_layout_with_mac_chassis_id() {
        let cfg = LldpConfig {
            chassis_id: String::new(),
            port_id: String::from("port-001"),
            ttl: 20,
            ..LldpConfig::default()
        };
        let mac = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
        let ip = u32::from_be_bytes([192, 168, 1, 50]);

        let mut buf = [0u8; FRAME_BUFFER_SIZE];
        let len = build_frame(&cfg, mac, ip, &mut buf).unwrap();
        let frame = &buf[..len];

        // Ethernet header.
        assert_eq!(&frame[0..6], &LLDP_MULTICAST_ADDR);
        assert_eq!(&frame[6..12], &mac.0);
        assert_eq!(&frame[12..14], &[0x88, 0xCC]);

        // Chassis ID: subtype 4, the MAC address.
        assert_eq!(&frame[14..16], &[0x02, 0x07]);
        assert_eq!(frame[16], tlv::SUBTYPE_CHASSIS_ID_MAC);
        assert_eq!(&frame[17..23], &mac.0);

        // Port ID: subtype 7, "port-001".
        assert_eq!(&frame[23..25], &[0x04, 0x09]);
        assert_eq!(frame[25], tlv::SUBTYPE_PORT_ID_LOCAL);
        assert_eq!(&frame[26..34], b"port-001");

        // TTL.
        assert_eq!(&frame[34..38], &[0x06, 0x02, 0x00, 0x14]);

        // The frame ends with the management TLV and the end marker.
        let management_start = len - 2 - 14;
        assert_eq!(&frame[management_start..management_start + 2], &[0x10, 0x0C]);
        assert_eq!(
            &frame[management_start + 2..management_start + 8],
            &[0x05, 0x01, 0xC0, 0xA8, 0x01, 0x32]
        );
        assert_eq!(&frame[len - 2..], &[0x00, 0x00]);
    }

    #[test]
    fn test_frame_uses_name_chassis_id_when_configured() {
        let cfg = LldpConfig {
            chassis_id: String::from("dut"),
            ..LldpConfig::default()
        };
        let mac = MacAddress::new([0x02, 0, 0, 0, 0, 1]);
        let mut buf = [0u8; FRAME_BUFFER_SIZE];
        let len = build_frame(&cfg, mac, 0, &mut buf).unwrap();
        let frame = &buf[..len];

        assert_eq!(&frame[14..16], &[0x02, 0x04]);
        assert_eq!(frame[16], tlv::SUBTYPE_CHASSIS_ID_NAME);
        assert_eq!(&frame[17..20], b"dut");
    }

    #[test]
    fn test_org_specific_decoding_updates_peer() {
        let mut engine = LldpEngine::new();

        // PROFINET port status.
        let mut payload = Vec::new();
        payload.extend_from_slice(&tlv::OUI_PROFINET);
        payload.push(tlv::PNIO_SUBTYPE_PORT_STATUS);
        payload.extend_from_slice(&[0x00, 0x01, 0x00, 0x02]);
        decode_org_specific(&mut engine, &payload);
        assert_eq!(engine.peer.port_status.rtclass_2, 1);
        assert_eq!(engine.peer.port_status.rtclass_3, 2);

        // IEEE MAC/PHY.
        let mut payload = Vec::new();
        payload.extend_from_slice(&tlv::OUI_IEEE_8023);
        payload.push(tlv::IEEE_SUBTYPE_MACPHY_CONFIG);
        payload.extend_from_slice(&[0x03, 0x00, 0x20, 0x00, 0x10]);
        decode_org_specific(&mut engine, &payload);
        assert_eq!(engine.peer.mac_phy.cap_aneg, 0x03);
        assert_eq!(engine.peer.mac_phy.cap_phy, 0x0020);
        assert_eq!(engine.peer.mac_phy.mau_type, 0x0010);

        // Unknown OUI is ignored.
        decode_org_specific(&mut engine, &[0xAA, 0xBB, 0xCC, 0x01, 0xFF]);
        assert_eq!(engine.peer.mac_phy.cap_aneg, 0x03);
    }
}
