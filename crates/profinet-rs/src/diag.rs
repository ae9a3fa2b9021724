// crates/profinet-rs/src/diag.rs
//! Channel diagnosis items and the collaborator ports they are
//! delivered through.
//!
//! The stack never stores diagnosis records itself; it builds the item
//! and hands it to the [`DiagnosticsPort`]. Update is attempted first
//! and falls back to add when the record does not exist yet, so a
//! repeated event never duplicates a record.

use crate::types::ClassifiedError;
use crate::ProfinetError;

// --- Diagnosis numbering (IEC 61158-6-10) ---

/// USI for extended channel diagnosis payloads.
pub const USI_EXTENDED_CHANNEL_DIAGNOSIS: u16 = 0x8002;

/// Channel number addressing the whole submodule.
pub const CHANNEL_WHOLE_SUBMODULE: u16 = 0x8000;

/// ChannelErrorType: remote mismatch.
pub const CH_ERROR_REMOTE_MISMATCH: u16 = 0x8001;

/// ExtChannelErrorType under remote mismatch: peer port-ID mismatch.
pub const EXT_CH_ERROR_PEER_PORTID_MISMATCH: u16 = 0x8001;

/// ExtChannelErrorType under remote mismatch: no peer detected.
pub const EXT_CH_ERROR_NO_PEER_DETECTED: u16 = 0x8005;

/// ChannelProperties.Specifier: does this diagnosis appear or disappear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum DiagnosisSpecifier {
    Appears = 1,
    Disappears = 2,
}

impl DiagnosisSpecifier {
    /// Packs the specifier into its ChannelProperties bit field
    /// (bits 11..12).
    pub fn channel_properties(self) -> u16 {
        (self as u16) << 11
    }
}

/// Address of a submodule within the device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmoduleAddr {
    pub api: u32,
    pub slot: u16,
    pub subslot: u16,
}

/// Which diagnosis levels an alarm asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmSpecifier {
    pub channel_diagnosis: bool,
    pub submodule_diagnosis: bool,
    pub ar_diagnosis: bool,
    pub manufacturer_diagnosis: bool,
}

/// A standard-format channel diagnosis item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagItem {
    pub usi: u16,
    pub ch_nbr: u16,
    pub ch_properties: u16,
    pub ch_error_type: u16,
    pub ext_ch_error_type: u16,
    pub ext_ch_add_value: u32,
    pub qual_ch_qualifier: u32,
    pub alarm_spec: AlarmSpecifier,
}

impl DiagItem {
    /// Builds an extended channel diagnosis for the whole submodule.
    pub fn extended_channel(
        specifier: DiagnosisSpecifier,
        ch_error_type: u16,
        ext_ch_error_type: u16,
        alarm_spec: AlarmSpecifier,
    ) -> Self {
        Self {
            usi: USI_EXTENDED_CHANNEL_DIAGNOSIS,
            ch_nbr: CHANNEL_WHOLE_SUBMODULE,
            ch_properties: specifier.channel_properties(),
            ch_error_type,
            ext_ch_error_type,
            ext_ch_add_value: 0,
            qual_ch_qualifier: 0,
            alarm_spec,
        }
    }
}

// --- Collaborator ports ---

/// The diagnostic record store and the alarm pipeline.
///
/// `update` must fail when no matching record exists; the caller then
/// falls back to `add`.
pub trait DiagnosticsPort {
    fn update(
        &mut self,
        ar: usize,
        addr: SubmoduleAddr,
        item: &DiagItem,
    ) -> Result<(), ProfinetError>;

    fn add(
        &mut self,
        ar: usize,
        addr: SubmoduleAddr,
        item: &DiagItem,
    ) -> Result<(), ProfinetError>;

    fn send_port_change_notification(
        &mut self,
        ar: usize,
        addr: SubmoduleAddr,
        module_ident: u32,
        submodule_ident: u32,
        item: &DiagItem,
    );
}

/// Receives classified protocol faults (the connection manager side).
pub trait ConnectionEventSink {
    fn ppm_error_ind(&mut self, ar: usize, error: ClassifiedError);
}

/// A diagnostics port that discards everything. Useful for embeddings
/// that do not report diagnosis, and for tests.
pub struct NoOpDiagnosticsPort;

impl DiagnosticsPort for NoOpDiagnosticsPort {
    fn update(
        &mut self,
        _ar: usize,
        _addr: SubmoduleAddr,
        _item: &DiagItem,
    ) -> Result<(), ProfinetError> {
        Ok(())
    }

    fn add(
        &mut self,
        _ar: usize,
        _addr: SubmoduleAddr,
        _item: &DiagItem,
    ) -> Result<(), ProfinetError> {
        Ok(())
    }

    fn send_port_change_notification(
        &mut self,
        _ar: usize,
        _addr: SubmoduleAddr,
        _module_ident: u32,
        _submodule_ident: u32,
        _item: &DiagItem,
    ) {
    }
}

/// An event sink that does nothing.
pub struct NoOpEventSink;

impl ConnectionEventSink for NoOpEventSink {
    fn ppm_error_ind(&mut self, _ar: usize, _error: ClassifiedError) {}
}
