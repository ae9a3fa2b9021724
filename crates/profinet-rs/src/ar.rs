// crates/profinet-rs/src/ar.rs
//! Application relations and their IO communication relations.
//!
//! An AR is the connection between one controller and this device. It
//! carries an ordered set of IOCRs; the provider-side IOCRs (`Input`
//! and `MC-Provider`) each embed a [`Ppm`] instance that transmits
//! their data cyclically.

use crate::frame::{MacAddress, VlanTag};
use crate::ppm::Ppm;
use crate::types::ClassifiedError;
use crate::ProfinetError;

/// Type of an IO communication relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IocrType {
    Input,
    Output,
    McProvider,
    McConsumer,
}

impl IocrType {
    /// Whether this CR type is transmitted by the device (and therefore
    /// owns a PPM).
    pub fn is_provider(&self) -> bool {
        matches!(self, IocrType::Input | IocrType::McProvider)
    }
}

/// Negotiated parameters of an IOCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IocrParam {
    pub iocr_type: IocrType,
    pub frame_id: u16,
    /// Cyclic payload byte count.
    pub c_sdu_length: u16,
    /// 1..=128; one send clock is `factor * 31.25us`.
    pub send_clock_factor: u16,
    /// 1..=16384; the CR transmits every `reduction_ratio` send clocks.
    pub reduction_ratio: u16,
    pub tag_header: VlanTag,
}

impl IocrParam {
    /// Validates the wire-defined parameter ranges.
    pub fn new(
        iocr_type: IocrType,
        frame_id: u16,
        c_sdu_length: u16,
        send_clock_factor: u16,
        reduction_ratio: u16,
        tag_header: VlanTag,
    ) -> Result<Self, ProfinetError> {
        if !(1..=128).contains(&send_clock_factor) || !(1..=16384).contains(&reduction_ratio) {
            return Err(ProfinetError::InvalidState);
        }
        Ok(Self {
            iocr_type,
            frame_id,
            c_sdu_length,
            send_clock_factor,
            reduction_ratio,
            tag_header,
        })
    }
}

/// Maps one (api, slot, subslot) to its byte ranges inside the staged
/// cyclic payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IodataObject {
    pub in_use: bool,
    pub api_id: u32,
    pub slot: u16,
    pub subslot: u16,
    pub data_offset: u16,
    pub data_length: u16,
    pub iops_offset: u16,
    pub iops_length: u8,
    pub iocs_offset: u16,
    pub iocs_length: u8,
    /// Set once the application has written data for this object.
    pub data_avail: bool,
}

/// Provider-side payload of an IOCR.
#[derive(Debug)]
pub struct ProviderCr {
    pub ppm: Ppm,
    pub data_desc: Vec<IodataObject>,
    /// Bytes of staged payload copied into each frame.
    pub in_length: u16,
}

/// Per-type payload of an IOCR. Consumer CRs are outside the scope of
/// this core; their variant carries no state here.
#[derive(Debug)]
pub enum IocrData {
    Provider(ProviderCr),
    Consumer,
}

/// One IO communication relation.
#[derive(Debug)]
pub struct Iocr {
    pub param: IocrParam,
    pub data: IocrData,
}

impl Iocr {
    /// Builds an IOCR; provider types get a fresh PPM in `WAIT_START`
    /// and a staging buffer of `c_sdu_length` bytes.
    pub fn new(param: IocrParam, data_desc: Vec<IodataObject>) -> Self {
        let data = if param.iocr_type.is_provider() {
            IocrData::Provider(ProviderCr {
                ppm: Ppm::new(param.c_sdu_length),
                data_desc,
                in_length: param.c_sdu_length,
            })
        } else {
            IocrData::Consumer
        };
        Self { param, data }
    }

    pub fn provider(&self) -> Option<&ProviderCr> {
        match &self.data {
            IocrData::Provider(cr) => Some(cr),
            IocrData::Consumer => None,
        }
    }

    pub fn provider_mut(&mut self) -> Option<&mut ProviderCr> {
        match &mut self.data {
            IocrData::Provider(cr) => Some(cr),
            IocrData::Consumer => None,
        }
    }
}

/// A submodule the controller expects to be plugged, as announced in
/// the connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedSubmodule {
    pub slot: u16,
    pub subslot: u16,
    pub module_ident: u32,
    pub submodule_ident: u32,
}

/// Difference entry for one submodule. `fault` marks the submodule as
/// failed in the module diff block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmoduleDiff {
    pub subslot: u16,
    pub submodule_ident: u32,
    pub fault: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDiff {
    pub slot: u16,
    pub module_ident: u32,
    pub submodules: Vec<SubmoduleDiff>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDiff {
    pub api: u32,
    pub modules: Vec<ModuleDiff>,
}

/// An application relation.
#[derive(Debug, Default)]
pub struct Ar {
    pub in_use: bool,
    /// Controller MAC; destination of every provider frame.
    pub initiator_mac: MacAddress,
    /// Device MAC; source of every provider frame.
    pub responder_mac: MacAddress,
    pub iocrs: Vec<Iocr>,
    /// Classified protocol fault, written by the protocol machines.
    pub err: Option<ClassifiedError>,
    /// Submodules the controller expects (from the connect request).
    pub exp_submodules: Vec<ExpectedSubmodule>,
    /// Append-only module difference blocks reported back to the
    /// controller.
    pub api_diffs: Vec<ApiDiff>,
}

impl Ar {
    pub fn new(initiator_mac: MacAddress, responder_mac: MacAddress, iocrs: Vec<Iocr>) -> Self {
        Self {
            in_use: true,
            initiator_mac,
            responder_mac,
            iocrs,
            err: None,
            exp_submodules: Vec::new(),
            api_diffs: Vec::new(),
        }
    }
}
