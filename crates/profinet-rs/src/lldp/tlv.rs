// crates/profinet-rs/src/lldp/tlv.rs
//! LLDP TLV constants, header builders and the receive-side walker.
//!
//! A TLV header is one big-endian u16: the type in the high 7 bits and
//! the payload length in the low 9 bits (IEEE 802.1AB-2016, 8.4.1).

use crate::frame::{FrameReader, FrameWriter};
use crate::ProfinetError;

// --- TLV types ---

pub const TLV_TYPE_END: u8 = 0;
pub const TLV_TYPE_CHASSIS_ID: u8 = 1;
pub const TLV_TYPE_PORT_ID: u8 = 2;
pub const TLV_TYPE_TTL: u8 = 3;
pub const TLV_TYPE_MANAGEMENT: u8 = 8;
pub const TLV_TYPE_ORG_SPEC: u8 = 127;

// --- Subtypes of the mandatory TLVs ---

/// Chassis ID carries the interface MAC address.
pub const SUBTYPE_CHASSIS_ID_MAC: u8 = 4;
/// Chassis ID carries a locally assigned station name.
pub const SUBTYPE_CHASSIS_ID_NAME: u8 = 7;
/// Port ID is locally assigned.
pub const SUBTYPE_PORT_ID_LOCAL: u8 = 7;

// --- Organisationally unique identifiers ---

/// PROFINET OUI 00-0E-CF.
pub const OUI_PROFINET: [u8; 3] = [0x00, 0x0E, 0xCF];
/// IEEE 802.3 OUI 00-12-0F.
pub const OUI_IEEE_8023: [u8; 3] = [0x00, 0x12, 0x0F];

// --- PROFINET org-specific subtypes ---

pub const PNIO_SUBTYPE_MEAS_DELAY_VALUES: u8 = 1;
pub const PNIO_SUBTYPE_PORT_STATUS: u8 = 2;
pub const PNIO_SUBTYPE_INTERFACE_MAC: u8 = 5;

// --- IEEE 802.3 org-specific subtypes ---

pub const IEEE_SUBTYPE_MACPHY_CONFIG: u8 = 1;

const TLV_TYPE_SHIFT: u16 = 9;
const TLV_LENGTH_MASK: u16 = 0x01FF;

/// Writes a TLV header for `typ` with `len` payload bytes.
pub fn put_tlv_header(writer: &mut FrameWriter<'_>, typ: u8, len: u16) -> Result<(), ProfinetError> {
    writer.put_u16_be((u16::from(typ) << TLV_TYPE_SHIFT) | (len & TLV_LENGTH_MASK))
}

/// Writes an org-specific TLV header with the PROFINET OUI. `len` is
/// the payload length after the OUI.
pub fn put_pnio_header(writer: &mut FrameWriter<'_>, len: u16) -> Result<(), ProfinetError> {
    put_tlv_header(writer, TLV_TYPE_ORG_SPEC, len + 3)?;
    writer.put_bytes(&OUI_PROFINET)
}

/// Writes an org-specific TLV header with the IEEE 802.3 OUI. `len` is
/// the payload length after the OUI.
pub fn put_ieee_header(writer: &mut FrameWriter<'_>, len: u16) -> Result<(), ProfinetError> {
    put_tlv_header(writer, TLV_TYPE_ORG_SPEC, len + 3)?;
    writer.put_bytes(&OUI_IEEE_8023)
}

/// One decoded TLV. The payload borrows from the received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub typ: u8,
    pub payload: &'a [u8],
}

/// Walks a TLV stream until the end marker. Yields an error item and
/// stops when the stream is malformed.
pub struct TlvIter<'a> {
    reader: FrameReader<'a>,
    done: bool,
}

impl<'a> TlvIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            reader: FrameReader::new(buf),
            done: false,
        }
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Result<Tlv<'a>, ProfinetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let header = match self.reader.get_u16_be() {
            Ok(header) => header,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let typ = (header >> TLV_TYPE_SHIFT) as u8;
        let len = usize::from(header & TLV_LENGTH_MASK);
        if typ == TLV_TYPE_END {
            self.done = true;
            return None;
        }
        match self.reader.get_bytes(len) {
            Ok(payload) => Some(Ok(Tlv { typ, payload })),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
