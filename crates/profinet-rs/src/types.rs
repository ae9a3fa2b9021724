use core::ops::BitOr;

// --- Protocol constants ---

/// EtherType for PROFINET real-time frames: 0x8892
pub const ETHTYPE_PROFINET: u16 = 0x8892;

/// EtherType (TPID) of an IEEE 802.1Q VLAN tag: 0x8100
pub const ETHTYPE_VLAN: u16 = 0x8100;

/// EtherType for LLDP frames: 0x88CC
pub const ETHTYPE_LLDP: u16 = 0x88CC;

/// LLDP multicast destination address 01-80-C2-00-00-0E
pub const LLDP_MULTICAST_ADDR: [u8; 6] = [0x01, 0x80, 0xC2, 0x00, 0x00, 0x0E];

/// Largest frame the stack ever builds (VLAN-tagged Ethernet MTU).
pub const FRAME_BUFFER_SIZE: usize = 1522;

/// Size of a MAC address in bytes.
pub const MAC_ADDRESS_SIZE: usize = 6;

/// Slot number of the Device Access Point.
pub const SLOT_DAP_IDENT: u16 = 0x0000;

/// Subslot number of the DAP interface-1 port-1 submodule.
pub const SUBSLOT_DAP_INTERFACE_1_PORT_1_IDENT: u16 = 0x8001;

/// Module ident number of the DAP module.
pub const MOD_DAP_IDENT: u32 = 0x0000_0001;

/// Submodule ident number of the DAP interface-1 port-1 submodule.
pub const SUBMOD_DAP_INTERFACE_1_PORT_1_IDENT: u32 = 0x0000_8001;

// --- Classified AR errors ---

/// ErrorCode1 values written into the AR on protocol faults.
/// (IEC 61158-6-10 numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorClass {
    /// Provider protocol machine
    Ppm = 0x85,
}

/// ErrorCode2 values qualifying an [`ErrorClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    /// Operation against a PPM that is not in the required state.
    PpmInvalidState = 0x00,
    /// Runtime failure while the PPM was cyclically sending.
    PpmInvalid = 0x01,
}

/// A classified protocol fault as stored on the AR.
///
/// These are data, not Rust errors: the faulting operation additionally
/// returns a [`ProfinetError`](crate::hal::ProfinetError) to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedError {
    pub class: ErrorClass,
    pub code: ErrorCode,
}

impl ClassifiedError {
    pub const PPM_INVALID_STATE: Self = Self {
        class: ErrorClass::Ppm,
        code: ErrorCode::PpmInvalidState,
    };
    pub const PPM_INVALID: Self = Self {
        class: ErrorClass::Ppm,
        code: ErrorCode::PpmInvalid,
    };
}

// --- Cyclic data status ---

/// The DataStatus byte carried at the tail of every real-time frame,
/// as a type-safe bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataStatus(pub u8);

impl DataStatus {
    /// Bit 0: 0 => BACKUP, 1 => PRIMARY
    pub const STATE: Self = Self(1 << 0);
    /// Bit 1: redundancy
    pub const REDUNDANCY: Self = Self(1 << 1);
    /// Bit 2: 0 => data invalid, 1 => data valid
    pub const DATA_VALID: Self = Self(1 << 2);
    /// Bit 4: 0 => provider STOP, 1 => provider RUN
    pub const PROVIDER_STATE: Self = Self(1 << 4);
    /// Bit 5: 0 => station problem, 1 => normal operation
    pub const PROBLEM_INDICATOR: Self = Self(1 << 5);

    /// Returns an empty set of flags.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Checks if all of the specified flags are set.
    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Inserts the specified flags.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Removes the specified flags.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Sets or clears the specified flags.
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl BitOr for DataStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}
