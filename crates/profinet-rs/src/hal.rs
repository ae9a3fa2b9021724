// crates/profinet-rs/src/hal.rs
use core::fmt;

/// Defines a portable, descriptive Error type for the PROFINET stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfinetError {
    /// The provided buffer is too small for the operation.
    BufferTooShort,
    /// The frame being built exceeds the maximum frame buffer size.
    FrameTooLarge,
    /// An underlying I/O error occurred in the Ethernet driver.
    IoError,
    /// A frame is not a well-formed PROFINET or LLDP Ethernet frame.
    InvalidEthernetFrame,
    /// An operation was invoked against a protocol machine in the wrong state.
    InvalidState,
    /// No IODATA descriptor is registered for the given (api, slot, subslot).
    NoSuchAddress,
    /// The IOCR index does not exist or is not of the required type.
    NoSuchIocr,
    /// Provided data length does not match the configured descriptor length.
    LengthMismatch { given: u16, expected: u16 },
    /// The timeout queue has no free slot left.
    SchedulerFull,
    /// A received TLV stream is malformed.
    InvalidTlv,
}

impl fmt::Display for ProfinetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooShort => write!(f, "Buffer is too short"),
            Self::FrameTooLarge => write!(f, "Frame exceeds the frame buffer size"),
            Self::IoError => write!(f, "Underlying Ethernet I/O error"),
            Self::InvalidEthernetFrame => {
                write!(f, "Invalid Ethernet frame (e.g., wrong EtherType)")
            }
            Self::InvalidState => write!(f, "Protocol machine is in the wrong state"),
            Self::NoSuchAddress => write!(f, "No IODATA descriptor for that address"),
            Self::NoSuchIocr => write!(f, "No such IOCR, or IOCR is not a provider"),
            Self::LengthMismatch { given, expected } => {
                write!(f, "Length mismatch: got {}, expected {}", given, expected)
            }
            Self::SchedulerFull => write!(f, "No free timeout slot in the scheduler"),
            Self::InvalidTlv => write!(f, "Malformed TLV stream"),
        }
    }
}

impl std::error::Error for ProfinetError {}

/// Hardware abstraction for the raw Ethernet channel.
///
/// This trait abstracts the physical sending of L2 frames so the core
/// protocol logic stays platform-agnostic. Real-time cyclic frames and
/// LLDP frames go through separate entry points because some drivers
/// route the reserved LLDP tag differently.
pub trait NetworkInterface {
    /// Sends a fully built real-time Ethernet frame (including headers).
    /// Returns the number of bytes handed to the wire. A driver that
    /// cannot transmit must return an error, never `Ok(0)`.
    fn send_frame(&mut self, frame: &[u8]) -> Result<usize, ProfinetError>;

    /// Sends an LLDP frame on the raw channel with the reserved LLDP tag.
    fn send_lldp_frame(&mut self, frame: &[u8]) -> Result<usize, ProfinetError>;

    /// Returns the local MAC address of the interface.
    fn local_mac_address(&self) -> [u8; 6];
}
