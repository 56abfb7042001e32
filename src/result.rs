use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E: Sized + Debug> {
    /// Wire not high
    WireFault,
    /// No presence on wire
    NoPresence,
    /// 8-bit checksum mismatch (computed, read)
    CrcMismatch(u8, u8),
    /// 16-bit checksum mismatch (computed, read)
    Crc16Mismatch(u16, u16),
    FamilyCodeMismatch(u8, u8),
    PortError(E),
}

impl<E: Sized + Debug> Error<E> {
    /// The device did not answer the bus reset, or the line is stuck
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::NoPresence | Error::WireFault)
    }

    pub fn is_crc_mismatch(&self) -> bool {
        matches!(self, Error::CrcMismatch(..) | Error::Crc16Mismatch(..))
    }
}

impl<E: Sized + Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::PortError(e)
    }
}

impl<E: Sized + Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::WireFault => f.write_str("wire stuck low"),
            Error::NoPresence => f.write_str("no presence pulse"),
            Error::CrcMismatch(computed, read) => {
                write!(f, "crc8 mismatch: computed {computed:#04x}, read {read:#04x}")
            }
            Error::Crc16Mismatch(computed, read) => {
                write!(f, "crc16 mismatch: computed {computed:#06x}, read {read:#06x}")
            }
            Error::FamilyCodeMismatch(expected, actual) => {
                write!(f, "family code mismatch: expected {expected:#04x}, got {actual:#04x}")
            }
            Error::PortError(e) => write!(f, "port error: {e:?}"),
        }
    }
}
