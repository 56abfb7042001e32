use crate::{Address, Bus, Error};
use core::fmt::Debug;
use embedded_hal::delay::DelayNs;

/// Generic device interface
pub trait Device: Sized {
    /// Device family code
    const FAMILY_CODE: u8;

    /// Get device address
    fn address(&self) -> &Address;

    /// Check that `address` belongs to this device family
    fn ensure_family_code<E: Sized + Debug>(address: &Address) -> Result<(), Error<E>> {
        address.ensure_family_code(Self::FAMILY_CODE)
    }
}

/// A device that is read by running one complete bus transaction cycle
/// per scheduled tick.
///
/// `poll` always finishes the cycle it started and reports failures to the
/// bound sinks first; the returned error is informational.
pub trait Poll: Device {
    /// Suggested period between two cycles
    const DEFAULT_INTERVAL_MS: u32;

    fn poll<B: Bus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<B::Error>>;
}
