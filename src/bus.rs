use crate::{Address, Error};
use core::fmt::Debug;
use embedded_hal::delay::DelayNs;

/// Master side of a shared 1-Wire bus.
///
/// A transaction (reset through the final read) must never interleave with
/// another device's transaction, so implementations are borrowed mutably for
/// the whole poll cycle.
pub trait Bus {
    type Error: Debug;

    /// Issues a reset pulse, returns `true` if at least one device answered
    /// with a presence pulse
    fn reset(&mut self, delay: &mut impl DelayNs) -> Result<bool, Error<Self::Error>>;

    /// Addresses a single device (match ROM)
    fn select(&mut self, delay: &mut impl DelayNs, addr: &Address)
        -> Result<(), Error<Self::Error>>;

    fn write_byte(&mut self, delay: &mut impl DelayNs, byte: u8) -> Result<(), Error<Self::Error>>;

    fn read_byte(&mut self, delay: &mut impl DelayNs) -> Result<u8, Error<Self::Error>>;

    /// Reads two bytes, low byte first
    fn read_word(&mut self, delay: &mut impl DelayNs) -> Result<u16, Error<Self::Error>> {
        let lo = self.read_byte(delay)?;
        let hi = self.read_byte(delay)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn write_bytes(
        &mut self,
        delay: &mut impl DelayNs,
        bytes: &[u8],
    ) -> Result<(), Error<Self::Error>> {
        for b in bytes {
            self.write_byte(delay, *b)?;
        }
        Ok(())
    }

    fn read_bytes(
        &mut self,
        delay: &mut impl DelayNs,
        dst: &mut [u8],
    ) -> Result<(), Error<Self::Error>> {
        for d in dst {
            *d = self.read_byte(delay)?;
        }
        Ok(())
    }

    /// Reset, require a presence pulse, then select `addr`
    fn reset_select(
        &mut self,
        delay: &mut impl DelayNs,
        addr: &Address,
    ) -> Result<(), Error<Self::Error>> {
        if !self.reset(delay)? {
            return Err(Error::NoPresence);
        }
        self.select(delay, addr)
    }

    /// Reset, select `addr` and write `bytes`.
    ///
    /// The presence pulse is not checked: this is meant for the follow-up
    /// steps of a sequence whose first reset already found the device.
    fn reset_select_write(
        &mut self,
        delay: &mut impl DelayNs,
        addr: &Address,
        bytes: &[u8],
    ) -> Result<(), Error<Self::Error>> {
        if !self.reset(delay)? {
            log::debug!("{}: no presence pulse mid sequence", addr);
        }
        self.select(delay, addr)?;
        self.write_bytes(delay, bytes)
    }
}
