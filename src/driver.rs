use crate::{Address, Bus, Command, Error, IoWire, OpCode};
use embedded_hal::delay::DelayNs;

/// Bit-banged bus master on an open-drain line
pub struct Driver<W: IoWire> {
    io_wire: W,
}

impl<W: IoWire> Driver<W> {
    pub fn new(io_wire: W) -> Self {
        Driver { io_wire }
    }

    pub fn into_inner(self) -> W {
        self.io_wire
    }

    /// Performs a reset and listens for a presence pulse
    /// Returns Err(WireFault) if the wire seems to be shortened,
    /// Ok(()) if presence pulse has been received and Err(NoPresence)
    /// if no device was detected but the wire seems to be ok
    pub fn reset_pulse(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<W::Error>> {
        self.set_high()?;
        self.ensure_wire_high(delay)?;

        self.set_low()?;
        delay.delay_us(480);
        self.set_high()?;

        let mut presence = false;
        for _ in 0..7 {
            delay.delay_us(10);
            presence |= self.is_low()?;
        }
        delay.delay_us(410);
        if presence {
            Ok(())
        } else {
            Err(Error::NoPresence)
        }
    }

    fn ensure_wire_high(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<W::Error>> {
        for _ in 0..125 {
            if self.is_high()? {
                return Ok(());
            }
            delay.delay_us(2);
        }
        Err(Error::WireFault)
    }

    pub fn write_command(
        &mut self,
        delay: &mut impl DelayNs,
        cmd: impl OpCode,
    ) -> Result<(), W::Error> {
        self.write_raw_byte(delay, cmd.op_code())
    }

    pub(crate) fn read_raw_byte(&mut self, delay: &mut impl DelayNs) -> Result<u8, W::Error> {
        let mut byte = 0_u8;
        for _ in 0..8 {
            byte >>= 1;
            if self.read_bit(delay)? {
                byte |= 0x80;
            }
        }
        Ok(byte)
    }

    pub(crate) fn read_bit(&mut self, delay: &mut impl DelayNs) -> Result<bool, W::Error> {
        self.set_low()?;
        delay.delay_us(3);
        self.set_high()?;
        delay.delay_us(2);
        let val = self.is_high();
        delay.delay_us(61);
        val
    }

    pub(crate) fn write_raw_byte(
        &mut self,
        delay: &mut impl DelayNs,
        byte: u8,
    ) -> Result<(), W::Error> {
        let mut byte = byte;
        for _ in 0..8 {
            self.write_bit(delay, (byte & 0x01) == 0x01)?;
            byte >>= 1;
        }
        Ok(())
    }

    pub(crate) fn write_bit(&mut self, delay: &mut impl DelayNs, high: bool) -> Result<(), W::Error> {
        self.set_low()?;
        delay.delay_us(if high { 10 } else { 65 });
        self.set_high()?;
        delay.delay_us(if high { 55 } else { 5 });
        Ok(())
    }

    #[inline(always)]
    pub(crate) fn set_high(&mut self) -> Result<(), W::Error> {
        self.io_wire.set_high()
    }

    #[inline(always)]
    pub(crate) fn set_low(&mut self) -> Result<(), W::Error> {
        self.io_wire.set_low()
    }

    #[inline(always)]
    pub(crate) fn is_high(&mut self) -> Result<bool, W::Error> {
        self.io_wire.is_high()
    }

    #[inline(always)]
    pub(crate) fn is_low(&mut self) -> Result<bool, W::Error> {
        self.io_wire.is_low()
    }
}

impl<W: IoWire> Bus for Driver<W> {
    type Error = W::Error;

    fn reset(&mut self, delay: &mut impl DelayNs) -> Result<bool, Error<W::Error>> {
        match self.reset_pulse(delay) {
            Ok(()) => Ok(true),
            Err(Error::NoPresence) => Ok(false),
            Err(error) => Err(error),
        }
    }

    fn select(&mut self, delay: &mut impl DelayNs, addr: &Address) -> Result<(), Error<W::Error>> {
        self.write_command(delay, Command::MatchRom)?;
        for byte in addr.iter() {
            self.write_raw_byte(delay, *byte)?;
        }
        Ok(())
    }

    fn write_byte(&mut self, delay: &mut impl DelayNs, byte: u8) -> Result<(), Error<W::Error>> {
        Ok(self.write_raw_byte(delay, byte)?)
    }

    fn read_byte(&mut self, delay: &mut impl DelayNs) -> Result<u8, Error<W::Error>> {
        Ok(self.read_raw_byte(delay)?)
    }
}
