//! DS2408 8-channel addressable switch, read as active-low discrete inputs

use embedded_hal::delay::DelayNs;

use crate::{Address, BinarySink, Bus, Crc16, Device, Error, OpCode, Poll};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    ReadPioRegisters = 0xF0,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

/// PIO logic state register
pub const PIO_LOGIC_STATE: u16 = 0x0088;

pub const CHANNELS: usize = 8;

pub struct Ds2408<S> {
    address: Address,
    last_state: u8,
    channels: [Option<S>; CHANNELS],
}

impl<S: BinarySink> Ds2408<S> {
    /// All channels start out inactive (every line high)
    pub fn new(address: Address) -> Self {
        Self {
            address,
            last_state: 0xFF,
            channels: core::array::from_fn(|_| None),
        }
    }

    pub fn from_address<E: core::fmt::Debug>(address: Address) -> Result<Self, Error<E>> {
        Self::ensure_family_code::<E>(&address)?;
        Ok(Self::new(address))
    }

    /// Binds `sink` to PIO `pin` (0..=7), replacing a previous binding
    pub fn set_channel(&mut self, pin: u8, sink: S) {
        match self.channels.get_mut(pin as usize) {
            Some(channel) => *channel = Some(sink),
            None => log::warn!("{}: no PIO pin {}, channel ignored", self.address, pin),
        }
    }

    pub fn with_channel(mut self, pin: u8, sink: S) -> Self {
        self.set_channel(pin, sink);
        self
    }

    /// Snapshot of the last successfully validated read
    pub fn last_state(&self) -> u8 {
        self.last_state
    }

    /// Reads the PIO logic state register and checks its CRC-16
    pub fn read_state<B: Bus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<u8, Error<B::Error>> {
        let [addr_lo, addr_hi] = PIO_LOGIC_STATE.to_le_bytes();
        let request = [Command::ReadPioRegisters.op_code(), addr_lo, addr_hi];

        bus.reset_select(delay, &self.address)?;
        bus.write_bytes(delay, &request)?;
        let state = bus.read_byte(delay)?;
        let trailer = bus.read_word(delay)?;

        let mut crc = Crc16::new();
        crc.update_slice(&request);
        crc.update(state);
        if !crc.matches(trailer) {
            return Err(Error::Crc16Mismatch(crc.value(), trailer));
        }
        Ok(state)
    }

    /// Publishes every bound channel whose active state differs from the
    /// retained snapshot, then retains `state`
    fn publish_changes(&mut self, state: u8) {
        for (pin, channel) in self.channels.iter_mut().enumerate() {
            let Some(sink) = channel else { continue };
            let active = is_active(state, pin);
            if active != is_active(self.last_state, pin) {
                sink.publish(active);
            }
        }
        self.last_state = state;
    }

    fn publish_unavailable(&mut self) {
        for sink in self.channels.iter_mut().flatten() {
            sink.publish_unavailable();
        }
    }
}

/// Low level on the line is the active state
fn is_active(state: u8, pin: usize) -> bool {
    (state >> pin) & 0x01 == 0
}

impl<S> Device for Ds2408<S> {
    const FAMILY_CODE: u8 = 0x29;

    fn address(&self) -> &Address {
        &self.address
    }
}

impl<S: BinarySink> Poll for Ds2408<S> {
    const DEFAULT_INTERVAL_MS: u32 = 1_000;

    fn poll<B: Bus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<B::Error>> {
        match self.read_state(bus, delay) {
            Ok(state) => {
                log::debug!("{}: PIO state {:#010b}", self.address, state);
                self.publish_changes(state);
                Ok(())
            }
            Err(error) => {
                log::warn!("{}: PIO read failed: {}", self.address, error);
                self.publish_unavailable();
                Err(error)
            }
        }
    }
}
