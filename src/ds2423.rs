//! DS2423 4 kbit RAM with two 32-bit event counters

use byteorder::{ByteOrder, LittleEndian};
use embedded_hal::delay::DelayNs;

use crate::{Address, Bus, Crc16, Device, Error, NumericSink, OpCode, Poll};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    ReadMemoryCounter = 0xA5,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

/// Memory pages that carry a counter, by start address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Counter {
    /// Page 14
    A = 0x01C0,
    /// Page 15
    B = 0x01E0,
}

impl Counter {
    pub fn page_address(&self) -> u16 {
        *self as _
    }
}

pub const PAGE_BYTES: usize = 32;

pub struct Ds2423<S> {
    address: Address,
    counter_a: Option<S>,
    counter_b: Option<S>,
    validate_crc: bool,
}

impl<S: NumericSink> Ds2423<S> {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            counter_a: None,
            counter_b: None,
            validate_crc: false,
        }
    }

    pub fn from_address<E: core::fmt::Debug>(address: Address) -> Result<Self, Error<E>> {
        Self::ensure_family_code::<E>(&address)?;
        Ok(Self::new(address))
    }

    pub fn set_counter(&mut self, counter: Counter, sink: S) {
        match counter {
            Counter::A => self.counter_a = Some(sink),
            Counter::B => self.counter_b = Some(sink),
        }
    }

    pub fn with_counter(mut self, counter: Counter, sink: S) -> Self {
        self.set_counter(counter, sink);
        self
    }

    /// Check the CRC-16 the device appends after each counter read.
    /// Off by default.
    pub fn with_crc_validation(mut self, validate: bool) -> Self {
        self.validate_crc = validate;
        self
    }

    /// Runs one isolated read-memory-counter transaction for `counter`
    pub fn read_counter<B: Bus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        counter: Counter,
    ) -> Result<u32, Error<B::Error>> {
        let [addr_lo, addr_hi] = counter.page_address().to_le_bytes();
        let request = [Command::ReadMemoryCounter.op_code(), addr_lo, addr_hi];

        bus.reset_select(delay, &self.address)?;
        bus.write_bytes(delay, &request)?;

        let mut page = [0u8; PAGE_BYTES];
        let mut value = [0u8; 4];
        bus.read_bytes(delay, &mut page)?;
        bus.read_bytes(delay, &mut value)?;
        if !self.validate_crc {
            // the trailing zero filler and CRC are left on the wire
            return Ok(decode_counter(&value));
        }

        let mut filler = [0u8; 4];
        bus.read_bytes(delay, &mut filler)?;
        let trailer = bus.read_word(delay)?;

        let mut crc = Crc16::with_seed(0);
        crc.update_slice(&request);
        crc.update_slice(&page);
        crc.update_slice(&value);
        crc.update_slice(&filler);
        if !crc.matches_inverted(trailer) {
            return Err(Error::Crc16Mismatch(!crc.value(), trailer));
        }
        Ok(decode_counter(&value))
    }

    fn update_counter<B: Bus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        counter: Counter,
    ) -> Result<(), Error<B::Error>> {
        let bound = match counter {
            Counter::A => self.counter_a.is_some(),
            Counter::B => self.counter_b.is_some(),
        };
        if !bound {
            return Ok(());
        }

        let value = self.read_counter(bus, delay, counter).map_err(|error| {
            log::warn!("{}: counter {:?} read failed: {}", self.address, counter, error);
            error
        })?;
        log::debug!("{}: counter {:?} = {}", self.address, counter, value);

        let sink = match counter {
            Counter::A => self.counter_a.as_mut(),
            Counter::B => self.counter_b.as_mut(),
        };
        if let Some(sink) = sink {
            sink.publish(value as f32);
        }
        Ok(())
    }
}

/// Counter value, least significant byte first
pub fn decode_counter(raw: &[u8; 4]) -> u32 {
    LittleEndian::read_u32(raw)
}

impl<S> Device for Ds2423<S> {
    const FAMILY_CODE: u8 = 0x1D;

    fn address(&self) -> &Address {
        &self.address
    }
}

impl<S: NumericSink> Poll for Ds2423<S> {
    const DEFAULT_INTERVAL_MS: u32 = 60_000;

    /// Both counters are read independently, a failure on one does not
    /// skip the other. The first error is returned.
    fn poll<B: Bus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<B::Error>> {
        let a = self.update_counter(bus, delay, Counter::A);
        let b = self.update_counter(bus, delay, Counter::B);
        a.and(b)
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_counter, Counter, Ds2423, PAGE_BYTES};
    use crate::bus::mock::{MockBus, Op};
    use crate::sink::record::Recorder;
    use crate::{Address, Crc16, Error, Poll};
    use core::convert::Infallible;
    use std::vec::Vec;

    type Channel = Recorder<f32>;

    fn address() -> Address {
        Address::from(0x5500_0000_0C8A_321Du64)
    }

    fn poll(counter: &mut Ds2423<Channel>, bus: &mut MockBus) -> Result<(), Error<Infallible>> {
        let mut delay = bus.delay();
        counter.poll(bus, &mut delay)
    }

    /// Page payload and counter bytes as the device sends them
    fn page(counter: [u8; 4]) -> Vec<u8> {
        let mut bytes: Vec<u8> = (0..PAGE_BYTES as u8).collect();
        bytes.extend(counter);
        bytes
    }

    /// Full response including the zero filler and the inverted CRC-16
    fn page_with_trailer(counter: Counter, value: [u8; 4]) -> Vec<u8> {
        let mut bytes = page(value);
        bytes.extend([0u8; 4]);
        let mut crc = Crc16::with_seed(0);
        crc.update(0xA5);
        crc.update_slice(&counter.page_address().to_le_bytes());
        crc.update_slice(&bytes);
        bytes.extend((!crc.value()).to_le_bytes());
        bytes
    }

    #[test]
    fn decodes_little_endian() {
        assert_eq!(decode_counter(&[0x01, 0x00, 0x00, 0x00]), 1);
        assert_eq!(decode_counter(&[0xFF, 0xFF, 0xFF, 0xFF]), 4_294_967_295);
        assert_eq!(decode_counter(&[0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
    }

    #[test]
    fn reads_bound_counters_from_their_pages() {
        let a = Channel::new();
        let b = Channel::new();
        let mut counter = Ds2423::new(address())
            .with_counter(Counter::A, a.clone())
            .with_counter(Counter::B, b.clone());

        let mut rx = page([0x01, 0x00, 0x00, 0x00]);
        rx.extend(page([0x10, 0x27, 0x00, 0x00]));
        let mut bus = MockBus::new().with_rx(&rx);
        poll(&mut counter, &mut bus).unwrap();

        assert_eq!(a.values(), [1.0]);
        assert_eq!(b.values(), [10_000.0]);
        assert_eq!(bus.resets(), 2);
        assert_eq!(bus.reads(), 2 * (PAGE_BYTES + 4));
        assert_eq!(bus.writes(), [0xA5, 0xC0, 0x01, 0xA5, 0xE0, 0x01]);
    }

    #[test]
    fn unbound_counter_is_not_read() {
        let b = Channel::new();
        let mut counter = Ds2423::new(address()).with_counter(Counter::B, b.clone());

        let mut bus = MockBus::new().with_rx(&page([0x02, 0x00, 0x00, 0x00]));
        poll(&mut counter, &mut bus).unwrap();

        assert_eq!(b.values(), [2.0]);
        assert_eq!(bus.resets(), 1);
        assert_eq!(bus.writes(), [0xA5, 0xE0, 0x01]);
    }

    #[test]
    fn counters_fail_independently() {
        let a = Channel::new();
        let b = Channel::new();
        let mut counter = Ds2423::new(address())
            .with_counter(Counter::A, a.clone())
            .with_counter(Counter::B, b.clone());

        let mut bus = MockBus::new()
            .with_presence(&[false, true])
            .with_rx(&page([0x03, 0x00, 0x00, 0x00]));
        assert_eq!(poll(&mut counter, &mut bus), Err(Error::NoPresence));

        assert!(a.values().is_empty());
        assert_eq!(b.values(), [3.0]);
        assert_eq!(
            bus.ops()[..3],
            [Op::Reset, Op::Reset, Op::Select(address())]
        );
    }

    #[test]
    fn validated_read_accepts_matching_trailer() {
        let a = Channel::new();
        let mut counter = Ds2423::new(address())
            .with_counter(Counter::A, a.clone())
            .with_crc_validation(true);

        let rx = page_with_trailer(Counter::A, [0x00, 0x01, 0x00, 0x00]);
        let mut bus = MockBus::new().with_rx(&rx);
        poll(&mut counter, &mut bus).unwrap();

        assert_eq!(a.values(), [256.0]);
        assert_eq!(bus.reads(), PAGE_BYTES + 4 + 4 + 2);
    }

    #[test]
    fn validated_read_accepts_device_trailer() {
        let a = Channel::new();
        let mut counter = Ds2423::new(address())
            .with_counter(Counter::A, a.clone())
            .with_crc_validation(true);

        // inverted seed-0 checksum of this page, computed offline, low byte first
        let mut rx = page([0x05, 0x00, 0x00, 0x00]);
        rx.extend([0x00, 0x00, 0x00, 0x00, 0x67, 0x78]);
        let mut bus = MockBus::new().with_rx(&rx);
        poll(&mut counter, &mut bus).unwrap();

        assert_eq!(a.values(), [5.0]);
    }

    #[test]
    fn validated_read_rejects_uninverted_trailer() {
        let a = Channel::new();
        let mut counter = Ds2423::new(address())
            .with_counter(Counter::A, a.clone())
            .with_crc_validation(true);

        let mut rx = page_with_trailer(Counter::A, [0x05, 0x00, 0x00, 0x00]);
        let len = rx.len();
        rx[len - 2] ^= 0xFF;
        rx[len - 1] ^= 0xFF;
        let mut bus = MockBus::new().with_rx(&rx);
        let result = poll(&mut counter, &mut bus);

        assert!(matches!(result, Err(Error::Crc16Mismatch(..))));
        assert!(a.values().is_empty());
    }

    #[test]
    fn validated_read_rejects_corrupt_page() {
        let a = Channel::new();
        let mut counter = Ds2423::new(address())
            .with_counter(Counter::A, a.clone())
            .with_crc_validation(true);

        let mut rx = page_with_trailer(Counter::A, [0x00, 0x01, 0x00, 0x00]);
        rx[PAGE_BYTES] ^= 0x01;
        let mut bus = MockBus::new().with_rx(&rx);
        let result = poll(&mut counter, &mut bus);

        assert!(matches!(result, Err(Error::Crc16Mismatch(..))));
        assert!(a.values().is_empty());
    }
}
