//! DS2438 smart battery monitor: temperature, VDD, VAD and shunt current

use byteorder::{ByteOrder, LittleEndian};
use embedded_hal::delay::DelayNs;

use crate::{crc::crc8, Address, Bus, Device, Error, NumericSink, OpCode, Poll};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    ConvertTemperature = 0x44,
    WriteScratchpad = 0x4E,
    ConvertVoltage = 0xB4,
    RecallMemory = 0xB8,
    ReadScratchpad = 0xBE,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

/// Status/configuration register, byte 0 of page 0
pub mod config {
    /// Continuous current sampling
    pub const IAD: u8 = 0x01;
    /// A/D input select: set = VDD, clear = VAD
    pub const AD: u8 = 0x08;
}

/// Page holding temperature, voltage and current registers
pub const PAGE_0: u8 = 0x00;

pub const SCRATCHPAD_BYTES: usize = 9;

/// Current register resolution in volts across the shunt
pub const CURRENT_LSB: f32 = 0.0002441;

const SETTLE_MS: u32 = 10;

/// Datasheet minimum is 10ms, the extra margin gives stable readings
pub const DEFAULT_CONVERSION_DELAY_MS: u32 = 100;

/// Input routed to the voltage A/D converter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoltageInput {
    /// Bus supply / battery input
    Vdd,
    /// General purpose input
    Vad,
}

impl VoltageInput {
    /// Configuration byte selecting this input, with current sampling on or off
    pub fn config(&self, current_sampling: bool) -> u8 {
        let ad = match self {
            VoltageInput::Vdd => config::AD,
            VoltageInput::Vad => 0x00,
        };
        if current_sampling {
            ad | config::IAD
        } else {
            ad
        }
    }
}

/// Page 0 as read back after a recall
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scratchpad(pub [u8; SCRATCHPAD_BYTES]);

impl Scratchpad {
    pub fn temperature_raw(&self) -> i16 {
        LittleEndian::read_i16(&self.0[1..3])
    }

    /// Degrees Celsius
    pub fn temperature(&self) -> f32 {
        self.temperature_raw() as f32 / 256.0
    }

    pub fn voltage_raw(&self) -> u16 {
        LittleEndian::read_u16(&self.0[3..5])
    }

    /// Volts, for whichever input was selected
    pub fn voltage(&self) -> f32 {
        self.voltage_raw() as f32 / 100.0
    }

    pub fn current_raw(&self) -> i16 {
        LittleEndian::read_i16(&self.0[5..7])
    }

    /// Amperes through a shunt of `shunt_ohms`
    pub fn current(&self, shunt_ohms: f32) -> f32 {
        self.current_raw() as f32 * CURRENT_LSB / shunt_ohms
    }

    pub fn is_crc_valid(&self) -> bool {
        crc8(0, &self.0[..8]) == self.0[8]
    }
}

pub struct Ds2438<S> {
    address: Address,
    temperature: Option<S>,
    bus_voltage: Option<S>,
    voltage: Option<S>,
    current: Option<S>,
    shunt_ohms: f32,
    conversion_delay_ms: u32,
    validate_crc: bool,
}

impl<S: NumericSink> Ds2438<S> {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            temperature: None,
            bus_voltage: None,
            voltage: None,
            current: None,
            shunt_ohms: 1.0,
            conversion_delay_ms: DEFAULT_CONVERSION_DELAY_MS,
            validate_crc: false,
        }
    }

    pub fn from_address<E: core::fmt::Debug>(address: Address) -> Result<Self, Error<E>> {
        Self::ensure_family_code::<E>(&address)?;
        Ok(Self::new(address))
    }

    pub fn set_temperature(&mut self, sink: S) {
        self.temperature = Some(sink);
    }

    /// Supply voltage (VDD)
    pub fn set_bus_voltage(&mut self, sink: S) {
        self.bus_voltage = Some(sink);
    }

    /// General purpose voltage (VAD), read in a second phase
    pub fn set_voltage(&mut self, sink: S) {
        self.voltage = Some(sink);
    }

    /// Binding a current sink turns on continuous current sampling
    pub fn set_current(&mut self, sink: S, shunt_ohms: f32) {
        self.current = Some(sink);
        self.shunt_ohms = shunt_ohms;
    }

    pub fn with_temperature(mut self, sink: S) -> Self {
        self.set_temperature(sink);
        self
    }

    pub fn with_bus_voltage(mut self, sink: S) -> Self {
        self.set_bus_voltage(sink);
        self
    }

    pub fn with_voltage(mut self, sink: S) -> Self {
        self.set_voltage(sink);
        self
    }

    pub fn with_current(mut self, sink: S, shunt_ohms: f32) -> Self {
        self.set_current(sink, shunt_ohms);
        self
    }

    pub fn with_conversion_delay_ms(mut self, delay_ms: u32) -> Self {
        self.conversion_delay_ms = delay_ms;
        self
    }

    /// Check the CRC-8 in byte 8 of every scratchpad read. Off by default.
    pub fn with_crc_validation(mut self, validate: bool) -> Self {
        self.validate_crc = validate;
        self
    }

    fn current_sampling(&self) -> bool {
        self.current.is_some()
    }

    /// Configures the A/D input, converts and reads page 0 back.
    ///
    /// The caller must have found the device with a checked reset first;
    /// once started the sequence always runs to the scratchpad read.
    pub fn measure<B: Bus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        input: VoltageInput,
        convert_temperature: bool,
    ) -> Result<Scratchpad, Error<B::Error>> {
        let address = &self.address;
        let config = input.config(self.current_sampling());

        bus.reset_select_write(
            delay,
            address,
            &[Command::WriteScratchpad.op_code(), PAGE_0, config],
        )?;
        delay.delay_ms(SETTLE_MS);

        if convert_temperature {
            bus.reset_select_write(delay, address, &[Command::ConvertTemperature.op_code()])?;
            delay.delay_ms(SETTLE_MS);
        }

        bus.reset_select_write(delay, address, &[Command::ConvertVoltage.op_code()])?;
        delay.delay_ms(self.conversion_delay_ms);

        bus.reset_select_write(delay, address, &[Command::RecallMemory.op_code(), PAGE_0])?;
        delay.delay_ms(SETTLE_MS);

        bus.reset_select_write(delay, address, &[Command::ReadScratchpad.op_code(), PAGE_0])?;
        let mut scratchpad = Scratchpad([0u8; SCRATCHPAD_BYTES]);
        bus.read_bytes(delay, &mut scratchpad.0)?;

        if self.validate_crc && !scratchpad.is_crc_valid() {
            return Err(Error::CrcMismatch(crc8(0, &scratchpad.0[..8]), scratchpad.0[8]));
        }
        Ok(scratchpad)
    }

    /// Temperature, VDD and, when bound, current
    fn update_supply<B: Bus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<B::Error>> {
        let scratchpad = self.measure(bus, delay, VoltageInput::Vdd, true)?;
        let temperature = scratchpad.temperature();
        let vdd = scratchpad.voltage();
        log::debug!(
            "{}: temperature {} C, VDD {} V",
            self.address,
            temperature,
            vdd
        );

        if let Some(sink) = self.temperature.as_mut() {
            sink.publish(temperature);
        }
        if let Some(sink) = self.bus_voltage.as_mut() {
            sink.publish(vdd);
        }
        if let Some(sink) = self.current.as_mut() {
            let current = scratchpad.current(self.shunt_ohms);
            log::debug!("{}: current {} A", self.address, current);
            sink.publish(current);
        }
        Ok(())
    }

    fn update<B: Bus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        supply: bool,
        voltage: bool,
    ) -> Result<(), Error<B::Error>> {
        if supply {
            self.update_supply(bus, delay)?;
        }
        if voltage {
            self.update_voltage(bus, delay)?;
        }
        Ok(())
    }

    fn update_voltage<B: Bus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<B::Error>> {
        let scratchpad = self.measure(bus, delay, VoltageInput::Vad, false)?;
        let vad = scratchpad.voltage();
        log::debug!("{}: VAD {} V", self.address, vad);

        if let Some(sink) = self.voltage.as_mut() {
            sink.publish(vad);
        }
        Ok(())
    }
}

impl<S> Device for Ds2438<S> {
    const FAMILY_CODE: u8 = 0x26;

    fn address(&self) -> &Address {
        &self.address
    }
}

impl<S: NumericSink> Poll for Ds2438<S> {
    const DEFAULT_INTERVAL_MS: u32 = 60_000;

    /// Phase one reads temperature, VDD and current, phase two reads VAD.
    /// A phase runs only if one of its readings is bound. When the device
    /// does not answer the first reset nothing is published.
    fn poll<B: Bus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<B::Error>> {
        let supply = self.temperature.is_some()
            || self.bus_voltage.is_some()
            || self.current.is_some();
        let voltage = self.voltage.is_some();
        if !supply && !voltage {
            return Ok(());
        }

        if !bus.reset(delay)? {
            log::warn!("{}: not reachable", self.address);
            return Err(Error::NoPresence);
        }

        self.update(bus, delay, supply, voltage).map_err(|error| {
            log::warn!("{}: measurement failed: {}", self.address, error);
            error
        })
    }
}
