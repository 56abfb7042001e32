#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

mod address;
mod bus;
mod command;
mod crc;
mod device;
mod driver;
#[cfg(feature = "ds2408")]
pub mod ds2408;
#[cfg(feature = "ds2423")]
pub mod ds2423;
#[cfg(feature = "ds2438")]
pub mod ds2438;
mod interval;
mod iowire;
mod result;
mod sink;

pub use address::{Address, AddressError};
pub use bus::Bus;
pub use command::{Command, OpCode};
pub use crc::{crc8, Crc16};
pub use device::{Device, Poll};
pub use driver::Driver;
pub use interval::Interval;
pub use iowire::{Inverted, IoWire};
pub use result::Error;
pub use sink::{BinarySink, NumericSink};
