use crate::{crc::crc8, Error};
use core::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    ops::Deref,
    str::FromStr,
};

/// 64-bit ROM code of a device, stored in wire order
/// (family code first, CRC-8 last)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Address {
    raw: [u8; Self::BYTES as usize],
}

impl From<[u8; Self::BYTES as usize]> for Address {
    fn from(raw: [u8; Self::BYTES as usize]) -> Self {
        Address { raw }
    }
}

impl From<Address> for [u8; Address::BYTES as usize] {
    fn from(addr: Address) -> [u8; Address::BYTES as usize] {
        addr.raw
    }
}

/// The numeric form puts the family code in the least significant byte
impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address {
            raw: value.to_le_bytes(),
        }
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> u64 {
        u64::from_le_bytes(addr.raw)
    }
}

impl Deref for Address {
    type Target = [u8; Self::BYTES as usize];

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.raw
    }
}

impl Address {
    /// The length of device address in bytes
    pub const BYTES: u8 = 8;

    pub fn family_code(&self) -> u8 {
        self.raw[0]
    }

    pub fn crc8(&self) -> u8 {
        self.raw[Self::BYTES as usize - 1]
    }

    pub fn is_crc_valid(&self) -> bool {
        crc8(0, &self.raw[..Self::BYTES as usize - 1]) == self.crc8()
    }

    pub fn ensure_family_code<E: Debug>(&self, family_code: u8) -> Result<(), Error<E>> {
        if self.family_code() != family_code {
            Err(Error::FamilyCodeMismatch(family_code, self.family_code()))
        } else {
            Ok(())
        }
    }
}

/// Error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    NotEnough,
    Invalid,
}

fn hex_to_u8(c: char) -> Option<u8> {
    c.to_digit(16).map(|d| d as u8)
}

impl FromStr for Address {
    type Err = AddressError;

    /// Accepts either 16 hex digits in wire order (optionally separated by
    /// spaces or colons), or a `0x` prefixed 64-bit number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            if hex.is_empty() {
                return Err(AddressError::NotEnough);
            }
            if hex.len() > 16 {
                return Err(AddressError::Invalid);
            }
            return u64::from_str_radix(hex, 16)
                .map(Address::from)
                .map_err(|_| AddressError::Invalid);
        }

        let mut raw = [0u8; Self::BYTES as usize];
        let mut chars = s.chars().filter(|c| !c.is_whitespace() && *c != ':');

        for byte in raw.iter_mut() {
            match (chars.next(), chars.next()) {
                (Some(h), Some(l)) => match (hex_to_u8(h), hex_to_u8(l)) {
                    (Some(h), Some(l)) => *byte = (h << 4) | l,
                    _ => return Err(AddressError::Invalid),
                },
                _ => return Err(AddressError::NotEnough),
            }
        }
        if chars.next().is_some() {
            return Err(AddressError::Invalid);
        }

        Ok(Address { raw })
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self[0], self[1], self[2], self[3], self[4], self[5], self[6], self[7],
        )
    }
}

#[cfg(test)]
mod test {
    use super::{Address, AddressError};

    const WIRE: [u8; 8] = [0x29, 0xAB, 0x34, 0x12, 0x00, 0x00, 0x00, 0x7E];

    #[test]
    fn parse_wire_order() {
        let addr: Address = "29ab34120000007e".parse().unwrap();
        assert_eq!(addr, Address::from(WIRE));
    }

    #[test]
    fn parse_colon_separated() {
        let addr: Address = "29:ab:34:12:00:00:00:7e".parse().unwrap();
        assert_eq!(addr, Address::from(WIRE));
        assert_eq!(addr.family_code(), 0x29);
    }

    #[test]
    fn parse_space_separated() {
        let addr: Address = "29 AB 34 12 00 00 00 7E".parse().unwrap();
        assert_eq!(addr, Address::from(WIRE));
    }

    #[test]
    fn parse_numeric_form() {
        let addr: Address = "0x7E0000001234AB29".parse().unwrap();
        assert_eq!(addr, Address::from(WIRE));
        assert_eq!(u64::from(addr), 0x7E00_0000_1234_AB29);
    }

    #[test]
    fn parse_errors() {
        assert_eq!("29ab".parse::<Address>(), Err(AddressError::NotEnough));
        assert_eq!("zz:ab:34:12:00:00:00:7e".parse::<Address>(), Err(AddressError::Invalid));
        assert_eq!("0x".parse::<Address>(), Err(AddressError::NotEnough));
        assert_eq!("0x1G".parse::<Address>(), Err(AddressError::Invalid));
        assert_eq!("29ab34120000007e00".parse::<Address>(), Err(AddressError::Invalid));
    }

    #[test]
    fn display_in_wire_order() {
        let addr = Address::from(0x7E00_0000_1234_AB29u64);
        assert_eq!(addr.to_string(), "29:ab:34:12:00:00:00:7e");
    }

    #[test]
    fn crc_check() {
        let mut raw = [0x28, 0xFF, 0x64, 0x1E, 0x0F, 0x00, 0x00, 0x00];
        raw[7] = crate::crc::crc8(0, &raw[..7]);
        assert!(Address::from(raw).is_crc_valid());
        raw[7] ^= 0x01;
        assert!(!Address::from(raw).is_crc_valid());
    }
}
