/// Dallas/Maxim CRC-8, as used for ROM addresses and scratchpads
pub fn crc8(seed: u8, data: &[u8]) -> u8 {
    let mut crc = seed;
    for byte in data.iter() {
        let mut byte = *byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0x00 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}

/// Running CRC-16 over a transaction (reflected polynomial 0xA001).
///
/// `new()` starts the accumulator at `0xFFFF`; a PIO read is valid when
/// the value folded over every byte sent and received equals the trailing
/// word the device appends. Memory reads on the counter chip use the
/// plain 1-Wire form instead: seed 0 and an inverted trailer, see
/// [`Crc16::with_seed`] and [`Crc16::matches_inverted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    value: u16,
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc16 {
    pub const SEED: u16 = 0xFFFF;
    const POLY: u16 = 0xA001;

    pub const fn new() -> Self {
        Self::with_seed(Self::SEED)
    }

    pub const fn with_seed(seed: u16) -> Self {
        Self { value: seed }
    }

    pub fn update(&mut self, byte: u8) -> u16 {
        let mut crc = self.value ^ byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ Self::POLY;
            } else {
                crc >>= 1;
            }
        }
        self.value = crc;
        crc
    }

    pub fn update_slice(&mut self, data: &[u8]) -> u16 {
        for byte in data {
            self.update(*byte);
        }
        self.value
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn matches(&self, trailer: u16) -> bool {
        self.value == trailer
    }

    /// Trailer sent as the one's complement of the checksum
    pub fn matches_inverted(&self, trailer: u16) -> bool {
        self.value == !trailer
    }
}

#[cfg(test)]
mod tests {
    use super::{crc8, Crc16};

    #[test]
    fn crc8_of_rom_code() {
        // DS18B20 family ROM, last byte is the checksum of the first seven
        let rom = [0x28, 0xFF, 0x64, 0x1E, 0x0F, 0x00, 0x00];
        let crc = crc8(0, &rom);
        assert_eq!(crc8(0, &[0x28, 0xFF, 0x64, 0x1E, 0x0F, 0x00, 0x00, crc]), 0);
    }

    #[test]
    fn crc8_known_scratchpad() {
        let data = [0x02, 0x4E, 0xB8, 0x1C, 0x46, 0x7F, 0xFF, 0x0C];
        assert_eq!(crc8(0, &data), 0xBE);
    }

    #[test]
    fn crc16_catalogue_check_value() {
        let mut crc = Crc16::new();
        assert_eq!(crc.update_slice(b"123456789"), 0x4B37);
    }

    #[test]
    fn crc16_arc_catalogue_check_value() {
        // CRC-16/ARC: same polynomial, seed 0
        let mut crc = Crc16::with_seed(0);
        assert_eq!(crc.update_slice(b"123456789"), 0xBB3D);
    }

    #[test]
    fn crc16_pio_read_vectors() {
        // read PIO registers (0xF0) at 0x0088 followed by the state byte;
        // trailers computed offline with CRC-16/MODBUS parameters
        // (poly 0x8005 reflected, init 0xFFFF, no final xor), whose
        // catalogue check value is verified above
        let vectors = [
            (0x00u8, 0x0EB3u16),
            (0xFF, 0x4EF3),
            (0x5A, 0x3533),
            (0xA5, 0x7573),
        ];
        for (state, trailer) in vectors {
            let mut crc = Crc16::new();
            crc.update_slice(&[0xF0, 0x88, 0x00, state]);
            assert!(crc.matches(trailer), "state {state:#04x}");
        }
    }

    #[test]
    fn crc16_counter_page_vector() {
        // read memory counter at 0x01C0: page bytes 0..=31, counter 5,
        // zero filler; the device sends the inverted seed-0 checksum
        let mut data = std::vec![0xA5, 0xC0, 0x01];
        data.extend(0..32u8);
        data.extend([0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let mut crc = Crc16::with_seed(0);
        crc.update_slice(&data);
        assert!(crc.matches_inverted(0x7867));
        assert!(!crc.matches(0x7867));
    }

    #[test]
    fn crc16_incremental_equals_slice() {
        let mut a = Crc16::new();
        for b in [0xA5, 0xC0, 0x01] {
            a.update(b);
        }
        let mut b = Crc16::new();
        b.update_slice(&[0xA5, 0xC0, 0x01]);
        assert_eq!(a, b);
    }
}
