pub trait OpCode {
    fn op_code(&self) -> u8;
}

/// ROM level commands, issued right after a bus reset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    MatchRom = 0x55,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}
