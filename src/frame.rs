//! The 24 bit command frame shared by the whole family
use bitfield_struct::bitfield;

use crate::Command;

const MASK_CMD: u32 = 0xF;
const MASK_ADDR: u32 = 0xF;
const MASK_DATA: u32 = 0xFFFF;

/// First byte on the wire, command in the high nibble
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
struct CommandByte {
    #[bits(4)]
    addr: u8,

    #[bits(4)]
    cmd: u8,
}

/// One register write as it is clocked into the device.
///
/// ```text
/// DB23                                   DB0
/// C C C C A A A A | D D D D D D D D | D D D D D D D D
/// ```
///
/// Every field is masked to its width on construction, so any input produces
/// a valid frame. The wire bytes are derived from the fields on demand and
/// never stored separately.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFrame {
    header: CommandByte,
    data: u16,
}

impl RegisterFrame {
    /// Build a frame from raw fields, truncating each to its width
    /// (4 bit command, 4 bit address, 16 bit data).
    /// ```
    /// # use nanodac::RegisterFrame;
    /// let frame = RegisterFrame::new(0x13, 0x2A, 0x1FFFF);
    /// assert_eq!(frame.wire_bytes(), [0x3A, 0xFF, 0xFF]);
    /// ```
    pub fn new(command: u32, address: u32, data: u32) -> Self {
        Self {
            header: CommandByte::new()
                .with_cmd((command & MASK_CMD) as u8)
                .with_addr((address & MASK_ADDR) as u8),
            data: (data & MASK_DATA) as u16,
        }
    }

    pub(crate) fn encode(cmd: Command, addr: u8, data: u16) -> Self {
        Self::new(u8::from(cmd).into(), addr.into(), data.into())
    }

    /// Command nibble
    pub fn command(&self) -> u8 {
        self.header.cmd()
    }

    /// Address nibble, one bit per channel
    pub fn address(&self) -> u8 {
        self.header.addr()
    }

    /// 16 bit data field
    pub fn data(&self) -> u16 {
        self.data
    }

    /// The three bytes to clock out, MSB first
    pub fn wire_bytes(&self) -> [u8; 3] {
        [u8::from(self.header), (self.data >> 8) as u8, self.data as u8]
    }
}

impl From<RegisterFrame> for [u8; 3] {
    fn from(frame: RegisterFrame) -> Self {
        frame.wire_bytes()
    }
}

/// The frame as a right-aligned 24 bit word
impl From<RegisterFrame> for u32 {
    fn from(frame: RegisterFrame) -> Self {
        (u32::from(u8::from(frame.header)) << 16) | u32::from(frame.data)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RegisterFrame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "RegisterFrame {{ command: {=u8:#x}, address: {=u8:#b}, data: {=u16:#x} }}",
            self.command(),
            self.address(),
            self.data()
        )
    }
}
