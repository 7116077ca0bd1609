//! Driver for the Analog Devices nanoDAC family of quad channel 16/14/12bit
//! DACs (AD5686R, AD5685R, AD5684R and pin compatible parts).
//!
//! All of these devices take the same 24 bit command frame,
//! `CCCC AAAA | DDDDDDDD | DDDDDDDD`, so the driver is split in two:
//! [`NanoDac`] decides which frame to send for each command and keeps the
//! device configuration, while a [`Transport`] moves the bytes and toggles
//! the ~SYNC and ~LDAC lines. Two embedded-hal transports are provided,
//! [`SpiTransport`] for an `SpiDevice` and [`PinTransport`] for a bare
//! `SpiBus` with a separate ~SYNC pin.
//!
//! ```
//! # use nanodac::{Channel, NanoDac, Transport};
//! # struct Null;
//! # impl Transport for Null {
//! #     type Error = ();
//! #     fn select(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn transmit(&mut self, _: &[u8; 3]) -> Result<(), ()> { Ok(()) }
//! #     fn release(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn latch_strobe(&mut self) -> Result<(), ()> { Ok(()) }
//! # }
//! let mut dac = NanoDac::new_ad5686(Null);
//! dac.write_input(Channel::DacA, 100).unwrap();
//! assert_eq!(dac.frame().wire_bytes(), [0x11, 0x00, 0x64]);
//! ```

#![deny(unsafe_code, missing_docs)]
#![cfg_attr(not(test), no_std)]

use core::marker::PhantomData;

use bitfield_struct::bitfield;

mod ad568x;
mod common;
mod frame;
pub mod transport;

pub use ad568x::Resolution;
pub use frame::RegisterFrame;
pub use transport::{PinTransport, SpiTransport, Transport};

/// Number of DAC channels on every device of the family
pub const MAX_CHANNEL: u8 = 4;

/// Address nibble selecting all channels
pub const ADDR_ALL: u8 = 0xF;

/// nanoDAC with a 24 bit command frame, generic over its transport and the
/// device variant.
pub struct NanoDac<T, M> {
    transport: T,
    frame: RegisterFrame,
    cfg: Config,
    _marker: PhantomData<M>,
}

/// Errors of the provided transports
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<S, P> {
    /// SPI communication error
    Spi(S),
    /// ~SYNC or ~LDAC pin error
    Pin(P),
}

/// Command nibble of the frame
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// No operation
    Noop = 0x0,
    /// Write to input register n
    WriteInput = 0x1,
    /// Update DAC register n with the contents of input register n
    UpdateOutput = 0x2,
    /// Write to and update DAC channel n
    WriteAndUpdate = 0x3,
    /// Power down/power up DAC
    PowerDown = 0x4,
    /// Hardware ~LDAC mask register
    LdacMask = 0x5,
    /// Software reset (power-on reset)
    Reset = 0x6,
    /// Internal reference setup register
    InternalReference = 0x7,
    /// Set up DCEN register (daisy-chain enable)
    DaisyChain = 0x8,
    /// Set up readback register (readback enable)
    Readback = 0x9,
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> Self {
        cmd as u8
    }
}

/// Dac Channel
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    /// DAC Channel A
    DacA = 0,
    /// DAC Channel B
    DacB = 1,
    /// DAC Channel C
    DacC = 2,
    /// DAC Channel D
    DacD = 3,
}

impl Channel {
    /// One-hot address nibble of this channel
    pub fn address(self) -> u8 {
        address_from_channel(self as u8)
    }
}

/// Channel index outside `0..MAX_CHANNEL`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidChannel(pub u8);

impl TryFrom<u8> for Channel {
    type Error = InvalidChannel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::DacA),
            1 => Ok(Self::DacB),
            2 => Ok(Self::DacC),
            3 => Ok(Self::DacD),
            _ => Err(InvalidChannel(value)),
        }
    }
}

/// One-hot address for a channel index, `1 << channel`.
///
/// Indices past the last channel select nothing and return 0.
pub fn address_from_channel(channel: u8) -> u8 {
    if channel < MAX_CHANNEL {
        1 << channel
    } else {
        0
    }
}

/// Address nibble selecting any combination of channels.
///
/// Converts from a raw `u8` (only the low nibble reaches the device) or from
/// a single [`Channel`].
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct ChannelMask {
    /// DAC Channel A
    pub a: bool,
    /// DAC Channel B
    pub b: bool,
    /// DAC Channel C
    pub c: bool,
    /// DAC Channel D
    pub d: bool,
    #[bits(4)]
    _unused: u8,
}

impl ChannelMask {
    /// Mask selecting every channel
    pub fn all() -> Self {
        Self::new().with_a(true).with_b(true).with_c(true).with_d(true)
    }

    /// The address nibble
    pub fn bits(&self) -> u8 {
        u8::from(*self) & ADDR_ALL
    }

    /// Whether the mask selects channel `index`
    pub fn contains(&self, index: u8) -> bool {
        self.bits() & address_from_channel(index) != 0
    }
}

impl From<Channel> for ChannelMask {
    fn from(chan: Channel) -> Self {
        Self::from(chan.address())
    }
}

/// Output state of a powered down channel
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerDownMode {
    /// Normal operation
    Normal = 0b00,
    /// Powered down, 1 kOhm to GND
    Pulldown1k = 0b01,
    /// Powered down, 100 kOhm to GND
    Pulldown100k = 0b10,
    /// Powered down, output three-stated
    ThreeState = 0b11,
}

/// Output amplifier gain, selected on the board by the GAIN pin
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    /// 0V to VREF
    #[default]
    X1 = 1,
    /// 0V to 2 x VREF
    X2 = 2,
}

impl Gain {
    /// Multiplication factor of the output amplifier
    pub fn factor(self) -> u8 {
        self as u8
    }
}

/// Snaps a numeric gain onto the two gains the hardware supports:
/// anything from 1.5 upwards is `X2`, everything else (NaN included) is `X1`.
impl From<f32> for Gain {
    fn from(value: f32) -> Self {
        if value >= 1.5 {
            Self::X2
        } else {
            Self::X1
        }
    }
}

/// Board level configuration of a device. Neither field is sent to the chip,
/// they describe how its codes map to volts.
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Output amplifier gain
    pub gain: Gain,
    /// Reference voltage in volts
    pub reference_voltage: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gain: Gain::X1,
            reference_voltage: 2.5,
        }
    }
}

/// Markers
#[doc(hidden)]
pub mod marker {
    pub enum Ad5684 {}
    pub enum Ad5685 {}
    pub enum Ad5686 {}
}

mod private {
    use super::marker;
    pub trait Sealed {}

    impl Sealed for marker::Ad5684 {}
    impl Sealed for marker::Ad5685 {}
    impl Sealed for marker::Ad5686 {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hot_addresses() {
        assert_eq!(address_from_channel(0), 0b0001);
        assert_eq!(address_from_channel(1), 0b0010);
        assert_eq!(address_from_channel(2), 0b0100);
        assert_eq!(address_from_channel(3), 0b1000);
        assert_eq!(address_from_channel(4), 0);
        assert_eq!(address_from_channel(200), 0);
        assert_eq!(Channel::DacC.address(), 0b0100);
    }

    #[test]
    fn channel_from_index() {
        assert_eq!(Channel::try_from(3), Ok(Channel::DacD));
        assert_eq!(Channel::try_from(4), Err(InvalidChannel(4)));
    }

    #[test]
    fn channel_masks() {
        assert_eq!(ChannelMask::all().bits(), ADDR_ALL);
        assert_eq!(ChannelMask::from(0xF5).bits(), 0x5);
        assert_eq!(ChannelMask::from(Channel::DacB).bits(), 0b0010);
        let mask = ChannelMask::from(0b1010);
        assert!(mask.b() && mask.d());
        assert!(mask.contains(3));
        assert!(!mask.contains(0));
    }

    #[test]
    fn gain_snaps_to_hardware_values() {
        assert_eq!(Gain::from(1.4), Gain::X1);
        assert_eq!(Gain::from(1.5), Gain::X2);
        assert_eq!(Gain::from(-3.0), Gain::X1);
        assert_eq!(Gain::from(f32::NAN), Gain::X1);
        assert_eq!(Gain::from(100.0).factor(), 2);
    }

    #[test]
    fn command_codes() {
        assert_eq!(u8::from(Command::Noop), 0x0);
        assert_eq!(u8::from(Command::PowerDown), 0x4);
        assert_eq!(u8::from(Command::Reset), 0x6);
        assert_eq!(u8::from(Command::Readback), 0x9);
    }
}
