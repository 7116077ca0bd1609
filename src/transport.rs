//! Moving frames to the device
//!
//! [`NanoDac`](crate::NanoDac) only computes frames. Getting them onto the
//! wire is up to a [`Transport`], which is called in a fixed order for every
//! command: `select`, `transmit`, `release`, and for writes to the input
//! registers `latch_strobe` afterwards.
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{SpiBus, SpiDevice};

use crate::Error;

/// Board specific access to a single device
pub trait Transport {
    /// Error raised by any of the hooks
    type Error;

    /// Assert ~SYNC
    fn select(&mut self) -> Result<(), Self::Error>;

    /// Clock out one frame
    fn transmit(&mut self, frame: &[u8; 3]) -> Result<(), Self::Error>;

    /// Deassert ~SYNC. Called whenever `select` succeeded, even if
    /// `transmit` failed.
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Pulse ~LDAC low then high, copying the input registers to the DAC
    /// registers
    fn latch_strobe(&mut self) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn select(&mut self) -> Result<(), Self::Error> {
        T::select(self)
    }
    fn transmit(&mut self, frame: &[u8; 3]) -> Result<(), Self::Error> {
        T::transmit(self, frame)
    }
    fn release(&mut self) -> Result<(), Self::Error> {
        T::release(self)
    }
    fn latch_strobe(&mut self) -> Result<(), Self::Error> {
        T::latch_strobe(self)
    }
}

/// Transport over an [`SpiDevice`], which drives ~SYNC as its chip select.
///
/// Use one of the `embedded-hal-bus` devices to put several DACs on one bus.
/// ~LDAC is a separate output pin.
#[derive(Debug)]
pub struct SpiTransport<SPI, LDAC> {
    spi: SPI,
    ldac: LDAC,
}

impl<SPI, LDAC> SpiTransport<SPI, LDAC> {
    /// Wrap an SPI device and the ~LDAC pin, which should idle high
    pub fn new(spi: SPI, ldac: LDAC) -> Self {
        Self { spi, ldac }
    }

    /// Release the SPI device and the ~LDAC pin
    pub fn free(self) -> (SPI, LDAC) {
        (self.spi, self.ldac)
    }
}

impl<SPI, LDAC, S, P> Transport for SpiTransport<SPI, LDAC>
where
    SPI: SpiDevice<Error = S>,
    LDAC: OutputPin<Error = P>,
{
    type Error = Error<S, P>;

    // ~SYNC is framed by the SpiDevice transaction
    fn select(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn transmit(&mut self, frame: &[u8; 3]) -> Result<(), Self::Error> {
        self.spi.write(frame).map_err(Error::Spi)
    }
    fn release(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn latch_strobe(&mut self) -> Result<(), Self::Error> {
        self.ldac.set_low().map_err(Error::Pin)?;
        self.ldac.set_high().map_err(Error::Pin)
    }
}

/// Transport over an exclusively owned [`SpiBus`] with ~SYNC and ~LDAC on
/// plain output pins.
#[derive(Debug)]
pub struct PinTransport<BUS, SYNC, LDAC> {
    bus: BUS,
    sync: SYNC,
    ldac: LDAC,
}

impl<BUS, SYNC, LDAC> PinTransport<BUS, SYNC, LDAC> {
    /// Wrap a bus and the ~SYNC and ~LDAC pins, both of which should idle
    /// high
    pub fn new(bus: BUS, sync: SYNC, ldac: LDAC) -> Self {
        Self { bus, sync, ldac }
    }

    /// Release the bus and the pins
    pub fn free(self) -> (BUS, SYNC, LDAC) {
        (self.bus, self.sync, self.ldac)
    }
}

impl<BUS, SYNC, LDAC, S, P> Transport for PinTransport<BUS, SYNC, LDAC>
where
    BUS: SpiBus<Error = S>,
    SYNC: OutputPin<Error = P>,
    LDAC: OutputPin<Error = P>,
{
    type Error = Error<S, P>;

    fn select(&mut self) -> Result<(), Self::Error> {
        self.sync.set_low().map_err(Error::Pin)
    }
    fn transmit(&mut self, frame: &[u8; 3]) -> Result<(), Self::Error> {
        self.bus.write(frame).map_err(Error::Spi)?;
        // ~SYNC must not rise before the last bit is out
        self.bus.flush().map_err(Error::Spi)
    }
    fn release(&mut self) -> Result<(), Self::Error> {
        self.sync.set_high().map_err(Error::Pin)
    }
    fn latch_strobe(&mut self) -> Result<(), Self::Error> {
        self.ldac.set_low().map_err(Error::Pin)?;
        self.ldac.set_high().map_err(Error::Pin)
    }
}
