//! Device variants, which only differ in resolution
use core::marker::PhantomData;

use crate::{marker, private, Config, NanoDac, RegisterFrame, Transport};

/// Number of significant bits of a variant.
///
/// Data is left-aligned in the 16 bit field, so a 12 bit part ignores the
/// low nibble of every value written to it.
pub trait Resolution: private::Sealed {
    /// Significant data bits
    const BITS: u8;

    /// Shift a right-aligned code into the left-aligned data field
    fn left_align(code: u16) -> u16 {
        code << (16 - Self::BITS)
    }
}

impl Resolution for marker::Ad5684 {
    const BITS: u8 = 12;
}
impl Resolution for marker::Ad5685 {
    const BITS: u8 = 14;
}
impl Resolution for marker::Ad5686 {
    const BITS: u8 = 16;
}

impl<T, M> NanoDac<T, M>
where
    T: Transport,
    M: Resolution,
{
    fn create(transport: T) -> Self {
        Self {
            transport,
            frame: RegisterFrame::default(),
            cfg: Config::default(),
            _marker: PhantomData,
        }
    }
}

impl<T: Transport> NanoDac<T, marker::Ad5684> {
    /// Create a new 12 bit AD5684(R) driver
    pub fn new_ad5684(transport: T) -> Self {
        Self::create(transport)
    }
}

impl<T: Transport> NanoDac<T, marker::Ad5685> {
    /// Create a new 14 bit AD5685(R) driver
    pub fn new_ad5685(transport: T) -> Self {
        Self::create(transport)
    }
}

impl<T: Transport> NanoDac<T, marker::Ad5686> {
    /// Create a new 16 bit AD5686(R) driver
    pub fn new_ad5686(transport: T) -> Self {
        Self::create(transport)
    }
}
