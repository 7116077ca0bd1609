#![no_main]
#![no_std]

// Setting up entry vector/panic handler and logging
use cortex_m_rt::entry;
use defmt_rtt as _;
use panic_probe as _;
// Imports for the shared bus
use core::cell::RefCell;
use embedded_hal_bus::spi::{NoDelay, RefCellDevice};
// Hal imports
use hal::prelude::*;
use hal::spi::{Mode, Spi};
use stm32f4xx_hal as hal;

use nanodac::marker::Ad5684;
use nanodac::{Channel, NanoDac, PowerDownMode, Resolution, SpiTransport};

#[entry]
fn main() -> ! {
    // Take peripherals and set up the clocks.
    let p = hal::pac::Peripherals::take().unwrap();
    let pc = cortex_m::Peripherals::take().unwrap();
    let rcc = p.RCC.constrain();
    let ccdr = rcc.cfgr.freeze();
    // Create a SysTick based delay
    let mut delay = cortex_m::delay::Delay::new(pc.SYST, ccdr.sysclk().raw());
    // Setup the SPI bus shared by both DACs
    let gpioc = p.GPIOC.split();
    let spi3_sclk = gpioc.pc10.into_alternate();
    let spi3_miso = gpioc.pc11.into_alternate();
    let spi3_mosi = gpioc.pc12.into_alternate();
    // Every DAC gets its own ~SYNC (used as CS) and ~LDAC, both idle high
    let gpioa = p.GPIOA.split();
    let gpiob = p.GPIOB.split();
    let sync0 = gpioa
        .pa15
        .into_push_pull_output_in_state(hal::gpio::PinState::High);
    let ldac0 = gpiob
        .pb5
        .into_push_pull_output_in_state(hal::gpio::PinState::High);
    let sync1 = gpioa
        .pa7
        .into_push_pull_output_in_state(hal::gpio::PinState::High);
    let ldac1 = gpiob
        .pb6
        .into_push_pull_output_in_state(hal::gpio::PinState::High);
    // The nanoDAC samples on the falling edge of SCLK, MODE 1
    let spi3 = Spi::new(
        p.SPI3,
        (spi3_sclk, spi3_miso, spi3_mosi),
        Mode {
            phase: hal::spi::Phase::CaptureOnSecondTransition,
            polarity: hal::spi::Polarity::IdleLow,
        },
        1.MHz(),
        &ccdr,
    );
    // SPI Bus creation using embedded-hal-bus
    let spi_bus = RefCell::new(spi3);

    let mut dac0 = NanoDac::new_ad5684(SpiTransport::new(
        RefCellDevice::new(&spi_bus, sync0, NoDelay),
        ldac0,
    ));
    dac0.set_gain(2.0);
    let mut dac1 = NanoDac::new_ad5684(SpiTransport::new(
        RefCellDevice::new(&spi_bus, sync1, NoDelay),
        ldac1,
    ));
    dac1.set_gain(1.0);

    // Park the unused outputs of the second DAC
    dac1.power_down(0b0110, PowerDownMode::Pulldown1k).unwrap();

    dac0.write_input(Channel::DacA, 100).unwrap();
    dac1.write_input_masked(0xF, 600).unwrap();

    let mut code: u16 = 0x000;
    loop {
        // Output a stepped voltage
        delay.delay_ms(250);
        dac0.write_and_update(Channel::DacB, Ad5684::left_align(code))
            .unwrap();
        code = (code + 0x100) & 0xFFF;
        defmt::info!("DAC B code {=u16:#x}", code);
    }
}
