use crate::{
    Channel, ChannelMask, Command, Config, Gain, NanoDac, PowerDownMode, RegisterFrame,
    Resolution, Transport, ADDR_ALL, MAX_CHANNEL,
};

impl<T, M> NanoDac<T, M>
where
    T: Transport,
    M: Resolution,
{
    /// Replace the board configuration
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }
    /// Board configuration
    pub fn config(&self) -> Config {
        self.cfg
    }
    /// Output amplifier gain
    pub fn gain(&self) -> Gain {
        self.cfg.gain
    }
    /// Set the gain, snapping to x2 from 1.5 upwards and to x1 otherwise
    pub fn set_gain(&mut self, gain: f32) {
        self.cfg.gain = Gain::from(gain);
    }
    /// Reference voltage in volts
    pub fn reference_voltage(&self) -> f32 {
        self.cfg.reference_voltage
    }
    /// Store the reference voltage, it is never sent to the device
    pub fn set_reference_voltage(&mut self, vref: f32) {
        self.cfg.reference_voltage = vref;
    }
    /// The last frame sent, or attempted
    pub fn frame(&self) -> RegisterFrame {
        self.frame
    }
    /// Shift a right-aligned code into the data field of this variant
    pub fn left_align(code: u16) -> u16 {
        M::left_align(code)
    }
    /// Destroy the driver and return the transport
    pub fn destroy(self) -> T {
        self.transport
    }

    /// Write a 16 bit value to the input register of a channel and pulse
    /// ~LDAC to move it to the output.
    /// > Note that the devices with a bit depth smaller than 16 use a left-aligned data format.
    /// ```
    /// # use nanodac::{Channel, NanoDac, Transport};
    /// # struct Null;
    /// # impl Transport for Null {
    /// #     type Error = ();
    /// #     fn select(&mut self) -> Result<(), ()> { Ok(()) }
    /// #     fn transmit(&mut self, _: &[u8; 3]) -> Result<(), ()> { Ok(()) }
    /// #     fn release(&mut self) -> Result<(), ()> { Ok(()) }
    /// #     fn latch_strobe(&mut self) -> Result<(), ()> { Ok(()) }
    /// # }
    /// # let mut ad5684 = NanoDac::new_ad5684(Null);
    /// ad5684.write_input(Channel::DacA, 0x8000).unwrap();
    /// ```
    pub fn write_input(&mut self, chan: Channel, val: u16) -> Result<(), T::Error> {
        self.apply(RegisterFrame::encode(Command::WriteInput, chan.address(), val))?;
        self.transport.latch_strobe()
    }
    /// Write the same value to the input registers of all channels in `mask`
    /// and pulse ~LDAC.
    pub fn write_input_masked(
        &mut self,
        mask: impl Into<ChannelMask>,
        val: u16,
    ) -> Result<(), T::Error> {
        let addr = mask.into().bits();
        self.apply(RegisterFrame::encode(Command::WriteInput, addr, val))?;
        self.transport.latch_strobe()
    }
    /// Update the DAC register of a channel.
    pub fn update_output(&mut self, chan: Channel, val: u16) -> Result<(), T::Error> {
        self.apply(RegisterFrame::encode(Command::UpdateOutput, chan.address(), val))
    }
    /// Write to and update a channel in one frame, no ~LDAC pulse needed.
    pub fn write_and_update(&mut self, chan: Channel, val: u16) -> Result<(), T::Error> {
        self.apply(RegisterFrame::encode(Command::WriteAndUpdate, chan.address(), val))
    }
    /// Put the channels in `mask` into `mode`.
    ///
    /// The mode is packed two bits per channel (`DDCCBBAA`), but only for
    /// channels A to C: channel D's bits are never set, even when its mask bit
    /// is. Parts that do use the top pair need this revisited against their
    /// datasheet.
    pub fn power_down(
        &mut self,
        mask: impl Into<ChannelMask>,
        mode: PowerDownMode,
    ) -> Result<(), T::Error> {
        let mask = mask.into();
        let data = (0..MAX_CHANNEL - 1)
            .filter(|&i| mask.contains(i))
            .fold(0u16, |data, i| data | ((mode as u16) << (2 * i)));
        self.apply(RegisterFrame::encode(Command::PowerDown, mask.bits(), data))
    }
    /// Set the hardware ~LDAC mask. Masked channels ignore the ~LDAC pin.
    pub fn set_ldac_mask(&mut self, mask: impl Into<ChannelMask>) -> Result<(), T::Error> {
        let mask = mask.into().bits();
        self.apply(RegisterFrame::encode(Command::LdacMask, mask, u16::from(mask & ADDR_ALL)))
    }
    /// Reset the device to its power-on state.
    pub fn software_reset(&mut self) -> Result<(), T::Error> {
        self.apply(RegisterFrame::encode(Command::Reset, 0, 0))
    }
    /// Write `enabled` into DB0 of the internal reference setup register.
    pub fn set_internal_reference(&mut self, enabled: bool) -> Result<(), T::Error> {
        self.apply(RegisterFrame::encode(Command::InternalReference, 0, enabled.into()))
    }
    /// Enable or disable daisy-chaining through SDO.
    pub fn set_daisy_chain(&mut self, enabled: bool) -> Result<(), T::Error> {
        self.apply(RegisterFrame::encode(Command::DaisyChain, 0, enabled.into()))
    }
    /// Enable or disable register readback.
    pub fn set_readback(&mut self, enabled: bool) -> Result<(), T::Error> {
        self.apply(RegisterFrame::encode(Command::Readback, 0, enabled.into()))
    }

    fn apply(&mut self, frame: RegisterFrame) -> Result<(), T::Error> {
        self.frame = frame;
        #[cfg(feature = "defmt")]
        defmt::trace!("nanodac: {}", frame);
        self.transport.select()?;
        let sent = self.transport.transmit(&frame.wire_bytes());
        let released = self.transport.release();
        sent.and(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{marker, InvalidChannel};

    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Event {
        Select,
        Transmit([u8; 3]),
        Release,
        Strobe,
    }

    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Hook {
        Select,
        Transmit,
        Release,
        Strobe,
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Fault(Hook);

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        fail: Option<Hook>,
    }

    impl Recorder {
        fn failing(hook: Hook) -> Self {
            Self {
                fail: Some(hook),
                ..Default::default()
            }
        }
        fn hook(&mut self, hook: Hook, event: Event) -> Result<(), Fault> {
            self.events.push(event);
            if self.fail == Some(hook) {
                Err(Fault(hook))
            } else {
                Ok(())
            }
        }
        fn sent(&self) -> Vec<[u8; 3]> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Transmit(bytes) => Some(*bytes),
                    _ => None,
                })
                .collect()
        }
    }

    impl Transport for Recorder {
        type Error = Fault;

        fn select(&mut self) -> Result<(), Fault> {
            self.hook(Hook::Select, Event::Select)
        }
        fn transmit(&mut self, frame: &[u8; 3]) -> Result<(), Fault> {
            self.hook(Hook::Transmit, Event::Transmit(*frame))
        }
        fn release(&mut self) -> Result<(), Fault> {
            self.hook(Hook::Release, Event::Release)
        }
        fn latch_strobe(&mut self) -> Result<(), Fault> {
            self.hook(Hook::Strobe, Event::Strobe)
        }
    }

    fn dac() -> NanoDac<Recorder, marker::Ad5686> {
        NanoDac::new_ad5686(Recorder::default())
    }

    #[test]
    fn write_input_strobes_after_release() {
        let mut dac = dac();
        dac.write_input(Channel::DacA, 100).unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x11, 0x00, 0x64]);
        assert_eq!(
            dac.destroy().events,
            [
                Event::Select,
                Event::Transmit([0x11, 0x00, 0x64]),
                Event::Release,
                Event::Strobe
            ]
        );
    }

    #[test]
    fn write_input_masked_strobes() {
        let mut dac = dac();
        dac.write_input_masked(0xF, 600).unwrap();
        assert_eq!(
            dac.destroy().events,
            [
                Event::Select,
                Event::Transmit([0x1F, 0x02, 0x58]),
                Event::Release,
                Event::Strobe
            ]
        );
    }

    #[test]
    fn update_commands_do_not_strobe() {
        let mut dac = dac();
        dac.update_output(Channel::DacB, 0x1234).unwrap();
        dac.write_and_update(Channel::DacD, 0xFFFF).unwrap();
        let rec = dac.destroy();
        assert!(!rec.events.contains(&Event::Strobe));
        assert_eq!(rec.sent(), [[0x22, 0x12, 0x34], [0x38, 0xFF, 0xFF]]);
        assert_eq!(rec.events.len(), 6);
    }

    #[test]
    fn channel_index_round_trips_to_address() {
        let mut dac = dac();
        for (index, addr) in [(0, 0x1), (1, 0x2), (2, 0x4), (3, 0x8)] {
            dac.write_and_update(Channel::try_from(index).unwrap(), 0).unwrap();
            assert_eq!(dac.frame().address(), addr);
        }
        assert_eq!(Channel::try_from(MAX_CHANNEL), Err(InvalidChannel(MAX_CHANNEL)));
    }

    #[test]
    fn power_down_skips_top_channel() {
        let mut dac = dac();
        dac.power_down(0b0111, PowerDownMode::Pulldown1k).unwrap();
        // A, B and C packed, DB7..DB6 (channel D) always stay clear
        assert_eq!(dac.frame().data(), 0b0001_0101);
        assert_eq!(dac.frame().wire_bytes(), [0x47, 0x00, 0x15]);

        dac.power_down(0b1000, PowerDownMode::ThreeState).unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x48, 0x00, 0x00]);

        dac.power_down(ChannelMask::all(), PowerDownMode::ThreeState).unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x4F, 0x00, 0x3F]);

        dac.power_down(Channel::DacB, PowerDownMode::Pulldown100k).unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x42, 0x00, 0x08]);
    }

    #[test]
    fn power_down_normal_clears_data() {
        let mut dac = dac();
        dac.power_down(0xF, PowerDownMode::Normal).unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x4F, 0x00, 0x00]);
        assert!(!dac.destroy().events.contains(&Event::Strobe));
    }

    #[test]
    fn ldac_mask_repeats_mask_in_data() {
        let mut dac = dac();
        dac.set_ldac_mask(0b1010).unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x5A, 0x00, 0x0A]);
        dac.set_ldac_mask(0xF3).unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x53, 0x00, 0x03]);
    }

    #[test]
    fn global_commands_use_address_zero() {
        let mut dac = dac();
        dac.set_internal_reference(true).unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x70, 0x00, 0x01]);
        dac.set_daisy_chain(true).unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x80, 0x00, 0x01]);
        dac.set_readback(false).unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x90, 0x00, 0x00]);
        dac.software_reset().unwrap();
        assert_eq!(dac.frame().wire_bytes(), [0x60, 0x00, 0x00]);
    }

    #[test]
    fn repeated_commands_send_identical_frames() {
        let mut dac = dac();
        dac.set_internal_reference(true).unwrap();
        dac.set_internal_reference(true).unwrap();
        let sent = dac.destroy().sent();
        assert_eq!(sent, [[0x70, 0x00, 0x01], [0x70, 0x00, 0x01]]);
    }

    #[test]
    fn gain_and_reference_configuration() {
        let mut dac = dac();
        assert_eq!(dac.config(), Config::default());
        dac.set_gain(1.4);
        assert_eq!(dac.gain(), Gain::X1);
        dac.set_gain(1.5);
        assert_eq!(dac.gain(), Gain::X2);
        dac.set_gain(-2.0);
        assert_eq!(dac.gain(), Gain::X1);
        dac.set_reference_voltage(-1.25);
        assert_eq!(dac.reference_voltage(), -1.25);

        let dac = NanoDac::new_ad5684(Recorder::default()).with_config(Config {
            gain: Gain::X2,
            reference_voltage: 4.096,
        });
        assert_eq!(dac.gain().factor(), 2);
        assert_eq!(dac.reference_voltage(), 4.096);
        assert!(dac.destroy().events.is_empty());
    }

    #[test]
    fn left_align_follows_variant() {
        assert_eq!(NanoDac::<Recorder, marker::Ad5684>::left_align(0x0ABC), 0xABC0);
        assert_eq!(NanoDac::<Recorder, marker::Ad5686>::left_align(0x0ABC), 0x0ABC);
    }

    #[test]
    fn select_failure_stops_the_sequence() {
        let mut dac = NanoDac::new_ad5686(Recorder::failing(Hook::Select));
        assert_eq!(dac.write_input(Channel::DacC, 7), Err(Fault(Hook::Select)));
        assert_eq!(dac.frame().wire_bytes(), [0x14, 0x00, 0x07]);
        assert_eq!(dac.destroy().events, [Event::Select]);
    }

    #[test]
    fn transmit_failure_still_releases() {
        let mut dac = NanoDac::new_ad5686(Recorder::failing(Hook::Transmit));
        assert_eq!(dac.write_input(Channel::DacA, 1), Err(Fault(Hook::Transmit)));
        assert_eq!(
            dac.destroy().events,
            [
                Event::Select,
                Event::Transmit([0x11, 0x00, 0x01]),
                Event::Release
            ]
        );
    }

    #[test]
    fn release_failure_skips_strobe() {
        let mut dac = NanoDac::new_ad5686(Recorder::failing(Hook::Release));
        assert_eq!(dac.write_input_masked(0x3, 2), Err(Fault(Hook::Release)));
        assert_eq!(dac.frame().wire_bytes(), [0x13, 0x00, 0x02]);
        assert!(!dac.destroy().events.contains(&Event::Strobe));
    }

    #[test]
    fn strobe_failure_is_reported() {
        let mut dac = NanoDac::new_ad5686(Recorder::failing(Hook::Strobe));
        assert_eq!(dac.write_input(Channel::DacB, 3), Err(Fault(Hook::Strobe)));
        assert_eq!(dac.destroy().events.last(), Some(&Event::Strobe));
    }

    #[test]
    fn borrowed_transport() {
        let mut rec = Recorder::default();
        {
            let mut dac = NanoDac::new_ad5685(&mut rec);
            dac.update_output(Channel::DacA, 0xFFFC).unwrap();
        }
        assert_eq!(rec.sent(), [[0x21, 0xFF, 0xFC]]);
    }
}
