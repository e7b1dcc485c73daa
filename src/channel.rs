//! Channel Selector
//!
//! Two 16:1 multiplexers share four address lines. A complementary pair of
//! bank lines enables one mux at a time: bank A serves channels 0..=15,
//! bank B channels 16..=31. All lines are rewritten on every change, the
//! bank pair included, so a missed edge never leaves the wrong mux enabled.

use core::fmt;

use embedded_hal::digital::OutputPin;

use crate::config::{CHANNEL_COUNT, CHANNELS_PER_BANK};

/// Index of the analog input currently routed to the ADC.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Channel(u8);

/// Which multiplexer is enabled.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bank {
    A,
    B,
}

impl Channel {
    pub const FIRST: Channel = Channel(0);

    /// Returns `None` for indices outside `0..CHANNEL_COUNT`.
    pub const fn new(index: u8) -> Option<Self> {
        if index < CHANNEL_COUNT { Some(Channel(index)) } else { None }
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    /// The following channel, wrapping past the last one.
    pub const fn next(self) -> Self {
        Channel((self.0 + 1) % CHANNEL_COUNT)
    }

    /// Value placed on the shared address lines.
    pub const fn address(self) -> u8 {
        self.0 % CHANNELS_PER_BANK
    }

    pub const fn bank(self) -> Bank {
        if self.0 & CHANNELS_PER_BANK != 0 { Bank::B } else { Bank::A }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output lines driving both multiplexers.
pub struct MuxLines<P> {
    /// Address bits 0..=3, least significant first.
    pub address: [P; 4],
    /// High while bank B is selected.
    pub bank_b: P,
    /// High while bank A is selected.
    pub bank_a: P,
}

/// Owns the current channel and the lines that select it.
pub struct ChannelSelector<P> {
    lines: MuxLines<P>,
    current: Channel,
}

impl<P: OutputPin> ChannelSelector<P> {
    /// Takes the mux lines and routes channel 0.
    pub fn new(lines: MuxLines<P>) -> Self {
        let mut selector = Self { lines, current: Channel::FIRST };
        selector.drive();
        selector
    }

    pub fn current_channel(&self) -> Channel {
        self.current
    }

    /// Routes the next channel. Must not run while a conversion is outstanding.
    pub fn advance(&mut self) -> Channel {
        self.current = self.current.next();
        self.drive();
        self.current
    }

    fn drive(&mut self) {
        let address = self.current.address();
        for (bit, line) in self.lines.address.iter_mut().enumerate() {
            let _ = set_level(line, address & (1 << bit) != 0);
        }

        let bank_b = self.current.bank() == Bank::B;
        let _ = set_level(&mut self.lines.bank_b, bank_b);
        let _ = set_level(&mut self.lines.bank_a, !bank_b);
    }
}

fn set_level<P: OutputPin>(line: &mut P, high: bool) -> Result<(), P::Error> {
    if high { line.set_high() } else { line.set_low() }
}
