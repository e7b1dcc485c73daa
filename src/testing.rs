//! Host-side stand-ins for the board peripherals.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal_nb::serial;

use crate::channel::MuxLines;
use crate::conversion::{ConversionTrigger, Sample, SharedConversion};

/// Output line whose level can be observed through any clone.
#[derive(Clone, Default)]
pub struct FakePin {
    level: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
}

impl FakePin {
    pub fn is_high(&self) -> bool {
        self.level.get()
    }

    pub fn writes(&self) -> u32 {
        self.writes.get()
    }

    fn set(&self, high: bool) {
        self.level.set(high);
        self.writes.set(self.writes.get() + 1);
    }
}

impl digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

/// Reads back what the selector put on the mux lines.
#[derive(Clone)]
pub struct MuxProbe {
    address: [FakePin; 4],
    bank_b: FakePin,
    bank_a: FakePin,
}

impl MuxProbe {
    pub fn address(&self) -> u8 {
        self.address
            .iter()
            .enumerate()
            .filter(|(_, pin)| pin.is_high())
            .fold(0, |acc, (bit, _)| acc | (1 << bit))
    }

    pub fn bank_b(&self) -> bool {
        self.bank_b.is_high()
    }

    pub fn bank_a(&self) -> bool {
        self.bank_a.is_high()
    }

    pub fn bank_writes(&self) -> u32 {
        self.bank_a.writes() + self.bank_b.writes()
    }

    /// Channel the hardware would route given the current line levels.
    pub fn channel(&self) -> u8 {
        self.address() + if self.bank_b() { 16 } else { 0 }
    }
}

pub fn fake_mux() -> (MuxLines<FakePin>, MuxProbe) {
    let probe = MuxProbe {
        address: Default::default(),
        bank_b: FakePin::default(),
        bank_a: FakePin::default(),
    };
    let lines = MuxLines {
        address: probe.address.clone(),
        bank_b: probe.bank_b.clone(),
        bank_a: probe.bank_a.clone(),
    };
    (lines, probe)
}

/// Byte sink that records everything written. Optionally reports
/// `WouldBlock` a fixed number of times before accepting each byte.
#[derive(Default)]
pub struct CaptureSerial {
    bytes: Vec<u8>,
    stall_per_byte: usize,
    pending_stalls: usize,
    stalls: usize,
}

impl CaptureSerial {
    pub fn stalling(stall_per_byte: usize) -> Self {
        Self { stall_per_byte, pending_stalls: stall_per_byte, ..Self::default() }
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.bytes.clone()).unwrap()
    }

    /// Complete lines without their terminator.
    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(String::from).collect()
    }

    pub fn stalls(&self) -> usize {
        self.stalls
    }
}

impl serial::ErrorType for CaptureSerial {
    type Error = Infallible;
}

impl serial::Write<u8> for CaptureSerial {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.pending_stalls > 0 {
            self.pending_stalls -= 1;
            self.stalls += 1;
            return Err(nb::Error::WouldBlock);
        }
        self.bytes.push(word);
        self.pending_stalls = self.stall_per_byte;
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

/// Error raised by [`FailingSerial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkFault;

impl serial::Error for SinkFault {
    fn kind(&self) -> serial::ErrorKind {
        serial::ErrorKind::Other
    }
}

/// Byte sink that accepts a fixed number of bytes, then fails every write.
pub struct FailingSerial {
    bytes: Vec<u8>,
    accept: usize,
}

impl FailingSerial {
    pub fn after(accept: usize) -> Self {
        Self { bytes: Vec::new(), accept }
    }

    pub fn sent(&self) -> &[u8] {
        &self.bytes
    }
}

impl serial::ErrorType for FailingSerial {
    type Error = SinkFault;
}

impl serial::Write<u8> for FailingSerial {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.bytes.len() >= self.accept {
            return Err(nb::Error::Other(SinkFault));
        }
        self.bytes.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

/// Records requested holds instead of spinning.
#[derive(Default)]
pub struct RecordingDelay {
    waits: Vec<u32>,
}

impl RecordingDelay {
    pub fn waits(&self) -> Vec<u32> {
        self.waits.clone()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits.push(ns);
    }
}

/// Conversion trigger. When completing, it plays the completion interrupt
/// right after the trigger fires, sampling whatever channel the mux lines
/// route (channel 0 without a probe).
pub struct FakeTrigger<'a> {
    conversion: Option<&'a SharedConversion<FakePin>>,
    mux: Option<MuxProbe>,
    sample: fn(u8) -> Sample,
    completing: bool,
    starts: usize,
}

impl<'a> FakeTrigger<'a> {
    /// Never completes.
    pub fn stalled() -> Self {
        Self { conversion: None, mux: None, sample: |_| 0, completing: false, starts: 0 }
    }

    pub fn immediate(conversion: &'a SharedConversion<FakePin>, sample: fn(u8) -> Sample) -> Self {
        Self { conversion: Some(conversion), mux: None, sample, completing: true, starts: 0 }
    }

    pub fn with_mux(mut self, probe: MuxProbe) -> Self {
        self.mux = Some(probe);
        self
    }

    pub fn set_completing(&mut self, completing: bool) {
        self.completing = completing;
    }

    pub fn starts(&self) -> usize {
        self.starts
    }
}

impl ConversionTrigger for FakeTrigger<'_> {
    fn start_conversion(&mut self) {
        self.starts += 1;
        if !self.completing {
            return;
        }
        if let Some(conversion) = self.conversion {
            let channel = self.mux.as_ref().map_or(0, MuxProbe::channel);
            conversion.on_conversion_complete((self.sample)(channel));
        }
    }
}
