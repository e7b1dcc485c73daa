//! Scan Sequencer
//!
//! One iteration: if the previous conversion is done, report it, route the
//! next channel, let the analog front end settle, trigger, pad. If it is not
//! done, print the fault line and check again next time around. The fault
//! branch never retries or recovers; the completion interrupt clears the
//! condition on its own.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal_nb::serial;

use crate::channel::{Channel, ChannelSelector};
use crate::config::ScanTiming;
use crate::conversion::{ConversionTrigger, Sample, SharedConversion};
use crate::report::{FAULT_LINE, format_report, transmit};

/// What one call to [`Scanner::step`] did.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The sample was sent and the next conversion started.
    Reported { channel: Channel, value: Sample },
    /// A conversion was still outstanding; only the fault line was sent.
    Fault,
}

pub struct Scanner<'a, P, L, S, T, D> {
    selector: ChannelSelector<P>,
    conversion: &'a SharedConversion<L>,
    serial: S,
    trigger: T,
    delay: D,
    timing: ScanTiming,
}

impl<'a, P, L, S, T, D> Scanner<'a, P, L, S, T, D>
where
    P: OutputPin,
    L: OutputPin,
    S: serial::Write<u8>,
    T: ConversionTrigger,
    D: DelayNs,
{
    pub fn new(
        selector: ChannelSelector<P>,
        conversion: &'a SharedConversion<L>,
        serial: S,
        trigger: T,
        delay: D,
        timing: ScanTiming,
    ) -> Self {
        Self { selector, conversion, serial, trigger, delay, timing }
    }

    /// Samples the initially routed channel so the first iteration has a
    /// fresh value to report. Call once, before [`run`](Self::run).
    pub fn prime(&mut self) {
        debug!("priming channel {=u8}", self.selector.current_channel().index());
        self.conversion.start(&mut self.trigger);
    }

    /// Runs one scan iteration.
    pub fn step(&mut self) -> Result<StepOutcome, S::Error> {
        if self.conversion.is_busy() {
            warn!("conversion outstanding on channel {=u8}", self.selector.current_channel().index());
            transmit(&mut self.serial, FAULT_LINE.as_bytes())?;
            return Ok(StepOutcome::Fault);
        }

        let channel = self.selector.current_channel();
        let value = self.conversion.last_result();
        match format_report(channel, value) {
            Ok(line) => transmit(&mut self.serial, line.as_bytes())?,
            Err(_) => warn!("report for channel {=u8} dropped", channel.index()),
        }
        trace!("ch {=u8} = {=u16}", channel.index(), value);

        self.selector.advance();
        self.delay.delay_ns(self.timing.settling_ns);
        self.conversion.start(&mut self.trigger);
        self.delay.delay_ns(self.timing.post_trigger_ns);

        Ok(StepOutcome::Reported { channel, value })
    }

    /// Scans forever. Serial errors are logged and the loop carries on.
    pub fn run(&mut self) -> ! {
        info!("scan loop running");
        loop {
            if self.step().is_err() {
                warn!("serial write failed");
            }
        }
    }

    pub fn current_channel(&self) -> Channel {
        self.selector.current_channel()
    }
}

#[cfg(test)]
impl<P, L, S, T, D> Scanner<'_, P, L, S, T, D> {
    fn timing(&self) -> ScanTiming {
        self.timing
    }

    fn serial(&self) -> &S {
        &self.serial
    }

    fn trigger_mut(&mut self) -> &mut T {
        &mut self.trigger
    }

    fn delay(&self) -> &D {
        &self.delay
    }
}
