//! Compile-time configuration.
//!
//! Nothing here is runtime-tunable: channel count, baud rate and delays are
//! fixed for the board. The delays were tuned on a 16 MHz reference clock in
//! CPU cycles; [`ScanTiming`] turns them into durations so any target clock
//! reproduces the same hold times.

/// Two 16:1 multiplexers.
pub const CHANNEL_COUNT: u8 = 32;

/// Inputs per multiplexer; the bank changes every time the index crosses it.
pub const CHANNELS_PER_BANK: u8 = 16;

/// Host link baud rate (8N1).
pub const BAUD_RATE: u32 = 9_600;

/// Capacity of the inbound byte store.
pub const RX_BUFFER_CAPACITY: usize = 20;

/// Capacity of one formatted report line. `"Ch 31 ADC Val: 65535\n"` is 21 bytes.
pub const REPORT_CAPACITY: usize = 32;

/// Clock the delay constants were tuned against.
pub const REFERENCE_CLOCK_HZ: u32 = 16_000_000;

/// Charge time of the RMS converter capacitor after a channel change.
pub const SETTLING_CYCLES: u32 = 6_790_000;

/// Pad after the trigger so the ADC grabs its sample before the next check.
pub const POST_TRIGGER_CYCLES: u32 = 1_000;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Converts a cycle count at `clock_hz` to nanoseconds, rounding up so the
/// hold is never shorter than the tuned one.
pub const fn cycles_to_ns(cycles: u32, clock_hz: u32) -> u32 {
    let ns = (cycles as u64 * NANOS_PER_SECOND).div_ceil(clock_hz as u64);
    if ns > u32::MAX as u64 { u32::MAX } else { ns as u32 }
}

/// Converts nanoseconds to a cycle count at `clock_hz`, rounding up.
pub const fn ns_to_cycles(ns: u32, clock_hz: u32) -> u32 {
    let cycles = (ns as u64 * clock_hz as u64).div_ceil(NANOS_PER_SECOND);
    if cycles > u32::MAX as u64 { u32::MAX } else { cycles as u32 }
}

/// Hold times of one scan iteration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanTiming {
    /// Wait between a channel change and the conversion trigger.
    pub settling_ns: u32,
    /// Wait between the trigger and the next busy check.
    pub post_trigger_ns: u32,
}

impl ScanTiming {
    /// The tuned reference timing.
    pub const DEFAULT: Self = Self::from_cycles(SETTLING_CYCLES, POST_TRIGGER_CYCLES, REFERENCE_CLOCK_HZ);

    pub const fn from_cycles(settling: u32, post_trigger: u32, clock_hz: u32) -> Self {
        Self {
            settling_ns: cycles_to_ns(settling, clock_hz),
            post_trigger_ns: cycles_to_ns(post_trigger, clock_hz),
        }
    }
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}
