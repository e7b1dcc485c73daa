//! Report Formatter/Transmitter
//!
//! One line per sample, `Ch <channel> ADC Val: <value>\n`, decimal and
//! unpadded. Host-side tooling parses this shape byte for byte.

use core::fmt::Write as FmtWrite;

use embedded_hal_nb::serial;
use heapless::String;

use crate::Error;
use crate::channel::Channel;
use crate::config::REPORT_CAPACITY;
use crate::conversion::Sample;

/// Emitted instead of a report while a conversion is still outstanding.
pub const FAULT_LINE: &str = "Error!\n";

pub type ReportLine = String<REPORT_CAPACITY>;

pub fn format_report(channel: Channel, value: Sample) -> Result<ReportLine, Error> {
    let mut line = ReportLine::new();
    FmtWrite::write_fmt(&mut line, format_args!("Ch {} ADC Val: {}\n", channel.index(), value))
        .map_err(|_| Error::ReportOverflow)?;
    Ok(line)
}

/// Writes every byte in order, spinning on the sink until it accepts each one.
///
/// There is no timeout: a sink that never becomes ready stalls the caller.
pub fn transmit<S>(serial: &mut S, bytes: &[u8]) -> Result<(), S::Error>
where
    S: serial::Write<u8> + ?Sized,
{
    for &byte in bytes {
        nb::block!(serial.write(byte))?;
    }
    Ok(())
}
