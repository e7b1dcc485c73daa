use core::fmt;

/// Faults raised by the scan core.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A report line did not fit its buffer.
    ReportOverflow,
    /// A received byte was discarded because the buffer is full.
    ReceiveOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ReportOverflow => f.write_str("report line exceeds buffer capacity"),
            Error::ReceiveOverflow => f.write_str("receive buffer full, byte dropped"),
        }
    }
}
