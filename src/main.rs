//! SPDX-License-Identifier: MIT OR Apache-2.0
//!
//! # 32-Channel Multiplexed ADC Scanner
//!
//! Scans two cascaded 16:1 analog multiplexers through the RP2350 ADC and
//! streams `Ch <n> ADC Val: <v>` lines to the host over UART0:
//! - **Hardware Module:** HAL setup and the board's capabilities (`hardware.rs`).
//! - **Scan Core:** channel sequencing, busy state machine and reporting
//!   (`mux_scan` library).
//!
//! Target: Raspberry Pi Pico 2 W (RP2350).

#![no_std]
#![no_main]

// --- Imports ---
use core::cell::RefCell;
use critical_section::Mutex;
use defmt::*;
use defmt_rtt as _;
use panic_probe as _;

use mux_scan::channel::ChannelSelector;
use mux_scan::config::{CHANNEL_COUNT, RX_BUFFER_CAPACITY, ScanTiming};
use mux_scan::conversion::SharedConversion;
use mux_scan::rx::{OverflowPolicy, ReceiveBuffer};
use mux_scan::sequencer::Scanner;

// --- Modules ---
mod hardware;

// --- HAL Selection ---
use rp235x_hal as hal;
use hal::entry;
use hal::pac;

use rp235x_hal::pac::interrupt;

// --- Bootloader Configuration ---

#[unsafe(link_section = ".start_block")]
#[used]
pub static IMAGE_DEF: hal::block::ImageDef = hal::block::ImageDef::secure_exe();

// --- Shared State ---

// Busy state machine, latched result and busy indicator line
static CONVERSION: SharedConversion<hardware::BusyPin> = SharedConversion::new();

// Inbound host bytes. Stored, never interpreted.
static RX_BUFFER: Mutex<RefCell<ReceiveBuffer<RX_BUFFER_CAPACITY>>> =
    Mutex::new(RefCell::new(ReceiveBuffer::new(OverflowPolicy::Reject)));
static SERIAL_RX: Mutex<RefCell<Option<hardware::SerialRx>>> = Mutex::new(RefCell::new(None));

/// Entry point.
#[entry]
fn main() -> ! {
    info!("Program start");

    // 1. Initialize Hardware Stack (Clocks, GPIO, UART, ADC)
    let hw = hardware::init();

    // 2. Publish shared state (for ISR access)
    CONVERSION.install(hw.busy);
    critical_section::with(|cs| {
        SERIAL_RX.borrow_ref_mut(cs).replace(hw.rx);
    });
    hardware::enable_interrupts();

    // 3. Route channel 0 and take its first sample before the loop
    let selector = ChannelSelector::new(hw.mux);
    let mut scanner = Scanner::new(selector, &CONVERSION, hw.tx, hw.adc, hw.delay, ScanTiming::DEFAULT);
    scanner.prime();

    info!("Scanning {=u8} channels at {=u32} baud", CHANNEL_COUNT, mux_scan::config::BAUD_RATE);

    // 4. Main Application Loop
    scanner.run()
}

// --- Interrupt Handlers ---

#[allow(non_snake_case)]
#[interrupt]
fn ADC_IRQ_FIFO() {
    unsafe {
        let adc_regs = &(*pac::ADC::ptr());

        // Reading the FIFO drains it and drops the interrupt request
        if adc_regs.fcs().read().level().bits() > 0 {
            let value = adc_regs.fifo().read().val().bits();
            CONVERSION.on_conversion_complete(value as u16);
        }
    }
}

#[allow(non_snake_case)]
#[interrupt]
fn UART0_IRQ() {
    critical_section::with(|cs| {
        let mut reader = SERIAL_RX.borrow_ref_mut(cs);
        let mut buffer = RX_BUFFER.borrow_ref_mut(cs);

        if let Some(reader) = reader.as_mut() {
            let mut chunk = [0u8; 8];
            loop {
                match reader.read_raw(&mut chunk) {
                    Ok(bytes) if !bytes.is_empty() => {
                        for &byte in bytes.iter() {
                            // Overflow is counted by the buffer itself
                            let _ = buffer.push(byte);
                        }
                    }
                    // Framing or parity error: the bad byte is consumed, keep draining
                    Err(nb::Error::Other(_)) => continue,
                    _ => break,
                }
            }
        }
    });
}

// --- Metadata ---

#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [hal::binary_info::EntryAddr; 4] = [
    hal::binary_info::rp_cargo_bin_name!(),
    hal::binary_info::rp_cargo_version!(),
    hal::binary_info::rp_program_description!(c"32-channel mux ADC scanner"),
    hal::binary_info::rp_program_build_attribute!()
];
