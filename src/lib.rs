//! Host side of the UMX display link.
//!
//! Text commands typed by a user become [`Command`]s, which are encoded into
//! frames under one of two [`Profile`]s and written to the display
//! controller over a serial port:
//!
//! ```text
//! Legacy:  [OPCODE][OPERANDS...]
//! Framed:  [0x55 'U'][0x4D 'M'][0x58 'X'][LENGTH][OPCODE][OPERANDS...]
//! ```
//!
//! The codec and the framed-profile parser are `no_std` so the receiving end
//! can share them. The serial port, the interactive shell and the `umx`
//! binary need the `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod command;
pub mod frame;
pub mod parse;
pub mod serial;

#[cfg(feature = "std")]
pub mod port;
#[cfg(feature = "std")]
pub mod shell;

pub trait Encode {
    type Error;

    /// Writes `self` into the front of `buffer`, returning the number of bytes used.
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Decode<'a>
where
    Self: Sized,
{
    type Error;

    fn decode(data: &'a [u8]) -> Result<Self, Self::Error>;
}

pub use command::{Animation, Command, CommandError, DisplayMode, Font};
pub use frame::{Frame, FrameError, FrameParser, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, PREAMBLE, Profile, encode};
pub use parse::{Input, ParseError, parse_line};
pub use serial::{BufferedRx, Link, LinkError};
