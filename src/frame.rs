//! Frame encoding and decoding for both link profiles.
//!
//! Legacy frames are a bare payload:
//! ```text
//! [OPCODE][OPERANDS...]
//! ```
//! Framed frames prefix the payload with a preamble and its length:
//! ```text
//! ┌──────┬──────┬──────┬────────┬──────────────────┐
//! │ 0x55 │ 0x4D │ 0x58 │ LENGTH │ OPCODE, OPERANDS │
//! │ 'U'  │ 'M'  │ 'X'  │ 1B     │ 1–255B           │
//! └──────┴──────┴──────┴────────┴──────────────────┘
//! ```

use core::fmt;

use crate::{Decode, Encode, command::{Command, CommandError}};

/// Magic bytes opening every framed-profile frame
pub const PREAMBLE: [u8; 3] = [0x55, 0x4D, 0x58];
/// Preamble plus the length byte
pub const HEADER_LEN: usize = PREAMBLE.len() + 1;
/// length field is a u8, so a payload is at most u8::MAX (255) bytes
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;
pub const MAX_FRAME_SIZE: usize = HEADER_LEN + MAX_PAYLOAD_SIZE;

/// Encoded bytes, ready for the wire
pub type Frame = heapless::Vec<u8, MAX_FRAME_SIZE>;
/// Opcode and operands without any framing
pub type Payload = heapless::Vec<u8, MAX_PAYLOAD_SIZE>;

/// Wire layout spoken by the display firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(clap::ValueEnum))]
pub enum Profile {
    /// Opcode and operands only
    #[default]
    Legacy,
    /// `UMX` preamble and length byte ahead of the payload
    Framed,
}

impl Profile {
    /// Animations only exist in the framed firmware.
    pub fn supports(self, command: &Command) -> bool {
        match self {
            Profile::Legacy => !matches!(command, Command::Animate { .. }),
            Profile::Framed => true,
        }
    }

    pub fn header_len(self) -> usize {
        match self {
            Profile::Legacy => 0,
            Profile::Framed => HEADER_LEN,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Legacy => f.write_str("legacy"),
            Profile::Framed => f.write_str("framed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("opcode {opcode} is not supported by the {profile} profile")]
    Unsupported { opcode: u8, profile: Profile },
    #[error("payload of {0} bytes does not fit the length byte")]
    PayloadTooLarge(usize),
    #[error("frame does not start with the UMX preamble")]
    MissingPreamble,
    #[error("zero length frame")]
    InvalidLength,
    #[error("frame should be {expected} bytes, found {found}")]
    Length { expected: usize, found: usize },
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Encodes `command` into the exact bytes to write for `profile`.
///
/// Encoding has no side effects; the same command and profile always give the
/// same bytes.
pub fn encode(command: &Command, profile: Profile) -> Result<Frame, FrameError> {
    if !profile.supports(command) {
        return Err(FrameError::Unsupported {
            opcode: command.opcode(),
            profile,
        });
    }

    let mut buffer = [0; MAX_FRAME_SIZE];
    let start = profile.header_len();
    let size = command.encode(&mut buffer[start..])?;

    if let Profile::Framed = profile {
        buffer[..PREAMBLE.len()].copy_from_slice(&PREAMBLE);
        buffer[PREAMBLE.len()] = u8::try_from(size).map_err(|_| FrameError::PayloadTooLarge(size))?;
    }

    Frame::from_slice(&buffer[..start + size]).map_err(|_| FrameError::PayloadTooLarge(size))
}

/// Checks a complete framed-profile frame and returns its payload.
pub fn unwrap_framed(frame: &[u8]) -> Result<&[u8], FrameError> {
    if frame.len() < HEADER_LEN {
        return Err(FrameError::Length {
            expected: HEADER_LEN,
            found: frame.len(),
        });
    }
    if frame[..PREAMBLE.len()] != PREAMBLE {
        return Err(FrameError::MissingPreamble);
    }
    let length = frame[PREAMBLE.len()] as usize;
    if length == 0 {
        return Err(FrameError::InvalidLength);
    }
    if frame.len() != HEADER_LEN + length {
        return Err(FrameError::Length {
            expected: HEADER_LEN + length,
            found: frame.len(),
        });
    }
    Ok(&frame[HEADER_LEN..])
}

/// Decodes a complete frame of the given profile back into its command.
pub fn decode(frame: &[u8], profile: Profile) -> Result<Command, FrameError> {
    let payload = match profile {
        Profile::Legacy => frame,
        Profile::Framed => unwrap_framed(frame)?,
    };
    let command = Command::decode(payload)?;
    if !profile.supports(&command) {
        return Err(FrameError::Unsupported {
            opcode: command.opcode(),
            profile,
        });
    }
    Ok(command)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Number of preamble bytes matched so far
    Preamble(usize),
    Length,
    Payload,
}

/// Receive side of the framed profile, fed one byte at a time.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    payload: Payload,
    expected: usize,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::Preamble(0),
            payload: Payload::new(),
            expected: 0,
        }
    }

    pub fn reset(&mut self) {
        self.state = ParseState::Preamble(0);
        self.payload.clear();
        self.expected = 0;
    }

    /// Returns `Ok(Some(payload))` once a whole frame has arrived and `Ok(None)`
    /// while more bytes are needed.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Payload>, FrameError> {
        match self.state {
            ParseState::Preamble(matched) => {
                self.state = if byte == PREAMBLE[matched] {
                    if matched + 1 == PREAMBLE.len() {
                        ParseState::Length
                    } else {
                        ParseState::Preamble(matched + 1)
                    }
                } else if byte == PREAMBLE[0] {
                    // 'U' never repeats inside the preamble, so a mismatch can only
                    // restart the search here
                    ParseState::Preamble(1)
                } else {
                    ParseState::Preamble(0)
                };
                Ok(None)
            }
            ParseState::Length => {
                if byte == 0 {
                    self.reset();
                    return Err(FrameError::InvalidLength);
                }
                self.expected = byte as usize;
                self.payload.clear();
                self.state = ParseState::Payload;
                Ok(None)
            }
            ParseState::Payload => {
                // expected is at most MAX_PAYLOAD_SIZE so this always fits
                let _ = self.payload.push(byte);
                if self.payload.len() < self.expected {
                    return Ok(None);
                }
                let payload = core::mem::take(&mut self.payload);
                self.reset();
                Ok(Some(payload))
            }
        }
    }

    /// Feeds bytes until the first complete payload. Bytes after it are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Payload>, FrameError> {
        for &byte in bytes {
            if let Some(payload) = self.feed(byte)? {
                return Ok(Some(payload));
            }
        }
        Ok(None)
    }
}
