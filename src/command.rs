//! Display commands and their payload encoding.
//!
//! A payload is an opcode byte followed by the command's operands. It is the
//! whole frame under [`Profile::Legacy`](crate::Profile::Legacy) and the body
//! of the frame under [`Profile::Framed`](crate::Profile::Framed).

use crate::{Decode, Encode, frame::MAX_PAYLOAD_SIZE};

pub const OP_SET_MODE: u8 = 1;
pub const OP_WRITE_TEXT: u8 = 2;
pub const OP_SET_FONT: u8 = 3;
pub const OP_SET_COLOR: u8 = 4;
pub const OP_ANIMATE: u8 = 5;
pub const OP_SET_PIXEL: u8 = 6;
pub const OP_SET_ROW: u8 = 7;
pub const OP_CLEAR: u8 = 8;
pub const OP_OUTPUT_ENABLE: u8 = 9;
pub const OP_OUTPUT_DISABLE: u8 = 10;

/// Opcode and column leave this much room for text.
pub const MAX_TEXT_LEN: usize = MAX_PAYLOAD_SIZE - 2;
/// Opcode leaves this much room for row values.
pub const MAX_ROW_LEN: usize = MAX_PAYLOAD_SIZE - 1;
pub const MIN_COLOR_OPERANDS: usize = 4;
pub const MAX_COLOR_OPERANDS: usize = 5;

pub type Text = heapless::String<MAX_TEXT_LEN>;
pub type RowValues = heapless::Vec<u8, MAX_ROW_LEN>;
pub type ColorOperands = heapless::Vec<u8, MAX_COLOR_OPERANDS>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Text = 0,
    Direct = 1,
}

impl DisplayMode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<DisplayMode> {
        match code {
            0 => Some(DisplayMode::Text),
            1 => Some(DisplayMode::Direct),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    #[default]
    Default = 0,
    Pro = 1,
    Ibm = 2,
}

impl Font {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Font> {
        match code {
            0 => Some(Font::Default),
            1 => Some(Font::Pro),
            2 => Some(Font::Ibm),
            _ => None,
        }
    }

    /// Anything other than `ibm` or `pro` selects the default font.
    pub fn from_name(name: &str) -> Font {
        match name {
            "ibm" => Font::Ibm,
            "pro" => Font::Pro,
            _ => Font::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Animation {
    #[default]
    None,
    Blink {
        period: u8,
    },
    Slide {
        period: u8,
        distance: u8,
    },
}

impl Animation {
    pub fn code(&self) -> u8 {
        match self {
            Animation::None => 0,
            Animation::Blink { .. } => 1,
            Animation::Slide { .. } => 2,
        }
    }

    /// Number of parameter bytes following the animation code
    pub fn param_len(&self) -> usize {
        match self {
            Animation::None => 0,
            Animation::Blink { .. } => 1,
            Animation::Slide { .. } => 2,
        }
    }
}

/// One display command. Variable-length operands are capacity bounded so that
/// every command fits in a framed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetMode(DisplayMode),
    WriteText {
        col: u8,
        text: Text,
    },
    SetFont {
        col: u8,
        font: Font,
    },
    /// Raw positional operands, 4 or 5 of them. Their meaning belongs to the
    /// firmware, so they are kept in the order typed.
    SetColor(ColorOperands),
    Animate {
        col: u8,
        animation: Animation,
    },
    SetPixel {
        x: u8,
        y: u8,
        w: u8,
        h: u8,
        state: u8,
    },
    SetRow(RowValues),
    Clear,
    OutputEnable,
    OutputDisable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty payload")]
    Empty,
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("opcode {opcode} payload should be {expected} bytes, found {found}")]
    Length {
        opcode: u8,
        expected: usize,
        found: usize,
    },
    #[error("unknown display mode {0}")]
    UnknownMode(u8),
    #[error("unknown font {0}")]
    UnknownFont(u8),
    #[error("unknown animation {0}")]
    UnknownAnimation(u8),
    #[error("text is not valid UTF-8")]
    InvalidText,
    #[error("{what} holds at most {max} bytes, got {found}")]
    TooLong {
        what: &'static str,
        max: usize,
        found: usize,
    },
    #[error("color takes 4 or 5 operands, got {0}")]
    ColorOperands(usize),
    #[error("encode buffer too small: need {expected} bytes, have {found}")]
    EncodeBufferTooSmall { expected: usize, found: usize },
}

impl Command {
    pub fn write_text(col: u8, text: &str) -> Result<Command, CommandError> {
        let text = Text::try_from(text).map_err(|_| CommandError::TooLong {
            what: "text",
            max: MAX_TEXT_LEN,
            found: text.len(),
        })?;
        Ok(Command::WriteText { col, text })
    }

    pub fn set_color(operands: &[u8]) -> Result<Command, CommandError> {
        if operands.len() < MIN_COLOR_OPERANDS {
            return Err(CommandError::ColorOperands(operands.len()));
        }
        let operands = ColorOperands::from_slice(operands)
            .map_err(|_| CommandError::ColorOperands(operands.len()))?;
        Ok(Command::SetColor(operands))
    }

    pub fn set_row(values: &[u8]) -> Result<Command, CommandError> {
        let values = RowValues::from_slice(values).map_err(|_| CommandError::TooLong {
            what: "row",
            max: MAX_ROW_LEN,
            found: values.len(),
        })?;
        Ok(Command::SetRow(values))
    }

    pub fn opcode(&self) -> u8 {
        match self {
            Command::SetMode(_) => OP_SET_MODE,
            Command::WriteText { .. } => OP_WRITE_TEXT,
            Command::SetFont { .. } => OP_SET_FONT,
            Command::SetColor(_) => OP_SET_COLOR,
            Command::Animate { .. } => OP_ANIMATE,
            Command::SetPixel { .. } => OP_SET_PIXEL,
            Command::SetRow(_) => OP_SET_ROW,
            Command::Clear => OP_CLEAR,
            Command::OutputEnable => OP_OUTPUT_ENABLE,
            Command::OutputDisable => OP_OUTPUT_DISABLE,
        }
    }

    /// Length of the encoded payload, opcode included
    pub fn payload_len(&self) -> usize {
        1 + match self {
            Command::SetMode(_) => 1,
            Command::WriteText { text, .. } => 1 + text.len(),
            Command::SetFont { .. } => 2,
            Command::SetColor(operands) => operands.len(),
            Command::Animate { animation, .. } => 2 + animation.param_len(),
            Command::SetPixel { .. } => 5,
            Command::SetRow(values) => values.len(),
            Command::Clear | Command::OutputEnable | Command::OutputDisable => 0,
        }
    }
}

impl Encode for Command {
    type Error = CommandError;

    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        let size = self.payload_len();
        if buffer.len() < size {
            return Err(CommandError::EncodeBufferTooSmall {
                expected: size,
                found: buffer.len(),
            });
        }

        buffer[0] = self.opcode();
        let operands = &mut buffer[1..size];
        match self {
            Command::SetMode(mode) => operands[0] = mode.code(),
            Command::WriteText { col, text } => {
                operands[0] = *col;
                operands[1..].copy_from_slice(text.as_bytes());
            }
            Command::SetFont { col, font } => operands.copy_from_slice(&[*col, font.code()]),
            Command::SetColor(values) => operands.copy_from_slice(values),
            Command::Animate { col, animation } => {
                operands[0] = *col;
                operands[1] = animation.code();
                match *animation {
                    Animation::None => {}
                    Animation::Blink { period } => operands[2] = period,
                    Animation::Slide { period, distance } => {
                        operands[2] = period;
                        operands[3] = distance;
                    }
                }
            }
            Command::SetPixel { x, y, w, h, state } => {
                operands.copy_from_slice(&[*x, *y, *w, *h, *state])
            }
            Command::SetRow(values) => operands.copy_from_slice(values),
            Command::Clear | Command::OutputEnable | Command::OutputDisable => {}
        }
        Ok(size)
    }
}

/// Checks that a payload has exactly `expected` bytes and hands back its operands.
fn exact<const N: usize>(data: &[u8]) -> Result<[u8; N], CommandError> {
    data[1..].try_into().map_err(|_| CommandError::Length {
        opcode: data[0],
        expected: N + 1,
        found: data.len(),
    })
}

impl<'a> Decode<'a> for Command {
    type Error = CommandError;

    fn decode(data: &'a [u8]) -> Result<Self, Self::Error> {
        let (&opcode, operands) = data.split_first().ok_or(CommandError::Empty)?;
        let at_least = |expected: usize| CommandError::Length {
            opcode,
            expected,
            found: data.len(),
        };

        match opcode {
            OP_SET_MODE => {
                let [mode] = exact::<1>(data)?;
                DisplayMode::from_code(mode)
                    .map(Command::SetMode)
                    .ok_or(CommandError::UnknownMode(mode))
            }
            OP_WRITE_TEXT => {
                let (&col, text) = operands.split_first().ok_or(at_least(2))?;
                let text = core::str::from_utf8(text).map_err(|_| CommandError::InvalidText)?;
                Command::write_text(col, text)
            }
            OP_SET_FONT => {
                let [col, font] = exact::<2>(data)?;
                let font = Font::from_code(font).ok_or(CommandError::UnknownFont(font))?;
                Ok(Command::SetFont { col, font })
            }
            OP_SET_COLOR => Command::set_color(operands),
            OP_ANIMATE => {
                if data.len() < 3 {
                    return Err(at_least(3));
                }
                let col = data[1];
                let animation = match data[2] {
                    0 => {
                        exact::<2>(data)?;
                        Animation::None
                    }
                    1 => {
                        let [_, _, period] = exact::<3>(data)?;
                        Animation::Blink { period }
                    }
                    2 => {
                        let [_, _, period, distance] = exact::<4>(data)?;
                        Animation::Slide { period, distance }
                    }
                    kind => return Err(CommandError::UnknownAnimation(kind)),
                };
                Ok(Command::Animate { col, animation })
            }
            OP_SET_PIXEL => {
                let [x, y, w, h, state] = exact::<5>(data)?;
                Ok(Command::SetPixel { x, y, w, h, state })
            }
            OP_SET_ROW => Command::set_row(operands),
            OP_CLEAR => exact::<0>(data).map(|_| Command::Clear),
            OP_OUTPUT_ENABLE => exact::<0>(data).map(|_| Command::OutputEnable),
            OP_OUTPUT_DISABLE => exact::<0>(data).map(|_| Command::OutputDisable),
            other => Err(CommandError::UnknownOpcode(other)),
        }
    }
}
