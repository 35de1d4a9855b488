//! Turns one line of typed text into a [`Command`].
//!
//! ```text
//! color R G B BR | color COL R G B BR
//! write COL WORD...
//! font COL ibm|pro|<other>
//! anim COL none|blink PERIOD|slide PERIOD DISTANCE   (framed profile)
//! px X Y W H STATE
//! row VALUE...
//! direct | text | clear | oe | od
//! ```
//!
//! Numeric arguments are decimal bytes. Any other command name ends the session.

use alloc::{string::String, vec::Vec};
use core::str::SplitWhitespace;

use crate::{
    command::{Animation, Command, CommandError, DisplayMode, Font},
    frame::Profile,
};

/// What a line asks the shell to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    /// Nothing but whitespace
    Blank,
    /// `quit`, `exit`, or any name that is not a command
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("`{command}` needs a {argument} argument")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("`{0}` is not a number")]
    NotANumber(String),
    #[error("{0} is out of range, operands are 0 to 255")]
    OutOfRange(String),
    #[error("`{command}` is not supported by the {profile} profile")]
    Unsupported {
        command: &'static str,
        profile: Profile,
    },
    #[error(transparent)]
    Command(#[from] CommandError),
}

fn parse_byte(word: &str) -> Result<u8, ParseError> {
    word.parse::<u8>().map_err(|_| match word.parse::<i64>() {
        Ok(_) => ParseError::OutOfRange(word.into()),
        Err(_) => ParseError::NotANumber(word.into()),
    })
}

/// Remaining words of a line, consumed positionally
struct Args<'a> {
    command: &'static str,
    words: SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn word(&mut self, argument: &'static str) -> Result<&'a str, ParseError> {
        self.words.next().ok_or(ParseError::MissingArgument {
            command: self.command,
            argument,
        })
    }

    fn byte(&mut self, argument: &'static str) -> Result<u8, ParseError> {
        parse_byte(self.word(argument)?)
    }

    fn bytes(self) -> Result<Vec<u8>, ParseError> {
        self.words.map(parse_byte).collect()
    }
}

/// Parses one line for the given profile.
///
/// Trailing arguments to fixed-arity commands are ignored.
pub fn parse_line(line: &str, profile: Profile) -> Result<Input, ParseError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(Input::Blank);
    };
    let args = |command| Args { command, words };

    let command = match name {
        "color" => Command::set_color(&args("color").bytes()?)?,
        "write" => {
            let mut args = args("write");
            let col = args.byte("column")?;
            let text = args.words.collect::<Vec<_>>().join(" ");
            Command::write_text(col, &text)?
        }
        "font" => {
            let mut args = args("font");
            let col = args.byte("column")?;
            let font = Font::from_name(args.word("font")?);
            Command::SetFont { col, font }
        }
        "anim" | "animate" => {
            if !profile.supports(&Command::Animate { col: 0, animation: Animation::None }) {
                return Err(ParseError::Unsupported { command: "anim", profile });
            }
            let mut args = args("anim");
            let col = args.byte("column")?;
            let animation = match args.word("animation")? {
                "blink" => Animation::Blink {
                    period: args.byte("period")?,
                },
                "slide" => Animation::Slide {
                    period: args.byte("period")?,
                    distance: args.byte("distance")?,
                },
                _ => Animation::None,
            };
            Command::Animate { col, animation }
        }
        "px" => {
            let mut args = args("px");
            Command::SetPixel {
                x: args.byte("x")?,
                y: args.byte("y")?,
                w: args.byte("width")?,
                h: args.byte("height")?,
                state: args.byte("state")?,
            }
        }
        "row" => Command::set_row(&args("row").bytes()?)?,
        "direct" => Command::SetMode(DisplayMode::Direct),
        "text" => Command::SetMode(DisplayMode::Text),
        "clear" => Command::Clear,
        "oe" => Command::OutputEnable,
        "od" => Command::OutputDisable,
        _ => return Ok(Input::Quit),
    };
    Ok(Input::Command(command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{command::MAX_TEXT_LEN, frame::encode};

    fn legacy(line: &str) -> Command {
        match parse_line(line, Profile::Legacy) {
            Ok(Input::Command(cmd)) => cmd,
            other => panic!("{line:?} parsed to {other:?}"),
        }
    }

    #[test]
    fn color_with_leading_index() {
        let cmd = legacy("color 1 255 0 128 50");
        let frame = encode(&cmd, Profile::Legacy).unwrap();
        assert_eq!(&frame[..], &[4, 1, 255, 0, 128, 50]);
    }

    #[test]
    fn color_four_operands() {
        let frame = encode(&legacy("color 255 0 128 50"), Profile::Legacy).unwrap();
        assert_eq!(&frame[..], &[4, 255, 0, 128, 50]);
    }

    #[test]
    fn color_operand_count() {
        assert_eq!(
            parse_line("color 1 2 3", Profile::Legacy),
            Err(ParseError::Command(CommandError::ColorOperands(3)))
        );
        assert_eq!(
            parse_line("color 1 2 3 4 5 6", Profile::Legacy),
            Err(ParseError::Command(CommandError::ColorOperands(6)))
        );
    }

    #[test]
    fn write_joins_words() {
        assert_eq!(legacy("write 2 AB"), Command::write_text(2, "AB").unwrap());
        assert_eq!(
            legacy("write 0   hello    world"),
            Command::write_text(0, "hello world").unwrap()
        );
        assert_eq!(legacy("write 5"), Command::write_text(5, "").unwrap());
    }

    #[test]
    fn write_too_long() {
        let line = alloc::format!("write 0 {}", "x".repeat(MAX_TEXT_LEN + 1));
        assert!(matches!(
            parse_line(&line, Profile::Framed),
            Err(ParseError::Command(CommandError::TooLong { what: "text", .. }))
        ));
    }

    #[test]
    fn font_fallback() {
        assert_eq!(legacy("font 1 ibm"), Command::SetFont { col: 1, font: Font::Ibm });
        assert_eq!(legacy("font 1 pro"), Command::SetFont { col: 1, font: Font::Pro });
        assert_eq!(legacy("font 1 gothic"), Command::SetFont { col: 1, font: Font::Default });
        assert_eq!(
            parse_line("font 1", Profile::Legacy),
            Err(ParseError::MissingArgument { command: "font", argument: "font" })
        );
    }

    #[test]
    fn animations_need_framed_profile() {
        assert_eq!(
            parse_line("anim 0 blink 4", Profile::Legacy),
            Err(ParseError::Unsupported { command: "anim", profile: Profile::Legacy })
        );

        let framed = |line| parse_line(line, Profile::Framed).unwrap();
        assert_eq!(
            framed("anim 3 slide 5 10"),
            Input::Command(Command::Animate {
                col: 3,
                animation: Animation::Slide { period: 5, distance: 10 }
            })
        );
        assert_eq!(
            framed("animate 3 blink 4"),
            Input::Command(Command::Animate { col: 3, animation: Animation::Blink { period: 4 } })
        );
        assert_eq!(
            framed("anim 3 wobble 4"),
            Input::Command(Command::Animate { col: 3, animation: Animation::None })
        );
        assert_eq!(
            parse_line("anim 3 slide 5", Profile::Framed),
            Err(ParseError::MissingArgument { command: "anim", argument: "distance" })
        );
    }

    #[test]
    fn pixel_and_row() {
        assert_eq!(
            legacy("px 1 2 3 4 1"),
            Command::SetPixel { x: 1, y: 2, w: 3, h: 4, state: 1 }
        );
        assert_eq!(
            parse_line("px 1 2 3", Profile::Legacy),
            Err(ParseError::MissingArgument { command: "px", argument: "height" })
        );
        assert_eq!(legacy("row 1 2 3"), Command::set_row(&[1, 2, 3]).unwrap());
        assert_eq!(legacy("row"), Command::set_row(&[]).unwrap());
    }

    #[test]
    fn bare_commands() {
        assert_eq!(legacy("direct"), Command::SetMode(DisplayMode::Direct));
        assert_eq!(legacy("text"), Command::SetMode(DisplayMode::Text));
        assert_eq!(legacy("clear"), Command::Clear);
        assert_eq!(legacy("oe"), Command::OutputEnable);
        assert_eq!(legacy("od extra args"), Command::OutputDisable);
    }

    #[test]
    fn bad_numbers() {
        assert_eq!(
            parse_line("px 1 2 x 4 1", Profile::Legacy),
            Err(ParseError::NotANumber("x".into()))
        );
        assert_eq!(
            parse_line("row 1 256", Profile::Legacy),
            Err(ParseError::OutOfRange("256".into()))
        );
        assert_eq!(
            parse_line("font -1 ibm", Profile::Legacy),
            Err(ParseError::OutOfRange("-1".into()))
        );
    }

    #[test]
    fn quit_and_blank() {
        assert_eq!(parse_line("", Profile::Legacy), Ok(Input::Blank));
        assert_eq!(parse_line("   \t", Profile::Legacy), Ok(Input::Blank));
        assert_eq!(parse_line("quit", Profile::Legacy), Ok(Input::Quit));
        assert_eq!(parse_line("bye now", Profile::Framed), Ok(Input::Quit));
    }
}
