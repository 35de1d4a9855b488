//! Interactive read-eval-print loop over a [`Link`].

use std::{
    io::{self, BufRead, Write as _},
    thread,
    time::Duration,
};

use embedded_hal_nb::serial::Read;
use embedded_io::Write;

use crate::{
    parse::{Input, parse_line},
    serial::{Link, LinkError},
};

#[derive(Debug, thiserror::Error)]
pub enum ShellError<WriteError, ReadError> {
    #[error("terminal i/o failed: {0}")]
    Terminal(#[from] io::Error),
    #[error(transparent)]
    Link(#[from] LinkError<WriteError, ReadError>),
}

/// Runs a session on `link` and closes it afterwards, whichever way the
/// session ended.
pub fn serve<In, Out, Tx, Rx>(
    mut link: Link<Tx, Rx>,
    input: In,
    output: Out,
    settle: Duration,
) -> Result<(), ShellError<Tx::Error, Rx::Error>>
where
    In: BufRead,
    Out: io::Write,
    Tx: Write,
    Rx: Read,
{
    let result = run(&mut link, input, output, settle);
    drop(link);
    log::info!("link closed");
    result
}

/// Reads commands from `input` until EOF or a quit, sending each to the display
/// and echoing whatever it answers to `output`.
///
/// Bad lines are reported and skipped. Transport failures end the session.
/// `settle` is how long to give the display to answer before draining.
pub fn run<In, Out, Tx, Rx>(
    link: &mut Link<Tx, Rx>,
    mut input: In,
    mut output: Out,
    settle: Duration,
) -> Result<(), ShellError<Tx::Error, Rx::Error>>
where
    In: BufRead,
    Out: io::Write,
    Tx: Write,
    Rx: Read,
{
    let profile = link.profile();
    let mut buf = Vec::new();

    loop {
        write!(output, ">")?;
        output.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(output)?;
            log::info!("end of input");
            return Ok(());
        }
        let line = match core::str::from_utf8(&buf) {
            Ok(line) => line.trim_end_matches(['\r', '\n']),
            Err(e) => {
                log::warn!("rejected b'{}': {e}", buf.escape_ascii());
                writeln!(output, "error: line is not valid UTF-8: {e}")?;
                continue;
            }
        };

        let command = match parse_line(line, profile) {
            Ok(Input::Command(command)) => command,
            Ok(Input::Blank) => continue,
            Ok(Input::Quit) => {
                log::info!("quit on {:?}", line.trim());
                return Ok(());
            }
            Err(e) => {
                log::warn!("rejected {line:?}: {e}");
                writeln!(output, "error: {e}")?;
                continue;
            }
        };

        match link.send(&command) {
            Ok(_) => {}
            Err(LinkError::Frame(e)) => {
                log::warn!("could not encode {command:?}: {e}");
                writeln!(output, "error: {e}")?;
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        if !settle.is_zero() {
            thread::sleep(settle);
        }
        let response = link.read_available()?;
        writeln!(output, "b'{}'", response.escape_ascii())?;
    }
}
