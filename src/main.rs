use std::{io, time::Duration};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use umx_serial_protocol::{
    Input, Link, Profile, frame, parse_line,
    port::{self, Port},
    shell,
};

/// Send text commands to a UMX display over a serial port.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Wire layout the display firmware expects
    #[arg(long, value_enum, default_value_t = Profile::Legacy, global = true)]
    profile: Profile,

    /// Serial device the display is attached to
    #[arg(long, default_value = port::DEFAULT_PORT)]
    port: String,

    /// Line speed. The framed firmware only runs at 9600
    #[arg(long)]
    baud: Option<u32>,

    /// Milliseconds to wait for the display's answer after each command
    #[arg(long, default_value_t = 50)]
    settle_ms: u64,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Print the frame for one command as hex without opening a port
    Encode {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match &cli.command {
        Some(Cmd::Encode { line }) => encode_line(&line.join(" "), cli.profile),
        None => run_shell(&cli),
    }
}

fn encode_line(line: &str, profile: Profile) -> anyhow::Result<()> {
    let Input::Command(command) = parse_line(line, profile)? else {
        bail!("`{line}` is not a display command");
    };
    let frame = frame::encode(&command, profile)?;
    println!("{}", hex::encode_upper(&frame[..]));
    Ok(())
}

fn baud_rate(baud: Option<u32>, profile: Profile) -> anyhow::Result<u32> {
    match (profile, baud) {
        (Profile::Framed, Some(baud)) if baud != port::FRAMED_BAUD => {
            bail!("the framed profile runs at {} baud, not {baud}", port::FRAMED_BAUD)
        }
        (_, baud) => Ok(baud.unwrap_or(port::DEFAULT_BAUD)),
    }
}

fn run_shell(cli: &Cli) -> anyhow::Result<()> {
    let baud = baud_rate(cli.baud, cli.profile)?;
    let (tx, rx) = Port::open(&cli.port, baud)?;
    let link = Link::new(tx, rx, cli.profile);

    let settle = Duration::from_millis(cli.settle_ms);
    shell::serve(link, io::stdin().lock(), io::stdout(), settle)
        .with_context(|| format!("session on {} ended", cli.port))
}
