use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod bindings;
pub mod decode;
pub mod encode;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a UL2.0 payload and print the record.
    Decode(DecodeArgs),
    /// Encode a command or command result in UL2.0.
    Encode(EncodeArgs),
    /// List the built-in transport bindings.
    Bindings(BindingsArgs),
    /// Run the agent over the in-memory backend.
    Run(RunArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Bindings(args) => bindings::run(args, format),
        Command::Run(args) => run::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum PayloadKind {
    /// `k=v|k=v#k=v`
    Measures,
    /// `device@command|k=v`
    Command,
    /// `device@command|result`
    Result,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Which grammar to apply.
    #[arg(value_enum)]
    pub kind: PayloadKind,
    /// The raw payload.
    pub payload: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub target: EncodeTarget,
}

#[derive(Subcommand, Debug)]
pub enum EncodeTarget {
    /// Encode `device@command|k=v...`.
    Command {
        device: String,
        command: String,
        /// Parameters as KEY=VALUE.
        #[arg(value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Encode `device@command|result`.
    Result {
        device: String,
        command: String,
        result: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct BindingsArgs {}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON configuration file. Defaults apply when omitted.
    #[arg(long, short = 'c', value_name = "FILE", env = "ULPRIMS_CONFIG")]
    pub config: Option<PathBuf>,
    /// Command to issue once the agent runs (`device@command|k=v`). Repeatable.
    #[arg(long = "command", value_name = "PAYLOAD")]
    pub commands: Vec<String>,
    /// Entity type reported with issued commands.
    #[arg(long, default_value = "Thing")]
    pub entity_type: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))
}
