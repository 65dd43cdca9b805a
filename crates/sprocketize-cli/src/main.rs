// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! sprocketize - Selective Asset Compilation CLI

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use miette::Result;

mod cmd_compile;

use cmd_compile::CmdCompile;


#[derive(Parser)]
#[clap(
    name = "sprocketize",
    about = "Compile a selection of assets into an output directory",
    version,
    disable_version_flag = true,
    override_usage = "sprocketize [options] output_directory filename [filename ...]"
)]
struct Opt {
    /// Print version
    #[clap(short = 'v', long, action = clap::ArgAction::Version)]
    version: Option<bool>,

    #[clap(flatten)]
    logging: Logging,

    #[clap(flatten)]
    compile: CmdCompile,
}

#[derive(Parser)]
struct Logging {
    /// Increase log verbosity (--verbose, --verbose --verbose, ...)
    #[clap(long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[clap(short, long)]
    quiet: bool,
}

impl Opt {
    fn run(mut self) -> Result<i32> {
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        match self.compile.run() {
            Ok(code) => Ok(code),
            Err(err) if err.is_usage_error() => {
                print_usage_error(&err);
                Ok(1)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Write `message` with the program prefix, followed by the usage text.
fn write_usage_error<W: std::io::Write>(
    out: &mut W,
    message: &dyn std::fmt::Display,
) -> std::io::Result<()> {
    writeln!(out, "{} {message}", "sprocketize:".red())?;
    writeln!(out)?;
    write!(out, "{}", Opt::command().render_help())
}

fn print_usage_error(message: &dyn std::fmt::Display) {
    if let Err(err) = write_usage_error(&mut std::io::stderr(), message) {
        tracing::error!("failed to print usage: {err}");
    }
}

/// The one line summary of a clap parse error, without its `error:` label.
fn parse_error_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

fn main() -> Result<()> {
    let opt = match Opt::try_parse() {
        Ok(opt) => opt,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                print_usage_error(&parse_error_message(&err));
                std::process::exit(1);
            }
        },
    };
    let code = opt.run()?;
    std::process::exit(code);
}
