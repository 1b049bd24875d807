// SPDX-License-Identifier: Apache-2.0

//! Streams JSON values from a file or stdin and prints each one on its own
//! line as soon as it is complete.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use jstream::{Config, DuplicateKeys, ParseError, StreamParser, Value};
use log::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Last value of a repeated key wins
    Last,
    /// First value of a repeated key wins
    First,
    /// Keep every repeated key
    All,
}

impl From<Policy> for DuplicateKeys {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Last => DuplicateKeys::LastWins,
            Policy::First => DuplicateKeys::FirstWins,
            Policy::All => DuplicateKeys::KeepAll,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "jstream-cat", about = "Print each JSON value of a stream on one line")]
struct Cli {
    /// Input file, stdin when omitted
    file: Option<PathBuf>,

    /// Handling of repeated object keys
    #[arg(long, value_enum, default_value_t = Policy::Last)]
    duplicate_keys: Policy,

    /// Report errors and continue with the next value
    #[arg(short, long)]
    keep_going: bool,

    /// Print tokens instead of values
    #[arg(long)]
    tokens: bool,
}

/// Outcome of one input item, tracked across callbacks.
#[derive(Default)]
struct Tally {
    values: usize,
    errors: usize,
}

impl Tally {
    fn record(&mut self, item: Result<Value, ParseError>) {
        match item {
            Ok(value) => {
                self.values += 1;
                println!("{value}");
            }
            Err(err) => {
                self.errors += 1;
                let stage = if err.is_lexical() { "lexical" } else { "syntax" };
                eprintln!("{stage} error: {err}");
            }
        }
    }
}

fn open(file: Option<&PathBuf>) -> io::Result<Box<dyn BufRead>> {
    Ok(match file {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

fn print_tokens(parser: &mut StreamParser, reader: Box<dyn BufRead>) -> Result<(), String> {
    let mut print = |token: jstream::Token| println!("{token}");
    for line in reader.lines() {
        let line = line.map_err(|e| e.to_string())?;
        for c in line.chars().chain(Some('\n')) {
            parser.feed_char(c, &mut print).map_err(|e| e.to_string())?;
        }
    }
    parser.flush_lexer(&mut print).map_err(|e| e.to_string())
}

fn print_values(
    parser: &mut StreamParser,
    reader: Box<dyn BufRead>,
    keep_going: bool,
) -> Result<Tally, String> {
    let mut tally = Tally::default();
    for line in reader.lines() {
        let line = line.map_err(|e| e.to_string())?;
        for c in line.chars().chain(Some('\n')) {
            parser.push(c, &mut |item| tally.record(item));
            if tally.errors > 0 && !keep_going {
                return Ok(tally);
            }
        }
    }
    parser.finish(&mut |item| tally.record(item));
    Ok(tally)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let reader = match open(cli.file.as_ref()) {
        Ok(reader) => reader,
        Err(e) => {
            error!("Unable to open input: {e}");
            return ExitCode::FAILURE;
        }
    };
    let config = Config::new().duplicate_keys(cli.duplicate_keys.into());
    let mut parser = StreamParser::with_config(config);

    if cli.tokens {
        return match print_tokens(&mut parser, reader) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    match print_values(&mut parser, reader, cli.keep_going) {
        Ok(tally) => {
            info!("{} values, {} errors", tally.values, tally.errors);
            if tally.errors == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("Unable to read input: {e}");
            ExitCode::FAILURE
        }
    }
}
