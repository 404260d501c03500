//! CLI entry point for the `mips-codec` binary.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use codec_cli::driver::{load_codec, process_batch, DriverError, InputSource};
use codec_cli::logger;
use codec_core::Mode;
use log as _;
#[cfg(test)]
use tempfile as _;

const USAGE_TEXT: &str = "\
Usage: mips-codec <command> [options]

Commands:
  encode [<input>] [-e <text>]  Convert assembly lines to 32-bit binary words
  decode [<input>] [-e <text>]  Convert 32-bit binary words to assembly lines
  list                          Print every instruction in the table

Options:
  -e, --eval <text>    Convert this text instead of reading a file
  -o, --output <file>  Write the result to a file (default: stdout)
  -t, --table <file>   Use a custom instruction table
  -v, --verbose        Log debug details to stderr
  -h, --help           Show this help message

Examples:
  mips-codec encode program.asm -o program.bin
  mips-codec decode -e 00000000010000110000100000100000
  mips-codec list -t custom.csv
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Convert(ConvertArgs),
    List(ListArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct ConvertArgs {
    mode: Mode,
    source: Option<InputSource>,
    output: Option<PathBuf>,
    table: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct ListArgs {
    table: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "encode" => parse_convert_args(Mode::Encode, args)
            .map(Command::Convert)
            .map(ParseResult::Command),
        "decode" => parse_convert_args(Mode::Decode, args)
            .map(Command::Convert)
            .map(ParseResult::Command),
        "list" => parse_list_args(args)
            .map(Command::List)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn option_value(
    args: &mut impl Iterator<Item = OsString>,
    flag: &OsString,
) -> Result<OsString, String> {
    args.next()
        .ok_or_else(|| format!("missing value for {}", flag.to_string_lossy()))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_convert_args(
    mode: Mode,
    mut args: impl Iterator<Item = OsString>,
) -> Result<ConvertArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut text: Option<String> = None;
    let mut output: Option<PathBuf> = None;
    let mut table: Option<PathBuf> = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "-e" || arg == "--eval" {
            let value = option_value(&mut args, &arg)?;
            text = Some(value.to_string_lossy().to_string());
            continue;
        }

        if arg == "-o" || arg == "--output" {
            output = Some(PathBuf::from(option_value(&mut args, &arg)?));
            continue;
        }

        if arg == "-t" || arg == "--table" {
            table = Some(PathBuf::from(option_value(&mut args, &arg)?));
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let source = match (input, text) {
        (Some(_), Some(_)) => return Err("give an input file or -e, not both".to_string()),
        (Some(path), None) => Some(InputSource::File(path)),
        (None, Some(text)) => Some(InputSource::Text(text)),
        (None, None) => None,
    };

    Ok(ConvertArgs {
        mode,
        source,
        output,
        table,
        verbose,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_list_args(mut args: impl Iterator<Item = OsString>) -> Result<ListArgs, String> {
    let mut table: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "-t" || arg == "--table" {
            table = Some(PathBuf::from(option_value(&mut args, &arg)?));
            continue;
        }

        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }

    Ok(ListArgs { table })
}

fn run_convert(args: &ConvertArgs) -> Result<(), DriverError> {
    logger::init(args.verbose);
    let codec = load_codec(args.table.as_deref())?;
    process_batch(
        &codec,
        args.mode,
        args.source.as_ref(),
        args.output.as_deref(),
    )?;
    Ok(())
}

fn run_list(args: &ListArgs) -> Result<(), DriverError> {
    logger::init(false);
    let codec = load_codec(args.table.as_deref())?;
    for instruction in codec.table() {
        println!(
            "{:<14} {:<3} {}",
            instruction.name().to_uppercase(),
            instruction.class(),
            instruction.layout()
        );
    }
    Ok(())
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(command)) => {
            let result = match &command {
                Command::Convert(args) => run_convert(args),
                Command::List(args) => run_list(args),
            };
            match result {
                Ok(()) => 0,
                Err(error) => {
                    eprintln!("error: {error}");
                    1
                }
            }
        }
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
