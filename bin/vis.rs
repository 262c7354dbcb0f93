#![forbid(unsafe_code)]
use std::path::PathBuf;
use std::{env, ffi, fs, io, process};

use std::io::Write;

use vis::{decode as unvis, encode as envis};

fn main() -> CodingResult {
    init_logging();
    CodingResult::catch_panic(|| {
        let flags = Flags::from_args(env::args_os()).unwrap_or_else(|ParamError| explain());
        run_coding(flags)
    })
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_coding(flags: Flags) -> Result<(), io::Error> {
    let operation = flags.operation;
    tracing::debug!(?operation, input = ?flags.input, "starting");

    let out = io::stdout();
    let mut out = out.lock();

    let input = match flags.input {
        Input::Arg(arg) => {
            let result = code_argument(&operation, &arg, &mut out);
            if let Err(err) = &result {
                tracing::debug!(?operation, %err, "failed to code argument");
            }
            return result;
        }
        Input::File(file) => {
            let data = fs::File::open(&file)?;
            Box::new(io::BufReader::with_capacity(1 << 16, data)) as Box<dyn io::BufRead>
        }
        Input::Stdin => {
            Box::new(io::BufReader::with_capacity(1 << 16, io::stdin())) as Box<dyn io::BufRead>
        }
    };

    let result = match operation {
        Operation::Encode => {
            let mut encoder = envis::Encoder::new();
            encoder.into_stream(&mut out).encode_all(input)
        }
        Operation::Decode => {
            let mut decoder = unvis::Decoder::new();
            decoder.into_stream(&mut out).decode_all(input)
        }
    };

    tracing::debug!(
        bytes_read = result.bytes_read,
        bytes_written = result.bytes_written,
        "finished"
    );
    if let Err(err) = &result.status {
        tracing::debug!(?operation, %err, "failed to code stream");
    }

    result.status?;
    out.flush()
}

/// Code a single argument and print it without a trailing newline.
fn code_argument(operation: &Operation, arg: &ffi::OsStr, out: &mut impl Write) -> io::Result<()> {
    let arg = arg_bytes(arg)?;
    match operation {
        Operation::Encode => out.write_all(vis::encode(&arg).as_bytes())?,
        Operation::Decode => {
            let decoded = vis::decode_bytes(&arg)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
            out.write_all(&decoded)?;
        }
    }
    out.flush()
}

#[cfg(unix)]
fn arg_bytes(arg: &ffi::OsStr) -> io::Result<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    Ok(arg.as_bytes().to_vec())
}

#[cfg(not(unix))]
fn arg_bytes(arg: &ffi::OsStr) -> io::Result<Vec<u8>> {
    arg.to_str()
        .map(|arg| arg.as_bytes().to_vec())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "argument is not valid UTF-8"))
}

struct Flags {
    input: Input,
    operation: Operation,
}

struct ParamError;

#[derive(Debug)]
enum Input {
    Arg(ffi::OsString),
    File(PathBuf),
    Stdin,
}

#[derive(Debug)]
enum Operation {
    Encode,
    Decode,
}

fn explain<T>() -> T {
    eprintln!(
        "Usage: vis [-e|-d] [-a <string> | <file>]\n\
        Arguments:\n\
        -e\t operation encode (default)\n\
        -d\t operation decode\n\
        -a\t code this string instead of a file\n\
        <file>\tfilepath or '-' for stdin"
    );
    process::exit(1);
}

impl Default for Flags {
    fn default() -> Flags {
        Flags {
            input: Input::Stdin,
            operation: Operation::Encode,
        }
    }
}

fn command() -> clap::Command<'static> {
    clap::Command::new("vis")
        .about("Visually encode or decode bytes")
        .arg(
            clap::Arg::new("encode")
                .short('e')
                .long("encode")
                .help("Encode the input (default)"),
        )
        .arg(
            clap::Arg::new("decode")
                .short('d')
                .long("decode")
                .conflicts_with("encode")
                .help("Decode the input"),
        )
        .arg(
            clap::Arg::new("arg")
                .short('a')
                .long("arg")
                .takes_value(true)
                .allow_invalid_utf8(true)
                .conflicts_with("file")
                .help("Code this string and print it without a trailing newline"),
        )
        .arg(
            clap::Arg::new("file")
                .default_value("-")
                .value_parser(clap::builder::ValueParser::path_buf()),
        )
}

impl Flags {
    fn from_args(mut args: impl Iterator<Item = ffi::OsString>) -> Result<Self, ParamError> {
        let mut flags = Flags::default();
        let matches = command()
            .try_get_matches_from(args.by_ref())
            .map_err(|err| match err.kind() {
                clap::ErrorKind::DisplayHelp | clap::ErrorKind::DisplayVersion => err.exit(),
                _ => {
                    tracing::debug!(%err, "invalid arguments");
                    ParamError
                }
            })?;

        if matches.contains_id("decode") {
            flags.operation = Operation::Decode;
        } else if matches.contains_id("encode") {
            flags.operation = Operation::Encode;
        }

        if let Some(arg) = matches.value_of_os("arg") {
            flags.input = Input::Arg(arg.to_os_string());
            return Ok(flags);
        }

        match matches.get_one::<PathBuf>("file") {
            None => flags.input = Input::Stdin,
            Some(p) if *p == PathBuf::from("-") => flags.input = Input::Stdin,
            Some(p) => flags.input = Input::File(p.clone()),
        }

        Ok(flags)
    }
}

enum CodingResult {
    Ok,
    Err(io::Error),
    Panic,
}

impl CodingResult {
    fn catch_panic(op: fn() -> Result<(), io::Error>) -> Self {
        std::panic::catch_unwind(|| match op() {
            Ok(()) => CodingResult::Ok,
            Err(err) => CodingResult::Err(err),
        })
        .unwrap_or(CodingResult::Panic)
    }
}

impl std::process::Termination for CodingResult {
    fn report(self) -> std::process::ExitCode {
        match self {
            CodingResult::Ok => std::process::ExitCode::SUCCESS,
            CodingResult::Err(err) => {
                eprintln!("{}", err);
                std::process::ExitCode::FAILURE
            }
            CodingResult::Panic => {
                eprintln!(
                    "The process failed irrecoverably! This should never happen and is a bug."
                );
                std::process::ExitCode::from(128)
            }
        }
    }
}
