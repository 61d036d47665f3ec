//! The `arafura` command-line front end: a thin shell around
//! [`arafura::translate`], the library's single pipeline entry point.
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Translate a SurfaceLang source file into C99/C11.
#[derive(Parser, Debug)]
#[command(name = "arafura", version, about)]
struct Args {
    /// Input SurfaceLang source file.
    input: PathBuf,

    /// Write output to PATH instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Parse and lower but discard the output; exit 0/non-zero only.
    #[arg(long)]
    check: bool,

    /// Raise logging verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("arafura: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let source = fs::read_to_string(&args.input)
        .map_err(|e| anyhow::anyhow!("reading {}: {}", args.input.display(), e))?;

    log::debug!("translating {}", args.input.display());
    let output = arafura::translate(&source)?;

    if args.check {
        log::info!("{}: OK", args.input.display());
        return Ok(());
    }

    match &args.output {
        Some(path) => {
            fs::write(path, output)
                .map_err(|e| anyhow::anyhow!("writing {}: {}", path.display(), e))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(output.as_bytes())?;
        }
    }
    Ok(())
}
