use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::{ArgAction, Parser, error::ErrorKind};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::PipelineConfig;
use crate::constants::pipeline::{DEFAULT_ID_ORIGIN, DEFAULT_THRESHOLD};
use crate::pipeline::prepare;
use crate::types::{Confidence, InternalKey};

#[derive(Debug, Parser)]
#[command(
    name = "dedupe-functions",
    disable_help_subcommand = true,
    version,
    about = "Cluster duplicate gene-function annotations",
    long_about = "Normalize the function column of a tab-separated file, cluster records that describe the same function, and print each identifier with its cluster's canonical function.",
    after_help = "Model settings and labeled pairs are read from and written next to INFILE as INFILE.learn and INFILE.train."
)]
struct DedupeCli {
    #[arg(
        value_name = "INFILE",
        value_parser = existing_file,
        help = "Tab-separated input: identifier, function text, ignored columns"
    )]
    infile: PathBuf,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "FILE",
        help = "Where to write the output [stdout]"
    )]
    outfile: Option<PathBuf>,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help = "Log progress to stderr (repeat for debug output)"
    )]
    verbose: u8,
    #[arg(long = "ids", value_name = "IDS", hide = true)]
    ids: Option<String>,
    #[arg(
        long,
        default_value_t = DEFAULT_THRESHOLD,
        value_parser = parse_threshold,
        help = "Partition threshold in [0, 1]"
    )]
    threshold: Confidence,
    #[arg(
        long = "id-origin",
        default_value_t = DEFAULT_ID_ORIGIN,
        help = "First internal key assigned to input identifiers"
    )]
    id_origin: InternalKey,
    #[arg(
        long = "no-persist",
        help = "Do not write trained settings or labeled pairs next to INFILE"
    )]
    no_persist: bool,
}

/// Run the `dedupe-functions` command line with `args_iter` (program name excluded).
pub fn run_dedupe_cli<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) =
        parse_cli::<DedupeCli, _>(std::iter::once("dedupe-functions".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    init_tracing(cli.verbose);
    if let Some(ids) = cli.ids.as_deref() {
        debug!("[dedupe:cli] --ids is reserved and ignored (got '{}')", ids);
    }

    let config = PipelineConfig::for_input(&cli.infile)
        .with_threshold(cli.threshold)
        .with_id_origin(cli.id_origin)
        .with_persist_artifacts(!cli.no_persist);
    let resolution = prepare(&cli.infile, &config)?;

    match cli.outfile {
        Some(path) => {
            let file = File::create(&path)
                .map_err(|err| format!("failed to create '{}': {err}", path.display()))?;
            resolution.write_to(&mut BufWriter::new(file))?;
        }
        None => {
            let stdout = io::stdout();
            resolution.write_to(&mut BufWriter::new(stdout.lock()))?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn existing_file(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if !path.exists() {
        return Err(format!("{raw} does not exist"));
    }
    Ok(path)
}

fn parse_threshold(raw: &str) -> Result<Confidence, String> {
    let parsed = raw
        .parse::<Confidence>()
        .map_err(|_| format!("could not parse --threshold value '{raw}' as a number"))?;
    if !(0.0..=1.0).contains(&parsed) {
        return Err(format!("--threshold must be within [0, 1], got {parsed}"));
    }
    Ok(parsed)
}
