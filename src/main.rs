use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, ValueEnum};

use timeline_md::parser::{Item, Parser};
use timeline_md::render::{CsvEmitter, CsvOptions};
use timeline_md::tree_builder::{SerializeOptions, serialize_tree_with_options};
use timeline_md::{Error, Result};

/// Extracts the table from a Metrics Timeline Markdown file and outputs it as CSV.
#[derive(ClapParser, Debug)]
#[command(name = "md2csv", version)]
struct Cli {
    /// Markdown files to read; standard input is read when none are given
    files: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Do not write the CSV header row
    #[arg(long)]
    no_header: bool,

    /// Keep the text between tables in JSON output
    #[arg(long)]
    include_text: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("md2csv: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let stdout = io::stdout();
    let out = stdout.lock();

    match cli.format {
        Format::Csv => {
            let options = CsvOptions {
                include_header: !cli.no_header,
            };
            let mut emitter = CsvEmitter::new(out, &options)?;
            for_each_input(&cli.files, |reader| emitter.write_items(Parser::new(reader)))?;
            log::info!("wrote {} rows", emitter.rows());
            emitter.finish()?;
        }
        Format::Json => {
            let mut items: Vec<Item> = Vec::new();
            for_each_input(&cli.files, |reader| {
                for item in Parser::new(reader) {
                    items.push(item?);
                }
                Ok(())
            })?;
            let options = SerializeOptions {
                include_text: cli.include_text,
            };
            let mut out = out;
            writeln!(out, "{}", serialize_tree_with_options(&items, &options)?)?;
        }
    }

    Ok(())
}

/// Run `f` on each input file in turn, or on standard input when there are none.
fn for_each_input<F>(files: &[PathBuf], mut f: F) -> Result<()>
where
    F: FnMut(Box<dyn BufRead>) -> Result<()>,
{
    if files.is_empty() {
        log::debug!("reading standard input");
        return f(Box::new(io::stdin().lock())).map_err(|err| err.in_file("<stdin>"));
    }

    for path in files {
        log::debug!("reading {}", path.display());
        let file = File::open(path).map_err(|err| Error::from(err).in_file(path))?;
        f(Box::new(BufReader::new(file))).map_err(|err| err.in_file(path))?;
    }
    Ok(())
}
