use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::Diagnostics;
use rox::scanner::Scanner;
use rox::session::{self, RunError, Session};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print one JSON object per token instead of the text form
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program; starts a prompt without one
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file as source text.
fn read_file(filename: &Path) -> Result<String> {
    session::read_source(filename).context(format!("Failed to read file {:?}", filename))
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Write to the file with module and source line, RUST_LOG overrides the level
    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn no_input() -> ! {
    info!("No filepath provided");

    println!("No input filepath was provided. Exiting...");

    std::process::exit(0);
}

fn report(error: &RunError) -> ! {
    debug!("Exiting after: {}", error);

    eprintln!("{}", error);

    std::process::exit(error.exit_code());
}

/// Read‑eval‑print loop: one line per input unit, errors never end the loop.
fn run_prompt() -> Result<()> {
    info!("Starting prompt");

    let mut session = Session::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        if let Err(e) = session.run(&line) {
            eprintln!("{}", e);
        }
    }

    println!();
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let Some(filename) = filename else { no_input() };
            info!("Running Tokenize subcommand");

            let source = read_file(&filename)?;
            let mut tokenized = true;

            for token in Scanner::new(source.as_bytes()) {
                match token {
                    Ok(token) if json => {
                        println!("{}", serde_json::to_string(&token)?);
                    }

                    Ok(token) => println!("{}", token),

                    Err(e) => {
                        tokenized = false;
                        eprintln!("{}", e);
                    }
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }
        }

        Commands::Parse { filename } => {
            let Some(filename) = filename else { no_input() };
            info!("Running Parse subcommand");

            let source = read_file(&filename)?;
            let mut diagnostics = Diagnostics::new();
            let expr = Session::new().parse_expression(&source, &mut diagnostics);

            match expr {
                Some(expr) if !diagnostics.had_error() => println!("{}", AstPrinter::print(&expr)),
                _ => report(&RunError::Static(diagnostics.into_errors())),
            }
        }

        Commands::Evaluate { filename } => {
            let Some(filename) = filename else { no_input() };
            info!("Running Evaluate subcommand");

            let source = read_file(&filename)?;

            match Session::new().evaluate(&source) {
                Ok(value) => println!("{}", value),
                Err(e) => report(&e),
            }
        }

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");

                let source = read_file(&filename)?;

                if let Err(e) = Session::new().run(&source) {
                    report(&e);
                }

                info!("Program executed successfully");
            }

            None => run_prompt()?,
        },
    }

    Ok(())
}
