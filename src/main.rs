use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use rustyline::{error::ReadlineError, Config as EditorConfig, DefaultEditor};
use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};

use tritone::{
    interpreter::{Flow, Interpreter, Value},
    persistence,
};

const PROMPT: &str = "tritone> ";

#[derive(Debug, Parser)]
#[command(version, about = "A calculator for 3-component vectors")]
struct Cli {
    /// Show debug output
    #[arg(short, long)]
    debug: bool,

    /// Read variables from a CSV file before starting
    #[arg(short, long)]
    load: Option<PathBuf>,

    /// Write variables to a CSV file when done
    #[arg(short, long)]
    save: Option<PathBuf>,

    /// Store this many randomly named vectors before starting
    #[arg(long)]
    fill: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Repl)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session (default)
    Repl,
    /// Evaluate each line of a file
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    file: PathBuf,
}

fn init_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    match SimpleLogger::init(filter, LogConfig::default()) {
        Ok(_) => Ok(()),
        Err(e) => bail!("Failed to init logger: {}", e),
    }
}

fn welcome() {
    println!("tritone (a vector calculator) v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for help");
    println!();
}

fn print_value(value: Value) {
    if !value.is_empty() {
        println!("{}", value);
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.debug)?;

    let mut interpreter = Interpreter::default();

    if let Some(path) = &args.load {
        match persistence::load(interpreter.environment_mut(), path) {
            Ok(loaded) => println!("Loaded {} vectors from {}", loaded, path.display()),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    if let Some(count) = args.fill {
        interpreter
            .environment_mut()
            .fill(count)
            .context("Failed to fill variable table")?;
    }

    match args.command() {
        Command::Repl => repl_command(&mut interpreter)?,
        Command::Run(run_args) => run_command(&mut interpreter, run_args)?,
    }

    if let Some(path) = &args.save {
        let saved = persistence::save(interpreter.environment(), path)?;
        println!("Saved {} vectors to {}", saved, path.display());
    }

    Ok(())
}

fn repl_command(interpreter: &mut Interpreter) -> Result<()> {
    let config = EditorConfig::builder().auto_add_history(true).build();
    let mut editor = DefaultEditor::with_config(config)?;
    welcome();

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                info!("read: {}", &line);

                match interpreter.interpret(&line) {
                    Flow::Continue(value) => print_value(value),
                    Flow::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("Press Ctrl-D or type 'quit' to quit");
            }
            Err(ReadlineError::Eof) => {
                println!("quit");
                break;
            }
            Err(e) => {
                error!("Unexpected error: {}", e);
                return Err(e.into());
            }
        }
    }

    Ok(())
}

fn run_command(interpreter: &mut Interpreter, args: &RunArgs) -> Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    for line in source.lines() {
        match interpreter.interpret(line) {
            Flow::Continue(value) => print_value(value),
            Flow::Quit => break,
        }
    }

    Ok(())
}
