use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tapeflat::{
    flatten, write, FlattenConfig, Machine, MachineCatalog, MachineError, MachineLoader, Mode,
    Symbol,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// The machine description to flatten. Read from stdin when omitted.
    file: Option<PathBuf>,

    /// Flatten one of the built-in machines instead of a file
    #[clap(short, long, conflicts_with = "file")]
    sample: Option<String>,

    /// Where to write the flattened machine (stdout by default)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// TOML file with flattening options. Flags override it.
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Suffix of the head markers
    #[clap(long)]
    iteration: Option<u32>,

    /// Fail when a state does not cover every symbol tuple
    #[clap(long)]
    strict: bool,

    /// Skip the subroutine that grows a tape to the left
    #[clap(long)]
    no_left_safety: bool,

    /// Skip the subroutine that grows a tape to the right
    #[clap(long)]
    no_right_safety: bool,

    /// Let input tapes spell blanks as `~`
    #[clap(long)]
    inject_blanks: bool,

    /// Output format of the flattened machine
    #[clap(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log each expanded source state
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), MachineError> {
    let machine = load_machine(cli)?;
    let config = build_config(cli)?;

    let flattened = flatten(&machine, &config)?.to_machine()?;
    tracing::info!(
        states = flattened.domain_states().len(),
        transitions = flattened.transitions.len(),
        "Flattened {}",
        flattened.name
    );

    let rendered = match cli.format {
        Format::Text => write(&flattened),
        Format::Json => serde_json::to_string_pretty(&flattened)
            .map_err(|e| MachineError::ValidationError(e.to_string()))?,
    };

    match &cli.output {
        Some(path) => fs::write(path, rendered).map_err(|e| {
            MachineError::FileError(format!("Failed to write {}: {}", path.display(), e))
        }),
        None => {
            print!("{}", rendered);
            Ok(())
        }
    }
}

/// Loads a machine from a file path, a built-in sample or stdin, in that order.
fn load_machine(cli: &Cli) -> Result<Machine, MachineError> {
    if let Some(path) = &cli.file {
        MachineLoader::load_machine(path)
    } else if let Some(name) = &cli.sample {
        MachineCatalog::get_by_name(name)
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| MachineError::FileError(format!("Failed to read from stdin: {}", e)))?;
        MachineLoader::load_machine_from_string(&buffer)
    } else {
        Err(MachineError::FileError(format!(
            "No machine given. Built-in samples: {}",
            MachineCatalog::list_names().join(", ")
        )))
    }
}

fn build_config(cli: &Cli) -> Result<FlattenConfig, MachineError> {
    let mut config = match &cli.config {
        Some(path) => FlattenConfig::load(path)?,
        None => FlattenConfig::default(),
    };

    if let Some(iteration) = cli.iteration {
        config.iteration = iteration;
    }
    if cli.strict {
        config.mode = Mode::Strict;
    }
    if cli.no_left_safety {
        config.safety.left = false;
    }
    if cli.no_right_safety {
        config.safety.right = false;
    }
    if cli.inject_blanks {
        config.placeholder = Some(Symbol::placeholder());
    }

    config.validate()?;
    Ok(config)
}
