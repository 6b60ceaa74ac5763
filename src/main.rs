use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process::ExitCode;

use awsprof::{
    commands,
    paths::Paths,
    sources::{ProcessEnv, Providers, SystemClipboard},
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "awsprof")]
#[command(about = "Manage profiles in the AWS credentials file")]
#[command(version)]
struct Cli {
    /// Override the credentials file location
    #[arg(long, global = true, value_name = "PATH")]
    creds_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a profile from the clipboard (cb) or environment variables (env)
    Add {
        /// Where to read the new profile from: cb, clipboard, env, environment
        source: String,

        /// Also make the added profile the default (y/n)
        #[arg(long, value_name = "Y|N", default_value = "n", action = ArgAction::Set, value_parser = commands::parse_yes_no)]
        setdefault: bool,

        /// Fail instead of overwriting an existing profile with the same name
        #[arg(long)]
        strict: bool,
    },

    /// List existing profiles
    #[command(alias = "ls")]
    List,

    /// Show full profile info, keys included
    Show {
        /// Profile name to show
        profile: String,
    },

    /// Delete a profile
    #[command(alias = "del")]
    Delete {
        /// Profile name to delete
        profile: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Copy a profile's credentials into the default profile
    #[command(alias = "setdef")]
    Setdefault {
        /// Profile name to make default
        profile: String,
    },

    /// Rename a profile
    Rename {
        /// Current profile name
        old: String,
        /// New profile name
        new: String,
    },

    /// Back up the credentials file
    #[command(alias = "bckp")]
    Backup {
        /// Backup location (default: <credentials file>-<timestamp>.bkp)
        #[arg(long, value_name = "PATH")]
        dest: Option<PathBuf>,
    },

    /// Restore the credentials file from its latest backup
    Restore,

    /// Print a shell completion script
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli, ui: &Ui) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "awsprof", &mut std::io::stdout());
        return Ok(());
    }

    let env = ProcessEnv;
    let paths = Paths::resolve(cli.creds_file, &env)?;
    log::debug!("using credentials file {}", paths.creds_file.display());

    match cli.command {
        Commands::Add {
            source,
            setdefault,
            strict,
        } => {
            let clipboard = SystemClipboard;
            let providers = Providers {
                clipboard: &clipboard,
                env: &env,
            };
            commands::add(&paths, &source, setdefault, strict, &providers, ui)
        }
        Commands::List => commands::list(&paths, ui),
        Commands::Show { profile } => commands::show(&paths, &profile, ui),
        Commands::Delete { profile, force } => commands::delete(&paths, &profile, force, ui),
        Commands::Setdefault { profile } => commands::set_default(&paths, &profile, ui),
        Commands::Rename { old, new } => commands::rename(&paths, &old, &new, ui),
        Commands::Backup { dest } => commands::backup(&paths, dest.as_deref(), ui),
        Commands::Restore => commands::restore(&paths, ui),
        Commands::Completions { .. } => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ui = Ui::new(cli.color, cli.no_color);

    match run(cli, &ui) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui.err(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
