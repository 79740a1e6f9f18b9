use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uecfg::{ConfigDocument, NewlinePolicy};

/// Exit status when an edit found nothing to change.
const NO_MATCH: u8 = 2;

#[derive(Parser)]
#[command(name = "uecfg")]
#[command(about = "Edit Unreal Engine style INI files in place", version)]
struct Cli {
    /// Log every line an edit touches
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a file as it would be written
    Show { file: PathBuf },

    /// Print the value of a key
    Get {
        file: PathBuf,
        section: String,
        key: String,

        /// Printed when the key is missing
        #[arg(long, short, default_value = "")]
        default: String,
    },

    /// Set a key, adding it when missing
    Set {
        #[command(flatten)]
        target: Target,
        key: String,
        value: String,
    },

    /// Append a key to a section, even if it already exists
    Add {
        #[command(flatten)]
        target: Target,
        key: String,
        value: String,
    },

    /// Delete the first active entry for a key
    Remove {
        #[command(flatten)]
        target: Target,
        key: String,
    },

    /// Disable the first active entry for a key
    Comment {
        #[command(flatten)]
        target: Target,
        key: String,
    },

    /// Enable the first commented entry for a key
    Uncomment {
        #[command(flatten)]
        target: Target,
        key: String,
    },

    /// Replace text inside the first entry containing it
    Replace {
        #[command(flatten)]
        target: Target,
        pattern: String,
        replacement: String,

        /// Also search commented entries
        #[arg(long)]
        comments: bool,
    },
}

#[derive(Args)]
struct Target {
    file: PathBuf,
    section: String,

    /// Line endings to write
    #[arg(long, value_enum, default_value_t = Newline::Preserve)]
    newline: Newline,

    /// Print the result instead of writing it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Newline {
    Preserve,
    Lf,
    Crlf,
}

impl From<Newline> for NewlinePolicy {
    fn from(value: Newline) -> Self {
        match value {
            Newline::Preserve => Self::Preserve,
            Newline::Lf => Self::Lf,
            Newline::Crlf => Self::CrLf,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let level = if cli.verbose { "trace" } else { "warn" };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    match cli.command {
        Command::Show { file } => {
            print!("{}", load(&file)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Get {
            file,
            section,
            key,
            default,
        } => {
            let config = load(&file)?;
            println!("{}", config.get_key(&section, &key, &default));
            Ok(ExitCode::SUCCESS)
        }
        Command::Set { target, key, value } => edit(&target, |config, section| {
            config.set_key(section, &key, &value);
            true
        }),
        Command::Add { target, key, value } => {
            edit(&target, |config, section| config.add_key(section, &key, &value))
        }
        Command::Remove { target, key } => {
            edit(&target, |config, section| config.remove_key(section, &key))
        }
        Command::Comment { target, key } => {
            edit(&target, |config, section| config.comment_key(section, &key))
        }
        Command::Uncomment { target, key } => {
            edit(&target, |config, section| config.uncomment_key(section, &key))
        }
        Command::Replace {
            target,
            pattern,
            replacement,
            comments,
        } => edit(&target, |config, section| {
            config.replace_value_by_substring_search(section, &pattern, &replacement, comments)
        }),
    }
}

fn load(file: &Path) -> anyhow::Result<ConfigDocument> {
    let mut config = ConfigDocument::new();
    config
        .read_file(file)
        .with_context(|| format!("failed to load {}", file.display()))?;

    Ok(config)
}

fn edit<F>(target: &Target, apply: F) -> anyhow::Result<ExitCode>
where
    F: FnOnce(&mut ConfigDocument, &str) -> bool,
{
    let mut config = load(&target.file)?;

    if !apply(&mut config, &target.section) {
        eprintln!("no match in [{}]", target.section);
        return Ok(ExitCode::from(NO_MATCH));
    }

    let newline = NewlinePolicy::from(target.newline);

    if target.dry_run {
        print!("{config}");
    } else if config.is_changed() || newline != NewlinePolicy::Preserve {
        config
            .write_file_with(&target.file, newline)
            .with_context(|| format!("failed to save {}", target.file.display()))?;
        info!(file = %target.file.display(), "saved");
    }

    Ok(ExitCode::SUCCESS)
}
