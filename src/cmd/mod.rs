mod convert;
mod glob_util;
mod profile;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sqlite2mysql")]
#[command(version)]
#[command(about = "Rewrite SQLite dump files into MySQL-compatible dumps", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a SQLite dump into a MySQL dump
    Convert {
        /// Input SQLite dump or glob pattern (e.g., *.sql, dumps/**/*.sql)
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Output SQL file or directory (default: stdout for single file, required for glob)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML target profile (sizes, engine, charset, collation, database)
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Target database name used in the header and import command
        #[arg(long)]
        database: Option<String>,

        /// Skip the generated header comments
        #[arg(long)]
        no_header: bool,

        /// Show progress during conversion
        #[arg(short, long)]
        progress: bool,

        /// Preview without writing files (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Output statistics as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Stop on first file that fails (for glob patterns)
        #[arg(long)]
        fail_fast: bool,
    },

    /// Print the effective target profile as YAML
    Profile {
        /// YAML target profile to merge over the defaults
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Target database name override
        #[arg(long)]
        database: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Convert {
            file,
            output,
            profile,
            database,
            no_header,
            progress,
            dry_run,
            json,
            fail_fast,
        } => convert::run(
            file, output, profile, database, no_header, progress, dry_run, json, fail_fast,
        ),
        Commands::Profile { profile, database } => profile::run(profile, database),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "sqlite2mysql",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
