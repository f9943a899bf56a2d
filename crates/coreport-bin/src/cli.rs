use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "coreport")]
#[command(version)]
#[command(about = "Port a contributed module into a core checkout")]
#[command(long_about = "A CLI tool that copies a contributed module into a monorepo's core directory, renames it to its new machine name, updates metadata and the spell-check dictionary, validates the result and commits it.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the full port described by the configuration file")]
    Port {
        #[arg(short, long, default_value = "config.yml", help = "Path to the YAML configuration")]
        config: PathBuf,

        #[arg(short, long, help = "Replace an existing core module without asking")]
        yes: bool,

        #[arg(long, help = "Do not check out the configured branches")]
        skip_branches: bool,

        #[arg(long, help = "Do not run the core validation script")]
        skip_checks: bool,

        #[arg(long, help = "Leave the result uncommitted")]
        no_commit: bool,
    },

    #[command(about = "Rename paths and contents under a directory")]
    Rename {
        #[arg(help = "Target directory")]
        target: PathBuf,

        #[arg(short, long = "rule", required = true, value_name = "SEARCH=REPLACE", help = "Replacement rule, applied in the order given")]
        rules: Vec<String>,

        #[arg(short, long, help = "Rename file and directory names")]
        path: bool,

        #[arg(short, long, help = "Rewrite file contents")]
        contents: bool,

        #[arg(long, help = "Perform a dry run without making changes")]
        dry_run: bool,

        #[arg(short, long, help = "Interactive mode - prompt for each change")]
        interactive: bool,
    },

    #[command(about = "Add words to the core spell-check dictionary")]
    AddWords {
        #[arg(short, long, default_value = "config.yml", help = "Path to the YAML configuration")]
        config: PathBuf,

        #[arg(required = true, help = "Words to add")]
        words: Vec<String>,
    },

    #[command(about = "Run the core validation script")]
    Check {
        #[arg(short, long, default_value = "config.yml", help = "Path to the YAML configuration")]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
