mod cli;
mod preview;

use anyhow::{Context, Result};
use cli::{Cli, Commands};
use coreport_core::renamer::{self, RenameOptions};
use coreport_core::{Config, PortOptions, Porter, RenameRule, SystemRunner};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    setup_logging(&cli)?;

    info!("Starting coreport");

    match cli.command {
        Commands::Port {
            config,
            yes,
            skip_branches,
            skip_checks,
            no_commit,
        } => {
            let options = PortOptions {
                skip_branches,
                skip_checks,
                skip_commit: no_commit,
            };
            handle_port_command(&config, yes, options)?;
        }
        Commands::Rename {
            target,
            rules,
            path,
            contents,
            dry_run,
            interactive,
        } => {
            // Validate that at least one of -p or -c is specified
            let (path, contents) = if !path && !contents {
                use inquire::Confirm;

                let enable_path = Confirm::new("Enable path renaming (-p)?")
                    .with_default(true)
                    .prompt()?;

                let enable_contents = Confirm::new("Enable contents rewriting (-c)?")
                    .with_default(true)
                    .prompt()?;

                if !enable_path && !enable_contents {
                    anyhow::bail!("At least one of --path (-p) or --contents (-c) must be enabled");
                }
                (enable_path, enable_contents)
            } else {
                (path, contents)
            };

            let options = RenameOptions {
                process_paths: path,
                process_contents: contents,
                dry_run,
            };
            handle_rename_command(target, &rules, options, interactive)?;
        }
        Commands::AddWords { config, words } => {
            handle_add_words_command(&config, &words)?;
        }
        Commands::Check { config } => {
            handle_check_command(&config)?;
        }
    }

    info!("Coreport completed successfully");
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load configuration from {:?}", path))
}

fn handle_port_command(config_path: &Path, yes: bool, options: PortOptions) -> Result<()> {
    let config = load_config(config_path)?;
    let module_path = config.core_module_path();

    info!("Contrib directory: {:?}", config.contrib_dir);
    info!("Core module path: {:?}", module_path);

    // Asked after the branch checkout, so the prompt sees the MR branch's tree.
    let runner = SystemRunner;
    let report = Porter::new(&config, &runner)
        .port_with(options, |path| {
            if yes {
                return Ok(true);
            }
            preview::confirm_replace_module(path).map_err(into_port_error)
        })
        .context("Port failed")?;

    println!("Port complete!");
    println!("  Files copied: {}", report.files_copied);
    println!("  Paths renamed: {}", report.rename.paths_renamed);
    println!("  Content changes: {}", report.rename.content_changes);
    println!("  Dictionary words added: {}", report.words_added);
    if let Some(message) = report.commit_message {
        println!("  Committed: {}", message);
    }

    Ok(())
}

fn handle_rename_command(
    target: PathBuf,
    rule_specs: &[String],
    options: RenameOptions,
    interactive: bool,
) -> Result<()> {
    let rules = rule_specs
        .iter()
        .map(|spec| RenameRule::parse(spec))
        .collect::<Result<Vec<_>, _>>()?;

    info!("Target directory: {:?}", target);
    info!("Path renaming: {}", options.process_paths);
    info!("Contents rewriting: {}", options.process_contents);
    info!("Interactive mode: {}", interactive);

    if options.dry_run {
        warn!("Dry run mode - no changes will be made");
        if rules.len() > 1 {
            warn!("Dry run plans every rule against the unchanged tree");
        }
    }

    if !target.is_dir() {
        anyhow::bail!("Target must be an existing directory: {:?}", target);
    }

    let result = if interactive {
        renamer::process_directory_with(
            &target,
            &rules,
            options,
            |path, old, new| preview::confirm_content_change(path, old, new).map_err(into_port_error),
            |rename, change_type| preview::confirm_path_change(rename, change_type).map_err(into_port_error),
        )?
    } else {
        renamer::process_directory(&target, &rules, options)?
    };

    println!("Renaming complete!");
    println!("  Files processed: {}", result.files_processed);
    println!("  Paths renamed: {}", result.paths_renamed);
    println!("  Content changes: {}", result.content_changes);
    println!("  Replacements: {}", result.replacements);

    Ok(())
}

fn handle_add_words_command(config_path: &Path, words: &[String]) -> Result<()> {
    let config = load_config(config_path)?;
    let runner = SystemRunner;
    let added = Porter::new(&config, &runner).add_words_to_dictionary(words)?;

    println!("Added {} words to {}", added, config.dictionary_path().display());
    Ok(())
}

fn handle_check_command(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let runner = SystemRunner;

    match Porter::new(&config, &runner).run_core_checks() {
        Ok(()) => {
            println!("🎉 {} passed!", config.check_script.display());
            Ok(())
        }
        Err(err) => {
            println!("😭 {} failed", config.check_script.display());
            Err(err.into())
        }
    }
}

/// Prompt failures (including Ctrl-C) abort the run like any other error.
fn into_port_error(err: anyhow::Error) -> coreport_core::PortError {
    coreport_core::PortError::Cancelled {
        message: format!("{:#}", err),
    }
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact()
        )
        .with(filter)
        .init();

    Ok(())
}
