//! The end-to-end port: branch checkout, copy, rename, metadata, dictionary,
//! validation and commit. Every step is fatal on error.

use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::renamer::{self, RenameOptions, RenameReport};
use crate::runner::CommandRunner;
use crate::{dictionary, git, metadata, tree, PortError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct PortOptions {
    pub skip_branches: bool,
    pub skip_checks: bool,
    pub skip_commit: bool,
}

#[derive(Debug, Default, Clone)]
pub struct PortReport {
    pub files_copied: usize,
    pub rename: RenameReport,
    pub words_added: usize,
    pub commit_message: Option<String>,
}

pub struct Porter<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
}

impl<'a> Porter<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    pub fn port(&self, options: PortOptions) -> Result<PortReport> {
        self.port_with(options, |_| Ok(true))
    }

    /// Runs the port. `confirm_replace` is asked, after the branches are
    /// checked out, whether an existing core module may be deleted.
    pub fn port_with<F>(&self, options: PortOptions, confirm_replace: F) -> Result<PortReport>
    where
        F: FnOnce(&Path) -> Result<bool>,
    {
        let config = self.config;
        let module_path = config.core_module_path();
        let mut report = PortReport::default();

        if options.skip_branches {
            warn!("Skipping branch checkout");
        } else {
            self.switch_to_branches()?;
        }

        if module_path.symlink_metadata().is_ok() && !confirm_replace(&module_path)? {
            return Err(PortError::Cancelled {
                message: format!("kept existing module at {:?}", module_path),
            });
        }
        tree::remove_all(&module_path)?;
        report.files_copied = tree::mirror(&config.contrib_dir, &module_path)?;
        tree::remove_entries(&module_path, &config.removals)?;

        report.rename = renamer::process_directory(&module_path, &config.rules(), RenameOptions::default())?;

        metadata::update_info_file(&module_path, &config.new_machine_name, &config.metadata)?;
        report.words_added = self.add_words_to_dictionary(&config.dictionary_words)?;

        if options.skip_checks {
            warn!("Skipping core checks");
        } else {
            self.run_core_checks()?;
        }

        if options.skip_commit {
            warn!("Skipping commit");
        } else {
            report.commit_message = Some(self.make_commit()?);
        }

        info!(
            "Port complete: {} files copied, {} paths renamed, {} content changes",
            report.files_copied, report.rename.paths_renamed, report.rename.content_changes
        );
        Ok(report)
    }

    pub fn switch_to_branches(&self) -> Result<()> {
        git::switch_to_branch(self.runner, &self.config.contrib_dir, &self.config.contrib_branch)?;
        git::switch_to_branch(self.runner, &self.config.core_dir, &self.config.core_mr_branch)
    }

    pub fn add_words_to_dictionary(&self, words: &[String]) -> Result<usize> {
        if words.is_empty() {
            return Ok(0);
        }
        dictionary::add_words(&self.config.dictionary_path(), words)
    }

    pub fn run_core_checks(&self) -> Result<()> {
        let script = format!("./{}", self.config.check_script.display());
        info!("Running {}", script);
        self.runner.run_checked(
            &self.config.core_dir,
            "sh",
            &[script.as_str(), "--branch", self.config.check_branch.as_str()],
        )?;
        info!("{} passed", script);
        Ok(())
    }

    /// Commits the core tree, referencing the contrib commit it was built from.
    pub fn make_commit(&self) -> Result<String> {
        let config = self.config;
        git::ensure_clean(self.runner, &config.contrib_dir)?;
        let hash = git::head_commit(self.runner, &config.contrib_dir)?;

        let message = format!(
            "Update to commit from contrib {} {}/{}",
            config.contrib_branch,
            config.contrib_commit_url.trim_end_matches('/'),
            hash
        );
        git::commit_all(self.runner, &config.core_dir, "core", &message)?;
        Ok(message)
    }
}
