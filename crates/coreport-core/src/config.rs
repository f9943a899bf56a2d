use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use convert_case::{Case, Casing};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::{IoResultExt, PortError, Result};

const REQUIRED_SETTINGS: [&str; 3] = ["core_mr_branch", "contrib_dir", "core_dir"];

/// A literal `search` -> `replace` substitution applied to paths and contents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenameRule {
    pub search: String,
    pub replace: String,
}

impl RenameRule {
    pub fn new(search: &str, replace: &str) -> Result<Self> {
        let rule = Self {
            search: search.to_string(),
            replace: replace.to_string(),
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Parses the `SEARCH=REPLACE` form used on the command line.
    pub fn parse(spec: &str) -> Result<Self> {
        match spec.split_once('=') {
            Some((search, replace)) => Self::new(search, replace),
            None => Err(PortError::configuration(format!(
                "Rule '{}' must have the form SEARCH=REPLACE",
                spec
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.search.is_empty() {
            return Err(PortError::configuration(format!(
                "Rule with replacement '{}' has an empty search string",
                self.replace
            )));
        }
        Ok(())
    }
}

/// Settings as they appear in `config.yml`, before defaults and validation.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    core_dir: Option<PathBuf>,
    contrib_dir: Option<PathBuf>,
    core_mr_branch: Option<String>,
    contrib_branch: Option<String>,
    old_machine_name: Option<String>,
    new_machine_name: Option<String>,
    modules_dir: Option<PathBuf>,
    removals: Option<Vec<String>>,
    #[serde(default)]
    replacements: Vec<RenameRule>,
    metadata: Option<BTreeMap<String, String>>,
    dictionary_file: Option<PathBuf>,
    #[serde(default)]
    dictionary_words: Vec<String>,
    check_script: Option<PathBuf>,
    check_branch: Option<String>,
    contrib_commit_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub core_dir: PathBuf,
    pub contrib_dir: PathBuf,
    pub core_mr_branch: String,
    pub contrib_branch: String,
    pub old_machine_name: String,
    pub new_machine_name: String,
    pub modules_dir: PathBuf,
    pub removals: Vec<String>,
    pub replacements: Vec<RenameRule>,
    pub metadata: BTreeMap<String, String>,
    pub dictionary_file: PathBuf,
    pub dictionary_words: Vec<String>,
    pub check_script: PathBuf,
    pub check_branch: String,
    pub contrib_commit_url: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", path);
        let content = fs::read_to_string(path).at(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(yaml)
            .map_err(|e| PortError::configuration(format!("Invalid configuration: {}", e)))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let present = [
            raw.core_mr_branch.is_some(),
            raw.contrib_dir.is_some(),
            raw.core_dir.is_some(),
        ];
        let missing: Vec<&str> = REQUIRED_SETTINGS
            .iter()
            .zip(present)
            .filter(|(_, found)| !found)
            .map(|(key, _)| *key)
            .collect();
        let (Some(core_dir), Some(contrib_dir), Some(core_mr_branch)) =
            (raw.core_dir, raw.contrib_dir, raw.core_mr_branch)
        else {
            return Err(PortError::configuration(format!(
                "Missing settings: {}",
                missing.join(", ")
            )));
        };

        let config = Self {
            core_dir,
            contrib_dir,
            core_mr_branch,
            contrib_branch: raw.contrib_branch.unwrap_or_else(|| "8.x-2.x".to_string()),
            old_machine_name: raw
                .old_machine_name
                .unwrap_or_else(|| "automatic_updates".to_string()),
            new_machine_name: raw
                .new_machine_name
                .unwrap_or_else(|| "auto_updates".to_string()),
            modules_dir: raw.modules_dir.unwrap_or_else(|| PathBuf::from("core/modules")),
            removals: raw.removals.unwrap_or_else(|| {
                vec![
                    "automatic_updates_9_3_shim".to_string(),
                    "drupalci.yml".to_string(),
                    "README.md".to_string(),
                ]
            }),
            replacements: raw.replacements,
            metadata: raw.metadata.unwrap_or_else(|| {
                BTreeMap::from([
                    ("package".to_string(), "Core".to_string()),
                    ("version".to_string(), "VERSION".to_string()),
                ])
            }),
            dictionary_file: raw
                .dictionary_file
                .unwrap_or_else(|| PathBuf::from("core/misc/cspell/dictionary.txt")),
            dictionary_words: raw.dictionary_words,
            check_script: raw
                .check_script
                .unwrap_or_else(|| PathBuf::from("core/scripts/dev/commit-code-check.sh")),
            check_branch: raw.check_branch.unwrap_or_else(|| "9.4.x".to_string()),
            contrib_commit_url: raw.contrib_commit_url.unwrap_or_else(|| {
                "https://git.drupalcode.org/project/automatic_updates/-/commit".to_string()
            }),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let machine_name = Regex::new(r"^[a-z][a-z0-9_]*$")
            .map_err(|e| PortError::configuration(e.to_string()))?;
        for (key, value) in [
            ("old_machine_name", &self.old_machine_name),
            ("new_machine_name", &self.new_machine_name),
        ] {
            if !machine_name.is_match(value) {
                return Err(PortError::configuration(format!(
                    "{} '{}' is not a valid machine name (lowercase letters, digits and underscores)",
                    key, value
                )));
            }
        }
        for rule in &self.replacements {
            rule.validate()?;
        }
        Ok(())
    }

    /// Where the contrib module lands inside the core checkout.
    pub fn core_module_path(&self) -> PathBuf {
        self.core_dir
            .join(&self.modules_dir)
            .join(&self.new_machine_name)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.core_dir.join(&self.dictionary_file)
    }

    /// The ordered rules for the port: machine name, its PascalCase form, then
    /// any configured extras.
    pub fn rules(&self) -> Vec<RenameRule> {
        let mut rules = vec![RenameRule {
            search: self.old_machine_name.clone(),
            replace: self.new_machine_name.clone(),
        }];

        let old_pascal = self.old_machine_name.to_case(Case::Pascal);
        let new_pascal = self.new_machine_name.to_case(Case::Pascal);
        if old_pascal != self.old_machine_name {
            debug!("Class name mapping: {} -> {}", old_pascal, new_pascal);
            rules.push(RenameRule {
                search: old_pascal,
                replace: new_pascal,
            });
        }

        rules.extend(self.replacements.iter().cloned());
        rules
    }
}
