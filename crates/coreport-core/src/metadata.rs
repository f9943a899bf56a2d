use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info};

use crate::{IoResultExt, PortError, Result};

pub fn info_file(module_path: &Path, machine_name: &str) -> PathBuf {
    module_path.join(format!("{}.info.yml", machine_name))
}

/// Sets top-level `key: value` lines. Keys that are absent get appended,
/// using the file's own line ending.
pub fn set_keys(content: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let mut updated = content.to_string();
    for (key, value) in values {
        let line = Regex::new(&format!(r"(?mR)^{}:[^\r\n]*$", regex::escape(key)))
            .map_err(|e| PortError::configuration(e.to_string()))?;
        let replacement = format!("{}: {}", key, value);

        if line.is_match(&updated) {
            debug!("Setting {} in place", key);
            updated = line
                .replace_all(&updated, regex::NoExpand(&replacement))
                .into_owned();
        } else {
            debug!("Appending {}", key);
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push_str(newline);
            }
            updated.push_str(&replacement);
            updated.push_str(newline);
        }
    }
    Ok(updated)
}

pub fn update_info_file(module_path: &Path, machine_name: &str, values: &BTreeMap<String, String>) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    let path = info_file(module_path, machine_name);
    let content = fs::read_to_string(&path).at(&path)?;
    let updated = set_keys(&content, values)?;
    if updated != content {
        info!("Updating metadata in {:?}", path);
        fs::write(&path, updated).at(&path)?;
    }
    Ok(())
}
