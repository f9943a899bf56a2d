//! Path and content renaming for a single [`RenameRule`], and the sequential
//! driver that applies an ordered list of rules to a directory tree.
//!
//! Path renames only touch the base name of an entry. All candidates are
//! collected before anything moves; files are renamed before directories so
//! that file targets computed from the old directory path stay valid.
//!
//! Nested directories that both contain the search string (for example
//! `old_a/old_b/`) are not supported: the parent is renamed first and the
//! child's recorded source path no longer exists, which surfaces as a
//! filesystem error.
//!
//! The walk root itself is never renamed, only the entries below it, so a
//! caller's handle on the root stays valid across rules.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use regex::bytes::{NoExpand, Regex};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::RenameRule;
use crate::{IoResultExt, PortError, Result};

#[derive(Debug, Clone, Copy)]
pub struct RenameOptions {
    pub process_paths: bool,
    pub process_contents: bool,
    pub dry_run: bool,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            process_paths: true,
            process_contents: true,
            dry_run: false,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenameReport {
    pub files_processed: usize,
    pub paths_renamed: usize,
    pub content_changes: usize,
    pub replacements: usize,
}

impl RenameReport {
    pub fn absorb(&mut self, other: &RenameReport) {
        self.files_processed += other.files_processed;
        self.paths_renamed += other.paths_renamed;
        self.content_changes += other.content_changes;
        self.replacements += other.replacements;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Renames collected from one walk of the tree, split by entry kind.
#[derive(Debug, Default, Clone)]
pub struct RenamePlan {
    pub files: Vec<PendingRename>,
    pub directories: Vec<PendingRename>,
}

impl RenamePlan {
    pub fn len(&self) -> usize {
        self.files.len() + self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every pending rename the predicate rejects.
    pub fn retain<F>(&mut self, mut keep: F) -> Result<()>
    where
        F: FnMut(&PendingRename, &str) -> Result<bool>,
    {
        let mut files = Vec::with_capacity(self.files.len());
        for rename in self.files.drain(..) {
            if keep(&rename, "File")? {
                files.push(rename);
            }
        }
        let mut directories = Vec::with_capacity(self.directories.len());
        for rename in self.directories.drain(..) {
            if keep(&rename, "Directory")? {
                directories.push(rename);
            }
        }
        self.files = files;
        self.directories = directories;
        Ok(())
    }

    /// Applies file renames, then directory renames. Stops at the first failure.
    pub fn apply(&self) -> Result<usize> {
        for rename in self.files.iter().chain(&self.directories) {
            move_entry(rename)?;
        }
        Ok(self.len())
    }
}

fn move_entry(rename: &PendingRename) -> Result<()> {
    if rename.to.symlink_metadata().is_ok() {
        return Err(PortError::DestinationExists {
            from: rename.from.clone(),
            to: rename.to.clone(),
        });
    }
    info!("Renaming: {:?} -> {:?}", rename.from, rename.to);
    fs::rename(&rename.from, &rename.to).at(&rename.from)
}

pub struct Renamer {
    rule: RenameRule,
    pattern: Regex,
}

impl Renamer {
    pub fn new(rule: &RenameRule) -> Result<Self> {
        if rule.search.is_empty() {
            return Err(PortError::configuration("Search string must not be empty"));
        }
        let pattern = Regex::new(&regex::escape(&rule.search))
            .map_err(|e| PortError::configuration(e.to_string()))?;
        Ok(Self {
            rule: rule.clone(),
            pattern,
        })
    }

    /// Returns the new base name when the entry's base name contains the
    /// search string. Names are matched as raw bytes, so names that are not
    /// valid UTF-8 are renamed too.
    pub fn rename_base_name(&self, path: &Path) -> Result<Option<OsString>> {
        let Some(name) = path.file_name() else {
            return Ok(None);
        };
        let new_name = self.replace_in_name(path, name)?;
        if let Some(new_name) = &new_name {
            debug!(
                "Path replacement: '{}' -> '{}'",
                name.to_string_lossy(),
                new_name.to_string_lossy()
            );
        }
        Ok(new_name)
    }

    #[cfg(unix)]
    fn replace_in_name(&self, _path: &Path, name: &OsStr) -> Result<Option<OsString>> {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        Ok(self
            .replace_bytes(name.as_bytes())
            .map(|(bytes, _)| OsString::from_vec(bytes)))
    }

    #[cfg(not(unix))]
    fn replace_in_name(&self, path: &Path, name: &OsStr) -> Result<Option<OsString>> {
        let Some(name) = name.to_str() else {
            return Err(PortError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
            ));
        };
        Ok(name
            .contains(&self.rule.search)
            .then(|| OsString::from(name.replace(&self.rule.search, &self.rule.replace))))
    }

    /// Literal replacement over raw bytes. Returns the new content and the
    /// number of occurrences replaced, or `None` when nothing matched.
    pub fn replace_bytes(&self, content: &[u8]) -> Option<(Vec<u8>, usize)> {
        let count = self.pattern.find_iter(content).count();
        if count == 0 {
            return None;
        }
        let replaced = self
            .pattern
            .replace_all(content, NoExpand(self.rule.replace.as_bytes()))
            .into_owned();
        debug!("Content replacement: found {} occurrences", count);
        Some((replaced, count))
    }

    /// Walks everything below `root` (not `root` itself) and records renames.
    pub fn plan_renames(&self, root: &Path) -> Result<RenamePlan> {
        let mut plan = RenamePlan::default();
        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            let Some(new_name) = self.rename_base_name(path)? else {
                continue;
            };
            let Some(parent) = path.parent() else {
                continue;
            };
            let rename = PendingRename {
                from: path.to_path_buf(),
                to: parent.join(new_name),
            };
            if entry.file_type().is_dir() {
                plan.directories.push(rename);
            } else {
                plan.files.push(rename);
            }
        }
        debug!(
            "Planned {} file and {} directory renames for '{}'",
            plan.files.len(),
            plan.directories.len(),
            self.rule.search
        );
        Ok(plan)
    }

    pub fn rename_paths(&self, root: &Path, dry_run: bool) -> Result<RenameReport> {
        self.rename_paths_with(root, dry_run, |_, _| Ok(true))
    }

    pub fn rename_paths_with<G>(&self, root: &Path, dry_run: bool, confirm: G) -> Result<RenameReport>
    where
        G: FnMut(&PendingRename, &str) -> Result<bool>,
    {
        let mut plan = self.plan_renames(root)?;
        plan.retain(confirm)?;

        let paths_renamed = if dry_run {
            for rename in plan.files.iter().chain(&plan.directories) {
                info!("Would rename: {:?} -> {:?}", rename.from, rename.to);
            }
            plan.len()
        } else {
            plan.apply()?
        };

        Ok(RenameReport {
            paths_renamed,
            ..RenameReport::default()
        })
    }

    pub fn replace_contents(&self, root: &Path, dry_run: bool) -> Result<RenameReport> {
        self.replace_contents_with(root, dry_run, |_, _, _| Ok(true))
    }

    /// Rewrites every regular file under `root`. `confirm` sees the old and new
    /// bytes and decides whether the file is written.
    pub fn replace_contents_with<F>(&self, root: &Path, dry_run: bool, mut confirm: F) -> Result<RenameReport>
    where
        F: FnMut(&Path, &[u8], &[u8]) -> Result<bool>,
    {
        let mut report = RenameReport::default();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            report.files_processed += 1;

            let content = fs::read(path).at(path)?;
            let Some((new_content, count)) = self.replace_bytes(&content) else {
                continue;
            };
            if !confirm(path, &content, &new_content)? {
                debug!("Skipped content change in: {:?}", path);
                continue;
            }
            if dry_run {
                info!("Would update contents of: {:?}", path);
            } else {
                info!("Updating contents of: {:?}", path);
                fs::write(path, new_content).at(path)?;
            }
            report.content_changes += 1;
            report.replacements += count;
        }
        Ok(report)
    }
}

/// Applies `rules` in order. Each rule renames paths first, then rewrites
/// contents, before the next rule sees the tree.
pub fn process_directory(root: &Path, rules: &[RenameRule], options: RenameOptions) -> Result<RenameReport> {
    process_directory_with(root, rules, options, |_, _, _| Ok(true), |_, _| Ok(true))
}

pub fn process_directory_with<F, G>(
    root: &Path,
    rules: &[RenameRule],
    options: RenameOptions,
    mut content_callback: F,
    mut path_callback: G,
) -> Result<RenameReport>
where
    F: FnMut(&Path, &[u8], &[u8]) -> Result<bool>,
    G: FnMut(&PendingRename, &str) -> Result<bool>,
{
    if !root.is_dir() {
        return Err(PortError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "target must be an existing directory"),
        ));
    }

    info!("Starting directory processing: {:?}", root);
    let mut report = RenameReport::default();

    for rule in rules {
        let renamer = Renamer::new(rule)?;
        info!("Applying rule: '{}' -> '{}'", rule.search, rule.replace);

        if options.process_paths {
            let step = renamer.rename_paths_with(root, options.dry_run, &mut path_callback)?;
            report.absorb(&step);
        }
        if options.process_contents {
            let step = renamer.replace_contents_with(root, options.dry_run, &mut content_callback)?;
            report.absorb(&step);
        }
    }

    info!(
        "Processing complete: {} files processed, {} paths renamed, {} content changes",
        report.files_processed, report.paths_renamed, report.content_changes
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn tree(root: &Path) -> BTreeSet<String> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| {
                let e = e.unwrap();
                e.path()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn rule(search: &str, replace: &str) -> RenameRule {
        RenameRule::new(search, replace).unwrap()
    }

    #[test]
    fn test_base_name_replacement() {
        let renamer = Renamer::new(&rule("old", "new")).unwrap();

        assert_eq!(
            renamer
                .rename_base_name(Path::new("/some/old_dir/old_file_old.txt"))
                .unwrap(),
            Some(OsString::from("new_file_new.txt"))
        );
        assert_eq!(
            renamer.rename_base_name(Path::new("/some/old_dir/file.txt")).unwrap(),
            None
        );
    }

    #[test]
    fn test_replace_bytes_is_literal() {
        let renamer = Renamer::new(&rule("a.c", "x")).unwrap();

        let (content, count) = renamer.replace_bytes(b"a.c abc a.c").unwrap();
        assert_eq!(content, b"x abc x");
        assert_eq!(count, 2);

        assert!(renamer.replace_bytes(b"abc").is_none());
    }

    #[test]
    fn test_replacement_text_is_not_expanded() {
        let renamer = Renamer::new(&rule("name", "$1 ${x}")).unwrap();

        let (content, _) = renamer.replace_bytes(b"name").unwrap();
        assert_eq!(content, b"$1 ${x}");
    }

    #[test]
    fn test_rename_files_and_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "foo/bar_old.txt", "one");
        write(dir.path(), "foo_old/baz.txt", "two");

        let renamer = Renamer::new(&rule("old", "new")).unwrap();
        let report = renamer.rename_paths(dir.path(), false).unwrap();

        assert_eq!(report.paths_renamed, 2);
        assert_eq!(
            tree(dir.path()),
            BTreeSet::from([
                "foo".to_string(),
                "foo/bar_new.txt".to_string(),
                "foo_new".to_string(),
                "foo_new/baz.txt".to_string(),
            ])
        );
        assert_eq!(fs::read_to_string(dir.path().join("foo_new/baz.txt")).unwrap(), "two");
    }

    #[test]
    fn test_files_inside_renamed_directory_are_renamed_first() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/old_mod/old_mod.rs", "");
        write(dir.path(), "src/old_mod/helper_old.rs", "");

        let renamer = Renamer::new(&rule("old", "new")).unwrap();
        let plan = renamer.plan_renames(dir.path()).unwrap();
        assert_eq!(plan.files.len(), 2);
        assert_eq!(plan.directories.len(), 1);
        assert_eq!(plan.files[0].to, dir.path().join("src/old_mod/helper_new.rs"));

        plan.apply().unwrap();

        let names = tree(dir.path());
        assert!(names.contains("src/new_mod/new_mod.rs"));
        assert!(names.contains("src/new_mod/helper_new.rs"));
        assert!(names.iter().all(|name| !name.rsplit('/').next().unwrap().contains("old")));
    }

    #[test]
    fn test_root_is_never_renamed() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("old_root");
        write(&root, "old.txt", "");

        let renamer = Renamer::new(&rule("old", "new")).unwrap();
        renamer.rename_paths(&root, false).unwrap();

        assert!(root.join("new.txt").exists());
    }

    #[test]
    fn test_rename_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a_old.txt", "source");
        write(dir.path(), "a_new.txt", "existing");

        let renamer = Renamer::new(&rule("old", "new")).unwrap();
        let result = renamer.rename_paths(dir.path(), false);

        assert!(matches!(result, Err(PortError::DestinationExists { .. })));
        assert_eq!(fs::read_to_string(dir.path().join("a_new.txt")).unwrap(), "existing");
        assert!(dir.path().join("a_old.txt").exists());
    }

    #[test]
    fn test_nested_matching_directories_fail() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "old_a/old_b/file.txt", "");

        let renamer = Renamer::new(&rule("old", "new")).unwrap();
        let result = renamer.rename_paths(dir.path(), false);

        assert!(matches!(result, Err(PortError::Filesystem { .. })));
    }

    #[test]
    fn test_dry_run_leaves_tree_untouched() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "old.txt", "old old");

        let renamer = Renamer::new(&rule("old", "new")).unwrap();
        let paths = renamer.rename_paths(dir.path(), true).unwrap();
        let contents = renamer.replace_contents(dir.path(), true).unwrap();

        assert_eq!(paths.paths_renamed, 1);
        assert_eq!(contents.content_changes, 1);
        assert_eq!(contents.replacements, 2);
        assert_eq!(fs::read_to_string(dir.path().join("old.txt")).unwrap(), "old old");
    }

    #[test]
    fn test_content_replacement_keeps_surrounding_bytes() {
        let dir = TempDir::new().unwrap();
        let original = "namespace Drupal\\automatic_updates;\n// automatic_updates\nautomatic_updates.settings: x\n";
        write(dir.path(), "src/Service.php", original);

        let renamer = Renamer::new(&rule("automatic_updates", "auto_updates")).unwrap();
        let report = renamer.replace_contents(dir.path(), false).unwrap();

        let updated = fs::read_to_string(dir.path().join("src/Service.php")).unwrap();
        assert_eq!(report.replacements, 3);
        assert_eq!(updated.matches("automatic_updates").count(), 0);
        assert_eq!(
            updated,
            "namespace Drupal\\auto_updates;\n// auto_updates\nauto_updates.settings: x\n"
        );
        let delta = 3 * ("automatic_updates".len() - "auto_updates".len());
        assert_eq!(original.len() - updated.len(), delta);
    }

    #[test]
    fn test_content_replacement_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "old and old");

        let renamer = Renamer::new(&rule("old", "new")).unwrap();
        let first = renamer.replace_contents(dir.path(), false).unwrap();
        let second = renamer.replace_contents(dir.path(), false).unwrap();

        assert_eq!(first.content_changes, 1);
        assert_eq!(second.content_changes, 0);
        assert_eq!(second.files_processed, 1);
    }

    #[test]
    fn test_binary_content_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.bin");
        fs::write(&path, [0xff, 0xfe, b'o', b'l', b'd', 0x00]).unwrap();

        let renamer = Renamer::new(&rule("old", "new")).unwrap();
        renamer.replace_contents(dir.path(), false).unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![0xff, 0xfe, b'n', b'e', b'w', 0x00]);
    }

    #[test]
    fn test_content_callback_can_reject() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "keep.txt", "old");
        write(dir.path(), "change.txt", "old");

        let renamer = Renamer::new(&rule("old", "new")).unwrap();
        let report = renamer
            .replace_contents_with(dir.path(), false, |path, _, _| {
                Ok(path.file_name().unwrap() == "change.txt")
            })
            .unwrap();

        assert_eq!(report.content_changes, 1);
        assert_eq!(fs::read_to_string(dir.path().join("keep.txt")).unwrap(), "old");
        assert_eq!(fs::read_to_string(dir.path().join("change.txt")).unwrap(), "new");
    }

    #[test]
    fn test_rules_apply_in_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "automatic_updates.info.yml", "AutomaticUpdates automatic_updates");
        write(dir.path(), "src/AutomaticUpdatesHooks.php", "class AutomaticUpdatesHooks {}");

        let rules = vec![
            rule("automatic_updates", "auto_updates"),
            rule("AutomaticUpdates", "AutoUpdates"),
        ];
        let report = process_directory(dir.path(), &rules, RenameOptions::default()).unwrap();

        assert_eq!(report.paths_renamed, 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("auto_updates.info.yml")).unwrap(),
            "AutoUpdates auto_updates"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("src/AutoUpdatesHooks.php")).unwrap(),
            "class AutoUpdatesHooks {}"
        );
    }

    #[test]
    fn test_chained_rules_are_not_rescanned() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "a");

        let rules = vec![rule("a", "b"), rule("b", "ab")];
        process_directory(dir.path(), &rules, RenameOptions::default()).unwrap();

        // Second rule sees "b" once and writes "ab"; it does not loop on its own output.
        assert_eq!(fs::read_to_string(dir.path().join("ab.txt")).unwrap(), "ab");
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = process_directory(
            &dir.path().join("missing"),
            &[rule("a", "b")],
            RenameOptions::default(),
        );
        assert!(matches!(result, Err(PortError::Filesystem { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_renamed() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let dir = TempDir::new().unwrap();
        let name = OsString::from_vec(b"old_\xff.txt".to_vec());
        fs::write(dir.path().join(&name), "old").unwrap();

        let renamer = Renamer::new(&rule("old", "new")).unwrap();
        let report = renamer.rename_paths(dir.path(), false).unwrap();

        assert_eq!(report.paths_renamed, 1);
        let names: Vec<Vec<u8>> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().as_bytes().to_vec())
            .collect();
        assert_eq!(names, vec![b"new_\xff.txt".to_vec()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_renamed_not_followed() {
        use std::os::unix::fs::symlink;

        let outside = TempDir::new().unwrap();
        write(outside.path(), "content.txt", "old value");
        write(outside.path(), "data/old_inner.txt", "old inner");

        let dir = TempDir::new().unwrap();
        symlink(outside.path().join("content.txt"), dir.path().join("link_old.txt")).unwrap();
        symlink(outside.path().join("data"), dir.path().join("dir_link_old")).unwrap();

        let report = process_directory(dir.path(), &[rule("old", "new")], RenameOptions::default()).unwrap();

        assert_eq!(report.paths_renamed, 2);
        assert_eq!(report.content_changes, 0);
        assert_eq!(report.files_processed, 0);

        let file_link = dir.path().join("link_new.txt");
        let dir_link = dir.path().join("dir_link_new");
        assert!(file_link.symlink_metadata().unwrap().file_type().is_symlink());
        assert!(dir_link.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&file_link).unwrap(), outside.path().join("content.txt"));
        assert_eq!(fs::read_link(&dir_link).unwrap(), outside.path().join("data"));

        assert_eq!(
            fs::read_to_string(outside.path().join("content.txt")).unwrap(),
            "old value"
        );
        assert_eq!(
            fs::read_to_string(outside.path().join("data/old_inner.txt")).unwrap(),
            "old inner"
        );
    }
}
