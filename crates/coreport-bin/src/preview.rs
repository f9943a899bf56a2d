use anyhow::Result;
use coreport_core::PendingRename;
use inquire::Confirm;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;
use std::path::Path;

/// Renders a coloured line diff, or `None` when the texts are equal line by line.
pub fn render_diff(old_content: &str, new_content: &str) -> Result<Option<String>> {
    let diff = TextDiff::from_lines(old_content, new_content);
    let mut output = String::new();
    let mut has_changes = false;

    for (i, group) in diff.grouped_ops(3).iter().enumerate() {
        if i > 0 {
            writeln!(output, "{:-^1$}", "", 40)?;
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let (sign, style) = match change.tag() {
                    ChangeTag::Delete => ("- ", "\x1b[31m"),
                    ChangeTag::Insert => ("+ ", "\x1b[32m"),
                    ChangeTag::Equal => ("  ", "\x1b[0m"),
                };
                write!(output, "{}{}{}\x1b[0m", style, sign, change.value())?;
                if change.missing_newline() {
                    writeln!(output)?;
                }
                if change.tag() != ChangeTag::Equal {
                    has_changes = true;
                }
            }
        }
    }

    Ok(has_changes.then_some(output))
}

pub fn confirm_content_change(file_path: &Path, old_content: &[u8], new_content: &[u8]) -> Result<bool> {
    println!("\n📝 Content change: {}", file_path.display());

    match (std::str::from_utf8(old_content), std::str::from_utf8(new_content)) {
        (Ok(old), Ok(new)) => match render_diff(old, new)? {
            Some(diff) => println!("{}", diff),
            None => {
                println!("No changes detected.");
                return Ok(false);
            }
        },
        _ => println!(
            "  binary file: {} bytes -> {} bytes",
            old_content.len(),
            new_content.len()
        ),
    }

    let apply_change = Confirm::new("Apply this change?")
        .with_default(true)
        .prompt()?;

    Ok(apply_change)
}

pub fn confirm_path_change(rename: &PendingRename, change_type: &str) -> Result<bool> {
    println!("\n📁 {} rename:", change_type);
    println!("  \x1b[31m- {}\x1b[0m", rename.from.display());
    println!("  \x1b[32m+ {}\x1b[0m", rename.to.display());

    let apply_change = Confirm::new("Apply this rename?")
        .with_default(true)
        .prompt()?;

    Ok(apply_change)
}

pub fn confirm_replace_module(module_path: &Path) -> Result<bool> {
    let answer = Confirm::new(&format!(
        "{} already exists and will be deleted. Continue?",
        module_path.display()
    ))
    .with_default(false)
    .prompt()?;

    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_detection() {
        let old_content = "use Drupal\\automatic_updates\\Updater;\nclass Foo {}\n";
        let new_content = "use Drupal\\auto_updates\\Updater;\nclass Foo {}\n";

        let diff = render_diff(old_content, new_content).unwrap().unwrap();

        assert!(diff.contains("- use Drupal\\automatic_updates\\Updater;"));
        assert!(diff.contains("+ use Drupal\\auto_updates\\Updater;"));
    }

    #[test]
    fn test_no_diff_detection() {
        let content = "This is the same content\nwith multiple lines";

        assert!(render_diff(content, content).unwrap().is_none());
    }
}
