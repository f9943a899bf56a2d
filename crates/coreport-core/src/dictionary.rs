use std::fs;
use std::path::Path;

use tracing::info;

use crate::{IoResultExt, Result};

/// Merges `words` into a newline separated word list, keeping it sorted and
/// free of blanks and duplicates.
pub fn merge_words(contents: &str, new_words: &[String]) -> (String, usize) {
    let mut words: Vec<&str> = contents.split('\n').filter(|w| !w.is_empty()).collect();
    let mut added = 0;
    for word in new_words {
        if word.is_empty() || words.contains(&word.as_str()) {
            continue;
        }
        words.push(word);
        added += 1;
    }
    words.sort_unstable();
    words.dedup();
    (words.join("\n"), added)
}

pub fn add_words(dictionary: &Path, new_words: &[String]) -> Result<usize> {
    let contents = fs::read_to_string(dictionary).at(dictionary)?;
    let (updated, added) = merge_words(&contents, new_words);
    if updated != contents {
        fs::write(dictionary, updated).at(dictionary)?;
    }
    info!("Added {} words to {:?}", added, dictionary);
    Ok(added)
}
