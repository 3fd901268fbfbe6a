//! Facilities for discovering input files and loading text corpora.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::error::{BytepairError, Result};

/// Discovers files rooted at the provided input paths according to the corpus configuration.
///
/// Directories are traversed recursively by default; set [`CorpusConfig::recursive`]
/// to `false` to limit discovery to the first level. Symlink traversal is
/// controlled through [`CorpusConfig::follow_symlinks`].
pub fn collect_paths<P: AsRef<Path>>(inputs: &[P], cfg: &CorpusConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = input.as_ref();
        if !path.exists() {
            return Err(BytepairError::InvalidConfig(format!(
                "input path {path:?} does not exist"
            )));
        }
        let metadata = path
            .symlink_metadata()
            .map_err(|err| BytepairError::io(err, Some(path.to_path_buf())))?;
        if metadata.is_dir() {
            if cfg.recursive {
                let walker = WalkDir::new(path).follow_links(cfg.follow_symlinks);
                for entry in walker {
                    let entry = entry.map_err(|err| BytepairError::Internal(err.to_string()))?;
                    if entry.file_type().is_file() {
                        files.push(entry.path().to_path_buf());
                    }
                }
            } else {
                for entry in fs::read_dir(path)
                    .map_err(|err| BytepairError::io(err, Some(path.to_path_buf())))?
                {
                    let entry =
                        entry.map_err(|err| BytepairError::io(err, Some(path.to_path_buf())))?;
                    let entry_path = entry.path();
                    if entry_path.is_file() {
                        files.push(entry_path);
                    }
                }
            }
        } else if metadata.is_file() {
            files.push(path.to_path_buf());
        }
    }
    if files.is_empty() {
        return Err(BytepairError::InvalidConfig(
            "no files discovered in provided inputs".into(),
        ));
    }
    files.sort();
    Ok(files)
}

/// Loads a UTF-8 text corpus, concatenating discovered files in path order.
///
/// Files are separated by a newline so token pairs never form across file
/// boundaries that were not adjacent on disk. Non-UTF-8 content is rejected.
pub fn load_text_corpus<P: AsRef<Path>>(inputs: &[P], cfg: &CorpusConfig) -> Result<String> {
    let file_paths = collect_paths(inputs, cfg)?;
    let mut corpus = String::new();
    for file_path in file_paths {
        let text = fs::read_to_string(&file_path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::InvalidData {
                BytepairError::InvalidConfig(format!(
                    "input file {file_path:?} is not valid UTF-8"
                ))
            } else {
                BytepairError::io(err, Some(file_path.clone()))
            }
        })?;
        if !corpus.is_empty() && !corpus.ends_with('\n') {
            corpus.push('\n');
        }
        corpus.push_str(&text);
    }
    Ok(corpus)
}
