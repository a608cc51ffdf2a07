//! Locating tool documents on disk.

use std::path::{Path, PathBuf};

use super::RegistryError;

pub const TOOL_FILE_SUFFIX: &str = ".aitool.json";

/// `*.aitool.json` files under `dir`, sorted by path.
///
/// Unreadable entries are skipped with a warning.
pub fn tool_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, RegistryError> {
    if !dir.is_dir() {
        return Err(RegistryError::NotADirectory(dir.display().to_string()));
    }

    // The directory itself may contain glob metacharacters.
    let base = PathBuf::from(glob::Pattern::escape(&dir.to_string_lossy()));
    let pattern = if recursive {
        base.join("**").join(format!("*{}", TOOL_FILE_SUFFIX))
    } else {
        base.join(format!("*{}", TOOL_FILE_SUFFIX))
    };
    let pattern = pattern.to_string_lossy();

    let entries =
        glob::glob(&pattern).map_err(|e| RegistryError::Pattern(format!("{}: {}", pattern, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Unreadable path during tool discovery"),
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recursive_and_flat() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.aitool.json"), "{}").unwrap();
        std::fs::write(dir.path().join("nested/b.aitool.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();

        assert_eq!(tool_files(dir.path(), false).unwrap().len(), 1);
        let all = tool_files(dir.path(), true).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|p| p.ends_with("nested/b.aitool.json")));
    }

    #[test]
    fn test_directory_name_with_brackets() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("tools[v2]");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("a.aitool.json"), "{}").unwrap();

        assert_eq!(tool_files(&dir, false).unwrap().len(), 1);
        assert_eq!(tool_files(&dir, true).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_directory() {
        assert!(matches!(
            tool_files(Path::new("/no/such/tools"), true),
            Err(RegistryError::NotADirectory(_))
        ));
    }
}
