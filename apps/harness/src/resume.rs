//! Resume text source: enumerates and loads the extracted `.txt` inputs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Lists the `.txt` resumes in `dir`, sorted by file name.
pub fn list_resume_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading resume directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("reading entry in {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads one resume to a trimmed string. The content is treated as opaque
/// text to interpolate into the prompt.
pub async fn load_resume_text(path: &Path) -> Result<String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading resume {}", path.display()))?;
    Ok(text.trim().to_string())
}

/// File stem keying the resume's output CSV.
pub fn resume_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("resume")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_only_txt_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_resume.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a_resume.txt"), "a").unwrap();
        std::fs::write(dir.path().join("notes.pdf"), "x").unwrap();

        let files = list_resume_files(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| resume_stem(p)).collect();
        assert_eq!(names, vec!["a_resume", "b_resume"]);
    }

    #[test]
    fn test_missing_directory_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(list_resume_files(&missing).is_err());
    }

    #[tokio::test]
    async fn test_load_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.txt");
        std::fs::write(&path, "\n  Jane Doe\nClerk\n\n").unwrap();
        assert_eq!(load_resume_text(&path).await.unwrap(), "Jane Doe\nClerk");
    }
}
