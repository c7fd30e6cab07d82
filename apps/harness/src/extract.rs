//! Optional PDF-to-text pre-pass for resume inputs.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Converts every `.pdf` in `pdf_dir` into a `.txt` file in `txt_dir`.
///
/// Per-file extraction failures (and image-only PDFs that yield no text) are
/// logged and skipped, never fatal. Returns the number of files converted.
pub fn extract_resumes(pdf_dir: &Path, txt_dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(txt_dir)
        .with_context(|| format!("creating text directory {}", txt_dir.display()))?;

    let entries = std::fs::read_dir(pdf_dir)
        .with_context(|| format!("reading PDF directory {}", pdf_dir.display()))?;

    let mut converted = 0usize;
    for entry in entries {
        let path = entry
            .with_context(|| format!("reading entry in {}", pdf_dir.display()))?
            .path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("pdf") {
            continue;
        }

        match pdf_extract::extract_text(&path) {
            Ok(text) if !text.trim().is_empty() => {
                let stem = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or("resume");
                let target = txt_dir.join(format!("{stem}.txt"));
                std::fs::write(&target, text.trim())
                    .with_context(|| format!("writing {}", target.display()))?;
                info!(pdf = %path.display(), txt = %target.display(), "extracted resume text");
                converted += 1;
            }
            Ok(_) => {
                warn!(pdf = %path.display(), "no extractable text, skipping");
            }
            Err(e) => {
                warn!(pdf = %path.display(), "extraction failed, skipping: {e}");
            }
        }
    }

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_pdf_files_ignored() {
        let pdf_dir = tempfile::tempdir().unwrap();
        let txt_dir = tempfile::tempdir().unwrap();
        std::fs::write(pdf_dir.path().join("resume.txt"), "not a pdf").unwrap();

        let converted = extract_resumes(pdf_dir.path(), txt_dir.path()).unwrap();
        assert_eq!(converted, 0);
    }

    #[test]
    fn test_invalid_pdf_skipped_not_fatal() {
        let pdf_dir = tempfile::tempdir().unwrap();
        let txt_dir = tempfile::tempdir().unwrap();
        std::fs::write(pdf_dir.path().join("broken.pdf"), "garbage bytes").unwrap();

        let converted = extract_resumes(pdf_dir.path(), txt_dir.path()).unwrap();
        assert_eq!(converted, 0);
    }

    #[test]
    fn test_missing_pdf_dir_errors() {
        let txt_dir = tempfile::tempdir().unwrap();
        assert!(extract_resumes(Path::new("/no/such/dir"), txt_dir.path()).is_err());
    }
}
