//! Static report download.
//!
//! The report is a pre-built file shipped alongside the data; "download" copies
//! it into the user's download directory under a fixed name.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report not found at {}", path.display())]
    Missing { path: PathBuf },

    #[error("copying report to {}: {source}", dest.display())]
    Io {
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Copy `source` to `dest_dir/file_name`, creating the directory if needed.
///
/// Returns the destination path and the number of bytes copied.
pub fn download_report(
    source: &Path,
    dest_dir: &Path,
    file_name: &str,
) -> Result<(PathBuf, u64), ReportError> {
    if !source.is_file() {
        return Err(ReportError::Missing {
            path: source.to_path_buf(),
        });
    }
    let dest = dest_dir.join(file_name);
    let io = |source| ReportError::Io {
        dest: dest.clone(),
        source,
    };
    fs::create_dir_all(dest_dir).map_err(io)?;
    let bytes = fs::copy(source, &dest).map_err(io)?;
    tracing::info!(from = %source.display(), to = %dest.display(), bytes, "report downloaded");
    Ok((dest, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_under_the_download_name() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("report.pdf");
        fs::write(&src, b"%PDF-1.4 test").unwrap();
        let out = dir.path().join("downloads");

        let (dest, bytes) = download_report(&src, &out, "relatorio_completo.pdf").unwrap();
        assert_eq!(dest, out.join("relatorio_completo.pdf"));
        assert_eq!(bytes, 13);
        assert_eq!(fs::read(dest).unwrap(), b"%PDF-1.4 test");
    }

    #[test]
    fn missing_report_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = download_report(&dir.path().join("nope.pdf"), dir.path(), "x.pdf").unwrap_err();
        assert!(matches!(err, ReportError::Missing { .. }));
        assert!(err.to_string().contains("nope.pdf"));
    }
}
