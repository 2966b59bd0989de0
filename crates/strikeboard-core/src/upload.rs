//! Replacing the workbook files in the data directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use strikeboard_warehouse::UploadRecord;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::UtcDateTime;
use crate::workbook::WorkbookKind;

pub const ACCEPTED_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "ods"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported file '{file}', expected one of .xlsx, .xls, .xlsm, .ods")]
    UnsupportedExtension { file: String },

    #[error("upload source {path} does not exist")]
    SourceMissing { path: PathBuf },

    #[error("failed to store {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// A workbook copied into place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredUpload {
    pub kind: WorkbookKind,
    pub file_name: String,
    pub stored_as: PathBuf,
    pub size_bytes: u64,
    pub uploaded_at: UtcDateTime,
}

impl StoredUpload {
    pub fn to_record(&self) -> UploadRecord {
        UploadRecord {
            kind: self.kind.as_str().to_owned(),
            file_name: self.file_name.clone(),
            stored_as: self.stored_as.display().to_string(),
            size_bytes: self.size_bytes,
            uploaded_at: self.uploaded_at.format_rfc3339(),
        }
    }
}

pub fn check_extension(path: &Path) -> Result<(), UploadError> {
    let accepted = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| extension.eq_ignore_ascii_case(accepted))
        });
    if accepted {
        Ok(())
    } else {
        Err(UploadError::UnsupportedExtension {
            file: path.display().to_string(),
        })
    }
}

/// Copy `source` to `data_dir/target_name`, replacing any previous file.
///
/// The bytes are written to a hidden staging file in `data_dir` and renamed
/// over the target.
pub fn store_workbook(
    kind: WorkbookKind,
    source: &Path,
    data_dir: &Path,
    target_name: &str,
) -> Result<StoredUpload, UploadError> {
    check_extension(source)?;
    if !source.is_file() {
        return Err(UploadError::SourceMissing {
            path: source.to_path_buf(),
        });
    }

    fs::create_dir_all(data_dir).map_err(|error| UploadError::Io {
        path: data_dir.to_path_buf(),
        source: error,
    })?;

    let target = data_dir.join(target_name);
    let staging = data_dir.join(format!(".{target_name}.{}.tmp", Uuid::new_v4().simple()));
    let size_bytes = copy_to_staging(source, &staging).map_err(|error| UploadError::Io {
        path: staging.clone(),
        source: error,
    })?;
    if let Err(error) = fs::rename(&staging, &target) {
        let _ = fs::remove_file(&staging);
        return Err(UploadError::Io {
            path: target,
            source: error,
        });
    }

    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());
    info!(
        kind = %kind,
        file = %file_name,
        stored_as = %target.display(),
        size_bytes,
        "workbook stored"
    );

    Ok(StoredUpload {
        kind,
        file_name,
        stored_as: target,
        size_bytes,
        uploaded_at: UtcDateTime::now(),
    })
}

/// Copy `source` into `staging`; a failed copy leaves no staging file behind.
fn copy_to_staging(source: &Path, staging: &Path) -> io::Result<u64> {
    let copied = fs::File::open(source).and_then(|mut reader| {
        let mut writer = fs::File::create(staging)?;
        let size_bytes = io::copy(&mut reader, &mut writer)?;
        writer.sync_all()?;
        Ok(size_bytes)
    });
    if copied.is_err() {
        let _ = fs::remove_file(staging);
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(check_extension(Path::new("Live.XLSX")).is_ok());
        assert!(check_extension(Path::new("sheet.ods")).is_ok());
        assert!(matches!(
            check_extension(Path::new("notes.csv")),
            Err(UploadError::UnsupportedExtension { .. })
        ));
        assert!(check_extension(Path::new("noextension")).is_err());
    }

    #[test]
    fn stores_under_configured_name_and_replaces_previous() {
        let temp = tempdir().expect("tempdir");
        let data_dir = temp.path().join("live_data");
        let first = temp.path().join("upload-1.xlsx");
        let second = temp.path().join("upload-2.xlsx");
        fs::write(&first, b"first").expect("write");
        fs::write(&second, b"second!").expect("write");

        store_workbook(WorkbookKind::Live, &first, &data_dir, "Live.xlsx").expect("first store");
        let stored =
            store_workbook(WorkbookKind::Live, &second, &data_dir, "Live.xlsx").expect("second");

        assert_eq!(stored.file_name, "upload-2.xlsx");
        assert_eq!(stored.size_bytes, 7);
        assert_eq!(
            fs::read(data_dir.join("Live.xlsx")).expect("read"),
            b"second!".to_vec()
        );
        let leftovers = fs::read_dir(&data_dir)
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
        assert_eq!(stored.to_record().kind, "live");
    }

    #[cfg(unix)]
    #[test]
    fn failed_copy_removes_staging_file() {
        let temp = tempdir().expect("tempdir");
        // Opening a directory succeeds on unix but reading it fails mid-copy.
        let unreadable = temp.path().join("folder.xlsx");
        fs::create_dir(&unreadable).expect("mkdir");
        let staging = temp.path().join(".Live.xlsx.0.tmp");

        assert!(copy_to_staging(&unreadable, &staging).is_err());
        assert!(!staging.exists());
    }

    #[test]
    fn missing_source_is_reported() {
        let temp = tempdir().expect("tempdir");
        let err = store_workbook(
            WorkbookKind::Baseline,
            &temp.path().join("gone.xlsx"),
            temp.path(),
            "Historical.xlsx",
        )
        .expect_err("must fail");
        assert!(matches!(err, UploadError::SourceMissing { .. }));
    }
}
