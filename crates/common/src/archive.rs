//! Directory archiving
//!
//! A shared directory is downloaded as a zip built on the fly. Entry names
//! inside the archive are relative to the shared directory (which is not
//! itself an entry), use `/` separators, and directories carry a trailing
//! `/`.
//!
//! Archiving is not atomic. A file deleted or replaced mid-walk surfaces as
//! an error and leaves an incomplete archive behind; callers start over
//! rather than resume.

use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf, StripPrefixError};

use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("entry escaped the archived directory: {0}")]
    StripPrefix(#[from] StripPrefixError),
}

impl ArchiveError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Counts of what went into an archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Archive `source_dir` into a new zip file at `dest`.
pub fn archive_dir(source_dir: &Path, dest: &Path) -> Result<ArchiveSummary, ArchiveError> {
    let file = File::create(dest).map_err(|e| ArchiveError::io(dest, e))?;
    let mut writer = BufWriter::new(file);
    let summary = write_archive(source_dir, &mut writer)?;
    writer
        .flush()
        .and_then(|_| writer.get_ref().sync_all())
        .map_err(|e| ArchiveError::io(dest, e))?;
    Ok(summary)
}

/// Archive `source_dir` into any seekable writer.
pub fn write_archive<W: Write + Seek>(
    source_dir: &Path,
    writer: W,
) -> Result<ArchiveSummary, ArchiveError> {
    let mut zip = ZipWriter::new(writer);
    let mut summary = ArchiveSummary::default();

    for dir_entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        let name = archive_name(path.strip_prefix(source_dir)?);
        let metadata = dir_entry.metadata()?;
        let options = with_permissions(file_options(), &metadata);

        if dir_entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
            summary.directories += 1;
            continue;
        }

        zip.start_file(name, options)?;
        let mut source = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        summary.bytes += io::copy(&mut source, &mut zip).map_err(|e| ArchiveError::io(path, e))?;
        summary.files += 1;
    }

    zip.finish()?;

    tracing::debug!(
        source = %source_dir.display(),
        files = summary.files,
        directories = summary.directories,
        bytes = summary.bytes,
        "archive written"
    );
    Ok(summary)
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn with_permissions(options: SimpleFileOptions, metadata: &fs::Metadata) -> SimpleFileOptions {
    use std::os::unix::fs::PermissionsExt;
    options.unix_permissions(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn with_permissions(options: SimpleFileOptions, _metadata: &fs::Metadata) -> SimpleFileOptions {
    options
}

/// An archive on disk that is deleted when dropped.
///
/// The zip is written next to the archived directory under a unique name,
/// so concurrent downloads of the same directory never share a file. Hold
/// the guard for as long as the archive is being read.
#[derive(Debug)]
pub struct ScopedArchive {
    file: NamedTempFile,
    download_name: String,
}

impl ScopedArchive {
    /// Archive `source_dir`; the download is offered as `<entry_name>.zip`.
    pub fn create(source_dir: &Path, entry_name: &str) -> Result<Self, ArchiveError> {
        let dir = source_dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);

        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}.", entry_name))
            .suffix(".zip")
            .tempfile_in(&dir)
            .map_err(|e| ArchiveError::io(&dir, e))?;

        {
            let mut writer = BufWriter::new(file.as_file_mut());
            write_archive(source_dir, &mut writer)?;
            writer.flush().map_err(|e| ArchiveError::io(&dir, e))?;
        }

        Ok(Self {
            file,
            download_name: format!("{}.zip", entry_name),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    /// Size of the finished archive in bytes.
    pub fn size(&self) -> Result<u64, ArchiveError> {
        self.file
            .as_file()
            .metadata()
            .map(|m| m.len())
            .map_err(|e| ArchiveError::io(self.path(), e))
    }

    /// A fresh read handle positioned at the start of the archive.
    pub fn reopen(&self) -> Result<File, ArchiveError> {
        self.file.reopen().map_err(|e| ArchiveError::io(self.path(), e))
    }
}

impl Drop for ScopedArchive {
    fn drop(&mut self) {
        tracing::debug!(path = %self.file.path().display(), "discarding archive");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_archive_name_uses_forward_slashes() {
        let rel: PathBuf = ["sub", "deeper", "c.txt"].iter().collect();
        assert_eq!(archive_name(&rel), "sub/deeper/c.txt");
    }

    #[test]
    fn test_empty_directory_archives_no_entries() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("empty");
        fs::create_dir(&src).unwrap();

        let summary = archive_dir(&src, &dir.path().join("empty.zip")).unwrap();
        assert_eq!(summary, ArchiveSummary::default());

        let archive = zip::ZipArchive::new(File::open(dir.path().join("empty.zip")).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let result = archive_dir(&dir.path().join("ghost"), &dir.path().join("ghost.zip"));
        assert!(matches!(result, Err(ArchiveError::Walk(_))));
    }
}
