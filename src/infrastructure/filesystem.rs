//! File system adapter for archive handling
//!
//! Existence checks, glob matching and tar/zip extraction used when
//! preparing Helm charts, UI bundles and MTA contents before upload.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::ArchiveError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// File system operations needed by the release orchestrator
pub trait FileSystem {
    fn exists(&self, path: &Path) -> Result<bool, ArchiveError>;

    /// Paths matching a glob pattern, sorted
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ArchiveError>;

    /// Extract a (optionally gzip-compressed) tar archive, dropping the first
    /// `strip_components` path components of every entry
    fn untar(&self, archive: &Path, destination: &Path, strip_components: usize) -> Result<(), ArchiveError>;

    fn unzip(&self, archive: &Path, destination: &Path) -> Result<(), ArchiveError>;
}

/// The local disk
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> Result<bool, ArchiveError> {
        path.try_exists().map_err(|source| io_error(path, source))
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ArchiveError> {
        let paths = glob::glob(pattern).map_err(|source| ArchiveError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut matches = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => matches.push(path),
                Err(e) => debug!("Skipping unreadable path {}: {}", e.path().display(), e.error()),
            }
        }
        matches.sort();
        Ok(matches)
    }

    fn untar(&self, archive: &Path, destination: &Path, strip_components: usize) -> Result<(), ArchiveError> {
        let destination = non_empty(destination);
        let file = File::open(archive).map_err(|source| io_error(archive, source))?;
        let mut reader = BufReader::new(file);
        let compressed = reader
            .fill_buf()
            .map_err(|source| io_error(archive, source))?
            .starts_with(&GZIP_MAGIC);

        let stream: Box<dyn Read> = if compressed {
            Box::new(GzDecoder::new(reader))
        } else {
            Box::new(reader)
        };
        let mut tar = tar::Archive::new(stream);

        for entry in tar.entries().map_err(|source| io_error(archive, source))? {
            let mut entry = entry.map_err(|source| io_error(archive, source))?;
            let entry_path = entry.path().map_err(|source| io_error(archive, source))?.into_owned();

            let Some(relative) = strip_path(&entry_path, strip_components)? else {
                continue;
            };
            let target = destination.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
            }
            entry.unpack(&target).map_err(|source| io_error(&target, source))?;
        }

        debug!("Extracted {} to {}", archive.display(), destination.display());
        Ok(())
    }

    fn unzip(&self, archive: &Path, destination: &Path) -> Result<(), ArchiveError> {
        let destination = non_empty(destination);
        let file = File::open(archive).map_err(|source| io_error(archive, source))?;
        let mut zip = zip::ZipArchive::new(file).map_err(|source| zip_error(archive, source))?;
        std::fs::create_dir_all(destination).map_err(|source| io_error(destination, source))?;
        zip.extract(destination).map_err(|source| zip_error(archive, source))?;

        debug!("Extracted {} to {}", archive.display(), destination.display());
        Ok(())
    }
}

fn non_empty(path: &Path) -> &Path {
    if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    }
}

/// Drop leading components; `None` when nothing remains
fn strip_path(path: &Path, strip_components: usize) -> Result<Option<PathBuf>, ArchiveError> {
    let mut normal = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normal.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ArchiveError::PathTraversal {
                    path: path.display().to_string(),
                })
            }
        }
    }

    if normal.len() <= strip_components {
        return Ok(None);
    }
    Ok(Some(normal[strip_components..].iter().collect()))
}

fn io_error(path: &Path, source: io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn zip_error(path: &Path, source: zip::result::ZipError) -> ArchiveError {
    ArchiveError::Zip {
        path: path.display().to_string(),
        source,
    }
}
