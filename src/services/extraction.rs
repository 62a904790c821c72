//! Archive preparation before descriptor construction
//!
//! Helm charts and UI bundles are delivered as archives in the downloaded
//! archives directory. UI apps can also be shipped inside an MTA, in which
//! case the MTA is unpacked into a fixed, shared directory first. Runs are
//! sequential, so that directory is never used by two artifacts at once.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{ArtifactConfiguration, GlobalConfiguration};
use crate::error::{ArchiveError, ConfigError, ReleaseError};
use crate::infrastructure::FileSystem;

/// Fixed extraction directory of MTA archives
pub const MTAR_EXTRACTION_DIR: &str = "extracted_mtar";

/// MTA module holding UI app content
pub const UI_APP_CONTENT_MODULE: &str = "dwc-ui-appcontent";

/// Target directory of UI resources taken from an MTA
pub const MTA_UI_TARGET_DIR: &str = "dist";

/// Extract an archive after checking it exists, dispatching on its extension
///
/// `.tar` and `.tgz` drop `strip_components` leading path components;
/// `.zip` and `.mtar` are extracted as-is.
pub fn extract_archive(
    files: &dyn FileSystem,
    archive: &Path,
    target: &Path,
    strip_components: usize,
) -> Result<(), ArchiveError> {
    if !files.exists(archive)? {
        return Err(ArchiveError::NotFound {
            path: archive.display().to_string(),
        });
    }

    match archive.extension().and_then(|e| e.to_str()) {
        Some("tar") | Some("tgz") => files.untar(archive, target, strip_components)?,
        Some("zip") | Some("mtar") => files.unzip(archive, target)?,
        other => {
            return Err(ArchiveError::UnsupportedType {
                extension: other.map(|e| format!(".{}", e)).unwrap_or_default(),
                path: archive.display().to_string(),
            })
        }
    }

    debug!("successfully extracted archive {} to {}", archive.display(), target.display());
    Ok(())
}

/// Unpack the downloaded Helm chart into the chart directory
pub fn extract_helm_chart(files: &dyn FileSystem, global: &GlobalConfiguration) -> Result<(), ArchiveError> {
    if global.helm_chart_url.is_empty() {
        return Ok(());
    }
    let file_name = Path::new(&global.helm_chart_url)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_default();
    let archive = Path::new(&global.downloaded_archives_path).join(file_name);
    extract_archive(files, &archive, Path::new(&global.helm_chart_directory), 1)
}

/// Unpack the single downloaded archive matching `pattern` into `target`
pub fn extract_ui_resources(
    files: &dyn FileSystem,
    global: &GlobalConfiguration,
    pattern: &str,
    target: &Path,
) -> Result<(), ArchiveError> {
    let full_pattern = Path::new(&global.downloaded_archives_path)
        .join(pattern)
        .display()
        .to_string();
    let matches = files.glob(&full_pattern)?;

    let archive = match matches.as_slice() {
        [archive] => archive,
        _ => {
            return Err(ArchiveError::AmbiguousMatch {
                pattern: pattern.to_string(),
                count: matches.len(),
                matches: matches.iter().map(|p| p.display().to_string()).collect(),
            })
        }
    };
    extract_archive(files, archive, target, 1)
}

/// Unpack the UI app of an MTA and point the artifact at the extracted bundle
pub fn retrieve_ui_apps_from_mta(
    files: &dyn FileSystem,
    global: &GlobalConfiguration,
    artifact: &mut ArtifactConfiguration,
) -> Result<(), ReleaseError> {
    let mtar = Path::new(&global.downloaded_archives_path).join(&global.mtar_file_path);
    extract_archive(files, &mtar, Path::new(MTAR_EXTRACTION_DIR), 1)?;

    let ui_bundle = Path::new(MTAR_EXTRACTION_DIR)
        .join(UI_APP_CONTENT_MODULE)
        .join(&global.mtar_ui_path)
        .join("data.zip");
    extract_archive(files, &ui_bundle, Path::new(&global.downloaded_archives_path), 0)?;

    let app_name = artifact
        .unique_app_name()
        .ok_or_else(|| ConfigError::NoUniqueAppName {
            resource: artifact.resource_name.clone(),
        })?
        .to_string();
    info!("Extracted UI app {} from {}", app_name, mtar.display());

    artifact.has_archive = true;
    artifact.archive_pattern = format!("{}.zip", app_name);
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// Records every extraction; every path exists unless listed as missing
    #[derive(Default)]
    pub struct RecordingFileSystem {
        pub calls: RefCell<Vec<String>>,
        pub missing: HashSet<PathBuf>,
        /// Glob results; `None` echoes the pattern back as the only match
        pub glob_matches: Option<Vec<PathBuf>>,
    }

    impl FileSystem for RecordingFileSystem {
        fn exists(&self, path: &Path) -> Result<bool, ArchiveError> {
            Ok(!self.missing.contains(path))
        }

        fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ArchiveError> {
            self.calls.borrow_mut().push(format!("glob {}", pattern));
            Ok(self
                .glob_matches
                .clone()
                .unwrap_or_else(|| vec![PathBuf::from(pattern)]))
        }

        fn untar(&self, archive: &Path, destination: &Path, strip_components: usize) -> Result<(), ArchiveError> {
            self.calls.borrow_mut().push(format!(
                "untar {} {} {}",
                archive.display(),
                destination.display(),
                strip_components
            ));
            Ok(())
        }

        fn unzip(&self, archive: &Path, destination: &Path) -> Result<(), ArchiveError> {
            self.calls
                .borrow_mut()
                .push(format!("unzip {} {}", archive.display(), destination.display()));
            Ok(())
        }
    }
}
