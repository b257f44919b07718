//! Zip archive creation.
//!
//! [`ZipArchiveCreator`] builds the archive in-process from the same walk
//! used for hashing, so membership always agrees with the manifest.
//! [`ZipCommandArchiveCreator`] shells out to the Info-ZIP `zip` tool, naming
//! each walked file explicitly so `zip` never applies its own wildcard rules.

use crate::command::{CommandExecutor, failure_reason};
use crate::error::{PipelineError, Result};
use crate::pattern::ExclusionSet;
use crate::walker::{FileEntry, absolute_normalised, walk};
use std::fs;
use std::io;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Capability that compresses a filtered directory tree into one archive.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveCreator {
    /// Write an archive of `source_dir` to `destination`.
    ///
    /// Member paths are relative to `source_dir`. Files matched by
    /// `patterns` or listed in `extra_exclusions` must be left out, using
    /// the same rules as [`walk`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Archive`] when the archive cannot be
    /// produced, or [`PipelineError::Traversal`] when the tree cannot be
    /// read.
    fn create_archive(
        &self,
        source_dir: &Path,
        destination: &Path,
        patterns: &ExclusionSet,
        extra_exclusions: &[String],
    ) -> Result<()>;
}

/// In-process Deflate zip writer.
///
/// Entries are written in walk order with a fixed 1980-01-01 timestamp and
/// `0644` permissions, so identical trees produce byte-identical archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveCreator;

impl ArchiveCreator for ZipArchiveCreator {
    fn create_archive(
        &self,
        source_dir: &Path,
        destination: &Path,
        patterns: &ExclusionSet,
        extra_exclusions: &[String],
    ) -> Result<()> {
        let files = walk(source_dir, patterns, extra_exclusions)?;
        prepare_destination(destination)?;

        let output = fs::File::create(destination).map_err(archive_error)?;
        let mut writer = ZipWriter::new(output);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        for file in &files {
            writer
                .start_file(file.relative_path.as_str(), options)
                .map_err(archive_error)?;
            let mut source = fs::File::open(&file.absolute_path)
                .map_err(|err| PipelineError::io(&file.absolute_path, err))?;
            io::copy(&mut source, &mut writer).map_err(archive_error)?;
        }
        writer.finish().map_err(archive_error)?;
        log::debug!(
            "wrote {} entries to {}",
            files.len(),
            destination.display()
        );
        Ok(())
    }
}

/// Runs `zip -X -D -nw <destination> <member>...` inside the source tree.
///
/// Members come from [`walk`], so the archive holds exactly the files the
/// manifest lists even when a pattern contains `zip` wildcard characters.
#[derive(Debug, Clone)]
pub struct ZipCommandArchiveCreator<E> {
    executor: E,
}

impl<E: CommandExecutor> ZipCommandArchiveCreator<E> {
    /// Wrap `executor` so archiving shells out to `zip`.
    #[must_use]
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

impl<E: CommandExecutor> ArchiveCreator for ZipCommandArchiveCreator<E> {
    fn create_archive(
        &self,
        source_dir: &Path,
        destination: &Path,
        patterns: &ExclusionSet,
        extra_exclusions: &[String],
    ) -> Result<()> {
        let files = walk(source_dir, patterns, extra_exclusions)?;
        let destination = absolute_normalised(destination).map_err(archive_error)?;
        prepare_destination(&destination)?;
        if files.is_empty() {
            return Err(PipelineError::Archive {
                reason: format!("no files to archive under {}", source_dir.display()),
            });
        }

        let args = zip_arguments(&destination, &files);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .executor
            .run("zip", &arg_refs, source_dir)
            .map_err(|err| PipelineError::Archive {
                reason: format!("failed to run zip: {err}"),
            })?;
        if !output.status.success() {
            return Err(PipelineError::Archive {
                reason: failure_reason("zip", &output),
            });
        }
        log::debug!(
            "zip stored {} entries in {}",
            files.len(),
            destination.display()
        );
        Ok(())
    }
}

/// Build the `zip` argument list storing `files` in `destination`.
///
/// `-X` drops extra file attributes, `-D` omits directory entries and `-nw`
/// turns off wildcard expansion so every member name is taken literally.
fn zip_arguments(destination: &Path, files: &[FileEntry]) -> Vec<String> {
    ["-X", "-D", "-nw"]
        .into_iter()
        .map(str::to_owned)
        .chain([destination.to_string_lossy().into_owned()])
        .chain(files.iter().map(|file| file.relative_path.clone()))
        .collect()
}

/// Create parent directories and drop any stale archive at `destination`.
fn prepare_destination(destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| PipelineError::io(parent, err))?;
    }
    match fs::remove_file(destination) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(PipelineError::io(destination, err)),
    }
}

fn archive_error(err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Archive {
        reason: err.to_string(),
    }
}

/// Return `destination` relative to `source_dir` when it lies inside it.
///
/// The result uses `/` separators and is suitable as an extra exclusion.
///
/// # Examples
///
/// ```
/// use dh_updater::archive::relative_destination;
/// use std::path::Path;
///
/// assert_eq!(
///     relative_destination(Path::new("/build/out"), Path::new("/build/out/pkg/app.zip")),
///     Some("pkg/app.zip".to_owned())
/// );
/// assert_eq!(
///     relative_destination(Path::new("/build/out"), Path::new("/build/app.zip")),
///     None
/// );
/// ```
#[must_use]
pub fn relative_destination(source_dir: &Path, destination: &Path) -> Option<String> {
    let relative = destination.strip_prefix(source_dir).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
