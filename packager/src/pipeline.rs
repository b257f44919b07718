//! Packaging pipeline orchestration.
//!
//! One run takes a binary and the directory it ships in, and produces:
//!
//! 1. a zip archive of the directory, minus excluded paths;
//! 2. JSON and XML update manifests next to each other in the output
//!    directory;
//! 3. a [`PipelineResult`] summarising every path and digest involved.
//!
//! Manifest files are only written once every digest has been computed, so
//! a failed run never leaves a partial manifest behind.

use crate::archive::{ArchiveCreator, relative_destination};
use crate::config::PipelineConfig;
use crate::digest::{Md5Digest, Sha512Digest, digest_archive_file, digest_tree};
use crate::error::{PipelineError, Result};
use crate::extractor::TextExtractor;
use crate::manifest::{ManifestParams, PackageManifest, ReleaseLocation, build_manifest};
use crate::naming::ManifestPaths;
use crate::serialization::{to_json, to_xml};
use crate::version::{Version, extract_version};
use crate::walker::{absolute_normalised, walk};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of the single stdout line consumed by CI workflows.
pub const RESULT_LINE_PREFIX: &str = "UPDATER_OUTPUT_JSON:";

/// Inputs for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    /// Binary whose version is embedded in the manifests.
    pub binary: PathBuf,
    /// Directory to archive and hash.
    pub source_dir: PathBuf,
    /// Where the archive is written.
    pub archive_path: PathBuf,
    /// Additional download URLs, in priority order.
    pub explicit_urls: Vec<String>,
    /// Directory receiving the manifest files.
    pub output_dir: PathBuf,
}

/// Summary of a completed run. All paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    /// Version extracted from the binary.
    pub version: Version,
    /// The binary.
    pub exe_path: PathBuf,
    /// The archived directory.
    pub zip_dir: PathBuf,
    /// The archive.
    pub zip_path: PathBuf,
    /// The JSON manifest.
    pub json_path: PathBuf,
    /// The XML manifest.
    pub xml_path: PathBuf,
    /// Base64 SHA-512 digest of the archive.
    pub sha512: Sha512Digest,
    /// Per-file MD5 digests keyed by relative path.
    pub file_md5: BTreeMap<String, Md5Digest>,
    /// Download URLs, primary first.
    pub urls: Vec<String>,
}

impl PipelineResult {
    /// Render the tagged single-line form printed on stdout.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Serialization`] if a path is not valid
    /// UTF-8.
    pub fn tagged_line(&self) -> Result<String> {
        Ok(format!("{RESULT_LINE_PREFIX}{}", serde_json::to_string(self)?))
    }
}

/// Absolute, validated locations for one run.
struct ResolvedPaths {
    binary: PathBuf,
    source_dir: PathBuf,
    archive: PathBuf,
    manifests: ManifestPaths,
}

/// The packaging pipeline bound to its configuration and collaborators.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    extractor: &'a dyn TextExtractor,
    archiver: &'a dyn ArchiveCreator,
}

impl<'a> Pipeline<'a> {
    /// Bind `config` to the given extractor and archiver.
    #[must_use]
    pub fn new(
        config: &'a PipelineConfig,
        extractor: &'a dyn TextExtractor,
        archiver: &'a dyn ArchiveCreator,
    ) -> Self {
        Self {
            config,
            extractor,
            archiver,
        }
    }

    /// Execute one packaging run.
    ///
    /// # Errors
    ///
    /// Returns the first [`PipelineError`] raised by any stage. No manifest
    /// file is written unless every earlier stage succeeded.
    pub fn run(&self, request: &PipelineRequest) -> Result<PipelineResult> {
        let paths = resolve_paths(request)?;

        log::info!("reading version from {}", paths.binary.display());
        let text = self.extractor.extract(&paths.binary)?;
        let version = extract_version(&text)?;
        log::info!("version {version}");

        let patterns = &self.config.exclude_patterns;
        log::info!("exclude patterns: {patterns}");
        let extra_exclusions: Vec<String> =
            relative_destination(&paths.source_dir, &paths.archive)
                .into_iter()
                .collect();
        for excluded in &extra_exclusions {
            log::debug!("excluding the archive itself: {excluded}");
        }

        log::info!(
            "archiving {} into {}",
            paths.source_dir.display(),
            paths.archive.display()
        );
        self.archiver
            .create_archive(&paths.source_dir, &paths.archive, patterns, &extra_exclusions)?;

        let sha512 = digest_archive_file(&paths.archive)?;
        log::debug!("archive sha512 {sha512}");

        let files = walk(&paths.source_dir, patterns, &extra_exclusions)?;
        let file_md5 = digest_tree(&files)?;
        log::info!("hashed {} files", file_md5.len());

        let manifest = build_manifest(ManifestParams {
            version,
            archive_digest: sha512,
            file_digests: file_md5,
            explicit_urls: request.explicit_urls.clone(),
            release: self.release_location(&paths.archive),
        });
        write_manifests(&manifest, &paths.manifests, &request.output_dir)?;

        Ok(PipelineResult {
            version: manifest.version().clone(),
            exe_path: paths.binary,
            zip_dir: paths.source_dir,
            zip_path: paths.archive,
            json_path: paths.manifests.json,
            xml_path: paths.manifests.xml,
            sha512: manifest.sha512().clone(),
            file_md5: manifest.file_md5().clone(),
            urls: manifest.urls().to_vec(),
        })
    }

    fn release_location(&self, archive: &Path) -> Option<ReleaseLocation> {
        let repository = self.config.repository.clone()?;
        let asset_name = archive.file_name()?.to_string_lossy().into_owned();
        Some(ReleaseLocation {
            repository,
            asset_name,
        })
    }
}

fn resolve_paths(request: &PipelineRequest) -> Result<ResolvedPaths> {
    let binary = absolute(&request.binary)?;
    let source_dir = absolute(&request.source_dir)?;
    let archive = absolute(&request.archive_path)?;
    let output_dir = absolute(&request.output_dir)?;

    if !binary.exists() {
        return Err(PipelineError::InputNotFound { path: binary });
    }
    if !source_dir.exists() {
        return Err(PipelineError::InputNotFound { path: source_dir });
    }
    if !source_dir.is_dir() {
        return Err(PipelineError::InputNotADirectory { path: source_dir });
    }

    let manifests = ManifestPaths::for_binary(&binary, &output_dir)?;
    Ok(ResolvedPaths {
        binary,
        source_dir,
        archive,
        manifests,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    absolute_normalised(path).map_err(|err| PipelineError::io(path, err))
}

fn write_manifests(
    manifest: &PackageManifest,
    paths: &ManifestPaths,
    output_dir: &Path,
) -> Result<()> {
    let json = to_json(manifest)?;
    let xml = to_xml(manifest);
    fs::create_dir_all(output_dir).map_err(|err| PipelineError::io(output_dir, err))?;
    fs::write(&paths.json, json).map_err(|err| PipelineError::io(&paths.json, err))?;
    fs::write(&paths.xml, xml).map_err(|err| PipelineError::io(&paths.xml, err))?;
    log::info!(
        "wrote {} and {}",
        paths.json.display(),
        paths.xml.display()
    );
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
