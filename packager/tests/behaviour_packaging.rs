//! Behaviour-driven tests for the packaging pipeline.
//!
//! Scenarios run the real in-process extractor and archiver against a
//! scratch build directory, using the rstest-bdd v0.5.0 mutable world
//! pattern.

use dh_updater::archive::ZipArchiveCreator;
use dh_updater::config::{PipelineConfig, RepositoryId};
use dh_updater::error::PipelineError;
use dh_updater::extractor::PrintableStringsExtractor;
use dh_updater::manifest_parser::{parse_json_manifest, parse_xml_manifest};
use dh_updater::pattern::ExclusionSet;
use dh_updater::pipeline::{Pipeline, PipelineRequest, PipelineResult};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const BINARY_NAME: &str = "Widget.exe";

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PackagingWorld {
    temp_dir: Option<TempDir>,
    version: Option<String>,
    config: PipelineConfig,
    explicit_urls: Vec<String>,
    results: Vec<PipelineResult>,
    error: Option<PipelineError>,
}

#[fixture]
fn world() -> PackagingWorld {
    PackagingWorld {
        temp_dir: Some(TempDir::new().expect("temp dir")),
        ..PackagingWorld::default()
    }
}

fn root(world: &PackagingWorld) -> PathBuf {
    world
        .temp_dir
        .as_ref()
        .expect("temp_dir set")
        .path()
        .to_path_buf()
}

fn build_dir(world: &PackagingWorld) -> PathBuf {
    root(world).join("build")
}

fn out_dir(world: &PackagingWorld) -> PathBuf {
    root(world).join("out")
}

fn run_packaging(world: &mut PackagingWorld) {
    let request = PipelineRequest {
        binary: build_dir(world).join(BINARY_NAME),
        source_dir: build_dir(world),
        archive_path: root(world).join("dist/widget.zip"),
        explicit_urls: world.explicit_urls.clone(),
        output_dir: out_dir(world),
    };
    let outcome = Pipeline::new(&world.config, &PrintableStringsExtractor, &ZipArchiveCreator)
        .run(&request);
    match outcome {
        Ok(result) => world.results.push(result),
        Err(err) => world.error = Some(err),
    }
}

fn last_result(world: &PackagingWorld) -> &PipelineResult {
    world.results.last().expect("pipeline result set")
}

fn release_url(world: &PackagingWorld) -> String {
    let version = world.version.as_deref().expect("version set");
    format!("https://github.com/acme/widget/releases/download/v{version}/widget.zip")
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a build directory containing \"{a}\", \"{b}\" and \"{c}\"")]
fn given_build_dir(world: &mut PackagingWorld, a: String, b: String, c: String) {
    let dir = build_dir(world);
    for name in [a, b, c] {
        let path = dir.join(&name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(&path, format!("content of {name}")).expect("write");
    }
}

#[given("a binary reporting version \"{version}\"")]
fn given_versioned_binary(world: &mut PackagingWorld, version: String) {
    let mut bytes = b"MZ\x90\x00\x03\x00\x00\x00FileVersion\x00".to_vec();
    bytes.extend_from_slice(version.as_bytes());
    bytes.extend_from_slice(b"\x00\x00\xff\xfe");
    fs::write(build_dir(world).join(BINARY_NAME), bytes).expect("write binary");
    world.version = Some(version);
}

#[given("a binary without a version")]
fn given_unversioned_binary(world: &mut PackagingWorld) {
    fs::write(
        build_dir(world).join(BINARY_NAME),
        b"MZ\x90\x00ProductName\x00Widget 1.2.3\x00",
    )
    .expect("write binary");
}

#[given("exclusion patterns \"{patterns}\"")]
fn given_patterns(world: &mut PackagingWorld, patterns: String) {
    world.config.exclude_patterns = ExclusionSet::parse(&patterns);
}

#[given("the repository \"{repository}\"")]
fn given_repository(world: &mut PackagingWorld, repository: String) {
    world.config.repository =
        Some(RepositoryId::try_from(repository.as_str()).expect("valid repository"));
}

#[given("the explicit URLs \"{urls}\"")]
fn given_explicit_urls(world: &mut PackagingWorld, urls: String) {
    world.explicit_urls = dh_updater::manifest::parse_url_list(&urls);
}

#[when("the build is packaged")]
fn when_packaged(world: &mut PackagingWorld) {
    run_packaging(world);
    assert!(world.error.is_none(), "packaging failed: {:?}", world.error);
}

#[when("the same build is packaged twice")]
fn when_packaged_twice(world: &mut PackagingWorld) {
    run_packaging(world);
    run_packaging(world);
    assert!(world.error.is_none(), "packaging failed: {:?}", world.error);
}

#[when("packaging is attempted")]
fn when_attempted(world: &mut PackagingWorld) {
    run_packaging(world);
}

#[then("the manifest lists only \"{name}\" and the binary")]
fn then_manifest_lists_only(world: &mut PackagingWorld, name: String) {
    let keys: Vec<&str> = last_result(world)
        .file_md5
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, [BINARY_NAME, name.as_str()]);
}

#[then("the archive members match the manifest files")]
fn then_archive_matches(world: &mut PackagingWorld) {
    let result = last_result(world);
    let file = fs::File::open(&result.zip_path).expect("open archive");
    let archive = zip::ZipArchive::new(file).expect("read archive");
    let mut members: Vec<&str> = archive.file_names().collect();
    members.sort_unstable();
    let expected: Vec<&str> = result.file_md5.keys().map(String::as_str).collect();
    assert_eq!(members, expected);
}

#[then("the manifest URLs are exactly the release URL")]
fn then_only_release_url(world: &mut PackagingWorld) {
    assert_eq!(last_result(world).urls, [release_url(world)]);
}

#[then("the manifest has {count} URLs with the release URL first")]
fn then_urls_release_first(world: &mut PackagingWorld, count: usize) {
    let urls = &last_result(world).urls;
    assert_eq!(urls.len(), count);
    assert_eq!(urls.first(), Some(&release_url(world)));
    assert_eq!(
        urls.get(1).map(String::as_str),
        Some("https://mirror.example/w.zip")
    );
}

#[then("the JSON and XML manifests decode to the same manifest")]
fn then_forms_agree(world: &mut PackagingWorld) {
    let result = last_result(world);
    let json = fs::read_to_string(&result.json_path).expect("read json");
    let xml = fs::read_to_string(&result.xml_path).expect("read xml");
    let from_json = parse_json_manifest(&json).expect("parse json");
    let from_xml = parse_xml_manifest(&xml).expect("parse xml");
    assert_eq!(from_json, from_xml);
    assert_eq!(from_json.version().as_str(), world.version.as_deref().expect("version"));
}

#[then("both runs report identical digests")]
fn then_identical_digests(world: &mut PackagingWorld) {
    let [first, second] = world.results.as_slice() else {
        panic!("expected two runs, got {}", world.results.len());
    };
    assert_eq!(first.file_md5, second.file_md5);
    assert_eq!(first.sha512, second.sha512);
}

#[then("a version-not-found error is returned")]
fn then_version_not_found(world: &mut PackagingWorld) {
    assert!(
        matches!(world.error, Some(PipelineError::VersionNotFound)),
        "expected VersionNotFound, got {:?}",
        world.error
    );
}

#[then("no manifest files are written")]
fn then_no_manifests(world: &mut PackagingWorld) {
    assert!(world.results.is_empty());
    assert!(!out_dir(world).exists(), "manifest directory must not exist");
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Excluded files are left out of the archive and the manifest"
)]
fn scenario_exclusions(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Release URL is derived from the repository"
)]
fn scenario_release_url(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Explicit URLs follow the release URL"
)]
fn scenario_explicit_urls(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "JSON and XML manifests agree"
)]
fn scenario_forms_agree(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Packaging twice gives identical digests"
)]
fn scenario_repeatable(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "A binary without a version is rejected"
)]
fn scenario_missing_version(world: PackagingWorld) {
    let _ = world;
}
