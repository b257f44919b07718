//! CLI argument definitions for the `dh-updater` packager.
//!
//! Kept apart from the entrypoint so argument handling can be unit tested
//! without spawning the binary.

use crate::config::{ConfigError, EXCLUDE_PATTERNS_ENV, PipelineConfig, REPOSITORY_ENV};
use crate::manifest::parse_url_list;
use crate::pipeline::PipelineRequest;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Package a build directory into a zip and emit dh-updater manifests.
#[derive(Parser, Debug)]
#[command(name = "dh-updater")]
#[command(version, about)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
#[command(after_help = concat!(
    "OUTPUT:\n",
    "  Writes <EXE_NAME>.dh.updater.json and <EXE_NAME>.dh.updater.xml to the output\n",
    "  directory and prints one UPDATER_OUTPUT_JSON:<json> line on stdout.\n\n",
    "EXAMPLES:\n",
    "  Package a Windows build and derive the release URL from the repository:\n",
    "    $ GITHUB_REPOSITORY=acme/widget dh-updater dist/Widget.exe dist widget.zip\n\n",
    "  Skip debug symbols and add a mirror URL:\n",
    "    $ dh-updater -e '*.pdb;logs/**' dist/Widget.exe dist widget.zip https://mirror/widget.zip\n\n",
    "  Only record the version in dist/Widget.exe.version.txt:\n",
    "    $ dh-updater version-file dist/Widget.exe",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Packaging arguments (used when no subcommand is given).
    #[command(flatten)]
    pub package: PackageArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write the binary's version to `<EXE_PATH>.version.txt` without packaging.
    VersionFile(VersionFileArgs),
}

/// Arguments for the `version-file` subcommand.
#[derive(Args, Debug, Clone)]
pub struct VersionFileArgs {
    /// Binary to read the x.x.x.x version from.
    #[arg(value_name = "EXE_PATH")]
    pub exe_path: PathBuf,

    /// How printable text is read from the binary.
    #[arg(long, value_enum, default_value_t = ExtractorKind::Native)]
    pub extractor: ExtractorKind,
}

/// Arguments for a packaging run.
///
/// The positionals are only optional so `version-file` can be parsed
/// without them; clap still requires them when no subcommand is given.
#[derive(Args, Debug, Clone)]
pub struct PackageArgs {
    /// Binary to read the x.x.x.x version from.
    #[arg(value_name = "EXE_PATH", required = true)]
    pub exe_path: Option<PathBuf>,

    /// Directory whose contents are archived and hashed.
    #[arg(value_name = "ZIP_DIR", required = true)]
    pub zip_dir: Option<PathBuf>,

    /// Destination of the zip archive.
    #[arg(value_name = "ZIP_PATH", required = true)]
    pub zip_path: Option<PathBuf>,

    /// Comma-separated extra download URLs, listed after the release URL.
    #[arg(value_name = "URLS", default_value = "")]
    pub urls: String,

    /// Directory receiving the manifest files.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Exclusion patterns separated by `;` or `,` (`dir/**`, `*.ext`, exact path).
    #[arg(short, long, value_name = "PATTERNS", env = EXCLUDE_PATTERNS_ENV)]
    pub exclude_patterns: Option<String>,

    /// Repository (`owner/name`) hosting the release.
    #[arg(short, long, value_name = "OWNER/NAME", env = REPOSITORY_ENV)]
    pub repository: Option<String>,

    /// How the archive is produced.
    #[arg(long, value_enum, default_value_t = ArchiverKind::Native)]
    pub archiver: ArchiverKind,

    /// How printable text is read from the binary.
    #[arg(long, value_enum, default_value_t = ExtractorKind::Native)]
    pub extractor: ExtractorKind,
}

/// Archive backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArchiverKind {
    /// In-process reproducible zip writer.
    Native,
    /// The external `zip` tool.
    Zip,
}

/// Text extraction backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExtractorKind {
    /// In-process printable-run scanner.
    Native,
    /// The external `strings` tool.
    Strings,
}

impl PackageArgs {
    /// Build the pipeline configuration from the parsed flags.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRepository`] for a malformed repository.
    pub fn config(&self) -> Result<PipelineConfig, ConfigError> {
        PipelineConfig::from_values(self.exclude_patterns.as_deref(), self.repository.as_deref())
    }

    /// Build the pipeline request from the positional arguments.
    ///
    /// Returns `None` when a required positional is absent, which clap only
    /// allows alongside a subcommand.
    #[must_use]
    pub fn request(&self) -> Option<PipelineRequest> {
        Some(PipelineRequest {
            binary: self.exe_path.clone()?,
            source_dir: self.zip_dir.clone()?,
            archive_path: self.zip_path.clone()?,
            explicit_urls: parse_url_list(&self.urls),
            output_dir: self.output_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const POSITIONALS: [&str; 4] = ["dh-updater", "app.exe", "dist", "app.zip"];

    fn try_parse(args: &[&str]) -> Result<Cli, clap::Error> {
        temp_env::with_vars_unset([EXCLUDE_PATTERNS_ENV, REPOSITORY_ENV], || {
            Cli::try_parse_from(args)
        })
    }

    fn parse(extra: &[&str]) -> PackageArgs {
        let args: Vec<&str> = POSITIONALS.iter().chain(extra).copied().collect();
        let cli = try_parse(&args).expect("valid arguments");
        assert!(cli.command.is_none());
        cli.package
    }

    #[test]
    fn parses_defaults() {
        let args = parse(&[]);
        assert_eq!(args.exe_path, Some(PathBuf::from("app.exe")));
        assert_eq!(args.urls, "");
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert!(args.exclude_patterns.is_none());
        assert!(args.repository.is_none());
        assert_eq!(args.archiver, ArchiverKind::Native);
        assert_eq!(args.extractor, ExtractorKind::Native);
    }

    #[test]
    fn request_splits_urls() {
        let request = parse(&["https://a, ,https://b"])
            .request()
            .expect("positionals present");
        assert_eq!(request.explicit_urls, ["https://a", "https://b"]);
        assert_eq!(request.archive_path, PathBuf::from("app.zip"));
    }

    #[rstest]
    #[case::zip_tool(&["--archiver", "zip"], ArchiverKind::Zip, ExtractorKind::Native)]
    #[case::strings_tool(&["--extractor", "strings"], ArchiverKind::Native, ExtractorKind::Strings)]
    fn selects_backends(
        #[case] flags: &[&str],
        #[case] archiver: ArchiverKind,
        #[case] extractor: ExtractorKind,
    ) {
        let args = parse(flags);
        assert_eq!(args.archiver, archiver);
        assert_eq!(args.extractor, extractor);
    }

    #[test]
    fn rejects_unknown_archiver() {
        let result = try_parse(&["dh-updater", "app.exe", "dist", "app.zip", "--archiver", "tar"]);
        assert!(result.is_err());
    }

    #[test]
    fn reads_environment_fallbacks() {
        temp_env::with_vars(
            [
                (EXCLUDE_PATTERNS_ENV, Some("*.pdb;obj/**")),
                (REPOSITORY_ENV, Some("acme/widget")),
            ],
            || {
                let cli = Cli::parse_from(POSITIONALS);
                let config = cli.package.config().expect("valid config");
                assert_eq!(config.exclude_patterns.len(), 2);
                assert_eq!(
                    config.repository.map(|r| r.to_string()),
                    Some("acme/widget".to_owned())
                );
            },
        );
    }

    #[test]
    fn flags_override_environment() {
        temp_env::with_var(REPOSITORY_ENV, Some("acme/widget"), || {
            let cli = Cli::parse_from(POSITIONALS.iter().chain(&["-r", "other/tool"]));
            assert_eq!(cli.package.repository.as_deref(), Some("other/tool"));
        });
    }

    #[test]
    fn malformed_repository_fails_config() {
        let args = parse(&["--repository", "not a repo"]);
        assert!(args.config().is_err());
    }

    #[rstest]
    #[case::binary_only(&["dh-updater", "app.exe"])]
    #[case::no_archive(&["dh-updater", "app.exe", "dist"])]
    fn missing_positionals_fail(#[case] args: &[&str]) {
        assert!(try_parse(args).is_err());
    }

    #[test]
    fn parses_version_file_subcommand() {
        let cli = try_parse(&["dh-updater", "version-file", "dist/Widget.exe"])
            .expect("valid arguments");
        match cli.command {
            Some(Command::VersionFile(args)) => {
                assert_eq!(args.exe_path, PathBuf::from("dist/Widget.exe"));
                assert_eq!(args.extractor, ExtractorKind::Native);
            }
            None => panic!("expected version-file command"),
        }
        assert!(cli.package.request().is_none());
    }

    #[test]
    fn version_file_accepts_strings_extractor() {
        let cli = try_parse(&[
            "dh-updater",
            "version-file",
            "app.exe",
            "--extractor",
            "strings",
        ])
        .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Some(Command::VersionFile(VersionFileArgs {
                extractor: ExtractorKind::Strings,
                ..
            }))
        ));
    }

    #[test]
    fn version_file_requires_binary() {
        assert!(try_parse(&["dh-updater", "version-file"]).is_err());
    }

    #[test]
    fn version_file_rejects_packaging_arguments() {
        assert!(try_parse(&["dh-updater", "version-file", "app.exe", "dist", "app.zip"]).is_err());
        assert!(try_parse(&["dh-updater", "version-file", "app.exe", "--archiver", "zip"]).is_err());
    }
}
