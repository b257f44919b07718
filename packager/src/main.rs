//! `dh-updater` CLI entrypoint.
//!
//! Packages a build directory, writes the JSON and XML update manifests and
//! prints the tagged `UPDATER_OUTPUT_JSON:` result line for CI to capture.
//! The `version-file` subcommand only records the binary's version next to
//! it. Diagnostics go to stderr through `env_logger` (`RUST_LOG`, default
//! `warn`).

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use dh_updater::archive::{ArchiveCreator, ZipArchiveCreator, ZipCommandArchiveCreator};
use dh_updater::cli::{ArchiverKind, Cli, Command, ExtractorKind, PackageArgs, VersionFileArgs};
use dh_updater::command::SystemCommandExecutor;
use dh_updater::error::Result;
use dh_updater::extractor::{PrintableStringsExtractor, StringsCommandExtractor, TextExtractor};
use dh_updater::pipeline::Pipeline;
use dh_updater::version_file::write_version_file;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Some(Command::VersionFile(args)) => run_version_file(args),
        None => run_package(&cli.package),
    };
    match outcome {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

/// Run the pipeline and return the tagged result line.
fn run_package(args: &PackageArgs) -> Result<String> {
    let Some(request) = args.request() else {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "EXE_PATH, ZIP_DIR and ZIP_PATH are required",
            )
            .exit()
    };
    let config = args.config()?;
    let extractor = build_extractor(args.extractor);
    let archiver: Box<dyn ArchiveCreator> = match args.archiver {
        ArchiverKind::Native => Box::new(ZipArchiveCreator),
        ArchiverKind::Zip => Box::new(ZipCommandArchiveCreator::new(SystemCommandExecutor)),
    };

    let result = Pipeline::new(&config, extractor.as_ref(), archiver.as_ref()).run(&request)?;
    result.tagged_line()
}

/// Write `<EXE_PATH>.version.txt` and describe what was written.
fn run_version_file(args: &VersionFileArgs) -> Result<String> {
    let extractor = build_extractor(args.extractor);
    let written = write_version_file(extractor.as_ref(), &args.exe_path)?;
    Ok(format!(
        "FileVersion: {}\nVersion file: {}",
        written.version,
        written.path.display()
    ))
}

fn build_extractor(kind: ExtractorKind) -> Box<dyn TextExtractor> {
    match kind {
        ExtractorKind::Native => Box::new(PrintableStringsExtractor),
        ExtractorKind::Strings => Box::new(StringsCommandExtractor::new(SystemCommandExecutor)),
    }
}
