//! Doxet CLI - converts extractor XML output into browsable documentation

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use doxet_core::generator::GeneratorStatus;
use doxet_core::{Converter, ConverterConfig};

#[derive(Parser)]
#[command(name = "doxet")]
#[command(version = doxet_core::VERSION)]
#[command(about = "Convert extractor XML output into browsable documentation", long_about = None)]
struct Cli {
    /// Directory containing the extractor's XML output
    input: PathBuf,

    /// Output directory for generated documentation
    #[arg(short, long, default_value = "doc")]
    output: PathBuf,

    /// Keep the cleaned intermediate documents on disk
    #[arg(long)]
    keep_intermediates: bool,

    /// Skip XHTML page generation (also skips the docset bundle)
    #[arg(long)]
    skip_html: bool,

    /// Skip docset bundle generation
    #[arg(long)]
    skip_docset: bool,

    /// Treat warnings as errors
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if !cli.input.is_dir() {
        anyhow::bail!("input directory '{}' does not exist", cli.input.display());
    }

    let mut generators = Vec::new();
    if !cli.skip_html {
        generators.push("html".to_string());
    }
    if !cli.skip_html && !cli.skip_docset {
        generators.push("docset".to_string());
    }

    let config = ConverterConfig::new(&cli.output)
        .with_intermediates(cli.keep_intermediates)
        .with_generators(generators);

    let conversion = Converter::new(config)
        .convert(&cli.input)
        .with_context(|| format!("conversion of '{}' failed", cli.input.display()))?;

    println!(
        "Converted {} entities into {}",
        conversion.database.len(),
        cli.output.display()
    );

    for warning in &conversion.warnings {
        eprintln!("warning: {warning}");
    }

    let mut failed = 0;
    for run in &conversion.generator_runs {
        match &run.status {
            GeneratorStatus::Completed => println!("Generated: {}", run.name),
            GeneratorStatus::Failed(error) => {
                failed += 1;
                eprintln!("error: {error}");
            }
            GeneratorStatus::Skipped { blocked_on } => {
                eprintln!(
                    "warning: skipped generator '{}' (requires '{}', which failed)",
                    run.name, blocked_on
                );
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} generator(s) failed");
    }
    if cli.strict && !conversion.warnings.is_empty() {
        anyhow::bail!(
            "{} warning(s) treated as errors by --strict",
            conversion.warnings.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_sample_input(dir: &Path, description: &str) {
        fs::write(
            dir.join("index.xml"),
            "<doxygenindex><compound kind=\"class\"><name>Foo</name></compound></doxygenindex>",
        )
        .unwrap();
        fs::write(
            dir.join("hierarchy.xml"),
            "<hierarchy><node name=\"Foo\"/></hierarchy>",
        )
        .unwrap();
        fs::write(
            dir.join("interface_foo.xml"),
            format!(
                r#"<doxygen><compounddef kind="class">
                    <compoundname>Foo</compoundname>
                    <briefdescription><para>{description}</para></briefdescription>
                    <sectiondef kind="func">
                        <memberdef kind="function" static="no"><name>bar</name></memberdef>
                    </sectiondef>
                </compounddef></doxygen>"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_run_renders_sample_input() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_sample_input(input.path(), "A sample class.");

        let cli = Cli::parse_from([
            "doxet",
            input.path().to_str().unwrap(),
            "-o",
            output.path().to_str().unwrap(),
        ]);
        run(cli).unwrap();

        assert!(output.path().join("Classes/Foo.html").exists());
        assert!(output.path().join("index.html").exists());
        assert!(output.path().join("docset/Tokens.json").exists());
    }

    #[test]
    fn test_run_strict_fails_on_dangling_reference() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_sample_input(
            input.path(),
            r#"See <ref refid="Nowhere">gone</ref>."#,
        );

        let cli = Cli::parse_from([
            "doxet",
            input.path().to_str().unwrap(),
            "-o",
            output.path().to_str().unwrap(),
            "--strict",
        ]);
        let error = run(cli).unwrap_err();
        assert!(error.to_string().contains("--strict"), "{error}");
    }

    #[test]
    fn test_cli_parses_defaults() {
        let cli = Cli::parse_from(["doxet", "xml"]);
        assert_eq!(cli.input, PathBuf::from("xml"));
        assert_eq!(cli.output, PathBuf::from("doc"));
        assert!(!cli.keep_intermediates);
        assert!(!cli.skip_html);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "doxet",
            "xml",
            "-o",
            "site",
            "--keep-intermediates",
            "--skip-docset",
        ]);
        assert_eq!(cli.output, PathBuf::from("site"));
        assert!(cli.keep_intermediates);
        assert!(cli.skip_docset);
    }
}
