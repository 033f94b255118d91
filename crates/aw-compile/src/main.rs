use anyhow::{Context, Result};
use awc_compiler::CompilerOptions;
use clap::Parser;
use std::path::PathBuf;

/// Compiles one agentic workflow markdown source into a GitHub Actions
/// lock file plus its sidecar prompt body.
#[derive(Parser, Debug)]
#[command(name = "aw-compile", version, about)]
struct Cli {
    /// Workflow source file (markdown with YAML frontmatter).
    source: PathBuf,

    /// Directory the lock file and prompt body are written into.
    out_dir: PathBuf,

    /// Override the detection model the threat-detection job uses.
    #[arg(long)]
    detection_model: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();

    let options = CompilerOptions {
        detection_model_override: cli.detection_model,
    };

    match awc_compiler::compile(&cli.source, &options) {
        Ok(output) => {
            for warning in &output.warnings {
                tracing::warn!("{warning}");
            }
            write_outputs(&cli.source, &cli.out_dir, &output)?;
            Ok(())
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.exit_code());
        }
    }
}

fn write_outputs(source: &std::path::Path, out_dir: &std::path::Path, output: &awc_compiler::CompileOutput) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "workflow".to_string());

    let lock_path = out_dir.join(format!("{stem}.lock.yml"));
    std::fs::write(&lock_path, &output.lock_yaml)
        .with_context(|| format!("writing {}", lock_path.display()))?;

    let prompt_path = out_dir.join(format!("{stem}.prompt.md"));
    std::fs::write(&prompt_path, &output.prompt_body)
        .with_context(|| format!("writing {}", prompt_path.display()))?;

    tracing::info!(
        "wrote {} and {} (needs_interpolation={})",
        lock_path.display(),
        prompt_path.display(),
        output.needs_interpolation
    );
    Ok(())
}
