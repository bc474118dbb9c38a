mod augment;
mod content;
mod descriptor;
mod paths;
mod pipeline;
mod publish;
mod registry;
mod render;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use content::catalog::ContentCatalog;
use render::SpectaqlRenderer;
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "antora-spectaql",
    about = "Embed spectaql GraphQL references into Antora documentation"
)]
struct Cli {
    /// Settings file (default: ./antora-spectaql.{yml,toml,json} if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List reference pages found in the given component version directories
    Discover {
        /// Directories containing antora.yml
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
        /// Print descriptors as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Anchor a raw spectaql HTML file and print the embeddable fragment
    Augment {
        input: PathBuf,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Discover, render, augment and publish, then write the catalog out
    Run {
        /// Directories containing antora.yml
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
        /// Output directory for the processed catalog
        #[arg(short, long, default_value = "build/site")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    tracing::debug!(?settings, "settings loaded");

    let result = match cli.command {
        Commands::Discover { dirs, json } => {
            let aggregate = content::aggregate::load_sources(&dirs)?;
            let registry = pipeline::discover(&aggregate);
            if registry.is_empty() {
                println!("No reference pages found.");
                return Ok(());
            }
            for (key, d) in registry.iter() {
                if json {
                    let line = serde_json::json!({ "page": key, "descriptor": d });
                    println!("{}", line);
                } else {
                    println!(
                        "{:<12} | {:<8} | {:<40} | {:<24} -> {}",
                        truncate(&key.component, 12),
                        truncate(&key.version, 8),
                        truncate(&key.path, 40),
                        truncate(&d.config_file, 24),
                        d.qualified_target()
                    );
                }
            }
            Ok(())
        }
        Commands::Augment { input, output } => {
            let raw = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let fragment = augment::augment(&raw)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, fragment)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", fragment),
            }
            Ok(())
        }
        Commands::Run { dirs, out } => {
            let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
            let workdir = paths::expand_path(&settings.workdir.to_string_lossy(), &cwd);

            let aggregate = content::aggregate::load_sources(&dirs)?;
            let registry = pipeline::discover(&aggregate);
            let mut catalog = ContentCatalog::from_aggregate(aggregate);
            tracing::info!("Catalog holds {} files", catalog.len());
            if registry.is_empty() {
                println!("No reference pages found; writing catalog unchanged.");
            }

            let renderer = SpectaqlRenderer::new(&settings.generator, workdir, &settings.target_dir)?;
            let stats = pipeline::transform(
                &mut catalog,
                &registry,
                &renderer,
                &settings.content_root,
                &cwd,
            )
            .await?;

            let written = catalog.write_to(&out)?;
            println!(
                "Scanned {} files, {} reference pages, published {} fragments.",
                stats.scanned,
                stats.matched,
                stats.published.len()
            );
            for path in &stats.published {
                println!("  {}", path);
            }
            println!("Wrote {} files to {}", written, out.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run_with_defaults() {
        let cli = Cli::try_parse_from(["antora-spectaql", "run", "docs/core"]).unwrap();
        match cli.command {
            Commands::Run { dirs, out } => {
                assert_eq!(dirs, vec![PathBuf::from("docs/core")]);
                assert_eq!(out, PathBuf::from("build/site"));
            }
            _ => panic!("expected run"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn discover_requires_a_directory() {
        assert!(Cli::try_parse_from(["antora-spectaql", "discover"]).is_err());
    }

    #[test]
    fn truncate_marks_long_values() {
        assert_eq!(truncate("reference", 20), "reference");
        assert_eq!(truncate("modules/api/pages", 7), "modules...");
    }

    #[test]
    fn durations_are_humanized() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
