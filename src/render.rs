use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::descriptor::PageDescriptor;
use crate::paths::expand_path;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to start generator `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("generator exited with {status} for {spec_file}: {stderr}")]
    Failed {
        spec_file: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[error("generator produced no output at {0}")]
    MissingOutput(PathBuf),
    #[error("generator command is empty")]
    EmptyCommand,
}

/// Options handed to the generator for one spec file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorOptions {
    pub spec_file: PathBuf,
    pub embeddable: bool,
    pub target_file: String,
    pub target_dir: String,
    pub disable_css: bool,
    pub disable_js: bool,
    pub quiet: bool,
}

impl GeneratorOptions {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.spec_file.to_string_lossy().into_owned()];
        if self.embeddable {
            args.push("--embeddable".into());
        }
        args.push("--target-dir".into());
        args.push(self.target_dir.clone());
        args.push("--target-file".into());
        args.push(self.target_file.clone());
        if self.disable_css {
            args.push("--disable-css".into());
        }
        if self.disable_js {
            args.push("--disable-js".into());
        }
        if self.quiet {
            args.push("--quiet".into());
        }
        args
    }
}

/// Everything the adapter derives from a descriptor before invoking the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub spec_file: PathBuf,
    pub target_file: String,
}

impl RenderRequest {
    /// `{content_root}/{component}/modules/{module}/attachments/{config_file}`.
    pub fn for_descriptor(descriptor: &PageDescriptor, content_root: &str, cwd: &Path) -> Self {
        let relative = format!(
            "{}/modules/{}/attachments/{}",
            descriptor.component, descriptor.module, descriptor.config_file
        );
        RenderRequest {
            spec_file: expand_path(content_root, cwd).join(relative),
            target_file: descriptor.qualified_target(),
        }
    }

    pub fn options(&self, target_dir: &str) -> GeneratorOptions {
        GeneratorOptions {
            spec_file: self.spec_file.clone(),
            embeddable: true,
            target_file: self.target_file.clone(),
            target_dir: target_dir.to_string(),
            disable_css: true,
            disable_js: true,
            quiet: true,
        }
    }
}

/// Turns a spec file into raw HTML on disk and reports where it landed.
#[allow(async_fn_in_trait)]
pub trait SpecRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<PathBuf, RenderError>;
}

/// Runs the spectaql CLI as a child process.
#[derive(Debug, Clone)]
pub struct SpectaqlRenderer {
    program: String,
    args: Vec<String>,
    workdir: PathBuf,
    target_dir: String,
}

impl SpectaqlRenderer {
    /// `command` is split on whitespace, e.g. `npx spectaql`.
    pub fn new(command: &str, workdir: PathBuf, target_dir: &str) -> Result<Self, RenderError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(RenderError::EmptyCommand)?;
        Ok(SpectaqlRenderer {
            program,
            args: parts.collect(),
            workdir,
            target_dir: target_dir.to_string(),
        })
    }

    pub fn output_path(&self, target_file: &str) -> PathBuf {
        self.workdir.join(&self.target_dir).join(target_file)
    }
}

impl SpecRenderer for SpectaqlRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<PathBuf, RenderError> {
        let options = request.options(&self.target_dir);
        debug!(program = %self.program, ?options, "invoking generator");

        let output = Command::new(&self.program)
            .args(&self.args)
            .args(options.to_args())
            .current_dir(&self.workdir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                spec_file: request.spec_file.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let path = self.output_path(&request.target_file);
        if !path.is_file() {
            return Err(RenderError::MissingOutput(path));
        }
        info!("Rendered {} -> {}", request.spec_file.display(), path.display());
        Ok(path)
    }
}
