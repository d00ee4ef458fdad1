use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use crate::config::Config;
use crate::models::ExecResult;
use crate::services::scoped_exec::{Captured, ExecError, ScopedExecution};

pub const SOURCE_FILE: &str = "main.c";
pub const EXECUTABLE_FILE: &str = "main";

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Build timed out after {0:?}")]
    BuildTimeout(Duration),
    #[error("Execution timed out after {0:?}")]
    RunTimeout(Duration),
    #[error("Executable not found: {}. Build the program first.", .0.display())]
    ExecutableNotFound(PathBuf),
    #[error("Output exceeded the {0} byte limit")]
    OutputLimitExceeded(usize),
    #[error("Failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("Process exited with {status}{}", stderr_suffix(.stderr))]
    Failed { status: String, stdout: String, stderr: String },
    #[error("Sandbox I/O error: {0}")]
    Io(#[from] io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", stderr.trim_end())
    }
}

/// Fixed limits of the sandbox, taken from the service configuration.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub root: PathBuf,
    pub compiler: String,
    pub compiler_flags: Vec<String>,
    pub timeout_program: String,
    pub build_timeout: Duration,
    pub build_guard: Duration,
    pub run_timeout: Duration,
    pub run_guard: Duration,
    pub build_output_limit: usize,
    pub run_output_limit: usize,
}

impl SandboxConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.sandbox_dir.clone(),
            compiler: config.compiler.clone(),
            compiler_flags: config.compiler_flags.clone(),
            timeout_program: config.timeout_program.clone(),
            build_timeout: config.build_timeout(),
            build_guard: config.build_guard(),
            run_timeout: config.run_timeout(),
            run_guard: config.run_guard(),
            build_output_limit: config.build_output_limit,
            run_output_limit: config.run_output_limit,
        }
    }
}

/// Compiles and runs untrusted C code.
///
/// Holds no state between calls besides its configuration. Builds and runs
/// issued by different workspaces may overlap freely, each is bounded by its
/// own timeouts.
#[derive(Debug, Clone)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(mut config: SandboxConfig) -> Self {
        // Executables are launched by path, so anchor everything absolutely.
        if let Ok(root) = std::path::absolute(&config.root) {
            config.root = root;
        }
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Directory holding the source and binary of one workspace.
    pub fn workspace_dir(&self, workspace: &str) -> PathBuf {
        let name: String = workspace
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        self.config.root.join(if name.is_empty() { "default".to_string() } else { name })
    }

    pub async fn build(&self, source: &Path, output: &Path) -> ExecResult {
        let result = self.try_build(source, output).await;
        if let Err(e) = &result {
            warn!("Build of {} failed: {}", source.display(), e);
        }
        exec_result(result, "Build completed successfully")
    }

    pub async fn run(&self, executable: &Path) -> ExecResult {
        let result = self.try_run(executable).await;
        if let Err(e) = &result {
            warn!("Run of {} failed: {}", executable.display(), e);
        }
        exec_result(result, "")
    }

    pub async fn try_build(&self, source: &Path, output: &Path) -> Result<Captured, SandboxError> {
        let cwd = source.parent().unwrap_or(&self.config.root).to_path_buf();
        let exec = ScopedExecution::new(&self.config.compiler, &self.config.root)
            .args(self.config.compiler_flags.iter().cloned())
            .arg("-o")
            .arg(output.to_string_lossy())
            .arg(source.to_string_lossy())
            .current_dir(cwd)
            .hard_timeout(&self.config.timeout_program, self.config.build_timeout)
            .timeout(self.config.build_guard)
            .output_limit(self.config.build_output_limit);

        info!("🔨 Building {}", source.display());
        let captured = exec.execute().await.map_err(|e| match e {
            ExecError::TimedOut(limit) => SandboxError::BuildTimeout(limit),
            other => from_exec_error(other),
        })?;
        check_status(captured)
    }

    pub async fn try_run(&self, executable: &Path) -> Result<Captured, SandboxError> {
        match tokio::fs::metadata(executable).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(SandboxError::ExecutableNotFound(executable.to_path_buf())),
        }

        let cwd = executable.parent().unwrap_or(&self.config.root).to_path_buf();
        let exec = ScopedExecution::new(executable.to_string_lossy(), &self.config.root)
            .current_dir(cwd)
            .hard_timeout(&self.config.timeout_program, self.config.run_timeout)
            .timeout(self.config.run_guard)
            .output_limit(self.config.run_output_limit);

        info!("▶️ Running {}", executable.display());
        let captured = exec.execute().await.map_err(|e| match e {
            ExecError::TimedOut(limit) => SandboxError::RunTimeout(limit),
            other => from_exec_error(other),
        })?;
        check_status(captured)
    }

    /// Write `code` into the workspace and compile it there.
    pub async fn build_source(&self, workspace: &str, code: &str) -> ExecResult {
        let dir = self.workspace_dir(workspace);
        let source = dir.join(SOURCE_FILE);
        let prepared = match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => tokio::fs::write(&source, code).await,
            Err(e) => Err(e),
        };
        if let Err(e) = prepared {
            error!("Failed to prepare workspace {}: {}", dir.display(), e);
            return exec_result(Err(SandboxError::Io(e)), "");
        }
        self.build(&source, &dir.join(EXECUTABLE_FILE)).await
    }

    /// Run the binary last built in the workspace.
    pub async fn run_workspace(&self, workspace: &str) -> ExecResult {
        self.run(&self.workspace_dir(workspace).join(EXECUTABLE_FILE)).await
    }

    pub async fn discard_workspace(&self, workspace: &str) {
        let dir = self.workspace_dir(workspace);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => info!("Removed sandbox workspace {}", dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove sandbox workspace {}: {}", dir.display(), e),
        }
    }
}

fn from_exec_error(e: ExecError) -> SandboxError {
    match e {
        ExecError::OutputLimitExceeded(limit) => SandboxError::OutputLimitExceeded(limit),
        ExecError::Spawn { program, source } => SandboxError::Spawn { program, source },
        ExecError::Io { source, .. } => SandboxError::Io(source),
        // Mapped by the caller, which knows whether it was a build or a run.
        ExecError::TimedOut(limit) => SandboxError::RunTimeout(limit),
    }
}

fn check_status(captured: Captured) -> Result<Captured, SandboxError> {
    if captured.status.success() {
        Ok(captured)
    } else {
        Err(SandboxError::Failed {
            status: captured.status.to_string(),
            stdout: captured.stdout,
            stderr: captured.stderr,
        })
    }
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Shape a sandbox outcome into the structured result sent to clients.
pub fn exec_result(result: Result<Captured, SandboxError>, empty_output: &str) -> ExecResult {
    match result {
        Ok(captured) => ExecResult {
            success: true,
            output: Some(if captured.stdout.is_empty() { empty_output.to_string() } else { captured.stdout }),
            error: non_empty(captured.stderr),
        },
        Err(SandboxError::Failed { status, stdout, stderr }) => {
            let message = SandboxError::Failed { status, stdout: String::new(), stderr }.to_string();
            ExecResult { success: false, output: non_empty(stdout), error: Some(message) }
        }
        Err(e) => ExecResult { success: false, output: None, error: Some(e.to_string()) },
    }
}
