//! Scoped execution of an external program.
//!
//! Every invocation goes through the same discipline: an argument vector and
//! never a shell, a cleared environment with a restricted `PATH` and a private
//! scratch `HOME`, closed stdin, captured output capped at a byte ceiling, an
//! optional external hard-timeout wrapper and an in-process timeout. The child
//! runs in its own process group, which is killed on timeout or overflow, and
//! `kill_on_drop` covers every other exit path.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};
use uuid::Uuid;
use crate::utils::scope_guard::ScopeGuard;

pub const RESTRICTED_PATH: &str = "/usr/bin:/bin";

// Exit codes of coreutils `timeout`: timed out, and killed after --kill-after.
const WRAPPER_TIMED_OUT: i32 = 124;
const WRAPPER_KILLED: i32 = 128 + 9;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("output exceeded the {0} byte limit")]
    OutputLimitExceeded(usize),
    #[error("failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("I/O error while running {program}: {source}")]
    Io { program: String, source: io::Error },
}

/// Output of a process that ran to completion.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct ScopedExecution {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    scratch_root: PathBuf,
    timeout: Duration,
    hard_timeout: Option<(String, Duration)>,
    output_limit: usize,
}

struct Capture {
    bytes: Vec<u8>,
    overflowed: bool,
}

impl ScopedExecution {
    pub fn new(program: impl Into<String>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            scratch_root: scratch_root.into(),
            timeout: Duration::from_secs(5),
            hard_timeout: None,
            output_limit: 64 * 1024,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// In-process timeout; the child group is killed when it fires.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wrap the program in an external timeout program (coreutils `timeout`).
    /// An empty wrapper name disables the hard timeout.
    pub fn hard_timeout(mut self, wrapper: &str, timeout: Duration) -> Self {
        self.hard_timeout = (!wrapper.is_empty()).then(|| (wrapper.to_string(), timeout));
        self
    }

    pub fn output_limit(mut self, bytes: usize) -> Self {
        self.output_limit = bytes;
        self
    }

    /// Effective argument vector, wrapper included.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 4);
        if let Some((wrapper, limit)) = &self.hard_timeout {
            argv.push(wrapper.clone());
            argv.push("--kill-after=1".to_string());
            argv.push(format!("{:.3}s", limit.as_secs_f64()));
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    pub async fn execute(&self) -> Result<Captured, ExecError> {
        let home = self.scratch_root.join(format!(".home-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&home)
            .await
            .map_err(|source| ExecError::Io { program: self.program.clone(), source })?;
        let cleanup_home = home.clone();
        let _home_guard = ScopeGuard::new(move || {
            if let Err(e) = std::fs::remove_dir_all(&cleanup_home) {
                warn!("Failed to remove scratch home {}: {}", cleanup_home.display(), e);
            }
        });

        let argv = self.argv();
        debug!("Executing {:?}", argv);
        let mut child = self.command(&argv, &home).spawn().map_err(|source| ExecError::Spawn {
            program: argv[0].clone(),
            source,
        })?;

        let outcome = tokio::time::timeout(self.timeout, collect(&mut child, self.output_limit)).await;
        match outcome {
            Err(_) => {
                kill_group(&mut child).await;
                Err(ExecError::TimedOut(self.effective_timeout()))
            }
            Ok(Err(source)) => {
                kill_group(&mut child).await;
                Err(ExecError::Io { program: self.program.clone(), source })
            }
            Ok(Ok(None)) => {
                kill_group(&mut child).await;
                Err(ExecError::OutputLimitExceeded(self.output_limit))
            }
            Ok(Ok(Some(captured))) => {
                if let Some((_, limit)) = &self.hard_timeout {
                    if matches!(captured.status.code(), Some(WRAPPER_TIMED_OUT | WRAPPER_KILLED)) {
                        return Err(ExecError::TimedOut(*limit));
                    }
                }
                Ok(captured)
            }
        }
    }

    fn effective_timeout(&self) -> Duration {
        match &self.hard_timeout {
            Some((_, hard)) => self.timeout.min(*hard),
            None => self.timeout,
        }
    }

    fn command(&self, argv: &[String], home: &Path) -> Command {
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .env_clear()
            .env("PATH", RESTRICTED_PATH)
            .env("HOME", home)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        {
            // Always the server's own, unprivileged identity.
            cmd.uid(nix::unistd::getuid().as_raw())
                .gid(nix::unistd::getgid().as_raw())
                .process_group(0);
        }
        cmd
    }
}

/// Drain both pipes under the byte ceiling, then reap the child.
/// `None` means the ceiling was hit.
async fn collect(child: &mut Child, limit: usize) -> io::Result<Option<Captured>> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (out, err) = tokio::join!(read_capped(stdout, limit), read_capped(stderr, limit));
    let (out, err) = (out?, err?);
    if out.overflowed || err.overflowed {
        return Ok(None);
    }
    let status = child.wait().await?;
    Ok(Some(Captured {
        status,
        stdout: String::from_utf8_lossy(&out.bytes).into_owned(),
        stderr: String::from_utf8_lossy(&err.bytes).into_owned(),
    }))
}

async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>, limit: usize) -> io::Result<Capture> {
    let mut bytes = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(Capture { bytes, overflowed: false });
    };
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(Capture { bytes, overflowed: false });
        }
        let room = limit - bytes.len();
        if n > room {
            bytes.extend_from_slice(&chunk[..room]);
            return Ok(Capture { bytes, overflowed: true });
        }
        bytes.extend_from_slice(&chunk[..n]);
    }
}

async fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;
        let _ = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL);
    }
    if let Err(e) = child.kill().await {
        debug!("Child already gone: {}", e);
    }
}
