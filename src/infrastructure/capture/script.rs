//! External capture script adapter

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::application::ports::{CaptureError, CaptureHandle, CaptureLauncher, CaptureRequest};
use crate::domain::config::{DEFAULT_CAPTURE_COMMAND, DEFAULT_HELPER_PROCESS};

/// Runs the capture script as `<command> <uri> <path> <seconds> [1]`.
///
/// The script starts playback and records system audio for roughly the
/// given number of seconds. The trailing `1` turns on its verbose output.
pub struct ScriptCapture {
    command: PathBuf,
    helper_process: String,
}

impl ScriptCapture {
    pub fn new(command: impl Into<PathBuf>, helper_process: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            helper_process: helper_process.into(),
        }
    }

    /// Build the script arguments for a request
    fn build_args(request: &CaptureRequest) -> Vec<String> {
        let mut args = vec![
            request.track.as_uri(),
            request.destination.to_string_lossy().to_string(),
            request.expected_duration_secs.to_string(),
        ];
        if request.verbose {
            args.push("1".to_string());
        }
        args
    }

    async fn ensure_parent_dir(destination: &Path) -> Result<(), CaptureError> {
        match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| {
                    CaptureError::StartFailed(format!(
                        "Cannot create output directory {}: {}",
                        parent.display(),
                        e
                    ))
                }),
            _ => Ok(()),
        }
    }
}

impl Default for ScriptCapture {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_COMMAND, DEFAULT_HELPER_PROCESS)
    }
}

#[async_trait]
impl CaptureLauncher for ScriptCapture {
    async fn launch(&self, request: &CaptureRequest) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        Self::ensure_parent_dir(&request.destination).await?;

        let args = Self::build_args(request);
        tracing::debug!("Running {} {}", self.command.display(), args.join(" "));

        let output = || {
            if request.verbose {
                Stdio::inherit()
            } else {
                Stdio::null()
            }
        };

        let mut command = Command::new(&self.command);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(output())
            .stderr(output())
            .kill_on_drop(true);
        // Own group, so signals reach the helpers the script starts
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureError::CommandNotFound(self.command.display().to_string())
                } else {
                    CaptureError::StartFailed(e.to_string())
                }
            })?;

        Ok(Box::new(ProcessHandle { child }))
    }

    async fn sweep_strays(&self) {
        let result = Command::new("pkill")
            .arg(&self.helper_process)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            // pkill exits 1 when nothing matched
            Ok(status) if status.success() => {
                tracing::info!("Terminated stray {} processes", self.helper_process)
            }
            Ok(_) => tracing::debug!("No stray {} processes", self.helper_process),
            Err(e) => tracing::debug!("pkill unavailable: {}", e),
        }
    }
}

/// A spawned capture script
struct ProcessHandle {
    child: Child,
}

impl ProcessHandle {
    #[cfg(unix)]
    fn exit_code(status: std::process::ExitStatus) -> i32 {
        use std::os::unix::process::ExitStatusExt;
        status
            .code()
            .or_else(|| status.signal().map(|sig| 128 + sig))
            .unwrap_or(-1)
    }

    #[cfg(not(unix))]
    fn exit_code(status: std::process::ExitStatus) -> i32 {
        status.code().unwrap_or(-1)
    }

    /// Signal the script's whole process group. A group that is already
    /// gone is not an error.
    #[cfg(unix)]
    fn signal_group(&self, sig: nix::sys::signal::Signal) -> Result<(), CaptureError> {
        use nix::errno::Errno;
        use nix::sys::signal::killpg;
        use nix::unistd::Pid;

        let Some(id) = self.child.id() else {
            return Ok(());
        };
        match killpg(Pid::from_raw(id as i32), sig) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(CaptureError::SignalFailed(e.to_string())),
        }
    }
}

#[async_trait]
impl CaptureHandle for ProcessHandle {
    async fn wait(&mut self) -> Result<i32, CaptureError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| CaptureError::WaitFailed(e.to_string()))?;
        Ok(Self::exit_code(status))
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> Result<(), CaptureError> {
        self.signal_group(nix::sys::signal::Signal::SIGTERM)
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> Result<(), CaptureError> {
        self.kill()
    }

    fn kill(&mut self) -> Result<(), CaptureError> {
        #[cfg(unix)]
        self.signal_group(nix::sys::signal::Signal::SIGKILL)?;

        match self.child.start_kill() {
            Ok(()) => Ok(()),
            // Already reaped
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(CaptureError::SignalFailed(e.to_string())),
        }
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}
