// src/system/executor.rs

use crate::constants::WAIT_POLL_INTERVAL_MS;
use std::path::PathBuf;
use std::process::{Command as StdCommand, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Arguments could not be parsed: {0}")]
    ArgumentParse(String),
    #[error("No program specified to launch.")]
    EmptyCommand,
    #[error("Program '{0}' could not be started: {1}")]
    SpawnFailed(String, std::io::Error),
    #[error("Program '{0}' exited with a non-zero status.")]
    NonZeroExitStatus(String),
    #[error("Wait on program '{0}' failed: {1}")]
    WaitFailed(String, std::io::Error),
    #[error("Program '{command}' (pid {pid}) did not finish within the timeout.")]
    Timeout { command: String, pid: u32 },
}

/// A fully expanded request to start one process.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Program path or name (resolved through the OS search path).
    pub path: String,
    /// Argument string, split with shell-style quoting rules.
    pub arguments: String,
    pub working_dir: Option<PathBuf>,
}

/// Ownership policy for the spawned child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Record the pid and release the handle; the child outlives the action.
    Detach,
    /// Block until the child exits, or until `timeout` elapses. An elapsed
    /// timeout is a reported failure; the wait is abandoned and the child
    /// left running unless `kill_on_timeout` is set.
    Wait {
        timeout: Option<Duration>,
        kill_on_timeout: bool,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct LaunchOutcome {
    pub pid: u32,
    /// Exit code when the launcher waited and the child finished normally.
    pub exit_code: Option<i32>,
}

/// Narrow seam over process creation, so the orchestrator can be exercised
/// with a fake launcher in tests.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, request: &LaunchRequest, wait: WaitMode) -> Result<LaunchOutcome, LaunchError>;
}

/// Launcher backed by `std::process`.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, request: &LaunchRequest, wait: WaitMode) -> Result<LaunchOutcome, LaunchError> {
        let program = request.path.trim();
        if program.is_empty() {
            return Err(LaunchError::EmptyCommand);
        }

        let args = if request.arguments.trim().is_empty() {
            Vec::new()
        } else {
            shlex::split(&request.arguments)
                .ok_or_else(|| LaunchError::ArgumentParse(request.arguments.clone()))?
        };

        let mut command = StdCommand::new(program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &request.working_dir {
            command.current_dir(dunce::simplified(dir));
        }

        let mut child = command
            .spawn()
            .map_err(|e| LaunchError::SpawnFailed(program.to_string(), e))?;
        let pid = child.id();
        log::debug!("launched '{}' (pid {})", program, pid);

        let (timeout, kill_on_timeout) = match wait {
            WaitMode::Detach => {
                // Dropping the handle detaches the child without killing it.
                drop(child);
                return Ok(LaunchOutcome {
                    pid,
                    exit_code: None,
                });
            }
            WaitMode::Wait {
                timeout,
                kill_on_timeout,
            } => (timeout, kill_on_timeout),
        };

        // Blocking poll loop, interruptible by the timeout.
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let exit_code = status.code();
                    if !status.success() {
                        log::warn!("'{}' (pid {}) exited with {:?}", program, pid, exit_code);
                        return Err(LaunchError::NonZeroExitStatus(program.to_string()));
                    }
                    return Ok(LaunchOutcome { pid, exit_code });
                }
                Ok(None) => {
                    if let Some(limit) = timeout {
                        if started.elapsed() >= limit {
                            if kill_on_timeout {
                                log::debug!("timeout elapsed, killing pid {}", pid);
                                if let Err(e) = child.kill() {
                                    log::warn!("failed to kill pid {}: {}", pid, e);
                                }
                                child.wait().ok();
                            } else {
                                // Abandon the wait; the pid stays reported so
                                // the child remains accounted for.
                                drop(child);
                            }
                            return Err(LaunchError::Timeout {
                                command: program.to_string(),
                                pid,
                            });
                        }
                    }
                    std::thread::sleep(Duration::from_millis(WAIT_POLL_INTERVAL_MS));
                }
                Err(e) => {
                    return Err(LaunchError::WaitFailed(program.to_string(), e));
                }
            }
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_empty_program_is_rejected() {
        init_logs();
        let request = LaunchRequest {
            path: "  ".to_string(),
            arguments: String::new(),
            working_dir: None,
        };
        let result = SystemLauncher.launch(&request, WaitMode::Detach);
        assert!(matches!(result, Err(LaunchError::EmptyCommand)));
    }

    #[test]
    fn test_unbalanced_quotes_are_a_parse_error() {
        let request = LaunchRequest {
            path: "echo".to_string(),
            arguments: "'unterminated".to_string(),
            working_dir: None,
        };
        let result = SystemLauncher.launch(&request, WaitMode::Detach);
        assert!(matches!(result, Err(LaunchError::ArgumentParse(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_reports_success_and_exit_code() {
        let request = LaunchRequest {
            path: "sh".to_string(),
            arguments: "-c 'exit 0'".to_string(),
            working_dir: None,
        };
        let outcome = SystemLauncher
            .launch(
                &request,
                WaitMode::Wait {
                    timeout: None,
                    kill_on_timeout: false,
                },
            )
            .unwrap();
        assert!(outcome.pid > 0);
        assert_eq!(outcome.exit_code, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_reports_non_zero_exit_as_failure() {
        let request = LaunchRequest {
            path: "sh".to_string(),
            arguments: "-c 'exit 3'".to_string(),
            working_dir: None,
        };
        let result = SystemLauncher.launch(
            &request,
            WaitMode::Wait {
                timeout: None,
                kill_on_timeout: false,
            },
        );
        assert!(matches!(result, Err(LaunchError::NonZeroExitStatus(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_detach_returns_pid_without_exit_code() {
        let request = LaunchRequest {
            path: "sh".to_string(),
            arguments: "-c 'exit 0'".to_string(),
            working_dir: None,
        };
        let outcome = SystemLauncher.launch(&request, WaitMode::Detach).unwrap();
        assert!(outcome.pid > 0);
        assert!(outcome.exit_code.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_is_reported_and_child_reclaimed() {
        init_logs();
        let request = LaunchRequest {
            path: "sleep".to_string(),
            arguments: "5".to_string(),
            working_dir: None,
        };
        let result = SystemLauncher.launch(
            &request,
            WaitMode::Wait {
                timeout: Some(Duration::from_millis(200)),
                kill_on_timeout: true,
            },
        );
        assert!(matches!(result, Err(LaunchError::Timeout { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_program_is_a_spawn_failure() {
        let request = LaunchRequest {
            path: "shellmenu-no-such-program".to_string(),
            arguments: String::new(),
            working_dir: None,
        };
        let result = SystemLauncher.launch(&request, WaitMode::Detach);
        assert!(matches!(result, Err(LaunchError::SpawnFailed(_, _))));
    }
}
