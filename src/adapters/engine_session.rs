//! Scoped external engine processes.
//!
//! An [`EngineSession`] is one running engine process. It is created per
//! invocation and killed when dropped if it is still running, so a timeout,
//! a cancelled run or a failed conversion cannot leave the engine behind.
//!
//! Invocation variables (script path, entry point, input file) reach the
//! engine two ways: `{name}` placeholders in the argument template are
//! substituted, and each variable is exported as `FUSETRADER_<NAME>`.

use crate::domain::error::ExternalEngineError;
use serde_json::Value;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::debug;

/// Program plus argument template for launching an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    program: String,
    args: Vec<String>,
}

impl EngineCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Arguments with every `{name}` placeholder replaced by its value.
    pub fn expand_args(&self, vars: &[(&str, &str)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (name, value)| {
                    acc.replace(&format!("{{{}}}", name), value)
                })
            })
            .collect()
    }
}

pub fn env_var_name(name: &str) -> String {
    format!("FUSETRADER_{}", name.to_uppercase())
}

pub struct EngineSession {
    engine: String,
    child: Child,
}

impl EngineSession {
    /// Starts the engine. `piped_stdin` opens a pipe for [`communicate`]'s
    /// input; otherwise stdin is closed.
    ///
    /// [`communicate`]: EngineSession::communicate
    pub fn spawn(
        engine: &str,
        command: &EngineCommand,
        vars: &[(&str, &str)],
        piped_stdin: bool,
    ) -> Result<Self, ExternalEngineError> {
        let mut cmd = Command::new(command.program());
        cmd.args(command.expand_args(vars))
            .stdin(if piped_stdin {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (name, value) in vars {
            cmd.env(env_var_name(name), value);
        }

        let child = cmd
            .spawn()
            .map_err(|e| ExternalEngineError::Unavailable {
                engine: engine.to_string(),
                reason: format!("failed to start {}: {}", command.program(), e),
            })?;
        debug!(engine, program = command.program(), pid = ?child.id(), "engine session started");

        Ok(Self {
            engine: engine.to_string(),
            child,
        })
    }

    /// Feeds `input` to stdin, collects stdout and waits for the engine to
    /// exit. A non-zero exit status is reported with the engine's stderr.
    pub async fn communicate(&mut self, input: &[u8]) -> Result<Vec<u8>, ExternalEngineError> {
        let stdin = self.child.stdin.take();
        let mut stdout = self.child.stdout.take().ok_or_else(|| self.unavailable("stdout not captured"))?;
        let mut stderr = self.child.stderr.take().ok_or_else(|| self.unavailable("stderr not captured"))?;

        let write = async {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(input).await {
                    // The engine may exit without reading its input.
                    Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
            }
            Ok::<(), io::Error>(())
        };
        let read_stdout = async {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await.map(|_| buf)
        };
        let read_stderr = async {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await.map(|_| buf)
        };

        let ((), out, err) = tokio::try_join!(write, read_stdout, read_stderr)
            .map_err(|e| self.unavailable(&e.to_string()))?;

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| self.unavailable(&e.to_string()))?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&err);
            return Err(ExternalEngineError::MalformedOutput {
                reason: format!(
                    "{} engine exited with {}: {}",
                    self.engine,
                    status,
                    stderr.trim()
                ),
            });
        }

        debug!(engine = %self.engine, bytes = out.len(), "engine session finished");
        Ok(out)
    }

    fn unavailable(&self, reason: &str) -> ExternalEngineError {
        ExternalEngineError::Unavailable {
            engine: self.engine.clone(),
            reason: reason.to_string(),
        }
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        debug!(engine = %self.engine, pid = ?self.child.id(), "terminating engine session");
        let _ = self.child.start_kill();
    }
}

/// Fails with `ScriptMissing` unless `path` is an existing file.
pub fn require_script(path: &Path) -> Result<(), ExternalEngineError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ExternalEngineError::ScriptMissing {
            path: path.display().to_string(),
        })
    }
}

/// Parses engine stdout as JSON. Engines may print banners or warnings
/// before their result, so the last non-blank line is tried when the whole
/// output is not valid JSON.
pub fn parse_engine_output(stdout: &[u8]) -> Result<Value, ExternalEngineError> {
    let text = std::str::from_utf8(stdout).map_err(|e| ExternalEngineError::MalformedOutput {
        reason: format!("output is not UTF-8: {}", e),
    })?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExternalEngineError::MalformedOutput {
            reason: "engine produced no output".into(),
        });
    }

    serde_json::from_str(trimmed).or_else(|whole_err| {
        let last_line = trimmed.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or_default();
        serde_json::from_str(last_line.trim()).map_err(|_| ExternalEngineError::MalformedOutput {
            reason: format!("output is not JSON: {}", whole_err),
        })
    })
}
