//! Subprocess invocation for external toolchains.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! External compilers (node-sass, lessc, grunt) run as blocking
//! subprocesses. The exit-code contract is fixed:
//!
//! - `127` - binary not found, the chain may fall back to another compiler
//! - `1..=6` from grunt - task-runner error, fatal
//! - any other non-zero - generic compile failure, fatal

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{CssError, Result};

/// Shell convention for "command not found".
pub const EXIT_NOT_FOUND: i32 = 127;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    pub fn not_found(&self) -> bool {
        self.code == EXIT_NOT_FOUND
    }
}

/// Runs a program to completion and captures its output.
///
/// Abstracted so the fallback policy of the compiler chain can be tested
/// without any toolchain installed.
pub trait ProcessRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ProcessOutput>;
}

/// Runner backed by `std::process::Command`.
///
/// A spawn failure with `ErrorKind::NotFound` is reported as exit code 127
/// so that a missing binary looks the same whether the shell or the OS
/// noticed it first.
#[derive(Debug, Default)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ProcessOutput> {
        tracing::debug!(program, ?args, cwd = %cwd.display(), "running subprocess");

        let output = match Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ProcessOutput {
                    code: EXIT_NOT_FOUND,
                    stdout: String::new(),
                    stderr: format!("{program}: command not found"),
                });
            }
            Err(e) => return Err(CssError::Io(e)),
        };

        Ok(ProcessOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Runner that replays canned outputs and records invocations.
    pub(crate) struct ScriptedRunner {
        pub calls: Mutex<Vec<String>>,
        pub outputs: Mutex<Vec<ProcessOutput>>,
    }

    impl ScriptedRunner {
        pub fn new(outputs: Vec<ProcessOutput>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                outputs: Mutex::new(outputs),
            }
        }

        pub fn exit(code: i32) -> ProcessOutput {
            ProcessOutput {
                code,
                stdout: String::new(),
                stderr: String::new(),
            }
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(&self, program: &str, args: &[String], _cwd: &Path) -> Result<ProcessOutput> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{program} {}", args.join(" ")));
            let mut outputs = self.outputs.lock().unwrap();
            if outputs.is_empty() {
                return Ok(ScriptedRunner::exit(0));
            }
            Ok(outputs.remove(0))
        }
    }
}
