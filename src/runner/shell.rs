// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Shell step execution
//!
//! Runs one step body as `shell -c <body>`. The body is opaque: the
//! runner sequences and gates commands, it never parses them.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;

/// Captured output of one step command
#[derive(Debug, Clone)]
pub(crate) struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: std::time::Duration,
}

/// Run a step body under the given shell
///
/// A shell that cannot be spawned is reported as a failed command, not a
/// crate error: from the job's point of view both are external failures.
/// `kill_on_drop` ensures the child dies when the job times out and this
/// future is dropped.
pub(crate) async fn run_step_command(
    shell: &str,
    body: &str,
    working_dir: &Path,
    env: &HashMap<String, String>,
) -> CommandOutput {
    let start = Instant::now();

    let shell_path = match which::which(shell) {
        Ok(path) => path,
        Err(_) => {
            return CommandOutput {
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: format!("shell '{}' not found", shell),
                duration: start.elapsed(),
            };
        }
    };

    let mut cmd = Command::new(shell_path);
    cmd.arg("-c").arg(body);
    cmd.current_dir(working_dir);
    cmd.envs(env);
    cmd.kill_on_drop(true);

    match cmd.output().await {
        Ok(output) => CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        },
        Err(e) => CommandOutput {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: format!("failed to spawn '{}': {}", shell, e),
            duration: start.elapsed(),
        },
    }
}
