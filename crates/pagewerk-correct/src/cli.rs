// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared subprocess plumbing for command-line AI clients.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use pagewerk_core::error::{PagewerkError, Result};
use tokio::process::Command;
use tracing::debug;

/// Timeout for `--version` availability probes.
pub const PROBE_TIMEOUT_SECS: u64 = 5;

/// Run `program` with `args` and return its trimmed stdout.
///
/// The child is killed if the returned future is dropped, so callers may wrap
/// this in their own timeout.
pub async fn run_cli<I, S>(program: &Path, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|err| {
            PagewerkError::ServiceError(format!("cannot run {}: {}", program.display(), err))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            "no diagnostic output".to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(PagewerkError::ServiceError(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            detail
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!(program = %program.display(), bytes = stdout.len(), "CLI call finished");
    Ok(stdout)
}

/// Whether `program --version` exits successfully within the probe timeout.
pub async fn probe_version(program: &Path) -> bool {
    let probe = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status();

    match tokio::time::timeout(Duration::from_secs(PROBE_TIMEOUT_SECS), probe).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(err)) => {
            debug!(program = %program.display(), %err, "availability probe failed to start");
            false
        }
        Err(_) => {
            debug!(program = %program.display(), "availability probe timed out");
            false
        }
    }
}
