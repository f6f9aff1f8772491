// src/exec/preview.rs

//! Preview server process.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// A running preview server.
///
/// The child is spawned with `kill_on_drop`, so dropping the handle is
/// enough to stop it; [`PreviewServer::shutdown`] additionally waits for
/// the process to exit.
#[derive(Debug)]
pub struct PreviewServer {
    command: String,
    child: Child,
}

impl PreviewServer {
    /// Run `command` through the platform shell with `out_dir` appended as
    /// its last argument.
    pub fn spawn(command: &str, out_dir: &Path) -> Result<Self> {
        let full = format!("{} {}", command, quote(&out_dir.to_string_lossy()));

        info!(cmd = %full, "starting preview server");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&full);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&full);
            c
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning preview server '{}'", full))?;

        // Always consume output so buffers don't fill; log at debug.
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "blogwatch::preview", "stdout: {}", line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "blogwatch::preview", "stderr: {}", line);
                }
            });
        }

        Ok(Self {
            command: full,
            child,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the process (if still running) and wait for it to exit.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(status) = self.child.try_wait()? {
            warn!(cmd = %self.command, %status, "preview server had already exited");
            return Ok(());
        }
        self.child
            .kill()
            .await
            .with_context(|| format!("killing preview server '{}'", self.command))?;
        info!(cmd = %self.command, "preview server stopped");
        Ok(())
    }
}

fn quote(arg: &str) -> String {
    if cfg!(windows) {
        format!("\"{}\"", arg)
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
