use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use patchlens_core::{AgentConfig, PatchlensError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// The external analysis agent, invoked as an opaque text-in/text-out
/// process.
///
/// The prompt is delivered on standard input, never as a command-line
/// argument, which would hit argument-length ceilings on large patches.
/// Output is streamed to the terminal while being captured. An invocation
/// is hard-cancelled at the configured ceiling; the timeout surfaces as
/// [`PatchlensError::Agent`] instead of hanging the run.
pub struct AnalysisAgent {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl AnalysisAgent {
    /// Create an agent from configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchlens_core::AgentConfig;
    /// use patchlens_review::AnalysisAgent;
    ///
    /// let agent = AnalysisAgent::from_config(&AgentConfig::default());
    /// assert_eq!(agent.describe(), "claude --print");
    /// ```
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// The command line this agent runs, for user-facing messages.
    pub fn describe(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }

    /// Send `prompt` to the agent and return its captured analysis.
    ///
    /// Runs in `workdir` when given, so the agent can inspect the working
    /// copy. Stdout is echoed line by line as it arrives.
    ///
    /// # Errors
    ///
    /// Returns [`PatchlensError::Agent`] if the process cannot be started,
    /// exits non-zero, or exceeds the timeout (in which case it is killed).
    pub async fn analyze(
        &self,
        prompt: &str,
        workdir: Option<&Path>,
    ) -> Result<String, PatchlensError> {
        let mut command = tokio::process::Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = workdir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            PatchlensError::Agent(format!(
                "failed to start '{}': {e}. Is the agent CLI installed?",
                self.command
            ))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PatchlensError::Agent("failed to open agent stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PatchlensError::Agent("failed to open agent stdout".into()))?;

        let prompt = prompt.to_string();
        let run = async move {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| PatchlensError::Agent(format!("failed to write prompt: {e}")))?;
            drop(stdin);

            let mut captured = String::new();
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| PatchlensError::Agent(format!("failed to read agent output: {e}")))?
            {
                println!("{line}");
                captured.push_str(&line);
                captured.push('\n');
            }

            let status = child
                .wait()
                .await
                .map_err(|e| PatchlensError::Agent(format!("failed to wait for agent: {e}")))?;
            if !status.success() {
                return Err(PatchlensError::Agent(format!(
                    "agent exited with {status}"
                )));
            }
            Ok(captured)
        };

        match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result,
            // Dropping the future kills the child (kill_on_drop).
            Err(_) => Err(PatchlensError::Agent(format!(
                "timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}
