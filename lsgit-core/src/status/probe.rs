//! The batched shell probe that collects git status for every subdirectory

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::ProbeConfig;
use crate::error::PipelineError;

/// Walks the immediate subdirectories of the working directory and prints one
/// JSON record per git top-level working tree.
///
/// `$1` is the git executable. Paths are printed relative to the working
/// directory. Directories that are not the top level of a working tree are
/// skipped; a branch without a resolvable remote-tracking ref reports
/// `missing`. Expected per-directory failures are silenced so that anything
/// reaching stderr is a genuine problem. `esc` emits JSON string contents,
/// with control characters as `\u00XX` escapes.
pub const PROBE_SCRIPT: &str = r#"
git="${1:-git}"
esc() {
  printf '%s' "$1" | LC_ALL=C awk '
    BEGIN { for (i = 1; i < 32; i++) code[sprintf("%c", i)] = i }
    {
      if (NR > 1) printf "\\n"
      n = length($0)
      for (i = 1; i <= n; i++) {
        c = substr($0, i, 1)
        if (c == "\\" || c == "\"") printf "\\%s", c
        else if (c in code) printf "\\u%04x", code[c]
        else printf "%s", c
      }
    }'
}
find . -mindepth 1 -maxdepth 1 -type d | LC_ALL=C sort | while IFS= read -r dir; do
  name=${dir#./}
  top=$("$git" -C "$dir" rev-parse --show-toplevel 2>/dev/null) || continue
  [ "$(cd "$top" 2>/dev/null && pwd -P)" = "$(cd "$dir" && pwd -P)" ] || continue
  branch=$("$git" -C "$dir" symbolic-ref --short -q HEAD 2>/dev/null)
  remote=""
  ff=missing
  if [ -n "$branch" ]; then
    remote=$("$git" -C "$dir" config --get "branch.$branch.remote" 2>/dev/null)
    merge=$("$git" -C "$dir" config --get "branch.$branch.merge" 2>/dev/null)
    tracking="refs/remotes/$remote/${merge#refs/heads/}"
    if [ -n "$remote" ] && [ -n "$merge" ] && "$git" -C "$dir" rev-parse -q --verify "$tracking" >/dev/null 2>&1; then
      if "$git" -C "$dir" merge-base --is-ancestor "$tracking" HEAD 2>/dev/null; then
        ff=true
      else
        ff=false
      fi
    fi
  fi
  printf '{"path":"%s","branch":"%s","remote":"%s","ff":"%s"}\n' \
    "$(esc "$name")" "$(esc "$branch")" "$(esc "$remote")" "$ff"
done
"#;

/// Source of raw status records for a directory
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Run one probe rooted at `root` and return its raw output
    async fn probe(&self, root: &Path) -> Result<String, PipelineError>;
}

/// Apply the all-or-nothing diagnostic policy to captured process output
///
/// Any stderr output fails the whole batch, even when stdout holds valid
/// records.
pub fn classify_output(stdout: &[u8], stderr: &[u8]) -> Result<String, PipelineError> {
    let raw_out = String::from_utf8_lossy(stdout).into_owned();
    if !stderr.is_empty() {
        return Err(PipelineError::ProbeOutput {
            raw_out,
            raw_err: String::from_utf8_lossy(stderr).into_owned(),
        });
    }
    Ok(raw_out)
}

/// Probe that runs a shell script in the listing's root directory
#[derive(Debug, Clone)]
pub struct ShellProbe {
    shell: String,
    git_path: String,
    script: String,
}

impl Default for ShellProbe {
    fn default() -> Self {
        Self::new(&ProbeConfig::default())
    }
}

impl ShellProbe {
    /// Create a probe running the built-in script
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            git_path: config.git_path.clone(),
            script: PROBE_SCRIPT.to_string(),
        }
    }

    /// Replace the script the shell runs
    ///
    /// The script receives the git executable as `$1` and runs with the
    /// probed root as its working directory.
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    fn command(&self, root: &Path) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&self.script)
            .arg("lsgit-probe")
            .arg(&self.git_path)
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl StatusProbe for ShellProbe {
    async fn probe(&self, root: &Path) -> Result<String, PipelineError> {
        if !root.is_dir() {
            return Err(PipelineError::ProbeSpawn {
                reason: format!("Directory does not exist: {}", root.display()),
            });
        }

        tracing::debug!(root = %root.display(), shell = %self.shell, "Starting status probe");

        let output = self.command(root).output().await.map_err(|e| {
            let reason = if e.kind() == ErrorKind::NotFound {
                format!("Shell '{}' not found", self.shell)
            } else {
                format!("Failed to run '{}': {}", self.shell, e)
            };
            PipelineError::ProbeSpawn { reason }
        })?;

        tracing::debug!(
            root = %root.display(),
            status = %output.status,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Status probe finished"
        );

        classify_output(&output.stdout, &output.stderr)
    }
}
