//! Script execution

use anyhow::{anyhow, bail, Context, Result};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Run one command line and wait for it
///
/// The line is split on whitespace into a program and its arguments; no
/// shell is involved, so quoting and globbing are not interpreted.
pub fn run_script(line: &str) -> Result<()> {
    let mut parts = line.split_whitespace();
    let program = parts.next().ok_or_else(|| anyhow!("empty command line"))?;

    let status = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .status()
        .with_context(|| format!("Failed to start '{}'", program))?;

    if !status.success() {
        bail!("'{}' exited with {}", line, status);
    }
    Ok(())
}

/// Run every command line in order
///
/// A failing script is logged and does not stop the ones after it.
/// Returns the number of failures.
pub fn run_all(scripts: &[String]) -> usize {
    let mut failures = 0;

    for line in scripts {
        match run_script(line) {
            Ok(()) => debug!("Script '{}' finished", line),
            Err(e) => {
                warn!("Error running event listener: {:#}", e);
                failures += 1;
            }
        }
    }

    failures
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_script_with_arguments() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let marker = temp_dir.path().join("ran");

        run_script(&format!("touch {}", marker.display()))?;

        assert!(marker.exists());
        Ok(())
    }

    #[test]
    fn test_nonzero_exit_is_an_error() {
        let err = run_script("false").unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let err = run_script("/definitely/not/a/program").unwrap_err();
        assert!(err.to_string().contains("Failed to start"));
    }

    #[test]
    fn test_blank_line_is_an_error() {
        assert!(run_script("   ").is_err());
    }

    #[test]
    fn test_failures_do_not_stop_later_scripts() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let marker = temp_dir.path().join("after");

        let scripts = vec![
            "false".to_string(),
            "/definitely/not/a/program".to_string(),
            format!("touch {}", marker.display()),
        ];

        assert_eq!(run_all(&scripts), 2);
        assert!(marker.exists());
        Ok(())
    }
}
