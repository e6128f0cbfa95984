//! Runner configuration
//!
//! Settings come from an optional TOML file and from the command line.
//! Command-line lists are appended to the file's lists; scalar flags
//! override the file.
//!
//! ```toml
//! watch = ["main.c", "src/*.c"]
//! run = ["make", "./run.sh --quick"]
//! damping_secs = 1
//! verbose = false
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Files or shell patterns to watch
    pub watch: Vec<String>,
    /// Command lines to run on every event, in order
    pub run: Vec<String>,
    /// Damping window in seconds (0 disables damping)
    pub damping_secs: u64,
    /// Log at debug level
    pub verbose: bool,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Fold command-line values into this configuration
    pub fn merge(&mut self, watch: Vec<String>, run: Vec<String>, damping_secs: Option<u64>, verbose: bool) {
        self.watch.extend(watch);
        self.run.extend(run);

        if let Some(secs) = damping_secs {
            self.damping_secs = secs;
        }
        self.verbose |= verbose;
    }

    /// Check that there is something to watch and something to run
    pub fn validate(&self) -> Result<()> {
        if self.watch.is_empty() {
            bail!("no watch files");
        }
        if self.run.is_empty() {
            bail!("no scripts to run");
        }
        Ok(())
    }

    pub fn damping(&self) -> Duration {
        Duration::from_secs(self.damping_secs)
    }
}
