use anyhow::{Context, Result};
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::trace::LockOp;

/// Patterns naming the lock-lifecycle callees the fixture front end
/// recognizes. Only the callee name matters, never its semantics.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CheckConfig {
    #[serde(default = "default_init_fns")]
    pub init_fns: Vec<String>,
    #[serde(default = "default_destroy_fns")]
    pub destroy_fns: Vec<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            init_fns: default_init_fns(),
            destroy_fns: default_destroy_fns(),
        }
    }
}

impl CheckConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: CheckConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Compile the patterns into a matcher. Patterns are anchored so that
    /// `pthread_mutex_init` does not also match `pthread_mutex_init_ex`.
    pub fn matcher(&self) -> Result<CalleeMatcher> {
        let init = RegexSet::new(self.init_fns.iter().map(|p| format!("^(?:{p})$")))
            .context("invalid init_fns pattern")?;
        let destroy = RegexSet::new(self.destroy_fns.iter().map(|p| format!("^(?:{p})$")))
            .context("invalid destroy_fns pattern")?;
        Ok(CalleeMatcher { init, destroy })
    }
}

/// Compiled form of [`CheckConfig`], classifying callee names.
#[derive(Debug, Clone)]
pub struct CalleeMatcher {
    init: RegexSet,
    destroy: RegexSet,
}

impl CalleeMatcher {
    pub fn classify(&self, callee: &str) -> Option<LockOp> {
        if self.init.is_match(callee) {
            Some(LockOp::Init)
        } else if self.destroy.is_match(callee) {
            Some(LockOp::Destroy)
        } else {
            None
        }
    }
}

// Default values covering the pthread lock-lifecycle API
fn default_init_fns() -> Vec<String> {
    vec![
        r"pthread_mutex_init".to_string(),
        r"pthread_spin_init".to_string(),
    ]
}

fn default_destroy_fns() -> Vec<String> {
    vec![
        r"pthread_mutex_destroy".to_string(),
        r"pthread_spin_destroy".to_string(),
    ]
}
