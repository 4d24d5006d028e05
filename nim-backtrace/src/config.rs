//! Tracer configuration
//!
//! Built once per thread. The debug switch comes from the environment and is
//! never re-read afterwards.

use log::info;
use nim_backtrace_common::{DEBUG_ENV_ENABLED, DEBUG_ENV_VAR, INITIAL_LINE_SIZE};

use crate::naming::FramePolicy;

/// Settings for one per-thread tracer
#[derive(Debug, Clone)]
pub struct TracerConfig {
    /// Keep every frame and ignore skip counts
    pub debug: bool,
    /// Which runtime-internal frames to hide or rename
    pub policy: FramePolicy,
    /// Initial capacity guess for one rendered line
    pub initial_line_size: usize,
}

impl TracerConfig {
    /// Defaults, with debug mode taken from the environment
    #[must_use]
    pub fn from_env() -> Self {
        let debug = debug_enabled(std::env::var(DEBUG_ENV_VAR).ok().as_deref());
        if debug {
            info!("{DEBUG_ENV_VAR}={DEBUG_ENV_ENABLED}: frame hiding disabled");
        }
        Self { debug, ..Self::default() }
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FramePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_initial_line_size(mut self, size: usize) -> Self {
        self.initial_line_size = size;
        self
    }
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self { debug: false, policy: FramePolicy::host_runtime(), initial_line_size: INITIAL_LINE_SIZE }
    }
}

/// Only the exact value `"1"` enables debug mode
fn debug_enabled(value: Option<&str>) -> bool {
    value == Some(DEBUG_ENV_ENABLED)
}
