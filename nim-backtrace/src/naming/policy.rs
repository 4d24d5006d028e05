//! Frame category classification for hiding runtime-internal frames.
//!
//! The host runtime wraps every program in a few generated entry functions and
//! routes every raised exception through its own stack trace printer. Those
//! frames are noise in a user-facing backtrace, so each known name is mapped
//! to a [`FrameCategory`] and each category to a [`FilterDecision`].
//!
//! # Categories
//!
//! 1. **Bootstrap** - program startup (`NimMain`, `main`, ...)
//!    - kept until the module entry frame has been seen, then the backtrace stops
//!    - stopping unconditionally would empty the backtrace of release builds,
//!      where the module entry is inlined away
//!
//! 2. **Machinery** - stack trace printing and exception raising internals
//!    - always hidden, the frames beneath are still shown
//!
//! 3. **Module entry** - the synthetic entry function of a source file
//!    - renamed to the file's base name (`/foo/bar/test2.nim` -> `test2`)
//!
//! Debug mode disables hiding and stopping; renaming still applies.

use std::collections::HashMap;

use nim_backtrace_common::MODULE_EXTENSION_LEN;

use crate::domain::FilterDecision;

/// Category of a runtime-internal frame name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameCategory {
    /// Runtime startup function above the program's own entry
    Bootstrap,
    /// Stack trace or exception machinery
    Machinery,
    /// Synthetic per-file entry function
    ModuleEntry,
}

impl FrameCategory {
    /// Map this category to a filter decision.
    ///
    /// `module_entry_seen` is whether a [`FrameCategory::ModuleEntry`] frame
    /// was already resolved earlier in the same backtrace. `renamed` is the
    /// replacement name used for module entry frames.
    #[must_use]
    pub fn decision(self, module_entry_seen: bool, debug: bool, renamed: String) -> FilterDecision {
        match self {
            FrameCategory::Bootstrap if module_entry_seen && !debug => FilterDecision::StopBacktrace,
            FrameCategory::Machinery if !debug => FilterDecision::SkipFrame,
            FrameCategory::ModuleEntry => FilterDecision::Rename(renamed),
            _ => FilterDecision::Keep,
        }
    }
}

// =============================================================================
// CLASSIFICATION TABLES
// =============================================================================

/// Runtime startup functions
const BOOTSTRAP_NAMES: &[&str] = &["NimMainInner", "NimMain", "main"];

/// Stack trace printing and exception raising internals
///
/// These appear when the library is used inside the host compiler itself.
const MACHINERY_NAMES: &[&str] = &[
    "auxWriteStackTraceWithOverride",
    "rawWriteStackTrace",
    "writeStackTrace",
    "raiseExceptionAux",
];

/// Prefixes of machinery functions with generated suffixes
const MACHINERY_PREFIXES: &[&str] = &["raiseExceptionEx"];

/// Synthetic entry function generated for each source module
const MODULE_ENTRY_NAME: &str = "NimMainModule";

/// Marker separating a stack-language name from its generated suffix
const SUFFIX_MARKER: &str = "__";

/// Pluggable denylist of runtime-internal frame names.
///
/// Exact names are looked up in a table; prefixes are checked in insertion
/// order after the table misses.
#[derive(Debug, Clone)]
pub struct FramePolicy {
    names: HashMap<String, FrameCategory>,
    prefixes: Vec<(String, FrameCategory)>,
    suffix_marker: Option<String>,
    extension_len: usize,
}

impl FramePolicy {
    /// A policy that hides and renames nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
            prefixes: Vec::new(),
            suffix_marker: Some(SUFFIX_MARKER.to_string()),
            extension_len: MODULE_EXTENSION_LEN,
        }
    }

    /// The host runtime's generated frame names.
    #[must_use]
    pub fn host_runtime() -> Self {
        let mut policy = Self::empty().with_module_entry(MODULE_ENTRY_NAME);
        for name in BOOTSTRAP_NAMES {
            policy = policy.with_bootstrap(name);
        }
        for name in MACHINERY_NAMES {
            policy = policy.with_machinery(name);
        }
        for prefix in MACHINERY_PREFIXES {
            policy = policy.with_machinery_prefix(prefix);
        }
        policy
    }

    #[must_use]
    pub fn with_bootstrap(mut self, name: &str) -> Self {
        self.names.insert(name.to_owned(), FrameCategory::Bootstrap);
        self
    }

    #[must_use]
    pub fn with_machinery(mut self, name: &str) -> Self {
        self.names.insert(name.to_owned(), FrameCategory::Machinery);
        self
    }

    #[must_use]
    pub fn with_machinery_prefix(mut self, prefix: &str) -> Self {
        self.prefixes.push((prefix.to_owned(), FrameCategory::Machinery));
        self
    }

    #[must_use]
    pub fn with_module_entry(mut self, name: &str) -> Self {
        self.names.insert(name.to_owned(), FrameCategory::ModuleEntry);
        self
    }

    /// Change the marker at which names are truncated (`None` disables it).
    #[must_use]
    pub fn with_suffix_marker(mut self, marker: Option<&str>) -> Self {
        self.suffix_marker = marker.map(str::to_owned);
        self
    }

    /// Change the length of the extension stripped from module entry file names.
    /// Classify a demangled function name.
    #[must_use]
    pub fn classify(&self, function: &str) -> Option<FrameCategory> {
        if let Some(category) = self.names.get(function) {
            return Some(*category);
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| function.starts_with(prefix.as_str()))
            .map(|(_, category)| *category)
    }

    /// Truncate a name at the first suffix marker of its last path segment.
    ///
    /// A segment that starts with the marker (`__rust_begin_short_backtrace`,
    /// `std::sys::backtrace::__rust_begin_short_backtrace`) is left whole.
    #[must_use]
    pub fn strip_suffix<'a>(&self, name: &'a str) -> &'a str {
        let Some(marker) = self.suffix_marker.as_deref() else {
            return name;
        };
        let segment = name.rfind("::").map_or(0, |pos| pos + 2);
        match name[segment..].find(marker) {
            Some(0) | None => name,
            Some(pos) => &name[..segment + pos],
        }
    }

    /// Base name of a module source file, used as the module entry frame name.
    ///
    /// `"/foo/bar/test2.nim"` becomes `"test2"`. The extension is only removed
    /// when the base name is longer than it.
    #[must_use]
    pub fn module_name(&self, filename: &str) -> String {
        let trimmed = filename.trim_end_matches(['/', '\\']);
        let base = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
        if base.len() > self.extension_len {
            if let Some(stem) = base.get(..base.len() - self.extension_len) {
                return stem.to_owned();
            }
        }
        base.to_owned()
    }
}

impl Default for FramePolicy {
    fn default() -> Self {
        Self::host_runtime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_runtime_tables() {
        let policy = FramePolicy::host_runtime();
        assert_eq!(policy.classify("NimMain"), Some(FrameCategory::Bootstrap));
        assert_eq!(policy.classify("main"), Some(FrameCategory::Bootstrap));
        assert_eq!(policy.classify("rawWriteStackTrace"), Some(FrameCategory::Machinery));
        assert_eq!(policy.classify("NimMainModule"), Some(FrameCategory::ModuleEntry));
        assert_eq!(policy.classify("helperFn"), None);
    }

    #[test]
    fn test_machinery_prefix() {
        let policy = FramePolicy::host_runtime();
        assert_eq!(policy.classify("raiseExceptionEx"), Some(FrameCategory::Machinery));
        assert_eq!(policy.classify("raiseExceptionExWithMsg"), Some(FrameCategory::Machinery));
        // Exact names only, no prefix match
        assert_eq!(policy.classify("mainLoop"), None);
    }

    #[test]
    fn test_empty_policy_hides_nothing() {
        let policy = FramePolicy::empty();
        assert_eq!(policy.classify("NimMain"), None);
        assert_eq!(policy.classify("raiseExceptionEx"), None);
    }

    #[test]
    fn test_bootstrap_stops_only_after_module_entry() {
        let cat = FrameCategory::Bootstrap;
        assert_eq!(cat.decision(false, false, String::new()), FilterDecision::Keep);
        assert_eq!(cat.decision(true, false, String::new()), FilterDecision::StopBacktrace);
        assert_eq!(cat.decision(true, true, String::new()), FilterDecision::Keep);
    }

    #[test]
    fn test_machinery_skipped_unless_debug() {
        let cat = FrameCategory::Machinery;
        assert_eq!(cat.decision(false, false, String::new()), FilterDecision::SkipFrame);
        assert_eq!(cat.decision(true, false, String::new()), FilterDecision::SkipFrame);
        assert_eq!(cat.decision(false, true, String::new()), FilterDecision::Keep);
    }

    #[test]
    fn test_module_entry_renamed_in_debug_mode_too() {
        let cat = FrameCategory::ModuleEntry;
        assert_eq!(
            cat.decision(false, true, "test2".to_string()),
            FilterDecision::Rename("test2".to_string())
        );
    }

    #[test]
    fn test_strip_suffix() {
        let policy = FramePolicy::host_runtime();
        assert_eq!(policy.strip_suffix("foo__bar_123"), "foo");
        assert_eq!(policy.strip_suffix("plain"), "plain");
        assert_eq!(policy.strip_suffix("__leading"), "__leading");
        assert_eq!(policy.with_suffix_marker(None).strip_suffix("foo__bar"), "foo__bar");
    }

    #[test]
    fn test_strip_suffix_keeps_rust_paths() {
        let policy = FramePolicy::host_runtime();
        assert_eq!(
            policy.strip_suffix("std::sys::backtrace::__rust_begin_short_backtrace"),
            "std::sys::backtrace::__rust_begin_short_backtrace"
        );
        assert_eq!(
            policy.strip_suffix("test::__rust_begin_short_backtrace"),
            "test::__rust_begin_short_backtrace"
        );
        assert_eq!(policy.strip_suffix("app::worker__gen_1"), "app::worker");
        assert_eq!(policy.strip_suffix("ns::helper"), "ns::helper");
    }

    #[test]
    fn test_module_name() {
        let policy = FramePolicy::host_runtime();
        assert_eq!(policy.module_name("/foo/bar/test2.nim"), "test2");
        assert_eq!(policy.module_name("test2.nim"), "test2");
        assert_eq!(policy.module_name("C:\\src\\app.nim"), "app");
        // Not longer than the extension: left alone
        assert_eq!(policy.module_name("/x/a.ni"), "a.ni");
        assert_eq!(policy.module_name("/x/.nim"), ".nim");
    }
}
