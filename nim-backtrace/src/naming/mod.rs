//! # Function Name Resolution and Frame Filtering
//!
//! Turns a backend record's raw linkage name into the name shown in the
//! backtrace, and decides whether the frame is shown at all.
//!
//! ## Resolution Steps
//!
//! ```text
//! 1. Demangle (Rust, then Itanium C++); drop a C++ parameter list
//!    _Z3fooic -> foo(int, char) -> foo
//!
//! 2. Truncate at the first "__" (host compiler suffix convention)
//!    writeStackTrace__system_1234 -> writeStackTrace
//!
//! 3. Classify against the frame policy
//!    Bootstrap / Machinery / ModuleEntry / ordinary
//!
//! 4. Rename module entry frames after their file
//!    NimMainModule @ /foo/bar/test2.nim -> test2
//! ```
//!
//! A [`NameResolver`] lives for one backtrace: it remembers whether the module
//! entry frame was already seen, which turns later bootstrap frames into a
//! stop signal.

pub mod demangle;
pub mod policy;

use log::trace;

use crate::domain::{DebugRecord, FilterDecision, RawRecord};

pub use demangle::{demangle, demangle_function, Demangled, Mangling};
pub use policy::{FrameCategory, FramePolicy};

/// Per-backtrace name resolver
pub struct NameResolver<'a> {
    policy: &'a FramePolicy,
    debug: bool,
    module_entry_seen: bool,
}

impl<'a> NameResolver<'a> {
    /// Create a resolver for one backtrace
    pub fn new(policy: &'a FramePolicy, debug: bool) -> Self {
        Self { policy, debug, module_entry_seen: false }
    }

    /// Whether a module entry frame has been resolved so far
    #[must_use]
    pub fn module_entry_seen(&self) -> bool {
        self.module_entry_seen
    }

    /// Resolve one mangled name found in `filename`.
    ///
    /// Returns the cleaned-up name and the filter decision for the frame.
    pub fn resolve(&mut self, mangled: &str, filename: &str) -> (String, FilterDecision) {
        let demangled = demangle_function(mangled);
        let name = self.policy.strip_suffix(&demangled).to_owned();

        let decision = match self.policy.classify(&name) {
            None => FilterDecision::Keep,
            Some(category) => {
                let renamed = if category == FrameCategory::ModuleEntry {
                    self.policy.module_name(filename)
                } else {
                    String::new()
                };
                let decision = category.decision(self.module_entry_seen, self.debug, renamed);
                if category == FrameCategory::ModuleEntry {
                    self.module_entry_seen = true;
                }
                decision
            }
        };

        trace!("{mangled} -> {name}: {decision:?}");
        (name, decision)
    }

    /// Resolve a backend record into a renderable record.
    ///
    /// Records without a function or file name are never demangled: they come
    /// back as `SkipFrame`, since inlining can interleave such gaps with valid
    /// records at the same address.
    pub fn resolve_record(&mut self, raw: &RawRecord) -> (Option<DebugRecord>, FilterDecision) {
        let (Some(filename), Some(function)) = (raw.filename.as_deref(), raw.function.as_deref())
        else {
            return (None, FilterDecision::SkipFrame);
        };
        if filename.is_empty() || function.is_empty() {
            return (None, FilterDecision::SkipFrame);
        }

        let (name, decision) = self.resolve(function, filename);
        if !decision.is_rendered() {
            return (None, decision);
        }
        let function = match &decision {
            FilterDecision::Rename(renamed) => renamed.clone(),
            _ => name,
        };
        if function.is_empty() {
            return (None, FilterDecision::SkipFrame);
        }

        let record = DebugRecord { filename: filename.to_owned(), line: raw.line, function };
        (Some(record), decision)
    }
}
