//! Stack capture
//!
//! Walks the current call stack through the symbolization backend and
//! returns the raw program counters, innermost frame first.

use log::{error, trace};

use crate::domain::{EntryPoint, ProgramCounter};
use crate::symbolization::{SymbolBackend, SymbolHandle};

/// Capture at most `max_count` program counters.
///
/// `skip` drops that many innermost frames. When `entry` is given and `skip`
/// covers its call chain, the library's frames are cut at the entry and the
/// rest of `skip` counts into the caller's stack. Otherwise `skip` counts from
/// this function (0 keeps this function's own frame).
///
/// Debug mode ignores `skip` and `entry` so the whole mechanism is visible.
/// Returns an empty sequence when the backend is unavailable; a construction
/// failure is logged on the call that hit it.
#[inline(never)]
pub fn capture<B: SymbolBackend>(
    handle: &mut SymbolHandle<B>,
    debug: bool,
    max_count: usize,
    skip: usize,
    entry: Option<EntryPoint>,
) -> Vec<ProgramCounter> {
    if let Err(e) = handle.ensure_initialized() {
        error!("{e}");
        return Vec::new();
    }
    let Some(backend) = handle.backend() else {
        return Vec::new();
    };

    let (from, skip) = if debug {
        (None, 0)
    } else {
        match entry.and_then(|e| e.caller_skip(skip).map(|rest| (e.address, rest))) {
            Some((address, rest)) => (Some(address), rest),
            None => (None, skip),
        }
    };

    let mut counters = backend.walk(from, skip, max_count);
    // Backends are trusted, but the bound is part of the contract
    counters.truncate(max_count);

    trace!("Captured {} program counters (skip {skip}, max {max_count})", counters.len());
    counters
}
