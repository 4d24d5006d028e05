//! Debug info resolution
//!
//! Maps program counters to rendered records, running every backend record
//! through the [`NameResolver`].
//!
//! Two stop conditions, both checked before each record:
//! - the output holds `max_records` records (inlined frames can produce more
//!   records than counters, so this can trip in the middle of a counter)
//! - the name resolver returns `StopBacktrace` (that record, the rest of its
//!   counter and every remaining counter are dropped)
//!
//! `SkipFrame` drops a single record and resolution carries on.

use log::error;

use crate::domain::{DebugRecord, FilterDecision, ProgramCounter};
use crate::naming::NameResolver;
use crate::symbolization::SymbolBackend;

/// Resolve counters in order into at most `max_records` records.
pub fn resolve_all<B: SymbolBackend>(
    backend: &B,
    counters: &[ProgramCounter],
    max_records: usize,
    names: &mut NameResolver<'_>,
) -> Vec<DebugRecord> {
    let mut records = Vec::with_capacity(counters.len().min(max_records));

    'counters: for &pc in counters {
        if records.len() >= max_records {
            break;
        }

        let raw_records = match backend.pcinfo(pc) {
            Ok(raw_records) => raw_records,
            Err(e) => {
                // Reported, then treated as an address without debug info
                error!("{e} at {pc}");
                continue;
            }
        };

        for raw in &raw_records {
            if records.len() >= max_records {
                break 'counters;
            }
            match names.resolve_record(raw) {
                (_, FilterDecision::StopBacktrace) => break 'counters,
                (Some(record), _) => records.push(record),
                (None, _) => {}
            }
        }
    }

    records
}
