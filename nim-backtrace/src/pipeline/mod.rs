//! Capture, resolve and format pipeline
//!
//! ```text
//! capture  -> [pc]           program counters, innermost first
//! resolve  -> [DebugRecord]  demangled, filtered, bounded
//! format   -> String         one line per record, outermost first
//! ```
//!
//! The stages are plain functions over a [`SymbolBackend`](crate::symbolization::SymbolBackend);
//! [`Tracer`](crate::tracer::Tracer) wires them to the per-thread state.

pub mod capture;
pub mod format;
pub mod resolve;

pub use capture::capture;
pub use format::{LineBuffer, Renderer};
pub use resolve::resolve_all;
