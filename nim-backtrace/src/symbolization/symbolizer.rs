use addr2line::Context;
use anyhow::{Context as _, Result};
use gimli::{EndianRcSlice, RunTimeEndian};
use log::{debug, info, warn};
use object::{Object, ObjectSection, ObjectSegment};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::memory_maps::{parse_memory_maps, MemoryRange};
use super::SymbolBackend;
use crate::domain::{BacktraceError, ProgramCounter, RawRecord};

/// DWARF-backed symbolization of the running executable
///
/// Includes a cache to avoid re-resolving the same addresses repeatedly,
/// which matters when the same call sites show up in backtrace after
/// backtrace.
pub struct DwarfBackend {
    ctx: Context<EndianRcSlice<RunTimeEndian>>,
    /// Where the executable is mapped at runtime, if known
    runtime_range: Option<MemoryRange>,
    /// Lowest file-backed segment address the executable was linked at
    linked_base: u64,
    /// Cache of backend records by lookup address
    cache: RefCell<HashMap<u64, Vec<RawRecord>>>,
}

impl DwarfBackend {
    /// Create a backend for the given binary
    ///
    /// # Errors
    /// Returns an error if the binary file cannot be read or parsed, or if DWARF debug info is missing
    pub fn new<P: AsRef<Path>>(binary_path: P) -> Result<Self> {
        let binary_path = binary_path.as_ref();
        let binary_data = fs::read(binary_path).context("Failed to read binary file")?;

        let obj_file = object::File::parse(&*binary_data).context("Failed to parse object file")?;

        // Load DWARF debug info
        let endian =
            if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

        let load_section =
            |id: gimli::SectionId| -> Result<EndianRcSlice<RunTimeEndian>, gimli::Error> {
                let data = obj_file
                    .section_by_name(id.name())
                    .and_then(|section| section.uncompressed_data().ok())
                    .unwrap_or(std::borrow::Cow::Borrowed(&[][..]));
                Ok(EndianRcSlice::new(Rc::from(&*data), endian))
            };

        let dwarf = gimli::Dwarf::load(&load_section)?;
        let ctx = Context::from_dwarf(dwarf).context("Failed to load DWARF debug information")?;

        let linked_base = obj_file
            .segments()
            .filter(|segment| segment.file_range().1 != 0)
            .map(|segment| segment.address())
            .min()
            .unwrap_or(0);

        let runtime_range = match binary_path.to_str().map(parse_memory_maps) {
            Some(Ok(range)) => Some(range),
            Some(Err(e)) => {
                // Without a maps file addresses are looked up unchanged
                debug!("No runtime mapping for {}: {e:#}", binary_path.display());
                None
            }
            None => None,
        };

        Ok(Self { ctx, runtime_range, linked_base, cache: RefCell::new(HashMap::new()) })
    }

    /// Create a backend for the running executable
    ///
    /// # Errors
    /// `PathDiscovery` if the executable path is unavailable, `BackendUnavailable`
    /// if the executable cannot be loaded
    pub fn for_current_exe() -> Result<Self, BacktraceError> {
        let exe = current_exe_path()?;
        info!("Loading debug info from {}", exe.display());
        Self::new(&exe).map_err(|e| {
            warn!("Failed to load debug info from {}: {e:#}", exe.display());
            BacktraceError::BackendUnavailable(format!("{e:#}"))
        })
    }

    /// Translate a runtime address to an address in the debug info
    ///
    /// Returns `None` for addresses outside the executable (shared libraries).
    fn adjust_address(&self, addr: u64) -> Option<u64> {
        match self.runtime_range {
            Some(range) if range.contains(addr) => Some(addr - range.start + self.linked_base),
            Some(_) => None,
            None => Some(addr),
        }
    }

    fn lookup(&self, addr: u64) -> Result<Vec<RawRecord>, BacktraceError> {
        let mut records = Vec::new();
        let mut frames = self.ctx.find_frames(addr).skip_all_loads().map_err(BacktraceError::backend)?;

        while let Some(frame) = frames.next().map_err(BacktraceError::backend)? {
            let function =
                frame.function.as_ref().and_then(|f| f.raw_name().ok()).map(|name| name.into_owned());
            let (filename, line) = match frame.location {
                Some(loc) => (loc.file.map(str::to_owned), loc.line.unwrap_or(0)),
                None => (None, 0),
            };
            records.push(RawRecord { filename, line, function });
        }

        Ok(records)
    }
}

impl SymbolBackend for DwarfBackend {
    /// Frames up to and including this function (or `entry`, when it is on
    /// the stack) are never reported; `skip` counts from the next frame.
    #[inline(never)]
    fn walk(&self, entry: Option<usize>, skip: usize, max_count: usize) -> Vec<ProgramCounter> {
        if max_count == 0 {
            return Vec::new();
        }

        let anchor = <Self as SymbolBackend>::walk as usize;
        let mut frames = Vec::new();
        // Index of the first frame after this function and after `entry`
        let mut after_walk = None;
        let mut after_entry = None;

        backtrace::trace(|frame| {
            let symbol = frame.symbol_address() as usize;
            frames.push(ProgramCounter(frame.ip() as usize));
            if after_walk.is_none() && symbol == anchor {
                after_walk = Some(frames.len());
            } else if after_entry.is_none() && Some(symbol) == entry {
                after_entry = Some(frames.len());
            }

            let window_start = if entry.is_some() { after_entry } else { after_walk };
            window_start.map_or(true, |start| frames.len() < start + skip + max_count)
        });

        let start = match (after_entry, after_walk) {
            (Some(start), _) => start,
            (None, Some(start)) => {
                if entry.is_some() {
                    debug!("Entry point not on the stack, counting from the capturer");
                }
                start
            }
            (None, None) => {
                // Symbol addresses unavailable on this platform: keep every frame
                debug!("Stack walk anchor not found, using {} unanchored frames", frames.len());
                0
            }
        };

        frames.into_iter().skip(start + skip).take(max_count).collect()
    }

    fn pcinfo(&self, pc: ProgramCounter) -> Result<Vec<RawRecord>, BacktraceError> {
        let Some(addr) = self.adjust_address(pc.lookup_address() as u64) else {
            return Ok(Vec::new());
        };

        if let Some(cached) = self.cache.borrow().get(&addr) {
            return Ok(cached.clone());
        }

        let records = self.lookup(addr)?;
        self.cache.borrow_mut().insert(addr, records.clone());
        Ok(records)
    }
}

/// Absolute path of the running executable
///
/// # Errors
/// `PathDiscovery` if the platform cannot report it
pub fn current_exe_path() -> Result<PathBuf, BacktraceError> {
    std::env::current_exe().map_err(|e| BacktraceError::PathDiscovery(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> DwarfBackend {
        DwarfBackend::for_current_exe().expect("Failed to load test binary")
    }

    #[test]
    fn test_walk_respects_max_count() {
        let backend = backend();
        assert!(backend.walk(None, 0, 2).len() <= 2);
        assert!(backend.walk(None, 0, 0).is_empty());
    }

    #[test]
    fn test_walk_skip_drops_innermost_frames() {
        let backend = backend();
        let full = backend.walk(None, 0, 64);
        let skipped = backend.walk(None, 1, 64);
        assert!(!full.is_empty());
        assert!(skipped.len() <= full.len());
    }

    #[inline(never)]
    fn walk_through_entry(backend: &DwarfBackend) -> (Vec<ProgramCounter>, Vec<ProgramCounter>) {
        let entry = walk_through_entry as usize;
        let from_capturer = backend.walk(None, 0, 256);
        let from_caller = backend.walk(Some(entry), 0, 256);
        std::hint::black_box((from_capturer, from_caller))
    }

    #[test]
    fn test_walk_starts_after_entry_frame() {
        let backend = backend();
        let (from_capturer, from_caller) = walk_through_entry(&backend);

        // The capturer-relative walk starts inside the entry function, the
        // entry-relative one at its caller
        assert!(!from_caller.is_empty());
        assert_eq!(from_caller.as_slice(), &from_capturer[1..]);
    }

    #[test]
    fn test_walk_entry_not_on_stack() {
        let backend = backend();
        let walked = backend.walk(Some(1), 0, 8);
        assert!(!walked.is_empty());
        assert!(walked.len() <= 8);
    }

    #[test]
    fn test_address_outside_executable() {
        let mut backend = backend();
        backend.runtime_range = Some(MemoryRange { start: 0x1000, end: 0x2000 });
        backend.linked_base = 0;
        assert_eq!(backend.adjust_address(0x1800), Some(0x800));
        assert_eq!(backend.adjust_address(0x3000), None);
        assert!(backend.pcinfo(ProgramCounter(0x3001)).unwrap().is_empty());
    }

    #[test]
    fn test_address_without_runtime_range() {
        let mut backend = backend();
        backend.runtime_range = None;
        assert_eq!(backend.adjust_address(0x1234_5678), Some(0x1234_5678));
    }

    #[test]
    fn test_missing_binary_fails() {
        assert!(DwarfBackend::new("/nonexistent/binary").is_err());
    }
}
