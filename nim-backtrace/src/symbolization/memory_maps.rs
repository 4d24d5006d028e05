//! Memory mapping utilities for the running process
//!
//! This module parses /proc/self/maps to determine where the executable is
//! loaded, which is needed to translate runtime addresses of a
//! position-independent executable (PIE) into addresses of its debug info.

use anyhow::{Context, Result};
use log::info;
use std::fs;

const SELF_MAPS: &str = "/proc/self/maps";

/// Memory range of a loaded binary in this process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Check if an address falls within this memory range
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// Find the memory range of `binary_path` in the current process
///
/// # Errors
/// Returns an error if /proc/self/maps cannot be read (non-Linux platforms)
/// or if the binary is not mapped
pub fn parse_memory_maps(binary_path: &str) -> Result<MemoryRange> {
    let maps = fs::read_to_string(SELF_MAPS).context(format!("Failed to read {SELF_MAPS}"))?;
    let range = parse_maps_content(&maps, binary_path)?;
    info!(
        "Executable memory range: 0x{:x} - 0x{:x} (size: {} KB)",
        range.start,
        range.end,
        (range.end - range.start) / 1024
    );
    Ok(range)
}

/// Find the memory range of `binary_path` in maps-formatted text
///
/// All mappings of the binary are merged, from the minimum start address to
/// the maximum end address.
///
/// # Errors
/// Returns an error if an address fails to parse or the binary is not found
pub fn parse_maps_content(maps: &str, binary_path: &str) -> Result<MemoryRange> {
    let mut start_addr = None;
    let mut end_addr = None;

    for line in maps.lines() {
        // "start-end perms offset dev inode pathname"
        if pathname(line) != Some(binary_path) {
            continue;
        }
        let Some((start, end)) = line.split_whitespace().next().and_then(|r| r.split_once('-'))
        else {
            continue;
        };
        let start = u64::from_str_radix(start, 16).context("Failed to parse range start")?;
        let end = u64::from_str_radix(end, 16).context("Failed to parse range end")?;

        start_addr = Some(start_addr.map_or(start, |s: u64| s.min(start)));
        end_addr = Some(end_addr.map_or(end, |e: u64| e.max(end)));
    }

    match (start_addr, end_addr) {
        (Some(start), Some(end)) => Ok(MemoryRange { start, end }),
        _ => Err(anyhow::anyhow!("Could not find memory range for {binary_path}")),
    }
}

/// Pathname column of a maps line, which may itself contain spaces
fn pathname(line: &str) -> Option<&str> {
    let mut rest = line;
    for _ in 0..5 {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        rest = &rest[end..];
    }
    let path = rest.trim();
    (!path.is_empty()).then_some(path)
}
