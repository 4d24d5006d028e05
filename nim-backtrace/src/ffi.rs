//! C ABI for host runtimes linking the static library
//!
//! Every string and array returned here is allocated with the C allocator and
//! owned by the caller, who releases it with `free()`. For the debug record
//! array that includes both strings of every entry before the terminator; the
//! `free_*` functions do exactly that. Negative lengths and skip counts are
//! treated as zero.

#![allow(unsafe_code)]

use std::alloc::{handle_alloc_error, Layout};
use std::ffi::{c_char, c_int};
use std::{mem, ptr};

use nim_backtrace_common::{DebuggingInfo, DEFAULT_SKIP, MAX_BACKTRACE_LINES, PROGRAM_COUNTER_SENTINEL};

use crate::domain::{DebugRecord, EntryPoint, ProgramCounter};
use crate::tracer;

fn to_len(value: c_int) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// NUL-terminated bytes of `s`, interior NULs replaced
fn c_string_bytes(s: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = s.bytes().map(|b| if b == 0 { b'?' } else { b }).collect();
    bytes.push(0);
    bytes
}

/// Copy `items` into a `malloc`-compatible array
///
/// Allocation failure aborts, as for any Rust allocation.
fn c_array<T: Copy>(items: &[T]) -> *mut T {
    // SAFETY: calloc has no preconditions, null is handled below
    let array = unsafe { libc::calloc(items.len().max(1), mem::size_of::<T>()) }.cast::<T>();
    if array.is_null() {
        handle_alloc_error(Layout::array::<T>(items.len()).unwrap_or(Layout::new::<T>()));
    }
    // SAFETY: `array` holds at least `items.len()` elements and is fresh
    unsafe { ptr::copy_nonoverlapping(items.as_ptr(), array, items.len()) };
    array
}

fn c_string(s: &str) -> *mut c_char {
    c_array(&c_string_bytes(s)).cast::<c_char>()
}

/// Backtrace of the calling thread with default bounds, starting at the caller
#[no_mangle]
#[inline(never)]
pub extern "C" fn get_backtrace_c() -> *mut c_char {
    // Stands for get_backtrace_c -> get_backtrace_max_length_c -> capture
    let entry = EntryPoint::new(get_backtrace_c as usize, 3);
    c_string(&tracer::format_with_entry(entry, MAX_BACKTRACE_LINES, DEFAULT_SKIP))
}

/// Backtrace of the calling thread with explicit bounds
///
/// `skip = 2` starts at the caller.
#[no_mangle]
#[inline(never)]
pub extern "C" fn get_backtrace_max_length_c(max_length: c_int, skip: c_int) -> *mut c_char {
    let entry = EntryPoint::new(get_backtrace_max_length_c as usize, 2);
    c_string(&tracer::format_with_entry(entry, to_len(max_length), to_len(skip)))
}

/// Release a string returned by `get_backtrace_c` or `get_backtrace_max_length_c`
///
/// Same as `free()`.
///
/// # Safety
/// `backtrace` must be null or a pointer returned by one of those functions
/// that was not freed yet.
#[no_mangle]
pub unsafe extern "C" fn free_backtrace_c(backtrace: *mut c_char) {
    // SAFETY: allocated by the C allocator, free(NULL) is a no-op
    unsafe { libc::free(backtrace.cast()) };
}

/// Program counters of the calling thread, terminated by a zero entry
///
/// The returned array always has `max_length + 1` slots. `skip = 1` starts at
/// the caller.
#[no_mangle]
#[inline(never)]
pub extern "C" fn get_program_counters_c(max_length: c_int, skip: c_int) -> *mut usize {
    let max_length = to_len(max_length);
    let entry = EntryPoint::new(get_program_counters_c as usize, 1);
    let counters = tracer::capture_with_entry(entry, max_length, to_len(skip));

    let mut slots = vec![PROGRAM_COUNTER_SENTINEL; max_length + 1];
    for (slot, pc) in slots.iter_mut().zip(&counters) {
        *slot = pc.0;
    }
    c_array(&slots)
}

/// Release an array returned by `get_program_counters_c`
///
/// Same as `free()`.
///
/// # Safety
/// `counters` must be null or come from `get_program_counters_c` and must not
/// have been freed yet.
#[no_mangle]
pub unsafe extern "C" fn free_program_counters_c(counters: *mut usize) {
    // SAFETY: allocated by the C allocator, free(NULL) is a no-op
    unsafe { libc::free(counters.cast()) };
}

/// Resolve a zero-terminated counter array to debug records
///
/// The returned array has `max_length + 1` slots; the first entry with a null
/// filename marks the end.
///
/// # Safety
/// `counters` must be null or point to an array terminated by a zero entry
/// within its first `max_length + 1` slots, or at least `max_length` readable
/// elements.
#[no_mangle]
pub unsafe extern "C" fn get_debugging_info_c(
    counters: *const usize,
    max_length: c_int,
) -> *mut DebuggingInfo {
    let max_length = to_len(max_length);

    let mut program_counters = Vec::new();
    if !counters.is_null() {
        for i in 0..max_length {
            // SAFETY: the caller guarantees the array is readable up to its
            // sentinel or `max_length` entries
            let pc = unsafe { *counters.add(i) };
            if pc == PROGRAM_COUNTER_SENTINEL {
                break;
            }
            program_counters.push(ProgramCounter(pc));
        }
    }

    let records = tracer::resolve_debug_info(&program_counters, max_length);

    let mut slots = Vec::with_capacity(max_length + 1);
    slots.extend(records.iter().take(max_length).map(to_debugging_info));
    slots.resize(max_length + 1, DebuggingInfo::TERMINATOR);
    c_array(&slots)
}

fn to_debugging_info(record: &DebugRecord) -> DebuggingInfo {
    DebuggingInfo {
        filename: c_string(&record.filename),
        lineno: c_int::try_from(record.line).unwrap_or(c_int::MAX),
        function: c_string(&record.function),
    }
}

/// Release an array returned by `get_debugging_info_c`, strings included
///
/// Same as calling `free()` on both strings of every entry before the
/// terminator, then on the array.
///
/// # Safety
/// `infos` must be null or come from `get_debugging_info_c` and must not have
/// been freed yet.
#[no_mangle]
pub unsafe extern "C" fn free_debugging_info_c(infos: *mut DebuggingInfo) {
    if infos.is_null() {
        return;
    }
    let mut entry = infos;
    // SAFETY: the array is terminated, every string came from the C allocator
    unsafe {
        while !(*entry).is_terminator() {
            libc::free((*entry).filename.cast());
            libc::free((*entry).function.cast());
            entry = entry.add(1);
        }
        libc::free(infos.cast());
    }
}
