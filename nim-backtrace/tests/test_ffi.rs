#![cfg(feature = "dwarf")]
#![allow(unsafe_code)]

use std::ffi::CStr;

use nim_backtrace::ffi::{
    free_backtrace_c, free_debugging_info_c, free_program_counters_c, get_backtrace_c,
    get_backtrace_max_length_c, get_debugging_info_c, get_program_counters_c,
};
use nim_backtrace_common::PROGRAM_COUNTER_SENTINEL;

#[test]
fn test_backtrace_string_round_trip() {
    let raw = get_backtrace_max_length_c(16, 0);
    assert!(!raw.is_null());

    let text = unsafe { CStr::from_ptr(raw) }.to_str().expect("backtrace is not UTF-8").to_owned();
    assert!(text.lines().count() <= 16);
    unsafe { free_backtrace_c(raw) };

    let raw = get_backtrace_c();
    assert!(!raw.is_null());
    unsafe { free_backtrace_c(raw) };

    // Null is accepted
    unsafe { free_backtrace_c(std::ptr::null_mut()) };
}

#[test]
fn test_results_release_with_c_free() {
    // A host that only knows free() must be able to release everything
    let raw = get_backtrace_c();
    assert!(!raw.is_null());
    unsafe { libc::free(raw.cast()) };

    let raw = get_backtrace_max_length_c(8, 2);
    unsafe { libc::free(raw.cast()) };

    let counters = get_program_counters_c(8, 1);
    let infos = unsafe { get_debugging_info_c(counters, 8) };
    unsafe {
        let mut entry = infos;
        while !(*entry).is_terminator() {
            libc::free((*entry).filename.cast());
            libc::free((*entry).function.cast());
            entry = entry.add(1);
        }
        libc::free(infos.cast());
        libc::free(counters.cast());
    }
}

#[test]
fn test_negative_bounds_are_zero() {
    let raw = get_backtrace_max_length_c(-1, -1);
    let text = unsafe { CStr::from_ptr(raw) }.to_bytes().to_vec();
    unsafe { free_backtrace_c(raw) };
    assert!(text.is_empty());

    let counters = get_program_counters_c(-3, 0);
    assert_eq!(unsafe { *counters }, PROGRAM_COUNTER_SENTINEL);
    unsafe { free_program_counters_c(counters) };
}

#[test]
fn test_program_counters_are_sentinel_terminated() {
    let max_length = 8;
    let counters = get_program_counters_c(max_length, 0);
    assert!(!counters.is_null());

    let slots = unsafe { std::slice::from_raw_parts(counters, 9) };
    let captured = slots.iter().take_while(|&&pc| pc != PROGRAM_COUNTER_SENTINEL).count();
    assert!(captured > 0);
    assert!(captured <= 8);
    assert_eq!(slots[8], PROGRAM_COUNTER_SENTINEL);

    unsafe { free_program_counters_c(counters) };
}

#[test]
fn test_debugging_info_round_trip() {
    let max_length = 16;
    let counters = get_program_counters_c(max_length, 0);
    let infos = unsafe { get_debugging_info_c(counters, max_length) };
    assert!(!infos.is_null());

    let slots = unsafe { std::slice::from_raw_parts(infos, 17) };
    let resolved: Vec<_> = slots.iter().take_while(|info| !info.is_terminator()).collect();
    assert!(resolved.len() <= 16);
    assert!(slots[16].is_terminator());
    for info in resolved {
        let filename = unsafe { CStr::from_ptr(info.filename) };
        let function = unsafe { CStr::from_ptr(info.function) };
        assert!(!filename.to_bytes().is_empty());
        assert!(!function.to_bytes().is_empty());
        assert!(info.lineno >= 0);
    }

    unsafe {
        free_debugging_info_c(infos);
        free_program_counters_c(counters);
    }
}

#[test]
fn test_debugging_info_stops_at_sentinel() {
    // A lone sentinel resolves to nothing
    let counters = [PROGRAM_COUNTER_SENTINEL, 0x1234];
    let infos = unsafe { get_debugging_info_c(counters.as_ptr(), 4) };
    assert!(unsafe { &*infos }.is_terminator());
    unsafe { free_debugging_info_c(infos) };

    let infos = unsafe { get_debugging_info_c(std::ptr::null(), 2) };
    assert!(unsafe { &*infos }.is_terminator());
    unsafe { free_debugging_info_c(infos) };

    unsafe { free_debugging_info_c(std::ptr::null_mut()) };
}
