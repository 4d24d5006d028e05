//! Symbol name demangling
//!
//! Rust symbols are demangled with `rustc-demangle` (alternate form, without
//! the hash suffix). Itanium C++ symbols go through the `cpp_demangle` support
//! bundled with `addr2line`. Anything else, including plain C names generated
//! by the host compiler, is returned unchanged.

/// Which demangler produced a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mangling {
    /// Not a recognized mangling, returned as-is
    None,
    Rust,
    /// Itanium C++ ABI, result still carries the parameter list
    Cpp,
}

/// Result of demangling one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demangled {
    pub name: String,
    pub mangling: Mangling,
}

/// Demangle a raw linkage name.
#[must_use]
pub fn demangle(mangled: &str) -> Demangled {
    #[cfg(feature = "dwarf")]
    {
        if let Ok(symbol) = rustc_demangle::try_demangle(mangled) {
            return Demangled { name: format!("{symbol:#}"), mangling: Mangling::Rust };
        }

        if is_itanium(mangled) {
            if let Some(name) = addr2line::demangle(mangled, gimli::DW_LANG_C_plus_plus) {
                return Demangled { name, mangling: Mangling::Cpp };
            }
        }
    }

    Demangled { name: mangled.to_owned(), mangling: Mangling::None }
}

/// Demangle and drop a C++ parameter list.
///
/// `foo::bar(int, char const*)` becomes `foo::bar`.
#[must_use]
pub fn demangle_function(mangled: &str) -> String {
    let Demangled { mut name, mangling } = demangle(mangled);
    if mangling == Mangling::Cpp {
        if let Some(pos) = name.find('(') {
            name.truncate(pos);
        }
    }
    name
}

/// Itanium symbols start with `_Z` (`__Z` on Mach-O).
#[cfg_attr(not(feature = "dwarf"), allow(dead_code))]
fn is_itanium(name: &str) -> bool {
    name.starts_with("_Z") || name.starts_with("__Z")
}
