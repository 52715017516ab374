//! Demangler helpers for Rust, C++ (Itanium) and MSVC symbol names.

fn looks_itanium(s: &str) -> bool {
    // Mach-O style names carry an extra leading underscore
    s.starts_with("_Z") || s.starts_with("__Z")
}

fn looks_msvc(s: &str) -> bool {
    s.starts_with('?')
}

/// Attempt to demangle a single symbol. Returns None when not recognized.
pub fn demangle(s: &str) -> Option<String> {
    // Rust (v0 + legacy) demangler
    if let Ok(dm) = rustc_demangle::try_demangle(s) {
        return Some(format!("{:#}", dm));
    }
    if looks_itanium(s) {
        if let Ok(sym) = cpp_demangle::Symbol::new(s) {
            return Some(sym.to_string());
        }
    }
    if looks_msvc(s) {
        if let Ok(out) = msvc_demangler::demangle(s, msvc_demangler::DemangleFlags::COMPLETE) {
            return Some(out);
        }
    }
    None
}
