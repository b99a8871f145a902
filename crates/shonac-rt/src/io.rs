//! Print and file intrinsics.

#![allow(non_snake_case)]

use std::cell::RefCell;
use std::ffi::{c_char, CStr, CString};
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Borrows a C string argument, rejecting null and invalid UTF-8.
unsafe fn cstr<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Writes one byte (the low bits of the double) to stderr.
#[no_mangle]
pub extern "C" fn putchard(x: f64) -> f64 {
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(&[x as u8]);
    let _ = stderr.flush();
    0.0
}

/// Prints a string followed by a newline to stderr.
///
/// Call sites are re-routed by the compiler to the typed shims below, but
/// the symbol stays exported for direct extern use.
#[no_mangle]
pub unsafe extern "C" fn nyora(value: *const c_char) {
    match cstr(value) {
        Some(text) => eprintln!("{}", text),
        None => eprintln!("Error: null value passed to nyora"),
    }
}

/// `nyora` shim for doubles: `%.5f\n` on stderr.
#[no_mangle]
pub extern "C" fn shona_print_f64(value: f64) -> f64 {
    eprintln!("{:.5}", value);
    0.0
}

/// `nyora` shim for integers: `%d\n` on stderr.
#[no_mangle]
pub extern "C" fn shona_print_i64(value: i64) -> f64 {
    eprintln!("{}", value);
    0.0
}

/// `nyora` shim for string pointers: `%s\n` on stderr.
#[no_mangle]
pub unsafe extern "C" fn shona_print_str(value: *const c_char) -> f64 {
    match cstr(value) {
        Some(text) => eprintln!("{}", text),
        None => eprintln!("Error: null value passed to nyora"),
    }
    0.0
}

/// Opens (creating if needed) a file for appending.
#[no_mangle]
pub unsafe extern "C" fn openFile(path: *const c_char, _mode: *const c_char) -> f64 {
    let Some(path) = cstr(path) else {
        eprintln!("Error opening file");
        return 0.0;
    };
    if OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .is_err()
    {
        eprintln!("Error opening file");
    }
    0.0
}

/// Reads a file and returns its contents as a C string.
///
/// The buffer is thread-local and reused; the returned pointer is valid
/// until the next `readFile` call on the same thread. An unreadable file
/// yields the empty string.
#[no_mangle]
pub unsafe extern "C" fn readFile(path: *const c_char) -> *const c_char {
    thread_local! {
        static READ_BUFFER: RefCell<CString> = RefCell::new(CString::default());
    }

    let content = match cstr(path) {
        Some(path) => fs::read_to_string(path).unwrap_or_else(|_| {
            eprintln!("Error: Could not open file: {}", path);
            String::new()
        }),
        None => String::new(),
    };

    READ_BUFFER.with(|buffer| {
        *buffer.borrow_mut() = CString::new(content).unwrap_or_default();
        buffer.borrow().as_ptr()
    })
}

/// Writes (truncating) `content` to the file at `path`.
#[no_mangle]
pub unsafe extern "C" fn writeFile(path: *const c_char, content: *const c_char) -> f64 {
    let (Some(path), Some(content)) = (cstr(path), cstr(content)) else {
        eprintln!("Error writing to file");
        return 0.0;
    };
    if fs::write(path, content).is_err() {
        eprintln!("Error writing to file");
    }
    0.0
}

/// Deletes the file at `path`.
#[no_mangle]
pub unsafe extern "C" fn deleteFile(path: *const c_char) -> f64 {
    let Some(path) = cstr(path) else {
        eprintln!("Error deleting file");
        return 0.0;
    };
    if fs::remove_file(path).is_err() {
        eprintln!("Error deleting file");
    }
    0.0
}

/// `vhura` - opens (creating if needed) a file for appending.
#[no_mangle]
pub unsafe extern "C" fn vhuraFaera(path: *const c_char, mode: *const c_char) -> f64 {
    openFile(path, mode)
}

/// `verenga` - prints the file at `path` line by line to stdout.
#[no_mangle]
pub unsafe extern "C" fn verengaFaera(path: *const c_char) -> f64 {
    let Some(path) = cstr(path) else {
        eprintln!("Error: Could not open file");
        return 0.0;
    };
    match fs::read_to_string(path) {
        Ok(content) => {
            for line in content.lines() {
                println!("{}", line);
            }
        }
        Err(_) => eprintln!("Error: Could not open file: {}", path),
    }
    0.0
}

/// `nyora` (write) - writes (truncating) `content` to the file at `path`.
#[no_mangle]
pub unsafe extern "C" fn nyoraFaera(path: *const c_char, content: *const c_char) -> f64 {
    writeFile(path, content)
}

/// `bvisa` - deletes the file at `path`.
#[no_mangle]
pub unsafe extern "C" fn bvisaFaera(path: *const c_char) -> f64 {
    deleteFile(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn c(text: &str) -> CString {
        CString::new(text).unwrap()
    }

    #[test]
    fn test_putchard_returns_zero() {
        assert_eq!(putchard(10.0), 0.0);
    }

    #[test]
    fn test_file_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taura.txt");
        let path_c = c(path.to_str().unwrap());
        let content_c = c("mhoro nyika");

        unsafe {
            assert_eq!(nyoraFaera(path_c.as_ptr(), content_c.as_ptr()), 0.0);
            let read_back = readFile(path_c.as_ptr());
            assert_eq!(CStr::from_ptr(read_back).to_str().unwrap(), "mhoro nyika");
        }
    }

    #[test]
    fn test_read_missing_file_yields_empty() {
        let missing = c("/nonexistent/hapana.txt");
        unsafe {
            let result = readFile(missing.as_ptr());
            assert_eq!(CStr::from_ptr(result).to_str().unwrap(), "");
        }
    }

    #[test]
    fn test_delete_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubvisa.txt");
        std::fs::write(&path, "x").unwrap();
        let path_c = c(path.to_str().unwrap());

        unsafe {
            assert_eq!(bvisaFaera(path_c.as_ptr()), 0.0);
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vhurwa.txt");
        let path_c = c(path.to_str().unwrap());
        let mode_c = c("a");

        unsafe {
            vhuraFaera(path_c.as_ptr(), mode_c.as_ptr());
        }
        assert!(path.exists());
    }
}
