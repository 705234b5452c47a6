//! C-ABI wrapper around `fetch-bridge-core`.
//!
//! # Overview
//! Lets an embedding script host, typically a JavaScript engine bound from
//! C, expose `fetch` to sandboxed code. The host's bootstrap shim calls
//! `fetch_bridge_fetch_sync(url, options_json)` and turns the returned JSON
//! into a script value or a rejected promise.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Arguments are passed as an array of C strings so a wrong argument
//!   count is reported the same way the script called it.
//! - The C caller owns all returned pointers and must call the matching
//!   `fetch_bridge_free_*` function to release them.

pub mod types;

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use fetch_bridge_core::{FetchConfig, Fetcher};
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use tracing_subscriber::EnvFilter;

use types::*;

/// Environment variable holding the log filter, e.g. `debug`.
pub const LOG_ENV: &str = "FETCH_BRIDGE_LOG";

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Install a stderr tracing subscriber filtered by `FETCH_BRIDGE_LOG`
/// (default `info`).
///
/// Returns false if a global subscriber was already installed.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_init_logging() -> bool {
    catch_unwind(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Fetcher lifecycle
// ---------------------------------------------------------------------------

/// Create a fetcher with no local handler; path-absolute URLs fail softly.
///
/// The caller must free the returned pointer with `fetch_bridge_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_new() -> *mut FfiFetcher {
    catch_unwind(|| {
        let inner = Fetcher::with_config(None, &FetchConfig::from_env());
        Box::into_raw(Box::new(FfiFetcher { inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a fetcher whose path-absolute URLs are served by `callback`.
///
/// `user_data` is passed back to every invocation. The callback may run on
/// any thread that calls `fetch_bridge_fetch_sync`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_new_with_handler(
    callback: Option<FfiHandlerCallback>,
    user_data: *mut c_void,
) -> *mut FfiFetcher {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(callback) = callback else {
            return std::ptr::null_mut();
        };
        let handler = CallbackHandler { callback, user_data };
        let inner = Fetcher::with_config(Some(Box::new(handler)), &FetchConfig::from_env());
        Box::into_raw(Box::new(FfiFetcher { inner }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Free a fetcher created by `fetch_bridge_new*`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_free(fetcher: *mut FfiFetcher) {
    if !fetcher.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(fetcher) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Bridge call
// ---------------------------------------------------------------------------

/// Run one fetch. `args` points to `args_len` C strings: the URL and the
/// JSON options object.
///
/// Always returns a result; free it with `fetch_bridge_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_fetch_sync(
    fetcher: *const FfiFetcher,
    args: *const *const c_char,
    args_len: u32,
) -> *mut FfiFetchResult {
    catch_unwind(AssertUnwindSafe(|| {
        if fetcher.is_null() {
            return FfiFetchResult::null_arg("fetcher");
        }
        if args.is_null() && args_len > 0 {
            return FfiFetchResult::null_arg("args");
        }
        let fetcher = unsafe { &*fetcher };
        let raw_args: &[*const c_char] = if args_len == 0 {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(args, args_len as usize) }
        };

        let mut strs = Vec::with_capacity(raw_args.len());
        for (i, ptr) in raw_args.iter().enumerate() {
            if ptr.is_null() {
                return FfiFetchResult::null_arg(&format!("args[{i}]"));
            }
            match unsafe { CStr::from_ptr(*ptr) }.to_str() {
                Ok(s) => strs.push(s),
                Err(_) => return FfiFetchResult::invalid_utf8(i),
            }
        }

        match fetcher.inner.fetch_sync(&strs) {
            Ok(value) => FfiFetchResult::ok(value),
            Err(e) => {
                tracing::debug!(error = %e, "bridge call rejected");
                FfiFetchResult::from_error(e)
            }
        }
    }))
    .unwrap_or_else(|_| FfiFetchResult::panic("panic in fetch_bridge_fetch_sync"))
}

// ---------------------------------------------------------------------------
// Recorder (called from inside a local handler callback)
// ---------------------------------------------------------------------------

/// Set the response status. Returns false for a null recorder or a code
/// outside 100..=999.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_recorder_set_status(recorder: *mut FfiRecorder, status: u16) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if recorder.is_null() {
            return false;
        }
        let recorder = unsafe { &mut *recorder };
        match StatusCode::from_u16(status) {
            Ok(code) => {
                recorder.inner.set_status(code);
                true
            }
            Err(_) => false,
        }
    }))
    .unwrap_or(false)
}

/// Append a response header value. Returns false for null arguments or an
/// invalid header name or value.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_recorder_add_header(
    recorder: *mut FfiRecorder,
    name: *const c_char,
    value: *const c_char,
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if recorder.is_null() || name.is_null() || value.is_null() {
            return false;
        }
        let recorder = unsafe { &mut *recorder };
        let name = unsafe { CStr::from_ptr(name) }.to_bytes();
        let value = unsafe { CStr::from_ptr(value) }.to_bytes();
        match (HeaderName::from_bytes(name), HeaderValue::from_bytes(value)) {
            (Ok(name), Ok(value)) => {
                recorder.inner.headers_mut().append(name, value);
                true
            }
            _ => false,
        }
    }))
    .unwrap_or(false)
}

/// Append `len` bytes from `data` to the response body.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_recorder_write(
    recorder: *mut FfiRecorder,
    data: *const u8,
    len: usize,
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if recorder.is_null() || (data.is_null() && len > 0) {
            return false;
        }
        let recorder = unsafe { &mut *recorder };
        if len > 0 {
            let bytes = unsafe { std::slice::from_raw_parts(data, len) };
            recorder.inner.write_body(bytes);
        }
        true
    }))
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiFetchResult` returned by `fetch_bridge_fetch_sync`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_free_result(result: *mut FfiFetchResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.response_json.is_null() {
            drop(unsafe { CString::from_raw(result.response_json) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
