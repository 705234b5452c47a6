//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! The bridge call itself only moves strings: arguments go in as C strings
//! and the response comes back as a JSON C string inside `FfiFetchResult`.
//! The local handler runs the other way round: the host registers a
//! callback, receives a borrowed `FfiLocalRequest`, and fills an opaque
//! `FfiRecorder` through the `fetch_bridge_recorder_*` functions.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use fetch_bridge_core::response::headers_from_map;
use fetch_bridge_core::{BridgeError, Fetcher, Handler, LocalRequest, ResponseRecorder};

/// Opaque handle to a `Fetcher`. C callers receive a pointer to this and
/// pass it back into `fetch_bridge_fetch_sync`.
pub struct FfiFetcher {
    pub(crate) inner: Fetcher,
}

/// Convert to a C string, dropping interior NUL bytes.
pub(crate) fn to_c_string(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Local handler callback
// ---------------------------------------------------------------------------

/// A request handed to the host's local handler.
///
/// All pointers are borrowed and only valid for the duration of the callback.
/// `headers_json` is a JSON object mapping header names to arrays of values.
/// `body` is not NUL-terminated; it holds exactly `body_len` bytes.
#[repr(C)]
pub struct FfiLocalRequest {
    pub method: *const c_char,
    pub url: *const c_char,
    pub headers_json: *const c_char,
    pub body: *const u8,
    pub body_len: usize,
}

/// Opaque response recorder the host's local handler writes into.
#[repr(transparent)]
pub struct FfiRecorder {
    pub(crate) inner: ResponseRecorder,
}

/// Signature of a host-provided local handler.
pub type FfiHandlerCallback =
    extern "C" fn(user_data: *mut c_void, request: *const FfiLocalRequest, recorder: *mut FfiRecorder);

/// Adapts a C callback into a `Handler`.
pub(crate) struct CallbackHandler {
    pub(crate) callback: FfiHandlerCallback,
    pub(crate) user_data: *mut c_void,
}

// The host promises that `callback` may be invoked with `user_data` from
// any thread that calls into the bridge.
unsafe impl Send for CallbackHandler {}
unsafe impl Sync for CallbackHandler {}

impl Handler for CallbackHandler {
    fn serve(&self, recorder: &mut ResponseRecorder, request: &mut LocalRequest) {
        let method = to_c_string(request.method().as_str());
        let url = to_c_string(&request.uri().to_string());
        let headers = serde_json::to_string(&headers_from_map(request.headers()))
            .unwrap_or_else(|_| "{}".to_string());
        let headers_json = to_c_string(&headers);
        let body = request.body().as_bytes();

        let ffi_request = FfiLocalRequest {
            method: method.as_ptr(),
            url: url.as_ptr(),
            headers_json: headers_json.as_ptr(),
            body: body.as_ptr(),
            body_len: body.len(),
        };
        let ffi_recorder = recorder as *mut ResponseRecorder as *mut FfiRecorder;
        (self.callback)(self.user_data, &ffi_request, ffi_recorder);
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiFetchResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    ArgumentCount = 1,
    InvalidOptions = 2,
    UnsupportedScheme = 3,
    Encode = 4,
    InvalidUtf8 = 5,
    Panic = 6,
    NullArg = 7,
}

/// Result envelope for `fetch_bridge_fetch_sync`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and
/// `response_json` holds the response object; `http_status` mirrors its
/// `status` field. Soft failures (network errors, missing local handler)
/// are still successes here and are listed under `errors` in the JSON.
/// On a hard failure `error_code` describes the category, `error_message`
/// is a human-readable C string, and `response_json` is null.
#[repr(C)]
pub struct FfiFetchResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub response_json: *mut c_char,
}

impl FfiFetchResult {
    /// Build a success result carrying a serialized response.
    pub(crate) fn ok(response: serde_json::Value) -> *mut Self {
        let http_status = response["status"].as_u64().unwrap_or(0) as u16;
        let result = Box::new(FfiFetchResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status,
            response_json: to_c_string(&response.to_string()).into_raw(),
        });
        Box::into_raw(result)
    }

    /// Build an error result from a `BridgeError`.
    pub(crate) fn from_error(err: BridgeError) -> *mut Self {
        let error_code = match &err {
            BridgeError::ArgumentCount { .. } => FfiErrorCode::ArgumentCount,
            BridgeError::InvalidOptions(_) => FfiErrorCode::InvalidOptions,
            BridgeError::UnsupportedScheme(_) => FfiErrorCode::UnsupportedScheme,
            BridgeError::Encode(_) => FfiErrorCode::Encode,
        };
        Self::error(error_code, &err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    /// Build an error result for an argument that is not UTF-8.
    pub(crate) fn invalid_utf8(index: usize) -> *mut Self {
        Self::error(
            FfiErrorCode::InvalidUtf8,
            &format!("argument {index} is not valid UTF-8"),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg)
    }

    fn error(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        let result = Box::new(FfiFetchResult {
            error_code,
            error_message: to_c_string(msg).into_raw(),
            http_status: 0,
            response_json: std::ptr::null_mut(),
        });
        Box::into_raw(result)
    }
}
