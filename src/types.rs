//! Types defined by the OFX API.
//!
//! Everything in this module crosses the C ABI and must match the
//! layouts in the published OFX 1.4 headers exactly.

#![allow(non_snake_case)]

use libc::{c_char, c_double, c_int, c_uint, c_void};
use std::ffi::CStr;

/// An OFX status code as returned across the ABI.
///
/// Plugins may hand back any integer, so this is a transparent
/// newtype rather than an enum.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OfxStatus(pub c_int);

pub mod ofxstatus {
    use super::OfxStatus;

    pub const OK: OfxStatus = OfxStatus(0);
    pub const Failed: OfxStatus = OfxStatus(1);
    pub const ErrFatal: OfxStatus = OfxStatus(2);
    pub const ErrUnknown: OfxStatus = OfxStatus(3);
    pub const ErrMissingHostFeature: OfxStatus = OfxStatus(4);
    pub const ErrUnsupported: OfxStatus = OfxStatus(5);
    pub const ErrExists: OfxStatus = OfxStatus(6);
    pub const ErrFormat: OfxStatus = OfxStatus(7);
    pub const ErrMemory: OfxStatus = OfxStatus(8);
    pub const ErrBadHandle: OfxStatus = OfxStatus(9);
    pub const ErrBadIndex: OfxStatus = OfxStatus(10);
    pub const ErrValue: OfxStatus = OfxStatus(11);
    pub const ReplyYes: OfxStatus = OfxStatus(12);
    pub const ReplyNo: OfxStatus = OfxStatus(13);
    pub const ReplyDefault: OfxStatus = OfxStatus(14);
}

impl OfxStatus {
    pub fn succeeded(self) -> bool {
        matches!(
            self,
            ofxstatus::OK
                | ofxstatus::ReplyYes
                | ofxstatus::ReplyNo
                | ofxstatus::ReplyDefault
        )
    }

    pub fn failed(self) -> bool {
        !self.succeeded()
    }
}

pub type OfxTime = c_double;

// Handles are opaque pointers into host-owned storage.
pub type OfxImageEffectHandle = *mut c_void;
pub type OfxImageClipHandle = *mut c_void;
pub type OfxImageMemoryHandle = *mut c_void;
pub type OfxMutexHandle = *mut c_void;
pub type OfxParamHandle = *mut c_void;
pub type OfxParamSetHandle = *mut c_void;
pub type OfxPropertySetHandle = *mut c_void;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OfxRectI {
    pub x1: c_int,
    pub y1: c_int,
    pub x2: c_int,
    pub y2: c_int,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OfxRectD {
    pub x1: c_double,
    pub y1: c_double,
    pub x2: c_double,
    pub y2: c_double,
}

#[allow(dead_code)]
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OfxPointI {
    pub x: c_int,
    pub y: c_int,
}

#[allow(dead_code)]
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OfxPointD {
    pub x: c_double,
    pub y: c_double,
}

#[allow(dead_code)]
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OfxRangeI {
    pub min: c_int,
    pub max: c_int,
}

#[allow(dead_code)]
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OfxRangeD {
    pub min: c_double,
    pub max: c_double,
}

/// The host descriptor handed to plugins via `setHost`.
#[repr(C)]
pub struct OfxHost {
    pub host: OfxPropertySetHandle,
    pub fetchSuite:
        extern "C" fn(OfxPropertySetHandle, *const c_char, c_int) -> *const c_void,
}

pub type SetHostFn = unsafe extern "C" fn(*mut OfxHost);
pub type MainEntryFn = unsafe extern "C" fn(
    *const c_char,
    *const c_void,
    OfxPropertySetHandle,
    OfxPropertySetHandle,
) -> OfxStatus;

/// The plugin record returned by `OfxGetPlugin`.
#[repr(C)]
pub struct OfxPluginRaw {
    pub pluginApi: *const c_char,
    pub apiVersion: c_int,
    pub pluginIdentifier: *const c_char,
    pub pluginVersionMajor: c_uint,
    pub pluginVersionMinor: c_uint,
    pub setHost: Option<SetHostFn>,
    pub mainEntry: Option<MainEntryFn>,
}

/// Copy a C string out of the ABI. None for null or non-UTF-8 input.
pub fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .ok()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_success_set() {
        assert!(ofxstatus::OK.succeeded());
        assert!(ofxstatus::ReplyYes.succeeded());
        assert!(ofxstatus::Failed.failed());
        assert!(ofxstatus::ErrBadHandle.failed());
        // A status a plugin invented is a failure
        assert!(OfxStatus(42).failed());
    }

    #[test]
    fn cstr_conversion() {
        assert_eq!(cstr_to_string(std::ptr::null()), None);
        assert_eq!(
            cstr_to_string(c"OfxActionRender".as_ptr()),
            Some("OfxActionRender".to_string())
        );
    }
}
