//! Suite vtables as laid out in the OFX 1.4 headers.
//!
//! These structs cross the ABI: field order and signatures must match
//! the published headers exactly.
//!
//! `paramGetValue`, `paramSetValue` and friends are variadic in the
//! header. Stable Rust cannot define variadic functions, so those
//! slots are declared with fixed-arity signatures wide enough for the
//! largest parameter type: four out-pointers on the get side, and
//! four doubles + four pointers + four ints on the set side. A
//! variadic call site on x86-64 SysV places its arguments in the same
//! registers the fixed-arity callee reads, so the shims observe the
//! values the plugin passed. Integer set-arguments arrive in the
//! pointer slots (they share the integer register class). This is a
//! platform assumption; Win64 would need alternate shims.

#![allow(non_snake_case)]

use crate::types::*;
use libc::{c_char, c_double, c_int, c_uint, c_void};

#[repr(C)]
pub struct OfxImageEffectSuiteV1 {
    pub getPropertySet: extern "C" fn(
        imageEffect: OfxImageEffectHandle,
        propHandle: *mut OfxPropertySetHandle,
    ) -> OfxStatus,
    pub getParamSet: extern "C" fn(
        imageEffect: OfxImageEffectHandle,
        paramSet: *mut OfxParamSetHandle,
    ) -> OfxStatus,
    pub clipDefine: extern "C" fn(
        imageEffect: OfxImageEffectHandle,
        name: *const c_char,
        propertySet: *mut OfxPropertySetHandle,
    ) -> OfxStatus,
    pub clipGetHandle: extern "C" fn(
        imageEffect: OfxImageEffectHandle,
        name: *const c_char,
        clip: *mut OfxImageClipHandle,
        propertySet: *mut OfxPropertySetHandle,
    ) -> OfxStatus,
    pub clipGetPropertySet: extern "C" fn(
        clip: OfxImageClipHandle,
        propHandle: *mut OfxPropertySetHandle,
    ) -> OfxStatus,
    pub clipGetImage: extern "C" fn(
        clip: OfxImageClipHandle,
        time: OfxTime,
        region: *const OfxRectD,
        imageHandle: *mut OfxPropertySetHandle,
    ) -> OfxStatus,
    pub clipReleaseImage: extern "C" fn(imageHandle: OfxPropertySetHandle) -> OfxStatus,
    pub clipGetRegionOfDefinition: extern "C" fn(
        clip: OfxImageClipHandle,
        time: OfxTime,
        bounds: *mut OfxRectD,
    ) -> OfxStatus,
    pub abort: extern "C" fn(imageEffect: OfxImageEffectHandle) -> c_int,
    pub imageMemoryAlloc: extern "C" fn(
        instanceHandle: OfxImageEffectHandle,
        nBytes: usize,
        memoryHandle: *mut OfxImageMemoryHandle,
    ) -> OfxStatus,
    pub imageMemoryFree: extern "C" fn(memoryHandle: OfxImageMemoryHandle) -> OfxStatus,
    pub imageMemoryLock: extern "C" fn(
        memoryHandle: OfxImageMemoryHandle,
        returnedPtr: *mut *mut c_void,
    ) -> OfxStatus,
    pub imageMemoryUnlock: extern "C" fn(memoryHandle: OfxImageMemoryHandle) -> OfxStatus,
}

#[repr(C)]
pub struct OfxPropertySuiteV1 {
    pub propSetPointer: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        index: c_int,
        value: *mut c_void,
    ) -> OfxStatus,
    pub propSetString: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        index: c_int,
        value: *const c_char,
    ) -> OfxStatus,
    pub propSetDouble: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        index: c_int,
        value: c_double,
    ) -> OfxStatus,
    pub propSetInt: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        index: c_int,
        value: c_int,
    ) -> OfxStatus,
    pub propSetPointerN: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        count: c_int,
        value: *const *mut c_void,
    ) -> OfxStatus,
    pub propSetStringN: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        count: c_int,
        value: *const *const c_char,
    ) -> OfxStatus,
    pub propSetDoubleN: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        count: c_int,
        value: *const c_double,
    ) -> OfxStatus,
    pub propSetIntN: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        count: c_int,
        value: *const c_int,
    ) -> OfxStatus,
    pub propGetPointer: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        index: c_int,
        value: *mut *const c_void,
    ) -> OfxStatus,
    pub propGetString: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        index: c_int,
        value: *mut *const c_char,
    ) -> OfxStatus,
    pub propGetDouble: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        index: c_int,
        value: *mut c_double,
    ) -> OfxStatus,
    pub propGetInt: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        index: c_int,
        value: *mut c_int,
    ) -> OfxStatus,
    pub propGetPointerN: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        count: c_int,
        value: *mut *const c_void,
    ) -> OfxStatus,
    pub propGetStringN: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        count: c_int,
        value: *mut *const c_char,
    ) -> OfxStatus,
    pub propGetDoubleN: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        count: c_int,
        value: *mut c_double,
    ) -> OfxStatus,
    pub propGetIntN: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        count: c_int,
        value: *mut c_int,
    ) -> OfxStatus,
    pub propReset: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
    ) -> OfxStatus,
    pub propGetDimension: extern "C" fn(
        properties: OfxPropertySetHandle,
        property: *const c_char,
        count: *mut c_int,
    ) -> OfxStatus,
}

#[repr(C)]
pub struct OfxParameterSuiteV1 {
    pub paramDefine: extern "C" fn(
        paramSet: OfxParamSetHandle,
        paramType: *const c_char,
        name: *const c_char,
        propertySet: *mut OfxPropertySetHandle,
    ) -> OfxStatus,
    pub paramGetHandle: extern "C" fn(
        paramSet: OfxParamSetHandle,
        name: *const c_char,
        param: *mut OfxParamHandle,
        propertySet: *mut OfxPropertySetHandle,
    ) -> OfxStatus,
    pub paramSetGetPropertySet: extern "C" fn(
        paramSet: OfxParamSetHandle,
        propHandle: *mut OfxPropertySetHandle,
    ) -> OfxStatus,
    pub paramGetPropertySet: extern "C" fn(
        paramHandle: OfxParamHandle,
        propHandle: *mut OfxPropertySetHandle,
    ) -> OfxStatus,
    // Variadic in the header; see module comment.
    pub paramGetValue: extern "C" fn(
        paramHandle: OfxParamHandle,
        arg1: *mut c_void,
        arg2: *mut c_void,
        arg3: *mut c_void,
        arg4: *mut c_void,
    ) -> OfxStatus,
    pub paramGetValueAtTime: extern "C" fn(
        paramHandle: OfxParamHandle,
        time: OfxTime,
        arg1: *mut c_void,
        arg2: *mut c_void,
        arg3: *mut c_void,
        arg4: *mut c_void,
    ) -> OfxStatus,
    pub paramGetDerivative: extern "C" fn(
        paramHandle: OfxParamHandle,
        time: OfxTime,
        arg1: *mut c_void,
    ) -> OfxStatus,
    pub paramGetIntegral: extern "C" fn(
        paramHandle: OfxParamHandle,
        time1: OfxTime,
        time2: OfxTime,
        arg1: *mut c_void,
    ) -> OfxStatus,
    // Variadic in the header; see module comment.
    pub paramSetValue: extern "C" fn(
        paramHandle: OfxParamHandle,
        d1: c_double,
        d2: c_double,
        d3: c_double,
        d4: c_double,
        p1: *mut c_void,
        p2: *mut c_void,
        p3: *mut c_void,
        p4: *mut c_void,
        i1: c_int,
        i2: c_int,
        i3: c_int,
        i4: c_int,
    ) -> OfxStatus,
    pub paramSetValueAtTime: extern "C" fn(
        paramHandle: OfxParamHandle,
        time: OfxTime,
        d1: c_double,
        d2: c_double,
        d3: c_double,
        d4: c_double,
        p1: *mut c_void,
        p2: *mut c_void,
        p3: *mut c_void,
        p4: *mut c_void,
        i1: c_int,
        i2: c_int,
        i3: c_int,
        i4: c_int,
    ) -> OfxStatus,
    pub paramGetNumKeys: extern "C" fn(
        paramHandle: OfxParamHandle,
        numberOfKeys: *mut c_uint,
    ) -> OfxStatus,
    pub paramGetKeyTime: extern "C" fn(
        paramHandle: OfxParamHandle,
        nthKey: c_uint,
        time: *mut OfxTime,
    ) -> OfxStatus,
    pub paramGetKeyIndex: extern "C" fn(
        paramHandle: OfxParamHandle,
        time: OfxTime,
        direction: c_int,
        index: *mut c_int,
    ) -> OfxStatus,
    pub paramDeleteKey:
        extern "C" fn(paramHandle: OfxParamHandle, time: OfxTime) -> OfxStatus,
    pub paramDeleteAllKeys: extern "C" fn(paramHandle: OfxParamHandle) -> OfxStatus,
    pub paramCopy: extern "C" fn(
        paramTo: OfxParamHandle,
        paramFrom: OfxParamHandle,
        dstOffset: OfxTime,
        frameRange: *const OfxRangeD,
    ) -> OfxStatus,
    pub paramEditBegin:
        extern "C" fn(paramSet: OfxParamSetHandle, name: *const c_char) -> OfxStatus,
    pub paramEditEnd: extern "C" fn(paramSet: OfxParamSetHandle) -> OfxStatus,
}

#[repr(C)]
pub struct OfxMemorySuiteV1 {
    pub memoryAlloc: extern "C" fn(
        handle: *mut c_void,
        nBytes: usize,
        allocatedData: *mut *mut c_void,
    ) -> OfxStatus,
    pub memoryFree: extern "C" fn(allocatedData: *mut c_void) -> OfxStatus,
}

pub type OfxThreadFunctionV1 =
    extern "C" fn(threadIndex: c_uint, threadMax: c_uint, customArg: *mut c_void);

#[repr(C)]
pub struct OfxMultiThreadSuiteV1 {
    pub multiThread: extern "C" fn(
        func: Option<OfxThreadFunctionV1>,
        nThreads: c_uint,
        customArg: *mut c_void,
    ) -> OfxStatus,
    pub multiThreadNumCPUs: extern "C" fn(nCPUs: *mut c_uint) -> OfxStatus,
    pub multiThreadIndex: extern "C" fn(threadIndex: *mut c_uint) -> OfxStatus,
    pub multiThreadIsSpawnedThread: extern "C" fn() -> c_int,
    pub mutexCreate:
        extern "C" fn(mutex: *mut OfxMutexHandle, lockCount: c_int) -> OfxStatus,
    pub mutexDestroy: extern "C" fn(mutex: OfxMutexHandle) -> OfxStatus,
    pub mutexLock: extern "C" fn(mutex: OfxMutexHandle) -> OfxStatus,
    pub mutexUnLock: extern "C" fn(mutex: OfxMutexHandle) -> OfxStatus,
    pub mutexTryLock: extern "C" fn(mutex: OfxMutexHandle) -> OfxStatus,
}

/// The v2 message suite. The v1 layout is a prefix (just `message`),
/// so the same vtable serves both fetch versions.
#[repr(C)]
pub struct OfxMessageSuiteV2 {
    pub message: extern "C" fn(
        handle: *mut c_void,
        messageType: *const c_char,
        messageId: *const c_char,
        format: *const c_char,
    ) -> OfxStatus,
    pub setPersistentMessage: extern "C" fn(
        handle: *mut c_void,
        messageType: *const c_char,
        messageId: *const c_char,
        format: *const c_char,
    ) -> OfxStatus,
    pub clearPersistentMessage: extern "C" fn(handle: *mut c_void) -> OfxStatus,
}
