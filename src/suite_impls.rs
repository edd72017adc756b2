//! The suite entry points handed to plugins, and the `fetchSuite`
//! registry that serves them.
//!
//! Every entry decodes its handle, takes the global host lock,
//! resolves the target through the ownership tree and operates on its
//! property store. No panic may cross the ABI: each entry runs under
//! `trap`, which converts an unwind into `ErrFatal`.

#![allow(non_snake_case)]

use crate::constants as c;
use crate::handles::{Handle, HandleKind, HandleRef};
use crate::host::{self, HostMutex, MemoryBlock, ParamValue};
use crate::property::{Addr, PropertySet, PropertyValue};
use crate::schema;
use crate::suites::*;
use crate::types::*;
use libc::{c_char, c_double, c_int, c_uint, c_void};
use std::ffi::CStr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

fn trap(op: &str, f: impl FnOnce() -> OfxStatus) -> OfxStatus {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!("{}: panic caught at the plugin boundary", op);
        ofxstatus::ErrFatal
    })
}

fn trap_int(op: &str, f: impl FnOnce() -> c_int) -> c_int {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!("{}: panic caught at the plugin boundary", op);
        0
    })
}

fn decode(ptr: *const c_void) -> Option<HandleRef> {
    unsafe { HandleRef::decode(ptr) }
}

/// Decode a handle, resolve its property set and run `f` on it.
fn with_props<F>(handle: OfxPropertySetHandle, op: &str, f: F) -> OfxStatus
where
    F: FnOnce(&mut PropertySet) -> OfxStatus,
{
    let Some(r) = decode(handle) else {
        error!("{}: bad handle {:?}", op, handle);
        return ofxstatus::ErrBadHandle;
    };
    let mut host = host::global().lock().unwrap();
    match host.property_set(&r) {
        Some(props) => f(props),
        None => {
            error!("{}: {:?} does not resolve to an object", op, r);
            ofxstatus::ErrBadHandle
        }
    }
}

// ========= Property suite =========

fn set_property(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: PropertyValue,
    op: &str,
) -> OfxStatus {
    let Some(key) = cstr_to_string(property) else {
        return ofxstatus::ErrUnknown;
    };
    if index < 0 {
        return ofxstatus::ErrBadIndex;
    }
    with_props(handle, op, |props| {
        if !props.contains(&key) {
            warn!("{}: {} not in {}", op, key, props.name);
            return ofxstatus::ErrUnknown;
        }
        match props.update(&key, index as usize, value) {
            Ok(()) => ofxstatus::OK,
            Err(e) => {
                warn!("{}: {}", op, e);
                e.status
            }
        }
    })
}

extern "C" fn propSetPointer(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *mut c_void,
) -> OfxStatus {
    // NULL is stored as pointer 0 and read back as such
    trap("propSetPointer", || {
        set_property(properties, property, index, value.into(), "propSetPointer")
    })
}

extern "C" fn propSetString(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *const c_char,
) -> OfxStatus {
    trap("propSetString", || match cstr_to_string(value) {
        Some(s) => set_property(
            properties,
            property,
            index,
            s.as_str().into(),
            "propSetString",
        ),
        None => ofxstatus::ErrUnknown,
    })
}

extern "C" fn propSetDouble(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: c_double,
) -> OfxStatus {
    trap("propSetDouble", || {
        set_property(properties, property, index, value.into(), "propSetDouble")
    })
}

extern "C" fn propSetInt(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: c_int,
) -> OfxStatus {
    trap("propSetInt", || {
        set_property(properties, property, index, value.into(), "propSetInt")
    })
}

extern "C" fn propSetPointerN(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    count: c_int,
    value: *const *mut c_void,
) -> OfxStatus {
    trap("propSetPointerN", || {
        for i in 0..count {
            let v = unsafe { *value.offset(i as isize) };
            let stat = set_property(properties, property, i, v.into(), "propSetPointerN");
            if stat.failed() {
                return stat;
            }
        }
        ofxstatus::OK
    })
}

extern "C" fn propSetStringN(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    count: c_int,
    value: *const *const c_char,
) -> OfxStatus {
    trap("propSetStringN", || {
        for i in 0..count {
            let v = unsafe { *value.offset(i as isize) };
            let Some(s) = cstr_to_string(v) else {
                return ofxstatus::ErrUnknown;
            };
            let stat = set_property(
                properties,
                property,
                i,
                s.as_str().into(),
                "propSetStringN",
            );
            if stat.failed() {
                return stat;
            }
        }
        ofxstatus::OK
    })
}

extern "C" fn propSetDoubleN(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    count: c_int,
    value: *const c_double,
) -> OfxStatus {
    trap("propSetDoubleN", || {
        for i in 0..count {
            let v = unsafe { *value.offset(i as isize) };
            let stat = set_property(properties, property, i, v.into(), "propSetDoubleN");
            if stat.failed() {
                return stat;
            }
        }
        ofxstatus::OK
    })
}

extern "C" fn propSetIntN(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    count: c_int,
    value: *const c_int,
) -> OfxStatus {
    trap("propSetIntN", || {
        for i in 0..count {
            let v = unsafe { *value.offset(i as isize) };
            let stat = set_property(properties, property, i, v.into(), "propSetIntN");
            if stat.failed() {
                return stat;
            }
        }
        ofxstatus::OK
    })
}

fn get_property<T, F>(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    out: *mut T,
    op: &'static str,
    read: F,
) -> OfxStatus
where
    F: FnOnce(&PropertyValue, *mut T, &str, &PropertySet) -> OfxStatus,
{
    let Some(key) = cstr_to_string(property) else {
        return ofxstatus::ErrUnknown;
    };
    if index < 0 {
        return ofxstatus::ErrBadIndex;
    }
    with_props(handle, op, |props| match props.get(&key, index as usize) {
        Ok(v) => read(v, out, &key, props),
        Err(e) => {
            warn!("{}: {}", op, e);
            e.status
        }
    })
}

fn read_int(v: &PropertyValue, out: *mut c_int, key: &str, props: &PropertySet) -> OfxStatus {
    match v {
        PropertyValue::Int(i) => unsafe {
            *out = *i;
            ofxstatus::OK
        },
        // Plugins mix the numeric accessors up for rect and scale
        // properties; coerce rather than fail.
        PropertyValue::Double(d) => {
            debug!("propGetInt: coercing double {} for {}", d, key);
            unsafe { *out = *d as c_int };
            ofxstatus::OK
        }
        other => {
            warn!(
                "propGetInt: {} has unexpected type {:?} in {}",
                key, other, props.name
            );
            ofxstatus::ErrUnknown
        }
    }
}

fn read_double(
    v: &PropertyValue,
    out: *mut c_double,
    key: &str,
    props: &PropertySet,
) -> OfxStatus {
    match v {
        PropertyValue::Double(d) => unsafe {
            *out = *d;
            ofxstatus::OK
        },
        PropertyValue::Int(i) => {
            debug!("propGetDouble: coercing int {} for {}", i, key);
            unsafe { *out = *i as c_double };
            ofxstatus::OK
        }
        other => {
            warn!(
                "propGetDouble: {} has unexpected type {:?} in {}",
                key, other, props.name
            );
            ofxstatus::ErrUnknown
        }
    }
}

fn read_string(
    v: &PropertyValue,
    out: *mut *const c_char,
    key: &str,
    props: &PropertySet,
) -> OfxStatus {
    match v {
        // The pointer written here aims into the live cell and stays
        // valid until that cell is reassigned or its object dies.
        PropertyValue::String(s) => unsafe {
            *out = s.as_ptr();
            ofxstatus::OK
        },
        other => {
            warn!(
                "propGetString: {} has unexpected type {:?} in {}",
                key, other, props.name
            );
            ofxstatus::ErrUnknown
        }
    }
}

fn read_pointer(
    v: &PropertyValue,
    out: *mut *const c_void,
    key: &str,
    props: &PropertySet,
) -> OfxStatus {
    match v {
        PropertyValue::Pointer(Addr(p)) => unsafe {
            *out = *p;
            ofxstatus::OK
        },
        other => {
            warn!(
                "propGetPointer: {} has unexpected type {:?} in {}",
                key, other, props.name
            );
            ofxstatus::ErrUnknown
        }
    }
}

extern "C" fn propGetPointer(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *mut *const c_void,
) -> OfxStatus {
    trap("propGetPointer", || {
        get_property(properties, property, index, value, "propGetPointer", read_pointer)
    })
}

extern "C" fn propGetString(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *mut *const c_char,
) -> OfxStatus {
    trap("propGetString", || {
        get_property(properties, property, index, value, "propGetString", read_string)
    })
}

extern "C" fn propGetDouble(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *mut c_double,
) -> OfxStatus {
    trap("propGetDouble", || {
        get_property(properties, property, index, value, "propGetDouble", read_double)
    })
}

extern "C" fn propGetInt(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *mut c_int,
) -> OfxStatus {
    trap("propGetInt", || {
        get_property(properties, property, index, value, "propGetInt", read_int)
    })
}

extern "C" fn propGetPointerN(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    count: c_int,
    value: *mut *const c_void,
) -> OfxStatus {
    trap("propGetPointerN", || {
        for i in 0..count {
            let out = unsafe { value.offset(i as isize) };
            let stat =
                get_property(properties, property, i, out, "propGetPointerN", read_pointer);
            if stat.failed() {
                return stat;
            }
        }
        ofxstatus::OK
    })
}

extern "C" fn propGetStringN(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    count: c_int,
    value: *mut *const c_char,
) -> OfxStatus {
    trap("propGetStringN", || {
        for i in 0..count {
            let out = unsafe { value.offset(i as isize) };
            let stat =
                get_property(properties, property, i, out, "propGetStringN", read_string);
            if stat.failed() {
                return stat;
            }
        }
        ofxstatus::OK
    })
}

extern "C" fn propGetDoubleN(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    count: c_int,
    value: *mut c_double,
) -> OfxStatus {
    trap("propGetDoubleN", || {
        for i in 0..count {
            let out = unsafe { value.offset(i as isize) };
            let stat =
                get_property(properties, property, i, out, "propGetDoubleN", read_double);
            if stat.failed() {
                return stat;
            }
        }
        ofxstatus::OK
    })
}

extern "C" fn propGetIntN(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    count: c_int,
    value: *mut c_int,
) -> OfxStatus {
    trap("propGetIntN", || {
        for i in 0..count {
            let out = unsafe { value.offset(i as isize) };
            let stat = get_property(properties, property, i, out, "propGetIntN", read_int);
            if stat.failed() {
                return stat;
            }
        }
        ofxstatus::OK
    })
}

extern "C" fn propReset(
    properties: OfxPropertySetHandle,
    property: *const c_char,
) -> OfxStatus {
    // No UI, so there is nothing to revert to
    trap("propReset", || {
        let _ = (properties, property);
        ofxstatus::OK
    })
}

extern "C" fn propGetDimension(
    properties: OfxPropertySetHandle,
    property: *const c_char,
    count: *mut c_int,
) -> OfxStatus {
    trap("propGetDimension", || {
        let Some(key) = cstr_to_string(property) else {
            return ofxstatus::ErrUnknown;
        };
        with_props(properties, "propGetDimension", |props| {
            match props.length(&key) {
                Ok(n) => unsafe {
                    *count = n as c_int;
                    ofxstatus::OK
                },
                Err(e) => {
                    warn!("propGetDimension: {}", e);
                    e.status
                }
            }
        })
    })
}

pub static PROPERTY_SUITE: OfxPropertySuiteV1 = OfxPropertySuiteV1 {
    propSetPointer,
    propSetString,
    propSetDouble,
    propSetInt,
    propSetPointerN,
    propSetStringN,
    propSetDoubleN,
    propSetIntN,
    propGetPointer,
    propGetString,
    propGetDouble,
    propGetInt,
    propGetPointerN,
    propGetStringN,
    propGetDoubleN,
    propGetIntN,
    propReset,
    propGetDimension,
};

// ========= Image effect suite =========

/// The effect IS its property set and its parameter-set container:
/// identity calls hand the same pointer back, after checking it
/// decodes at all.
fn identity_handle(
    handle: *mut c_void,
    out: *mut *mut c_void,
    op: &str,
) -> OfxStatus {
    if decode(handle).is_none() {
        error!("{}: bad handle {:?}", op, handle);
        return ofxstatus::ErrBadHandle;
    }
    unsafe { *out = handle };
    ofxstatus::OK
}

extern "C" fn getPropertySet(
    imageEffect: OfxImageEffectHandle,
    propHandle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    trap("getPropertySet", || {
        identity_handle(imageEffect, propHandle, "getPropertySet")
    })
}

extern "C" fn getParamSet(
    imageEffect: OfxImageEffectHandle,
    paramSet: *mut OfxParamSetHandle,
) -> OfxStatus {
    trap("getParamSet", || {
        identity_handle(imageEffect, paramSet, "getParamSet")
    })
}

extern "C" fn clipDefine(
    imageEffect: OfxImageEffectHandle,
    name: *const c_char,
    propertySet: *mut OfxPropertySetHandle,
) -> OfxStatus {
    trap("clipDefine", || {
        let Some(r) = decode(imageEffect) else {
            return ofxstatus::ErrBadHandle;
        };
        let Some(name) = cstr_to_string(name) else {
            return ofxstatus::ErrUnknown;
        };
        let mut host = host::global().lock().unwrap();
        let Some(ctx) = host.context_mut(&r.bundle, &r.plugin, &r.context) else {
            error!("clipDefine: no context descriptor for {:?}", r);
            return ofxstatus::ErrBadHandle;
        };
        let handle = Handle::new(
            HandleKind::Clip,
            &r.bundle,
            &r.plugin,
            &r.context,
            "",
            &name,
        );
        if !propertySet.is_null() {
            unsafe { *propertySet = handle.ptr() };
        }
        let properties = schema::clip_descriptor_properties(&name);
        if ctx.clips.insert(name.clone(), crate::host::ClipDescriptor { handle, properties }).is_none() {
            ctx.clip_order.push(name);
        }
        ofxstatus::OK
    })
}

extern "C" fn clipGetHandle(
    imageEffect: OfxImageEffectHandle,
    name: *const c_char,
    clip: *mut OfxImageClipHandle,
    propertySet: *mut OfxPropertySetHandle,
) -> OfxStatus {
    trap("clipGetHandle", || {
        let Some(r) = decode(imageEffect) else {
            return ofxstatus::ErrBadHandle;
        };
        let Some(name) = cstr_to_string(name) else {
            return ofxstatus::ErrUnknown;
        };
        let mut host = host::global().lock().unwrap();
        let ptr = match r.kind {
            HandleKind::Instance => host
                .instance_mut(&r.instance)
                .and_then(|i| i.clips.get(&name))
                .map(|c| c.handle.ptr()),
            HandleKind::Context => host
                .context_mut(&r.bundle, &r.plugin, &r.context)
                .and_then(|ctx| ctx.clips.get(&name))
                .map(|c| c.handle.ptr()),
            _ => {
                error!("clipGetHandle: bad handle kind {:?}", r.kind);
                return ofxstatus::ErrBadHandle;
            }
        };
        match ptr {
            Some(ptr) => {
                unsafe {
                    *clip = ptr;
                    if !propertySet.is_null() {
                        *propertySet = ptr;
                    }
                }
                ofxstatus::OK
            }
            None => {
                warn!("clipGetHandle: no clip named {}", name);
                ofxstatus::ErrUnknown
            }
        }
    })
}

extern "C" fn clipGetPropertySet(
    clip: OfxImageClipHandle,
    propHandle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    trap("clipGetPropertySet", || {
        identity_handle(clip, propHandle, "clipGetPropertySet")
    })
}

extern "C" fn clipGetImage(
    clip: OfxImageClipHandle,
    time: OfxTime,
    region: *const OfxRectD,
    imageHandle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    trap("clipGetImage", || {
        let _ = (time, region);
        let Some(r) = decode(clip) else {
            return ofxstatus::ErrBadHandle;
        };
        if r.kind != HandleKind::ClipInstance {
            error!("clipGetImage: bad handle kind {:?}", r.kind);
            return ofxstatus::ErrBadHandle;
        }
        let mut host = host::global().lock().unwrap();
        let Some(clip) = host
            .instance_mut(&r.instance)
            .and_then(|i| i.clips.get(&r.name))
        else {
            return ofxstatus::ErrBadHandle;
        };
        let connected =
            clip.properties.get_int(c::OfxImageClipPropConnected, 0) == Some(1);
        match &clip.image {
            Some(image) if connected => {
                unsafe { *imageHandle = image.handle.ptr() };
                ofxstatus::OK
            }
            _ => {
                warn!("clipGetImage: clip {} is not connected", r.name);
                ofxstatus::Failed
            }
        }
    })
}

extern "C" fn clipReleaseImage(imageHandle: OfxPropertySetHandle) -> OfxStatus {
    // Bound images live until their clip is disconnected
    trap("clipReleaseImage", || {
        let _ = imageHandle;
        ofxstatus::OK
    })
}

extern "C" fn clipGetRegionOfDefinition(
    clip: OfxImageClipHandle,
    time: OfxTime,
    bounds: *mut OfxRectD,
) -> OfxStatus {
    // The OFX 1.4 signature cannot express this call usefully
    trap("clipGetRegionOfDefinition", || {
        let _ = (clip, time, bounds);
        ofxstatus::Failed
    })
}

extern "C" fn abort(imageEffect: OfxImageEffectHandle) -> c_int {
    // No cancellation path: never ask the plugin to abort
    trap_int("abort", || {
        let _ = imageEffect;
        0
    })
}

/// Allocate a tracked scratch buffer and register it under its
/// address. The handle carries the allocating instance's locator
/// fields when one was supplied.
fn alloc_block(instance_handle: *mut c_void, n_bytes: usize) -> usize {
    // Zero-byte requests still get a distinct address to key on
    let buffer = vec![0u8; n_bytes.max(1)].into_boxed_slice();
    let addr = buffer.as_ptr() as usize;
    let r = decode(instance_handle);
    let (bundle, plugin, context, instance) = match &r {
        Some(r) => (
            r.bundle.as_str(),
            r.plugin.as_str(),
            r.context.as_str(),
            r.instance.as_str(),
        ),
        None => ("", "", "", ""),
    };
    let handle = Handle::new(
        HandleKind::ImageMemory,
        bundle,
        plugin,
        context,
        instance,
        &addr.to_string(),
    );
    let mut host = host::global().lock().unwrap();
    host.memory.insert(
        addr,
        MemoryBlock {
            handle,
            buffer,
            lock_count: 0,
            size: n_bytes,
        },
    );
    addr
}

fn memory_key(memoryHandle: OfxImageMemoryHandle) -> Option<usize> {
    let r = decode(memoryHandle)?;
    if r.kind != HandleKind::ImageMemory {
        return None;
    }
    r.name.parse().ok()
}

extern "C" fn imageMemoryAlloc(
    instanceHandle: OfxImageEffectHandle,
    nBytes: usize,
    memoryHandle: *mut OfxImageMemoryHandle,
) -> OfxStatus {
    trap("imageMemoryAlloc", || {
        let addr = alloc_block(instanceHandle, nBytes);
        let host = host::global().lock().unwrap();
        unsafe { *memoryHandle = host.memory[&addr].handle.ptr() };
        ofxstatus::OK
    })
}

extern "C" fn imageMemoryFree(memoryHandle: OfxImageMemoryHandle) -> OfxStatus {
    trap("imageMemoryFree", || {
        let Some(key) = memory_key(memoryHandle) else {
            return ofxstatus::ErrBadHandle;
        };
        let mut host = host::global().lock().unwrap();
        match host.memory.get(&key) {
            None => ofxstatus::ErrBadHandle,
            Some(block) if block.lock_count > 0 => {
                warn!("imageMemoryFree: buffer is still locked");
                ofxstatus::Failed
            }
            Some(_) => {
                host.memory.remove(&key);
                ofxstatus::OK
            }
        }
    })
}

extern "C" fn imageMemoryLock(
    memoryHandle: OfxImageMemoryHandle,
    returnedPtr: *mut *mut c_void,
) -> OfxStatus {
    trap("imageMemoryLock", || {
        let Some(key) = memory_key(memoryHandle) else {
            return ofxstatus::ErrBadHandle;
        };
        let mut host = host::global().lock().unwrap();
        match host.memory.get_mut(&key) {
            None => ofxstatus::ErrBadHandle,
            Some(block) => {
                block.lock_count += 1;
                unsafe { *returnedPtr = block.buffer.as_ptr() as *mut c_void };
                ofxstatus::OK
            }
        }
    })
}

extern "C" fn imageMemoryUnlock(memoryHandle: OfxImageMemoryHandle) -> OfxStatus {
    trap("imageMemoryUnlock", || {
        let Some(key) = memory_key(memoryHandle) else {
            return ofxstatus::ErrBadHandle;
        };
        let mut host = host::global().lock().unwrap();
        match host.memory.get_mut(&key) {
            None => ofxstatus::ErrBadHandle,
            Some(block) => {
                block.lock_count = block.lock_count.saturating_sub(1);
                ofxstatus::OK
            }
        }
    })
}

pub static IMAGE_EFFECT_SUITE: OfxImageEffectSuiteV1 = OfxImageEffectSuiteV1 {
    getPropertySet,
    getParamSet,
    clipDefine,
    clipGetHandle,
    clipGetPropertySet,
    clipGetImage,
    clipReleaseImage,
    clipGetRegionOfDefinition,
    abort,
    imageMemoryAlloc,
    imageMemoryFree,
    imageMemoryLock,
    imageMemoryUnlock,
};

// ========= Parameter suite =========

extern "C" fn paramDefine(
    paramSet: OfxParamSetHandle,
    paramType: *const c_char,
    name: *const c_char,
    propertySet: *mut OfxPropertySetHandle,
) -> OfxStatus {
    trap("paramDefine", || {
        let Some(r) = decode(paramSet) else {
            return ofxstatus::ErrBadHandle;
        };
        let (Some(param_type), Some(name)) =
            (cstr_to_string(paramType), cstr_to_string(name))
        else {
            return ofxstatus::ErrUnknown;
        };
        if param_type == c::OfxParamTypeParametric {
            warn!("paramDefine: parametric parameters are not supported");
            return ofxstatus::ErrUnsupported;
        }
        if !schema::valid_param_type(&param_type) {
            warn!("paramDefine: {} is not a parameter type", param_type);
            return ofxstatus::ErrValue;
        }
        let mut host = host::global().lock().unwrap();
        let Some(ctx) = host.context_mut(&r.bundle, &r.plugin, &r.context) else {
            error!("paramDefine: no context descriptor for {:?}", r);
            return ofxstatus::ErrBadHandle;
        };
        let handle = Handle::new(
            HandleKind::Parameter,
            &r.bundle,
            &r.plugin,
            &r.context,
            "",
            &name,
        );
        if !propertySet.is_null() {
            unsafe { *propertySet = handle.ptr() };
        }
        let properties = schema::parameter_properties(&name, &param_type);
        if ctx
            .params
            .insert(name.clone(), crate::host::ParamDescriptor { handle, properties })
            .is_none()
        {
            ctx.param_order.push(name);
        }
        ofxstatus::OK
    })
}

extern "C" fn paramGetHandle(
    paramSet: OfxParamSetHandle,
    name: *const c_char,
    param: *mut OfxParamHandle,
    propertySet: *mut OfxPropertySetHandle,
) -> OfxStatus {
    trap("paramGetHandle", || {
        let Some(r) = decode(paramSet) else {
            return ofxstatus::ErrBadHandle;
        };
        let Some(name) = cstr_to_string(name) else {
            return ofxstatus::ErrUnknown;
        };
        let mut host = host::global().lock().unwrap();
        let ptr = match r.kind {
            HandleKind::Instance => host
                .instance_mut(&r.instance)
                .and_then(|i| i.params.get(&name))
                .map(|p| p.handle.ptr()),
            HandleKind::Context => host
                .context_mut(&r.bundle, &r.plugin, &r.context)
                .and_then(|ctx| ctx.params.get(&name))
                .map(|p| p.handle.ptr()),
            _ => {
                error!("paramGetHandle: bad handle kind {:?}", r.kind);
                return ofxstatus::ErrBadHandle;
            }
        };
        match ptr {
            Some(ptr) => {
                unsafe {
                    *param = ptr;
                    if !propertySet.is_null() {
                        *propertySet = ptr;
                    }
                }
                ofxstatus::OK
            }
            None => {
                warn!("paramGetHandle: no parameter named {}", name);
                ofxstatus::ErrUnknown
            }
        }
    })
}

extern "C" fn paramSetGetPropertySet(
    paramSet: OfxParamSetHandle,
    propHandle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    trap("paramSetGetPropertySet", || {
        identity_handle(paramSet, propHandle, "paramSetGetPropertySet")
    })
}

extern "C" fn paramGetPropertySet(
    paramHandle: OfxParamHandle,
    propHandle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    trap("paramGetPropertySet", || {
        identity_handle(paramHandle, propHandle, "paramGetPropertySet")
    })
}

/// Write a parameter's components through the captured out-pointers.
fn write_param_value(value: &ParamValue, outs: [*mut c_void; 4]) -> OfxStatus {
    unsafe fn put_int(out: *mut c_void, v: c_int) {
        if !out.is_null() {
            unsafe { *(out as *mut c_int) = v };
        }
    }
    unsafe fn put_dbl(out: *mut c_void, v: f64) {
        if !out.is_null() {
            unsafe { *(out as *mut c_double) = v };
        }
    }
    unsafe fn put_str(out: *mut c_void, v: *const c_char) {
        if !out.is_null() {
            unsafe { *(out as *mut *const c_char) = v };
        }
    }
    unsafe {
        match value {
            ParamValue::Boolean(b) => put_int(outs[0], *b as c_int),
            ParamValue::Choice(i) | ParamValue::Integer(i) => put_int(outs[0], *i),
            ParamValue::PushButton => put_int(outs[0], 0),
            ParamValue::Double(d) => put_dbl(outs[0], *d),
            ParamValue::Double2D(x, y) => {
                put_dbl(outs[0], *x);
                put_dbl(outs[1], *y);
            }
            ParamValue::Double3D(x, y, z) => {
                put_dbl(outs[0], *x);
                put_dbl(outs[1], *y);
                put_dbl(outs[2], *z);
            }
            ParamValue::Integer2D(x, y) => {
                put_int(outs[0], *x);
                put_int(outs[1], *y);
            }
            ParamValue::Integer3D(x, y, z) => {
                put_int(outs[0], *x);
                put_int(outs[1], *y);
                put_int(outs[2], *z);
            }
            ParamValue::Rgb(r, g, b) => {
                put_dbl(outs[0], *r);
                put_dbl(outs[1], *g);
                put_dbl(outs[2], *b);
            }
            ParamValue::Rgba(r, g, b, a) => {
                put_dbl(outs[0], *r);
                put_dbl(outs[1], *g);
                put_dbl(outs[2], *b);
                put_dbl(outs[3], *a);
            }
            ParamValue::String(s) | ParamValue::Custom(s) => {
                put_str(outs[0], s.as_ptr())
            }
            ParamValue::Group | ParamValue::Page => {
                warn!("paramGetValue on a parameter with no value");
                return ofxstatus::Failed;
            }
        }
    }
    ofxstatus::OK
}

fn get_param_value(paramHandle: OfxParamHandle, outs: [*mut c_void; 4]) -> OfxStatus {
    let Some(r) = decode(paramHandle) else {
        return ofxstatus::ErrBadHandle;
    };
    if r.kind != HandleKind::ParameterInstance {
        error!("paramGetValue: bad handle kind {:?}", r.kind);
        return ofxstatus::ErrBadHandle;
    }
    let mut host = host::global().lock().unwrap();
    let Some(param) = host
        .instance_mut(&r.instance)
        .and_then(|i| i.params.get(&r.name))
    else {
        return ofxstatus::ErrBadHandle;
    };
    write_param_value(&param.value, outs)
}

extern "C" fn paramGetValue(
    paramHandle: OfxParamHandle,
    arg1: *mut c_void,
    arg2: *mut c_void,
    arg3: *mut c_void,
    arg4: *mut c_void,
) -> OfxStatus {
    trap("paramGetValue", || {
        get_param_value(paramHandle, [arg1, arg2, arg3, arg4])
    })
}

extern "C" fn paramGetValueAtTime(
    paramHandle: OfxParamHandle,
    time: OfxTime,
    arg1: *mut c_void,
    arg2: *mut c_void,
    arg3: *mut c_void,
    arg4: *mut c_void,
) -> OfxStatus {
    // Parameters do not animate; time is irrelevant
    trap("paramGetValueAtTime", || {
        let _ = time;
        get_param_value(paramHandle, [arg1, arg2, arg3, arg4])
    })
}

extern "C" fn paramGetDerivative(
    paramHandle: OfxParamHandle,
    time: OfxTime,
    arg1: *mut c_void,
) -> OfxStatus {
    trap("paramGetDerivative", || {
        let _ = (paramHandle, time, arg1);
        ofxstatus::Failed
    })
}

extern "C" fn paramGetIntegral(
    paramHandle: OfxParamHandle,
    time1: OfxTime,
    time2: OfxTime,
    arg1: *mut c_void,
) -> OfxStatus {
    trap("paramGetIntegral", || {
        let _ = (paramHandle, time1, time2, arg1);
        ofxstatus::Failed
    })
}

fn set_param_value(
    paramHandle: OfxParamHandle,
    dbls: [c_double; 4],
    ptrs: [*mut c_void; 4],
) -> OfxStatus {
    let Some(r) = decode(paramHandle) else {
        return ofxstatus::ErrBadHandle;
    };
    if r.kind != HandleKind::ParameterInstance {
        error!("paramSetValue: bad handle kind {:?}", r.kind);
        return ofxstatus::ErrBadHandle;
    }
    let mut host = host::global().lock().unwrap();
    let Some(param) = host
        .instance_mut(&r.instance)
        .and_then(|i| i.params.get_mut(&r.name))
    else {
        return ofxstatus::ErrBadHandle;
    };
    // Integer arguments of the variadic call arrive in the pointer
    // capture slots; read them as machine words.
    let int = |i: usize| ptrs[i] as usize as c_int;
    let string = |p: *mut c_void| {
        if p.is_null() {
            std::ffi::CString::default()
        } else {
            unsafe { CStr::from_ptr(p as *const c_char) }.to_owned()
        }
    };
    let param_type = param
        .properties
        .get_str(c::OfxParamPropType, 0)
        .unwrap_or("")
        .to_string();
    param.value = match param_type.as_str() {
        c::OfxParamTypeBoolean => ParamValue::Boolean(int(0) != 0),
        c::OfxParamTypeChoice => ParamValue::Choice(int(0)),
        c::OfxParamTypeCustom => ParamValue::Custom(string(ptrs[0])),
        c::OfxParamTypeDouble => ParamValue::Double(dbls[0]),
        c::OfxParamTypeDouble2D => ParamValue::Double2D(dbls[0], dbls[1]),
        c::OfxParamTypeDouble3D => ParamValue::Double3D(dbls[0], dbls[1], dbls[2]),
        c::OfxParamTypeInteger => ParamValue::Integer(int(0)),
        c::OfxParamTypeInteger2D => ParamValue::Integer2D(int(0), int(1)),
        c::OfxParamTypeInteger3D => ParamValue::Integer3D(int(0), int(1), int(2)),
        c::OfxParamTypePushButton => ParamValue::PushButton,
        c::OfxParamTypeRGB => ParamValue::Rgb(dbls[0], dbls[1], dbls[2]),
        c::OfxParamTypeRGBA => {
            ParamValue::Rgba(dbls[0], dbls[1], dbls[2], dbls[3])
        }
        c::OfxParamTypeString => ParamValue::String(string(ptrs[0])),
        other => {
            warn!("paramSetValue: {} is not a settable type", other);
            return ofxstatus::Failed;
        }
    };
    ofxstatus::OK
}

extern "C" fn paramSetValue(
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
) -> OfxStatus {
    trap("paramSetValue", || {
        let _ = (i1, i2, i3, i4);
        set_param_value(paramHandle, [d1, d2, d3, d4], [p1, p2, p3, p4])
    })
}

extern "C" fn paramSetValueAtTime(
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
) -> OfxStatus {
    // Parameters do not animate; forward to the static set
    trap("paramSetValueAtTime", || {
        let _ = (time, i1, i2, i3, i4);
        set_param_value(paramHandle, [d1, d2, d3, d4], [p1, p2, p3, p4])
    })
}

extern "C" fn paramGetNumKeys(
    paramHandle: OfxParamHandle,
    numberOfKeys: *mut c_uint,
) -> OfxStatus {
    // Nothing animates, so never any keys
    trap("paramGetNumKeys", || {
        let _ = paramHandle;
        unsafe { *numberOfKeys = 0 };
        ofxstatus::OK
    })
}

extern "C" fn paramGetKeyTime(
    paramHandle: OfxParamHandle,
    nthKey: c_uint,
    time: *mut OfxTime,
) -> OfxStatus {
    trap("paramGetKeyTime", || {
        let _ = (paramHandle, nthKey);
        unsafe { *time = 0.0 };
        ofxstatus::OK
    })
}

extern "C" fn paramGetKeyIndex(
    paramHandle: OfxParamHandle,
    time: OfxTime,
    direction: c_int,
    index: *mut c_int,
) -> OfxStatus {
    trap("paramGetKeyIndex", || {
        let _ = (paramHandle, time, direction);
        unsafe { *index = -1 };
        ofxstatus::OK
    })
}

extern "C" fn paramDeleteKey(paramHandle: OfxParamHandle, time: OfxTime) -> OfxStatus {
    trap("paramDeleteKey", || {
        let _ = (paramHandle, time);
        ofxstatus::OK
    })
}

extern "C" fn paramDeleteAllKeys(paramHandle: OfxParamHandle) -> OfxStatus {
    trap("paramDeleteAllKeys", || {
        let _ = paramHandle;
        ofxstatus::OK
    })
}

extern "C" fn paramCopy(
    paramTo: OfxParamHandle,
    paramFrom: OfxParamHandle,
    dstOffset: OfxTime,
    frameRange: *const OfxRangeD,
) -> OfxStatus {
    // No UI drives copies
    trap("paramCopy", || {
        let _ = (paramTo, paramFrom, dstOffset, frameRange);
        ofxstatus::OK
    })
}

extern "C" fn paramEditBegin(
    paramSet: OfxParamSetHandle,
    name: *const c_char,
) -> OfxStatus {
    // No undo/redo
    trap("paramEditBegin", || {
        let _ = (paramSet, name);
        ofxstatus::OK
    })
}

extern "C" fn paramEditEnd(paramSet: OfxParamSetHandle) -> OfxStatus {
    trap("paramEditEnd", || {
        let _ = paramSet;
        ofxstatus::OK
    })
}

pub static PARAMETER_SUITE: OfxParameterSuiteV1 = OfxParameterSuiteV1 {
    paramDefine,
    paramGetHandle,
    paramSetGetPropertySet,
    paramGetPropertySet,
    paramGetValue,
    paramGetValueAtTime,
    paramGetDerivative,
    paramGetIntegral,
    paramSetValue,
    paramSetValueAtTime,
    paramGetNumKeys,
    paramGetKeyTime,
    paramGetKeyIndex,
    paramDeleteKey,
    paramDeleteAllKeys,
    paramCopy,
    paramEditBegin,
    paramEditEnd,
};

// ========= Memory suite =========

extern "C" fn memoryAlloc(
    handle: *mut c_void,
    nBytes: usize,
    allocatedData: *mut *mut c_void,
) -> OfxStatus {
    trap("memoryAlloc", || {
        let addr = alloc_block(handle, nBytes);
        unsafe { *allocatedData = addr as *mut c_void };
        ofxstatus::OK
    })
}

extern "C" fn memoryFree(allocatedData: *mut c_void) -> OfxStatus {
    trap("memoryFree", || {
        let mut host = host::global().lock().unwrap();
        if host.memory.remove(&(allocatedData as usize)).is_some() {
            ofxstatus::OK
        } else {
            ofxstatus::ErrBadHandle
        }
    })
}

pub static MEMORY_SUITE: OfxMemorySuiteV1 = OfxMemorySuiteV1 {
    memoryAlloc,
    memoryFree,
};

// ========= Multi-thread suite =========

extern "C" fn multiThread(
    func: Option<OfxThreadFunctionV1>,
    nThreads: c_uint,
    customArg: *mut c_void,
) -> OfxStatus {
    // Sequential by contract: the work function runs once, inline
    trap("multiThread", || {
        let _ = nThreads;
        match func {
            Some(func) => {
                func(0, 1, customArg);
                ofxstatus::OK
            }
            None => ofxstatus::Failed,
        }
    })
}

extern "C" fn multiThreadNumCPUs(nCPUs: *mut c_uint) -> OfxStatus {
    trap("multiThreadNumCPUs", || {
        unsafe { *nCPUs = 1 };
        ofxstatus::OK
    })
}

extern "C" fn multiThreadIndex(threadIndex: *mut c_uint) -> OfxStatus {
    trap("multiThreadIndex", || {
        unsafe { *threadIndex = 0 };
        ofxstatus::OK
    })
}

extern "C" fn multiThreadIsSpawnedThread() -> c_int {
    trap_int("multiThreadIsSpawnedThread", || 0)
}

extern "C" fn mutexCreate(mutex: *mut OfxMutexHandle, lockCount: c_int) -> OfxStatus {
    trap("mutexCreate", || {
        let uid = uuid::Uuid::new_v4().to_string();
        let entry = HostMutex {
            handle: Handle::new(HandleKind::Mutex, "", "", "", "", &uid),
            sem: Arc::new(host::Semaphore::new(lockCount)),
        };
        unsafe { *mutex = entry.handle.ptr() };
        host::global().lock().unwrap().mutexes.insert(uid, entry);
        ofxstatus::OK
    })
}

fn mutex_sem(mutex: OfxMutexHandle) -> Option<Arc<host::Semaphore>> {
    let r = decode(mutex)?;
    if r.kind != HandleKind::Mutex {
        return None;
    }
    let host = host::global().lock().unwrap();
    host.mutexes.get(&r.name).map(|m| m.sem.clone())
}

extern "C" fn mutexDestroy(mutex: OfxMutexHandle) -> OfxStatus {
    trap("mutexDestroy", || {
        let Some(r) = decode(mutex) else {
            return ofxstatus::ErrBadHandle;
        };
        if r.kind != HandleKind::Mutex {
            return ofxstatus::ErrBadHandle;
        }
        let mut host = host::global().lock().unwrap();
        if host.mutexes.remove(&r.name).is_some() {
            ofxstatus::OK
        } else {
            ofxstatus::ErrBadHandle
        }
    })
}

extern "C" fn mutexLock(mutex: OfxMutexHandle) -> OfxStatus {
    trap("mutexLock", || {
        // Acquire outside the host lock: a blocked acquire must not
        // hold up the unlocking caller
        match mutex_sem(mutex) {
            Some(sem) => {
                sem.acquire();
                ofxstatus::OK
            }
            None => ofxstatus::ErrBadHandle,
        }
    })
}

extern "C" fn mutexUnLock(mutex: OfxMutexHandle) -> OfxStatus {
    trap("mutexUnLock", || match mutex_sem(mutex) {
        Some(sem) => {
            sem.release();
            ofxstatus::OK
        }
        None => ofxstatus::ErrBadHandle,
    })
}

extern "C" fn mutexTryLock(mutex: OfxMutexHandle) -> OfxStatus {
    trap("mutexTryLock", || match mutex_sem(mutex) {
        Some(sem) => {
            if sem.try_acquire() {
                ofxstatus::OK
            } else {
                ofxstatus::Failed
            }
        }
        None => ofxstatus::ErrBadHandle,
    })
}

pub static MULTI_THREAD_SUITE: OfxMultiThreadSuiteV1 = OfxMultiThreadSuiteV1 {
    multiThread,
    multiThreadNumCPUs,
    multiThreadIndex,
    multiThreadIsSpawnedThread,
    mutexCreate,
    mutexDestroy,
    mutexLock,
    mutexUnLock,
    mutexTryLock,
};

// ========= Message suite =========

fn display_message(
    message_type: &str,
    message_id: &str,
    text: &str,
    handle_name: Option<&str>,
) -> OfxStatus {
    let from = handle_name.unwrap_or("plugin");
    match message_type {
        c::OfxMessageFatal | c::OfxMessageError => {
            error!("Message from {} [{}]: {}", from, message_id, text);
            ofxstatus::OK
        }
        c::OfxMessageWarning => {
            warn!("Message from {} [{}]: {}", from, message_id, text);
            ofxstatus::OK
        }
        c::OfxMessageLog => {
            info!("Message from {} [{}]: {}", from, message_id, text);
            ofxstatus::OK
        }
        c::OfxMessageMessage => {
            println!("Message from {}: {}", from, text);
            ofxstatus::OK
        }
        c::OfxMessageQuestion => {
            println!("Question from {}: {} (answering yes)", from, text);
            ofxstatus::ReplyYes
        }
        other => {
            warn!("Unknown message type {}", other);
            ofxstatus::Failed
        }
    }
}

extern "C" fn message(
    handle: *mut c_void,
    messageType: *const c_char,
    messageId: *const c_char,
    format: *const c_char,
) -> OfxStatus {
    // The format's varargs cannot be portably decoded; the format
    // string itself is logged verbatim
    trap("message", || {
        let _ = handle;
        let Some(message_type) = cstr_to_string(messageType) else {
            return ofxstatus::Failed;
        };
        let id = cstr_to_string(messageId).unwrap_or_default();
        let text = cstr_to_string(format).unwrap_or_default();
        display_message(&message_type, &id, &text, None)
    })
}

extern "C" fn setPersistentMessage(
    handle: *mut c_void,
    messageType: *const c_char,
    messageId: *const c_char,
    format: *const c_char,
) -> OfxStatus {
    trap("setPersistentMessage", || {
        let Some(message_type) = cstr_to_string(messageType) else {
            return ofxstatus::Failed;
        };
        let id = cstr_to_string(messageId).unwrap_or_default();
        let text = cstr_to_string(format).unwrap_or_default();
        let name = decode(handle).map(|r| r.name);
        display_message(&message_type, &id, &text, name.as_deref())
    })
}

extern "C" fn clearPersistentMessage(handle: *mut c_void) -> OfxStatus {
    trap("clearPersistentMessage", || {
        let _ = handle;
        ofxstatus::OK
    })
}

pub static MESSAGE_SUITE: OfxMessageSuiteV2 = OfxMessageSuiteV2 {
    message,
    setPersistentMessage,
    clearPersistentMessage,
};

// ========= Suite registry =========

pub extern "C" fn fetch_suite(
    _host: OfxPropertySetHandle,
    name: *const c_char,
    version: c_int,
) -> *const c_void {
    let Some(suite) = cstr_to_string(name) else {
        return std::ptr::null();
    };
    match suite.as_str() {
        c::OfxImageEffectSuite => &IMAGE_EFFECT_SUITE as *const _ as *const c_void,
        c::OfxPropertySuite => &PROPERTY_SUITE as *const _ as *const c_void,
        c::OfxParameterSuite => &PARAMETER_SUITE as *const _ as *const c_void,
        c::OfxMemorySuite => &MEMORY_SUITE as *const _ as *const c_void,
        c::OfxMultiThreadSuite => &MULTI_THREAD_SUITE as *const _ as *const c_void,
        c::OfxMessageSuite => &MESSAGE_SUITE as *const _ as *const c_void,
        _ => {
            warn!("fetchSuite: {} v{} is not available", suite, version);
            std::ptr::null()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::host::test_fixtures::install_instance;
    use crate::host::test_lock;
    use std::ffi::CString;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instance_handles(uid: &str) -> (*mut c_void, *mut c_void, *mut c_void) {
        let mut host = host::global().lock().unwrap();
        let instance = host.instance_mut(uid).unwrap();
        let inst = instance.handle.ptr();
        let clip = instance.clips["Source"].handle.ptr();
        let param = instance
            .params
            .values()
            .next()
            .map(|p| p.handle.ptr())
            .unwrap_or(std::ptr::null_mut());
        (inst, clip, param)
    }

    fn cleanup(uid: &str) {
        host::global().lock().unwrap().instances.remove(uid);
    }

    #[test]
    fn set_get_symmetry_all_types() {
        let _guard = test_lock();
        {
            let mut host = host::global().lock().unwrap();
            install_instance(&mut host, "ss-bundle", "org.test.ss", "ss-uid", &[]);
        }
        let (inst, _, _) = instance_handles("ss-uid");

        let key = CString::new(c::OfxImageEffectPropFrameRate).unwrap();
        assert_eq!(propSetDouble(inst, key.as_ptr(), 0, 24.0), ofxstatus::OK);
        let mut d = 0.0;
        assert_eq!(propGetDouble(inst, key.as_ptr(), 0, &mut d), ofxstatus::OK);
        assert_eq!(d, 24.0);

        let key = CString::new(c::OfxPropIsInteractive).unwrap();
        assert_eq!(propSetInt(inst, key.as_ptr(), 0, 1), ofxstatus::OK);
        let mut i = 0;
        assert_eq!(propGetInt(inst, key.as_ptr(), 0, &mut i), ofxstatus::OK);
        assert_eq!(i, 1);

        let key = CString::new(c::OfxImageEffectPropContext).unwrap();
        let value = CString::new(c::OfxImageEffectContextGeneral).unwrap();
        assert_eq!(
            propSetString(inst, key.as_ptr(), 0, value.as_ptr()),
            ofxstatus::OK
        );
        let mut s: *const c_char = std::ptr::null();
        assert_eq!(propGetString(inst, key.as_ptr(), 0, &mut s), ofxstatus::OK);
        let s = unsafe { CStr::from_ptr(s) }.to_str().unwrap();
        assert_eq!(s, c::OfxImageEffectContextGeneral);

        let key = CString::new(c::OfxPropInstanceData).unwrap();
        let marker = 0xbeef_usize as *mut c_void;
        assert_eq!(propSetPointer(inst, key.as_ptr(), 0, marker), ofxstatus::OK);
        let mut p: *const c_void = std::ptr::null();
        assert_eq!(propGetPointer(inst, key.as_ptr(), 0, &mut p), ofxstatus::OK);
        assert_eq!(p as usize, 0xbeef);

        // NULL pointer stores zero and reads back as zero
        assert_eq!(
            propSetPointer(inst, key.as_ptr(), 0, std::ptr::null_mut()),
            ofxstatus::OK
        );
        let mut p: *const c_void = 1 as *const c_void;
        assert_eq!(propGetPointer(inst, key.as_ptr(), 0, &mut p), ofxstatus::OK);
        assert!(p.is_null());

        cleanup("ss-uid");
    }

    #[test]
    fn n_variant_symmetry_and_append() {
        let _guard = test_lock();
        {
            let mut host = host::global().lock().unwrap();
            install_instance(&mut host, "nv-bundle", "org.test.nv", "nv-uid", &[]);
        }
        let (inst, clip, _) = instance_handles("nv-uid");

        // Fixed two-element double property
        let key = CString::new(c::OfxImageEffectPropProjectSize).unwrap();
        let values = [640.0, 480.0];
        assert_eq!(
            propSetDoubleN(inst, key.as_ptr(), 2, values.as_ptr()),
            ofxstatus::OK
        );
        let mut out = [0.0; 2];
        assert_eq!(
            propGetDoubleN(inst, key.as_ptr(), 2, out.as_mut_ptr()),
            ofxstatus::OK
        );
        assert_eq!(out, values);

        // count of zero touches nothing
        assert_eq!(
            propSetDoubleN(inst, key.as_ptr(), 0, std::ptr::null()),
            ofxstatus::OK
        );

        // Variable-length property grows by appending: the clip's
        // supported components list starts empty
        let key = CString::new(c::OfxImageEffectPropSupportedComponents).unwrap();
        let rgba = CString::new(c::OfxImageComponentRGBA).unwrap();
        let rgb = CString::new(c::OfxImageComponentRGB).unwrap();
        let values = [rgba.as_ptr(), rgb.as_ptr()];
        assert_eq!(
            propSetStringN(clip, key.as_ptr(), 2, values.as_ptr()),
            ofxstatus::OK
        );
        let mut n = 0;
        assert_eq!(propGetDimension(clip, key.as_ptr(), &mut n), ofxstatus::OK);
        assert_eq!(n, 2);

        // Writing past the end of a fixed-size property is refused
        let key = CString::new(c::OfxImageEffectPropProjectSize).unwrap();
        assert_eq!(
            propSetDouble(inst, key.as_ptr(), 2, 1.0),
            ofxstatus::ErrBadIndex
        );

        cleanup("nv-uid");
    }

    #[test]
    fn unknown_property_and_bad_handle() {
        let _guard = test_lock();
        {
            let mut host = host::global().lock().unwrap();
            install_instance(&mut host, "up-bundle", "org.test.up", "up-uid", &[]);
        }
        let (inst, _, _) = instance_handles("up-uid");

        let key = CString::new(c::OfxImagePropRowBytes).unwrap();
        let mut i = 0;
        // Known schema name, but not present on this object
        assert_eq!(
            propGetInt(inst, key.as_ptr(), 0, &mut i),
            ofxstatus::ErrUnknown
        );
        assert_eq!(
            propGetInt(std::ptr::null_mut(), key.as_ptr(), 0, &mut i),
            ofxstatus::ErrBadHandle
        );

        cleanup("up-uid");
    }

    #[test]
    fn param_define_and_fetch() {
        let _guard = test_lock();
        let ctx_ptr = {
            let mut host = host::global().lock().unwrap();
            crate::host::test_fixtures::install_plugin(
                &mut host,
                "pd-bundle",
                "org.test.pd",
            );
            host.context_mut(
                "pd-bundle",
                "org.test.pd",
                c::OfxImageEffectContextFilter,
            )
            .unwrap()
            .handle
            .ptr()
        };

        let ptype = CString::new(c::OfxParamTypeDouble).unwrap();
        let name = CString::new("gain").unwrap();
        let mut prop: *mut c_void = std::ptr::null_mut();
        assert_eq!(
            paramDefine(ctx_ptr, ptype.as_ptr(), name.as_ptr(), &mut prop),
            ofxstatus::OK
        );
        assert!(!prop.is_null());

        // The returned handle is the descriptor's property set
        let key = CString::new(c::OfxParamPropScriptName).unwrap();
        let mut s: *const c_char = std::ptr::null();
        assert_eq!(propGetString(prop, key.as_ptr(), 0, &mut s), ofxstatus::OK);
        assert_eq!(unsafe { CStr::from_ptr(s) }.to_str().unwrap(), "gain");

        // paramGetHandle on the context finds the descriptor again
        let mut param: *mut c_void = std::ptr::null_mut();
        assert_eq!(
            paramGetHandle(ctx_ptr, name.as_ptr(), &mut param, std::ptr::null_mut()),
            ofxstatus::OK
        );
        assert_eq!(param, prop);

        // Parametric parameters are refused
        let parametric = CString::new(c::OfxParamTypeParametric).unwrap();
        assert_eq!(
            paramDefine(ctx_ptr, parametric.as_ptr(), name.as_ptr(), &mut prop),
            ofxstatus::ErrUnsupported
        );

        host::global().lock().unwrap().bundles.remove("pd-bundle");
    }

    #[test]
    fn param_get_and_set_value() {
        let _guard = test_lock();
        {
            let mut host = host::global().lock().unwrap();
            install_instance(
                &mut host,
                "pv-bundle",
                "org.test.pv",
                "pv-uid",
                &[("gain", c::OfxParamTypeDouble)],
            );
        }
        let (_, _, param) = instance_handles("pv-uid");

        // Set through the capture shim: first double slot
        assert_eq!(
            paramSetValue(
                param,
                2.5,
                0.0,
                0.0,
                0.0,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                0,
                0,
                0,
                0
            ),
            ofxstatus::OK
        );
        let mut out = 0.0f64;
        assert_eq!(
            paramGetValue(
                param,
                &mut out as *mut f64 as *mut c_void,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut()
            ),
            ofxstatus::OK
        );
        assert_eq!(out, 2.5);

        // The at-time variants ignore time
        out = 0.0;
        assert_eq!(
            paramGetValueAtTime(
                param,
                7.0,
                &mut out as *mut f64 as *mut c_void,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut()
            ),
            ofxstatus::OK
        );
        assert_eq!(out, 2.5);

        cleanup("pv-uid");
    }

    #[test]
    fn param_integer_value_arrives_in_pointer_slot() {
        let _guard = test_lock();
        {
            let mut host = host::global().lock().unwrap();
            install_instance(
                &mut host,
                "pi-bundle",
                "org.test.pi",
                "pi-uid",
                &[("count", c::OfxParamTypeInteger)],
            );
        }
        let (_, _, param) = instance_handles("pi-uid");

        assert_eq!(
            paramSetValue(
                param,
                0.0,
                0.0,
                0.0,
                0.0,
                42usize as *mut c_void,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                0,
                0,
                0,
                0
            ),
            ofxstatus::OK
        );
        let mut out: c_int = 0;
        assert_eq!(
            paramGetValue(
                param,
                &mut out as *mut c_int as *mut c_void,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut()
            ),
            ofxstatus::OK
        );
        assert_eq!(out, 42);

        cleanup("pi-uid");
    }

    #[test]
    fn keyframe_stubs() {
        let _guard = test_lock();
        {
            let mut host = host::global().lock().unwrap();
            install_instance(
                &mut host,
                "kf-bundle",
                "org.test.kf",
                "kf-uid",
                &[("gain", c::OfxParamTypeDouble)],
            );
        }
        let (_, _, param) = instance_handles("kf-uid");

        let mut n: c_uint = 99;
        assert_eq!(paramGetNumKeys(param, &mut n), ofxstatus::OK);
        assert_eq!(n, 0);
        let mut t: OfxTime = 99.0;
        assert_eq!(paramGetKeyTime(param, 0, &mut t), ofxstatus::OK);
        assert_eq!(t, 0.0);
        let mut idx: c_int = 0;
        assert_eq!(paramGetKeyIndex(param, 0.0, 0, &mut idx), ofxstatus::OK);
        assert_eq!(idx, -1);
        assert_eq!(paramDeleteKey(param, 0.0), ofxstatus::OK);
        assert_eq!(paramDeleteAllKeys(param), ofxstatus::OK);
        assert_eq!(
            paramGetDerivative(param, 0.0, std::ptr::null_mut()),
            ofxstatus::Failed
        );
        assert_eq!(
            paramGetIntegral(param, 0.0, 1.0, std::ptr::null_mut()),
            ofxstatus::Failed
        );

        cleanup("kf-uid");
    }

    #[test]
    fn clip_get_image_requires_connection() {
        let _guard = test_lock();
        {
            let mut host = host::global().lock().unwrap();
            install_instance(&mut host, "ci-bundle", "org.test.ci", "ci-uid", &[]);
        }
        let (_, clip, _) = instance_handles("ci-uid");

        let mut image: *mut c_void = std::ptr::null_mut();
        assert_eq!(
            clipGetImage(clip, 0.0, std::ptr::null(), &mut image),
            ofxstatus::Failed
        );

        host::connect_buffer("ci-uid", "Source", 4, 2).unwrap();
        assert_eq!(
            clipGetImage(clip, 0.0, std::ptr::null(), &mut image),
            ofxstatus::OK
        );
        let r = decode(image).unwrap();
        assert_eq!(r.kind, HandleKind::Image);

        // The image handle resolves to the image property set
        let key = CString::new(c::OfxImagePropRowBytes).unwrap();
        let mut rowbytes = 0;
        assert_eq!(
            propGetInt(image, key.as_ptr(), 0, &mut rowbytes),
            ofxstatus::OK
        );
        assert_eq!(rowbytes, 16);

        assert_eq!(clipReleaseImage(image), ofxstatus::OK);
        cleanup("ci-uid");
    }

    #[test]
    fn image_memory_lock_discipline() {
        let _guard = test_lock();
        let mut mem: *mut c_void = std::ptr::null_mut();
        assert_eq!(
            imageMemoryAlloc(std::ptr::null_mut(), 1024, &mut mem),
            ofxstatus::OK
        );

        // Lock twice: free is refused until the count drains
        let mut ptr: *mut c_void = std::ptr::null_mut();
        assert_eq!(imageMemoryLock(mem, &mut ptr), ofxstatus::OK);
        assert!(!ptr.is_null());
        assert_eq!(imageMemoryLock(mem, &mut ptr), ofxstatus::OK);
        assert_eq!(imageMemoryFree(mem), ofxstatus::Failed);
        assert_eq!(imageMemoryUnlock(mem), ofxstatus::OK);
        assert_eq!(imageMemoryFree(mem), ofxstatus::Failed);
        assert_eq!(imageMemoryUnlock(mem), ofxstatus::OK);
        assert_eq!(imageMemoryFree(mem), ofxstatus::OK);
        // And a second free no longer finds the handle
        assert_eq!(imageMemoryFree(mem), ofxstatus::ErrBadHandle);
    }

    #[test]
    fn memory_suite_alloc_free() {
        let _guard = test_lock();
        let mut data: *mut c_void = std::ptr::null_mut();
        assert_eq!(
            memoryAlloc(std::ptr::null_mut(), 64, &mut data),
            ofxstatus::OK
        );
        assert!(!data.is_null());
        assert_eq!(memoryFree(data), ofxstatus::OK);
        assert_eq!(memoryFree(data), ofxstatus::ErrBadHandle);
    }

    static THREAD_CALLS: AtomicU32 = AtomicU32::new(0);
    static THREAD_ARGS: AtomicU32 = AtomicU32::new(0);

    extern "C" fn thread_fn(index: c_uint, max: c_uint, _arg: *mut c_void) {
        THREAD_CALLS.fetch_add(1, Ordering::SeqCst);
        THREAD_ARGS.store(index * 100 + max, Ordering::SeqCst);
    }

    #[test]
    fn multi_thread_runs_once_inline() {
        let _guard = test_lock();
        THREAD_CALLS.store(0, Ordering::SeqCst);
        assert_eq!(
            multiThread(Some(thread_fn), 8, std::ptr::null_mut()),
            ofxstatus::OK
        );
        assert_eq!(THREAD_CALLS.load(Ordering::SeqCst), 1);
        // Called as thread 0 of 1 regardless of the requested count
        assert_eq!(THREAD_ARGS.load(Ordering::SeqCst), 1);
        assert_eq!(
            multiThread(None, 1, std::ptr::null_mut()),
            ofxstatus::Failed
        );

        let mut n: c_uint = 0;
        assert_eq!(multiThreadNumCPUs(&mut n), ofxstatus::OK);
        assert_eq!(n, 1);
        let mut idx: c_uint = 9;
        assert_eq!(multiThreadIndex(&mut idx), ofxstatus::OK);
        assert_eq!(idx, 0);
        assert_eq!(multiThreadIsSpawnedThread(), 0);
    }

    #[test]
    fn mutex_semantics() {
        let _guard = test_lock();
        let mut mutex: *mut c_void = std::ptr::null_mut();
        assert_eq!(mutexCreate(&mut mutex, 1), ofxstatus::OK);
        assert_eq!(mutexTryLock(mutex), ofxstatus::OK);
        assert_eq!(mutexTryLock(mutex), ofxstatus::Failed);
        assert_eq!(mutexUnLock(mutex), ofxstatus::OK);
        assert_eq!(mutexLock(mutex), ofxstatus::OK);
        assert_eq!(mutexUnLock(mutex), ofxstatus::OK);
        assert_eq!(mutexDestroy(mutex), ofxstatus::OK);
        assert_eq!(mutexTryLock(mutex), ofxstatus::ErrBadHandle);
    }

    #[test]
    fn message_levels() {
        let _guard = test_lock();
        let question = CString::new(c::OfxMessageQuestion).unwrap();
        let error = CString::new(c::OfxMessageError).unwrap();
        let id = CString::new("msgid").unwrap();
        let text = CString::new("did it work?").unwrap();
        assert_eq!(
            message(
                std::ptr::null_mut(),
                question.as_ptr(),
                id.as_ptr(),
                text.as_ptr()
            ),
            ofxstatus::ReplyYes
        );
        assert_eq!(
            message(
                std::ptr::null_mut(),
                error.as_ptr(),
                id.as_ptr(),
                text.as_ptr()
            ),
            ofxstatus::OK
        );
        assert_eq!(
            clearPersistentMessage(std::ptr::null_mut()),
            ofxstatus::OK
        );
    }

    #[test]
    fn fetch_known_and_unknown_suites() {
        let name = CString::new(c::OfxPropertySuite).unwrap();
        assert!(!fetch_suite(std::ptr::null_mut(), name.as_ptr(), 1).is_null());
        let name = CString::new(c::OfxImageEffectSuite).unwrap();
        assert!(!fetch_suite(std::ptr::null_mut(), name.as_ptr(), 1).is_null());
        let name = CString::new("OfxInteractSuite").unwrap();
        assert!(fetch_suite(std::ptr::null_mut(), name.as_ptr(), 1).is_null());
    }
}
