//! Handle identity.
//!
//! Every host object a plugin can address owns a fixed six-field
//! record of NUL-terminated strings: object kind plus the locator
//! fields (bundle, plugin, context, instance uid, name) that place it
//! in the ownership tree. The record is boxed, and its address is the
//! opaque handle the plugin sees. When a suite call comes back in,
//! the host reads the record and walks the tree — handles carry keys,
//! not references, so the tree stays acyclic.

use libc::{c_char, c_void};
use std::ffi::{CStr, CString};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HandleKind {
    Host,
    Effect,
    Context,
    Clip,
    Parameter,
    Instance,
    ClipInstance,
    ParameterInstance,
    Image,
    RenderAction,
    SequenceRenderAction,
    ImageMemory,
    Mutex,
}

impl HandleKind {
    pub fn tag(self) -> &'static str {
        match self {
            HandleKind::Host => "OfxTypeImageEffectHost",
            HandleKind::Effect => "OfxTypeImageEffect",
            HandleKind::Context => "OfxImageEffectPropContext",
            HandleKind::Clip => "OfxTypeClip",
            HandleKind::Parameter => "OfxTypeParameter",
            HandleKind::Instance => "OfxTypeImageEffectInstance",
            HandleKind::ClipInstance => "OfxTypeClipInstance",
            HandleKind::ParameterInstance => "OfxTypeParameterInstance",
            HandleKind::Image => "OfxImage",
            HandleKind::RenderAction => "OfxRenderAction",
            HandleKind::SequenceRenderAction => "OfxSequenceRenderAction",
            HandleKind::ImageMemory => "OfxImageMemoryHandle",
            HandleKind::Mutex => "OfxMutex",
        }
    }

    pub fn from_tag(tag: &str) -> Option<HandleKind> {
        Some(match tag {
            "OfxTypeImageEffectHost" => HandleKind::Host,
            "OfxTypeImageEffect" => HandleKind::Effect,
            "OfxImageEffectPropContext" => HandleKind::Context,
            "OfxTypeClip" => HandleKind::Clip,
            "OfxTypeParameter" => HandleKind::Parameter,
            "OfxTypeImageEffectInstance" => HandleKind::Instance,
            "OfxTypeClipInstance" => HandleKind::ClipInstance,
            "OfxTypeParameterInstance" => HandleKind::ParameterInstance,
            "OfxImage" => HandleKind::Image,
            "OfxRenderAction" => HandleKind::RenderAction,
            "OfxSequenceRenderAction" => HandleKind::SequenceRenderAction,
            "OfxImageMemoryHandle" => HandleKind::ImageMemory,
            "OfxMutex" => HandleKind::Mutex,
            _ => return None,
        })
    }
}

/// The record a handle address points at. Layout is known to the
/// host only; plugins treat the address as opaque.
#[repr(C)]
pub struct RawHandle {
    kind: *const c_char,
    bundle: *const c_char,
    plugin: *const c_char,
    context: *const c_char,
    instance: *const c_char,
    name: *const c_char,
}

/// An owned handle record.
///
/// The `CString`s own the bytes the raw record points into; both the
/// boxed record and the string buffers keep their addresses when the
/// `Handle` itself moves.
pub struct Handle {
    raw: Box<RawHandle>,
    _strings: [CString; 6],
}

unsafe impl Send for Handle {}

impl Handle {
    pub fn new(
        kind: HandleKind,
        bundle: &str,
        plugin: &str,
        context: &str,
        instance: &str,
        name: &str,
    ) -> Handle {
        let strings = [
            CString::new(kind.tag()).unwrap(),
            CString::new(bundle).unwrap(),
            CString::new(plugin).unwrap(),
            CString::new(context).unwrap(),
            CString::new(instance).unwrap(),
            CString::new(name).unwrap(),
        ];
        let raw = Box::new(RawHandle {
            kind: strings[0].as_ptr(),
            bundle: strings[1].as_ptr(),
            plugin: strings[2].as_ptr(),
            context: strings[3].as_ptr(),
            instance: strings[4].as_ptr(),
            name: strings[5].as_ptr(),
        });
        Handle {
            raw,
            _strings: strings,
        }
    }

    /// The plugin-visible opaque pointer. Valid for the lifetime of
    /// this Handle.
    pub fn ptr(&self) -> *mut c_void {
        &*self.raw as *const RawHandle as *mut c_void
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({:?} @ {:?})", self._strings, self.ptr())
    }
}

/// A decoded copy of a handle record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandleRef {
    pub kind: HandleKind,
    pub bundle: String,
    pub plugin: String,
    pub context: String,
    pub instance: String,
    pub name: String,
}

impl HandleRef {
    /// Read the record a plugin handed back.
    ///
    /// Returns None for null pointers, unknown kinds or malformed
    /// strings; callers surface that as `ErrBadHandle`. The caller
    /// must only pass addresses the host itself issued as handles.
    pub unsafe fn decode(ptr: *const c_void) -> Option<HandleRef> {
        if ptr.is_null() {
            return None;
        }
        let raw = unsafe { &*(ptr as *const RawHandle) };
        let field = |p: *const c_char| -> Option<String> {
            if p.is_null() {
                return None;
            }
            unsafe { CStr::from_ptr(p) }.to_str().ok().map(String::from)
        };
        Some(HandleRef {
            kind: HandleKind::from_tag(&field(raw.kind)?)?,
            bundle: field(raw.bundle)?,
            plugin: field(raw.plugin)?,
            context: field(raw.context)?,
            instance: field(raw.instance)?,
            name: field(raw.name)?,
        })
    }
}
