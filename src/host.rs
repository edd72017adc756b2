//! The host singleton: the ownership tree of everything a plugin can
//! address, plus the action driver that walks plugins through their
//! lifecycle.
//!
//! Suites and the driver both reach the tree through a global mutex.
//! The driver never holds that lock while inside a plugin's
//! `mainEntry`; the plugin re-enters through the suites, which take
//! the lock per call.

use crate::bundle::{Bundle, enumerate_plugins};
use crate::constants as c;
use crate::frame_io;
use crate::handles::{Handle, HandleKind, HandleRef};
use crate::property::PropertySet;
use crate::schema;
use crate::types::{MainEntryFn, OfxHost, OfxStatus};
use anyhow::{Context, Result, anyhow, bail};
use libc::{c_int, c_void};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::ffi::CString;
use std::path::Path;
use std::sync::{Condvar, LazyLock, Mutex};
use tracing::{debug, warn};

/// The current value of one parameter instance.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Boolean(bool),
    Choice(c_int),
    Custom(CString),
    Double(f64),
    Double2D(f64, f64),
    Double3D(f64, f64, f64),
    Group,
    Integer(c_int),
    Integer2D(c_int, c_int),
    Integer3D(c_int, c_int, c_int),
    Page,
    PushButton,
    Rgb(f64, f64, f64),
    Rgba(f64, f64, f64, f64),
    String(CString),
}

impl ParamValue {
    /// Initial value from a parameter descriptor's declared type and
    /// `OfxParamPropDefault`.
    pub fn from_descriptor(props: &PropertySet) -> ParamValue {
        let int = |i: usize| props.get_int(c::OfxParamPropDefault, i).unwrap_or(0);
        let dbl = |i: usize| props.get_double(c::OfxParamPropDefault, i).unwrap_or(0.0);
        let string = || {
            CString::new(props.get_str(c::OfxParamPropDefault, 0).unwrap_or(""))
                .unwrap_or_default()
        };
        match props.get_str(c::OfxParamPropType, 0).unwrap_or("") {
            c::OfxParamTypeBoolean => ParamValue::Boolean(int(0) != 0),
            c::OfxParamTypeChoice => ParamValue::Choice(int(0)),
            c::OfxParamTypeCustom => ParamValue::Custom(string()),
            c::OfxParamTypeDouble => ParamValue::Double(dbl(0)),
            c::OfxParamTypeDouble2D => ParamValue::Double2D(dbl(0), dbl(1)),
            c::OfxParamTypeDouble3D => ParamValue::Double3D(dbl(0), dbl(1), dbl(2)),
            c::OfxParamTypeGroup => ParamValue::Group,
            c::OfxParamTypeInteger => ParamValue::Integer(int(0)),
            c::OfxParamTypeInteger2D => ParamValue::Integer2D(int(0), int(1)),
            c::OfxParamTypeInteger3D => {
                ParamValue::Integer3D(int(0), int(1), int(2))
            }
            c::OfxParamTypePage => ParamValue::Page,
            c::OfxParamTypePushButton => ParamValue::PushButton,
            c::OfxParamTypeRGB => ParamValue::Rgb(dbl(0), dbl(1), dbl(2)),
            c::OfxParamTypeRGBA => ParamValue::Rgba(dbl(0), dbl(1), dbl(2), dbl(3)),
            c::OfxParamTypeString => ParamValue::String(string()),
            other => {
                tracing::error!("{} is not a valid parameter type", other);
                ParamValue::Group
            }
        }
    }

    /// Coerce a JSON scalar or array to the parameter's declared type.
    pub fn from_json(param_type: &str, value: &Value) -> Result<ParamValue> {
        fn as_int(v: &Value) -> Result<c_int> {
            match v {
                Value::Bool(b) => Ok(*b as c_int),
                Value::Number(n) => n
                    .as_i64()
                    .map(|i| i as c_int)
                    .ok_or(anyhow!("{} is not an integer", n)),
                _ => bail!("expected an integer, got {}", v),
            }
        }
        fn as_dbl(v: &Value) -> Result<f64> {
            v.as_f64().ok_or(anyhow!("expected a number, got {}", v))
        }
        fn elems(v: &Value, n: usize) -> Result<&Vec<Value>> {
            let arr = v.as_array().ok_or(anyhow!("expected an array of {}", n))?;
            if arr.len() != n {
                bail!("expected {} elements, got {}", n, arr.len());
            }
            Ok(arr)
        }
        fn as_cstring(v: &Value) -> Result<CString> {
            let s = v.as_str().ok_or(anyhow!("expected a string, got {}", v))?;
            Ok(CString::new(s)?)
        }
        Ok(match param_type {
            c::OfxParamTypeBoolean => ParamValue::Boolean(as_int(value)? != 0),
            c::OfxParamTypeChoice => ParamValue::Choice(as_int(value)?),
            c::OfxParamTypeCustom => ParamValue::Custom(as_cstring(value)?),
            c::OfxParamTypeDouble => ParamValue::Double(as_dbl(value)?),
            c::OfxParamTypeDouble2D => {
                let v = elems(value, 2)?;
                ParamValue::Double2D(as_dbl(&v[0])?, as_dbl(&v[1])?)
            }
            c::OfxParamTypeDouble3D => {
                let v = elems(value, 3)?;
                ParamValue::Double3D(as_dbl(&v[0])?, as_dbl(&v[1])?, as_dbl(&v[2])?)
            }
            c::OfxParamTypeInteger => ParamValue::Integer(as_int(value)?),
            c::OfxParamTypeInteger2D => {
                let v = elems(value, 2)?;
                ParamValue::Integer2D(as_int(&v[0])?, as_int(&v[1])?)
            }
            c::OfxParamTypeInteger3D => {
                let v = elems(value, 3)?;
                ParamValue::Integer3D(as_int(&v[0])?, as_int(&v[1])?, as_int(&v[2])?)
            }
            c::OfxParamTypeRGB => {
                let v = elems(value, 3)?;
                ParamValue::Rgb(as_dbl(&v[0])?, as_dbl(&v[1])?, as_dbl(&v[2])?)
            }
            c::OfxParamTypeRGBA => {
                let v = elems(value, 4)?;
                ParamValue::Rgba(
                    as_dbl(&v[0])?,
                    as_dbl(&v[1])?,
                    as_dbl(&v[2])?,
                    as_dbl(&v[3])?,
                )
            }
            c::OfxParamTypeString => ParamValue::String(as_cstring(value)?),
            other => bail!("{} parameters cannot be set from JSON", other),
        })
    }

    /// JSON form for the parameter file. None for the valueless
    /// parameter types.
    pub fn to_json(&self) -> Option<Value> {
        let num = |d: f64| serde_json::Number::from_f64(d).map(Value::Number);
        let arr = |ds: &[f64]| -> Option<Value> {
            ds.iter()
                .map(|d| num(*d))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        };
        match self {
            ParamValue::Boolean(b) => Some(Value::from(*b as c_int)),
            ParamValue::Choice(i) | ParamValue::Integer(i) => Some(Value::from(*i)),
            ParamValue::Double(d) => num(*d),
            ParamValue::Double2D(x, y) => arr(&[*x, *y]),
            ParamValue::Double3D(x, y, z) => arr(&[*x, *y, *z]),
            ParamValue::Integer2D(x, y) => Some(Value::from(vec![*x, *y])),
            ParamValue::Integer3D(x, y, z) => Some(Value::from(vec![*x, *y, *z])),
            ParamValue::Rgb(r, g, b) => arr(&[*r, *g, *b]),
            ParamValue::Rgba(r, g, b, a) => arr(&[*r, *g, *b, *a]),
            ParamValue::String(s) => Some(Value::from(s.to_str().unwrap_or(""))),
            _ => None,
        }
    }
}

/// Counting semaphore backing the multi-thread suite's mutexes.
pub struct Semaphore {
    count: Mutex<c_int>,
    cond: Condvar,
}

impl Semaphore {
    pub fn new(count: c_int) -> Self {
        Self {
            count: Mutex::new(count),
            cond: Condvar::new(),
        }
    }

    pub fn acquire(&self) {
        let mut count = self.count.lock().unwrap();
        while *count <= 0 {
            count = self.cond.wait(count).unwrap();
        }
        *count -= 1;
    }

    pub fn try_acquire(&self) -> bool {
        let mut count = self.count.lock().unwrap();
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }

    pub fn release(&self) {
        *self.count.lock().unwrap() += 1;
        self.cond.notify_one();
    }
}

pub struct HostMutex {
    pub handle: Handle,
    pub sem: std::sync::Arc<Semaphore>,
}

/// A scratch buffer handed out by the memory suites.
pub struct MemoryBlock {
    pub handle: Handle,
    pub buffer: Box<[u8]>,
    pub lock_count: u32,
    #[allow(dead_code)]
    pub size: usize,
}

/// Pixel storage bound to a clip instance.
pub struct BoundImage {
    pub handle: Handle,
    pub properties: PropertySet,
    pub width: u32,
    pub height: u32,
    pub pixels: Box<[u8]>,
}

pub struct ClipInstance {
    pub handle: Handle,
    pub properties: PropertySet,
    pub image: Option<BoundImage>,
}

pub struct ParamInstance {
    pub handle: Handle,
    pub properties: PropertySet,
    pub value: ParamValue,
}

/// Property set conveyed as the in-args of a render-family action.
pub struct ActionArgs {
    pub handle: Handle,
    pub properties: PropertySet,
}

#[derive(Default)]
pub struct RenderState {
    pub sequence: Option<ActionArgs>,
    pub action: Option<ActionArgs>,
}

pub struct Instance {
    pub handle: Handle,
    pub bundle: String,
    pub plugin: String,
    pub context: String,
    #[allow(dead_code)]
    pub uid: String,
    pub main_entry: MainEntryFn,
    pub properties: PropertySet,
    pub clips: HashMap<String, ClipInstance>,
    pub params: HashMap<String, ParamInstance>,
    pub render: RenderState,
    pub sequence_open: bool,
}

impl Instance {
    /// Find a parameter instance by its script name.
    pub fn param_by_script_name(&mut self, script_name: &str) -> Option<&mut ParamInstance> {
        self.params.values_mut().find(|p| {
            p.properties.get_str(c::OfxParamPropScriptName, 0) == Some(script_name)
        })
    }
}

pub struct ClipDescriptor {
    pub handle: Handle,
    pub properties: PropertySet,
}

pub struct ParamDescriptor {
    pub handle: Handle,
    pub properties: PropertySet,
}

pub struct ContextDescriptor {
    pub handle: Handle,
    pub properties: PropertySet,
    pub clips: HashMap<String, ClipDescriptor>,
    pub clip_order: Vec<String>,
    pub params: HashMap<String, ParamDescriptor>,
    pub param_order: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PluginState {
    Loaded,
    Described,
}

pub struct PluginDescriptor {
    pub handle: Handle,
    #[allow(dead_code)]
    pub identifier: String,
    #[allow(dead_code)]
    pub version: (u32, u32),
    pub main_entry: MainEntryFn,
    pub properties: PropertySet,
    pub contexts: HashMap<String, ContextDescriptor>,
    pub state: PluginState,
}

pub struct LoadedBundle {
    #[allow(dead_code)]
    pub name: String,
    #[allow(dead_code)]
    pub path: std::path::PathBuf,
    // Kept alive so plugin code stays mapped; None only in tests.
    #[allow(dead_code)]
    pub library: Option<libloading::Library>,
    pub plugins: HashMap<String, PluginDescriptor>,
    pub plugin_order: Vec<String>,
}

pub struct Host {
    pub handle: Handle,
    pub properties: PropertySet,
    host_struct: Box<OfxHost>,
    pub bundles: HashMap<String, LoadedBundle>,
    pub instances: HashMap<String, Instance>,
    pub memory: HashMap<usize, MemoryBlock>,
    pub mutexes: HashMap<String, HostMutex>,
}

// The tree holds raw pointers (handles, the host struct), but the
// host is driven from one thread at a time under the global mutex.
unsafe impl Send for Host {}

impl Host {
    fn new() -> Host {
        let handle = Handle::new(HandleKind::Host, "", "", "", "", "ofx-host");
        let host_struct = Box::new(OfxHost {
            host: handle.ptr(),
            fetchSuite: crate::suite_impls::fetch_suite,
        });
        Host {
            handle,
            properties: schema::host_properties(),
            host_struct,
            bundles: HashMap::new(),
            instances: HashMap::new(),
            memory: HashMap::new(),
            mutexes: HashMap::new(),
        }
    }

    pub fn host_struct_ptr(&self) -> *mut OfxHost {
        &*self.host_struct as *const OfxHost as *mut OfxHost
    }

    pub fn context_mut(
        &mut self,
        bundle: &str,
        plugin: &str,
        context: &str,
    ) -> Option<&mut ContextDescriptor> {
        self.bundles
            .get_mut(bundle)?
            .plugins
            .get_mut(plugin)?
            .contexts
            .get_mut(context)
    }

    pub fn instance_mut(&mut self, uid: &str) -> Option<&mut Instance> {
        self.instances.get_mut(uid)
    }

    /// Walk the ownership tree to the property set a handle names.
    /// This is the single decode path every suite shares.
    pub fn property_set(&mut self, r: &HandleRef) -> Option<&mut PropertySet> {
        match r.kind {
            HandleKind::Host => Some(&mut self.properties),
            HandleKind::Effect => self
                .bundles
                .get_mut(&r.bundle)?
                .plugins
                .get_mut(&r.plugin)
                .map(|p| &mut p.properties),
            HandleKind::Context => self
                .context_mut(&r.bundle, &r.plugin, &r.context)
                .map(|c| &mut c.properties),
            HandleKind::Clip => self
                .context_mut(&r.bundle, &r.plugin, &r.context)?
                .clips
                .get_mut(&r.name)
                .map(|c| &mut c.properties),
            HandleKind::Parameter => self
                .context_mut(&r.bundle, &r.plugin, &r.context)?
                .params
                .get_mut(&r.name)
                .map(|p| &mut p.properties),
            HandleKind::Instance => self
                .instances
                .get_mut(&r.instance)
                .map(|i| &mut i.properties),
            HandleKind::ClipInstance => self
                .instances
                .get_mut(&r.instance)?
                .clips
                .get_mut(&r.name)
                .map(|c| &mut c.properties),
            HandleKind::ParameterInstance => self
                .instances
                .get_mut(&r.instance)?
                .params
                .get_mut(&r.name)
                .map(|p| &mut p.properties),
            HandleKind::Image => self
                .instances
                .get_mut(&r.instance)?
                .clips
                .get_mut(&r.name)?
                .image
                .as_mut()
                .map(|img| &mut img.properties),
            HandleKind::RenderAction => self
                .instances
                .get_mut(&r.instance)?
                .render
                .action
                .as_mut()
                .map(|a| &mut a.properties),
            HandleKind::SequenceRenderAction => self
                .instances
                .get_mut(&r.instance)?
                .render
                .sequence
                .as_mut()
                .map(|a| &mut a.properties),
            // Memory and mutex handles have no property set
            HandleKind::ImageMemory | HandleKind::Mutex => None,
        }
    }
}

static HOST: LazyLock<Mutex<Host>> = LazyLock::new(|| Mutex::new(Host::new()));

pub fn global() -> &'static Mutex<Host> {
    &HOST
}

/// Serialises tests that touch the global host.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

fn string_list(props: &PropertySet, key: &str) -> Vec<String> {
    let n = props.length(key).unwrap_or(0);
    (0..n)
        .filter_map(|i| props.get_str(key, i).map(String::from))
        .collect()
}

// ========= Action driver =========

fn call_action(
    entry: MainEntryFn,
    action: &str,
    handle: *const c_void,
    in_args: *mut c_void,
) -> OfxStatus {
    debug!("action {}", action);
    let action = CString::new(action).unwrap();
    unsafe { entry(action.as_ptr(), handle, in_args, std::ptr::null_mut()) }
}

fn try_call(
    entry: MainEntryFn,
    action: &str,
    handle: *const c_void,
    in_args: *mut c_void,
) -> Result<()> {
    let stat = call_action(entry, action, handle, in_args);
    if stat.succeeded() {
        Ok(())
    } else {
        bail!("{} failed: {:?}", action, stat);
    }
}

/// Open a bundle's binary, enumerate its plugins, hand each the host
/// struct, and register effect descriptors. Idempotent per bundle.
pub fn load_bundle(dir: &Path, bundle_name: &str) -> Result<()> {
    {
        let host = global().lock().unwrap();
        if host.bundles.contains_key(bundle_name) {
            return Ok(());
        }
    }
    let bundle = Bundle::locate(dir, bundle_name)?;
    let lib = bundle.load()?;
    let plugins = enumerate_plugins(&lib)?;
    if plugins.is_empty() {
        bail!("No image effect plugins in bundle {}", bundle_name);
    }

    let mut host = global().lock().unwrap();
    let host_ptr = host.host_struct_ptr();
    let path_str = bundle.path.to_string_lossy().to_string();
    let mut loaded = LoadedBundle {
        name: bundle_name.to_string(),
        path: bundle.path.clone(),
        library: Some(lib),
        plugins: HashMap::new(),
        plugin_order: Vec::new(),
    };
    for info in plugins {
        debug!(
            "{}: {} v{}.{}, API version {}",
            bundle_name,
            info.identifier,
            info.version_major,
            info.version_minor,
            info.api_version
        );
        // setHost must not re-enter the host state; fetchSuite is a
        // pure table lookup so a plugin calling it here is safe.
        unsafe { (info.set_host)(host_ptr) };
        let id = info.identifier.clone();
        loaded.plugins.insert(
            id.clone(),
            PluginDescriptor {
                handle: Handle::new(
                    HandleKind::Effect,
                    bundle_name,
                    &id,
                    "",
                    "",
                    &id,
                ),
                identifier: id.clone(),
                version: (info.version_major, info.version_minor),
                main_entry: info.main_entry,
                properties: schema::effect_properties(&id, &path_str),
                contexts: HashMap::new(),
                state: PluginState::Loaded,
            },
        );
        loaded.plugin_order.push(id);
    }
    host.bundles.insert(bundle_name.to_string(), loaded);
    Ok(())
}

/// Plugin identifiers of a loaded bundle, in enumeration order.
pub fn plugin_identifiers(bundle_name: &str) -> Result<Vec<String>> {
    let host = global().lock().unwrap();
    let bundle = host
        .bundles
        .get(bundle_name)
        .ok_or(anyhow!("Bundle {} not loaded", bundle_name))?;
    Ok(bundle.plugin_order.clone())
}

/// Run Load and Describe, then DescribeInContext for every context
/// both the host and the plugin support.
pub fn load_and_describe(bundle_name: &str, plugin_id: &str) -> Result<()> {
    let (entry, effect_ptr) = {
        let mut host = global().lock().unwrap();
        let plugin = host
            .bundles
            .get_mut(bundle_name)
            .ok_or(anyhow!("Bundle {} not loaded", bundle_name))?
            .plugins
            .get_mut(plugin_id)
            .ok_or(anyhow!("Plugin {} not found in bundle", plugin_id))?;
        (plugin.main_entry, plugin.handle.ptr() as *const c_void)
    };

    try_call(entry, c::OfxActionLoad, std::ptr::null(), std::ptr::null_mut())?;
    try_call(entry, c::OfxActionDescribe, effect_ptr, std::ptr::null_mut())?;

    let contexts = {
        let mut host = global().lock().unwrap();
        let host_contexts =
            string_list(&host.properties, c::OfxImageEffectPropSupportedContexts);
        let plugin = host
            .bundles
            .get_mut(bundle_name)
            .and_then(|b| b.plugins.get_mut(plugin_id))
            .ok_or(anyhow!("Plugin {} disappeared during describe", plugin_id))?;
        plugin.state = PluginState::Described;
        let plugin_contexts = string_list(
            &plugin.properties,
            c::OfxImageEffectPropSupportedContexts,
        );
        let mut to_describe = Vec::new();
        for ctx in host_contexts {
            if !plugin_contexts.contains(&ctx) {
                continue;
            }
            let descriptor =
                plugin.contexts.entry(ctx.clone()).or_insert_with(|| {
                    ContextDescriptor {
                        handle: Handle::new(
                            HandleKind::Context,
                            bundle_name,
                            plugin_id,
                            &ctx,
                            "",
                            &ctx,
                        ),
                        properties: schema::context_properties(&ctx),
                        clips: HashMap::new(),
                        clip_order: Vec::new(),
                        params: HashMap::new(),
                        param_order: Vec::new(),
                    }
                });
            to_describe.push(descriptor.handle.ptr());
        }
        if to_describe.is_empty() {
            bail!(
                "Plugin {} supports none of the host contexts",
                plugin_id
            );
        }
        to_describe
    };

    for ctx_ptr in contexts {
        try_call(
            entry,
            c::OfxImageEffectActionDescribeInContext,
            ctx_ptr,
            ctx_ptr,
        )?;
    }
    Ok(())
}

/// Build a live instance from a context descriptor and run
/// CreateInstance on it. Returns the instance uid.
pub fn create_instance(
    bundle_name: &str,
    plugin_id: &str,
    context: &str,
    width: u32,
    height: u32,
) -> Result<String> {
    let uid = uuid::Uuid::new_v4().to_string();
    let (entry, inst_ptr) = {
        let mut host = global().lock().unwrap();
        let plugin = host
            .bundles
            .get(bundle_name)
            .and_then(|b| b.plugins.get(plugin_id))
            .ok_or(anyhow!("Plugin {} not found in bundle", plugin_id))?;
        if plugin.state != PluginState::Described {
            bail!("Plugin {} has not been described", plugin_id);
        }
        let entry = plugin.main_entry;
        let file_path = plugin
            .properties
            .get_str(c::OfxPluginPropFilePath, 0)
            .unwrap_or("")
            .to_string();
        let ctx = plugin.contexts.get(context).ok_or(anyhow!(
            "Plugin {} does not support context {}",
            plugin_id,
            context
        ))?;

        let mut clips = HashMap::new();
        for (name, descriptor) in &ctx.clips {
            let mut properties = descriptor.properties.clone();
            properties.name = format!("clip_{}_instance", name);
            schema::add_clip_instance_properties(&mut properties);
            clips.insert(
                name.clone(),
                ClipInstance {
                    handle: Handle::new(
                        HandleKind::ClipInstance,
                        bundle_name,
                        plugin_id,
                        context,
                        &uid,
                        name,
                    ),
                    properties,
                    image: None,
                },
            );
        }

        let mut params = HashMap::new();
        for (name, descriptor) in &ctx.params {
            params.insert(
                name.clone(),
                ParamInstance {
                    handle: Handle::new(
                        HandleKind::ParameterInstance,
                        bundle_name,
                        plugin_id,
                        context,
                        &uid,
                        name,
                    ),
                    properties: descriptor.properties.clone(),
                    value: ParamValue::from_descriptor(&descriptor.properties),
                },
            );
        }

        let mut properties = schema::instance_properties(context, width, height);
        properties.seed(c::OfxPluginPropFilePath, file_path.as_str());

        let instance = Instance {
            handle: Handle::new(
                HandleKind::Instance,
                bundle_name,
                plugin_id,
                context,
                &uid,
                &uid,
            ),
            bundle: bundle_name.to_string(),
            plugin: plugin_id.to_string(),
            context: context.to_string(),
            uid: uid.clone(),
            main_entry: entry,
            properties,
            clips,
            params,
            render: RenderState::default(),
            sequence_open: false,
        };
        let inst_ptr = instance.handle.ptr() as *const c_void;
        host.instances.insert(uid.clone(), instance);
        (entry, inst_ptr)
    };

    if let Err(e) = try_call(
        entry,
        c::OfxActionCreateInstance,
        inst_ptr,
        std::ptr::null_mut(),
    ) {
        global().lock().unwrap().instances.remove(&uid);
        return Err(e);
    }
    Ok(uid)
}

/// Coerce and apply a parameter map from a render job.
pub fn load_parameters(uid: &str, values: &BTreeMap<String, Value>) -> Result<()> {
    let mut host = global().lock().unwrap();
    let instance = host
        .instance_mut(uid)
        .ok_or(anyhow!("No instance {}", uid))?;
    for (script_name, value) in values {
        let Some(param) = instance.param_by_script_name(script_name) else {
            warn!("No parameter with script name {}", script_name);
            continue;
        };
        let param_type = param
            .properties
            .get_str(c::OfxParamPropType, 0)
            .unwrap_or("")
            .to_string();
        param.value = ParamValue::from_json(&param_type, value)
            .with_context(|| format!("Parameter \"{}\"", script_name))?;
    }
    Ok(())
}

fn bind_image(
    host: &mut Host,
    uid: &str,
    clip_name: &str,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
) -> Result<()> {
    let instance = host
        .instance_mut(uid)
        .ok_or(anyhow!("No instance {}", uid))?;
    let (bundle, plugin, context) = (
        instance.bundle.clone(),
        instance.plugin.clone(),
        instance.context.clone(),
    );
    let clip = instance
        .clips
        .get_mut(clip_name)
        .ok_or(anyhow!("No clip named {}", clip_name))?;
    let pixels: Box<[u8]> = pixels.into_boxed_slice();
    let data = pixels.as_ptr() as *const c_void;
    clip.image = Some(BoundImage {
        handle: Handle::new(
            HandleKind::Image,
            &bundle,
            &plugin,
            &context,
            uid,
            clip_name,
        ),
        properties: schema::image_properties(clip_name, data, width, height),
        width,
        height,
        pixels,
    });
    clip.properties
        .update(c::OfxImageClipPropConnected, 0, 1.into())
        .map_err(|e| anyhow!("{}", e))?;
    Ok(())
}

/// Decode an image file and bind it to a clip. The decoded size must
/// match the render window; the host does not resize.
pub fn connect_image(
    uid: &str,
    clip_name: &str,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<()> {
    let (w, h, pixels) = frame_io::read_image(path)?;
    if (w, h) != (width, height) {
        bail!(
            "Image \"{}\" is {}x{}, expected {}x{}",
            path.display(),
            w,
            h,
            width,
            height
        );
    }
    let mut host = global().lock().unwrap();
    bind_image(&mut host, uid, clip_name, width, height, pixels)
}

/// Bind a zeroed buffer to a clip (the output of a render).
pub fn connect_buffer(uid: &str, clip_name: &str, width: u32, height: u32) -> Result<()> {
    let pixels = vec![0u8; width as usize * height as usize * 4];
    let mut host = global().lock().unwrap();
    bind_image(&mut host, uid, clip_name, width, height, pixels)
}

pub fn disconnect(uid: &str, clip_name: &str) -> Result<()> {
    let mut host = global().lock().unwrap();
    let instance = host
        .instance_mut(uid)
        .ok_or(anyhow!("No instance {}", uid))?;
    let clip = instance
        .clips
        .get_mut(clip_name)
        .ok_or(anyhow!("No clip named {}", clip_name))?;
    clip.image = None;
    clip.properties
        .update(c::OfxImageClipPropConnected, 0, 0.into())
        .map_err(|e| anyhow!("{}", e))?;
    Ok(())
}

/// Write a connected clip's pixels to an image file.
pub fn save_image(uid: &str, clip_name: &str, path: &Path) -> Result<()> {
    let host = global().lock().unwrap();
    let instance = host
        .instances
        .get(uid)
        .ok_or(anyhow!("No instance {}", uid))?;
    let image = instance
        .clips
        .get(clip_name)
        .and_then(|clip| clip.image.as_ref())
        .ok_or(anyhow!("Clip {} has no image bound", clip_name))?;
    frame_io::write_image(path, image.width, image.height, &image.pixels)
}

pub fn begin_sequence_render(uid: &str) -> Result<()> {
    let (entry, inst_ptr, seq_ptr) = {
        let mut host = global().lock().unwrap();
        let instance = host
            .instance_mut(uid)
            .ok_or(anyhow!("No instance {}", uid))?;
        if instance.sequence_open {
            bail!("Instance {} already has an open render sequence", uid);
        }
        let args = ActionArgs {
            handle: Handle::new(
                HandleKind::SequenceRenderAction,
                &instance.bundle,
                &instance.plugin,
                &instance.context,
                uid,
                "render_sequence",
            ),
            properties: schema::sequence_render_action_properties(),
        };
        let seq_ptr = args.handle.ptr();
        instance.render.sequence = Some(args);
        instance.sequence_open = true;
        (
            instance.main_entry,
            instance.handle.ptr() as *const c_void,
            seq_ptr,
        )
    };
    try_call(
        entry,
        c::OfxImageEffectActionBeginSequenceRender,
        inst_ptr,
        seq_ptr,
    )
}

/// Render one frame. A failing status from the plugin surfaces to
/// the caller.
pub fn render(uid: &str, width: u32, height: u32) -> Result<()> {
    let (entry, inst_ptr, action_ptr) = {
        let mut host = global().lock().unwrap();
        let instance = host
            .instance_mut(uid)
            .ok_or(anyhow!("No instance {}", uid))?;
        if !instance.sequence_open {
            bail!("Render outside of a render sequence");
        }
        let args = ActionArgs {
            handle: Handle::new(
                HandleKind::RenderAction,
                &instance.bundle,
                &instance.plugin,
                &instance.context,
                uid,
                "render_action",
            ),
            properties: schema::render_action_properties(width, height),
        };
        let action_ptr = args.handle.ptr();
        instance.render.action = Some(args);
        (
            instance.main_entry,
            instance.handle.ptr() as *const c_void,
            action_ptr,
        )
    };
    let stat = call_action(entry, c::OfxImageEffectActionRender, inst_ptr, action_ptr);
    {
        let mut host = global().lock().unwrap();
        if let Some(instance) = host.instance_mut(uid) {
            instance.render.action = None;
        }
    }
    if stat.failed() {
        bail!("{} failed: {:?}", c::OfxImageEffectActionRender, stat);
    }
    Ok(())
}

pub fn end_sequence_render(uid: &str) -> Result<()> {
    let (entry, inst_ptr, seq_ptr) = {
        let mut host = global().lock().unwrap();
        let instance = host
            .instance_mut(uid)
            .ok_or(anyhow!("No instance {}", uid))?;
        let seq_ptr = instance
            .render
            .sequence
            .as_ref()
            .map(|args| args.handle.ptr())
            .ok_or(anyhow!("No open render sequence on {}", uid))?;
        (
            instance.main_entry,
            instance.handle.ptr() as *const c_void,
            seq_ptr,
        )
    };
    let result = try_call(
        entry,
        c::OfxImageEffectActionEndSequenceRender,
        inst_ptr,
        seq_ptr,
    );
    let mut host = global().lock().unwrap();
    if let Some(instance) = host.instance_mut(uid) {
        instance.render.sequence = None;
        instance.sequence_open = false;
    }
    result
}

pub fn destroy_instance(uid: &str) -> Result<()> {
    let (entry, inst_ptr) = {
        let host = global().lock().unwrap();
        let instance = host
            .instances
            .get(uid)
            .ok_or(anyhow!("No instance {}", uid))?;
        (instance.main_entry, instance.handle.ptr() as *const c_void)
    };
    let result = try_call(
        entry,
        c::OfxActionDestroyInstance,
        inst_ptr,
        std::ptr::null_mut(),
    );
    global().lock().unwrap().instances.remove(uid);
    result
}

pub fn unload_plugin(bundle_name: &str, plugin_id: &str) -> Result<()> {
    let entry = {
        let host = global().lock().unwrap();
        host.bundles
            .get(bundle_name)
            .and_then(|b| b.plugins.get(plugin_id))
            .ok_or(anyhow!("Plugin {} not loaded", plugin_id))?
            .main_entry
    };
    let result = try_call(
        entry,
        c::OfxActionUnload,
        std::ptr::null(),
        std::ptr::null_mut(),
    );
    let mut host = global().lock().unwrap();
    if let Some(bundle) = host.bundles.get_mut(bundle_name) {
        bundle.plugins.remove(plugin_id);
        bundle.plugin_order.retain(|id| id != plugin_id);
    }
    result
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    pub unsafe extern "C" fn dummy_main_entry(
        _action: *const libc::c_char,
        _handle: *const c_void,
        _in_args: *mut c_void,
        _out_args: *mut c_void,
    ) -> OfxStatus {
        crate::types::ofxstatus::OK
    }

    /// Install a described plugin with one context, one clip
    /// descriptor and no parameters under the global host.
    pub fn install_plugin(host: &mut Host, bundle: &str, plugin: &str) {
        let context = c::OfxImageEffectContextFilter;
        let mut ctx = ContextDescriptor {
            handle: Handle::new(HandleKind::Context, bundle, plugin, context, "", context),
            properties: schema::context_properties(context),
            clips: HashMap::new(),
            clip_order: Vec::new(),
            params: HashMap::new(),
            param_order: Vec::new(),
        };
        ctx.clips.insert(
            "Source".to_string(),
            ClipDescriptor {
                handle: Handle::new(
                    HandleKind::Clip,
                    bundle,
                    plugin,
                    context,
                    "",
                    "Source",
                ),
                properties: schema::clip_descriptor_properties("Source"),
            },
        );
        ctx.clip_order.push("Source".to_string());

        let mut descriptor = PluginDescriptor {
            handle: Handle::new(HandleKind::Effect, bundle, plugin, "", "", plugin),
            identifier: plugin.to_string(),
            version: (1, 0),
            main_entry: dummy_main_entry,
            properties: schema::effect_properties(plugin, "/tmp/fake.ofx.bundle"),
            contexts: HashMap::new(),
            state: PluginState::Described,
        };
        descriptor.contexts.insert(context.to_string(), ctx);

        let mut bundle_entry = LoadedBundle {
            name: bundle.to_string(),
            path: "/tmp/fake.ofx.bundle".into(),
            library: None,
            plugins: HashMap::new(),
            plugin_order: vec![plugin.to_string()],
        };
        bundle_entry.plugins.insert(plugin.to_string(), descriptor);
        host.bundles.insert(bundle.to_string(), bundle_entry);
    }

    /// Install a live instance with one clip and the given parameter
    /// descriptors instantiated at their defaults.
    pub fn install_instance(
        host: &mut Host,
        bundle: &str,
        plugin: &str,
        uid: &str,
        param_specs: &[(&str, &str)],
    ) {
        let context = c::OfxImageEffectContextFilter;
        let mut clips = HashMap::new();
        let mut props = schema::clip_descriptor_properties("Source");
        schema::add_clip_instance_properties(&mut props);
        clips.insert(
            "Source".to_string(),
            ClipInstance {
                handle: Handle::new(
                    HandleKind::ClipInstance,
                    bundle,
                    plugin,
                    context,
                    uid,
                    "Source",
                ),
                properties: props,
                image: None,
            },
        );
        let mut params = HashMap::new();
        for (name, param_type) in param_specs {
            let properties = schema::parameter_properties(name, param_type);
            params.insert(
                name.to_string(),
                ParamInstance {
                    handle: Handle::new(
                        HandleKind::ParameterInstance,
                        bundle,
                        plugin,
                        context,
                        uid,
                        name,
                    ),
                    properties: properties.clone(),
                    value: ParamValue::from_descriptor(&properties),
                },
            );
        }
        host.instances.insert(
            uid.to_string(),
            Instance {
                handle: Handle::new(HandleKind::Instance, bundle, plugin, context, uid, uid),
                bundle: bundle.to_string(),
                plugin: plugin.to_string(),
                context: context.to_string(),
                uid: uid.to_string(),
                main_entry: dummy_main_entry,
                properties: schema::instance_properties(context, 4, 2),
                clips,
                params,
                render: RenderState::default(),
                sequence_open: false,
            },
        );
    }
}

#[cfg(test)]
mod test {
    use super::test_fixtures::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn dispatch_walks_the_tree() {
        let _guard = test_lock();
        let mut host = global().lock().unwrap();
        install_plugin(&mut host, "disp-bundle", "org.test.disp");
        install_instance(
            &mut host,
            "disp-bundle",
            "org.test.disp",
            "disp-uid",
            &[("gain", c::OfxParamTypeDouble)],
        );

        let cases = [
            Handle::new(HandleKind::Host, "", "", "", "", "ofx-host"),
            Handle::new(HandleKind::Effect, "disp-bundle", "org.test.disp", "", "", ""),
            Handle::new(
                HandleKind::Context,
                "disp-bundle",
                "org.test.disp",
                c::OfxImageEffectContextFilter,
                "",
                "",
            ),
            Handle::new(
                HandleKind::Clip,
                "disp-bundle",
                "org.test.disp",
                c::OfxImageEffectContextFilter,
                "",
                "Source",
            ),
            Handle::new(
                HandleKind::Instance,
                "disp-bundle",
                "org.test.disp",
                c::OfxImageEffectContextFilter,
                "disp-uid",
                "disp-uid",
            ),
            Handle::new(
                HandleKind::ClipInstance,
                "disp-bundle",
                "org.test.disp",
                c::OfxImageEffectContextFilter,
                "disp-uid",
                "Source",
            ),
            Handle::new(
                HandleKind::ParameterInstance,
                "disp-bundle",
                "org.test.disp",
                c::OfxImageEffectContextFilter,
                "disp-uid",
                "gain",
            ),
        ];
        for handle in &cases {
            let r = unsafe { HandleRef::decode(handle.ptr()) }.unwrap();
            assert!(
                host.property_set(&r).is_some(),
                "no property set for {:?}",
                r.kind
            );
        }

        // A locator that names nothing resolves to no property set
        let stray = Handle::new(
            HandleKind::ClipInstance,
            "disp-bundle",
            "org.test.disp",
            c::OfxImageEffectContextFilter,
            "disp-uid",
            "NoSuchClip",
        );
        let r = unsafe { HandleRef::decode(stray.ptr()) }.unwrap();
        assert!(host.property_set(&r).is_none());

        host.instances.remove("disp-uid");
        host.bundles.remove("disp-bundle");
    }

    #[test]
    fn render_action_dispatch() {
        let _guard = test_lock();
        let mut host = global().lock().unwrap();
        install_instance(&mut host, "ra-bundle", "org.test.ra", "ra-uid", &[]);
        let instance = host.instance_mut("ra-uid").unwrap();
        instance.render.action = Some(ActionArgs {
            handle: Handle::new(
                HandleKind::RenderAction,
                "ra-bundle",
                "org.test.ra",
                c::OfxImageEffectContextFilter,
                "ra-uid",
                "render_action",
            ),
            properties: schema::render_action_properties(4, 2),
        });
        let ptr = instance.render.action.as_ref().unwrap().handle.ptr();
        let r = unsafe { HandleRef::decode(ptr) }.unwrap();
        assert_eq!(r.kind, HandleKind::RenderAction);
        let props = host.property_set(&r).unwrap();
        assert_eq!(props.get_int(c::OfxImageEffectPropRenderWindow, 2), Some(4));
        host.instances.remove("ra-uid");
    }

    #[test]
    fn json_scalar_coerces_to_double() {
        let v = ParamValue::from_json(c::OfxParamTypeDouble, &json!(0.5)).unwrap();
        assert_eq!(v, ParamValue::Double(0.5));
    }

    #[test]
    fn json_array_coerces_to_rgba() {
        let v =
            ParamValue::from_json(c::OfxParamTypeRGBA, &json!([1, 2, 3, 4])).unwrap();
        assert_eq!(v, ParamValue::Rgba(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn json_bool_and_int_coerce_to_boolean() {
        assert_eq!(
            ParamValue::from_json(c::OfxParamTypeBoolean, &json!(true)).unwrap(),
            ParamValue::Boolean(true)
        );
        assert_eq!(
            ParamValue::from_json(c::OfxParamTypeBoolean, &json!(0)).unwrap(),
            ParamValue::Boolean(false)
        );
    }

    #[test]
    fn json_wrong_arity_is_an_error() {
        assert!(ParamValue::from_json(c::OfxParamTypeRGB, &json!([1, 2])).is_err());
        assert!(ParamValue::from_json(c::OfxParamTypeInteger, &json!("x")).is_err());
    }

    #[test]
    fn load_parameters_applies_values() {
        let _guard = test_lock();
        {
            let mut host = global().lock().unwrap();
            install_instance(
                &mut host,
                "lp-bundle",
                "org.test.lp",
                "lp-uid",
                &[("gain", c::OfxParamTypeDouble), ("tint", c::OfxParamTypeRGBA)],
            );
        }
        let mut values = BTreeMap::new();
        values.insert("gain".to_string(), json!(0.5));
        values.insert("tint".to_string(), json!([1, 2, 3, 4]));
        load_parameters("lp-uid", &values).unwrap();
        let mut host = global().lock().unwrap();
        let instance = host.instance_mut("lp-uid").unwrap();
        assert_eq!(instance.params["gain"].value, ParamValue::Double(0.5));
        assert_eq!(
            instance.params["tint"].value,
            ParamValue::Rgba(1.0, 2.0, 3.0, 4.0)
        );
        host.instances.remove("lp-uid");
    }

    #[test]
    fn defaults_from_descriptor() {
        let props = schema::parameter_properties("mix", c::OfxParamTypeDouble);
        assert_eq!(ParamValue::from_descriptor(&props), ParamValue::Double(0.0));
        let props = schema::parameter_properties("on", c::OfxParamTypeBoolean);
        assert_eq!(
            ParamValue::from_descriptor(&props),
            ParamValue::Boolean(false)
        );
        let props = schema::parameter_properties("col", c::OfxParamTypeRGB);
        assert_eq!(
            ParamValue::from_descriptor(&props),
            ParamValue::Rgb(0.0, 0.0, 0.0)
        );
    }

    #[test]
    fn connect_and_disconnect_buffer() {
        let _guard = test_lock();
        {
            let mut host = global().lock().unwrap();
            install_instance(&mut host, "cb-bundle", "org.test.cb", "cb-uid", &[]);
        }
        connect_buffer("cb-uid", "Source", 4, 2).unwrap();
        {
            let mut host = global().lock().unwrap();
            let clip = &host.instance_mut("cb-uid").unwrap().clips["Source"];
            assert_eq!(
                clip.properties.get_int(c::OfxImageClipPropConnected, 0),
                Some(1)
            );
            let image = clip.image.as_ref().unwrap();
            assert_eq!(image.pixels.len(), 32);
            assert_eq!(
                image.properties.get_int(c::OfxImagePropRowBytes, 0),
                Some(16)
            );
        }
        disconnect("cb-uid", "Source").unwrap();
        {
            let mut host = global().lock().unwrap();
            let clip = &host.instance_mut("cb-uid").unwrap().clips["Source"];
            assert_eq!(
                clip.properties.get_int(c::OfxImageClipPropConnected, 0),
                Some(0)
            );
            assert!(clip.image.is_none());
            host.instances.remove("cb-uid");
        }
    }

    #[test]
    fn semaphore_counting() {
        let sem = Semaphore::new(2);
        assert!(sem.try_acquire());
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
        sem.release();
        assert!(sem.try_acquire());
    }
}
