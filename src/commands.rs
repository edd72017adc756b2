//! The four CLI commands: list, params, filter, render.
//!
//! These drive the action lifecycle end to end. A filter render runs
//! Load, Describe, DescribeInContext, CreateInstance, parameter
//! load, BeginSequenceRender, clip binds, Render, save, unbinds,
//! EndSequenceRender, DestroyInstance, Unload.

use crate::constants as c;
use crate::frame_io::{self, FrameSize, ImagePaths, RenderJob};
use crate::host::{self, ContextDescriptor, ParamValue};
use crate::property::PropertySet;
use anyhow::{Result, anyhow, bail};
use std::collections::BTreeMap;
use std::path::Path;

pub fn list_plugins(dir: &Path, bundle: &str) -> Result<()> {
    host::load_bundle(dir, bundle)?;
    for id in host::plugin_identifiers(bundle)? {
        println!("{}", id);
    }
    Ok(())
}

/// Pick the context to describe a plugin in: filter when available,
/// otherwise the first context the host described.
fn choose_context(bundle: &str, plugin: &str) -> Result<String> {
    let mut host = host::global().lock().unwrap();
    let contexts = &host
        .bundles
        .get_mut(bundle)
        .and_then(|b| b.plugins.get_mut(plugin))
        .ok_or(anyhow!("Plugin {} not loaded", plugin))?
        .contexts;
    for preferred in [c::OfxImageEffectContextFilter, c::OfxImageEffectContextGeneral] {
        if contexts.contains_key(preferred) {
            return Ok(preferred.to_string());
        }
    }
    contexts
        .keys()
        .next()
        .cloned()
        .ok_or(anyhow!("Plugin {} was described in no context", plugin))
}

/// One-line (or few-line) rendering of a parameter descriptor, or
/// None for secret and valueless parameters.
fn param_brief(props: &PropertySet) -> Option<String> {
    if props.get_int(c::OfxParamPropSecret, 0) == Some(1) {
        return None;
    }
    let script = props.get_str(c::OfxParamPropScriptName, 0)?;
    let line = match ParamValue::from_descriptor(props) {
        ParamValue::Integer(i) => format!("{:20} {:10} {:>10}", script, "Integer", i),
        ParamValue::Double(d) => format!("{:20} {:10} {:>14.3}", script, "Double", d),
        ParamValue::Boolean(b) => {
            format!("{:20} {:10} {:>10}", script, "Boolean", b as i32)
        }
        ParamValue::Choice(active) => {
            let mut line =
                format!("{:20} {:10} {:>10}", script, "Choice", active);
            let options = props.length(c::OfxParamPropChoiceOption).unwrap_or(0);
            for i in 0..options {
                let marker = if i as i32 == active { "->" } else { "  " };
                line += &format!(
                    "\n{:>43} {}",
                    marker,
                    props.get_str(c::OfxParamPropChoiceOption, i).unwrap_or("")
                );
            }
            line
        }
        ParamValue::Rgba(r, g, b, a) => format!(
            "{:20} {:10} {:>14.3}\n{:>46.3}\n{:>46.3}\n{:>46.3}",
            script, "RGBA", r, g, b, a
        ),
        ParamValue::Rgb(r, g, b) => format!(
            "{:20} {:10} {:>14.3}\n{:>46.3}\n{:>46.3}",
            script, "RGB", r, g, b
        ),
        ParamValue::Double2D(x, y) => format!(
            "{:20} {:10} {:>14.3}\n{:>46.3}",
            script, "Double 2D", x, y
        ),
        ParamValue::Integer2D(x, y) => {
            format!("{:20} {:10} {:>10}\n{:>42}", script, "Integer 2D", x, y)
        }
        ParamValue::Double3D(x, y, z) => format!(
            "{:20} {:10} {:>14.3}\n{:>46.3}\n{:>46.3}",
            script, "Double 3D", x, y, z
        ),
        ParamValue::Integer3D(x, y, z) => format!(
            "{:20} {:10} {:>10}\n{:>42}\n{:>42}",
            script, "Integer 3D", x, y, z
        ),
        ParamValue::String(s) => format!(
            "{:20} {:10}        {}",
            script,
            "String",
            s.to_str().unwrap_or("")
        ),
        _ => return None,
    };
    Some(line)
}

fn clip_brief(props: &PropertySet) -> Option<String> {
    let name = props.get_str(c::OfxPropName, 0)?;
    let optional = props.get_int(c::OfxImageClipPropOptional, 0) == Some(1);
    Some(format!(
        "{:20} {}",
        name,
        if optional { "Optional" } else { "Required" }
    ))
}

/// Script name and JSON default of a parameter descriptor, or None
/// for secret and valueless parameters.
fn param_default_json(props: &PropertySet) -> Option<(String, serde_json::Value)> {
    if props.get_int(c::OfxParamPropSecret, 0) == Some(1) {
        return None;
    }
    let script = props.get_str(c::OfxParamPropScriptName, 0)?;
    let value = ParamValue::from_descriptor(props).to_json()?;
    Some((script.to_string(), value))
}

/// A render-job template for a described context: every parameter at
/// its default, every clip listed with a null path. The `Output`
/// clip is always required.
fn job_template(
    bundle: &str,
    plugin: &str,
    context: &str,
    descriptor: &ContextDescriptor,
) -> RenderJob {
    let mut parameters = BTreeMap::new();
    for name in &descriptor.param_order {
        if let Some((script, value)) =
            param_default_json(&descriptor.params[name].properties)
        {
            parameters.insert(script, value);
        }
    }
    let mut image_paths = ImagePaths::default();
    for name in &descriptor.clip_order {
        let props = &descriptor.clips[name].properties;
        let optional = props.get_int(c::OfxImageClipPropOptional, 0) == Some(1)
            && name != c::OfxImageEffectOutputClipName;
        if optional {
            image_paths.optional.insert(name.clone(), None);
        } else {
            image_paths.required.insert(name.clone(), None);
        }
    }
    image_paths
        .required
        .entry(c::OfxImageEffectOutputClipName.to_string())
        .or_insert(None);
    RenderJob {
        bundle: bundle.to_string(),
        plugin: plugin.to_string(),
        context: context.to_string(),
        parameters,
        frame_size: FrameSize {
            width: 1920,
            height: 1080,
        },
        image_paths,
    }
}

fn print_descriptor(bundle: &str, plugin: &str, context: &str) -> Result<()> {
    let mut host = host::global().lock().unwrap();
    let descriptor = host
        .context_mut(bundle, plugin, context)
        .ok_or(anyhow!("No descriptor for context {}", context))?;
    println!("\nPlugin Name\n===========\n\n{}\n", plugin);
    println!("Parameters\n==========\n");
    for name in &descriptor.param_order {
        if let Some(line) = param_brief(&descriptor.params[name].properties) {
            println!("{}", line);
        }
    }
    println!("\nClips\n=====\n");
    for name in &descriptor.clip_order {
        if let Some(line) = clip_brief(&descriptor.clips[name].properties) {
            println!("{}", line);
        }
    }
    println!();
    Ok(())
}

pub fn describe_params(
    dir: &Path,
    bundle: &str,
    plugin: &str,
    json_out: Option<&Path>,
) -> Result<()> {
    host::load_bundle(dir, bundle)?;
    host::load_and_describe(bundle, plugin)?;
    let context = choose_context(bundle, plugin)?;
    match json_out {
        Some(path) => {
            let job = {
                let mut host = host::global().lock().unwrap();
                let descriptor = host
                    .context_mut(bundle, plugin, &context)
                    .ok_or(anyhow!("No descriptor for context {}", context))?;
                job_template(bundle, plugin, &context, descriptor)
            };
            frame_io::write_params(path, &job)?;
        }
        None => print_descriptor(bundle, plugin, &context)?,
    }
    host::unload_plugin(bundle, plugin)
}

/// Drive one frame through an instance whose clips are already known,
/// then tear everything down.
fn run_frame(
    uid: &str,
    inputs: &[(String, String)],
    output_path: &Path,
    width: u32,
    height: u32,
) -> Result<()> {
    host::begin_sequence_render(uid)?;
    let mut connected = Vec::new();
    for (clip, path) in inputs {
        host::connect_image(uid, clip, Path::new(path), width, height)?;
        connected.push(clip.clone());
    }
    host::connect_buffer(uid, c::OfxImageEffectOutputClipName, width, height)?;
    connected.push(c::OfxImageEffectOutputClipName.to_string());
    host::render(uid, width, height)?;
    host::save_image(uid, c::OfxImageEffectOutputClipName, output_path)?;
    for clip in &connected {
        host::disconnect(uid, clip)?;
    }
    host::end_sequence_render(uid)
}

pub fn filter_render(
    dir: &Path,
    bundle: &str,
    plugin: &str,
    infile: &Path,
    outfile: &Path,
) -> Result<()> {
    let (width, height, _) = frame_io::read_image(infile)?;
    host::load_bundle(dir, bundle)?;
    host::load_and_describe(bundle, plugin)?;
    let uid = host::create_instance(
        bundle,
        plugin,
        c::OfxImageEffectContextFilter,
        width,
        height,
    )?;
    let inputs = [(
        c::OfxImageEffectSimpleSourceClipName.to_string(),
        infile.to_string_lossy().to_string(),
    )];
    run_frame(&uid, &inputs, outfile, width, height)?;
    host::destroy_instance(&uid)?;
    host::unload_plugin(bundle, plugin)
}

pub fn json_render(dir: &Path, params_path: &Path) -> Result<()> {
    let job = frame_io::read_params(params_path)?;
    let output_path = job
        .image_paths
        .required
        .get(c::OfxImageEffectOutputClipName)
        .cloned()
        .flatten()
        .ok_or(anyhow!("image_paths.required.Output is not set"))?;

    let mut inputs = Vec::new();
    for (clip, path) in &job.image_paths.required {
        if clip == c::OfxImageEffectOutputClipName {
            continue;
        }
        match path {
            Some(path) => inputs.push((clip.clone(), path.clone())),
            None => bail!("Missing required image path for clip {}", clip),
        }
    }
    for (clip, path) in &job.image_paths.optional {
        if let Some(path) = path {
            inputs.push((clip.clone(), path.clone()));
        }
    }

    let (width, height) = (job.frame_size.width, job.frame_size.height);
    host::load_bundle(dir, &job.bundle)?;
    host::load_and_describe(&job.bundle, &job.plugin)?;
    let uid =
        host::create_instance(&job.bundle, &job.plugin, &job.context, width, height)?;
    host::load_parameters(&uid, &job.parameters)?;
    run_frame(&uid, &inputs, Path::new(&output_path), width, height)?;
    host::destroy_instance(&uid)?;
    host::unload_plugin(&job.bundle, &job.plugin)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::handles::{Handle, HandleKind};
    use crate::host::{ClipDescriptor, ParamDescriptor};
    use crate::schema;
    use std::collections::HashMap;

    fn descriptor_with(
        params: &[(&str, &str)],
        clips: &[(&str, bool)],
    ) -> ContextDescriptor {
        let ctx = c::OfxImageEffectContextFilter;
        let mut descriptor = ContextDescriptor {
            handle: Handle::new(HandleKind::Context, "b", "p", ctx, "", ctx),
            properties: schema::context_properties(ctx),
            clips: HashMap::new(),
            clip_order: Vec::new(),
            params: HashMap::new(),
            param_order: Vec::new(),
        };
        for (name, param_type) in params {
            descriptor.params.insert(
                name.to_string(),
                ParamDescriptor {
                    handle: Handle::new(HandleKind::Parameter, "b", "p", ctx, "", name),
                    properties: schema::parameter_properties(name, param_type),
                },
            );
            descriptor.param_order.push(name.to_string());
        }
        for (name, optional) in clips {
            let mut properties = schema::clip_descriptor_properties(name);
            if *optional {
                properties
                    .update(c::OfxImageClipPropOptional, 0, 1.into())
                    .unwrap();
            }
            descriptor.clips.insert(
                name.to_string(),
                ClipDescriptor {
                    handle: Handle::new(HandleKind::Clip, "b", "p", ctx, "", name),
                    properties,
                },
            );
            descriptor.clip_order.push(name.to_string());
        }
        descriptor
    }

    #[test]
    fn template_lists_defaults_and_clips() {
        let descriptor = descriptor_with(
            &[
                ("gain", c::OfxParamTypeDouble),
                ("invert", c::OfxParamTypeBoolean),
                ("grp", c::OfxParamTypeGroup),
            ],
            &[("Source", false), ("Matte", true), ("Output", false)],
        );
        let job = job_template("Blur", "org.example.blur", c::OfxImageEffectContextFilter, &descriptor);
        assert_eq!(job.parameters.len(), 2);
        assert_eq!(job.parameters["gain"], serde_json::json!(0.0));
        assert_eq!(job.parameters["invert"], serde_json::json!(0));
        assert!(job.image_paths.required.contains_key("Source"));
        assert!(job.image_paths.required.contains_key("Output"));
        assert!(job.image_paths.optional.contains_key("Matte"));
    }

    #[test]
    fn template_always_requires_output() {
        let descriptor = descriptor_with(&[], &[("Source", false)]);
        let job = job_template("B", "p", c::OfxImageEffectContextFilter, &descriptor);
        assert!(job.image_paths.required.contains_key("Output"));
    }

    #[test]
    fn secret_params_are_hidden() {
        let mut props = schema::parameter_properties("hidden", c::OfxParamTypeDouble);
        props
            .update(c::OfxParamPropSecret, 0, 1.into())
            .unwrap();
        assert!(param_brief(&props).is_none());
        assert!(param_default_json(&props).is_none());

        let props = schema::parameter_properties("shown", c::OfxParamTypeDouble);
        assert!(param_brief(&props).unwrap().contains("Double"));
        assert_eq!(
            param_default_json(&props),
            Some(("shown".to_string(), serde_json::json!(0.0)))
        );
    }

    #[test]
    fn group_params_print_nothing() {
        let props = schema::parameter_properties("grp", c::OfxParamTypeGroup);
        assert!(param_brief(&props).is_none());
    }

    #[test]
    fn choice_brief_marks_active_option() {
        let mut props = schema::parameter_properties("mode", c::OfxParamTypeChoice);
        props
            .update(c::OfxParamPropChoiceOption, 0, "add".into())
            .unwrap();
        props
            .update(c::OfxParamPropChoiceOption, 1, "multiply".into())
            .unwrap();
        let brief = param_brief(&props).unwrap();
        assert!(brief.contains("Choice"));
        assert!(brief.contains("-> add"));
        assert!(brief.contains("   multiply"));
    }

    #[test]
    fn clip_brief_flags_optional() {
        let props = schema::clip_descriptor_properties("Source");
        assert!(clip_brief(&props).unwrap().contains("Required"));
        let mut props = schema::clip_descriptor_properties("Matte");
        props
            .update(c::OfxImageClipPropOptional, 0, 1.into())
            .unwrap();
        assert!(clip_brief(&props).unwrap().contains("Optional"));
    }
}
