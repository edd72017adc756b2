//! Locating and opening OFX plugin bundles.
//!
//! A bundle is a directory `<name>.ofx.bundle` containing platform
//! subdirectories under `Contents/`. The binary is `<name>.ofx`
//! unless the bundle ships a `Contents/Info.plist` whose
//! `CFBundleExecutable` names something else.

use crate::constants;
use crate::types::{MainEntryFn, OfxPluginRaw, SetHostFn, cstr_to_string};
use anyhow::{Context, Result, anyhow, bail};
use libc::c_int;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug)]
pub struct Bundle {
    pub name: String,
    pub path: PathBuf,
}

fn platform_dir() -> Result<&'static str> {
    if cfg!(target_os = "linux") {
        Ok("Linux-x86-64")
    } else if cfg!(windows) {
        Ok("Win64")
    } else if cfg!(target_os = "macos") {
        Ok("MacOS-x86-64")
    } else {
        bail!("Unsupported platform for OFX bundles");
    }
}

impl Bundle {
    pub fn locate(dir: &Path, name: &str) -> Result<Bundle> {
        let path = dir.join(format!("{}.ofx.bundle", name));
        if !path.is_dir() {
            bail!("Bundle \"{}\" not found", path.display());
        }
        Ok(Bundle {
            name: name.to_string(),
            path,
        })
    }

    /// Binary name from Info.plist, when the bundle carries one.
    fn plist_executable(&self) -> Result<Option<String>> {
        let plist_path = self.path.join("Contents/Info.plist");
        if !plist_path.is_file() {
            return Ok(None);
        }
        let value = plist::Value::from_file(&plist_path)
            .with_context(|| format!("Reading plist \"{}\"", plist_path.display()))?;
        let name = value
            .as_dictionary()
            .ok_or(anyhow!("Malformed plist"))?
            .get("CFBundleExecutable")
            .ok_or(anyhow!("CFBundleExecutable not found in plist"))?
            .as_string()
            .ok_or(anyhow!("CFBundleExecutable is not a string"))?;
        Ok(Some(name.to_string()))
    }

    pub fn binary_path(&self) -> Result<PathBuf> {
        let binary = self
            .plist_executable()?
            .unwrap_or_else(|| format!("{}.ofx", self.name));
        Ok(self
            .path
            .join("Contents")
            .join(platform_dir()?)
            .join(binary))
    }

    pub fn load(&self) -> Result<libloading::Library> {
        let path = self.binary_path()?;
        unsafe { libloading::Library::new(&path) }
            .with_context(|| format!("Loading \"{}\"", path.display()))
    }
}

#[derive(Clone)]
pub struct PluginInfo {
    pub identifier: String,
    pub api_version: c_int,
    pub version_major: u32,
    pub version_minor: u32,
    pub set_host: SetHostFn,
    pub main_entry: MainEntryFn,
}

/// Enumerate the image-effect plugins a loaded binary exposes.
///
/// Plugins for other APIs are skipped with a warning; a missing entry
/// point or a malformed plugin record is a hard failure.
pub fn enumerate_plugins(lib: &libloading::Library) -> Result<Vec<PluginInfo>> {
    let mut plugins = Vec::new();
    unsafe {
        let number_of_plugins: libloading::Symbol<unsafe extern "C" fn() -> c_int> =
            lib.get(b"OfxGetNumberOfPlugins")?;
        let count = number_of_plugins();
        let get_plugin: libloading::Symbol<
            unsafe extern "C" fn(c_int) -> *const OfxPluginRaw,
        > = lib.get(b"OfxGetPlugin")?;
        for i in 0..count {
            let raw = get_plugin(i);
            if raw.is_null() {
                bail!("OfxGetPlugin({}) returned NULL", i);
            }
            let raw = &*raw;
            let api = cstr_to_string(raw.pluginApi)
                .ok_or(anyhow!("Plugin {} has no API string", i))?;
            let identifier = cstr_to_string(raw.pluginIdentifier)
                .ok_or(anyhow!("Plugin {} has no identifier", i))?;
            if api != constants::OfxImageEffectPluginApi {
                warn!(
                    "Skipping {}: API \"{}\" is not \"{}\"",
                    identifier,
                    api,
                    constants::OfxImageEffectPluginApi
                );
                continue;
            }
            plugins.push(PluginInfo {
                identifier,
                api_version: raw.apiVersion,
                version_major: raw.pluginVersionMajor,
                version_minor: raw.pluginVersionMinor,
                set_host: raw
                    .setHost
                    .ok_or(anyhow!("Plugin {} has no setHost", i))?,
                main_entry: raw
                    .mainEntry
                    .ok_or(anyhow!("Plugin {} has no mainEntry", i))?,
            });
        }
    }
    Ok(plugins)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn missing_bundle_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = Bundle::locate(dir.path(), "Nope").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn default_binary_name() {
        let dir = tempfile::tempdir().unwrap();
        let bundle_dir = dir.path().join("Blur.ofx.bundle");
        fs::create_dir_all(bundle_dir.join("Contents")).unwrap();
        let bundle = Bundle::locate(dir.path(), "Blur").unwrap();
        let path = bundle.binary_path().unwrap();
        assert!(path.ends_with(format!("{}/Blur.ofx", platform_dir().unwrap())));
    }

    #[test]
    fn plist_overrides_binary_name() {
        let dir = tempfile::tempdir().unwrap();
        let contents = dir.path().join("Blur.ofx.bundle/Contents");
        fs::create_dir_all(&contents).unwrap();
        fs::write(
            contents.join("Info.plist"),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleExecutable</key>
    <string>CustomName.ofx</string>
</dict>
</plist>
"#,
        )
        .unwrap();
        let bundle = Bundle::locate(dir.path(), "Blur").unwrap();
        let path = bundle.binary_path().unwrap();
        assert!(path.ends_with(format!("{}/CustomName.ofx", platform_dir().unwrap())));
    }

    #[test]
    fn unparseable_plist_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let contents = dir.path().join("Bad.ofx.bundle/Contents");
        fs::create_dir_all(&contents).unwrap();
        fs::write(contents.join("Info.plist"), "not a plist").unwrap();
        let bundle = Bundle::locate(dir.path(), "Bad").unwrap();
        assert!(bundle.binary_path().is_err());
    }

    #[test]
    fn missing_binary_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Empty.ofx.bundle/Contents")).unwrap();
        let bundle = Bundle::locate(dir.path(), "Empty").unwrap();
        assert!(bundle.load().is_err());
    }
}
