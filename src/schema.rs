//! The static property schema and the per-object-class property
//! templates.
//!
//! The schema drives validation in the property store: every `add` is
//! checked against the declared type set, dimension and value enum of
//! the property name. The templates seed the property sets attached
//! to each class of host object with what OFX 1.4 requires.

use crate::constants as c;
use crate::property::{Addr, Property, PropertySet, PropertyValue};
use libc::{c_int, c_void};
use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PropType {
    Int,
    Double,
    String,
    Pointer,
}

#[derive(Clone, Copy, Debug)]
pub enum DefaultValue {
    Int(c_int),
    Ints(&'static [c_int]),
    Dbl(f64),
    Dbls(&'static [f64]),
    Str(&'static str),
    Strs(&'static [&'static str]),
    Ptr,
}

#[derive(Clone, Copy, Debug)]
pub enum Allowed {
    Ints(&'static [c_int]),
    Strs(&'static [&'static str]),
}

/// Schema entry for one property name. `dims == 0` means
/// variable-length.
#[derive(Clone, Copy, Debug)]
pub struct PropertyDef {
    pub types: &'static [PropType],
    pub dims: usize,
    pub default: Option<DefaultValue>,
    pub allowed: Option<Allowed>,
}

impl PropertyDef {
    pub fn default_property(&self) -> Option<Property> {
        Some(match self.default? {
            DefaultValue::Int(i) => i.into(),
            DefaultValue::Ints(v) => v.to_vec().into(),
            DefaultValue::Dbl(d) => d.into(),
            DefaultValue::Dbls(v) => v.to_vec().into(),
            DefaultValue::Str(s) => s.into(),
            DefaultValue::Strs(v) => {
                Property(v.iter().map(|s| Box::new((*s).into())).collect())
            }
            DefaultValue::Ptr => {
                PropertyValue::Pointer(Addr(std::ptr::null::<c_void>())).into()
            }
        })
    }
}

const INT: &[PropType] = &[PropType::Int];
const DBL: &[PropType] = &[PropType::Double];
const STR: &[PropType] = &[PropType::String];
const PTR: &[PropType] = &[PropType::Pointer];
const INT_OR_DBL: &[PropType] = &[PropType::Int, PropType::Double];
const INT_DBL_STR: &[PropType] =
    &[PropType::Int, PropType::Double, PropType::String];

const fn prop(types: &'static [PropType], dims: usize) -> PropertyDef {
    PropertyDef {
        types,
        dims,
        default: None,
        allowed: None,
    }
}

impl PropertyDef {
    const fn def_int(mut self, i: c_int) -> Self {
        self.default = Some(DefaultValue::Int(i));
        self
    }
    const fn def_ints(mut self, v: &'static [c_int]) -> Self {
        self.default = Some(DefaultValue::Ints(v));
        self
    }
    const fn def_dbl(mut self, d: f64) -> Self {
        self.default = Some(DefaultValue::Dbl(d));
        self
    }
    const fn def_dbls(mut self, v: &'static [f64]) -> Self {
        self.default = Some(DefaultValue::Dbls(v));
        self
    }
    const fn def_str(mut self, s: &'static str) -> Self {
        self.default = Some(DefaultValue::Str(s));
        self
    }
    const fn def_strs(mut self, v: &'static [&'static str]) -> Self {
        self.default = Some(DefaultValue::Strs(v));
        self
    }
    const fn def_ptr(mut self) -> Self {
        self.default = Some(DefaultValue::Ptr);
        self
    }
    const fn allow(mut self, a: Allowed) -> Self {
        self.allowed = Some(a);
        self
    }
}

const BOOL: Allowed = Allowed::Ints(&[0, 1]);
const COMPONENTS: Allowed = Allowed::Strs(&[
    c::OfxImageComponentNone,
    c::OfxImageComponentRGBA,
    c::OfxImageComponentRGB,
    c::OfxImageComponentAlpha,
]);
const CONTEXTS: Allowed = Allowed::Strs(&[
    c::OfxImageEffectContextGenerator,
    c::OfxImageEffectContextFilter,
    c::OfxImageEffectContextTransition,
    c::OfxImageEffectContextPaint,
    c::OfxImageEffectContextGeneral,
    c::OfxImageEffectContextRetimer,
]);
const BIT_DEPTHS: Allowed = Allowed::Strs(&[
    c::OfxBitDepthNone,
    c::OfxBitDepthByte,
    c::OfxBitDepthShort,
    c::OfxBitDepthHalf,
    c::OfxBitDepthFloat,
]);
const FIELD_EXTRACTION: Allowed = Allowed::Strs(&[
    c::OfxImageFieldBoth,
    c::OfxImageFieldSingle,
    c::OfxImageFieldDoubled,
]);
const FIELD_ORDER: Allowed = Allowed::Strs(&[
    c::OfxImageFieldNone,
    c::OfxImageFieldLower,
    c::OfxImageFieldUpper,
]);
const FIELD_RENDER: Allowed = Allowed::Strs(&[
    c::OfxImageFieldNone,
    c::OfxImageFieldBoth,
    c::OfxImageFieldLower,
    c::OfxImageFieldUpper,
]);
const PREMULT: Allowed = Allowed::Strs(&[
    c::OfxImageOpaque,
    c::OfxImagePreMultiplied,
    c::OfxImageUnPreMultiplied,
]);
const THREAD_SAFETY: Allowed = Allowed::Strs(&[
    c::OfxImageEffectRenderUnsafe,
    c::OfxImageEffectRenderInstanceSafe,
    c::OfxImageEffectRenderFullySafe,
]);
const NATIVE_ORIGIN: Allowed = Allowed::Strs(&[
    c::OfxImageEffectHostPropNativeOriginBottomLeft,
    c::OfxImageEffectHostPropNativeOriginTopLeft,
    c::OfxImageEffectHostPropNativeOriginCenter,
]);
const GL_SUPPORT: Allowed = Allowed::Strs(&["false", "true", "needed"]);
const CACHE_INVALIDATION: Allowed = Allowed::Strs(&[
    c::OfxParamInvalidateValueChange,
    c::OfxParamInvalidateValueChangeToEnd,
    c::OfxParamInvalidateAll,
]);
const COORD_SYSTEMS: Allowed = Allowed::Strs(&[
    c::OfxParamCoordinatesCanonical,
    c::OfxParamCoordinatesNormalised,
]);
const DOUBLE_TYPES: Allowed = Allowed::Strs(&[
    c::OfxParamDoubleTypePlain,
    c::OfxParamDoubleTypeAngle,
    c::OfxParamDoubleTypeScale,
    c::OfxParamDoubleTypeTime,
    c::OfxParamDoubleTypeAbsoluteTime,
]);
const STRING_MODES: Allowed = Allowed::Strs(&[
    c::OfxParamStringIsSingleLine,
    c::OfxParamStringIsMultiLine,
    c::OfxParamStringIsFilePath,
    c::OfxParamStringIsDirectoryPath,
    c::OfxParamStringIsLabel,
    c::OfxParamStringIsRichTextFormat,
]);
const PARAM_TYPES: &[&str] = &[
    c::OfxParamTypeInteger,
    c::OfxParamTypeDouble,
    c::OfxParamTypeBoolean,
    c::OfxParamTypeChoice,
    c::OfxParamTypeRGBA,
    c::OfxParamTypeRGB,
    c::OfxParamTypeDouble2D,
    c::OfxParamTypeInteger2D,
    c::OfxParamTypeDouble3D,
    c::OfxParamTypeInteger3D,
    c::OfxParamTypeString,
    c::OfxParamTypeCustom,
    c::OfxParamTypeGroup,
    c::OfxParamTypePage,
    c::OfxParamTypePushButton,
];
const TYPE_TAGS: Allowed = Allowed::Strs(&[
    c::OfxTypeImageEffectHost,
    c::OfxTypeImageEffect,
    c::OfxTypeImageEffectInstance,
    c::OfxTypeParameter,
    c::OfxTypeParameterInstance,
    c::OfxTypeClip,
    c::OfxTypeImage,
]);

/// Parameter types the host will accept in `paramDefine`.
pub fn valid_param_type(t: &str) -> bool {
    PARAM_TYPES.contains(&t)
}

#[rustfmt::skip]
static DEFS: &[(&str, PropertyDef)] = &[
    (c::OfxImageClipPropConnected, prop(INT, 1).allow(BOOL)),
    (c::OfxImageClipPropContinuousSamples, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxImageClipPropFieldExtraction, prop(STR, 1).def_str(c::OfxImageFieldDoubled).allow(FIELD_EXTRACTION)),
    (c::OfxImageClipPropFieldOrder, prop(STR, 1).def_str(c::OfxImageFieldNone).allow(FIELD_ORDER)),
    (c::OfxImageClipPropIsMask, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxImageClipPropOptional, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxImageClipPropUnmappedComponents, prop(STR, 1).allow(COMPONENTS)),
    (c::OfxImageClipPropUnmappedPixelDepth, prop(STR, 1).allow(BIT_DEPTHS)),
    (c::OfxImageEffectFrameVarying, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxImageEffectHostPropIsBackground, prop(INT, 1).allow(BOOL)),
    (c::OfxImageEffectHostPropNativeOrigin, prop(STR, 1).allow(NATIVE_ORIGIN)),
    (c::OfxImageEffectInstancePropEffectDuration, prop(DBL, 1)),
    (c::OfxImageEffectInstancePropSequentialRender, prop(INT, 1).def_int(0).allow(Allowed::Ints(&[0, 1, 2]))),
    (c::OfxImageEffectPluginPropFieldRenderTwiceAlways, prop(INT, 1).def_int(1).allow(BOOL)),
    (c::OfxImageEffectPluginPropGrouping, prop(STR, 1).def_str("")),
    (c::OfxImageEffectPluginPropHostFrameThreading, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxImageEffectPluginPropOverlayInteractV1, prop(PTR, 1).def_ptr()),
    (c::OfxImageEffectPluginPropSingleInstance, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxImageEffectPluginRenderThreadSafety, prop(STR, 1).def_str(c::OfxImageEffectRenderInstanceSafe).allow(THREAD_SAFETY)),
    (c::OfxImageEffectPropClipPreferencesSlaveParam, prop(STR, 0)),
    (c::OfxImageEffectPropComponents, prop(STR, 1).allow(COMPONENTS)),
    (c::OfxImageEffectPropContext, prop(STR, 1).allow(CONTEXTS)),
    (c::OfxImageEffectPropFieldToRender, prop(STR, 1).allow(FIELD_RENDER)),
    (c::OfxImageEffectPropFrameRange, prop(DBL, 2)),
    (c::OfxImageEffectPropFrameRate, prop(DBL, 1)),
    (c::OfxImageEffectPropFrameStep, prop(DBL, 1)),
    (c::OfxImageEffectPropInteractiveRenderStatus, prop(INT, 1).allow(BOOL)),
    (c::OfxImageEffectPropOpenGLEnabled, prop(INT, 1).allow(BOOL)),
    (c::OfxImageEffectPropOpenGLRenderSupported, prop(STR, 1).def_str("false").allow(GL_SUPPORT)),
    (c::OfxImageEffectPropOpenGLTextureIndex, prop(INT, 1)),
    (c::OfxImageEffectPropOpenGLTextureTarget, prop(INT, 1)),
    (c::OfxImageEffectPropPixelDepth, prop(STR, 1).allow(BIT_DEPTHS)),
    (c::OfxImageEffectPropPluginHandle, prop(PTR, 1).def_ptr()),
    (c::OfxImageEffectPropPreMultiplication, prop(STR, 1).allow(PREMULT)),
    (c::OfxImageEffectPropProjectExtent, prop(DBL, 2)),
    (c::OfxImageEffectPropProjectOffset, prop(DBL, 2)),
    (c::OfxImageEffectPropProjectPixelAspectRatio, prop(DBL, 1)),
    (c::OfxImageEffectPropProjectSize, prop(DBL, 2)),
    (c::OfxImageEffectPropRegionOfDefinition, prop(DBL, 4)),
    (c::OfxImageEffectPropRegionOfInterest, prop(DBL, 4)),
    (c::OfxImageEffectPropRenderQualityDraft, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxImageEffectPropRenderScale, prop(DBL, 2)),
    // The OFX header defines the render window as an integer rect
    (c::OfxImageEffectPropRenderWindow, prop(INT, 4)),
    (c::OfxImageEffectPropSequentialRenderStatus, prop(INT, 1).allow(BOOL)),
    (c::OfxImageEffectPropSetableFielding, prop(INT, 1).allow(BOOL)),
    (c::OfxImageEffectPropSetableFrameRate, prop(INT, 1).allow(BOOL)),
    (c::OfxImageEffectPropSupportedComponents, prop(STR, 0).allow(COMPONENTS)),
    (c::OfxImageEffectPropSupportedContexts, prop(STR, 0).allow(CONTEXTS)),
    (c::OfxImageEffectPropSupportedPixelDepths, prop(STR, 0).allow(BIT_DEPTHS)),
    (c::OfxImageEffectPropSupportsMultiResolution, prop(INT, 1).def_int(1).allow(BOOL)),
    (c::OfxImageEffectPropSupportsMultipleClipDepths, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxImageEffectPropSupportsMultipleClipPARs, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxImageEffectPropSupportsOverlays, prop(INT, 1).allow(BOOL)),
    (c::OfxImageEffectPropSupportsTiles, prop(INT, 1).def_int(1).allow(BOOL)),
    (c::OfxImageEffectPropTemporalClipAccess, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxImageEffectPropUnmappedFrameRange, prop(DBL, 2)),
    (c::OfxImageEffectPropUnmappedFrameRate, prop(DBL, 1)),
    (c::OfxImagePropBounds, prop(INT, 4)),
    (c::OfxImagePropData, prop(PTR, 1).def_ptr()),
    (c::OfxImagePropField, prop(STR, 1).allow(FIELD_RENDER)),
    (c::OfxImagePropPixelAspectRatio, prop(DBL, 1)),
    (c::OfxImagePropRegionOfDefinition, prop(INT, 4)),
    (c::OfxImagePropRowBytes, prop(INT, 1)),
    (c::OfxImagePropUniqueIdentifier, prop(STR, 1)),
    (c::OfxParamHostPropMaxPages, prop(INT, 1)),
    (c::OfxParamHostPropMaxParameters, prop(INT, 1)),
    (c::OfxParamHostPropPageRowColumnCount, prop(INT, 2)),
    (c::OfxParamHostPropSupportsBooleanAnimation, prop(INT, 1).allow(BOOL)),
    (c::OfxParamHostPropSupportsChoiceAnimation, prop(INT, 1).allow(BOOL)),
    (c::OfxParamHostPropSupportsCustomAnimation, prop(INT, 1).allow(BOOL)),
    (c::OfxParamHostPropSupportsCustomInteract, prop(INT, 1).allow(BOOL)),
    (c::OfxParamHostPropSupportsParametricAnimation, prop(INT, 1).allow(BOOL)),
    (c::OfxParamHostPropSupportsStringAnimation, prop(INT, 1).allow(BOOL)),
    (c::OfxParamPropAnimates, prop(INT, 1).def_int(1).allow(BOOL)),
    (c::OfxParamPropCacheInvalidation, prop(STR, 1).def_str(c::OfxParamInvalidateValueChange).allow(CACHE_INVALIDATION)),
    (c::OfxParamPropCanUndo, prop(INT, 1).def_int(1).allow(BOOL)),
    (c::OfxParamPropChoiceOption, prop(STR, 0)),
    (c::OfxParamPropCustomInterpCallbackV1, prop(PTR, 1).def_ptr()),
    (c::OfxParamPropCustomValue, prop(STR, 1)),
    (c::OfxParamPropDataPtr, prop(PTR, 1).def_ptr()),
    (c::OfxParamPropDefault, prop(INT_DBL_STR, 0)),
    (c::OfxParamPropDefaultCoordinateSystem, prop(STR, 1).def_str(c::OfxParamCoordinatesCanonical).allow(COORD_SYSTEMS)),
    (c::OfxParamPropDigits, prop(INT, 1).def_int(2)),
    (c::OfxParamPropDimensionLabel, prop(STR, 1)),
    (c::OfxParamPropDisplayMax, prop(INT_OR_DBL, 0).def_dbls(&[9999999999.0])),
    (c::OfxParamPropDisplayMin, prop(INT_OR_DBL, 0).def_dbls(&[-9999999999.0])),
    (c::OfxParamPropDoubleType, prop(STR, 1).def_str(c::OfxParamDoubleTypePlain).allow(DOUBLE_TYPES)),
    (c::OfxParamPropEnabled, prop(INT, 1).def_int(1).allow(BOOL)),
    (c::OfxParamPropEvaluateOnChange, prop(INT, 1).def_int(1).allow(BOOL)),
    (c::OfxParamPropGroupOpen, prop(INT, 1).def_int(1).allow(BOOL)),
    (c::OfxParamPropHasHostOverlayHandle, prop(INT, 1).allow(BOOL)),
    (c::OfxParamPropHint, prop(STR, 1).def_str("")),
    (c::OfxParamPropIncrement, prop(DBL, 1).def_dbl(1.0)),
    (c::OfxParamPropInteractMinimumSize, prop(DBL, 2).def_dbls(&[10.0, 10.0])),
    (c::OfxParamPropInteractPreferedSize, prop(INT, 2).def_ints(&[10, 10])),
    (c::OfxParamPropInteractSize, prop(DBL, 2)),
    (c::OfxParamPropInteractSizeAspect, prop(DBL, 1).def_dbl(1.0)),
    (c::OfxParamPropInteractV1, prop(PTR, 1).def_ptr()),
    (c::OfxParamPropIsAnimating, prop(INT, 1).allow(BOOL)),
    (c::OfxParamPropIsAutoKeying, prop(INT, 1).allow(BOOL)),
    (c::OfxParamPropMax, prop(INT_OR_DBL, 0).def_dbls(&[9999999999.0])),
    (c::OfxParamPropMin, prop(INT_OR_DBL, 0).def_dbls(&[-9999999999.0])),
    (c::OfxParamPropPageChild, prop(STR, 0).def_strs(&[""])),
    (c::OfxParamPropParent, prop(STR, 1).def_str("")),
    (c::OfxParamPropPersistant, prop(INT, 1).def_int(1).allow(BOOL)),
    (c::OfxParamPropPluginMayWrite, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxParamPropScriptName, prop(STR, 1)),
    (c::OfxParamPropSecret, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxParamPropShowTimeMarker, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxParamPropStringFilePathExists, prop(INT, 1).def_int(1).allow(BOOL)),
    (c::OfxParamPropStringMode, prop(STR, 1).def_str(c::OfxParamStringIsSingleLine).allow(STRING_MODES)),
    (c::OfxParamPropType, prop(STR, 1).allow(Allowed::Strs(PARAM_TYPES))),
    (c::OfxParamPropUseHostOverlayHandle, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxPluginPropFilePath, prop(STR, 1)),
    (c::OfxPropAPIVersion, prop(INT, 0)),
    (c::OfxPropHostOSHandle, prop(PTR, 1).def_ptr()),
    (c::OfxPropIcon, prop(STR, 2).def_strs(&["", ""])),
    (c::OfxPropInstanceData, prop(PTR, 1).def_ptr()),
    (c::OfxPropIsInteractive, prop(INT, 1).allow(BOOL)),
    (c::OfxPropLabel, prop(STR, 1)),
    (c::OfxPropLongLabel, prop(STR, 1)),
    (c::OfxPropName, prop(STR, 1)),
    (c::OfxPropParamSetNeedsSyncing, prop(INT, 1).def_int(0).allow(BOOL)),
    (c::OfxPropPluginDescription, prop(STR, 1).def_str("")),
    (c::OfxPropShortLabel, prop(STR, 1)),
    (c::OfxPropTime, prop(DBL, 1).def_dbl(0.0)),
    (c::OfxPropType, prop(STR, 1).allow(TYPE_TAGS)),
    (c::OfxPropVersion, prop(INT, 0).def_ints(&[0])),
    (c::OfxPropVersionLabel, prop(STR, 1)),
];

static INDEX: LazyLock<HashMap<&'static str, &'static PropertyDef>> =
    LazyLock::new(|| DEFS.iter().map(|(name, def)| (*name, def)).collect());

pub fn lookup(name: &str) -> Option<&'static PropertyDef> {
    INDEX.get(name).copied()
}

// ========= Property templates =========

pub fn host_properties() -> PropertySet {
    let mut p = PropertySet::new("host");
    p.seed(c::OfxPropType, c::OfxTypeImageEffectHost);
    p.seed(c::OfxPropName, "ofx-host");
    p.seed(c::OfxPropLabel, "OFX Host");
    p.seed(c::OfxPropVersion, [0, 1]);
    p.seed(c::OfxPropVersionLabel, "0.1");
    p.seed(c::OfxPropAPIVersion, [1, 4]);
    p.seed(
        c::OfxImageEffectPropSupportedComponents,
        [c::OfxImageComponentRGBA, c::OfxImageComponentRGB],
    );
    p.seed(
        c::OfxImageEffectPropSupportedContexts,
        [c::OfxImageEffectContextFilter, c::OfxImageEffectContextGeneral],
    );
    p.seed(c::OfxImageEffectPropSupportedPixelDepths, [c::OfxBitDepthByte]);
    p.seed(c::OfxParamHostPropPageRowColumnCount, [10, 20]);
    p.seed(c::OfxImageEffectHostPropIsBackground, 0);
    p.seed(c::OfxImageEffectPropSupportsOverlays, 0);
    p.seed_default(c::OfxImageEffectPropSupportsMultiResolution);
    p.seed_default(c::OfxImageEffectPropSupportsTiles);
    p.seed(c::OfxImageEffectPropTemporalClipAccess, 1);
    p.seed(c::OfxImageEffectPropSupportsMultipleClipDepths, 0);
    p.seed(c::OfxImageEffectPropSupportsMultipleClipPARs, 1);
    p.seed(c::OfxImageEffectPropSetableFrameRate, 0);
    p.seed(c::OfxImageEffectPropSetableFielding, 0);
    p.seed(c::OfxParamHostPropSupportsCustomInteract, 0);
    p.seed(c::OfxParamHostPropSupportsStringAnimation, 0);
    p.seed(c::OfxParamHostPropSupportsChoiceAnimation, 0);
    p.seed(c::OfxParamHostPropSupportsBooleanAnimation, 0);
    p.seed(c::OfxParamHostPropSupportsCustomAnimation, 0);
    p.seed(c::OfxParamHostPropSupportsParametricAnimation, 0);
    p.seed(c::OfxParamHostPropMaxParameters, -1);
    p.seed(c::OfxParamHostPropMaxPages, -1);
    p.seed_default(c::OfxPropHostOSHandle);
    p.seed_default(c::OfxImageEffectInstancePropSequentialRender);
    p.seed_default(c::OfxImageEffectPropOpenGLRenderSupported);
    p.seed_default(c::OfxImageEffectPropRenderQualityDraft);
    p.seed(
        c::OfxImageEffectHostPropNativeOrigin,
        c::OfxImageEffectHostPropNativeOriginBottomLeft,
    );
    p
}

pub fn effect_properties(plugin_id: &str, file_path: &str) -> PropertySet {
    let mut p = PropertySet::new(&format!("effect_{}", plugin_id));
    p.seed(c::OfxPropType, c::OfxTypeImageEffect);
    p.seed(c::OfxPropLabel, plugin_id);
    p.seed(c::OfxPropShortLabel, plugin_id);
    p.seed(c::OfxPropLongLabel, plugin_id);
    p.seed(c::OfxPropVersion, [0, 1]);
    p.seed(c::OfxPropVersionLabel, "0.1");
    p.seed_default(c::OfxPropPluginDescription);
    p.seed(c::OfxImageEffectPropSupportedContexts, Property(vec![]));
    p.seed_default(c::OfxImageEffectPluginPropGrouping);
    p.seed_default(c::OfxImageEffectPluginPropSingleInstance);
    p.seed_default(c::OfxImageEffectPluginRenderThreadSafety);
    p.seed_default(c::OfxImageEffectPluginPropHostFrameThreading);
    p.seed_default(c::OfxImageEffectPluginPropOverlayInteractV1);
    p.seed_default(c::OfxImageEffectPropSupportsMultiResolution);
    p.seed_default(c::OfxImageEffectPropSupportsTiles);
    p.seed_default(c::OfxImageEffectPropTemporalClipAccess);
    p.seed(c::OfxImageEffectPropSupportedPixelDepths, Property(vec![]));
    p.seed_default(c::OfxImageEffectPluginPropFieldRenderTwiceAlways);
    p.seed_default(c::OfxImageEffectPropSupportsMultipleClipDepths);
    p.seed_default(c::OfxImageEffectPropSupportsMultipleClipPARs);
    p.seed(c::OfxImageEffectPropClipPreferencesSlaveParam, Property(vec![]));
    p.seed_default(c::OfxImageEffectPropOpenGLRenderSupported);
    p.seed(c::OfxPluginPropFilePath, file_path);
    p
}

pub fn context_properties(context: &str) -> PropertySet {
    let mut p = PropertySet::new(&format!("context_{}", context));
    p.seed(c::OfxImageEffectPropContext, context);
    p
}

pub fn instance_properties(context: &str, width: u32, height: u32) -> PropertySet {
    let mut p = PropertySet::new("instance");
    p.seed(c::OfxPropType, c::OfxTypeImageEffectInstance);
    p.seed(c::OfxImageEffectPropContext, context);
    p.seed_default(c::OfxPropInstanceData);
    p.seed(c::OfxImageEffectPropProjectSize, [width as f64, height as f64]);
    p.seed(c::OfxImageEffectPropProjectOffset, [0.0, 0.0]);
    p.seed(c::OfxImageEffectPropProjectExtent, [width as f64, height as f64]);
    p.seed(c::OfxImageEffectPropProjectPixelAspectRatio, 1.0);
    p.seed(c::OfxImageEffectInstancePropEffectDuration, 1.0);
    p.seed_default(c::OfxImageEffectInstancePropSequentialRender);
    p.seed_default(c::OfxImageEffectPropSupportsTiles);
    p.seed_default(c::OfxImageEffectPropOpenGLRenderSupported);
    p.seed(c::OfxImageEffectPropFrameRate, 29.97);
    p.seed(c::OfxPropIsInteractive, 0);
    p
}

pub fn clip_descriptor_properties(clip_name: &str) -> PropertySet {
    let mut p = PropertySet::new(&format!("clip_{}", clip_name));
    p.seed(c::OfxPropType, c::OfxTypeClip);
    p.seed(c::OfxPropName, clip_name);
    p.seed(c::OfxPropLabel, clip_name);
    p.seed(c::OfxPropShortLabel, clip_name);
    p.seed(c::OfxPropLongLabel, clip_name);
    p.seed(c::OfxImageEffectPropSupportedComponents, Property(vec![]));
    p.seed_default(c::OfxImageEffectPropTemporalClipAccess);
    p.seed(c::OfxImageClipPropOptional, 0);
    p.seed_default(c::OfxImageClipPropFieldExtraction);
    p.seed_default(c::OfxImageClipPropIsMask);
    p.seed_default(c::OfxImageEffectPropSupportsTiles);
    p
}

/// Layer the instance-only clip keys over a cloned clip descriptor.
pub fn add_clip_instance_properties(p: &mut PropertySet) {
    p.seed(c::OfxImageEffectPropPixelDepth, c::OfxBitDepthByte);
    p.seed(c::OfxImageEffectPropComponents, c::OfxImageComponentRGBA);
    p.seed(c::OfxImageClipPropUnmappedPixelDepth, c::OfxBitDepthByte);
    p.seed(c::OfxImageClipPropUnmappedComponents, c::OfxImageComponentRGBA);
    p.seed(c::OfxImageEffectPropPreMultiplication, c::OfxImageUnPreMultiplied);
    p.seed(c::OfxImagePropPixelAspectRatio, 1.0);
    p.seed(c::OfxImageEffectPropFrameRate, 29.97);
    p.seed(c::OfxImageEffectPropFrameRange, [0.0, 1.0]);
    p.seed_default(c::OfxImageClipPropFieldOrder);
    p.seed(c::OfxImageClipPropConnected, 0);
    p.seed(c::OfxImageEffectPropUnmappedFrameRange, [0.0, 1.0]);
    p.seed(c::OfxImageEffectPropUnmappedFrameRate, 29.97);
    p.seed_default(c::OfxImageClipPropContinuousSamples);
}

pub fn image_properties(
    unique_id: &str,
    data: *const c_void,
    width: u32,
    height: u32,
) -> PropertySet {
    let mut p = PropertySet::new(&format!("image_{}", unique_id));
    let (w, h) = (width as c_int, height as c_int);
    p.seed(c::OfxPropType, c::OfxTypeImage);
    p.seed(c::OfxImageEffectPropPixelDepth, c::OfxBitDepthByte);
    p.seed(c::OfxImageEffectPropComponents, c::OfxImageComponentRGBA);
    p.seed(c::OfxImageEffectPropPreMultiplication, c::OfxImageUnPreMultiplied);
    p.seed(c::OfxImageEffectPropRenderScale, [1.0, 1.0]);
    p.seed(c::OfxImagePropPixelAspectRatio, 1.0);
    p.seed(c::OfxImagePropData, data);
    p.seed(c::OfxImagePropBounds, [0, 0, w, h]);
    p.seed(c::OfxImagePropRegionOfDefinition, [0, 0, w, h]);
    p.seed(c::OfxImagePropRowBytes, w * 4);
    p.seed(c::OfxImagePropField, c::OfxImageFieldNone);
    p.seed(c::OfxImagePropUniqueIdentifier, unique_id);
    p
}

pub fn param_set_properties() -> PropertySet {
    let mut p = PropertySet::new("param_set");
    p.seed(c::OfxPropParamSetNeedsSyncing, 0);
    p
}

pub fn render_action_properties(width: u32, height: u32) -> PropertySet {
    let mut p = PropertySet::new("render_action");
    p.seed(c::OfxPropTime, 0.0);
    p.seed(c::OfxImageEffectPropFieldToRender, c::OfxImageFieldNone);
    p.seed(
        c::OfxImageEffectPropRenderWindow,
        [0, 0, width as c_int, height as c_int],
    );
    p.seed(c::OfxImageEffectPropRenderScale, [1.0, 1.0]);
    p.seed(c::OfxImageEffectPropSequentialRenderStatus, 1);
    p.seed(c::OfxImageEffectPropInteractiveRenderStatus, 0);
    p.seed_default(c::OfxImageEffectPropRenderQualityDraft);
    p.seed(c::OfxImageEffectPropOpenGLEnabled, 0);
    p.seed(c::OfxImageEffectPropOpenGLTextureIndex, 0);
    p.seed(c::OfxImageEffectPropOpenGLTextureTarget, 0);
    p
}

pub fn sequence_render_action_properties() -> PropertySet {
    let mut p = PropertySet::new("sequence_render_action");
    p.seed(c::OfxImageEffectPropFrameRange, [0.0, 1.0]);
    p.seed(c::OfxImageEffectPropFrameStep, 1.0);
    p.seed(c::OfxPropIsInteractive, 0);
    p.seed(c::OfxImageEffectPropRenderScale, [1.0, 1.0]);
    p.seed(c::OfxImageEffectPropSequentialRenderStatus, 1);
    p.seed(c::OfxImageEffectPropInteractiveRenderStatus, 0);
    p.seed(c::OfxImageEffectPropOpenGLEnabled, 0);
    p.seed(c::OfxImageEffectPropOpenGLTextureIndex, 0);
    p.seed(c::OfxImageEffectPropOpenGLTextureTarget, 0);
    p
}

pub fn parameter_properties(param_name: &str, param_type: &str) -> PropertySet {
    let mut p = PropertySet::new(&format!("param_{}", param_name));
    p.seed(c::OfxPropType, c::OfxTypeParameter);
    p.seed(c::OfxPropName, param_name);
    p.seed(c::OfxPropLabel, param_name);
    p.seed(c::OfxPropShortLabel, param_name);
    p.seed(c::OfxPropLongLabel, param_name);
    p.seed(c::OfxParamPropType, param_type);
    p.seed_default(c::OfxParamPropSecret);
    p.seed_default(c::OfxParamPropHint);
    p.seed(c::OfxParamPropScriptName, param_name);
    p.seed_default(c::OfxParamPropParent);
    p.seed_default(c::OfxParamPropEnabled);
    p.seed_default(c::OfxParamPropDataPtr);
    p.seed_default(c::OfxPropIcon);

    match param_type {
        c::OfxParamTypeInteger => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 1, PropType::Int);
            numeric_params(&mut p, 1, PropType::Int, -99999.0, 99999.0);
        }
        c::OfxParamTypeDouble => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 1, PropType::Double);
            numeric_params(&mut p, 1, PropType::Double, -99999.0, 99999.0);
            double_params(&mut p);
            double_1d_params(&mut p);
            double_spatial_params(&mut p);
        }
        c::OfxParamTypeBoolean | c::OfxParamTypePushButton => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 1, PropType::Int);
        }
        c::OfxParamTypeChoice => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 1, PropType::Int);
            p.seed(c::OfxParamPropChoiceOption, Property(vec![]));
        }
        c::OfxParamTypeRGBA => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 4, PropType::Double);
            numeric_params(&mut p, 4, PropType::Double, 0.0, 1.0);
            double_params(&mut p);
        }
        c::OfxParamTypeRGB => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 3, PropType::Double);
            numeric_params(&mut p, 3, PropType::Double, 0.0, 1.0);
            double_params(&mut p);
        }
        c::OfxParamTypeDouble2D => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 2, PropType::Double);
            numeric_params(&mut p, 2, PropType::Double, -99999.0, 99999.0);
            double_params(&mut p);
            double_nd_params(&mut p);
            double_spatial_params(&mut p);
        }
        c::OfxParamTypeInteger2D => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 2, PropType::Int);
            numeric_params(&mut p, 2, PropType::Int, -99999.0, 99999.0);
            int_nd_params(&mut p);
        }
        c::OfxParamTypeDouble3D => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 3, PropType::Double);
            numeric_params(&mut p, 3, PropType::Double, -99999.0, 99999.0);
            double_params(&mut p);
            double_nd_params(&mut p);
        }
        c::OfxParamTypeInteger3D => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 3, PropType::Int);
            numeric_params(&mut p, 3, PropType::Int, -99999.0, 99999.0);
            int_nd_params(&mut p);
        }
        c::OfxParamTypeString => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 1, PropType::String);
            p.seed_default(c::OfxParamPropStringMode);
            p.seed_default(c::OfxParamPropStringFilePathExists);
        }
        c::OfxParamTypeCustom => {
            not_group_or_page_params(&mut p);
            value_params(&mut p, 1, PropType::String);
            p.seed_default(c::OfxParamPropCustomInterpCallbackV1);
        }
        c::OfxParamTypeGroup => {
            p.seed_default(c::OfxParamPropGroupOpen);
        }
        c::OfxParamTypePage => {
            p.seed_default(c::OfxParamPropPageChild);
        }
        _ => {
            tracing::error!("{} is not a valid parameter type", param_type);
        }
    }
    p
}

fn not_group_or_page_params(p: &mut PropertySet) {
    p.seed_default(c::OfxParamPropInteractV1);
    p.seed(c::OfxParamPropInteractSize, [0.0, 0.0]);
    p.seed_default(c::OfxParamPropInteractSizeAspect);
    p.seed_default(c::OfxParamPropInteractMinimumSize);
    p.seed_default(c::OfxParamPropInteractPreferedSize);
    p.seed(c::OfxParamPropHasHostOverlayHandle, 0);
    p.seed_default(c::OfxParamPropUseHostOverlayHandle);
}

fn value_params(p: &mut PropertySet, dims: usize, value_type: PropType) {
    let default = match value_type {
        PropType::Int => Property(vec![Box::new(PropertyValue::Int(0)); dims]),
        PropType::Double => {
            Property(vec![Box::new(PropertyValue::Double(0.0)); dims])
        }
        _ => Property(vec![Box::new("".into())]),
    };
    p.seed(c::OfxParamPropDefault, default);
    p.seed_default(c::OfxParamPropAnimates);
    p.seed(c::OfxParamPropIsAnimating, 0);
    p.seed(c::OfxParamPropIsAutoKeying, 0);
    p.seed_default(c::OfxParamPropPersistant);
    p.seed_default(c::OfxParamPropEvaluateOnChange);
    p.seed_default(c::OfxParamPropPluginMayWrite);
    p.seed_default(c::OfxParamPropCacheInvalidation);
    p.seed_default(c::OfxParamPropCanUndo);
}

fn numeric_params(p: &mut PropertySet, dims: usize, value_type: PropType, min: f64, max: f64) {
    let list = |v: f64| -> Property {
        match value_type {
            PropType::Int => {
                Property(vec![Box::new(PropertyValue::Int(v as c_int)); dims])
            }
            _ => Property(vec![Box::new(PropertyValue::Double(v)); dims]),
        }
    };
    p.seed(c::OfxParamPropMin, list(min));
    p.seed(c::OfxParamPropMax, list(max));
    p.seed(c::OfxParamPropDisplayMin, list(min));
    p.seed(c::OfxParamPropDisplayMax, list(max));
}

fn double_params(p: &mut PropertySet) {
    p.seed_default(c::OfxParamPropIncrement);
    p.seed_default(c::OfxParamPropDigits);
}

fn double_1d_params(p: &mut PropertySet) {
    p.seed_default(c::OfxParamPropShowTimeMarker);
    p.seed_default(c::OfxParamPropDoubleType);
}

fn double_nd_params(p: &mut PropertySet) {
    p.seed(c::OfxParamPropDoubleType, c::OfxParamDoubleTypePlain);
}

fn double_spatial_params(p: &mut PropertySet) {
    p.seed_default(c::OfxParamPropDefaultCoordinateSystem);
}

fn int_nd_params(p: &mut PropertySet) {
    p.seed(c::OfxParamPropDimensionLabel, "x");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_known_and_unknown() {
        assert!(lookup(c::OfxPropName).is_some());
        assert!(lookup(c::OfxImageEffectPropRenderWindow).is_some());
        assert!(lookup("OfxNotAProperty").is_none());
    }

    #[test]
    fn wire_strings_for_mismatched_names() {
        // These schema keys are the header string values, not the
        // constant names.
        assert!(lookup("OfxImageEffectPropMultipleClipDepths").is_some());
        assert!(lookup("OfxImageEffectPropMultipleClipPARs").is_some());
        assert!(lookup("OfxImageEffectPropPixelAspectRatio").is_some());
    }

    #[test]
    fn host_template_capabilities() {
        let p = host_properties();
        assert_eq!(p.get_str(c::OfxPropType, 0), Some(c::OfxTypeImageEffectHost));
        assert_eq!(
            p.get_str(c::OfxImageEffectPropSupportedContexts, 0),
            Some(c::OfxImageEffectContextFilter)
        );
        assert_eq!(
            p.get_str(c::OfxImageEffectPropSupportedContexts, 1),
            Some(c::OfxImageEffectContextGeneral)
        );
        assert_eq!(p.get_int(c::OfxPropAPIVersion, 0), Some(1));
        assert_eq!(p.get_int(c::OfxPropAPIVersion, 1), Some(4));
        assert_eq!(p.get_int(c::OfxParamHostPropMaxParameters, 0), Some(-1));
        assert_eq!(p.get_int(c::OfxParamHostPropMaxPages, 0), Some(-1));
        assert_eq!(p.get_int(c::OfxImageEffectPropSupportsTiles, 0), Some(1));
        assert_eq!(p.get_int(c::OfxImageEffectPropTemporalClipAccess, 0), Some(1));
        assert_eq!(
            p.get_int(c::OfxImageEffectPropSupportsMultipleClipDepths, 0),
            Some(0)
        );
        assert_eq!(
            p.get_str(c::OfxImageEffectHostPropNativeOrigin, 0),
            Some(c::OfxImageEffectHostPropNativeOriginBottomLeft)
        );
    }

    #[test]
    fn double_param_template() {
        let p = parameter_properties("gain", c::OfxParamTypeDouble);
        assert_eq!(p.get_str(c::OfxParamPropType, 0), Some(c::OfxParamTypeDouble));
        assert_eq!(p.get_str(c::OfxParamPropScriptName, 0), Some("gain"));
        assert_eq!(p.get_double(c::OfxParamPropDefault, 0), Some(0.0));
        assert_eq!(p.get_double(c::OfxParamPropMin, 0), Some(-99999.0));
        assert_eq!(p.get_double(c::OfxParamPropMax, 0), Some(99999.0));
        assert_eq!(p.get_double(c::OfxParamPropDisplayMin, 0), Some(-99999.0));
        assert_eq!(p.get_double(c::OfxParamPropDisplayMax, 0), Some(99999.0));
        assert_eq!(p.get_int(c::OfxParamPropSecret, 0), Some(0));
        assert!(p.contains(c::OfxParamPropIncrement));
        assert!(p.contains(c::OfxParamPropDigits));
        assert!(p.contains(c::OfxParamPropDoubleType));
    }

    #[test]
    fn rgba_param_template() {
        let p = parameter_properties("tint", c::OfxParamTypeRGBA);
        assert_eq!(p.length(c::OfxParamPropDefault).unwrap(), 4);
        assert_eq!(p.get_double(c::OfxParamPropMin, 0), Some(0.0));
        assert_eq!(p.get_double(c::OfxParamPropMax, 3), Some(1.0));
    }

    #[test]
    fn choice_param_template() {
        let p = parameter_properties("mode", c::OfxParamTypeChoice);
        assert_eq!(p.length(c::OfxParamPropChoiceOption).unwrap(), 0);
        assert_eq!(p.get_int(c::OfxParamPropDefault, 0), Some(0));
    }

    #[test]
    fn string_param_template() {
        let p = parameter_properties("path", c::OfxParamTypeString);
        assert_eq!(p.get_str(c::OfxParamPropDefault, 0), Some(""));
        assert_eq!(
            p.get_str(c::OfxParamPropStringMode, 0),
            Some(c::OfxParamStringIsSingleLine)
        );
    }

    #[test]
    fn group_param_template_has_no_value() {
        let p = parameter_properties("grp", c::OfxParamTypeGroup);
        assert!(!p.contains(c::OfxParamPropDefault));
        assert!(p.contains(c::OfxParamPropGroupOpen));
    }

    #[test]
    fn image_template() {
        let data = 0x1000 as *const c_void;
        let p = image_properties("source", data, 4, 2);
        assert_eq!(p.get_str(c::OfxImageEffectPropPixelDepth, 0), Some(c::OfxBitDepthByte));
        assert_eq!(
            p.get_str(c::OfxImageEffectPropComponents, 0),
            Some(c::OfxImageComponentRGBA)
        );
        assert_eq!(
            p.get_str(c::OfxImageEffectPropPreMultiplication, 0),
            Some(c::OfxImageUnPreMultiplied)
        );
        assert_eq!(p.get_int(c::OfxImagePropBounds, 2), Some(4));
        assert_eq!(p.get_int(c::OfxImagePropBounds, 3), Some(2));
        assert_eq!(p.get_int(c::OfxImagePropRowBytes, 0), Some(16));
        assert_eq!(p.get_str(c::OfxImagePropUniqueIdentifier, 0), Some("source"));
        assert!(p.contains(c::OfxImagePropData));
    }

    #[test]
    fn clip_instance_layering() {
        let mut p = clip_descriptor_properties("Source");
        assert!(!p.contains(c::OfxImageClipPropConnected));
        add_clip_instance_properties(&mut p);
        assert_eq!(p.get_int(c::OfxImageClipPropConnected, 0), Some(0));
        assert_eq!(
            p.get_str(c::OfxImageEffectPropPreMultiplication, 0),
            Some(c::OfxImageUnPreMultiplied)
        );
    }

    #[test]
    fn render_action_window_is_integer() {
        let p = render_action_properties(640, 480);
        assert_eq!(p.get_int(c::OfxImageEffectPropRenderWindow, 2), Some(640));
        assert_eq!(p.get_int(c::OfxImageEffectPropRenderWindow, 3), Some(480));
        assert_eq!(p.get_double(c::OfxPropTime, 0), Some(0.0));
    }
}
