#![allow(non_upper_case_globals)]

//! String constants defined by the OFX 1.4 API.
//!
//! Most OFX constants have the same name and string value, which the
//! `constant!` macro exploits. A handful of header constants carry a
//! value that differs from their name; those are spelled out and
//! commented individually.

macro_rules! constant {
    ($name: ident) => {
        pub const $name: &str = stringify!($name);
    };
}

pub mod actions {
    constant!(OfxActionLoad);
    constant!(OfxActionDescribe);
    constant!(OfxActionUnload);
    constant!(OfxActionCreateInstance);
    constant!(OfxActionDestroyInstance);
    constant!(OfxImageEffectActionDescribeInContext);
    constant!(OfxImageEffectActionBeginSequenceRender);
    constant!(OfxImageEffectActionRender);
    constant!(OfxImageEffectActionEndSequenceRender);
}

pub mod suites {
    constant!(OfxImageEffectSuite);
    constant!(OfxPropertySuite);
    constant!(OfxParameterSuite);
    constant!(OfxMemorySuite);
    constant!(OfxMultiThreadSuite);
    constant!(OfxMessageSuite);
}

pub mod host {
    constant!(OfxImageEffectHostPropIsBackground);
    constant!(OfxImageEffectHostPropNativeOrigin);
    constant!(OfxImageEffectHostPropNativeOriginBottomLeft);
    constant!(OfxImageEffectHostPropNativeOriginTopLeft);
    constant!(OfxImageEffectHostPropNativeOriginCenter);
    constant!(OfxParamHostPropMaxPages);
    constant!(OfxParamHostPropMaxParameters);
    constant!(OfxParamHostPropPageRowColumnCount);
    constant!(OfxParamHostPropSupportsBooleanAnimation);
    constant!(OfxParamHostPropSupportsChoiceAnimation);
    constant!(OfxParamHostPropSupportsCustomAnimation);
    constant!(OfxParamHostPropSupportsCustomInteract);
    constant!(OfxParamHostPropSupportsParametricAnimation);
    constant!(OfxParamHostPropSupportsStringAnimation);
    constant!(OfxPropHostOSHandle);
}

pub mod image_effect {
    // Note: name and string value don't match
    pub const OfxImageEffectPluginApi: &str = "OfxImageEffectPluginAPI";
    pub const OfxImageEffectOutputClipName: &str = "Output";
    pub const OfxImageEffectSimpleSourceClipName: &str = "Source";

    constant!(OfxImageEffectContextFilter);
    constant!(OfxImageEffectContextGeneral);
    constant!(OfxImageEffectContextGenerator);
    constant!(OfxImageEffectContextPaint);
    constant!(OfxImageEffectContextRetimer);
    constant!(OfxImageEffectContextTransition);

    constant!(OfxImageEffectFrameVarying);
    constant!(OfxImageEffectInstancePropEffectDuration);
    constant!(OfxImageEffectInstancePropSequentialRender);
    constant!(OfxImageEffectPluginPropFieldRenderTwiceAlways);
    constant!(OfxImageEffectPluginPropGrouping);
    constant!(OfxImageEffectPluginPropHostFrameThreading);
    constant!(OfxImageEffectPluginPropOverlayInteractV1);
    constant!(OfxImageEffectPluginPropSingleInstance);
    constant!(OfxImageEffectPluginRenderThreadSafety);
    constant!(OfxImageEffectPropClipPreferencesSlaveParam);
    constant!(OfxImageEffectPropComponents);
    constant!(OfxImageEffectPropContext);
    constant!(OfxImageEffectPropFieldToRender);
    constant!(OfxImageEffectPropFrameRange);
    constant!(OfxImageEffectPropFrameRate);
    constant!(OfxImageEffectPropFrameStep);
    constant!(OfxImageEffectPropInteractiveRenderStatus);
    constant!(OfxImageEffectPropOpenGLEnabled);
    constant!(OfxImageEffectPropOpenGLRenderSupported);
    constant!(OfxImageEffectPropOpenGLTextureIndex);
    constant!(OfxImageEffectPropOpenGLTextureTarget);
    constant!(OfxImageEffectPropPixelDepth);
    constant!(OfxImageEffectPropPluginHandle);
    constant!(OfxImageEffectPropPreMultiplication);
    constant!(OfxImageEffectPropProjectExtent);
    constant!(OfxImageEffectPropProjectOffset);
    constant!(OfxImageEffectPropProjectSize);
    constant!(OfxImageEffectPropRegionOfDefinition);
    constant!(OfxImageEffectPropRegionOfInterest);
    constant!(OfxImageEffectPropRenderQualityDraft);
    constant!(OfxImageEffectPropRenderScale);
    constant!(OfxImageEffectPropRenderWindow);
    constant!(OfxImageEffectPropSequentialRenderStatus);
    constant!(OfxImageEffectPropSetableFielding);
    constant!(OfxImageEffectPropSetableFrameRate);
    constant!(OfxImageEffectPropSupportedComponents);
    constant!(OfxImageEffectPropSupportedContexts);
    constant!(OfxImageEffectPropSupportedPixelDepths);
    constant!(OfxImageEffectPropSupportsMultiResolution);
    constant!(OfxImageEffectPropSupportsOverlays);
    constant!(OfxImageEffectPropSupportsTiles);
    constant!(OfxImageEffectPropTemporalClipAccess);
    constant!(OfxImageEffectPropUnmappedFrameRange);
    constant!(OfxImageEffectPropUnmappedFrameRate);
    // Note: name and string value don't match
    pub const OfxImageEffectPropSupportsMultipleClipDepths: &str =
        "OfxImageEffectPropMultipleClipDepths";
    pub const OfxImageEffectPropSupportsMultipleClipPARs: &str =
        "OfxImageEffectPropMultipleClipPARs";
    pub const OfxImageEffectPropProjectPixelAspectRatio: &str =
        "OfxImageEffectPropPixelAspectRatio";

    constant!(OfxImageClipPropConnected);
    constant!(OfxImageClipPropContinuousSamples);
    constant!(OfxImageClipPropFieldExtraction);
    constant!(OfxImageClipPropFieldOrder);
    constant!(OfxImageClipPropIsMask);
    constant!(OfxImageClipPropOptional);
    constant!(OfxImageClipPropUnmappedComponents);
    constant!(OfxImageClipPropUnmappedPixelDepth);

    constant!(OfxImageComponentAlpha);
    constant!(OfxImageComponentNone);
    constant!(OfxImageComponentRGB);
    constant!(OfxImageComponentRGBA);

    // Note: name and string value don't match
    pub const OfxImageFieldBoth: &str = "OfxFieldBoth";
    pub const OfxImageFieldDoubled: &str = "OfxFieldDoubled";
    pub const OfxImageFieldLower: &str = "OfxFieldLower";
    pub const OfxImageFieldNone: &str = "OfxFieldNone";
    pub const OfxImageFieldSingle: &str = "OfxFieldSingle";
    pub const OfxImageFieldUpper: &str = "OfxFieldUpper";

    constant!(OfxImageOpaque);
    // Note: name and string value don't match
    pub const OfxImagePreMultiplied: &str = "OfxImageAlphaPremultiplied";
    pub const OfxImageUnPreMultiplied: &str = "OfxImageAlphaUnPremultiplied";

    constant!(OfxImagePropBounds);
    constant!(OfxImagePropData);
    constant!(OfxImagePropField);
    constant!(OfxImagePropPixelAspectRatio);
    constant!(OfxImagePropRegionOfDefinition);
    constant!(OfxImagePropRowBytes);
    constant!(OfxImagePropUniqueIdentifier);

    constant!(OfxImageEffectRenderFullySafe);
    constant!(OfxImageEffectRenderInstanceSafe);
    constant!(OfxImageEffectRenderUnsafe);
}

pub mod properties {
    constant!(OfxPropAPIVersion);
    constant!(OfxPropIcon);
    constant!(OfxPropInstanceData);
    constant!(OfxPropIsInteractive);
    constant!(OfxPropLabel);
    constant!(OfxPropLongLabel);
    constant!(OfxPropName);
    constant!(OfxPropParamSetNeedsSyncing);
    constant!(OfxPropPluginDescription);
    constant!(OfxPropShortLabel);
    constant!(OfxPropTime);
    constant!(OfxPropType);
    constant!(OfxPropVersion);
    constant!(OfxPropVersionLabel);
}

pub mod param {
    constant!(OfxParamPropAnimates);
    constant!(OfxParamPropCacheInvalidation);
    constant!(OfxParamPropCanUndo);
    constant!(OfxParamPropChoiceOption);
    constant!(OfxParamPropCustomValue);
    constant!(OfxParamPropDataPtr);
    constant!(OfxParamPropDefault);
    constant!(OfxParamPropDefaultCoordinateSystem);
    constant!(OfxParamPropDigits);
    constant!(OfxParamPropDimensionLabel);
    constant!(OfxParamPropDisplayMax);
    constant!(OfxParamPropDisplayMin);
    constant!(OfxParamPropDoubleType);
    constant!(OfxParamPropEnabled);
    constant!(OfxParamPropEvaluateOnChange);
    constant!(OfxParamPropGroupOpen);
    constant!(OfxParamPropHasHostOverlayHandle);
    constant!(OfxParamPropHint);
    constant!(OfxParamPropIncrement);
    constant!(OfxParamPropInteractMinimumSize);
    constant!(OfxParamPropInteractPreferedSize);
    constant!(OfxParamPropInteractSize);
    constant!(OfxParamPropInteractSizeAspect);
    constant!(OfxParamPropInteractV1);
    constant!(OfxParamPropIsAnimating);
    constant!(OfxParamPropIsAutoKeying);
    constant!(OfxParamPropMax);
    constant!(OfxParamPropMin);
    constant!(OfxParamPropPageChild);
    constant!(OfxParamPropParent);
    constant!(OfxParamPropPersistant);
    constant!(OfxParamPropPluginMayWrite);
    constant!(OfxParamPropScriptName);
    constant!(OfxParamPropSecret);
    constant!(OfxParamPropShowTimeMarker);
    constant!(OfxParamPropStringFilePathExists);
    constant!(OfxParamPropStringMode);
    constant!(OfxParamPropType);
    constant!(OfxParamPropUseHostOverlayHandle);
    // Note: name and string value don't match
    pub const OfxParamPropCustomInterpCallbackV1: &str =
        "OfxParamPropCustomCallbackV1";

    constant!(OfxParamCoordinatesCanonical);
    constant!(OfxParamCoordinatesNormalised);
    constant!(OfxParamDoubleTypeAbsoluteTime);
    constant!(OfxParamDoubleTypeAngle);
    constant!(OfxParamDoubleTypePlain);
    constant!(OfxParamDoubleTypeScale);
    constant!(OfxParamDoubleTypeTime);
    constant!(OfxParamInvalidateAll);
    constant!(OfxParamInvalidateValueChange);
    constant!(OfxParamInvalidateValueChangeToEnd);
    constant!(OfxParamStringIsDirectoryPath);
    constant!(OfxParamStringIsFilePath);
    constant!(OfxParamStringIsLabel);
    constant!(OfxParamStringIsMultiLine);
    constant!(OfxParamStringIsRichTextFormat);
    constant!(OfxParamStringIsSingleLine);

    constant!(OfxParamTypeBoolean);
    constant!(OfxParamTypeChoice);
    constant!(OfxParamTypeCustom);
    constant!(OfxParamTypeDouble);
    constant!(OfxParamTypeDouble2D);
    constant!(OfxParamTypeDouble3D);
    constant!(OfxParamTypeGroup);
    constant!(OfxParamTypeInteger);
    constant!(OfxParamTypeInteger2D);
    constant!(OfxParamTypeInteger3D);
    constant!(OfxParamTypePage);
    constant!(OfxParamTypeParametric);
    constant!(OfxParamTypePushButton);
    constant!(OfxParamTypeRGB);
    constant!(OfxParamTypeRGBA);
    constant!(OfxParamTypeString);
}

pub mod message {
    constant!(OfxMessageError);
    constant!(OfxMessageFatal);
    constant!(OfxMessageLog);
    constant!(OfxMessageMessage);
    constant!(OfxMessageQuestion);
    constant!(OfxMessageWarning);
}

pub mod misc {
    constant!(OfxBitDepthByte);
    constant!(OfxBitDepthFloat);
    constant!(OfxBitDepthHalf);
    constant!(OfxBitDepthNone);
    constant!(OfxBitDepthShort);
    constant!(OfxPluginPropFilePath);
    constant!(OfxTypeClip);
    constant!(OfxTypeImage);
    constant!(OfxTypeImageEffect);
    constant!(OfxTypeImageEffectHost);
    constant!(OfxTypeImageEffectInstance);
    constant!(OfxTypeParameter);
    constant!(OfxTypeParameterInstance);
}

pub use actions::*;
pub use host::*;
pub use image_effect::*;
pub use message::*;
pub use misc::*;
pub use param::*;
pub use properties::*;
pub use suites::*;
