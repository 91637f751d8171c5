//! Remapping tables from legacy shader parameter names to Standard-shader bindings.
//!
//! Every legacy name the converter knows about is listed here. A name that maps
//! to `None` is obsolete: it exists in legacy materials but has no counterpart
//! in the Standard shader. Lookups return [`Recognized::Unknown`] for names that
//! are not listed at all.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::recognized::Recognized;

/// Boolean enable flags of the Standard shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShaderFlag {
    BaseColorMap,
    NormalMap,
    ParallaxMap,
    MetallicMap,
    RoughnessMap,
    EmissionColorMap,
    AOMap,
    AlphaTest,
    UVScaleOffsetNormal,
    VertexBaseColor,
}

impl ShaderFlag {
    /// All flags, in the order they are written to a material pass.
    pub const ALL: &[ShaderFlag] = &[
        Self::BaseColorMap,
        Self::NormalMap,
        Self::ParallaxMap,
        Self::MetallicMap,
        Self::RoughnessMap,
        Self::EmissionColorMap,
        Self::AOMap,
        Self::AlphaTest,
        Self::UVScaleOffsetNormal,
        Self::VertexBaseColor,
    ];

    /// The property binding name.
    pub fn key(&self) -> &'static str {
        match self {
            Self::BaseColorMap => "EnableBaseColorMap",
            Self::NormalMap => "EnableNormalMap",
            Self::ParallaxMap => "EnableParallaxMap",
            Self::MetallicMap => "EnableMetallicMap",
            Self::RoughnessMap => "EnableRoughnessMap",
            Self::EmissionColorMap => "EnableEmissionColorMap",
            Self::AOMap => "EnableAOMap",
            Self::AlphaTest => "EnableAlphaTest",
            Self::UVScaleOffsetNormal => "EnableUVScaleOffsetNormal",
            Self::VertexBaseColor => "EnableVertexBaseColor",
        }
    }

    /// Value used when no legacy flag sets this one.
    pub fn default_value(&self) -> bool {
        matches!(
            self,
            Self::BaseColorMap | Self::NormalMap | Self::UVScaleOffsetNormal
        )
    }

    /// Whether legacy flags may change this value.
    pub fn is_overridable(&self) -> bool {
        !matches!(self, Self::ParallaxMap)
    }
}

/// Number of material layers the Standard shader is configured with.
pub const NUM_MATERIAL_LAYER: &str = "NumMaterialLayer";
pub const DEFAULT_MATERIAL_LAYERS: u32 = 5;

/// Float bindings that legacy values can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShaderFloat {
    DiscardValue,
    Metallic,
    Roughness,
    NormalHeight,
    EmissionIntensity,
}

impl ShaderFloat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::DiscardValue => "DiscardValue",
            Self::Metallic => "Metallic",
            Self::Roughness => "Roughness",
            Self::NormalHeight => "NormalHeight",
            Self::EmissionIntensity => "EmissionIntensity",
        }
    }
}

/// Texture binding a legacy sampler is moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerTarget {
    pub binding: &'static str,
    pub slot: u32,
    /// Flag that must be enabled for the texture to be bound. `None` means
    /// the texture is never bound.
    pub gate: Option<ShaderFlag>,
}

// Legacy value names feeding the UV transform colors.
pub const COLOR_UV_SCALE_U: &str = "ColorUVScaleU";
pub const COLOR_UV_SCALE_V: &str = "ColorUVScaleV";
pub const COLOR_BASE_U: &str = "ColorBaseU";
pub const COLOR_BASE_V: &str = "ColorBaseV";
pub const NORMAL_MAP_UV_SCALE_U: &str = "NormalMapUVScaleU";
pub const NORMAL_MAP_UV_SCALE_V: &str = "NormalMapUVScaleV";

pub const LAYER_MASK_MAP: &str = "LayerMaskMap";
pub const LAYER_MASK_SLOT: u32 = 1;

const LEGACY_FLAGS: &[(&str, Option<ShaderFlag>)] = &[
    ("useColorTex", Some(ShaderFlag::BaseColorMap)),
    ("SwitchEmissionMaskTexUV", None),
    ("EmissionMaskUse", None),
    ("SwitchPriority", None),
    ("Layer1Enable", None),
    ("SwitchAmbientTexUV", None),
    ("AmbientMapEnable", Some(ShaderFlag::AOMap)),
    ("SwitchNormalMapUV", None),
    ("NormalMapEnable", Some(ShaderFlag::NormalMap)),
    ("LightTableEnable", None),
    ("SpecularMaskEnable", None),
    ("BaseColorAddEnable", None),
    ("SphereMapEnable", None),
    ("SphereMaskEnable", None),
    ("RimMaskEnable", None),
    ("alphaShell", None),
    ("EffectVal", None),
    ("NormalEdgeEnable", None),
    ("OutLineIDEnable", None),
    ("OutLineColFixed", None),
    // Global flags
    ("FogEnable", None),
    ("DiscardEnable", None),
    ("CastShadow", None),
    ("ReceiveShadow", None),
    ("TextureAlphaTestEnable", None),
    ("ShadowMapPrevEnable", None),
    ("LayerCalcMulti", None),
    ("FireMaskPathEnable", None),
    ("GPUInstancingEnable", None),
    ("Wireframe", None),
    ("DepthWrite", None),
    ("DepthTest", None),
    ("IsErase", None),
    ("MayaPreviewEnable", None),
];

const LEGACY_FLOATS: &[(&str, Option<ShaderFloat>)] = &[
    ("0", Some(ShaderFloat::DiscardValue)),
    ("1", Some(ShaderFloat::Metallic)),
    ("2", Some(ShaderFloat::Roughness)),
    ("3", Some(ShaderFloat::NormalHeight)),
    ("4", Some(ShaderFloat::EmissionIntensity)),
    ("5", None),
    ("ColorUVScaleU", None),
    ("ColorUVScaleV", None),
    ("ColorUVTranslateU", None),
    ("ColorBaseU", None),
    ("ColorUVTranslateV", None),
    ("ColorBaseV", None),
    ("ConstantColor0Val", None),
    ("Layer1UVScaleU", None),
    ("Layer1UVScaleV", None),
    ("Layer1UVTranslateU", None),
    ("Layer1BaseU", None),
    ("Layer1UVTranslateV", None),
    ("Layer1BaseV", None),
    ("EmissionMaskVal", None),
    ("ConstantColorSd0Val", None),
    ("ConstantColor1Val", None),
    ("ConstantColorSd1Val", None),
    ("ColorLerpValue", None),
    ("L1ConstantColor0Val", None),
    ("L1AddColor0Val", None),
    ("L1ConstantColor1Val", None),
    ("L1AddColor1Val", None),
    ("L1ConstantColorSd0Val", None),
    ("L1ConstantColorSd1Val", None),
    ("Layer1OverLerpValue", None),
    ("NormalMapUVScaleU", None),
    ("NormalMapUVScaleV", None),
    ("LightTblIndex", None),
    ("LightMul", None),
    ("SpecularPower", None),
    ("SpecularScale", None),
    ("SphereMapColorVal", None),
    ("RimColorVal", None),
    ("RimPower", None),
    ("RimStrength", None),
    ("OnGameEmissionVal", None),
    ("ConstantColorVal", None),
    ("ConstantAlpha", None),
    ("OnGameColorVal", None),
    ("OnGameAlpha", None),
    ("OutLineID", None),
    ("ProgID", None),
    ("Def0_OneMin1_FreCol", None),
    ("DistortionIntensity", None),
    ("Sin01", None),
    ("ScaleUV", None),
    ("EffectTexTranslateU", None),
    ("EffectTexTranslateV", None),
    ("EffectTexRotate", None),
    ("EffectTexScaleU", None),
    ("EffectTexScaleV", None),
    ("EffectColPower", None),
    // Uber values
    ("CullMode", None),
    ("LightSetNo", None),
    ("ShaderType", None),
    ("Priority", None),
    ("MipMapBias", None),
    ("PreMultiplieMode", None),
    ("BlendMode", None),
    ("ColorMapUvIndex", None),
    ("Layer1UvIdx", None),
    ("EmissionMaskTexSS", None),
    ("AmbientTexSS", None),
    ("NormalMapTexSS", None),
    ("Col0TexSS", None),
    ("LyCol0TexSS", None),
    ("PolygonOffset", None),
];

/// Every legacy color is obsolete in the Standard shader.
const LEGACY_COLORS: &[&str] = &[
    "0",
    "ConstantColor0",
    "ConstantColorSd0",
    "ConstantColor1",
    "ConstantColorSd1",
    "L1ConstantColor0",
    "L1AddColor0",
    "L1ConstantColor1",
    "L1AddColor1",
    "L1ConstantColorSd0",
    "L1ConstantColorSd1",
    "DeepShadowColor",
    "SpecularColor",
    "SphereMapColor",
    "RimColor",
    "RimColorShadow",
    "ConstantColor",
    "OnGameColor",
    "OutLineCol",
    "EffectColor01",
];

const LEGACY_SAMPLERS: &[(&str, Option<SamplerTarget>)] = &[
    (
        "0",
        Some(SamplerTarget {
            binding: LAYER_MASK_MAP,
            slot: LAYER_MASK_SLOT,
            gate: None,
        }),
    ),
    (
        "1",
        Some(SamplerTarget {
            binding: "MetallicMap",
            slot: 3,
            gate: Some(ShaderFlag::MetallicMap),
        }),
    ),
    (
        "2",
        Some(SamplerTarget {
            binding: "RoughnessMap",
            slot: 4,
            gate: Some(ShaderFlag::RoughnessMap),
        }),
    ),
    (
        "Col0Tex",
        Some(SamplerTarget {
            binding: "BaseColorMap",
            slot: 0,
            gate: Some(ShaderFlag::BaseColorMap),
        }),
    ),
    ("EmissionMaskTex", None),
    ("LyCol0Tex", None),
    (
        "AmbientTex",
        Some(SamplerTarget {
            binding: "AOMap",
            slot: 3,
            gate: Some(ShaderFlag::AOMap),
        }),
    ),
    (
        "NormalMapTex",
        Some(SamplerTarget {
            binding: "NormalMap",
            slot: 2,
            gate: Some(ShaderFlag::NormalMap),
        }),
    ),
    ("LightTblTex", None),
    ("SphereMapTex", None),
    ("EffectTex", None),
];

static FLAG_TABLE: LazyLock<HashMap<&'static str, Option<ShaderFlag>>> =
    LazyLock::new(|| LEGACY_FLAGS.iter().copied().collect());

static FLOAT_TABLE: LazyLock<HashMap<&'static str, Option<ShaderFloat>>> =
    LazyLock::new(|| LEGACY_FLOATS.iter().copied().collect());

static COLOR_TABLE: LazyLock<HashMap<&'static str, Option<&'static str>>> =
    LazyLock::new(|| LEGACY_COLORS.iter().map(|name| (*name, None)).collect());

static SAMPLER_TABLE: LazyLock<HashMap<&'static str, Option<SamplerTarget>>> =
    LazyLock::new(|| LEGACY_SAMPLERS.iter().copied().collect());

fn lookup<T: Copy>(table: &HashMap<&'static str, Option<T>>, name: &str) -> Recognized<Option<T>> {
    match table.get(name) {
        Some(target) => Recognized::Known(*target),
        None => Recognized::Unknown(name.to_string()),
    }
}

pub fn flag(name: &str) -> Recognized<Option<ShaderFlag>> {
    lookup(&FLAG_TABLE, name)
}

pub fn float(name: &str) -> Recognized<Option<ShaderFloat>> {
    lookup(&FLOAT_TABLE, name)
}

/// Destination Float4 binding for a legacy color.
pub fn color(name: &str) -> Recognized<Option<&'static str>> {
    lookup(&COLOR_TABLE, name)
}

pub fn sampler(name: &str) -> Recognized<Option<SamplerTarget>> {
    lookup(&SAMPLER_TABLE, name)
}
