//! Material conversion onto the Trinity Standard shader.
//!
//! Legacy materials carry flat, string-keyed flags, floats, colors, and
//! samplers. They are remapped through the tables in
//! [`shader_keys`](crate::convert::shader_keys); anything without a
//! counterpart is dropped and reported as a [`DroppedParameter`].

use std::collections::HashMap;

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, warn};

use crate::convert::shader_keys::{
    self, COLOR_BASE_U, COLOR_BASE_V, COLOR_UV_SCALE_U, COLOR_UV_SCALE_V,
    DEFAULT_MATERIAL_LAYERS, LAYER_MASK_MAP, LAYER_MASK_SLOT, NORMAL_MAP_UV_SCALE_U,
    NORMAL_MAP_UV_SCALE_V, NUM_MATERIAL_LAYER, ShaderFlag,
};
use crate::models::gfb::{GfbMaterial, GfbModel, GfbSamplerSettings, LegacyWrapMode};
use crate::models::trinity::{
    Float4Parameter, FloatParameter, IntParameter, MaterialPass, SamplerState,
    ShaderParameterSet, StringParameter, TextureParameter, WrapMode,
};
use crate::recognized::Recognized;

pub const STANDARD_SHADER: &str = "Standard";
pub const OPAQUE: &str = "Opaque";

const UV_TRANSFORM_VALUES: &[&str] = &[
    COLOR_UV_SCALE_U,
    COLOR_UV_SCALE_V,
    COLOR_BASE_U,
    COLOR_BASE_V,
    NORMAL_MAP_UV_SCALE_U,
    NORMAL_MAP_UV_SCALE_V,
];

#[derive(Debug, Error, PartialEq)]
pub enum MaterialError {
    #[error(
        "material {material}: sampler {sampler} uses texture {index}, but only {count} texture files exist"
    )]
    TextureIndexOutOfRange {
        material: String,
        sampler: String,
        index: u32,
        count: usize,
    },
}

/// Which table a dropped parameter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamKind {
    Flag,
    Float,
    Color,
    Sampler,
}

/// A legacy parameter that did not make it into the converted material.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DroppedParameter {
    pub material: String,
    pub kind: ParamKind,
    pub name: String,
    /// `true` when the name is listed as obsolete, `false` when it is not
    /// listed at all.
    pub recognized: bool,
}

/// Converted material passes plus every parameter that was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertedMaterials {
    pub passes: Vec<MaterialPass>,
    pub dropped: Vec<DroppedParameter>,
}

struct DropLog<'a> {
    material: &'a str,
    dropped: &'a mut Vec<DroppedParameter>,
}

impl DropLog<'_> {
    /// Unwrap a table lookup, recording it when it yields nothing.
    fn take<T>(&mut self, kind: ParamKind, name: &str, lookup: Recognized<Option<T>>) -> Option<T> {
        let recognized = lookup.is_known();
        match lookup.mapped() {
            Some(target) => Some(target),
            None => {
                debug!(
                    "material {}: dropping {kind:?} parameter {name} ({})",
                    self.material,
                    if recognized { "obsolete" } else { "unknown" }
                );
                self.dropped.push(DroppedParameter {
                    material: self.material.to_string(),
                    kind,
                    name: name.to_string(),
                    recognized,
                });
                None
            }
        }
    }
}

fn bool_string(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

/// Resolve every Standard-shader enable flag for one material.
fn collapse_flags(material: &GfbMaterial, log: &mut DropLog<'_>) -> HashMap<ShaderFlag, bool> {
    let mut mentioned: HashMap<ShaderFlag, bool> = HashMap::new();
    for legacy in &material.flags {
        if let Some(flag) = log.take(ParamKind::Flag, &legacy.name, shader_keys::flag(&legacy.name))
        {
            *mentioned.entry(flag).or_insert(false) |= legacy.enable;
        }
    }

    ShaderFlag::ALL
        .iter()
        .map(|flag| {
            let value = if flag.is_overridable() {
                mentioned
                    .get(flag)
                    .copied()
                    .unwrap_or_else(|| flag.default_value())
            } else {
                flag.default_value()
            };
            (*flag, value)
        })
        .collect()
}

fn string_params(flags: &HashMap<ShaderFlag, bool>) -> Vec<StringParameter> {
    let mut params = Vec::with_capacity(ShaderFlag::ALL.len() + 1);
    for flag in ShaderFlag::ALL {
        if *flag == ShaderFlag::UVScaleOffsetNormal {
            params.push(StringParameter {
                name: NUM_MATERIAL_LAYER.to_string(),
                value: DEFAULT_MATERIAL_LAYERS.to_string(),
            });
        }
        params.push(StringParameter {
            name: flag.key().to_string(),
            value: bool_string(flags.get(flag).copied().unwrap_or_default()),
        });
    }
    params
}

fn default_floats() -> Vec<FloatParameter> {
    let mut floats = vec![
        ("DiscardValue".to_string(), 0.0),
        ("NormalHeight".to_string(), 1.0),
        ("EmissionIntensity".to_string(), 0.0),
    ];
    floats.extend((1..=4).map(|layer| (format!("EmissionIntensityLayer{layer}"), 0.0)));
    floats.push(("Roughness".to_string(), 0.5));
    floats.extend((1..=4).map(|layer| (format!("RoughnessLayer{layer}"), 0.5)));
    floats.push(("Metallic".to_string(), 0.0));
    floats.extend((1..=4).map(|layer| (format!("MetallicLayer{layer}"), 0.0)));
    floats.extend((1..=4).map(|layer| (format!("LayerMaskScale{layer}"), 1.0)));

    floats
        .into_iter()
        .map(|(name, value)| FloatParameter { name, value })
        .collect()
}

fn set_float(floats: &mut Vec<FloatParameter>, name: &str, value: f32) {
    match floats.iter_mut().find(|p| p.name == name) {
        Some(existing) => existing.value = value,
        None => floats.push(FloatParameter {
            name: name.to_string(),
            value,
        }),
    }
}

fn set_color(colors: &mut Vec<Float4Parameter>, name: &str, value: [f32; 4]) {
    match colors.iter_mut().find(|p| p.name == name) {
        Some(existing) => existing.value = value,
        None => colors.push(Float4Parameter {
            name: name.to_string(),
            value,
        }),
    }
}

fn float_params(material: &GfbMaterial, log: &mut DropLog<'_>) -> Vec<FloatParameter> {
    let mut floats = default_floats();
    for legacy in &material.values {
        // Consumed by the UV transform colors instead.
        if UV_TRANSFORM_VALUES.contains(&legacy.name.as_str()) {
            continue;
        }
        if let Some(target) =
            log.take(ParamKind::Float, &legacy.name, shader_keys::float(&legacy.name))
        {
            set_float(&mut floats, target.key(), legacy.value);
        }
    }
    floats
}

fn color_params(material: &GfbMaterial, log: &mut DropLog<'_>) -> Vec<Float4Parameter> {
    let values: HashMap<&str, f32> = material
        .values
        .iter()
        .map(|v| (v.name.as_str(), v.value))
        .collect();
    let value = |name: &str, default: f32| values.get(name).copied().unwrap_or(default);

    let mut colors = vec![
        Float4Parameter {
            name: "UVScaleOffset".to_string(),
            value: [
                value(COLOR_UV_SCALE_U, 1.0),
                value(COLOR_UV_SCALE_V, 1.0),
                value(COLOR_BASE_U, 0.0),
                value(COLOR_BASE_V, 0.0),
            ],
        },
        Float4Parameter {
            name: "UVScaleOffsetNormal".to_string(),
            value: [
                value(NORMAL_MAP_UV_SCALE_U, 1.0),
                value(NORMAL_MAP_UV_SCALE_V, 1.0),
                0.0,
                0.0,
            ],
        },
    ];
    let zeroed = (1..=4)
        .map(|layer| format!("BaseColorLayer{layer}"))
        .chain((1..=4).map(|layer| format!("EmissionColorLayer{layer}")))
        .chain(std::iter::once("EmissionColor".to_string()));
    colors.extend(zeroed.map(|name| Float4Parameter {
        name,
        value: [0.0; 4],
    }));

    for legacy in &material.colors {
        if let Some(binding) =
            log.take(ParamKind::Color, &legacy.name, shader_keys::color(&legacy.name))
        {
            let [r, g, b] = legacy.color.unwrap_or_default();
            set_color(&mut colors, binding, [r, g, b, 0.0]);
        }
    }

    colors
}

fn wrap_mode(mode: LegacyWrapMode) -> WrapMode {
    match mode {
        LegacyWrapMode::Clamp => WrapMode::Repeat,
        LegacyWrapMode::Border => WrapMode::Border,
        LegacyWrapMode::Wrap => WrapMode::ClampToEdge,
        LegacyWrapMode::Mirror => WrapMode::Mirror,
    }
}

fn sampler_state(settings: &GfbSamplerSettings) -> SamplerState {
    SamplerState {
        repeat_u: wrap_mode(settings.repeat_u),
        repeat_v: wrap_mode(settings.repeat_v),
        repeat_w: wrap_mode(settings.repeat_w),
        border_color: settings.border_color,
    }
}

fn texture_params(
    material: &GfbMaterial,
    model: &GfbModel,
    flags: &HashMap<ShaderFlag, bool>,
    log: &mut DropLog<'_>,
) -> Result<(Vec<TextureParameter>, Vec<SamplerState>), MaterialError> {
    let mut bindings: Vec<(TextureParameter, SamplerState)> = Vec::new();

    for legacy in &material.textures {
        let Some(target) = log.take(
            ParamKind::Sampler,
            &legacy.sampler_name,
            shader_keys::sampler(&legacy.sampler_name),
        ) else {
            continue;
        };

        let bound = target
            .gate
            .is_some_and(|flag| flags.get(&flag).copied().unwrap_or_default());
        if !bound {
            debug!(
                "material {}: sampler {} is not enabled, skipping",
                material.name, legacy.sampler_name
            );
            continue;
        }

        let file = model.texture_file(legacy.texture_index).ok_or_else(|| {
            MaterialError::TextureIndexOutOfRange {
                material: material.name.clone(),
                sampler: legacy.sampler_name.clone(),
                index: legacy.texture_index,
                count: model.texture_files.len(),
            }
        })?;

        bindings.push((
            TextureParameter {
                name: target.binding.to_string(),
                file: format!("{file}.bntx"),
                slot: target.slot,
            },
            sampler_state(&legacy.settings),
        ));
    }

    match model.texture_files.first() {
        Some(first) => bindings.insert(
            bindings.len().min(1),
            (
                TextureParameter {
                    name: LAYER_MASK_MAP.to_string(),
                    file: format!("{}.bntx", first.replace("col", "lym")),
                    slot: LAYER_MASK_SLOT,
                },
                SamplerState::default(),
            ),
        ),
        None => warn!(
            "material {}: model has no texture files, no layer mask bound",
            material.name
        ),
    }

    let (textures, mut samplers): (Vec<_>, Vec<_>) = bindings
        .into_iter()
        .sorted_by_key(|(texture, _)| texture.slot)
        .unzip();

    // Two trailing edge-clamped samplers follow the per-texture ones.
    let edge = SamplerState {
        repeat_u: WrapMode::ClampToEdge,
        repeat_v: WrapMode::ClampToEdge,
        ..Default::default()
    };
    samplers.extend([edge, edge]);

    Ok((textures, samplers))
}

/// Convert one legacy material into a Standard-shader pass.
pub fn convert_material(
    material: &GfbMaterial,
    model: &GfbModel,
    dropped: &mut Vec<DroppedParameter>,
) -> Result<MaterialPass, MaterialError> {
    let mut log = DropLog {
        material: &material.name,
        dropped,
    };

    let flags = collapse_flags(material, &mut log);
    let floats = float_params(material, &mut log);
    let colors = color_params(material, &mut log);
    let (textures, samplers) = texture_params(material, model, &flags, &mut log)?;

    let int_parameters = [
        ("CastShadow", material.cast_shadow),
        ("ReceiveShadow", 1),
        ("CategoryLabel", 2),
        ("UVIndexLayerMask", -1),
    ]
    .into_iter()
    .map(|(name, value)| IntParameter {
        name: name.to_string(),
        value,
    })
    .collect();

    Ok(MaterialPass {
        name: material.name.clone(),
        shader_name: STANDARD_SHADER.to_string(),
        parameters: ShaderParameterSet {
            flags: string_params(&flags),
            floats,
            colors,
            textures,
            samplers,
        },
        int_parameters,
        alpha_type: OPAQUE.to_string(),
    })
}

/// Convert every material of `model`, in order.
pub fn convert_materials(model: &GfbModel) -> Result<ConvertedMaterials, MaterialError> {
    let mut out = ConvertedMaterials::default();
    for material in &model.materials {
        let pass = convert_material(material, model, &mut out.dropped)?;
        out.passes.push(pass);
    }
    debug!(
        "converted {} materials, dropped {} parameters",
        out.passes.len(),
        out.dropped.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gfb::{GfbColorParam, GfbFlag, GfbFloatParam, GfbTexture};

    fn flag(name: &str, enable: bool) -> GfbFlag {
        GfbFlag {
            name: name.to_string(),
            enable,
        }
    }

    fn value(name: &str, value: f32) -> GfbFloatParam {
        GfbFloatParam {
            name: name.to_string(),
            value,
        }
    }

    fn texture(sampler_name: &str, texture_index: u32) -> GfbTexture {
        GfbTexture {
            sampler_name: sampler_name.to_string(),
            texture_index,
            settings: GfbSamplerSettings {
                repeat_u: LegacyWrapMode::Wrap,
                repeat_v: LegacyWrapMode::Clamp,
                repeat_w: LegacyWrapMode::Mirror,
                border_color: [0.0; 4],
            },
        }
    }

    fn body_material() -> GfbMaterial {
        GfbMaterial {
            name: "body".to_string(),
            shader_name: "SSS".to_string(),
            flags: vec![
                flag("useColorTex", true),
                flag("NormalMapEnable", false),
                flag("FogEnable", true),
                flag("Glitter", true),
            ],
            values: vec![
                value("2", 0.8),
                value("RimPower", 3.0),
                value(COLOR_UV_SCALE_U, 2.0),
                value(COLOR_BASE_V, 0.5),
            ],
            colors: vec![GfbColorParam {
                name: "RimColor".to_string(),
                color: Some([1.0, 0.0, 0.0]),
            }],
            textures: vec![
                texture("NormalMapTex", 1),
                texture("Col0Tex", 0),
                texture("LightTblTex", 2),
            ],
            cast_shadow: 1,
        }
    }

    fn model_with(material: GfbMaterial) -> GfbModel {
        GfbModel {
            texture_files: vec![
                "pm0025_00_body_col".to_string(),
                "pm0025_00_body_nrm".to_string(),
                "pm0025_00_lighttbl".to_string(),
            ],
            materials: vec![material],
            ..Default::default()
        }
    }

    #[test]
    fn test_flags_collapse_with_defaults() {
        let model = model_with(body_material());
        let mut dropped = Vec::new();
        let pass = convert_material(&model.materials[0], &model, &mut dropped).unwrap();
        let params = &pass.parameters;

        assert_eq!(params.flag("EnableBaseColorMap"), Some("True"));
        assert_eq!(params.flag("EnableNormalMap"), Some("False"));
        assert_eq!(params.flag("EnableParallaxMap"), Some("False"));
        assert_eq!(params.flag("EnableUVScaleOffsetNormal"), Some("True"));
        assert_eq!(params.flag(NUM_MATERIAL_LAYER), Some("5"));

        let names: Vec<_> = params.flags.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), 11);
        assert_eq!(names[8], NUM_MATERIAL_LAYER);
        assert_eq!(names[10], "EnableVertexBaseColor");
    }

    #[test]
    fn test_or_collapse() {
        let mut material = body_material();
        material.flags = vec![
            flag("AmbientMapEnable", true),
            flag("AmbientMapEnable", false),
        ];
        let model = model_with(material);
        let pass = convert_material(&model.materials[0], &model, &mut Vec::new()).unwrap();
        assert_eq!(pass.parameters.flag("EnableAOMap"), Some("True"));
    }

    #[test]
    fn test_floats_and_colors() {
        let model = model_with(body_material());
        let pass = convert_material(&model.materials[0], &model, &mut Vec::new()).unwrap();
        let params = &pass.parameters;

        assert_eq!(params.floats.len(), 21);
        assert_eq!(params.float("Roughness"), Some(0.8));
        assert_eq!(params.float("RoughnessLayer1"), Some(0.5));
        assert_eq!(params.float("NormalHeight"), Some(1.0));
        assert_eq!(params.float("RimPower"), None);

        assert_eq!(params.color("UVScaleOffset"), Some([2.0, 1.0, 0.0, 0.5]));
        assert_eq!(params.color("UVScaleOffsetNormal"), Some([1.0, 1.0, 0.0, 0.0]));
        assert_eq!(params.color("EmissionColor"), Some([0.0; 4]));
        assert_eq!(params.colors.len(), 11);
        assert_eq!(params.color("RimColor"), None);
    }

    #[test]
    fn test_textures_sorted_with_layer_mask() {
        let model = model_with(body_material());
        let pass = convert_material(&model.materials[0], &model, &mut Vec::new()).unwrap();
        let params = &pass.parameters;

        // Normal maps are disabled, the light table has no counterpart.
        let textures: Vec<_> = params
            .textures
            .iter()
            .map(|t| (t.name.as_str(), t.slot, t.file.as_str()))
            .collect();
        assert_eq!(
            textures,
            vec![
                ("BaseColorMap", 0, "pm0025_00_body_col.bntx"),
                ("LayerMaskMap", 1, "pm0025_00_body_lym.bntx"),
            ]
        );

        assert_eq!(params.samplers.len(), textures.len() + 2);
        assert_eq!(params.samplers[0].repeat_u, WrapMode::ClampToEdge);
        assert_eq!(params.samplers[0].repeat_v, WrapMode::Repeat);
        assert_eq!(params.samplers[0].repeat_w, WrapMode::Mirror);
        assert_eq!(params.samplers[1], SamplerState::default());
        let trailing = params.samplers[3];
        assert_eq!(trailing.repeat_u, WrapMode::ClampToEdge);
        assert_eq!(trailing.repeat_v, WrapMode::ClampToEdge);
    }

    #[test]
    fn test_enabled_normal_map_is_bound_by_slot() {
        let mut material = body_material();
        material.flags[1].enable = true;
        let model = model_with(material);
        let pass = convert_material(&model.materials[0], &model, &mut Vec::new()).unwrap();
        let slots: Vec<_> = pass.parameters.textures.iter().map(|t| t.slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
        assert_eq!(
            pass.parameters.texture("NormalMap").map(|t| t.file.as_str()),
            Some("pm0025_00_body_nrm.bntx")
        );
    }

    #[test]
    fn test_same_slot_keeps_insertion_order() {
        let mut material = body_material();
        material.flags.push(flag("AmbientMapEnable", true));
        material.textures = vec![
            texture("AmbientTex", 2),
            texture("Col0Tex", 0),
            texture("AmbientTex", 1),
        ];
        let model = model_with(material);
        let pass = convert_material(&model.materials[0], &model, &mut Vec::new()).unwrap();

        let textures: Vec<_> = pass
            .parameters
            .textures
            .iter()
            .map(|t| (t.slot, t.file.as_str()))
            .collect();
        assert_eq!(
            textures,
            vec![
                (0, "pm0025_00_body_col.bntx"),
                (1, "pm0025_00_body_lym.bntx"),
                (3, "pm0025_00_lighttbl.bntx"),
                (3, "pm0025_00_body_nrm.bntx"),
            ]
        );
    }

    #[test]
    fn test_dropped_parameters_are_reported() {
        let model = model_with(body_material());
        let mut dropped = Vec::new();
        convert_material(&model.materials[0], &model, &mut dropped).unwrap();

        let summary: Vec<_> = dropped
            .iter()
            .map(|d| (d.kind, d.name.as_str(), d.recognized))
            .collect();
        assert!(summary.contains(&(ParamKind::Flag, "FogEnable", true)));
        assert!(summary.contains(&(ParamKind::Flag, "Glitter", false)));
        assert!(summary.contains(&(ParamKind::Float, "RimPower", true)));
        assert!(summary.contains(&(ParamKind::Color, "RimColor", true)));
        assert!(summary.contains(&(ParamKind::Sampler, "LightTblTex", true)));
        assert!(!summary.iter().any(|(_, name, _)| *name == COLOR_UV_SCALE_U));
        assert!(dropped.iter().all(|d| d.material == "body"));
    }

    #[test]
    fn test_int_parameters_and_shader() {
        let model = model_with(body_material());
        let pass = convert_material(&model.materials[0], &model, &mut Vec::new()).unwrap();
        assert_eq!(pass.shader_name, "Standard");
        assert_eq!(pass.alpha_type, "Opaque");
        let ints: Vec<_> = pass
            .int_parameters
            .iter()
            .map(|p| (p.name.as_str(), p.value))
            .collect();
        assert_eq!(
            ints,
            vec![
                ("CastShadow", 1),
                ("ReceiveShadow", 1),
                ("CategoryLabel", 2),
                ("UVIndexLayerMask", -1)
            ]
        );
    }

    #[test]
    fn test_bad_texture_index() {
        let mut material = body_material();
        material.textures = vec![texture("Col0Tex", 7)];
        let model = model_with(material);
        assert_eq!(
            convert_materials(&model),
            Err(MaterialError::TextureIndexOutOfRange {
                material: "body".to_string(),
                sampler: "Col0Tex".to_string(),
                index: 7,
                count: 3,
            })
        );
    }

    #[test]
    fn test_no_texture_files_skips_layer_mask() {
        let mut material = body_material();
        material.textures.clear();
        let model = GfbModel {
            materials: vec![material],
            ..Default::default()
        };
        let out = convert_materials(&model).unwrap();
        assert!(out.passes[0].parameters.textures.is_empty());
        assert_eq!(out.passes[0].parameters.samplers.len(), 2);
    }
}
