//! Conversion of a legacy GFB model into a Trinity [`ModelBundle`].
//!
//! [`convert`] runs the stages in a fixed order: config, model header,
//! skeleton, meshes, materials, and the material switch table. A failing
//! stage aborts the conversion and nothing partial is returned.

pub mod attribute;
pub mod bundle;
pub mod material;
pub mod mesh;
pub mod shader_keys;
pub mod skeleton;
pub mod vertex_buffer;

use bon::Builder;
use rootcause::Report;
use thiserror::Error;
use tracing::debug;

use crate::convert::attribute::ColorPalettes;
use crate::convert::material::{DroppedParameter, MaterialError, convert_materials};
use crate::convert::mesh::{ConvertedMeshes, MeshError, convert_meshes};
use crate::convert::skeleton::{ParentIndexPolicy, SkeletonError, convert_skeleton};
use crate::models::Sphere;
use crate::models::gfb::{GfbConfig, GfbModel};
use crate::models::trinity::{
    Lod, Material, MaterialSwitch, MaterialTable, MeshMaterialSet, ModelBundle,
    MultiMaterialTable, PokeConfig, TrModel,
};

/// Name of the material set written for the shiny variant.
pub const RARE_MATERIAL_SET: &str = "rare";
pub const CUSTOM_LOD: &str = "Custom";

/// Tunables for one conversion run.
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Legacy units per destination unit.
    #[builder(default = 100.0)]
    unit_scale: f32,
    /// Nodes the destination runtime places ahead of the skeleton.
    #[builder(default = 2)]
    reserved_root_nodes: u32,
    #[builder(default)]
    parent_policy: ParentIndexPolicy,
    /// Overrides the derived `pm####_00_00` result name.
    result_name: Option<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConversionOptions {
    pub fn unit_scale(&self) -> f32 {
        self.unit_scale
    }

    pub fn reserved_root_nodes(&self) -> u32 {
        self.reserved_root_nodes
    }

    pub fn parent_policy(&self) -> ParentIndexPolicy {
        self.parent_policy
    }

    pub fn result_name(&self) -> Option<&str> {
        self.result_name.as_deref()
    }
}

/// File name stems used on each side of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNames {
    pub species_id: u16,
    /// Stem of the legacy files, e.g. `pm0025_00`.
    pub source: String,
    /// Stem of the converted files, e.g. `pm0025_00_00`.
    pub result: String,
}

impl ModelNames {
    pub fn for_species(species_id: u16) -> Self {
        Self {
            species_id,
            source: format!("pm{species_id:04}_00"),
            result: format!("pm{species_id:04}_00_00"),
        }
    }

    fn resolve(species_id: u16, options: &ConversionOptions) -> Self {
        let mut names = Self::for_species(species_id);
        if let Some(result) = options.result_name() {
            names.result = result.to_string();
        }
        names
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unit scale must be a positive finite number, got {unit_scale}")]
    InvalidUnitScale { unit_scale: f32 },
    #[error("skeleton conversion failed")]
    Skeleton(#[from] SkeletonError),
    #[error("mesh conversion failed")]
    Mesh(#[from] MeshError),
    #[error("material conversion failed")]
    Material(#[from] MaterialError),
}

/// Information about what a conversion could not carry over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub dropped_parameters: Vec<DroppedParameter>,
    /// Vertex colors seen per shape, parallel to the converted mesh shapes.
    pub palettes: Vec<ColorPalettes>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    pub bundle: ModelBundle,
    pub diagnostics: Diagnostics,
}

fn convert_config(config: &GfbConfig, options: &ConversionOptions) -> PokeConfig {
    let scale = options.unit_scale();
    PokeConfig {
        field_01: 1.32,
        field_02: 1.98,
        field_03: 5.45,
        field_10_y_offset: 0.0,
        field_11_y_offset: -0.07,
        field_12_y_offset: 0.0,
        size_index: config.size_index,
        inframe_vertical_rot_y_origin: config.inframe_vertical_rot_y_origin / scale,
        inframe_bottom_y_offset: config.inframe_bottom_y_offset / scale,
        inframe_center_y_offset: config.inframe_center_y_offset / scale,
        inframe_left_rotation: config.inframe_left_rotation,
        inframe_right_rotation: config.inframe_right_rotation,
    }
}

fn model_header(source: &GfbModel, names: &ModelNames, options: &ConversionOptions) -> TrModel {
    let bounds = source.bounds.scaled(options.unit_scale());
    TrModel {
        meshes: vec![format!("{}.trmsh", names.result)],
        skeleton: format!("{}.trskl", names.result),
        materials: vec![format!("{}.trmtr", names.result)],
        lods: vec![Lod {
            lod_type: CUSTOM_LOD.to_string(),
            entries: vec![0],
        }],
        bounds,
        sphere: Sphere::from_bounds(&bounds),
    }
}

fn material_table(meshes: &ConvertedMeshes, names: &ModelNames) -> MultiMaterialTable {
    let switches = meshes
        .mesh
        .shapes
        .iter()
        .map(|shape| MaterialSwitch {
            name: shape.shape_name.clone(),
            flags: 1,
        })
        .collect();

    MultiMaterialTable {
        materials: vec![MaterialTable {
            name: RARE_MATERIAL_SET.to_string(),
            file_names: vec![format!("{}_{RARE_MATERIAL_SET}.trmtr", names.result)],
            switches,
        }],
    }
}

/// Convert `source` into a complete model bundle.
pub fn convert(
    source: &GfbModel,
    options: &ConversionOptions,
) -> Result<ConversionOutput, Report<ConvertError>> {
    let unit_scale = options.unit_scale();
    if !(unit_scale.is_finite() && unit_scale > 0.0) {
        return Err(Report::new(ConvertError::InvalidUnitScale { unit_scale }));
    }

    let names = ModelNames::resolve(source.config.species_id, options);
    debug!("converting {} into {}", names.source, names.result);

    let config = convert_config(&source.config, options);
    let model = model_header(source, &names, options);

    let skeleton = convert_skeleton(&source.bones, options)
        .map_err(|e| Report::new(ConvertError::from(e)))?;
    let meshes = convert_meshes(source, &names, options)
        .map_err(|e| Report::new(ConvertError::from(e)))?;
    let materials =
        convert_materials(source).map_err(|e| Report::new(ConvertError::from(e)))?;
    let material_table = material_table(&meshes, &names);

    let default_material = Material {
        passes: materials.passes,
    };
    let mesh_materials = vec![MeshMaterialSet {
        name: RARE_MATERIAL_SET.to_string(),
        materials: vec![default_material.clone()],
    }];

    let ConvertedMeshes {
        mesh,
        buffers,
        palettes,
    } = meshes;

    Ok(ConversionOutput {
        bundle: ModelBundle {
            species_id: names.species_id,
            name: names.result,
            config,
            model,
            material_table,
            meshes: vec![mesh],
            mesh_buffers: vec![buffers],
            default_materials: vec![default_material],
            mesh_materials,
            skeleton,
        },
        diagnostics: Diagnostics {
            dropped_parameters: materials.dropped,
            palettes,
        },
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::BoundingBox;
    use crate::models::gfb::{
        GfbBone, GfbBoneType, GfbFlag, GfbMaterial, GfbMesh, GfbPolygon, GfbShape,
        LegacyAttributeType, LegacyDataType, LegacyVertexAttribute,
    };

    /// A one-triangle model for species 25 with a two-node skeleton.
    pub(crate) fn sample_model() -> GfbModel {
        let mut vertices = Vec::new();
        for (position, uv) in [
            ([0.0f32, 0.0, 0.0], [0.0f32, 0.0]),
            ([100.0, 0.0, 0.0], [1.0, 0.0]),
            ([0.0, 100.0, 0.0], [0.0, 1.0]),
        ] {
            vertices.extend(position.iter().flat_map(|c| c.to_le_bytes()));
            vertices.extend(uv.iter().flat_map(|c| c.to_le_bytes()));
        }

        GfbModel {
            config: GfbConfig {
                species_id: 25,
                size_index: 1,
                inframe_vertical_rot_y_origin: 50.0,
                inframe_bottom_y_offset: -10.0,
                inframe_center_y_offset: 25.0,
                inframe_left_rotation: [0.0, 30.0, 0.0],
                inframe_right_rotation: [0.0, -30.0, 0.0],
            },
            texture_files: vec!["pm0025_00_body_col".to_string()],
            materials: vec![GfbMaterial {
                name: "body".to_string(),
                flags: vec![GfbFlag {
                    name: "FogEnable".to_string(),
                    enable: true,
                }],
                ..Default::default()
            }],
            meshes: vec![GfbMesh {
                shape_id: 0,
                bone_id: 1,
                bounds: BoundingBox {
                    min: [0.0; 3],
                    max: [100.0, 100.0, 0.0],
                },
                sort_priority: 0,
            }],
            shapes: vec![GfbShape {
                vertices,
                attributes: vec![
                    LegacyVertexAttribute {
                        attribute_type: LegacyAttributeType::Position,
                        data_type: LegacyDataType::Float,
                        count: 3,
                    },
                    LegacyVertexAttribute {
                        attribute_type: LegacyAttributeType::Texcoord0,
                        data_type: LegacyDataType::Float,
                        count: 2,
                    },
                ],
                polygons: vec![GfbPolygon {
                    material_id: 0,
                    indices: vec![0, 1, 2],
                }],
            }],
            bones: vec![
                GfbBone {
                    name: "Origin".to_string(),
                    bone_type: GfbBoneType::NoSkinning,
                    parent_idx: -1,
                    ..Default::default()
                },
                GfbBone {
                    name: "pm0025_00_BodySkin".to_string(),
                    bone_type: GfbBoneType::HasSkinning,
                    parent_idx: 0,
                    is_visible: true,
                    ..Default::default()
                },
            ],
            bounds: BoundingBox {
                min: [-50.0, 0.0, -50.0],
                max: [50.0, 200.0, 50.0],
            },
        }
    }

    #[test]
    fn test_options_defaults() {
        let options = ConversionOptions::default();
        assert_eq!(options.unit_scale(), 100.0);
        assert_eq!(options.reserved_root_nodes(), 2);
        assert!(options.parent_policy().is_preserve());
        assert_eq!(options.result_name(), None);
    }

    #[test]
    fn test_model_names() {
        let names = ModelNames::for_species(25);
        assert_eq!(names.source, "pm0025_00");
        assert_eq!(names.result, "pm0025_00_00");

        let options = ConversionOptions::builder()
            .result_name("pikachu".to_string())
            .build();
        let names = ModelNames::resolve(25, &options);
        assert_eq!(names.source, "pm0025_00");
        assert_eq!(names.result, "pikachu");
    }

    #[test]
    fn test_convert_sample() {
        let out = convert(&sample_model(), &ConversionOptions::default()).unwrap();
        let bundle = &out.bundle;

        assert_eq!(bundle.name, "pm0025_00_00");
        assert_eq!(bundle.species_id, 25);

        assert_eq!(bundle.config.field_11_y_offset, -0.07);
        assert_eq!(bundle.config.size_index, 1);
        assert_eq!(bundle.config.inframe_vertical_rot_y_origin, 0.5);
        assert_eq!(bundle.config.inframe_bottom_y_offset, -0.1);
        assert_eq!(bundle.config.inframe_left_rotation, [0.0, 30.0, 0.0]);

        assert_eq!(bundle.model.meshes, vec!["pm0025_00_00.trmsh".to_string()]);
        assert_eq!(bundle.model.skeleton, "pm0025_00_00.trskl");
        assert_eq!(bundle.model.lods[0].lod_type, "Custom");
        assert_eq!(bundle.model.bounds.max, [0.5, 2.0, 0.5]);
        assert_eq!(bundle.model.sphere.center, [0.0, 1.0, 0.0]);

        assert_eq!(bundle.skeleton.nodes.len(), 2);
        assert_eq!(bundle.skeleton.rig_offset, -1);

        assert_eq!(bundle.meshes[0].shapes[0].layout.stride, 20);
        assert_eq!(bundle.mesh_buffers[0].buffers[0].vertex_buffer.len(), 60);

        assert_eq!(bundle.default_materials[0].passes.len(), 1);
        assert_eq!(bundle.mesh_materials[0].name, "rare");
        assert_eq!(
            bundle.mesh_materials[0].materials[0],
            bundle.default_materials[0]
        );

        let table = &bundle.material_table.materials[0];
        assert_eq!(table.name, "rare");
        assert_eq!(table.file_names, vec!["pm0025_00_00_rare.trmtr".to_string()]);
        assert_eq!(table.switches.len(), 1);
        assert_eq!(table.switches[0].name, "pm0025_00_00_body_mesh_shape");
        assert_eq!(table.switches[0].flags, 1);

        assert_eq!(out.diagnostics.dropped_parameters.len(), 1);
        assert_eq!(out.diagnostics.dropped_parameters[0].name, "FogEnable");
        assert_eq!(out.diagnostics.palettes.len(), 1);
    }

    #[test]
    fn test_unrigged_aborts() {
        let mut model = sample_model();
        model.bones[1].is_visible = false;
        let err = convert(&model, &ConversionOptions::default()).unwrap_err();
        assert!(matches!(
            err.current_context(),
            ConvertError::Skeleton(SkeletonError::NotRigged)
        ));
    }

    #[test]
    fn test_non_positive_unit_scale_is_rejected() {
        for unit_scale in [0.0, -100.0, f32::NAN] {
            let options = ConversionOptions::builder().unit_scale(unit_scale).build();
            let err = convert(&sample_model(), &options).unwrap_err();
            assert!(matches!(
                err.current_context(),
                ConvertError::InvalidUnitScale { .. }
            ));
        }
    }

    #[test]
    fn test_bad_material_reference_aborts() {
        let mut model = sample_model();
        model.shapes[0].polygons[0].material_id = 2;
        let err = convert(&model, &ConversionOptions::default()).unwrap_err();
        assert!(matches!(
            err.current_context(),
            ConvertError::Mesh(MeshError::MaterialOutOfRange { .. })
        ));
    }
}
