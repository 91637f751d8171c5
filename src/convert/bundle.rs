//! Laying out a [`ModelBundle`] as individual files.

use std::convert::Infallible;

use crate::models::trinity::{
    Material, Mesh, MeshBufferTable, ModelBundle, MultiMaterialTable, PokeConfig, Skeleton,
    TrModel,
};

/// Material tables with this name reuse the default material files.
const NORMAL_MATERIAL_SET: &str = "normal";

/// One file of a converted bundle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BundlePart<'a> {
    Config(&'a PokeConfig),
    MaterialTable(&'a MultiMaterialTable),
    Model(&'a TrModel),
    Skeleton(&'a Skeleton),
    Material(&'a Material),
    Mesh(&'a Mesh),
    MeshBuffers(&'a MeshBufferTable),
}

impl BundlePart<'_> {
    /// File extension of this part, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            BundlePart::Config(_) => "trpokecfg",
            BundlePart::MaterialTable(_) => "trmmt",
            BundlePart::Model(_) => "trmdl",
            BundlePart::Skeleton(_) => "trskl",
            BundlePart::Material(_) => "trmtr",
            BundlePart::Mesh(_) => "trmsh",
            BundlePart::MeshBuffers(_) => "trmbf",
        }
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            BundlePart::Config(part) => serde_json::to_vec_pretty(part),
            BundlePart::MaterialTable(part) => serde_json::to_vec_pretty(part),
            BundlePart::Model(part) => serde_json::to_vec_pretty(part),
            BundlePart::Skeleton(part) => serde_json::to_vec_pretty(part),
            BundlePart::Material(part) => serde_json::to_vec_pretty(part),
            BundlePart::Mesh(part) => serde_json::to_vec_pretty(part),
            BundlePart::MeshBuffers(part) => serde_json::to_vec_pretty(part),
        }
    }
}

/// Destination for the files of a bundle, addressed by logical path.
pub trait BundleWriter {
    type Error;

    fn write(&mut self, path: &str, part: BundlePart<'_>) -> Result<(), Self::Error>;
}

pub struct BundleWriterWithCallback<F> {
    callback: F,
}

impl<F> BundleWriterWithCallback<F>
where
    F: FnMut(&str, BundlePart<'_>),
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> BundleWriter for BundleWriterWithCallback<F>
where
    F: FnMut(&str, BundlePart<'_>),
{
    type Error = Infallible;

    fn write(&mut self, path: &str, part: BundlePart<'_>) -> Result<(), Self::Error> {
        (self.callback)(path, part);
        Ok(())
    }
}

impl ModelBundle {
    /// Directory holding the bundle, e.g. `bin/pokemon/pm0025/pm0025_00_00/`.
    pub fn base_path(&self) -> String {
        format!("bin/pokemon/pm{:04}/{}/", self.species_id, self.name)
    }

    pub fn model_path(&self) -> String {
        format!("{}mdl/", self.base_path())
    }

    /// Every file of the bundle with its logical path, in write order.
    pub fn parts(&self) -> Vec<(String, BundlePart<'_>)> {
        let base = self.base_path();
        let mdl = self.model_path();
        let name = &self.name;

        let mut parts = vec![
            (
                format!("{base}{name}.trpokecfg"),
                BundlePart::Config(&self.config),
            ),
            (
                format!("{mdl}{name}.trmmt"),
                BundlePart::MaterialTable(&self.material_table),
            ),
            (format!("{mdl}{name}.trmdl"), BundlePart::Model(&self.model)),
            (
                format!("{mdl}{}", self.model.skeleton),
                BundlePart::Skeleton(&self.skeleton),
            ),
            (
                format!("{mdl}{name}.trpokecfg"),
                BundlePart::Config(&self.config),
            ),
        ];

        parts.extend(
            self.model
                .materials
                .iter()
                .zip(&self.default_materials)
                .map(|(file, material)| (format!("{mdl}{file}"), BundlePart::Material(material))),
        );

        for (set, table) in self.mesh_materials.iter().zip(&self.material_table.materials) {
            if table.name == NORMAL_MATERIAL_SET {
                continue;
            }
            parts.extend(
                table
                    .file_names
                    .iter()
                    .zip(&set.materials)
                    .map(|(file, material)| {
                        (format!("{mdl}{file}"), BundlePart::Material(material))
                    }),
            );
        }

        parts.extend(
            self.model
                .meshes
                .iter()
                .zip(&self.meshes)
                .map(|(file, mesh)| (format!("{mdl}{file}"), BundlePart::Mesh(mesh))),
        );
        parts.extend(
            self.meshes
                .iter()
                .zip(&self.mesh_buffers)
                .map(|(mesh, buffers)| {
                    (
                        format!("{mdl}{}", mesh.buffer_file_name),
                        BundlePart::MeshBuffers(buffers),
                    )
                }),
        );

        parts
    }

    /// Hand every part to `writer`. Returns the number of parts written.
    pub fn write_to<W: BundleWriter>(&self, writer: &mut W) -> Result<usize, W::Error> {
        let parts = self.parts();
        for (path, part) in &parts {
            writer.write(path, *part)?;
        }
        Ok(parts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::tests::sample_model;
    use crate::convert::{ConversionOptions, convert};
    use crate::models::trinity::MaterialTable;

    fn sample_bundle() -> ModelBundle {
        convert(&sample_model(), &ConversionOptions::default())
            .unwrap()
            .bundle
    }

    #[test]
    fn test_part_paths() {
        let bundle = sample_bundle();
        let paths: Vec<_> = bundle
            .parts()
            .into_iter()
            .map(|(path, part)| (path, part.extension()))
            .collect();

        let base = "bin/pokemon/pm0025/pm0025_00_00/";
        let mdl = "bin/pokemon/pm0025/pm0025_00_00/mdl/";
        let expected = vec![
            (format!("{base}pm0025_00_00.trpokecfg"), "trpokecfg"),
            (format!("{mdl}pm0025_00_00.trmmt"), "trmmt"),
            (format!("{mdl}pm0025_00_00.trmdl"), "trmdl"),
            (format!("{mdl}pm0025_00_00.trskl"), "trskl"),
            (format!("{mdl}pm0025_00_00.trpokecfg"), "trpokecfg"),
            (format!("{mdl}pm0025_00_00.trmtr"), "trmtr"),
            (format!("{mdl}pm0025_00_00_rare.trmtr"), "trmtr"),
            (format!("{mdl}pm0025_00_00.trmsh"), "trmsh"),
            (format!("{mdl}pm0025_00_00.trmbf"), "trmbf"),
        ];
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_normal_set_is_skipped() {
        let mut bundle = sample_bundle();
        bundle.material_table.materials = vec![MaterialTable {
            name: "normal".to_string(),
            file_names: vec!["pm0025_00_00.trmtr".to_string()],
            switches: Vec::new(),
        }];
        let materials = bundle
            .parts()
            .iter()
            .filter(|(_, part)| matches!(part, BundlePart::Material(_)))
            .count();
        assert_eq!(materials, 1);
    }

    #[test]
    fn test_write_to_callback() {
        let bundle = sample_bundle();
        let mut seen = Vec::new();
        let mut writer = BundleWriterWithCallback::new(|path: &str, part: BundlePart<'_>| {
            seen.push((path.to_string(), part.extension()));
        });
        let written = bundle.write_to(&mut writer).unwrap();
        assert_eq!(written, 9);
        assert_eq!(seen.len(), 9);
        assert!(seen[3].0.ends_with("mdl/pm0025_00_00.trskl"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_part_json() {
        let bundle = sample_bundle();
        let json = BundlePart::Model(&bundle.model).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["skeleton"], "pm0025_00_00.trskl");
        assert_eq!(value["lods"][0]["lod_type"], "Custom");
    }
}
