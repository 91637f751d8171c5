/// Packing and unpacking of mini containers
pub mod mini;
/// Shared winnow helpers
pub mod parser_utils;

use std::borrow::Cow;

use crate::data::mini::Mini;
use crate::error::{ErrorKind, IResult};
#[cfg(feature = "json")]
use crate::models::gfb::{GfbConfig, GfbModel};

/// Resolves the raw bytes of a file by its logical path inside a game-data bundle.
pub trait DataFileLoader {
    fn get(&self, path: &str) -> Result<Cow<'static, [u8]>, ErrorKind>;
}

pub struct DataFileWithCallback<F> {
    callback: F,
}

impl<F> DataFileWithCallback<F>
where
    F: Fn(&str) -> Result<Cow<'static, [u8]>, ErrorKind>,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> DataFileLoader for DataFileWithCallback<F>
where
    F: Fn(&str) -> Result<Cow<'static, [u8]>, ErrorKind>,
{
    fn get(&self, path: &str) -> Result<Cow<'static, [u8]>, ErrorKind> {
        (self.callback)(path)
    }
}

/// Logical paths of a legacy model's files, e.g. for `pm0025_00`:
/// `bin/pokemon/pm0025_00/pm0025_00.gfbpokecfg` and
/// `bin/pokemon/pm0025_00/mdl/pm0025_00.gfbmdl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub config: String,
    pub model: String,
    pub rare_model: String,
}

impl SourcePaths {
    pub fn new(name: &str) -> Self {
        let base = format!("bin/pokemon/{name}/");
        Self {
            config: format!("{base}{name}.gfbpokecfg"),
            model: format!("{base}mdl/{name}.gfbmdl"),
            rare_model: format!("{base}mdl/{name}_rare.gfbmdl"),
        }
    }
}

/// Fetch a mini container by logical path and unpack it, sniffing its identifier.
pub fn load_mini<L: DataFileLoader + ?Sized>(loader: &L, path: &str) -> IResult<Mini> {
    let data = loader.get(path)?;
    Ok(Mini::parse(&data)?)
}

/// Fetch the legacy model `name` through `loader` and deserialize it.
///
/// Both the model and its config are expected in their JSON form. The config
/// file replaces whatever config the model file carries.
#[cfg(feature = "json")]
pub fn load_source_model<L: DataFileLoader + ?Sized>(loader: &L, name: &str) -> IResult<GfbModel> {
    let paths = SourcePaths::new(name);

    let model_bytes = loader.get(&paths.model)?;
    let mut model: GfbModel = serde_json::from_slice(&model_bytes)?;

    let config_bytes = loader.get(&paths.config)?;
    model.config = serde_json::from_slice::<GfbConfig>(&config_bytes)?;

    tracing::debug!(
        "loaded {name}: {} meshes, {} bones, {} materials",
        model.meshes.len(),
        model.bones.len(),
        model.materials.len()
    );
    Ok(model)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn source_paths() {
        let paths = SourcePaths::new("pm0025_00");
        assert_eq!(paths.config, "bin/pokemon/pm0025_00/pm0025_00.gfbpokecfg");
        assert_eq!(paths.model, "bin/pokemon/pm0025_00/mdl/pm0025_00.gfbmdl");
        assert_eq!(
            paths.rare_model,
            "bin/pokemon/pm0025_00/mdl/pm0025_00_rare.gfbmdl"
        );
    }

    #[test]
    fn callback_loader_reports_missing_files() {
        let loader = DataFileWithCallback::new(|path: &str| {
            Err(ErrorKind::DatafileNotFound {
                path: path.to_string(),
            })
        });
        match loader.get("bin/pokemon/missing") {
            Err(ErrorKind::DatafileNotFound { path }) => assert_eq!(path, "bin/pokemon/missing"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn load_mini_through_loader() {
        let packed = mini::pack(&[vec![1u8, 2, 3, 4]], *b"BL").unwrap();
        let loader = DataFileWithCallback::new(move |_: &str| Ok(Cow::Owned(packed.clone())));
        let container = load_mini(&loader, "bin/archive/test.bin").unwrap();
        assert_eq!(container.identifier, *b"BL");
        assert_eq!(container.entries, vec![vec![1, 2, 3, 4]]);

        let garbage = DataFileWithCallback::new(|_: &str| Ok(Cow::Borrowed(&[0u8; 16][..])));
        let err = load_mini(&garbage, "bin/archive/garbage.bin").unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::Mini {
                err: mini::MiniError::NotRecognized
            }
        ));
    }

    #[cfg(feature = "json")]
    #[test]
    fn load_model_through_loader() {
        let loader = DataFileWithCallback::new(|path: &str| {
            let body: &'static [u8] = if path.ends_with(".gfbmdl") {
                br#"{"texture_files": ["pm0025_00_body_col"], "config": {"species_id": 1}}"#
            } else if path.ends_with(".gfbpokecfg") {
                br#"{"species_id": 25, "size_index": 2}"#
            } else {
                return Err(ErrorKind::DatafileNotFound {
                    path: path.to_string(),
                });
            };
            Ok(Cow::Borrowed(body))
        });

        let model = load_source_model(&loader, "pm0025_00").unwrap();
        assert_eq!(model.config.species_id, 25);
        assert_eq!(model.config.size_index, 2);
        assert_eq!(model.texture_files, vec!["pm0025_00_body_col".to_string()]);
    }

    #[cfg(feature = "json")]
    #[test]
    fn load_model_propagates_missing_file() {
        let loader = DataFileWithCallback::new(|path: &str| {
            Err(ErrorKind::DatafileNotFound {
                path: path.to_string(),
            })
        });
        let err = load_source_model(&loader, "pm0025_00").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DatafileNotFound { .. }));
    }
}
