use crate::config::IndexKind;
use crate::error::{Error, Result};
use crate::model::{ModelState, VectorModel};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub created_at: String,
    pub num_recipes: usize,
    pub num_features: usize,
    pub index_kind: IndexKind,
}

pub struct ModelPaths {
    pub root: PathBuf,
}

impl ModelPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn model(&self) -> PathBuf { self.root.join("model.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: u32,
    state: &'a ModelState,
}

#[derive(Deserialize)]
struct OwnedEnvelope {
    version: u32,
    state: ModelState,
}

/// Serialize a model to any byte sink.
pub fn write_model<W: Write>(writer: W, model: &VectorModel) -> Result<()> {
    let state = model.to_state();
    bincode::serialize_into(writer, &Envelope { version: FORMAT_VERSION, state: &state })?;
    Ok(())
}

/// Read a model written by [`write_model`], validating its internal consistency.
pub fn read_model<R: Read>(reader: R) -> Result<VectorModel> {
    let envelope: OwnedEnvelope = bincode::deserialize_from(reader)?;
    if envelope.version != FORMAT_VERSION {
        return Err(Error::Persistence(format!(
            "unsupported model version {} (expected {FORMAT_VERSION})",
            envelope.version
        )));
    }
    VectorModel::from_state(envelope.state)
}

pub fn save_meta(paths: &ModelPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &ModelPaths) -> Result<MetaFile> {
    let f = File::open(paths.meta())?;
    Ok(serde_json::from_reader(BufReader::new(f))?)
}

/// Write `model.bin` and `meta.json` under `paths.root`.
pub fn save_model(paths: &ModelPaths, model: &VectorModel) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut writer = BufWriter::new(File::create(paths.model())?);
    write_model(&mut writer, model)?;
    writer.flush()?;

    let stats = model.stats();
    let meta = MetaFile {
        version: FORMAT_VERSION,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        num_recipes: stats.num_recipes,
        num_features: stats.num_features,
        index_kind: model.index().kind(),
    };
    save_meta(paths, &meta)?;
    tracing::info!(path = %paths.root.display(), num_recipes = meta.num_recipes, "model saved");
    Ok(())
}

/// Load `model.bin`, rejecting it when it disagrees with its `meta.json`.
pub fn load_model(paths: &ModelPaths) -> Result<VectorModel> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::Persistence(format!(
            "unsupported model version {} (expected {FORMAT_VERSION})",
            meta.version
        )));
    }
    let f = File::open(paths.model())?;
    let model = read_model(BufReader::new(f))?;
    let stats = model.stats();
    if stats.num_recipes != meta.num_recipes
        || stats.num_features != meta.num_features
        || model.index().kind() != meta.index_kind
    {
        return Err(Error::Persistence(format!(
            "model.bin ({} recipes, {} features, {:?}) does not match meta.json ({} recipes, {} features, {:?})",
            stats.num_recipes,
            stats.num_features,
            model.index().kind(),
            meta.num_recipes,
            meta.num_features,
            meta.index_kind
        )));
    }
    tracing::info!(path = %paths.root.display(), num_recipes = model.index().len(), "model loaded");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, IndexConfig, VectorizerConfig};
    use crate::corpus::Corpus;
    use crate::vectorizer::VectorizerState;
    use crate::{Recipe, RecipeId};

    // Same field order as the real types, so bincode lays them out identically.
    #[derive(Serialize)]
    struct RawRow {
        indices: Vec<u32>,
        values: Vec<f32>,
    }

    #[derive(Serialize)]
    struct RawIndex {
        ids: Vec<RecipeId>,
        rows: Vec<RawRow>,
        dims: usize,
        kind: IndexKind,
    }

    #[derive(Serialize)]
    struct RawModel {
        vectorizer: VectorizerState,
        index: RawIndex,
    }

    #[derive(Serialize)]
    struct RawEnvelope {
        version: u32,
        state: RawModel,
    }

    fn trained(kind: IndexKind) -> VectorModel {
        let recipes = vec![
            Recipe::new(1, "Tomato Pasta").with_ingredients(["tomato", "pasta"]),
            Recipe::new(2, "Garlic Bread").with_ingredients(["garlic", "bread"]),
        ];
        let corpus = Corpus::new(recipes, 1).unwrap();
        let mut config = EngineConfig::default();
        config.vectorizer = VectorizerConfig { ngram_max: 1, ..Default::default() };
        config.index = IndexConfig { accelerate_above: 0, force: Some(kind) };
        VectorModel::train(&corpus, &config).unwrap().unwrap()
    }

    /// Re-encode `model` with its rows passed through `edit`.
    fn tampered(model: &VectorModel, edit: impl FnOnce(&mut Vec<RawRow>)) -> Vec<u8> {
        let state = model.to_state();
        let mut rows: Vec<RawRow> = state
            .index
            .rows
            .iter()
            .map(|r| RawRow { indices: r.indices().to_vec(), values: r.values().to_vec() })
            .collect();
        edit(&mut rows);
        let raw = RawEnvelope {
            version: FORMAT_VERSION,
            state: RawModel {
                vectorizer: state.vectorizer,
                index: RawIndex { ids: state.index.ids, rows, dims: state.index.dims, kind: state.index.kind },
            },
        };
        bincode::serialize(&raw).unwrap()
    }

    #[test]
    fn rejects_garbage() {
        let bytes = b"not a model".to_vec();
        assert!(matches!(read_model(&bytes[..]), Err(Error::Persistence(_))));
    }

    #[test]
    fn untouched_encoding_loads() {
        let model = trained(IndexKind::Postings);
        let back = read_model(&tampered(&model, |_| {})[..]).unwrap();
        assert_eq!(back.to_state().index.rows, model.to_state().index.rows);
        assert_eq!(back.index().kind(), IndexKind::Postings);
    }

    #[test]
    fn corrupted_rows_are_rejected() {
        for kind in [IndexKind::Exact, IndexKind::Postings] {
            let model = trained(kind);
            let cases: Vec<Box<dyn FnOnce(&mut Vec<RawRow>)>> = vec![
                Box::new(|rows| {
                    rows[0].values.pop();
                }),
                Box::new(|rows| rows[0].indices.reverse()),
                Box::new(|rows| rows[1].indices[0] = 99),
                Box::new(|rows| rows[1].values[0] = f32::NAN),
            ];
            for edit in cases {
                let bytes = tampered(&model, edit);
                assert!(matches!(read_model(&bytes[..]), Err(Error::Persistence(_))), "{kind:?}");
            }
        }
    }

    #[test]
    fn reweighted_rows_rescore_both_scorers_alike() {
        let model = trained(IndexKind::Postings);
        let bytes = tampered(&model, |rows| rows[0].values.iter_mut().for_each(|v| *v = 0.1));
        let back = read_model(&bytes[..]).unwrap();
        let q = back.query_vector(&["tomato", "pasta"]);
        let fast = back.nearest(&q, 2);
        let slow = back.index().query_nearest_with(&back.index().exact(), &q, 2);
        assert_eq!(fast, slow);
    }

    #[test]
    fn meta_must_agree_with_model() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::new(dir.path());
        save_model(&paths, &trained(IndexKind::Exact)).unwrap();
        assert!(load_model(&paths).is_ok());

        let mut meta = load_meta(&paths).unwrap();
        meta.num_recipes = 5;
        save_meta(&paths, &meta).unwrap();
        assert!(matches!(load_model(&paths), Err(Error::Persistence(_))));

        meta.num_recipes = 2;
        meta.index_kind = IndexKind::Postings;
        save_meta(&paths, &meta).unwrap();
        assert!(matches!(load_model(&paths), Err(Error::Persistence(_))));

        std::fs::remove_file(paths.meta()).unwrap();
        assert!(matches!(load_model(&paths), Err(Error::Persistence(_))));
    }

    #[test]
    fn missing_directory_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::new(dir.path().join("nope"));
        assert!(matches!(load_model(&paths), Err(Error::Persistence(_))));
    }
}
