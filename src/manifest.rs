//! JSON description of a batch of composite images.
//!
//! ```json
//! {
//!   "outputs": [
//!     {
//!       "output": "out/a_smile.png",
//!       "canvas_size": [800, 1200],
//!       "layers": [
//!         { "path": "body.png", "offset": [120, 40] },
//!         { "path": "blush.png", "offset": [300, 260], "blend": "multiply" },
//!         { "path": "glow.png", "offset": [0, 0], "blend": 10 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Relative paths are resolved against the directory containing the manifest.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use thiserror::Error;

use crate::blend::BlendMode;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("couldn't read manifest {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown blend mode code {0}")]
    UnknownBlendMode(i64),
    #[error("output {0:?} is listed more than once")]
    DuplicateOutput(PathBuf),
}

/// A parsed manifest: every output image that should be produced
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub outputs: Vec<OutputSpec>,
}

/// One output image and the layers (bottom to top) that make it up
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub output: PathBuf,
    pub canvas_size: Option<(u32, u32)>,
    /// If `true`, offsets are rebased so that the first layer sits at `(0, 0)`
    pub relative_to_first: bool,
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub path: PathBuf,
    pub offset: (i32, i32),
    pub blend_mode: BlendMode,
}

impl Manifest {
    /// Reads and parses a manifest file, resolving relative paths against its parent directory
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_owned(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&json, base_dir)
    }

    /// Parses a manifest, resolving relative paths against `base_dir`
    pub fn parse(json: &str, base_dir: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_str(json)?;
        let outputs = raw
            .outputs
            .into_iter()
            .map(|out| out.resolve(base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        // Outputs are written concurrently, so two jobs must never share a file
        let mut seen = HashSet::new();
        if let Some(dup) = outputs.iter().find(|out| !seen.insert(&out.output)) {
            return Err(ManifestError::DuplicateOutput(dup.output.clone()));
        }
        Ok(Self { outputs })
    }
}

impl FromStr for Manifest {
    type Err = ManifestError;

    /// Parses a manifest whose relative paths are relative to the working directory
    fn from_str(json: &str) -> Result<Self, Self::Err> {
        Self::parse(json, Path::new(""))
    }
}

/////////////////
// SERDE TYPES //
/////////////////

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    outputs: Vec<RawOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutput {
    output: PathBuf,
    #[serde(default)]
    canvas_size: Option<(u32, u32)>,
    #[serde(default)]
    relative_to_first: bool,
    layers: Vec<RawLayer>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLayer {
    path: PathBuf,
    #[serde(default)]
    offset: (i32, i32),
    #[serde(default)]
    blend: Option<RawBlend>,
}

/// Blend modes can be given either by name or by the engine's integer code
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBlend {
    Named(BlendMode),
    Code(i64),
}

impl RawOutput {
    fn resolve(self, base_dir: &Path) -> Result<OutputSpec, ManifestError> {
        let layers = self
            .layers
            .into_iter()
            .map(|layer| layer.resolve(base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OutputSpec {
            output: base_dir.join(self.output),
            canvas_size: self.canvas_size,
            relative_to_first: self.relative_to_first,
            layers,
        })
    }
}

impl RawLayer {
    fn resolve(self, base_dir: &Path) -> Result<LayerSpec, ManifestError> {
        let blend_mode = match self.blend {
            None => BlendMode::Normal,
            Some(RawBlend::Named(mode)) => mode,
            Some(RawBlend::Code(code)) => {
                BlendMode::from_code(code).ok_or(ManifestError::UnknownBlendMode(code))?
            }
        };
        Ok(LayerSpec {
            path: base_dir.join(self.path),
            offset: self.offset,
            blend_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"{
        "outputs": [
            {
                "output": "out/a.png",
                "canvas_size": [800, 1200],
                "layers": [
                    { "path": "body.png", "offset": [120, 40] },
                    { "path": "/abs/blush.png", "offset": [-3, 260], "blend": "multiply" },
                    { "path": "glow.png", "blend": 10 }
                ]
            },
            {
                "output": "b.png",
                "relative_to_first": true,
                "layers": [{ "path": "x.png", "offset": [1, 2] }]
            }
        ]
    }"#;

    #[test]
    fn parses_example() {
        let manifest = Manifest::parse(EXAMPLE, Path::new("assets")).unwrap();
        assert_eq!(manifest.outputs.len(), 2);

        let a = &manifest.outputs[0];
        assert_eq!(a.output, Path::new("assets/out/a.png"));
        assert_eq!(a.canvas_size, Some((800, 1200)));
        assert!(!a.relative_to_first);
        assert_eq!(
            a.layers,
            vec![
                LayerSpec {
                    path: "assets/body.png".into(),
                    offset: (120, 40),
                    blend_mode: BlendMode::Normal,
                },
                LayerSpec {
                    path: "/abs/blush.png".into(),
                    offset: (-3, 260),
                    blend_mode: BlendMode::Multiply,
                },
                LayerSpec {
                    path: "assets/glow.png".into(),
                    offset: (0, 0),
                    blend_mode: BlendMode::Additive,
                },
            ]
        );

        let b = &manifest.outputs[1];
        assert_eq!(b.canvas_size, None);
        assert!(b.relative_to_first);
    }

    #[test]
    fn from_str_uses_working_directory() {
        let manifest: Manifest = r#"{ "outputs": [{ "output": "o.png", "layers": [] }] }"#
            .parse()
            .unwrap();
        assert_eq!(manifest.outputs[0].output, Path::new("o.png"));
        assert!(manifest.outputs[0].layers.is_empty());
    }

    #[test]
    fn unknown_blend_code_is_rejected() {
        let json = r#"{
            "outputs": [{ "output": "o.png", "layers": [{ "path": "a.png", "blend": 4 }] }]
        }"#;
        assert!(matches!(
            json.parse::<Manifest>(),
            Err(ManifestError::UnknownBlendMode(4))
        ));
    }

    #[test]
    fn unknown_blend_name_is_rejected() {
        let json = r#"{
            "outputs": [{ "output": "o.png", "layers": [{ "path": "a.png", "blend": "screen" }] }]
        }"#;
        assert!(matches!(json.parse::<Manifest>(), Err(ManifestError::Json(_))));
    }

    #[test]
    fn duplicate_outputs_are_rejected() {
        let json = r#"{
            "outputs": [
                { "output": "same.png", "layers": [{ "path": "a.png" }] },
                { "output": "other.png", "layers": [{ "path": "b.png" }] },
                { "output": "same.png", "layers": [{ "path": "c.png" }] }
            ]
        }"#;
        let err = Manifest::parse(json, Path::new("dir")).unwrap_err();
        assert!(matches!(
            &err,
            ManifestError::DuplicateOutput(path) if path == Path::new("dir/same.png")
        ));
        assert!(err.to_string().contains("same.png"));
    }

    #[test]
    fn missing_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::from_path(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn from_path_resolves_against_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(
            &path,
            r#"{ "outputs": [{ "output": "o.png", "layers": [{ "path": "l.png" }] }] }"#,
        )
        .unwrap();
        let manifest = Manifest::from_path(&path).unwrap();
        assert_eq!(manifest.outputs[0].output, dir.path().join("o.png"));
        assert_eq!(manifest.outputs[0].layers[0].path, dir.path().join("l.png"));
    }
}
