//! Batch compilation manifests.
//!
//! A manifest is a JSON file describing a set of shaders to compile in one go, used by the CLI
//! front. Example:
//!
//! ```json
//! {
//!   "shaders": [
//!     { "source": "shaders/quad.vert", "stage": "vertex", "entry_point": "vert" },
//!     { "source": "shaders/quad.frag", "stage": "fragment", "target": "ir" }
//!   ]
//! }
//! ```

use serde_derive::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::stage::ShaderStage;

/// What a compilation job should produce.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
  /// Binary IR (SPIR-V).
  Ir,
  /// Native shader source (MSL).
  Native
}

impl Target {
  /// File extension appended to the source path when no output path is given.
  pub fn extension(self) -> &'static str {
    match self {
      Target::Ir => "spv",
      Target::Native => "metal"
    }
  }
}

impl Default for Target {
  fn default() -> Self {
    Target::Native
  }
}

impl std::str::FromStr for Target {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ir" | "spirv" => Ok(Target::Ir),
      "native" | "msl" | "metal" => Ok(Target::Native),
      _ => Err(format!("unknown target: {}", s))
    }
  }
}

/// A single shader compilation job.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShaderJob {
  /// Path to the GLSL source.
  pub source: PathBuf,
  /// Stage the shader targets.
  pub stage: ShaderStage,
  /// Entry point the output should expose; the source entry function is always `main`.
  #[serde(default)]
  pub entry_point: Option<String>,
  /// What to produce.
  #[serde(default)]
  pub target: Target,
  /// Where to write the result; defaults to the source path with the target extension
  /// appended (e.g. `quad.vert` → `quad.vert.metal`).
  #[serde(default)]
  pub output: Option<PathBuf>
}

impl ShaderJob {
  /// Output path of the job.
  pub fn output_path(&self) -> PathBuf {
    match self.output {
      Some(ref path) => path.clone(),
      None => {
        let mut ext = self.source.extension().map_or(String::new(), |e| {
          let mut e = e.to_string_lossy().into_owned();
          e.push('.');
          e
        });

        ext.push_str(self.target.extension());
        self.source.with_extension(ext)
      }
    }
  }
}

/// A set of shader compilation jobs.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Manifest {
  pub shaders: Vec<ShaderJob>
}

impl Manifest {
  /// Load a manifest from a JSON file.
  pub fn load<P>(path: P) -> Result<Self, ManifestError> where P: AsRef<Path> {
    let file = File::open(path.as_ref()).map_err(ManifestError::IoError)?;
    serde_json::from_reader(file).map_err(ManifestError::JsonError)
  }
}

/// Errors that can be risen while loading a manifest.
#[derive(Debug)]
pub enum ManifestError {
  IoError(io::Error),
  JsonError(serde_json::Error)
}

impl std::fmt::Display for ManifestError {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
    match *self {
      ManifestError::IoError(ref e) => write!(f, "cannot read manifest: {}", e),
      ManifestError::JsonError(ref e) => write!(f, "cannot parse manifest: {}", e)
    }
  }
}

impl std::error::Error for ManifestError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match *self {
      ManifestError::IoError(ref e) => Some(e),
      ManifestError::JsonError(ref e) => Some(e)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserialization() {
    let json = r#"{
      "shaders": [
        { "source": "quad.vert", "stage": "vertex", "entry_point": "vert" },
        { "source": "quad.frag", "stage": "fragment", "target": "ir" }
      ]
    }"#;

    let manifest: Manifest = serde_json::from_str(json).unwrap();

    assert_eq!(manifest.shaders.len(), 2);
    assert_eq!(manifest.shaders[0].stage, ShaderStage::Vertex);
    assert_eq!(manifest.shaders[0].entry_point.as_deref(), Some("vert"));
    assert_eq!(manifest.shaders[0].target, Target::Native);
    assert_eq!(manifest.shaders[1].stage, ShaderStage::Fragment);
    assert_eq!(manifest.shaders[1].target, Target::Ir);
  }

  #[test]
  fn default_output_paths() {
    let job = ShaderJob {
      source: PathBuf::from("shaders/quad.vert"),
      stage: ShaderStage::Vertex,
      entry_point: None,
      target: Target::Native,
      output: None
    };

    assert_eq!(job.output_path(), PathBuf::from("shaders/quad.vert.metal"));

    let job = ShaderJob { target: Target::Ir, ..job };
    assert_eq!(job.output_path(), PathBuf::from("shaders/quad.vert.spv"));
  }
}
