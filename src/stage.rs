//! Shader stages and their mappings to the toolchain vocabulary.

use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline stage a shader targets.
///
/// The discriminants are part of the wire contract with embedding engines; only the two values
/// below are accepted.
#[repr(i32)]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderStage {
  Vertex = 1,
  Fragment = 2
}

impl ShaderStage {
  /// Interpret a raw stage value coming from an embedding engine.
  pub fn from_raw(raw: i32) -> Option<Self> {
    match raw {
      1 => Some(ShaderStage::Vertex),
      2 => Some(ShaderStage::Fragment),
      _ => None
    }
  }

  /// Map to the toolchain's stage vocabulary.
  ///
  /// The same mapping serves the front-end (source language stage) and the back-end (execution
  /// model the entry point is selected for).
  pub fn to_naga(self) -> naga::ShaderStage {
    match self {
      ShaderStage::Vertex => naga::ShaderStage::Vertex,
      ShaderStage::Fragment => naga::ShaderStage::Fragment
    }
  }
}

impl fmt::Display for ShaderStage {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ShaderStage::Vertex => f.write_str("vertex"),
      ShaderStage::Fragment => f.write_str("fragment")
    }
  }
}

impl FromStr for ShaderStage {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "vertex" | "vert" => Ok(ShaderStage::Vertex),
      "fragment" | "frag" => Ok(ShaderStage::Fragment),
      _ => Err(format!("unknown shader stage: {}", s))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn raw_values() {
    assert_eq!(ShaderStage::from_raw(1), Some(ShaderStage::Vertex));
    assert_eq!(ShaderStage::from_raw(2), Some(ShaderStage::Fragment));
    assert_eq!(ShaderStage::from_raw(0), None);
    assert_eq!(ShaderStage::from_raw(3), None);
    assert_eq!(ShaderStage::from_raw(-1), None);
  }

  #[test]
  fn parsing() {
    assert_eq!("vert".parse(), Ok(ShaderStage::Vertex));
    assert_eq!("fragment".parse(), Ok(ShaderStage::Fragment));
    assert!("geometry".parse::<ShaderStage>().is_err());
  }

  #[test]
  fn naga_mapping() {
    assert_eq!(ShaderStage::Vertex.to_naga(), naga::ShaderStage::Vertex);
    assert_eq!(ShaderStage::Fragment.to_naga(), naga::ShaderStage::Fragment);
  }
}
