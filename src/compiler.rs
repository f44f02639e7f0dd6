//! Shader compilation sessions.
//!
//! A [`ShaderCompiler`] is a reusable compilation context. It owns two growable buffers (one
//! for binary IR as SPIR-V words, one for the cross-compiled native MSL source) and the
//! front-end handle used to parse GLSL. Every compilation call overwrites the matching buffer
//! wholesale and reports how many bytes were written; a failed call leaves both buffers in their
//! last-known-good state.
//!
//! A session is meant for exclusive use by one logical caller: all operations take `&mut self`
//! and there is no internal synchronization.

use naga::back::{msl, spv};
use naga::front::glsl;
use naga::front::spv as spv_front;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::str;

use crate::buffer::{BufferError, GrowBuffer};
use crate::logger::{Logger, StdoutLogger};
use crate::stage::ShaderStage;
use crate::{deb, err, info};

/// GLSL dialect the front-end is fixed to when the source does not name one.
const GLSL_VERSION_PREAMBLE: &str = "#version 450";

/// SPIR-V version the IR is generated as.
const SPIRV_VERSION: (u8, u8) = (1, 5);

/// MSL version the cross-compiler emits.
const MSL_VERSION: (u8, u8) = (3, 0);

/// Errors that can be risen while compiling a shader.
///
/// Each variant carries the diagnostic text captured from the toolchain, so callers can branch
/// on the failure kind and still surface the underlying log.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CompileError {
  /// A buffer could not grow to the requested size.
  AllocationError {
    /// Requested capacity, in bytes.
    requested: usize
  },
  /// A raw stage value has no [`ShaderStage`] mapping.
  UnsupportedStageError(i32),
  /// The front-end rejected the GLSL source.
  ParseError(String),
  /// The parsed module failed analysis and validation.
  LinkError(String),
  /// The IR generator rejected the validated module.
  IrEmitError(String),
  /// The cross-compiler rejected the IR or the entry-point / execution-model combination.
  CrossCompileError(String),
  /// The IR byte count is not a whole multiple of 4.
  MisalignedIrError(usize)
}

impl fmt::Display for CompileError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      CompileError::AllocationError { requested } => {
        write!(f, "failed to allocate {} bytes for a compiler buffer", requested)
      }

      CompileError::UnsupportedStageError(raw) => write!(f, "unsupported shader stage value: {}", raw),

      CompileError::ParseError(ref log) => write!(f, "failed to parse shader:\n{}", log),

      CompileError::LinkError(ref log) => write!(f, "failed to link shader module:\n{}", log),

      CompileError::IrEmitError(ref log) => write!(f, "failed to generate IR: {}", log),

      CompileError::CrossCompileError(ref log) => write!(f, "failed to cross-compile IR: {}", log),

      CompileError::MisalignedIrError(len) => {
        write!(f, "IR byte count {} is not a whole multiple of 4", len)
      }
    }
  }
}

impl Error for CompileError {}

impl From<BufferError> for CompileError {
  fn from(e: BufferError) -> Self {
    CompileError::AllocationError { requested: e.requested }
  }
}

/// A shader compilation session.
///
/// Sessions are cheap to keep around and are designed to be reused: the output buffers grow to
/// the largest payload seen so far and are overwritten on each call, amortizing allocations over
/// an indeterminate number of compilations.
pub struct ShaderCompiler<L = StdoutLogger> {
  frontend: glsl::Frontend,
  ir: GrowBuffer,
  native: GrowBuffer,
  logger: L
}

impl ShaderCompiler<StdoutLogger> {
  /// Create a session logging to the standard streams.
  pub fn new() -> Result<Self, CompileError> {
    Self::with_logger(StdoutLogger)
  }
}

impl<L> ShaderCompiler<L> where L: Logger {
  /// Create a session with a custom logger.
  pub fn with_logger(logger: L) -> Result<Self, CompileError> {
    Ok(ShaderCompiler {
      frontend: glsl::Frontend::default(),
      ir: GrowBuffer::new()?,
      native: GrowBuffer::new()?,
      logger
    })
  }

  /// Interpret a raw stage value received from an embedding engine.
  ///
  /// Out-of-range values are logged and reported as [`CompileError::UnsupportedStageError`];
  /// they never abort the session.
  pub fn resolve_stage(&mut self, raw: i32) -> Result<ShaderStage, CompileError> {
    ShaderStage::from_raw(raw).ok_or_else(|| {
      err!(self.logger, "unsupported shader stage value: {}", raw);
      CompileError::UnsupportedStageError(raw)
    })
  }

  /// Compile GLSL source down to binary IR, stored in the session's IR buffer.
  ///
  /// The source is compiled as GLSL 450; sources that do not carry a `#version` directive get
  /// one prepended. The textual entry function is always `main`; when `entry_point` is given,
  /// the entry point is renamed in the *output* IR, the parser still expects `main`.
  ///
  /// On success the returned byte count is a positive multiple of 4 and the IR can be read back
  /// with [`ShaderCompiler::ir_bytes`].
  pub fn compile_glsl_to_ir(
    &mut self,
    source: &str,
    stage: ShaderStage,
    entry_point: Option<&str>
  ) -> Result<usize, CompileError> {
    deb!(self.logger, "compiling {} GLSL source ({} bytes) to IR", stage, source.len());

    let source = with_version_preamble(source);
    let options = glsl::Options::from(stage.to_naga());

    let mut module = self.frontend.parse(&options, &source).map_err(|errors| {
      let log = errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n");
      err!(self.logger, "failed to parse a shader; log:\n{}", log);
      CompileError::ParseError(log)
    })?;

    if let Some(name) = entry_point {
      rename_entry_point(&mut module, stage, name);
      deb!(self.logger, "entry point renamed to « {} »", name);
    }

    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
      .validate(&module)
      .map_err(|e| {
        let log = e.emit_to_string(&source);
        err!(self.logger, "failed to link a shader module; log:\n{}", log);
        CompileError::LinkError(log)
      })?;

    let spv_options = spv::Options {
      lang_version: SPIRV_VERSION,
      flags: spv::WriterFlags::ADJUST_COORDINATE_SPACE,
      ..Default::default()
    };

    let words = spv::write_vec(&module, &info, &spv_options, None).map_err(|e| {
      err!(self.logger, "failed to generate IR: {}", e);
      CompileError::IrEmitError(e.to_string())
    })?;

    let byte_count = self.ir.write_words(&words).map_err(|e| {
      err!(self.logger, "failed to grow the IR buffer: {}", e);
      CompileError::from(e)
    })?;

    info!(self.logger, "generated {} bytes of IR", byte_count);

    Ok(byte_count)
  }

  /// Cross-compile binary IR into native (MSL) shader source, stored in the session's native
  /// buffer.
  ///
  /// `ir_bytes` does not have to come from this session: any little-endian IR byte stream is
  /// accepted, as long as its length is a whole multiple of 4. When `entry_point` is given, it
  /// must name an entry point declared in the IR for the execution model mapped from `stage`,
  /// and that entry point is selected: only it is emitted, whatever else the IR embeds.
  ///
  /// On success the native buffer holds the emitted text plus a terminating NUL byte, and the
  /// returned byte count includes the terminator.
  pub fn compile_ir_to_native(
    &mut self,
    ir_bytes: &[u8],
    stage: ShaderStage,
    entry_point: Option<&str>
  ) -> Result<usize, CompileError> {
    deb!(self.logger, "cross-compiling {} bytes of IR for the {} stage", ir_bytes.len(), stage);

    // misaligned byte streams would otherwise be silently truncated to whole words
    if ir_bytes.len() % 4 != 0 {
      err!(self.logger, "IR byte count {} is not a whole multiple of 4", ir_bytes.len());
      return Err(CompileError::MisalignedIrError(ir_bytes.len()));
    }

    let mut module = spv_front::parse_u8_slice(ir_bytes, &spv_front::Options::default()).map_err(|e| {
      err!(self.logger, "failed to load IR as a cross-compilation module: {}", e);
      CompileError::CrossCompileError(e.to_string())
    })?;

    for ep in &module.entry_points {
      deb!(self.logger, "IR entry point « {} » ({:?})", ep.name, ep.stage);
    }

    if let Some(name) = entry_point {
      let model = stage.to_naga();

      if !module.entry_points.iter().any(|ep| ep.name == name && ep.stage == model) {
        let log = format!("no entry point « {} » for the {} execution model", name, stage);
        err!(self.logger, "{}", log);
        return Err(CompileError::CrossCompileError(log));
      }

      // select the entry point: other entry points of the module are not emitted
      module.entry_points.retain(|ep| ep.name == name && ep.stage == model);
    }

    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
      .validate(&module)
      .map_err(|e| {
        let log = e.into_inner().to_string();
        err!(self.logger, "IR module failed validation: {}", log);
        CompileError::CrossCompileError(log)
      })?;

    let msl_options = msl::Options {
      lang_version: MSL_VERSION,
      fake_missing_bindings: true,
      ..Default::default()
    };

    let (text, _) =
      msl::write_string(&module, &info, &msl_options, &msl::PipelineOptions::default()).map_err(|e| {
        err!(self.logger, "failed to emit native source: {}", e);
        CompileError::CrossCompileError(e.to_string())
      })?;

    let byte_count = self.native.write_terminated(text.as_bytes()).map_err(|e| {
      err!(self.logger, "failed to grow the native source buffer: {}", e);
      CompileError::from(e)
    })?;

    info!(self.logger, "emitted {} bytes of native source", byte_count);

    Ok(byte_count)
  }

  /// Compile GLSL source all the way down to native shader source.
  ///
  /// Chains [`ShaderCompiler::compile_glsl_to_ir`] and
  /// [`ShaderCompiler::compile_ir_to_native`] through the session's own IR buffer, renaming the
  /// entry point on the way when one is given.
  pub fn compile_glsl_to_native(
    &mut self,
    source: &str,
    stage: ShaderStage,
    entry_point: Option<&str>
  ) -> Result<usize, CompileError> {
    self.compile_glsl_to_ir(source, stage, entry_point)?;

    let ir = self.ir.as_slice().to_vec();
    self.compile_ir_to_native(&ir, stage, entry_point)
  }

  /// IR produced by the last successful [`ShaderCompiler::compile_glsl_to_ir`] call.
  pub fn ir_bytes(&self) -> &[u8] {
    self.ir.as_slice()
  }

  /// Current capacity of the IR buffer, in bytes.
  pub fn ir_capacity(&self) -> usize {
    self.ir.capacity()
  }

  /// Native source produced by the last successful [`ShaderCompiler::compile_ir_to_native`]
  /// call, terminating NUL byte included.
  pub fn native_bytes(&self) -> &[u8] {
    self.native.as_slice()
  }

  /// Native source as text, without the terminating NUL byte.
  pub fn native_source(&self) -> &str {
    let bytes = self.native.as_slice();
    let bytes = match bytes.split_last() {
      Some((&0, rest)) => rest,
      _ => bytes
    };

    str::from_utf8(bytes).unwrap_or("")
  }

  /// Current capacity of the native source buffer, in bytes.
  pub fn native_capacity(&self) -> usize {
    self.native.capacity()
  }
}

/// Fix the source dialect to GLSL 450 when none is named.
fn with_version_preamble(source: &str) -> Cow<str> {
  let has_version = source.lines().any(|line| line.trim_start().starts_with("#version"));

  if has_version {
    Cow::Borrowed(source)
  } else {
    Cow::Owned(format!("{}\n{}", GLSL_VERSION_PREAMBLE, source))
  }
}

/// Rename the compiled `main` entry point of the given stage in the output module.
fn rename_entry_point(module: &mut naga::Module, stage: ShaderStage, name: &str) {
  let model = stage.to_naga();

  for ep in &mut module.entry_points {
    if ep.stage == model && ep.name == "main" {
      ep.name = name.to_owned();
    }
  }
}
