//! Shader cross-compilation bridge.
//!
//! This crate lets a rendering engine author shaders once in GLSL and run them on several
//! graphics APIs. Compilation is a two-stage pipeline driven by a reusable
//! [`ShaderCompiler`](compiler::ShaderCompiler) session:
//!
//! 1. GLSL source is lowered to portable binary IR (SPIR-V words), with optional entry-point
//!    remapping; see [`compiler::ShaderCompiler::compile_glsl_to_ir`];
//! 2. the IR (the session's own or any externally obtained byte stream) is cross-compiled
//!    into native shader source (MSL text); see
//!    [`compiler::ShaderCompiler::compile_ir_to_native`].
//!
//! Both stages write into buffers owned by the session, which grow exactly to the payload at
//! hand and are reused across calls.

pub mod logger;

pub mod buffer;
pub mod compiler;
pub mod manifest;
pub mod stage;

pub use crate::buffer::{BufferError, GrowBuffer};
pub use crate::compiler::{CompileError, ShaderCompiler};
pub use crate::logger::{Logger, SilentLogger, StdoutLogger};
pub use crate::manifest::{Manifest, ManifestError, ShaderJob, Target};
pub use crate::stage::ShaderStage;
