//! CLI front of the shader cross-compilation bridge.

use shader_bridge::{err, info};
use shader_bridge::logger::StdoutLogger;
use shader_bridge::manifest::{Manifest, ShaderJob, Target};
use shader_bridge::compiler::ShaderCompiler;
use shader_bridge::stage::ShaderStage;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use structopt::StructOpt;
use walkdir::WalkDir;

#[derive(Debug, StructOpt)]
#[structopt(name = "shader-bridge", about = "GLSL to SPIR-V to MSL shader cross-compilation bridge")]
struct Opt {
  /// GLSL source to compile.
  #[structopt(parse(from_os_str))]
  input: Option<PathBuf>,

  /// Stage the shader targets; inferred from a .vert / .frag extension when omitted.
  #[structopt(short = "s", long = "stage")]
  stage: Option<ShaderStage>,

  /// Entry point the output should expose; the source entry function is always main.
  #[structopt(short = "e", long = "entry-point")]
  entry_point: Option<String>,

  /// What to produce: ir (SPIR-V) or native (MSL).
  #[structopt(short = "t", long = "target", default_value = "native")]
  target: Target,

  /// Where to write the result; defaults to the input path with the target extension appended.
  #[structopt(short = "o", long = "output", parse(from_os_str))]
  output: Option<PathBuf>,

  /// Compile every job of a JSON manifest instead of a single file.
  #[structopt(short = "m", long = "manifest", parse(from_os_str))]
  manifest: Option<PathBuf>,

  /// Walk a directory and compile every .vert / .frag shader to MSL next to its source.
  #[structopt(short = "b", long = "batch", parse(from_os_str))]
  batch: Option<PathBuf>
}

fn main() {
  let opt = Opt::from_args();
  let mut logger = StdoutLogger;

  if let Err(e) = run(&opt) {
    err!(logger, "{}", e);
    process::exit(1);
  }
}

fn run(opt: &Opt) -> Result<(), Box<dyn Error>> {
  let mut compiler = ShaderCompiler::new()?;

  let jobs = if let Some(ref manifest_path) = opt.manifest {
    Manifest::load(manifest_path)?.shaders
  } else if let Some(ref dir) = opt.batch {
    batch_jobs(dir)
  } else {
    vec![single_job(opt)?]
  };

  for job in &jobs {
    run_job(&mut compiler, job)?;
  }

  Ok(())
}

/// Build the lone job described by the CLI options.
fn single_job(opt: &Opt) -> Result<ShaderJob, Box<dyn Error>> {
  let input = opt.input.clone().ok_or("no input file; pass a GLSL source, --manifest or --batch")?;

  let stage = match opt.stage {
    Some(stage) => stage,
    None => stage_from_path(&input)
      .ok_or("cannot infer the shader stage from the file extension; pass --stage")?
  };

  Ok(ShaderJob {
    source: input,
    stage,
    entry_point: opt.entry_point.clone(),
    target: opt.target,
    output: opt.output.clone()
  })
}

/// Collect the shaders living under `dir`.
///
/// `.vert` files compile with the `vert` entry point, `.frag` files with `frag`; everything else
/// is skipped. Outputs land next to their source as `<name>.<ext>.metal`.
fn batch_jobs(dir: &Path) -> Vec<ShaderJob> {
  WalkDir::new(dir)
    .into_iter()
    .filter_map(|entry| {
      let entry = entry.ok()?;
      let path = entry.path();
      let stage = stage_from_path(path)?;

      let entry_point = match stage {
        ShaderStage::Vertex => "vert",
        ShaderStage::Fragment => "frag"
      };

      Some(ShaderJob {
        source: path.to_path_buf(),
        stage,
        entry_point: Some(entry_point.to_owned()),
        target: Target::Native,
        output: None
      })
    })
    .collect()
}

fn run_job(compiler: &mut ShaderCompiler, job: &ShaderJob) -> Result<(), Box<dyn Error>> {
  let mut logger = StdoutLogger;
  let source = fs::read_to_string(&job.source)?;
  let output = job.output_path();

  match job.target {
    Target::Ir => {
      compiler.compile_glsl_to_ir(&source, job.stage, job.entry_point.as_deref())?;
      fs::write(&output, compiler.ir_bytes())?;
    }

    Target::Native => {
      compiler.compile_glsl_to_native(&source, job.stage, job.entry_point.as_deref())?;
      fs::write(&output, compiler.native_source())?;
    }
  }

  info!(logger, "{} → {}", job.source.display(), output.display());

  Ok(())
}

fn stage_from_path(path: &Path) -> Option<ShaderStage> {
  match path.extension()?.to_str()? {
    "vert" => Some(ShaderStage::Vertex),
    "frag" => Some(ShaderStage::Fragment),
    _ => None
  }
}
