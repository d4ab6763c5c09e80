//! Xenos shader compiler
//!
//! Translates a raw microcode dump and writes the backend artifact.

use anyhow::{bail, Context};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use xe_core::Config;
use xe_gpu::{Shader, ShaderTranslator, ShaderType, UcodeEndianness, UcodeShaderTranslator};

#[derive(Parser, Debug)]
#[command(name = "xenos-shader-compiler", about = "Disassemble and translate Xenos shader microcode.")]
struct Args {
    /// Microcode dump (raw 32-bit words)
    input: PathBuf,

    /// Shader type: vs or ps (defaults to the input extension)
    #[arg(long, value_name = "TYPE")]
    shader_type: Option<ShaderType>,

    /// Write the artifact here instead of stdout
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// The dump stores words big-endian
    #[arg(long, action = clap::ArgAction::SetTrue)]
    big_endian: bool,

    /// Configuration file (defaults to the user config)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn shader_type_from_extension(path: &Path) -> Option<ShaderType> {
    path.extension()?.to_str()?.parse().ok()
}

fn run(args: Args) -> anyhow::Result<bool> {
    let config = match &args.config {
        Some(path) => Config::load_from(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load().context("loading default config")?,
    };
    xe_core::logging::init(&config.logging);

    let shader_type = match args.shader_type.or_else(|| shader_type_from_extension(&args.input)) {
        Some(shader_type) => shader_type,
        None => bail!("cannot infer shader type of {}; pass --shader-type", args.input.display()),
    };
    let endianness = if args.big_endian {
        UcodeEndianness::Big
    } else {
        UcodeEndianness::Little
    };

    let bytes = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let mut shader = Shader::from_bytes(shader_type, &bytes, endianness)?;
    tracing::info!(
        "Translating {} shader {} ({} words)",
        shader_type,
        args.input.display(),
        shader.ucode_dwords().len()
    );

    let ok = UcodeShaderTranslator::new().translate_with_config(&mut shader, &config.translator);
    for error in shader.errors() {
        tracing::error!("{}", error);
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, shader.translated_binary()).with_context(|| format!("writing {}", path.display()))?
        }
        None => std::io::stdout().write_all(shader.translated_binary())?,
    }
    Ok(ok)
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}
