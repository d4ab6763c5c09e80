//! Xenos GPU shader microcode translator
//!
//! Decodes Xbox 360 GPU microcode into a backend-agnostic instruction
//! representation and drives a [`ShaderTranslator`] backend over it.
//!
//! ```ignore
//! use xe_gpu::{Shader, ShaderType, ShaderTranslator, UcodeShaderTranslator};
//!
//! let mut shader = Shader::new(ShaderType::Pixel, ucode);
//! let ok = UcodeShaderTranslator::new().translate(&mut shader);
//! println!("{}", shader.ucode_disassembly());
//! ```

pub mod backend;
pub mod disasm;
pub mod parsed;
pub mod shader;
pub mod translator;
pub mod ucode;

pub use backend::{NullTranslator, UcodeShaderTranslator};
pub use shader::{
    Shader, ShaderError, ShaderErrorKind, ShaderType, TextureBinding, UcodeEndianness, VertexAttribute, VertexBinding,
};
pub use translator::{ErrorAction, ShaderTranslator, TranslatorSession};
