//! Disassembly backend
//!
//! Produces the microcode disassembly as its artifact. Used by the shader
//! compiler tool and as a reference when comparing other backends.

use crate::translator::{ShaderTranslator, TranslatorSession};

#[derive(Debug, Default)]
pub struct UcodeShaderTranslator;

impl UcodeShaderTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl ShaderTranslator for UcodeShaderTranslator {
    fn complete_translation(&mut self, session: &mut TranslatorSession<'_>) -> Vec<u8> {
        session.ucode_disasm().as_bytes().to_vec()
    }
}
