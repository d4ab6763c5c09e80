//! Null backend for testing

use crate::parsed::{
    ParsedAluInstruction, ParsedExecInstruction, ParsedTextureFetchInstruction, ParsedVertexFetchInstruction,
};
use crate::translator::{ShaderTranslator, TranslatorSession};

/// Event counts from the last translation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub labels: u32,
    pub exec_blocks: u32,
    pub alu_instructions: u32,
    pub vertex_fetches: u32,
    pub texture_fetches: u32,
}

/// Backend that generates nothing
///
/// Useful for validating microcode and collecting bindings and disassembly
/// without a target language. Only counts what it is shown.
pub struct NullTranslator {
    stats: TranslationStats,
}

impl NullTranslator {
    pub fn new() -> Self {
        Self {
            stats: TranslationStats::default(),
        }
    }

    pub fn stats(&self) -> TranslationStats {
        self.stats
    }
}

impl Default for NullTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderTranslator for NullTranslator {
    fn reset(&mut self) {
        self.stats = TranslationStats::default();
    }

    fn process_label(&mut self, _session: &mut TranslatorSession<'_>, _cf_index: u32) {
        self.stats.labels += 1;
    }

    fn process_exec_instruction_begin(&mut self, _session: &mut TranslatorSession<'_>, _instr: &ParsedExecInstruction) {
        self.stats.exec_blocks += 1;
    }

    fn process_vertex_fetch_instruction(
        &mut self,
        _session: &mut TranslatorSession<'_>,
        _instr: &ParsedVertexFetchInstruction,
    ) {
        self.stats.vertex_fetches += 1;
    }

    fn process_texture_fetch_instruction(
        &mut self,
        _session: &mut TranslatorSession<'_>,
        _instr: &ParsedTextureFetchInstruction,
    ) {
        self.stats.texture_fetches += 1;
    }

    fn process_alu_instruction(&mut self, _session: &mut TranslatorSession<'_>, _instr: &ParsedAluInstruction) {
        self.stats.alu_instructions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{Shader, ShaderType};
    use crate::ucode::control_flow::{encode_nop, encode_return};
    use crate::ucode::pack_control_flow_pair;

    #[test]
    fn test_null_translator() {
        let mut translator = NullTranslator::new();
        let mut shader = Shader::new(ShaderType::Vertex, pack_control_flow_pair(encode_return(), encode_nop()).to_vec());
        assert!(translator.translate(&mut shader));
        assert!(shader.is_translated());
        assert!(shader.translated_binary().is_empty());
        assert_eq!(translator.stats(), TranslationStats::default());
    }

    #[test]
    fn test_empty_shader() {
        let mut translator = NullTranslator::default();
        let mut shader = Shader::new(ShaderType::Pixel, Vec::new());
        assert!(translator.translate(&mut shader));
        assert!(shader.ucode_disassembly().is_empty());

        let words = pack_control_flow_pair(Default::default(), Default::default());
        let mut shader = Shader::new(ShaderType::Pixel, words.to_vec());
        assert!(translator.translate(&mut shader));
        assert_eq!(shader.ucode_disassembly().lines().count(), 2);
    }
}
