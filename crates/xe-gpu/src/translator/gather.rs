//! Binding pre-pass
//!
//! Walks every exec block once, before any backend hook runs, so backends see
//! the complete set of vertex and texture bindings up front.

use super::decode::{parse_texture_fetch, parse_vertex_fetch};
use super::session::TranslatorSession;
use crate::shader::{ShaderError, ShaderErrorKind, TextureBinding, VertexAttribute, VertexBinding};
use crate::ucode::{
    fetch_opcode_bits, instruction_dwords, ControlFlow, ControlFlowProgram, FetchOpcode, TextureFetchInstruction,
    VertexFetchInstruction,
};

impl TranslatorSession<'_> {
    /// Populate the shader's bindings
    ///
    /// Errors are returned instead of recorded so the backend hears about
    /// them after `start_translation`. Malformed fetches are skipped here and
    /// reported once by the linearizer.
    pub(super) fn gather_bindings(&mut self, program: &ControlFlowProgram) -> Vec<ShaderError> {
        let mut errors = Vec::new();
        let mut previous_full: Option<VertexFetchInstruction> = None;

        for cf in &program.instructions {
            let ControlFlow::Exec(exec) = cf.decode() else {
                continue;
            };
            for i in 0..exec.count {
                if !exec.is_fetch(i) {
                    continue;
                }
                let address = exec.address + i;
                let Ok(dwords) = instruction_dwords(self.shader.ucode_dwords(), address) else {
                    break;
                };
                if fetch_opcode_bits(&dwords) == FetchOpcode::VertexFetch.to_raw() {
                    let op = VertexFetchInstruction::decode(dwords);
                    self.gather_vertex_binding(&op, previous_full.as_ref(), address);
                    if !op.is_mini_fetch {
                        previous_full = Some(op);
                    }
                } else {
                    let op = TextureFetchInstruction::decode(dwords);
                    if let Some(error) = self.gather_texture_binding(&op, address) {
                        errors.push(error);
                    }
                }
            }
        }

        tracing::debug!(
            "Gathered {} vertex bindings ({} attributes), {} texture bindings",
            self.shader.vertex_bindings.len(),
            self.state.total_attrib_count,
            self.shader.texture_bindings.len()
        );
        errors
    }

    fn gather_vertex_binding(
        &mut self,
        op: &VertexFetchInstruction,
        previous_full: Option<&VertexFetchInstruction>,
        address: u32,
    ) {
        if !op.fetches_any_data() {
            return;
        }
        let Ok(fetch_instr) = parse_vertex_fetch(op, previous_full, address) else {
            return;
        };

        let fetch_constant = fetch_instr.fetch_constant;
        let stride = fetch_instr.attributes.stride;
        let mut attribute = VertexAttribute {
            attrib_index: 0,
            data_format: fetch_instr.attributes.data_format,
            offset_words: fetch_instr.attributes.offset,
            size_words: fetch_instr.attributes.data_format.size_in_words(),
            is_normalized: !fetch_instr.attributes.is_integer,
            is_signed: fetch_instr.attributes.is_signed,
            fetch_instr,
        };

        let bindings = &mut self.shader.vertex_bindings;
        let index = match bindings.iter().position(|b| b.fetch_constant == fetch_constant) {
            Some(index) => index,
            None => {
                bindings.push(VertexBinding {
                    binding_index: bindings.len() as u32,
                    fetch_constant,
                    stride_words: stride,
                    attributes: Vec::new(),
                });
                bindings.len() - 1
            }
        };

        let binding = &mut bindings[index];
        if binding.stride_words != stride {
            tracing::warn!(
                "Vertex fetch constant {} read with stride {} and {}",
                fetch_constant,
                binding.stride_words,
                stride
            );
        }
        if binding.attributes.iter().any(|a| a.has_same_layout(&attribute)) {
            return;
        }

        attribute.attrib_index = self.state.total_attrib_count;
        self.state.total_attrib_count += 1;
        binding.attributes.push(attribute);
    }

    fn gather_texture_binding(&mut self, op: &TextureFetchInstruction, address: u32) -> Option<ShaderError> {
        let fetch_instr = parse_texture_fetch(op, address).ok()?;
        let fetch_constant = fetch_instr.fetch_constant?;
        if !op.fetches_any_data() {
            return None;
        }

        let bindings = &mut self.shader.texture_bindings;
        if let Some(existing) = bindings.iter().find(|b| b.fetch_constant == fetch_constant) {
            if existing.dimension != fetch_instr.dimension {
                return Some(ShaderError::new(
                    ShaderErrorKind::GeneralTranslationError,
                    format!(
                        "texture fetch constant {} sampled as both {} and {}",
                        fetch_constant,
                        existing.dimension.name(),
                        fetch_instr.dimension.name()
                    ),
                ));
            }
            return None;
        }

        bindings.push(TextureBinding {
            binding_index: bindings.len() as u32,
            fetch_constant,
            dimension: fetch_instr.dimension,
            fetch_instr,
        });
        None
    }
}
