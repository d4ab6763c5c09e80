//! Control flow linearizer

use super::decode::{
    parse_alu_nop, parse_alu_scalar, parse_alu_vector, parse_control_flow, parse_texture_fetch, parse_vertex_fetch,
};
use super::session::TranslatorSession;
use super::ShaderTranslator;
use crate::disasm::control_flow_dword_offset;
use crate::parsed::{predicate_prefix, InstructionStorageTarget, ParsedControlFlow, ParsedExecInstruction};
use crate::shader::{ShaderError, ShaderErrorKind};
use crate::ucode::{
    fetch_opcode_bits, instruction_dwords, AluInstruction, ControlFlowInstruction, ControlFlowProgram, FetchOpcode,
    TextureFetchInstruction, VertexFetchInstruction, ALU_SCALAR_OPCODES, ALU_VECTOR_OPCODES, DWORDS_PER_INSTRUCTION,
};
use std::collections::BTreeSet;

/// Control flow indices targeted by loops, calls and jumps
pub fn collect_label_addresses(instructions: &[ControlFlowInstruction]) -> BTreeSet<u32> {
    instructions.iter().filter_map(ControlFlowInstruction::target_address).collect()
}

impl TranslatorSession<'_> {
    pub(super) fn translate_blocks(&mut self, backend: &mut dyn ShaderTranslator, program: &ControlFlowProgram) {
        let labels = collect_label_addresses(&program.instructions);
        for &target in &labels {
            if target as usize >= program.len() {
                let error = ShaderError::new(
                    ShaderErrorKind::GeneralTranslationError,
                    format!(
                        "branch target L{} is past the end of control flow ({} instructions)",
                        target,
                        program.len()
                    ),
                );
                self.record_error(backend, error);
            }
        }

        for (cf_index, cf) in program.instructions.iter().enumerate() {
            if self.is_aborted() {
                tracing::debug!("Stopping control flow at index {} after an error", cf_index);
                break;
            }
            let cf_index = cf_index as u32;
            if labels.contains(&cf_index) {
                self.append_label_line(cf_index);
                backend.process_label(self, cf_index);
            }
            self.translate_control_flow_instruction(backend, cf, cf_index);
        }
    }

    fn translate_control_flow_instruction(
        &mut self,
        backend: &mut dyn ShaderTranslator,
        cf: &ControlFlowInstruction,
        cf_index: u32,
    ) {
        let dword_offset = control_flow_dword_offset(cf_index);
        tracing::trace!("cf {}: {:?}", cf_index, cf.opcode());

        let parsed = match parse_control_flow(cf, cf_index, self.shader_type()) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.append_instruction_line(dword_offset, &format!("      ??? ({})", err));
                self.record_decode_error(backend, err);
                return;
            }
        };
        self.append_instruction_line(dword_offset, &parsed.disassemble());

        match parsed {
            ParsedControlFlow::Nop { cf_index } => backend.process_control_flow_nop_instruction(self, cf_index),
            ParsedControlFlow::Exec(instr) => {
                backend.process_exec_instruction_begin(self, &instr);
                self.translate_exec_instructions(backend, &instr);
                backend.process_exec_instruction_end(self, &instr);
            }
            ParsedControlFlow::LoopStart(instr) => backend.process_loop_start_instruction(self, &instr),
            ParsedControlFlow::LoopEnd(instr) => backend.process_loop_end_instruction(self, &instr),
            ParsedControlFlow::Call(instr) => backend.process_call_instruction(self, &instr),
            ParsedControlFlow::Return(instr) => backend.process_return_instruction(self, &instr),
            ParsedControlFlow::Jump(instr) => backend.process_jump_instruction(self, &instr),
            ParsedControlFlow::Alloc(instr) => backend.process_alloc_instruction(self, &instr),
        }
    }

    fn translate_exec_instructions(&mut self, backend: &mut dyn ShaderTranslator, exec: &ParsedExecInstruction) {
        let mut sequence = exec.sequence;
        for i in 0..exec.instruction_count {
            if self.is_aborted() {
                return;
            }
            let is_fetch = sequence & 0x1 == 0x1;
            sequence >>= 2;

            let address = exec.instruction_address + i;
            let dwords = match instruction_dwords(self.ucode_dwords(), address) {
                Ok(dwords) => dwords,
                Err(err) => {
                    self.record_decode_error(backend, err);
                    return;
                }
            };

            if !is_fetch {
                self.translate_alu_instruction(backend, &AluInstruction::decode(dwords), address);
            } else if fetch_opcode_bits(&dwords) == FetchOpcode::VertexFetch.to_raw() {
                self.translate_vertex_fetch_instruction(backend, &VertexFetchInstruction::decode(dwords), address);
            } else {
                self.translate_texture_fetch_instruction(backend, &TextureFetchInstruction::decode(dwords), address);
            }
        }
    }

    fn translate_vertex_fetch_instruction(
        &mut self,
        backend: &mut dyn ShaderTranslator,
        op: &VertexFetchInstruction,
        address: u32,
    ) {
        let parsed = parse_vertex_fetch(op, self.state.previous_vfetch_full.as_ref(), address);
        if !op.is_mini_fetch {
            self.state.previous_vfetch_full = Some(*op);
        }

        let prefix = predicate_prefix(op.is_predicated, op.predicate_condition);
        let dword_offset = address as usize * DWORDS_PER_INSTRUCTION;
        match parsed {
            Ok(instr) => {
                self.append_instruction_line(dword_offset, &format!("{}{}", prefix, instr.disassemble()));
                backend.process_vertex_fetch_instruction(self, &instr);
            }
            Err(err) => {
                self.append_instruction_line(dword_offset, &format!("{}??? ({})", prefix, err));
                self.record_decode_error(backend, err);
            }
        }
    }

    fn translate_texture_fetch_instruction(
        &mut self,
        backend: &mut dyn ShaderTranslator,
        op: &TextureFetchInstruction,
        address: u32,
    ) {
        let prefix = predicate_prefix(op.is_predicated, op.predicate_condition);
        let dword_offset = address as usize * DWORDS_PER_INSTRUCTION;
        match parse_texture_fetch(op, address) {
            Ok(instr) => {
                self.append_instruction_line(dword_offset, &format!("{}{}", prefix, instr.disassemble()));
                backend.process_texture_fetch_instruction(self, &instr);
            }
            Err(err) => {
                self.append_instruction_line(dword_offset, &format!("{}??? ({})", prefix, err));
                self.record_decode_error(backend, err);
            }
        }
    }

    /// Decode both halves of an ALU word onto one disassembly line
    fn translate_alu_instruction(&mut self, backend: &mut dyn ShaderTranslator, op: &AluInstruction, address: u32) {
        let shader_type = self.shader_type();
        let mut parsed = Vec::with_capacity(2);
        let mut errors = Vec::new();

        if op.has_vector_op() {
            match parse_alu_vector(op, &ALU_VECTOR_OPCODES, shader_type, address) {
                Ok(instr) => parsed.push(Ok(instr)),
                Err(err) => {
                    parsed.push(Err(format!("??? ({})", err)));
                    errors.push(err);
                }
            }
        }
        if op.has_scalar_op() {
            match parse_alu_scalar(op, &ALU_SCALAR_OPCODES, shader_type, address) {
                Ok(instr) => parsed.push(Ok(instr)),
                Err(err) => {
                    parsed.push(Err(format!("??? ({})", err)));
                    errors.push(err);
                }
            }
        }
        if parsed.is_empty() {
            parsed.push(Ok(parse_alu_nop(op, address)));
        }

        let body = parsed
            .iter()
            .map(|part| match part {
                Ok(instr) => instr.disassemble(),
                Err(text) => text.clone(),
            })
            .collect::<Vec<_>>()
            .join(" + ");
        let prefix = predicate_prefix(op.is_predicated, op.predicate_condition);
        self.append_instruction_line(address as usize * DWORDS_PER_INSTRUCTION, &format!("{}{}", prefix, body));

        for err in errors {
            self.record_decode_error(backend, err);
        }

        for instr in parsed.into_iter().flatten() {
            if instr.result.storage_target == InstructionStorageTarget::ColorTarget {
                if let Some(flag) = self.state.writes_color_targets.get_mut(instr.result.storage_index as usize) {
                    *flag = true;
                }
            }
            backend.process_alu_instruction(self, &instr);
        }
    }
}
