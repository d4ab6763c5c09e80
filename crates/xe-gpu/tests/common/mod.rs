//! Shared helpers: a small microcode assembler and a recording backend

#![allow(dead_code)]

use xe_gpu::parsed::{
    ParsedAllocInstruction, ParsedAluInstruction, ParsedCallInstruction, ParsedExecInstruction, ParsedJumpInstruction,
    ParsedLoopEndInstruction, ParsedLoopStartInstruction, ParsedReturnInstruction, ParsedTextureFetchInstruction,
    ParsedVertexFetchInstruction,
};
use xe_gpu::ucode::opcodes::{scalar, vector};
use xe_gpu::ucode::{
    pack_control_flow_pair, AluInstruction, BranchInstruction, ControlFlowInstruction, ControlFlowOpcode,
    ExecInstruction, LoopEndInstruction, LoopStartInstruction, TextureFetchInstruction, VertexFetchInstruction,
};
use xe_gpu::{ErrorAction, ShaderError, ShaderTranslator, TranslatorSession};

/// One ALU or fetch instruction inside an exec block
#[derive(Debug, Clone, Copy)]
pub enum Slot {
    Alu(AluInstruction),
    VertexFetch(VertexFetchInstruction),
    TextureFetch(TextureFetchInstruction),
}

impl Slot {
    fn is_fetch(&self) -> bool {
        !matches!(self, Slot::Alu(_))
    }

    fn encode(&self) -> [u32; 3] {
        match self {
            Slot::Alu(op) => op.encode(),
            Slot::VertexFetch(op) => op.encode(),
            Slot::TextureFetch(op) => op.encode(),
        }
    }
}

enum Cf {
    Raw(ControlFlowInstruction),
    /// Exec whose address is relative to the first instruction word
    Exec(ExecInstruction),
}

/// Assembles control flow followed by the ALU/fetch words it executes
#[derive(Default)]
pub struct ProgramBuilder {
    cf: Vec<Cf>,
    slots: Vec<Slot>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cf(&mut self, cf: ControlFlowInstruction) -> &mut Self {
        self.cf.push(Cf::Raw(cf));
        self
    }

    pub fn nop(&mut self) -> &mut Self {
        self.cf(ControlFlowInstruction::default())
    }

    pub fn ret(&mut self) -> &mut Self {
        self.cf(ControlFlowInstruction::new(0, (ControlFlowOpcode::Return as u16) << 12))
    }

    pub fn exec(&mut self, slots: &[Slot]) -> &mut Self {
        self.exec_op(ControlFlowOpcode::Exec, slots)
    }

    pub fn exec_end(&mut self, slots: &[Slot]) -> &mut Self {
        self.exec_op(ControlFlowOpcode::ExecEnd, slots)
    }

    pub fn exec_op(&mut self, opcode: ControlFlowOpcode, slots: &[Slot]) -> &mut Self {
        self.exec_with(exec_template(opcode), slots)
    }

    /// Exec using `template` for everything but address, count and sequence
    pub fn exec_with(&mut self, template: ExecInstruction, slots: &[Slot]) -> &mut Self {
        assert!(slots.len() <= 6, "an exec holds at most six instructions");
        let mut exec = template;
        exec.address = self.slots.len() as u32;
        exec.count = slots.len() as u32;
        exec.sequence = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_fetch())
            .fold(0, |sequence, (i, _)| sequence | (1 << (2 * i)));
        self.slots.extend_from_slice(slots);
        self.cf.push(Cf::Exec(exec));
        self
    }

    pub fn loop_start(&mut self, loop_id: u32, skip_target: u32) -> &mut Self {
        self.cf(
            LoopStartInstruction {
                address: skip_target,
                is_repeat: false,
                loop_id,
                is_absolute_address: false,
            }
            .encode(),
        )
    }

    pub fn loop_end(&mut self, loop_id: u32, body_target: u32) -> &mut Self {
        self.cf(
            LoopEndInstruction {
                address: body_target,
                loop_id,
                is_predicated_break: false,
                condition: false,
                is_absolute_address: false,
            }
            .encode(),
        )
    }

    pub fn jump(&mut self, target: u32, bool_address: u32, condition: bool) -> &mut Self {
        self.cf(branch(ControlFlowOpcode::CondJmp, target, bool_address, condition).encode())
    }

    pub fn call(&mut self, target: u32) -> &mut Self {
        let mut call = branch(ControlFlowOpcode::CondCall, target, 0, true);
        call.is_unconditional = true;
        self.cf(call.encode())
    }

    /// Number of control flow instructions added so far
    pub fn cf_count(&self) -> u32 {
        self.cf.len() as u32
    }

    pub fn build(&self) -> Vec<u32> {
        let base = (self.cf.len() as u32).div_ceil(2);
        let mut cf: Vec<ControlFlowInstruction> = self
            .cf
            .iter()
            .map(|entry| match entry {
                Cf::Raw(raw) => *raw,
                Cf::Exec(exec) => {
                    let mut exec = *exec;
                    exec.address += base;
                    exec.encode()
                }
            })
            .collect();
        if cf.len() % 2 == 1 {
            cf.push(ControlFlowInstruction::default());
        }

        let mut words = Vec::new();
        for pair in cf.chunks(2) {
            words.extend(pack_control_flow_pair(pair[0], pair[1]));
        }
        for slot in &self.slots {
            words.extend(slot.encode());
        }
        words
    }
}

pub fn exec_template(opcode: ControlFlowOpcode) -> ExecInstruction {
    ExecInstruction {
        opcode,
        address: 0,
        count: 0,
        is_yield: false,
        sequence: 0,
        vertex_cache: 0,
        bool_address: 0,
        is_predicate_clean: true,
        condition: false,
        is_absolute_address: false,
    }
}

fn branch(opcode: ControlFlowOpcode, target: u32, bool_address: u32, condition: bool) -> BranchInstruction {
    BranchInstruction {
        opcode,
        address: target,
        is_unconditional: false,
        is_predicated: false,
        is_backward: false,
        bool_address,
        condition,
        is_absolute_address: false,
    }
}

/// `add rDEST, rSRC, rSRC`
pub fn alu_add(dest: u32, src: u32) -> Slot {
    Slot::Alu(AluInstruction {
        vector_opcode: vector::ADD,
        vector_dest: dest,
        vector_write_mask: 0xF,
        scalar_opcode: scalar::RETAIN_PREV,
        src1_sel: true,
        src1_reg: src,
        src2_sel: true,
        src2_reg: src,
        src3_sel: true,
        ..Default::default()
    })
}

/// Vector export of r0 to `dest`
pub fn alu_export(dest: u32) -> Slot {
    Slot::Alu(AluInstruction {
        vector_opcode: vector::ADD,
        vector_dest: dest,
        vector_write_mask: 0xF,
        export_data: true,
        scalar_opcode: scalar::RETAIN_PREV,
        src1_sel: true,
        src2_sel: true,
        src3_sel: true,
        ..Default::default()
    })
}

pub fn alu_scalar(opcode: u32) -> Slot {
    Slot::Alu(AluInstruction {
        scalar_opcode: opcode,
        scalar_write_mask: 0x1,
        src3_sel: true,
        ..Default::default()
    })
}

/// Full vertex fetch of `format` from fetch slot `const_index * 3 + sel`
pub fn vfetch_full(dst: u32, const_index: u32, sel: u32, format: u32, stride: u32, offset: i32) -> Slot {
    Slot::VertexFetch(VertexFetchInstruction {
        dst_reg: dst,
        must_be_one: true,
        const_index,
        const_index_sel: sel,
        dst_swizzle: 0b011_010_001_000,
        format,
        stride,
        offset,
        ..Default::default()
    })
}

/// Mini vertex fetch; slot, source and stride come from the last full fetch
pub fn vfetch_mini(dst: u32, format: u32, offset: i32) -> Slot {
    Slot::VertexFetch(VertexFetchInstruction {
        dst_reg: dst,
        must_be_one: true,
        dst_swizzle: 0b011_010_001_000,
        format,
        offset,
        is_mini_fetch: true,
        ..Default::default()
    })
}

/// `tfetchND rDST, r0, tfSLOT` with dimension raw value `dimension`
pub fn tfetch(dst: u32, const_index: u32, dimension: u32) -> Slot {
    Slot::TextureFetch(TextureFetchInstruction {
        opcode: 1,
        dst_reg: dst,
        fetch_valid_only: true,
        const_index,
        src_swizzle: 0b10_01_00,
        dst_swizzle: 0b011_010_001_000,
        use_computed_lod: true,
        dimension,
        ..Default::default()
    })
}

/// Backend that logs every hook as a line of text
#[derive(Default)]
pub struct RecordingTranslator {
    pub events: Vec<String>,
    /// Return `ErrorAction::Abort` from error hooks
    pub abort_on_error: bool,
}

impl RecordingTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events.iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }

    fn error_action(&self) -> ErrorAction {
        if self.abort_on_error {
            ErrorAction::Abort
        } else {
            ErrorAction::Continue
        }
    }
}

impl ShaderTranslator for RecordingTranslator {
    fn reset(&mut self) {
        self.events.clear();
    }

    fn start_translation(&mut self, session: &mut TranslatorSession<'_>) {
        self.events.push(format!(
            "start vb={} tb={}",
            session.vertex_bindings().len(),
            session.texture_bindings().len()
        ));
    }

    fn complete_translation(&mut self, session: &mut TranslatorSession<'_>) -> Vec<u8> {
        self.events.push("complete".to_string());
        self.events.join("\n").into_bytes().into_iter().chain(session.ucode_disasm().bytes()).collect()
    }

    fn emit_translation_error(&mut self, _session: &TranslatorSession<'_>, error: &ShaderError) -> ErrorAction {
        self.events.push(format!("error {:?}", error.kind));
        self.error_action()
    }

    fn emit_unimplemented_translation_error(
        &mut self,
        _session: &TranslatorSession<'_>,
        error: &ShaderError,
    ) -> ErrorAction {
        self.events.push(format!("error {:?}", error.kind));
        self.error_action()
    }

    fn process_label(&mut self, _session: &mut TranslatorSession<'_>, cf_index: u32) {
        self.events.push(format!("label {cf_index}"));
    }

    fn process_control_flow_nop_instruction(&mut self, _session: &mut TranslatorSession<'_>, cf_index: u32) {
        self.events.push(format!("cnop {cf_index}"));
    }

    fn process_exec_instruction_begin(&mut self, session: &mut TranslatorSession<'_>, instr: &ParsedExecInstruction) {
        self.events.push(format!(
            "exec_begin {} vb={} tb={}",
            instr.cf_index,
            session.vertex_bindings().len(),
            session.texture_bindings().len()
        ));
    }

    fn process_exec_instruction_end(&mut self, _session: &mut TranslatorSession<'_>, instr: &ParsedExecInstruction) {
        self.events.push(format!("exec_end {}", instr.cf_index));
    }

    fn process_loop_start_instruction(
        &mut self,
        _session: &mut TranslatorSession<'_>,
        instr: &ParsedLoopStartInstruction,
    ) {
        self.events
            .push(format!("loop_start i{} L{}", instr.loop_constant_index, instr.loop_skip_address));
    }

    fn process_loop_end_instruction(&mut self, _session: &mut TranslatorSession<'_>, instr: &ParsedLoopEndInstruction) {
        self.events
            .push(format!("loop_end i{} L{}", instr.loop_constant_index, instr.loop_body_address));
    }

    fn process_call_instruction(&mut self, _session: &mut TranslatorSession<'_>, instr: &ParsedCallInstruction) {
        self.events.push(format!("call L{}", instr.target_address));
    }

    fn process_return_instruction(&mut self, _session: &mut TranslatorSession<'_>, instr: &ParsedReturnInstruction) {
        self.events.push(format!("ret {}", instr.cf_index));
    }

    fn process_jump_instruction(&mut self, _session: &mut TranslatorSession<'_>, instr: &ParsedJumpInstruction) {
        self.events.push(format!("jmp L{}", instr.target_address));
    }

    fn process_alloc_instruction(&mut self, _session: &mut TranslatorSession<'_>, instr: &ParsedAllocInstruction) {
        self.events.push(format!("alloc {:?} {}", instr.alloc_type, instr.count));
    }

    fn process_vertex_fetch_instruction(
        &mut self,
        _session: &mut TranslatorSession<'_>,
        instr: &ParsedVertexFetchInstruction,
    ) {
        self.events.push(format!("{} vf{}", instr.opcode_name, instr.fetch_constant));
    }

    fn process_texture_fetch_instruction(
        &mut self,
        _session: &mut TranslatorSession<'_>,
        instr: &ParsedTextureFetchInstruction,
    ) {
        self.events.push(format!("{} {:?}", instr.opcode_name, instr.fetch_constant));
    }

    fn process_alu_instruction(&mut self, _session: &mut TranslatorSession<'_>, instr: &ParsedAluInstruction) {
        self.events.push(format!("alu {}", instr.opcode_name));
    }
}
