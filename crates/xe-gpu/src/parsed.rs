//! Backend-agnostic instruction representation
//!
//! These are the structures handed to translator hooks. Raw encodings have
//! been resolved: predicates, register and constant references, swizzles and
//! export destinations are explicit.

use crate::ucode::{ControlFlowOpcode, FetchOpcode, TextureDimension, VertexFormat};
use bitflags::bitflags;
use std::fmt::Write;

bitflags! {
    /// Components written by a result
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ComponentMask: u32 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
        const W = 1 << 3;
    }
}

impl ComponentMask {
    pub fn component(index: u32) -> Self {
        Self::from_bits_truncate(1 << (index & 3))
    }
}

/// Source of one swizzled component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwizzleSource {
    X,
    Y,
    Z,
    W,
    Zero,
    One,
}

impl SwizzleSource {
    pub fn from_component(index: u32) -> Self {
        match index & 3 {
            0 => Self::X,
            1 => Self::Y,
            2 => Self::Z,
            _ => Self::W,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
            Self::W => 'w',
            Self::Zero => '0',
            Self::One => '1',
        }
    }
}

pub const IDENTITY_SWIZZLE: [SwizzleSource; 4] = [SwizzleSource::X, SwizzleSource::Y, SwizzleSource::Z, SwizzleSource::W];

/// How a register or constant index is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionAddressing {
    Static,
    /// Offset by the address register `a0`
    AddressRegisterRelative,
    /// Offset by the loop counter `aL`
    LoopRelative,
}

impl InstructionAddressing {
    fn suffix(self) -> &'static str {
        match self {
            Self::Static => "",
            Self::AddressRegisterRelative => "+a0",
            Self::LoopRelative => "+aL",
        }
    }
}

/// Where a result is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionStorageTarget {
    None,
    Register,
    Interpolator,
    Position,
    PointSize,
    ColorTarget,
    Depth,
    ExportAddress,
    ExportData,
}

/// Where an operand is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionStorageSource {
    Register,
    ConstantFloat,
    VertexFetchConstant,
    TextureFetchConstant,
}

/// Destination of an ALU or fetch instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionResult {
    pub storage_target: InstructionStorageTarget,
    pub storage_index: u32,
    pub storage_addressing: InstructionAddressing,
    pub write_mask: ComponentMask,
    /// Value written to each component (only meaningful where masked in)
    pub components: [SwizzleSource; 4],
    pub is_clamped: bool,
}

impl InstructionResult {
    /// A result that stores nothing
    pub fn none() -> Self {
        Self {
            storage_target: InstructionStorageTarget::None,
            storage_index: 0,
            storage_addressing: InstructionAddressing::Static,
            write_mask: ComponentMask::empty(),
            components: IDENTITY_SWIZZLE,
            is_clamped: false,
        }
    }

    pub fn has_any_writes(&self) -> bool {
        self.storage_target != InstructionStorageTarget::None && !self.write_mask.is_empty()
    }

    pub fn is_standard_swizzle(&self) -> bool {
        self.write_mask.is_all() && self.components == IDENTITY_SWIZZLE
    }

    pub fn disassemble(&self, out: &mut String) {
        let index = self.storage_index;
        let addressing = self.storage_addressing;
        let _ = match self.storage_target {
            InstructionStorageTarget::None => write!(out, "_"),
            InstructionStorageTarget::Register => match addressing {
                InstructionAddressing::Static => write!(out, "r{index}"),
                _ => write!(out, "r[{index}{}]", addressing.suffix()),
            },
            InstructionStorageTarget::Interpolator => write!(out, "o{index}"),
            InstructionStorageTarget::Position => write!(out, "oPos"),
            InstructionStorageTarget::PointSize => write!(out, "oPts"),
            InstructionStorageTarget::ColorTarget => write!(out, "oC{index}"),
            InstructionStorageTarget::Depth => write!(out, "oDepth"),
            InstructionStorageTarget::ExportAddress => write!(out, "eA"),
            InstructionStorageTarget::ExportData => write!(out, "eM{index}"),
        };
        if self.is_standard_swizzle() {
            return;
        }
        out.push('.');
        for (j, component) in self.components.iter().enumerate() {
            if self.write_mask.contains(ComponentMask::component(j as u32)) {
                out.push(component.as_char());
            } else {
                out.push('_');
            }
        }
    }
}

/// Source operand of an ALU or fetch instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionOperand {
    pub storage_source: InstructionStorageSource,
    pub storage_index: u32,
    pub storage_addressing: InstructionAddressing,
    pub is_negated: bool,
    pub is_absolute_value: bool,
    /// Number of components read (0 for fetch constant references)
    pub component_count: u32,
    pub components: [SwizzleSource; 4],
}

impl InstructionOperand {
    /// Reference to a fetch constant slot
    pub fn fetch_constant(storage_source: InstructionStorageSource, index: u32) -> Self {
        Self {
            storage_source,
            storage_index: index,
            storage_addressing: InstructionAddressing::Static,
            is_negated: false,
            is_absolute_value: false,
            component_count: 0,
            components: IDENTITY_SWIZZLE,
        }
    }

    pub fn is_standard_swizzle(&self) -> bool {
        self.component_count == 0 || (self.component_count == 4 && self.components == IDENTITY_SWIZZLE)
    }

    pub fn disassemble(&self, out: &mut String) {
        if self.is_negated {
            out.push('-');
        }
        if self.is_absolute_value {
            out.push('|');
        }
        let prefix = match self.storage_source {
            InstructionStorageSource::Register => "r",
            InstructionStorageSource::ConstantFloat => "c",
            InstructionStorageSource::VertexFetchConstant => "vf",
            InstructionStorageSource::TextureFetchConstant => "tf",
        };
        let _ = match self.storage_addressing {
            InstructionAddressing::Static => write!(out, "{prefix}{}", self.storage_index),
            addressing => write!(out, "{prefix}[{}{}]", self.storage_index, addressing.suffix()),
        };
        if self.is_absolute_value {
            out.push('|');
        }
        if !self.is_standard_swizzle() {
            out.push('.');
            for component in &self.components[..self.component_count.min(4) as usize] {
                out.push(component.as_char());
            }
        }
    }
}

/// Column prefix shared by predicated and unpredicated lines
pub(crate) fn predicate_prefix(is_predicated: bool, condition: bool) -> &'static str {
    match (is_predicated, condition) {
        (false, _) => "      ",
        (true, true) => " (p0) ",
        (true, false) => "(!p0) ",
    }
}

/// How a control flow instruction is guarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    Unconditional,
    /// Guarded by a boolean constant
    Conditional,
    /// Guarded by the predicate register
    Predicated,
}

fn bool_constant(condition: bool, index: u32) -> String {
    format!("{}b{index}", if condition { "" } else { "!" })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExecInstruction {
    pub cf_index: u32,
    pub opcode: ControlFlowOpcode,
    pub opcode_name: &'static str,
    /// First ALU/fetch instruction of the block
    pub instruction_address: u32,
    pub instruction_count: u32,
    pub condition_kind: ConditionKind,
    pub bool_constant_index: u32,
    pub condition: bool,
    /// Ends the shader after the block
    pub is_end: bool,
    pub is_predicate_clean: bool,
    pub is_yield: bool,
    /// Raw sequence bits, two per instruction
    pub sequence: u32,
}

impl ParsedExecInstruction {
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        match self.condition_kind {
            ConditionKind::Unconditional => {
                out.push_str(predicate_prefix(false, false));
                out.push_str(self.opcode_name);
            }
            ConditionKind::Conditional => {
                out.push_str(predicate_prefix(false, false));
                let _ = write!(out, "{} {}", self.opcode_name, bool_constant(self.condition, self.bool_constant_index));
            }
            ConditionKind::Predicated => {
                out.push_str(predicate_prefix(true, self.condition));
                out.push_str(self.opcode_name);
            }
        }
        let _ = write!(out, " ADDR({}) CNT({})", self.instruction_address, self.instruction_count);
        if self.is_yield {
            out.push_str(" YIELD");
        }
        if !self.is_predicate_clean {
            out.push_str(" NOCLEAN");
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLoopStartInstruction {
    pub cf_index: u32,
    /// Integer constant holding trip count, start and step
    pub loop_constant_index: u32,
    pub is_repeat: bool,
    /// Target taken when the loop is skipped
    pub loop_skip_address: u32,
}

impl ParsedLoopStartInstruction {
    pub fn disassemble(&self) -> String {
        let mut out = format!("      loop i{}, L{}", self.loop_constant_index, self.loop_skip_address);
        if self.is_repeat {
            out.push_str(", Repeat=true");
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLoopEndInstruction {
    pub cf_index: u32,
    pub is_predicated_break: bool,
    pub predicate_condition: bool,
    pub loop_constant_index: u32,
    /// Start of the loop body
    pub loop_body_address: u32,
}

impl ParsedLoopEndInstruction {
    pub fn disassemble(&self) -> String {
        format!(
            "{}endloop i{}, L{}",
            predicate_prefix(self.is_predicated_break, self.predicate_condition),
            self.loop_constant_index,
            self.loop_body_address
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCallInstruction {
    pub cf_index: u32,
    pub target_address: u32,
    pub condition_kind: ConditionKind,
    pub bool_constant_index: u32,
    pub condition: bool,
}

impl ParsedCallInstruction {
    pub fn disassemble(&self) -> String {
        branch_text(
            "call",
            "ccall",
            self.condition_kind,
            self.bool_constant_index,
            self.condition,
            self.target_address,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedReturnInstruction {
    pub cf_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedJumpInstruction {
    pub cf_index: u32,
    pub target_address: u32,
    pub condition_kind: ConditionKind,
    pub bool_constant_index: u32,
    pub condition: bool,
    pub is_backward: bool,
}

impl ParsedJumpInstruction {
    pub fn disassemble(&self) -> String {
        branch_text(
            "jmp",
            "cjmp",
            self.condition_kind,
            self.bool_constant_index,
            self.condition,
            self.target_address,
        )
    }
}

fn branch_text(
    name: &str,
    conditional_name: &str,
    kind: ConditionKind,
    bool_constant_index: u32,
    condition: bool,
    target: u32,
) -> String {
    match kind {
        ConditionKind::Unconditional => format!("      {name} L{target}"),
        ConditionKind::Conditional => format!(
            "      {conditional_name} {}, L{target}",
            bool_constant(condition, bool_constant_index)
        ),
        ConditionKind::Predicated => format!("{}{name} L{target}", predicate_prefix(true, condition)),
    }
}

/// Export buffer allocated by an alloc instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocType {
    None,
    Position,
    /// Interpolators in vertex shaders, color outputs in pixel shaders
    Interpolators,
    Memory,
}

impl AllocType {
    pub fn from_raw(value: u32) -> Self {
        match value & 0x3 {
            0 => Self::None,
            1 => Self::Position,
            2 => Self::Interpolators,
            _ => Self::Memory,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAllocInstruction {
    pub cf_index: u32,
    pub alloc_type: AllocType,
    pub count: u32,
    pub is_vertex_shader: bool,
}

impl ParsedAllocInstruction {
    pub fn disassemble(&self) -> String {
        let name = match self.alloc_type {
            AllocType::None => return "      alloc noalloc".to_string(),
            AllocType::Position => "position",
            AllocType::Interpolators if self.is_vertex_shader => "interpolators",
            AllocType::Interpolators => "colors",
            AllocType::Memory => "export",
        };
        format!("      alloc {name}, {}", self.count)
    }
}

/// Any control flow instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedControlFlow {
    Nop { cf_index: u32 },
    Exec(ParsedExecInstruction),
    LoopStart(ParsedLoopStartInstruction),
    LoopEnd(ParsedLoopEndInstruction),
    Call(ParsedCallInstruction),
    Return(ParsedReturnInstruction),
    Jump(ParsedJumpInstruction),
    Alloc(ParsedAllocInstruction),
}

impl ParsedControlFlow {
    pub fn disassemble(&self) -> String {
        match self {
            Self::Nop { .. } => "      cnop".to_string(),
            Self::Exec(i) => i.disassemble(),
            Self::LoopStart(i) => i.disassemble(),
            Self::LoopEnd(i) => i.disassemble(),
            Self::Call(i) => i.disassemble(),
            Self::Return(_) => "      ret".to_string(),
            Self::Jump(i) => i.disassemble(),
            Self::Alloc(i) => i.disassemble(),
        }
    }
}

/// Element layout read by a vertex fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexFetchAttributes {
    pub data_format: VertexFormat,
    /// Offset in words
    pub offset: i32,
    /// Stride in words
    pub stride: u32,
    pub exp_adjust: i32,
    pub prefetch_count: u32,
    pub is_index_rounded: bool,
    pub is_signed: bool,
    pub is_integer: bool,
    pub signed_rf_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVertexFetchInstruction {
    pub address: u32,
    pub opcode_name: &'static str,
    pub is_mini_fetch: bool,
    pub is_predicated: bool,
    pub predicate_condition: bool,
    pub fetch_constant: u32,
    pub result: InstructionResult,
    /// Index source then the vertex fetch constant
    pub operands: Vec<InstructionOperand>,
    pub attributes: VertexFetchAttributes,
}

impl ParsedVertexFetchInstruction {
    pub fn disassemble(&self) -> String {
        let mut out = String::from(self.opcode_name);
        out.push(' ');
        self.result.disassemble(&mut out);
        for operand in &self.operands {
            out.push_str(", ");
            operand.disassemble(&mut out);
        }
        let attrs = &self.attributes;
        let _ = write!(out, ", Format={}", attrs.data_format.name());
        if attrs.offset != 0 {
            let _ = write!(out, ", Offset={}", attrs.offset);
        }
        if !self.is_mini_fetch {
            let _ = write!(out, ", Stride={}", attrs.stride);
        }
        if attrs.is_signed {
            out.push_str(", Signed=true");
        }
        if attrs.is_integer {
            out.push_str(", NumFormat=integer");
        }
        if attrs.exp_adjust != 0 {
            let _ = write!(out, ", ExpAdjust={}", attrs.exp_adjust);
        }
        if attrs.prefetch_count != 0 {
            let _ = write!(out, ", PrefetchCount={}", attrs.prefetch_count + 1);
        }
        if attrs.is_index_rounded {
            out.push_str(", RoundIndex=true");
        }
        out
    }
}

/// Sampler settings of a texture fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureFetchAttributes {
    pub fetch_valid_only: bool,
    pub unnormalized_coordinates: bool,
    pub mag_filter: u32,
    pub min_filter: u32,
    pub mip_filter: u32,
    pub aniso_filter: u32,
    pub vol_mag_filter: u32,
    pub vol_min_filter: u32,
    pub use_computed_lod: bool,
    pub use_register_lod: bool,
    pub use_register_gradients: bool,
    pub lod_bias: i32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub offset_z: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTextureFetchInstruction {
    pub address: u32,
    pub opcode: FetchOpcode,
    pub opcode_name: &'static str,
    pub dimension: TextureDimension,
    /// `None` for the `set*` ops, which touch no texture
    pub fetch_constant: Option<u32>,
    pub is_predicated: bool,
    pub predicate_condition: bool,
    pub result: InstructionResult,
    pub operands: Vec<InstructionOperand>,
    pub attributes: TextureFetchAttributes,
}

impl ParsedTextureFetchInstruction {
    pub fn disassemble(&self) -> String {
        let mut out = String::from(self.opcode_name);
        out.push(' ');
        let mut first = true;
        if self.result.storage_target != InstructionStorageTarget::None {
            self.result.disassemble(&mut out);
            first = false;
        }
        for operand in &self.operands {
            if !first {
                out.push_str(", ");
            }
            operand.disassemble(&mut out);
            first = false;
        }
        let attrs = &self.attributes;
        if !attrs.fetch_valid_only {
            out.push_str(", FetchValidOnly=false");
        }
        if attrs.unnormalized_coordinates {
            out.push_str(", UnnormalizedTextureCoords=true");
        }
        if !attrs.use_computed_lod {
            out.push_str(", UseComputedLOD=false");
        }
        if attrs.use_register_lod {
            out.push_str(", UseRegisterLOD=true");
        }
        if attrs.use_register_gradients {
            out.push_str(", UseRegisterGradients=true");
        }
        if attrs.lod_bias != 0 {
            let _ = write!(out, ", LODBias={}", attrs.lod_bias);
        }
        for (name, offset) in [("X", attrs.offset_x), ("Y", attrs.offset_y), ("Z", attrs.offset_z)] {
            if offset != 0 {
                let _ = write!(out, ", Offset{name}={offset}");
            }
        }
        out
    }
}

/// Vector or scalar half of an ALU word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOpType {
    Nop,
    Vector,
    Scalar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAluInstruction {
    pub address: u32,
    pub op_type: AluOpType,
    pub vector_opcode: u32,
    pub scalar_opcode: u32,
    pub opcode_name: &'static str,
    pub is_predicated: bool,
    pub predicate_condition: bool,
    pub result: InstructionResult,
    pub operands: Vec<InstructionOperand>,
}

impl ParsedAluInstruction {
    pub fn is_nop(&self) -> bool {
        self.op_type == AluOpType::Nop
    }

    pub fn is_vector_type(&self) -> bool {
        self.op_type == AluOpType::Vector
    }

    pub fn is_scalar_type(&self) -> bool {
        self.op_type == AluOpType::Scalar
    }

    /// Instruction text without the predicate column
    pub fn disassemble(&self) -> String {
        if self.is_nop() {
            return "nop".to_string();
        }
        let mut out = String::from(self.opcode_name);
        if self.result.is_clamped {
            out.push_str("_sat");
        }
        out.push(' ');
        self.result.disassemble(&mut out);
        for operand in &self.operands {
            out.push_str(", ");
            operand.disassemble(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(index: u32, components: [SwizzleSource; 4], count: u32) -> InstructionOperand {
        InstructionOperand {
            storage_source: InstructionStorageSource::Register,
            storage_index: index,
            storage_addressing: InstructionAddressing::Static,
            is_negated: false,
            is_absolute_value: false,
            component_count: count,
            components,
        }
    }

    #[test]
    fn test_result_disassembly() {
        let mut result = InstructionResult {
            storage_target: InstructionStorageTarget::Register,
            storage_index: 3,
            storage_addressing: InstructionAddressing::Static,
            write_mask: ComponentMask::all(),
            components: IDENTITY_SWIZZLE,
            is_clamped: false,
        };
        let mut out = String::new();
        result.disassemble(&mut out);
        assert_eq!(out, "r3");

        result.write_mask = ComponentMask::X | ComponentMask::Y;
        result.storage_addressing = InstructionAddressing::LoopRelative;
        out.clear();
        result.disassemble(&mut out);
        assert_eq!(out, "r[3+aL].xy__");

        result.storage_target = InstructionStorageTarget::ColorTarget;
        result.storage_index = 1;
        out.clear();
        result.disassemble(&mut out);
        assert_eq!(out, "oC1.xy__");
    }

    #[test]
    fn test_operand_disassembly() {
        let mut operand = register(2, [SwizzleSource::W, SwizzleSource::X, SwizzleSource::X, SwizzleSource::X], 1);
        let mut out = String::new();
        operand.disassemble(&mut out);
        assert_eq!(out, "r2.w");

        operand.storage_source = InstructionStorageSource::ConstantFloat;
        operand.storage_addressing = InstructionAddressing::AddressRegisterRelative;
        operand.is_negated = true;
        operand.is_absolute_value = true;
        operand.component_count = 4;
        operand.components = IDENTITY_SWIZZLE;
        out.clear();
        operand.disassemble(&mut out);
        assert_eq!(out, "-|c[2+a0]|");

        out.clear();
        InstructionOperand::fetch_constant(InstructionStorageSource::VertexFetchConstant, 95).disassemble(&mut out);
        assert_eq!(out, "vf95");
    }

    #[test]
    fn test_branch_disassembly() {
        let jump = ParsedJumpInstruction {
            cf_index: 1,
            target_address: 4,
            condition_kind: ConditionKind::Conditional,
            bool_constant_index: 3,
            condition: false,
            is_backward: false,
        };
        assert_eq!(jump.disassemble(), "      cjmp !b3, L4");

        let call = ParsedCallInstruction {
            cf_index: 0,
            target_address: 9,
            condition_kind: ConditionKind::Predicated,
            bool_constant_index: 0,
            condition: true,
        };
        assert_eq!(call.disassemble(), " (p0) call L9");
    }

    #[test]
    fn test_alloc_disassembly() {
        let mut alloc = ParsedAllocInstruction {
            cf_index: 0,
            alloc_type: AllocType::Interpolators,
            count: 2,
            is_vertex_shader: false,
        };
        assert_eq!(alloc.disassemble(), "      alloc colors, 2");
        alloc.is_vertex_shader = true;
        assert_eq!(alloc.disassemble(), "      alloc interpolators, 2");
        alloc.alloc_type = AllocType::None;
        assert_eq!(alloc.disassemble(), "      alloc noalloc");
    }

    #[test]
    fn test_alu_disassembly() {
        let alu = ParsedAluInstruction {
            address: 2,
            op_type: AluOpType::Vector,
            vector_opcode: 0,
            scalar_opcode: 50,
            opcode_name: "add",
            is_predicated: false,
            predicate_condition: false,
            result: InstructionResult {
                storage_target: InstructionStorageTarget::Register,
                storage_index: 0,
                storage_addressing: InstructionAddressing::Static,
                write_mask: ComponentMask::all(),
                components: IDENTITY_SWIZZLE,
                is_clamped: true,
            },
            operands: vec![register(1, IDENTITY_SWIZZLE, 4), register(2, IDENTITY_SWIZZLE, 4)],
        };
        assert_eq!(alu.disassemble(), "add_sat r0, r1, r2");
        assert!(alu.is_vector_type());
    }
}
