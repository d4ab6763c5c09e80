//! Instruction decoder
//!
//! Turns raw ucode structs into parsed instructions, resolving swizzles,
//! operand sources and export destinations.

use crate::parsed::{
    AllocType, AluOpType, ComponentMask, ConditionKind, InstructionAddressing, InstructionOperand, InstructionResult,
    InstructionStorageSource, InstructionStorageTarget, ParsedAllocInstruction, ParsedAluInstruction, ParsedCallInstruction,
    ParsedControlFlow, ParsedExecInstruction, ParsedJumpInstruction, ParsedLoopEndInstruction, ParsedLoopStartInstruction,
    ParsedReturnInstruction, ParsedTextureFetchInstruction, ParsedVertexFetchInstruction, SwizzleSource,
    TextureFetchAttributes, VertexFetchAttributes, IDENTITY_SWIZZLE,
};
use crate::shader::ShaderType;
use crate::ucode::{
    AluInstruction, AluOpcodeTable, BranchInstruction, ControlFlow, ControlFlowInstruction, ControlFlowOpcode,
    DecodeError, DestinationSelect, ExecInstruction, FetchOpcode, TextureDimension, TextureFetchInstruction,
    VertexFetchInstruction, VertexFormat,
};

pub fn parse_control_flow(
    cf: &ControlFlowInstruction,
    cf_index: u32,
    shader_type: ShaderType,
) -> Result<ParsedControlFlow, DecodeError> {
    let parsed = match cf.decode() {
        ControlFlow::Nop => ParsedControlFlow::Nop { cf_index },
        ControlFlow::Exec(exec) => ParsedControlFlow::Exec(parse_exec(&exec, cf_index)),
        ControlFlow::LoopStart(loop_start) => ParsedControlFlow::LoopStart(ParsedLoopStartInstruction {
            cf_index,
            loop_constant_index: loop_start.loop_id,
            is_repeat: loop_start.is_repeat,
            loop_skip_address: loop_start.address,
        }),
        ControlFlow::LoopEnd(loop_end) => ParsedControlFlow::LoopEnd(ParsedLoopEndInstruction {
            cf_index,
            is_predicated_break: loop_end.is_predicated_break,
            predicate_condition: loop_end.condition,
            loop_constant_index: loop_end.loop_id,
            loop_body_address: loop_end.address,
        }),
        ControlFlow::CondCall(call) => ParsedControlFlow::Call(ParsedCallInstruction {
            cf_index,
            target_address: call.address,
            condition_kind: branch_condition_kind(&call),
            bool_constant_index: call.bool_address,
            condition: call.condition,
        }),
        ControlFlow::Return => ParsedControlFlow::Return(ParsedReturnInstruction { cf_index }),
        ControlFlow::CondJmp(jump) => ParsedControlFlow::Jump(ParsedJumpInstruction {
            cf_index,
            target_address: jump.address,
            condition_kind: branch_condition_kind(&jump),
            bool_constant_index: jump.bool_address,
            condition: jump.condition,
            is_backward: jump.is_backward,
        }),
        ControlFlow::Alloc(alloc) => ParsedControlFlow::Alloc(ParsedAllocInstruction {
            cf_index,
            alloc_type: AllocType::from_raw(alloc.alloc_type),
            count: alloc.size,
            is_vertex_shader: shader_type == ShaderType::Vertex,
        }),
        ControlFlow::MarkVsFetchDone => return Err(DecodeError::UnimplementedControlFlow(cf.opcode())),
    };
    Ok(parsed)
}

fn parse_exec(exec: &ExecInstruction, cf_index: u32) -> ParsedExecInstruction {
    let condition_kind = if exec.uses_bool_constant() {
        ConditionKind::Conditional
    } else if exec.uses_predicate() {
        ConditionKind::Predicated
    } else {
        ConditionKind::Unconditional
    };
    let opcode_name = match exec.opcode {
        ControlFlowOpcode::CondExec | ControlFlowOpcode::CondExecPredClean => "cexec",
        ControlFlowOpcode::CondExecEnd | ControlFlowOpcode::CondExecPredCleanEnd => "cexece",
        ControlFlowOpcode::ExecEnd | ControlFlowOpcode::CondExecPredEnd => "exece",
        _ => "exec",
    };
    ParsedExecInstruction {
        cf_index,
        opcode: exec.opcode,
        opcode_name,
        instruction_address: exec.address,
        instruction_count: exec.count,
        condition_kind,
        bool_constant_index: exec.bool_address,
        condition: exec.condition,
        is_end: exec.opcode.is_exec_end(),
        is_predicate_clean: exec.is_predicate_clean,
        is_yield: exec.is_yield,
        sequence: exec.sequence,
    }
}

fn branch_condition_kind(branch: &BranchInstruction) -> ConditionKind {
    if branch.is_unconditional {
        ConditionKind::Unconditional
    } else if branch.is_predicated {
        ConditionKind::Predicated
    } else {
        ConditionKind::Conditional
    }
}

/// Result of a fetch from its 3-bit-per-component destination swizzle
fn fetch_result(dst_reg: u32, dst_relative: bool, dst_swizzle: u32) -> InstructionResult {
    let mut result = register_result(dst_reg, dst_relative);
    for j in 0..4u32 {
        let source = match DestinationSelect::from_swizzle(dst_swizzle, j) {
            DestinationSelect::Component(c) => SwizzleSource::from_component(c),
            DestinationSelect::Zero => SwizzleSource::Zero,
            DestinationSelect::One => SwizzleSource::One,
            DestinationSelect::Keep | DestinationSelect::Masked => continue,
        };
        result.write_mask |= ComponentMask::component(j);
        result.components[j as usize] = source;
    }
    result
}

fn register_result(reg: u32, relative: bool) -> InstructionResult {
    InstructionResult {
        storage_target: InstructionStorageTarget::Register,
        storage_index: reg,
        storage_addressing: if relative {
            InstructionAddressing::LoopRelative
        } else {
            InstructionAddressing::Static
        },
        write_mask: ComponentMask::empty(),
        components: IDENTITY_SWIZZLE,
        is_clamped: false,
    }
}

fn export_result(dest: u32, shader_type: ShaderType) -> Result<InstructionResult, DecodeError> {
    let (storage_target, storage_index) = match (shader_type, dest) {
        (ShaderType::Vertex, 0..=15) => (InstructionStorageTarget::Interpolator, dest),
        (ShaderType::Vertex, 62) => (InstructionStorageTarget::Position, 0),
        (ShaderType::Vertex, 63) => (InstructionStorageTarget::PointSize, 0),
        (ShaderType::Pixel, 0..=3) => (InstructionStorageTarget::ColorTarget, dest),
        (ShaderType::Pixel, 61) => (InstructionStorageTarget::Depth, 0),
        (_, 32) => (InstructionStorageTarget::ExportAddress, 0),
        (_, 33..=37) => (InstructionStorageTarget::ExportData, dest - 33),
        _ => return Err(DecodeError::InvalidExportDestination { dest, shader_type }),
    };
    Ok(InstructionResult {
        storage_target,
        storage_index,
        ..InstructionResult::none()
    })
}

fn resolve_swizzle(swizzle: u32, component_count: u32) -> [SwizzleSource; 4] {
    let mut components = IDENTITY_SWIZZLE;
    match component_count {
        0 => {}
        1 => components[0] = SwizzleSource::from_component(((swizzle >> 6) + 3) & 0x3),
        2 => {
            components[0] = SwizzleSource::from_component(((swizzle >> 6) + 3) & 0x3);
            components[1] = SwizzleSource::from_component(swizzle & 0x3);
        }
        _ => {
            for (j, component) in components.iter_mut().enumerate() {
                let j = j as u32;
                *component = SwizzleSource::from_component(((swizzle >> (2 * j)) + j) & 0x3);
            }
        }
    }
    components
}

/// Constant slot used by source `index`: later sources take slot 1 once an
/// earlier source already reads a constant
fn constant_slot(op: &AluInstruction, index: u32) -> u32 {
    match index {
        1 => 0,
        2 => u32::from(!op.src1_sel),
        _ => u32::from(!op.src1_sel || !op.src2_sel),
    }
}

fn constant_addressing(op: &AluInstruction, slot: u32) -> InstructionAddressing {
    let is_relative = if slot == 0 { op.const_0_rel_abs } else { op.const_1_rel_abs };
    match (is_relative, op.address_absolute) {
        (false, _) => InstructionAddressing::Static,
        (true, true) => InstructionAddressing::AddressRegisterRelative,
        (true, false) => InstructionAddressing::LoopRelative,
    }
}

fn alu_operand(op: &AluInstruction, index: u32, component_count: u32) -> InstructionOperand {
    let reg = op.src_reg(index);
    let (storage_source, storage_index, storage_addressing, is_absolute_value) = if op.src_is_temp(index) {
        let addressing = if reg & 0x40 != 0 {
            InstructionAddressing::LoopRelative
        } else {
            InstructionAddressing::Static
        };
        (InstructionStorageSource::Register, reg & 0x3F, addressing, reg & 0x80 != 0)
    } else {
        let slot = constant_slot(op, index);
        (
            InstructionStorageSource::ConstantFloat,
            reg,
            constant_addressing(op, slot),
            op.abs_constants,
        )
    };
    InstructionOperand {
        storage_source,
        storage_index,
        storage_addressing,
        is_negated: op.src_negate(index),
        is_absolute_value,
        component_count,
        components: resolve_swizzle(op.src_swizzle(index), component_count),
    }
}

/// Operands of `mulsc`, `addsc` and `subsc`: a constant from source 3 and a
/// register packed into the source 3 swizzle field
fn scalar_constant_operands(op: &AluInstruction) -> Vec<InstructionOperand> {
    let swizzle = op.src3_swizzle;
    let slot = constant_slot(op, 3);
    let mut constant = InstructionOperand {
        storage_source: InstructionStorageSource::ConstantFloat,
        storage_index: op.src3_reg,
        storage_addressing: constant_addressing(op, slot),
        is_negated: op.src3_negate,
        is_absolute_value: op.abs_constants,
        component_count: 1,
        components: IDENTITY_SWIZZLE,
    };
    constant.components[0] = SwizzleSource::from_component(((swizzle >> 6) + 3) & 0x3);

    let reg = (swizzle & 0x3C) | (op.scalar_opcode & 0x1) | (u32::from(op.src3_sel) << 1);
    let mut register = InstructionOperand {
        storage_source: InstructionStorageSource::Register,
        storage_index: reg,
        storage_addressing: InstructionAddressing::Static,
        is_negated: op.src3_negate,
        is_absolute_value: false,
        component_count: 1,
        components: IDENTITY_SWIZZLE,
    };
    register.components[0] = SwizzleSource::from_component(swizzle & 0x3);

    vec![constant, register]
}

pub fn parse_alu_vector(
    op: &AluInstruction,
    table: &AluOpcodeTable,
    shader_type: ShaderType,
    address: u32,
) -> Result<ParsedAluInstruction, DecodeError> {
    let info = table
        .get(op.vector_opcode)
        .ok_or(DecodeError::UnimplementedVectorOpcode(op.vector_opcode))?;

    let mut result = if op.export_data {
        export_result(op.vector_dest, shader_type)?
    } else {
        register_result(op.vector_dest, op.vector_dest_relative)
    };
    result.write_mask = ComponentMask::from_bits_truncate(op.vector_write_mask);
    result.is_clamped = op.vector_clamp;

    let operands = (1..=info.argument_count)
        .map(|index| alu_operand(op, index, info.src_swizzle_component_count))
        .collect();

    Ok(ParsedAluInstruction {
        address,
        op_type: AluOpType::Vector,
        vector_opcode: op.vector_opcode,
        scalar_opcode: op.scalar_opcode,
        opcode_name: info.name,
        is_predicated: op.is_predicated,
        predicate_condition: op.predicate_condition,
        result,
        operands,
    })
}

pub fn parse_alu_scalar(
    op: &AluInstruction,
    table: &AluOpcodeTable,
    shader_type: ShaderType,
    address: u32,
) -> Result<ParsedAluInstruction, DecodeError> {
    let info = table
        .get(op.scalar_opcode)
        .ok_or(DecodeError::UnimplementedScalarOpcode(op.scalar_opcode))?;

    // Scalar exports go to the vector destination
    let mut result = if op.export_data {
        export_result(op.vector_dest, shader_type)?
    } else {
        register_result(op.scalar_dest, op.scalar_dest_relative)
    };
    result.write_mask = ComponentMask::from_bits_truncate(op.scalar_write_mask);
    result.is_clamped = op.scalar_clamp;

    let operands = match info.argument_count {
        0 => Vec::new(),
        1 => vec![alu_operand(op, 3, info.src_swizzle_component_count)],
        _ => scalar_constant_operands(op),
    };

    Ok(ParsedAluInstruction {
        address,
        op_type: AluOpType::Scalar,
        vector_opcode: op.vector_opcode,
        scalar_opcode: op.scalar_opcode,
        opcode_name: info.name,
        is_predicated: op.is_predicated,
        predicate_condition: op.predicate_condition,
        result,
        operands,
    })
}

/// ALU word with neither a vector nor a scalar op
pub fn parse_alu_nop(op: &AluInstruction, address: u32) -> ParsedAluInstruction {
    ParsedAluInstruction {
        address,
        op_type: AluOpType::Nop,
        vector_opcode: op.vector_opcode,
        scalar_opcode: op.scalar_opcode,
        opcode_name: "nop",
        is_predicated: op.is_predicated,
        predicate_condition: op.predicate_condition,
        result: InstructionResult::none(),
        operands: Vec::new(),
    }
}

/// Parse a vertex fetch; mini fetches take slot, source and stride from
/// `previous_full`
pub fn parse_vertex_fetch(
    op: &VertexFetchInstruction,
    previous_full: Option<&VertexFetchInstruction>,
    address: u32,
) -> Result<ParsedVertexFetchInstruction, DecodeError> {
    let full = if op.is_mini_fetch {
        previous_full.ok_or(DecodeError::MiniFetchWithoutFullFetch)?
    } else {
        op
    };
    let data_format = VertexFormat::from_raw(op.format).ok_or(DecodeError::InvalidVertexFormat(op.format))?;
    let fetch_constant = full.fetch_constant_index();

    let mut source = InstructionOperand {
        storage_source: InstructionStorageSource::Register,
        storage_index: full.src_reg,
        storage_addressing: if full.src_relative {
            InstructionAddressing::LoopRelative
        } else {
            InstructionAddressing::Static
        },
        is_negated: false,
        is_absolute_value: false,
        component_count: 1,
        components: IDENTITY_SWIZZLE,
    };
    source.components[0] = SwizzleSource::from_component(full.src_swizzle);

    Ok(ParsedVertexFetchInstruction {
        address,
        opcode_name: if op.is_mini_fetch { "vfetch_mini" } else { "vfetch_full" },
        is_mini_fetch: op.is_mini_fetch,
        is_predicated: op.is_predicated,
        predicate_condition: op.predicate_condition,
        fetch_constant,
        result: fetch_result(op.dst_reg, op.dst_relative, op.dst_swizzle),
        operands: vec![
            source,
            InstructionOperand::fetch_constant(InstructionStorageSource::VertexFetchConstant, fetch_constant),
        ],
        attributes: VertexFetchAttributes {
            data_format,
            offset: op.offset,
            stride: full.stride,
            exp_adjust: op.exp_adjust,
            prefetch_count: op.prefetch_count,
            is_index_rounded: op.is_index_rounded,
            is_signed: op.is_signed,
            is_integer: op.is_integer,
            signed_rf_mode: op.signed_rf_mode,
        },
    })
}

fn texture_fetch_name(dimension: TextureDimension) -> &'static str {
    match dimension {
        TextureDimension::D1 => "tfetch1D",
        TextureDimension::D2 => "tfetch2D",
        TextureDimension::D3 => "tfetch3D",
        TextureDimension::Cube => "tfetchCube",
    }
}

/// Parse a texture fetch or one of the texture get/set ops
pub fn parse_texture_fetch(
    op: &TextureFetchInstruction,
    address: u32,
) -> Result<ParsedTextureFetchInstruction, DecodeError> {
    let opcode = match FetchOpcode::from_raw(op.opcode) {
        Some(FetchOpcode::VertexFetch) | None => return Err(DecodeError::UnimplementedFetchOpcode(op.opcode)),
        Some(opcode) => opcode,
    };
    let dimension = TextureDimension::from_raw(op.dimension);
    let (opcode_name, src_component_count) = match opcode {
        FetchOpcode::TextureFetch => (texture_fetch_name(dimension), dimension.coordinate_count()),
        FetchOpcode::SetTextureLod => (opcode.name(), 1),
        FetchOpcode::SetTextureGradientsHorz | FetchOpcode::SetTextureGradientsVert => (opcode.name(), 3),
        _ => (opcode.name(), dimension.coordinate_count()),
    };

    let mut source = InstructionOperand {
        storage_source: InstructionStorageSource::Register,
        storage_index: op.src_reg,
        storage_addressing: if op.src_relative {
            InstructionAddressing::LoopRelative
        } else {
            InstructionAddressing::Static
        },
        is_negated: false,
        is_absolute_value: false,
        component_count: src_component_count,
        components: IDENTITY_SWIZZLE,
    };
    for j in 0..src_component_count {
        source.components[j as usize] = SwizzleSource::from_component(op.src_swizzle >> (2 * j));
    }

    let (fetch_constant, result, operands) = if opcode.is_texture_state_write() {
        (None, InstructionResult::none(), vec![source])
    } else {
        (
            Some(op.const_index),
            fetch_result(op.dst_reg, op.dst_relative, op.dst_swizzle),
            vec![
                source,
                InstructionOperand::fetch_constant(InstructionStorageSource::TextureFetchConstant, op.const_index),
            ],
        )
    };

    Ok(ParsedTextureFetchInstruction {
        address,
        opcode,
        opcode_name,
        dimension,
        fetch_constant,
        is_predicated: op.is_predicated,
        predicate_condition: op.predicate_condition,
        result,
        operands,
        attributes: TextureFetchAttributes {
            fetch_valid_only: op.fetch_valid_only,
            unnormalized_coordinates: op.unnormalized_coordinates,
            mag_filter: op.mag_filter,
            min_filter: op.min_filter,
            mip_filter: op.mip_filter,
            aniso_filter: op.aniso_filter,
            vol_mag_filter: op.vol_mag_filter,
            vol_min_filter: op.vol_min_filter,
            use_computed_lod: op.use_computed_lod,
            use_register_lod: op.use_register_lod,
            use_register_gradients: op.use_register_gradients,
            lod_bias: op.lod_bias,
            offset_x: op.offset_x,
            offset_y: op.offset_y,
            offset_z: op.offset_z,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ucode::opcodes::{scalar, vector};
    use crate::ucode::{ALU_SCALAR_OPCODES, ALU_VECTOR_OPCODES};

    #[test]
    fn test_swizzle_resolution() {
        assert_eq!(resolve_swizzle(0, 4), IDENTITY_SWIZZLE);
        // Every component reads .x
        let all_x = (3 << 2) | (2 << 4) | (1 << 6);
        assert_eq!(resolve_swizzle(all_x, 4), [SwizzleSource::X; 4]);
        assert_eq!(resolve_swizzle(0, 1)[0], SwizzleSource::W);
        let two = resolve_swizzle(0b11_000010, 2);
        assert_eq!(two[0], SwizzleSource::Z);
        assert_eq!(two[1], SwizzleSource::Z);
    }

    #[test]
    fn test_vector_opcode_bounds() {
        let mut op = AluInstruction {
            vector_opcode: 31,
            vector_write_mask: 0xF,
            scalar_opcode: scalar::RETAIN_PREV,
            ..Default::default()
        };
        let parsed = parse_alu_vector(&op, &ALU_VECTOR_OPCODES, ShaderType::Pixel, 0).unwrap();
        assert_eq!(parsed.opcode_name, "opc_31");

        op.vector_opcode = 32;
        assert_eq!(
            parse_alu_vector(&op, &ALU_VECTOR_OPCODES, ShaderType::Pixel, 0),
            Err(DecodeError::UnimplementedVectorOpcode(32))
        );
    }

    #[test]
    fn test_scalar_holes() {
        let op = AluInstruction {
            scalar_opcode: 41,
            ..Default::default()
        };
        assert_eq!(
            parse_alu_scalar(&op, &ALU_SCALAR_OPCODES, ShaderType::Vertex, 0),
            Err(DecodeError::UnimplementedScalarOpcode(41))
        );
    }

    #[test]
    fn test_register_and_constant_operands() {
        let op = AluInstruction {
            vector_opcode: vector::MAD,
            vector_write_mask: 0xF,
            src1_sel: false,
            src1_reg: 200,
            src2_sel: true,
            src2_reg: 0x80 | 0x40 | 5,
            src3_sel: false,
            src3_reg: 7,
            const_0_rel_abs: false,
            const_1_rel_abs: true,
            address_absolute: true,
            abs_constants: true,
            ..Default::default()
        };
        let parsed = parse_alu_vector(&op, &ALU_VECTOR_OPCODES, ShaderType::Vertex, 4).unwrap();
        assert_eq!(parsed.operands.len(), 3);

        let src1 = &parsed.operands[0];
        assert_eq!(src1.storage_source, InstructionStorageSource::ConstantFloat);
        assert_eq!(src1.storage_index, 200);
        assert_eq!(src1.storage_addressing, InstructionAddressing::Static);
        assert!(src1.is_absolute_value);

        let src2 = &parsed.operands[1];
        assert_eq!(src2.storage_source, InstructionStorageSource::Register);
        assert_eq!(src2.storage_index, 5);
        assert_eq!(src2.storage_addressing, InstructionAddressing::LoopRelative);
        assert!(src2.is_absolute_value);

        // src1 is a constant, so src3 uses the second constant slot
        let src3 = &parsed.operands[2];
        assert_eq!(src3.storage_addressing, InstructionAddressing::AddressRegisterRelative);
    }

    #[test]
    fn test_export_destinations() {
        let mut op = AluInstruction {
            vector_opcode: vector::ADD,
            vector_write_mask: 0xF,
            export_data: true,
            vector_dest: 62,
            ..Default::default()
        };
        let parsed = parse_alu_vector(&op, &ALU_VECTOR_OPCODES, ShaderType::Vertex, 0).unwrap();
        assert_eq!(parsed.result.storage_target, InstructionStorageTarget::Position);

        op.vector_dest = 35;
        let parsed = parse_alu_vector(&op, &ALU_VECTOR_OPCODES, ShaderType::Pixel, 0).unwrap();
        assert_eq!(parsed.result.storage_target, InstructionStorageTarget::ExportData);
        assert_eq!(parsed.result.storage_index, 2);

        op.vector_dest = 62;
        assert_eq!(
            parse_alu_vector(&op, &ALU_VECTOR_OPCODES, ShaderType::Pixel, 0),
            Err(DecodeError::InvalidExportDestination {
                dest: 62,
                shader_type: ShaderType::Pixel
            })
        );
    }

    #[test]
    fn test_scalar_export_uses_vector_dest() {
        let op = AluInstruction {
            scalar_opcode: scalar::RCP,
            scalar_write_mask: 0x8,
            scalar_dest: 9,
            vector_dest: 1,
            export_data: true,
            ..Default::default()
        };
        let parsed = parse_alu_scalar(&op, &ALU_SCALAR_OPCODES, ShaderType::Pixel, 0).unwrap();
        assert_eq!(parsed.result.storage_target, InstructionStorageTarget::ColorTarget);
        assert_eq!(parsed.result.storage_index, 1);
        assert_eq!(parsed.result.write_mask, ComponentMask::W);
    }

    #[test]
    fn test_scalar_constant_operands() {
        let op = AluInstruction {
            scalar_opcode: scalar::MULSC_0 + 1,
            scalar_write_mask: 0x1,
            src3_reg: 12,
            src3_sel: true,
            src3_swizzle: 0b00_1001_00,
            src1_sel: true,
            src2_sel: true,
            ..Default::default()
        };
        let parsed = parse_alu_scalar(&op, &ALU_SCALAR_OPCODES, ShaderType::Vertex, 0).unwrap();
        assert_eq!(parsed.opcode_name, "mulsc");
        assert_eq!(parsed.operands[0].storage_source, InstructionStorageSource::ConstantFloat);
        assert_eq!(parsed.operands[0].storage_index, 12);
        assert_eq!(parsed.operands[1].storage_source, InstructionStorageSource::Register);
        assert_eq!(parsed.operands[1].storage_index, 0b1001_00 | 0x1 | 0x2);
    }

    #[test]
    fn test_mini_fetch_needs_full_fetch() {
        let full = VertexFetchInstruction {
            const_index: 1,
            src_reg: 4,
            stride: 6,
            format: 38,
            ..Default::default()
        };
        let mini = VertexFetchInstruction {
            is_mini_fetch: true,
            const_index: 9,
            format: 37,
            offset: 4,
            ..Default::default()
        };
        assert_eq!(parse_vertex_fetch(&mini, None, 0), Err(DecodeError::MiniFetchWithoutFullFetch));

        let parsed = parse_vertex_fetch(&mini, Some(&full), 1).unwrap();
        assert_eq!(parsed.fetch_constant, 3);
        assert_eq!(parsed.operands[0].storage_index, 4);
        assert_eq!(parsed.attributes.stride, 6);
        assert_eq!(parsed.attributes.offset, 4);
        assert_eq!(parsed.opcode_name, "vfetch_mini");
    }

    #[test]
    fn test_invalid_vertex_format() {
        let op = VertexFetchInstruction {
            format: 1,
            ..Default::default()
        };
        assert_eq!(parse_vertex_fetch(&op, None, 0), Err(DecodeError::InvalidVertexFormat(1)));
    }

    #[test]
    fn test_texture_fetch() {
        let op = TextureFetchInstruction {
            opcode: 1,
            const_index: 5,
            dimension: 2,
            src_swizzle: 0b00_10_01,
            dst_swizzle: 0b111_010_001_000,
            ..Default::default()
        };
        let parsed = parse_texture_fetch(&op, 3).unwrap();
        assert_eq!(parsed.opcode_name, "tfetch3D");
        assert_eq!(parsed.fetch_constant, Some(5));
        assert_eq!(parsed.operands[0].component_count, 3);
        assert_eq!(
            &parsed.operands[0].components[..3],
            &[SwizzleSource::Y, SwizzleSource::Z, SwizzleSource::X]
        );
        assert_eq!(parsed.result.write_mask, ComponentMask::X | ComponentMask::Y | ComponentMask::Z);

        let set_lod = TextureFetchInstruction { opcode: 24, ..op };
        let parsed = parse_texture_fetch(&set_lod, 3).unwrap();
        assert_eq!(parsed.fetch_constant, None);
        assert_eq!(parsed.operands.len(), 1);

        let bad = TextureFetchInstruction { opcode: 5, ..op };
        assert_eq!(parse_texture_fetch(&bad, 3), Err(DecodeError::UnimplementedFetchOpcode(5)));
    }

    #[test]
    fn test_control_flow_parse() {
        let cf = ControlFlowInstruction::new(0, (ControlFlowOpcode::MarkVsFetchDone as u16) << 12);
        assert_eq!(
            parse_control_flow(&cf, 0, ShaderType::Vertex),
            Err(DecodeError::UnimplementedControlFlow(ControlFlowOpcode::MarkVsFetchDone))
        );
    }
}
