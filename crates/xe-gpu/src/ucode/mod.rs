//! Xenos microcode layouts
//!
//! Every bit position of the instruction set is described here; the rest of
//! the crate works on the decoded structs.

pub mod alu;
pub mod control_flow;
pub mod fetch;
pub mod opcodes;

pub use alu::AluInstruction;
pub use control_flow::{
    pack_control_flow_pair, unpack_control_flow_pair, AllocInstruction, BranchInstruction, ControlFlow,
    ControlFlowInstruction, ControlFlowOpcode, ExecInstruction, LoopEndInstruction, LoopStartInstruction,
};
pub use fetch::{
    fetch_opcode_bits, DestinationSelect, FetchOpcode, TextureDimension, TextureFetchInstruction, VertexFetchInstruction,
    VertexFormat,
};
pub use opcodes::{AluOpcodeInfo, AluOpcodeTable, ALU_SCALAR_OPCODES, ALU_VECTOR_OPCODES};

use crate::shader::{ShaderErrorKind, ShaderType};
use thiserror::Error;

/// Dwords per ALU or fetch instruction, and per control flow pair
pub const DWORDS_PER_INSTRUCTION: usize = 3;

/// Decoder failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unimplemented vector ALU opcode {0}")]
    UnimplementedVectorOpcode(u32),

    #[error("unimplemented scalar ALU opcode {0}")]
    UnimplementedScalarOpcode(u32),

    #[error("unimplemented fetch opcode {0}")]
    UnimplementedFetchOpcode(u32),

    #[error("unimplemented control flow instruction {0:?}")]
    UnimplementedControlFlow(ControlFlowOpcode),

    #[error("mini vertex fetch without a preceding full fetch")]
    MiniFetchWithoutFullFetch,

    #[error("invalid vertex format {0}")]
    InvalidVertexFormat(u32),

    #[error("invalid export destination {dest} in a {shader_type} shader")]
    InvalidExportDestination { dest: u32, shader_type: ShaderType },

    #[error("instruction {address} lies outside the microcode ({dword_count} dwords)")]
    InstructionOutOfRange { address: u32, dword_count: usize },

    #[error("control flow ends in a partial instruction pair at dword {0}")]
    TruncatedControlFlow(usize),
}

impl DecodeError {
    /// Category recorded on the shader
    pub fn kind(&self) -> ShaderErrorKind {
        match self {
            Self::UnimplementedVectorOpcode(_)
            | Self::UnimplementedScalarOpcode(_)
            | Self::UnimplementedFetchOpcode(_)
            | Self::UnimplementedControlFlow(_) => ShaderErrorKind::UnimplementedInstruction,
            Self::MiniFetchWithoutFullFetch
            | Self::InvalidVertexFormat(_)
            | Self::InvalidExportDestination { .. }
            | Self::InstructionOutOfRange { .. }
            | Self::TruncatedControlFlow(_) => ShaderErrorKind::InvalidEncoding,
        }
    }
}

/// The control flow instructions at the head of a microcode buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlFlowProgram {
    pub instructions: Vec<ControlFlowInstruction>,
    /// Dword offset of a trailing partial pair, if any
    pub truncated_at: Option<usize>,
}

impl ControlFlowProgram {
    /// Read control flow pairs until the first ALU/fetch word
    ///
    /// The program ends at the lowest address referenced by a non-empty exec
    /// (times three) or at the end of the buffer, whichever comes first.
    pub fn read(ucode: &[u32]) -> Self {
        let mut program = Self::default();
        let mut end = ucode.len();
        let mut offset = 0;

        while offset < end {
            if offset + DWORDS_PER_INSTRUCTION > ucode.len() {
                program.truncated_at = Some(offset);
                break;
            }
            let pair = unpack_control_flow_pair([ucode[offset], ucode[offset + 1], ucode[offset + 2]]);
            for cf in pair {
                if let ControlFlow::Exec(exec) = cf.decode() {
                    if exec.count > 0 {
                        end = end.min(exec.address as usize * DWORDS_PER_INSTRUCTION);
                    }
                }
                program.instructions.push(cf);
            }
            offset += DWORDS_PER_INSTRUCTION;
        }

        program
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Read the three dwords of ALU/fetch instruction `address`
pub fn instruction_dwords(ucode: &[u32], address: u32) -> Result<[u32; 3], DecodeError> {
    let base = address as usize * DWORDS_PER_INSTRUCTION;
    match ucode.get(base..base + DWORDS_PER_INSTRUCTION) {
        Some(&[d0, d1, d2]) => Ok([d0, d1, d2]),
        _ => Err(DecodeError::InstructionOutOfRange {
            address,
            dword_count: ucode.len(),
        }),
    }
}
