//! ALU instruction layout
//!
//! One 96-bit ALU word carries a vector operation and a co-issued scalar
//! operation sharing three source slots.

use super::opcodes::{scalar, vector};

/// Decoded ALU word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AluInstruction {
    // Dword 0
    pub vector_dest: u32,
    pub vector_dest_relative: bool,
    pub abs_constants: bool,
    pub scalar_dest: u32,
    pub scalar_dest_relative: bool,
    pub export_data: bool,
    pub vector_write_mask: u32,
    pub scalar_write_mask: u32,
    pub vector_clamp: bool,
    pub scalar_clamp: bool,
    pub scalar_opcode: u32,
    // Dword 1
    pub src3_swizzle: u32,
    pub src2_swizzle: u32,
    pub src1_swizzle: u32,
    pub src3_negate: bool,
    pub src2_negate: bool,
    pub src1_negate: bool,
    pub predicate_condition: bool,
    pub is_predicated: bool,
    pub address_absolute: bool,
    pub const_1_rel_abs: bool,
    pub const_0_rel_abs: bool,
    // Dword 2
    pub src3_reg: u32,
    pub src2_reg: u32,
    pub src1_reg: u32,
    pub vector_opcode: u32,
    pub src3_sel: bool,
    pub src2_sel: bool,
    pub src1_sel: bool,
}

#[inline]
fn bit(value: u32, shift: u32) -> bool {
    (value >> shift) & 1 != 0
}

impl AluInstruction {
    pub fn decode(dwords: [u32; 3]) -> Self {
        let [d0, d1, d2] = dwords;
        Self {
            vector_dest: d0 & 0x3F,
            vector_dest_relative: bit(d0, 6),
            abs_constants: bit(d0, 7),
            scalar_dest: (d0 >> 8) & 0x3F,
            scalar_dest_relative: bit(d0, 14),
            export_data: bit(d0, 15),
            vector_write_mask: (d0 >> 16) & 0xF,
            scalar_write_mask: (d0 >> 20) & 0xF,
            vector_clamp: bit(d0, 24),
            scalar_clamp: bit(d0, 25),
            scalar_opcode: (d0 >> 26) & 0x3F,
            src3_swizzle: d1 & 0xFF,
            src2_swizzle: (d1 >> 8) & 0xFF,
            src1_swizzle: (d1 >> 16) & 0xFF,
            src3_negate: bit(d1, 24),
            src2_negate: bit(d1, 25),
            src1_negate: bit(d1, 26),
            predicate_condition: bit(d1, 27),
            is_predicated: bit(d1, 28),
            address_absolute: bit(d1, 29),
            const_1_rel_abs: bit(d1, 30),
            const_0_rel_abs: bit(d1, 31),
            src3_reg: d2 & 0xFF,
            src2_reg: (d2 >> 8) & 0xFF,
            src1_reg: (d2 >> 16) & 0xFF,
            vector_opcode: (d2 >> 24) & 0x1F,
            src3_sel: bit(d2, 29),
            src2_sel: bit(d2, 30),
            src1_sel: bit(d2, 31),
        }
    }

    pub fn encode(&self) -> [u32; 3] {
        let d0 = (self.vector_dest & 0x3F)
            | ((self.vector_dest_relative as u32) << 6)
            | ((self.abs_constants as u32) << 7)
            | ((self.scalar_dest & 0x3F) << 8)
            | ((self.scalar_dest_relative as u32) << 14)
            | ((self.export_data as u32) << 15)
            | ((self.vector_write_mask & 0xF) << 16)
            | ((self.scalar_write_mask & 0xF) << 20)
            | ((self.vector_clamp as u32) << 24)
            | ((self.scalar_clamp as u32) << 25)
            | ((self.scalar_opcode & 0x3F) << 26);
        let d1 = (self.src3_swizzle & 0xFF)
            | ((self.src2_swizzle & 0xFF) << 8)
            | ((self.src1_swizzle & 0xFF) << 16)
            | ((self.src3_negate as u32) << 24)
            | ((self.src2_negate as u32) << 25)
            | ((self.src1_negate as u32) << 26)
            | ((self.predicate_condition as u32) << 27)
            | ((self.is_predicated as u32) << 28)
            | ((self.address_absolute as u32) << 29)
            | ((self.const_1_rel_abs as u32) << 30)
            | ((self.const_0_rel_abs as u32) << 31);
        let d2 = (self.src3_reg & 0xFF)
            | ((self.src2_reg & 0xFF) << 8)
            | ((self.src1_reg & 0xFF) << 16)
            | ((self.vector_opcode & 0x1F) << 24)
            | ((self.src3_sel as u32) << 29)
            | ((self.src2_sel as u32) << 30)
            | ((self.src1_sel as u32) << 31);
        [d0, d1, d2]
    }

    /// Raw register field of source `index` (1-3)
    pub fn src_reg(&self, index: u32) -> u32 {
        match index {
            1 => self.src1_reg,
            2 => self.src2_reg,
            _ => self.src3_reg,
        }
    }

    pub fn src_swizzle(&self, index: u32) -> u32 {
        match index {
            1 => self.src1_swizzle,
            2 => self.src2_swizzle,
            _ => self.src3_swizzle,
        }
    }

    pub fn src_negate(&self, index: u32) -> bool {
        match index {
            1 => self.src1_negate,
            2 => self.src2_negate,
            _ => self.src3_negate,
        }
    }

    /// Whether source `index` reads a temporary register (else a float constant)
    pub fn src_is_temp(&self, index: u32) -> bool {
        match index {
            1 => self.src1_sel,
            2 => self.src2_sel,
            _ => self.src3_sel,
        }
    }

    pub fn has_vector_op(&self) -> bool {
        self.vector_write_mask != 0 || self.export_data || vector::has_side_effects(self.vector_opcode)
    }

    pub fn has_scalar_op(&self) -> bool {
        self.scalar_opcode != scalar::RETAIN_PREV || self.scalar_write_mask != 0
    }
}
