//! ALU opcode tables
//!
//! Static, read-only data indexed by raw opcode. Lookups are bounds checked so
//! an opcode past the end of a table (or an unassigned entry) reports `None`
//! instead of reading neighbouring data.

/// Table entry for one ALU opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOpcodeInfo {
    pub name: &'static str,
    /// Number of source operands
    pub argument_count: u32,
    /// Number of swizzle components read from each source
    pub src_swizzle_component_count: u32,
}

const fn op(name: &'static str, argument_count: u32, src_swizzle_component_count: u32) -> Option<AluOpcodeInfo> {
    Some(AluOpcodeInfo {
        name,
        argument_count,
        src_swizzle_component_count,
    })
}

/// Bounds-checked opcode table
#[derive(Debug)]
pub struct AluOpcodeTable {
    entries: &'static [Option<AluOpcodeInfo>],
}

impl AluOpcodeTable {
    pub const fn new(entries: &'static [Option<AluOpcodeInfo>]) -> Self {
        Self { entries }
    }

    pub fn get(&self, opcode: u32) -> Option<&'static AluOpcodeInfo> {
        self.entries.get(opcode as usize)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub mod vector {
    pub const ADD: u32 = 0;
    pub const MAD: u32 = 11;
    pub const DP4: u32 = 15;
    pub const SETP_EQ_PUSH: u32 = 20;
    pub const SETP_GE_PUSH: u32 = 23;
    pub const KILL_EQ: u32 = 24;
    pub const KILL_NE: u32 = 27;
    pub const MAXA: u32 = 29;

    /// Opcodes that have an effect even when nothing is written
    pub fn has_side_effects(opcode: u32) -> bool {
        matches!(opcode, SETP_EQ_PUSH..=KILL_NE | MAXA)
    }
}

pub mod scalar {
    pub const ADDS: u32 = 0;
    pub const MULS: u32 = 2;
    pub const RCP: u32 = 19;
    pub const MULSC_0: u32 = 42;
    pub const ADDSC_0: u32 = 44;
    pub const SIN: u32 = 48;
    pub const RETAIN_PREV: u32 = 50;
}

static VECTOR_ENTRIES: [Option<AluOpcodeInfo>; 32] = [
    op("add", 2, 4),          // 0
    op("mul", 2, 4),          // 1
    op("max", 2, 4),          // 2
    op("min", 2, 4),          // 3
    op("seq", 2, 4),          // 4
    op("sgt", 2, 4),          // 5
    op("sge", 2, 4),          // 6
    op("sne", 2, 4),          // 7
    op("frc", 1, 4),          // 8
    op("trunc", 1, 4),        // 9
    op("floor", 1, 4),        // 10
    op("mad", 3, 4),          // 11
    op("cndeq", 3, 4),        // 12
    op("cndge", 3, 4),        // 13
    op("cndgt", 3, 4),        // 14
    op("dp4", 2, 4),          // 15
    op("dp3", 2, 4),          // 16
    op("dp2add", 3, 4),       // 17
    op("cube", 2, 4),         // 18
    op("max4", 1, 4),         // 19
    op("setp_eq_push", 2, 4), // 20
    op("setp_ne_push", 2, 4), // 21
    op("setp_gt_push", 2, 4), // 22
    op("setp_ge_push", 2, 4), // 23
    op("kill_eq", 2, 4),      // 24
    op("kill_gt", 2, 4),      // 25
    op("kill_ge", 2, 4),      // 26
    op("kill_ne", 2, 4),      // 27
    op("dst", 2, 4),          // 28
    op("maxa", 2, 4),         // 29
    op("opc_30", 2, 4),       // 30
    op("opc_31", 2, 4),       // 31
];

static SCALAR_ENTRIES: [Option<AluOpcodeInfo>; 64] = [
    op("adds", 1, 2),       // 0
    op("adds_prev", 1, 1),  // 1
    op("muls", 1, 2),       // 2
    op("muls_prev", 1, 1),  // 3
    op("muls_prev2", 1, 2), // 4
    op("maxs", 1, 2),       // 5
    op("mins", 1, 2),       // 6
    op("seqs", 1, 1),       // 7
    op("sgts", 1, 1),       // 8
    op("sges", 1, 1),       // 9
    op("snes", 1, 1),       // 10
    op("frcs", 1, 1),       // 11
    op("truncs", 1, 1),     // 12
    op("floors", 1, 1),     // 13
    op("exp", 1, 1),        // 14
    op("logc", 1, 1),       // 15
    op("log", 1, 1),        // 16
    op("rcpc", 1, 1),       // 17
    op("rcpf", 1, 1),       // 18
    op("rcp", 1, 1),        // 19
    op("rsqc", 1, 1),       // 20
    op("rsqf", 1, 1),       // 21
    op("rsq", 1, 1),        // 22
    op("maxas", 1, 2),      // 23
    op("maxasf", 1, 2),     // 24
    op("subs", 1, 2),       // 25
    op("subs_prev", 1, 1),  // 26
    op("setp_eq", 1, 1),    // 27
    op("setp_ne", 1, 1),    // 28
    op("setp_gt", 1, 1),    // 29
    op("setp_ge", 1, 1),    // 30
    op("setp_inv", 1, 1),   // 31
    op("setp_pop", 1, 1),   // 32
    op("setp_clr", 0, 0),   // 33
    op("setp_rstr", 1, 1),  // 34
    op("kills_eq", 1, 1),   // 35
    op("kills_gt", 1, 1),   // 36
    op("kills_ge", 1, 1),   // 37
    op("kills_ne", 1, 1),   // 38
    op("kills_one", 1, 1),  // 39
    op("sqrt", 1, 1),       // 40
    None,                   // 41
    op("mulsc", 2, 1),      // 42
    op("mulsc", 2, 1),      // 43
    op("addsc", 2, 1),      // 44
    op("addsc", 2, 1),      // 45
    op("subsc", 2, 1),      // 46
    op("subsc", 2, 1),      // 47
    op("sin", 1, 1),        // 48
    op("cos", 1, 1),        // 49
    op("retain_prev", 0, 0), // 50
    None, None, None, None, None, None, None, None, None, None, None, None, None, // 51-63
];

/// Vector ALU opcodes 0-31
pub static ALU_VECTOR_OPCODES: AluOpcodeTable = AluOpcodeTable::new(&VECTOR_ENTRIES);

/// Scalar ALU opcodes 0-63
pub static ALU_SCALAR_OPCODES: AluOpcodeTable = AluOpcodeTable::new(&SCALAR_ENTRIES);
