//! Control flow instruction layouts
//!
//! Control flow instructions are 48 bits wide and packed in pairs into three
//! dwords at the start of the microcode. Each instruction is kept as a low
//! 32-bit word and a high 16-bit half; the opcode lives in bits 12-15 of the
//! high half.

/// Control flow opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlFlowOpcode {
    Nop = 0,
    Exec = 1,
    ExecEnd = 2,
    CondExec = 3,
    CondExecEnd = 4,
    CondExecPred = 5,
    CondExecPredEnd = 6,
    LoopStart = 7,
    LoopEnd = 8,
    CondCall = 9,
    Return = 10,
    CondJmp = 11,
    Alloc = 12,
    CondExecPredClean = 13,
    CondExecPredCleanEnd = 14,
    MarkVsFetchDone = 15,
}

impl From<u8> for ControlFlowOpcode {
    fn from(v: u8) -> Self {
        match v & 0xF {
            0 => ControlFlowOpcode::Nop,
            1 => ControlFlowOpcode::Exec,
            2 => ControlFlowOpcode::ExecEnd,
            3 => ControlFlowOpcode::CondExec,
            4 => ControlFlowOpcode::CondExecEnd,
            5 => ControlFlowOpcode::CondExecPred,
            6 => ControlFlowOpcode::CondExecPredEnd,
            7 => ControlFlowOpcode::LoopStart,
            8 => ControlFlowOpcode::LoopEnd,
            9 => ControlFlowOpcode::CondCall,
            10 => ControlFlowOpcode::Return,
            11 => ControlFlowOpcode::CondJmp,
            12 => ControlFlowOpcode::Alloc,
            13 => ControlFlowOpcode::CondExecPredClean,
            14 => ControlFlowOpcode::CondExecPredCleanEnd,
            _ => ControlFlowOpcode::MarkVsFetchDone,
        }
    }
}

impl ControlFlowOpcode {
    /// True for every opcode that runs a block of ALU/fetch instructions
    pub fn is_exec(self) -> bool {
        matches!(
            self,
            Self::Exec
                | Self::ExecEnd
                | Self::CondExec
                | Self::CondExecEnd
                | Self::CondExecPred
                | Self::CondExecPredEnd
                | Self::CondExecPredClean
                | Self::CondExecPredCleanEnd
        )
    }

    /// True for exec opcodes that also terminate the program
    pub fn is_exec_end(self) -> bool {
        matches!(
            self,
            Self::ExecEnd | Self::CondExecEnd | Self::CondExecPredEnd | Self::CondExecPredCleanEnd
        )
    }
}

/// One raw 48-bit control flow instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlFlowInstruction {
    pub dword_0: u32,
    pub dword_1: u16,
}

impl ControlFlowInstruction {
    pub fn new(dword_0: u32, dword_1: u16) -> Self {
        Self { dword_0, dword_1 }
    }

    pub fn opcode(&self) -> ControlFlowOpcode {
        ControlFlowOpcode::from((self.dword_1 >> 12) as u8)
    }

    /// Address mode bit (bit 11 of the high half), shared by all shapes
    pub fn is_absolute_address(&self) -> bool {
        (self.dword_1 >> 11) & 1 != 0
    }

    #[inline]
    fn hi_bit(&self, bit: u32) -> bool {
        (self.dword_1 as u32 >> bit) & 1 != 0
    }

    /// Decode into the shape selected by the opcode
    pub fn decode(&self) -> ControlFlow {
        match self.opcode() {
            ControlFlowOpcode::Nop => ControlFlow::Nop,
            op if op.is_exec() => ControlFlow::Exec(ExecInstruction::decode(self)),
            ControlFlowOpcode::LoopStart => ControlFlow::LoopStart(LoopStartInstruction::decode(self)),
            ControlFlowOpcode::LoopEnd => ControlFlow::LoopEnd(LoopEndInstruction::decode(self)),
            ControlFlowOpcode::CondCall => ControlFlow::CondCall(BranchInstruction::decode(self)),
            ControlFlowOpcode::Return => ControlFlow::Return,
            ControlFlowOpcode::CondJmp => ControlFlow::CondJmp(BranchInstruction::decode(self)),
            ControlFlowOpcode::Alloc => ControlFlow::Alloc(AllocInstruction::decode(self)),
            _ => ControlFlow::MarkVsFetchDone,
        }
    }

    /// Control flow target address, for the shapes that carry one
    pub fn target_address(&self) -> Option<u32> {
        match self.decode() {
            ControlFlow::LoopStart(loop_start) => Some(loop_start.address),
            ControlFlow::LoopEnd(loop_end) => Some(loop_end.address),
            ControlFlow::CondCall(call) => Some(call.address),
            ControlFlow::CondJmp(jump) => Some(jump.address),
            _ => None,
        }
    }
}

/// Decoded control flow instruction shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Nop,
    Exec(ExecInstruction),
    LoopStart(LoopStartInstruction),
    LoopEnd(LoopEndInstruction),
    CondCall(BranchInstruction),
    Return,
    CondJmp(BranchInstruction),
    Alloc(AllocInstruction),
    MarkVsFetchDone,
}

/// Exec family instruction (exec, cond_exec, cond_exec_pred and their variants)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecInstruction {
    pub opcode: ControlFlowOpcode,
    pub address: u32,          // lo bits 0-11
    pub count: u32,            // lo bits 12-14
    pub is_yield: bool,        // lo bit 15
    pub sequence: u32,         // lo bits 16-27, 2 bits per instruction
    pub vertex_cache: u32,     // lo bits 28-31 (high) + hi bits 0-1 (low)
    pub bool_address: u32,     // hi bits 2-9 (cond_exec shapes)
    pub is_predicate_clean: bool, // hi bit 9 (exec / cond_exec_pred shapes)
    pub condition: bool,       // hi bit 10
    pub is_absolute_address: bool,
}

impl ExecInstruction {
    pub fn decode(cf: &ControlFlowInstruction) -> Self {
        let opcode = cf.opcode();
        let lo = cf.dword_0;
        let hi = cf.dword_1 as u32;
        let uses_bool_constant = matches!(
            opcode,
            ControlFlowOpcode::CondExec
                | ControlFlowOpcode::CondExecEnd
                | ControlFlowOpcode::CondExecPredClean
                | ControlFlowOpcode::CondExecPredCleanEnd
        );
        Self {
            opcode,
            address: lo & 0xFFF,
            count: (lo >> 12) & 0x7,
            is_yield: (lo >> 15) & 1 != 0,
            sequence: (lo >> 16) & 0xFFF,
            vertex_cache: (((lo >> 28) & 0xF) << 2) | (hi & 0x3),
            bool_address: if uses_bool_constant { (hi >> 2) & 0xFF } else { 0 },
            is_predicate_clean: if uses_bool_constant { true } else { cf.hi_bit(9) },
            condition: cf.hi_bit(10),
            is_absolute_address: cf.is_absolute_address(),
        }
    }

    pub fn encode(&self) -> ControlFlowInstruction {
        let lo = (self.address & 0xFFF)
            | ((self.count & 0x7) << 12)
            | ((self.is_yield as u32) << 15)
            | ((self.sequence & 0xFFF) << 16)
            | (((self.vertex_cache >> 2) & 0xF) << 28);
        let mut hi = (self.vertex_cache & 0x3)
            | ((self.condition as u32) << 10)
            | ((self.is_absolute_address as u32) << 11)
            | ((self.opcode as u32) << 12);
        if self.uses_bool_constant() {
            hi |= (self.bool_address & 0xFF) << 2;
        } else {
            hi |= (self.is_predicate_clean as u32) << 9;
        }
        ControlFlowInstruction::new(lo, hi as u16)
    }

    /// True when the block is guarded by a boolean constant
    pub fn uses_bool_constant(&self) -> bool {
        matches!(
            self.opcode,
            ControlFlowOpcode::CondExec
                | ControlFlowOpcode::CondExecEnd
                | ControlFlowOpcode::CondExecPredClean
                | ControlFlowOpcode::CondExecPredCleanEnd
        )
    }

    /// True when the block is guarded by the predicate register
    pub fn uses_predicate(&self) -> bool {
        matches!(
            self.opcode,
            ControlFlowOpcode::CondExecPred | ControlFlowOpcode::CondExecPredEnd
        )
    }

    /// Whether instruction `index` within the block is a fetch
    pub fn is_fetch(&self, index: u32) -> bool {
        (self.sequence >> (index * 2)) & 0x1 == 0x1
    }

    /// Whether instruction `index` within the block is serialized
    pub fn is_serialized(&self, index: u32) -> bool {
        (self.sequence >> (index * 2)) & 0x2 == 0x2
    }
}

/// loop_start instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopStartInstruction {
    pub address: u32,   // lo bits 0-12, loop skip target
    pub is_repeat: bool, // lo bit 13
    pub loop_id: u32,   // lo bits 16-20, integer constant index
    pub is_absolute_address: bool,
}

impl LoopStartInstruction {
    pub fn decode(cf: &ControlFlowInstruction) -> Self {
        let lo = cf.dword_0;
        Self {
            address: lo & 0x1FFF,
            is_repeat: (lo >> 13) & 1 != 0,
            loop_id: (lo >> 16) & 0x1F,
            is_absolute_address: cf.is_absolute_address(),
        }
    }

    pub fn encode(&self) -> ControlFlowInstruction {
        let lo = (self.address & 0x1FFF) | ((self.is_repeat as u32) << 13) | ((self.loop_id & 0x1F) << 16);
        let hi = ((self.is_absolute_address as u32) << 11) | ((ControlFlowOpcode::LoopStart as u32) << 12);
        ControlFlowInstruction::new(lo, hi as u16)
    }
}

/// loop_end instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopEndInstruction {
    pub address: u32,               // lo bits 0-12, loop body start
    pub loop_id: u32,               // lo bits 16-20
    pub is_predicated_break: bool,  // lo bit 21
    pub condition: bool,            // hi bit 10
    pub is_absolute_address: bool,
}

impl LoopEndInstruction {
    pub fn decode(cf: &ControlFlowInstruction) -> Self {
        let lo = cf.dword_0;
        Self {
            address: lo & 0x1FFF,
            loop_id: (lo >> 16) & 0x1F,
            is_predicated_break: (lo >> 21) & 1 != 0,
            condition: cf.hi_bit(10),
            is_absolute_address: cf.is_absolute_address(),
        }
    }

    pub fn encode(&self) -> ControlFlowInstruction {
        let lo = (self.address & 0x1FFF)
            | ((self.loop_id & 0x1F) << 16)
            | ((self.is_predicated_break as u32) << 21);
        let hi = ((self.condition as u32) << 10)
            | ((self.is_absolute_address as u32) << 11)
            | ((ControlFlowOpcode::LoopEnd as u32) << 12);
        ControlFlowInstruction::new(lo, hi as u16)
    }
}

/// cond_call / cond_jmp instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchInstruction {
    pub opcode: ControlFlowOpcode,
    pub address: u32,            // lo bits 0-12
    pub is_unconditional: bool,  // lo bit 13
    pub is_predicated: bool,     // lo bit 14
    pub is_backward: bool,       // hi bit 1 (cond_jmp only)
    pub bool_address: u32,       // hi bits 2-9
    pub condition: bool,         // hi bit 10
    pub is_absolute_address: bool,
}

impl BranchInstruction {
    pub fn decode(cf: &ControlFlowInstruction) -> Self {
        let opcode = cf.opcode();
        let lo = cf.dword_0;
        let hi = cf.dword_1 as u32;
        Self {
            opcode,
            address: lo & 0x1FFF,
            is_unconditional: (lo >> 13) & 1 != 0,
            is_predicated: (lo >> 14) & 1 != 0,
            is_backward: opcode == ControlFlowOpcode::CondJmp && cf.hi_bit(1),
            bool_address: (hi >> 2) & 0xFF,
            condition: cf.hi_bit(10),
            is_absolute_address: cf.is_absolute_address(),
        }
    }

    pub fn encode(&self) -> ControlFlowInstruction {
        let lo = (self.address & 0x1FFF)
            | ((self.is_unconditional as u32) << 13)
            | ((self.is_predicated as u32) << 14);
        let hi = ((self.is_backward as u32) << 1)
            | ((self.bool_address & 0xFF) << 2)
            | ((self.condition as u32) << 10)
            | ((self.is_absolute_address as u32) << 11)
            | ((self.opcode as u32) << 12);
        ControlFlowInstruction::new(lo, hi as u16)
    }
}

/// alloc instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocInstruction {
    pub size: u32,              // lo bits 0-2
    pub is_unserialized: bool,  // hi bit 8
    pub alloc_type: u32,        // hi bits 9-10
}

impl AllocInstruction {
    pub fn decode(cf: &ControlFlowInstruction) -> Self {
        let hi = cf.dword_1 as u32;
        Self {
            size: cf.dword_0 & 0x7,
            is_unserialized: cf.hi_bit(8),
            alloc_type: (hi >> 9) & 0x3,
        }
    }

    pub fn encode(&self) -> ControlFlowInstruction {
        let hi = ((self.is_unserialized as u32) << 8)
            | ((self.alloc_type & 0x3) << 9)
            | ((ControlFlowOpcode::Alloc as u32) << 12);
        ControlFlowInstruction::new(self.size & 0x7, hi as u16)
    }
}

/// Split three dwords into the two control flow instructions they hold
pub fn unpack_control_flow_pair(dwords: [u32; 3]) -> [ControlFlowInstruction; 2] {
    let [d0, d1, d2] = dwords;
    [
        ControlFlowInstruction::new(d0, (d1 & 0xFFFF) as u16),
        ControlFlowInstruction::new((d1 >> 16) | (d2 << 16), (d2 >> 16) as u16),
    ]
}

/// Pack two control flow instructions into three dwords
pub fn pack_control_flow_pair(a: ControlFlowInstruction, b: ControlFlowInstruction) -> [u32; 3] {
    [
        a.dword_0,
        (a.dword_1 as u32) | (b.dword_0 << 16),
        (b.dword_0 >> 16) | ((b.dword_1 as u32) << 16),
    ]
}

/// Encode a nop
pub fn encode_nop() -> ControlFlowInstruction {
    ControlFlowInstruction::new(0, 0)
}

/// Encode a return
pub fn encode_return() -> ControlFlowInstruction {
    ControlFlowInstruction::new(0, (ControlFlowOpcode::Return as u16) << 12)
}
