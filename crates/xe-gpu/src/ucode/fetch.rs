//! Vertex and texture fetch instruction layouts

/// Fetch opcodes (bits 0-4 of the first dword)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchOpcode {
    VertexFetch,
    TextureFetch,
    GetTextureBorderColorFrac,
    GetTextureComputedLod,
    GetTextureGradients,
    GetTextureWeights,
    SetTextureLod,
    SetTextureGradientsHorz,
    SetTextureGradientsVert,
}

impl FetchOpcode {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::VertexFetch),
            1 => Some(Self::TextureFetch),
            16 => Some(Self::GetTextureBorderColorFrac),
            17 => Some(Self::GetTextureComputedLod),
            18 => Some(Self::GetTextureGradients),
            19 => Some(Self::GetTextureWeights),
            24 => Some(Self::SetTextureLod),
            25 => Some(Self::SetTextureGradientsHorz),
            26 => Some(Self::SetTextureGradientsVert),
            _ => None,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::VertexFetch => 0,
            Self::TextureFetch => 1,
            Self::GetTextureBorderColorFrac => 16,
            Self::GetTextureComputedLod => 17,
            Self::GetTextureGradients => 18,
            Self::GetTextureWeights => 19,
            Self::SetTextureLod => 24,
            Self::SetTextureGradientsHorz => 25,
            Self::SetTextureGradientsVert => 26,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::VertexFetch => "vfetch",
            Self::TextureFetch => "tfetch",
            Self::GetTextureBorderColorFrac => "getBCF",
            Self::GetTextureComputedLod => "getCompTexLOD",
            Self::GetTextureGradients => "getGradients",
            Self::GetTextureWeights => "getWeights",
            Self::SetTextureLod => "setTexLOD",
            Self::SetTextureGradientsHorz => "setGradientH",
            Self::SetTextureGradientsVert => "setGradientV",
        }
    }

    /// `set*` ops only update sampler state and reference no fetch constant
    pub fn is_texture_state_write(self) -> bool {
        matches!(
            self,
            Self::SetTextureLod | Self::SetTextureGradientsHorz | Self::SetTextureGradientsVert
        )
    }
}

/// Raw fetch opcode of any fetch instruction
pub fn fetch_opcode_bits(dwords: &[u32; 3]) -> u32 {
    dwords[0] & 0x1F
}

/// Vertex element formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Format8888,
    Format2101010,
    Format101111,
    Format111110,
    Format1616,
    Format16161616,
    Format1616Float,
    Format16161616Float,
    Format32,
    Format3232,
    Format32323232,
    Format32Float,
    Format3232Float,
    Format32323232Float,
    Format323232Float,
}

impl VertexFormat {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            6 => Some(Self::Format8888),
            7 => Some(Self::Format2101010),
            16 => Some(Self::Format101111),
            17 => Some(Self::Format111110),
            25 => Some(Self::Format1616),
            26 => Some(Self::Format16161616),
            31 => Some(Self::Format1616Float),
            32 => Some(Self::Format16161616Float),
            33 => Some(Self::Format32),
            34 => Some(Self::Format3232),
            35 => Some(Self::Format32323232),
            36 => Some(Self::Format32Float),
            37 => Some(Self::Format3232Float),
            38 => Some(Self::Format32323232Float),
            57 => Some(Self::Format323232Float),
            _ => None,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::Format8888 => 6,
            Self::Format2101010 => 7,
            Self::Format101111 => 16,
            Self::Format111110 => 17,
            Self::Format1616 => 25,
            Self::Format16161616 => 26,
            Self::Format1616Float => 31,
            Self::Format16161616Float => 32,
            Self::Format32 => 33,
            Self::Format3232 => 34,
            Self::Format32323232 => 35,
            Self::Format32Float => 36,
            Self::Format3232Float => 37,
            Self::Format32323232Float => 38,
            Self::Format323232Float => 57,
        }
    }

    /// Size of one element in 32-bit words
    pub fn size_in_words(self) -> u32 {
        match self {
            Self::Format8888
            | Self::Format2101010
            | Self::Format101111
            | Self::Format111110
            | Self::Format1616
            | Self::Format1616Float
            | Self::Format32
            | Self::Format32Float => 1,
            Self::Format16161616
            | Self::Format16161616Float
            | Self::Format3232
            | Self::Format3232Float => 2,
            Self::Format323232Float => 3,
            Self::Format32323232 | Self::Format32323232Float => 4,
        }
    }

    /// Number of components the format carries
    pub fn component_count(self) -> u32 {
        match self {
            Self::Format32 | Self::Format32Float => 1,
            Self::Format1616 | Self::Format1616Float | Self::Format3232 | Self::Format3232Float => 2,
            Self::Format101111 | Self::Format111110 | Self::Format323232Float => 3,
            _ => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Format8888 => "8_8_8_8",
            Self::Format2101010 => "2_10_10_10",
            Self::Format101111 => "10_11_11",
            Self::Format111110 => "11_11_10",
            Self::Format1616 => "16_16",
            Self::Format16161616 => "16_16_16_16",
            Self::Format1616Float => "16_16_FLOAT",
            Self::Format16161616Float => "16_16_16_16_FLOAT",
            Self::Format32 => "32",
            Self::Format3232 => "32_32",
            Self::Format32323232 => "32_32_32_32",
            Self::Format32Float => "32_FLOAT",
            Self::Format3232Float => "32_32_FLOAT",
            Self::Format32323232Float => "32_32_32_32_FLOAT",
            Self::Format323232Float => "32_32_32_FLOAT",
        }
    }
}

/// Texture sampler dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    D2,
    D3,
    Cube,
}

impl TextureDimension {
    pub fn from_raw(value: u32) -> Self {
        match value & 0x3 {
            0 => Self::D1,
            1 => Self::D2,
            2 => Self::D3,
            _ => Self::Cube,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::D1 => 0,
            Self::D2 => 1,
            Self::D3 => 2,
            Self::Cube => 3,
        }
    }

    /// Number of coordinate components a lookup reads
    pub fn coordinate_count(self) -> u32 {
        match self {
            Self::D1 => 1,
            Self::D2 => 2,
            Self::D3 | Self::Cube => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::D1 => "1D",
            Self::D2 => "2D",
            Self::D3 => "3D",
            Self::Cube => "Cube",
        }
    }
}

/// Sign-extend the low `bits` bits of `value`
#[inline]
pub(crate) fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

#[inline]
fn bit(value: u32, shift: u32) -> bool {
    (value >> shift) & 1 != 0
}

/// Vertex fetch (full or mini)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexFetchInstruction {
    pub src_reg: u32,
    pub src_relative: bool,
    pub dst_reg: u32,
    pub dst_relative: bool,
    pub must_be_one: bool,
    pub const_index: u32,
    pub const_index_sel: u32,
    pub prefetch_count: u32,
    pub src_swizzle: u32,
    pub dst_swizzle: u32,
    pub is_signed: bool,
    pub is_integer: bool,
    pub signed_rf_mode: bool,
    pub is_index_rounded: bool,
    pub format: u32,
    pub exp_adjust: i32,
    pub is_mini_fetch: bool,
    pub is_predicated: bool,
    pub stride: u32,
    /// Element offset in words
    pub offset: i32,
    pub predicate_condition: bool,
}

impl VertexFetchInstruction {
    pub fn decode(dwords: [u32; 3]) -> Self {
        let [d0, d1, d2] = dwords;
        Self {
            src_reg: (d0 >> 5) & 0x3F,
            src_relative: bit(d0, 11),
            dst_reg: (d0 >> 12) & 0x3F,
            dst_relative: bit(d0, 18),
            must_be_one: bit(d0, 19),
            const_index: (d0 >> 20) & 0x1F,
            const_index_sel: (d0 >> 25) & 0x3,
            prefetch_count: (d0 >> 27) & 0x7,
            src_swizzle: (d0 >> 30) & 0x3,
            dst_swizzle: d1 & 0xFFF,
            is_signed: bit(d1, 12),
            is_integer: bit(d1, 13),
            signed_rf_mode: bit(d1, 14),
            is_index_rounded: bit(d1, 15),
            format: (d1 >> 16) & 0x3F,
            exp_adjust: sign_extend((d1 >> 24) & 0x3F, 6),
            is_mini_fetch: bit(d1, 30),
            is_predicated: bit(d1, 31),
            stride: d2 & 0xFF,
            offset: sign_extend((d2 >> 8) & 0x7F_FFFF, 23),
            predicate_condition: bit(d2, 31),
        }
    }

    pub fn encode(&self) -> [u32; 3] {
        let d0 = FetchOpcode::VertexFetch.to_raw()
            | ((self.src_reg & 0x3F) << 5)
            | ((self.src_relative as u32) << 11)
            | ((self.dst_reg & 0x3F) << 12)
            | ((self.dst_relative as u32) << 18)
            | ((self.must_be_one as u32) << 19)
            | ((self.const_index & 0x1F) << 20)
            | ((self.const_index_sel & 0x3) << 25)
            | ((self.prefetch_count & 0x7) << 27)
            | ((self.src_swizzle & 0x3) << 30);
        let d1 = (self.dst_swizzle & 0xFFF)
            | ((self.is_signed as u32) << 12)
            | ((self.is_integer as u32) << 13)
            | ((self.signed_rf_mode as u32) << 14)
            | ((self.is_index_rounded as u32) << 15)
            | ((self.format & 0x3F) << 16)
            | (((self.exp_adjust as u32) & 0x3F) << 24)
            | ((self.is_mini_fetch as u32) << 30)
            | ((self.is_predicated as u32) << 31);
        let d2 = (self.stride & 0xFF)
            | (((self.offset as u32) & 0x7F_FFFF) << 8)
            | ((self.predicate_condition as u32) << 31);
        [d0, d1, d2]
    }

    /// Fetch constant slot addressed by this fetch
    pub fn fetch_constant_index(&self) -> u32 {
        self.const_index * 3 + self.const_index_sel
    }

    /// Whether any destination component is written
    pub fn fetches_any_data(&self) -> bool {
        writes_any_component(self.dst_swizzle)
    }
}

/// Texture fetch and the related get/set sampler ops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureFetchInstruction {
    pub opcode: u32,
    pub src_reg: u32,
    pub src_relative: bool,
    pub dst_reg: u32,
    pub dst_relative: bool,
    pub fetch_valid_only: bool,
    pub const_index: u32,
    pub unnormalized_coordinates: bool,
    pub src_swizzle: u32,
    pub dst_swizzle: u32,
    pub mag_filter: u32,
    pub min_filter: u32,
    pub mip_filter: u32,
    pub aniso_filter: u32,
    pub arbitrary_filter: u32,
    pub vol_mag_filter: u32,
    pub vol_min_filter: u32,
    pub use_computed_lod: bool,
    pub use_register_lod: bool,
    pub is_predicated: bool,
    pub use_register_gradients: bool,
    pub sample_location: u32,
    pub lod_bias: i32,
    pub dimension: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub offset_z: i32,
    pub predicate_condition: bool,
}

impl TextureFetchInstruction {
    pub fn decode(dwords: [u32; 3]) -> Self {
        let [d0, d1, d2] = dwords;
        Self {
            opcode: d0 & 0x1F,
            src_reg: (d0 >> 5) & 0x3F,
            src_relative: bit(d0, 11),
            dst_reg: (d0 >> 12) & 0x3F,
            dst_relative: bit(d0, 18),
            fetch_valid_only: bit(d0, 19),
            const_index: (d0 >> 20) & 0x1F,
            unnormalized_coordinates: bit(d0, 25),
            src_swizzle: (d0 >> 26) & 0x3F,
            dst_swizzle: d1 & 0xFFF,
            mag_filter: (d1 >> 12) & 0x3,
            min_filter: (d1 >> 14) & 0x3,
            mip_filter: (d1 >> 16) & 0x3,
            aniso_filter: (d1 >> 18) & 0x7,
            arbitrary_filter: (d1 >> 21) & 0x7,
            vol_mag_filter: (d1 >> 24) & 0x3,
            vol_min_filter: (d1 >> 26) & 0x3,
            use_computed_lod: bit(d1, 28),
            use_register_lod: bit(d1, 29),
            is_predicated: bit(d1, 31),
            use_register_gradients: bit(d2, 0),
            sample_location: (d2 >> 1) & 0x1,
            lod_bias: sign_extend((d2 >> 2) & 0x7F, 7),
            dimension: (d2 >> 14) & 0x3,
            offset_x: sign_extend((d2 >> 16) & 0x1F, 5),
            offset_y: sign_extend((d2 >> 21) & 0x1F, 5),
            offset_z: sign_extend((d2 >> 26) & 0x1F, 5),
            predicate_condition: bit(d2, 31),
        }
    }

    pub fn encode(&self) -> [u32; 3] {
        let d0 = (self.opcode & 0x1F)
            | ((self.src_reg & 0x3F) << 5)
            | ((self.src_relative as u32) << 11)
            | ((self.dst_reg & 0x3F) << 12)
            | ((self.dst_relative as u32) << 18)
            | ((self.fetch_valid_only as u32) << 19)
            | ((self.const_index & 0x1F) << 20)
            | ((self.unnormalized_coordinates as u32) << 25)
            | ((self.src_swizzle & 0x3F) << 26);
        let d1 = (self.dst_swizzle & 0xFFF)
            | ((self.mag_filter & 0x3) << 12)
            | ((self.min_filter & 0x3) << 14)
            | ((self.mip_filter & 0x3) << 16)
            | ((self.aniso_filter & 0x7) << 18)
            | ((self.arbitrary_filter & 0x7) << 21)
            | ((self.vol_mag_filter & 0x3) << 24)
            | ((self.vol_min_filter & 0x3) << 26)
            | ((self.use_computed_lod as u32) << 28)
            | ((self.use_register_lod as u32) << 29)
            | ((self.is_predicated as u32) << 31);
        let d2 = (self.use_register_gradients as u32)
            | ((self.sample_location & 0x1) << 1)
            | (((self.lod_bias as u32) & 0x7F) << 2)
            | ((self.dimension & 0x3) << 14)
            | (((self.offset_x as u32) & 0x1F) << 16)
            | (((self.offset_y as u32) & 0x1F) << 21)
            | (((self.offset_z as u32) & 0x1F) << 26)
            | ((self.predicate_condition as u32) << 31);
        [d0, d1, d2]
    }

    pub fn fetches_any_data(&self) -> bool {
        writes_any_component(self.dst_swizzle)
    }
}

/// Destination swizzle selector for one component (3 bits each)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationSelect {
    Component(u32),
    Zero,
    One,
    Keep,
    Masked,
}

impl DestinationSelect {
    pub fn from_swizzle(dst_swizzle: u32, component: u32) -> Self {
        match (dst_swizzle >> (component * 3)) & 0x7 {
            c @ 0..=3 => Self::Component(c),
            4 => Self::Zero,
            5 => Self::One,
            6 => Self::Keep,
            _ => Self::Masked,
        }
    }

    pub fn is_written(self) -> bool {
        !matches!(self, Self::Keep | Self::Masked)
    }
}

fn writes_any_component(dst_swizzle: u32) -> bool {
    (0..4).any(|i| DestinationSelect::from_swizzle(dst_swizzle, i).is_written())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0x3F, 6), -1);
        assert_eq!(sign_extend(0x1F, 6), 31);
        assert_eq!(sign_extend(0x40_0000, 23), -0x40_0000);
    }

    #[test]
    fn test_vertex_fetch_fields() {
        let vfetch = VertexFetchInstruction {
            src_reg: 0,
            dst_reg: 1,
            must_be_one: true,
            const_index: 1,
            const_index_sel: 0,
            dst_swizzle: 0b101_010_001_000,
            format: 57,
            stride: 3,
            offset: -2,
            exp_adjust: -4,
            ..Default::default()
        };
        let dwords = vfetch.encode();
        assert_eq!(fetch_opcode_bits(&dwords), 0);
        let decoded = VertexFetchInstruction::decode(dwords);
        assert_eq!(decoded, vfetch);
        assert_eq!(decoded.fetch_constant_index(), 3);
        assert!(decoded.fetches_any_data());
    }

    #[test]
    fn test_masked_fetch_writes_nothing() {
        let vfetch = VertexFetchInstruction {
            dst_swizzle: 0b111_110_111_111,
            ..Default::default()
        };
        assert!(!vfetch.fetches_any_data());
    }

    #[test]
    fn test_texture_fetch_fields() {
        let tfetch = TextureFetchInstruction {
            opcode: 1,
            src_reg: 2,
            dst_reg: 3,
            const_index: 17,
            src_swizzle: 0b10_01_00,
            dst_swizzle: 0b011_010_001_000,
            lod_bias: -3,
            dimension: 3,
            offset_x: -1,
            offset_z: 7,
            ..Default::default()
        };
        let decoded = TextureFetchInstruction::decode(tfetch.encode());
        assert_eq!(decoded, tfetch);
        assert_eq!(TextureDimension::from_raw(decoded.dimension), TextureDimension::Cube);
    }

    #[test]
    fn test_vertex_format_sizes() {
        assert_eq!(VertexFormat::from_raw(57).map(VertexFormat::size_in_words), Some(3));
        assert_eq!(VertexFormat::from_raw(35).map(VertexFormat::size_in_words), Some(4));
        assert_eq!(VertexFormat::from_raw(26).map(VertexFormat::size_in_words), Some(2));
        assert_eq!(VertexFormat::from_raw(6).map(VertexFormat::size_in_words), Some(1));
        assert_eq!(VertexFormat::from_raw(0), None);
        assert_eq!(VertexFormat::Format323232Float.to_raw(), 57);
    }

    #[test]
    fn test_fetch_opcodes() {
        assert_eq!(FetchOpcode::from_raw(19), Some(FetchOpcode::GetTextureWeights));
        assert_eq!(FetchOpcode::from_raw(2), None);
        assert!(FetchOpcode::SetTextureLod.is_texture_state_write());
        assert!(!FetchOpcode::TextureFetch.is_texture_state_write());
    }
}
