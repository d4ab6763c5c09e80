//! Shader container and translation results

use crate::parsed::{ParsedTextureFetchInstruction, ParsedVertexFetchInstruction};
use crate::ucode::{TextureDimension, VertexFormat};
use std::fmt;
use std::str::FromStr;
use xe_core::XenosError;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Vertex,
    Pixel,
}

impl fmt::Display for ShaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Pixel => write!(f, "pixel"),
        }
    }
}

impl FromStr for ShaderType {
    type Err = XenosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vs" | "vertex" => Ok(Self::Vertex),
            "ps" | "pixel" => Ok(Self::Pixel),
            _ => Err(XenosError::UnknownShaderType(s.to_string())),
        }
    }
}

/// Byte order of a microcode dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UcodeEndianness {
    #[default]
    Little,
    Big,
}

/// Category of a recorded translation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderErrorKind {
    UnimplementedInstruction,
    InvalidEncoding,
    GeneralTranslationError,
}

impl fmt::Display for ShaderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnimplementedInstruction => write!(f, "unimplemented instruction"),
            Self::InvalidEncoding => write!(f, "invalid encoding"),
            Self::GeneralTranslationError => write!(f, "translation error"),
        }
    }
}

/// A translation error recorded on a shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderError {
    pub kind: ShaderErrorKind,
    pub message: String,
}

impl ShaderError {
    pub fn new(kind: ShaderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// One attribute read from a vertex buffer
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    /// Index unique across all bindings of the shader
    pub attrib_index: u32,
    pub data_format: VertexFormat,
    pub offset_words: i32,
    pub size_words: u32,
    pub is_normalized: bool,
    pub is_signed: bool,
    /// Fetch that introduced the attribute
    pub fetch_instr: ParsedVertexFetchInstruction,
}

impl VertexAttribute {
    pub fn byte_offset(&self) -> i32 {
        self.offset_words * 4
    }

    /// Same element layout, ignoring the attribute index and fetch site
    pub fn has_same_layout(&self, other: &VertexAttribute) -> bool {
        self.data_format == other.data_format
            && self.offset_words == other.offset_words
            && self.is_normalized == other.is_normalized
            && self.is_signed == other.is_signed
            && self.fetch_instr.attributes.exp_adjust == other.fetch_instr.attributes.exp_adjust
    }
}

/// Vertex buffer referenced through one fetch constant slot
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBinding {
    /// Index in discovery order
    pub binding_index: u32,
    /// Fetch constant slot (0-95)
    pub fetch_constant: u32,
    pub stride_words: u32,
    pub attributes: Vec<VertexAttribute>,
}

/// Texture referenced through one fetch constant slot
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    pub binding_index: u32,
    /// Fetch constant slot (0-31)
    pub fetch_constant: u32,
    pub dimension: TextureDimension,
    pub fetch_instr: ParsedTextureFetchInstruction,
}

/// A shader's microcode together with everything translation produces
#[derive(Debug, Clone)]
pub struct Shader {
    shader_type: ShaderType,
    ucode: Vec<u32>,
    pub(crate) vertex_bindings: Vec<VertexBinding>,
    pub(crate) texture_bindings: Vec<TextureBinding>,
    pub(crate) errors: Vec<ShaderError>,
    pub(crate) translated_binary: Vec<u8>,
    pub(crate) ucode_disassembly: String,
    pub(crate) writes_color_targets: [bool; 4],
    pub(crate) is_valid: bool,
    pub(crate) is_translated: bool,
}

impl Shader {
    pub fn new(shader_type: ShaderType, ucode: impl Into<Vec<u32>>) -> Self {
        Self {
            shader_type,
            ucode: ucode.into(),
            vertex_bindings: Vec::new(),
            texture_bindings: Vec::new(),
            errors: Vec::new(),
            translated_binary: Vec::new(),
            ucode_disassembly: String::new(),
            writes_color_targets: [false; 4],
            is_valid: false,
            is_translated: false,
        }
    }

    /// Build a shader from a raw microcode dump
    pub fn from_bytes(shader_type: ShaderType, bytes: &[u8], endianness: UcodeEndianness) -> xe_core::Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(XenosError::InvalidMicrocode(format!(
                "length {} is not a multiple of 4",
                bytes.len()
            )));
        }

        let ucode = bytes
            .chunks_exact(4)
            .map(|chunk| {
                let word: u32 = bytemuck::pod_read_unaligned(chunk);
                match endianness {
                    UcodeEndianness::Little => u32::from_le(word),
                    UcodeEndianness::Big => u32::from_be(word),
                }
            })
            .collect::<Vec<_>>();

        Ok(Self::new(shader_type, ucode))
    }

    pub fn shader_type(&self) -> ShaderType {
        self.shader_type
    }

    pub fn ucode_dwords(&self) -> &[u32] {
        &self.ucode
    }

    pub fn ucode_dword_count(&self) -> usize {
        self.ucode.len()
    }

    pub fn vertex_bindings(&self) -> &[VertexBinding] {
        &self.vertex_bindings
    }

    pub fn texture_bindings(&self) -> &[TextureBinding] {
        &self.texture_bindings
    }

    pub fn errors(&self) -> &[ShaderError] {
        &self.errors
    }

    /// Backend artifact from the last translation
    pub fn translated_binary(&self) -> &[u8] {
        &self.translated_binary
    }

    pub fn ucode_disassembly(&self) -> &str {
        &self.ucode_disassembly
    }

    /// Render targets written by color exports
    pub fn writes_color_targets(&self) -> [bool; 4] {
        self.writes_color_targets
    }

    pub fn writes_color_target(&self, index: usize) -> bool {
        self.writes_color_targets.get(index).copied().unwrap_or(false)
    }

    /// True once translated without errors
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn is_translated(&self) -> bool {
        self.is_translated
    }

    /// Drop the results of a previous translation
    pub(crate) fn reset_translation(&mut self) {
        self.vertex_bindings.clear();
        self.texture_bindings.clear();
        self.errors.clear();
        self.translated_binary.clear();
        self.ucode_disassembly.clear();
        self.writes_color_targets = [false; 4];
        self.is_valid = false;
        self.is_translated = false;
    }
}
