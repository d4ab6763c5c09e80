//! Per-shader translation state

use super::{ErrorAction, ShaderTranslator};
use crate::disasm::DisassemblyBuffer;
use crate::shader::{Shader, ShaderError, ShaderErrorKind, ShaderType, TextureBinding, VertexBinding};
use crate::ucode::{ControlFlowProgram, DecodeError, VertexFetchInstruction};
use xe_core::{ErrorPolicy, TranslatorConfig};

/// Decoder state reset at the start of every translation
#[derive(Debug, Default)]
pub(super) struct DecodeState {
    /// Most recent full vertex fetch, the source of mini fetch fields
    pub previous_vfetch_full: Option<VertexFetchInstruction>,
    pub total_attrib_count: u32,
    pub writes_color_targets: [bool; 4],
}

/// One translation of one shader
///
/// Passed to every backend hook. Gives read access to the shader and the
/// disassembly built so far, and lets the backend record its own errors.
pub struct TranslatorSession<'a> {
    pub(super) shader: &'a mut Shader,
    config: TranslatorConfig,
    pub(super) state: DecodeState,
    disasm: DisassemblyBuffer,
    aborted: bool,
}

impl<'a> TranslatorSession<'a> {
    pub(super) fn new(shader: &'a mut Shader, config: &TranslatorConfig) -> Self {
        Self {
            shader,
            config: config.clone(),
            state: DecodeState::default(),
            disasm: DisassemblyBuffer::new(),
            aborted: false,
        }
    }

    pub fn shader_type(&self) -> ShaderType {
        self.shader.shader_type()
    }

    pub fn is_vertex_shader(&self) -> bool {
        self.shader_type() == ShaderType::Vertex
    }

    pub fn is_pixel_shader(&self) -> bool {
        self.shader_type() == ShaderType::Pixel
    }

    pub fn ucode_dwords(&self) -> &[u32] {
        self.shader.ucode_dwords()
    }

    pub fn vertex_bindings(&self) -> &[VertexBinding] {
        self.shader.vertex_bindings()
    }

    pub fn texture_bindings(&self) -> &[TextureBinding] {
        self.shader.texture_bindings()
    }

    /// Number of vertex attributes across all bindings
    pub fn total_attrib_count(&self) -> u32 {
        self.state.total_attrib_count
    }

    /// Disassembly text produced so far
    pub fn ucode_disasm(&self) -> &str {
        self.disasm.text()
    }

    pub fn ucode_disasm_line_number(&self) -> usize {
        self.disasm.line_count()
    }

    /// Render targets written so far
    pub fn writes_color_targets(&self) -> [bool; 4] {
        self.state.writes_color_targets
    }

    pub fn errors(&self) -> &[ShaderError] {
        self.shader.errors()
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Whether control flow emission has been stopped
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Record a backend error
    pub fn emit_translation_error(&mut self, message: impl Into<String>) {
        self.push_error(ShaderError::new(ShaderErrorKind::GeneralTranslationError, message));
    }

    /// Record a backend error for an instruction it can't handle
    pub fn emit_unimplemented_translation_error(&mut self, message: impl Into<String>) {
        self.push_error(ShaderError::new(ShaderErrorKind::UnimplementedInstruction, message));
    }

    fn push_error(&mut self, error: ShaderError) {
        tracing::warn!("Shader translation error: {}", error);
        self.shader.errors.push(error);
        if self.config.error_policy == ErrorPolicy::AbortOnError {
            self.aborted = true;
        }
    }

    /// Record an error found by the front end and notify the backend
    pub(super) fn record_error(&mut self, backend: &mut dyn ShaderTranslator, error: ShaderError) {
        self.push_error(error.clone());
        let action = match error.kind {
            ShaderErrorKind::UnimplementedInstruction => backend.emit_unimplemented_translation_error(self, &error),
            _ => backend.emit_translation_error(self, &error),
        };
        if action == ErrorAction::Abort {
            self.aborted = true;
        }
    }

    pub(super) fn record_decode_error(&mut self, backend: &mut dyn ShaderTranslator, error: DecodeError) {
        let error = ShaderError::new(error.kind(), error.to_string());
        self.record_error(backend, error);
    }

    pub(super) fn append_label_line(&mut self, cf_index: u32) {
        let line = self.disasm.append_label(cf_index);
        if self.config.trace_disassembly {
            tracing::trace!(target: "xe_gpu::disasm", "{}", line);
        }
    }

    pub(super) fn append_instruction_line(&mut self, dword_offset: usize, body: &str) {
        let line = self.disasm.append_instruction(dword_offset, body);
        if self.config.trace_disassembly {
            tracing::trace!(target: "xe_gpu::disasm", "{}", line);
        }
    }

    /// Run the whole translation against `backend`
    pub(super) fn run(mut self, backend: &mut dyn ShaderTranslator) -> bool {
        backend.reset();
        self.shader.reset_translation();

        let program = ControlFlowProgram::read(self.shader.ucode_dwords());
        let pending_errors = self.gather_bindings(&program);

        backend.start_translation(&mut self);

        if let Some(offset) = program.truncated_at {
            self.record_decode_error(backend, DecodeError::TruncatedControlFlow(offset));
        }
        for error in pending_errors {
            self.record_error(backend, error);
        }

        self.translate_blocks(backend, &program);

        let artifact = backend.complete_translation(&mut self);
        self.finish(artifact)
    }

    fn finish(mut self, artifact: Vec<u8>) -> bool {
        let is_valid = self.shader.errors.is_empty();
        tracing::debug!(
            "Translated {} shader: {} dwords, {} disassembly lines, {} errors",
            self.shader.shader_type(),
            self.shader.ucode_dword_count(),
            self.disasm.line_count(),
            self.shader.errors.len()
        );

        self.shader.translated_binary = artifact;
        self.shader.ucode_disassembly = self.disasm.take();
        self.shader.writes_color_targets = self.state.writes_color_targets;
        self.shader.is_valid = is_valid;
        self.shader.is_translated = true;
        is_valid
    }
}
