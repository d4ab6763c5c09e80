//! Shader translation front end
//!
//! A translation walks the microcode once and reports every structural event
//! to a [`ShaderTranslator`] backend. Backends only override the hooks they
//! care about; everything else defaults to a no-op.

mod blocks;
pub mod decode;
mod gather;
mod session;

pub use blocks::collect_label_addresses;
pub use session::TranslatorSession;

use crate::parsed::{
    ParsedAllocInstruction, ParsedAluInstruction, ParsedCallInstruction, ParsedExecInstruction, ParsedJumpInstruction,
    ParsedLoopEndInstruction, ParsedLoopStartInstruction, ParsedReturnInstruction, ParsedTextureFetchInstruction,
    ParsedVertexFetchInstruction,
};
use crate::shader::{Shader, ShaderError};
use xe_core::TranslatorConfig;

/// What the session should do after an error hook returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorAction {
    #[default]
    Continue,
    /// Stop walking control flow; `complete_translation` still runs
    Abort,
}

/// Backend hooks invoked while a shader is translated
///
/// Hooks fire in control flow order. Bindings are complete before
/// `start_translation` is called.
pub trait ShaderTranslator {
    /// Clear per-shader backend state
    fn reset(&mut self) {}

    fn start_translation(&mut self, _session: &mut TranslatorSession<'_>) {}

    /// Produce the translated artifact
    fn complete_translation(&mut self, _session: &mut TranslatorSession<'_>) -> Vec<u8> {
        Vec::new()
    }

    /// Notified of every recorded error other than unimplemented instructions
    fn emit_translation_error(&mut self, _session: &TranslatorSession<'_>, _error: &ShaderError) -> ErrorAction {
        ErrorAction::Continue
    }

    fn emit_unimplemented_translation_error(
        &mut self,
        _session: &TranslatorSession<'_>,
        _error: &ShaderError,
    ) -> ErrorAction {
        ErrorAction::Continue
    }

    /// A branch, loop or call target starts at control flow index `cf_index`
    fn process_label(&mut self, _session: &mut TranslatorSession<'_>, _cf_index: u32) {}

    fn process_control_flow_nop_instruction(&mut self, _session: &mut TranslatorSession<'_>, _cf_index: u32) {}

    fn process_exec_instruction_begin(&mut self, _session: &mut TranslatorSession<'_>, _instr: &ParsedExecInstruction) {}

    fn process_exec_instruction_end(&mut self, _session: &mut TranslatorSession<'_>, _instr: &ParsedExecInstruction) {}

    fn process_loop_start_instruction(
        &mut self,
        _session: &mut TranslatorSession<'_>,
        _instr: &ParsedLoopStartInstruction,
    ) {
    }

    fn process_loop_end_instruction(&mut self, _session: &mut TranslatorSession<'_>, _instr: &ParsedLoopEndInstruction) {}

    fn process_call_instruction(&mut self, _session: &mut TranslatorSession<'_>, _instr: &ParsedCallInstruction) {}

    fn process_return_instruction(&mut self, _session: &mut TranslatorSession<'_>, _instr: &ParsedReturnInstruction) {}

    fn process_jump_instruction(&mut self, _session: &mut TranslatorSession<'_>, _instr: &ParsedJumpInstruction) {}

    fn process_alloc_instruction(&mut self, _session: &mut TranslatorSession<'_>, _instr: &ParsedAllocInstruction) {}

    fn process_vertex_fetch_instruction(
        &mut self,
        _session: &mut TranslatorSession<'_>,
        _instr: &ParsedVertexFetchInstruction,
    ) {
    }

    fn process_texture_fetch_instruction(
        &mut self,
        _session: &mut TranslatorSession<'_>,
        _instr: &ParsedTextureFetchInstruction,
    ) {
    }

    fn process_alu_instruction(&mut self, _session: &mut TranslatorSession<'_>, _instr: &ParsedAluInstruction) {}

    /// Translate `shader` with the default configuration
    ///
    /// Returns true when no error was recorded.
    fn translate(&mut self, shader: &mut Shader) -> bool
    where
        Self: Sized,
    {
        self.translate_with_config(shader, &TranslatorConfig::default())
    }

    fn translate_with_config(&mut self, shader: &mut Shader, config: &TranslatorConfig) -> bool
    where
        Self: Sized,
    {
        TranslatorSession::new(shader, config).run(self)
    }
}
