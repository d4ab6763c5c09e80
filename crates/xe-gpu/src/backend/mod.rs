//! Bundled translator backends

pub mod null;
pub mod ucode;

pub use null::{NullTranslator, TranslationStats};
pub use ucode::UcodeShaderTranslator;
