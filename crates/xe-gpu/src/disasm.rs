//! Disassembly accumulator
//!
//! Text is built in lockstep with decoding. Every instruction line carries a
//! `/* NNNN.W */` tag: the dword triple and the dword within it where the
//! instruction starts.

use std::fmt::Write;

#[derive(Debug, Default, Clone)]
pub struct DisassemblyBuffer {
    text: String,
    line_count: usize,
}

impl DisassemblyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.line_count = 0;
    }

    /// Append a label line for control flow index `cf_index`
    pub fn append_label(&mut self, cf_index: u32) -> &str {
        self.append_raw(&format!("                label L{cf_index}"))
    }

    /// Append an instruction line starting at `dword_offset`
    pub fn append_instruction(&mut self, dword_offset: usize, body: &str) -> &str {
        let line = format!("/* {:4}.{} */ {}", dword_offset / 3, dword_offset % 3, body);
        self.append_raw(&line)
    }

    /// Append a line and return it without the trailing newline
    fn append_raw(&mut self, line: &str) -> &str {
        let start = self.text.len();
        let _ = writeln!(self.text, "{line}");
        self.line_count += 1;
        &self.text[start..self.text.len() - 1]
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines appended so far
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn take(&mut self) -> String {
        self.line_count = 0;
        std::mem::take(&mut self.text)
    }
}

/// Dword offset where control flow instruction `cf_index` starts
pub fn control_flow_dword_offset(cf_index: u32) -> usize {
    (cf_index as usize / 2) * 3 + (cf_index as usize % 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_tags() {
        let mut buffer = DisassemblyBuffer::new();
        buffer.append_instruction(control_flow_dword_offset(3), "      ret");
        buffer.append_label(4);
        let line = buffer.append_instruction(12, "nop").to_string();
        assert_eq!(line, "/*    4.0 */ nop");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(
            buffer.text(),
            "/*    1.1 */       ret\n                label L4\n/*    4.0 */ nop\n"
        );
    }

    #[test]
    fn test_take_resets() {
        let mut buffer = DisassemblyBuffer::new();
        buffer.append_label(0);
        let text = buffer.take();
        assert_eq!(text, "                label L0\n");
        assert_eq!(buffer.line_count(), 0);
        assert!(buffer.text().is_empty());
    }
}
