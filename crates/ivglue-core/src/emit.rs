/// Line-oriented text buffer for generated Ada sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    out: String,
    indent: usize,
}

const INDENT: &str = "   ";

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `s` at the current indentation followed by a newline.
    pub fn line(&mut self, s: &str) {
        if s.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(s);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn append(&mut self, other: CodeBuffer) {
        self.out.push_str(&other.out);
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::CodeBuffer;

    #[test]
    fn indents_by_three_spaces_and_keeps_blank_lines_bare() {
        let mut b = CodeBuffer::new();
        b.line("package P is");
        b.indent();
        b.line("procedure X;");
        b.line("");
        b.dedent();
        b.dedent();
        b.line("end P;");
        assert_eq!(b.as_str(), "package P is\n   procedure X;\n\nend P;\n");
    }
}
