//! Program store.
//!
//! Syntax:
//! ```text
//! START:
//!     MOV AX, 5
//! LOOP: SUB AX, 1
//!     JNZ 0
//! ```
//!
//! A bare label names the next instruction. Labels are recorded against the
//! index of the instruction that follows them, but jumps take hex program
//! indices and never resolve through the label table. There is no comment
//! syntax.

use std::collections::HashMap;

/// A parsed program: instruction lines plus a label table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    lines: Vec<String>,
    labels: HashMap<String, usize>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse program text.
    ///
    /// Blank lines are skipped and every line is trimmed. Text before the
    /// first `:` on a line is a label; a label with nothing after it takes no
    /// slot in the program.
    pub fn parse(source: &str) -> Self {
        let mut program = Program::new();

        for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let instruction = match line.split_once(':') {
                Some((label, rest)) => {
                    let label = label.trim();
                    if !label.is_empty() {
                        program.labels.insert(label.to_string(), program.lines.len());
                    }
                    rest.trim()
                }
                None => line,
            };

            if !instruction.is_empty() {
                program.lines.push(instruction.to_string());
            }
        }

        program
    }

    /// Get the instruction at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// All instruction lines in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Look up the index a label points at.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Labels pointing at `index`, sorted by name.
    pub fn labels_at(&self, index: usize) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .labels
            .iter()
            .filter(|(_, at)| **at == index)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of label definitions.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Get the number of instructions.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let program = Program::parse("MOV AX, 5\n\n   ADD AX, 3  \n");

        assert_eq!(program.len(), 2);
        assert_eq!(program.get(0), Some("MOV AX, 5"));
        assert_eq!(program.get(1), Some("ADD AX, 3"));
        assert_eq!(program.get(2), None);
    }

    #[test]
    fn test_bare_label_takes_no_slot() {
        let source = r#"
        START:
            MOV AX, 1
        END:
        "#;
        let program = Program::parse(source);

        assert_eq!(program.len(), 1);
        assert_eq!(program.label("START"), Some(0));
        // Trailing label points one past the end
        assert_eq!(program.label("END"), Some(1));
    }

    #[test]
    fn test_inline_label() {
        let program = Program::parse("MOV CX, 3\nLOOP: SUB CX, 1\nJNZ 1");

        assert_eq!(program.len(), 3);
        assert_eq!(program.get(1), Some("SUB CX, 1"));
        assert_eq!(program.label("LOOP"), Some(1));
        assert_eq!(program.labels_at(1), vec!["LOOP"]);
        assert!(program.labels_at(0).is_empty());
    }

    #[test]
    fn test_label_case_preserved() {
        let program = Program::parse("top: MOV AX, 1");

        assert_eq!(program.label("top"), Some(0));
        assert_eq!(program.label("TOP"), None);
    }
}
