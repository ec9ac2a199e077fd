//! Program listings.
//!
//! Renders a loaded program back to readable text, optionally with the
//! microinstructions each line lowers to.

use crate::asm::program::Program;
use crate::cpu::decode::decode;

/// Render a program with its indices and labels.
pub fn listing(program: &Program) -> String {
    render(program, false)
}

/// Render a program with every line followed by its microinstructions.
pub fn decode_listing(program: &Program) -> String {
    render(program, true)
}

/// Format one program line. Indices are shown in hex, the way jump operands
/// are written.
pub fn format_line(index: usize, line: &str) -> String {
    format!("{:03X}: {}", index, line)
}

fn render(program: &Program, with_micro: bool) -> String {
    let mut output = String::new();
    output.push_str("; Program Listing\n");
    output.push_str(&format!(
        "; {} instructions, {} labels\n\n",
        program.len(),
        program.label_count()
    ));

    for (index, line) in program.lines().iter().enumerate() {
        for label in program.labels_at(index) {
            output.push_str(&format!("{}:\n", label));
        }
        output.push_str(&format_line(index, line));
        output.push('\n');

        if with_micro {
            for micro in decode(line) {
                output.push_str(&format!("       -> {}\n", micro));
            }
        }
    }

    // Labels past the last instruction
    for label in program.labels_at(program.len()) {
        output.push_str(&format!("{}:\n", label));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_with_labels() {
        let program = Program::parse("START: MOV AX, 5\nADD AX, 3\nDONE:");
        let text = listing(&program);

        assert!(text.contains("START:\n000: MOV AX, 5\n"));
        assert!(text.contains("001: ADD AX, 3\n"));
        assert!(text.ends_with("DONE:\n"));
    }

    #[test]
    fn test_decode_listing() {
        let program = Program::parse("SUB BX, 2\nPUSH AX");
        let text = decode_listing(&program);

        assert!(text.contains("-> MOV TEMP, 0x2\n"));
        assert!(text.contains("-> SUB BX, TEMP\n"));
        assert!(text.contains("-> Unimplemented: PUSH AX\n"));
    }

    #[test]
    fn test_format_line_hex_index() {
        assert_eq!(format_line(26, "JMP 0"), "01A: JMP 0");
    }
}
