//! Formats a finished quad vector as `.int` text.
//!
//! A pure serialization pass: by the time this runs, the C2 invariant
//! guarantees every control-flow `z` field has already been resolved, so
//! there is no logic here beyond string formatting.

use crate::quad::Quad;

/// Renders `quads` in the exact `.int` file format:
/// `<label>: <op>, <x>, <y>, <z>\n` per line, in label order.
pub fn render(quads: &[Quad]) -> String {
    let mut out = String::new();
    for q in quads {
        out.push_str(&format!("{}: {}, {}, {}, {}\n", q.label, q.op, q.x, q.y, q.z));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quad::{Op, Operand, QuadStore};

    #[test]
    fn renders_one_line_per_quad_in_label_order() {
        let mut store = QuadStore::new();
        store.genquad(
            Op::BeginBlock,
            Operand::name("P"),
            Operand::Empty,
            Operand::Empty,
        );
        store.genquad(Op::Halt, Operand::Empty, Operand::Empty, Operand::Empty);
        store.genquad(
            Op::EndBlock,
            Operand::name("P"),
            Operand::Empty,
            Operand::Empty,
        );

        assert_eq!(
            render(store.quads()),
            "1: begin_block, P, _, _\n2: halt, _, _, _\n3: end_block, P, _, _\n"
        );
    }

    #[test]
    fn underscore_marks_unused_operand_positions() {
        let mut store = QuadStore::new();
        store.genquad(Op::Jump, Operand::Empty, Operand::Empty, Operand::label(7));
        assert_eq!(render(store.quads()), "1: jump, _, _, 7\n");
    }
}
