//! The quad store: an append-only, randomly-addressable vector of
//! three/four-address intermediate instructions, plus the handful of
//! operations the parser uses to build and backpatch it.

use std::fmt;

/// The operator of one quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Jump,
    Halt,
    BeginBlock,
    EndBlock,
    Par,
    Call,
    Retv,
    Inp,
    Out,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Assign => ":=",
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Jump => "jump",
            Op::Halt => "halt",
            Op::BeginBlock => "begin_block",
            Op::EndBlock => "end_block",
            Op::Par => "par",
            Op::Call => "call",
            Op::Retv => "retv",
            Op::Inp => "inp",
            Op::Out => "out",
        };
        f.write_str(s)
    }
}

impl Op {
    /// Ops whose `z` field is a jump target that must be a resolved label
    /// (never `_`) by the time compilation finishes.
    pub fn is_control_flow(self) -> bool {
        matches!(
            self,
            Op::Jump | Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge
        )
    }
}

/// One operand position of a quad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A declared variable or temporary name.
    Name(String),
    /// A literal integer, kept in textual form (the front end never does
    /// arithmetic on literals; only the interpreter and emitter parse them).
    Literal(String),
    /// A resolved or still-pending jump target.
    Label(Option<u32>),
    /// Argument-passing mode tag used by `par`.
    Mode(PassMode),
    /// The `_` placeholder: unused.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    Cv,
    Ref,
    Ret,
}

impl fmt::Display for PassMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PassMode::Cv => "cv",
            PassMode::Ref => "ref",
            PassMode::Ret => "ret",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Name(n) => f.write_str(n),
            Operand::Literal(n) => f.write_str(n),
            Operand::Label(Some(l)) => write!(f, "{l}"),
            Operand::Label(None) => f.write_str("_"),
            Operand::Mode(m) => write!(f, "{m}"),
            Operand::Empty => f.write_str("_"),
        }
    }
}

impl Operand {
    pub fn name(n: impl Into<String>) -> Self {
        Operand::Name(n.into())
    }

    pub fn literal(n: impl Into<String>) -> Self {
        Operand::Literal(n.into())
    }

    pub fn label(l: u32) -> Self {
        Operand::Label(Some(l))
    }

    /// An as-yet-unresolved jump target, to be filled in by `backpatch`.
    pub fn pending() -> Self {
        Operand::Label(None)
    }

    /// Whether this operand still awaits a backpatch.
    pub fn is_pending(&self) -> bool {
        matches!(self, Operand::Label(None))
    }
}

/// One four-address instruction, permanently numbered by its emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quad {
    pub label: u32,
    pub op: Op,
    pub x: Operand,
    pub y: Operand,
    pub z: Operand,
}

/// A list of quad labels whose `z` field still awaits a target.
pub type PatchList = Vec<u32>;

/// Append-only store of quads, with the handful of operations the parser
/// needs to build and backpatch a correctly-linked instruction stream.
#[derive(Debug, Default)]
pub struct QuadStore {
    quads: Vec<Quad>,
    next_temp: u32,
}

impl QuadStore {
    pub fn new() -> Self {
        QuadStore::default()
    }

    /// The label the *next* `genquad` call will assign. Does not mutate.
    pub fn nextquad(&self) -> u32 {
        self.quads.len() as u32 + 1
    }

    /// Appends a new quad, returning its freshly assigned label.
    pub fn genquad(&mut self, op: Op, x: Operand, y: Operand, z: Operand) -> u32 {
        let label = self.nextquad();
        self.quads.push(Quad { label, op, x, y, z });
        label
    }

    /// Returns a fresh `T_k` name. Does not declare it anywhere; the caller
    /// is responsible for declaring it in the currently active scope.
    pub fn newtemp(&mut self) -> String {
        self.next_temp += 1;
        format!("T_{}", self.next_temp)
    }

    pub fn makelist(label: u32) -> PatchList {
        vec![label]
    }

    pub fn merge(a: PatchList, b: PatchList) -> PatchList {
        let mut merged = a;
        merged.extend(b);
        merged
    }

    /// Resolves every pending `z` field named in `list` to `target`.
    ///
    /// Panics if a label doesn't exist or its `z` field was already
    /// resolved: both indicate a bug in the translation scheme, not a
    /// user-facing error.
    pub fn backpatch(&mut self, list: &[u32], target: u32) {
        for &label in list {
            let idx = (label - 1) as usize;
            let quad = self
                .quads
                .get_mut(idx)
                .unwrap_or_else(|| panic!("backpatch: no quad with label {label}"));
            assert!(
                quad.z.is_pending(),
                "backpatch: quad {label} already has a resolved z field"
            );
            quad.z = Operand::label(target);
        }
    }

    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// True once every control-flow quad's `z` field has been resolved.
    pub fn fully_backpatched(&self) -> bool {
        self.quads
            .iter()
            .all(|q| !q.op.is_control_flow() || !q.z.is_pending())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nextquad_does_not_advance() {
        let store = QuadStore::new();
        assert_eq!(store.nextquad(), 1);
        assert_eq!(store.nextquad(), 1);
    }

    #[test]
    fn genquad_assigns_increasing_contiguous_labels() {
        let mut store = QuadStore::new();
        let l1 = store.genquad(Op::Halt, Operand::Empty, Operand::Empty, Operand::Empty);
        let l2 = store.genquad(Op::Halt, Operand::Empty, Operand::Empty, Operand::Empty);
        assert_eq!(l1, 1);
        assert_eq!(l2, 2);
        assert_eq!(store.nextquad(), 3);
    }

    #[test]
    fn newtemp_increments_without_declaring() {
        let mut store = QuadStore::new();
        assert_eq!(store.newtemp(), "T_1");
        assert_eq!(store.newtemp(), "T_2");
    }

    #[test]
    fn merge_preserves_label_order() {
        let a = QuadStore::makelist(1);
        let b = QuadStore::makelist(2);
        let c = QuadStore::makelist(3);
        let left = QuadStore::merge(QuadStore::merge(a.clone(), b.clone()), c.clone());
        let right = QuadStore::merge(a, QuadStore::merge(b, c));
        assert_eq!(left, right);
        assert_eq!(left, vec![1, 2, 3]);
    }

    #[test]
    fn backpatch_empty_list_is_a_no_op() {
        let mut store = QuadStore::new();
        store.genquad(Op::Jump, Operand::Empty, Operand::Empty, Operand::pending());
        store.backpatch(&Vec::new(), 99);
        assert!(store.quads()[0].z.is_pending());
    }

    #[test]
    fn backpatch_resolves_pending_z_fields() {
        let mut store = QuadStore::new();
        let l = store.genquad(Op::Jump, Operand::Empty, Operand::Empty, Operand::pending());
        store.backpatch(&QuadStore::makelist(l), 42);
        assert_eq!(store.quads()[0].z, Operand::label(42));
    }

    #[test]
    #[should_panic(expected = "already has a resolved z field")]
    fn backpatch_twice_panics() {
        let mut store = QuadStore::new();
        let l = store.genquad(Op::Jump, Operand::Empty, Operand::Empty, Operand::pending());
        store.backpatch(&QuadStore::makelist(l), 5);
        store.backpatch(&QuadStore::makelist(l), 6);
    }

    #[test]
    fn fully_backpatched_detects_dangling_jump() {
        let mut store = QuadStore::new();
        store.genquad(Op::Jump, Operand::Empty, Operand::Empty, Operand::pending());
        assert!(!store.fully_backpatched());
        store.backpatch(&QuadStore::makelist(1), 1);
        assert!(store.fully_backpatched());
    }
}
