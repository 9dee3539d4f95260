//! A reference interpreter that runs a quad vector directly, without going
//! through assembly at all. It exists to validate the meaning of generated
//! quads in tests (see `tests/`): running the RISC-V text through an actual
//! target is out of scope for this crate, so a quad-level interpreter is the
//! practical way to assert runtime behavior rather than just textual shape.
//!
//! This is not part of the CLI pipeline; `cimplec` never invokes it.

use std::collections::HashMap;
use std::fmt;

use crate::quad::{Op, Operand, Quad};

/// Why a run stopped before reaching `halt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// No quad with this label exists.
    BadJumpTarget(u32),
    /// A name operand was read before ever being assigned.
    UninitializedName(String),
    /// A quad referenced an operand shape the interpreter doesn't expect
    /// (e.g. a `jump` whose `z` is still unresolved).
    MalformedQuad { label: u32, detail: String },
    /// Ran past the last quad without ever executing `halt`.
    FellOffTheEnd,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::BadJumpTarget(l) => write!(f, "jump to nonexistent label {l}"),
            RunError::UninitializedName(n) => write!(f, "read of uninitialized name '{n}'"),
            RunError::MalformedQuad { label, detail } => {
                write!(f, "malformed quad at label {label}: {detail}")
            }
            RunError::FellOffTheEnd => write!(f, "ran past the last quad without executing halt"),
        }
    }
}

impl std::error::Error for RunError {}

/// Drives test input and captures program output, in source order.
#[derive(Debug, Default)]
pub struct Io {
    input: Vec<i64>,
    input_pos: usize,
    pub output: Vec<i64>,
}

impl Io {
    pub fn with_input(input: Vec<i64>) -> Self {
        Io {
            input,
            input_pos: 0,
            output: Vec::new(),
        }
    }

    fn next_input(&mut self) -> i64 {
        let v = self.input.get(self.input_pos).copied().unwrap_or(0);
        self.input_pos += 1;
        v
    }
}

/// Executes `quads` to completion (a `halt` quad), driven by `io`.
/// Returns the final flat memory map of every name that was ever assigned.
pub fn run(quads: &[Quad], io: &mut Io) -> Result<HashMap<String, i64>, RunError> {
    let by_label: HashMap<u32, usize> = quads.iter().enumerate().map(|(i, q)| (q.label, i)).collect();
    let mut memory: HashMap<String, i64> = HashMap::new();
    let mut pc = 0usize;

    loop {
        let quad = quads.get(pc).ok_or(RunError::FellOffTheEnd)?;
        match quad.op {
            Op::Halt => return Ok(memory),
            Op::BeginBlock | Op::EndBlock | Op::Call | Op::Retv | Op::Par => {
                // No cross-subprogram call support in this reference
                // interpreter: tests that need one run a single flat block.
                pc += 1;
            }
            Op::Assign => {
                let v = value_of(&quad.x, &memory, quad.label)?;
                store(&mut memory, &quad.z, v, quad.label)?;
                pc += 1;
            }
            Op::Add | Op::Sub | Op::Mul | Op::Div => {
                let a = value_of(&quad.x, &memory, quad.label)?;
                let b = value_of(&quad.y, &memory, quad.label)?;
                let result = match quad.op {
                    Op::Add => a + b,
                    Op::Sub => a - b,
                    Op::Mul => a * b,
                    Op::Div => a / b,
                    _ => unreachable!(),
                };
                store(&mut memory, &quad.z, result, quad.label)?;
                pc += 1;
            }
            Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge => {
                let a = value_of(&quad.x, &memory, quad.label)?;
                let b = value_of(&quad.y, &memory, quad.label)?;
                let taken = match quad.op {
                    Op::Eq => a == b,
                    Op::Ne => a != b,
                    Op::Lt => a < b,
                    Op::Le => a <= b,
                    Op::Gt => a > b,
                    Op::Ge => a >= b,
                    _ => unreachable!(),
                };
                if taken {
                    pc = jump_index(&quad.z, &by_label, quad.label)?;
                } else {
                    pc += 1;
                }
            }
            Op::Jump => {
                pc = jump_index(&quad.z, &by_label, quad.label)?;
            }
            Op::Inp => {
                let v = io.next_input();
                store(&mut memory, &quad.x, v, quad.label)?;
                pc += 1;
            }
            Op::Out => {
                let v = value_of(&quad.x, &memory, quad.label)?;
                io.output.push(v);
                pc += 1;
            }
        }
    }
}

fn jump_index(z: &Operand, by_label: &HashMap<u32, usize>, at: u32) -> Result<usize, RunError> {
    match z {
        Operand::Label(Some(target)) => by_label.get(target).copied().ok_or(RunError::BadJumpTarget(*target)),
        other => Err(RunError::MalformedQuad {
            label: at,
            detail: format!("expected a resolved jump target, got {other:?}"),
        }),
    }
}

fn value_of(operand: &Operand, memory: &HashMap<String, i64>, at: u32) -> Result<i64, RunError> {
    match operand {
        Operand::Literal(text) => text.parse::<i64>().map_err(|_| RunError::MalformedQuad {
            label: at,
            detail: format!("'{text}' is not a valid integer literal"),
        }),
        Operand::Name(name) => memory
            .get(name)
            .copied()
            .ok_or_else(|| RunError::UninitializedName(name.clone())),
        other => Err(RunError::MalformedQuad {
            label: at,
            detail: format!("expected a value-bearing operand, got {other:?}"),
        }),
    }
}

fn store(memory: &mut HashMap<String, i64>, operand: &Operand, value: i64, at: u32) -> Result<(), RunError> {
    match operand {
        Operand::Name(name) => {
            memory.insert(name.clone(), value);
            Ok(())
        }
        other => Err(RunError::MalformedQuad {
            label: at,
            detail: format!("expected a name operand to store into, got {other:?}"),
        }),
    }
}
