//! Recursive-descent parser fused with intermediate-code emission.
//!
//! There is no AST: every production drives the quad store (`QuadStore`)
//! and symbol table (`SymbolTable`) directly as it recognizes the
//! grammar, in the single left-to-right pass described in the module's
//! design notes. `label == emission order` throughout, which is what
//! makes the backpatching scheme below sound.

use crate::error::CompileError;
use crate::lexer::{Token, TokenFamily, tokenize};
use crate::quad::{Op, Operand, PassMode, PatchList, QuadStore};
use crate::symtab::{Entity, SymbolTable};

const RELATIONAL_OPS: &[&str] = &["=", "<=", ">=", ">", "<", "<>"];

/// The two patch lists a boolean expression carries up the call stack
/// while it waits for its true/false branch targets to be known.
#[derive(Debug, Clone)]
struct BoolResult {
    truelist: PatchList,
    falselist: PatchList,
}

/// Parses a Cimple program, emitting quads and building the symbol table
/// as it goes. On success, `quads` holds a fully backpatched instruction
/// stream and `symtab` holds every declaration made anywhere in the
/// program (closed scopes included).
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    pub quads: QuadStore,
    pub symtab: SymbolTable,
    /// The name after `program`, filled in once `parse_program` succeeds.
    /// The assembly emitter needs it to know which `begin_block` is `Lmain`.
    pub program_name: String,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, CompileError> {
        let tokens = tokenize(source)?;
        let mut symtab = SymbolTable::new();
        symtab.open_scope();
        Ok(Parser {
            tokens,
            pos: 0,
            quads: QuadStore::new(),
            symtab,
            program_name: String::new(),
        })
    }

    /// Parses the whole `program ... .` unit. This is the only public
    /// entry point; everything else is a private grammar production.
    pub fn parse_program(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("program")?;
        let prog_name = self.expect_identifier()?;
        self.program_name = prog_name.clone();
        self.declarations()?;
        self.subprograms()?;
        self.quads.genquad(
            Op::BeginBlock,
            Operand::name(prog_name.clone()),
            Operand::Empty,
            Operand::Empty,
        );
        self.statements()?;
        self.quads
            .genquad(Op::Halt, Operand::Empty, Operand::Empty, Operand::Empty);
        self.quads.genquad(
            Op::EndBlock,
            Operand::name(prog_name),
            Operand::Empty,
            Operand::Empty,
        );
        self.expect_symbol(".")?;
        Ok(())
    }

    // ---- token cursor -----------------------------------------------

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// True if the current token's lexeme equals `lexeme`, without consuming it.
    fn check(&self, lexeme: &str) -> bool {
        self.current().is_some_and(|t| t.lexeme == lexeme)
    }

    fn current_line(&self) -> u32 {
        self.current()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(0)
    }

    fn syntax_error(&self, message: impl Into<String>) -> CompileError {
        CompileError::Syntax {
            message: message.into(),
            line: self.current_line(),
        }
    }

    fn expect(&mut self, family: TokenFamily, lexeme: Option<&str>) -> Result<Token, CompileError> {
        let Some(tok) = self.current().cloned() else {
            let expected = lexeme.unwrap_or("more input");
            return Err(self.syntax_error(format!("expected '{expected}', found end of input")));
        };
        let matches = tok.family == family && lexeme.is_none_or(|l| tok.lexeme == l);
        if !matches {
            let expected = lexeme.unwrap_or("identifier");
            return Err(self.syntax_error(format!(
                "expected '{expected}', found '{}'",
                tok.lexeme
            )));
        }
        self.pos += 1;
        Ok(tok)
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<Token, CompileError> {
        self.expect(TokenFamily::Keyword, Some(kw))
    }

    fn expect_symbol(&mut self, sym: &str) -> Result<Token, CompileError> {
        self.expect(TokenFamily::Symbol, Some(sym))
    }

    fn expect_operator(&mut self, op: &str) -> Result<Token, CompileError> {
        self.expect(TokenFamily::Operator, Some(op))
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        Ok(self.expect(TokenFamily::Identifier, None)?.lexeme)
    }

    // ---- declarations & subprogram framing ---------------------------

    fn declarations(&mut self) -> Result<(), CompileError> {
        while self.check("declare") {
            self.expect_keyword("declare")?;
            self.varlist()?;
            self.expect_symbol(";")?;
        }
        Ok(())
    }

    fn varlist(&mut self) -> Result<(), CompileError> {
        self.declare_one_var()?;
        while self.check(",") {
            self.expect_symbol(",")?;
            self.declare_one_var()?;
        }
        Ok(())
    }

    fn declare_one_var(&mut self) -> Result<(), CompileError> {
        let name = self.expect_identifier()?;
        let offset = self.symtab.allocate_offset();
        self.symtab
            .declare(Entity::Variable {
                name: name.clone(),
                offset,
            })
            .map_err(|message| CompileError::Semantic { message })
    }

    fn subprograms(&mut self) -> Result<(), CompileError> {
        while self.check("function") || self.check("procedure") {
            self.subprogram()?;
        }
        Ok(())
    }

    fn subprogram(&mut self) -> Result<(), CompileError> {
        let is_function = self.check("function");
        if is_function {
            self.expect_keyword("function")?;
        } else {
            self.expect_keyword("procedure")?;
        }
        let name = self.expect_identifier()?;
        self.quads.genquad(
            Op::BeginBlock,
            Operand::name(name.clone()),
            Operand::Empty,
            Operand::Empty,
        );
        self.expect_symbol("(")?;
        self.symtab.open_scope();
        self.formalparlist()?;
        self.expect_symbol(")")?;
        self.declarations()?;
        self.subprograms()?;
        self.statements()?;
        self.quads.genquad(
            Op::EndBlock,
            Operand::name(name),
            Operand::Empty,
            Operand::Empty,
        );
        self.symtab.close_scope();
        Ok(())
    }

    fn formalparlist(&mut self) -> Result<(), CompileError> {
        if self.check("in") || self.check("inout") {
            self.formalparitem()?;
            while self.check(",") {
                self.expect_symbol(",")?;
                self.formalparitem()?;
            }
        }
        Ok(())
    }

    /// Passing mode is parsed but not preserved anywhere — matches the
    /// source's behavior (see the open question in the design notes).
    fn formalparitem(&mut self) -> Result<(), CompileError> {
        if self.check("in") {
            self.expect_keyword("in")?;
        } else if self.check("inout") {
            self.expect_keyword("inout")?;
        } else {
            return Err(self.syntax_error("expected formal parameter starting with 'in' or 'inout'"));
        }
        let name = self.expect_identifier()?;
        let offset = self.symtab.allocate_offset();
        self.symtab
            .declare(Entity::Variable { name, offset })
            .map_err(|message| CompileError::Semantic { message })
    }

    // ---- statements ---------------------------------------------------

    fn statements(&mut self) -> Result<(), CompileError> {
        if self.check("{") {
            self.expect_symbol("{")?;
            self.statement()?;
            while self.check(";") {
                self.expect_symbol(";")?;
                self.statement()?;
            }
            self.expect_symbol("}")?;
        } else {
            self.statement()?;
            self.expect_symbol(";")?;
        }
        Ok(())
    }

    fn statement(&mut self) -> Result<(), CompileError> {
        let Some(tok) = self.current().cloned() else {
            return Ok(());
        };
        match (tok.family, tok.lexeme.as_str()) {
            (TokenFamily::Identifier, _) => self.assign_stat(),
            (_, "if") => self.if_stat(),
            (_, "while") => self.while_stat(),
            (_, "switchcase") => self.switchcase_stat(),
            (_, "forcase") => self.forcase_stat(),
            (_, "incase") => self.incase_stat(),
            (_, "call") => self.call_stat(),
            (_, "return") => self.return_stat(),
            (_, "input") => self.input_stat(),
            (_, "print") => self.print_stat(),
            _ => Ok(()),
        }
    }

    fn assign_stat(&mut self) -> Result<(), CompileError> {
        let lhs = self.expect_identifier()?;
        self.expect_operator(":=")?;
        let place = self.expression()?;
        if place != Operand::name(lhs.clone()) {
            self.quads
                .genquad(Op::Assign, place, Operand::Empty, Operand::name(lhs));
        }
        Ok(())
    }

    fn return_stat(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("return")?;
        self.expect_symbol("(")?;
        let value = self.expression()?;
        self.quads
            .genquad(Op::Retv, value, Operand::Empty, Operand::Empty);
        self.expect_symbol(")")?;
        Ok(())
    }

    fn print_stat(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("print")?;
        self.expect_symbol("(")?;
        let value = self.expression()?;
        self.quads
            .genquad(Op::Out, value, Operand::Empty, Operand::Empty);
        self.expect_symbol(")")?;
        Ok(())
    }

    fn input_stat(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("input")?;
        self.expect_symbol("(")?;
        let var = self.expect_identifier()?;
        self.quads
            .genquad(Op::Inp, Operand::name(var), Operand::Empty, Operand::Empty);
        self.expect_symbol(")")?;
        Ok(())
    }

    fn call_stat(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("call")?;
        let name = self.expect_identifier()?;
        self.expect_symbol("(")?;
        self.actualparlist()?;
        self.expect_symbol(")")?;
        self.quads
            .genquad(Op::Call, Operand::name(name), Operand::Empty, Operand::Empty);
        Ok(())
    }

    /// One actual parameter: either `in <expr>` or `inout <identifier>`.
    /// Emits its `par` quad immediately and returns nothing, since a
    /// standalone `call` statement has no return slot to thread through.
    fn actualparitem(&mut self) -> Result<(), CompileError> {
        if self.check("in") {
            self.expect_keyword("in")?;
            let value = self.expression()?;
            self.quads
                .genquad(Op::Par, value, Operand::Mode(PassMode::Cv), Operand::Empty);
        } else if self.check("inout") {
            self.expect_keyword("inout")?;
            let name = self.expect_identifier()?;
            self.quads.genquad(
                Op::Par,
                Operand::name(name),
                Operand::Mode(PassMode::Ref),
                Operand::Empty,
            );
        } else {
            return Err(self.syntax_error("expected actual parameter starting with 'in' or 'inout'"));
        }
        Ok(())
    }

    fn actualparlist(&mut self) -> Result<(), CompileError> {
        if !self.check(")") {
            self.actualparitem()?;
            while self.check(",") {
                self.expect_symbol(",")?;
                self.actualparitem()?;
            }
        }
        Ok(())
    }

    // ---- structured control flow ---------------------------------------

    fn if_stat(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("if")?;
        self.expect_symbol("(")?;
        let b = self.condition()?;
        self.expect_symbol(")")?;
        self.quads.backpatch(&b.truelist, self.quads.nextquad());
        self.statements()?;
        let jump_after_then =
            self.quads
                .genquad(Op::Jump, Operand::Empty, Operand::Empty, Operand::pending());
        self.quads.backpatch(&b.falselist, self.quads.nextquad());
        if self.check("else") {
            self.expect_keyword("else")?;
            self.statements()?;
        }
        self.quads
            .backpatch(&[jump_after_then], self.quads.nextquad());
        Ok(())
    }

    fn while_stat(&mut self) -> Result<(), CompileError> {
        let m = self.quads.nextquad();
        self.expect_keyword("while")?;
        self.expect_symbol("(")?;
        let b = self.condition()?;
        self.expect_symbol(")")?;
        self.quads.backpatch(&b.truelist, self.quads.nextquad());
        self.statements()?;
        self.quads
            .genquad(Op::Jump, Operand::Empty, Operand::Empty, Operand::label(m));
        self.quads.backpatch(&b.falselist, self.quads.nextquad());
        Ok(())
    }

    fn switchcase_stat(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("switchcase")?;
        let mut exit_list: PatchList = Vec::new();
        while self.check("case") {
            self.expect_keyword("case")?;
            let cond = self.parenthesized_or_bare_condition()?;
            self.quads.backpatch(&cond.truelist, self.quads.nextquad());
            self.statements()?;
            let jump =
                self.quads
                    .genquad(Op::Jump, Operand::Empty, Operand::Empty, Operand::pending());
            exit_list = QuadStore::merge(exit_list, QuadStore::makelist(jump));
            self.quads.backpatch(&cond.falselist, self.quads.nextquad());
        }
        self.expect_keyword("default")?;
        self.statements()?;
        self.quads.backpatch(&exit_list, self.quads.nextquad());
        Ok(())
    }

    fn forcase_stat(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("forcase")?;
        let first_cond_quad = self.quads.nextquad();
        let mut prev_falselist: Option<PatchList> = None;
        while self.check("case") {
            let current_cond_quad = self.quads.nextquad();
            self.expect_keyword("case")?;
            self.expect_symbol("(")?;
            let cond = self.condition()?;
            self.expect_symbol(")")?;
            if let Some(falselist) = prev_falselist.take() {
                self.quads.backpatch(&falselist, current_cond_quad);
            }
            self.quads.backpatch(&cond.truelist, self.quads.nextquad());
            self.statements()?;
            self.quads.genquad(
                Op::Jump,
                Operand::Empty,
                Operand::Empty,
                Operand::label(first_cond_quad),
            );
            prev_falselist = Some(cond.falselist);
        }
        self.expect_keyword("default")?;
        if let Some(falselist) = prev_falselist {
            self.quads.backpatch(&falselist, self.quads.nextquad());
        }
        self.statements()?;
        Ok(())
    }

    fn incase_stat(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("incase")?;
        let flag = self.new_temp()?;
        let first_quad = self.quads.nextquad();
        self.quads.genquad(
            Op::Assign,
            Operand::literal("0"),
            Operand::Empty,
            Operand::name(flag.clone()),
        );
        while self.check("case") {
            self.expect_keyword("case")?;
            let cond = self.parenthesized_or_bare_condition()?;
            self.quads.backpatch(&cond.truelist, self.quads.nextquad());
            self.statements()?;
            self.quads.genquad(
                Op::Assign,
                Operand::literal("1"),
                Operand::Empty,
                Operand::name(flag.clone()),
            );
            self.quads.backpatch(&cond.falselist, self.quads.nextquad());
        }
        self.expect_keyword("default")?;
        self.quads.genquad(
            Op::Eq,
            Operand::literal("1"),
            Operand::name(flag),
            Operand::label(first_quad),
        );
        self.statements()?;
        Ok(())
    }

    /// `switchcase`/`incase` allow `case (cond)` or bare `case cond`
    /// (the parenthesis was optional in the source this is distilled
    /// from); `forcase` always requires the parens.
    fn parenthesized_or_bare_condition(&mut self) -> Result<BoolResult, CompileError> {
        if self.check("(") {
            self.expect_symbol("(")?;
            let cond = self.condition()?;
            self.expect_symbol(")")?;
            Ok(cond)
        } else {
            self.condition()
        }
    }

    // ---- short-circuit boolean translation ------------------------------

    fn condition(&mut self) -> Result<BoolResult, CompileError> {
        let mut b = self.boolterm()?;
        while self.check("or") {
            self.expect_keyword("or")?;
            let marker = self.quads.nextquad();
            self.quads.backpatch(&b.falselist, marker);
            let b2 = self.boolterm()?;
            b = BoolResult {
                truelist: QuadStore::merge(b.truelist, b2.truelist),
                falselist: b2.falselist,
            };
        }
        Ok(b)
    }

    fn boolterm(&mut self) -> Result<BoolResult, CompileError> {
        let mut b = self.boolfactor()?;
        while self.check("and") {
            self.expect_keyword("and")?;
            let marker = self.quads.nextquad();
            self.quads.backpatch(&b.truelist, marker);
            let b2 = self.boolfactor()?;
            b = BoolResult {
                truelist: b2.truelist,
                falselist: QuadStore::merge(b.falselist, b2.falselist),
            };
        }
        Ok(b)
    }

    fn boolfactor(&mut self) -> Result<BoolResult, CompileError> {
        if self.check("not") {
            self.expect_keyword("not")?;
            self.expect_symbol("[")?;
            let b = self.condition()?;
            self.expect_symbol("]")?;
            return Ok(BoolResult {
                truelist: b.falselist,
                falselist: b.truelist,
            });
        }
        if self.check("[") {
            self.expect_symbol("[")?;
            let b = self.condition()?;
            self.expect_symbol("]")?;
            return Ok(b);
        }
        let left = self.expression()?;
        let Some(tok) = self.current().cloned() else {
            return Err(self.syntax_error("expected relational operator in boolean factor"));
        };
        if tok.family != TokenFamily::Operator || !RELATIONAL_OPS.contains(&tok.lexeme.as_str()) {
            return Err(self.syntax_error("expected relational operator in boolean factor"));
        }
        let op = relational_op(&tok.lexeme);
        self.advance();
        let right = self.expression()?;
        let q_true = self.quads.genquad(op, left, right, Operand::pending());
        let q_false =
            self.quads
                .genquad(Op::Jump, Operand::Empty, Operand::Empty, Operand::pending());
        Ok(BoolResult {
            truelist: QuadStore::makelist(q_true),
            falselist: QuadStore::makelist(q_false),
        })
    }

    // ---- arithmetic expressions -----------------------------------------

    fn expression(&mut self) -> Result<Operand, CompileError> {
        let mut place = self.term()?;
        while self.current_operator_is_one_of(&["+", "-"]) {
            let op_lexeme = self.advance().expect("checked above").lexeme;
            let right = self.term()?;
            let temp = self.new_temp()?;
            let op = if op_lexeme == "+" { Op::Add } else { Op::Sub };
            self.quads
                .genquad(op, place, right, Operand::name(temp.clone()));
            place = Operand::name(temp);
        }
        Ok(place)
    }

    fn term(&mut self) -> Result<Operand, CompileError> {
        let mut place = self.factor()?;
        while self.current_operator_is_one_of(&["*", "/"]) {
            let op_lexeme = self.advance().expect("checked above").lexeme;
            let right = self.factor()?;
            let temp = self.new_temp()?;
            let op = if op_lexeme == "*" { Op::Mul } else { Op::Div };
            self.quads
                .genquad(op, place, right, Operand::name(temp.clone()));
            place = Operand::name(temp);
        }
        Ok(place)
    }

    fn factor(&mut self) -> Result<Operand, CompileError> {
        let unary_minus = if self.current_operator_is_one_of(&["+", "-"]) {
            let lexeme = self.advance().expect("checked above").lexeme;
            Some(lexeme == "-")
        } else {
            None
        };

        let mut result = match self.current().cloned() {
            Some(tok) if tok.family == TokenFamily::Identifier => {
                self.advance();
                if self.check("(") {
                    self.expect_symbol("(")?;
                    let args = self.collect_actualpar_for_call()?;
                    self.expect_symbol(")")?;
                    for (mode, value) in args {
                        self.quads.genquad(Op::Par, value, Operand::Mode(mode), Operand::Empty);
                    }
                    let temp = self.new_temp()?;
                    self.quads.genquad(
                        Op::Par,
                        Operand::name(temp.clone()),
                        Operand::Mode(PassMode::Ret),
                        Operand::Empty,
                    );
                    self.quads.genquad(
                        Op::Call,
                        Operand::name(tok.lexeme),
                        Operand::Empty,
                        Operand::Empty,
                    );
                    Operand::name(temp)
                } else {
                    Operand::name(tok.lexeme)
                }
            }
            Some(tok) if tok.family == TokenFamily::Number => {
                self.advance();
                Operand::literal(tok.lexeme)
            }
            Some(tok) if tok.family == TokenFamily::Symbol && tok.lexeme == "(" => {
                self.expect_symbol("(")?;
                let inner = self.expression()?;
                self.expect_symbol(")")?;
                inner
            }
            _ => return Err(self.syntax_error("unexpected token in factor")),
        };

        if unary_minus == Some(true) {
            let temp = self.new_temp()?;
            self.quads.genquad(
                Op::Mul,
                result,
                Operand::literal("-1"),
                Operand::name(temp.clone()),
            );
            result = Operand::name(temp);
        }
        Ok(result)
    }

    /// A call's actual parameters, used from `factor`: unlike the
    /// standalone `call` statement, a call-as-expression needs the
    /// `(mode, value)` pairs *before* it can also emit the `par ret` slot.
    fn collect_actualpar_for_call(&mut self) -> Result<Vec<(PassMode, Operand)>, CompileError> {
        let mut params = Vec::new();
        if !self.check(")") {
            params.push(self.one_actualpar_value()?);
            while self.check(",") {
                self.expect_symbol(",")?;
                params.push(self.one_actualpar_value()?);
            }
        }
        Ok(params)
    }

    fn one_actualpar_value(&mut self) -> Result<(PassMode, Operand), CompileError> {
        if self.check("in") {
            self.expect_keyword("in")?;
            let value = self.expression()?;
            Ok((PassMode::Cv, value))
        } else if self.check("inout") {
            self.expect_keyword("inout")?;
            let name = self.expect_identifier()?;
            Ok((PassMode::Ref, Operand::name(name)))
        } else {
            Err(self.syntax_error("expected actual parameter starting with 'in' or 'inout'"))
        }
    }

    fn current_operator_is_one_of(&self, ops: &[&str]) -> bool {
        self.current()
            .is_some_and(|t| t.family == TokenFamily::Operator && ops.contains(&t.lexeme.as_str()))
    }

    /// Allocates a fresh temporary, declaring it in the currently active
    /// scope so its offset comes from the enclosing subprogram's frame.
    fn new_temp(&mut self) -> Result<String, CompileError> {
        let name = self.quads.newtemp();
        let offset = self.symtab.allocate_offset();
        self.symtab
            .declare(Entity::TemporaryVariable {
                name: name.clone(),
                offset,
            })
            .map_err(|message| CompileError::Semantic { message })?;
        Ok(name)
    }
}

fn relational_op(lexeme: &str) -> Op {
    match lexeme {
        "=" => Op::Eq,
        "<>" => Op::Ne,
        "<" => Op::Lt,
        "<=" => Op::Le,
        ">" => Op::Gt,
        ">=" => Op::Ge,
        _ => unreachable!("caller already validated lexeme is a relational operator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Parser {
        let mut parser = Parser::new(src).expect("tokenize should succeed");
        parser.parse_program().expect("parse should succeed");
        parser
    }

    fn quad_strings(parser: &Parser) -> Vec<String> {
        parser
            .quads
            .quads()
            .iter()
            .map(|q| format!("{}: {}, {}, {}, {}", q.label, q.op, q.x, q.y, q.z))
            .collect()
    }

    #[test]
    fn assignment_and_arithmetic_match_seed_scenario() {
        let parser = parse("program P declare a; { a := 1 + 2 * 3 }.");
        assert_eq!(
            quad_strings(&parser),
            vec![
                "1: begin_block, P, _, _",
                "2: *, 2, 3, T_1",
                "3: +, 1, T_1, T_2",
                "4: :=, T_2, _, a",
                "5: halt, _, _, _",
                "6: end_block, P, _, _",
            ]
        );
    }

    #[test]
    fn bare_identifier_assignment_emits_no_quad() {
        let parser = parse("program P declare a, b; { a := b }.");
        let ops: Vec<_> = parser.quads.quads().iter().map(|q| q.op).collect();
        assert!(!ops.contains(&Op::Assign));
    }

    #[test]
    fn if_without_else_targets_the_same_label_for_jump_and_false_branch() {
        let parser = parse("program P declare a, x; { if (a < 1) { x := 1 } }.");
        let quads = parser.quads.quads();
        let jumps: Vec<_> = quads.iter().filter(|q| q.op == Op::Jump).collect();
        assert_eq!(jumps.len(), 2, "condition's false-jump and the then-jump");
        assert_eq!(
            jumps[0].z, jumps[1].z,
            "condition's false branch and the unconditional then-jump land on the same label"
        );
        assert!(parser.quads.fully_backpatched());
    }

    #[test]
    fn if_else_backpatches_every_placeholder() {
        let parser = parse(
            "program P declare a, b, x; { if (a < b) { x := 1 } else { x := 2 } }.",
        );
        assert!(parser.quads.fully_backpatched());
    }

    #[test]
    fn while_loops_back_to_the_condition() {
        let parser = parse("program P declare a; { while (a < 10) { a := a + 1 } }.");
        let quads = parser.quads.quads();
        let rel_label = quads.iter().find(|q| q.op == Op::Lt).unwrap().label;
        let loop_jump = quads.iter().rev().find(|q| q.op == Op::Jump).unwrap();
        assert_eq!(loop_jump.z, Operand::label(rel_label));
        assert!(parser.quads.fully_backpatched());
    }

    #[test]
    fn switchcase_falls_through_and_merges_exits() {
        let parser = parse(
            "program P declare a, x; \
             { switchcase case (a = 1) x := 1; case (a = 2) x := 2; default x := 0 }.",
        );
        assert!(parser.quads.fully_backpatched());
    }

    #[test]
    fn forcase_retests_from_the_top() {
        let parser = parse(
            "program P declare a, x; \
             { forcase case (a = 1) x := 1; case (a = 2) x := 2; default x := 0 }.",
        );
        let quads = parser.quads.quads();
        let first_cond = quads.iter().find(|q| q.op == Op::Eq).unwrap().label;
        let loop_jumps: Vec<_> = quads
            .iter()
            .filter(|q| q.op == Op::Jump && q.z == Operand::label(first_cond))
            .collect();
        assert_eq!(loop_jumps.len(), 2, "each case body should jump to the first case");
        assert!(parser.quads.fully_backpatched());
    }

    #[test]
    fn incase_initializes_and_tests_the_flag() {
        let parser = parse(
            "program P declare a, x; \
             { incase case (a = 1) x := 1; case (a = 2) x := 2; default x := 0 }.",
        );
        let quads = parser.quads.quads();
        let flag_init = quads
            .iter()
            .find(|q| q.op == Op::Assign && q.x == Operand::literal("0"))
            .expect("flag initialized to 0");
        let repeat_test = quads
            .iter()
            .find(|q| q.op == Op::Eq && q.x == Operand::literal("1"))
            .expect("post-default equality test");
        assert_eq!(repeat_test.z, Operand::label(flag_init.label));
        assert!(parser.quads.fully_backpatched());
    }

    #[test]
    fn function_call_emits_par_quads_then_call_then_assign() {
        let parser = parse(
            "program P declare a, b, x; \
             function f(in p, inout q) declare r; { return(p) } \
             { x := f(in a, inout b) }.",
        );
        let ops: Vec<_> = parser.quads.quads().iter().map(|q| q.op).collect();
        let call_idx = ops.iter().position(|op| *op == Op::Call).unwrap();
        assert_eq!(ops[call_idx - 3], Op::Par);
        assert_eq!(ops[call_idx - 2], Op::Par);
        assert_eq!(ops[call_idx - 1], Op::Par);
        assert_eq!(ops[call_idx + 1], Op::Assign);
    }

    #[test]
    fn duplicate_declaration_is_a_semantic_error() {
        let mut parser = Parser::new("program P declare a, a; { }.").unwrap();
        let err = parser.parse_program().unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn missing_relational_operator_is_a_syntax_error() {
        let mut parser = Parser::new("program P declare a; { if (a) { } }.").unwrap();
        let err = parser.parse_program().unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }

    #[test]
    fn empty_statements_block_emits_no_body_quads() {
        let parser = parse("program P { }.");
        assert_eq!(parser.quads.quads().len(), 3);
    }

    #[test]
    fn temporaries_are_declared_in_the_active_scope() {
        let parser = parse("program P declare a; { a := 1 + 2 }.");
        assert!(parser.symtab.get_offset("T_1").is_some());
    }
}
