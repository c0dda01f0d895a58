//! Compiles an analyzed C-minus program into x86-64 assembly.
//!
//! The output is AT&T syntax for the System V calling convention and is
//! meant to be assembled and linked with a C runtime that provides
//! `printf`.
//!
//! # Layout
//!
//! * `.text` with one block per function, in source order
//! * `.bss` with one zero-filled block per global variable
//! * `.rodata` with the fixed format strings for `write`/`writeln`,
//!   followed by one entry per labeled string literal
//!
//! # Values
//!
//! Every value is 8 bytes. Integers are 32-bit two's complement kept
//! sign-extended to 64 bits, so every arithmetic result is truncated with
//! `cltq` and `write` prints it with `%d`. Strings and pointers are
//! addresses. Expressions leave their value in `%rax`.
//! Binary operators evaluate the right operand first and push it, then
//! evaluate the left operand into `%rax` and combine it with the top of the
//! stack, so `a - b` computes `%rax - (%rsp)` with `a` in `%rax`.
//!
//! # Frames
//!
//! Every parameter and every local (in any nested block) has its own slot
//! below `%rbp`. A scalar takes 8 bytes and an array `n * 8` bytes with
//! element 0 at the lowest address. The reserved size is rounded up to 16
//! bytes. The first six arguments arrive in registers and are stored into
//! their slots on entry; the remaining arguments stay where the caller
//! pushed them, starting at `16(%rbp)`.
use std::collections::HashMap;
use std::io::Write;

use cminus_dsl::ast::*;
use cminus_dsl::core::Id;
use log::debug;

use crate::emit::Emitter;
use crate::error::CodegenError;

/// Registers that carry the first six arguments of a call.
const ARGUMENT_REGISTERS: [&str; 6] = ["%rdi", "%rsi", "%rdx", "%rcx", "%r8", "%r9"];

const FORMAT_INT: &str = ".fmt_int";
const FORMAT_STRING: &str = ".fmt_str";
const FORMAT_NEWLINE: &str = ".fmt_ln";

const PRINTF: &str = "printf@PLT";

/// The largest frame or static area. Addresses are `%rbp` or `%rip` plus
/// a signed 32-bit displacement.
const MAX_STORAGE: u64 = (i32::MAX as u64) & !15;

/// Generates assembly for the program and writes it to the sink.
///
/// The program must have passed analysis: every reference bound, every
/// expression typed and every string literal labeled. Nothing is written
/// to the sink unless generation succeeds.
pub fn generate<W: Write>(program: &Program, sink: &mut W) -> Result<(), CodegenError> {
    let emitter = compile_program(program)?;
    sink.write_all(emitter.text().as_bytes())?;
    Ok(())
}

/// Compiles the program into an emitter holding the complete assembly.
fn compile_program(program: &Program) -> Result<Emitter, CodegenError> {
    let mut emitter = Emitter::new();

    emitter.emit_directive(".text");
    for function in program.functions() {
        FunctionCompiler::new(program, function, &mut emitter)?.compile(&function.body)?;
    }

    compile_globals(program, &mut emitter)?;
    compile_read_only_data(program, &mut emitter);
    emitter.emit_directive(".section .note.GNU-stack,\"\",@progbits");

    debug!(
        "Generated {} lines, maximum operand stack depth {}",
        emitter.lines().len(),
        emitter.max_depth()
    );
    Ok(emitter)
}

fn compile_globals(program: &Program, emitter: &mut Emitter) -> Result<(), CodegenError> {
    let mut globals = program.globals().peekable();
    if globals.peek().is_none() {
        return Ok(());
    }

    emitter.emit_directive(".bss");
    let mut total: u64 = 0;
    for id in globals {
        let decl = &program.decls[id];
        let bytes = slot_size(decl)?;
        total = total
            .checked_add(bytes)
            .filter(|total| *total <= MAX_STORAGE)
            .ok_or_else(|| too_large(&decl.id))?;

        emitter.emit_directive(".align 8");
        emitter.emit_label(decl.id.as_str());
        emitter.emit_directive(&format!(".zero {}", bytes));
    }
    Ok(())
}

fn compile_read_only_data(program: &Program, emitter: &mut Emitter) {
    emitter.emit_directive(".section .rodata");
    emitter.emit_label(FORMAT_INT);
    emitter.emit_directive(".string \"%d \"");
    emitter.emit_label(FORMAT_STRING);
    emitter.emit_directive(".string \"%s \"");
    emitter.emit_label(FORMAT_NEWLINE);
    emitter.emit_directive(".string \"\\n\"");

    for constant in &program.string_literals {
        emitter.emit_label(&constant.label);
        emitter.emit_directive(&format!(".string \"{}\"", escape(&constant.value)));
    }
}

/// Escapes the text for an assembler string so that it is emitted exactly
/// as written in the source.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// The number of bytes of storage for a variable.
fn slot_size(decl: &Decl) -> Result<u64, CodegenError> {
    match decl.kind {
        DeclKind::Array(size) => size.checked_mul(8).ok_or_else(|| too_large(&decl.id)),
        _ => Ok(8),
    }
}

fn too_large(id: &Id) -> CodegenError {
    CodegenError::TooLarge(format!(
        "storage through `{}` exceeds {} bytes",
        id, MAX_STORAGE
    ))
}

fn unbound(id: &Id) -> CodegenError {
    CodegenError::Contract(format!("`{}` is not bound to a declaration", id))
}

/// The stack frame of a function: where each parameter and local lives
/// relative to `%rbp`.
struct Frame {
    offsets: HashMap<DeclId, i64>,
    size: u64,
}

impl Frame {
    fn layout(program: &Program, function: &FunctionDeclaration) -> Result<Self, CodegenError> {
        let mut frame = Frame {
            offsets: HashMap::new(),
            size: 0,
        };

        let signature = program.decls[function.decl].signature().ok_or_else(|| {
            CodegenError::Contract(format!("`{}` is not a function", program.decls[function.decl].id))
        })?;
        for (position, param) in signature.params.iter().enumerate() {
            if position < ARGUMENT_REGISTERS.len() {
                frame.allocate(program, *param)?;
            } else {
                // Above the saved %rbp and the return address.
                let offset = 16 + 8 * (position - ARGUMENT_REGISTERS.len()) as i64;
                frame.offsets.insert(*param, offset);
            }
        }

        frame.compound(program, &function.body)?;
        // MAX_STORAGE is a multiple of 16, so rounding stays in range.
        frame.size = frame.size.next_multiple_of(16);
        Ok(frame)
    }

    fn allocate(&mut self, program: &Program, id: DeclId) -> Result<(), CodegenError> {
        let decl = &program.decls[id];
        let bytes = slot_size(decl)?;
        self.size = self
            .size
            .checked_add(bytes)
            .filter(|size| *size <= MAX_STORAGE)
            .ok_or_else(|| too_large(&decl.id))?;
        self.offsets.insert(id, -(self.size as i64));
        Ok(())
    }

    fn compound(&mut self, program: &Program, node: &CompoundStmt) -> Result<(), CodegenError> {
        for local in &node.locals {
            self.allocate(program, *local)?;
        }
        for stmt in &node.stmts {
            self.stmt(program, stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, program: &Program, node: &Stmt) -> Result<(), CodegenError> {
        match node {
            Stmt::Compound(compound) => self.compound(program, compound),
            Stmt::If(node) => {
                self.stmt(program, &node.then_branch)?;
                if let Some(else_branch) = &node.else_branch {
                    self.stmt(program, else_branch)?;
                }
                Ok(())
            }
            Stmt::While(node) => self.stmt(program, &node.body),
            Stmt::Expression(_) | Stmt::Return(_) | Stmt::Write(_) | Stmt::Writeln(_) => Ok(()),
        }
    }

    fn slot(&self, id: DeclId) -> Option<i64> {
        self.offsets.get(&id).copied()
    }
}

struct FunctionCompiler<'a> {
    program: &'a Program,
    decl: &'a Decl,
    frame: Frame,
    emitter: &'a mut Emitter,
    return_label: String,
}

impl<'a> FunctionCompiler<'a> {
    fn new(
        program: &'a Program,
        function: &'a FunctionDeclaration,
        emitter: &'a mut Emitter,
    ) -> Result<Self, CodegenError> {
        let decl = &program.decls[function.decl];
        Ok(FunctionCompiler {
            program,
            decl,
            frame: Frame::layout(program, function)?,
            emitter,
            return_label: format!(".Lreturn_{}", decl.id),
        })
    }

    fn compile(mut self, body: &CompoundStmt) -> Result<(), CodegenError> {
        let decl = self.decl;
        let name = decl.id.as_str();
        debug!("Compiling function {} with a {} byte frame", name, self.frame.size);

        self.emitter.emit_directive(&format!(".globl {}", name));
        self.emitter.emit_label(name);
        self.emitter.emit("push %rbp");
        self.emitter.emit("mov %rsp, %rbp");
        if self.frame.size > 0 {
            self.emitter.emit_commented(&format!("sub ${}, %rsp", self.frame.size), "frame");
        }
        self.store_params()?;

        self.compound(body)?;

        if self.emitter.depth() != 0 {
            return Err(CodegenError::Contract(format!(
                "operand stack is unbalanced at the end of `{}`",
                name
            )));
        }

        self.emitter.emit("mov $0, %rax");
        self.emitter.emit_label(&self.return_label);
        self.emitter.emit("mov %rbp, %rsp");
        self.emitter.emit("pop %rbp");
        self.emitter.emit("ret");
        Ok(())
    }

    fn store_params(&mut self) -> Result<(), CodegenError> {
        let (program, decl) = (self.program, self.decl);
        let params = match decl.signature() {
            Some(signature) => &signature.params,
            None => return Ok(()),
        };
        for (param, register) in params.iter().zip(ARGUMENT_REGISTERS) {
            let location = self.location(*param)?;
            let name = &program.decls[*param].id;
            self.emitter
                .emit_commented(&format!("mov {}, {}", register, location), name.as_str());
        }
        Ok(())
    }

    /// The operand that addresses the storage of a variable.
    fn location(&self, id: DeclId) -> Result<String, CodegenError> {
        if let Some(offset) = self.frame.slot(id) {
            return Ok(format!("{}(%rbp)", offset));
        }
        let decl = self
            .program
            .decls
            .get(id)
            .ok_or_else(|| CodegenError::Contract(format!("unknown declaration {}", id)))?;
        Ok(format!("{}(%rip)", decl.id))
    }

    fn compound(&mut self, node: &CompoundStmt) -> Result<(), CodegenError> {
        for stmt in &node.stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, node: &Stmt) -> Result<(), CodegenError> {
        match node {
            Stmt::Compound(compound) => self.compound(compound),
            Stmt::Expression(node) => match &node.exp {
                Some(exp) => self.exp(exp),
                None => Ok(()),
            },
            Stmt::If(node) => {
                let id = self.emitter.next_label_id();
                let else_label = format!(".Lelse{}", id);
                let end_label = format!(".Lend{}", id);

                self.exp(&node.cond)?;
                self.emitter.emit("cmp $0, %rax");
                match &node.else_branch {
                    Some(else_branch) => {
                        self.emitter.emit(&format!("je {}", else_label));
                        self.stmt(&node.then_branch)?;
                        self.emitter.emit(&format!("jmp {}", end_label));
                        self.emitter.emit_label(&else_label);
                        self.stmt(else_branch)?;
                    }
                    None => {
                        self.emitter.emit(&format!("je {}", end_label));
                        self.stmt(&node.then_branch)?;
                    }
                }
                self.emitter.emit_label(&end_label);
                Ok(())
            }
            Stmt::While(node) => {
                let id = self.emitter.next_label_id();
                let begin_label = format!(".Lwhile{}", id);
                let end_label = format!(".Lendwhile{}", id);

                self.emitter.emit_label(&begin_label);
                self.exp(&node.cond)?;
                self.emitter.emit("cmp $0, %rax");
                self.emitter.emit(&format!("je {}", end_label));
                self.stmt(&node.body)?;
                self.emitter.emit(&format!("jmp {}", begin_label));
                self.emitter.emit_label(&end_label);
                Ok(())
            }
            Stmt::Return(node) => {
                if let Some(value) = &node.value {
                    self.exp(value)?;
                }
                self.emitter.emit(&format!("jmp {}", self.return_label));
                Ok(())
            }
            Stmt::Write(node) => {
                self.exp(&node.value)?;
                let value_type = node.value.resolved_type().ok_or_else(|| {
                    CodegenError::Contract(String::from("write of an untyped expression"))
                })?;
                let format = if value_type.is_string() {
                    FORMAT_STRING
                } else {
                    FORMAT_INT
                };
                self.emitter.emit("mov %rax, %rsi");
                self.print(format);
                Ok(())
            }
            Stmt::Writeln(_) => {
                self.print(FORMAT_NEWLINE);
                Ok(())
            }
        }
    }

    /// Calls `printf` with the format in `%rdi`. The value, if any, is
    /// already in `%rsi`.
    fn print(&mut self, format: &str) {
        let padding = self.emitter.depth() % 2;
        self.emitter.emit_reserve(padding);
        self.emitter.emit(&format!("lea {}(%rip), %rdi", format));
        // Variadic calls pass the number of vector registers used in %al.
        self.emitter.emit("mov $0, %rax");
        self.emitter.emit(&format!("call {}", PRINTF));
        self.emitter.emit_release(padding);
    }

    fn exp(&mut self, node: &Exp) -> Result<(), CodegenError> {
        match node {
            Exp::Var(var) => self.var(var),
            Exp::Assign(node) => self.assign(node),
            Exp::Add(node) => {
                let instruction = match node.op {
                    AddOp::Plus => "add (%rsp), %rax",
                    AddOp::Minus => "sub (%rsp), %rax",
                };
                self.binary(&node.lhs, &node.rhs, &[instruction, "cltq"])
            }
            Exp::Mul(node) => match node.op {
                MulOp::Times => {
                    self.binary(&node.lhs, &node.rhs, &["imul (%rsp), %rax", "cltq"])
                }
                MulOp::Div => {
                    self.binary(&node.lhs, &node.rhs, &["cqo", "idivq (%rsp)", "cltq"])
                }
                MulOp::Mod => self.binary(
                    &node.lhs,
                    &node.rhs,
                    &["cqo", "idivq (%rsp)", "mov %rdx, %rax", "cltq"],
                ),
            },
            Exp::Neg(node) => {
                self.exp(&node.operand)?;
                self.emitter.emit("mov %rax, %rcx");
                self.emitter.emit("mov $0, %rax");
                self.emitter.emit("sub %rcx, %rax");
                self.emitter.emit("cltq");
                Ok(())
            }
            Exp::Rel(node) => {
                let set = match node.op {
                    RelOp::Lt => "setl %al",
                    RelOp::Le => "setle %al",
                    RelOp::Eq => "sete %al",
                    RelOp::Ne => "setne %al",
                    RelOp::Ge => "setge %al",
                    RelOp::Gt => "setg %al",
                };
                self.binary(
                    &node.lhs,
                    &node.rhs,
                    &["cmp (%rsp), %rax", set, "movzb %al, %rax"],
                )
            }
            Exp::Call(node) => self.call(node),
            Exp::NumLit(node) => {
                self.emitter.emit(&format!("mov ${}, %rax", node.value));
                Ok(())
            }
            Exp::StrLit(node) => {
                let label = node.label.as_ref().ok_or_else(|| {
                    CodegenError::Contract(format!("string literal \"{}\" has no label", node.value))
                })?;
                self.emitter.emit(&format!("lea {}(%rip), %rax", label));
                Ok(())
            }
        }
    }

    /// Evaluates `rhs` then `lhs` and combines them with the instructions,
    /// which see `lhs` in `%rax` and `rhs` at `(%rsp)`.
    fn binary(&mut self, lhs: &Exp, rhs: &Exp, combine: &[&str]) -> Result<(), CodegenError> {
        self.exp(rhs)?;
        self.emitter.emit_push("%rax");
        self.exp(lhs)?;
        for instruction in combine {
            self.emitter.emit(instruction);
        }
        self.emitter.emit_pop("%rcx");
        Ok(())
    }

    fn var(&mut self, node: &VarExp) -> Result<(), CodegenError> {
        let id = node.declaration.ok_or_else(|| unbound(&node.id))?;
        let location = self.location(id)?;
        let is_array = matches!(self.program.decls[id].kind, DeclKind::Array(_));

        match &node.shape {
            VarShape::Simple if is_array => {
                self.emitter.emit_commented(&format!("lea {}, %rax", location), node.id.as_str());
            }
            VarShape::Simple => {
                self.emitter.emit_commented(&format!("mov {}, %rax", location), node.id.as_str());
            }
            VarShape::Pointer => {
                self.emitter.emit_commented(&format!("mov {}, %rax", location), node.id.as_str());
                self.emitter.emit("mov (%rax), %rax");
            }
            VarShape::Array(index) => {
                self.element_address(&location, index, &node.id)?;
                self.emitter.emit("mov (%rax), %rax");
            }
            VarShape::AddrOf => {
                self.emitter.emit_commented(&format!("lea {}, %rax", location), node.id.as_str());
            }
            VarShape::AddrOfArray(index) => self.element_address(&location, index, &node.id)?,
        }
        Ok(())
    }

    /// Leaves the address of `location[index]` in `%rax`.
    fn element_address(&mut self, location: &str, index: &Exp, id: &Id) -> Result<(), CodegenError> {
        self.exp(index)?;
        self.emitter.emit("mov %rax, %rcx");
        self.emitter.emit_commented(&format!("lea {}, %rax", location), id.as_str());
        self.emitter.emit("lea (%rax,%rcx,8), %rax");
        Ok(())
    }

    fn assign(&mut self, node: &AssignExp) -> Result<(), CodegenError> {
        let target = &node.target;
        let id = target.declaration.ok_or_else(|| unbound(&target.id))?;
        let location = self.location(id)?;

        self.exp(&node.value)?;
        match &target.shape {
            VarShape::Simple => {
                self.emitter.emit_commented(&format!("mov %rax, {}", location), target.id.as_str());
                return Ok(());
            }
            VarShape::Pointer => {
                self.emitter.emit_push("%rax");
                self.emitter.emit_commented(&format!("mov {}, %rax", location), target.id.as_str());
            }
            VarShape::Array(index) => {
                self.emitter.emit_push("%rax");
                self.element_address(&location, index, &target.id)?;
            }
            VarShape::AddrOf | VarShape::AddrOfArray(_) => {
                return Err(CodegenError::Contract(format!(
                    "assignment to the address of `{}`",
                    target.id
                )));
            }
        }
        self.emitter.emit_pop("%rcx");
        self.emitter.emit("mov %rcx, (%rax)");
        self.emitter.emit("mov %rcx, %rax");
        Ok(())
    }

    /// Calls a function. Arguments are evaluated last to first and pushed,
    /// then the first six are popped into their registers. The rest stay on
    /// the stack in the order the callee expects.
    fn call(&mut self, node: &CallExp) -> Result<(), CodegenError> {
        let callee = node.declaration.ok_or_else(|| unbound(&node.id))?;
        let program = self.program;
        let name = &program.decls[callee].id;

        let stacked = node.args.len().saturating_sub(ARGUMENT_REGISTERS.len());
        // %rsp must be 16-byte aligned at the call instruction.
        let padding = (self.emitter.depth() + stacked) % 2;
        self.emitter.emit_reserve(padding);

        for arg in node.args.iter().rev() {
            self.exp(arg)?;
            self.emitter.emit_push("%rax");
        }
        for register in ARGUMENT_REGISTERS.iter().take(node.args.len()) {
            self.emitter.emit_pop(register);
        }

        self.emitter.emit(&format!("call {}", name));
        self.emitter.emit_release(stacked + padding);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cminus_analyzer::stages::parse_and_analyze;
    use cminus_dsl::core::FileId;

    use super::*;

    fn compile(source: &str) -> String {
        let program = parse_and_analyze(source, &FileId::default()).unwrap();
        compile_program(&program).unwrap().text()
    }

    /// Returns the trimmed lines of the function's block, from its label up
    /// to and including its `ret`.
    fn function_lines(asm: &str, name: &str) -> Vec<String> {
        asm.lines()
            .map(|line| line.trim().to_string())
            .skip_while(|line| *line != format!("{}:", name))
            .take_while(|line| line != "ret")
            .collect()
    }

    #[test]
    fn compile_program_when_empty_function_then_prologue_and_epilogue() {
        let asm = compile("void main(void) { }");
        let lines = function_lines(&asm, "main");

        assert_eq!(
            lines,
            vec![
                "main:",
                "push %rbp",
                "mov %rsp, %rbp",
                "mov $0, %rax",
                ".Lreturn_main:",
                "mov %rbp, %rsp",
                "pop %rbp",
            ]
        );
        assert!(asm.starts_with("    .text\n    .globl main\n"));
    }

    #[test]
    fn compile_program_when_subtraction_then_rhs_pushed_before_lhs() {
        let asm = compile("int f(void) { return 5 - 3; }");
        let lines = function_lines(&asm, "f");

        let start = lines.iter().position(|l| l == "mov $3, %rax").unwrap();
        assert_eq!(
            &lines[start..start + 6],
            &[
                "mov $3, %rax",
                "push %rax",
                "mov $5, %rax",
                "sub (%rsp), %rax",
                "cltq",
                "pop %rcx",
            ]
        );
    }

    #[test]
    fn compile_program_when_modulo_then_remainder_moved_to_accumulator() {
        let asm = compile("int f(void) { return 7 % 2; }");
        let lines = function_lines(&asm, "f");

        let start = lines.iter().position(|l| l == "cqo").unwrap();
        assert_eq!(&lines[start..start + 3], &["cqo", "idivq (%rsp)", "mov %rdx, %rax"]);
    }

    #[test]
    fn compile_program_when_negation_then_zero_minus_value() {
        let asm = compile("int f(void) { return -4; }");
        let lines = function_lines(&asm, "f");

        let start = lines.iter().position(|l| l == "mov $4, %rax").unwrap();
        assert_eq!(
            &lines[start..start + 4],
            &["mov $4, %rax", "mov %rax, %rcx", "mov $0, %rax", "sub %rcx, %rax"]
        );
    }

    #[test]
    fn compile_program_when_params_and_locals_then_frame_rounded_to_sixteen() {
        let asm = compile("int f(int a, int b) { int c; int d[2]; c = a; return c; }");
        let lines = function_lines(&asm, "f");

        // a, b, c and d take 8 + 8 + 8 + 16 = 40 bytes.
        assert!(lines.iter().any(|l| l.starts_with("sub $48, %rsp")));
        assert!(lines.iter().any(|l| l.starts_with("mov %rdi, -8(%rbp)")));
        assert!(lines.iter().any(|l| l.starts_with("mov %rsi, -16(%rbp)")));
        assert!(lines.iter().any(|l| l == "jmp .Lreturn_f"));
    }

    #[test]
    fn compile_program_when_seventh_param_then_read_above_frame() {
        let asm = compile(
            "int f(int a, int b, int c, int d, int e, int g, int h) { return h; }",
        );
        let lines = function_lines(&asm, "f");
        assert!(lines.iter().any(|l| l.starts_with("mov 16(%rbp), %rax")));
    }

    #[test]
    fn compile_program_when_write_then_printf_with_format() {
        let asm = compile("void main(void) { write(1); write(\"s\"); writeln(); }");

        assert!(asm.contains("lea .fmt_int(%rip), %rdi"));
        assert!(asm.contains("lea .str0(%rip), %rax"));
        assert!(asm.contains("lea .fmt_str(%rip), %rdi"));
        assert!(asm.contains("lea .fmt_ln(%rip), %rdi"));
        assert_eq!(asm.matches("call printf@PLT").count(), 3);
    }

    #[test]
    fn compile_program_when_string_literals_then_data_section_in_label_order() {
        let asm = compile("void main(void) { \"a\"; write(\"b\\c\"); }");
        let lines: Vec<&str> = asm.lines().map(str::trim).collect();
        let data = lines.iter().position(|l| *l == ".section .rodata").unwrap();

        assert_eq!(
            &lines[data + 1..data + 11],
            &[
                ".fmt_int:",
                ".string \"%d \"",
                ".fmt_str:",
                ".string \"%s \"",
                ".fmt_ln:",
                ".string \"\\n\"",
                ".str0:",
                ".string \"a\"",
                ".str1:",
                ".string \"b\\\\c\"",
            ]
        );
    }

    #[test]
    fn compile_program_when_globals_then_bss_storage() {
        let asm = compile("int x; int a[3]; void main(void) { x = a[1]; }");

        assert!(asm.contains("    .bss\n    .align 8\nx:\n    .zero 8\n"));
        assert!(asm.contains("a:\n    .zero 24\n"));
        assert!(asm.contains("lea a(%rip), %rax"));
    }

    #[test]
    fn compile_program_when_call_at_odd_depth_then_padded() {
        let asm = compile("int g(void) { return 1; } int f(void) { return g() + 1; }");
        let lines = function_lines(&asm, "f");

        let call = lines.iter().position(|l| l == "call g").unwrap();
        assert_eq!(lines[call - 1], "sub $8, %rsp");
        assert_eq!(lines[call + 1], "add $8, %rsp");
    }

    #[test]
    fn compile_program_when_if_else_then_branch_labels() {
        let asm = compile("void main(void) { if (1) write(1); else write(2); while (0) ; }");

        assert!(asm.contains("je .Lelse0"));
        assert!(asm.contains(".Lend0:"));
        assert!(asm.contains(".Lwhile1:"));
        assert!(asm.contains("je .Lendwhile1"));
    }

    #[test]
    fn compile_program_when_addition_then_result_truncated_to_int() {
        let asm = compile("int f(void) { return 2147483647 + 1; }");
        let lines = function_lines(&asm, "f");

        let start = lines.iter().position(|l| l == "add (%rsp), %rax").unwrap();
        assert_eq!(lines[start + 1], "cltq");
    }

    #[test]
    fn generate_when_locals_exceed_frame_limit_then_too_large() {
        // Each array is 1 GiB, the largest the parser accepts.
        let program = parse_and_analyze(
            "void main(void) { int a[134217728]; int b[134217728]; }",
            &FileId::default(),
        )
        .unwrap();
        let mut sink: Vec<u8> = vec![];

        let result = generate(&program, &mut sink);

        assert!(matches!(result, Err(CodegenError::TooLarge(ref msg)) if msg.contains("`b`")));
        assert!(sink.is_empty());
    }

    #[test]
    fn generate_when_globals_exceed_static_limit_then_too_large() {
        let program = parse_and_analyze(
            "int a[134217728]; int b[134217728]; void main(void) { }",
            &FileId::default(),
        )
        .unwrap();

        let result = generate(&program, &mut Vec::<u8>::new());

        assert!(matches!(result, Err(CodegenError::TooLarge(_))));
    }

    #[test]
    fn generate_when_unanalyzed_program_then_contract_error() {
        let program =
            cminus_parser::parse_program("void main(void) { write(\"s\"); }", &FileId::default())
                .unwrap();
        let mut sink: Vec<u8> = vec![];

        let result = generate(&program, &mut sink);

        assert!(matches!(result, Err(CodegenError::Contract(_))));
        assert!(sink.is_empty());
    }

    #[test]
    fn escape_when_backslash_and_quote_then_escaped() {
        assert_eq!(escape("a\\b\"c"), "a\\\\b\\\"c");
    }
}
