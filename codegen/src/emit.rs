//! Low-level assembly emitter.
//!
//! Provides a builder that appends labels, directives and instructions to
//! a text buffer and tracks how many 8-byte values the generated code has
//! pushed onto the machine stack.

/// Accumulates assembly text.
pub struct Emitter {
    lines: Vec<String>,
    depth: usize,
    max_depth: usize,
    next_label: usize,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter {
            lines: Vec::new(),
            depth: 0,
            max_depth: 0,
            next_label: 0,
        }
    }

    /// Emits an assembler directive such as `.text`.
    pub fn emit_directive(&mut self, directive: &str) {
        self.lines.push(format!("    {directive}"));
    }

    /// Emits a label definition.
    pub fn emit_label(&mut self, label: &str) {
        self.lines.push(format!("{label}:"));
    }

    /// Emits an instruction that does not change the operand stack.
    pub fn emit(&mut self, instruction: &str) {
        self.lines.push(format!("    {instruction}"));
    }

    /// Emits an instruction followed by a trailing comment.
    pub fn emit_commented(&mut self, instruction: &str, comment: &str) {
        self.lines.push(format!("    {instruction:<28}# {comment}"));
    }

    /// Emits PUSH of the register onto the operand stack.
    pub fn emit_push(&mut self, register: &str) {
        self.emit(&format!("push {register}"));
        self.push_stack(1);
    }

    /// Emits POP of the operand stack into the register.
    pub fn emit_pop(&mut self, register: &str) {
        self.emit(&format!("pop {register}"));
        self.pop_stack(1);
    }

    /// Emits a stack adjustment that reserves slots without values.
    pub fn emit_reserve(&mut self, slots: usize) {
        if slots > 0 {
            self.emit(&format!("sub ${}, %rsp", slots * 8));
            self.push_stack(slots);
        }
    }

    /// Emits a stack adjustment that discards slots.
    pub fn emit_release(&mut self, slots: usize) {
        if slots > 0 {
            self.emit(&format!("add ${}, %rsp", slots * 8));
            self.pop_stack(slots);
        }
    }

    /// Returns the number of 8-byte slots currently on the operand stack.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the maximum operand stack depth reached during emission.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns a number that is unique within this emitter for building
    /// local labels.
    pub fn next_label_id(&mut self) -> usize {
        let id = self.next_label;
        self.next_label += 1;
        id
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the emitted text, one line per directive, label or
    /// instruction.
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    fn push_stack(&mut self, count: usize) {
        self.depth += count;
        if self.depth > self.max_depth {
            self.max_depth = self.depth;
        }
    }

    fn pop_stack(&mut self, count: usize) {
        self.depth = self.depth.saturating_sub(count);
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}
