use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::vm::{self, Command, Segment};

/// Lowers VM commands to Hack assembly. Grounded on the teacher's
/// `TritonLowering` (`deferred`/`label_counter` accumulator matching IR
/// variants to formatted output strings), generalized to the VM→ASM
/// calling convention in spec.md §4.4.
///
/// The label counter is shared between comparison labels (`TRUE_i`/
/// `END_i`) and call return-address labels (`RETURN_m`) — spec.md §4.4
/// describes both as drawn from "a unique-integer counter", and return
/// labels are never function-prefixed, so they must stay globally unique
/// across an entire translation run (all files), not just one.
pub struct VmTranslator {
    output: Vec<String>,
    current_function: String,
    static_prefix: String,
    counter: u32,
    diagnostics: Vec<Diagnostic>,
}

impl VmTranslator {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            current_function: String::new(),
            static_prefix: String::new(),
            counter: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Sets the prefix used for `static` segment symbols. Callers switch
    /// this between files in directory mode (the prefix is normally the
    /// file's stem).
    pub fn set_static_prefix(&mut self, prefix: &str) {
        self.static_prefix = prefix.to_string();
    }

    /// Emits `SP = 256` then `call Sys.init 0`, as directory-mode
    /// translation requires (spec.md §4.4 Bootstrap).
    pub fn bootstrap(&mut self) {
        self.output.push("@256".to_string());
        self.output.push("D=A".to_string());
        self.output.push("@SP".to_string());
        self.output.push("M=D".to_string());
        self.call("Sys.init", 0);
    }

    fn fresh(&mut self) -> u32 {
        let n = self.counter;
        self.counter += 1;
        n
    }

    fn error(&mut self, line: u32, msg: String) {
        self.diagnostics.push(Diagnostic::error(msg, Span::new(line)));
    }

    /// Translates one source line (already known to belong to a `.vm`
    /// file). `line` is the zero-based originating line number, used to
    /// attribute parse/argument diagnostics.
    pub fn translate_line(&mut self, line: u32, raw: &str) {
        let Some(code) = vm::strip_comment(raw) else {
            return;
        };
        match vm::parse_command(code) {
            Ok(cmd) => self.command(line, cmd),
            Err(e) => self.error(line, e.to_string()),
        }
    }

    pub fn finish(self) -> Result<Vec<String>, Vec<Diagnostic>> {
        if self.diagnostics.is_empty() {
            Ok(self.output)
        } else {
            Err(self.diagnostics)
        }
    }

    fn command(&mut self, line: u32, cmd: Command) {
        match cmd {
            Command::Add => self.binary("M+D"),
            Command::Sub => self.binary("M-D"),
            Command::And => self.binary("M&D"),
            Command::Or => self.binary("M|D"),
            Command::Neg => self.unary("-M"),
            Command::Not => self.unary("!M"),
            Command::Eq => self.compare("JEQ"),
            Command::Gt => self.compare("JGT"),
            Command::Lt => self.compare("JLT"),
            Command::Push(seg, idx) => self.push(line, seg, idx),
            Command::Pop(seg, idx) => self.pop(line, seg, idx),
            Command::Label(name) => self.output.push(format!("({}${})", self.current_function, name)),
            Command::Goto(name) => {
                self.output.push(format!("@{}${}", self.current_function, name));
                self.output.push("0;JMP".to_string());
            }
            Command::IfGoto(name) => {
                self.pop_d();
                self.output.push(format!("@{}${}", self.current_function, name));
                self.output.push("D;JNE".to_string());
            }
            Command::Function(name, n_locals) => {
                self.current_function = name.clone();
                self.output.push(format!("({})", name));
                for _ in 0..n_locals {
                    self.output.push("@SP".to_string());
                    self.output.push("A=M".to_string());
                    self.output.push("M=0".to_string());
                    self.output.push("@SP".to_string());
                    self.output.push("M=M+1".to_string());
                }
            }
            Command::Call(name, n_args) => self.call(&name, n_args),
            Command::Return => self.ret(),
        }
    }

    // --- arithmetic / logical ---

    fn binary(&mut self, op_on_m: &str) {
        self.pop_d();
        self.output.push("@SP".to_string());
        self.output.push("A=M-1".to_string());
        self.output.push(format!("M={}", op_on_m));
    }

    fn unary(&mut self, op: &str) {
        self.output.push("@SP".to_string());
        self.output.push("A=M-1".to_string());
        self.output.push(format!("M={}", op));
    }

    fn compare(&mut self, jump: &str) {
        let k = self.fresh();
        self.pop_d();
        self.output.push("@SP".to_string());
        self.output.push("A=M-1".to_string());
        self.output.push("D=M-D".to_string());
        self.output.push(format!("@TRUE_{}", k));
        self.output.push(format!("D;{}", jump));
        self.output.push("@SP".to_string());
        self.output.push("A=M-1".to_string());
        self.output.push("M=0".to_string());
        self.output.push(format!("@END_{}", k));
        self.output.push("0;JMP".to_string());
        self.output.push(format!("(TRUE_{})", k));
        self.output.push("@SP".to_string());
        self.output.push("A=M-1".to_string());
        self.output.push("M=-1".to_string());
        self.output.push(format!("(END_{})", k));
    }

    /// `@SP; AM=M-1; D=M` — pop the top of stack into D.
    fn pop_d(&mut self) {
        self.output.push("@SP".to_string());
        self.output.push("AM=M-1".to_string());
        self.output.push("D=M".to_string());
    }

    fn push_d(&mut self) {
        self.output.push("@SP".to_string());
        self.output.push("A=M".to_string());
        self.output.push("M=D".to_string());
        self.output.push("@SP".to_string());
        self.output.push("M=M+1".to_string());
    }

    // --- push / pop ---

    fn push(&mut self, line: u32, seg: Segment, idx: u16) {
        match seg {
            Segment::Constant => {
                self.output.push(format!("@{}", idx));
                self.output.push("D=A".to_string());
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                self.output.push(format!("@{}", idx));
                self.output.push("D=A".to_string());
                self.output.push(format!("@{}", base_reg(seg)));
                self.output.push("A=D+M".to_string());
                self.output.push("D=M".to_string());
            }
            Segment::Pointer => {
                if idx > 1 {
                    self.error(line, format!("pointer index out of range: {}", idx));
                    return;
                }
                self.output.push(format!("@{}", pointer_reg(idx)));
                self.output.push("D=M".to_string());
            }
            Segment::Temp => {
                if idx > 7 {
                    self.error(line, format!("temp index out of range: {}", idx));
                    return;
                }
                self.output.push(format!("@{}", 5 + idx));
                self.output.push("D=M".to_string());
            }
            Segment::Static => {
                self.output.push(format!("@{}.{}", self.static_prefix, idx));
                self.output.push("D=M".to_string());
            }
        }
        self.push_d();
    }

    fn pop(&mut self, line: u32, seg: Segment, idx: u16) {
        match seg {
            Segment::Constant => {
                self.error(line, "pop constant is not a valid VM command".to_string());
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                self.output.push(format!("@{}", idx));
                self.output.push("D=A".to_string());
                self.output.push(format!("@{}", base_reg(seg)));
                self.output.push("D=D+M".to_string());
                self.output.push("@R13".to_string());
                self.output.push("M=D".to_string());
                self.pop_d();
                self.output.push("@R13".to_string());
                self.output.push("A=M".to_string());
                self.output.push("M=D".to_string());
            }
            Segment::Pointer => {
                if idx > 1 {
                    self.error(line, format!("pointer index out of range: {}", idx));
                    return;
                }
                self.pop_d();
                self.output.push(format!("@{}", pointer_reg(idx)));
                self.output.push("M=D".to_string());
            }
            Segment::Temp => {
                if idx > 7 {
                    self.error(line, format!("temp index out of range: {}", idx));
                    return;
                }
                self.pop_d();
                self.output.push(format!("@{}", 5 + idx));
                self.output.push("M=D".to_string());
            }
            Segment::Static => {
                self.pop_d();
                self.output.push(format!("@{}.{}", self.static_prefix, idx));
                self.output.push("M=D".to_string());
            }
        }
    }

    // --- call / function / return ---

    fn call(&mut self, name: &str, n_args: u16) {
        let m = self.fresh();
        let return_label = format!("RETURN_{}", m);

        self.output.push(format!("@{}", return_label));
        self.output.push("D=A".to_string());
        self.push_d();
        for reg in ["LCL", "ARG", "THIS", "THAT"] {
            self.output.push(format!("@{}", reg));
            self.output.push("D=M".to_string());
            self.push_d();
        }

        self.output.push("@SP".to_string());
        self.output.push("D=M".to_string());
        self.output.push(format!("@{}", n_args + 5));
        self.output.push("D=D-A".to_string());
        self.output.push("@ARG".to_string());
        self.output.push("M=D".to_string());

        self.output.push("@SP".to_string());
        self.output.push("D=M".to_string());
        self.output.push("@LCL".to_string());
        self.output.push("M=D".to_string());

        self.output.push(format!("@{}", name));
        self.output.push("0;JMP".to_string());
        self.output.push(format!("({})", return_label));
    }

    fn ret(&mut self) {
        // R13 = FRAME, R14 = return address.
        self.output.push("@LCL".to_string());
        self.output.push("D=M".to_string());
        self.output.push("@R13".to_string());
        self.output.push("M=D".to_string());

        self.frame_offset_into_d(5);
        self.output.push("@R14".to_string());
        self.output.push("M=D".to_string());

        self.pop_d();
        self.output.push("@ARG".to_string());
        self.output.push("A=M".to_string());
        self.output.push("M=D".to_string());

        self.output.push("@ARG".to_string());
        self.output.push("D=M+1".to_string());
        self.output.push("@SP".to_string());
        self.output.push("M=D".to_string());

        for (offset, reg) in [(1, "THAT"), (2, "THIS"), (3, "ARG"), (4, "LCL")] {
            self.frame_offset_into_d(offset);
            self.output.push(format!("@{}", reg));
            self.output.push("M=D".to_string());
        }

        self.output.push("@R14".to_string());
        self.output.push("A=M".to_string());
        self.output.push("0;JMP".to_string());
    }

    /// `D = *(FRAME - offset)`, reading FRAME from R13.
    fn frame_offset_into_d(&mut self, offset: u16) {
        self.output.push("@R13".to_string());
        self.output.push("D=M".to_string());
        self.output.push(format!("@{}", offset));
        self.output.push("A=D-A".to_string());
        self.output.push("D=M".to_string());
    }
}

impl Default for VmTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn base_reg(seg: Segment) -> &'static str {
    match seg {
        Segment::Local => "LCL",
        Segment::Argument => "ARG",
        Segment::This => "THIS",
        Segment::That => "THAT",
        _ => unreachable!("base_reg called on a non-indirect segment"),
    }
}

fn pointer_reg(idx: u16) -> &'static str {
    match idx {
        0 => "THIS",
        1 => "THAT",
        _ => unreachable!("pointer index must be 0 or 1"),
    }
}
