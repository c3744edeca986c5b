use std::fmt;

/// A parsed VM command line. Mirrors the textual VM language emitted by
/// `codegen.rs`: nine arithmetic/logical commands, push/pop over eight
/// memory segments, branching, and the function calling convention
/// (spec.md §4.4).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
    Push(Segment, u16),
    Pop(Segment, u16),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function(String, u16),
    Call(String, u16),
    Return,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Argument,
    Local,
    Static,
    Constant,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "argument" => Segment::Argument,
            "local" => Segment::Local,
            "static" => Segment::Static,
            "constant" => Segment::Constant,
            "this" => Segment::This,
            "that" => Segment::That,
            "pointer" => Segment::Pointer,
            "temp" => Segment::Temp,
            _ => return None,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::Constant => "constant",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug)]
pub struct ParseError {
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Strips a trailing `//` comment and surrounding whitespace; returns
/// `None` for blank or comment-only lines.
pub fn strip_comment(line: &str) -> Option<&str> {
    let code = match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    };
    let trimmed = code.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let err = |msg: String| Err(ParseError { message: msg });

    match parts.as_slice() {
        ["add"] => Ok(Command::Add),
        ["sub"] => Ok(Command::Sub),
        ["neg"] => Ok(Command::Neg),
        ["eq"] => Ok(Command::Eq),
        ["gt"] => Ok(Command::Gt),
        ["lt"] => Ok(Command::Lt),
        ["and"] => Ok(Command::And),
        ["or"] => Ok(Command::Or),
        ["not"] => Ok(Command::Not),
        ["push", seg, idx] => {
            let segment = Segment::from_str(seg)
                .ok_or_else(|| ParseError { message: format!("unknown segment '{}'", seg) })?;
            let idx: u16 = idx
                .parse()
                .map_err(|_| ParseError { message: format!("invalid index '{}'", idx) })?;
            Ok(Command::Push(segment, idx))
        }
        ["pop", seg, idx] => {
            let segment = Segment::from_str(seg)
                .ok_or_else(|| ParseError { message: format!("unknown segment '{}'", seg) })?;
            let idx: u16 = idx
                .parse()
                .map_err(|_| ParseError { message: format!("invalid index '{}'", idx) })?;
            Ok(Command::Pop(segment, idx))
        }
        ["label", name] => Ok(Command::Label(name.to_string())),
        ["goto", name] => Ok(Command::Goto(name.to_string())),
        ["if-goto", name] => Ok(Command::IfGoto(name.to_string())),
        ["function", name, n] => {
            let n: u16 = n
                .parse()
                .map_err(|_| ParseError { message: format!("invalid local count '{}'", n) })?;
            Ok(Command::Function(name.to_string(), n))
        }
        ["call", name, n] => {
            let n: u16 = n
                .parse()
                .map_err(|_| ParseError { message: format!("invalid arg count '{}'", n) })?;
            Ok(Command::Call(name.to_string(), n))
        }
        ["return"] => Ok(Command::Return),
        [] => err("empty command".to_string()),
        other => err(format!("malformed command: {}", other.join(" "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_blanks() {
        assert_eq!(strip_comment("push constant 1 // comment"), Some("push constant 1"));
        assert_eq!(strip_comment("   "), None);
        assert_eq!(strip_comment("// just a comment"), None);
    }

    #[test]
    fn parses_push_and_pop() {
        assert_eq!(
            parse_command("push local 3").unwrap(),
            Command::Push(Segment::Local, 3)
        );
        assert_eq!(
            parse_command("pop that 0").unwrap(),
            Command::Pop(Segment::That, 0)
        );
    }

    #[test]
    fn parses_call_function_return() {
        assert_eq!(
            parse_command("function Main.main 2").unwrap(),
            Command::Function("Main.main".to_string(), 2)
        );
        assert_eq!(
            parse_command("call Math.multiply 2").unwrap(),
            Command::Call("Math.multiply".to_string(), 2)
        );
        assert_eq!(parse_command("return").unwrap(), Command::Return);
    }

    #[test]
    fn rejects_unknown_segment() {
        assert!(parse_command("push frobnicate 1").is_err());
    }
}
