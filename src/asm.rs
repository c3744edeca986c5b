use std::collections::HashMap;

use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// One parsed `.asm` line, stripped of comments and whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Line {
    AddressNumeric(u16),
    AddressSymbol(String),
    Label(String),
    C {
        dest: String,
        comp: String,
        jump: String,
    },
}

/// Two-pass symbol-resolving assembler for the Hack ISA. Pass 1 builds the
/// ROM label table; pass 2 allocates RAM addresses for variables on first
/// use and encodes every instruction (spec.md §4.5).
pub struct Assembler {
    diagnostics: Vec<Diagnostic>,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn assemble<'a>(
        mut self,
        lines: impl Iterator<Item = (u32, &'a str)>,
    ) -> Result<Vec<String>, Vec<Diagnostic>> {
        let mut parsed = Vec::new();
        for (line_no, raw) in lines {
            let Some(code) = strip_comment(raw) else {
                continue;
            };
            match parse_line(code) {
                Ok(l) => parsed.push((line_no, l)),
                Err(msg) => self.diagnostics.push(Diagnostic::error(msg, Span::new(line_no))),
            }
        }
        if !self.diagnostics.is_empty() {
            return Err(self.diagnostics);
        }

        let mut symbols = predefined_symbols();
        let mut addr = 0u16;
        for (_, line) in &parsed {
            match line {
                Line::Label(name) => {
                    symbols.insert(name.clone(), addr);
                }
                _ => addr += 1,
            }
        }

        let mut next_ram = 16u16;
        let mut out = Vec::new();
        for (line_no, line) in &parsed {
            match line {
                Line::Label(_) => {}
                Line::AddressNumeric(n) => out.push(format!("{:016b}", n)),
                Line::AddressSymbol(name) => {
                    let addr = *symbols.entry(name.clone()).or_insert_with(|| {
                        let a = next_ram;
                        next_ram += 1;
                        a
                    });
                    out.push(format!("{:016b}", addr));
                }
                Line::C { dest, comp, jump } => match encode_c(dest, comp, jump) {
                    Ok(bits) => out.push(bits),
                    Err(msg) => self.diagnostics.push(Diagnostic::error(msg, Span::new(*line_no))),
                },
            }
        }

        if self.diagnostics.is_empty() {
            Ok(out)
        } else {
            Err(self.diagnostics)
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_comment(line: &str) -> Option<&str> {
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

fn parse_line(code: &str) -> Result<Line, String> {
    if let Some(rest) = code.strip_prefix('@') {
        if rest.is_empty() {
            return Err("empty @ operand".to_string());
        }
        return if rest.bytes().all(|b| b.is_ascii_digit()) {
            rest.parse::<u16>()
                .map(Line::AddressNumeric)
                .map_err(|_| format!("malformed @ operand: {}", rest))
        } else {
            Ok(Line::AddressSymbol(rest.to_string()))
        };
    }

    if let Some(rest) = code.strip_prefix('(') {
        let name = rest
            .strip_suffix(')')
            .ok_or_else(|| format!("malformed label: {}", code))?;
        return Ok(Line::Label(name.to_string()));
    }

    // dest= prefix is optional; ;jump suffix is optional.
    let (rest, jump) = match code.split_once(';') {
        Some((c, j)) => (c, j.to_string()),
        None => (code, String::new()),
    };
    let (dest, comp) = match rest.split_once('=') {
        Some((d, c)) => (d.to_string(), c.to_string()),
        None => (String::new(), rest.to_string()),
    };
    Ok(Line::C { dest, comp, jump })
}

fn predefined_symbols() -> HashMap<String, u16> {
    let mut m = HashMap::new();
    m.insert("SP".to_string(), 0);
    m.insert("LCL".to_string(), 1);
    m.insert("ARG".to_string(), 2);
    m.insert("THIS".to_string(), 3);
    m.insert("THAT".to_string(), 4);
    for i in 0..16u16 {
        m.insert(format!("R{}", i), i);
    }
    m.insert("SCREEN".to_string(), 16384);
    m.insert("KBD".to_string(), 24576);
    m
}

fn encode_c(dest: &str, comp: &str, jump: &str) -> Result<String, String> {
    let comp_bits = comp_table(comp).ok_or_else(|| format!("unknown comp mnemonic: {}", comp))?;
    let dest_bits = dest_bits(dest).ok_or_else(|| format!("unknown dest mnemonic: {}", dest))?;
    let jump_bits = jump_table(jump).ok_or_else(|| format!("unknown jump mnemonic: {}", jump))?;
    Ok(format!("111{}{}{}", comp_bits, dest_bits, jump_bits))
}

fn dest_bits(dest: &str) -> Option<String> {
    if dest.is_empty() {
        return Some("000".to_string());
    }
    let mut a = false;
    let mut d = false;
    let mut m = false;
    for c in dest.chars() {
        match c {
            'A' => a = true,
            'D' => d = true,
            'M' => m = true,
            _ => return None,
        }
    }
    Some(format!(
        "{}{}{}",
        a as u8, d as u8, m as u8
    ))
}

fn jump_table(jump: &str) -> Option<&'static str> {
    Some(match jump {
        "" => "000",
        "JGT" => "001",
        "JEQ" => "010",
        "JGE" => "011",
        "JLT" => "100",
        "JNE" => "101",
        "JLE" => "110",
        "JMP" => "111",
        _ => return None,
    })
}

/// Regenerated from the Hack ISA reference rather than copied — the
/// source this spec is distilled from maps both `-A` and `-M` to the same
/// bitfield, which is wrong (spec.md §9 Open Question 3). `-A` has the
/// `a`-bit clear; `-M` has it set.
fn comp_table(comp: &str) -> Option<&'static str> {
    Some(match comp {
        "0" => "0101010",
        "1" => "0111111",
        "-1" => "0111010",
        "D" => "0001100",
        "A" => "0110000",
        "!D" => "0001101",
        "!A" => "0110001",
        "-D" => "0001111",
        "-A" => "0110011",
        "D+1" => "0011111",
        "A+1" => "0110111",
        "D-1" => "0001110",
        "A-1" => "0110010",
        "D+A" => "0000010",
        "D-A" => "0010011",
        "A-D" => "0000111",
        "D&A" => "0000000",
        "D|A" => "0010101",
        "M" => "1110000",
        "!M" => "1110001",
        "-M" => "1110011",
        "M+1" => "1110111",
        "M-1" => "1110010",
        "D+M" => "1000010",
        "D-M" => "1010011",
        "M-D" => "1000111",
        "D&M" => "1000000",
        "D|M" => "1010101",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(src: &str) -> Vec<String> {
        let lines: Vec<(u32, &str)> = src.lines().enumerate().map(|(i, l)| (i as u32, l)).collect();
        Assembler::new().assemble(lines.into_iter()).unwrap()
    }

    #[test]
    fn numeric_address_matches_spec_example() {
        let out = assemble("@21\n");
        assert_eq!(out[0], "0000000000010101");
    }

    #[test]
    fn c_instruction_matches_spec_example() {
        let out = assemble("D=A;JGT\n");
        assert_eq!(out[0], "1110110000010001");
    }

    #[test]
    fn minus_a_and_minus_m_have_distinct_a_bit() {
        assert_eq!(comp_table("-A").unwrap(), "0110011");
        assert_eq!(comp_table("-M").unwrap(), "1110011");
    }

    #[test]
    fn labels_resolve_to_next_instruction_address() {
        let out = assemble("(LOOP)\n@LOOP\n0;JMP\n");
        // (LOOP) binds to address 0; @LOOP -> 0000000000000000
        assert_eq!(out[0], "0000000000000000");
    }

    #[test]
    fn undeclared_symbols_get_sequential_ram_addresses_from_16() {
        let out = assemble("@foo\n@bar\n@foo\n");
        assert_eq!(out[0], "0000000000010000"); // 16
        assert_eq!(out[1], "0000000000010001"); // 17
        assert_eq!(out[2], "0000000000010000"); // foo reused
    }

    #[test]
    fn predefined_symbols_resolve_without_allocation() {
        let out = assemble("@SCREEN\n@SP\n");
        assert_eq!(out[0], "0100000000000000"); // 16384
        assert_eq!(out[1], "0000000000000000");
    }

    #[test]
    fn dest_and_jump_both_optional() {
        let out = assemble("0\n"); // comp only, no dest, no jump
        assert_eq!(out[0], "1110101010000000");
    }

    #[test]
    fn unknown_mnemonic_is_an_error() {
        let lines = vec![(0u32, "D=Q")];
        assert!(Assembler::new().assemble(lines.into_iter()).is_err());
    }
}
