// The value handed from pass 1 to pass 2, and its on disk text form.
//
// Text form:
//
//   :<segment name>
//   :<load address>
//   :<execution address>
//   :<true|false relocatable>
//   :<segment length>
//   N<entry symbol>=x<hex value>     (zero or more)
//   $<line> $<location counter> <source without comment>
//
// Header numbers are decimal. Location counters are relative to the load
// address.

use std::fmt::{self, Write};

use color_eyre::eyre::{eyre, Result};

use crate::tables::{Linkage, LiteralPool, SymbolTable};
use crate::tokenize::{tokenize, Tokens};

/// `Segment` describes the module being assembled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Segment {
    /// Name from the `.ORIG` label.
    pub name: String,
    /// Load address. Always 0 for a relocatable module.
    pub load: u16,
    /// Execution address from `.END` (or the load address).
    pub exec: u16,
    /// Whether `.ORIG` had no address.
    pub relocatable: bool,
    /// Words of code, data and literal pool.
    pub length: u32,
}

/// `CodeLine` is one source line that survived pass 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeLine {
    /// 1 based source line number.
    pub line: usize,
    /// Location counter at the start of the line, relative to the load address.
    pub lc: u32,
    /// The tokenized line.
    pub tokens: Tokens,
    /// The source with any comment removed.
    pub text: String,
}

impl CodeLine {
    /// `address` is where the line's first word lands.
    #[must_use]
    pub fn address(&self, load: u16) -> u16 {
        #[allow(clippy::cast_possible_truncation)]
        let lc = self.lc as u16;
        load.wrapping_add(lc)
    }
}

/// `Intermediate` is one entry of the pass 1 output in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intermediate {
    /// Segment metadata.
    Header(Segment),
    /// An exported symbol and its value.
    Entry {
        /// Symbol name.
        name: String,
        /// Symbol value.
        value: u16,
    },
    /// A source line.
    Code(CodeLine),
}

impl fmt::Display for Intermediate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Intermediate::Header(s) => write!(
                f,
                ":{}\n:{}\n:{}\n:{}\n:{}",
                s.name, s.load, s.exec, s.relocatable, s.length
            ),
            Intermediate::Entry { name, value } => write!(f, "N{name}=x{value:X}"),
            Intermediate::Code(c) => write!(f, "${} ${} {}", c.line, c.lc, c.text),
        }
    }
}

/// `Program` is everything pass 1 learned about a module. Pass 2 only reads it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    /// Segment metadata.
    pub segment: Segment,
    /// Every defined symbol, externals included (with value 0).
    pub symbols: SymbolTable,
    /// Literals with their final addresses.
    pub literals: LiteralPool,
    /// `.EXT` and `.ENT` declarations.
    pub linkage: Linkage,
    /// Source lines in order.
    pub lines: Vec<CodeLine>,
}

impl Program {
    /// `intermediate` returns the program as an ordered list of entries.
    #[must_use]
    pub fn intermediate(&self) -> Vec<Intermediate> {
        let mut out = vec![Intermediate::Header(self.segment.clone())];
        for name in self.linkage.entries() {
            if let Some(sym) = self.symbols.get(name) {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let value = sym.value as u16;
                out.push(Intermediate::Entry {
                    name: name.clone(),
                    value,
                });
            }
        }
        out.extend(self.lines.iter().cloned().map(Intermediate::Code));
        out
    }

    /// `render` returns the text form of the program.
    #[must_use]
    pub fn render(&self) -> String {
        let mut s = String::new();
        for i in self.intermediate() {
            writeln!(s, "{i}").unwrap();
        }
        s
    }
}

/// `read` parses the text form back into entries.
///
/// # Errors
/// Any line which doesn't fit the format.
pub fn read(text: &str) -> Result<Vec<Intermediate>> {
    let mut lines = text.lines().enumerate();
    let mut header = Vec::new();
    for _ in 0..5 {
        match lines.next() {
            Some((_, l)) if l.starts_with(':') => header.push(&l[1..]),
            Some((n, l)) => {
                return Err(eyre!(
                    "Error parsing line {}: expected header field - {l}",
                    n + 1
                ))
            }
            None => return Err(eyre!("Error parsing header: too few fields")),
        }
    }
    let segment = Segment {
        name: header[0].to_string(),
        load: header[1].parse()?,
        exec: header[2].parse()?,
        relocatable: header[3].parse()?,
        length: header[4].parse()?,
    };

    let mut out = vec![Intermediate::Header(segment)];
    for (n, l) in lines {
        if l.is_empty() {
            continue;
        }
        let bad = || eyre!("Error parsing line {}: {l}", n + 1);
        let entry = if let Some(rest) = l.strip_prefix('N') {
            let (name, value) = rest.split_once("=x").ok_or_else(bad)?;
            Intermediate::Entry {
                name: name.to_string(),
                value: u16::from_str_radix(value, 16)?,
            }
        } else if let Some(rest) = l.strip_prefix('$') {
            let (line, rest) = rest.split_once(' ').ok_or_else(bad)?;
            let rest = rest.strip_prefix('$').ok_or_else(bad)?;
            let (lc, text) = rest.split_once(' ').unwrap_or((rest, ""));
            let tokens = match tokenize(text) {
                Ok(Some(t)) => t,
                Ok(None) => Tokens::default(),
                Err(kind) => return Err(eyre!("Error parsing line {}: {kind}", n + 1)),
            };
            Intermediate::Code(CodeLine {
                line: line.parse()?,
                lc: lc.parse()?,
                tokens,
                text: text.to_string(),
            })
        } else {
            return Err(bad());
        };
        out.push(entry);
    }
    Ok(out)
}
