// Pass 1 walks the source once, assigning a location counter to every line
// and building the symbol table, literal pool and linkage declarations.
//
// State progression:
//
// SeekOrigin -> MainScan -> EndFound
//
// SeekOrigin skips blank lines and consumes the first real line as .ORIG
// whether or not it is one. MainScan handles everything up to .END. Lines
// after .END are never looked at.

use rusty3903::prelude::*;
use tracing::{debug, info_span, trace};

use crate::diagnostics::{Diagnostics, Kind};
use crate::intermediate::{CodeLine, Program, Segment};
use crate::tables::{Linkage, LiteralPool, SymbolTable};
use crate::tokenize::{strip_comment, tokenize, Tokens};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    SeekOrigin,
    MainScan,
    EndFound,
}

struct Pass1<'a> {
    diags: &'a mut Diagnostics,
    state: State,
    failed: bool,
    lc: u32,
    // Set once any line other than .ORIG/.EXT/.ENT is seen.
    seen_instruction: bool,
    segment: Segment,
    exec: Option<u16>,
    symbols: SymbolTable,
    literals: LiteralPool,
    linkage: Linkage,
    lines: Vec<CodeLine>,
}

/// `pass1` scans the source. It returns None if anything fatal was found;
/// the reasons are in `diags` either way.
pub fn pass1<I, S>(source: I, diags: &mut Diagnostics) -> Option<Program>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let span = info_span!("pass1");
    let _enter = span.enter();

    let mut p = Pass1 {
        diags,
        state: State::SeekOrigin,
        failed: false,
        lc: 0,
        seen_instruction: false,
        segment: Segment::default(),
        exec: None,
        symbols: SymbolTable::default(),
        literals: LiteralPool::default(),
        linkage: Linkage::default(),
        lines: Vec::new(),
    };

    for (index, raw) in source.into_iter().enumerate() {
        if p.state == State::EndFound {
            break;
        }
        let line = index + 1;
        let raw = raw.as_ref();
        let tokens = match tokenize(raw) {
            Ok(Some(t)) => t,
            Ok(None) => continue,
            Err(kind) => {
                p.report(kind, Some(line));
                if p.state == State::SeekOrigin {
                    p.report(Kind::OriginNotFound, Some(line));
                    p.state = State::MainScan;
                }
                continue;
            }
        };
        trace!(line, lc = p.lc, ?tokens);
        let code = CodeLine {
            line,
            lc: p.lc,
            tokens,
            text: strip_comment(raw).trim_end().to_string(),
        };
        match p.state {
            State::SeekOrigin => p.origin(code),
            State::MainScan => p.scan(code),
            State::EndFound => {}
        }
    }
    p.finish()
}

impl Pass1<'_> {
    fn report(&mut self, kind: Kind, line: Option<usize>) {
        if !kind.is_warning() {
            self.failed = true;
        }
        self.diags.push(kind, line);
    }

    // Absolute address of the current location counter.
    fn here(&self) -> i32 {
        i32::from(self.segment.load) + i32::try_from(self.lc).unwrap_or(i32::MAX)
    }

    fn origin(&mut self, code: CodeLine) {
        self.state = State::MainScan;
        let line = Some(code.line);
        let t = &code.tokens;
        if t.operation != PseudoOp::Orig.to_string() {
            self.report(Kind::OriginNotFirst, line);
            return;
        }
        if t.label.is_empty() {
            self.report(Kind::OriginNoLabel, line);
        }
        self.segment.name.clone_from(&t.label);
        match t.operands.first() {
            None => self.segment.relocatable = true,
            Some(op) => match parse_hex16(op) {
                Some(load) => self.segment.load = load,
                None => self.report(Kind::OriginInvalidHexOperand, line),
            },
        }
        debug!(
            name = %self.segment.name,
            load = self.segment.load,
            relocatable = self.segment.relocatable,
            "segment"
        );
        self.lines.push(code);
    }

    fn scan(&mut self, code: CodeLine) {
        let line = Some(code.line);
        let t = &code.tokens;
        match Operation::lookup(&t.operation) {
            Some(Operation::Pseudo(p @ (PseudoOp::Ext | PseudoOp::Ent))) => {
                self.linkage_line(p, line, t);
            }
            Some(Operation::Pseudo(PseudoOp::End)) => self.end(line, t),
            op => {
                self.seen_instruction = true;
                self.define_label(line, t, op == Some(Operation::Pseudo(PseudoOp::Equ)));
                self.advance(op, line, t);
                self.literal(line, t);
            }
        }
        self.lines.push(code);
    }

    fn linkage_line(&mut self, p: PseudoOp, line: Option<usize>, t: &Tokens) {
        if self.seen_instruction {
            self.report(Kind::ExtEntFollowsInstr, line);
            return;
        }
        if !t.label.is_empty() {
            self.report(Kind::ExtEntLabel, line);
            return;
        }
        if t.operands.is_empty() {
            self.report(Kind::ExtEntNoOperand, line);
            return;
        }
        for name in &t.operands {
            let added = if p == PseudoOp::Ext {
                self.linkage.add_external(name)
            } else {
                self.linkage.add_entry(name)
            };
            if !added {
                self.report(Kind::BothExtEnt, line);
            }
        }
    }

    fn end(&mut self, line: Option<usize>, t: &Tokens) {
        self.state = State::EndFound;
        if !t.label.is_empty() {
            self.report(Kind::EndHasLabel, line);
        }
        let operand = t.operand(0);
        if operand.is_empty() {
            self.exec = Some(self.segment.load);
        } else if is_hex(operand) {
            match parse_hex16(operand) {
                Some(v) => self.exec = Some(v),
                None => self.report(Kind::EndInvalidHexOperand, line),
            }
        } else if let Some(sym) = self.symbols.get(operand) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let exec = sym.value as u16;
            self.exec = Some(exec);
        } else {
            self.report(Kind::EndForwardReferencing, line);
        }
    }

    fn define_label(&mut self, line: Option<usize>, t: &Tokens, equ: bool) {
        if t.label.is_empty() {
            if equ {
                self.report(Kind::EquNoLabel, line);
            }
            return;
        }
        if self.symbols.has(&t.label) {
            self.report(Kind::MultipleSymbolDefinition, line);
            return;
        }
        if !equ {
            let here = self.here();
            self.symbols.put(&t.label, here, true);
            debug!(label = %t.label, value = here, "label");
            return;
        }

        let operand = t.operand(0);
        if is_constant(operand) {
            match parse_constant16(operand) {
                Some(v) => {
                    self.symbols.put(&t.label, v, false);
                }
                None => self.report(Kind::EquInvalidConstOperandRange, line),
            }
        } else if let Some(sym) = self.symbols.get(operand) {
            self.symbols.put(&t.label, sym.value, sym.relocatable);
        } else {
            self.report(Kind::EquForwardReferencing, line);
        }
    }

    fn advance(&mut self, op: Option<Operation>, line: Option<usize>, t: &Tokens) {
        match op {
            Some(Operation::Machine(_)) => self.lc += 1,
            Some(Operation::Pseudo(PseudoOp::Blkw)) => self.blkw(line, t.operand(0)),
            Some(Operation::Pseudo(PseudoOp::Strz)) => self.strz(line, t.operand(0)),
            Some(Operation::Pseudo(p)) => {
                if let Size::Fixed(n) = p.size() {
                    self.lc += u32::from(n);
                }
            }
            None => self.report(Kind::InvalidInstruction, line),
        }
    }

    fn blkw(&mut self, line: Option<usize>, operand: &str) {
        let words = if is_constant(operand) {
            parse_constant(operand)
        } else if let Some(sym) = self.symbols.get(operand) {
            if sym.relocatable {
                self.report(Kind::BlkwRelSymbol, line);
                return;
            }
            Some(sym.value)
        } else {
            self.report(Kind::BlkwForwardReferencing, line);
            return;
        };
        match words.and_then(|w| u32::try_from(w).ok()) {
            Some(w @ 1..=0xFFFF) => self.lc += w,
            _ => self.report(Kind::BlkwInvalidOperandRange, line),
        }
    }

    fn strz(&mut self, line: Option<usize>, operand: &str) {
        let len = operand.chars().count();
        if len >= 2 && operand.starts_with('"') && operand.ends_with('"') {
            // Characters plus the terminating null word.
            self.lc += u32::try_from(len - 1).unwrap_or(u32::MAX);
        } else {
            self.report(Kind::InvalidStrzOperand, line);
        }
    }

    fn literal(&mut self, line: Option<usize>, t: &Tokens) {
        let Some(lit) = t.operands.iter().find(|o| o.starts_with('=')) else {
            return;
        };
        if t.operation != Opcode::LD.to_string() {
            self.report(Kind::LiteralNotLdInstr, line);
            return;
        }
        if parse_constant16(lit).is_none() {
            self.report(Kind::LiteralInvalidOperandRange, line);
            return;
        }
        self.literals.put(lit);
    }

    fn finish(mut self) -> Option<Program> {
        match self.state {
            State::SeekOrigin => self.report(Kind::OriginNotFound, None),
            State::MainScan => self.report(Kind::EndNotFound, None),
            State::EndFound => {}
        }

        // The literal pool goes straight after the last code or data word.
        #[allow(clippy::cast_possible_truncation)]
        let start = self.segment.load.wrapping_add(self.lc as u16);
        self.literals.place(start);
        for l in self.literals.all() {
            debug!(literal = %l.text, value = l.value, address = ?l.address, "literal");
        }
        self.lc += u32::try_from(self.literals.len()).unwrap_or(u32::MAX);
        self.segment.length = self.lc;
        self.segment.exec = self.exec.unwrap_or(self.segment.load);

        for name in self.linkage.entries().to_vec() {
            match self.symbols.get(&name) {
                None => self.report(Kind::EntUndefined, None),
                Some(sym) if !sym.relocatable => self.report(Kind::EntNotRelocatable, None),
                Some(_) => {}
            }
        }
        for name in self.linkage.externals().to_vec() {
            if !self.symbols.put(&name, 0, true) {
                self.report(Kind::ExtDefinedInFile, None);
            }
        }

        debug!(
            name = %self.segment.name,
            length = self.segment.length,
            exec = self.segment.exec,
            symbols = self.symbols.len(),
            literals = self.literals.len(),
            "pass1 done"
        );
        if self.failed {
            return None;
        }
        Some(Program {
            segment: self.segment,
            symbols: self.symbols,
            literals: self.literals,
            linkage: self.linkage,
            lines: self.lines,
        })
    }
}
