// Pass 2 resolves every operand against the finished tables, validates it
// for its position and instruction, then packs the words and tags them for
// relocation.

use rusty3903::prelude::*;
use tracing::{debug, info_span, trace};

use crate::diagnostics::{Diagnostics, Kind};
use crate::intermediate::{CodeLine, Program};
use crate::records::{ObjectRecord, Record, Relocation, RelocationKind, Source};

// How an operand got its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OperandKind {
    Literal,
    Symbol,
    Constant,
    Register,
    Text,
}

#[derive(Clone, Debug)]
struct Resolved {
    kind: OperandKind,
    value: i32,
    relocatable: bool,
    external: Option<String>,
}

struct Pass2<'a> {
    program: &'a Program,
    diags: &'a mut Diagnostics,
    failed: bool,
    records: Vec<Record>,
}

/// `pass2` turns pass 1's output into records. Returns None if any error
/// was found; the reasons are in `diags`.
pub fn pass2(program: &Program, diags: &mut Diagnostics) -> Option<Vec<Record>> {
    let span = info_span!("pass2");
    let _enter = span.enter();

    let mut p = Pass2 {
        program,
        diags,
        failed: false,
        records: Vec::new(),
    };
    let seg = &program.segment;

    p.records.push(Record {
        object: Some(ObjectRecord::Header {
            name: seg.name.clone(),
            load: seg.load,
            length: seg.length,
        }),
        ..Record::default()
    });

    // The last word is load + length - 1.
    let end = u32::from(seg.load) + seg.length;
    if end > 0x1_0000 {
        p.report(Kind::OutOfMem, None);
        return None;
    }
    if seg.relocatable && seg.length > 0 {
        #[allow(clippy::cast_possible_truncation)]
        let last = (end - 1) as u16;
        if page(seg.load) != page(last) {
            p.report(Kind::RelocatableTooBig, None);
        }
    }

    for name in program.linkage.entries() {
        if let Some(sym) = program.symbols.get(name) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let value = sym.value as u16;
            p.records.push(Record {
                object: Some(ObjectRecord::Entry {
                    name: name.clone(),
                    value,
                }),
                ..Record::default()
            });
        }
    }

    for code in &program.lines {
        trace!(line = code.line, lc = code.lc, text = %code.text);
        if p.line(code) {
            break;
        }
    }

    debug!(records = p.records.len(), failed = p.failed, "pass2 done");
    if p.failed {
        None
    } else {
        Some(p.records)
    }
}

fn source(code: &CodeLine) -> Option<Source> {
    Some(Source {
        line: code.line,
        text: code.text.clone(),
    })
}

impl Pass2<'_> {
    fn report(&mut self, kind: Kind, line: Option<usize>) {
        if !kind.is_warning() {
            self.failed = true;
        }
        self.diags.push(kind, line);
    }

    fn listing_only(&mut self, code: &CodeLine) {
        self.records.push(Record {
            source: source(code),
            ..Record::default()
        });
    }

    // Relocation tag for a word, or None in an absolute module.
    fn tag(&self, kind: RelocationKind, external: Option<String>) -> Option<Relocation> {
        if !self.program.segment.relocatable {
            return None;
        }
        Some(Relocation {
            kind,
            symbol: external.unwrap_or_else(|| self.program.segment.name.clone()),
        })
    }

    // Returns true once .END has been handled.
    fn line(&mut self, code: &CodeLine) -> bool {
        match Operation::lookup(&code.tokens.operation) {
            Some(Operation::Machine(op)) => {
                self.instruction(op, code);
                false
            }
            Some(Operation::Pseudo(p)) => self.pseudo(p, code),
            // Pass 1 already rejected these.
            None => {
                self.listing_only(code);
                false
            }
        }
    }

    fn pseudo(&mut self, p: PseudoOp, code: &CodeLine) -> bool {
        let line = Some(code.line);
        let operands = &code.tokens.operands;
        if !p.operands().contains(&operands.len()) {
            self.report(Kind::IncorrectOperandNumber, line);
            return p == PseudoOp::End;
        }
        match p {
            PseudoOp::Orig | PseudoOp::Equ | PseudoOp::Blkw | PseudoOp::Ext | PseudoOp::Ent => {
                self.listing_only(code);
            }
            PseudoOp::Fill => self.fill(code),
            PseudoOp::Strz => self.strz(code),
            PseudoOp::End => {
                self.literal_pool();
                self.records.push(Record {
                    object: Some(ObjectRecord::End {
                        exec: self.program.segment.exec,
                    }),
                    source: source(code),
                    opcode: None,
                });
                return true;
            }
        }
        false
    }

    fn literal_pool(&mut self) {
        for l in self.program.literals.all() {
            let Some(address) = l.address else {
                continue;
            };
            let relocation = self.tag(RelocationKind::Absolute, None);
            self.records.push(Record {
                object: Some(ObjectRecord::Text {
                    address,
                    contents: l.value,
                    relocation,
                }),
                ..Record::default()
            });
        }
    }

    fn fill(&mut self, code: &CodeLine) {
        let line = Some(code.line);
        let Some(r) = self.resolve(line, code.tokens.operand(0)) else {
            return;
        };
        if !matches!(r.kind, OperandKind::Symbol | OperandKind::Constant) {
            self.report(Kind::InvalidOperandUsage, line);
            return;
        }
        if !(-32768..=0xFFFF).contains(&r.value) {
            self.report(Kind::HexValWrong, line);
            return;
        }
        let kind = if r.relocatable {
            RelocationKind::Word16
        } else {
            RelocationKind::Absolute
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let contents = r.value as u16;
        let relocation = self.tag(kind, r.external);
        self.records.push(Record {
            object: Some(ObjectRecord::Text {
                address: code.address(self.program.segment.load),
                contents,
                relocation,
            }),
            source: source(code),
            opcode: None,
        });
    }

    fn strz(&mut self, code: &CodeLine) {
        let operand = code.tokens.operand(0);
        let text = operand
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or_default();
        let mut address = code.address(self.program.segment.load);
        let mut listed = false;
        // Each character gets its own word, then a null terminator.
        for word in text.chars().map(|c| c as u16).chain(std::iter::once(0)) {
            let relocation = self.tag(RelocationKind::Absolute, None);
            self.records.push(Record {
                object: Some(ObjectRecord::Text {
                    address,
                    contents: word,
                    relocation,
                }),
                source: if listed { None } else { source(code) },
                opcode: None,
            });
            listed = true;
            address = address.wrapping_add(1);
        }
    }

    fn instruction(&mut self, op: Opcode, code: &CodeLine) {
        let line = Some(code.line);
        let desc = op.descriptor();
        let operands = &code.tokens.operands;
        if operands.len() != desc.operands {
            self.report(Kind::IncorrectOperandNumber, line);
            return;
        }
        let address = code.address(self.program.segment.load);

        let mut values = Vec::with_capacity(operands.len());
        let mut relocatable = false;
        let mut external = None;
        let mut ok = true;
        for (i, text) in operands.iter().enumerate() {
            // An undefined symbol stops this line; there's nothing to encode.
            let Some(r) = self.resolve(line, text) else {
                return;
            };
            ok &= if i + 1 == desc.operands {
                self.check_last(op, desc.class, &r, address, line)
            } else {
                self.check_register(&r, line)
            };
            relocatable |= r.relocatable;
            if r.external.is_some() {
                external = r.external;
            }
            values.push(r.value);
        }
        if !ok {
            return;
        }

        let word = desc.encode(&values);
        let relocation = if self.program.segment.relocatable {
            if desc.class == OperandClass::Address && !relocatable {
                self.report(Kind::NonRelocatableAddr, line);
            }
            let kind = if relocatable {
                RelocationKind::Offset9
            } else {
                RelocationKind::Absolute
            };
            self.tag(kind, external)
        } else {
            None
        };
        self.records.push(Record {
            object: Some(ObjectRecord::Text {
                address,
                contents: word,
                relocation,
            }),
            source: source(code),
            opcode: Some(op),
        });
    }

    // Operands resolve in this order: literal, symbol, constant, register,
    // quoted text.
    fn resolve(&mut self, line: Option<usize>, text: &str) -> Option<Resolved> {
        let program = self.program;
        let resolved = |kind, value, relocatable, external| Resolved {
            kind,
            value,
            relocatable,
            external,
        };
        if let Some(addr) = program.literals.address(text) {
            return Some(resolved(OperandKind::Literal, i32::from(addr), true, None));
        }
        if let Some(sym) = program.symbols.get(text) {
            let external = program
                .linkage
                .is_external(text)
                .then(|| text.to_string());
            return Some(resolved(
                OperandKind::Symbol,
                sym.value,
                sym.relocatable,
                external,
            ));
        }
        if let Some(v) = parse_constant(text) {
            return Some(resolved(OperandKind::Constant, v, false, None));
        }
        if let Some(r) = register(text) {
            return Some(resolved(OperandKind::Register, r, false, None));
        }
        if text.starts_with('"') {
            return Some(resolved(OperandKind::Text, 0, false, None));
        }
        self.report(Kind::EmptySymbol, line);
        None
    }

    // Every operand but the last must be a register. Range and relocation
    // are both reported when both are wrong.
    fn check_register(&mut self, r: &Resolved, line: Option<usize>) -> bool {
        if !matches!(r.kind, OperandKind::Register | OperandKind::Symbol) {
            self.report(Kind::InvalidOperandUsage, line);
            return false;
        }
        let in_range = (0..=7).contains(&r.value);
        if !in_range {
            self.report(Kind::RegValWrong, line);
        }
        in_range & self.check_absolute(r, line)
    }

    fn check_last(
        &mut self,
        op: Opcode,
        class: OperandClass,
        r: &Resolved,
        address: u16,
        line: Option<usize>,
    ) -> bool {
        let value_kind = matches!(r.kind, OperandKind::Symbol | OperandKind::Constant);
        match class {
            OperandClass::Register => self.check_register(r, line),
            OperandClass::NoOperand => true,
            OperandClass::Immediate5 => {
                let in_range = self.check_value(value_kind, r, -16..=15, Kind::Imm5ValWrong, line);
                value_kind && (in_range & self.check_absolute(r, line))
            }
            OperandClass::Index6 => self.check_value(value_kind, r, 0..=63, Kind::Index6ValWrong, line),
            OperandClass::TrapVector => {
                let in_range = self.check_value(value_kind, r, 0..=255, Kind::TrapVecWrong, line);
                if !value_kind || !(in_range & self.check_absolute(r, line)) {
                    return false;
                }
                if !TRAP_VECTORS.contains(&r.value) {
                    self.report(Kind::UndefinedTrap, line);
                }
                true
            }
            OperandClass::Address => {
                let via_literal = op == Opcode::LD && r.kind == OperandKind::Literal;
                if !self.check_value(
                    value_kind || via_literal,
                    r,
                    -32768..=0xFFFF,
                    Kind::HexValWrong,
                    line,
                ) {
                    return false;
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let target = r.value as u16;
                if !via_literal && page(target) != page(address) {
                    self.report(Kind::CrossPageReference, line);
                    return false;
                }
                true
            }
        }
    }

    fn check_value(
        &mut self,
        kind_ok: bool,
        r: &Resolved,
        range: std::ops::RangeInclusive<i32>,
        out_of_range: Kind,
        line: Option<usize>,
    ) -> bool {
        if !kind_ok {
            self.report(Kind::InvalidOperandUsage, line);
            return false;
        }
        if !range.contains(&r.value) {
            self.report(out_of_range, line);
            return false;
        }
        true
    }

    fn check_absolute(&mut self, r: &Resolved, line: Option<usize>) -> bool {
        if r.relocatable {
            self.report(Kind::ImproperRelativeSymbol, line);
            return false;
        }
        true
    }
}

// R followed by digits. Range is checked by the caller.
fn register(text: &str) -> Option<i32> {
    let digits = text.strip_prefix('R')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
