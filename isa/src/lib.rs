//! isa describes the instruction set of the 3903 machine. Every
//! instruction is one 16-bit word: a 4 bit opcode followed by a 12 bit
//! layout of literal bits, operand fields and unused (don't care) bits.
//!
//! The tables here are pure data. Encoding, decoding and listing all walk
//! a `Descriptor` layout generically.

use std::ops::RangeInclusive;
use std::str::FromStr;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

mod bits;

pub use bits::*;


/// Trap vectors the machine actually services. Anything else assembles
/// but draws a warning.
pub const TRAP_VECTORS: [i32; 7] = [0x21, 0x22, 0x23, 0x25, 0x31, 0x33, 0x43];

/// `Opcode` defines every machine instruction mnemonic.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, EnumIter, EnumString)]
pub enum Opcode {
    /// Add two registers.
    ADD,
    /// Add a register and a 5 bit immediate. Written as ADD in source.
    ADDI,
    /// Bitwise and of two registers.
    AND,
    /// Bitwise and of a register and a 5 bit immediate. Written as AND in source.
    ANDI,
    /// Unconditional branch (never taken when no condition bits are set).
    BR,
    /// Branch on negative.
    BRN,
    /// Branch on zero.
    BRZ,
    /// Branch on positive.
    BRP,
    /// Branch on negative or zero.
    BRNZ,
    /// Branch on negative or positive.
    BRNP,
    /// Branch on zero or positive.
    BRZP,
    /// Branch always.
    BRNZP,
    /// Dump machine state.
    DBUG,
    /// Jump to subroutine, saving the return address.
    JSR,
    /// Jump to subroutine through a base register plus index.
    JSRR,
    /// Jump.
    JMP,
    /// Jump through a base register plus index.
    JMPR,
    /// Load.
    LD,
    /// Load indirect.
    LDI,
    /// Load from a base register plus index.
    LDR,
    /// Load effective address.
    LEA,
    /// Bitwise not.
    NOT,
    /// Return from subroutine.
    RET,
    /// Store.
    ST,
    /// Store indirect.
    STI,
    /// Store to a base register plus index.
    STR,
    /// System trap.
    TRAP,
}

/// `Field` says where the bits of one layout span come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// Literal zero bits.
    Zero,
    /// Literal one bits.
    One,
    /// Unused bits. These encode as 0 and list as `x`.
    DontCare,
    /// The given (0 based) operand.
    Operand(usize),
}

/// `Span` is a run of `width` bits sourced from `field`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    /// Where the bits come from.
    pub field: Field,
    /// Number of bits.
    pub width: u32,
}

/// `OperandClass` groups instructions by what their final operand must be.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum OperandClass {
    /// A register in `[0, 7]`.
    Register,
    /// A signed 5 bit immediate in `[-16, 15]`.
    Immediate5,
    /// A trap vector in `[0, 255]`.
    TrapVector,
    /// An unsigned 6 bit index in `[0, 63]`.
    Index6,
    /// No operands at all.
    NoOperand,
    /// An address which must sit on the same page as the instruction.
    Address,
}

/// `Descriptor` is the immutable encoding description of one instruction.
#[derive(Debug, PartialEq, Eq)]
pub struct Descriptor {
    /// The 4 bit opcode placed in bits 12-15.
    pub opcode: u16,
    /// Exact number of operands required.
    pub operands: usize,
    /// Class of the final operand.
    pub class: OperandClass,
    /// Layout of bits 0-11, most significant span first.
    pub layout: &'static [Span],
}

const fn span(field: Field, width: u32) -> Span {
    Span { field, width }
}

const fn desc(
    opcode: u16,
    operands: usize,
    class: OperandClass,
    layout: &'static [Span],
) -> Descriptor {
    Descriptor {
        opcode,
        operands,
        class,
        layout,
    }
}

use Field::{DontCare, One, Operand, Zero};
use OperandClass::{Address, Immediate5, Index6, NoOperand, Register, TrapVector};

static R3_R3_R3: [Span; 5] = [
    span(Operand(0), 3),
    span(Operand(1), 3),
    span(Zero, 1),
    span(DontCare, 2),
    span(Operand(2), 3),
];
static R3_R3_IMM5: [Span; 4] = [
    span(Operand(0), 3),
    span(Operand(1), 3),
    span(One, 1),
    span(Operand(2), 5),
];
static R3_ADDR9: [Span; 2] = [span(Operand(0), 3), span(Operand(1), 9)];
static R3_R3_INDEX6: [Span; 3] = [
    span(Operand(0), 3),
    span(Operand(1), 3),
    span(Operand(2), 6),
];
static R3_R3_UNUSED: [Span; 3] = [span(Operand(0), 3), span(Operand(1), 3), span(DontCare, 6)];
static LINK_ADDR9: [Span; 3] = [span(One, 1), span(DontCare, 2), span(Operand(0), 9)];
static JUMP_ADDR9: [Span; 3] = [span(Zero, 1), span(DontCare, 2), span(Operand(0), 9)];
static LINK_R3_INDEX6: [Span; 4] = [
    span(One, 1),
    span(DontCare, 2),
    span(Operand(0), 3),
    span(Operand(1), 6),
];
static JUMP_R3_INDEX6: [Span; 4] = [
    span(Zero, 1),
    span(DontCare, 2),
    span(Operand(0), 3),
    span(Operand(1), 6),
];
static VECTOR8: [Span; 2] = [span(DontCare, 4), span(Operand(0), 8)];
static UNUSED: [Span; 1] = [span(DontCare, 12)];

// Branches carry their n, z and p condition bits as literals.
macro_rules! branch {
    ($layout:ident, $n:ident, $z:ident, $p:ident) => {
        static $layout: [Span; 4] = [
            span($n, 1),
            span($z, 1),
            span($p, 1),
            span(Operand(0), 9),
        ];
    };
}

branch!(NEVER, Zero, Zero, Zero);
branch!(IF_N, One, Zero, Zero);
branch!(IF_Z, Zero, One, Zero);
branch!(IF_P, Zero, Zero, One);
branch!(IF_NZ, One, One, Zero);
branch!(IF_NP, One, Zero, One);
branch!(IF_ZP, Zero, One, One);
branch!(ALWAYS, One, One, One);

static ADD: Descriptor = desc(0b0001, 3, Register, &R3_R3_R3);
static ADDI: Descriptor = desc(0b0001, 3, Immediate5, &R3_R3_IMM5);
static AND: Descriptor = desc(0b0101, 3, Register, &R3_R3_R3);
static ANDI: Descriptor = desc(0b0101, 3, Immediate5, &R3_R3_IMM5);
static BR: Descriptor = desc(0b0000, 1, Address, &NEVER);
static BRN: Descriptor = desc(0b0000, 1, Address, &IF_N);
static BRZ: Descriptor = desc(0b0000, 1, Address, &IF_Z);
static BRP: Descriptor = desc(0b0000, 1, Address, &IF_P);
static BRNZ: Descriptor = desc(0b0000, 1, Address, &IF_NZ);
static BRNP: Descriptor = desc(0b0000, 1, Address, &IF_NP);
static BRZP: Descriptor = desc(0b0000, 1, Address, &IF_ZP);
static BRNZP: Descriptor = desc(0b0000, 1, Address, &ALWAYS);
static DBUG: Descriptor = desc(0b1000, 0, NoOperand, &UNUSED);
static JSR: Descriptor = desc(0b0100, 1, Address, &LINK_ADDR9);
static JMP: Descriptor = desc(0b0100, 1, Address, &JUMP_ADDR9);
static JSRR: Descriptor = desc(0b1100, 2, Index6, &LINK_R3_INDEX6);
static JMPR: Descriptor = desc(0b1100, 2, Index6, &JUMP_R3_INDEX6);
static LD: Descriptor = desc(0b0010, 2, Address, &R3_ADDR9);
static LDI: Descriptor = desc(0b1010, 2, Address, &R3_ADDR9);
static LDR: Descriptor = desc(0b0110, 3, Index6, &R3_R3_INDEX6);
static LEA: Descriptor = desc(0b1110, 2, Address, &R3_ADDR9);
static NOT: Descriptor = desc(0b1001, 2, Register, &R3_R3_UNUSED);
static RET: Descriptor = desc(0b1101, 0, NoOperand, &UNUSED);
static ST: Descriptor = desc(0b0011, 2, Address, &R3_ADDR9);
static STI: Descriptor = desc(0b1011, 2, Address, &R3_ADDR9);
static STR: Descriptor = desc(0b0111, 3, Index6, &R3_R3_INDEX6);
static TRAP: Descriptor = desc(0b1111, 1, TrapVector, &VECTOR8);

impl Opcode {
    /// `descriptor` returns the encoding table entry for this opcode.
    #[must_use]
    pub fn descriptor(self) -> &'static Descriptor {
        match self {
            Opcode::ADD => &ADD,
            Opcode::ADDI => &ADDI,
            Opcode::AND => &AND,
            Opcode::ANDI => &ANDI,
            Opcode::BR => &BR,
            Opcode::BRN => &BRN,
            Opcode::BRZ => &BRZ,
            Opcode::BRP => &BRP,
            Opcode::BRNZ => &BRNZ,
            Opcode::BRNP => &BRNP,
            Opcode::BRZP => &BRZP,
            Opcode::BRNZP => &BRNZP,
            Opcode::DBUG => &DBUG,
            Opcode::JSR => &JSR,
            Opcode::JSRR => &JSRR,
            Opcode::JMP => &JMP,
            Opcode::JMPR => &JMPR,
            Opcode::LD => &LD,
            Opcode::LDI => &LDI,
            Opcode::LDR => &LDR,
            Opcode::LEA => &LEA,
            Opcode::NOT => &NOT,
            Opcode::RET => &RET,
            Opcode::ST => &ST,
            Opcode::STI => &STI,
            Opcode::STR => &STR,
            Opcode::TRAP => &TRAP,
        }
    }

    /// `from_word` finds the instruction an encoded word belongs to by
    /// matching its opcode and literal bits against every descriptor.
    #[must_use]
    pub fn from_word(word: u16) -> Option<Opcode> {
        Opcode::iter().find(|op| op.descriptor().matches(word))
    }
}

impl Descriptor {
    /// `encode` packs the opcode and operand values into a word. Operand
    /// values are masked to their field width so callers must range check
    /// them first. Missing operands encode as 0.
    #[must_use]
    pub fn encode(&self, operands: &[i32]) -> u16 {
        let mut word = self.opcode << 12;
        let mut shift = 12;
        for s in self.layout {
            shift -= s.width;
            let val = match s.field {
                Zero | DontCare => 0,
                One => mask(s.width),
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                Operand(i) => operands.get(i).map_or(0, |v| *v as u16) & mask(s.width),
            };
            word |= val << shift;
        }
        word
    }

    /// `decode` pulls the operand values back out of a word. A signed
    /// immediate field is sign extended, everything else is unsigned.
    #[must_use]
    pub fn decode(&self, word: u16) -> Vec<i32> {
        let mut out = vec![0; self.operands];
        let mut shift = 12;
        for s in self.layout {
            shift -= s.width;
            if let Operand(i) = s.field {
                let raw = bit_range(word, shift, shift + s.width);
                out[i] = if self.is_signed(i) {
                    i32::from(sign_extend(raw, s.width))
                } else {
                    i32::from(raw)
                };
            }
        }
        out
    }

    /// `matches` reports whether the word carries this descriptor's opcode
    /// and literal bits.
    #[must_use]
    pub fn matches(&self, word: u16) -> bool {
        if bit_range(word, 12, 16) != self.opcode {
            return false;
        }
        let mut shift = 12;
        self.layout.iter().all(|s| {
            shift -= s.width;
            let bits = bit_range(word, shift, shift + s.width);
            match s.field {
                Zero => bits == 0,
                One => bits == mask(s.width),
                DontCare | Operand(_) => true,
            }
        })
    }

    /// `operand_range` is the set of values the given operand field can hold
    /// once packed.
    #[must_use]
    pub fn operand_range(&self, operand: usize) -> Option<RangeInclusive<i32>> {
        let width = self
            .layout
            .iter()
            .find(|s| s.field == Operand(operand))?
            .width;
        if self.is_signed(operand) {
            let half = 1 << (width - 1);
            Some(-half..=half - 1)
        } else {
            Some(0..=(1 << width) - 1)
        }
    }

    /// `binary` renders a word per this layout: the opcode then each span,
    /// separated by `_`. Don't care bits are shown as `x`.
    #[must_use]
    pub fn binary(&self, word: u16) -> String {
        let mut out = binary(bit_range(word, 12, 16), 4);
        let mut shift = 12;
        for s in self.layout {
            shift -= s.width;
            out.push('_');
            if s.field == DontCare {
                out.extend(std::iter::repeat('x').take(s.width as usize));
            } else {
                out.push_str(&binary(bit_range(word, shift, shift + s.width), s.width));
            }
        }
        out
    }

    fn is_signed(&self, operand: usize) -> bool {
        self.class == Immediate5 && operand + 1 == self.operands
    }
}

/// `PseudoOp` defines the assembler directives.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, EnumIter, EnumString)]
pub enum PseudoOp {
    /// Start of a module, naming the segment and optionally its load address.
    #[strum(serialize = ".ORIG")]
    Orig,
    /// End of a module, optionally naming the execution address.
    #[strum(serialize = ".END")]
    End,
    /// Define a symbol as a constant or as another symbol.
    #[strum(serialize = ".EQU")]
    Equ,
    /// One word of data.
    #[strum(serialize = ".FILL")]
    Fill,
    /// A null terminated string, one character per word.
    #[strum(serialize = ".STRZ")]
    Strz,
    /// Reserve a block of words.
    #[strum(serialize = ".BLKW")]
    Blkw,
    /// Symbols this module exports.
    #[strum(serialize = ".ENT")]
    Ent,
    /// Symbols this module imports.
    #[strum(serialize = ".EXT")]
    Ext,
}

/// `Size` is how far a pseudo-op moves the location counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Size {
    /// Always this many words.
    Fixed(u16),
    /// Depends on the operand.
    Variable,
}

impl PseudoOp {
    /// `size` returns the location counter rule for this directive.
    #[must_use]
    pub fn size(self) -> Size {
        match self {
            PseudoOp::Orig | PseudoOp::End | PseudoOp::Equ | PseudoOp::Ent | PseudoOp::Ext => {
                Size::Fixed(0)
            }
            PseudoOp::Fill => Size::Fixed(1),
            PseudoOp::Strz | PseudoOp::Blkw => Size::Variable,
        }
    }

    /// `operands` returns how many operands the directive accepts.
    #[must_use]
    pub fn operands(self) -> RangeInclusive<usize> {
        match self {
            PseudoOp::Orig | PseudoOp::End => 0..=1,
            PseudoOp::Equ | PseudoOp::Fill | PseudoOp::Strz | PseudoOp::Blkw => 1..=1,
            PseudoOp::Ent | PseudoOp::Ext => 1..=usize::MAX,
        }
    }
}

/// `Operation` is anything that can appear in the operation column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// A machine instruction.
    Machine(Opcode),
    /// An assembler directive.
    Pseudo(PseudoOp),
}

impl Operation {
    /// `lookup` resolves a mnemonic. Matching is exact and case sensitive.
    #[must_use]
    pub fn lookup(mnemonic: &str) -> Option<Operation> {
        if let Ok(op) = Opcode::from_str(mnemonic) {
            Some(Operation::Machine(op))
        } else {
            PseudoOp::from_str(mnemonic).ok().map(Operation::Pseudo)
        }
    }
}
