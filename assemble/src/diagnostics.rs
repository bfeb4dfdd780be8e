// Diagnostics collected while assembling one module. Nothing here prints;
// the caller drains the collector and decides how to surface it.

use std::fmt;

use strum_macros::IntoStaticStr;
use thiserror::Error;

/// `Category` groups related diagnostic kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    /// Tokenizer level problems with a line's shape.
    Syntax,
    /// A directive in the wrong place, missing its label or with a bad operand.
    DirectivePlacement,
    /// A directive operand naming a symbol not yet defined.
    ForwardReference,
    /// An operand value outside the range its field allows.
    Range,
    /// The wrong kind (or number) of operand for an instruction.
    OperandKind,
    /// Redefinition or use of an undefined symbol.
    Symbol,
    /// `.EXT` and `.ENT` consistency.
    Linkage,
    /// The module as a whole doesn't fit.
    Segment,
    /// Non-fatal issues.
    Warning,
}

/// `Kind` is the closed set of things that can go wrong (or look suspicious)
/// in a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    #[error("The label can not start with the R register designation or the x hex designation")]
    ParserLabelInvalidCharacter,
    #[error("The length of the label must be 6 chars at most")]
    ParserInvalidLabelLength,
    #[error("All program labels must be alphanumeric")]
    ParserNonAlphanumericLabel,
    #[error("The length of the operation must be 5 chars at most")]
    ParserInvalidOperationLength,
    #[error("The STRZ operand must be enclosed in quotes")]
    ParserUnterminatedString,

    #[error(".ORIG instruction not found")]
    OriginNotFound,
    #[error(".ORIG not the first record of the program")]
    OriginNotFirst,
    #[error(".ORIG is missing a label")]
    OriginNoLabel,
    #[error(".ORIG operand is not a hex number in [x0, xFFFF] range")]
    OriginInvalidHexOperand,
    #[error(".END instruction not found")]
    EndNotFound,
    #[error(".END instruction has a label")]
    EndHasLabel,
    #[error(".END operand is not a hex number in [x0, xFFFF] range")]
    EndInvalidHexOperand,
    #[error(".END operand is a symbol that is not previously defined")]
    EndForwardReferencing,
    #[error(".BLKW operand is a symbol that is not previously defined")]
    BlkwForwardReferencing,
    #[error(".BLKW operand is a relocatable symbol")]
    BlkwRelSymbol,
    #[error(".BLKW operand is not in [x1, xFFFF] range")]
    BlkwInvalidOperandRange,
    #[error(".EQU operand is a symbol that is not previously defined")]
    EquForwardReferencing,
    #[error(".EQU operand equated to a constant out of range")]
    EquInvalidConstOperandRange,
    #[error(".EQU is missing a label")]
    EquNoLabel,
    #[error("Literal is used for a non-LD instruction")]
    LiteralNotLdInstr,
    #[error("Invalid literal. Not in [#-32768, #32767] or [x0, xFFFF]")]
    LiteralInvalidOperandRange,
    #[error("Symbol defined multiple times")]
    MultipleSymbolDefinition,
    #[error(".STRZ operand is missing quotation marks")]
    InvalidStrzOperand,
    #[error("Invalid instruction")]
    InvalidInstruction,

    #[error(".EXT/.ENT instruction has a label")]
    ExtEntLabel,
    #[error(".EXT/.ENT instruction missing an operand")]
    ExtEntNoOperand,
    #[error(".EXT/.ENT follows a non-.ORIG instruction")]
    ExtEntFollowsInstr,
    #[error(".ENT symbol is undefined")]
    EntUndefined,
    #[error(".ENT symbol is not a relocatable symbol")]
    EntNotRelocatable,
    #[error("Symbol declared as both .ENT and .EXT")]
    BothExtEnt,
    #[error(".EXT symbol was defined in the current file")]
    ExtDefinedInFile,

    #[error("Imm5 operand is not in [#-16, #15]")]
    Imm5ValWrong,
    #[error("Register operand is not in [0, 7]")]
    RegValWrong,
    #[error("Index6 operand is not in [#0, #63] or [x0, x3F]")]
    Index6ValWrong,
    #[error("TRAP operand is not in [x0, xFF]")]
    TrapVecWrong,
    #[error("Operand is not in [#-32768, xFFFF]")]
    HexValWrong,
    #[error("Incorrect number of operands for this instruction")]
    IncorrectOperandNumber,
    #[error("Wrong kind of operand for this instruction")]
    InvalidOperandUsage,
    #[error("Forbidden use of a relocatable symbol as an operand")]
    ImproperRelativeSymbol,
    #[error("Attempt to use an undefined symbol")]
    EmptySymbol,
    #[error("Address operand points across a page")]
    CrossPageReference,
    #[error("A module cannot be relocatable if it uses multiple pages")]
    RelocatableTooBig,
    #[error("Module extends past the end of memory")]
    OutOfMem,

    #[error("Use of an unknown trap vector")]
    UndefinedTrap,
    #[error("Non-relocatable address in a relocatable module")]
    NonRelocatableAddr,
}

impl Kind {
    /// `category` returns the group this kind belongs to.
    #[must_use]
    pub fn category(self) -> Category {
        match self {
            Kind::ParserLabelInvalidCharacter
            | Kind::ParserInvalidLabelLength
            | Kind::ParserNonAlphanumericLabel
            | Kind::ParserInvalidOperationLength
            | Kind::ParserUnterminatedString
            | Kind::InvalidInstruction
            | Kind::InvalidStrzOperand => Category::Syntax,
            Kind::OriginNotFound
            | Kind::OriginNotFirst
            | Kind::OriginNoLabel
            | Kind::OriginInvalidHexOperand
            | Kind::EndNotFound
            | Kind::EndHasLabel
            | Kind::EndInvalidHexOperand
            | Kind::EquNoLabel
            | Kind::LiteralNotLdInstr => Category::DirectivePlacement,
            Kind::EndForwardReferencing
            | Kind::BlkwForwardReferencing
            | Kind::EquForwardReferencing => Category::ForwardReference,
            Kind::BlkwInvalidOperandRange
            | Kind::EquInvalidConstOperandRange
            | Kind::LiteralInvalidOperandRange
            | Kind::Imm5ValWrong
            | Kind::RegValWrong
            | Kind::Index6ValWrong
            | Kind::TrapVecWrong
            | Kind::HexValWrong
            | Kind::CrossPageReference => Category::Range,
            Kind::BlkwRelSymbol
            | Kind::IncorrectOperandNumber
            | Kind::InvalidOperandUsage
            | Kind::ImproperRelativeSymbol => Category::OperandKind,
            Kind::MultipleSymbolDefinition | Kind::EmptySymbol => Category::Symbol,
            Kind::ExtEntLabel
            | Kind::ExtEntNoOperand
            | Kind::ExtEntFollowsInstr
            | Kind::EntUndefined
            | Kind::BothExtEnt
            | Kind::ExtDefinedInFile => Category::Linkage,
            Kind::RelocatableTooBig | Kind::OutOfMem => Category::Segment,
            Kind::EntNotRelocatable | Kind::UndefinedTrap | Kind::NonRelocatableAddr => {
                Category::Warning
            }
        }
    }

    /// `is_warning` is true for kinds which don't fail the assembly.
    #[must_use]
    pub fn is_warning(self) -> bool {
        self.category() == Category::Warning
    }

    /// `name` is the upper case identifier for the kind, i.e. `EMPTY_SYMBOL`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// `Diagnostic` is one entry in the log. `line` is the 1 based source line
/// or None for problems which belong to the module as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: Kind,
    /// Where.
    pub line: Option<usize>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(l) => write!(f, "[ LINE {l} ] ")?,
            None => write!(f, "[ LINE - ] ")?,
        }
        let severity = if self.kind.is_warning() {
            "WARNING"
        } else {
            "ERROR"
        };
        write!(f, "{severity}: {} - {}", self.kind.name(), self.kind)
    }
}

/// `Diagnostics` accumulates entries in the order they're found. A failed
/// assembly returns it as the error value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, d) in self.entries.iter().enumerate() {
            if i != 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl Diagnostics {
    /// `new` returns an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `push` records a diagnostic.
    pub fn push(&mut self, kind: Kind, line: Option<usize>) {
        self.entries.push(Diagnostic { kind, line });
    }

    /// `has_errors` is true if anything other than a warning was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| !d.kind.is_warning())
    }

    /// `count` returns how many times the given kind was recorded.
    #[must_use]
    pub fn count(&self, kind: Kind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// `iter` walks the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// `len` returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `is_empty` is true when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `drain` hands every entry to the caller and leaves the collector empty.
    pub fn drain(&mut self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.entries.drain(..)
    }
}
