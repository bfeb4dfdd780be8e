// Object records and the two views built from them: the object file the
// linker reads and a human readable listing.

use std::fmt::{self, Write};

use rusty3903::prelude::*;

// Width of the address/contents/binary column in the listing.
const LISTING_COLUMN: usize = 34;

/// `RelocationKind` tells the linker which bits of a word to adjust.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelocationKind {
    /// The low 9 bits hold a page offset.
    Offset9,
    /// The whole word is an address.
    Word16,
    /// Nothing to adjust.
    Absolute,
}

impl fmt::Display for RelocationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let c = match self {
            RelocationKind::Offset9 => 'N',
            RelocationKind::Word16 => 'S',
            RelocationKind::Absolute => 'A',
        };
        write!(f, "{c}")
    }
}

/// `Relocation` tags a text record in a relocatable module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relocation {
    /// Which bits to adjust.
    pub kind: RelocationKind,
    /// The external symbol (or this segment's name) the adjustment is relative to.
    pub symbol: String,
}

/// `ObjectRecord` is one line of the object file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectRecord {
    /// Segment name, load address and length.
    Header {
        /// Segment name, at most 6 characters.
        name: String,
        /// Load address.
        load: u16,
        /// Length in words.
        length: u32,
    },
    /// An exported symbol.
    Entry {
        /// Symbol name.
        name: String,
        /// Symbol value.
        value: u16,
    },
    /// One word of code or data.
    Text {
        /// Where the word goes.
        address: u16,
        /// The word.
        contents: u16,
        /// Present only in relocatable modules.
        relocation: Option<Relocation>,
    },
    /// Execution start address.
    End {
        /// Execution address.
        exec: u16,
    },
}

impl fmt::Display for ObjectRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ObjectRecord::Header { name, load, length } => {
                write!(f, "H{name:<6}{load:04X}{length:04X}")
            }
            ObjectRecord::Entry { name, value } => write!(f, "N{name}=x{value:X}"),
            ObjectRecord::Text {
                address,
                contents,
                relocation,
            } => {
                write!(f, "T{address:04X}{contents:04X}")?;
                if let Some(r) = relocation {
                    write!(f, "_{}{}", r.kind, r.symbol)?;
                }
                Ok(())
            }
            ObjectRecord::End { exec } => write!(f, "E{exec:04X}"),
        }
    }
}

/// `Source` is the listing side of a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    /// 1 based source line.
    pub line: usize,
    /// Source text without its comment.
    pub text: String,
}

/// `Record` pairs what goes in the object file with the source line that
/// produced it. Either half may be missing; such a record is partial.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    /// Object file line.
    pub object: Option<ObjectRecord>,
    /// Listing line.
    pub source: Option<Source>,
    /// Instruction encoded in `object`, if it's code.
    pub opcode: Option<Opcode>,
}

impl Record {
    /// `is_partial` is true if either half is missing.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.object.is_none() || self.source.is_none()
    }
}

/// `object_file` renders every record that has object text, one per line.
#[must_use]
pub fn object_file(records: &[Record]) -> String {
    let mut out = String::new();
    for o in records.iter().filter_map(|r| r.object.as_ref()) {
        writeln!(out, "{o}").unwrap();
    }
    out
}

/// `listing` renders each record as `(addr) word  binary` padded to a fixed
/// column followed by a running count and the source text. Entry records
/// and records with nothing to show are skipped.
#[must_use]
pub fn listing(records: &[Record]) -> String {
    let mut out = String::new();
    let mut n = 1;
    for r in records {
        let left = match &r.object {
            Some(ObjectRecord::Entry { .. } | ObjectRecord::Header { .. }) => continue,
            Some(ObjectRecord::Text {
                address, contents, ..
            }) => {
                let bits = match r.opcode {
                    Some(op) => op.descriptor().binary(*contents),
                    None => binary(*contents, 16),
                };
                format!("({address:04X}) {contents:04X}  {bits}")
            }
            Some(ObjectRecord::End { .. }) | None => String::new(),
        };
        let text = r.source.as_ref().map_or("", |s| s.text.as_str());
        if left.is_empty() && r.source.is_none() {
            continue;
        }
        writeln!(out, "{left:<width$}  ({n})  {text}", width = LISTING_COLUMN).unwrap();
        n += 1;
    }
    out
}
