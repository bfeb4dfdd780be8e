//! `assemble` turns 3903 assembly source into object records ready for
//! the linker, plus a listing.
//!
//! Assembly is two passes. Pass 1 assigns addresses and builds the symbol
//! table and literal pool. Pass 2 resolves operands against those finished
//! tables and encodes each line. Both passes keep going after an error so
//! a single run reports as much as possible; nothing is emitted unless the
//! whole module is clean.

use color_eyre::eyre::{eyre, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::info;

mod diagnostics;
mod intermediate;
mod pass1;
mod pass2;
mod records;
mod tables;
mod tokenize;

pub use diagnostics::{Category, Diagnostic, Diagnostics, Kind};
pub use intermediate::{read as read_intermediate, CodeLine, Intermediate, Program, Segment};
pub use pass1::pass1;
pub use pass2::pass2;
pub use records::{
    listing, object_file, ObjectRecord, Record, Relocation, RelocationKind, Source,
};
pub use tables::{Linkage, Literal, LiteralPool, Symbol, SymbolTable};
pub use tokenize::{strip_comment, tokenize, Tokens};

#[cfg(test)]
mod tests;

/// Assembly defines the output from a successful assemble.
#[derive(Debug)]
pub struct Assembly {
    /// What pass 1 produced. Useful for dumping the intermediate form.
    pub program: Program,
    /// Every record in emission order.
    pub records: Vec<Record>,
    /// The object file text.
    pub object: String,
    /// A listing file of the translated input.
    pub listing: String,
    /// Warnings found along the way. Never contains errors.
    pub warnings: Diagnostics,
}

/// `assemble` runs both passes over the given source lines.
///
/// # Errors
/// If anything other than a warning was found the full diagnostic log is
/// returned and no output is produced.
pub fn assemble<I, S>(source: I) -> std::result::Result<Assembly, Diagnostics>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut diags = Diagnostics::new();
    let Some(program) = pass1(source, &mut diags) else {
        return Err(diags);
    };
    let Some(records) = pass2(&program, &mut diags) else {
        return Err(diags);
    };
    let object = object_file(&records);
    let listing = listing(&records);
    info!(
        segment = %program.segment.name,
        records = records.len(),
        warnings = diags.len(),
        "assembled"
    );
    Ok(Assembly {
        program,
        records,
        object,
        listing,
        warnings: diags,
    })
}

/// `parse` will take the given lines and assemble them.
///
/// # Errors
/// Any I/O error reading the lines is returned immediately. Assembly
/// problems come back as the rendered diagnostic log.
pub fn parse<B: BufRead>(lines: Lines<B>) -> Result<Assembly> {
    let source = lines.collect::<std::io::Result<Vec<_>>>()?;
    Ok(assemble(source)?)
}

/// `parse_file` will take the given filename, read it and assemble it.
///
/// # Errors
/// The file can't be read or any assembly error.
pub fn parse_file(filename: &Path) -> Result<Assembly> {
    let file = File::open(filename)
        .map_err(|e| eyre!("Error opening {}: {e}", filename.display()))?;
    parse(BufReader::new(file).lines())
}
