// Symbol table, literal pool and the module's external/entry declarations.

use std::collections::HashMap;

use rusty3903::prelude::*;

/// `Symbol` is a defined name. Values are kept signed so an `.EQU` to a
/// negative constant can still be used as an immediate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Symbol {
    /// The value of the symbol.
    pub value: i32,
    /// Whether the value is an offset into this segment.
    pub relocatable: bool,
}

/// `SymbolTable` maps names to their definitions. There is no removal and
/// `put` refuses to replace an existing entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// `put` defines a name. Returns false (and changes nothing) if the
    /// name already exists.
    pub fn put(&mut self, name: &str, value: i32, relocatable: bool) -> bool {
        if self.symbols.contains_key(name) {
            return false;
        }
        self.symbols
            .insert(name.to_string(), Symbol { value, relocatable });
        true
    }

    /// `get` looks a name up.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    /// `has` reports whether the name is defined.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// `is_relocatable` reports whether the name is defined and relocatable.
    #[must_use]
    pub fn is_relocatable(&self, name: &str) -> bool {
        self.symbols.get(name).is_some_and(|s| s.relocatable)
    }

    /// `len` returns the number of defined symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// `is_empty` is true if nothing is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// `sorted` returns every symbol ordered by name.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, Symbol)> {
        let mut v: Vec<_> = self
            .symbols
            .iter()
            .map(|(k, s)| (k.as_str(), *s))
            .collect();
        v.sort_by(|a, b| a.0.cmp(b.0));
        v
    }
}

/// `Literal` is one `=value` operand. `text` is the spelling it was written
/// with and is the lookup key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal {
    /// Source spelling, i.e. `=x10`.
    pub text: String,
    /// The 16 bit value stored in the pool.
    pub value: u16,
    /// Where the value lives once the pool is placed.
    pub address: Option<u16>,
}

/// `LiteralPool` keeps literals in first seen order. That order decides
/// their memory layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiteralPool {
    literals: Vec<Literal>,
}

impl LiteralPool {
    /// `put` adds a literal. The value keeps only its low 16 bits. Repeats
    /// of a spelling already in the pool are ignored. Returns false if the
    /// text isn't a constant at all.
    pub fn put(&mut self, text: &str) -> bool {
        let Some(val) = parse_constant(text) else {
            return false;
        };
        if !self.has(text) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let value = val as u16;
            self.literals.push(Literal {
                text: text.to_string(),
                value,
                address: None,
            });
        }
        true
    }

    /// `has` reports whether the spelling is in the pool.
    #[must_use]
    pub fn has(&self, text: &str) -> bool {
        self.literals.iter().any(|l| l.text == text)
    }

    /// `value` returns the stored value for a spelling.
    #[must_use]
    pub fn value(&self, text: &str) -> Option<u16> {
        self.find(text).map(|l| l.value)
    }

    /// `address` returns where the literal was placed, if it has been.
    #[must_use]
    pub fn address(&self, text: &str) -> Option<u16> {
        self.find(text).and_then(|l| l.address)
    }

    /// `set_address` places one literal.
    pub fn set_address(&mut self, text: &str, addr: u16) -> bool {
        match self.literals.iter_mut().find(|l| l.text == text) {
            Some(l) => {
                l.address = Some(addr);
                true
            }
            None => false,
        }
    }

    /// `place` lays every literal out contiguously from `start` in first
    /// seen order.
    pub fn place(&mut self, start: u16) {
        let mut addr = start;
        for l in &mut self.literals {
            l.address = Some(addr);
            addr = addr.wrapping_add(1);
        }
    }

    /// `all` returns the literals in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Literal] {
        &self.literals
    }

    /// `len` returns the number of literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// `is_empty` is true if there are no literals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    fn find(&self, text: &str) -> Option<&Literal> {
        self.literals.iter().find(|l| l.text == text)
    }
}

/// `Linkage` holds the `.EXT` and `.ENT` declarations in declaration order.
/// A name is never in both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Linkage {
    externals: Vec<String>,
    entries: Vec<String>,
}

impl Linkage {
    /// `add_external` declares an imported name. Returns false if it's
    /// already an entry.
    pub fn add_external(&mut self, name: &str) -> bool {
        Self::add(&mut self.externals, &self.entries, name)
    }

    /// `add_entry` declares an exported name. Returns false if it's
    /// already external.
    pub fn add_entry(&mut self, name: &str) -> bool {
        Self::add(&mut self.entries, &self.externals, name)
    }

    /// `is_external` reports whether the name was declared with `.EXT`.
    #[must_use]
    pub fn is_external(&self, name: &str) -> bool {
        self.externals.iter().any(|n| n == name)
    }

    /// `is_entry` reports whether the name was declared with `.ENT`.
    #[must_use]
    pub fn is_entry(&self, name: &str) -> bool {
        self.entries.iter().any(|n| n == name)
    }

    /// `externals` returns the imported names.
    #[must_use]
    pub fn externals(&self) -> &[String] {
        &self.externals
    }

    /// `entries` returns the exported names.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    fn add(set: &mut Vec<String>, other: &[String], name: &str) -> bool {
        if other.iter().any(|n| n == name) {
            return false;
        }
        if !set.iter().any(|n| n == name) {
            set.push(name.to_string());
        }
        true
    }
}
