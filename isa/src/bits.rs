// Bit and value helpers shared by the descriptor tables and the assembler.
//
// All machine values are 16 bits wide. Operands are carried around as i32
// so negative decimal constants keep their sign until they are range checked
// against the field they are headed for.

/// Number of bits in a page offset. A page is 512 words.
pub const PAGE_BITS: u32 = 9;

/// `mask` returns a value with the low `width` bits set.
#[must_use]
pub const fn mask(width: u32) -> u16 {
    if width >= 16 {
        0xFFFF
    } else {
        (1 << width) - 1
    }
}

/// `bit_range` extracts bits `[start, end)` of `val` as a right aligned value.
#[must_use]
pub const fn bit_range(val: u16, start: u32, end: u32) -> u16 {
    (val >> start) & mask(end - start)
}

/// `sign_extend` treats the low `width` bits of `val` as a two's complement
/// number and widens it to 16 bits.
#[must_use]
pub const fn sign_extend(val: u16, width: u32) -> i16 {
    let shift = 16 - width;
    #[allow(clippy::cast_possible_wrap)]
    let v = (val << shift) as i16;
    v >> shift
}

/// `page` returns bits 9-15 of an address.
#[must_use]
pub const fn page(addr: u16) -> u16 {
    addr >> PAGE_BITS
}

/// `split_address` splits an address into its (page, offset) halves.
#[must_use]
pub const fn split_address(addr: u16) -> (u16, u16) {
    (page(addr), addr & mask(PAGE_BITS))
}

/// `is_hex` reports whether the token is an `x` prefixed hex string using
/// digits and uppercase A-F. Length isn't checked.
#[must_use]
pub fn is_hex(tok: &str) -> bool {
    match tok.strip_prefix('x') {
        Some(digits) => {
            !digits.is_empty()
                && digits
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
        }
        None => false,
    }
}

/// `parse_hex16` parses an `x` prefixed hex string of at most 4 digits.
#[must_use]
pub fn parse_hex16(tok: &str) -> Option<u16> {
    if !is_hex(tok) || tok.len() > 5 {
        return None;
    }
    u16::from_str_radix(&tok[1..], 16).ok()
}

/// `is_decimal` reports whether the token is a `#` prefixed, optionally signed,
/// decimal string.
#[must_use]
pub fn is_decimal(tok: &str) -> bool {
    match tok.strip_prefix('#') {
        Some(rest) => {
            let digits = rest.strip_prefix(&['-', '+'][..]).unwrap_or(rest);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// `is_constant` reports whether the token is a hex or decimal constant,
/// optionally written as a `=` literal.
#[must_use]
pub fn is_constant(tok: &str) -> bool {
    let tok = tok.strip_prefix('=').unwrap_or(tok);
    is_hex(tok) || is_decimal(tok)
}

/// `parse_constant` returns the value of a hex or decimal constant (an
/// optional leading `=` is ignored). Values which don't fit an i32 return None.
#[must_use]
pub fn parse_constant(tok: &str) -> Option<i32> {
    let tok = tok.strip_prefix('=').unwrap_or(tok);
    if is_hex(tok) {
        u32::from_str_radix(&tok[1..], 16)
            .ok()
            .and_then(|v| i32::try_from(v).ok())
    } else if is_decimal(tok) {
        tok[1..].parse::<i32>().ok()
    } else {
        None
    }
}

/// `parse_constant16` is `parse_constant` limited to 16 bit quantities:
/// hex of at most 4 digits or decimal in `[-32768, 32767]`.
#[must_use]
pub fn parse_constant16(tok: &str) -> Option<i32> {
    let tok = tok.strip_prefix('=').unwrap_or(tok);
    if is_hex(tok) {
        parse_hex16(tok).map(i32::from)
    } else {
        parse_constant(tok).filter(|v| i16::try_from(*v).is_ok())
    }
}

/// `binary` renders the low `width` bits of `val` most significant bit first.
#[must_use]
pub fn binary(val: u16, width: u32) -> String {
    (0..width)
        .rev()
        .map(|b| if val & (1 << b) == 0 { '0' } else { '1' })
        .collect()
}
