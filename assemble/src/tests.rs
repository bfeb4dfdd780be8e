use std::{
    error::Error,
    fs::{read_to_string, File},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use crate::{
    assemble, parse, parse_file, pass1, read_intermediate, tokenize, Diagnostic, Diagnostics,
    Kind, Linkage, ObjectRecord, SymbolTable, Tokens,
};

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../testdata/")
        .join(name)
}

// Text of every object record whose address falls in [lo, hi).
fn text_between(object: &str, lo: u16, hi: u16) -> Vec<&str> {
    object
        .lines()
        .filter(|l| l.starts_with('T'))
        .filter(|l| u16::from_str_radix(&l[1..5], 16).is_ok_and(|a| a >= lo && a < hi))
        .collect()
}

struct AssembleTest<'a> {
    asm: &'a str,
    obj: &'a str,
    warnings: usize,
}

macro_rules! assemble_test {
    ($suite:ident, $($name:ident: $assemble_test:expr)*) => {
        mod $suite {
            use super::*;

            $(
                #[test]
                fn $name() -> Result<(), Box<dyn Error>> {
                    let a = $assemble_test;

                    let file = File::open(testdata(a.asm))?;
                    let res = parse(BufReader::new(file).lines())?;
                    let want = read_to_string(testdata(a.obj))?;

                    assert!(res.object == want, "object differs\ngot:\n{}\nwant:\n{want}", res.object);
                    assert!(res.warnings.len() == a.warnings, "warnings: {}", res.warnings);
                    Ok(())
                }
            )*
        }
    }
}

assemble_test!(
    assemble_tests,
    absolute: AssembleTest{
        asm: "absolute.asm",
        obj: "absolute.obj",
        warnings: 0,
    }
    relocatable: AssembleTest{
        asm: "relocatable.asm",
        obj: "relocatable.obj",
        warnings: 0,
    }
);

struct BadAssembleTest<'a> {
    asm: &'a str,
    kind: Kind,
    count: usize,
}

macro_rules! bad_assemble_test {
    ($suite:ident, $($name:ident: $bad_assemble_test:expr)*) => {
        mod $suite {
            use super::*;

            $(
                #[test]
                fn $name() -> Result<(), Box<dyn Error>> {
                    let b = $bad_assemble_test;

                    let file = File::open(testdata("badasm/").join(b.asm))?;
                    let Err(e) = parse(BufReader::new(file).lines()) else {
                        panic!("{} assembled when it shouldn't", b.asm);
                    };
                    let diags = e.downcast_ref::<Diagnostics>().expect("diagnostics");
                    assert!(diags.count(b.kind) == b.count, "wanted {} x {:?}, got:\n{diags}", b.count, b.kind);
                    assert!(e.to_string().contains(b.kind.name()), "missing {} in:\n{e}", b.kind.name());
                    Ok(())
                }
            )*
        }
    }
}

bad_assemble_test!(
    bad_assemble_tests,
    no_orig: BadAssembleTest{
        asm: "no_orig.asm",
        kind: Kind::OriginNotFirst,
        count: 1,
    }
    no_end: BadAssembleTest{
        asm: "no_end.asm",
        kind: Kind::EndNotFound,
        count: 1,
    }
    undefined_symbol: BadAssembleTest{
        asm: "undefined_symbol.asm",
        kind: Kind::EmptySymbol,
        count: 1,
    }
    cross_page: BadAssembleTest{
        asm: "cross_page.asm",
        kind: Kind::CrossPageReference,
        count: 1,
    }
    both_ext_ent: BadAssembleTest{
        asm: "both_ext_ent.asm",
        kind: Kind::BothExtEnt,
        count: 1,
    }
    duplicate_label: BadAssembleTest{
        asm: "duplicate_label.asm",
        kind: Kind::MultipleSymbolDefinition,
        count: 1,
    }
);

// Each source is wrapped so only the line under test is wrong.
macro_rules! diagnostic_test {
    ($suite:ident, $($name:ident: $source:expr, $kind:expr,)*) => {
        mod $suite {
            use super::*;

            $(
                #[test]
                fn $name() {
                    let source: &str = $source;
                    let Err(diags) = assemble(source.lines()) else {
                        panic!("assembled when it shouldn't:\n{source}");
                    };
                    assert!(diags.count($kind) >= 1, "wanted {:?}, got:\n{diags}", $kind);
                }
            )*
        }
    }
}

diagnostic_test!(
    diagnostic_tests,
    label_starts_with_register: "P .ORIG x3000\nRLOOP ADD R0,R0,R0\n .END", Kind::ParserLabelInvalidCharacter,
    label_starts_with_hex: "P .ORIG x3000\nxAB ADD R0,R0,R0\n .END", Kind::ParserLabelInvalidCharacter,
    label_too_long: "P .ORIG x3000\nTOOLONG .FILL #0\n .END", Kind::ParserInvalidLabelLength,
    label_not_alphanumeric: "P .ORIG x3000\nA_B .FILL #0\n .END", Kind::ParserNonAlphanumericLabel,
    operation_too_long: "P .ORIG x3000\n ADDRES R0\n .END", Kind::ParserInvalidOperationLength,
    unterminated_string: "P .ORIG x3000\n .STRZ \"abc\n .END", Kind::ParserUnterminatedString,
    bad_first_line: "RX .ORIG x3000\n .END", Kind::OriginNotFound,
    orig_no_label: " .ORIG x3000\n .END", Kind::OriginNoLabel,
    orig_bad_operand: "P .ORIG x10000\n .END", Kind::OriginInvalidHexOperand,
    orig_decimal_operand: "P .ORIG #100\n .END", Kind::OriginInvalidHexOperand,
    empty_source: "; nothing here\n\n", Kind::OriginNotFound,
    end_with_label: "P .ORIG x3000\nE .END", Kind::EndHasLabel,
    end_forward: "P .ORIG x3000\n .END LATER\nLATER .FILL #0", Kind::EndForwardReferencing,
    end_bad_hex: "P .ORIG x3000\n .END x12345", Kind::EndInvalidHexOperand,
    blkw_forward: "P .ORIG x3000\n .BLKW N\nN .EQU #3\n .END", Kind::BlkwForwardReferencing,
    blkw_relocatable: "P .ORIG x3000\nL .FILL #0\n .BLKW L\n .END", Kind::BlkwRelSymbol,
    blkw_zero: "P .ORIG x3000\n .BLKW #0\n .END", Kind::BlkwInvalidOperandRange,
    blkw_negative_symbol: "P .ORIG x3000\nN .EQU #-2\n .BLKW N\n .END", Kind::BlkwInvalidOperandRange,
    equ_forward: "P .ORIG x3000\nA .EQU B\nB .EQU #1\n .END", Kind::EquForwardReferencing,
    equ_range: "P .ORIG x3000\nA .EQU #40000\n .END", Kind::EquInvalidConstOperandRange,
    equ_no_label: "P .ORIG x3000\n .EQU #1\n .END", Kind::EquNoLabel,
    literal_not_ld: "P .ORIG x3000\n ST R0,=x5\n .END", Kind::LiteralNotLdInstr,
    literal_range: "P .ORIG x3000\n LD R0,=#40000\n .END", Kind::LiteralInvalidOperandRange,
    strz_unquoted: "P .ORIG x3000\n .STRZ abc\n .END", Kind::InvalidStrzOperand,
    unknown_instruction: "P .ORIG x3000\n FOO R0\n .END", Kind::InvalidInstruction,
    lower_case_instruction: "P .ORIG x3000\n add R0,R0,R0\n .END", Kind::InvalidInstruction,
    ext_with_label: "P .ORIG\nL .EXT FOO\n .END", Kind::ExtEntLabel,
    ent_without_operand: "P .ORIG\n .ENT\n .END", Kind::ExtEntNoOperand,
    ext_after_code: "P .ORIG\n ADD R0,R0,R0\n .EXT FOO\n .END", Kind::ExtEntFollowsInstr,
    ent_undefined: "P .ORIG\n .ENT MISSING\n .END", Kind::EntUndefined,
    ext_defined_here: "P .ORIG\n .EXT FOO\nFOO .FILL #0\n .END", Kind::ExtDefinedInFile,
    imm5_too_big: "P .ORIG x3000\n ADD R0,R0,#16\n .END", Kind::Imm5ValWrong,
    imm5_too_small: "P .ORIG x3000\n AND R0,R0,#-17\n .END", Kind::Imm5ValWrong,
    register_too_big: "P .ORIG x3000\n ADD R0,R8,R1\n .END", Kind::RegValWrong,
    index6_too_big: "P .ORIG x3000\n LDR R0,R1,#64\n .END", Kind::Index6ValWrong,
    trap_too_big: "P .ORIG x3000\n TRAP x100\n .END", Kind::TrapVecWrong,
    fill_too_big: "P .ORIG x3000\n .FILL #70000\n .END", Kind::HexValWrong,
    too_few_operands: "P .ORIG x3000\n ADD R0,R1\n .END", Kind::IncorrectOperandNumber,
    too_many_operands: "P .ORIG x3000\n RET R7\n .END", Kind::IncorrectOperandNumber,
    fill_extra_operand: "P .ORIG x3000\n .FILL #1,#2\n .END", Kind::IncorrectOperandNumber,
    constant_for_register: "P .ORIG x3000\n NOT R0,#1\n .END", Kind::InvalidOperandUsage,
    relocatable_register: "P .ORIG\nX .FILL #0\n ADD R0,X,R1\n .END", Kind::ImproperRelativeSymbol,
    relocatable_immediate: "P .ORIG\nX .FILL #0\n ADD R0,R1,X\n .END", Kind::ImproperRelativeSymbol,
    relocatable_too_big: "P .ORIG\n .BLKW #600\n .END", Kind::RelocatableTooBig,
    out_of_memory: "P .ORIG xFFFF\n .FILL #0\n .FILL #1\n .END", Kind::OutOfMem,
);

#[test]
fn add_immediate_encoding() -> Result<(), Box<dyn Error>> {
    let res = assemble(["PROG .ORIG x3000", "LOOP ADD R0,R1,#3", " .END"])?;
    let text: Vec<_> = res.object.lines().filter(|l| l.starts_with('T')).collect();
    assert!(text == ["T30001063"], "got {text:?}");
    assert!(res.object.starts_with("HPROG  30000001\n"), "{}", res.object);
    assert!(res.object.ends_with("E3000\n"), "{}", res.object);
    Ok(())
}

#[test]
fn blkw_reserves_without_emitting() -> Result<(), Box<dyn Error>> {
    let res = assemble([
        "PROG .ORIG x3000",
        " .BLKW #10",
        " .BLKW #5",
        "X .FILL #7",
        " .END",
    ])?;
    let lcs: Vec<_> = res.program.lines.iter().map(|c| c.lc).collect();
    assert!(lcs == [0, 0, 10, 15, 16], "got {lcs:?}");
    assert!(text_between(&res.object, 0x3000, 0x300F).is_empty(), "{}", res.object);
    assert!(text_between(&res.object, 0x300F, 0x3010) == ["T300F0007"], "{}", res.object);
    Ok(())
}

#[test]
fn blkw_absolute_symbol() -> Result<(), Box<dyn Error>> {
    let res = assemble([
        "P .ORIG x3000",
        "N .EQU #4",
        " .BLKW N",
        "X .FILL #1",
        " .END",
    ])?;
    let lcs: Vec<_> = res.program.lines.iter().map(|c| c.lc).collect();
    assert!(lcs == [0, 0, 0, 4, 5], "got {lcs:?}");
    assert!(res.object.starts_with("HP     30000005\n"), "{}", res.object);
    assert!(text_between(&res.object, 0x3000, 0x4000) == ["T30040001"], "{}", res.object);
    Ok(())
}

#[test]
fn operand_checks_all_reported() {
    let Err(diags) = assemble([
        "P .ORIG x3000",
        "X .FILL #0",
        " ADD R0,R9,X",
        " ADD R0,X,R1",
        " .END",
    ]) else {
        panic!("assembled with bad operands");
    };
    // Line 3: R9 is out of range, X is out of range and relocatable.
    // Line 4: X is out of range for a register and relocatable.
    assert!(diags.count(Kind::RegValWrong) == 2, "{diags}");
    assert!(diags.count(Kind::Imm5ValWrong) == 1, "{diags}");
    assert!(diags.count(Kind::ImproperRelativeSymbol) == 2, "{diags}");
    let lines: Vec<_> = diags
        .iter()
        .filter(|d| d.kind == Kind::ImproperRelativeSymbol)
        .map(|d| d.line)
        .collect();
    assert!(lines == [Some(3), Some(4)], "{diags}");
}

#[test]
fn undefined_symbol_reported_once() {
    let Err(diags) = assemble(["PROG .ORIG x3000", " BR NOWHERE", " .END"]) else {
        panic!("assembled with an undefined symbol");
    };
    assert!(diags.count(Kind::EmptySymbol) == 1, "{diags}");
    assert!(diags.len() == 1, "{diags}");
    let d: Vec<&Diagnostic> = diags.iter().collect();
    assert!(d[0].line == Some(2), "{diags}");
}

#[test]
fn ext_and_ent_same_name() {
    let Err(diags) = assemble(["PROG .ORIG", " .EXT FOO", " .ENT FOO", " .END"]) else {
        panic!("assembled with FOO both imported and exported");
    };
    assert!(diags.count(Kind::BothExtEnt) == 1, "{diags}");
}

#[test]
fn relocatable_store_tag() -> Result<(), Box<dyn Error>> {
    let res = assemble(["PROG .ORIG", " ST R0,LABEL", "LABEL .FILL #0", " .END"])?;
    let text: Vec<_> = res.object.lines().filter(|l| l.starts_with('T')).collect();
    assert!(
        text == ["T00003001_NPROG", "T00010000_APROG"],
        "got {text:?}"
    );
    Ok(())
}

#[test]
fn literal_pool_order() -> Result<(), Box<dyn Error>> {
    let res = assemble([
        "PROG .ORIG x3000",
        " LD R0,=#9",
        " LD R1,=x2",
        " LD R2,=#9",
        " LD R3,=#-1",
        " .END",
    ])?;
    let lits: Vec<_> = res
        .program
        .literals
        .all()
        .iter()
        .map(|l| (l.text.as_str(), l.value, l.address))
        .collect();
    assert!(
        lits == [
            ("=#9", 9, Some(0x3004)),
            ("=x2", 2, Some(0x3005)),
            ("=#-1", 0xFFFF, Some(0x3006)),
        ],
        "got {lits:?}"
    );
    assert!(res.program.segment.length == 7);
    assert!(
        text_between(&res.object, 0x3004, 0x3007) == ["T30040009", "T30050002", "T3006FFFF"],
        "{}",
        res.object
    );
    // Both uses of =#9 point at the same word.
    assert!(text_between(&res.object, 0x3000, 0x3001) == ["T30002004"]);
    assert!(text_between(&res.object, 0x3002, 0x3003) == ["T30022404"]);
    Ok(())
}

#[test]
fn page_boundaries() {
    // Last word of one page to the last word of the same page is fine.
    let same = assemble(["P .ORIG x31FE", " BR T", "T .FILL #0", " .END"]);
    assert!(same.is_ok(), "{:?}", same.err());

    // One word further and the target lands on the next page.
    let Err(diags) = assemble(["P .ORIG x31FF", " BR T", "T .FILL #0", " .END"]) else {
        panic!("crossed a page without complaint");
    };
    assert!(diags.count(Kind::CrossPageReference) == 1, "{diags}");

    // Literals are exempt.
    let lit = assemble(["P .ORIG x31FF", " LD R0,=#1", " .END"]);
    assert!(lit.is_ok(), "{:?}", lit.err());
}

#[test]
fn warnings_do_not_fail() -> Result<(), Box<dyn Error>> {
    let res = assemble(["P .ORIG x3000", " TRAP x20", " .END"])?;
    assert!(res.warnings.count(Kind::UndefinedTrap) == 1, "{}", res.warnings);
    assert!(!res.warnings.has_errors());

    let res = assemble(["P .ORIG", "K .EQU #3", " BR K", " .END"])?;
    assert!(res.warnings.count(Kind::NonRelocatableAddr) == 1, "{}", res.warnings);
    assert!(res.object.contains("T00000003_AP\n"), "{}", res.object);

    let res = assemble(["P .ORIG x3000", " .ENT K", "K .EQU #3", " .END"])?;
    assert!(res.warnings.count(Kind::EntNotRelocatable) == 1, "{}", res.warnings);
    assert!(res.object.contains("NK=x3\n"), "{}", res.object);
    Ok(())
}

#[test]
fn lines_after_end_ignored() -> Result<(), Box<dyn Error>> {
    let res = assemble(["P .ORIG x3000", " RET", " .END", "garbage that won't tokenize R!"])?;
    assert!(res.program.lines.len() == 3);
    Ok(())
}

#[test]
fn end_operand_sets_exec() -> Result<(), Box<dyn Error>> {
    let res = assemble(["P .ORIG x3000", " RET", "GO RET", " .END GO"])?;
    assert!(res.program.segment.exec == 0x3001);
    assert!(res.object.ends_with("E3001\n"), "{}", res.object);

    let res = assemble(["P .ORIG x3000", " RET", " .END x4000"])?;
    assert!(res.object.ends_with("E4000\n"), "{}", res.object);
    Ok(())
}

#[test]
fn strz_listing_once() -> Result<(), Box<dyn Error>> {
    let res = assemble(["P .ORIG x3000", "S .STRZ \"a;b\"", " .END"])?;
    let text: Vec<_> = res.object.lines().filter(|l| l.starts_with('T')).collect();
    assert!(
        text == ["T30000061", "T3001003B", "T30020062", "T30030000"],
        "got {text:?}"
    );
    let listed = res
        .records
        .iter()
        .filter(|r| r.source.as_ref().is_some_and(|s| s.line == 2))
        .count();
    assert!(listed == 1);
    assert!(res.records.iter().filter(|r| r.is_partial()).count() > 0);
    Ok(())
}

#[test]
fn listing_format() -> Result<(), Box<dyn Error>> {
    let res = assemble(["PROG .ORIG x3000", "LOOP ADD R0,R1,#3", " .END"])?;
    let lines: Vec<_> = res.listing.lines().collect();
    assert!(lines.len() == 3, "{}", res.listing);
    assert!(lines[0].ends_with("  (1)  PROG .ORIG x3000"), "{}", lines[0]);
    assert!(
        lines[1].starts_with("(3000) 1063  0001_000_001_1_00011"),
        "{}",
        lines[1]
    );
    assert!(lines[1].ends_with("  (2)  LOOP ADD R0,R1,#3"), "{}", lines[1]);
    assert!(lines[2].ends_with("  (3)   .END"), "{}", lines[2]);
    // The source column starts at the same place on every line.
    let col = lines[0].find("(1)");
    assert!(col == lines[1].find("(2)") && col == lines[2].find("(3)"));
    Ok(())
}

#[test]
fn object_records() {
    let h = ObjectRecord::Header {
        name: "AB".into(),
        load: 0x10,
        length: 0x200,
    };
    assert!(h.to_string() == "HAB    00100200");
    let e = ObjectRecord::Entry {
        name: "MAIN".into(),
        value: 0x3A,
    };
    assert!(e.to_string() == "NMAIN=x3A");
}

#[test]
fn intermediate_round_trip() -> Result<(), Box<dyn Error>> {
    let file = File::open(testdata("relocatable.asm"))?;
    let res = parse(BufReader::new(file).lines())?;
    let text = res.program.render();
    assert!(text.starts_with(":LIB\n:0\n:0\n:true\n:10\nNMAIN=x0\nNMSG=x6\n"), "{text}");
    let back = read_intermediate(&text)?;
    assert!(back == res.program.intermediate());

    assert!(read_intermediate(":A\n:0\n").is_err());
    assert!(read_intermediate(":A\n:0\n:0\n:false\n:1\nbogus\n").is_err());
    Ok(())
}

#[test]
fn pass1_tables() {
    let mut diags = Diagnostics::new();
    let program = pass1(
        [
            "PROG .ORIG x3000",
            "A ADD R0,R0,R0",
            "K .EQU #-5",
            "B .EQU A",
            " .END",
        ],
        &mut diags,
    )
    .expect("pass1");
    assert!(diags.is_empty(), "{diags}");
    let s = &program.symbols;
    assert!(s.get("A").is_some_and(|v| v.value == 0x3000 && v.relocatable));
    assert!(s.get("K").is_some_and(|v| v.value == -5 && !v.relocatable));
    assert!(s.get("B").is_some_and(|v| v.value == 0x3000 && v.relocatable));
    let names: Vec<_> = s.sorted().into_iter().map(|(n, _)| n).collect();
    assert!(names == ["A", "B", "K"]);
}

#[test]
fn symbol_uniqueness() {
    let mut s = SymbolTable::default();
    assert!(s.put("A", 1, false));
    assert!(!s.put("A", 2, true));
    assert!(s.get("A").is_some_and(|v| v.value == 1 && !v.relocatable));
    assert!(s.len() == 1);
}

#[test]
fn linkage_disjoint() {
    let mut l = Linkage::default();
    assert!(l.add_external("FOO"));
    assert!(!l.add_entry("FOO"));
    assert!(l.add_entry("BAR"));
    assert!(!l.add_external("BAR"));
    assert!(l.is_external("FOO") && !l.is_entry("FOO"));
    assert!(l.is_entry("BAR") && !l.is_external("BAR"));
}

#[test]
fn diagnostic_display() {
    let d = Diagnostic {
        kind: Kind::EmptySymbol,
        line: Some(3),
    };
    assert!(
        d.to_string() == "[ LINE 3 ] ERROR: EMPTY_SYMBOL - Attempt to use an undefined symbol",
        "{d}"
    );
    let w = Diagnostic {
        kind: Kind::UndefinedTrap,
        line: None,
    };
    assert!(w.to_string().starts_with("[ LINE - ] WARNING: UNDEFINED_TRAP - "), "{w}");
}

struct TokenizeTest<'a> {
    line: &'a str,
    want: Result<Option<Tokens>, Kind>,
}

fn tokens(label: &str, operation: &str, operands: &[&str]) -> Result<Option<Tokens>, Kind> {
    Ok(Some(Tokens {
        label: label.into(),
        operation: operation.into(),
        operands: operands.iter().map(|s| (*s).to_string()).collect(),
    }))
}

macro_rules! tokenize_test {
    ($suite:ident, $($name:ident: $tokenize_test:expr)*) => {
        mod $suite {
            use super::*;

            $(
                #[test]
                fn $name() {
                    let t = $tokenize_test;
                    let got = tokenize(t.line);
                    assert!(got == t.want, "{:?}: got {got:?} want {:?}", t.line, t.want);
                }
            )*
        }
    }
}

tokenize_test!(
    tokenize_tests,
    blank: TokenizeTest{
        line: "   ",
        want: Ok(None),
    }
    comment: TokenizeTest{
        line: "; just a comment",
        want: Ok(None),
    }
    immediate_add: TokenizeTest{
        line: "LOOP ADD R0,R1,#3 ; bump",
        want: tokens("LOOP", "ADDI", &["R0", "R1", "#3"]),
    }
    register_and: TokenizeTest{
        line: "     AND   R0, R1, R2",
        want: tokens("", "AND", &["R0", "R1", "R2"]),
    }
    symbol_and: TokenizeTest{
        line: " AND R0,R1,MASK",
        want: tokens("", "ANDI", &["R0", "R1", "MASK"]),
    }
    quoted: TokenizeTest{
        line: "MSG .STRZ \"a; b, c\" ; trailing",
        want: tokens("MSG", ".STRZ", &["\"a; b, c\""]),
    }
    label_only: TokenizeTest{
        line: "HERE",
        want: tokens("HERE", "", &[]),
    }
    unterminated: TokenizeTest{
        line: " .STRZ \"abc",
        want: Err(Kind::ParserUnterminatedString),
    }
    register_label: TokenizeTest{
        line: "R1 .FILL #0",
        want: Err(Kind::ParserLabelInvalidCharacter),
    }
    long_label: TokenizeTest{
        line: "ABCDEFG .FILL #0",
        want: Err(Kind::ParserInvalidLabelLength),
    }
    long_operation: TokenizeTest{
        line: " ADDRES R0",
        want: Err(Kind::ParserInvalidOperationLength),
    }
);

#[test]
fn parse_file_from_disk() -> Result<(), Box<dyn Error>> {
    let mut f = tempfile::NamedTempFile::new()?;
    writeln!(f, "PROG .ORIG x3000")?;
    writeln!(f, "     TRAP x25")?;
    writeln!(f, "     .END")?;
    f.flush()?;
    let res = parse_file(f.path())?;
    assert!(res.object == "HPROG  30000001\nT3000F025\nE3000\n", "{}", res.object);

    let missing = f.path().with_extension("missing");
    let Err(e) = parse_file(&missing) else {
        panic!("opened a file that doesn't exist");
    };
    assert!(e.to_string().contains("Error opening"), "{e}");
    Ok(())
}
