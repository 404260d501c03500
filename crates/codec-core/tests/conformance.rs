//! Encode/decode conformance against the built-in MIPS32 table.

#![allow(clippy::pedantic, clippy::nursery)]

use codec_core::{decode_one, encode_one, Codec, CodecError, ErrorKind, Mode, WORD_BITS};
use log as _;
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

fn builtin() -> &'static Codec {
    Codec::builtin().expect("built-in table loads")
}

/// Vectors published for the earlier three-shape encoder. The generic
/// table must reproduce them bit for bit.
#[rstest]
#[case::lui("lui r1,100", "00111100000000010000000001100100")]
#[case::add("add r1,r2,r3", "00000000010000110000100000100000")]
#[case::sll("sll r1,r2,10", "00000000000000100000101010000000")]
#[case::sllv("sllv r1,r2,r3", "00000000011000100000100000000100")]
#[case::jr("jr r31", "00000011111000000000000000001000")]
#[case::addi("addi r1,r2,100", "00100000010000010000000001100100")]
#[case::lw("lw r1,10(r2)", "10001100010000010000000000001010")]
#[case::j("j 10000", "00001000000000000010011100010000")]
fn legacy_vectors(#[case] text: &str, #[case] word: &str) {
    assert_eq!(encode_one(text).as_deref(), Ok(word));
}

#[rstest]
#[case("add r1, r2, r3", "ADD r1, r2, r3")]
#[case("sll r1,r2,10", "SLL r1, r2, 10")]
#[case("srav r4,r5,r6", "SRAV r4, r5, r6")]
#[case("jr r31", "JR r31")]
#[case("jalr r31,r4", "JALR r31, r4")]
#[case("addi r1,r2,-100", "ADDI r1, r2, -100")]
#[case("lui r1,100", "LUI r1, 100")]
#[case("sw r5,-4(r29)", "SW r5, -4(29)")]
#[case("lw r1,10(2)", "LW r1, 10(2)")]
#[case("beq r1,r2,-1", "BEQ r1, r2, -1")]
#[case("j 10000", "J 10000")]
#[case("mult r3,r4", "MULT r3, r4")]
#[case("mfhi r2", "MFHI r2")]
#[case("syscall", "SYSCALL")]
#[case("add.s f1,f2,f3", "ADD.S f1, f2, f3")]
#[case("div.d f0,f30,f31", "DIV.D f0, f30, f31")]
#[case("mov.s f4,f6", "MOV.S f4, f6")]
#[case("cmp.eq.s f1,f2,f3", "CMP.EQ.S f1, f2, f3")]
#[case("cmp.sogt.d f7,f8,f9", "CMP.SOGT.D f7, f8, f9")]
#[case("mfc1 r1,f2", "MFC1 r1, f2")]
fn round_trip_renders_canonical_text(#[case] text: &str, #[case] rendered: &str) {
    let word = encode_one(text).expect("encodes");
    assert_eq!(word.len(), WORD_BITS);
    assert_eq!(decode_one(&word).as_deref(), Ok(rendered));
}

#[test]
fn case_and_spacing_are_ignored_on_encode() {
    assert_eq!(encode_one("ADD r1,r2,r3"), encode_one("  add   r1 , r2 ,r3  "));
}

#[test]
fn all_zero_word_is_ambiguous() {
    assert_eq!(
        decode_one(&"0".repeat(32)).as_deref(),
        Ok("NOP | SLL r0, r0, 0")
    );
}

#[test]
fn positive_required_field_rejects_zero_on_decode() {
    // jr with rs = r0
    let word = "00000000000000000000000000001000";
    assert_eq!(decode_one(word), Err(CodecError::DecodeMiss));
    assert_eq!(decode_one(word).map_err(|e| e.kind()), Err(ErrorKind::DecodeMiss));
}

#[test]
fn positive_required_field_rejects_zero_on_encode() {
    let error = encode_one("jr r0").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Argument);
}

#[rstest]
#[case::max("addi r1,r2,32767", true)]
#[case::min("addi r1,r2,-32768", true)]
#[case::above("addi r1,r2,32768", false)]
#[case::below("addi r1,r2,-32769", false)]
#[case::register_max("add r31,r31,r31", true)]
#[case::register_above("add r32,r1,r1", false)]
fn range_boundaries(#[case] text: &str, #[case] accepted: bool) {
    assert_eq!(encode_one(text).is_ok(), accepted, "{text}");
}

#[rstest]
#[case::unknown_mnemonic("frob r1", ErrorKind::Argument)]
#[case::wrong_count("add r1,r2", ErrorKind::Argument)]
#[case::wrong_register_file("add f1,r2,r3", ErrorKind::Argument)]
#[case::not_an_integer("addi r1,r2,ten", ErrorKind::Argument)]
#[case::no_base("lw r1,10", ErrorKind::Argument)]
#[case::unknown_fmt("add.q f1,f2,f3", ErrorKind::Argument)]
#[case::unknown_condn("cmp.xx.s f1,f2,f3", ErrorKind::Argument)]
fn encode_errors_classify(#[case] text: &str, #[case] kind: ErrorKind) {
    assert_eq!(encode_one(text).map_err(|e| e.kind()), Err(kind));
}

#[rstest]
#[case::short("0101", ErrorKind::Format)]
#[case::bad_digit("0000000000000000000000000000002", ErrorKind::Format)]
#[case::unknown_opcode("11111100000000000000000000000000", ErrorKind::DecodeMiss)]
#[case::unknown_funct("00000000000000000000000000111111", ErrorKind::DecodeMiss)]
fn decode_errors_classify(#[case] word: &str, #[case] kind: ErrorKind) {
    assert_eq!(decode_one(word).map_err(|e| e.kind()), Err(kind));
}

#[test]
fn computed_fields_encode_and_decode_reports_unsupported() {
    let lsa = encode_one("lsa r1,r2,r3,2").expect("encodes");
    assert_eq!(lsa, "00000000010000110000100001000101");
    assert_eq!(
        decode_one(&lsa).map_err(|e| e.kind()),
        Err(ErrorKind::Unsupported)
    );

    let bc = encode_one("bc 16").expect("encodes");
    assert_eq!(bc, "11001000000000000000000000000100");
    assert_eq!(
        decode_one(&bc).map_err(|e| e.kind()),
        Err(ErrorKind::Unsupported)
    );
}

#[test]
fn every_table_entry_spans_one_word() {
    for instruction in builtin().table() {
        let width: usize = instruction.fields().iter().map(|f| f.width()).sum();
        assert_eq!(width, WORD_BITS, "{}", instruction.name());
        assert!(!instruction.opcode().is_empty());
    }
}

#[test]
fn batch_keeps_one_output_line_per_input_line() {
    let input = "add r1,r2,r3\nlw r1 10\nj 10000\nlui r1,100";
    let report = builtin().run_batch(Mode::Encode, input);
    let rendered = report.render();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "00000000010000110000100000100000");
    assert!(lines[1].contains("offset(base)"), "{}", lines[1]);
    assert_eq!(lines[3], "00111100000000010000000001100100");
    assert_eq!(report.failures().count(), 1);
}

#[test]
fn decode_batch_round_trips_encode_batch() {
    let input = "add r1,r2,r3\nsw r5,-4(r29)\ncmp.lt.d f1,f2,f3";
    let words = builtin().run_batch(Mode::Encode, input).render();
    let text = builtin().run_batch(Mode::Decode, &words).render();
    assert_eq!(text, "ADD r1, r2, r3\nSW r5, -4(29)\nCMP.LT.D f1, f2, f3");
}
