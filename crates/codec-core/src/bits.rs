//! Conversions between integers and fixed-width bit strings.
//!
//! Bit strings are ASCII `0`/`1` text, most significant bit first, exactly as
//! they appear in encoder output.

/// Width of every instruction word.
pub const WORD_BITS: usize = 32;

/// Inclusive signed range representable in `width` bits.
#[must_use]
pub const fn signed_range(width: usize) -> (i64, i64) {
    if width == 0 {
        return (0, 0);
    }
    let half = 1i64 << (width - 1);
    (-half, half - 1)
}

/// Largest unsigned value representable in `width` bits.
#[must_use]
pub const fn unsigned_max(width: usize) -> i64 {
    (1i64 << width) - 1
}

/// Renders the low `width` bits of `value`, two's complement for negatives.
///
/// The caller is responsible for range checks.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn to_bits(value: i64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mask = if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    };
    format!("{:0width$b}", (value as u64) & mask)
}

/// Encodes `value` as two's complement if it lies in the signed range.
#[must_use]
pub fn signed_to_bits(value: i64, width: usize) -> Option<String> {
    let (min, max) = signed_range(width);
    (min..=max).contains(&value).then(|| to_bits(value, width))
}

/// Encodes `value` as unsigned if it fits in `width` bits.
#[must_use]
pub fn unsigned_to_bits(value: i64, width: usize) -> Option<String> {
    (0..=unsigned_max(width))
        .contains(&value)
        .then(|| to_bits(value, width))
}

/// Reads a bit string as an unsigned integer.
///
/// Empty input reads as zero; non-binary characters are ignored by callers
/// having validated the word up front.
#[must_use]
pub fn bits_to_unsigned(bits: &str) -> i64 {
    bits.bytes()
        .fold(0i64, |acc, bit| (acc << 1) | i64::from(bit == b'1'))
}

/// Reads a bit string as a two's-complement signed integer.
#[must_use]
pub fn bits_to_signed(bits: &str) -> i64 {
    let raw = bits_to_unsigned(bits);
    if bits.starts_with('1') {
        raw - (1i64 << bits.len())
    } else {
        raw
    }
}

/// Returns true if `text` is a full instruction word of `0`/`1`.
#[must_use]
pub fn is_word(text: &str) -> bool {
    text.len() == WORD_BITS && text.bytes().all(|b| b == b'0' || b == b'1')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_range_matches_width() {
        assert_eq!(signed_range(5), (-16, 15));
        assert_eq!(signed_range(16), (-32768, 32767));
        assert_eq!(signed_range(32), (-2_147_483_648, 2_147_483_647));
    }

    #[test]
    fn negative_values_use_twos_complement() {
        assert_eq!(signed_to_bits(-1, 5).as_deref(), Some("11111"));
        assert_eq!(signed_to_bits(-16, 5).as_deref(), Some("10000"));
        assert_eq!(signed_to_bits(15, 5).as_deref(), Some("01111"));
        assert_eq!(signed_to_bits(16, 5), None);
        assert_eq!(signed_to_bits(-17, 5), None);
    }

    #[test]
    fn unsigned_encoding_rejects_overflow_and_negatives() {
        assert_eq!(unsigned_to_bits(31, 5).as_deref(), Some("11111"));
        assert_eq!(unsigned_to_bits(32, 5), None);
        assert_eq!(unsigned_to_bits(-1, 5), None);
    }

    #[test]
    fn reading_back_bits() {
        assert_eq!(bits_to_unsigned("01010"), 10);
        assert_eq!(bits_to_signed("11111"), -1);
        assert_eq!(bits_to_signed("10000"), -16);
        assert_eq!(bits_to_signed("01111"), 15);
        assert_eq!(bits_to_unsigned(""), 0);
    }

    #[test]
    fn word_validation() {
        assert!(is_word(&"0".repeat(32)));
        assert!(!is_word(&"0".repeat(31)));
        assert!(!is_word(&format!("{}2", "0".repeat(31))));
    }
}
