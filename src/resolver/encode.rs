// src/resolver/encode.rs
// =============================================================================
// This module turns a number into a short-link token and back again.
//
// Tokens are written in base 62 using the alphabet 0-9, A-Z, a-z.
// Digits are read most-significant first, just like decimal numbers:
//   0  -> "0"
//   61 -> "z"
//   62 -> "10"
//
// There is no zero padding, so small indices give short tokens.
//
// Rust concepts:
// - const: Compile-time constants
// - Option<T>: Returning "no value" when a token can't be decoded
// - checked arithmetic: Detecting overflow instead of wrapping silently
// =============================================================================

/// The 62 characters a token may contain, in digit order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u64 = ALPHABET.len() as u64;

// Encodes an index into its canonical token
//
// We pull digits off the low end (index % 62), which gives them to us
// least-significant first, then reverse the buffer at the end.
//
// Index 0 never enters the loop, so it is handled up front and maps to "0".
pub fn encode_id(mut index: u64) -> String {
    if index == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    // u64::MAX is 11 digits in base 62
    let mut digits = Vec::with_capacity(11);
    while index > 0 {
        digits.push(ALPHABET[(index % BASE) as usize]);
        index /= BASE;
    }
    digits.reverse();

    // Every byte comes from ALPHABET, which is plain ASCII
    digits.into_iter().map(char::from).collect()
}

/// Decodes a token produced by [`encode_id`].
///
/// Returns `None` for an empty token, a character outside [`ALPHABET`], or a
/// value that does not fit in a `u64`.
pub fn decode_id(token: &str) -> Option<u64> {
    if token.is_empty() {
        return None;
    }

    token.bytes().try_fold(0u64, |acc, byte| {
        let digit = digit_value(byte)?;
        acc.checked_mul(BASE)?.checked_add(digit)
    })
}

fn digit_value(byte: u8) -> Option<u64> {
    match byte {
        b'0'..=b'9' => Some((byte - b'0') as u64),
        b'A'..=b'Z' => Some((byte - b'A') as u64 + 10),
        b'a'..=b'z' => Some((byte - b'a') as u64 + 36),
        _ => None,
    }
}
