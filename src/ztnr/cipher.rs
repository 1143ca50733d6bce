//! ZTNR substitution cipher.
//!
//! Every record carries its own alphabet, padded with filler characters, and a
//! digit string in which each output character is a two-digit index into that
//! alphabet, interleaved with filler digits. Both transforms are pure.

/// Skip count before the first units digit of the ciphertext. Fixed by the
/// obfuscation scheme, it does not follow the per-character cadence.
const INITIAL_URL_SKIP: u32 = 3;

/// Recovers the lookup alphabet: keep one character, then drop 1, 2, 3, 0, 1,
/// ... characters, cycling through 0..4.
pub fn alphabet(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() / 2);
    let mut j = 0u32;
    let mut k = 0u32;

    for c in raw.chars() {
        if k > 0 {
            k -= 1;
        } else {
            out.push(c);
            j = (j + 1) % 4;
            k = j;
        }
    }
    out
}

/// Rebuilds the plaintext from `ciphertext` using an alphabet already passed
/// through [`alphabet`].
///
/// Misaligned input degrades to a shorter string: characters that are not
/// ASCII digits are ignored and indices past the end of the alphabet emit
/// nothing.
pub fn reconstruct(ciphertext: &str, alphabet: &str) -> String {
    let table: Vec<char> = alphabet.chars().collect();
    let mut out = String::with_capacity(ciphertext.len() / 3);

    let mut tens_pending = false;
    let mut n = 0usize;
    let mut k = INITIAL_URL_SKIP;
    let mut cont = 0u32;

    for digit in ciphertext.chars().filter_map(|c| c.to_digit(10)) {
        if !tens_pending {
            n = digit as usize * 10;
            tens_pending = true;
        } else if k > 0 {
            k -= 1;
        } else {
            if let Some(&c) = table.get(n + digit as usize) {
                out.push(c);
            }
            tens_pending = false;
            k = cont % 4;
            cont += 1;
        }
    }
    out
}

/// Both transforms composed: the raw alphabet of a record and its ciphertext.
pub fn decipher(alphabet_raw: &str, ciphertext: &str) -> String {
    reconstruct(ciphertext, &alphabet(alphabet_raw))
}
