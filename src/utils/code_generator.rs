use rand::Rng;
use std::collections::HashSet;

/// Card alphabet without look-alike characters (0/O, 1/I).
const CARD_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a single recharge card code of `len` characters.
pub fn generate_card_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CARD_ALPHABET[rng.gen_range(0..CARD_ALPHABET.len())] as char)
        .collect()
}

/// Generate `count` distinct codes, none of which appear in `taken`.
pub fn generate_card_codes(count: usize, len: usize, taken: &HashSet<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(count);
    let mut codes = Vec::with_capacity(count);
    while codes.len() < count {
        let code = generate_card_code(len);
        if taken.contains(&code) || !seen.insert(code.clone()) {
            continue;
        }
        codes.push(code);
    }
    codes
}

/// Normalize user input: trim, drop separators, upper-case.
pub fn normalize_card_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Group a code as XXXX-XXXX-XXXX for display.
pub fn format_card_code(code: &str) -> String {
    code.as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("-")
}
