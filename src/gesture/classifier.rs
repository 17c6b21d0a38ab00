//! Fixed finger-pattern lookup table.
//!
//! Entries are scanned in priority order (control gestures, letters, digits,
//! mannerisms) and the first exact match wins.  Because the control
//! gestures and the letters come first, several symbols can never be
//! produced by [`classify`]:
//!
//! | Pattern | Wins      | Shadowed                  |
//! |---------|-----------|---------------------------|
//! | `10000` | DELETE    | A, 6, THANK YOU           |
//! | `11111` | FINISH    | O, 5, YES                 |
//! | `11110` | SPACE     | 9                         |
//! | `00000` | E         | S, 0, BAD, NO             |
//! | `01100` | H         | U, V, 2                   |
//! | `11000` | G         | L, 7, HELLO, GOOD         |
//!
//! (Not exhaustive; [`GestureTable::symbols_for`] lists every collision.)
//!
//! This ambiguity is part of the gesture vocabulary, not something the
//! classifier tries to resolve.  Exercise sign checks use a second order,
//! [`recognize_sign`]: letters, digits, mannerisms, and control gestures
//! last, so `10000` is A there and never DELETE.

use std::sync::OnceLock;

use super::fingers::FingerVector;
use super::token::{Control, Token};

// ---------------------------------------------------------------------------
// Pattern tables
// ---------------------------------------------------------------------------

const CONTROL_PATTERNS: [(Control, [u8; 5]); 3] = [
    (Control::Space, [1, 1, 1, 1, 0]),
    (Control::Delete, [1, 0, 0, 0, 0]),
    (Control::Finish, [1, 1, 1, 1, 1]),
];

const LETTER_PATTERNS: [(char, [u8; 5]); 26] = [
    ('A', [1, 0, 0, 0, 0]), // thumb only
    ('B', [0, 1, 1, 1, 1]),
    ('C', [1, 1, 1, 0, 0]),
    ('D', [0, 1, 0, 0, 0]), // index only
    ('E', [0, 0, 0, 0, 0]), // closed fist
    ('F', [1, 0, 1, 1, 1]),
    ('G', [1, 1, 0, 0, 0]),
    ('H', [0, 1, 1, 0, 0]),
    ('I', [0, 0, 0, 0, 1]), // pinky only
    ('J', [0, 0, 0, 1, 0]),
    ('K', [0, 1, 1, 1, 0]),
    ('L', [1, 1, 0, 0, 0]),
    ('M', [1, 0, 1, 0, 1]),
    ('N', [1, 0, 0, 1, 0]),
    ('O', [1, 1, 1, 1, 1]),
    ('P', [1, 1, 1, 0, 1]),
    ('Q', [1, 0, 1, 1, 0]),
    ('R', [0, 1, 1, 0, 1]),
    ('S', [0, 0, 0, 0, 0]),
    ('T', [1, 0, 0, 0, 1]),
    ('U', [0, 1, 1, 0, 0]),
    ('V', [0, 1, 1, 0, 0]),
    ('W', [0, 1, 1, 1, 0]),
    ('X', [0, 1, 0, 1, 0]),
    ('Y', [1, 0, 0, 0, 1]),
    ('Z', [0, 0, 1, 0, 0]),
];

const DIGIT_PATTERNS: [(char, [u8; 5]); 10] = [
    ('0', [0, 0, 0, 0, 0]),
    ('1', [0, 1, 0, 0, 0]),
    ('2', [0, 1, 1, 0, 0]),
    ('3', [0, 1, 1, 1, 0]),
    ('4', [0, 1, 1, 1, 1]),
    ('5', [1, 1, 1, 1, 1]),
    ('6', [1, 0, 0, 0, 0]),
    ('7', [1, 1, 0, 0, 0]),
    ('8', [1, 1, 1, 0, 0]),
    ('9', [1, 1, 1, 1, 0]),
];

const MANNERISM_PATTERNS: [(&str, [u8; 5]); 8] = [
    ("HELLO", [1, 1, 0, 0, 0]),
    ("THANK YOU", [1, 0, 0, 0, 0]),
    ("PLEASE", [1, 1, 1, 0, 0]),
    ("GOOD", [1, 1, 0, 0, 0]),
    ("BAD", [0, 0, 0, 0, 0]),
    ("YES", [1, 1, 1, 1, 1]),
    ("NO", [0, 0, 0, 0, 0]),
    ("SORRY", [1, 0, 0, 0, 1]),
];

// ---------------------------------------------------------------------------
// GestureTable
// ---------------------------------------------------------------------------

/// Ordered `(pattern, token)` entries.
///
/// Use [`GestureTable::standard`] for the shared instance; it is built on
/// first use and never mutated.
#[derive(Debug, Clone)]
pub struct GestureTable {
    entries: Vec<(FingerVector, Token)>,
}

impl GestureTable {
    fn build() -> Self {
        let controls = CONTROL_PATTERNS
            .iter()
            .map(|&(c, bits)| (FingerVector::from_bits(bits), Token::Control(c)));
        let letters = LETTER_PATTERNS
            .iter()
            .map(|&(c, bits)| (FingerVector::from_bits(bits), Token::Letter(c)));
        let digits = DIGIT_PATTERNS
            .iter()
            .map(|&(c, bits)| (FingerVector::from_bits(bits), Token::Digit(c)));
        let mannerisms = MANNERISM_PATTERNS
            .iter()
            .map(|&(name, bits)| (FingerVector::from_bits(bits), Token::Mannerism(name)));

        Self {
            entries: controls.chain(letters).chain(digits).chain(mannerisms).collect(),
        }
    }

    /// The process-wide table.
    pub fn standard() -> &'static GestureTable {
        static TABLE: OnceLock<GestureTable> = OnceLock::new();
        TABLE.get_or_init(GestureTable::build)
    }

    /// First token whose pattern equals `fingers`, else [`Token::Unknown`].
    pub fn classify(&self, fingers: FingerVector) -> Token {
        self.entries
            .iter()
            .find(|(pattern, _)| *pattern == fingers)
            .map(|&(_, token)| token)
            .unwrap_or(Token::Unknown)
    }

    /// First match in sign-check order (letters, digits, mannerisms, then
    /// control gestures), else [`Token::Unknown`].
    pub fn recognize_sign(&self, fingers: FingerVector) -> Token {
        self.entries
            .iter()
            .filter(|(pattern, _)| *pattern == fingers)
            .min_by_key(|(_, token)| sign_rank(token))
            .map(|&(_, token)| token)
            .unwrap_or(Token::Unknown)
    }

    /// The pattern a token is signed with.
    pub fn pattern_of(&self, token: &Token) -> Option<FingerVector> {
        self.entries
            .iter()
            .find(|(_, t)| t == token)
            .map(|&(pattern, _)| pattern)
    }

    /// Every token sharing `fingers`, in priority order.  The first element
    /// (if any) is what [`classify`](Self::classify) returns.
    pub fn symbols_for(&self, fingers: FingerVector) -> Vec<Token> {
        self.entries
            .iter()
            .filter(|(pattern, _)| *pattern == fingers)
            .map(|&(_, token)| token)
            .collect()
    }

    /// Look up a mannerism by name (case-insensitive).
    pub fn mannerism(&self, name: &str) -> Option<Token> {
        self.entries.iter().find_map(|&(_, token)| match token {
            Token::Mannerism(m) if m.eq_ignore_ascii_case(name.trim()) => Some(token),
            _ => None,
        })
    }
}

fn sign_rank(token: &Token) -> u8 {
    match token {
        Token::Letter(_) => 0,
        Token::Digit(_) => 1,
        Token::Mannerism(_) => 2,
        Token::Control(_) => 3,
        Token::Unknown => 4,
    }
}

/// Classify with the standard table.
pub fn classify(fingers: FingerVector) -> Token {
    GestureTable::standard().classify(fingers)
}

/// [`GestureTable::recognize_sign`] with the standard table.
pub fn recognize_sign(fingers: FingerVector) -> Token {
    GestureTable::standard().recognize_sign(fingers)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(bits: [u8; 5]) -> FingerVector {
        FingerVector::new(bits).unwrap()
    }

    #[test]
    fn controls_take_priority() {
        assert_eq!(classify(fv([1, 1, 1, 1, 0])), Token::Control(Control::Space));
        assert_eq!(classify(fv([1, 0, 0, 0, 0])), Token::Control(Control::Delete));
        assert_eq!(classify(fv([1, 1, 1, 1, 1])), Token::Control(Control::Finish));
    }

    #[test]
    fn letters_before_digits_and_mannerisms() {
        assert_eq!(classify(fv([0, 1, 0, 0, 0])), Token::Letter('D'));
        assert_eq!(classify(fv([0, 0, 0, 0, 0])), Token::Letter('E'));
        assert_eq!(classify(fv([1, 1, 0, 0, 0])), Token::Letter('G'));
        assert_eq!(classify(fv([0, 1, 1, 0, 0])), Token::Letter('H'));
        assert_eq!(classify(fv([1, 0, 0, 0, 1])), Token::Letter('T'));
    }

    #[test]
    fn unmatched_pattern_is_unknown() {
        assert_eq!(classify(fv([0, 0, 1, 1, 1])), Token::Unknown);
        assert_eq!(classify(fv([1, 1, 0, 1, 1])), Token::Unknown);
    }

    #[test]
    fn classify_is_total_and_deterministic() {
        for n in 0u8..32 {
            let bits = [n >> 4 & 1, n >> 3 & 1, n >> 2 & 1, n >> 1 & 1, n & 1];
            let fingers = fv(bits);
            assert_eq!(classify(fingers), classify(fingers));
        }
    }

    #[test]
    fn shared_patterns_listed_in_priority_order() {
        let fist = GestureTable::standard().symbols_for(fv([0, 0, 0, 0, 0]));
        assert_eq!(
            fist,
            vec![
                Token::Letter('E'),
                Token::Letter('S'),
                Token::Digit('0'),
                Token::Mannerism("BAD"),
                Token::Mannerism("NO"),
            ]
        );
        assert_eq!(classify(fv([0, 0, 0, 0, 0])), fist[0]);
    }

    #[test]
    fn pattern_of_reverses_the_table() {
        let table = GestureTable::standard();
        assert_eq!(table.pattern_of(&Token::Letter('A')), Some(fv([1, 0, 0, 0, 0])));
        assert_eq!(table.pattern_of(&Token::Digit('1')), Some(fv([0, 1, 0, 0, 0])));
        assert_eq!(table.pattern_of(&Token::Mannerism("HELLO")), Some(fv([1, 1, 0, 0, 0])));
        assert_eq!(table.pattern_of(&Token::Unknown), None);
    }

    #[test]
    fn sign_check_puts_controls_last() {
        assert_eq!(recognize_sign(fv([1, 0, 0, 0, 0])), Token::Letter('A'));
        assert_eq!(recognize_sign(fv([1, 1, 1, 1, 1])), Token::Letter('O'));
        assert_eq!(recognize_sign(fv([1, 1, 1, 1, 0])), Token::Digit('9'));
        assert_eq!(recognize_sign(fv([0, 0, 0, 0, 0])), Token::Letter('E'));
        assert_eq!(recognize_sign(fv([0, 0, 1, 1, 1])), Token::Unknown);
    }

    #[test]
    fn mannerism_lookup_ignores_case() {
        let table = GestureTable::standard();
        assert_eq!(table.mannerism("thank you"), Some(Token::Mannerism("THANK YOU")));
        assert_eq!(table.mannerism("WAVE"), None);
    }
}
