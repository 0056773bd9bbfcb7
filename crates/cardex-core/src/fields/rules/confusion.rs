//! OCR confusion maps for visually similar characters.
//!
//! Substitutions are slot-type aware: a character is only replaced when it
//! violates the type expected at its position, and only by a character of
//! the expected type. A character that already fits its slot is never
//! touched, so clean input passes through unchanged.

/// Character class expected at one position of a fixed-format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotType {
    /// `A-Z`.
    Letter,
    /// `0-9`.
    Digit,
}

impl SlotType {
    /// Whether `c` satisfies this slot.
    pub fn accepts(self, c: char) -> bool {
        match self {
            SlotType::Letter => c.is_ascii_uppercase(),
            SlotType::Digit => c.is_ascii_digit(),
        }
    }
}

/// Digits that are commonly misread letters, keyed by the letter.
const LETTER_TO_DIGIT: [(char, char); 7] = [
    ('O', '0'),
    ('D', '0'),
    ('I', '1'),
    ('Z', '2'),
    ('A', '4'),
    ('S', '5'),
    ('B', '8'),
];

/// Letters that are commonly misread digits, keyed by the digit.
const DIGIT_TO_LETTER: [(char, char); 6] = [
    ('0', 'O'),
    ('1', 'I'),
    ('2', 'Z'),
    ('4', 'A'),
    ('5', 'S'),
    ('8', 'B'),
];

/// Glyphs read in place of digits inside dates. Lowercase forms are
/// included because dates are not uppercased before parsing.
const DATE_GLYPHS: [(char, char); 12] = [
    ('O', '0'),
    ('o', '0'),
    ('Q', '0'),
    ('D', '0'),
    ('I', '1'),
    ('l', '1'),
    ('Z', '2'),
    ('z', '2'),
    ('S', '5'),
    ('s', '5'),
    ('G', '6'),
    ('B', '8'),
];

fn lookup(table: &[(char, char)], c: char) -> Option<char> {
    table.iter().find(|(from, _)| *from == c).map(|(_, to)| *to)
}

/// Digit a letter is likely to have been misread from.
pub fn digit_for_letter(c: char) -> Option<char> {
    lookup(&LETTER_TO_DIGIT, c)
}

/// Letter a digit is likely to have been misread from.
pub fn letter_for_digit(c: char) -> Option<char> {
    lookup(&DIGIT_TO_LETTER, c)
}

/// Digit a glyph inside a date is likely to have been misread from.
pub fn date_digit_for(c: char) -> Option<char> {
    lookup(&DATE_GLYPHS, c)
}

/// Correct one character for its slot.
///
/// Returns `c` unchanged when it already fits or when no substitute of the
/// expected type exists.
pub fn correct(c: char, slot: SlotType) -> char {
    if slot.accepts(c) {
        return c;
    }

    let substitute = match slot {
        SlotType::Letter => letter_for_digit(c),
        SlotType::Digit => digit_for_letter(c),
    };

    substitute.filter(|&s| slot.accepts(s)).unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitting_characters_are_kept() {
        assert_eq!(correct('O', SlotType::Letter), 'O');
        assert_eq!(correct('0', SlotType::Digit), '0');
        assert_eq!(correct('B', SlotType::Letter), 'B');
    }

    #[test]
    fn test_violations_are_substituted() {
        assert_eq!(correct('0', SlotType::Letter), 'O');
        assert_eq!(correct('5', SlotType::Letter), 'S');
        assert_eq!(correct('O', SlotType::Digit), '0');
        assert_eq!(correct('D', SlotType::Digit), '0');
        assert_eq!(correct('A', SlotType::Digit), '4');
    }

    #[test]
    fn test_no_substitute_leaves_character() {
        assert_eq!(correct('7', SlotType::Letter), '7');
        assert_eq!(correct('K', SlotType::Digit), 'K');
    }

    #[test]
    fn test_maps_are_symmetric() {
        for (digit, letter) in DIGIT_TO_LETTER {
            assert_eq!(digit_for_letter(letter), Some(digit));
        }
    }
}
