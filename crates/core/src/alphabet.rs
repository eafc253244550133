//! Drum alphabet
//!
//! Each drum carries the same 45 flaps in a fixed order. A flap's index in
//! [`LETTERS`] is its position counted forward from the calibrated zero
//! (the blank flap).

/// Number of flaps on one drum.
pub const FLAP_COUNT: u8 = 45;

/// Flap order as mounted on the drum, starting at the home position.
pub const LETTERS: [char; FLAP_COUNT as usize] = [
    ' ', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '$', '&', '#', '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', ':', '.', '-', '?', '!',
];

/// The blank flap. Also used for every unsupported character.
pub const BLANK: char = ' ';

/// Position of `letter` on the drum.
///
/// Characters that are not on the drum map to the blank flap (index 0).
/// Matching is exact; callers that accept lower case should [`normalize`] first.
pub fn letter_index(letter: char) -> u8 {
    LETTERS
        .iter()
        .position(|&c| c == letter)
        .map_or(0, |i| i as u8)
}

/// Letter printed on the flap at `index`, if the index is on the drum.
pub fn letter_at(index: u8) -> Option<char> {
    LETTERS.get(index as usize).copied()
}

/// Fold a character onto the drum: ASCII upper case, unsupported characters become blank.
pub fn normalize(c: char) -> char {
    let upper = c.to_ascii_uppercase();
    if LETTERS.contains(&upper) {
        upper
    } else {
        BLANK
    }
}

/// Forward distance in flaps from position `from` to position `to`.
///
/// The drum only turns one way, so the result is always in `0..FLAP_COUNT`.
#[inline]
pub fn forward_flaps(from: u8, to: u8) -> u8 {
    let from = from % FLAP_COUNT;
    let to = to % FLAP_COUNT;
    (to + FLAP_COUNT - from) % FLAP_COUNT
}
