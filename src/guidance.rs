//! Which keys and fingers produce a character on a US QWERTY layout.
//!
//! Shifted characters add the Shift key and the pinky of the hand that
//! does not press the base key.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Finger {
    LeftPinky,
    LeftRing,
    LeftMiddle,
    LeftIndex,
    RightIndex,
    RightMiddle,
    RightRing,
    RightPinky,
    Thumb,
}

impl Finger {
    pub fn hand(self) -> Option<Hand> {
        match self {
            Finger::LeftPinky | Finger::LeftRing | Finger::LeftMiddle | Finger::LeftIndex => {
                Some(Hand::Left)
            }
            Finger::RightIndex | Finger::RightMiddle | Finger::RightRing | Finger::RightPinky => {
                Some(Hand::Right)
            }
            Finger::Thumb => None,
        }
    }
}

/// A physical key on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalKey {
    Char(char),
    Space,
    Shift,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KeyGuidance {
    pub keys: Vec<PhysicalKey>,
    pub fingers: Vec<Finger>,
}

impl KeyGuidance {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn needs_shift(&self) -> bool {
        self.keys.contains(&PhysicalKey::Shift)
    }
}

const FINGER_ROWS: [(Finger, &str); 8] = [
    (Finger::LeftPinky, "`1qaz"),
    (Finger::LeftRing, "2wsx"),
    (Finger::LeftMiddle, "3edc"),
    (Finger::LeftIndex, "45rtfgvb"),
    (Finger::RightIndex, "67yuhjnm"),
    (Finger::RightMiddle, "8ik,"),
    (Finger::RightRing, "9ol."),
    (Finger::RightPinky, "0-=p[]\\;'/"),
];

const SHIFTED_SYMBOLS: [(char, char); 21] = [
    ('~', '`'),
    ('!', '1'),
    ('@', '2'),
    ('#', '3'),
    ('$', '4'),
    ('%', '5'),
    ('^', '6'),
    ('&', '7'),
    ('*', '8'),
    ('(', '9'),
    (')', '0'),
    ('_', '-'),
    ('+', '='),
    ('{', '['),
    ('}', ']'),
    ('|', '\\'),
    (':', ';'),
    ('"', '\''),
    ('<', ','),
    ('>', '.'),
    ('?', '/'),
];

fn finger_for_base(key: char) -> Option<Finger> {
    FINGER_ROWS
        .iter()
        .find(|(_, keys)| keys.contains(key))
        .map(|(finger, _)| *finger)
}

/// Unshifted key for `c`, and whether Shift is needed
fn base_key(c: char) -> Option<(char, bool)> {
    if c.is_ascii_uppercase() {
        return Some((c.to_ascii_lowercase(), true));
    }
    if let Some((_, base)) = SHIFTED_SYMBOLS.iter().find(|(shifted, _)| *shifted == c) {
        return Some((*base, true));
    }
    finger_for_base(c).map(|_| (c, false))
}

/// Keys and fingers for the given character; empty when unmapped
pub fn guidance_for(c: char) -> KeyGuidance {
    if c == ' ' {
        return KeyGuidance {
            keys: vec![PhysicalKey::Space],
            fingers: vec![Finger::Thumb],
        };
    }

    let Some((base, shifted)) = base_key(c) else {
        return KeyGuidance::default();
    };
    let Some(finger) = finger_for_base(base) else {
        return KeyGuidance::default();
    };

    let mut guidance = KeyGuidance {
        keys: vec![PhysicalKey::Char(base)],
        fingers: vec![finger],
    };
    if shifted {
        let shift_pinky = match finger.hand() {
            Some(Hand::Left) => Finger::RightPinky,
            _ => Finger::LeftPinky,
        };
        guidance.keys.push(PhysicalKey::Shift);
        guidance.fingers.push(shift_pinky);
    }
    guidance
}
