use std::fmt;

use serde::{Deserialize, Serialize};

/// Cube face, in the canonical solver order `U R F D L B`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Face {
    U,
    R,
    F,
    D,
    L,
    B,
}

impl Face {
    pub const ORDER: [Face; 6] = [Face::U, Face::R, Face::F, Face::D, Face::L, Face::B];

    pub fn letter(self) -> char {
        match self {
            Face::U => 'U',
            Face::R => 'R',
            Face::F => 'F',
            Face::D => 'D',
            Face::L => 'L',
            Face::B => 'B',
        }
    }

    pub fn from_letter(letter: &str) -> Option<Face> {
        match letter.trim().to_ascii_uppercase().as_str() {
            "U" => Some(Face::U),
            "R" => Some(Face::R),
            "F" => Some(Face::F),
            "D" => Some(Face::D),
            "L" => Some(Face::L),
            "B" => Some(Face::B),
            _ => None,
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Sticker color code. `Unknown` is the "no answer" marker, not a color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColorCode {
    #[serde(rename = "W")]
    White,
    #[serde(rename = "Y")]
    Yellow,
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "O")]
    Orange,
    #[serde(rename = "B")]
    Blue,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "?")]
    Unknown,
}

impl ColorCode {
    pub const KNOWN: [ColorCode; 6] = [
        ColorCode::White,
        ColorCode::Yellow,
        ColorCode::Red,
        ColorCode::Orange,
        ColorCode::Blue,
        ColorCode::Green,
    ];

    pub fn is_known(self) -> bool {
        self != ColorCode::Unknown
    }

    pub fn letter(self) -> char {
        match self {
            ColorCode::White => 'W',
            ColorCode::Yellow => 'Y',
            ColorCode::Red => 'R',
            ColorCode::Orange => 'O',
            ColorCode::Blue => 'B',
            ColorCode::Green => 'G',
            ColorCode::Unknown => '?',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorCode::White => "White",
            ColorCode::Yellow => "Yellow",
            ColorCode::Red => "Red",
            ColorCode::Orange => "Orange",
            ColorCode::Blue => "Blue",
            ColorCode::Green => "Green",
            ColorCode::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ColorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("U", Some(Face::U))]
    #[case("b", Some(Face::B))]
    #[case(" f ", Some(Face::F))]
    #[case("X", None)]
    #[case("", None)]
    fn test_face_from_letter(#[case] input: &str, #[case] expected: Option<Face>) {
        assert_eq!(Face::from_letter(input), expected);
    }

    #[test]
    fn test_face_order_is_canonical() {
        let letters: String = Face::ORDER.iter().map(|f| f.letter()).collect();
        assert_eq!(letters, "URFDLB");
    }

    #[test]
    fn test_face_ord_matches_canonical_order() {
        let mut shuffled = vec![Face::B, Face::U, Face::L, Face::F, Face::D, Face::R];
        shuffled.sort();
        assert_eq!(shuffled, Face::ORDER.to_vec());
    }

    #[test]
    fn test_color_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&ColorCode::Orange).unwrap(), r#""O""#);
        assert_eq!(serde_json::to_string(&ColorCode::Unknown).unwrap(), r#""?""#);
        let back: ColorCode = serde_json::from_str(r#""G""#).unwrap();
        assert_eq!(back, ColorCode::Green);
    }

    #[test]
    fn test_unknown_is_not_known() {
        assert!(!ColorCode::Unknown.is_known());
        assert!(ColorCode::KNOWN.iter().all(|c| c.is_known()));
    }
}
