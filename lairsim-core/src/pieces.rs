//! The closed set of token kinds and their rulebook stats.
//!
//! Each kind carries a health (damage needed to destroy one unit), a fear
//! yield per destroyed unit, and an optional "military response" kind that
//! a destroyed unit converts into at a nearby land.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Void,
    Explorer,
    Town,
    City,
    Dahan,
}

impl PieceKind {
    /// The invader kinds, weakest first.
    pub const INVADERS: [PieceKind; 3] = [PieceKind::Explorer, PieceKind::Town, PieceKind::City];

    /// Damage needed to destroy one unit.
    pub fn health(self) -> i32 {
        match self {
            PieceKind::Void => 0,
            PieceKind::Explorer => 1,
            PieceKind::Town => 2,
            PieceKind::City => 3,
            PieceKind::Dahan => 2,
        }
    }

    /// Fear generated per destroyed unit.
    pub fn fear(self) -> i32 {
        match self {
            PieceKind::Town => 1,
            PieceKind::City => 2,
            _ => 0,
        }
    }

    /// The kind one destroyed unit escalates/de-escalates into, if any.
    pub fn response(self) -> Option<PieceKind> {
        match self {
            PieceKind::Town => Some(PieceKind::Explorer),
            PieceKind::City => Some(PieceKind::Town),
            _ => None,
        }
    }

    pub fn name(self, names: &PieceNames) -> &'static str {
        match self {
            PieceKind::Void => "void",
            PieceKind::Explorer => names.explorer,
            PieceKind::Town => names.town,
            PieceKind::City => names.city,
            PieceKind::Dahan => names.dahan,
        }
    }
}

/// Presentation names for the piece kinds. Two schemes coexist: plain
/// text for terminal output and emoji codes for chat exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceNames {
    pub explorer: &'static str,
    pub town: &'static str,
    pub city: &'static str,
    pub dahan: &'static str,
}

pub const PIECE_NAMES_TEXT: PieceNames = PieceNames {
    explorer: "explorer",
    town: "town",
    city: "city",
    dahan: "dahan",
};

pub const PIECE_NAMES_EMOJI: PieceNames = PieceNames {
    explorer: ":InvaderExplorer:",
    town: ":InvaderTown:",
    city: ":InvaderCity:",
    dahan: ":Dahan:",
};

/// Render "(name, count)" pairs as e.g. `2 town 1 explorer`, or `CLEAR`
/// when every count is zero.
pub fn stringify_pieces<'a, I>(pieces: I) -> String
where
    I: IntoIterator<Item = (&'a str, i32)>,
{
    let parts: Vec<String> = pieces
        .into_iter()
        .filter(|&(_, cnt)| cnt != 0)
        .map(|(name, cnt)| format!("{cnt} {name}"))
        .collect();
    if parts.is_empty() {
        "CLEAR".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_chain() {
        assert_eq!(PieceKind::City.response(), Some(PieceKind::Town));
        assert_eq!(PieceKind::Town.response(), Some(PieceKind::Explorer));
        assert_eq!(PieceKind::Explorer.response(), None);
        assert_eq!(PieceKind::Dahan.response(), None);
    }

    #[test]
    fn test_stringify_skips_zero_counts() {
        let s = stringify_pieces(vec![("explorer", 0), ("town", 2), ("dahan", 1)]);
        assert_eq!(s, "2 town 1 dahan");
    }

    #[test]
    fn test_stringify_empty_is_clear() {
        assert_eq!(stringify_pieces(vec![("explorer", 0)]), "CLEAR");
    }
}
