use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which layer of the epithelium an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Segment {
    Apical,
    Basal,
    Lateral,
}

impl Default for Segment {
    fn default() -> Self {
        Segment::Apical
    }
}

#[derive(Debug, Error)]
#[error("Invalid segment string")]
pub struct ParseSegmentError;

impl FromStr for Segment {
    type Err = ParseSegmentError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a" | "apical" => Ok(Self::Apical),
            "b" | "basal" => Ok(Self::Basal),
            "l" | "lateral" => Ok(Self::Lateral),
            _ => Err(ParseSegmentError),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Apical => "apical",
                Self::Basal => "basal",
                Self::Lateral => "lateral",
            }
        )
    }
}

/// The element tables of an [`Epithelium`](super::mesh::Epithelium).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Vert,
    Edge,
    Face,
    Cell,
    Settings,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Vert => "vert",
                Self::Edge => "edge",
                Self::Face => "face",
                Self::Cell => "cell",
                Self::Settings => "settings",
            }
        )
    }
}

/// Cartesian axis, used to pick a coordinate out of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl Default for Axis {
    fn default() -> Self {
        Axis::X
    }
}

impl FromStr for Axis {
    type Err = ParseSegmentError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            _ => Err(ParseSegmentError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_from_str_parses_valid_strings() {
        assert_eq!("apical".parse::<Segment>().unwrap(), Segment::Apical);
        assert_eq!("A".parse::<Segment>().unwrap(), Segment::Apical);
        assert_eq!("Basal".parse::<Segment>().unwrap(), Segment::Basal);
        assert_eq!("b".parse::<Segment>().unwrap(), Segment::Basal);
        assert_eq!("lateral".parse::<Segment>().unwrap(), Segment::Lateral);
    }

    #[test]
    fn segment_from_str_rejects_invalid_strings() {
        assert!("".parse::<Segment>().is_err());
        assert!("medial".parse::<Segment>().is_err());
    }

    #[test]
    fn segment_display_round_trips_through_from_str() {
        for segment in [Segment::Apical, Segment::Basal, Segment::Lateral] {
            assert_eq!(segment.to_string().parse::<Segment>().unwrap(), segment);
        }
    }

    #[test]
    fn segment_default_is_apical() {
        assert_eq!(Segment::default(), Segment::Apical);
    }

    #[test]
    fn element_display_uses_table_names() {
        assert_eq!(Element::Vert.to_string(), "vert");
        assert_eq!(Element::Edge.to_string(), "edge");
        assert_eq!(Element::Settings.to_string(), "settings");
    }

    #[test]
    fn axis_index_matches_coordinate_order() {
        assert_eq!(Axis::X.index(), 0);
        assert_eq!(Axis::Y.index(), 1);
        assert_eq!("Z".parse::<Axis>().unwrap().index(), 2);
    }
}
