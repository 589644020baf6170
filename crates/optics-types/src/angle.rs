use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_deg(deg: f64) -> f64 {
    let n = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if n >= 360.0 {
        0.0
    } else {
        n
    }
}

/// Signed difference `to - from` folded into `(-180, 180]`.
pub fn signed_delta_deg(from: f64, to: f64) -> f64 {
    let d = normalize_deg(to - from);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Error for angle vocabulary names that do not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {vocabulary} name: {name}")]
pub struct UnknownAngleName {
    pub vocabulary: &'static str,
    pub name: String,
}

/// Absolute headings in the baseplate plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinal {
    Right,
    Up,
    Left,
    Down,
}

impl Cardinal {
    pub fn degrees(self) -> f64 {
        match self {
            Cardinal::Right => 0.0,
            Cardinal::Up => 90.0,
            Cardinal::Left => 180.0,
            Cardinal::Down => 270.0,
        }
    }
}

impl FromStr for Cardinal {
    type Err = UnknownAngleName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "right" => Ok(Cardinal::Right),
            "up" => Ok(Cardinal::Up),
            "left" => Ok(Cardinal::Left),
            "down" => Ok(Cardinal::Down),
            _ => Err(UnknownAngleName {
                vocabulary: "cardinal",
                name: s.to_string(),
            }),
        }
    }
}

/// A named right-angle turn, read as "travelling `incoming`, leave `outgoing`".
///
/// Turns are relative: applying one changes the branch heading by
/// [`Turn::delta`] regardless of the heading the beam actually had.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Turn {
    UpRight,
    RightUp,
    UpLeft,
    LeftUp,
    DownRight,
    RightDown,
    DownLeft,
    LeftDown,
}

impl Turn {
    pub const ALL: [Turn; 8] = [
        Turn::UpRight,
        Turn::RightUp,
        Turn::UpLeft,
        Turn::LeftUp,
        Turn::DownRight,
        Turn::RightDown,
        Turn::DownLeft,
        Turn::LeftDown,
    ];

    /// The heading the turn expects the beam to arrive with.
    pub fn incoming(self) -> Cardinal {
        match self {
            Turn::UpRight | Turn::UpLeft => Cardinal::Up,
            Turn::RightUp | Turn::RightDown => Cardinal::Right,
            Turn::LeftUp | Turn::LeftDown => Cardinal::Left,
            Turn::DownRight | Turn::DownLeft => Cardinal::Down,
        }
    }

    /// The heading the beam leaves with when it arrived as expected.
    pub fn outgoing(self) -> Cardinal {
        match self {
            Turn::UpRight | Turn::DownRight => Cardinal::Right,
            Turn::RightUp | Turn::LeftUp => Cardinal::Up,
            Turn::UpLeft | Turn::DownLeft => Cardinal::Left,
            Turn::RightDown | Turn::LeftDown => Cardinal::Down,
        }
    }

    /// Heading change in degrees, always ±90.
    pub fn delta(self) -> f64 {
        signed_delta_deg(self.incoming().degrees(), self.outgoing().degrees())
    }
}

impl FromStr for Turn {
    type Err = UnknownAngleName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Turn::ALL
            .into_iter()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| UnknownAngleName {
                vocabulary: "turn",
                name: s.to_string(),
            })
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Turn::UpRight => "up-right",
            Turn::RightUp => "right-up",
            Turn::UpLeft => "up-left",
            Turn::LeftUp => "left-up",
            Turn::DownRight => "down-right",
            Turn::RightDown => "right-down",
            Turn::DownLeft => "down-left",
            Turn::LeftDown => "left-down",
        };
        f.write_str(name)
    }
}

/// The angle argument of a beam placement.
///
/// The two vocabularies are easy to confuse: a `Heading` is an absolute
/// element orientation, a `Turn` is a relative change of the beam
/// heading. Passing one where the other was meant is not an error; it
/// yields a different (wrong) layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Angle {
    /// Absolute element orientation in degrees (cardinal vocabulary).
    Heading(f64),
    /// Relative turn of the beam; the element sits on the bisector.
    Turn(Turn),
    /// Element orientation relative to the current beam heading, in degrees.
    Relative(f64),
}

impl From<Cardinal> for Angle {
    fn from(c: Cardinal) -> Self {
        Angle::Heading(c.degrees())
    }
}

impl From<Turn> for Angle {
    fn from(t: Turn) -> Self {
        Angle::Turn(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_deltas_are_quarter_turns() {
        for t in Turn::ALL {
            assert_eq!(t.delta().abs(), 90.0, "{t}");
        }
        assert_eq!(Turn::UpRight.delta(), -90.0);
        assert_eq!(Turn::RightUp.delta(), 90.0);
        assert_eq!(Turn::DownLeft.delta(), -90.0);
        assert_eq!(Turn::LeftDown.delta(), 90.0);
    }

    #[test]
    fn turn_names_round_trip_through_from_str() {
        for t in Turn::ALL {
            assert_eq!(t.to_string().parse::<Turn>(), Ok(t));
        }
        assert!("up-up".parse::<Turn>().is_err());
    }

    #[test]
    fn normalize_wraps_negative_angles() {
        assert_eq!(normalize_deg(-90.0), 270.0);
        assert_eq!(normalize_deg(720.0), 0.0);
        assert_eq!(signed_delta_deg(350.0, 10.0), 20.0);
        assert_eq!(signed_delta_deg(10.0, 350.0), -20.0);
    }

    #[test]
    fn angle_serializes_with_tag() {
        let json = serde_json::to_string(&Angle::Turn(Turn::RightDown)).unwrap();
        assert_eq!(json, r#"{"type":"turn","value":"right-down"}"#);
        let back: Angle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Angle::Turn(Turn::RightDown));
    }
}
