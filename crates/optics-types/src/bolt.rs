use serde::{Deserialize, Serialize};

use crate::units::INCH;

/// Hole geometry for one bolt standard, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoltSpec {
    /// Clearance hole diameter (bolt passes freely).
    pub clear_dia: f64,
    /// Tap drill diameter (hole is threaded for the bolt).
    pub tap_dia: f64,
    /// Counterbore diameter for the bolt head.
    pub head_dia: f64,
    /// Counterbore depth for the bolt head.
    pub head_dz: f64,
    /// Washer diameter, for standards that are used with one.
    pub washer_dia: Option<f64>,
}

pub const BOLT_4_40: BoltSpec = BoltSpec {
    clear_dia: 0.120 * INCH,
    tap_dia: 0.089 * INCH,
    head_dia: 5.5,
    head_dz: 2.5,
    washer_dia: None,
};

pub const BOLT_8_32: BoltSpec = BoltSpec {
    clear_dia: 4.2,
    tap_dia: 3.5,
    head_dia: 8.0,
    head_dz: 3.0,
    washer_dia: None,
};

pub const BOLT_14_20: BoltSpec = BoltSpec {
    clear_dia: 5.0,
    tap_dia: 4.0,
    head_dia: 9.0,
    head_dz: 3.5,
    washer_dia: Some(10.0),
};

/// The fixed catalog of bolt standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Bolt {
    #[serde(rename = "bolt_4_40")]
    Bolt4_40,
    #[default]
    #[serde(rename = "bolt_8_32")]
    Bolt8_32,
    #[serde(rename = "bolt_14_20")]
    Bolt14_20,
}

impl Bolt {
    pub fn spec(self) -> BoltSpec {
        match self {
            Bolt::Bolt4_40 => BOLT_4_40,
            Bolt::Bolt8_32 => BOLT_8_32,
            Bolt::Bolt14_20 => BOLT_14_20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup() {
        let b = Bolt::Bolt8_32.spec();
        assert_eq!(b.clear_dia, 4.2);
        assert_eq!(b.head_dia, 8.0);
        assert_eq!(b.head_dz, 3.0);
        assert_eq!(b.tap_dia, 3.5);
        assert_eq!(Bolt::Bolt14_20.spec().washer_dia, Some(10.0));
    }

    #[test]
    fn catalog_names() {
        let b: Bolt = serde_json::from_str("\"bolt_14_20\"").unwrap();
        assert_eq!(b, Bolt::Bolt14_20);
        assert_eq!(serde_json::to_string(&Bolt::Bolt4_40).unwrap(), "\"bolt_4_40\"");
    }
}
