/// Millimetres per inch. All lengths in the workspace are millimetres.
pub const INCH: f64 = 25.4;

/// Default depth of tapped holes drilled into a baseplate.
pub const DRILL_DEPTH: f64 = 10.0;

/// Default height of the optical axis above the baseplate top surface.
pub const DEFAULT_OPTICS_DZ: f64 = INCH / 2.0;

/// Default grating ruling used for ECDL Littrow labels, in lines per mm.
pub const DEFAULT_GRATING_LINES_PER_MM: f64 = 3600.0;

/// Littrow angle in degrees for a wavelength (nm) on a grating with the
/// given ruling (lines per mm): `asin(λ / 2d)`.
///
/// Returns `None` when the grating cannot diffract that wavelength back
/// onto itself (`λ > 2d`). The value is only used as a label and an
/// orientation parameter for laser-diode mounts.
pub fn littrow_angle(wavelength_nm: f64, lines_per_mm: f64) -> Option<f64> {
    let pitch_mm = 1.0 / lines_per_mm;
    let wavelength_mm = wavelength_nm * 1e-6;
    let s = wavelength_mm / (2.0 * pitch_mm);
    if !(0.0..=1.0).contains(&s) {
        return None;
    }
    Some(s.asin().to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn littrow_for_422nm() {
        let angle = littrow_angle(422.0, 3600.0).unwrap();
        assert_relative_eq!(angle, (0.422e-3_f64 * 3600.0 / 2.0).asin().to_degrees());
        assert!(angle > 49.0 && angle < 50.0);
    }

    #[test]
    fn littrow_out_of_range() {
        assert!(littrow_angle(866.0, 3600.0).is_none());
        assert!(littrow_angle(866.0, 1800.0).is_some());
    }
}
