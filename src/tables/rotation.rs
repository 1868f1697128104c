//! Galactic rotation curve, tabulated against guiding-centre radius

use std::path::Path;
use crate::interp;
use super::LoadError;

/// Circular velocity as a function of Galactocentric radius,
/// read from a two-column table (radius in kpc, velocity in km/s).
/// Immutable once loaded.
pub struct RotationCurve {
    r: Vec<f64>,
    vc: Vec<f64>,
}

impl RotationCurve {
    /// Loads the rotation curve from `path`.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let name = path.display().to_string();
        let contents = std::fs::read_to_string(path)
            .map_err(|_| LoadError::File(name.clone()))?;
        Self::from_str(&name, &contents)
    }

    /// Parses the rotation curve from the contents of a table file.
    /// Lines are whitespace-delimited pairs of radius (kpc) and
    /// circular velocity (km/s); anything after a '#' is a comment.
    /// The radius must be strictly increasing.
    pub fn from_str(name: &str, contents: &str) -> Result<Self, LoadError> {
        let mut r: Vec<f64> = Vec::new();
        let mut vc: Vec<f64> = Vec::new();

        for (i, line) in contents.lines().enumerate() {
            let data = line.split('#').next().unwrap_or("").trim();
            if data.is_empty() {
                continue;
            }

            let mut fields = data.split_whitespace()
                .map(|s| s.parse::<f64>());
            let (radius, velocity) = match (fields.next(), fields.next()) {
                (Some(Ok(x)), Some(Ok(y))) => (x, y),
                _ => return Err(LoadError::Syntax(name.to_owned(), i + 1)),
            };

            // kpc to pc
            let radius = 1.0e3 * radius;
            if let Some(prev) = r.last() {
                if radius <= *prev {
                    return Err(LoadError::Monotonicity(name.to_owned(), i + 1));
                }
            }

            r.push(radius);
            vc.push(velocity);
        }

        if r.len() < 2 {
            return Err(LoadError::Length(name.to_owned()));
        }

        Ok(RotationCurve {r, vc})
    }

    /// Returns the circular velocity (km/s) at radius `r` (pc),
    /// interpolating linearly between the tabulated points.
    /// Radii outside the tabulated range return 0.
    pub fn v_circ(&self, r: f64) -> f64 {
        interp::linear(&self.r, &self.vc, r)
    }

    /// The largest tabulated radius, in pc.
    pub fn r_max(&self) -> f64 {
        self.r[self.r.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TABLE: &str = "\
        # radius [kpc]  vc [km/s]
        0.0    0.0
        5.0  200.0
        10.0 220.0  # flat part
        15.0 220.0
    ";

    #[test]
    fn interpolates() {
        let curve = RotationCurve::from_str("test", TABLE).unwrap();
        assert_eq!(curve.v_circ(5000.0), 200.0);
        assert_eq!(curve.v_circ(7500.0), 210.0);
        assert_eq!(curve.v_circ(12000.0), 220.0);
        assert_eq!(curve.r_max(), 15000.0);
    }

    #[test]
    fn zero_outside_range() {
        let curve = RotationCurve::from_str("test", TABLE).unwrap();
        assert_eq!(curve.v_circ(-1.0), 0.0);
        assert_eq!(curve.v_circ(20000.0), 0.0);
    }

    #[test]
    fn rejects_garbage() {
        let text = "0.0 0.0\n5.0 two hundred\n";
        match RotationCurve::from_str("test", text) {
            Err(LoadError::Syntax(_, line)) => assert_eq!(line, 2),
            other => panic!("expected a syntax error, got {:?}", other.err()),
        }
    }

    #[test]
    fn rejects_non_monotonic_radius() {
        let text = "0.0 0.0\n5.0 200.0\n4.0 210.0\n";
        match RotationCurve::from_str("test", text) {
            Err(LoadError::Monotonicity(_, line)) => assert_eq!(line, 3),
            other => panic!("expected a monotonicity error, got {:?}", other.err()),
        }
    }

    #[test]
    fn rejects_single_point() {
        assert!(matches!(
            RotationCurve::from_str("test", "1.0 100.0\n"),
            Err(LoadError::Length(_))
        ));
    }
}
