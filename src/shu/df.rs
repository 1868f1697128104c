//! Closed form of the Shu DF's guiding-radius marginal
//!
//! The distribution of guiding-centre radii for stars observed at a
//! given position, P(Rg|R), follows Eq. (14) of Sharma et al. 2014,
//! ApJ, 793, 51, with the dispersion correction of Sharma &
//! Bland-Hawthorn 2013, ApJ, 773, 183. Everything is expressed in
//! terms of the ratio fg = Rg / R.

use crate::constants::{THICKENING_COEFF, THICKENING_POWER};
use crate::model::AgeBin;
use crate::special_functions::gamma;
use crate::tables::RotationCurve;

/// Step used for the finite-difference slope
pub const SLOPE_STEP: f64 = 0.001;

/// Coefficients of the polynomial part of the dispersion correction,
/// Eq. (39) of Sharma & Bland-Hawthorn 2013
const CORRECTION_COEFFS: [f64; 12] = [
    -0.028476, -1.4518, 12.492, -21.842, 19.130, -10.175,
    3.5214, -0.81052, 0.12311, -0.011851, 0.00065476, -1.5809e-05,
];

/// Height correction to the circular velocity,
/// Eq. (22) of Sharma et al. 2014
pub fn thickening(z: f64) -> f64 {
    1.0 + THICKENING_COEFF * (1.0e-3 * z.abs()).powf(THICKENING_POWER)
}

/// The DF's radial marginal at fixed position and age bin: a
/// one-dimensional function of fg that the peak finder and the
/// tabulator both evaluate.
pub struct DfColumn<'a> {
    pub rotation: &'a RotationCurve,
    /// Galactocentric radius of the column, pc
    pub r: f64,
    /// Height of the column, pc
    pub z: f64,
    /// Dispersion parameters of the population
    pub bin: AgeBin,
    /// Galactocentric radius of the Sun, pc
    pub r0: f64,
}

impl<'a> DfColumn<'a> {
    /// Evaluates P(Rg|R) at fg = Rg / R, clamped at zero.
    pub fn density(&self, fg: f64) -> f64 {
        if fg <= 0.0 {
            return 0.0;
        }
        let rg = fg * self.r;
        let vc = self.rotation.v_circ(rg) / thickening(self.z);
        let a0 = self.bin.sig_u0 / vc * (self.r0 / self.bin.h_sig_u).exp();
        let a = self.bin.sig_u0 / vc * (-(rg - self.r0) / self.bin.h_sig_u).exp()
            * self.correction(rg, a0);
        let c = 0.5 / (a * a);
        if c <= 0.5 {
            return 0.0;
        }
        let sig_rg = self.surface_density(rg, a0);
        let x = c * (2.0 * fg.ln() + 1.0 - fg * fg);
        let p = sig_rg * x.exp() / g_norm(c);
        p.max(0.0)
    }

    /// Finite-difference slope of the density, returning
    /// (dP/dfg, P(fg)). Both are zeroed when either sample of the
    /// difference is non-positive.
    pub fn slope(&self, fg: f64) -> (f64, f64) {
        let p1 = self.density(fg);
        let p2 = self.density(fg + SLOPE_STEP);
        if p1 <= 0.0 || p2 <= 0.0 {
            (0.0, 0.0)
        } else {
            ((p2 - p1) / SLOPE_STEP, p1)
        }
    }

    /// Rd^2 times the guiding-radius surface density,
    /// Eq. (20) of Sharma et al. 2014, with the rising-vc fit
    /// constants of Sharma & Bland-Hawthorn 2013, Table 1.
    fn surface_density(&self, rg: f64, a0: f64) -> f64 {
        let (k, a, b) = (31.53, 0.6719, 0.2743);
        let (c1, c2, c3, c4) = (3.822, 0.524, 0.00567, 2.13);
        let rd = self.bin.rd;
        let q = rd / self.bin.h_sig_u;
        let rg_max = c1 * rd / (1.0 + q / c2);
        let x = rg / rg_max;
        let s = k * (-x / b).exp() * ((x / a).powi(2) - 1.0);
        0.5 * (-rg / rd).exp() / std::f64::consts::PI - c3 * a0.powf(c4) * s
    }

    /// Multiplicative correction to the dispersion scale a,
    /// Eq. (39) of Sharma & Bland-Hawthorn 2013.
    fn correction(&self, rg: f64, a0: f64) -> f64 {
        let q = self.bin.rd / self.bin.h_sig_u;
        let x = rg / self.bin.h_sig_u;
        let poly: f64 = CORRECTION_COEFFS.iter().rev()
            .fold(0.0, |acc, c| acc * x + c);
        1.0 - 0.25 * a0.powf(2.04) / q.powf(0.49) * poly
    }
}

/// Normalization g(c) of the Shu DF, Eq. (16) of Sharma et al. 2014;
/// above c = 10 the approximation Eq. (14) of Schoenrich & Binney 2012
/// avoids the overflow of exp(c) Gamma(c - 1/2).
fn g_norm(c: f64) -> f64 {
    if c < 0.5 {
        0.0
    } else if c < 10.0 {
        c.exp() * gamma(c - 0.5) / (2.0 * c.powf(c - 0.5))
    } else {
        (0.5 * std::f64::consts::PI / (c - 0.913)).sqrt()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::DiskKinematics;

    // flat 220 km/s rotation curve out to 30 kpc
    pub(crate) fn flat_curve() -> RotationCurve {
        RotationCurve::from_str("flat", "0.0 220.0\n30.0 220.0\n").unwrap()
    }

    pub(crate) fn solar_column(rotation: &RotationCurve) -> DfColumn {
        let disk = DiskKinematics::default();
        DfColumn {
            rotation,
            r: 8160.0,
            z: 0.0,
            bin: disk.age_bin(3),
            r0: disk.solar_radius,
        }
    }

    #[test]
    fn thickening_grows_with_height() {
        assert_eq!(thickening(0.0), 1.0);
        let value = thickening(-1000.0);
        println!("thickening(1 kpc) = {}, target = {}", value, 1.0374);
        assert!((value - 1.0374).abs() < 1.0e-10);
        assert!(thickening(3600.0) > thickening(1800.0));
    }

    #[test]
    fn density_vanishes_at_non_positive_fg() {
        let curve = flat_curve();
        let col = solar_column(&curve);
        assert_eq!(col.density(0.0), 0.0);
        assert_eq!(col.density(-0.5), 0.0);
    }

    #[test]
    fn density_peaks_below_circular() {
        // asymmetric drift: the most likely guiding radius lies inside R
        let curve = flat_curve();
        let col = solar_column(&curve);
        let p_inner = col.density(0.95);
        let p_outer = col.density(1.3);
        let p_tail = col.density(0.4);
        println!("P(0.95) = {:e}, P(1.3) = {:e}, P(0.4) = {:e}", p_inner, p_outer, p_tail);
        assert!(p_inner > 0.0);
        assert!(p_inner > p_outer);
        assert!(p_inner > p_tail);
    }

    #[test]
    fn slope_changes_sign_across_peak() {
        let curve = flat_curve();
        let col = solar_column(&curve);
        let (rising, p1) = col.slope(0.7);
        let (falling, p2) = col.slope(1.2);
        assert!(p1 > 0.0 && p2 > 0.0);
        assert!(rising > 0.0);
        assert!(falling < 0.0);
    }

    #[test]
    fn zero_where_dispersion_overwhelms_rotation() {
        // vc = 2 km/s makes c fall below 1/2 everywhere
        let curve = RotationCurve::from_str("slow", "0.0 2.0\n30.0 2.0\n").unwrap();
        let col = solar_column(&curve);
        assert_eq!(col.density(1.0), 0.0);
    }
}
