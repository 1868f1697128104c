//! Velocity draws for bar and bulge stars
//!
//! The bar rotates as a solid body at the pattern speed, with a mean
//! streaming motion along its major axis and position-dependent
//! dispersions that fall off with the superellipsoidal bar radius.

use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::constants::ESCAPE_VELOCITY_BULGE;
use crate::geometry::ThreeVector;
use crate::model::BarKinematics;
use super::SamplingError;

pub(super) fn sample<R: Rng>(
    bar: &BarKinematics,
    position: ThreeVector,
    max_rejections: usize,
    rng: &mut R,
) -> Result<ThreeVector, SamplingError> {
    let (x, y, z) = (position[0], position[1], position[2]);
    let r = x.hypot(y);

    // pattern speed is km/s/kpc, radius is pc
    let v_rot = 1.0e-3 * bar.omega_p * r;

    let (sin_t, cos_t) = bar.angle.sin_cos();
    let xb = x * cos_t + y * sin_t;
    let yb = -x * sin_t + y * cos_t;

    let fac = bar.shape.factor(xb, yb, z);
    let fac_z = bar.shape_z.factor(xb, yb, z);
    let sig_xb = bar.sig[0] * fac + bar.sig0[0];
    let sig_yb = bar.sig[1] * fac + bar.sig0[1];
    let sig_z = bar.sig[2] * fac_z + bar.sig0[2];

    // project the bar-frame dispersions onto the Galactic axes
    let sig_x = (sig_xb.powi(2) * cos_t.powi(2) + sig_yb.powi(2) * sin_t.powi(2)).sqrt();
    let sig_y = (sig_xb.powi(2) * sin_t.powi(2) + sig_yb.powi(2) * cos_t.powi(2)).sqrt();

    // streaming along the bar's x axis, switching sign across it
    let mut stream = if yb > 0.0 {-bar.vx_str} else {bar.vx_str};
    if bar.y0_str > 0.0 {
        let yn = (yb / bar.y0_str).abs();
        stream *= 1.0 - (-yn * yn).exp();
    }

    for _ in 0..max_rejections {
        let vx = -v_rot * y / r + stream * cos_t + sig_x * rng.sample::<f64,_>(StandardNormal);
        let vy = v_rot * x / r + stream * sin_t + sig_y * rng.sample::<f64,_>(StandardNormal);
        let vz = sig_z * rng.sample::<f64,_>(StandardNormal);
        let v = ThreeVector::new(vx, vy, vz);
        if v.norm_sqr() <= ESCAPE_VELOCITY_BULGE.powi(2) {
            return Ok(v);
        }
    }

    Err(SamplingError::RejectionExhausted {attempts: max_rejections})
}
