//! Sampling of stellar velocities
//!
//! The public contract of the engine: given a position and a
//! population, draw a Galactocentric velocity vector. Disk stars draw
//! a guiding radius from the precomputed grid and rotate the circular
//! velocity there into place; bar and nuclear-disk stars follow their
//! own kinematic models. Every branch rejects velocities beyond the
//! escape cap, up to a configurable number of retries.

use std::fmt;
use std::error::Error;

use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::constants::ESCAPE_VELOCITY_DISK;
use crate::constants::ESCAPE_VELOCITY_BULGE;
use crate::geometry::ThreeVector;
use crate::model::{BarKinematics, DiskKinematics};
use crate::shu::ShuGrid;
use crate::shu::df::thickening;
use crate::tables::{NsdMoments, RotationCurve};

mod bar;

/// Which population a star belongs to.
#[derive(Copy,Clone,Debug,PartialEq)]
pub enum Population {
    /// Disk star: age bin plus the star's own age in Gyr
    Disk {bin: usize, age: f64},
    Bar,
    NuclearDisk,
}

/// Error returned when Kinematics::sample fails.
#[derive(Debug,Clone,PartialEq)]
pub enum SamplingError {
    /// The escape-velocity rejection loop hit its retry cap.
    RejectionExhausted {attempts: usize},
    /// A nuclear-disk star was requested outside the moments table.
    OutsideNuclearDisk {r: f64, z: f64},
    /// A nuclear-disk star was requested but no moments table is loaded.
    MissingMomentsTable,
}

impl fmt::Display for SamplingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SamplingError::RejectionExhausted {attempts} =>
                write!(f, "No velocity below the escape cap was found in {} attempts.", attempts),
            SamplingError::OutsideNuclearDisk {r, z} =>
                write!(f, "Nuclear-disk star requested at (R, z) = ({:.1}, {:.1}) pc, outside the moments table.", r, z),
            SamplingError::MissingMomentsTable =>
                write!(f, "Nuclear-disk star requested, but no moments table has been loaded."),
        }
    }
}

impl Error for SamplingError {}

/// The assembled sampling engine. Built once, then shared immutably;
/// sampling needs only `&self` plus a caller-owned rng, so threads
/// can draw concurrently from their own streams.
pub struct Kinematics {
    pub grid: ShuGrid,
    pub rotation: RotationCurve,
    pub disk: DiskKinematics,
    pub bar: BarKinematics,
    pub nsd: Option<NsdMoments>,
    pub max_rejections: usize,
}

impl Kinematics {
    /// Draws a velocity (km/s) for a star of `population` at
    /// `position` (pc, Galactocentric).
    pub fn sample<R: Rng>(
        &self,
        position: ThreeVector,
        population: Population,
        rng: &mut R,
    ) -> Result<ThreeVector, SamplingError> {
        match population {
            Population::Disk {bin, age} => self.sample_disk(position, bin, age, rng),
            Population::Bar => bar::sample(&self.bar, position, self.max_rejections, rng),
            Population::NuclearDisk => self.sample_nsd(position, rng),
        }
    }

    fn sample_disk<R: Rng>(
        &self,
        position: ThreeVector,
        bin: usize,
        age: f64,
        rng: &mut R,
    ) -> Result<ThreeVector, SamplingError> {
        let (x, y, z) = (position[0], position[1], position[2]);
        let r = x.hypot(y);

        // the star's own age sets its dispersions
        let params = self.disk.bin_params(bin, age);
        let sig_u = params.sig_u0 * (-(r - self.disk.solar_radius) / params.h_sig_u).exp();
        let sig_w = params.sig_w0 * (-(r - self.disk.solar_radius) / params.h_sig_w).exp();

        let cell = self.grid.cell(
            self.grid.spec.z_bin(z),
            self.grid.spec.r_bin(r),
            bin.min(self.grid.spec.n_age - 1),
        );

        for _ in 0..self.max_rejections {
            let fg = cell.draw(rng.gen::<f64>());
            let rg = fg * r;
            let v_phi = fg * self.rotation.v_circ(rg) / thickening(z);
            let v_r = sig_u * rng.sample::<f64,_>(StandardNormal);
            let v = ThreeVector::new(
                -v_phi * y / r + v_r * x / r,
                v_phi * x / r + v_r * y / r,
                sig_w * rng.sample::<f64,_>(StandardNormal),
            );
            if v.norm_sqr() <= ESCAPE_VELOCITY_DISK.powi(2) {
                return Ok(v);
            }
        }

        Err(SamplingError::RejectionExhausted {attempts: self.max_rejections})
    }

    fn sample_nsd<R: Rng>(
        &self,
        position: ThreeVector,
        rng: &mut R,
    ) -> Result<ThreeVector, SamplingError> {
        let (x, y, z) = (position[0], position[1], position[2]);
        let r = x.hypot(y);

        let nsd = self.nsd.as_ref()
            .ok_or(SamplingError::MissingMomentsTable)?;
        let pt = nsd.moments(r, z)
            .ok_or(SamplingError::OutsideNuclearDisk {r, z})?;

        // vz correlates with vR through the tabulated coefficient
        let fac_r = pt.cor_rz * pt.sig_z / pt.sig_r;
        let sig_z_given_r = pt.sig_z * (1.0 - pt.cor_rz.powi(2)).sqrt();

        for _ in 0..self.max_rejections {
            let v_phi = pt.v_phi + pt.sig_phi * rng.sample::<f64,_>(StandardNormal);
            let v_r = pt.sig_r * rng.sample::<f64,_>(StandardNormal);
            let v = ThreeVector::new(
                -v_phi * y / r + v_r * x / r,
                v_phi * x / r + v_r * y / r,
                fac_r * v_r + sig_z_given_r * rng.sample::<f64,_>(StandardNormal),
            );
            if v.norm_sqr() <= ESCAPE_VELOCITY_BULGE.powi(2) {
                return Ok(v);
            }
        }

        Err(SamplingError::RejectionExhausted {attempts: self.max_rejections})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_xoshiro::Xoshiro256StarStar;
    use rayon::prelude::*;
    use crate::constants::DEFAULT_MAX_REJECTIONS;
    use crate::model::GridSpec;
    use crate::shu::df::tests::flat_curve;

    fn small_engine() -> Kinematics {
        let spec = GridSpec {
            z_min: 0.0,
            z_step: 200.0,
            nz: 2,
            r_min: 8000.0,
            r_step: 100.0,
            nr: 3,
            n_age: 8,
            capacity: 100,
        };
        let disk = DiskKinematics::default();
        let rotation = flat_curve();
        let mut jitter = Xoshiro256StarStar::seed_from_u64(1);
        let grid = ShuGrid::build(spec, &disk, &rotation, &mut jitter);
        Kinematics {
            grid,
            rotation,
            disk,
            bar: BarKinematics::default(),
            nsd: None,
            max_rejections: DEFAULT_MAX_REJECTIONS,
        }
    }

    #[test]
    fn disk_velocities_rotate_and_respect_the_cap() {
        let engine = small_engine();
        let mut rng = Xoshiro256StarStar::seed_from_u64(12304357);
        let position = ThreeVector::new(8160.0, 0.0, 50.0);
        let mut mean_vy = 0.0;
        let n = 2000;
        for _ in 0..n {
            let v = engine.sample(position, Population::Disk {bin: 3, age: 2.5}, &mut rng).unwrap();
            assert!(v.norm() <= 550.0);
            mean_vy += v[1];
        }
        mean_vy /= n as f64;
        // at y = 0 the azimuthal velocity points along +y; the mean
        // should sit near the circular velocity, shy of 220 from
        // asymmetric drift
        println!("mean vy = {:.1} km/s", mean_vy);
        assert!(mean_vy > 150.0 && mean_vy < 230.0);
    }

    #[test]
    fn same_seed_same_sequence() {
        let engine = small_engine();
        let position = ThreeVector::new(8100.0, 300.0, -150.0);
        let pop = Population::Disk {bin: 5, age: 6.0};
        let mut a = Xoshiro256StarStar::seed_from_u64(42);
        let mut b = Xoshiro256StarStar::seed_from_u64(42);
        for _ in 0..100 {
            let va = engine.sample(position, pop, &mut a).unwrap();
            let vb = engine.sample(position, pop, &mut b).unwrap();
            assert_eq!(va, vb);
        }
    }

    #[test]
    fn positions_off_the_grid_clamp() {
        let engine = small_engine();
        let mut rng = Xoshiro256StarStar::seed_from_u64(7);
        // far outside the tabulated radii and heights on both sides
        for &position in &[
            ThreeVector::new(100.0, 0.0, 0.0),
            ThreeVector::new(20000.0, 0.0, 9000.0),
        ] {
            let v = engine.sample(position, Population::Disk {bin: 0, age: 0.1}, &mut rng);
            assert!(v.is_ok());
        }
    }

    #[test]
    fn bar_velocities_respect_the_cap() {
        let engine = small_engine();
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        let position = ThreeVector::new(500.0, 300.0, 100.0);
        for _ in 0..2000 {
            let v = engine.sample(position, Population::Bar, &mut rng).unwrap();
            assert!(v.norm() <= 600.0);
        }
    }

    #[test]
    fn absurd_dispersions_exhaust_the_rejection_cap() {
        let mut engine = small_engine();
        engine.bar.sig0 = [1.0e5, 1.0e5, 1.0e5];
        engine.max_rejections = 10;
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        let result = engine.sample(ThreeVector::new(500.0, 300.0, 100.0), Population::Bar, &mut rng);
        assert_eq!(result, Err(SamplingError::RejectionExhausted {attempts: 10}));
    }

    #[test]
    fn nuclear_disk_needs_a_table() {
        let engine = small_engine();
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        let result = engine.sample(ThreeVector::new(100.0, 100.0, 0.0), Population::NuclearDisk, &mut rng);
        assert_eq!(result, Err(SamplingError::MissingMomentsTable));
    }

    #[test]
    fn nuclear_disk_sampling_uses_the_moments() {
        let mut engine = small_engine();
        let mut text = String::from("# R z rho vphi sigphi sigR sigz corRz\n");
        for iz in 0..81 {
            for ir in 0..201 {
                text.push_str(&format!(
                    "{:.3} {:.3} 1.0e2 100.0 20.0 15.0 10.0 0.3\n",
                    0.005 * (ir as f64), 0.005 * (iz as f64),
                ));
            }
        }
        engine.nsd = Some(NsdMoments::from_str("test", &text).unwrap());

        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let position = ThreeVector::new(300.0, 0.0, 50.0);
        let mut mean_vy = 0.0;
        let n = 2000;
        for _ in 0..n {
            let v = engine.sample(position, Population::NuclearDisk, &mut rng).unwrap();
            assert!(v.norm() <= 600.0);
            mean_vy += v[1];
        }
        mean_vy /= n as f64;
        println!("mean vy = {:.1} km/s", mean_vy);
        assert!((mean_vy - 100.0).abs() < 3.0);

        // and a query outside the table is a hard error
        let outside = engine.sample(ThreeVector::new(1200.0, 0.0, 0.0), Population::NuclearDisk, &mut rng);
        assert!(matches!(outside, Err(SamplingError::OutsideNuclearDisk {..})));
    }

    #[test]
    fn concurrent_sampling_shares_the_engine() {
        let engine = small_engine();
        let position = ThreeVector::new(8160.0, 0.0, 50.0);
        let pop = Population::Disk {bin: 2, age: 1.5};
        let totals: Vec<f64> = (0..4u64).into_par_iter()
            .map(|worker| {
                let mut rng = Xoshiro256StarStar::seed_from_u64(1000 + worker);
                (0..500)
                    .map(|_| engine.sample(position, pop, &mut rng).unwrap().norm())
                    .sum()
            })
            .collect();
        assert_eq!(totals.len(), 4);
        for total in totals {
            assert!(total.is_finite() && total > 0.0);
        }
    }
}
