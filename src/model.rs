//! Model parameters for the disk and bar kinematics
//!
//! Everything the sampler needs to know about the Galactic model is
//! collected into immutable context values, built once from the input
//! configuration (or from the published fit defaults) and then shared
//! by reference.

use crate::input::{Config, InputError};

/// Velocity-dispersion parameters of a single disk population.
#[derive(Copy,Clone,Debug)]
pub struct AgeBin {
    /// Median age of the population, Gyr
    pub median_age: f64,
    /// Radial velocity dispersion at the solar radius, km/s
    pub sig_u0: f64,
    /// Vertical velocity dispersion at the solar radius, km/s
    pub sig_w0: f64,
    /// Radial scale length of sigma_U, pc
    pub h_sig_u: f64,
    /// Radial scale length of sigma_W, pc
    pub h_sig_w: f64,
    /// Scale radius of the population's surface density, pc
    pub rd: f64,
}

/// Disk kinematic parameters: the age-dispersion relation of the thin
/// disk, the thick-disk dispersions, and the scale lengths over which
/// the dispersions fall with radius.
#[derive(Clone,Debug)]
pub struct DiskKinematics {
    /// Galactocentric radius of the Sun, pc
    pub solar_radius: f64,
    /// sigma_U of a 10 Gyr thin-disk population at the solar radius, km/s
    pub sig_u_10: f64,
    /// sigma_W of a 10 Gyr thin-disk population at the solar radius, km/s
    pub sig_w_10: f64,
    /// Exponent of the thin-disk age-sigma_U relation
    pub beta_u: f64,
    /// Exponent of the thin-disk age-sigma_W relation
    pub beta_w: f64,
    /// Scale length of sigma_U for the thin disk, pc
    pub h_sig_u_thin: f64,
    /// Scale length of sigma_W for the thin disk, pc
    pub h_sig_w_thin: f64,
    /// sigma_U of the thick disk at the solar radius, km/s
    pub sig_u0_thick: f64,
    /// sigma_W of the thick disk at the solar radius, km/s
    pub sig_w0_thick: f64,
    /// Scale length of sigma_U for the thick disk, pc
    pub h_sig_u_thick: f64,
    /// Scale length of sigma_W for the thick disk, pc
    pub h_sig_w_thick: f64,
    /// Median ages of the 8 populations (7 thin bins + thick), Gyr
    pub median_ages: Vec<f64>,
    /// Scale radii of the youngest thin bin, the other thin bins
    /// and the thick disk, pc
    pub rd: [f64; 3],
}

impl Default for DiskKinematics {
    fn default() -> Self {
        DiskKinematics {
            solar_radius: 8160.0,
            sig_u_10: 42.0,
            sig_w_10: 24.4,
            beta_u: 0.32,
            beta_w: 0.77,
            h_sig_u_thin: 14300.0,
            h_sig_w_thin: 5900.0,
            sig_u0_thick: 75.0,
            sig_w0_thick: 49.2,
            h_sig_u_thick: 180000.0,
            h_sig_w_thick: 9400.0,
            median_ages: vec![
                0.075273, 0.586449, 1.516357, 2.516884,
                4.068387, 6.069263, 8.656024, 12.0,
            ],
            rd: [5000.0, 2600.0, 2200.0],
        }
    }
}

impl DiskKinematics {
    /// Number of age bins (thin bins plus the thick disk).
    pub fn num_bins(&self) -> usize {
        self.median_ages.len()
    }

    /// Index of the thick-disk bin.
    pub fn thick_bin(&self) -> usize {
        self.median_ages.len() - 1
    }

    /// Returns the dispersion parameters of age bin `i`, evaluated at
    /// the population's median age.
    pub fn age_bin(&self, i: usize) -> AgeBin {
        self.bin_params(i, self.median_ages[i])
    }

    /// Returns the dispersion parameters of age bin `i` for a star of
    /// age `tau` (Gyr). Thin-disk dispersions grow with age as
    /// sig_10 ((tau + 0.01) / 10.01)^beta; the thick disk's are fixed.
    pub fn bin_params(&self, i: usize, tau: f64) -> AgeBin {
        let thick = i >= self.thick_bin();
        let (sig_u0, sig_w0) = if thick {
            (self.sig_u0_thick, self.sig_w0_thick)
        } else {
            let x = (tau + 0.01) / 10.01;
            (self.sig_u_10 * x.powf(self.beta_u), self.sig_w_10 * x.powf(self.beta_w))
        };
        AgeBin {
            median_age: tau,
            sig_u0,
            sig_w0,
            h_sig_u: if thick {self.h_sig_u_thick} else {self.h_sig_u_thin},
            h_sig_w: if thick {self.h_sig_w_thick} else {self.h_sig_w_thin},
            rd: if i == 0 {self.rd[0]} else if thick {self.rd[2]} else {self.rd[1]},
        }
    }

    /// Reads the disk parameters from the `disk:` section, falling
    /// back to the defaults for any key not present.
    pub fn from_config(config: &Config) -> Result<Self, InputError> {
        let defaults = Self::default();
        let rd: Vec<f64> = config.read("disk:rd")
            .unwrap_or_else(|_| defaults.rd.to_vec());
        if rd.len() != 3 {
            return Err(InputError::conversion("disk:rd", "rd"));
        }
        let median_ages: Vec<f64> = config.read("disk:median_ages")
            .unwrap_or(defaults.median_ages);
        if median_ages.len() < 2 {
            return Err(InputError::conversion("disk:median_ages", "median_ages"));
        }
        Ok(DiskKinematics {
            solar_radius: config.read("disk:solar_radius").unwrap_or(defaults.solar_radius),
            sig_u_10: config.read("disk:sig_u_10").unwrap_or(defaults.sig_u_10),
            sig_w_10: config.read("disk:sig_w_10").unwrap_or(defaults.sig_w_10),
            beta_u: config.read("disk:beta_u").unwrap_or(defaults.beta_u),
            beta_w: config.read("disk:beta_w").unwrap_or(defaults.beta_w),
            h_sig_u_thin: config.read("disk:h_sig_u_thin").unwrap_or(defaults.h_sig_u_thin),
            h_sig_w_thin: config.read("disk:h_sig_w_thin").unwrap_or(defaults.h_sig_w_thin),
            sig_u0_thick: config.read("disk:sig_u0_thick").unwrap_or(defaults.sig_u0_thick),
            sig_w0_thick: config.read("disk:sig_w0_thick").unwrap_or(defaults.sig_w0_thick),
            h_sig_u_thick: config.read("disk:h_sig_u_thick").unwrap_or(defaults.h_sig_u_thick),
            h_sig_w_thick: config.read("disk:h_sig_w_thick").unwrap_or(defaults.h_sig_w_thick),
            median_ages,
            rd: [rd[0], rd[1], rd[2]],
        })
    }
}

/// Shape of a bar velocity-dispersion profile.
#[derive(Copy,Clone,Debug,PartialEq)]
pub enum SigmaProfile {
    Exponential,
    Gaussian,
    Sech2,
    /// exp(-r^c3)
    Power,
}

impl SigmaProfile {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "exponential" => Some(SigmaProfile::Exponential),
            "gaussian" => Some(SigmaProfile::Gaussian),
            "sech2" => Some(SigmaProfile::Sech2),
            "power" => Some(SigmaProfile::Power),
            _ => None,
        }
    }
}

/// Spatial shape of one dispersion component: a superellipsoidal
/// radius built from the bar-frame coordinates, fed through a radial
/// profile.
#[derive(Copy,Clone,Debug)]
pub struct SigmaShape {
    pub x0: f64,
    pub y0: f64,
    pub z0: f64,
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub profile: SigmaProfile,
}

impl SigmaShape {
    /// Evaluates the profile at the bar-frame position.
    pub fn factor(&self, xb: f64, yb: f64, zb: f64) -> f64 {
        let xn = (xb / self.x0).abs();
        let yn = (yb / self.y0).abs();
        let zn = (zb / self.z0).abs();
        let rs = xn.powf(self.c1) + yn.powf(self.c1);
        let rs = (rs.powf(self.c2 / self.c1) + zn.powf(self.c2)).powf(1.0 / self.c2);
        match self.profile {
            SigmaProfile::Exponential => (-rs).exp(),
            SigmaProfile::Gaussian => (-0.5 * rs * rs).exp(),
            SigmaProfile::Sech2 => (2.0 / (rs.exp() + (-rs).exp())).powi(2),
            SigmaProfile::Power => (-rs.powf(self.c3)).exp(),
        }
    }

    fn from_config(config: &Config, prefix: &str, defaults: SigmaShape) -> Result<SigmaShape, InputError> {
        let profile = match config.read::<String, _>(format!("{}:profile", prefix)) {
            Ok(name) => SigmaProfile::from_name(&name)
                .ok_or_else(|| InputError::conversion(prefix, &name))?,
            Err(_) => defaults.profile,
        };
        Ok(SigmaShape {
            x0: config.read(format!("{}:x0", prefix)).unwrap_or(defaults.x0),
            y0: config.read(format!("{}:y0", prefix)).unwrap_or(defaults.y0),
            z0: config.read(format!("{}:z0", prefix)).unwrap_or(defaults.z0),
            c1: config.read(format!("{}:c1", prefix)).unwrap_or(defaults.c1),
            c2: config.read(format!("{}:c2", prefix)).unwrap_or(defaults.c2),
            c3: config.read(format!("{}:c3", prefix)).unwrap_or(defaults.c3),
            profile,
        })
    }
}

/// Bar kinematic parameters. Defaults are the E+E_X model fit of
/// Koshimoto et al. 2021.
#[derive(Clone,Debug)]
pub struct BarKinematics {
    /// Pattern speed, km/s/kpc
    pub omega_p: f64,
    /// Angle between the bar's major axis and the Sun-GC line, radians
    pub angle: f64,
    /// Amplitude of the x-direction streaming motion, km/s
    pub vx_str: f64,
    /// Scale of the streaming turn-on with bar-frame y, pc
    pub y0_str: f64,
    /// Central dispersion amplitudes (x, y, z), km/s
    pub sig: [f64; 3],
    /// Dispersion floors far from the bar (x, y, z), km/s
    pub sig0: [f64; 3],
    /// Shape of the in-plane dispersion profile
    pub shape: SigmaShape,
    /// Shape of the vertical dispersion profile
    pub shape_z: SigmaShape,
}

impl Default for BarKinematics {
    fn default() -> Self {
        BarKinematics {
            omega_p: 47.4105844018699,
            angle: 27.0 * std::f64::consts::PI / 180.0,
            vx_str: 43.0364707040617,
            y0_str: 406.558313420815,
            sig: [151.854794853683, 78.0278905748233, 81.9641955092164],
            sig0: [63.9939241108675, 75.8180486866697, 71.2336430487113],
            shape: SigmaShape {
                x0: 858.106595717275,
                y0: 3217.04987721548,
                z0: 950.690583433628,
                c1: 4.25236641149869,
                c2: 1.02531652066343,
                c3: 1.0,
                profile: SigmaProfile::Exponential,
            },
            shape_z: SigmaShape {
                x0: 558.430182718529,
                y0: 2003.21703656302,
                z0: 3823.20855045157,
                c1: 3.71001266000693,
                c2: 1.07455173734341,
                c3: 1.0,
                profile: SigmaProfile::Exponential,
            },
        }
    }
}

impl BarKinematics {
    /// Reads the bar parameters from the `bar:` section, falling back
    /// to the defaults for any key not present.
    pub fn from_config(config: &Config) -> Result<Self, InputError> {
        let defaults = Self::default();
        Ok(BarKinematics {
            omega_p: config.read("bar:omega_p").unwrap_or(defaults.omega_p),
            angle: config.read("bar:angle").unwrap_or(defaults.angle),
            vx_str: config.read("bar:vx_str").unwrap_or(defaults.vx_str),
            y0_str: config.read("bar:y0_str").unwrap_or(defaults.y0_str),
            sig: [
                config.read("bar:sig_x").unwrap_or(defaults.sig[0]),
                config.read("bar:sig_y").unwrap_or(defaults.sig[1]),
                config.read("bar:sig_z").unwrap_or(defaults.sig[2]),
            ],
            sig0: [
                config.read("bar:sig_x0").unwrap_or(defaults.sig0[0]),
                config.read("bar:sig_y0").unwrap_or(defaults.sig0[1]),
                config.read("bar:sig_z0").unwrap_or(defaults.sig0[2]),
            ],
            shape: SigmaShape::from_config(config, "bar:shape", defaults.shape)?,
            shape_z: SigmaShape::from_config(config, "bar:shape_z", defaults.shape_z)?,
        })
    }
}

/// Extent and resolution of the precomputed guiding-radius grid.
#[derive(Copy,Clone,Debug)]
pub struct GridSpec {
    /// Smallest tabulated height, pc
    pub z_min: f64,
    /// Height spacing, pc
    pub z_step: f64,
    /// Number of height bins
    pub nz: usize,
    /// Smallest tabulated radius, pc
    pub r_min: f64,
    /// Radius spacing, pc
    pub r_step: f64,
    /// Number of radius bins
    pub nr: usize,
    /// Number of age bins
    pub n_age: usize,
    /// Largest number of samples tabulated per cell
    pub capacity: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        GridSpec {
            z_min: 0.0,
            z_step: 200.0,
            nz: 19,
            r_min: 500.0,
            r_step: 100.0,
            nr: 118,
            n_age: 8,
            capacity: 100,
        }
    }
}

impl GridSpec {
    /// Height of bin `iz`, pc.
    pub fn z_at(&self, iz: usize) -> f64 {
        self.z_min + self.z_step * (iz as f64)
    }

    /// Radius of bin `ir`, pc.
    pub fn r_at(&self, ir: usize) -> f64 {
        self.r_min + self.r_step * (ir as f64)
    }

    /// Bin index of height `z`, clamped to the grid.
    pub fn z_bin(&self, z: f64) -> usize {
        let i = (z.abs() - self.z_min) / self.z_step;
        (i.max(0.0) as usize).min(self.nz - 1)
    }

    /// Bin index of radius `r`, clamped to the grid.
    pub fn r_bin(&self, r: f64) -> usize {
        let i = (r - self.r_min) / self.r_step;
        (i.max(0.0) as usize).min(self.nr - 1)
    }

    /// Reads the grid extent from the `grid:` section, falling back
    /// to the defaults for any key not present.
    pub fn from_config(config: &Config, n_age: usize) -> Result<Self, InputError> {
        let defaults = Self::default();
        let z_step: f64 = config.read("grid:z_step").unwrap_or(defaults.z_step);
        let z_max: f64 = config.read("grid:z_max").unwrap_or(3600.0);
        let r_min: f64 = config.read("grid:r_min").unwrap_or(defaults.r_min);
        let r_step: f64 = config.read("grid:r_step").unwrap_or(defaults.r_step);
        let r_max: f64 = config.read("grid:r_max").unwrap_or(12200.0);
        if z_step <= 0.0 || r_step <= 0.0 || z_max < 0.0 || r_max < r_min {
            return Err(InputError::conversion("grid", "extent"));
        }
        Ok(GridSpec {
            z_min: 0.0,
            z_step,
            nz: (z_max / z_step).round() as usize + 1,
            r_min,
            r_step,
            nr: ((r_max - r_min) / r_step).round() as usize + 1,
            n_age,
            capacity: config.read("grid:capacity").unwrap_or(defaults.capacity),
        })
    }
}
