//! Velocity moments of the nuclear stellar disk

use std::path::Path;
use crate::interp;
use super::LoadError;

/// Extent of the moments grid: z from 0 to 400 pc, R from 0 to 1000 pc,
/// both in steps of 5 pc.
pub const Z_MAX: f64 = 400.0;
pub const R_MAX: f64 = 1000.0;
const STEP: f64 = 5.0;

/// Velocity moments of the nuclear stellar disk on a regular (R, z)
/// grid, read from a table of the Sormani et al. 2021 DF model.
/// Dispersions are stored as log10 and interpolated in log space.
/// Immutable once loaded.
pub struct NsdMoments {
    nr: usize,
    nz: usize,
    v_phi: Vec<f64>,
    log_sig_phi: Vec<f64>,
    log_sig_r: Vec<f64>,
    log_sig_z: Vec<f64>,
    cor_rz: Vec<f64>,
}

/// Interpolated moments at a single position.
#[derive(Copy,Clone,Debug)]
pub struct NsdPoint {
    /// Mean azimuthal velocity, km/s
    pub v_phi: f64,
    /// Azimuthal velocity dispersion, km/s
    pub sig_phi: f64,
    /// Radial velocity dispersion, km/s
    pub sig_r: f64,
    /// Vertical velocity dispersion, km/s
    pub sig_z: f64,
    /// Correlation coefficient between the radial and vertical velocities
    pub cor_rz: f64,
}

impl NsdMoments {
    /// Loads the moments table from `path`.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let name = path.display().to_string();
        let contents = std::fs::read_to_string(path)
            .map_err(|_| LoadError::File(name.clone()))?;
        Self::from_str(&name, &contents)
    }

    /// Parses the moments table. Data rows hold eight whitespace-delimited
    /// columns (R and z in kpc, then rho, mean vphi, sigphi, sigR, sigz and
    /// the vR-vz correlation); '#' starts a comment. Rows must arrive in
    /// grid order, R varying fastest, and each row's coordinates must land
    /// on the expected grid point.
    pub fn from_str(name: &str, contents: &str) -> Result<Self, LoadError> {
        let nr = (R_MAX / STEP) as usize + 1;
        let nz = (Z_MAX / STEP) as usize + 1;

        let mut table = NsdMoments {
            nr,
            nz,
            v_phi: Vec::with_capacity(nr * nz),
            log_sig_phi: Vec::with_capacity(nr * nz),
            log_sig_r: Vec::with_capacity(nr * nz),
            log_sig_z: Vec::with_capacity(nr * nz),
            cor_rz: Vec::with_capacity(nr * nz),
        };

        for (i, line) in contents.lines().enumerate() {
            let data = line.split('#').next().unwrap_or("").trim();
            if data.is_empty() {
                continue;
            }

            let fields: Result<Vec<f64>, _> = data.split_whitespace()
                .map(|s| s.parse::<f64>())
                .collect();
            let fields = match fields {
                Ok(f) if f.len() == 8 => f,
                _ => return Err(LoadError::Syntax(name.to_owned(), i + 1)),
            };

            // rows arrive R-fastest; check this one lands where expected
            let k = table.v_phi.len();
            let r_expected = STEP * ((k % nr) as f64);
            let z_expected = STEP * ((k / nr) as f64);
            if (1.0e3 * fields[0] - r_expected).abs() > 1.0e-6
                || (1.0e3 * fields[1] - z_expected).abs() > 1.0e-6 {
                return Err(LoadError::Grid(name.to_owned(), i + 1));
            }

            table.v_phi.push(fields[3]);
            table.log_sig_phi.push(fields[4].log10());
            table.log_sig_r.push(fields[5].log10());
            table.log_sig_z.push(fields[6].log10());
            table.cor_rz.push(fields[7]);
        }

        if table.v_phi.len() != nr * nz {
            return Err(LoadError::Length(name.to_owned()));
        }

        Ok(table)
    }

    /// Returns the bilinearly interpolated moments at radius `r` and
    /// height `z` (both pc, z of either sign), or None if the position
    /// lies outside the tabulated grid.
    pub fn moments(&self, r: f64, z: f64) -> Option<NsdPoint> {
        let z = z.abs();
        if r > R_MAX || z > Z_MAX {
            return None;
        }

        let ws = interp::bilinear_weights(self.nr, self.nz, 0.0, 0.0, STEP, STEP, r, z);
        if ws.iter().all(|(_, _, w)| *w == 0.0) {
            return None;
        }

        let gather = |table: &[f64]| -> f64 {
            ws.iter().map(|(ir, iz, w)| w * table[iz * self.nr + ir]).sum()
        };

        Some(NsdPoint {
            v_phi: gather(&self.v_phi),
            sig_phi: 10.0f64.powf(gather(&self.log_sig_phi)),
            sig_r: 10.0f64.powf(gather(&self.log_sig_r)),
            sig_z: 10.0f64.powf(gather(&self.log_sig_z)),
            cor_rz: gather(&self.cor_rz),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // builds a full table whose moments vary linearly with R and z
    fn synthetic_table() -> String {
        let mut text = String::from("# R z rho vphi sigphi sigR sigz corRz\n");
        for iz in 0..81 {
            for ir in 0..201 {
                let r = 0.005 * (ir as f64);
                let z = 0.005 * (iz as f64);
                let vphi = 100.0 + 10.0 * r + 20.0 * z;
                text.push_str(&format!(
                    "{:.3} {:.3} 1.0e2 {:.6} 50.0 40.0 30.0 0.25\n",
                    r, z, vphi,
                ));
            }
        }
        text
    }

    #[test]
    fn interpolates_moments() {
        let table = NsdMoments::from_str("test", &synthetic_table()).unwrap();
        let pt = table.moments(502.5, -102.5).unwrap();
        let target = 100.0 + 10.0 * 0.5025 + 20.0 * 0.1025;
        println!("vphi = {}, target = {}", pt.v_phi, target);
        assert!((pt.v_phi - target).abs() < 1.0e-9);
        assert!((pt.sig_phi - 50.0).abs() < 1.0e-9);
        assert!((pt.sig_r - 40.0).abs() < 1.0e-9);
        assert!((pt.sig_z - 30.0).abs() < 1.0e-9);
        assert!((pt.cor_rz - 0.25).abs() < 1.0e-12);
    }

    #[test]
    fn none_outside_grid() {
        let table = NsdMoments::from_str("test", &synthetic_table()).unwrap();
        assert!(table.moments(1000.1, 0.0).is_none());
        assert!(table.moments(500.0, 400.1).is_none());
        assert!(table.moments(1000.0, 400.0).is_some());
    }

    #[test]
    fn rejects_off_grid_row() {
        let mut text = synthetic_table();
        // corrupt the first data row's radius
        text = text.replacen("0.000 0.000", "0.001 0.000", 1);
        match NsdMoments::from_str("test", &text) {
            Err(LoadError::Grid(_, line)) => assert_eq!(line, 2),
            other => panic!("expected a grid error, got {:?}", other.err()),
        }
    }

    #[test]
    fn rejects_truncated_table() {
        let text = "0.000 0.000 1.0e2 100.0 50.0 40.0 30.0 0.25\n";
        assert!(matches!(
            NsdMoments::from_str("test", text),
            Err(LoadError::Length(_))
        ));
    }
}
