//! Precomputed guiding-radius distributions
//!
//! The disk sampler draws the ratio fg = Rg / R from a per-cell
//! inverse CDF. This module builds the grid of cells, one per
//! (height, radius, age bin), by locating each cell's density peak
//! and tabulating the normalized cumulative distribution over the
//! bracket around it.

use std::io::Write;
use colored::Colorize;
use rand::prelude::*;

use crate::constants::VC_MAX;
use crate::model::{DiskKinematics, GridSpec};
use crate::pwqci;
use crate::tables::RotationCurve;

pub mod df;
pub mod peak;

use self::df::DfColumn;

/// Tabulated inverse-CDF data for one (z, R, age) cell.
pub struct GridCell {
    /// Sampled values of fg, strictly increasing
    pub fg: Vec<f64>,
    /// Density at each sample, normalized like the cumulative
    pub density: Vec<f64>,
    /// Normalized cumulative distribution: starts at 0, ends at 1
    pub cumulative: Vec<f64>,
    /// First sample index reaching each 5% quantile; 0 means unset
    pub ptile: [usize; 21],
    /// True if the peak search failed and the cell is best-effort
    pub anomalous: bool,
}

impl GridCell {
    /// Draws fg for the uniform variate `u`, starting the inverse-CDF
    /// scan from the percentile hint. Values of `u` outside the
    /// tabulated range map to 0.
    pub fn draw(&self, u: f64) -> f64 {
        let bucket = ((20.0 * u) as usize).min(20);
        let mut start = 1;
        for b in (1..=bucket).rev() {
            if self.ptile[b] > 0 {
                start = self.ptile[b];
                break;
            }
        }
        pwqci::invert(u, &self.fg, &self.cumulative, &self.density, start)
            .unwrap_or(0.0)
    }

    // Fallback for a cell whose density vanished everywhere: a flat
    // distribution concentrated at the seed, so that sampling still
    // returns something finite.
    fn degenerate(fg: f64) -> Self {
        GridCell {
            fg: vec![fg, fg + 0.025],
            density: vec![1.0, 1.0],
            cumulative: vec![0.0, 1.0],
            ptile: [1; 21],
            anomalous: true,
        }
    }
}

/// The full grid of tabulated cells. Immutable once built, so it can
/// be shared freely between sampling threads.
pub struct ShuGrid {
    pub spec: GridSpec,
    cells: Vec<GridCell>,
}

impl ShuGrid {
    /// Tabulates every cell of `spec`. The rng feeds the peak
    /// finder's recovery jitter only.
    pub fn build<R: Rng>(
        spec: GridSpec,
        disk: &DiskKinematics,
        rotation: &RotationCurve,
        rng: &mut R,
    ) -> ShuGrid {
        let mut cells = Vec::with_capacity(spec.nz * spec.nr * spec.n_age);

        for iz in 0..spec.nz {
            let z = spec.z_at(iz);
            for ir in 0..spec.nr {
                let r = spec.r_at(ir);
                let vc_r = rotation.v_circ(r);
                for ia in 0..spec.n_age {
                    let bin = disk.age_bin(ia);
                    let col = DfColumn {
                        rotation,
                        r,
                        z,
                        bin,
                        r0: disk.solar_radius,
                    };

                    // analytic seed: the fg at which the dispersion
                    // scale would reach c = 1/2
                    let mut rg_min = disk.solar_radius
                        - bin.h_sig_u * (vc_r / bin.sig_u0).ln();
                    if rg_min > r {
                        rg_min = disk.solar_radius - bin.h_sig_u * (VC_MAX / bin.sig_u0).ln();
                    }
                    let fg_min0 = rg_min / r;
                    let seed = if fg_min0 > 1.5 {fg_min0} else {1.0};

                    let bracket = peak::locate(&col, seed, rng);
                    let anomalous = (bracket.fg_min > 1.0 && r > 1000.0)
                        || bracket.p_max == 0.0;
                    if anomalous {
                        eprintln!(
                            "{} peak search failed at z = {} pc, R = {} pc, age bin {}: fg in [{:.3}, {:.3}], Pmax = {:.3e}",
                            "Warning:".bold().yellow(),
                            z, r, ia, bracket.fg_min, bracket.fg_max, bracket.p_max,
                        );
                    }

                    if bracket.p_max == 0.0 {
                        cells.push(GridCell::degenerate(seed));
                        continue;
                    }

                    let mut cell = tabulate(&col, &bracket, spec.capacity);
                    if cell.fg.len() < 2 {
                        cell = GridCell::degenerate(bracket.fg_peak);
                    }
                    cell.anomalous = anomalous;
                    cells.push(cell);
                }
            }
        }

        ShuGrid {spec, cells}
    }

    /// The cell at the given bin indices.
    pub fn cell(&self, iz: usize, ir: usize, ia: usize) -> &GridCell {
        &self.cells[(iz * self.spec.nr + ir) * self.spec.n_age + ia]
    }

    /// Writes the diagnostic dump of every tabulated sample.
    pub fn write_dump<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w, "fgsShu start")?;
        writeln!(w, "{},{},{},{}", self.spec.nz, self.spec.nr, self.spec.n_age, self.spec.capacity)?;
        for iz in 0..self.spec.nz {
            for ir in 0..self.spec.nr {
                for ia in 0..self.spec.n_age {
                    let cell = self.cell(iz, ir, ia);
                    for k in 0..cell.fg.len() {
                        writeln!(
                            w, "{},{},{},{},{:.4},{:.4},{:.4}",
                            iz, ir, ia, k, cell.fg[k], cell.cumulative[k], cell.density[k],
                        )?;
                    }
                }
            }
        }
        writeln!(w, "fgsShu end")
    }
}

/// Tabulates one cell over the located bracket. Steps adapt to the
/// local density so the CDF is resolved most finely where it rises
/// fastest, then everything is normalized by the final cumulative
/// value.
fn tabulate(col: &DfColumn, bracket: &peak::Bracket, capacity: usize) -> GridCell {
    let dfg0 = (bracket.fg_peak - bracket.fg_min) / 40.0;
    let mut fg = bracket.fg_min;
    let mut fgs = Vec::new();
    let mut density = Vec::new();
    let mut cumulative = Vec::new();

    while fg <= bracket.fg_max && fgs.len() < capacity {
        let p = col.density(fg);
        let cumu = match fgs.len() {
            0 => 0.0,
            k => cumulative[k-1] + 0.5 * (density[k-1] + p) * (fg - fgs[k-1]),
        };
        fgs.push(fg);
        density.push(p);
        cumulative.push(cumu);

        let frac = p / bracket.p_max;
        let dfg = if frac < 0.05 {
            4.0 * dfg0
        } else if frac < 0.25 || frac > 0.7 {
            dfg0
        } else {
            2.0 * dfg0
        };
        fg += dfg;
    }

    let norm = *cumulative.last().unwrap_or(&0.0);
    let mut ptile = [0usize; 21];
    if norm > 0.0 {
        for k in 0..fgs.len() {
            density[k] /= norm;
            cumulative[k] /= norm;
            let bucket = ((20.0 * cumulative[k]) as usize).min(20);
            if ptile[bucket] == 0 {
                ptile[bucket] = if bucket == 0 {1} else {k};
            }
        }
    }

    GridCell {
        fg: fgs,
        density,
        cumulative,
        ptile,
        anomalous: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_xoshiro::Xoshiro256StarStar;
    use crate::shu::df::tests::flat_curve;

    fn small_spec() -> GridSpec {
        GridSpec {
            z_min: 0.0,
            z_step: 200.0,
            nz: 2,
            r_min: 8000.0,
            r_step: 100.0,
            nr: 3,
            n_age: 8,
            capacity: 100,
        }
    }

    fn small_grid() -> (ShuGrid, RotationCurve) {
        let curve = flat_curve();
        let disk = DiskKinematics::default();
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);
        let grid = ShuGrid::build(small_spec(), &disk, &curve, &mut rng);
        (grid, curve)
    }

    #[test]
    fn cells_satisfy_cdf_invariants() {
        let (grid, _) = small_grid();
        for iz in 0..2 {
            for ir in 0..3 {
                for ia in 0..8 {
                    let cell = grid.cell(iz, ir, ia);
                    assert!(!cell.anomalous, "cell ({}, {}, {})", iz, ir, ia);
                    assert!(cell.fg.len() > 10);
                    assert!(cell.fg.len() <= 100);
                    assert_eq!(cell.cumulative[0], 0.0);
                    let last = *cell.cumulative.last().unwrap();
                    assert!((last - 1.0).abs() < 1.0e-12);
                    for k in 1..cell.fg.len() {
                        assert!(cell.fg[k] > cell.fg[k-1]);
                        assert!(cell.cumulative[k] >= cell.cumulative[k-1]);
                    }
                    // set percentile hints never decrease
                    let hints: Vec<usize> = cell.ptile.iter().copied()
                        .filter(|k| *k > 0)
                        .collect();
                    for w in hints.windows(2) {
                        assert!(w[1] >= w[0]);
                    }
                    // and each set hint has crossed its bucket's quantile
                    for b in 1..21 {
                        if cell.ptile[b] > 0 {
                            assert!(cell.cumulative[cell.ptile[b]] >= 0.05 * (b as f64));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn rebuilds_with_the_same_jitter_seed_are_identical() {
        let curve = flat_curve();
        let disk = DiskKinematics::default();
        let mut rng_a = Xoshiro256StarStar::seed_from_u64(5);
        let mut rng_b = Xoshiro256StarStar::seed_from_u64(5);
        let a = ShuGrid::build(small_spec(), &disk, &curve, &mut rng_a);
        let b = ShuGrid::build(small_spec(), &disk, &curve, &mut rng_b);
        for iz in 0..2 {
            for ir in 0..3 {
                for ia in 0..8 {
                    let (ca, cb) = (a.cell(iz, ir, ia), b.cell(iz, ir, ia));
                    assert_eq!(ca.fg, cb.fg);
                    assert_eq!(ca.density, cb.density);
                    assert_eq!(ca.cumulative, cb.cumulative);
                    assert_eq!(ca.ptile, cb.ptile);
                    assert_eq!(ca.anomalous, cb.anomalous);
                }
            }
        }
    }

    #[test]
    fn draw_round_trips_tabulated_quantiles() {
        let (grid, _) = small_grid();
        let cell = grid.cell(0, 0, 3);
        for k in 1..cell.fg.len() - 1 {
            let fg = cell.draw(cell.cumulative[k]);
            assert!(
                (fg - cell.fg[k]).abs() < 1.0e-6,
                "k = {}: drew {}, expected {}", k, fg, cell.fg[k],
            );
        }
    }

    #[test]
    fn draw_maps_out_of_range_to_zero() {
        let (grid, _) = small_grid();
        let cell = grid.cell(0, 0, 0);
        assert_eq!(cell.draw(-0.01), 0.0);
        assert_eq!(cell.draw(1.01), 0.0);
    }

    #[test]
    fn median_draw_lands_near_the_peak() {
        let (grid, _) = small_grid();
        let cell = grid.cell(0, 1, 3);
        let median = cell.draw(0.5);
        println!("median fg = {}", median);
        assert!(median > 0.7 && median < 1.2);
    }

    #[test]
    fn dump_is_delimited_and_dense() {
        let (grid, _) = small_grid();
        let mut out = Vec::new();
        grid.write_dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("fgsShu start"));
        assert_eq!(lines.next(), Some("2,3,8,100"));
        assert_eq!(text.lines().last(), Some("fgsShu end"));
        // one line per tabulated sample
        let total: usize = (0..2).flat_map(|iz| (0..3).map(move |ir| (iz, ir)))
            .flat_map(|(iz, ir)| (0..8).map(move |ia| (iz, ir, ia)))
            .map(|(iz, ir, ia)| grid.cell(iz, ir, ia).fg.len())
            .sum();
        assert_eq!(text.lines().count(), total + 3);
    }
}
