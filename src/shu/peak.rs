//! Locates the maximum of the guiding-radius marginal
//!
//! The density is smooth but its peak can sit close to the edge of
//! the support, so a plain Newton iteration on the finite-difference
//! slope needs recovery branches: jittered restarts on overshoot,
//! curvature probes to decide which side of the peak an iterate sits
//! on, and a verification scan that widens the search when a better
//! peak turns up. Each phase carries a hard cap on its transitions,
//! so the search always terminates; exhausting a cap yields a
//! best-effort bracket flagged as unconverged.

use rand::prelude::*;
use super::df::{DfColumn, SLOPE_STEP};

/// Evaluations allowed per Newton attempt
const MAX_EVALS: usize = 15;
/// Jittered restarts allowed after an exhausted attempt
const MAX_RESTARTS: usize = 2;
/// Rounds of the verification scan
const MAX_VERIFY_ROUNDS: usize = 8;
/// Offset of the curvature probes
const PROBE_OFFSET: f64 = 0.04;
/// Step of the verification scan
const COARSE_STEP: f64 = 0.2;
/// Step used to sharpen the bracket edges
const FINE_STEP: f64 = 0.05;
/// Fraction of the peak density treated as the bracket threshold
const TAIL_FRACTION: f64 = 1.0e-2;
/// Largest acceptable |dP/dfg| / Pmax at the located peak
const SLOPE_TOLERANCE: f64 = 0.1;
/// Relative dispersion scale below which a coarse pre-scan
/// replaces the analytic seed
const PRESCAN_THRESHOLD: f64 = 0.1;

/// Result of the search: the peak and the interval over which the
/// density exceeds [`TAIL_FRACTION`] of it.
#[derive(Copy,Clone,Debug)]
pub struct Bracket {
    /// Largest density found
    pub p_max: f64,
    /// Lower edge of the bracket, in fg
    pub fg_min: f64,
    /// Upper edge of the bracket, in fg
    pub fg_max: f64,
    /// Location of the peak, in fg
    pub fg_peak: f64,
    /// False if a phase exhausted its cap
    pub converged: bool,
}

enum Phase {
    Refining,
    Verifying,
    Bracketing,
}

/// Finds the peak of `col`, starting from the analytic seed
/// `seed_fg`. The rng feeds only the recovery jitter, so it never
/// influences the result when the first Newton attempt converges.
pub fn locate<R: Rng>(col: &DfColumn, seed_fg: f64, rng: &mut R) -> Bracket {
    let mut fg1 = seed_fg.max(1.0);

    // When the dispersion is large compared to the density scale the
    // peak can sit well inside fg = 1; seed from a coarse scan instead.
    if col.bin.h_sig_u / (col.bin.rd * col.bin.sig_u0) < PRESCAN_THRESHOLD {
        let mut best = 0.0;
        let mut fg = 0.15;
        while fg < 1.0 {
            let p = col.density(fg);
            if p > best {
                best = p;
                fg1 = fg;
            }
            fg += 0.05;
        }
    }

    let mut p_max = 0.0;
    let mut fg_peak = f64::NAN;
    let mut fg_min = 0.0;
    let mut fg_max = 0.0;
    let mut converged = true;
    let mut verify_rounds = 0;
    let mut phase = Phase::Refining;

    loop {
        match phase {
            Phase::Refining => {
                converged = refine(col, fg1, &mut fg_peak, &mut p_max, rng) && converged;
                if p_max <= 0.0 {
                    // the density vanished everywhere we looked
                    return Bracket {
                        p_max: 0.0,
                        fg_min: fg1,
                        fg_max: fg1,
                        fg_peak: fg1,
                        converged: false,
                    };
                }
                phase = Phase::Verifying;
            }

            Phase::Verifying => {
                verify_rounds += 1;
                if verify_rounds > MAX_VERIFY_ROUNDS {
                    converged = false;
                    phase = Phase::Bracketing;
                    continue;
                }

                let mut improved = false;

                // scan down from the peak until the density falls into
                // the tail; a clearly better point restarts refinement
                let mut fg = fg_peak - COARSE_STEP;
                while fg > 0.1 {
                    let p = col.density(fg);
                    if p > 1.05 * p_max {
                        p_max = p;
                        fg_peak = fg;
                        improved = true;
                    }
                    if p / p_max < TAIL_FRACTION {
                        break;
                    }
                    fg -= COARSE_STEP;
                }
                fg_min = fg;

                if improved {
                    fg1 = fg_peak;
                    phase = Phase::Refining;
                    continue;
                }

                // and up
                let mut fg = fg_peak + COARSE_STEP;
                while fg < 4.0 {
                    let p = col.density(fg);
                    if p > 1.05 * p_max {
                        p_max = p;
                        fg_peak = fg;
                        improved = true;
                        break;
                    }
                    if p / p_max < TAIL_FRACTION {
                        break;
                    }
                    fg += COARSE_STEP;
                }
                fg_max = fg;

                if improved {
                    fg1 = fg_peak;
                    phase = Phase::Refining;
                } else {
                    phase = Phase::Bracketing;
                }
            }

            Phase::Bracketing => {
                fg_min = fg_min.max(0.0);
                // tighten each edge back toward the threshold crossing
                let mut moved = 0.0;
                while moved + FINE_STEP < COARSE_STEP {
                    let p = col.density(fg_min + FINE_STEP);
                    if p / p_max < TAIL_FRACTION {
                        fg_min += FINE_STEP;
                        moved += FINE_STEP;
                    } else {
                        break;
                    }
                }
                moved = 0.0;
                while moved + FINE_STEP < COARSE_STEP && fg_max - FINE_STEP > fg_peak {
                    let p = col.density(fg_max - FINE_STEP);
                    if p / p_max < TAIL_FRACTION {
                        fg_max -= FINE_STEP;
                        moved += FINE_STEP;
                    } else {
                        break;
                    }
                }
                return Bracket {p_max, fg_min, fg_max, fg_peak, converged};
            }
        }
    }
}

/// One bounded Newton search, run in groups of three steps. Updates
/// the running best (fg_peak, p_max) and returns whether the slope at
/// the best point satisfies the tolerance.
fn refine<R: Rng>(col: &DfColumn, seed: f64, fg_peak: &mut f64, p_max: &mut f64, rng: &mut R) -> bool {
    let mut fg1 = seed;
    let mut dp_at_peak = 0.0;
    let mut ntry = 0;
    let mut nudges = 0;
    let mut ncalc = 0;

    let mut j = 0;
    while j < 3 {
        let (dp1, p1) = col.slope(fg1);
        let (dp2, _) = col.slope(fg1 + SLOPE_STEP);
        let mut curvature = (dp2 - dp1) / SLOPE_STEP;

        if p1 > *p_max {
            *p_max = p1;
            *fg_peak = fg1;
            dp_at_peak = dp1;
        }

        ncalc += 1;
        if ncalc > MAX_EVALS {
            if nudges > 0 || ntry >= MAX_RESTARTS {
                break;
            }
            // restart on the other side of the best point so far
            if fg_peak.is_nan() {
                *fg_peak = if ntry == 0 {fg1} else {0.9};
            }
            fg1 = if ntry == 0 {*fg_peak - 0.4} else {*fg_peak + 0.4};
            if fg1 < 0.0 {
                fg1 = 0.2 * rng.gen::<f64>();
            }
            ncalc = 0;
            ntry += 1;
            j = 0;
            continue;
        }

        // after each group, accept only a peak whose slope is small
        if j == 2 && *p_max > 0.0 && (dp_at_peak / *p_max).abs() > SLOPE_TOLERANCE {
            nudges += 1;
            let step = 0.05 / (nudges as f64) * rng.gen::<f64>();
            fg1 = if dp_at_peak > 0.0 {*fg_peak + step} else {*fg_peak - step};
            j = 0;
            continue;
        }

        if dp1 == 0.0 {
            // outside the support entirely; jump toward the peak,
            // or upward while no peak has been seen yet
            let jump = if dp_at_peak == 0.0 {0.5} else {0.2 * rng.gen::<f64>()};
            fg1 = if fg_peak.is_nan() || fg1 < *fg_peak {fg1 + jump} else {fg1 - jump};
            j = 0;
            continue;
        }

        if curvature > 0.0 && dp1 < 0.0 {
            // either far beyond the peak, or finite-difference noise:
            // probe further out to tell the two apart
            let (dp3, _) = col.slope(fg1 + SLOPE_STEP + PROBE_OFFSET);
            let (dp4, _) = col.slope(fg1 + 2.0 * SLOPE_STEP + PROBE_OFFSET);
            let probed = (dp4 - dp3) / SLOPE_STEP;
            if probed > 0.0 || dp3 == 0.0 {
                fg1 -= 0.02 + 0.10 * rng.gen::<f64>();
                j = 0;
                continue;
            }
            curvature = probed;
        }

        if curvature > 0.0 && dp1 > 0.0 {
            // mirror image: possibly far before the peak
            let (dp3, _) = col.slope(fg1 - PROBE_OFFSET);
            let (dp4, _) = col.slope(fg1 + SLOPE_STEP - PROBE_OFFSET);
            let probed = (dp4 - dp3) / SLOPE_STEP;
            if probed > 0.0 || dp3 == 0.0 {
                fg1 += 0.02 + 0.10 * rng.gen::<f64>();
                j = 0;
                continue;
            }
            curvature = probed;
        }

        if curvature != 0.0 {
            let step = dp1 / curvature;
            fg1 -= step;
            if fg1 < 0.0 {
                fg1 = 0.1;
            }
            if step.abs() > 0.5 {
                // overshot; restart with jitter near the best point
                let jitter = if dp_at_peak > 0.0 {0.10} else {-0.10};
                fg1 = *fg_peak + jitter * rng.gen::<f64>();
                j = 0;
                continue;
            }
        }

        j += 1;
    }

    *p_max > 0.0 && (dp_at_peak / *p_max).abs() <= SLOPE_TOLERANCE
}
