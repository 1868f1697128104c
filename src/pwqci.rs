//! Piecewise quadratic cumulative inversion
//!
//! Inverts a tabulated cumulative distribution whose density is
//! piecewise linear, so that the cumulative is piecewise quadratic
//! between samples and the inversion reduces to a root of a
//! quadratic on each panel.

/// Solves `cdf(x) == u` for x, where `cdf` is the cumulative
/// distribution of the piecewise-linear density `pdf`, both tabulated
/// at the points `xs`. The forward scan for the bracketing panel
/// begins at index `start` (clamped to 1), which callers with a
/// percentile hint use to skip most of the table.
///
/// Returns None if `u` lies outside the tabulated cumulative range.
pub fn invert(u: f64, xs: &[f64], cdf: &[f64], pdf: &[f64], start: usize) -> Option<f64> {
    let n = xs.len();
    if n < 2 || u < cdf[0] || u > cdf[n-1] {
        return None;
    }

    // Find the i for which cdf[i-1] <= u <= cdf[i]
    let mut i = start.max(1);
    while i < n && u > cdf[i] {
        i += 1;
    }
    if i >= n {
        return None;
    }

    let dx = xs[i] - xs[i-1];
    let a = 0.5 * (pdf[i] - pdf[i-1]) / dx;

    if a == 0.0 {
        // flat density across the panel, cumulative is linear in x
        let df = cdf[i] - cdf[i-1];
        if df == 0.0 {
            return Some(xs[i-1]);
        }
        return Some(xs[i-1] + dx * (u - cdf[i-1]) / df);
    }

    // On the panel, cdf(x) = cdf[i-1] + integral of the linear density
    // from xs[i-1], i.e. a x^2 + b x + (c - u) == 0 with:
    let b = pdf[i-1] - 2.0 * a * xs[i-1];
    let c = a * xs[i-1].powi(2) - pdf[i-1] * xs[i-1] + cdf[i-1] - u;

    let disc = (b.powi(2) - 4.0 * a * c).max(0.0);
    Some((-b + disc.sqrt()) / (2.0 * a))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangular_table(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        // density p(x) = 2x on [0, 1], cumulative x^2
        let xs: Vec<f64> = (0..n).map(|i| (i as f64) / ((n - 1) as f64)).collect();
        let pdf: Vec<f64> = xs.iter().map(|x| 2.0 * x).collect();
        let cdf: Vec<f64> = xs.iter().map(|x| x.powi(2)).collect();
        (xs, pdf, cdf)
    }

    #[test]
    fn invert_triangular() {
        // the tabulated cumulative of a piecewise-linear density is
        // exactly quadratic per panel, so inversion is exact here
        let (xs, pdf, cdf) = triangular_table(21);
        for &u in &[0.01, 0.25, 0.5, 0.73, 0.99] {
            let x = invert(u, &xs, &cdf, &pdf, 0).unwrap();
            let target = u.sqrt();
            let err = (x - target).abs();
            println!("got {:e}, expected {:e}, error = {:e}", x, target, err);
            assert!(err < 1.0e-12);
        }
    }

    #[test]
    fn invert_with_hint() {
        let (xs, pdf, cdf) = triangular_table(21);
        let u = 0.81;
        let unhinted = invert(u, &xs, &cdf, &pdf, 0).unwrap();
        let hinted = invert(u, &xs, &cdf, &pdf, 15).unwrap();
        assert_eq!(unhinted, hinted);
        assert!((hinted - 0.9).abs() < 1.0e-12);
    }

    #[test]
    fn round_trip_at_samples() {
        let (xs, pdf, cdf) = triangular_table(21);
        for k in 1..xs.len() {
            let x = invert(cdf[k], &xs, &cdf, &pdf, 0).unwrap();
            let err = (x - xs[k]).abs();
            assert!(err < 1.0e-10, "k = {}, got {:e}, expected {:e}", k, x, xs[k]);
        }
    }

    #[test]
    fn invert_flat_density() {
        // uniform density, linear fallback branch
        let xs = [0.0, 0.5, 1.0];
        let pdf = [1.0, 1.0, 1.0];
        let cdf = [0.0, 0.5, 1.0];
        let x = invert(0.3, &xs, &cdf, &pdf, 0).unwrap();
        println!("got {:e}, expected {:e}", x, 0.3);
        assert!((x - 0.3).abs() < 1.0e-12);
    }

    #[test]
    fn invert_out_of_range() {
        let (xs, pdf, cdf) = triangular_table(11);
        assert!(invert(-0.1, &xs, &cdf, &pdf, 0).is_none());
        assert!(invert(1.1, &xs, &cdf, &pdf, 0).is_none());
    }
}
