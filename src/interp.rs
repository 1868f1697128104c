//! Generic table-interpolation kernels

/// Linearly interpolates the tabulated function `ys(xs)` at `x`,
/// returning 0 if `x` falls outside the tabulated range.
/// The abscissae must be monotonic, but may run in either direction.
pub fn linear(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let (min, max) = if xs[0] < xs[xs.len() - 1] {
        (xs[0], xs[xs.len() - 1])
    } else {
        (xs[xs.len() - 1], xs[0])
    };

    if x < min || x > max {
        return 0.0;
    }

    for i in 1..xs.len() {
        let lo = xs[i-1].min(xs[i]);
        let hi = xs[i-1].max(xs[i]);
        if x >= lo && x <= hi {
            return ys[i-1] + (ys[i] - ys[i-1]) * (x - xs[i-1]) / (xs[i] - xs[i-1]);
        }
    }

    0.0
}

/// Returns the four (ix, iy, weight) triples of bilinear interpolation
/// on the uniform grid starting at (x0, y0) with spacing (dx, dy) and
/// extent nx by ny. Queries on the outer edge degrade to linear or
/// nearest-point interpolation; queries outside the grid get zero
/// weight everywhere.
pub fn bilinear_weights(nx: usize, ny: usize, x0: f64, y0: f64, dx: f64, dy: f64, x: f64, y: f64) -> [(usize, usize, f64); 4] {
    let fx = (x - x0) / dx;
    let fy = (y - y0) / dy;
    let ix = fx.floor() as i64;
    let iy = fy.floor() as i64;

    if ix < 0 || ix > (nx as i64) - 1 || iy < 0 || iy > (ny as i64) - 1 {
        return [(0, 0, 0.0); 4];
    }

    let ix = ix as usize;
    let iy = iy as usize;
    let rx = fx.fract();
    let ry = fy.fract();

    if ix + 1 > nx - 1 && iy + 1 > ny - 1 {
        [(ix, iy, 1.0), (ix, iy, 0.0), (ix, iy, 0.0), (ix, iy, 0.0)]
    } else if ix + 1 > nx - 1 {
        [(ix, iy, 1.0 - ry), (ix, iy + 1, ry), (ix, iy, 0.0), (ix, iy, 0.0)]
    } else if iy + 1 > ny - 1 {
        [(ix, iy, 1.0 - rx), (ix + 1, iy, rx), (ix, iy, 0.0), (ix, iy, 0.0)]
    } else {
        [
            (ix,     iy,     (1.0 - rx) * (1.0 - ry)),
            (ix + 1, iy,     rx * (1.0 - ry)),
            (ix,     iy + 1, (1.0 - rx) * ry),
            (ix + 1, iy + 1, rx * ry),
        ]
    }
}
