//! Non-negative matrix factorisation by coordinate descent.
//!
//! `X ≈ W·H` with `W: n×k` and `H: k×m`, both non-negative. Each outer
//! iteration updates every column of `W` then every row of `H` in closed
//! form (hierarchical alternating least squares).

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::LatentParams;

#[derive(Debug, Clone)]
pub(crate) struct Factorization {
    pub w: Array2<f64>,
    pub h: Array2<f64>,
    pub iterations: usize,
    pub reconstruction_error: f64,
}

/// Seeded random initialisation, entries uniform in `[0, sqrt(mean/k))`.
/// `H` is drawn before `W`.
fn initialise(x: &Array2<f64>, k: usize, seed: u64) -> (Array2<f64>, Array2<f64>) {
    let (n, m) = x.dim();
    let mean = x.mean().unwrap_or(0.0).max(0.0);
    let scale = (mean / k as f64).sqrt();
    let mut rng = StdRng::seed_from_u64(seed);

    let h = Array2::from_shape_simple_fn((k, m), || scale * rng.gen::<f64>());
    let w = Array2::from_shape_simple_fn((n, k), || scale * rng.gen::<f64>());
    (w, h)
}

pub(crate) fn frobenius_error(x: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    let residual = x - &w.dot(h);
    residual.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// One pass over the columns of `w` with `h` fixed.
fn update_w(x: &Array2<f64>, w: &mut Array2<f64>, h: &Array2<f64>) {
    let hht = h.dot(&h.t());
    let xht = x.dot(&h.t());
    let k = hht.nrows();

    for t in 0..k {
        let denom = hht[[t, t]];
        if denom <= 0.0 {
            continue;
        }
        for i in 0..w.nrows() {
            let predicted = w.row(i).dot(&hht.column(t));
            w[[i, t]] = (w[[i, t]] + (xht[[i, t]] - predicted) / denom).max(0.0);
        }
    }
}

/// One pass over the rows of `h` with `w` fixed.
fn update_h(x: &Array2<f64>, w: &Array2<f64>, h: &mut Array2<f64>) {
    let wtw = w.t().dot(w);
    let wtx = w.t().dot(x);
    let k = wtw.nrows();

    for t in 0..k {
        let denom = wtw[[t, t]];
        if denom <= 0.0 {
            continue;
        }
        for j in 0..h.ncols() {
            let predicted = wtw.row(t).dot(&h.column(j));
            h[[t, j]] = (h[[t, j]] + (wtx[[t, j]] - predicted) / denom).max(0.0);
        }
    }
}

/// Factorises a validated non-negative, non-zero matrix.
pub(crate) fn factorize(x: &Array2<f64>, params: &LatentParams) -> Factorization {
    let (mut w, mut h) = initialise(x, params.n_components, params.random_state);

    let initial_error = frobenius_error(x, &w, &h).max(f64::EPSILON);
    let mut previous_error = initial_error;
    let mut iterations = 0;

    for iteration in 1..=params.max_iter {
        update_w(x, &mut w, &h);
        update_h(x, &w, &mut h);
        iterations = iteration;

        // Convergence is checked every 10 iterations.
        if iteration % 10 == 0 {
            let error = frobenius_error(x, &w, &h);
            if (previous_error - error) / initial_error < params.tolerance {
                break;
            }
            previous_error = error;
        }
    }

    let reconstruction_error = frobenius_error(x, &w, &h);
    Factorization {
        w,
        h,
        iterations,
        reconstruction_error,
    }
}

/// Non-negative least-squares projection of `x` onto the rows of `h`:
/// `argmin_{w ≥ 0} ||x - w·H||`.
pub(crate) fn project(x: ArrayView1<'_, f64>, h: &Array2<f64>, max_iter: usize, tolerance: f64) -> Array1<f64> {
    let gram = h.dot(&h.t());
    let hx = h.dot(&x);
    let k = gram.nrows();
    let mut w = Array1::<f64>::zeros(k);

    for _ in 0..max_iter.max(1) {
        let mut max_step = 0.0_f64;
        for t in 0..k {
            let denom = gram[[t, t]];
            if denom <= 0.0 {
                continue;
            }
            let predicted = gram.row(t).dot(&w);
            let updated = (w[t] + (hx[t] - predicted) / denom).max(0.0);
            max_step = max_step.max((updated - w[t]).abs());
            w[t] = updated;
        }
        if max_step < tolerance {
            break;
        }
    }

    w
}

/// Sum of each column's loadings across all components.
pub(crate) fn column_loadings(h: &Array2<f64>) -> Array1<f64> {
    h.sum_axis(Axis(0))
}
