use nalgebra::{DMatrix, DVector};

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// The `n x n` matrix of the standard second-order finite difference Laplacian in 1D,
/// `tridiag(-1, 2, -1)`. Symmetric positive definite.
pub fn laplacian_1d(n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            2.0
        } else if i.abs_diff(j) == 1 {
            -1.0
        } else {
            0.0
        }
    })
}

/// An arbitrary but deterministic vector with entries in `[-1, 1]`.
pub fn deterministic_vector(n: usize) -> DVector<f64> {
    DVector::from_fn(n, |i, _| ((i as f64 + 1.0) * 0.7).sin())
}

/// Mean of the entries of `v` selected by `selection`, or `None` if nothing is selected.
pub fn selected_mean(v: &DVector<f64>, selection: &[bool]) -> Option<f64> {
    let (sum, count) = v
        .iter()
        .zip(selection)
        .filter(|(_, selected)| **selected)
        .fold((0.0, 0usize), |(sum, count), (v_i, _)| (sum + v_i, count + 1));
    (count > 0).then(|| sum / count as f64)
}
