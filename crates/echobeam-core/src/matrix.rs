//! Small owned dense real matrix with audited linear-algebra primitives.
//!
//! The minimum-variance beamformer needs exactly four operations per sample:
//! outer product, trace, scaled-identity loading, and inversion. Keeping
//! them behind a shaped [`Matrix`] type (row-major `Vec<f64>` plus explicit
//! dimensions) rules out the transpose/shape mistakes that hand-indexed
//! nested loops invite.
//!
//! ## Example
//!
//! ```rust
//! use echobeam_core::matrix::{dot, Matrix};
//!
//! // Rank-1 outer product is singular for n >= 2...
//! let u = [1.0, 2.0, 3.0];
//! let r = Matrix::outer(&u);
//! assert!(r.inverse().is_none());
//!
//! // ...until diagonal loading makes it invertible.
//! let mut loaded = r.clone();
//! loaded.add_scaled_identity(loaded.trace() / 3.0);
//! let inv = loaded.inverse().unwrap();
//! let y = inv.mat_vec(&[1.0, 1.0, 1.0]);
//! assert!((dot(&[1.0, 1.0, 1.0], &loaded.mat_vec(&y)) - 3.0).abs() < 1e-9);
//! ```

/// Pivot magnitude below which Gauss–Jordan elimination reports singularity.
const PIVOT_EPS: f64 = 1e-30;

/// Dense real matrix stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    /// Elements, row-major, length = rows * cols.
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Create a zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Create an n x n identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Outer product `u * u^T` — the single-snapshot covariance estimate.
    pub fn outer(u: &[f64]) -> Self {
        let n = u.len();
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                m.data[i * n + j] = u[i] * u[j];
            }
        }
        m
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at (row, col). Panics if out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.data[row * self.cols + col]
    }

    /// Set element at (row, col). Panics if out of bounds.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.data[row * self.cols + col] = value;
    }

    /// Sum of diagonal elements. Panics on a non-square matrix.
    pub fn trace(&self) -> f64 {
        assert_eq!(self.rows, self.cols, "trace requires a square matrix");
        (0..self.rows).map(|i| self.data[i * self.cols + i]).sum()
    }

    /// Add `scale * I` in place (diagonal loading). Panics on a non-square
    /// matrix.
    pub fn add_scaled_identity(&mut self, scale: f64) {
        assert_eq!(self.rows, self.cols, "loading requires a square matrix");
        for i in 0..self.rows {
            self.data[i * self.cols + i] += scale;
        }
    }

    /// Matrix–vector product `y = M * x`.
    pub fn mat_vec(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.cols, "vector length must match columns");
        let mut y = vec![0.0; self.rows];
        for i in 0..self.rows {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            y[i] = row.iter().zip(x.iter()).map(|(a, b)| a * b).sum();
        }
        y
    }

    /// Invert a square matrix via Gauss–Jordan elimination with partial
    /// pivoting. Returns `None` when a pivot degenerates (singular or
    /// numerically rank-deficient matrix).
    pub fn inverse(&self) -> Option<Matrix> {
        assert_eq!(self.rows, self.cols, "inverse requires a square matrix");
        let n = self.rows;

        // Augment [A | I]
        let mut aug = vec![vec![0.0; 2 * n]; n];
        for i in 0..n {
            aug[i][..n].copy_from_slice(&self.data[i * n..(i + 1) * n]);
            aug[i][n + i] = 1.0;
        }

        for col in 0..n {
            // Partial pivoting: pick the row with the largest magnitude in
            // this column.
            let mut best_row = col;
            let mut best_mag = 0.0;
            for (row, r) in aug.iter().enumerate().take(n).skip(col) {
                let mag = r[col].abs();
                if mag > best_mag {
                    best_mag = mag;
                    best_row = row;
                }
            }
            if best_mag <= PIVOT_EPS {
                return None;
            }
            aug.swap(col, best_row);

            // Scale the pivot row
            let pivot_inv = 1.0 / aug[col][col];
            for v in aug[col].iter_mut() {
                *v *= pivot_inv;
            }

            // Eliminate the column in all other rows
            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = aug[row][col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..2 * n {
                    let sub = factor * aug[col][k];
                    aug[row][k] -= sub;
                }
            }
        }

        // Extract the right half
        let mut inv = Matrix::zeros(n, n);
        for i in 0..n {
            inv.data[i * n..(i + 1) * n].copy_from_slice(&aug[i][n..]);
        }
        Some(inv)
    }
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "dot requires equal-length vectors");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

// ===========================================================================
// Tests
// ===========================================================================
