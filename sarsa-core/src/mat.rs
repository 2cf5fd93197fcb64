//! Dense matrix used by the neural-network Q function.
use crate::error::{Result, SarsaError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable row-major matrix of `f64`.
///
/// Every operation returns a new matrix. Weights, per-agent eligibilities and
/// activations of a network are held at the same time, so nothing here
/// mutates in place.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Mat {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Mat {
    /// Matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Builds a matrix whose element `(r, c)` is `f(r, c)`, filled row by row.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { data, rows, cols }
    }

    /// Builds a matrix from row-major literal data, one `Vec` per row.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, r) in rows.iter().enumerate() {
            if r.len() != cols {
                return Err(SarsaError::RaggedLiteral {
                    line: i,
                    got: r.len(),
                    expected: cols,
                });
            }
            data.extend_from_slice(r);
        }

        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Builds a matrix from column-major literal data, one `Vec` per column.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        Ok(Self::from_rows(columns)?.transpose())
    }

    /// Column vector (`n x 1`).
    pub fn column(xs: &[f64]) -> Self {
        Self {
            data: xs.to_vec(),
            rows: xs.len(),
            cols: 1,
        }
    }

    /// Row vector (`1 x n`).
    pub fn row(xs: &[f64]) -> Self {
        Self {
            data: xs.to_vec(),
            rows: 1,
            cols: xs.len(),
        }
    }

    /// Returns `[rows, columns]`.
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Elements in row-major order.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Bounds-checked element access.
    pub fn get(&self, row: usize, column: usize) -> Result<f64> {
        if row >= self.rows || column >= self.cols {
            return Err(SarsaError::OutOfRange {
                row,
                column,
                rows: self.rows,
                columns: self.cols,
            });
        }
        Ok(self.data[row * self.cols + column])
    }

    fn check_same_shape(&self, x: &Mat) -> Result<()> {
        if self.shape() != x.shape() {
            return Err(SarsaError::DimensionMismatch {
                lhs: self.shape(),
                rhs: x.shape(),
            });
        }
        Ok(())
    }

    /// Element-wise sum of two matrices of the same shape.
    pub fn add(&self, x: &Mat) -> Result<Self> {
        self.check_same_shape(x)?;
        let data = self
            .data
            .iter()
            .zip(x.data.iter())
            .map(|(a, b)| a + b)
            .collect();

        Ok(Self {
            data,
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Adds a scalar to every element.
    pub fn add_scalar(&self, s: f64) -> Self {
        self.map(|a| a + s)
    }

    /// Matrix product `self * x`.
    pub fn matmul(&self, x: &Mat) -> Result<Self> {
        if self.cols != x.rows {
            return Err(SarsaError::DimensionMismatch {
                lhs: self.shape(),
                rhs: x.shape(),
            });
        }

        let (m, l, n) = (self.rows, self.cols, x.cols);
        let mut data = vec![0.0; m * n];
        for i in 0..m {
            for j in 0..n {
                let kk = i * n + j;
                for k in 0..l {
                    data[kk] += self.data[i * l + k] * x.data[k * n + j];
                }
            }
        }

        Ok(Self {
            data,
            rows: m,
            cols: n,
        })
    }

    /// Multiplies every element by a scalar.
    pub fn scale(&self, s: f64) -> Self {
        self.map(|a| a * s)
    }

    /// Element-wise (Hadamard) product of two matrices of the same shape.
    pub fn mul_elem(&self, x: &Mat) -> Result<Self> {
        self.check_same_shape(x)?;
        let data = self
            .data
            .iter()
            .zip(x.data.iter())
            .map(|(a, b)| a * b)
            .collect();

        Ok(Self {
            data,
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Self {
        let mut data = vec![0.0; self.data.len()];
        for r in 0..self.rows {
            for c in 0..self.cols {
                data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }

        Self {
            data,
            rows: self.cols,
            cols: self.rows,
        }
    }

    /// Applies `f` to every element.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            data: self.data.iter().map(|a| f(*a)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

impl fmt::Display for Mat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in 0..self.rows {
            if r > 0 {
                write!(f, " ; ")?;
            }
            let row = &self.data[r * self.cols..(r + 1) * self.cols];
            let row: Vec<String> = row.iter().map(|a| a.to_string()).collect();
            write!(f, "{}", row.join(", "))?;
        }
        write!(f, "]")
    }
}
