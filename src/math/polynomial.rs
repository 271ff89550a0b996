//! Basic polynomial operations over finite fields.

use ark_ff::{Field, batch_inversion};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Polynomial with finite field coefficients.
///
/// The polynomial is stored as a vector of coefficients, where the index represents
/// the power of x. For example, [1, 2, 3] represents 3x² + 2x + 1.
///
/// # Invariants
///
/// * The coefficients vector has no trailing zeros
pub struct Polynomial<F: Field> {
    /// Coefficients in ascending order of power.
    pub coefficients: Vec<F>,
}

impl<F: Field> Polynomial<F> {
    /// Creates a new polynomial from coefficients, dropping trailing zeros.
    pub fn new(mut coefficients: Vec<F>) -> Self {
        while coefficients.last().is_some_and(|x| x.is_zero()) {
            coefficients.pop();
        }
        Self { coefficients }
    }

    /// Returns the degree of the polynomial.
    ///
    /// For the zero polynomial, the degree is 0.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Returns the coefficient of the highest power term, or 0.
    pub fn leading_coefficient(&self) -> F {
        self.coefficients.last().copied().unwrap_or(F::zero())
    }

    /// Divides this polynomial by another, returns (quotient, remainder).
    ///
    /// Returns `None` if the divisor is zero.
    pub fn divide(&self, divisor: &Polynomial<F>) -> Option<(Polynomial<F>, Polynomial<F>)> {
        if divisor.is_zero() {
            return None;
        }

        let divisor_degree = divisor.degree();
        let dividend_degree = self.degree();

        if self.coefficients.len() < divisor.coefficients.len() {
            return Some((Polynomial::zero(), self.clone()));
        }

        let lead_inverse = divisor.leading_coefficient().inverse()?;
        let mut quotient = vec![F::zero(); dividend_degree - divisor_degree + 1];
        let mut remainder = self.coefficients.clone();

        for i in (0..=dividend_degree - divisor_degree).rev() {
            let leading_coeff = remainder[i + divisor_degree];
            if leading_coeff.is_zero() {
                continue;
            }

            quotient[i] = leading_coeff * lead_inverse;

            for (j, coeff) in divisor.coefficients.iter().enumerate() {
                remainder[i + j] -= quotient[i] * coeff;
            }
        }

        Some((Polynomial::new(quotient), Polynomial::new(remainder)))
    }

    /// Divides this polynomial by `x^n - 1` in linear time, returns
    /// (quotient, remainder).
    ///
    /// Returns `None` if `n` is 0.
    pub fn divide_by_vanishing(&self, n: usize) -> Option<(Polynomial<F>, Polynomial<F>)> {
        if n == 0 {
            return None;
        }
        let mut remainder = self.coefficients.clone();
        if remainder.len() <= n {
            return Some((Polynomial::zero(), Polynomial::new(remainder)));
        }

        // x^i = x^(i-n) * (x^n - 1) + x^(i-n)
        let mut quotient = vec![F::zero(); remainder.len() - n];
        for i in (n..remainder.len()).rev() {
            let coeff = std::mem::replace(&mut remainder[i], F::zero());
            quotient[i - n] = coeff;
            remainder[i - n] += coeff;
        }

        Some((Polynomial::new(quotient), Polynomial::new(remainder)))
    }

    /// Adds two polynomials.
    pub fn add(&self, other: &Polynomial<F>) -> Polynomial<F> {
        let max_len = std::cmp::max(self.coefficients.len(), other.coefficients.len());
        let mut result = vec![F::zero(); max_len];

        for (coeff, a) in result.iter_mut().zip(&self.coefficients) {
            *coeff += a;
        }
        for (coeff, b) in result.iter_mut().zip(&other.coefficients) {
            *coeff += b;
        }

        Polynomial::new(result)
    }

    /// Subtracts `other` from this polynomial.
    pub fn sub(&self, other: &Polynomial<F>) -> Polynomial<F> {
        let max_len = std::cmp::max(self.coefficients.len(), other.coefficients.len());
        let mut result = vec![F::zero(); max_len];

        for (coeff, a) in result.iter_mut().zip(&self.coefficients) {
            *coeff += a;
        }
        for (coeff, b) in result.iter_mut().zip(&other.coefficients) {
            *coeff -= b;
        }

        Polynomial::new(result)
    }

    /// Multiplies two polynomials.
    pub fn multiply(&self, other: &Polynomial<F>) -> Polynomial<F> {
        if self.coefficients.is_empty() || other.coefficients.is_empty() {
            return Polynomial::new(vec![]);
        }

        let mut result = vec![F::zero(); self.coefficients.len() + other.coefficients.len() - 1];

        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in other.coefficients.iter().enumerate() {
                result[i + j] += *a * b;
            }
        }

        Polynomial::new(result)
    }

    /// Evaluates the polynomial at point x using Horner's method.
    pub fn evaluate(&self, x: F) -> F {
        self.coefficients
            .iter()
            .rev()
            .fold(F::zero(), |acc, &coeff| acc * x + coeff)
    }

    /// Builds the monic polynomial vanishing exactly on `roots`.
    pub fn from_roots(roots: &[F]) -> Self {
        let mut coefficients = vec![F::one()];
        for &root in roots {
            let mut next = vec![F::zero(); coefficients.len() + 1];
            for (i, &c) in coefficients.iter().enumerate() {
                next[i + 1] += c;
                next[i] -= c * root;
            }
            coefficients = next;
        }
        Self::new(coefficients)
    }

    /// Lagrange interpolation through the points `(xs[i], ys[i])`.
    ///
    /// The x-coordinates must be distinct.
    pub fn lagrange_interpolate(xs: &[F], ys: &[F]) -> Self {
        assert_eq!(xs.len(), ys.len(), "Mismatched lengths");
        if xs.is_empty() {
            return Polynomial::zero();
        }

        let full = Polynomial::from_roots(xs);

        // denominators prod_{j != i} (x_i - x_j)
        let mut denominators: Vec<F> = xs
            .iter()
            .enumerate()
            .map(|(i, &xi)| {
                xs.iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .fold(F::one(), |acc, (_, &xj)| acc * (xi - xj))
            })
            .collect();
        batch_inversion(&mut denominators);

        let mut result = vec![F::zero(); xs.len()];
        for ((&xi, &yi), inv) in xs.iter().zip(ys).zip(&denominators) {
            let scale = yi * inv;
            if scale.is_zero() {
                continue;
            }
            // synthetic division of `full` by (x - xi)
            let n = full.coefficients.len() - 1;
            let mut carry = F::zero();
            for k in (0..n).rev() {
                carry = full.coefficients[k + 1] + carry * xi;
                result[k] += carry * scale;
            }
        }

        Polynomial::new(result)
    }

    /// Checks if the polynomial is zero.
    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(|c| c.is_zero())
    }

    /// Creates the zero polynomial.
    pub fn zero() -> Self {
        Self::new(vec![F::zero()])
    }

    /// Returns polynomial coefficients.
    pub fn coefficients(&self) -> &[F] {
        &self.coefficients
    }
}

/// Interpolates one degree < 4 polynomial per row of four points.
///
/// Returned coefficients are in ascending order of power.
pub fn interpolate_quartic_batch<F: Field>(xs: &[[F; 4]], ys: &[[F; 4]]) -> Vec<[F; 4]> {
    assert_eq!(xs.len(), ys.len(), "Mismatched row counts");

    let mut denominators = Vec::with_capacity(xs.len() * 4);
    for row in xs {
        for i in 0..4 {
            let mut d = F::one();
            for j in 0..4 {
                if i != j {
                    d *= row[i] - row[j];
                }
            }
            denominators.push(d);
        }
    }
    batch_inversion(&mut denominators);

    let build_row = |row: usize| -> [F; 4] {
        let (x, y) = (&xs[row], &ys[row]);
        let mut coeffs = [F::zero(); 4];
        for i in 0..4 {
            let scale = y[i] * denominators[row * 4 + i];
            let [a, b, c] = others(x, i);
            // (X - a)(X - b)(X - c)
            coeffs[0] -= scale * a * b * c;
            coeffs[1] += scale * (a * b + a * c + b * c);
            coeffs[2] -= scale * (a + b + c);
            coeffs[3] += scale;
        }
        coeffs
    };

    #[cfg(feature = "parallel")]
    let polys = (0..xs.len()).into_par_iter().map(build_row).collect();
    #[cfg(not(feature = "parallel"))]
    let polys = (0..xs.len()).map(build_row).collect();
    polys
}

/// Evaluates a degree < 4 polynomial at `x`.
pub fn eval_quartic<F: Field>(poly: &[F; 4], x: F) -> F {
    ((poly[3] * x + poly[2]) * x + poly[1]) * x + poly[0]
}

/// Evaluates every row polynomial at the same `x`.
pub fn eval_quartic_batch<F: Field>(polys: &[[F; 4]], x: F) -> Vec<F> {
    polys.iter().map(|poly| eval_quartic(poly, x)).collect()
}

fn others<F: Field>(row: &[F; 4], skip: usize) -> [F; 3] {
    let mut out = [F::zero(); 3];
    let mut k = 0;
    for (j, &value) in row.iter().enumerate() {
        if j != skip {
            out[k] = value;
            k += 1;
        }
    }
    out
}
