//! Curve filling
//!
//! Fills undefined interior points of a sampled curve (x = 0, 1, 2, ...).
//! Two fits are available: a parabola through the three known points nearest
//! each gap, and a monotone piecewise cubic Hermite interpolant (PCHIP) through
//! every known point. PCHIP never overshoots its data, so a rising running
//! total stays rising between its nodes.

use crate::error::ComputeError;

/// Concrete fitting method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Parabola through the two known points before a gap and the one after
    Quadratic,
    /// Monotone piecewise cubic through every known point
    Pchip,
}

/// Interpolating polynomial in barycentric form
#[derive(Debug, Clone)]
pub struct BarycentricPolynomial {
    xs: Vec<f64>,
    ys: Vec<f64>,
    weights: Vec<f64>,
}

impl BarycentricPolynomial {
    /// Fit the polynomial through `points`; x values must be distinct
    pub fn fit(points: &[(f64, f64)]) -> Result<Self, ComputeError> {
        if points.is_empty() {
            return Err(ComputeError::ForecastComputation(
                "cannot fit a polynomial through zero points".to_string(),
            ));
        }

        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();

        let mut weights = Vec::with_capacity(xs.len());
        for (j, xj) in xs.iter().enumerate() {
            let mut product = 1.0;
            for (k, xk) in xs.iter().enumerate() {
                if k != j {
                    product *= xj - xk;
                }
            }
            if product == 0.0 {
                return Err(ComputeError::ForecastComputation(format!(
                    "duplicate interpolation node at x = {xj}"
                )));
            }
            weights.push(1.0 / product);
        }

        Ok(Self { xs, ys, weights })
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for ((xj, yj), wj) in self.xs.iter().zip(&self.ys).zip(&self.weights) {
            let dx = x - xj;
            if dx == 0.0 {
                return *yj;
            }
            let term = wj / dx;
            numerator += term * yj;
            denominator += term;
        }

        numerator / denominator
    }
}

/// Monotone piecewise cubic Hermite interpolant
///
/// Slopes follow Fritsch-Carlson: a weighted harmonic mean of the adjacent
/// secants at interior nodes (zero at local extrema) and a clamped
/// three-point estimate at both ends.
#[derive(Debug, Clone)]
pub struct MonotoneCubic {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl MonotoneCubic {
    /// Fit through `points`; x values must be strictly increasing
    pub fn fit(points: &[(f64, f64)]) -> Result<Self, ComputeError> {
        if points.len() < 2 {
            return Err(ComputeError::ForecastComputation(format!(
                "a monotone cubic needs two nodes, got {}",
                points.len()
            )));
        }

        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();

        let widths: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        if let Some(i) = widths.iter().position(|h| *h <= 0.0) {
            return Err(ComputeError::ForecastComputation(format!(
                "interpolation nodes are not increasing at x = {}",
                xs[i + 1]
            )));
        }
        let secants: Vec<f64> = ys
            .windows(2)
            .zip(&widths)
            .map(|(w, h)| (w[1] - w[0]) / h)
            .collect();

        let n = xs.len();
        let mut slopes = vec![0.0; n];
        if n == 2 {
            slopes.fill(secants[0]);
        } else {
            for k in 1..n - 1 {
                let (left, right) = (secants[k - 1], secants[k]);
                if left * right > 0.0 {
                    let w1 = 2.0 * widths[k] + widths[k - 1];
                    let w2 = widths[k] + 2.0 * widths[k - 1];
                    slopes[k] = (w1 + w2) / (w1 / left + w2 / right);
                }
            }
            slopes[0] = end_slope(widths[0], widths[1], secants[0], secants[1]);
            slopes[n - 1] = end_slope(
                widths[n - 2],
                widths[n - 3],
                secants[n - 2],
                secants[n - 3],
            );
        }

        Ok(Self { xs, ys, slopes })
    }

    /// Evaluate at `x`, extending the outer pieces beyond the nodes
    pub fn evaluate(&self, x: f64) -> f64 {
        let k = self
            .xs
            .partition_point(|xk| *xk <= x)
            .clamp(1, self.xs.len() - 1)
            - 1;

        let h = self.xs[k + 1] - self.xs[k];
        let t = (x - self.xs[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        (2.0 * t3 - 3.0 * t2 + 1.0) * self.ys[k]
            + (t3 - 2.0 * t2 + t) * h * self.slopes[k]
            + (3.0 * t2 - 2.0 * t3) * self.ys[k + 1]
            + (t3 - t2) * h * self.slopes[k + 1]
    }
}

/// Three-point slope at an outer node, clamped to keep the piece monotone
fn end_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let slope = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if slope.signum() != d0.signum() || d0 == 0.0 {
        0.0
    } else if d0.signum() != d1.signum() && slope.abs() > 3.0 * d0.abs() {
        3.0 * d0
    } else {
        slope
    }
}

/// Fill every `None` of `curve` and return the completed curve
///
/// Known points are returned unchanged. Fails when there are too few known
/// points for the fit or the result is not finite.
pub fn fill_curve(curve: &[Option<f64>], fit: Fit) -> Result<Vec<f64>, ComputeError> {
    let known: Vec<(f64, f64)> = curve
        .iter()
        .enumerate()
        .filter_map(|(x, y)| y.map(|y| (x as f64, y)))
        .collect();

    if known.len() == curve.len() {
        return Ok(known.into_iter().map(|(_, y)| y).collect());
    }

    let minimum = match fit {
        Fit::Quadratic => 3,
        Fit::Pchip => 2,
    };
    if known.len() < minimum {
        return Err(ComputeError::ForecastComputation(format!(
            "{} known points are not enough for a {:?} fit",
            known.len(),
            fit
        )));
    }

    let cubic = match fit {
        Fit::Pchip => Some(MonotoneCubic::fit(&known)?),
        Fit::Quadratic => None,
    };

    let mut filled = Vec::with_capacity(curve.len());
    for (x, y) in curve.iter().enumerate() {
        let value = match (y, &cubic) {
            (Some(y), _) => *y,
            (None, Some(cubic)) => cubic.evaluate(x as f64),
            (None, None) => {
                let nodes = quadratic_nodes(&known, x as f64);
                BarycentricPolynomial::fit(&nodes)?.evaluate(x as f64)
            }
        };
        if !value.is_finite() {
            return Err(ComputeError::ForecastComputation(format!(
                "interpolated value at x = {x} is not finite"
            )));
        }
        filled.push(value);
    }

    Ok(filled)
}

/// Two known points left of `x` and one right of it, shifting to the right
/// when the left side is short
fn quadratic_nodes(known: &[(f64, f64)], x: f64) -> Vec<(f64, f64)> {
    let split = known.partition_point(|p| p.0 < x);
    let take_left = split.min(2).max(3usize.saturating_sub(known.len() - split));
    let start = split - take_left;
    known[start..start + 3].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_polynomial_reproduces_cubic() {
        let f = |x: f64| 2.0 * x * x * x - x + 5.0;
        let points: Vec<(f64, f64)> = [0.0, 1.0, 3.0, 6.0].iter().map(|&x| (x, f(x))).collect();
        let poly = BarycentricPolynomial::fit(&points).unwrap();

        for x in [2.0, 4.0, 5.0] {
            assert!(approx(poly.evaluate(x), f(x)));
        }
        assert_eq!(poly.evaluate(3.0), f(3.0));
    }

    #[test]
    fn test_duplicate_nodes_rejected() {
        let result = BarycentricPolynomial::fit(&[(1.0, 2.0), (1.0, 3.0)]);
        assert!(matches!(result, Err(ComputeError::ForecastComputation(_))));
    }

    #[test]
    fn test_quadratic_fill() {
        // y = x^2 sampled at 0, 1 and 5
        let curve = [Some(0.0), Some(1.0), None, None, None, Some(25.0)];
        let filled = fill_curve(&curve, Fit::Quadratic).unwrap();

        for (x, y) in filled.iter().enumerate() {
            assert!(approx(*y, (x * x) as f64));
        }
    }

    #[test]
    fn test_quadratic_uses_points_nearest_the_gap() {
        // Linear tail after a kink at the start; the kink is ignored
        let curve = [Some(100.0), Some(0.0), Some(10.0), Some(20.0), None, Some(40.0)];
        let filled = fill_curve(&curve, Fit::Quadratic).unwrap();
        assert!(approx(filled[4], 30.0));
    }

    #[test]
    fn test_quadratic_nodes_shift_right_when_left_is_short() {
        let known = [(0.0, 0.0), (3.0, 9.0), (4.0, 16.0)];
        let nodes = quadratic_nodes(&known, 1.0);
        assert_eq!(nodes, known.to_vec());
    }

    #[test]
    fn test_pchip_fill_keeps_known_points() {
        let curve = [Some(1.0), Some(2.0), Some(4.0), None, Some(11.0)];
        let filled = fill_curve(&curve, Fit::Pchip).unwrap();

        assert_eq!(filled[0], 1.0);
        assert_eq!(filled[2], 4.0);
        assert_eq!(filled[4], 11.0);
        assert!(filled[3] > 4.0 && filled[3] < 11.0);
    }

    #[test]
    fn test_pchip_reproduces_a_line() {
        let curve = [Some(0.0), Some(3.0), None, None, Some(12.0)];
        let filled = fill_curve(&curve, Fit::Pchip).unwrap();
        for (x, y) in filled.iter().enumerate() {
            assert!(approx(*y, 3.0 * x as f64));
        }
    }

    #[test]
    fn test_pchip_stays_monotone_on_uneven_steps() {
        // Running total of alternating 600 / 1 steps, then a long gap
        let curve = [
            Some(0.0),
            Some(600.0),
            Some(601.0),
            Some(1201.0),
            Some(1202.0),
            None,
            None,
            None,
            Some(2400.0),
        ];
        let filled = fill_curve(&curve, Fit::Pchip).unwrap();

        for pair in filled.windows(2) {
            assert!(pair[1] >= pair[0], "not monotone: {filled:?}");
        }
    }

    #[test]
    fn test_pchip_flat_at_local_extremum() {
        let cubic = MonotoneCubic::fit(&[(0.0, 0.0), (1.0, 5.0), (2.0, 0.0)]).unwrap();
        assert!(approx(cubic.slopes[1], 0.0));
        assert!(cubic.evaluate(0.5) <= 5.0);
        assert!(cubic.evaluate(1.5) <= 5.0);
    }

    #[test]
    fn test_pchip_rejects_unordered_nodes() {
        let result = MonotoneCubic::fit(&[(0.0, 0.0), (0.0, 1.0)]);
        assert!(matches!(result, Err(ComputeError::ForecastComputation(_))));
    }

    #[test]
    fn test_complete_curve_passes_through() {
        let filled = fill_curve(&[Some(1.0), Some(2.0)], Fit::Quadratic).unwrap();
        assert_eq!(filled, vec![1.0, 2.0]);
    }

    #[test]
    fn test_too_few_points() {
        let result = fill_curve(&[Some(1.0), None, Some(3.0)], Fit::Quadratic);
        assert!(matches!(result, Err(ComputeError::ForecastComputation(_))));
    }
}
