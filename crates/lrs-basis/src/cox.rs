//! Cox–de Boor recursion on a single local knot vector.
//!
//! A local knot vector holds `order + 1` non-decreasing parameter values and
//! defines exactly one univariate B-spline basis function. The recursion
//! starts from the degree-0 indicator on each span and raises the order one
//! level at a time; any term over a zero-width (repeated) knot span
//! contributes 0 instead of dividing by zero.

/// Value of the univariate basis function at parameter `t`.
///
/// `knots` must hold `order + 1` non-decreasing values. The `from_right`
/// flag selects the half-open convention for the degree-0 indicators:
/// `[k_i, k_{i+1})` when true, `(k_i, k_{i+1}]` when false. Adjacent
/// elements evaluating exactly on a shared knot use opposite flags so the
/// boundary is counted once, on one side.
pub fn local_value(knots: &[f64], order: usize, t: f64, from_right: bool) -> f64 {
    debug_assert_eq!(knots.len(), order + 1);
    let mut n = vec![0.0; order];
    for (i, slot) in n.iter_mut().enumerate() {
        let inside = if from_right {
            knots[i] <= t && t < knots[i + 1]
        } else {
            knots[i] < t && t <= knots[i + 1]
        };
        *slot = if inside { 1.0 } else { 0.0 };
    }

    for lvl in 1..order {
        for j in 0..order - lvl {
            let mut acc = 0.0;
            if knots[j + lvl] != knots[j] {
                acc += (t - knots[j]) / (knots[j + lvl] - knots[j]) * n[j];
            }
            if knots[j + lvl + 1] != knots[j + 1] {
                acc += (knots[j + lvl + 1] - t) / (knots[j + lvl + 1] - knots[j + 1]) * n[j + 1];
            }
            n[j] = acc;
        }
    }

    n[0]
}

/// Value and first two derivatives of the univariate basis function.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDerivs {
    pub value: f64,
    pub d1: f64,
    pub d2: f64,
}

/// Evaluate the basis function together with its first and second
/// derivatives at parameter `t`.
///
/// Runs the same recursion as [`local_value`], additionally applying the
/// derivative identity
/// `d/dt N_n[j] = n/(k[j+n]-k[j]) N_{n-1}[j] - n/(k[j+n+1]-k[j+1]) N_{n-1}[j+1]`
/// once at the top level for `d1` and twice over the top two levels for
/// `d2`. For order < 3 the second derivative is identically 0, and for
/// order 1 (piecewise constants) so is the first.
pub fn local_derivs(knots: &[f64], order: usize, t: f64, from_right: bool) -> LocalDerivs {
    debug_assert_eq!(knots.len(), order + 1);
    let mut n = vec![0.0; order];
    for (i, slot) in n.iter_mut().enumerate() {
        let inside = if from_right {
            knots[i] <= t && t < knots[i + 1]
        } else {
            knots[i] < t && t <= knots[i + 1]
        };
        *slot = if inside { 1.0 } else { 0.0 };
    }

    let mut d1 = 0.0;
    // Three slots cover the degree-(order-3) tail the second-derivative
    // recursion starts from.
    let mut d2 = [0.0_f64; 3];

    for lvl in 1..order {
        if lvl == order - 2 {
            d2.copy_from_slice(&n[..3]);
        }
        if lvl + 2 >= order {
            for j in 0..order - lvl {
                let mut acc = 0.0;
                if knots[j + lvl] != knots[j] {
                    acc += lvl as f64 / (knots[j + lvl] - knots[j]) * d2[j];
                }
                if knots[j + lvl + 1] != knots[j + 1] {
                    acc -= lvl as f64 / (knots[j + lvl + 1] - knots[j + 1]) * d2[j + 1];
                }
                d2[j] = acc;
            }
        }
        if lvl == order - 1 {
            let p = lvl as f64;
            if knots[lvl] != knots[0] {
                d1 += p / (knots[lvl] - knots[0]) * n[0];
            }
            if knots[lvl + 1] != knots[1] {
                d1 -= p / (knots[lvl + 1] - knots[1]) * n[1];
            }
        }
        for j in 0..order - lvl {
            let mut acc = 0.0;
            if knots[j + lvl] != knots[j] {
                acc += (t - knots[j]) / (knots[j + lvl] - knots[j]) * n[j];
            }
            if knots[j + lvl + 1] != knots[j + 1] {
                acc += (knots[j + lvl + 1] - t) / (knots[j + lvl + 1] - knots[j + 1]) * n[j + 1];
            }
            n[j] = acc;
        }
    }

    LocalDerivs {
        value: n[0],
        d1,
        d2: d2[0],
    }
}
