/*
 * RecoFactors
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::time::Duration;

pub fn to_millis(duration: Duration) -> u64 {
    (duration.as_secs() * 1_000) + (duration.subsec_nanos() / 1_000_000) as u64
}

#[inline]
pub fn dot(left: &[f64], right: &[f64]) -> f64 {
    left.iter().zip(right).map(|(left, right)| left * right).sum()
}

/// Stochastic gradient step `left += learning_rate * (residual_error * rhs - regularization * left)`.
/// See: https://sifter.org/~simon/journal/20061211.html.
#[inline]
pub fn sgd_assign(
    left: &mut [f64],
    rhs: &[f64],
    residual_error: f64,
    learning_rate: f64,
    regularization: f64,
) {
    debug_assert_eq!(left.len(), rhs.len());
    for (left, right) in left.iter_mut().zip(rhs) {
        *left += learning_rate * (residual_error * right - regularization * *left);
    }
}

/// Adds `scale * rhs` to `left`.
#[inline]
pub fn add_scaled(left: &mut [f64], rhs: &[f64], scale: f64) {
    debug_assert_eq!(left.len(), rhs.len());
    for (left, right) in left.iter_mut().zip(rhs) {
        *left += scale * right;
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn dot_product() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, -5.0, 6.0]), 12.0);
        assert_eq!(dot(&[], &[]), 0.0);
    }

    #[test]
    fn sgd_step() {
        let mut left = vec![1.0, -2.0];
        sgd_assign(&mut left, &[0.5, 1.0], 2.0, 0.1, 0.5);

        // 1.0 + 0.1 * (2.0 * 0.5 - 0.5 * 1.0) and -2.0 + 0.1 * (2.0 * 1.0 + 0.5 * 2.0)
        assert!((left[0] - 1.05).abs() < 1e-12);
        assert!((left[1] + 1.7).abs() < 1e-12);
    }

    #[test]
    fn millis() {
        assert_eq!(to_millis(Duration::from_micros(2_500_999)), 2_500);
    }
}
