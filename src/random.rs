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

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

use crate::error::{Error, Result};
use crate::types::{DenseMatrix, DenseVector};

/// Seeded source of randomness for factor initialization and stochastic sampling. Two
/// generators created with the same seed produce the same sequence of draws.
pub struct RandomGenerator {
    rng: StdRng,
}

impl RandomGenerator {

    pub fn new(seed: u64) -> Self {
        RandomGenerator { rng: StdRng::seed_from_u64(seed) }
    }

    /// Uniform index in `0..n`, `n` must be positive.
    pub fn intn(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// A random permutation of `0..n`.
    pub fn perm(&mut self, n: usize) -> Vec<usize> {
        let mut permutation: Vec<usize> = (0..n).collect();
        permutation.shuffle(&mut self.rng);
        permutation
    }

    /// Values drawn from `[low, high)`, or `low` everywhere when both bounds are equal.
    pub fn make_uniform_vector(&mut self, size: usize, low: f64, high: f64) -> Result<DenseVector> {
        if !(low <= high) || !low.is_finite() || !high.is_finite() {
            return Err(Error::InvalidParam {
                name: "initLow",
                reason: format!("lower bound {} must not exceed upper bound {}", low, high),
            });
        }
        if low == high {
            return Ok(vec![low; size]);
        }
        let uniform = Uniform::new(low, high);
        Ok((0..size).map(|_| uniform.sample(&mut self.rng)).collect())
    }

    pub fn make_normal_vector(&mut self, size: usize, mean: f64, std_dev: f64) -> Result<DenseVector> {
        if !(std_dev >= 0.0) || !std_dev.is_finite() {
            return Err(Error::InvalidParam {
                name: "initStdDev",
                reason: format!("standard deviation {} must be finite and non-negative", std_dev),
            });
        }
        let normal = Normal::new(mean, std_dev).map_err(|error| Error::InvalidParam {
            name: "initStdDev",
            reason: error.to_string(),
        })?;
        Ok((0..size).map(|_| normal.sample(&mut self.rng)).collect())
    }

    pub fn make_uniform_matrix(
        &mut self,
        num_rows: usize,
        num_columns: usize,
        low: f64,
        high: f64,
    ) -> Result<DenseMatrix> {
        (0..num_rows)
            .map(|_| self.make_uniform_vector(num_columns, low, high))
            .collect()
    }

    pub fn make_normal_matrix(
        &mut self,
        num_rows: usize,
        num_columns: usize,
        mean: f64,
        std_dev: f64,
    ) -> Result<DenseMatrix> {
        (0..num_rows)
            .map(|_| self.make_normal_vector(num_columns, mean, std_dev))
            .collect()
    }
}
