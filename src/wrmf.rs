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

//! Weighted regularized matrix factorization for implicit feedback, trained with alternating
//! least squares. Each epoch solves the user factors in closed form with the item factors held
//! fixed, then the item factors with the fresh user factors held fixed:
//!
//! ```text
//! x_u = (Yᵀ Y + Σ_{i ∈ I_u} w(r_ui) y_i y_iᵀ + λ I)⁻¹ Σ_{i ∈ I_u} (w(r_ui) + 1) y_i
//! ```
//!
//! with the confidence weight `w(r) = α r`.

use std::time::Instant;

use nalgebra::{DMatrix, DVector};

use crate::dataset::DataSet;
use crate::error::{Error, Result, Side};
use crate::model::{BaseModel, FitOptions, Model};
use crate::params::{ParamName, Params};
use crate::types::SparseVector;
use crate::utils::to_millis;

pub struct Wrmf {
    pub base: BaseModel,
    pub user_factor: DMatrix<f64>,
    pub item_factor: DMatrix<f64>,
    n_factors: usize,
    n_epochs: usize,
    reg: f64,
    init_mean: f64,
    init_std_dev: f64,
    alpha: f64,
}

impl Wrmf {

    /// Recognized parameters and their defaults: `nFactors` (15), `nEpochs` (50), `initMean` (0),
    /// `initStdDev` (0.1), `reg` (0.06) and `alpha` (1), the scale of the confidence weights.
    pub fn new(params: Params) -> Self {
        let mut wrmf = Wrmf {
            base: BaseModel::new(Params::new()),
            user_factor: DMatrix::zeros(0, 0),
            item_factor: DMatrix::zeros(0, 0),
            n_factors: 15,
            n_epochs: 50,
            reg: 0.06,
            init_mean: 0.0,
            init_std_dev: 0.1,
            alpha: 1.0,
        };
        wrmf.set_params(params);
        wrmf
    }

    /// Confidence weight of an observed interaction strength.
    pub fn weight(&self, value: f64) -> f64 {
        self.alpha * value
    }

    fn random_factors(&mut self, num_rows: usize) -> Result<DMatrix<f64>> {
        let values = self.base.rng.make_normal_vector(
            num_rows * self.n_factors,
            self.init_mean,
            self.init_std_dev,
        )?;
        Ok(DMatrix::from_row_slice(num_rows, self.n_factors, &values))
    }

    /// Recomputes every row of `factors` from the fixed `peer_factors`.
    fn solve_side(
        factors: &mut DMatrix<f64>,
        peer_factors: &DMatrix<f64>,
        ratings: &[SparseVector],
        reg: f64,
        alpha: f64,
        side: Side,
    ) -> Result<()> {
        let gram = peer_factors.tr_mul(peer_factors);
        for (index, row_ratings) in ratings.iter().enumerate() {
            let solution = solve_row(&gram, peer_factors, row_ratings, reg, |value| alpha * value)
                .ok_or(Error::SingularMatrix { side, index })?;
            factors.set_row(index, &solution.transpose());
        }
        Ok(())
    }
}

/// Closed-form least squares solution for a single row, given the Gram matrix `Pᵀ P` of the
/// fixed peer factors `P`. `None` if the system is singular.
pub fn solve_row<W>(
    gram: &DMatrix<f64>,
    peer_factors: &DMatrix<f64>,
    ratings: &SparseVector,
    reg: f64,
    weight: W,
) -> Option<DVector<f64>>
where
    W: Fn(f64) -> f64,
{
    let n_factors = gram.nrows();
    let mut a = gram.clone();
    let mut b = DVector::zeros(n_factors);

    for (_, index, value) in ratings.iter() {
        let peer: DVector<f64> = peer_factors.row(index).transpose();
        let confidence = weight(value);
        a.ger(confidence, &peer, &peer, 1.0);
        b.axpy(confidence + 1.0, &peer, 1.0);
    }
    for k in 0..n_factors {
        a[(k, k)] += reg;
    }

    a.try_inverse().map(|inverse| inverse * b)
}

impl Model for Wrmf {

    fn set_params(&mut self, params: Params) {
        self.n_factors = params.get_int(ParamName::NFactors, 15);
        self.n_epochs = params.get_int(ParamName::NEpochs, 50);
        self.init_mean = params.get_float(ParamName::InitMean, 0.0);
        self.init_std_dev = params.get_float(ParamName::InitStdDev, 0.1);
        self.reg = params.get_float(ParamName::Reg, 0.06);
        self.alpha = params.get_float(ParamName::Alpha, 1.0);
        self.base.set_params(params);
    }

    fn fit(&mut self, train_set: &DataSet, options: &FitOptions) -> Result<()> {
        self.base.init(options);

        let start = Instant::now();
        log::info!(
            "Fitting WRMF on {} interactions between {} users and {} items.",
            train_set.len(),
            train_set.user_count(),
            train_set.item_count(),
        );

        let user_factor = self.random_factors(train_set.user_count())?;
        let item_factor = self.random_factors(train_set.item_count())?;

        self.base.adopt_ids(train_set);
        self.user_factor = user_factor;
        self.item_factor = item_factor;

        for epoch in 0..self.n_epochs {
            Wrmf::solve_side(
                &mut self.user_factor,
                &self.item_factor,
                &train_set.dense_user_ratings,
                self.reg,
                self.alpha,
                Side::User,
            )?;
            Wrmf::solve_side(
                &mut self.item_factor,
                &self.user_factor,
                &train_set.dense_item_ratings,
                self.reg,
                self.alpha,
                Side::Item,
            )?;
            self.base.log_epoch("WRMF", epoch, self.n_epochs, None);
        }

        log::info!("Fitted WRMF in {}ms.", to_millis(start.elapsed()));
        Ok(())
    }

    fn predict(&self, user_id: &str, item_id: &str) -> f64 {
        match self.base.dense_ids(user_id, item_id) {
            (Some(user), Some(item)) => self.user_factor.row(user).dot(&self.item_factor.row(item)),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {

    use approx::assert_relative_eq;

    use super::*;

    fn train_set() -> DataSet {
        DataSet::new(vec![
            ("alice", "apple", 2.0),
            ("alice", "pony", 1.0),
            ("bob", "pony", 3.0),
        ])
    }

    fn params() -> Params {
        Params::new()
            .with(ParamName::NFactors, 2_usize)
            .with(ParamName::NEpochs, 3_usize)
            .with(ParamName::RandomState, 11_usize)
    }

    #[test]
    fn unknown_ids_predict_zero() {
        let mut wrmf = Wrmf::new(params());
        assert_eq!(wrmf.predict("alice", "apple"), 0.0);

        wrmf.fit(&train_set(), &FitOptions::default()).unwrap();

        assert_eq!(wrmf.predict("zoe", "bike"), 0.0);
        assert_eq!(wrmf.predict("alice", "bike"), 0.0);
        assert_eq!(wrmf.predict("zoe", "apple"), 0.0);
    }

    #[test]
    fn row_solve_matches_direct_solution() {
        let item_factor = DMatrix::from_row_slice(2, 2, &[0.5, 0.1, 0.2, 0.3]);
        let mut ratings = SparseVector::new();
        ratings.add(0, 2.0);
        ratings.add(1, 1.0);
        let reg = 0.06;

        let gram = item_factor.transpose() * &item_factor;
        let solution = solve_row(&gram, &item_factor, &ratings, reg, |value| value).unwrap();

        // A = Yᵀ Y + Σ r q qᵀ + λ I, b = Σ (r + 1) q, assembled entry by entry
        let rows = [([0.5, 0.1], 2.0), ([0.2, 0.3], 1.0)];
        let mut a = DMatrix::<f64>::zeros(2, 2);
        let mut b = DVector::<f64>::zeros(2);
        for r in 0..2 {
            for c in 0..2 {
                a[(r, c)] = rows.iter().map(|(q, w)| (1.0 + w) * q[r] * q[c]).sum::<f64>();
            }
            a[(r, r)] += reg;
            b[r] = rows.iter().map(|(q, w)| (w + 1.0) * q[r]).sum::<f64>();
        }
        let expected = a.clone().lu().solve(&b).unwrap();

        assert_relative_eq!(solution, expected, epsilon = 1e-10);
        assert_relative_eq!(a * solution, b, epsilon = 1e-10);
    }

    #[test]
    fn item_factors_solve_the_last_half_step() {
        let train_set = train_set();
        let mut wrmf = Wrmf::new(params());
        wrmf.fit(&train_set, &FitOptions::default()).unwrap();

        let gram = wrmf.user_factor.tr_mul(&wrmf.user_factor);
        for (item, ratings) in train_set.dense_item_ratings.iter().enumerate() {
            let expected = solve_row(&gram, &wrmf.user_factor, ratings, 0.06, |value| value).unwrap();
            assert_relative_eq!(wrmf.item_factor.row(item).transpose(), expected, epsilon = 1e-10);
        }

        let expected = wrmf.user_factor.row(1).dot(&wrmf.item_factor.row(1));
        assert_relative_eq!(wrmf.predict("bob", "pony"), expected);
    }

    #[test]
    fn confidence_weight() {
        let wrmf = Wrmf::new(Params::new().with(ParamName::Alpha, 40_i64));
        assert_eq!(wrmf.weight(0.5), 20.0);
        assert_eq!(Wrmf::new(Params::new()).weight(3.0), 3.0);
    }

    #[test]
    fn singular_system_is_an_error() {
        let mut wrmf = Wrmf::new(
            params()
                .with(ParamName::Reg, 0.0)
                .with(ParamName::InitStdDev, 0.0),
        );

        match wrmf.fit(&train_set(), &FitOptions::default()) {
            Err(Error::SingularMatrix { side: Side::User, index: 0 }) => {}
            other => panic!("expected a singular matrix, got {:?}", other),
        }
        assert_eq!(wrmf.predict("alice", "apple"), 0.0);
    }
}
