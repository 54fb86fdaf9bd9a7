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

//! Biased matrix factorization as popularized by Simon Funk during the Netflix Prize,
//!
//! ```text
//! r̂(u, i) = μ + b_u + b_i + p_u · q_i
//! ```
//!
//! trained either with stochastic gradient descent on the squared error or with the pairwise
//! Bayesian Personalized Ranking objective. An unknown user contributes neither bias nor
//! factors, and the same holds for an unknown item.

use std::time::Instant;

use fnv::FnvHashSet;

use crate::dataset::DataSet;
use crate::error::{Error, Result};
use crate::model::{BaseModel, FitOptions, Model};
use crate::params::{ParamName, Params, Target};
use crate::random::RandomGenerator;
use crate::types::{new_dense_vector, DenseMatrix, DenseVector};
use crate::utils::{dot, sgd_assign, to_millis};

/// Rejection sampling attempts before drawing a negative item from the explicit complement.
const MAX_NEGATIVE_REJECTIONS: usize = 64;

pub struct Svd {
    pub base: BaseModel,
    pub user_factor: DenseMatrix,
    pub item_factor: DenseMatrix,
    pub user_bias: DenseVector,
    pub item_bias: DenseVector,
    pub global_mean: f64,
    use_bias: bool,
    n_factors: usize,
    n_epochs: usize,
    lr: f64,
    reg: f64,
    init_mean: f64,
    init_std_dev: f64,
    target: String,
}

impl Svd {

    /// Recognized parameters and their defaults: `useBias` (true), `nFactors` (100),
    /// `nEpochs` (20), `lr` (0.005), `reg` (0.02), `initMean` (0), `initStdDev` (0.1) and
    /// `target` (`regression` or `bpr`).
    pub fn new(params: Params) -> Self {
        let mut svd = Svd {
            base: BaseModel::new(Params::new()),
            user_factor: Vec::new(),
            item_factor: Vec::new(),
            user_bias: Vec::new(),
            item_bias: Vec::new(),
            global_mean: 0.0,
            use_bias: true,
            n_factors: 100,
            n_epochs: 20,
            lr: 0.005,
            reg: 0.02,
            init_mean: 0.0,
            init_std_dev: 0.1,
            target: String::from("regression"),
        };
        svd.set_params(params);
        svd
    }

    fn predict_dense(&self, user: Option<usize>, item: Option<usize>) -> f64 {
        let mut prediction = self.global_mean;
        if self.use_bias {
            if let Some(user) = user {
                prediction += self.user_bias[user];
            }
            if let Some(item) = item {
                prediction += self.item_bias[item];
            }
        }
        if let (Some(user), Some(item)) = (user, item) {
            prediction += dot(&self.user_factor[user], &self.item_factor[item]);
        }
        prediction
    }

    fn fit_regression(&mut self, train_set: &DataSet) {
        self.global_mean = train_set.global_mean;

        let mut user_factor = new_dense_vector(self.n_factors);
        let mut item_factor = new_dense_vector(self.n_factors);

        for epoch in 0..self.n_epochs {
            let mut squared_error = 0.0;

            for index in self.base.rng.perm(train_set.len()) {
                let (user, item, rating) = train_set.get_dense(index);
                let error = rating - self.predict_dense(Some(user), Some(item));
                squared_error += error * error;

                if self.use_bias {
                    let user_bias = self.user_bias[user];
                    let item_bias = self.item_bias[item];
                    self.user_bias[user] += self.lr * (error - self.reg * user_bias);
                    self.item_bias[item] += self.lr * (error - self.reg * item_bias);
                }

                user_factor.copy_from_slice(&self.user_factor[user]);
                item_factor.copy_from_slice(&self.item_factor[item]);
                sgd_assign(&mut self.user_factor[user], &item_factor, error, self.lr, self.reg);
                sgd_assign(&mut self.item_factor[item], &user_factor, error, self.lr, self.reg);
            }

            let rmse = (squared_error / train_set.len().max(1) as f64).sqrt();
            self.base.log_epoch("SVD", epoch, self.n_epochs, Some(rmse));
        }
    }

    fn fit_bpr(&mut self, train_set: &DataSet) -> Result<()> {
        let positive_sets: Vec<FnvHashSet<usize>> = train_set
            .dense_user_ratings
            .iter()
            .map(|ratings| ratings.index_set())
            .collect();

        let mut user_factor = new_dense_vector(self.n_factors);
        let mut positive_factor = new_dense_vector(self.n_factors);
        let mut negative_factor = new_dense_vector(self.n_factors);
        let mut difference = new_dense_vector(self.n_factors);

        for epoch in 0..self.n_epochs {
            let mut loss = 0.0;

            for _ in 0..train_set.len() {
                let user = self.base.rng.intn(train_set.user_count());
                let user_ratings = &train_set.dense_user_ratings[user];
                let positive = user_ratings.indices[self.base.rng.intn(user_ratings.len())];
                let negative = sample_negative(
                    &mut self.base.rng,
                    &positive_sets[user],
                    train_set.item_count(),
                    user,
                )?;

                let diff = self.predict_dense(Some(user), Some(positive))
                    - self.predict_dense(Some(user), Some(negative));
                loss += (1.0 + (-diff).exp()).ln();
                let grad = bpr_gradient_weight(diff);

                user_factor.copy_from_slice(&self.user_factor[user]);
                positive_factor.copy_from_slice(&self.item_factor[positive]);
                negative_factor.copy_from_slice(&self.item_factor[negative]);
                for ((delta, positive_value), negative_value) in difference
                    .iter_mut()
                    .zip(&positive_factor)
                    .zip(&negative_factor)
                {
                    *delta = positive_value - negative_value;
                }

                sgd_assign(&mut self.item_factor[positive], &user_factor, grad, self.lr, self.reg);
                sgd_assign(&mut self.item_factor[negative], &user_factor, -grad, self.lr, self.reg);
                sgd_assign(&mut self.user_factor[user], &difference, grad, self.lr, self.reg);
            }

            let loss = loss / train_set.len().max(1) as f64;
            self.base.log_epoch("SVD (BPR)", epoch, self.n_epochs, Some(loss));
        }

        Ok(())
    }
}

/// Derivative weight of the BPR log-likelihood, `exp(-diff) / (1 + exp(-diff))`, written in a
/// form that does not overflow for large negative differences.
pub fn bpr_gradient_weight(diff: f64) -> f64 {
    1.0 / (1.0 + diff.exp())
}

/// Draws an item the user has not interacted with.
fn sample_negative(
    rng: &mut RandomGenerator,
    positives: &FnvHashSet<usize>,
    item_count: usize,
    user: usize,
) -> Result<usize> {
    if positives.len() >= item_count {
        return Err(Error::NegativeSamplingExhausted { user });
    }

    for _ in 0..MAX_NEGATIVE_REJECTIONS {
        let candidate = rng.intn(item_count);
        if !positives.contains(&candidate) {
            return Ok(candidate);
        }
    }

    let candidates: Vec<usize> = (0..item_count)
        .filter(|item| !positives.contains(item))
        .collect();
    Ok(candidates[rng.intn(candidates.len())])
}

impl Model for Svd {

    fn set_params(&mut self, params: Params) {
        self.use_bias = params.get_bool(ParamName::UseBias, true);
        self.n_factors = params.get_int(ParamName::NFactors, 100);
        self.n_epochs = params.get_int(ParamName::NEpochs, 20);
        self.lr = params.get_float(ParamName::Lr, 0.005);
        self.reg = params.get_float(ParamName::Reg, 0.02);
        self.init_mean = params.get_float(ParamName::InitMean, 0.0);
        self.init_std_dev = params.get_float(ParamName::InitStdDev, 0.1);
        self.target = params.get_string(ParamName::Target, "regression");
        self.base.set_params(params);
    }

    fn fit(&mut self, train_set: &DataSet, options: &FitOptions) -> Result<()> {
        let target: Target = self.target.parse()?;
        self.base.init(options);

        let start = Instant::now();
        log::info!(
            "Fitting SVD ({:?}) on {} interactions between {} users and {} items.",
            target,
            train_set.len(),
            train_set.user_count(),
            train_set.item_count(),
        );

        let user_factor = self.base.rng.make_normal_matrix(
            train_set.user_count(),
            self.n_factors,
            self.init_mean,
            self.init_std_dev,
        )?;
        let item_factor = self.base.rng.make_normal_matrix(
            train_set.item_count(),
            self.n_factors,
            self.init_mean,
            self.init_std_dev,
        )?;

        self.base.adopt_ids(train_set);
        self.global_mean = 0.0;
        self.user_bias = new_dense_vector(train_set.user_count());
        self.item_bias = new_dense_vector(train_set.item_count());
        self.user_factor = user_factor;
        self.item_factor = item_factor;

        match target {
            Target::Regression => self.fit_regression(train_set),
            Target::Bpr => self.fit_bpr(train_set)?,
        }

        log::info!("Fitted SVD in {}ms.", to_millis(start.elapsed()));
        Ok(())
    }

    fn predict(&self, user_id: &str, item_id: &str) -> f64 {
        let (user, item) = self.base.dense_ids(user_id, item_id);
        self.predict_dense(user, item)
    }
}
