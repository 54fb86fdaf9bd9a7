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

//! Non-negative matrix factorization with multiplicative updates. Uniform initialization keeps
//! every factor non-negative, and each update only rescales it by a non-negative ratio.

use std::time::Instant;

use crate::dataset::DataSet;
use crate::error::{Error, Result, Side};
use crate::model::{BaseModel, FitOptions, Model};
use crate::params::{ParamName, Params};
use crate::types::{new_dense_matrix, DenseMatrix};
use crate::utils::{dot, to_millis};

pub struct Nmf {
    pub base: BaseModel,
    pub user_factor: DenseMatrix,
    pub item_factor: DenseMatrix,
    pub global_mean: f64,
    n_factors: usize,
    n_epochs: usize,
    init_low: f64,
    init_high: f64,
    reg: f64,
}

impl Nmf {

    /// Recognized parameters and their defaults: `nFactors` (15), `nEpochs` (50),
    /// `initLow` (0), `initHigh` (1) and `reg` (0.06).
    pub fn new(params: Params) -> Self {
        let mut nmf = Nmf {
            base: BaseModel::new(Params::new()),
            user_factor: Vec::new(),
            item_factor: Vec::new(),
            global_mean: 0.0,
            n_factors: 15,
            n_epochs: 50,
            init_low: 0.0,
            init_high: 1.0,
            reg: 0.06,
        };
        nmf.set_params(params);
        nmf
    }

    fn predict_dense(&self, user: Option<usize>, item: Option<usize>) -> f64 {
        match (user, item) {
            (Some(user), Some(item)) => dot(&self.user_factor[user], &self.item_factor[item]),
            _ => self.global_mean,
        }
    }
}

/// `factor *= numerator / denominator`, element-wise for every row.
fn multiplicative_update(
    factors: &mut DenseMatrix,
    numerators: &DenseMatrix,
    denominators: &DenseMatrix,
    side: Side,
) -> Result<()> {
    for (index, ((factor, numerator), denominator)) in factors
        .iter_mut()
        .zip(numerators)
        .zip(denominators)
        .enumerate()
    {
        if denominator.iter().any(|value| *value == 0.0) {
            return Err(Error::ZeroDenominator { side, index });
        }
        for ((value, numerator), denominator) in factor.iter_mut().zip(numerator).zip(denominator) {
            *value *= numerator / denominator;
        }
    }
    Ok(())
}

fn fill_zero(matrix: &mut DenseMatrix) {
    for row in matrix.iter_mut() {
        for value in row.iter_mut() {
            *value = 0.0;
        }
    }
}

impl Model for Nmf {

    fn set_params(&mut self, params: Params) {
        self.n_factors = params.get_int(ParamName::NFactors, 15);
        self.n_epochs = params.get_int(ParamName::NEpochs, 50);
        self.init_low = params.get_float(ParamName::InitLow, 0.0);
        self.init_high = params.get_float(ParamName::InitHigh, 1.0);
        self.reg = params.get_float(ParamName::Reg, 0.06);
        self.base.set_params(params);
    }

    fn fit(&mut self, train_set: &DataSet, options: &FitOptions) -> Result<()> {
        self.base.init(options);

        let start = Instant::now();
        log::info!(
            "Fitting NMF on {} interactions between {} users and {} items.",
            train_set.len(),
            train_set.user_count(),
            train_set.item_count(),
        );

        let user_factor = self.base.rng.make_uniform_matrix(
            train_set.user_count(),
            self.n_factors,
            self.init_low,
            self.init_high,
        )?;
        let item_factor = self.base.rng.make_uniform_matrix(
            train_set.item_count(),
            self.n_factors,
            self.init_low,
            self.init_high,
        )?;

        self.base.adopt_ids(train_set);
        self.global_mean = train_set.global_mean;
        self.user_factor = user_factor;
        self.item_factor = item_factor;

        let mut user_numerators = new_dense_matrix(train_set.user_count(), self.n_factors);
        let mut user_denominators = new_dense_matrix(train_set.user_count(), self.n_factors);
        let mut item_numerators = new_dense_matrix(train_set.item_count(), self.n_factors);
        let mut item_denominators = new_dense_matrix(train_set.item_count(), self.n_factors);

        for epoch in 0..self.n_epochs {
            fill_zero(&mut user_numerators);
            fill_zero(&mut user_denominators);
            fill_zero(&mut item_numerators);
            fill_zero(&mut item_denominators);

            let mut squared_error = 0.0;

            // Accumulated from the factors as they were at the start of the epoch.
            for index in 0..train_set.len() {
                let (user, item, rating) = train_set.get_dense(index);
                let prediction = self.predict_dense(Some(user), Some(item));
                squared_error += (rating - prediction) * (rating - prediction);

                let user_factor = &self.user_factor[user];
                let item_factor = &self.item_factor[item];
                for f in 0..self.n_factors {
                    user_numerators[user][f] += item_factor[f] * rating;
                    user_denominators[user][f] +=
                        item_factor[f] * prediction + self.reg * user_factor[f];
                    item_numerators[item][f] += user_factor[f] * rating;
                    item_denominators[item][f] +=
                        user_factor[f] * prediction + self.reg * item_factor[f];
                }
            }

            multiplicative_update(
                &mut self.user_factor,
                &user_numerators,
                &user_denominators,
                Side::User,
            )?;
            multiplicative_update(
                &mut self.item_factor,
                &item_numerators,
                &item_denominators,
                Side::Item,
            )?;

            let rmse = (squared_error / train_set.len().max(1) as f64).sqrt();
            self.base.log_epoch("NMF", epoch, self.n_epochs, Some(rmse));
        }

        log::info!("Fitted NMF in {}ms.", to_millis(start.elapsed()));
        Ok(())
    }

    fn predict(&self, user_id: &str, item_id: &str) -> f64 {
        let (user, item) = self.base.dense_ids(user_id, item_id);
        self.predict_dense(user, item)
    }
}
