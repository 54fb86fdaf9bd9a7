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

//! SVD++ extends the biased factorization with implicit feedback. The prediction is
//!
//! ```text
//! r̂(u, i) = μ + b_u + b_i + q_i · (p_u + |I_u|^-½ Σ_{j ∈ I_u} y_j)
//! ```
//!
//! where the `y_j` form a second set of item factors describing the fact that a user interacted
//! with item `j`, regardless of the value. Unknown users and items contribute neither biases nor
//! factors.

use std::time::Instant;

use scoped_pool::Pool;

use crate::dataset::DataSet;
use crate::error::Result;
use crate::model::{BaseModel, FitOptions, Model};
use crate::params::{ParamName, Params};
use crate::types::{new_dense_vector, DenseMatrix, DenseVector, SparseVector};
use crate::utils::{add_scaled, sgd_assign, to_millis};

pub struct SvdPlusPlus {
    pub base: BaseModel,
    /// `I_u`, the items each user interacted with during training.
    pub user_ratings: Vec<SparseVector>,
    pub user_factor: DenseMatrix,
    pub item_factor: DenseMatrix,
    pub impl_factor: DenseMatrix,
    pub user_bias: DenseVector,
    pub item_bias: DenseVector,
    pub global_mean: f64,
    n_factors: usize,
    n_epochs: usize,
    lr: f64,
    reg: f64,
    init_mean: f64,
    init_std_dev: f64,
}

impl SvdPlusPlus {

    /// Recognized parameters and their defaults: `nFactors` (20), `nEpochs` (20), `lr` (0.007),
    /// `reg` (0.02), `initMean` (0), `initStdDev` (0.1) and `nJobs` (1), the number of workers
    /// updating the implicit factors.
    pub fn new(params: Params) -> Self {
        let mut svd = SvdPlusPlus {
            base: BaseModel::new(Params::new()),
            user_ratings: Vec::new(),
            user_factor: Vec::new(),
            item_factor: Vec::new(),
            impl_factor: Vec::new(),
            user_bias: Vec::new(),
            item_bias: Vec::new(),
            global_mean: 0.0,
            n_factors: 20,
            n_epochs: 20,
            lr: 0.007,
            reg: 0.02,
            init_mean: 0.0,
            init_std_dev: 0.1,
        };
        svd.set_params(params);
        svd
    }

    /// `|I_u|^-½ Σ_{j ∈ I_u} y_j` for a known user.
    pub fn sum_factors(&self, user: usize) -> DenseVector {
        let ratings = &self.user_ratings[user];
        let mut sum_factor = new_dense_vector(self.n_factors);
        if ratings.is_empty() {
            return sum_factor;
        }

        for (_, item, _) in ratings.iter() {
            add_scaled(&mut sum_factor, &self.impl_factor[item], 1.0);
        }
        let scale = (ratings.len() as f64).powf(-0.5);
        for value in sum_factor.iter_mut() {
            *value *= scale;
        }
        sum_factor
    }

    /// Recomputes the implicit sum unless one is supplied.
    fn predict_dense(
        &self,
        user: Option<usize>,
        item: Option<usize>,
        sum_factor: Option<&[f64]>,
    ) -> f64 {
        let mut prediction = self.global_mean;
        if let Some(user) = user {
            prediction += self.user_bias[user];
        }
        if let Some(item) = item {
            prediction += self.item_bias[item];
        }
        if let (Some(user), Some(item)) = (user, item) {
            let computed;
            let sum_factor: &[f64] = match sum_factor {
                Some(sum_factor) => sum_factor,
                None => {
                    computed = self.sum_factors(user);
                    &computed
                }
            };
            prediction += self.user_factor[user]
                .iter()
                .zip(sum_factor)
                .zip(&self.item_factor[item])
                .map(|((user_value, implicit_value), item_value)| {
                    (user_value + implicit_value) * item_value
                })
                .sum::<f64>();
        }
        prediction
    }
}

/// Worker pool for the implicit factor updates, shut down when dropped.
struct Workers {
    pool: Pool,
}

impl Workers {
    fn new(n_jobs: usize) -> Self {
        Workers { pool: Pool::new(n_jobs) }
    }
}

impl Drop for Workers {
    fn drop(&mut self) {
        self.pool.shutdown();
    }
}

/// Mutable references to the rows at the given distinct indices, in the order in which the
/// indices are listed.
fn select_rows_mut<'a>(matrix: &'a mut [DenseVector], indices: &[usize]) -> Vec<&'a mut DenseVector> {
    let mut order: Vec<usize> = (0..indices.len()).collect();
    order.sort_by_key(|position| indices[*position]);

    let mut selected: Vec<Option<&'a mut DenseVector>> = (0..indices.len()).map(|_| None).collect();
    let mut rest = matrix;
    let mut offset = 0;

    for position in order {
        let index = indices[position];
        debug_assert!(index >= offset, "row indices must be distinct");
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(index - offset);
        if let Some((row, tail)) = tail.split_first_mut() {
            selected[position] = Some(row);
            rest = tail;
            offset = index + 1;
        }
    }

    selected.into_iter().flatten().collect()
}

/// Applies `y_j += lr * (step / |I_u| - reg * y_j)` to the implicit factors of the user's items.
/// The item list is cut into `n_jobs` contiguous ranges and every range is handled by its own
/// worker; the call returns once all workers are done.
fn update_implicit_factors(
    pool: &Pool,
    n_jobs: usize,
    impl_factor: &mut DenseMatrix,
    items: &[usize],
    step: &[f64],
    lr: f64,
    reg: f64,
) {
    let size = items.len();
    if size == 0 {
        return;
    }

    let gradient: DenseVector = step.iter().map(|value| value / size as f64).collect();
    let gradient = &gradient;

    let mut rows = select_rows_mut(impl_factor, items);
    let mut chunks: Vec<&mut [&mut DenseVector]> = Vec::with_capacity(n_jobs);
    let mut rest: &mut [&mut DenseVector] = &mut rows;
    for job in 0..n_jobs {
        let low = size * job / n_jobs;
        let high = size * (job + 1) / n_jobs;
        let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(high - low);
        rest = tail;
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
    }

    pool.scoped(|scope| {
        for chunk in chunks {
            scope.execute(move || {
                for row in chunk.iter_mut() {
                    sgd_assign(row, gradient, 1.0, lr, reg);
                }
            });
        }
    });
}

impl Model for SvdPlusPlus {

    fn set_params(&mut self, params: Params) {
        self.n_factors = params.get_int(ParamName::NFactors, 20);
        self.n_epochs = params.get_int(ParamName::NEpochs, 20);
        self.lr = params.get_float(ParamName::Lr, 0.007);
        self.reg = params.get_float(ParamName::Reg, 0.02);
        self.init_mean = params.get_float(ParamName::InitMean, 0.0);
        self.init_std_dev = params.get_float(ParamName::InitStdDev, 0.1);
        self.base.set_params(params);
    }

    fn fit(&mut self, train_set: &DataSet, options: &FitOptions) -> Result<()> {
        self.base.init(options);

        let start = Instant::now();
        log::info!(
            "Fitting SVD++ on {} interactions between {} users and {} items with {} workers.",
            train_set.len(),
            train_set.user_count(),
            train_set.item_count(),
            self.base.n_jobs,
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
        let impl_factor = self.base.rng.make_normal_matrix(
            train_set.item_count(),
            self.n_factors,
            self.init_mean,
            self.init_std_dev,
        )?;

        self.base.adopt_ids(train_set);
        self.global_mean = train_set.global_mean;
        self.user_bias = new_dense_vector(train_set.user_count());
        self.item_bias = new_dense_vector(train_set.item_count());
        self.user_factor = user_factor;
        self.item_factor = item_factor;
        self.impl_factor = impl_factor;
        self.user_ratings = train_set.dense_user_ratings.clone();

        let workers = Workers::new(self.base.n_jobs);

        let mut step = new_dense_vector(self.n_factors);
        let mut user_factor = new_dense_vector(self.n_factors);
        let mut item_factor = new_dense_vector(self.n_factors);
        let mut combined = new_dense_vector(self.n_factors);

        for epoch in 0..self.n_epochs {
            let mut squared_error = 0.0;

            for user in 0..train_set.user_count() {
                let ratings = &train_set.dense_user_ratings[user];
                let scale = (ratings.len() as f64).powf(-0.5);
                let sum_factor = self.sum_factors(user);
                for value in step.iter_mut() {
                    *value = 0.0;
                }

                for (_, item, rating) in ratings.iter() {
                    let user_bias = self.user_bias[user];
                    let item_bias = self.item_bias[item];
                    user_factor.copy_from_slice(&self.user_factor[user]);
                    item_factor.copy_from_slice(&self.item_factor[item]);

                    let error =
                        rating - self.predict_dense(Some(user), Some(item), Some(sum_factor.as_slice()));
                    squared_error += error * error;

                    self.user_bias[user] += self.lr * (error - self.reg * user_bias);
                    self.item_bias[item] += self.lr * (error - self.reg * item_bias);

                    sgd_assign(&mut self.user_factor[user], &item_factor, error, self.lr, self.reg);

                    for ((combined, user_value), implicit_value) in combined
                        .iter_mut()
                        .zip(&user_factor)
                        .zip(&sum_factor)
                    {
                        *combined = user_value + implicit_value;
                    }
                    sgd_assign(&mut self.item_factor[item], &combined, error, self.lr, self.reg);

                    add_scaled(&mut step, &item_factor, error * scale);
                }

                update_implicit_factors(
                    &workers.pool,
                    self.base.n_jobs,
                    &mut self.impl_factor,
                    &ratings.indices,
                    &step,
                    self.lr,
                    self.reg,
                );
            }

            let rmse = (squared_error / train_set.len().max(1) as f64).sqrt();
            self.base.log_epoch("SVD++", epoch, self.n_epochs, Some(rmse));
        }

        drop(workers);
        log::info!("Fitted SVD++ in {}ms.", to_millis(start.elapsed()));
        Ok(())
    }

    fn predict(&self, user_id: &str, item_id: &str) -> f64 {
        let (user, item) = self.base.dense_ids(user_id, item_id);
        self.predict_dense(user, item, None)
    }
}

#[cfg(test)]
mod tests {

    use approx::assert_relative_eq;

    use super::*;
    use crate::random::RandomGenerator;

    fn train_set() -> DataSet {
        DataSet::new(vec![
            ("alice", "apple", 5.0),
            ("alice", "pony", 3.0),
            ("alice", "dog", 4.0),
            ("bob", "apple", 4.0),
            ("bob", "bike", 1.0),
            ("charles", "pony", 2.0),
            ("charles", "bike", 5.0),
            ("charles", "dog", 3.0),
        ])
    }

    fn params(n_epochs: usize) -> Params {
        Params::new()
            .with(ParamName::NFactors, 3_usize)
            .with(ParamName::NEpochs, n_epochs)
            .with(ParamName::RandomState, 21_usize)
    }

    #[test]
    fn unknown_ids_predict_global_mean() {
        let train_set = train_set();
        let mut svd = SvdPlusPlus::new(params(2));
        svd.fit(&train_set, &FitOptions::default()).unwrap();

        assert_eq!(svd.predict("zoe", "car"), train_set.global_mean);
        assert_eq!(svd.predict("alice", "car"), train_set.global_mean + svd.user_bias[0]);
    }

    #[test]
    fn implicit_sum_of_three_items() {
        let mut svd = SvdPlusPlus::new(params(0));
        svd.fit(&train_set(), &FitOptions::default()).unwrap();

        // alice interacted with apple, pony and dog
        let sum_factor = svd.sum_factors(0);
        for f in 0..3 {
            let expected = (svd.impl_factor[0][f] + svd.impl_factor[1][f] + svd.impl_factor[2][f])
                / 3.0_f64.sqrt();
            assert_relative_eq!(sum_factor[f], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn prediction_uses_the_implicit_sum() {
        let mut svd = SvdPlusPlus::new(params(3));
        svd.fit(&train_set(), &FitOptions::default()).unwrap();

        let sum_factor = svd.sum_factors(1);
        let mut expected = svd.global_mean + svd.user_bias[1] + svd.item_bias[3];
        for f in 0..3 {
            expected += (svd.user_factor[1][f] + sum_factor[f]) * svd.item_factor[3][f];
        }

        assert_relative_eq!(svd.predict("bob", "bike"), expected, epsilon = 1e-12);
    }

    #[test]
    fn worker_count_does_not_change_the_result() {
        let train_set = train_set();

        let mut sequential = SvdPlusPlus::new(params(4));
        sequential.fit(&train_set, &FitOptions::default().with_n_jobs(1)).unwrap();

        let mut parallel = SvdPlusPlus::new(params(4));
        parallel.fit(&train_set, &FitOptions::default().with_n_jobs(3)).unwrap();

        assert_eq!(sequential.impl_factor, parallel.impl_factor);
        assert_eq!(sequential.user_factor, parallel.user_factor);
        assert_eq!(sequential.item_bias, parallel.item_bias);
    }

    #[test]
    fn single_user_epoch() {
        let (lr, reg) = (0.05, 0.1);
        let train_set = DataSet::new(vec![("alice", "apple", 5.0), ("alice", "pony", 3.0)]);
        let mut svd = SvdPlusPlus::new(
            params(1)
                .with(ParamName::Lr, lr)
                .with(ParamName::Reg, reg),
        );
        svd.fit(&train_set, &FitOptions::default().with_n_jobs(2)).unwrap();

        // replay the initialization with the same seed
        let mut rng = RandomGenerator::new(21);
        let mut p = rng.make_normal_matrix(1, 3, 0.0, 0.1).unwrap().remove(0);
        let mut q = rng.make_normal_matrix(2, 3, 0.0, 0.1).unwrap();
        let mut y = rng.make_normal_matrix(2, 3, 0.0, 0.1).unwrap();

        let mean = 4.0;
        let scale = 0.5_f64.sqrt();
        let sum: Vec<f64> = (0..3).map(|f| scale * (y[0][f] + y[1][f])).collect();
        let mut user_bias = 0.0;
        let mut item_bias = vec![0.0, 0.0];
        let mut step = vec![0.0; 3];

        for (_, item, rating) in train_set.dense_user_ratings[0].iter() {
            let prediction = mean
                + user_bias
                + item_bias[item]
                + (0..3).map(|f| (p[f] + sum[f]) * q[item][f]).sum::<f64>();
            let e = rating - prediction;

            user_bias += lr * (e - reg * user_bias);
            item_bias[item] += lr * (e - reg * item_bias[item]);

            let p_before = p.clone();
            let q_before = q[item].clone();
            for f in 0..3 {
                p[f] = p_before[f] + lr * (e * q_before[f] - reg * p_before[f]);
                q[item][f] =
                    q_before[f] + lr * (e * (p_before[f] + sum[f]) - reg * q_before[f]);
                step[f] += e * q_before[f] * scale;
            }
        }
        for row in y.iter_mut() {
            for f in 0..3 {
                row[f] += lr * (step[f] / 2.0 - reg * row[f]);
            }
        }

        assert_relative_eq!(svd.user_bias[0], user_bias, epsilon = 1e-12);
        for item in 0..2 {
            assert_relative_eq!(svd.item_bias[item], item_bias[item], epsilon = 1e-12);
        }
        for f in 0..3 {
            assert_relative_eq!(svd.user_factor[0][f], p[f], epsilon = 1e-12);
            for item in 0..2 {
                assert_relative_eq!(svd.item_factor[item][f], q[item][f], epsilon = 1e-12);
                assert_relative_eq!(svd.impl_factor[item][f], y[item][f], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn workers_are_shut_down_when_dropped() {
        let workers = Workers::new(3);
        let pool = workers.pool.clone();

        drop(workers);
        assert_eq!(pool.workers(), 0);
    }

    #[test]
    fn rows_are_selected_in_list_order() {
        let mut matrix: DenseMatrix = (0..6).map(|row| vec![row as f64]).collect();
        let rows = select_rows_mut(&mut matrix, &[4, 1, 5]);

        let values: Vec<f64> = rows.iter().map(|row| row[0]).collect();
        assert_eq!(values, vec![4.0, 1.0, 5.0]);
    }

    #[test]
    fn implicit_update_touches_only_the_given_rows() {
        let mut impl_factor: DenseMatrix = vec![vec![1.0, 1.0]; 5];
        let pool = Pool::new(2);

        update_implicit_factors(&pool, 2, &mut impl_factor, &[3, 0], &[2.0, -4.0], 0.1, 0.5);
        pool.shutdown();

        // 1.0 + 0.1 * (2.0 / 2 - 0.5) and 1.0 + 0.1 * (-4.0 / 2 - 0.5)
        for row in [0, 3].iter() {
            assert_relative_eq!(impl_factor[*row][0], 1.05, epsilon = 1e-12);
            assert_relative_eq!(impl_factor[*row][1], 0.75, epsilon = 1e-12);
        }
        for row in [1, 2, 4].iter() {
            assert_eq!(impl_factor[*row], vec![1.0, 1.0]);
        }
    }
}
