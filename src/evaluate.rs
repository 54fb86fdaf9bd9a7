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

use crate::dataset::DataSet;
use crate::model::Model;

/// Running accumulator of prediction errors.
#[derive(Default)]
pub struct PredictionError {
    squared_error: f64,
    absolute_error: f64,
    count: usize,
}

impl PredictionError {

    pub fn push(&mut self, residual_error: f64) {
        self.squared_error += residual_error * residual_error;
        self.absolute_error += residual_error.abs();
        self.count += 1;
    }

    pub fn rmse(&self) -> f64 {
        (self.squared_error / self.count.max(1) as f64).sqrt()
    }

    pub fn mae(&self) -> f64 {
        self.absolute_error / self.count.max(1) as f64
    }
}

/// Accumulates `value - prediction` over every interaction of the data set, addressed by the
/// external identifiers so that users and items unknown to the model use its fallback.
pub fn errors<M: Model + ?Sized>(model: &M, data_set: &DataSet) -> PredictionError {
    let mut error = PredictionError::default();
    for index in 0..data_set.len() {
        let (user_id, item_id, rating) = data_set.get(index);
        error.push(rating - model.predict(user_id, item_id));
    }
    error
}

pub fn rmse<M: Model + ?Sized>(model: &M, data_set: &DataSet) -> f64 {
    errors(model, data_set).rmse()
}

pub fn mae<M: Model + ?Sized>(model: &M, data_set: &DataSet) -> f64 {
    errors(model, data_set).mae()
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::params::{ParamName, Params};
    use crate::svd::Svd;

    #[test]
    fn accumulator() {
        let mut error = PredictionError::default();
        assert_eq!(error.rmse(), 0.0);

        error.push(3.0);
        error.push(-4.0);

        assert!((error.rmse() - 12.5_f64.sqrt()).abs() < 1e-12);
        assert!((error.mae() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn unfitted_model_errors() {
        let data_set = DataSet::new(vec![("alice", "apple", 3.0), ("bob", "pony", -1.0)]);
        let svd = Svd::new(Params::new().with(ParamName::NFactors, 2_usize));

        assert!((rmse(&svd, &data_set) - 5.0_f64.sqrt()).abs() < 1e-12);
        assert!((mae(&svd, &data_set) - 2.0).abs() < 1e-12);
    }
}
