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

use std::str::FromStr;

use log::Level;

use crate::dataset::{DataSet, IdSet};
use crate::error::{Error, Result};
use crate::nmf::Nmf;
use crate::params::{ParamName, Params};
use crate::random::RandomGenerator;
use crate::svd::Svd;
use crate::svdpp::SvdPlusPlus;
use crate::wrmf::Wrmf;

/// The operations shared by every latent factor model.
pub trait Model {

    /// Replaces the hyperparameters. Values are validated when the model is fitted.
    fn set_params(&mut self, params: Params);

    /// Trains the model from scratch, discarding any previously learned state.
    fn fit(&mut self, train_set: &DataSet, options: &FitOptions) -> Result<()>;

    /// Predicts the affinity of a user for an item. Unknown identifiers fall back to the
    /// model-specific default instead of failing.
    fn predict(&self, user_id: &str, item_id: &str) -> f64;
}

/// Fit-time overrides.
#[derive(Clone, Debug, Default)]
pub struct FitOptions {
    /// Worker count for the parallel sections, takes precedence over the `nJobs` parameter.
    pub n_jobs: Option<usize>,
    /// Logs per-epoch progress at info instead of debug level.
    pub verbose: bool,
}

impl FitOptions {

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// State every model carries besides its factors: the configuration, the identifier mappings of
/// the last training set and the random generator.
pub struct BaseModel {
    pub params: Params,
    pub user_ids: IdSet,
    pub item_ids: IdSet,
    pub rng: RandomGenerator,
    pub random_state: u64,
    pub n_jobs: usize,
    pub verbose: bool,
}

impl BaseModel {

    pub fn new(params: Params) -> Self {
        let mut base = BaseModel {
            params: Params::new(),
            user_ids: IdSet::new(),
            item_ids: IdSet::new(),
            rng: RandomGenerator::new(0),
            random_state: 0,
            n_jobs: 1,
            verbose: false,
        };
        base.set_params(params);
        base
    }

    pub fn set_params(&mut self, params: Params) {
        self.random_state = params.get_int(ParamName::RandomState, 0) as u64;
        self.params = params;
    }

    /// Prepares a fit: reseeds the generator so that every fit with the same seed is
    /// reproducible and resolves the worker count.
    pub fn init(&mut self, options: &FitOptions) {
        self.rng = RandomGenerator::new(self.random_state);
        self.n_jobs = options
            .n_jobs
            .unwrap_or_else(|| self.params.get_int(ParamName::NJobs, 1))
            .max(1);
        self.verbose = options.verbose;
    }

    /// Takes over the identifier mappings of the training set. Must only be called once the
    /// factors for that set exist, the mappings index into them.
    pub fn adopt_ids(&mut self, train_set: &DataSet) {
        self.user_ids = train_set.user_ids.clone();
        self.item_ids = train_set.item_ids.clone();
    }

    pub fn dense_ids(&self, user_id: &str, item_id: &str) -> (Option<usize>, Option<usize>) {
        (self.user_ids.to_dense_id(user_id), self.item_ids.to_dense_id(item_id))
    }

    pub fn log_epoch(&self, model: &str, epoch: usize, n_epochs: usize, loss: Option<f64>) {
        let level = if self.verbose { Level::Info } else { Level::Debug };
        match loss {
            Some(loss) => log::log!(level, "{} epoch {}/{}: loss {:.6}", model, epoch + 1, n_epochs, loss),
            None => log::log!(level, "{} epoch {}/{}", model, epoch + 1, n_epochs),
        }
    }
}

/// One of the available models, selected by name.
pub enum AnyModel {
    Svd(Svd),
    Nmf(Nmf),
    SvdPlusPlus(SvdPlusPlus),
    Wrmf(Wrmf),
}

impl AnyModel {

    pub fn new(name: &str, params: Params) -> Result<Self> {
        let kind: ModelKind = name.parse()?;
        Ok(match kind {
            ModelKind::Svd => AnyModel::Svd(Svd::new(params)),
            ModelKind::Nmf => AnyModel::Nmf(Nmf::new(params)),
            ModelKind::SvdPlusPlus => AnyModel::SvdPlusPlus(SvdPlusPlus::new(params)),
            ModelKind::Wrmf => AnyModel::Wrmf(Wrmf::new(params)),
        })
    }

    fn as_model(&self) -> &dyn Model {
        match self {
            AnyModel::Svd(model) => model,
            AnyModel::Nmf(model) => model,
            AnyModel::SvdPlusPlus(model) => model,
            AnyModel::Wrmf(model) => model,
        }
    }

    fn as_model_mut(&mut self) -> &mut dyn Model {
        match self {
            AnyModel::Svd(model) => model,
            AnyModel::Nmf(model) => model,
            AnyModel::SvdPlusPlus(model) => model,
            AnyModel::Wrmf(model) => model,
        }
    }
}

impl Model for AnyModel {

    fn set_params(&mut self, params: Params) {
        self.as_model_mut().set_params(params)
    }

    fn fit(&mut self, train_set: &DataSet, options: &FitOptions) -> Result<()> {
        self.as_model_mut().fit(train_set, options)
    }

    fn predict(&self, user_id: &str, item_id: &str) -> f64 {
        self.as_model().predict(user_id, item_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ModelKind {
    Svd,
    Nmf,
    SvdPlusPlus,
    Wrmf,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "svd" => Ok(ModelKind::Svd),
            "nmf" => Ok(ModelKind::Nmf),
            "svd++" | "svdpp" => Ok(ModelKind::SvdPlusPlus),
            "wrmf" => Ok(ModelKind::Wrmf),
            _ => Err(Error::InvalidParam {
                name: "model",
                reason: format!("unknown model `{}`, expected svd, nmf, svdpp or wrmf", name),
            }),
        }
    }
}
