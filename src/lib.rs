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

//! Latent factor models for collaborative filtering.
//!
//! Every model implements [`Model`]: configure it with [`Params`], train it on a [`DataSet`] and
//! predict the affinity of a user for an item by their original identifiers.
//!
//! * [`Svd`], biased matrix factorization trained for regression or with the BPR ranking
//!   objective,
//! * [`Nmf`], non-negative matrix factorization with multiplicative updates,
//! * [`SvdPlusPlus`], SVD extended with implicit feedback factors,
//! * [`Wrmf`], weighted matrix factorization for implicit feedback via alternating least squares.

mod error;

pub mod dataset;
pub mod evaluate;
pub mod io;
pub mod logging;
pub mod model;
pub mod nmf;
pub mod params;
pub mod random;
pub mod svd;
pub mod svdpp;
pub mod types;
pub mod utils;
pub mod wrmf;

pub use dataset::{DataSet, IdSet};
pub use error::{Error, Result, Side};
pub use model::{AnyModel, FitOptions, Model};
pub use nmf::Nmf;
pub use params::{ParamName, ParamValue, Params, Target};
pub use random::RandomGenerator;
pub use svd::Svd;
pub use svdpp::SvdPlusPlus;
pub use wrmf::Wrmf;
