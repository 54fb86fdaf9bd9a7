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

use std::fmt;

use thiserror::Error;

/// Which factor matrix a row-wise computation was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    User,
    Item,
}

impl fmt::Display for Side {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::User => formatter.write_str("user"),
            Side::Item => formatter.write_str("item"),
        }
    }
}

/// Fatal conditions which abort a fit. Predictions never fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown training target `{0}`, expected `regression` or `bpr`")]
    UnknownTarget(String),

    #[error("invalid value for parameter `{name}`: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    #[error("singular system while solving the factors of {side} #{index}")]
    SingularMatrix { side: Side, index: usize },

    #[error("zero denominator while updating the factors of {side} #{index}")]
    ZeroDenominator { side: Side, index: usize },

    #[error("user #{user} has interacted with every item, no negative sample exists")]
    NegativeSamplingExhausted { user: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
