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

use fnv::FnvHashMap;
use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Names of the recognized hyperparameters, spelled in camel case in serialized form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamName {
    UseBias,
    NFactors,
    NEpochs,
    Lr,
    Reg,
    InitMean,
    InitStdDev,
    InitLow,
    InitHigh,
    Target,
    Alpha,
    NJobs,
    RandomState,
}

impl ParamName {

    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::UseBias => "useBias",
            ParamName::NFactors => "nFactors",
            ParamName::NEpochs => "nEpochs",
            ParamName::Lr => "lr",
            ParamName::Reg => "reg",
            ParamName::InitMean => "initMean",
            ParamName::InitStdDev => "initStdDev",
            ParamName::InitLow => "initLow",
            ParamName::InitHigh => "initHigh",
            ParamName::Target => "target",
            ParamName::Alpha => "alpha",
            ParamName::NJobs => "nJobs",
            ParamName::RandomState => "randomState",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl<'a> From<&'a str> for ParamValue {
    fn from(value: &'a str) -> Self {
        ParamValue::Str(value.to_owned())
    }
}

/// Hyperparameter configuration. Lookups take the documented default of the calling model, so
/// a missing entry is never an error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(FnvHashMap<ParamName, ParamValue>);

impl Params {

    pub fn new() -> Self {
        Params::default()
    }

    /// Parses a JSON object such as `{"nFactors": 10, "target": "bpr"}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with<V: Into<ParamValue>>(mut self, name: ParamName, value: V) -> Self {
        self.set(name, value);
        self
    }

    pub fn set<V: Into<ParamValue>>(&mut self, name: ParamName, value: V) {
        self.0.insert(name, value.into());
    }

    pub fn contains(&self, name: ParamName) -> bool {
        self.0.contains_key(&name)
    }

    pub fn get_bool(&self, name: ParamName, default: bool) -> bool {
        match self.0.get(&name) {
            None => default,
            Some(ParamValue::Bool(value)) => *value,
            Some(other) => mismatch(name, other, "a boolean", default),
        }
    }

    pub fn get_int(&self, name: ParamName, default: usize) -> usize {
        match self.0.get(&name) {
            None => default,
            Some(ParamValue::Int(value)) if *value >= 0 => *value as usize,
            Some(other) => mismatch(name, other, "a non-negative integer", default),
        }
    }

    /// Integers are accepted as floats.
    pub fn get_float(&self, name: ParamName, default: f64) -> f64 {
        match self.0.get(&name) {
            None => default,
            Some(ParamValue::Float(value)) => *value,
            Some(ParamValue::Int(value)) => *value as f64,
            Some(other) => mismatch(name, other, "a number", default),
        }
    }

    pub fn get_string(&self, name: ParamName, default: &str) -> String {
        match self.0.get(&name) {
            None => default.to_owned(),
            Some(ParamValue::Str(value)) => value.clone(),
            Some(other) => mismatch(name, other, "a string", default.to_owned()),
        }
    }
}

fn mismatch<T>(name: ParamName, value: &ParamValue, expected: &str, default: T) -> T {
    log::warn!(
        "Parameter `{}` should be {}, got {:?}; falling back to the default.",
        name.as_str(),
        expected,
        value,
    );
    default
}

/// Training objective of the SVD model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Regression,
    Bpr,
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "regression" => Ok(Target::Regression),
            "bpr" => Ok(Target::Bpr),
            _ => Err(Error::UnknownTarget(value.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn defaults_for_missing_entries() {
        let params = Params::new();

        assert_eq!(params.get_int(ParamName::NFactors, 100), 100);
        assert_eq!(params.get_float(ParamName::Lr, 0.005), 0.005);
        assert!(params.get_bool(ParamName::UseBias, true));
        assert_eq!(params.get_string(ParamName::Target, "regression"), "regression");
    }

    #[test]
    fn typed_lookups() {
        let params = Params::new()
            .with(ParamName::NFactors, 8_usize)
            .with(ParamName::Reg, 2_i64)
            .with(ParamName::UseBias, false)
            .with(ParamName::Target, "bpr");

        assert_eq!(params.get_int(ParamName::NFactors, 100), 8);
        assert_eq!(params.get_float(ParamName::Reg, 0.02), 2.0);
        assert!(!params.get_bool(ParamName::UseBias, true));
        assert_eq!(params.get_string(ParamName::Target, "regression"), "bpr");
    }

    #[test]
    fn type_mismatch_falls_back_to_default() {
        let params = Params::new()
            .with(ParamName::NEpochs, "many")
            .with(ParamName::NFactors, -3_i64);

        assert_eq!(params.get_int(ParamName::NEpochs, 20), 20);
        assert_eq!(params.get_int(ParamName::NFactors, 15), 15);
    }

    #[test]
    fn from_json() {
        let params = Params::from_json(
            r#"{"nFactors": 10, "lr": 0.01, "useBias": false, "target": "bpr", "initStdDev": 0}"#,
        )
        .unwrap();

        assert_eq!(params.get_int(ParamName::NFactors, 100), 10);
        assert_eq!(params.get_float(ParamName::Lr, 0.005), 0.01);
        assert!(!params.get_bool(ParamName::UseBias, true));
        assert_eq!(params.get_string(ParamName::Target, "regression"), "bpr");
        assert_eq!(params.get_float(ParamName::InitStdDev, 0.1), 0.0);

        assert!(Params::from_json(r#"{"unknown": 1}"#).is_err());
    }

    #[test]
    fn targets() {
        assert_eq!("regression".parse::<Target>().unwrap(), Target::Regression);
        assert_eq!("bpr".parse::<Target>().unwrap(), Target::Bpr);

        match "ranking".parse::<Target>() {
            Err(Error::UnknownTarget(value)) => assert_eq!(value, "ranking"),
            _ => panic!("expected an unknown target error"),
        }
    }
}
