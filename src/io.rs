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

use std::fs::File;
use std::io::prelude::*;
use std::io::{stdout, BufWriter};
use std::path::Path;

use serde_derive::Serialize;

use crate::dataset::DataSet;
use crate::error::Result;
use crate::model::Model;

/// Reads a CSV input file. We expect NO headers, and a user-item-value triple per line
/// with tab separation.
pub fn csv_reader<P: AsRef<Path>>(file: P) -> Result<csv::Reader<File>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_path(file)?;

    Ok(reader)
}

pub fn ratings_from_csv<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<(String, String, f64)>> {
    let mut ratings = Vec::new();
    for record in reader.deserialize() {
        let (user, item, rating): (String, String, f64) = record?;
        ratings.push((user, item, rating));
    }
    Ok(ratings)
}

/// Reads a ratings file into a data set.
pub fn read_data_set<P: AsRef<Path>>(file: P) -> Result<DataSet> {
    let mut reader = csv_reader(file)?;
    Ok(DataSet::new(ratings_from_csv(&mut reader)?))
}

/// Struct used for JSON serialization of predictions. Field names will be used in JSON.
#[derive(Serialize)]
struct Prediction<'a> {
    user: &'a str,
    item: &'a str,
    rating: f64,
    prediction: f64,
}

/// Output the model's predictions for every interaction of the data set in JSON lines format,
/// using the original identifiers. If a `predictions_path` is supplied, we write to a file at the
/// specified path, otherwise, we output to stdout.
pub fn write_predictions<M: Model + ?Sized>(
    model: &M,
    data_set: &DataSet,
    predictions_path: Option<String>,
) -> Result<()> {

    let out: Box<dyn Write> = match predictions_path {
        Some(path) => Box::new(File::create(&Path::new(&path))?),
        _ => Box::new(stdout()),
    };
    let mut out = BufWriter::new(out);

    for index in 0..data_set.len() {
        let (user, item, rating) = data_set.get(index);
        let prediction = Prediction { user, item, rating, prediction: model.predict(user, item) };

        serde_json::to_writer(&mut out, &prediction)?;
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::params::Params;
    use crate::svd::Svd;

    #[test]
    fn ratings_from_tab_separated_lines() {
        let input = "alice\tapple\t5\nbob\tpony\t2.5\n";
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .from_reader(input.as_bytes());

        let ratings = ratings_from_csv(&mut reader).unwrap();

        assert_eq!(
            ratings,
            vec![
                (String::from("alice"), String::from("apple"), 5.0),
                (String::from("bob"), String::from("pony"), 2.5),
            ]
        );
    }

    #[test]
    fn malformed_value_is_an_error() {
        let input = "alice\tapple\tlots\n";
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .from_reader(input.as_bytes());

        assert!(ratings_from_csv(&mut reader).is_err());
    }

    #[test]
    fn predictions_as_json_lines() {
        let data_set = DataSet::new(vec![("alice", "apple", 5.0)]);
        let svd = Svd::new(Params::new());
        let path = std::env::temp_dir().join("recofactors-predictions-test.jsonl");

        write_predictions(&svd, &data_set, Some(path.to_string_lossy().into_owned())).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let line: serde_json::Value = serde_json::from_str(written.trim()).unwrap();

        assert_eq!(line["user"], "alice");
        assert_eq!(line["item"], "apple");
        assert_eq!(line["rating"], 5.0);
        assert_eq!(line["prediction"], 0.0);
    }
}
