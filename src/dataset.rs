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

use fnv::FnvHashMap;

use crate::types::SparseVector;

/// Maps arbitrary external identifiers to consecutive dense indices, assigned in order of first
/// appearance.
#[derive(Clone, Debug, Default)]
pub struct IdSet {
    dense_ids: FnvHashMap<String, usize>,
    names: Vec<String>,
}

impl IdSet {

    pub fn new() -> Self {
        IdSet::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the dense index of `name`, assigning the next free one if it has not been seen.
    pub fn add(&mut self, name: &str) -> usize {
        if let Some(dense_id) = self.dense_ids.get(name) {
            return *dense_id;
        }

        let dense_id = self.names.len();
        self.dense_ids.insert(name.to_owned(), dense_id);
        self.names.push(name.to_owned());
        dense_id
    }

    /// `None` for identifiers which were never seen while building the data set.
    pub fn to_dense_id(&self, name: &str) -> Option<usize> {
        self.dense_ids.get(name).cloned()
    }

    pub fn name(&self, dense_id: usize) -> Option<&str> {
        self.names.get(dense_id).map(|name| name.as_str())
    }
}

/// Observed `(user, item, value)` interactions with dense identifiers, indexed by user and by item.
/// Trainers only ever read from it.
#[derive(Clone, Debug, Default)]
pub struct DataSet {
    pub global_mean: f64,
    pub user_ids: IdSet,
    pub item_ids: IdSet,
    pub dense_user_ratings: Vec<SparseVector>,
    pub dense_item_ratings: Vec<SparseVector>,
    users: Vec<usize>,
    items: Vec<usize>,
    ratings: Vec<f64>,
}

impl DataSet {

    /// Builds a data set from interaction triples. A repeated `(user, item)` pair replaces the
    /// value of the earlier occurrence, so every sparse row holds distinct indices.
    pub fn new<I, U, T>(interactions: I) -> Self
    where
        I: IntoIterator<Item = (U, T, f64)>,
        U: AsRef<str>,
        T: AsRef<str>,
    {
        let mut user_ids = IdSet::new();
        let mut item_ids = IdSet::new();

        let mut positions: FnvHashMap<(usize, usize), usize> = FnvHashMap::default();
        let mut users = Vec::new();
        let mut items = Vec::new();
        let mut ratings = Vec::new();

        for (user, item, rating) in interactions {
            let user_index = user_ids.add(user.as_ref());
            let item_index = item_ids.add(item.as_ref());

            match positions.get(&(user_index, item_index)) {
                Some(&position) => ratings[position] = rating,
                None => {
                    positions.insert((user_index, item_index), users.len());
                    users.push(user_index);
                    items.push(item_index);
                    ratings.push(rating);
                }
            }
        }

        let mut dense_user_ratings = vec![SparseVector::new(); user_ids.len()];
        let mut dense_item_ratings = vec![SparseVector::new(); item_ids.len()];

        for ((&user_index, &item_index), &rating) in users.iter().zip(&items).zip(&ratings) {
            dense_user_ratings[user_index].add(item_index, rating);
            dense_item_ratings[item_index].add(user_index, rating);
        }

        let global_mean = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        };

        DataSet {
            global_mean,
            user_ids,
            item_ids,
            dense_user_ratings,
            dense_item_ratings,
            users,
            items,
            ratings,
        }
    }

    pub fn user_count(&self) -> usize {
        self.user_ids.len()
    }

    pub fn item_count(&self) -> usize {
        self.item_ids.len()
    }

    /// Number of interactions.
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// The `index`-th interaction as `(dense user, dense item, value)`.
    pub fn get_dense(&self, index: usize) -> (usize, usize, f64) {
        (self.users[index], self.items[index], self.ratings[index])
    }

    /// The `index`-th interaction with its external identifiers.
    pub fn get(&self, index: usize) -> (&str, &str, f64) {
        let (user_index, item_index, rating) = self.get_dense(index);
        (
            self.user_ids.name(user_index).unwrap_or_default(),
            self.item_ids.name(item_index).unwrap_or_default(),
            rating,
        )
    }
}

#[cfg(test)]
mod tests {

    use fnv::FnvHashSet;

    use super::{DataSet, IdSet};

    #[test]
    fn dense_ids_are_consecutive_and_unique() {
        let mut ids = IdSet::new();
        let names = ["dog", "apple", "dog", "pony", "bike", "apple"];

        for name in names.iter() {
            ids.add(name);
        }

        assert_eq!(ids.len(), 4);

        let dense: FnvHashSet<usize> = ["dog", "apple", "pony", "bike"]
            .iter()
            .map(|name| ids.to_dense_id(name).unwrap())
            .collect();

        assert_eq!(dense.len(), 4);
        assert!(dense.iter().all(|index| *index < 4));

        assert_eq!(ids.to_dense_id("dog"), Some(0));
        assert_eq!(ids.to_dense_id("cat"), None);
        assert_eq!(ids.name(2), Some("pony"));
        assert_eq!(ids.name(4), None);
    }

    #[test]
    fn rows_and_statistics() {
        let data_set = DataSet::new(vec![
            ("alice", "apple", 5.0),
            ("alice", "pony", 3.0),
            ("bob", "apple", 4.0),
            ("charles", "pony", 2.0),
        ]);

        assert_eq!(data_set.user_count(), 3);
        assert_eq!(data_set.item_count(), 2);
        assert_eq!(data_set.len(), 4);
        assert!((data_set.global_mean - 3.5).abs() < 1e-12);

        assert_eq!(data_set.get_dense(2), (1, 0, 4.0));
        assert_eq!(data_set.get(3), ("charles", "pony", 2.0));

        let alice: Vec<(usize, usize, f64)> = data_set.dense_user_ratings[0].iter().collect();
        assert_eq!(alice, vec![(0, 0, 5.0), (1, 1, 3.0)]);

        let pony: Vec<(usize, usize, f64)> = data_set.dense_item_ratings[1].iter().collect();
        assert_eq!(pony, vec![(0, 0, 3.0), (1, 2, 2.0)]);
    }

    #[test]
    fn repeated_pair_keeps_last_value() {
        let data_set = DataSet::new(vec![
            ("alice", "apple", 1.0),
            ("alice", "apple", 4.0),
            ("bob", "apple", 2.0),
        ]);

        assert_eq!(data_set.len(), 2);
        assert_eq!(data_set.dense_user_ratings[0].len(), 1);
        assert_eq!(data_set.dense_user_ratings[0].values, vec![4.0]);
        assert!((data_set.global_mean - 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty() {
        let data_set = DataSet::new(Vec::<(String, String, f64)>::new());

        assert!(data_set.is_empty());
        assert_eq!(data_set.global_mean, 0.0);
        assert_eq!(data_set.user_count(), 0);
    }
}
