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

use fnv::FnvHashSet;

pub type DenseVector = Vec<f64>;
pub type DenseMatrix = Vec<DenseVector>;

pub fn new_dense_vector(dimensions: usize) -> DenseVector {
    vec![0.0; dimensions]
}

pub fn new_dense_matrix(num_rows: usize, num_columns: usize) -> DenseMatrix {
    vec![new_dense_vector(num_columns); num_rows]
}

/// The observed interactions of a single user (or a single item), as parallel lists of dense
/// indices and values in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseVector {

    pub fn new() -> Self {
        SparseVector::default()
    }

    pub fn add(&mut self, index: usize, value: f64) {
        self.indices.push(index);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Yields `(position, index, value)` for every stored pair exactly once. Calling `iter` again
    /// restarts the traversal from the first pair.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + Clone + '_ {
        self.indices
            .iter()
            .zip(self.values.iter())
            .enumerate()
            .map(|(position, (index, value))| (position, *index, *value))
    }

    pub fn index_set(&self) -> FnvHashSet<usize> {
        self.indices.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {

    use super::SparseVector;

    #[test]
    fn traversal_is_ordered_and_restartable() {
        let mut row = SparseVector::new();
        row.add(4, 1.0);
        row.add(0, 3.0);
        row.add(2, 2.5);

        let first: Vec<(usize, usize, f64)> = row.iter().collect();
        let second: Vec<(usize, usize, f64)> = row.iter().collect();

        assert_eq!(first, vec![(0, 4, 1.0), (1, 0, 3.0), (2, 2, 2.5)]);
        assert_eq!(first, second);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn index_set() {
        let mut row = SparseVector::new();
        row.add(7, 1.0);
        row.add(1, 1.0);

        let indices = row.index_set();

        assert!(indices.contains(&7));
        assert!(indices.contains(&1));
        assert!(!indices.contains(&0));
    }
}
