// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Ordered, append-only collection of validated records.

use crate::record::CoordinateRecord;

/// The record set of a session.
///
/// Insertion order is preserved and duplicates are allowed. Records can be
/// appended or the whole store cleared; individual records are never edited
/// or removed.
#[derive(Debug, Clone, Default)]
pub struct CoordinateStore {
    records: Vec<CoordinateRecord>,
}

impl CoordinateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record at the end.
    pub fn append(&mut self, record: CoordinateRecord) {
        self.records.push(record);
    }

    /// Add records after everything already stored, keeping their order.
    pub fn append_all<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = CoordinateRecord>,
    {
        self.records.extend(records);
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Current records in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> &[CoordinateRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;

    fn record(lat: &str, lon: &str, label: &str) -> CoordinateRecord {
        validate(lat, lon, Some(label)).unwrap()
    }

    #[test]
    fn test_append_preserves_order_and_duplicates() {
        let mut store = CoordinateStore::new();
        store.append(record("1", "1", "a"));
        store.append(record("1", "1", "a"));
        store.append_all(vec![record("2", "2", "b"), record("3", "3", "c")]);

        let labels: Vec<&str> = store.snapshot().iter().map(CoordinateRecord::label).collect();
        assert_eq!(labels, ["a", "a", "b", "c"]);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = CoordinateStore::new();
        store.append_all(vec![record("1", "2", "x"), record("3", "4", "y")]);
        store.clear();

        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());

        store.clear();
        assert!(store.snapshot().is_empty());
    }
}
