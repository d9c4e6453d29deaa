//! Property-based test generators using proptest.
//!
//! Provides strategies for generating entities whose values survive a
//! trip through a worksheet: text without leading `=`, finite floats and
//! timestamps at whole seconds.

use crate::fixtures::{Person, Tag};
use chrono::{DateTime, NaiveDateTime};
use proptest::prelude::*;

/// Strategy for generating valid table names.
pub fn table_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,30}").expect("Invalid regex")
}

/// Strategy for generating cell text.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 _.,-]{0,24}").expect("Invalid regex")
}

/// Strategy for generating finite floats that keep their exact value.
pub fn score_strategy() -> impl Strategy<Value = f64> {
    (-1_000_000i64..1_000_000, 0u8..4).prop_map(|(n, scale)| n as f64 / f64::from(10u8.pow(u32::from(scale))))
}

/// Strategy for generating timestamps between 1950 and 2100.
pub fn datetime_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (-631_152_000i64..4_102_444_800).prop_map(|secs| {
        DateTime::from_timestamp(secs, 0)
            .expect("timestamp in range")
            .naive_utc()
    })
}

/// Strategy for generating unsaved people (id 0).
pub fn person_strategy() -> impl Strategy<Value = Person> {
    (
        text_strategy(),
        prop::option::of(datetime_strategy()),
        score_strategy(),
        any::<bool>(),
    )
        .prop_map(|(name, born, score, active)| Person {
            id: 0,
            name,
            born,
            score,
            active,
        })
}

/// Strategy for generating a batch of unsaved people.
pub fn people_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Person>> {
    prop::collection::vec(person_strategy(), min..max)
}

/// Strategy for generating tags with short labels, so batches repeat keys.
pub fn tag_strategy() -> impl Strategy<Value = Tag> {
    (prop::string::string_regex("[a-d]").expect("Invalid regex"), 0i64..1000)
        .prop_map(|(label, uses)| Tag::new(label, uses))
}

/// A table operation for model-based tests.
#[derive(Debug, Clone)]
pub enum TableOperation {
    /// Add a batch of people
    Add(Vec<Person>),
    /// Update the person with this id, if any
    Rename {
        /// Key to update
        id: i64,
        /// New name
        name: String,
    },
    /// Delete by key
    Delete {
        /// Key to delete
        id: i64,
    },
    /// Remove every data row
    Truncate,
}

/// Strategy for generating table operations against ids `1..max_id`.
pub fn table_operation_strategy(max_id: i64) -> impl Strategy<Value = TableOperation> {
    prop_oneof![
        4 => people_strategy(1, 4).prop_map(TableOperation::Add),
        2 => (1..max_id, text_strategy()).prop_map(|(id, name)| TableOperation::Rename { id, name }),
        2 => (1..max_id).prop_map(|id| TableOperation::Delete { id }),
        1 => Just(TableOperation::Truncate),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
    max_id: i64,
) -> impl Strategy<Value = Vec<TableOperation>> {
    prop::collection::vec(table_operation_strategy(max_id), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn table_name_is_valid(name in table_name_strategy()) {
            prop_assert!(sheetdb_codec::validate_sheet_name(&name).is_ok());
        }

        #[test]
        fn people_are_unsaved(person in person_strategy()) {
            prop_assert_eq!(person.id, 0);
            prop_assert!(person.score.is_finite());
        }

        #[test]
        fn datetimes_have_no_fraction(dt in datetime_strategy()) {
            prop_assert_eq!(dt.nanosecond(), 0);
        }
    }
}
