//! Search-as-you-type

pub mod debouncer;

pub use debouncer::SearchDebouncer;

use roster_common::Resource;

/// Records matching `term` in their original order
pub fn filter_records<'a, R: Resource>(records: &'a [R], term: &str) -> Vec<&'a R> {
    records.iter().filter(|r| r.matches(term)).collect()
}
