//! Test assertions for query results.

use crate::pagination::Page;
use std::fmt::Debug;

/// Asserts that the result is a success and returns its value.
#[track_caller]
pub fn assert_succeeded<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected success, got failure: {err:?}"),
    }
}

/// Asserts that the result is a failure and returns its error.
#[track_caller]
pub fn assert_failed<T: Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(value) => panic!("Expected failure, got success: {value:?}"),
        Err(err) => err,
    }
}

/// Asserts that a paginator result carries exactly `items` and `has_more`.
#[track_caller]
pub fn assert_page<T, E>(result: &Result<Page<T>, E>, items: &[T], has_more: bool)
where
    T: PartialEq + Debug,
    E: Debug,
{
    match result {
        Ok(page) => {
            assert_eq!(page.items, items, "Unexpected page items");
            assert_eq!(page.has_more, has_more, "Unexpected has_more flag");
        }
        Err(err) => panic!("Expected page {items:?}, got failure: {err:?}"),
    }
}
