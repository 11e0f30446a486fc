use axum::extract::{Query, rejection::QueryRejection};

use crate::common::{RelayError, RelayResult};

pub mod media;
pub mod meta;
pub mod search;
pub mod video;

/// Turns a query-string rejection into the JSON error every other failure
/// uses.
pub(crate) fn query<T>(query: Result<Query<T>, QueryRejection>) -> RelayResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| RelayError::InvalidInput(e.body_text()))
}
