use crate::error::ValidationError;
use crate::query::QueryState;

/// Checks run in order and stop at the first failure.
///
/// Dates are compared as strings; ISO `YYYY-MM-DD` sorts chronologically that
/// way, other formats are compared lexically all the same.
pub fn validate(query: &QueryState, require_dates: bool) -> Result<(), ValidationError> {
    if query.ticker.is_empty() {
        return Err(ValidationError::MissingTicker);
    }
    if require_dates {
        if query.start.is_empty() {
            return Err(ValidationError::MissingStart);
        }
        if query.end.is_empty() {
            return Err(ValidationError::MissingEnd);
        }
        if query.start > query.end {
            return Err(ValidationError::InvertedRange);
        }
    }
    Ok(())
}
