//! Merge corrected responses into the batch result.

use qubo_model::{SampleSet, Vartype};

use crate::error::{MultiCallError, MultiCallResult};

/// Concatenate `responses` in the order given (the order calls were issued).
///
/// Column order differences between responses are reconciled by
/// [`SampleSet::concatenate`]. Rows are not reordered, deduplicated or
/// reweighted. No responses yields an empty sample set of `vartype`.
pub fn aggregate_responses(
    responses: Vec<SampleSet>,
    vartype: Vartype,
) -> MultiCallResult<SampleSet> {
    SampleSet::concatenate(responses, vartype).map_err(MultiCallError::Aggregation)
}
