//! Spin-reversal transform of a model.

use qubo_model::BinaryQuadraticModel;

use crate::error::MultiCallResult;
use crate::mask::FlipMask;

/// Return a copy of `bqm` with every variable flagged in `mask` reversed.
///
/// `bqm` is left untouched. The mask must cover exactly the model's
/// variables; anything else is a [`MaskDomain`](crate::MultiCallError::MaskDomain)
/// error. Single-variable flips commute, so the order they are applied in
/// does not matter.
pub fn transform_model(
    bqm: &BinaryQuadraticModel,
    mask: &FlipMask,
) -> MultiCallResult<BinaryQuadraticModel> {
    mask.check_domain(bqm.variables())?;
    let mut transformed = bqm.clone();
    for v in mask.flipped() {
        transformed.flip_variable(v)?;
    }
    Ok(transformed)
}
