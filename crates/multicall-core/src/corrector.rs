//! Undo a call's spin-reversal transform on the samples it returned.
//!
//! A response sampled from a transformed model holds values for the
//! *transformed* variables. Complementing every flipped column maps each
//! sample back onto the original model with its energy unchanged.
//!
//! Columns are resolved by label against the response's own variable order,
//! never by position: samplers are free to reorder variables.
//!
//! Correction mutates the response in place and is its own inverse, so it
//! must run exactly once per response, before anything else reads it.

use std::collections::HashMap;

use qubo_model::{SampleSet, Variable, Vartype};
use thiserror::Error;

use crate::mask::FlipMask;

/// Why a response could not be corrected.
#[derive(Debug, Error, PartialEq)]
pub enum CorrectionError {
    #[error("response variables differ from mask (missing: {missing:?}, unexpected: {unexpected:?})")]
    VariableMismatch {
        missing: Vec<Variable>,
        unexpected: Vec<Variable>,
    },

    #[error("response is {found} but the model is {expected}")]
    VartypeMismatch { expected: Vartype, found: Vartype },

    #[error("value {value} recorded for {variable} is not in the {vartype} domain")]
    InvalidValue {
        variable: Variable,
        value: i8,
        vartype: Vartype,
    },
}

/// The other value of `vartype`'s domain: `-x` for SPIN, `1 - x` for BINARY.
pub fn complement(vartype: Vartype, value: i8) -> i8 {
    match vartype {
        Vartype::Spin => -value,
        Vartype::Binary => 1 - value,
    }
}

/// Complement, in place, every column of `response` whose variable `mask`
/// flags as flipped. `vartype` is the original model's domain.
///
/// Returns the number of corrected columns. Nothing is modified when an
/// error is returned.
pub fn correct_response(
    response: &mut SampleSet,
    mask: &FlipMask,
    vartype: Vartype,
) -> Result<usize, CorrectionError> {
    if response.vartype() != vartype {
        return Err(CorrectionError::VartypeMismatch {
            expected: vartype,
            found: response.vartype(),
        });
    }

    let columns: HashMap<&str, usize> = response
        .variables()
        .iter()
        .enumerate()
        .map(|(col, v)| (v.as_str(), col))
        .collect();
    let missing: Vec<Variable> = mask
        .variables()
        .filter(|v| !columns.contains_key(v.as_str()))
        .cloned()
        .collect();
    let unexpected: Vec<Variable> = response
        .variables()
        .iter()
        .filter(|v| mask.get(v).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(CorrectionError::VariableMismatch {
            missing,
            unexpected,
        });
    }

    let flipped: Vec<(&Variable, usize)> = mask.flipped().map(|v| (v, columns[v.as_str()])).collect();

    let samples = response.samples();
    for &(variable, col) in &flipped {
        if let Some(value) = samples.column(col).into_iter().find(|&x| !vartype.contains(x)) {
            return Err(CorrectionError::InvalidValue {
                variable: variable.clone(),
                value,
                vartype,
            });
        }
    }

    let flipped_columns: Vec<usize> = flipped.into_iter().map(|(_, col)| col).collect();
    let samples = response.samples_mut();
    for &col in &flipped_columns {
        samples.map_column(col, |x| complement(vartype, x));
    }
    Ok(flipped_columns.len())
}

/// Non-mutating form of [`correct_response`]: returns a corrected copy.
pub fn corrected(
    response: &SampleSet,
    mask: &FlipMask,
    vartype: Vartype,
) -> Result<SampleSet, CorrectionError> {
    let mut copy = response.clone();
    correct_response(&mut copy, mask, vartype)?;
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qubo_model::SampleMatrix;

    fn response(vartype: Vartype, vs: &[&str], rows: Vec<Vec<i8>>) -> SampleSet {
        let n = rows.len();
        let samples = SampleMatrix::from_rows(vs.len(), rows).unwrap();
        SampleSet::new(
            vs.iter().map(|v| v.to_string()).collect(),
            vartype,
            samples,
            vec![0.0; n],
            vec![1; n],
        )
        .unwrap()
    }

    fn mask(entries: &[(&str, bool)]) -> FlipMask {
        entries.iter().map(|&(v, f)| (v, f)).collect()
    }

    #[test]
    fn test_complement_spin_negates() {
        assert_eq!(complement(Vartype::Spin, 1), -1);
        assert_eq!(complement(Vartype::Spin, -1), 1);
    }

    #[test]
    fn test_complement_binary_is_one_minus() {
        assert_eq!(complement(Vartype::Binary, 0), 1);
        assert_eq!(complement(Vartype::Binary, 1), 0);
    }

    #[test]
    fn test_spin_columns_flagged_true_are_negated() {
        let mut r = response(Vartype::Spin, &["a", "b"], vec![vec![1, 1], vec![-1, 1]]);
        let n = correct_response(&mut r, &mask(&[("a", true), ("b", false)]), Vartype::Spin)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(r.samples().column(0), vec![-1, 1]);
        assert_eq!(r.samples().column(1), vec![1, 1]);
    }

    #[test]
    fn test_binary_columns_flagged_true_are_complemented() {
        let mut r = response(Vartype::Binary, &["x", "y"], vec![vec![0, 1], vec![1, 1]]);
        correct_response(&mut r, &mask(&[("x", false), ("y", true)]), Vartype::Binary).unwrap();
        assert_eq!(r.samples().row(0), &[0, 0]);
        assert_eq!(r.samples().row(1), &[1, 0]);
    }

    #[test]
    fn test_columns_resolved_by_label_not_position() {
        // response lists b before a; the mask flips a
        let mut r = response(Vartype::Spin, &["b", "a"], vec![vec![1, 1]]);
        correct_response(&mut r, &mask(&[("a", true), ("b", false)]), Vartype::Spin).unwrap();
        assert_eq!(r.sample(0).get("a"), Some(&-1));
        assert_eq!(r.sample(0).get("b"), Some(&1));
    }

    #[test]
    fn test_identity_mask_is_a_no_op() {
        let original = response(Vartype::Binary, &["x", "y"], vec![vec![0, 1]]);
        let mut r = original.clone();
        let n = correct_response(&mut r, &mask(&[("x", false), ("y", false)]), Vartype::Binary)
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(r, original);
    }

    #[test]
    fn test_correcting_twice_restores_transformed_values() {
        for vartype in [Vartype::Spin, Vartype::Binary] {
            let [lo, hi] = vartype.values();
            let original = response(vartype, &["a", "b"], vec![vec![lo, hi], vec![hi, hi]]);
            let m = mask(&[("a", true), ("b", true)]);

            let once = corrected(&original, &m, vartype).unwrap();
            assert_ne!(once, original);
            let twice = corrected(&once, &m, vartype).unwrap();
            assert_eq!(twice, original);
        }
    }

    #[test]
    fn test_energies_are_left_alone() {
        let mut r = response(Vartype::Spin, &["a"], vec![vec![1]]);
        correct_response(&mut r, &mask(&[("a", true)]), Vartype::Spin).unwrap();
        assert_eq!(r.energies(), &[0.0]);
    }

    #[test]
    fn test_dropped_variable_is_a_hard_error() {
        let mut r = response(Vartype::Spin, &["a"], vec![vec![1]]);
        let before = r.clone();
        let err = correct_response(&mut r, &mask(&[("a", true), ("b", true)]), Vartype::Spin)
            .unwrap_err();
        assert_eq!(
            err,
            CorrectionError::VariableMismatch {
                missing: vec!["b".to_string()],
                unexpected: vec![],
            }
        );
        assert_eq!(r, before);
    }

    #[test]
    fn test_renamed_variable_is_a_hard_error() {
        let mut r = response(Vartype::Spin, &["a", "c"], vec![vec![1, 1]]);
        let err = correct_response(&mut r, &mask(&[("a", false), ("b", true)]), Vartype::Spin)
            .unwrap_err();
        assert!(matches!(
            err,
            CorrectionError::VariableMismatch { ref missing, ref unexpected }
                if missing == &["b"] && unexpected == &["c"]
        ));
    }

    #[test]
    fn test_vartype_mismatch_is_rejected() {
        let mut r = response(Vartype::Binary, &["a"], vec![vec![1]]);
        let err = correct_response(&mut r, &mask(&[("a", true)]), Vartype::Spin).unwrap_err();
        assert!(matches!(err, CorrectionError::VartypeMismatch { .. }));
    }

    #[test]
    fn test_out_of_domain_value_is_rejected_before_mutation() {
        let mut r = response(Vartype::Spin, &["a", "b"], vec![vec![1, 1]]);
        r.samples_mut().set(0, 1, 0);
        let before = r.clone();
        let err = correct_response(&mut r, &mask(&[("a", true), ("b", true)]), Vartype::Spin)
            .unwrap_err();
        assert!(matches!(err, CorrectionError::InvalidValue { value: 0, .. }));
        assert_eq!(r, before);
    }

    #[test]
    fn test_empty_response_and_mask() {
        let mut r = SampleSet::empty(Vartype::Spin);
        assert_eq!(correct_response(&mut r, &FlipMask::default(), Vartype::Spin), Ok(0));
    }
}
