//! Contract tests for `flip_variable` and `concatenate`.
//!
//! Any flip must leave the energy landscape intact up to complementing the
//! flipped variables; these tests check that exhaustively on small models.

use std::collections::BTreeMap;

use qubo_model::{BinaryQuadraticModel, SampleMatrix, SampleSet, Variable, Vartype};

fn chain(vartype: Vartype) -> BinaryQuadraticModel {
    let mut bqm = BinaryQuadraticModel::new(vartype);
    bqm.add_variable("x0", 0.5);
    bqm.add_variable("x1", -1.25);
    bqm.add_variable("x2", 2.0);
    bqm.add_variable("x3", 0.0);
    bqm.add_interaction("x0", "x1", -1.0).unwrap();
    bqm.add_interaction("x1", "x2", 0.75).unwrap();
    bqm.add_interaction("x2", "x3", 1.5).unwrap();
    bqm.add_interaction("x0", "x3", -0.5).unwrap();
    bqm
}

fn all_assignments(bqm: &BinaryQuadraticModel) -> Vec<BTreeMap<Variable, i8>> {
    let [lo, hi] = bqm.vartype().values();
    let n = bqm.num_variables();
    (0..(1u32 << n))
        .map(|bits| {
            bqm.variables()
                .iter()
                .enumerate()
                .map(|(i, v)| (v.clone(), if bits >> i & 1 == 1 { hi } else { lo }))
                .collect()
        })
        .collect()
}

#[test]
fn every_flip_subset_preserves_energies() {
    for vartype in [Vartype::Spin, Vartype::Binary] {
        let bqm = chain(vartype);
        let [lo, hi] = vartype.values();
        let complement = |x: i8| if x == lo { hi } else { lo };

        for subset in 0..(1u32 << bqm.num_variables()) {
            let flipped_vars: Vec<Variable> = bqm
                .variables()
                .iter()
                .enumerate()
                .filter(|(i, _)| subset >> i & 1 == 1)
                .map(|(_, v)| v.clone())
                .collect();

            let mut flipped = bqm.clone();
            for v in &flipped_vars {
                flipped.flip_variable(v).unwrap();
            }

            for assignment in all_assignments(&bqm) {
                let mut transformed = assignment.clone();
                for v in &flipped_vars {
                    let x = transformed[v];
                    transformed.insert(v.clone(), complement(x));
                }
                let e0 = bqm.energy(&assignment).unwrap();
                let e1 = flipped.energy(&transformed).unwrap();
                assert!(
                    (e0 - e1).abs() < 1e-9,
                    "{vartype} subset {subset:#06b}: {e0} vs {e1}"
                );
            }
        }
    }
}

#[test]
fn flips_commute() {
    let bqm = chain(Vartype::Binary);

    let mut forward = bqm.clone();
    forward.flip_variable("x0").unwrap();
    forward.flip_variable("x2").unwrap();

    let mut backward = bqm.clone();
    backward.flip_variable("x2").unwrap();
    backward.flip_variable("x0").unwrap();

    assert_eq!(forward, backward);
}

#[test]
fn concatenate_three_sets_keeps_call_order() {
    let bqm = chain(Vartype::Spin);
    let order_a: Vec<Variable> = bqm.variables().to_vec();
    let mut order_b = order_a.clone();
    order_b.reverse();

    let first = SampleSet::from_samples_bqm(order_a.clone(), vec![vec![1, 1, 1, 1]], &bqm).unwrap();
    let second =
        SampleSet::from_samples_bqm(order_b.clone(), vec![vec![-1, 1, 1, 1]], &bqm).unwrap();
    let third =
        SampleSet::from_samples_bqm(order_a.clone(), vec![vec![-1, -1, -1, -1]], &bqm).unwrap();
    let expected_energies: Vec<f64> = [&first, &second, &third]
        .iter()
        .flat_map(|s| s.energies().to_vec())
        .collect();

    let merged = SampleSet::concatenate(vec![first, second, third], Vartype::Spin).unwrap();

    assert_eq!(merged.variables(), order_a.as_slice());
    assert_eq!(merged.len(), 3);
    assert_eq!(merged.energies(), expected_energies.as_slice());
    // second set listed x3 first; its -1 belongs to x3 after reordering
    assert_eq!(merged.samples().row(1), &[1, 1, 1, -1]);

    let recomputed = bqm.energies(merged.variables(), merged.samples()).unwrap();
    assert_eq!(recomputed, expected_energies);
}

#[test]
fn single_set_concatenation_is_identity() {
    let bqm = chain(Vartype::Binary);
    let samples = SampleMatrix::from_rows(4, vec![vec![0, 1, 0, 1]]).unwrap();
    let energies = bqm.energies(bqm.variables(), &samples).unwrap();
    let set = SampleSet::new(
        bqm.variables().to_vec(),
        Vartype::Binary,
        samples,
        energies,
        vec![3],
    )
    .unwrap();

    let merged = SampleSet::concatenate(vec![set.clone()], Vartype::Binary).unwrap();
    assert_eq!(merged, set);
}
