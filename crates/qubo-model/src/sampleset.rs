//! Sample sets returned by samplers and the concatenation primitive that
//! merges them.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::bqm::BinaryQuadraticModel;
use crate::error::ModelError;
use crate::vartype::Vartype;
use crate::{ModelResult, Variable};

/// Row-major matrix of sample values: one row per sample, one column per
/// variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MatrixDocument")]
pub struct SampleMatrix {
    num_rows: usize,
    num_columns: usize,
    values: Vec<i8>,
}

impl SampleMatrix {
    /// An empty matrix with a fixed column count.
    pub fn new(num_columns: usize) -> Self {
        Self {
            num_rows: 0,
            num_columns,
            values: Vec::new(),
        }
    }

    /// Build a matrix from rows that must all be `num_columns` wide.
    pub fn from_rows(num_columns: usize, rows: Vec<Vec<i8>>) -> ModelResult<Self> {
        let mut matrix = Self::new(num_columns);
        for row in rows {
            matrix.push_row(&row)?;
        }
        Ok(matrix)
    }

    pub(crate) fn push_row(&mut self, row: &[i8]) -> ModelResult<()> {
        if row.len() != self.num_columns {
            return Err(ModelError::ShapeMismatch {
                detail: format!(
                    "row {} has {} values, expected {}",
                    self.num_rows,
                    row.len(),
                    self.num_columns
                ),
            });
        }
        self.values.extend_from_slice(row);
        self.num_rows += 1;
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn row(&self, r: usize) -> &[i8] {
        &self.values[r * self.num_columns..(r + 1) * self.num_columns]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i8]> + '_ {
        (0..self.num_rows).map(move |r| self.row(r))
    }

    pub fn get(&self, r: usize, c: usize) -> i8 {
        self.values[r * self.num_columns + c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: i8) {
        self.values[r * self.num_columns + c] = value;
    }

    /// Values of column `c`, top to bottom.
    pub fn column(&self, c: usize) -> Vec<i8> {
        self.rows().map(|row| row[c]).collect()
    }

    /// Replace every value in column `c` with `f(value)`.
    pub fn map_column(&mut self, c: usize, f: impl Fn(i8) -> i8) {
        for r in 0..self.num_rows {
            let slot = &mut self.values[r * self.num_columns + c];
            *slot = f(*slot);
        }
    }
}

/// One row of a [`SampleSet`] keyed by variable label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub sample: BTreeMap<Variable, i8>,
    pub energy: f64,
    pub num_occurrences: u64,
}

/// The samples returned by one sampler call.
///
/// Columns follow the set's own `variables` order, which is chosen by the
/// sampler and need not match the model's declaration order. Deserialized
/// sets pass the same checks as [`SampleSet::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SampleSetDocument")]
pub struct SampleSet {
    variables: Vec<Variable>,
    vartype: Vartype,
    samples: SampleMatrix,
    energies: Vec<f64>,
    num_occurrences: Vec<u64>,
    #[serde(default)]
    info: serde_json::Map<String, serde_json::Value>,
}

impl SampleSet {
    /// Build a sample set, validating shape, label uniqueness and domain.
    pub fn new(
        variables: Vec<Variable>,
        vartype: Vartype,
        samples: SampleMatrix,
        energies: Vec<f64>,
        num_occurrences: Vec<u64>,
    ) -> ModelResult<Self> {
        if samples.num_columns() != variables.len() {
            return Err(ModelError::ShapeMismatch {
                detail: format!(
                    "{} variables for {} sample columns",
                    variables.len(),
                    samples.num_columns()
                ),
            });
        }
        if energies.len() != samples.num_rows() || num_occurrences.len() != samples.num_rows() {
            return Err(ModelError::ShapeMismatch {
                detail: format!(
                    "{} samples, {} energies, {} occurrence counts",
                    samples.num_rows(),
                    energies.len(),
                    num_occurrences.len()
                ),
            });
        }
        let mut seen = HashSet::with_capacity(variables.len());
        for v in &variables {
            if !seen.insert(v.as_str()) {
                return Err(ModelError::DuplicateVariable {
                    variable: v.clone(),
                });
            }
        }
        for row in samples.rows() {
            if let Some(&value) = row.iter().find(|&&x| !vartype.contains(x)) {
                return Err(ModelError::InvalidValue { value, vartype });
            }
        }
        Ok(Self {
            variables,
            vartype,
            samples,
            energies,
            num_occurrences,
            info: serde_json::Map::new(),
        })
    }

    /// Build a sample set from raw rows, computing energies against `bqm`.
    /// Each row occurs once.
    pub fn from_samples_bqm(
        variables: Vec<Variable>,
        rows: Vec<Vec<i8>>,
        bqm: &BinaryQuadraticModel,
    ) -> ModelResult<Self> {
        let samples = SampleMatrix::from_rows(variables.len(), rows)?;
        let energies = bqm.energies(&variables, &samples)?;
        let num_occurrences = vec![1; samples.num_rows()];
        Self::new(variables, bqm.vartype(), samples, energies, num_occurrences)
    }

    /// No variables and no samples.
    pub fn empty(vartype: Vartype) -> Self {
        Self {
            variables: Vec::new(),
            vartype,
            samples: SampleMatrix::new(0),
            energies: Vec::new(),
            num_occurrences: Vec::new(),
            info: serde_json::Map::new(),
        }
    }

    pub fn with_info(mut self, info: serde_json::Map<String, serde_json::Value>) -> Self {
        self.info = info;
        self
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn vartype(&self) -> Vartype {
        self.vartype
    }

    pub fn samples(&self) -> &SampleMatrix {
        &self.samples
    }

    /// Mutable access to the sample values. The shape cannot change through
    /// this handle; energies are left untouched.
    pub fn samples_mut(&mut self) -> &mut SampleMatrix {
        &mut self.samples
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn num_occurrences(&self) -> &[u64] {
        &self.num_occurrences
    }

    pub fn info(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.info
    }

    /// Number of sample rows.
    pub fn len(&self) -> usize {
        self.samples.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row `r` keyed by variable label.
    pub fn sample(&self, r: usize) -> BTreeMap<Variable, i8> {
        self.variables
            .iter()
            .cloned()
            .zip(self.samples.row(r).iter().copied())
            .collect()
    }

    /// All rows as labelled records, in row order.
    pub fn records(&self) -> Vec<SampleRecord> {
        (0..self.len())
            .map(|r| SampleRecord {
                sample: self.sample(r),
                energy: self.energies[r],
                num_occurrences: self.num_occurrences[r],
            })
            .collect()
    }

    /// The lowest-energy record, first occurrence on ties.
    pub fn lowest(&self) -> Option<SampleRecord> {
        let mut best: Option<usize> = None;
        for (r, &energy) in self.energies.iter().enumerate() {
            if best.map_or(true, |b| energy < self.energies[b]) {
                best = Some(r);
            }
        }
        best.map(|r| SampleRecord {
            sample: self.sample(r),
            energy: self.energies[r],
            num_occurrences: self.num_occurrences[r],
        })
    }

    /// Stack `sets` into one, in the order given.
    ///
    /// Columns of every set after the first are reordered to the first set's
    /// variable order. Rows are never reordered, deduplicated or reweighted.
    /// The result carries the first set's `info`. An empty input yields
    /// [`SampleSet::empty`] of `vartype`.
    pub fn concatenate<I>(sets: I, vartype: Vartype) -> ModelResult<SampleSet>
    where
        I: IntoIterator<Item = SampleSet>,
    {
        let mut sets = sets.into_iter();
        let Some(mut merged) = sets.next() else {
            return Ok(SampleSet::empty(vartype));
        };
        if merged.vartype != vartype {
            return Err(ModelError::VartypeMismatch {
                expected: vartype,
                found: merged.vartype,
            });
        }

        let position: HashMap<&str, usize> = merged
            .variables
            .iter()
            .enumerate()
            .map(|(i, v)| (v.as_str(), i))
            .collect();
        let mut reordered = Vec::new();
        let mut energies = Vec::new();
        let mut occurrences = Vec::new();

        for set in sets {
            if set.vartype != vartype {
                return Err(ModelError::VartypeMismatch {
                    expected: vartype,
                    found: set.vartype,
                });
            }
            let mismatch = || ModelError::VariableMismatch {
                expected: merged.variables.clone(),
                found: set.variables.clone(),
            };
            if set.variables.len() != merged.variables.len() {
                return Err(mismatch());
            }
            // permutation[target column] = source column
            let mut permutation = vec![0usize; set.variables.len()];
            for (src, v) in set.variables.iter().enumerate() {
                let dst = *position.get(v.as_str()).ok_or_else(mismatch)?;
                permutation[dst] = src;
            }
            for row in set.samples.rows() {
                reordered.push(permutation.iter().map(|&src| row[src]).collect::<Vec<i8>>());
            }
            energies.extend_from_slice(&set.energies);
            occurrences.extend_from_slice(&set.num_occurrences);
        }

        for row in &reordered {
            merged.samples.push_row(row)?;
        }
        merged.energies.extend(energies);
        merged.num_occurrences.extend(occurrences);
        Ok(merged)
    }
}

/// Wire form of a [`SampleMatrix`], checked before use.
#[derive(Deserialize)]
struct MatrixDocument {
    num_rows: usize,
    num_columns: usize,
    values: Vec<i8>,
}

impl TryFrom<MatrixDocument> for SampleMatrix {
    type Error = ModelError;

    fn try_from(doc: MatrixDocument) -> Result<Self, Self::Error> {
        let expected = doc.num_rows.checked_mul(doc.num_columns);
        if expected != Some(doc.values.len()) {
            return Err(ModelError::ShapeMismatch {
                detail: format!(
                    "{} values for a {}x{} sample matrix",
                    doc.values.len(),
                    doc.num_rows,
                    doc.num_columns
                ),
            });
        }
        Ok(SampleMatrix {
            num_rows: doc.num_rows,
            num_columns: doc.num_columns,
            values: doc.values,
        })
    }
}

/// Wire form of a [`SampleSet`]; converted through [`SampleSet::new`].
#[derive(Deserialize)]
struct SampleSetDocument {
    variables: Vec<Variable>,
    vartype: Vartype,
    samples: SampleMatrix,
    energies: Vec<f64>,
    num_occurrences: Vec<u64>,
    #[serde(default)]
    info: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<SampleSetDocument> for SampleSet {
    type Error = ModelError;

    fn try_from(doc: SampleSetDocument) -> Result<Self, Self::Error> {
        let set = SampleSet::new(
            doc.variables,
            doc.vartype,
            doc.samples,
            doc.energies,
            doc.num_occurrences,
        )?;
        Ok(set.with_info(doc.info))
    }
}
