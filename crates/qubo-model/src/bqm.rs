//! Binary quadratic model storage.
//!
//! Variables keep their insertion order. Linear biases are stored densely by
//! variable index and quadratic biases in a symmetric adjacency map, so a
//! single-variable flip only touches that variable's neighbourhood.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::sampleset::SampleMatrix;
use crate::vartype::Vartype;
use crate::{ModelResult, Variable};

/// A quadratic objective over SPIN or BINARY variables:
/// `offset + sum_i h_i x_i + sum_{i<j} J_ij x_i x_j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BqmDocument", into = "BqmDocument")]
pub struct BinaryQuadraticModel {
    vartype: Vartype,
    variables: Vec<Variable>,
    index: HashMap<Variable, usize>,
    linear: Vec<f64>,
    adjacency: Vec<BTreeMap<usize, f64>>,
    offset: f64,
}

impl BinaryQuadraticModel {
    /// Create an empty model over the given domain.
    pub fn new(vartype: Vartype) -> Self {
        Self {
            vartype,
            variables: Vec::new(),
            index: HashMap::new(),
            linear: Vec::new(),
            adjacency: Vec::new(),
            offset: 0.0,
        }
    }

    /// Build a SPIN model from Ising fields `h` and couplings `j`.
    pub fn from_ising<V, H, J>(h: H, j: J, offset: f64) -> ModelResult<Self>
    where
        V: Into<Variable>,
        H: IntoIterator<Item = (V, f64)>,
        J: IntoIterator<Item = ((V, V), f64)>,
    {
        let mut bqm = Self::new(Vartype::Spin);
        for (v, bias) in h {
            bqm.add_variable(v, bias);
        }
        for ((u, v), bias) in j {
            bqm.add_interaction(u, v, bias)?;
        }
        bqm.offset = offset;
        Ok(bqm)
    }

    /// Build a BINARY model from a QUBO dictionary. Diagonal entries are
    /// linear biases.
    pub fn from_qubo<V, Q>(q: Q, offset: f64) -> ModelResult<Self>
    where
        V: Into<Variable>,
        Q: IntoIterator<Item = ((V, V), f64)>,
    {
        let mut bqm = Self::new(Vartype::Binary);
        for ((u, v), bias) in q {
            let (u, v) = (u.into(), v.into());
            if u == v {
                bqm.add_variable(u, bias);
            } else {
                bqm.add_interaction(u, v, bias)?;
            }
        }
        bqm.offset = offset;
        Ok(bqm)
    }

    /// Add `bias` to the linear term of `v`, creating the variable if needed.
    /// Returns the variable's index.
    pub fn add_variable(&mut self, v: impl Into<Variable>, bias: f64) -> usize {
        let idx = self.ensure_variable(v.into());
        self.linear[idx] += bias;
        idx
    }

    /// Add `bias` to the interaction between `u` and `v`, creating either
    /// variable if needed.
    pub fn add_interaction(
        &mut self,
        u: impl Into<Variable>,
        v: impl Into<Variable>,
        bias: f64,
    ) -> ModelResult<()> {
        let (u, v) = (u.into(), v.into());
        if u == v {
            return Err(ModelError::SelfLoop { variable: u });
        }
        let ui = self.ensure_variable(u);
        let vi = self.ensure_variable(v);
        *self.adjacency[ui].entry(vi).or_insert(0.0) += bias;
        *self.adjacency[vi].entry(ui).or_insert(0.0) += bias;
        Ok(())
    }

    fn ensure_variable(&mut self, v: Variable) -> usize {
        if let Some(&idx) = self.index.get(&v) {
            return idx;
        }
        let idx = self.variables.len();
        self.index.insert(v.clone(), idx);
        self.variables.push(v);
        self.linear.push(0.0);
        self.adjacency.push(BTreeMap::new());
        idx
    }

    pub fn vartype(&self) -> Vartype {
        self.vartype
    }

    /// Variables in insertion order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_interactions(&self) -> usize {
        self.adjacency.iter().map(BTreeMap::len).sum::<usize>() / 2
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn contains(&self, v: &str) -> bool {
        self.index.contains_key(v)
    }

    pub fn index_of(&self, v: &str) -> Option<usize> {
        self.index.get(v).copied()
    }

    /// Linear bias of `v`, or `None` if `v` is not in the model.
    pub fn linear(&self, v: &str) -> Option<f64> {
        self.index_of(v).map(|idx| self.linear[idx])
    }

    /// Quadratic bias between `u` and `v`, or `None` if they do not interact.
    pub fn quadratic(&self, u: &str, v: &str) -> Option<f64> {
        let ui = self.index_of(u)?;
        let vi = self.index_of(v)?;
        self.adjacency[ui].get(&vi).copied()
    }

    /// Every interaction once, as `(u, v, bias)` with `u` declared before `v`.
    pub fn interactions(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.adjacency.iter().enumerate().flat_map(move |(ui, neighbours)| {
            neighbours.range((ui + 1)..).map(move |(&vi, &bias)| {
                (self.variables[ui].as_str(), self.variables[vi].as_str(), bias)
            })
        })
    }

    /// Reverse the role of `v` in place.
    ///
    /// SPIN substitutes `s_v -> -s_v`; BINARY substitutes `x_v -> 1 - x_v`.
    /// The energy of every sample, with `v`'s value complemented, is unchanged.
    pub fn flip_variable(&mut self, v: &str) -> ModelResult<()> {
        let idx = self
            .index_of(v)
            .ok_or_else(|| ModelError::UnknownVariable {
                variable: v.to_string(),
            })?;
        let neighbours: Vec<(usize, f64)> = self.adjacency[idx]
            .iter()
            .map(|(&u, &bias)| (u, bias))
            .collect();

        match self.vartype {
            Vartype::Spin => {
                self.linear[idx] = -self.linear[idx];
            }
            Vartype::Binary => {
                self.offset += self.linear[idx];
                self.linear[idx] = -self.linear[idx];
                for &(u, bias) in &neighbours {
                    self.linear[u] += bias;
                }
            }
        }
        for (u, bias) in neighbours {
            self.adjacency[idx].insert(u, -bias);
            self.adjacency[u].insert(idx, -bias);
        }
        Ok(())
    }

    fn energy_with(&self, value: impl Fn(usize) -> i8) -> f64 {
        let mut energy = self.offset;
        for (ui, &h) in self.linear.iter().enumerate() {
            let xu = f64::from(value(ui));
            energy += h * xu;
            for (&vi, &j) in self.adjacency[ui].range((ui + 1)..) {
                energy += j * xu * f64::from(value(vi));
            }
        }
        energy
    }

    /// Energy of a single assignment keyed by variable.
    pub fn energy(&self, assignment: &BTreeMap<Variable, i8>) -> ModelResult<f64> {
        let mut values = Vec::with_capacity(self.variables.len());
        for v in &self.variables {
            let value = *assignment
                .get(v)
                .ok_or_else(|| ModelError::UnknownVariable {
                    variable: v.clone(),
                })?;
            if !self.vartype.contains(value) {
                return Err(ModelError::InvalidValue {
                    value,
                    vartype: self.vartype,
                });
            }
            values.push(value);
        }
        Ok(self.energy_with(|idx| values[idx]))
    }

    /// Energies of every row of `samples`, whose columns are labelled by
    /// `variables` in an order that need not match the model's.
    pub fn energies(&self, variables: &[Variable], samples: &SampleMatrix) -> ModelResult<Vec<f64>> {
        if variables.len() != samples.num_columns() {
            return Err(ModelError::ShapeMismatch {
                detail: format!(
                    "{} variable labels for {} sample columns",
                    variables.len(),
                    samples.num_columns()
                ),
            });
        }
        let mismatch = || ModelError::VariableMismatch {
            expected: self.variables.clone(),
            found: variables.to_vec(),
        };
        if variables.len() != self.variables.len() {
            return Err(mismatch());
        }
        let mut columns = vec![usize::MAX; self.variables.len()];
        for (col, v) in variables.iter().enumerate() {
            let idx = self.index_of(v).ok_or_else(mismatch)?;
            if columns[idx] != usize::MAX {
                return Err(ModelError::DuplicateVariable {
                    variable: v.clone(),
                });
            }
            columns[idx] = col;
        }

        let mut energies = Vec::with_capacity(samples.num_rows());
        for row in samples.rows() {
            if let Some(&value) = row.iter().find(|&&x| !self.vartype.contains(x)) {
                return Err(ModelError::InvalidValue {
                    value,
                    vartype: self.vartype,
                });
            }
            energies.push(self.energy_with(|idx| row[columns[idx]]));
        }
        Ok(energies)
    }

    /// Parse a model from its JSON document form.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the model as a pretty-printed JSON document.
    pub fn to_json_pretty(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// On-disk / wire form of a [`BinaryQuadraticModel`].
///
/// ```json
/// { "vartype": "SPIN", "linear": [["a", 0.5]], "quadratic": [["a", "b", -1.0]], "offset": 0.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BqmDocument {
    pub vartype: Vartype,
    #[serde(default)]
    pub linear: Vec<(Variable, f64)>,
    #[serde(default)]
    pub quadratic: Vec<(Variable, Variable, f64)>,
    #[serde(default)]
    pub offset: f64,
}

impl TryFrom<BqmDocument> for BinaryQuadraticModel {
    type Error = ModelError;

    fn try_from(doc: BqmDocument) -> Result<Self, Self::Error> {
        let mut bqm = BinaryQuadraticModel::new(doc.vartype);
        for (v, bias) in doc.linear {
            if bqm.contains(&v) {
                return Err(ModelError::DuplicateVariable { variable: v });
            }
            bqm.add_variable(v, bias);
        }
        for (u, v, bias) in doc.quadratic {
            bqm.add_interaction(u, v, bias)?;
        }
        bqm.offset = doc.offset;
        Ok(bqm)
    }
}

impl From<BinaryQuadraticModel> for BqmDocument {
    fn from(bqm: BinaryQuadraticModel) -> Self {
        let quadratic = bqm
            .interactions()
            .map(|(u, v, bias)| (u.to_string(), v.to_string(), bias))
            .collect();
        BqmDocument {
            vartype: bqm.vartype,
            linear: bqm.variables.iter().cloned().zip(bqm.linear.iter().copied()).collect(),
            quadratic,
            offset: bqm.offset,
        }
    }
}
