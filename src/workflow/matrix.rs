// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Build matrix expansion
//!
//! Cross-products the declared axes into independent job specifications.
//! Axis declaration order is preserved so expansion order is auditable.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One matrix axis: a name and its ordered values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixAxis {
    pub name: String,
    pub values: Vec<String>,
}

/// The build matrix: ordered axes, expanded as a Cartesian product
///
/// Deserialized from a YAML mapping. A Vec keeps the axes in document
/// order; a HashMap would make expansion order depend on hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    axes: Vec<MatrixAxis>,
}

impl Matrix {
    /// Build a matrix from (name, values) pairs
    pub fn from_axes<I, S, V>(axes: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        Self {
            axes: axes
                .into_iter()
                .map(|(name, values)| MatrixAxis {
                    name: name.into(),
                    values: values.into_iter().map(Into::into).collect(),
                })
                .collect(),
        }
    }

    /// Whether any axis is declared
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// The declared axes, in document order
    pub fn axes(&self) -> &[MatrixAxis] {
        &self.axes
    }

    /// Number of jobs the matrix expands to
    pub fn job_count(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }

    /// Expand the matrix into job specifications
    ///
    /// Deterministic Cartesian product: the first declared axis varies
    /// slowest. An empty matrix yields exactly one job with no
    /// substitutions.
    pub fn expand(&self) -> Vec<JobSpec> {
        let mut combos: Vec<Vec<(String, String)>> = vec![Vec::new()];

        for axis in &self.axes {
            let mut next = Vec::with_capacity(combos.len() * axis.values.len());
            for combo in &combos {
                for value in &axis.values {
                    let mut extended = combo.clone();
                    extended.push((axis.name.clone(), value.clone()));
                    next.push(extended);
                }
            }
            combos = next;
        }

        combos.into_iter().map(JobSpec::new).collect()
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.axes.len()))?;
        for axis in &self.axes {
            map.serialize_entry(&axis.name, &axis.values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Matrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MatrixVisitor;

        impl<'de> Visitor<'de> for MatrixVisitor {
            type Value = Matrix;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a mapping of axis name to a list of string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Matrix, A::Error> {
                let mut axes = Vec::new();
                while let Some((name, values)) = map.next_entry::<String, Vec<String>>()? {
                    axes.push(MatrixAxis { name, values });
                }
                Ok(Matrix { axes })
            }
        }

        deserializer.deserialize_map(MatrixVisitor)
    }
}

/// One expanded matrix combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Unique id derived from the axis values, used to key artifacts
    pub id: String,
    /// (axis, value) pairs in axis declaration order
    pub values: Vec<(String, String)>,
}

impl JobSpec {
    fn new(values: Vec<(String, String)>) -> Self {
        let id = if values.is_empty() {
            "default".to_string()
        } else {
            values
                .iter()
                .map(|(_, v)| sanitize(v))
                .collect::<Vec<_>>()
                .join("-")
        };

        Self { id, values }
    }

    /// Look up an axis value
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, value)| value.as_str())
    }

    /// Human-readable combination, e.g. "(3.8, 1.10)"
    pub fn display_name(&self) -> String {
        if self.values.is_empty() {
            "default".to_string()
        } else {
            format!(
                "({})",
                self.values
                    .iter()
                    .map(|(_, v)| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        }
    }
}

/// Make a value safe as a path/id segment
///
/// Also rewrites '-' so the joining separator cannot be forged by a
/// value, keeping ids collision-free within one matrix.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
