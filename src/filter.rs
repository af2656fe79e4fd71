//! Typed MongoDB-style filters for the `filter` query parameter.
//!
//! ```
//! use nmdcapi::{Comparison, Filter};
//!
//! let f = Filter::compare("lat_lon.latitude", Comparison::Gt, 45.0);
//! assert_eq!(f.encode(), r#"{"lat_lon.latitude":{"$gt":45.0}}"#);
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value, json};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl Comparison {
    pub fn operator(self) -> &'static str {
        match self {
            Comparison::Eq => "$eq",
            Comparison::Gt => "$gt",
            Comparison::Lt => "$lt",
            Comparison::Gte => "$gte",
            Comparison::Lte => "$lte",
        }
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "eq" => Ok(Comparison::Eq),
            "gt" => Ok(Comparison::Gt),
            "lt" => Ok(Comparison::Lt),
            "gte" => Ok(Comparison::Gte),
            "lte" => Ok(Comparison::Lte),
            other => Err(Error::InvalidComparison {
                input: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals {
        field: String,
        value: Value,
    },
    Regex {
        field: String,
        pattern: String,
    },
    /// One or more comparison bounds on the same field, e.g. `$gte` + `$lte`.
    Range {
        field: String,
        bounds: Vec<(Comparison, Value)>,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    And(Vec<Filter>),
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn regex(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Regex {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn compare(field: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Filter::Range {
            field: field.into(),
            bounds: vec![(op, value.into())],
        }
    }

    /// Inclusive range: `lower <= field <= upper`.
    pub fn between(
        field: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        Filter::Range {
            field: field.into(),
            bounds: vec![
                (Comparison::Gte, lower.into()),
                (Comparison::Lte, upper.into()),
            ],
        }
    }

    pub fn any_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Filter::Equals { field, value } => single(field, value.clone()),
            Filter::Regex { field, pattern } => single(field, json!({ "$regex": pattern })),
            Filter::Range { field, bounds } => {
                let ops: Map<String, Value> = bounds
                    .iter()
                    .map(|(op, v)| (op.operator().to_string(), v.clone()))
                    .collect();
                single(field, Value::Object(ops))
            }
            Filter::In { field, values } => single(field, json!({ "$in": values })),
            Filter::And(parts) => {
                json!({ "$and": parts.iter().map(Filter::to_value).collect::<Vec<_>>() })
            }
        }
    }

    /// Serialized filter string, ready for the `filter` query parameter.
    pub fn encode(&self) -> String {
        self.to_value().to_string()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn single(field: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(field.to_string(), value);
    Value::Object(map)
}
