//! Field paths into untyped JSON records.
//!
//! A [`FieldPath`] is a parsed sequence of [`PathStep`]s.  Configuration
//! writes paths as strings such as `id`, `questions[0].text` or
//! `questions.0.text`; they are parsed once and then evaluated against
//! each record without any dynamic evaluation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

// ---------------------------------------------------------------------------
// PathStep
// ---------------------------------------------------------------------------

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Look up a field of an object.
    Key(String),
    /// Look up an element of an array (or a numeric key of an object).
    Index(usize),
}

// ---------------------------------------------------------------------------
// FieldPath
// ---------------------------------------------------------------------------

/// A safe path into a JSON value.
///
/// # Examples
///
/// ```
/// use loopsync_models::FieldPath;
/// use serde_json::json;
///
/// let path: FieldPath = "questions[0].text".parse().unwrap();
/// let record = json!({ "questions": [{ "text": "What is SSO?" }] });
/// assert_eq!(path.resolve(&record), Some(&json!("What is SSO?")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<PathStep>);

impl FieldPath {
    /// Parse a path expression.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        if raw.is_empty() {
            return Err(ModelError::invalid_path(raw, "path must not be empty"));
        }

        let mut steps = Vec::new();
        for segment in raw.split('.') {
            if segment.is_empty() {
                return Err(ModelError::invalid_path(raw, "empty segment"));
            }

            let (name, mut rest) = match segment.find('[') {
                Some(pos) => segment.split_at(pos),
                None => (segment, ""),
            };

            if !name.is_empty() {
                // Only canonical integers are indices; `007` stays a key.
                steps.push(match name.parse::<usize>() {
                    Ok(index) if index.to_string() == name => PathStep::Index(index),
                    _ => PathStep::Key(name.to_string()),
                });
            }

            while !rest.is_empty() {
                let Some(inner) = rest.strip_prefix('[') else {
                    return Err(ModelError::invalid_path(
                        raw,
                        format!("unexpected characters after index in \"{segment}\""),
                    ));
                };
                let Some(close) = inner.find(']') else {
                    return Err(ModelError::invalid_path(raw, "unterminated bracket"));
                };
                let index = inner[..close].parse::<usize>().map_err(|_| {
                    ModelError::invalid_path(
                        raw,
                        format!("non-numeric index \"{}\"", &inner[..close]),
                    )
                })?;
                steps.push(PathStep::Index(index));
                rest = &inner[close + 1..];
            }
        }

        Ok(Self(steps))
    }

    /// Build a single-step path naming a top-level field.
    pub fn key(name: &str) -> Self {
        Self(vec![PathStep::Key(name.to_string())])
    }

    /// The parsed steps.
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Evaluate the path against `value`.
    ///
    /// Returns `None` as soon as a step does not match (missing key,
    /// out-of-range index, or a scalar where a container was expected).
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(value, |current, step| match (step, current) {
            (PathStep::Key(key), Value::Object(map)) => map.get(key),
            (PathStep::Index(index), Value::Array(items)) => items.get(*index),
            (PathStep::Index(index), Value::Object(map)) => map.get(&index.to_string()),
            _ => None,
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Key(key) if i == 0 => f.write_str(key)?,
                PathStep::Key(key) => write!(f, ".{key}")?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> FieldPath {
        raw.parse().unwrap()
    }

    #[test]
    fn parse_single_key() {
        assert_eq!(path("id").steps(), &[PathStep::Key("id".into())]);
    }

    #[test]
    fn bracket_and_dot_index_are_equivalent() {
        assert_eq!(path("questions[0].text"), path("questions.0.text"));
        assert_eq!(
            path("questions[0].text").steps(),
            &[
                PathStep::Key("questions".into()),
                PathStep::Index(0),
                PathStep::Key("text".into()),
            ]
        );
    }

    #[test]
    fn zero_padded_segment_is_a_key() {
        let codes = path("codes.007");
        assert_eq!(
            codes.steps(),
            &[PathStep::Key("codes".into()), PathStep::Key("007".into())]
        );
        let record = json!({ "codes": { "007": "bond", "7": "other" } });
        assert_eq!(codes.resolve(&record), Some(&json!("bond")));
        assert_eq!(path("codes.7").resolve(&record), Some(&json!("other")));
        assert_eq!(path(&codes.to_string()), codes);
    }

    #[test]
    fn parse_chained_indices() {
        assert_eq!(
            path("grid[1][2]").steps(),
            &[PathStep::Key("grid".into()), PathStep::Index(1), PathStep::Index(2)]
        );
    }

    #[test]
    fn parse_rejects_malformed_paths() {
        for raw in ["", "a..b", ".a", "a.", "a[", "a[x]", "a[0]b", "a[-1]"] {
            assert!(
                FieldPath::parse(raw).is_err(),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(path("questions.0.text").to_string(), "questions[0].text");
        assert_eq!(path("a[1][2].b").to_string(), "a[1][2].b");
    }

    #[test]
    fn resolve_direct_and_nested() {
        let record = json!({
            "id": 123,
            "questions": [{ "text": "Q1" }, { "text": "Q2" }],
        });
        assert_eq!(path("id").resolve(&record), Some(&json!(123)));
        assert_eq!(path("questions[1].text").resolve(&record), Some(&json!("Q2")));
    }

    #[test]
    fn resolve_missing_is_none() {
        let record = json!({ "questions": [] , "id": "x" });
        assert_eq!(path("answer").resolve(&record), None);
        assert_eq!(path("questions[0].text").resolve(&record), None);
        assert_eq!(path("id.inner").resolve(&record), None);
    }

    #[test]
    fn resolve_numeric_key_on_object() {
        let record = json!({ "years": { "2022": "yes" } });
        assert_eq!(path("years.2022").resolve(&record), Some(&json!("yes")));
    }

    #[test]
    fn serde_as_string() {
        let p: FieldPath = serde_json::from_value(json!("a.b[3]")).unwrap();
        assert_eq!(serde_json::to_value(&p).unwrap(), json!("a.b[3]"));
        assert!(serde_json::from_value::<FieldPath>(json!("a[")).is_err());
    }
}
