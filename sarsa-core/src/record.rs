//! Key-value records of the state of a learner, for logging.
use crate::error::SarsaError;
use std::{collections::HashMap, fmt};

/// Value stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value, such as a decayed hyperparameter.
    Scalar(f32),
}

/// Named values describing a learner at one point of training.
///
/// ```
/// use sarsa_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("alpha", 0.1);
/// record.insert("epsilon", RecordValue::Scalar(0.01));
/// assert_eq!(record.get_scalar("alpha").unwrap(), 0.1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Record holding a single scalar.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Record built from `(key, value)` pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a value, replacing the previous value of the key.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Value of a key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Scalar stored under `k`.
    pub fn get_scalar(&self, k: &str) -> Result<f32, SarsaError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            None => Err(SarsaError::RecordKey(k.to_string())),
        }
    }
}

impl fmt::Display for Record {
    /// Writes `key = value` pairs sorted by key, separated by commas.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.0.keys().collect();
        keys.sort();
        for (i, k) in keys.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match &self.0[k] {
                RecordValue::Scalar(v) => write!(f, "{} = {}", k, v)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_scalar() {
        let record = Record::from_slice(&[
            ("alpha", RecordValue::Scalar(0.5)),
            ("epsilon", RecordValue::Scalar(0.25)),
        ]);
        assert_eq!(record.get_scalar("alpha"), Ok(0.5));
        assert_eq!(record.get("epsilon"), Some(&RecordValue::Scalar(0.25)));
        assert_eq!(
            record.get_scalar("missing"),
            Err(SarsaError::RecordKey("missing".to_string()))
        );
    }

    #[test]
    fn test_insert_replaces() {
        let mut record = Record::from_scalar("a", 1.0);
        record.insert("a", RecordValue::Scalar(2.0));
        assert_eq!(record.get_scalar("a"), Ok(2.0));
    }

    #[test]
    fn test_display_is_sorted() {
        let mut record = Record::from_scalar("b", 1.0);
        record.insert("a", RecordValue::Scalar(0.5));
        assert_eq!(format!("{}", record), "a = 0.5, b = 1");
    }
}
