//! Degrade-and-continue results
//!
//! Configuration and network problems never abort a pass. Stages return an
//! [`Outcome`] holding the (possibly degraded) value together with every error
//! that was reported while producing it; the orchestrator decides what to do
//! with them.

use crate::ImportMapError;

#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub errors: Vec<ImportMapError>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    pub fn with_error(value: T, error: ImportMapError) -> Self {
        Self {
            value,
            errors: vec![error],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            errors: self.errors,
        }
    }

    /// Move this outcome's errors into `sink` and return the bare value.
    pub fn collect_into(self, sink: &mut Vec<ImportMapError>) -> T {
        sink.extend(self.errors);
        self.value
    }

    pub fn into_parts(self) -> (T, Vec<ImportMapError>) {
        (self.value, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_into_moves_errors() {
        let outcome = Outcome::with_error(3, ImportMapError::MalformedUrl("nope".to_string()));
        let mut sink = Vec::new();

        let value = outcome.map(|v| v * 2).collect_into(&mut sink);

        assert_eq!(value, 6);
        assert_eq!(sink.len(), 1);
        assert!(sink[0].to_string().starts_with(crate::error::REPORT_PREFIX));
    }
}
