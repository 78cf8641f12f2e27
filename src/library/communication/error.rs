use crate::library::BoxedError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Serializable snapshot of an error and its chain of causes
///
/// Errors that cross a process boundary, for example as part of a dead letter
/// record, lose their concrete types. This structure preserves the human
/// readable messages of the original error and every transitive source so the
/// failure can still be diagnosed on the other side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseChain {
    causes: Vec<String>,
}

impl CauseChain {
    /// Captures the display messages of the error and all its sources
    pub fn capture<E>(error: &E) -> Self
    where
        E: Error + 'static,
    {
        (error as &(dyn Error + 'static)).into()
    }

    /// Captures a type-erased error
    pub fn from_boxed(error: BoxedError) -> Self {
        (error.as_ref() as &(dyn Error + 'static)).into()
    }

    /// Builds a chain directly from pre-rendered cause messages
    #[cfg(test)]
    pub fn from_causes(causes: Vec<String>) -> Self {
        Self { causes }
    }
}

impl From<&(dyn Error + 'static)> for CauseChain {
    fn from(error: &(dyn Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut current: Option<&(dyn Error + 'static)> = Some(error);

        while let Some(error) = current {
            // Chains that already went through a capture are flattened
            // instead of being stringified a second time.
            if let Some(chain) = error.downcast_ref::<CauseChain>() {
                causes.extend(chain.causes.iter().cloned());
                break;
            }

            causes.push(error.to_string());
            current = error.source();
        }

        Self { causes }
    }
}

impl fmt::Display for CauseChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.causes.is_empty() {
            write!(f, "unknown error")
        } else {
            write!(f, "{}", self.causes.join(": "))
        }
    }
}

impl Error for CauseChain {}
