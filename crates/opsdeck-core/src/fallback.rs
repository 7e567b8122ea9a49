// ── Fallback wrapper ──
//
// Wraps a data-loading future so a failed backend call degrades to
// locally generated sample data instead of an empty panel. Every
// consumer sees where the data came from via [`DataOrigin`] and can
// badge the panel accordingly.

use std::future::Future;

use tracing::warn;

use crate::error::HubError;

/// Where a loaded value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    /// Fetched from the backend.
    Live,
    /// Generated locally after the backend call failed.
    Fallback,
}

/// A loaded value tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub data: T,
    pub origin: DataOrigin,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            origin: DataOrigin::Live,
        }
    }

    pub fn fallback(data: T) -> Self {
        Self {
            data,
            origin: DataOrigin::Fallback,
        }
    }

    /// True when the value was generated locally.
    pub fn is_fallback(&self) -> bool {
        self.origin == DataOrigin::Fallback
    }
}

/// Run `load`; on error, log it and substitute `generate()`.
///
/// `domain` names the data domain for the log line ("users",
/// "metrics", ...). The substitution never fails: a panel always gets
/// data, degraded or not.
pub async fn with_fallback<T, F, G>(domain: &str, load: F, generate: G) -> Sourced<T>
where
    F: Future<Output = Result<T, HubError>>,
    G: FnOnce() -> T,
{
    match load.await {
        Ok(data) => Sourced::live(data),
        Err(err) => {
            warn!(domain, error = %err, "backend load failed; serving sample data");
            Sourced::fallback(generate())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_passes_through_as_live() {
        let got = with_fallback("metrics", async { Ok::<_, HubError>(42) }, || 0).await;
        assert_eq!(got.data, 42);
        assert_eq!(got.origin, DataOrigin::Live);
        assert!(!got.is_fallback());
    }

    #[tokio::test]
    async fn failure_substitutes_generated_data() {
        let got = with_fallback(
            "metrics",
            async {
                Err::<i32, _>(HubError::ConnectionFailed {
                    reason: "refused".into(),
                })
            },
            || 7,
        )
        .await;
        assert_eq!(got.data, 7);
        assert!(got.is_fallback());
    }

    #[tokio::test]
    async fn generator_not_called_on_success() {
        let got = with_fallback("users", async { Ok::<_, HubError>(1) }, || {
            panic!("generator must not run on success")
        })
        .await;
        assert_eq!(got.data, 1);
    }
}
