use async_trait::async_trait;

use crate::error::Result;

/// A translation provider as seen by [`SrtTranslator`](super::SrtTranslator).
///
/// Implementations own their quota bookkeeping: `chars` is what has been
/// consumed in the current billing period and `limit` is the period cap.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationHandler: Send {
    /// Translate `text` from `source_language` (empty = let the provider decide)
    /// into `target_language`. Provider failures are returned as-is.
    async fn translate(
        &mut self,
        source_language: &str,
        target_language: &str,
        text: &str,
    ) -> Result<String>;

    /// True if `additional_chars` more characters fit in the remaining quota.
    fn check_quota(&self, additional_chars: usize) -> bool;

    /// Characters consumed in the current period.
    fn chars(&self) -> usize;

    /// Characters allowed in the current period.
    fn limit(&self) -> usize;
}
