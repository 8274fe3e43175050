//! The language-model interface consumed by the generator.

use std::future::Future;

/// A text-completion model.
///
/// `generate` may fail for transport, auth or quota reasons; the generator
/// treats every error as a reason to fall back, never as a request failure.
pub trait LanguageModel: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn generate<'a>(
    &'a self,
    prompt: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Model identifier reported by status endpoints.
  fn name(&self) -> &str;
}
