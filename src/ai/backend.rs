use std::future::Future;

use super::error::AiError;
use super::types::{GenerateRequest, GenerateResponse};

/// A generative text/vision model.
///
/// [`GeminiClient`](super::GeminiClient) talks to the real service; tests
/// provide scripted backends.
pub trait ModelBackend: Send + Sync {
    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = Result<GenerateResponse, AiError>> + Send;
}

impl<B: ModelBackend + ?Sized> ModelBackend for std::sync::Arc<B> {
    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = Result<GenerateResponse, AiError>> + Send {
        (**self).generate(request)
    }
}
