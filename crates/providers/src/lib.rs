//! Generation providers for chatrelay.
//!
//! Every adapter implements `chatrelay_core::Provider`. The fallback chain
//! tries them in order; the router builds that chain from configuration.

pub mod fallback;
pub mod gemini;
mod http;
pub mod huggingface;
pub mod openai;
pub mod prompt;
pub mod router;

pub use fallback::{ChainReply, FallbackChain};
pub use gemini::GeminiProvider;
pub use huggingface::HuggingFaceProvider;
pub use openai::OpenAiProvider;
pub use router::build_from_config;

#[cfg(test)]
pub(crate) mod test_support {
    /// Serve `router` on an ephemeral port and return its base URL.
    pub async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}
