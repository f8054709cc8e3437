//! Keep-Alive Probing
//!
//! Sends small warm-up chat requests so idle backends keep their models loaded.

use crate::api::{OllamaChatRequest, OpenAiChatRequest};
use crate::client::http::HttpClient;
use crate::config::{ApiType, KeepAliveSettings, SharedRoutingTable};
use crate::error::Result;
use crate::router::resolver::{find_provider, ResolvedProvider};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// What happened to a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Backend answered with a 2xx status
    Sent { url: String, status: u16 },

    /// The (model, host) pair is not in the routing table
    Unresolved,

    /// The provider's API type has no warm-up call
    Unsupported(String),

    /// Network error, timeout or non-2xx response
    Failed(String),
}

/// Fire-and-forget warm-up prober
pub struct KeepAliveProbe {
    table: Arc<SharedRoutingTable>,
    http: HttpClient,
    settings: KeepAliveSettings,
}

impl KeepAliveProbe {
    /// Create a probe reading providers from `table`
    pub fn new(table: Arc<SharedRoutingTable>, settings: KeepAliveSettings) -> Result<Self> {
        let http = HttpClient::new(Duration::from_secs(settings.timeout_secs))?;
        Ok(Self {
            table,
            http,
            settings,
        })
    }

    pub fn settings(&self) -> &KeepAliveSettings {
        &self.settings
    }

    /// Warm up the provider serving `model_name` at `host`
    ///
    /// Failures are logged and never returned.
    pub async fn send(&self, model_name: &str, host: &str, prompt: Option<&str>) {
        self.probe(model_name, host, prompt).await;
    }

    /// Warm up every (model, host) pair of the current table concurrently
    pub async fn send_all(&self, prompt: Option<&str>) -> Vec<ProbeOutcome> {
        let endpoints = self.table.snapshot().endpoints();
        debug!(pairs = endpoints.len(), "probing all providers");

        join_all(
            endpoints
                .iter()
                .map(|(model, host)| self.probe(model, host, prompt)),
        )
        .await
    }

    /// Warm up one provider and report the outcome
    pub async fn probe(&self, model_name: &str, host: &str, prompt: Option<&str>) -> ProbeOutcome {
        let table = self.table.snapshot();
        let resolved = match find_provider(&table, model_name, host) {
            Ok(resolved) => resolved,
            Err(e) => {
                error!(model = model_name, host, error = %e, "keep-alive target not found");
                return ProbeOutcome::Unresolved;
            }
        };

        let prompt = prompt.unwrap_or(&self.settings.prompt);
        let Some((url, body)) = self.warmup_request(&resolved, prompt) else {
            let api_type = resolved.provider.api_type.to_string();
            warn!(
                model = model_name,
                host,
                api_type = %api_type,
                "unsupported api type for keep-alive"
            );
            return ProbeOutcome::Unsupported(api_type);
        };

        let token = resolved.provider.resolve_token();
        match self.http.post_json(&url, &body, token.as_deref()).await {
            Ok(status) => {
                debug!(
                    model = model_name,
                    provider = %resolved.provider.id,
                    url = %url,
                    status,
                    "keep-alive sent"
                );
                ProbeOutcome::Sent { url, status }
            }
            Err(e) => {
                error!(
                    model = model_name,
                    provider = %resolved.provider.id,
                    url = %url,
                    error = %e,
                    "keep-alive failed"
                );
                ProbeOutcome::Failed(e.to_string())
            }
        }
    }

    /// Endpoint and body for the provider's dialect, `None` when unsupported
    fn warmup_request(
        &self,
        resolved: &ResolvedProvider,
        prompt: &str,
    ) -> Option<(String, serde_json::Value)> {
        let provider = &resolved.provider;
        let url = format!("{}{}", provider.api_host, provider.api_type.chat_path()?);
        let max_tokens = self.settings.max_tokens;

        let body = match provider.api_type {
            ApiType::OpenAi | ApiType::Vllm => serde_json::to_value(OpenAiChatRequest::warmup(
                &resolved.model,
                prompt,
                max_tokens,
            )),
            ApiType::Ollama => serde_json::to_value(
                OllamaChatRequest::warmup(&resolved.model, prompt, max_tokens)
                    .with_keep_alive(self.settings.ollama_keep_alive.clone()),
            ),
            ApiType::Other(_) => return None,
        };

        body.ok().map(|body| (url, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelEntry, Provider, RoutingTable};
    use mockito::Matcher;
    use serde_json::json;

    fn probe_for(providers: Vec<Provider>) -> KeepAliveProbe {
        let table = RoutingTable::try_from_entries(vec![ModelEntry {
            name: "m1".to_string(),
            model_type: "chat".to_string(),
            providers,
        }])
        .unwrap();

        let settings = KeepAliveSettings {
            timeout_secs: 5,
            ..KeepAliveSettings::default()
        };
        KeepAliveProbe::new(Arc::new(SharedRoutingTable::new(table)), settings).unwrap()
    }

    #[tokio::test]
    async fn test_ollama_uses_api_chat() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::PartialJson(json!({
                "model": "llama3:8b",
                "messages": [{ "role": "user", "content": "ping" }],
                "stream": false,
                "options": { "num_predict": 1 }
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let mut provider = Provider::new("p1", ApiType::Ollama, server.url());
        provider.model_path = Some("llama3:8b".to_string());
        let probe = probe_for(vec![provider]);

        let outcome = probe.probe("m1", &server.url(), None).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Sent {
                url: format!("{}/api/chat", server.url()),
                status: 200
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_and_vllm_use_chat_completions() {
        for api_type in [ApiType::OpenAi, ApiType::Vllm] {
            let mut server = mockito::Server::new_async().await;
            let mock = server
                .mock("POST", "/v1/chat/completions")
                .match_header("authorization", "Bearer secret")
                .match_body(Matcher::PartialJson(json!({
                    "model": "m1",
                    "messages": [{ "role": "user", "content": "are you there?" }],
                    "max_tokens": 1,
                    "stream": false
                })))
                .with_status(200)
                .create_async()
                .await;

            let mut provider = Provider::new("p1", api_type, server.url());
            provider.api_token = Some("secret".to_string());
            let probe = probe_for(vec![provider]);

            probe
                .send("model:m1", &server.url(), Some("are you there?"))
                .await;
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_unsupported_api_type_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let provider = Provider::new("p1", ApiType::Other("carbon".to_string()), server.url());
        let probe = probe_for(vec![provider]);

        let outcome = probe.probe("m1", &server.url(), None).await;
        assert_eq!(outcome, ProbeOutcome::Unsupported("carbon".to_string()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_pair_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let probe = probe_for(vec![Provider::new("p1", ApiType::Vllm, server.url())]);

        assert_eq!(
            probe.probe("m2", &server.url(), None).await,
            ProbeOutcome::Unresolved
        );
        assert_eq!(
            probe.probe("m1", "http://elsewhere", None).await,
            ProbeOutcome::Unresolved
        );
        probe.send("m2", &server.url(), None).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let probe = probe_for(vec![Provider::new("p1", ApiType::Vllm, server.url())]);

        match probe.probe("m1", &server.url(), None).await {
            ProbeOutcome::Failed(msg) => assert!(msg.contains("500")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        probe.send("m1", &server.url(), None).await;
    }

    #[tokio::test]
    async fn test_send_all_isolates_failures() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let probe = probe_for(vec![
            Provider::new("down", ApiType::Vllm, "http://127.0.0.1:1"),
            Provider::new("up", ApiType::Ollama, server.url()),
        ]);

        let outcomes = probe.send_all(None).await;
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], ProbeOutcome::Failed(_)));
        assert!(matches!(outcomes[1], ProbeOutcome::Sent { status: 200, .. }));
        mock.assert_async().await;
    }
}
