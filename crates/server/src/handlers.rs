use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use translate::messages::{anthropic::MessagesRequest, openai::ChatResponse};

use crate::{
    audit, auth,
    error::{ProxyError, ProxyResult},
    state::ProxyState,
    streaming,
};

/// Liveness probe.
pub(crate) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Handle one `/v1/messages` exchange.
///
/// The audit session spans the whole exchange: it is registered here and
/// flushed either on return (buffered responses and errors) or by the
/// streaming producer once the translated stream has been written out.
pub(crate) async fn messages(State(state): State<Arc<ProxyState>>, headers: HeaderMap, body: Bytes) -> Response {
    let request_id = audit::request_id();
    state.audit.start_session(&request_id);

    match exchange(&state, &headers, &body, &request_id).await {
        Ok(Reply::Buffered(response)) => {
            state.audit.end_session(&request_id).await;
            response
        }
        Ok(Reply::Streaming(response)) => response,
        Err(error) => {
            state.audit.end_session(&request_id).await;
            error.into_response()
        }
    }
}

enum Reply {
    Buffered(Response),
    Streaming(Response),
}

async fn exchange(state: &Arc<ProxyState>, headers: &HeaderMap, body: &Bytes, request_id: &str) -> ProxyResult<Reply> {
    let request: MessagesRequest =
        serde_json::from_slice(body).map_err(|e| ProxyError::InvalidRequest(format!("invalid JSON body: {e}")))?;

    log::debug!(
        "Messages handler called for model {} with {} messages, streaming: {}",
        request.model,
        request.messages.len(),
        request.stream
    );

    state.audit.record_anthropic_request(request_id, &request);

    let chat_request = translate::to_chat_request(request, &state.mapper);
    state.audit.record_openai_request(request_id, &chat_request);

    let token = auth::bearer_token(headers).ok_or(ProxyError::MissingApiKey)?;

    let payload = serde_json::to_vec(&chat_request)
        .map_err(|e| ProxyError::Internal(format!("failed to serialize upstream request: {e}")))?;

    let url = format!("{}/chat/completions", state.config.openrouter_base_url);
    let upstream = state
        .client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .bearer_auth(&token)
        .body(payload)
        .send()
        .await
        .map_err(|e| ProxyError::UpstreamConnection(format!("failed to reach upstream: {e}")))?;

    let status = upstream.status();
    if !status.is_success() {
        log::error!("Upstream error ({status}) for {request_id}");

        let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
        let body = upstream.bytes().await.unwrap_or_default();

        return Err(ProxyError::UpstreamStatus {
            status,
            content_type,
            body,
        });
    }

    if chat_request.stream {
        let body = streaming::translate_stream(
            upstream.bytes_stream(),
            chat_request.model,
            state.audit.clone(),
            request_id.to_string(),
        );

        let response = Response::builder()
            .header(CONTENT_TYPE, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .header(CONNECTION, "keep-alive")
            .body(body)
            .map_err(|e| ProxyError::Internal(format!("failed to build streaming response: {e}")))?;

        Ok(Reply::Streaming(response))
    } else {
        let chat_response: ChatResponse = upstream
            .json()
            .await
            .map_err(|e| ProxyError::Internal(format!("failed to decode upstream response: {e}")))?;

        state.audit.record_openai_response(request_id, &chat_response);

        let response = translate::to_messages_response(chat_response, &chat_request.model);
        state.audit.record_anthropic_response(request_id, &response);

        Ok(Reply::Buffered(Json(response).into_response()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use crate::{router, state::ProxyState};

    fn app() -> axum::Router {
        router(Arc::new(ProxyState::new(config::Config::default())))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_with_400() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/messages")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["type"], "error");
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn missing_credentials_are_rejected_with_401() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/messages")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"model":"sonnet","messages":[{"role":"user","content":"hi"}]}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "authentication_error");
    }
}
