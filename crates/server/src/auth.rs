use axum::http::HeaderMap;
use http::header::AUTHORIZATION;

/// Extract the upstream bearer token from the request headers.
///
/// `X-Api-Key` wins; `Authorization: Bearer <token>` is the fallback. The
/// token is forwarded verbatim, never validated here.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(key) = headers.get("x-api-key").and_then(|value| value.to_str().ok())
        && !key.is_empty()
    {
        return Some(key.to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
