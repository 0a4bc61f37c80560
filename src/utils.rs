use crate::error::ServiceError;
use crate::store::StoreError;
use axum::http::HeaderMap;
use std::future::Future;
use std::time::Duration;

pub async fn with_timeout<F: Future>(
    duration_in_mills: u64,
    task: F,
) -> Result<<F as Future>::Output, ServiceError> {
    tokio::time::timeout(Duration::from_millis(duration_in_mills), task)
        .await
        .map_err(|_| ServiceError::Store(StoreError::Timeout))
}

pub fn get_header(name: &str, headers: &HeaderMap) -> Option<String> {
    headers
        .get(name)
        .map(|value| value.to_str().unwrap_or_default().to_string())
}

pub fn request_scheme(headers: &HeaderMap) -> &'static str {
    match get_header("X-Forwarded-Proto", headers) {
        Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test(start_paused = true)]
    async fn elapsed_task_is_a_store_timeout() {
        let result = with_timeout(50, std::future::pending::<()>()).await;
        assert_eq!(result, Err(ServiceError::Store(StoreError::Timeout)));
    }

    #[test]
    fn scheme_follows_forwarded_proto() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_scheme(&headers), "http");
        headers.insert("X-Forwarded-Proto", HeaderValue::from_static("https"));
        assert_eq!(request_scheme(&headers), "https");
    }
}
