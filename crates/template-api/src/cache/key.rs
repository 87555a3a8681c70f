//! 캐시 키 생성.
//!
//! 형식: `{prefix}:{namespace}:{method}:{path}:{query}`
//! 쿼리 파라미터는 정렬되므로 순서가 달라도 같은 키가 됩니다.

use axum::http::Method;

/// 요청에 대한 캐시 키를 만듭니다.
///
/// # Arguments
///
/// * `prefix` - 전역 키 접두사 (예: "jobs-api")
/// * `namespace` - 라우트 그룹 이름 (예: "system")
/// * `method` - HTTP 메서드 (소문자로 변환됨)
/// * `path` - 요청 경로
/// * `query` - 원본 쿼리 문자열
pub fn request_key(
    prefix: &str,
    namespace: &str,
    method: &Method,
    path: &str,
    query: Option<&str>,
) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        prefix,
        namespace,
        method.as_str().to_lowercase(),
        path,
        sorted_query(query.unwrap_or_default())
    )
}

/// 삭제 대상 키 접두사. 네임스페이스가 없으면 접두사 전체.
pub fn namespace_prefix(prefix: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(namespace) => format!("{}:{}:", prefix, namespace),
        None => format!("{}:", prefix),
    }
}

fn sorted_query(query: &str) -> String {
    let mut pairs: Vec<(&str, &str)> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect();
    pairs.sort_unstable();

    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}
