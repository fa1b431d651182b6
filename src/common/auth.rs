//! 请求认证信息提取

use axum::http::{HeaderMap, header};

/// 从 `Authorization: Bearer <token>` 中提取 Token
///
/// scheme 大小写不敏感，空 Token 视为未提供
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
