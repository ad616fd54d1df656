//! Token extraction from inbound requests

use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum_extra::extract::cookie::CookieJar;

/// Find the auth token. `Authorization: Bearer` (scheme in any case) wins over the cookie.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.trim_start().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_header() {
        let h = headers(&[(AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&h, "authToken").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_scheme_ignores_case() {
        for value in ["bearer abc", "BEARER abc", "BeArEr  abc"] {
            let h = headers(&[(AUTHORIZATION, value), (COOKIE, "authToken=from-cookie")]);
            assert_eq!(extract_token(&h, "authToken").as_deref(), Some("abc"), "{}", value);
        }
    }

    #[test]
    fn test_cookie() {
        let h = headers(&[(COOKIE, "theme=dark; authToken=tok123")]);
        assert_eq!(extract_token(&h, "authToken").as_deref(), Some("tok123"));
        assert_eq!(extract_token(&h, "session"), None);
    }

    #[test]
    fn test_header_takes_precedence() {
        let h = headers(&[(AUTHORIZATION, "Bearer from-header"), (COOKIE, "authToken=from-cookie")]);
        assert_eq!(extract_token(&h, "authToken").as_deref(), Some("from-header"));
    }

    #[test]
    fn test_non_bearer_header_falls_back_to_cookie() {
        let h = headers(&[(AUTHORIZATION, "Basic dXNlcjpwdw=="), (COOKIE, "authToken=tok")]);
        assert_eq!(extract_token(&h, "authToken").as_deref(), Some("tok"));
    }

    #[test]
    fn test_absent_or_empty() {
        assert_eq!(extract_token(&HeaderMap::new(), "authToken"), None);
        let h = headers(&[(AUTHORIZATION, "Bearer "), (COOKIE, "authToken=")]);
        assert_eq!(extract_token(&h, "authToken"), None);
    }
}
