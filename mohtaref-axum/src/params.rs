use std::collections::HashMap;

use axum::http::{HeaderMap, Uri};

use crate::cache::is_admin_request;

/// Request metadata handed to services as their params.
#[derive(Debug, Clone, Default)]
pub struct RestParams {
    pub provider: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub method: String,
    pub path: String,
    pub raw_query: Option<String>,
    /// Request originates from the admin dashboard.
    pub admin: bool,
}

impl RestParams {
    pub fn from_parts(
        provider: &str,
        headers: &HeaderMap,
        query: HashMap<String, String>,
        method: &str,
        uri: &Uri,
    ) -> Self {
        let mut out = Self {
            provider: provider.to_string(),
            headers: HashMap::new(),
            query,
            method: method.to_string(),
            path: uri.path().to_string(),
            raw_query: uri.query().map(|s| s.to_string()),
            admin: is_admin_request(uri.path(), headers),
        };

        for (k, v) in headers.iter() {
            if let Ok(s) = v.to_str() {
                out.headers.insert(k.to_string(), s.to_string());
            }
        }

        out
    }

    /// Params for calls that do not come from HTTP (seeding, hooks).
    pub fn internal() -> Self {
        Self {
            provider: "internal".to_string(),
            admin: true,
            ..Self::default()
        }
    }
}

pub trait FromRestParams: Sized {
    fn from_rest_params(params: RestParams) -> Self;
}

impl FromRestParams for RestParams {
    fn from_rest_params(params: RestParams) -> Self {
        params
    }
}

impl FromRestParams for () {
    fn from_rest_params(_params: RestParams) -> Self {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn admin_flag_follows_referer() {
        let mut headers = HeaderMap::new();
        headers.insert("referer", HeaderValue::from_static("https://site/admin/projects"));
        let uri: Uri = "/api/projects?page=2".parse().unwrap();

        let params = RestParams::from_parts("rest", &headers, HashMap::new(), "GET", &uri);

        assert!(params.admin);
        assert_eq!(params.path, "/api/projects");
        assert_eq!(params.raw_query.as_deref(), Some("page=2"));
        assert_eq!(params.headers["referer"], "https://site/admin/projects");
    }
}
