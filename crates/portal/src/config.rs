// Server configuration loaded from environment variables.
// Decision: DATABASE_URL is optional; without it the portal runs on the in-memory store
// Decision: Edge filter, upload limits and CORS are read here; auth settings live in auth::config

use axum::http::HeaderValue;
use thesis_portal_core::{route_filter::DEFAULT_COOKIE_PATTERN, FilterMode, RouteFilter, UploadPolicy};

use crate::auth::AuthConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";

/// Portal server configuration
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub bind_addr: String,
    /// PostgreSQL connection string; None selects the in-memory store
    pub database_url: Option<String>,
    /// Extra origins allowed to call the API with credentials
    pub cors_origins: Vec<HeaderValue>,
    pub route_filter: RouteFilter,
    pub upload: UploadPolicy,
    /// Lowercased emails that may choose the advisor or coordinator role
    pub staff_emails: Vec<String>,
    pub auth: AuthConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_url: None,
            cors_origins: Vec::new(),
            route_filter: RouteFilter::default(),
            upload: UploadPolicy::default(),
            staff_emails: Vec::new(),
            auth: AuthConfig::default(),
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::from_vars(|key| std::env::var(key).ok());
        config.auth = AuthConfig::from_env();
        config.check_cookie_pattern();
        config
    }

    /// Load the non-auth settings through `var`
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| var(key).filter(|s| !s.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = var("PORTAL_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let database_url = var("DATABASE_URL");

        // Example: CORS_ALLOWED_ORIGINS="https://tesis.uni.edu,https://admin.uni.edu"
        let cors_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
            .unwrap_or_default();

        let mut route_filter = defaults.route_filter;
        if let Some(mode) = var("EDGE_FILTER_MODE") {
            route_filter = route_filter.with_mode(FilterMode::from_str(&mode));
        }
        if let Some(prefixes) = var("EDGE_PROTECTED_PREFIXES") {
            route_filter.protected_prefixes = split_list(&prefixes);
        }
        if let Some(pattern) = var("EDGE_COOKIE_PATTERN") {
            route_filter.cookie_pattern = pattern.trim().to_string();
        }

        let mut upload = defaults.upload;
        if let Some(max) = var("UPLOAD_MAX_BYTES") {
            match max.trim().parse() {
                Ok(max_bytes) => upload.max_bytes = max_bytes,
                Err(_) => tracing::warn!(value = %max, "Ignoring invalid UPLOAD_MAX_BYTES"),
            }
        }
        if let Some(mime) = var("UPLOAD_MIME_TYPE") {
            upload.mime_type = mime.trim().to_lowercase();
        }

        // Example: PORTAL_STAFF_EMAILS="luis@uni.edu,coord@uni.edu"
        let staff_emails = var("PORTAL_STAFF_EMAILS")
            .map(|s| {
                s.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bind_addr,
            database_url,
            cors_origins,
            route_filter,
            upload,
            staff_emails,
            auth: defaults.auth,
        }
    }

    /// The edge filter only recognizes sessions whose cookie name carries its pattern
    fn check_cookie_pattern(&self) {
        if !self
            .route_filter
            .looks_authenticated([self.auth.session_cookie.as_str()])
        {
            tracing::warn!(
                cookie = %self.auth.session_cookie,
                pattern = %self.route_filter.cookie_pattern,
                default_pattern = DEFAULT_COOKIE_PATTERN,
                "Session cookie name does not match the edge filter pattern; protected pages will always redirect"
            );
        }
    }
}

/// Comma-separated path prefixes, each normalized to a leading slash
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.starts_with('/') {
                s.trim_end_matches('/').to_string()
            } else {
                format!("/{}", s.trim_end_matches('/'))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> PortalConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PortalConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]);
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert!(config.database_url.is_none());
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.route_filter.mode, FilterMode::Enforce);
        assert_eq!(config.upload, UploadPolicy::default());
    }

    #[test]
    fn test_edge_filter_settings() {
        let config = from_map(&[
            ("EDGE_FILTER_MODE", "advisory"),
            ("EDGE_PROTECTED_PREFIXES", "/dashboard, student/ ,"),
            ("EDGE_COOKIE_PATTERN", "-session"),
        ]);
        assert_eq!(config.route_filter.mode, FilterMode::Advisory);
        assert_eq!(
            config.route_filter.protected_prefixes,
            vec!["/dashboard".to_string(), "/student".to_string()]
        );
        assert_eq!(config.route_filter.cookie_pattern, "-session");
    }

    #[test]
    fn test_upload_settings() {
        let config = from_map(&[
            ("UPLOAD_MAX_BYTES", "1048576"),
            ("UPLOAD_MIME_TYPE", "Application/PDF"),
        ]);
        assert_eq!(config.upload.max_bytes, 1_048_576);
        assert_eq!(config.upload.mime_type, "application/pdf");

        let config = from_map(&[("UPLOAD_MAX_BYTES", "lots")]);
        assert_eq!(config.upload.max_bytes, UploadPolicy::default().max_bytes);
    }

    #[test]
    fn test_blank_database_url_selects_memory() {
        let config = from_map(&[("DATABASE_URL", "  ")]);
        assert!(config.database_url.is_none());

        let config = from_map(&[("CORS_ALLOWED_ORIGINS", "https://a.edu, https://b.edu")]);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_staff_emails_lowercased() {
        assert!(from_map(&[]).staff_emails.is_empty());

        let config = from_map(&[("PORTAL_STAFF_EMAILS", " Luis@Uni.edu, ,coord@uni.edu")]);
        assert_eq!(
            config.staff_emails,
            vec!["luis@uni.edu".to_string(), "coord@uni.edu".to_string()]
        );
    }
}
