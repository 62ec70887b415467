//! Caller authentication.
//!
//! - [`api_key`] -- static `X-API-Key` check.
//! - [`oidc`] -- bearer JWT verification against Keycloak / Cognito.
//!
//! [`Authenticator`] combines both according to [`AuthConfig`]; handlers only
//! see the result through the [`crate::middleware::auth::Authorized`]
//! extractor.

pub mod api_key;
pub mod oidc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use movies_core::error::CoreError;

use crate::config::env_or;
use crate::error::AppError;
use api_key::{redacted_prefix, ApiKeyVerifier, API_KEY_HEADER};
use oidc::{OidcConfig, OidcProvider, OidcVerifier, JWKS_FETCH_TIMEOUT};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Authentication settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// When false every request is accepted as anonymous.
    pub enabled: bool,
    pub api_key: Option<String>,
    pub oidc: Option<OidcConfig>,
}

impl AuthConfig {
    /// Load authentication settings from environment variables.
    ///
    /// | Env Var          | Required                 | Default    |
    /// |------------------|--------------------------|------------|
    /// | `AUTH_ENABLED`   | no                       | `true`     |
    /// | `API_KEY`        | no                       | --         |
    /// | `OIDC_ISSUER`    | no                       | --         |
    /// | `OIDC_CLIENT_ID` | if `OIDC_ISSUER` is set  | --         |
    /// | `OIDC_PROVIDER`  | no                       | `keycloak` |
    /// | `OIDC_JWKS_URL`  | no                       | derived    |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values or when `OIDC_ISSUER` is set without
    /// `OIDC_CLIENT_ID`.
    pub fn from_env() -> Self {
        let enabled: bool = env_or("AUTH_ENABLED", true);
        let api_key = non_empty_env("API_KEY");

        let oidc = non_empty_env("OIDC_ISSUER").map(|issuer| {
            let client_id = non_empty_env("OIDC_CLIENT_ID")
                .expect("OIDC_CLIENT_ID must be set when OIDC_ISSUER is set");
            let provider: OidcProvider = env_or("OIDC_PROVIDER", OidcProvider::Keycloak);
            OidcConfig::new(provider, &issuer, &client_id, non_empty_env("OIDC_JWKS_URL"))
        });

        Self {
            enabled,
            api_key,
            oidc,
        }
    }

    /// Configuration that lets every request through.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            api_key: None,
            oidc: None,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Caller identity
// ---------------------------------------------------------------------------

/// How the caller proved its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Authentication is disabled.
    Anonymous,
    ApiKey,
    Bearer,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub subject: String,
    pub method: AuthMethod,
}

impl Caller {
    fn anonymous() -> Self {
        Self {
            subject: "anonymous".into(),
            method: AuthMethod::Anonymous,
        }
    }
}

// ---------------------------------------------------------------------------
// Authenticator
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AuthSetupError {
    #[error("authentication is enabled but neither API_KEY nor OIDC_ISSUER is configured")]
    NoMethodConfigured,

    #[error("failed to build HTTP client for JWKS retrieval: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Checks request credentials against the configured methods.
#[derive(Debug)]
pub struct Authenticator {
    enabled: bool,
    api_key: Option<ApiKeyVerifier>,
    oidc: Option<OidcVerifier>,
}

impl Authenticator {
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthSetupError> {
        if !config.enabled {
            return Ok(Self {
                enabled: false,
                api_key: None,
                oidc: None,
            });
        }
        if config.api_key.is_none() && config.oidc.is_none() {
            return Err(AuthSetupError::NoMethodConfigured);
        }

        let oidc = match &config.oidc {
            Some(oidc_config) => {
                let http = reqwest::Client::builder()
                    .timeout(JWKS_FETCH_TIMEOUT)
                    .build()?;
                Some(OidcVerifier::new(oidc_config.clone(), http))
            }
            None => None,
        };

        Ok(Self {
            enabled: true,
            api_key: config.api_key.as_deref().map(ApiKeyVerifier::new),
            oidc,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve the caller from request headers.
    ///
    /// An `X-API-Key` header is checked first (when API keys are enabled),
    /// then an `Authorization: Bearer` token (when OIDC is enabled).
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Caller, AppError> {
        if !self.enabled {
            return Ok(Caller::anonymous());
        }

        if let Some(verifier) = &self.api_key {
            if let Some(presented) = header_str(headers, API_KEY_HEADER) {
                if verifier.verify(presented) {
                    return Ok(Caller {
                        subject: "api-key".into(),
                        method: AuthMethod::ApiKey,
                    });
                }
                tracing::warn!(key = %redacted_prefix(presented), "Rejected invalid API key");
                return Err(unauthorized("Invalid API key"));
            }
        }

        if let Some(verifier) = &self.oidc {
            if let Some(value) = header_str(headers, AUTHORIZATION.as_str()) {
                let token = value.strip_prefix("Bearer ").ok_or_else(|| {
                    unauthorized("Invalid Authorization format. Expected: Bearer <token>")
                })?;
                return match verifier.verify(token.trim()).await {
                    Ok(claims) => Ok(Caller {
                        subject: claims.sub,
                        method: AuthMethod::Bearer,
                    }),
                    Err(err) if err.is_upstream() => {
                        tracing::error!(error = %err, "Identity provider unavailable");
                        Err(AppError::Unavailable("Identity provider unavailable".into()))
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Rejected bearer token");
                        Err(unauthorized("Invalid or expired token"))
                    }
                };
            }
        }

        tracing::warn!("Request without credentials");
        Err(unauthorized(self.missing_credentials_message()))
    }

    fn missing_credentials_message(&self) -> &'static str {
        match (self.api_key.is_some(), self.oidc.is_some()) {
            (true, true) => "Missing X-API-Key header or Bearer token",
            (true, false) => "Missing X-API-Key header",
            _ => "Missing Authorization header",
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
