//! Bearer-token verification against an external OpenID Connect provider
//! (Keycloak or AWS Cognito).
//!
//! Tokens must be RS256 JWTs signed by a key from the provider's JWKS. The
//! key set is fetched lazily, cached, and re-fetched when a token names a
//! `kid` the cache does not know (key rotation), at most once per
//! [`JWKS_MIN_REFRESH_INTERVAL`].

use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

/// Minimum time between two JWKS downloads triggered by unknown key ids.
pub const JWKS_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP timeout for JWKS downloads.
pub const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Identity provider flavour; decides the default JWKS location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidcProvider {
    Keycloak,
    Cognito,
}

impl std::str::FromStr for OidcProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keycloak" => Ok(Self::Keycloak),
            "cognito" => Ok(Self::Cognito),
            other => Err(format!(
                "unknown OIDC provider '{other}', expected 'keycloak' or 'cognito'"
            )),
        }
    }
}

/// Settings for bearer-token verification.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub provider: OidcProvider,
    /// Expected `iss` claim, e.g. `https://sso.example.com/realms/movies`.
    pub issuer: String,
    /// Client the token must be issued for (`azp`, `aud` or `client_id`).
    pub client_id: String,
    pub jwks_url: String,
}

impl OidcConfig {
    /// Build a config, deriving the JWKS URL from the issuer when not given.
    pub fn new(
        provider: OidcProvider,
        issuer: &str,
        client_id: &str,
        jwks_url: Option<String>,
    ) -> Self {
        let issuer = issuer.trim_end_matches('/').to_string();
        let jwks_url = jwks_url.unwrap_or_else(|| default_jwks_url(provider, &issuer));
        Self {
            provider,
            issuer,
            client_id: client_id.to_string(),
            jwks_url,
        }
    }
}

/// Well-known JWKS location for a provider.
pub fn default_jwks_url(provider: OidcProvider, issuer: &str) -> String {
    match provider {
        OidcProvider::Keycloak => format!("{issuer}/protocol/openid-connect/certs"),
        OidcProvider::Cognito => format!("{issuer}/.well-known/jwks.json"),
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// `aud` may be a single string or an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn contains(&self, client_id: &str) -> bool {
        match self {
            Audience::One(aud) => aud == client_id,
            Audience::Many(auds) => auds.iter().any(|a| a == client_id),
        }
    }
}

/// The subset of provider claims the service looks at.
#[derive(Debug, Clone, Deserialize)]
pub struct OidcClaims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    /// Keycloak: authorized party (the client the user logged in through).
    pub azp: Option<String>,
    pub aud: Option<Audience>,
    /// Cognito access tokens carry the app client here instead of `aud`.
    pub client_id: Option<String>,
    /// Keycloak display name.
    pub preferred_username: Option<String>,
    /// Cognito display name.
    pub username: Option<String>,
}

impl OidcClaims {
    /// Human-readable caller name, falling back to `sub`.
    pub fn display_name(&self) -> &str {
        self.preferred_username
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.sub)
    }
}

/// True when the token was issued for `client_id`.
pub fn is_issued_for(claims: &OidcClaims, client_id: &str) -> bool {
    claims.azp.as_deref() == Some(client_id)
        || claims.client_id.as_deref() == Some(client_id)
        || claims.aud.as_ref().is_some_and(|aud| aud.contains(client_id))
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum OidcError {
    /// The token is malformed, expired, wrongly signed or from another issuer.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("token header has no key id")]
    MissingKeyId,

    #[error("no signing key with id '{0}'")]
    UnknownKey(String),

    #[error("token was not issued for this client")]
    WrongAudience,

    /// The provider's key set could not be retrieved.
    #[error("JWKS unavailable: {0}")]
    JwksUnavailable(String),
}

impl OidcError {
    /// Errors caused by the provider rather than by the presented token.
    pub fn is_upstream(&self) -> bool {
        matches!(self, OidcError::JwksUnavailable(_))
    }
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

#[derive(Default)]
struct JwksCache {
    keys: Option<JwkSet>,
    fetched_at: Option<Instant>,
}

/// Verifies bearer tokens for one provider / client pair.
pub struct OidcVerifier {
    config: OidcConfig,
    http: reqwest::Client,
    cache: RwLock<JwksCache>,
}

impl std::fmt::Debug for OidcVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcVerifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OidcVerifier {
    pub fn new(config: OidcConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            cache: RwLock::new(JwksCache::default()),
        }
    }

    /// Verify a token and return its claims.
    pub async fn verify(&self, token: &str) -> Result<OidcClaims, OidcError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(OidcError::MissingKeyId)?;
        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        // Audience is checked below against azp / aud / client_id.
        validation.validate_aud = false;

        let claims = decode::<OidcClaims>(token, &key, &validation)?.claims;

        if !is_issued_for(&claims, &self.config.client_id) {
            return Err(OidcError::WrongAudience);
        }

        tracing::debug!(subject = %claims.sub, user = claims.display_name(), "Bearer token verified");
        Ok(claims)
    }

    /// Look up the signing key for `kid`, refreshing the cached set on a miss.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, OidcError> {
        {
            let cache = self.cache.read().await;
            if let Some(jwk) = cache.keys.as_ref().and_then(|set| set.find(kid)) {
                return Ok(DecodingKey::from_jwk(jwk)?);
            }
        }

        let mut cache = self.cache.write().await;

        // Another request may have refreshed while we waited for the lock.
        if let Some(jwk) = cache.keys.as_ref().and_then(|set| set.find(kid)) {
            return Ok(DecodingKey::from_jwk(jwk)?);
        }

        let recently_fetched = cache
            .fetched_at
            .is_some_and(|at| at.elapsed() < JWKS_MIN_REFRESH_INTERVAL);
        if recently_fetched {
            return Err(OidcError::UnknownKey(kid.to_string()));
        }

        let keys = self.fetch_jwks().await?;
        cache.fetched_at = Some(Instant::now());
        let key = keys.find(kid).map(DecodingKey::from_jwk).transpose()?;
        cache.keys = Some(keys);

        key.ok_or_else(|| OidcError::UnknownKey(kid.to_string()))
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, OidcError> {
        tracing::info!(url = %self.config.jwks_url, "Fetching JWKS");

        let response = self
            .http
            .get(&self.config.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| OidcError::JwksUnavailable(e.to_string()))?;

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| OidcError::JwksUnavailable(e.to_string()))?;

        if keys.keys.is_empty() {
            return Err(OidcError::JwksUnavailable(
                "provider returned an empty key set".into(),
            ));
        }
        Ok(keys)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
