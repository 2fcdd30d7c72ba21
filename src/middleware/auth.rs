use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::user::Role;

/// Claims of a token issued by the auth provider. `role` and `companyId` are custom claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Caller identity attached to the request by [`require_roles`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub role: Role,
    pub company_id: Option<String>,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Staff of the owning company, or a super admin.
    pub fn can_access_company(&self, company_id: &str) -> bool {
        self.is_super_admin()
            || (self.role.is_staff() && self.company_id.as_deref() == Some(company_id))
    }

    pub fn ensure_company_access(&self, company_id: &str) -> Result<()> {
        if self.can_access_company(company_id) {
            Ok(())
        } else {
            Err(Error::Forbidden("forbidden".to_string()))
        }
    }

    pub fn ensure_self_or_staff(&self, uid: &str) -> Result<()> {
        if self.uid == uid || self.role.is_staff() {
            Ok(())
        } else {
            Err(Error::Forbidden("forbidden".to_string()))
        }
    }

    pub fn require_company(&self) -> Result<&str> {
        self.company_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Forbidden("missing_company_claim".to_string()))
    }
}

#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<Claims> {
        let auth_header = headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or_else(|| Error::Unauthorized("missing_authorization".to_string()))?;
        let auth_str = auth_header
            .to_str()
            .map_err(|_| Error::Unauthorized("bad_authorization".to_string()))?;
        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::Unauthorized("unsupported_scheme".to_string()))?;
        self.verify(token.trim())
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| Error::Unauthorized("invalid_token".to_string()))
    }
}

/// State for [`require_roles`]: the verifier plus the roles a route group admits.
#[derive(Clone)]
pub struct RoleGuard {
    verifier: JwtVerifier,
    allowed: &'static [Role],
}

impl RoleGuard {
    pub fn new(verifier: JwtVerifier, allowed: &'static [Role]) -> Self {
        Self { verifier, allowed }
    }

    pub fn authorize(&self, headers: &HeaderMap) -> Result<AuthUser> {
        let claims = self.verifier.verify_headers(headers)?;
        let role = claims
            .role
            .as_deref()
            .and_then(Role::parse)
            .filter(|role| self.allowed.contains(role))
            .ok_or_else(|| Error::Forbidden("forbidden".to_string()))?;
        Ok(AuthUser {
            uid: claims.sub,
            role,
            company_id: claims.company_id,
            email: claims.email,
        })
    }
}

pub async fn require_roles(State(guard): State<RoleGuard>, mut req: Request, next: Next) -> Response {
    match guard.authorize(req.headers()) {
        Ok(user) => {
            tracing::debug!(uid = %user.uid, role = %user.role, "request authorized");
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
