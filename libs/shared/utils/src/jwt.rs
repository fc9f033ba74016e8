use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, JwtHeader, Role, User};

type HmacSha256 = Hmac<Sha256>;

fn sign(signing_input: &str, jwt_secret: &str) -> Result<Vec<u8>, String> {
    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Issues an HS256 token carrying the username and role.
pub fn issue_token(username: &str, role: Role, jwt_secret: &str, ttl_hours: i64) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let exp = now + Duration::hours(ttl_hours);

    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let header_json = serde_json::to_string(&header)
        .map_err(|e| format!("Failed to encode header: {}", e))?;
    let claims = JwtClaims {
        sub: username.to_string(),
        role,
        exp: Some(exp.timestamp().max(0) as u64),
        iat: Some(now.timestamp().max(0) as u64),
    };
    let claims_json = serde_json::to_string(&claims)
        .map_err(|e| format!("Failed to encode claims: {}", e))?;

    let header_encoded = URL_SAFE_NO_PAD.encode(header_json);
    let claims_encoded = URL_SAFE_NO_PAD.encode(claims_json);
    let signing_input = format!("{}.{}", header_encoded, claims_encoded);

    let signature = sign(&signing_input, jwt_secret)?;
    let signature_encoded = URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", signing_input, signature_encoded))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        },
    };

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp().max(0) as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let issued_at = claims.iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        username: claims.sub,
        role: claims.role,
        issued_at,
    };

    debug!("Token validated successfully for {} ({})", user.username, user.role);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_issue_then_validate() {
        let token = issue_token("house", Role::Doctor, SECRET, 1).unwrap();
        let user = validate_token(&token, SECRET).unwrap();

        assert_eq!(user.username, "house");
        assert_eq!(user.role, Role::Doctor);
        assert!(user.issued_at.is_some());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("house", Role::Doctor, SECRET, 1).unwrap();
        assert_eq!(validate_token(&token, "other").unwrap_err(), "Invalid token signature");
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token("house", Role::Patient, SECRET, -1).unwrap();
        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Token expired");
    }

    #[test]
    fn test_missing_secret_rejected() {
        assert!(issue_token("house", Role::Admin, "", 1).is_err());
        assert_eq!(validate_token("a.b.c", "").unwrap_err(), "JWT secret is not set");
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert_eq!(validate_token("not-a-token", SECRET).unwrap_err(), "Invalid token format");
    }
}
