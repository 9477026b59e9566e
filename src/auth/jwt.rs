use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::models::{Claims, TokenType};

/// Decodes an access token issued by the identity service.
/// Refresh tokens are refused: they only buy new access tokens there.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("access token required".to_string());
    }

    Ok(claims)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn access_token_round_trips_claims() {
        let claims = verify_access_token(&token(2, Some(7), TokenType::Access), SECRET).unwrap();
        assert_eq!(claims.role, 2);
        assert_eq!(claims.employee_id, Some(7));
    }

    #[test]
    fn refresh_token_is_refused() {
        assert!(verify_access_token(&token(2, Some(7), TokenType::Refresh), SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_refused() {
        assert!(verify_access_token(&token(2, Some(7), TokenType::Access), "other").is_err());
    }
}
