use serde::{Deserialize, Serialize};

/// Request body for `POST /admin/tokens`.
///
/// - `roles` omitted: roles are resolved from `user_roles`
/// - `roles: []`: token carries no roles
#[derive(Debug, Clone, Deserialize)]
pub struct IssueTokenRequest {
    pub user_id: u32,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl IssueTokenRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.user_id == 0 {
            return Err("user_id must be positive");
        }
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        if self.email.trim().is_empty() {
            return Err("email is required");
        }
        if let Some(roles) = &self.roles
            && roles.iter().any(|r| r.trim().is_empty())
        {
            return Err("roles must not contain empty names");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Usually "Bearer"
    pub token_type: String,
    /// Seconds until the access token expires.
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_optional_in_json() {
        let req: IssueTokenRequest =
            serde_json::from_str(r#"{"user_id":1,"email":"a@b.io","name":"a"}"#).unwrap();
        assert!(req.roles.is_none());
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn zero_user_id_is_rejected() {
        let req: IssueTokenRequest =
            serde_json::from_str(r#"{"user_id":0,"email":"a@b.io","name":"a","roles":[]}"#)
                .unwrap();
        assert_eq!(req.validate(), Err("user_id must be positive"));
    }
}
