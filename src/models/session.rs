use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub token: String,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Shared, cheaply-cloneable slot holding the current session (if any).
#[derive(Clone, Default)]
pub struct SessionHandle(Arc<RwLock<Option<Session>>>);

impl SessionHandle {
    pub fn new(session: Option<Session>) -> Self {
        Self(Arc::new(RwLock::new(session)))
    }

    pub async fn login(&self, session: Session) {
        *self.0.write().await = Some(session);
    }

    pub async fn logout(&self) {
        *self.0.write().await = None;
    }

    pub async fn current(&self) -> Option<Session> {
        self.0.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.0.read().await.as_ref().map(|s| s.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("owner".parse::<Role>().is_err());
    }

    #[tokio::test]
    async fn test_login_logout() {
        let handle = SessionHandle::default();
        assert!(handle.current().await.is_none());
        handle
            .login(Session {
                username: "mara".into(),
                role: Role::User,
                token: "tok".into(),
            })
            .await;
        assert_eq!(handle.token().await.as_deref(), Some("tok"));
        handle.logout().await;
        assert!(handle.token().await.is_none());
    }
}
