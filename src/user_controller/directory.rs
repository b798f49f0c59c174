//! Where the User controller gets its users from.

use super::error::UserError;
use crate::model::User;
use async_trait::async_trait;

/// Read access to the registered users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, UserError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
}

/// A fixed, in-memory list of users.
#[derive(Debug, Clone, Default)]
pub struct StaticUserDirectory {
    users: Vec<User>,
}

impl StaticUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// The two users the demo application ships with.
    pub fn sample() -> Self {
        Self::new(vec![
            User::new("John Doe", "john@example.com"),
            User::new("Jane Doe", "jane@example.com"),
        ])
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn list(&self) -> Result<Vec<User>, UserError> {
        Ok(self.users.clone())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self.users.iter().find(|u| u.email() == email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_directory() {
        let directory = StaticUserDirectory::sample();

        let users = directory.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name(), "John Doe");

        let jane = directory.find_by_email("jane@example.com").await.unwrap();
        assert_eq!(jane.map(|u| u.name().to_string()), Some("Jane Doe".to_string()));
        assert_eq!(directory.find_by_email("nobody@example.com").await.unwrap(), None);
    }
}
