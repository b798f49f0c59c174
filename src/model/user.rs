use serde::{Deserialize, Serialize};

/// Represents a registered user.
///
/// An immutable value: fields are fixed at construction and two users with the
/// same fields are the same user. It serializes to `{ "name": ..., "email": ... }`,
/// which is what views see when a `User` is bound into a
/// [`ViewContext`](crate::framework::ViewContext).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    name: String,
    email: String,
}

impl User {
    /// Creates a new User instance.
    ///
    /// # Arguments
    /// * `name` - User's display name
    /// * `email` - User's email address
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_fields() {
        let user = User::new("John Doe", "john@example.com");
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            serde_json::json!({ "name": "John Doe", "email": "john@example.com" })
        );
    }
}
