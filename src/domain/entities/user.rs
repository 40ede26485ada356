use std::fmt;

/// A chat-platform member as seen by an adapter.
///
/// `id` is the platform-assigned integer identifier and doubles as the `uid`
/// key of the member's stored records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub is_bot: bool,
}

impl User {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
            is_bot: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_first_name(mut self, first: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self
    }

    pub fn display_name(&self) -> String {
        if let Some(ref username) = self.username {
            username.clone()
        } else if let Some(ref first) = self.first_name {
            first.clone()
        } else {
            self.id.to_string()
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
