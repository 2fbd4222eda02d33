use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Tutor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Tutor => "tutor",
        }
    }

    /// Role name used on OpenAI- and Anthropic-style chat APIs.
    pub fn to_api_role(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Tutor => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            // Older transcripts stored the API role name.
            "tutor" | "assistant" => Ok(Role::Tutor),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn tutor(content: impl Into<String>) -> Self {
        Self::new(Role::Tutor, content)
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }
}

/// Contents of every user-authored message, oldest first.
pub fn user_contents(messages: &[Message]) -> impl Iterator<Item = &str> {
    messages
        .iter()
        .filter(|message| message.is_user())
        .map(|message| message.content.as_str())
}
