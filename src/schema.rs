use serde::{Deserialize, Serialize};

// Request body for registration and login
#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialsSchema {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// Struct representing the request body for creating a new Todo
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTodoSchema {
    #[serde(default)]
    pub content: String,
}

// Struct representing the request body for updating a Todo.
// Absent fields keep their stored value.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateTodoSchema {
    pub content: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsernameResponse {
    pub username: String,
}
