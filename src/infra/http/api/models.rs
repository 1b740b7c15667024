use serde::{Deserialize, Serialize};

use crate::application::catalog::DeletedCounts;

#[derive(Debug, Deserialize, Serialize)]
pub struct MenuCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MenuUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SubmenuCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SubmenuUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// `price` is accepted as text so the stored representation is exactly what the client sent.
#[derive(Debug, Deserialize, Serialize)]
pub struct DishCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DishUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DeletedResponse {
    pub message: String,
    pub deleted: DeletedCounts,
}

impl DeletedResponse {
    pub fn new(message: impl Into<String>, deleted: DeletedCounts) -> Self {
        Self {
            message: message.into(),
            deleted,
        }
    }
}
