use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Body for both create and update.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CategoryRequest {
    pub name: String,
    pub description: Option<String>,
}
