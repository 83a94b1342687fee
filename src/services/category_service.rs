use crate::database::Database;
use crate::models::{Category, CategoryRequest};
use crate::repositories::categories;
use crate::utils::{AppError, AppResult};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

pub fn validate(request: &CategoryRequest) -> AppResult<()> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("Category name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Category name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    if let Some(description) = &request.description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::InvalidRequest(format!(
                "Category description must be at most {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
    }
    Ok(())
}

fn duplicate(name: &str) -> AppError {
    AppError::Conflict(format!("Category '{}' already exists", name))
}

pub async fn list_categories(db: &Database) -> AppResult<Vec<Category>> {
    Ok(categories::list(db.pool()).await?)
}

pub async fn get_category(db: &Database, id: i64) -> AppResult<Category> {
    categories::find_by_id(db.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
}

pub async fn create_category(db: &Database, request: &CategoryRequest) -> AppResult<Category> {
    validate(request)?;
    let name = request.name.trim();

    if categories::find_by_name(db.pool(), name).await?.is_some() {
        return Err(duplicate(name));
    }

    categories::insert(db.pool(), name, request.description.as_deref())
        .await
        .map_err(|e| AppError::from_db(e, &format!("Category '{}' already exists", name)))
}

pub async fn update_category(db: &Database, id: i64, request: &CategoryRequest) -> AppResult<Category> {
    validate(request)?;
    let name = request.name.trim();

    get_category(db, id).await?;
    if let Some(existing) = categories::find_by_name(db.pool(), name).await? {
        if existing.id != id {
            return Err(duplicate(name));
        }
    }

    categories::update(db.pool(), id, name, request.description.as_deref())
        .await
        .map_err(|e| AppError::from_db(e, &format!("Category '{}' already exists", name)))?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
}

pub async fn delete_category(db: &Database, id: i64) -> AppResult<()> {
    get_category(db, id).await?;

    let products = categories::count_products(db.pool(), id).await?;
    if products > 0 {
        return Err(AppError::Conflict(format!(
            "Category {} still has {} product(s)",
            id, products
        )));
    }

    categories::delete(db.pool(), id)
        .await
        .map_err(|e| AppError::from_db(e, "Category is still referenced"))?;
    Ok(())
}
