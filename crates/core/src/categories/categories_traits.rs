use async_trait::async_trait;

use crate::categories::{Category, NewCategory};
use crate::errors::Result;

/// Trait for category repository operations
#[async_trait]
pub trait CategoryRepositoryTrait: Send + Sync {
    /// Returns `Error::NotFound` when the category does not exist.
    fn get_category(&self, category_id: &str) -> Result<Category>;
    fn list_categories(&self, owner_id: &str) -> Result<Vec<Category>>;
    async fn create_category(&self, new_category: NewCategory) -> Result<Category>;
}
