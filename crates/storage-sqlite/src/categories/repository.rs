use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use super::model::{CategoryDB, NewCategoryDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found_as, StorageError};
use crate::schema::categories;
use spendwatch_core::categories::{Category, CategoryRepositoryTrait, NewCategory};
use spendwatch_core::Result;

pub struct CategoryRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CategoryRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CategoryRepositoryTrait for CategoryRepository {
    fn get_category(&self, category_id: &str) -> Result<Category> {
        let mut conn = get_connection(&self.pool)?;
        let row = categories::table
            .find(category_id)
            .select(CategoryDB::as_select())
            .first(&mut conn)
            .map_err(not_found_as("category", category_id))?;
        Ok(Category::try_from(row)?)
    }

    fn list_categories(&self, owner_id: &str) -> Result<Vec<Category>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = categories::table
            .filter(categories::owner_id.eq(owner_id))
            .order(categories::name.asc())
            .select(CategoryDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| Category::try_from(row).map_err(Into::into))
            .collect()
    }

    async fn create_category(&self, new_category: NewCategory) -> Result<Category> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Category> {
                let id = new_category
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let row = NewCategoryDB::from_domain(new_category, id, Utc::now().naive_utc());

                let created = diesel::insert_into(categories::table)
                    .values(&row)
                    .returning(CategoryDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Category::try_from(created)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::setup_db;
    use spendwatch_core::categories::CategoryType;

    #[tokio::test]
    async fn test_create_and_list_categories() {
        let (pool, writer, _dir) = setup_db();
        let repo = CategoryRepository::new(pool, writer);

        for (id, name) in [("c2", "Rent"), ("c1", "Groceries")] {
            repo.create_category(NewCategory {
                id: Some(id.to_string()),
                owner_id: "u1".to_string(),
                name: name.to_string(),
                category_type: CategoryType::Expense,
            })
            .await
            .unwrap();
        }

        let names: Vec<String> = repo
            .list_categories("u1")
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Groceries".to_string(), "Rent".to_string()]);
        assert_eq!(repo.get_category("c2").unwrap().category_type, CategoryType::Expense);
        assert!(repo.get_category("missing").unwrap_err().is_not_found());
        assert!(repo.list_categories("u2").unwrap().is_empty());
    }
}
