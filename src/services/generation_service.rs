use crate::entities::ai_generation_entity as generations;
use crate::error::{AppError, AppResult};
use crate::models::{
    AiGenerationResponse, GenerationQuery, NewGeneration, PaginatedResponse, PaginationParams,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Gallery history of generated images, keyed by identity.
#[derive(Clone)]
pub struct GenerationService {
    pool: Arc<DatabaseConnection>,
}

impl GenerationService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    pub async fn save(&self, input: NewGeneration) -> AppResult<AiGenerationResponse> {
        let now = Utc::now();
        let model = generations::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_email: Set(input.user_email),
            prompt: Set(input.prompt),
            image_url: Set(input.image_url),
            mode: Set(input.mode),
            aspect_ratio: Set(input.aspect_ratio),
            description: Set(input.description.filter(|d| !d.is_empty())),
            strength: Set(input.strength),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.pool.as_ref())
        .await?;
        Ok(model.into())
    }

    /// Saves in the background; a failed save only loses the history entry.
    pub fn spawn_save(&self, input: NewGeneration) -> JoinHandle<()> {
        let svc = self.clone();
        tokio::spawn(async move {
            if let Err(e) = svc.save(input).await {
                log::warn!("Failed to save generation history: {e}");
            }
        })
    }

    /// Newest first.
    pub async fn list_for_user(
        &self,
        user_email: &str,
        query: &GenerationQuery,
    ) -> AppResult<PaginatedResponse<AiGenerationResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let base_query =
            generations::Entity::find().filter(generations::Column::UserEmail.eq(user_email));

        let total = base_query.clone().count(self.pool.as_ref()).await?;
        let items = base_query
            .order_by_desc(generations::Column::CreatedAt)
            .limit(params.get_per_page())
            .offset(params.get_offset())
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_for_user(&self, user_email: &str, id: Uuid) -> AppResult<AiGenerationResponse> {
        generations::Entity::find_by_id(id)
            .filter(generations::Column::UserEmail.eq(user_email))
            .one(self.pool.as_ref())
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Generation not found".into()))
    }

    pub async fn delete_for_user(&self, user_email: &str, id: Uuid) -> AppResult<()> {
        let res = generations::Entity::delete_many()
            .filter(generations::Column::Id.eq(id))
            .filter(generations::Column::UserEmail.eq(user_email))
            .exec(self.pool.as_ref())
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Generation not found".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::GenerationMode;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn sample(user_email: &str) -> generations::Model {
        generations::Model {
            id: Uuid::new_v4(),
            user_email: Some(user_email.to_string()),
            prompt: "Vieux-Québec at dusk".to_string(),
            image_url: "data:image/png;base64,AAAA".to_string(),
            mode: GenerationMode::TextToImage,
            aspect_ratio: Some("1:1".to_string()),
            description: None,
            strength: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_returns_stored_row() {
        let row = sample("user_1");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row.clone()]])
            .into_connection();
        let svc = GenerationService::new(Arc::new(db));

        let saved = svc
            .save(NewGeneration {
                user_email: row.user_email.clone(),
                prompt: row.prompt.clone(),
                image_url: row.image_url.clone(),
                mode: row.mode,
                aspect_ratio: row.aspect_ratio.clone(),
                description: Some(String::new()),
                strength: None,
            })
            .await
            .unwrap();
        assert_eq!(saved.id, row.id);
        assert_eq!(saved.mode, GenerationMode::TextToImage);
    }

    #[tokio::test]
    async fn test_get_other_users_generation_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<generations::Model>::new()])
            .into_connection();
        let svc = GenerationService::new(Arc::new(db));

        let err = svc.get_for_user("user_2", Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_generation_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();
        let svc = GenerationService::new(Arc::new(db));
        let id = Uuid::new_v4();

        assert!(svc.delete_for_user("user_1", id).await.is_ok());
        assert!(matches!(
            svc.delete_for_user("user_1", id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
