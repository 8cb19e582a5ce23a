//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select};
use uuid::Uuid;

use quill_core::domain::{Page, PageRequest, PostWithAuthor, User};
use quill_core::error::RepoError;
use quill_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::mask_email;
use super::postgres_base::{PostgresBaseRepository, query_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let row = PostEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(query_error)?;

        row.map(joined).transpose()
    }

    async fn list_recent(&self, page: PageRequest) -> Result<Page<PostWithAuthor>, RepoError> {
        self.page_of(PostEntity::find(), page).await
    }

    async fn list_by_author(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<PostWithAuthor>, RepoError> {
        let select = PostEntity::find().filter(post::Column::UserId.eq(user_id));
        self.page_of(select, page).await
    }
}

impl PostgresBaseRepository<PostEntity> {
    /// Newest first, ties broken by the time-ordered id.
    async fn page_of(
        &self,
        select: Select<PostEntity>,
        request: PageRequest,
    ) -> Result<Page<PostWithAuthor>, RepoError> {
        let paginator = select
            .find_also_related(UserEntity)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .paginate(&self.db, request.per_page());

        let total = paginator.num_items().await.map_err(query_error)?;
        if request.offset() >= total {
            return Ok(Page::new(Vec::new(), request, total));
        }

        let rows = paginator
            .fetch_page(request.page() - 1)
            .await
            .map_err(query_error)?;

        let items = rows
            .into_iter()
            .map(joined)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, request, total))
    }
}

fn joined((post, author): (post::Model, Option<user::Model>)) -> Result<PostWithAuthor, RepoError> {
    let author = author.ok_or_else(|| RepoError::Query(format!("post {} has no author", post.id)))?;

    Ok(PostWithAuthor {
        post: post.into(),
        author: author.into(),
    })
}
