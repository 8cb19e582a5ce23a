use std::sync::Arc;

use chrono::Utc;

use crate::domain::User;
use crate::error::{DomainError, FieldErrors, RepoError};
use crate::ports::{AvatarStore, PasswordService, UserRepository};

const USERNAME_TAKEN: &str = "That username is taken. Please choose a different one.";
const EMAIL_TAKEN: &str = "That email is taken. Please choose a different one.";

/// Input for a new registration. Field formats are checked by the form layer.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// An uploaded picture awaiting storage.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Requested profile state. Unchanged values are simply repeated.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub avatar: Option<AvatarUpload>,
}

/// Registration, credential checks and profile changes.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    avatars: Arc<dyn AvatarStore>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        avatars: Arc<dyn AvatarStore>,
    ) -> Self {
        Self {
            users,
            passwords,
            avatars,
        }
    }

    /// Create an account. A taken username or email is a field error, whether
    /// caught by the pre-check or by the store's unique constraint.
    pub async fn register(&self, account: NewAccount) -> Result<User, DomainError> {
        let mut errors = FieldErrors::new();
        if self.users.find_by_username(&account.username).await?.is_some() {
            errors.add("username", USERNAME_TAKEN);
        }
        if self.users.find_by_email(&account.email).await?.is_some() {
            errors.add("email", EMAIL_TAKEN);
        }
        errors.into_result()?;

        let password_hash = self.passwords.hash(&account.password)?;
        let user = User::new(account.username, account.email, password_hash);

        let saved = self
            .users
            .insert(user)
            .await
            .map_err(uniqueness_violation)?;

        tracing::info!(user_id = %saved.id, "Account registered");
        Ok(saved)
    }

    /// Look up by email and verify the password. Unknown emails cost a hash so
    /// both failure paths take similar time.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        match self.users.find_by_email(email).await? {
            Some(user) if self.passwords.verify(password, &user.password_hash) => Ok(Some(user)),
            Some(user) => {
                tracing::debug!(user_id = %user.id, "Password mismatch");
                Ok(None)
            }
            None => {
                let _ = self.passwords.hash(password);
                Ok(None)
            }
        }
    }

    /// Change username, email and optionally the avatar.
    pub async fn update_profile(
        &self,
        user: &User,
        update: ProfileUpdate,
    ) -> Result<User, DomainError> {
        let mut errors = FieldErrors::new();
        if update.username != user.username {
            if let Some(other) = self.users.find_by_username(&update.username).await? {
                if other.id != user.id {
                    errors.add("username", USERNAME_TAKEN);
                }
            }
        }
        if update.email != user.email {
            if let Some(other) = self.users.find_by_email(&update.email).await? {
                if other.id != user.id {
                    errors.add("email", EMAIL_TAKEN);
                }
            }
        }
        errors.into_result()?;

        let new_image = match update.avatar {
            Some(upload) => Some(self.avatars.store(&upload.file_name, upload.bytes).await?),
            None => None,
        };

        let updated = User {
            username: update.username,
            email: update.email,
            image_file: new_image.clone().unwrap_or_else(|| user.image_file.clone()),
            updated_at: Utc::now(),
            ..user.clone()
        };

        let saved = match self.users.update(updated).await {
            Ok(saved) => saved,
            Err(err) => {
                if let Some(orphan) = &new_image {
                    self.discard_avatar(orphan).await;
                }
                return Err(uniqueness_violation(err));
            }
        };

        if new_image.is_some() && !user.has_default_image() {
            self.discard_avatar(&user.image_file).await;
        }

        tracing::info!(user_id = %saved.id, avatar_changed = new_image.is_some(), "Profile updated");
        Ok(saved)
    }

    async fn discard_avatar(&self, file_name: &str) {
        if let Err(e) = self.avatars.remove(file_name).await {
            tracing::warn!(file = %file_name, error = %e, "Failed to remove avatar");
        }
    }
}

/// Unique-constraint failures become the matching field error.
fn uniqueness_violation(err: RepoError) -> DomainError {
    match err {
        RepoError::Constraint(detail) => {
            let detail = detail.to_lowercase();
            if detail.contains("username") {
                DomainError::invalid("username", USERNAME_TAKEN)
            } else if detail.contains("email") {
                DomainError::invalid("email", EMAIL_TAKEN)
            } else {
                DomainError::invalid("form", "That account already exists.")
            }
        }
        other => other.into(),
    }
}
