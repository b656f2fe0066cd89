use chrono::Utc;
use lettre::Address;
use tracing::info;

use crate::backend::domain::commands::users::{RegisterUserCommand, RegisteredUser};
use crate::backend::domain::models::user::User;
use crate::backend::error::{AppError, AppResult};
use crate::backend::storage::{Connection, UserStorage};

/// Registration and API token authentication
#[derive(Clone)]
pub struct UserService<C: Connection> {
    user_repository: C::UserRepository,
}

impl<C: Connection> UserService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            user_repository: connection.create_user_repository(),
        }
    }

    pub async fn register(&self, command: RegisterUserCommand) -> AppResult<RegisteredUser> {
        let name = command.name.trim().to_string();
        let email = command.email.trim().to_lowercase();
        Self::validate(&name, &email)?;

        if self.user_repository.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email is already registered"));
        }

        let api_token = User::generate_api_token();
        let user = User {
            id: User::generate_id(),
            name,
            email,
            api_token_hash: User::hash_api_token(&api_token),
            created_at: Utc::now(),
        };
        // A concurrent registration can still win the race to the UNIQUE index
        self.user_repository
            .store_user(&user)
            .await
            .map_err(|e| registration_conflict(e.into()))?;

        info!(target: "auth", user_id = %user.id, "User registered");
        Ok(RegisteredUser { user, api_token })
    }

    /// Resolve a bearer token to its user
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::Unauthenticated);
        }

        self.user_repository
            .find_by_token_hash(&User::hash_api_token(token))
            .await?
            .ok_or(AppError::Unauthenticated)
    }

    fn validate(name: &str, email: &str) -> AppResult<()> {
        if name.is_empty() || name.chars().count() > 100 {
            return Err(AppError::validation("Name must be between 1 and 100 characters"));
        }
        let valid_email = email.len() <= 255
            && email
                .parse::<Address>()
                .map_or(false, |address| address.domain().contains('.'));
        if !valid_email {
            return Err(AppError::validation("Email address is not valid"));
        }
        Ok(())
    }
}

fn registration_conflict(err: AppError) -> AppError {
    if err.is_unique_violation() {
        AppError::conflict("Email is already registered")
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::DbConnection;
    use crate::backend::storage::sqlite::test_utils::create_test_user;

    async fn service() -> UserService<DbConnection> {
        let db = DbConnection::init_test().await.unwrap();
        UserService::new(&db)
    }

    fn command(name: &str, email: &str) -> RegisterUserCommand {
        RegisterUserCommand {
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let service = service().await;
        let registered = service.register(command(" Olena ", "Olena@Example.com")).await.unwrap();
        assert_eq!(registered.user.name, "Olena");
        assert_eq!(registered.user.email, "olena@example.com");
        assert_ne!(registered.user.api_token_hash, registered.api_token);

        let user = service.authenticate(&registered.api_token).await.unwrap();
        assert_eq!(user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_unknown_or_empty_token() {
        let service = service().await;
        assert!(matches!(service.authenticate("").await, Err(AppError::Unauthenticated)));
        assert!(matches!(service.authenticate("bogus").await, Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let service = service().await;
        service.register(command("A", "a@example.com")).await.unwrap();
        let err = service.register(command("B", "A@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_validation() {
        let service = service().await;
        assert!(matches!(
            service.register(command("  ", "a@example.com")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.register(command("A", "not-an-email")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_addresses_the_mailer_cannot_use() {
        let service = service().await;
        for email in ["john smith@example.com", "@example.com", "a@@example.com", "a@b@example.com"] {
            assert!(
                matches!(service.register(command("A", email)).await, Err(AppError::Validation(_))),
                "{} should be rejected",
                email
            );
        }
        assert!(service.register(command("A", "john.smith+budget@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_unique_violation_on_insert_is_a_conflict() {
        let db = DbConnection::init_test().await.unwrap();
        let existing = create_test_user(&db, "race").await.unwrap();
        let repo = db.create_user_repository();

        let mut late = existing.clone();
        late.id = User::generate_id();
        late.api_token_hash = User::hash_api_token("another-token");
        let err: AppError = repo.store_user(&late).await.unwrap_err().into();
        assert!(err.is_unique_violation());
        assert!(matches!(registration_conflict(err), AppError::Conflict(_)));

        assert!(matches!(
            registration_conflict(AppError::validation("x")),
            AppError::Validation(_)
        ));
    }
}
