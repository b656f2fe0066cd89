use shared::{RegisterUserRequest, RegisterUserResponse, User};

use crate::backend::domain::commands::users::{RegisterUserCommand, RegisteredUser};
use crate::backend::domain::models::user::User as DomainUser;

use super::timestamp_to_dto;

pub struct UserMapper;

impl UserMapper {
    pub fn to_register_command(request: RegisterUserRequest) -> RegisterUserCommand {
        RegisterUserCommand {
            name: request.name,
            email: request.email,
        }
    }

    /// The token digest never leaves the server
    pub fn to_dto(user: DomainUser) -> User {
        User {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: timestamp_to_dto(user.created_at),
        }
    }

    pub fn to_register_response(registered: RegisteredUser) -> RegisterUserResponse {
        RegisterUserResponse {
            user: Self::to_dto(registered.user),
            api_token: registered.api_token,
        }
    }
}
