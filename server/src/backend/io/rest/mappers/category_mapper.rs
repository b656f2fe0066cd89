use shared::{Category, CategoryListResponse, CreateCategoryRequest, UpdateCategoryRequest};

use crate::backend::domain::commands::categories::{CreateCategoryCommand, UpdateCategoryCommand};
use crate::backend::domain::models::category::Category as DomainCategory;

use super::timestamp_to_dto;

pub struct CategoryMapper;

impl CategoryMapper {
    pub fn to_create_command(request: CreateCategoryRequest) -> CreateCategoryCommand {
        CreateCategoryCommand {
            name: request.name,
            category_type: request.category_type,
            color: request.color,
            icon: request.icon,
        }
    }

    pub fn to_update_command(request: UpdateCategoryRequest) -> UpdateCategoryCommand {
        UpdateCategoryCommand {
            name: request.name,
            color: request.color,
            icon: request.icon,
        }
    }

    pub fn to_dto(category: DomainCategory) -> Category {
        Category {
            id: category.id,
            name: category.name,
            category_type: category.category_type,
            color: category.color,
            icon: category.icon,
            created_at: timestamp_to_dto(category.created_at),
            updated_at: timestamp_to_dto(category.updated_at),
        }
    }

    pub fn to_list_response(categories: Vec<DomainCategory>) -> CategoryListResponse {
        CategoryListResponse {
            categories: categories.into_iter().map(Self::to_dto).collect(),
        }
    }
}
