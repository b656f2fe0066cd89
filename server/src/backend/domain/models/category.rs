use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::TransactionType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub category_type: TransactionType,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// `#RRGGBB`
    pub fn is_valid_color(color: &str) -> bool {
        color.len() == 7
            && color.starts_with('#')
            && color[1..].chars().all(|c| c.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_validation() {
        assert!(Category::is_valid_color("#1a2B3c"));
        assert!(!Category::is_valid_color("1a2b3c"));
        assert!(!Category::is_valid_color("#12345"));
        assert!(!Category::is_valid_color("#zzzzzz"));
    }
}
