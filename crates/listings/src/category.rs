use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dreambook_core::{CategoryId, DomainError, DomainResult, impl_entity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisementCategory {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl_entity!(AdvertisementCategory, CategoryId);

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl AdvertisementCategory {
    pub fn create(cmd: NewCategory, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        if name.chars().count() > 100 {
            return Err(DomainError::validation("category name cannot exceed 100 characters"));
        }
        Ok(Self {
            id: CategoryId::new(),
            name: name.to_string(),
            description: cmd.description,
            created_at: now,
        })
    }
}
