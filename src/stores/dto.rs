use serde::Deserialize;

use super::repo_types::{NewStore, StoreChanges};
use crate::{
    api::{non_blank, required},
    auth::services::is_valid_email,
    error::{AppError, AppResult},
};

#[derive(Debug, Default, Deserialize)]
pub struct StoreRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub license_number: Option<String>,
}

/// Optional contact fields: blank means "not provided".
fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// On update an absent field is kept, a blank one is cleared.
fn replacement(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| optional(Some(v)))
}

fn contact_email(value: Option<String>) -> AppResult<Option<String>> {
    match optional(value).map(|e| e.to_lowercase()) {
        Some(e) if !is_valid_email(&e) => Err(AppError::validation("Invalid email")),
        other => Ok(other),
    }
}

impl StoreRequest {
    pub fn into_new(self) -> AppResult<NewStore> {
        Ok(NewStore {
            name: required("Name", self.name)?,
            address: required("Address", self.address)?,
            license_number: required("License number", self.license_number)?,
            city: optional(self.city),
            phone: optional(self.phone),
            email: contact_email(self.email)?,
        })
    }

    pub fn into_changes(self) -> AppResult<StoreChanges> {
        Ok(StoreChanges {
            name: non_blank("Name", self.name)?,
            address: non_blank("Address", self.address)?,
            license_number: non_blank("License number", self.license_number)?,
            city: replacement(self.city),
            phone: replacement(self.phone),
            email: match self.email {
                Some(raw) => Some(contact_email(Some(raw))?),
                None => None,
            },
        })
    }
}
