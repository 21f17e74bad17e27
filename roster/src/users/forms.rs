//! The create / edit user form and its validation.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Deserialize;
use serde_with::{NoneAsEmptyString, serde_as};

use super::filter::{ROLES, STATES};
use super::password::hash_password;
use crate::entities::users;
use crate::errors::ApiError;
use crate::filtering::{ReferenceLookup, ReferenceTable};
use crate::validation::{ValidationError, ValidationErrors, validators};

const MAX_NAME_LENGTH: usize = 255;

/// Submitted user form. Blank optional strings arrive as `None`.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde_as(as = "NoneAsEmptyString")]
    pub password: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    pub role: Option<String>,
    pub state: String,
    pub bio: String,
    #[serde_as(as = "NoneAsEmptyString")]
    pub twitter: Option<String>,
    pub profession_id: Option<i32>,
    pub skills: Vec<i32>,
}

/// Whether the form creates a user or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update { user_id: i32 },
}

/// Form data that passed every rule, ready to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Present on create; on update only when a new password was given
    pub password_hash: Option<String>,
    pub role: String,
    pub active: bool,
    pub bio: String,
    pub twitter: Option<String>,
    pub profession_id: Option<i32>,
    pub skills: Vec<i32>,
}

impl UserForm {
    /// Check every field, reporting all failures at once.
    ///
    /// Runs before anything is written, so a rejected form leaves the database untouched.
    pub async fn validate<C>(&self, db: &C, mode: FormMode) -> Result<ValidatedUser, ApiError>
    where
        C: ConnectionTrait + ReferenceLookup,
    {
        let mut errors = ValidationErrors::new();

        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        let email = self.email.trim();
        let bio = self.bio.trim();

        errors.check(
            validators::validate_required("first_name", first_name)
                .and_then(|()| validators::validate_max_length("first_name", first_name, MAX_NAME_LENGTH)),
        );
        errors.check(
            validators::validate_required("last_name", last_name)
                .and_then(|()| validators::validate_max_length("last_name", last_name, MAX_NAME_LENGTH)),
        );

        match validators::validate_required("email", email)
            .and_then(|()| validators::validate_email("email", email))
        {
            Ok(()) => {
                if email_taken(db, email, mode).await? {
                    errors.add(ValidationError::new("email", "The email has already been taken."));
                }
            }
            Err(error) => errors.add(error),
        }

        let password = self.password.as_deref().filter(|p| !p.is_empty());
        if mode == FormMode::Create {
            errors.check(validators::validate_required("password", password.unwrap_or_default()));
        }

        let role = self.role.as_deref().map_or("user", str::trim);
        errors.check(validators::validate_one_of("role", role, ROLES));

        let state = self.state.trim();
        errors.check(
            validators::validate_required("state", state)
                .and_then(|()| validators::validate_one_of("state", state, STATES)),
        );

        errors.check(validators::validate_required("bio", bio));

        let twitter = self
            .twitter
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if let Some(url) = twitter {
            errors.check(validators::validate_url("twitter", url));
        }

        if let Some(profession_id) = self.profession_id {
            let found = db
                .existing_ids(ReferenceTable::PROFESSIONS, &[profession_id])
                .await?;
            if !found.contains(&profession_id) {
                errors.add(ValidationError::new(
                    "profession_id",
                    "The selected profession id is invalid.",
                ));
            }
        }

        let mut skills: Vec<i32> = Vec::with_capacity(self.skills.len());
        for id in &self.skills {
            if !skills.contains(id) {
                skills.push(*id);
            }
        }
        if !skills.is_empty() {
            let found = db.existing_ids(ReferenceTable::SKILLS, &skills).await?;
            if skills.iter().any(|id| !found.contains(id)) {
                errors.add(ValidationError::new("skills", "The selected skills is invalid."));
            }
        }

        errors.result()?;

        Ok(ValidatedUser {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password_hash: password.map(hash_password).transpose()?,
            role: role.to_string(),
            active: state == "active",
            bio: bio.to_string(),
            twitter: twitter.map(ToString::to_string),
            profession_id: self.profession_id,
            skills,
        })
    }
}

/// Trashed users keep their address reserved
async fn email_taken<C: ConnectionTrait>(db: &C, email: &str, mode: FormMode) -> Result<bool, ApiError> {
    let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
    if let FormMode::Update { user_id } = mode {
        query = query.filter(users::Column::Id.ne(user_id));
    }
    Ok(query.count(db).await? > 0)
}
