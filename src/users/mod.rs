//! Users (utilisateurs): the people on the board, with role, team and skills.

use axum::Router;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::crud::crud_routes;
use crate::core::shared::schema::users;
use crate::core::shared::state::AppState;
use crate::core::shared::validation::{self, non_blank, one_of, required_text};
use crate::core::storage::postgres::unique_violation;
use crate::core::storage::{PgStore, Record, Repository, StoreError, ValidationError};
use crate::core::urls::ApiUrls;

pub const USER_ROLES: &[&str] = &["admin", "chef_chantier", "chef_equipe", "ouvrier", "planificateur"];
pub const DEFAULT_USER_ROLE: &str = "ouvrier";

const DUPLICATE_EMAIL: &str = "Un utilisateur avec cet email existe déjà";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub struct User {
    pub id: Uuid,
    #[serde(rename = "nom")]
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "equipe_id")]
    pub team_id: Option<Uuid>,
    #[serde(rename = "competences")]
    pub skills: Vec<String>,
    #[serde(rename = "disponible")]
    pub available: bool,
    #[serde(rename = "date_creation")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "date_modification")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    #[serde(rename = "nom", alias = "name")]
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    #[serde(rename = "equipe_id", alias = "team_id")]
    pub team_id: Option<Uuid>,
    #[serde(rename = "competences", alias = "skills")]
    pub skills: Option<Vec<String>>,
    #[serde(rename = "disponible", alias = "available")]
    pub available: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<String>,
    #[serde(rename = "equipeId", alias = "equipe_id")]
    pub team_id: Option<Uuid>,
    #[serde(rename = "disponible", alias = "available")]
    pub available: Option<bool>,
}

impl User {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::email(&self.email)?;
        one_of(&self.role, USER_ROLES, "role")
    }
}

impl Record for User {
    type Input = UserInput;
    type Filter = UserFilter;

    const LABEL: &'static str = "Utilisateur";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(id: Uuid, input: UserInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let user = Self {
            id,
            name: required_text(input.name, "nom")?,
            email: required_text(input.email, "email")?,
            role: input.role.unwrap_or_else(|| DEFAULT_USER_ROLE.to_string()),
            team_id: input.team_id,
            skills: input.skills.unwrap_or_default(),
            available: input.available.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        user.validate()?;
        Ok(user)
    }

    fn apply(&mut self, input: UserInput, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = input.name {
            self.name = non_blank(name, "nom")?;
        }
        if let Some(email) = input.email {
            self.email = non_blank(email, "email")?;
        }
        if let Some(role) = input.role {
            self.role = role;
        }
        if let Some(team_id) = input.team_id {
            self.team_id = Some(team_id);
        }
        if let Some(skills) = input.skills {
            self.skills = skills;
        }
        if let Some(available) = input.available {
            self.available = available;
        }
        self.validate()?;
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &UserFilter) -> bool {
        filter.role.as_ref().map_or(true, |r| &self.role == r)
            && filter.team_id.map_or(true, |t| self.team_id == Some(t))
            && filter.available.map_or(true, |a| self.available == a)
    }

    fn conflicts_with(&self, other: &Self) -> Option<String> {
        // Same folding as the LOWER(email) unique index.
        (self.email.to_lowercase() == other.email.to_lowercase())
            .then(|| DUPLICATE_EMAIL.to_string())
    }
}

impl Repository<User> for PgStore {
    fn list(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        self.with_conn(|conn| {
            let mut query = users::table.into_boxed();
            if let Some(role) = &filter.role {
                query = query.filter(users::role.eq(role));
            }
            if let Some(team_id) = filter.team_id {
                query = query.filter(users::team_id.eq(team_id));
            }
            if let Some(available) = filter.available {
                query = query.filter(users::available.eq(available));
            }
            Ok(query.order(users::created_at.desc()).load(conn)?)
        })
    }

    fn get(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.with_conn(|conn| Ok(users::table.find(id).first(conn).optional()?))
    }

    fn insert(&self, record: User) -> Result<User, StoreError> {
        self.with_conn(|conn| {
            diesel::insert_into(users::table)
                .values(&record)
                .get_result(conn)
                .map_err(|e| unique_violation(e, DUPLICATE_EMAIL))
        })
    }

    fn update(
        &self,
        id: Uuid,
        input: UserInput,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        self.transaction(|conn| {
            let Some(mut user) = users::table
                .find(id)
                .for_update()
                .first::<User>(conn)
                .optional()?
            else {
                return Ok(None);
            };
            user.apply(input, now)?;
            let saved = diesel::update(users::table.find(id))
                .set(&user)
                .get_result(conn)
                .map_err(|e| unique_violation(e, DUPLICATE_EMAIL))?;
            Ok(Some(saved))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| Ok(diesel::delete(users::table.find(id)).execute(conn)? > 0))
    }
}

pub fn configure_user_routes() -> Router<Arc<AppState>> {
    crud_routes::<User>(ApiUrls::USERS, ApiUrls::USER_BY_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: &str) -> UserInput {
        UserInput {
            name: Some("Louise Martin".to_string()),
            email: Some(email.to_string()),
            ..UserInput::default()
        }
    }

    #[test]
    fn test_defaults_and_email_check() {
        let now = Utc::now();
        let user = User::create(Uuid::new_v4(), input("louise@btp.fr"), now).unwrap();
        assert_eq!(user.role, DEFAULT_USER_ROLE);
        assert!(user.available);
        assert!(User::create(Uuid::new_v4(), input("louise.btp.fr"), now).is_err());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = User::create(
            Uuid::new_v4(),
            UserInput {
                role: Some("stagiaire".to_string()),
                ..input("louise@btp.fr")
            },
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_email_conflict_ignores_case() {
        let now = Utc::now();
        let a = User::create(Uuid::new_v4(), input("louise@btp.fr"), now).unwrap();
        let b = User::create(Uuid::new_v4(), input("LOUISE@btp.fr"), now).unwrap();
        let c = User::create(Uuid::new_v4(), input("paul@btp.fr"), now).unwrap();
        assert!(a.conflicts_with(&b).is_some());
        assert!(a.conflicts_with(&c).is_none());
    }

    #[test]
    fn test_email_conflict_folds_accented_letters() {
        let now = Utc::now();
        let mut a = User::create(Uuid::new_v4(), input("elise@btp.fr"), now).unwrap();
        let mut b = User::create(Uuid::new_v4(), input("elise@btp.fr"), now).unwrap();
        a.email = "Élise@btp.fr".to_string();
        b.email = "élise@btp.fr".to_string();
        assert!(a.conflicts_with(&b).is_some());
    }
}
