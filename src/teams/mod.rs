//! Teams (équipes) of workers, with their leader and capacity.

use axum::Router;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::crud::crud_routes;
use crate::core::shared::schema::teams;
use crate::core::shared::state::AppState;
use crate::core::shared::validation::{non_blank, required_text};
use crate::core::storage::{PgStore, Record, Repository, StoreError, ValidationError};
use crate::core::urls::ApiUrls;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = teams)]
#[diesel(treat_none_as_null = true)]
pub struct Team {
    pub id: Uuid,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "membres")]
    pub members: Vec<Uuid>,
    #[serde(rename = "chef_id")]
    pub leader_id: Option<Uuid>,
    #[serde(rename = "specialite")]
    pub specialty: Option<String>,
    #[serde(rename = "capacite")]
    pub capacity: i32,
    #[serde(rename = "date_creation")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "date_modification")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamInput {
    #[serde(rename = "nom", alias = "name")]
    pub name: Option<String>,
    #[serde(rename = "membres", alias = "members")]
    pub members: Option<Vec<Uuid>>,
    #[serde(rename = "chef_id", alias = "leader_id")]
    pub leader_id: Option<Uuid>,
    #[serde(rename = "specialite", alias = "specialty")]
    pub specialty: Option<String>,
    #[serde(rename = "capacite", alias = "capacity")]
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamFilter {
    #[serde(rename = "specialite", alias = "specialty")]
    pub specialty: Option<String>,
}

impl Team {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.capacity < 0 {
            return Err(ValidationError::new("Le champ 'capacite' doit être positif"));
        }
        Ok(())
    }
}

impl Record for Team {
    type Input = TeamInput;
    type Filter = TeamFilter;

    const LABEL: &'static str = "Équipe";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(id: Uuid, input: TeamInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let team = Self {
            id,
            name: required_text(input.name, "nom")?,
            members: input.members.unwrap_or_default(),
            leader_id: input.leader_id,
            specialty: input.specialty,
            capacity: input.capacity.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        team.validate()?;
        Ok(team)
    }

    fn apply(&mut self, input: TeamInput, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = input.name {
            self.name = non_blank(name, "nom")?;
        }
        if let Some(members) = input.members {
            self.members = members;
        }
        if let Some(leader_id) = input.leader_id {
            self.leader_id = Some(leader_id);
        }
        if let Some(specialty) = input.specialty {
            self.specialty = Some(specialty);
        }
        if let Some(capacity) = input.capacity {
            self.capacity = capacity;
        }
        self.validate()?;
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &TeamFilter) -> bool {
        filter
            .specialty
            .as_ref()
            .map_or(true, |s| self.specialty.as_ref() == Some(s))
    }
}

impl Repository<Team> for PgStore {
    fn list(&self, filter: &TeamFilter) -> Result<Vec<Team>, StoreError> {
        self.with_conn(|conn| {
            let mut query = teams::table.into_boxed();
            if let Some(specialty) = &filter.specialty {
                query = query.filter(teams::specialty.eq(specialty));
            }
            Ok(query.order(teams::created_at.desc()).load(conn)?)
        })
    }

    fn get(&self, id: Uuid) -> Result<Option<Team>, StoreError> {
        self.with_conn(|conn| Ok(teams::table.find(id).first(conn).optional()?))
    }

    fn insert(&self, record: Team) -> Result<Team, StoreError> {
        self.with_conn(|conn| {
            Ok(diesel::insert_into(teams::table)
                .values(&record)
                .get_result(conn)?)
        })
    }

    fn update(
        &self,
        id: Uuid,
        input: TeamInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Team>, StoreError> {
        self.transaction(|conn| {
            let Some(mut team) = teams::table
                .find(id)
                .for_update()
                .first::<Team>(conn)
                .optional()?
            else {
                return Ok(None);
            };
            team.apply(input, now)?;
            let saved = diesel::update(teams::table.find(id))
                .set(&team)
                .get_result(conn)?;
            Ok(Some(saved))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| Ok(diesel::delete(teams::table.find(id)).execute(conn)? > 0))
    }
}

pub fn configure_team_routes() -> Router<Arc<AppState>> {
    crud_routes::<Team>(ApiUrls::TEAMS, ApiUrls::TEAM_BY_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_capacity_rejected() {
        let input = TeamInput {
            name: Some("Gros œuvre".to_string()),
            capacity: Some(-2),
            ..TeamInput::default()
        };
        assert!(Team::create(Uuid::new_v4(), input, Utc::now()).is_err());
    }

    #[test]
    fn test_specialty_filter() {
        let team = Team::create(
            Uuid::new_v4(),
            TeamInput {
                name: Some("Électriciens".to_string()),
                specialty: Some("electricite".to_string()),
                capacity: Some(4),
                ..TeamInput::default()
            },
            Utc::now(),
        )
        .unwrap();
        let filter = |s: &str| TeamFilter {
            specialty: Some(s.to_string()),
        };
        assert!(team.matches(&filter("electricite")));
        assert!(!team.matches(&filter("plomberie")));
        assert!(team.matches(&TeamFilter::default()));
    }
}
