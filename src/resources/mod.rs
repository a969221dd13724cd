//! Resources (ressources): people, vehicles and equipment assignable to tasks.

use axum::Router;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::crud::crud_routes;
use crate::core::shared::schema::resources;
use crate::core::shared::state::AppState;
use crate::core::shared::validation::{non_blank, non_negative, one_of, required_text};
use crate::core::storage::{PgStore, Record, Repository, StoreError, ValidationError};
use crate::core::urls::ApiUrls;

pub const RESOURCE_KINDS: &[&str] = &["personne", "vehicule", "materiel"];
pub const RESOURCE_STATUSES: &[&str] = &["disponible", "en_service", "maintenance", "hors_service"];
pub const DEFAULT_RESOURCE_STATUS: &str = "disponible";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = resources)]
#[diesel(treat_none_as_null = true)]
pub struct Resource {
    pub id: Uuid,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "disponible")]
    pub available: bool,
    #[serde(rename = "cout")]
    pub cost: Option<f64>,
    #[serde(rename = "localisation")]
    pub location: Option<String>,
    #[serde(rename = "statut")]
    pub status: String,
    #[serde(rename = "date_creation")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "date_modification")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceInput {
    #[serde(rename = "nom", alias = "name")]
    pub name: Option<String>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: Option<String>,
    #[serde(rename = "disponible", alias = "available")]
    pub available: Option<bool>,
    #[serde(rename = "cout", alias = "cost")]
    pub cost: Option<f64>,
    #[serde(rename = "localisation", alias = "location")]
    pub location: Option<String>,
    #[serde(rename = "statut", alias = "status")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceFilter {
    #[serde(rename = "type", alias = "kind")]
    pub kind: Option<String>,
    #[serde(rename = "statut", alias = "status")]
    pub status: Option<String>,
    #[serde(rename = "disponible", alias = "available")]
    pub available: Option<bool>,
}

impl Resource {
    fn validate(&self) -> Result<(), ValidationError> {
        one_of(&self.kind, RESOURCE_KINDS, "type")?;
        one_of(&self.status, RESOURCE_STATUSES, "statut")?;
        non_negative(self.cost, "cout")
    }
}

impl Record for Resource {
    type Input = ResourceInput;
    type Filter = ResourceFilter;

    const LABEL: &'static str = "Ressource";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(id: Uuid, input: ResourceInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let resource = Self {
            id,
            name: required_text(input.name, "nom")?,
            kind: required_text(input.kind, "type")?,
            available: input.available.unwrap_or(true),
            cost: input.cost,
            location: input.location,
            status: input
                .status
                .unwrap_or_else(|| DEFAULT_RESOURCE_STATUS.to_string()),
            created_at: now,
            updated_at: now,
        };
        resource.validate()?;
        Ok(resource)
    }

    fn apply(&mut self, input: ResourceInput, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = input.name {
            self.name = non_blank(name, "nom")?;
        }
        if let Some(kind) = input.kind {
            self.kind = kind;
        }
        if let Some(available) = input.available {
            self.available = available;
        }
        if let Some(cost) = input.cost {
            self.cost = Some(cost);
        }
        if let Some(location) = input.location {
            self.location = Some(location);
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        self.validate()?;
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &ResourceFilter) -> bool {
        filter.kind.as_ref().map_or(true, |k| &self.kind == k)
            && filter.status.as_ref().map_or(true, |s| &self.status == s)
            && filter.available.map_or(true, |a| self.available == a)
    }
}

impl Repository<Resource> for PgStore {
    fn list(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, StoreError> {
        self.with_conn(|conn| {
            let mut query = resources::table.into_boxed();
            if let Some(kind) = &filter.kind {
                query = query.filter(resources::kind.eq(kind));
            }
            if let Some(status) = &filter.status {
                query = query.filter(resources::status.eq(status));
            }
            if let Some(available) = filter.available {
                query = query.filter(resources::available.eq(available));
            }
            Ok(query.order(resources::created_at.desc()).load(conn)?)
        })
    }

    fn get(&self, id: Uuid) -> Result<Option<Resource>, StoreError> {
        self.with_conn(|conn| Ok(resources::table.find(id).first(conn).optional()?))
    }

    fn insert(&self, record: Resource) -> Result<Resource, StoreError> {
        self.with_conn(|conn| {
            Ok(diesel::insert_into(resources::table)
                .values(&record)
                .get_result(conn)?)
        })
    }

    fn update(
        &self,
        id: Uuid,
        input: ResourceInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Resource>, StoreError> {
        self.transaction(|conn| {
            let Some(mut resource) = resources::table
                .find(id)
                .for_update()
                .first::<Resource>(conn)
                .optional()?
            else {
                return Ok(None);
            };
            resource.apply(input, now)?;
            let saved = diesel::update(resources::table.find(id))
                .set(&resource)
                .get_result(conn)?;
            Ok(Some(saved))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| Ok(diesel::delete(resources::table.find(id)).execute(conn)? > 0))
    }
}

pub fn configure_resource_routes() -> Router<Arc<AppState>> {
    crud_routes::<Resource>(ApiUrls::RESOURCES, ApiUrls::RESOURCE_BY_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, kind: &str) -> ResourceInput {
        ResourceInput {
            name: Some(name.to_string()),
            kind: Some(kind.to_string()),
            ..ResourceInput::default()
        }
    }

    #[test]
    fn test_kind_is_required_and_checked() {
        let now = Utc::now();
        let missing = ResourceInput {
            name: Some("Grue".to_string()),
            ..ResourceInput::default()
        };
        assert!(Resource::create(Uuid::new_v4(), missing, now).is_err());
        assert!(Resource::create(Uuid::new_v4(), input("Grue", "engin"), now).is_err());

        let crane = Resource::create(Uuid::new_v4(), input("Grue", "materiel"), now).unwrap();
        assert!(crane.available);
        assert_eq!(crane.status, DEFAULT_RESOURCE_STATUS);
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut van = Resource::create(Uuid::new_v4(), input("Fourgon", "vehicule"), Utc::now())
            .unwrap();
        let result = van.apply(
            ResourceInput {
                cost: Some(-10.0),
                ..ResourceInput::default()
            },
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_type_filter_reads_type_key() {
        let filter: ResourceFilter =
            serde_json::from_value(serde_json::json!({"type": "vehicule", "disponible": true}))
                .unwrap();
        let van = Resource::create(Uuid::new_v4(), input("Fourgon", "vehicule"), Utc::now())
            .unwrap();
        assert!(van.matches(&filter));
    }
}
