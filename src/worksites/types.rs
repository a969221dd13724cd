use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::shared::schema::worksites;
use crate::core::shared::validation::{date_order, non_blank, non_negative, one_of, required_text};
use crate::core::storage::{Record, ValidationError};

pub const WORKSITE_STATUSES: &[&str] = &["planifie", "en_cours", "suspendu", "termine", "annule"];
pub const DEFAULT_WORKSITE_STATUS: &str = "planifie";
pub const ACTIVE_WORKSITE_STATUS: &str = "en_cours";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = worksites)]
#[diesel(treat_none_as_null = true)]
pub struct Worksite {
    pub id: Uuid,
    #[serde(rename = "nom")]
    pub name: String,
    pub description: Option<String>,
    pub client_id: String,
    #[serde(rename = "date_debut")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "date_fin")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "statut")]
    pub status: String,
    pub budget: Option<f64>,
    #[serde(rename = "adresse")]
    pub address: Option<String>,
    #[serde(rename = "date_creation")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "date_modification")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorksiteInput {
    #[serde(rename = "nom", alias = "name")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "clientId")]
    pub client_id: Option<String>,
    #[serde(rename = "date_debut", alias = "start_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "date_fin", alias = "end_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "statut", alias = "status")]
    pub status: Option<String>,
    pub budget: Option<f64>,
    #[serde(rename = "adresse", alias = "address")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorksiteFilter {
    #[serde(rename = "statut", alias = "status")]
    pub status: Option<String>,
    #[serde(rename = "clientId", alias = "client_id")]
    pub client_id: Option<String>,
}

impl Worksite {
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_WORKSITE_STATUS
    }

    fn validate(&self) -> Result<(), ValidationError> {
        one_of(&self.status, WORKSITE_STATUSES, "statut")?;
        date_order(self.start_date, self.end_date)?;
        non_negative(self.budget, "budget")
    }
}

impl Record for Worksite {
    type Input = WorksiteInput;
    type Filter = WorksiteFilter;

    const LABEL: &'static str = "Chantier";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(id: Uuid, input: WorksiteInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let worksite = Self {
            id,
            name: required_text(input.name, "nom")?,
            description: input.description,
            client_id: required_text(input.client_id, "client_id")?,
            start_date: input.start_date,
            end_date: input.end_date,
            status: input
                .status
                .unwrap_or_else(|| DEFAULT_WORKSITE_STATUS.to_string()),
            budget: input.budget,
            address: input.address,
            created_at: now,
            updated_at: now,
        };
        worksite.validate()?;
        Ok(worksite)
    }

    fn apply(&mut self, input: WorksiteInput, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = input.name {
            self.name = non_blank(name, "nom")?;
        }
        if let Some(client_id) = input.client_id {
            self.client_id = non_blank(client_id, "client_id")?;
        }
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(start_date) = input.start_date {
            self.start_date = Some(start_date);
        }
        if let Some(end_date) = input.end_date {
            self.end_date = Some(end_date);
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(budget) = input.budget {
            self.budget = Some(budget);
        }
        if let Some(address) = input.address {
            self.address = Some(address);
        }
        self.validate()?;
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &WorksiteFilter) -> bool {
        filter.status.as_ref().map_or(true, |s| &self.status == s)
            && filter.client_id.as_ref().map_or(true, |c| &self.client_id == c)
    }
}
