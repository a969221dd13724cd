//! Tags: coloured labels.

use axum::Router;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::crud::crud_routes;
use crate::core::shared::schema::tags;
use crate::core::shared::state::AppState;
use crate::core::shared::validation::{hex_color, non_blank, required_text};
use crate::core::storage::{PgStore, Record, Repository, StoreError, ValidationError};
use crate::core::urls::ApiUrls;

pub const DEFAULT_COLOR: &str = "#3b82f6";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = tags)]
pub struct Tag {
    pub id: Uuid,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "couleur")]
    pub color: String,
    #[serde(rename = "date_creation")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "date_modification")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagInput {
    #[serde(rename = "nom", alias = "name")]
    pub name: Option<String>,
    #[serde(rename = "couleur", alias = "color")]
    pub color: Option<String>,
}

/// Tags are listed unfiltered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagFilter {}

impl Record for Tag {
    type Input = TagInput;
    type Filter = TagFilter;

    const LABEL: &'static str = "Tag";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(id: Uuid, input: TagInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let color = input.color.unwrap_or_else(|| DEFAULT_COLOR.to_string());
        hex_color(&color)?;
        Ok(Self {
            id,
            name: required_text(input.name, "nom")?,
            color,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, input: TagInput, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = input.name {
            self.name = non_blank(name, "nom")?;
        }
        if let Some(color) = input.color {
            hex_color(&color)?;
            self.color = color;
        }
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, _filter: &TagFilter) -> bool {
        true
    }
}

impl Repository<Tag> for PgStore {
    fn list(&self, _filter: &TagFilter) -> Result<Vec<Tag>, StoreError> {
        self.with_conn(|conn| Ok(tags::table.order(tags::created_at.desc()).load(conn)?))
    }

    fn get(&self, id: Uuid) -> Result<Option<Tag>, StoreError> {
        self.with_conn(|conn| Ok(tags::table.find(id).first(conn).optional()?))
    }

    fn insert(&self, record: Tag) -> Result<Tag, StoreError> {
        self.with_conn(|conn| {
            Ok(diesel::insert_into(tags::table)
                .values(&record)
                .get_result(conn)?)
        })
    }

    fn update(&self, id: Uuid, input: TagInput, now: DateTime<Utc>) -> Result<Option<Tag>, StoreError> {
        self.transaction(|conn| {
            let Some(mut tag) = tags::table
                .find(id)
                .for_update()
                .first::<Tag>(conn)
                .optional()?
            else {
                return Ok(None);
            };
            tag.apply(input, now)?;
            let saved = diesel::update(tags::table.find(id))
                .set(&tag)
                .get_result(conn)?;
            Ok(Some(saved))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| Ok(diesel::delete(tags::table.find(id)).execute(conn)? > 0))
    }
}

pub fn configure_tag_routes() -> Router<Arc<AppState>> {
    crud_routes::<Tag>(ApiUrls::TAGS, ApiUrls::TAG_BY_ID)
}
