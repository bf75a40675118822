//! Expeditions led by a researcher

pub mod repository;
pub mod routes;

use serde::{Deserialize, Serialize};

use super::shared::{SortSafelist, Validator, MUST_BE_PROVIDED};

pub use repository::{ExpeditionRepository, PgExpeditionRepository};
pub use routes::expeditions_routes;

pub const SORT_SAFELIST: SortSafelist = SortSafelist::new(&[
    "expedition_id",
    "title",
    "expedition_year",
    "researcher_id",
    "-expedition_id",
    "-title",
    "-expedition_year",
    "-researcher_id",
]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Expedition {
    #[sqlx(rename = "expedition_id")]
    pub id: i64,
    pub title: String,
    #[serde(rename = "expeditionYear")]
    pub expedition_year: i32,
    pub researcher_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpeditionInput {
    pub title: String,
    #[serde(rename = "expeditionYear")]
    pub expedition_year: i32,
    pub researcher_id: i64,
}

impl ExpeditionInput {
    pub fn into_expedition(self, id: i64) -> Expedition {
        Expedition {
            id,
            title: self.title,
            expedition_year: self.expedition_year,
            researcher_id: self.researcher_id,
        }
    }
}

/// List filters; `None` leaves the year unconstrained
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpeditionFilter {
    pub title: String,
    pub expedition_year: Option<i32>,
}

pub fn validate_expedition(v: &mut Validator, input: &ExpeditionInput) {
    v.check(!input.title.is_empty(), "title", MUST_BE_PROVIDED);
    v.check(input.title.len() <= 500, "title", "must not be more than 500 bytes long");
    v.check(input.expedition_year > 0, "expeditionYear", "must be greater than 0");
    v.check(input.researcher_id > 0, "researcher_id", "must be greater than 0");
}
