//! Researchers
//!
//! People who lead expeditions and recover artifacts. Deleting a researcher
//! removes their expeditions and artifacts with them.

pub mod repository;
pub mod routes;

use serde::{Deserialize, Serialize};

use super::shared::{SortSafelist, Validator, MUST_BE_PROVIDED};

pub use repository::{PgResearcherRepository, ResearcherRepository};
pub use routes::researchers_routes;

pub const SORT_SAFELIST: SortSafelist = SortSafelist::new(&[
    "researcher_id",
    "name",
    "specialization",
    "project",
    "-researcher_id",
    "-name",
    "-specialization",
    "-project",
]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Researcher {
    #[sqlx(rename = "researcher_id")]
    pub id: i64,
    pub name: String,
    pub specialization: String,
    pub project: String,
}

/// Body of create and update requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResearcherInput {
    pub name: String,
    pub specialization: String,
    pub project: String,
}

impl ResearcherInput {
    pub fn into_researcher(self, id: i64) -> Researcher {
        Researcher {
            id,
            name: self.name,
            specialization: self.specialization,
            project: self.project,
        }
    }
}

/// List filters; empty strings match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResearcherFilter {
    pub name: String,
    pub specialization: String,
}

pub fn validate_researcher(v: &mut Validator, input: &ResearcherInput) {
    v.check(!input.name.is_empty(), "name", MUST_BE_PROVIDED);
    v.check(input.name.len() <= 500, "name", "must not be more than 500 bytes long");
    v.check(!input.project.is_empty(), "project", MUST_BE_PROVIDED);
}
