//! Artifacts recovered by a researcher

pub mod repository;
pub mod routes;

use serde::{Deserialize, Serialize};

use super::shared::{SortSafelist, Validator, MUST_BE_PROVIDED};

pub use repository::{ArtifactRepository, PgArtifactRepository};
pub use routes::artifacts_routes;

pub const SORT_SAFELIST: SortSafelist = SortSafelist::new(&[
    "artifact_id",
    "title",
    "age",
    "location",
    "researcher_id",
    "-artifact_id",
    "-title",
    "-age",
    "-location",
    "-researcher_id",
]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Artifact {
    #[sqlx(rename = "artifact_id")]
    pub id: i64,
    pub title: String,
    /// Estimated age in years
    pub age: i32,
    pub location: String,
    pub researcher_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactInput {
    pub title: String,
    pub age: i32,
    pub location: String,
    pub researcher_id: i64,
}

impl ArtifactInput {
    pub fn into_artifact(self, id: i64) -> Artifact {
        Artifact {
            id,
            title: self.title,
            age: self.age,
            location: self.location,
            researcher_id: self.researcher_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactFilter {
    pub title: String,
    pub location: String,
    pub age: Option<i32>,
}

pub fn validate_artifact(v: &mut Validator, input: &ArtifactInput) {
    v.check(!input.title.is_empty(), "title", MUST_BE_PROVIDED);
    v.check(input.title.len() <= 500, "title", "must not be more than 500 bytes long");
    v.check(input.age > 0, "age", "must be greater than 0");
    v.check(!input.location.is_empty(), "location", MUST_BE_PROVIDED);
    v.check(input.researcher_id > 0, "researcher_id", "must be greater than 0");
}
