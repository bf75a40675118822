//! In-memory repositories mirroring the PostgreSQL behavior the handlers
//! rely on: foreign keys, cascades, unique emails, optimistic locking and
//! windowed counts.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use museum_common::secret::hash_token;
use museum_server::db::{DbError, DbResult};
use museum_server::features::artifacts::{
    Artifact, ArtifactFilter, ArtifactInput, ArtifactRepository,
};
use museum_server::features::expeditions::{
    Expedition, ExpeditionFilter, ExpeditionInput, ExpeditionRepository,
};
use museum_server::features::permissions::{PermissionRepository, Permissions};
use museum_server::features::researchers::{
    Researcher, ResearcherFilter, ResearcherInput, ResearcherRepository,
};
use museum_server::features::shared::{Filters, Paginated, SortDirection};
use museum_server::features::tokens::{Token, TokenRepository, TokenScope};
use museum_server::features::users::{NewUser, User, UserRepository};

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_token_writes: AtomicBool,
}

/// Multi-step writes run against a clone and are swapped in only on success
#[derive(Default, Clone)]
struct Tables {
    next_id: i64,
    researchers: BTreeMap<i64, Researcher>,
    expeditions: BTreeMap<i64, Expedition>,
    artifacts: BTreeMap<i64, Artifact>,
    users: BTreeMap<i64, User>,
    tokens: Vec<Token>,
    permissions: HashMap<i64, Vec<String>>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_researcher(&self, id: i64) -> DbResult<()> {
        if self.researchers.contains_key(&id) {
            Ok(())
        } else {
            Err(DbError::InvalidReference("researcher_id"))
        }
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        let email = email.to_lowercase();
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.to_lowercase() == email)
    }

    fn insert_user(&mut self, user: &NewUser) -> DbResult<User> {
        if self.email_taken(&user.email, None) {
            return Err(DbError::duplicate("User", &user.email));
        }
        let id = self.next_id();
        let created = User {
            id,
            created_at: Utc::now(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            activated: false,
            version: 1,
        };
        self.users.insert(id, created.clone());
        Ok(created)
    }

    fn update_user(&mut self, user: &User) -> DbResult<User> {
        if self.email_taken(&user.email, Some(user.id)) {
            return Err(DbError::duplicate("User", &user.email));
        }
        let slot = match self.users.get_mut(&user.id) {
            Some(slot) if slot.version == user.version => slot,
            _ => return Err(DbError::EditConflict),
        };
        *slot = User {
            version: user.version + 1,
            ..user.clone()
        };
        Ok(slot.clone())
    }

    fn grant(&mut self, user_id: i64, codes: &[&str]) {
        let held = self.permissions.entry(user_id).or_default();
        for code in codes {
            if !held.iter().any(|c| c == code) {
                held.push(code.to_string());
            }
        }
    }

    fn delete_tokens(&mut self, scope: TokenScope, user_id: i64) {
        self.tokens
            .retain(|t| !(t.scope == scope && t.user_id == user_id));
    }
}

impl InMemoryStore {
    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn researcher_count(&self) -> usize {
        self.tables().researchers.len()
    }

    pub fn expedition_count(&self) -> usize {
        self.tables().expeditions.len()
    }

    pub fn artifact_count(&self) -> usize {
        self.tables().artifacts.len()
    }

    pub fn user_count(&self) -> usize {
        self.tables().users.len()
    }

    /// Make every token write fail as a timed-out query would
    pub fn fail_token_writes(&self, fail: bool) {
        self.fail_token_writes.store(fail, AtomicOrdering::SeqCst);
    }

    fn store_token(&self, tables: &mut Tables, token: &Token) -> DbResult<()> {
        if self.fail_token_writes.load(AtomicOrdering::SeqCst) {
            return Err(DbError::Timeout(Duration::from_secs(3)));
        }
        tables.tokens.push(token.clone());
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Int(i64),
    Text(String),
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Every query word appears in `field`; an empty query matches all
fn text_matches(field: &str, query: &str) -> bool {
    let field = words(field);
    words(query).iter().all(|w| field.contains(w))
}

fn paginate<T>(
    mut rows: Vec<T>,
    filters: &Filters,
    key: impl Fn(&T, &str) -> SortKey,
    id: impl Fn(&T) -> i64,
) -> Paginated<T> {
    let column = filters.sort_column();
    let direction = filters.sort_direction();
    rows.sort_by(|a, b| {
        let ord = key(a, column).cmp(&key(b, column));
        let ord = match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        match ord {
            Ordering::Equal => id(a).cmp(&id(b)),
            other => other,
        }
    });

    let total = rows.len() as i64;
    let page = rows
        .into_iter()
        .skip(filters.offset() as usize)
        .take(filters.limit() as usize)
        .map(|row| (total, row))
        .collect();
    Paginated::from_counted_rows(page, filters)
}

fn researcher_key(r: &Researcher, column: &str) -> SortKey {
    match column {
        "name" => SortKey::Text(r.name.clone()),
        "specialization" => SortKey::Text(r.specialization.clone()),
        "project" => SortKey::Text(r.project.clone()),
        _ => SortKey::Int(r.id),
    }
}

fn expedition_key(e: &Expedition, column: &str) -> SortKey {
    match column {
        "title" => SortKey::Text(e.title.clone()),
        "expedition_year" => SortKey::Int(e.expedition_year.into()),
        "researcher_id" => SortKey::Int(e.researcher_id),
        _ => SortKey::Int(e.id),
    }
}

fn artifact_key(a: &Artifact, column: &str) -> SortKey {
    match column {
        "title" => SortKey::Text(a.title.clone()),
        "age" => SortKey::Int(a.age.into()),
        "location" => SortKey::Text(a.location.clone()),
        "researcher_id" => SortKey::Int(a.researcher_id),
        _ => SortKey::Int(a.id),
    }
}

#[async_trait]
impl ResearcherRepository for InMemoryStore {
    async fn insert(&self, input: &ResearcherInput) -> DbResult<Researcher> {
        let mut tables = self.tables();
        let id = tables.next_id();
        let researcher = input.clone().into_researcher(id);
        tables.researchers.insert(id, researcher.clone());
        Ok(researcher)
    }

    async fn get(&self, id: i64) -> DbResult<Researcher> {
        self.tables()
            .researchers
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::not_found("Researcher", id))
    }

    async fn update(&self, researcher: &Researcher) -> DbResult<Researcher> {
        let mut tables = self.tables();
        let slot = tables
            .researchers
            .get_mut(&researcher.id)
            .ok_or_else(|| DbError::not_found("Researcher", researcher.id))?;
        *slot = researcher.clone();
        Ok(researcher.clone())
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tables = self.tables();
        tables
            .researchers
            .remove(&id)
            .ok_or_else(|| DbError::not_found("Researcher", id))?;
        tables.expeditions.retain(|_, e| e.researcher_id != id);
        tables.artifacts.retain(|_, a| a.researcher_id != id);
        Ok(())
    }

    async fn get_all(
        &self,
        filter: &ResearcherFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Researcher>> {
        let rows = self
            .tables()
            .researchers
            .values()
            .filter(|r| text_matches(&r.name, &filter.name))
            .filter(|r| text_matches(&r.specialization, &filter.specialization))
            .cloned()
            .collect();
        Ok(paginate(rows, filters, researcher_key, |r| r.id))
    }
}

impl InMemoryStore {
    fn list_expeditions(
        &self,
        researcher_id: Option<i64>,
        filter: &ExpeditionFilter,
        filters: &Filters,
    ) -> Paginated<Expedition> {
        let rows = self
            .tables()
            .expeditions
            .values()
            .filter(|e| researcher_id.map_or(true, |id| e.researcher_id == id))
            .filter(|e| text_matches(&e.title, &filter.title))
            .filter(|e| filter.expedition_year.map_or(true, |y| e.expedition_year == y))
            .cloned()
            .collect();
        paginate(rows, filters, expedition_key, |e| e.id)
    }

    fn list_artifacts(
        &self,
        researcher_id: Option<i64>,
        filter: &ArtifactFilter,
        filters: &Filters,
    ) -> Paginated<Artifact> {
        let rows = self
            .tables()
            .artifacts
            .values()
            .filter(|a| researcher_id.map_or(true, |id| a.researcher_id == id))
            .filter(|a| text_matches(&a.title, &filter.title))
            .filter(|a| text_matches(&a.location, &filter.location))
            .filter(|a| filter.age.map_or(true, |age| a.age == age))
            .cloned()
            .collect();
        paginate(rows, filters, artifact_key, |a| a.id)
    }
}

#[async_trait]
impl ExpeditionRepository for InMemoryStore {
    async fn insert(&self, input: &ExpeditionInput) -> DbResult<Expedition> {
        let mut tables = self.tables();
        tables.check_researcher(input.researcher_id)?;
        let id = tables.next_id();
        let expedition = input.clone().into_expedition(id);
        tables.expeditions.insert(id, expedition.clone());
        Ok(expedition)
    }

    async fn get(&self, id: i64) -> DbResult<Expedition> {
        self.tables()
            .expeditions
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::not_found("Expedition", id))
    }

    async fn update(&self, expedition: &Expedition) -> DbResult<Expedition> {
        let mut tables = self.tables();
        tables.check_researcher(expedition.researcher_id)?;
        let slot = tables
            .expeditions
            .get_mut(&expedition.id)
            .ok_or_else(|| DbError::not_found("Expedition", expedition.id))?;
        *slot = expedition.clone();
        Ok(expedition.clone())
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        self.tables()
            .expeditions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("Expedition", id))
    }

    async fn get_all(
        &self,
        filter: &ExpeditionFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Expedition>> {
        Ok(self.list_expeditions(None, filter, filters))
    }

    async fn get_all_for_researcher(
        &self,
        researcher_id: i64,
        filter: &ExpeditionFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Expedition>> {
        Ok(self.list_expeditions(Some(researcher_id), filter, filters))
    }
}

#[async_trait]
impl ArtifactRepository for InMemoryStore {
    async fn insert(&self, input: &ArtifactInput) -> DbResult<Artifact> {
        let mut tables = self.tables();
        tables.check_researcher(input.researcher_id)?;
        let id = tables.next_id();
        let artifact = input.clone().into_artifact(id);
        tables.artifacts.insert(id, artifact.clone());
        Ok(artifact)
    }

    async fn get(&self, id: i64) -> DbResult<Artifact> {
        self.tables()
            .artifacts
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::not_found("Artifact", id))
    }

    async fn update(&self, artifact: &Artifact) -> DbResult<Artifact> {
        let mut tables = self.tables();
        tables.check_researcher(artifact.researcher_id)?;
        let slot = tables
            .artifacts
            .get_mut(&artifact.id)
            .ok_or_else(|| DbError::not_found("Artifact", artifact.id))?;
        *slot = artifact.clone();
        Ok(artifact.clone())
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        self.tables()
            .artifacts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("Artifact", id))
    }

    async fn get_all(
        &self,
        filter: &ArtifactFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Artifact>> {
        Ok(self.list_artifacts(None, filter, filters))
    }

    async fn get_all_for_researcher(
        &self,
        researcher_id: i64,
        filter: &ArtifactFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Artifact>> {
        Ok(self.list_artifacts(Some(researcher_id), filter, filters))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &NewUser) -> DbResult<User> {
        self.tables().insert_user(user)
    }

    async fn get_by_email(&self, email: &str) -> DbResult<User> {
        let email_lower = email.to_lowercase();
        self.tables()
            .users
            .values()
            .find(|u| u.email.to_lowercase() == email_lower)
            .cloned()
            .ok_or_else(|| DbError::not_found("User", email))
    }

    async fn update(&self, user: &User) -> DbResult<User> {
        self.tables().update_user(user)
    }

    async fn get_for_token(&self, scope: TokenScope, plaintext: &str) -> DbResult<User> {
        let tables = self.tables();
        let hash = hash_token(plaintext);
        let now = Utc::now();
        tables
            .tokens
            .iter()
            .find(|t| t.hash == hash && t.scope == scope && t.expiry > now)
            .and_then(|t| tables.users.get(&t.user_id))
            .cloned()
            .ok_or_else(|| DbError::NotFound("no user for token".to_string()))
    }

    async fn register(&self, user: &NewUser, permissions: &[&str]) -> DbResult<(User, Token)> {
        let mut tables = self.tables();
        let mut staged = tables.clone();

        let created = staged.insert_user(user)?;
        staged.grant(created.id, permissions);
        let scope = TokenScope::Activation;
        let token = Token::generate(created.id, scope.ttl(), scope);
        self.store_token(&mut staged, &token)?;

        *tables = staged;
        Ok((created, token))
    }

    async fn activate(&self, user: &User) -> DbResult<User> {
        let mut tables = self.tables();
        let mut staged = tables.clone();

        let activated = staged.update_user(&User {
            activated: true,
            ..user.clone()
        })?;
        staged.delete_tokens(TokenScope::Activation, activated.id);

        *tables = staged;
        Ok(activated)
    }
}

#[async_trait]
impl TokenRepository for InMemoryStore {
    async fn insert(&self, token: &Token) -> DbResult<()> {
        let mut tables = self.tables();
        self.store_token(&mut tables, token)
    }

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> DbResult<()> {
        self.tables().delete_tokens(scope, user_id);
        Ok(())
    }
}

#[async_trait]
impl PermissionRepository for InMemoryStore {
    async fn get_all_for_user(&self, user_id: i64) -> DbResult<Permissions> {
        let codes = self
            .tables()
            .permissions
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        Ok(Permissions::from(codes))
    }

    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> DbResult<()> {
        self.tables().grant(user_id, codes);
        Ok(())
    }
}
