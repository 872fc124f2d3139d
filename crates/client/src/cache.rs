//! Keyed query cache with stale times and mutation invalidation.
//!
//! Reads go through [`QueryClient`], which serves a cached value while it is
//! fresh and refetches once it goes stale. Every successful mutation
//! invalidates the incident list, the mutated incident and the stats, so the
//! next read reflects the change.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use dispatch_core::{
    is_permitted, AssignForm, BulkRequest, EscalationForm, Incident, IncidentAction, IncidentId,
    IncidentStats, IncidentUpdate, LoginForm, Organization, Station, Transition, User, UserId,
    ValidationErrors,
};

use crate::api::{BulkOutcome, IncidentApi, Session};
use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Incidents,
    Incident(IncidentId),
    Stats,
    Users,
    Stations,
    Organizations,
}

/// How long each kind of query stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleTimes {
    pub incidents: Duration,
    pub stats: Duration,
    /// Users, stations and organizations change rarely.
    pub directory: Duration,
}

impl Default for StaleTimes {
    fn default() -> Self {
        StaleTimes {
            incidents: Duration::from_secs(15),
            stats: Duration::from_secs(30),
            directory: Duration::from_secs(300),
        }
    }
}

impl StaleTimes {
    pub fn from_config(config: &ClientConfig) -> Self {
        StaleTimes {
            incidents: config.incidents_interval(),
            stats: config.stats_interval(),
            ..StaleTimes::default()
        }
    }

    fn for_key(&self, key: &QueryKey) -> Duration {
        match key {
            QueryKey::Incidents | QueryKey::Incident(_) => self.incidents,
            QueryKey::Stats => self.stats,
            QueryKey::Users | QueryKey::Stations | QueryKey::Organizations => self.directory,
        }
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

/// Snapshot of a key's invalidation count, taken before a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Generation {
    epoch: u64,
    key: u64,
}

#[derive(Default)]
struct Slots {
    entries: HashMap<QueryKey, Entry>,
    /// Bumped by every invalidation of the key.
    generations: HashMap<QueryKey, u64>,
    /// Bumped when whole groups of keys are dropped at once.
    epoch: u64,
}

impl Slots {
    fn generation(&self, key: &QueryKey) -> Generation {
        Generation {
            epoch: self.epoch,
            key: self.generations.get(key).copied().unwrap_or(0),
        }
    }

    fn remove(&mut self, key: &QueryKey) {
        self.entries.remove(key);
        *self.generations.entry(key.clone()).or_default() += 1;
    }
}

/// Type-erased store of fetched values.
///
/// A fetch that was already in flight when its key was invalidated does not
/// write its result back, so a read after a mutation never sees data from
/// before it.
pub struct QueryCache {
    slots: RwLock<Slots>,
    stale: StaleTimes,
}

impl QueryCache {
    pub fn new(stale: StaleTimes) -> Self {
        QueryCache {
            slots: RwLock::new(Slots::default()),
            stale,
        }
    }

    /// The cached value for `key` if it is still fresh.
    pub async fn fresh<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let slots = self.slots.read().await;
        let entry = slots.entries.get(key)?;
        if entry.fetched_at.elapsed() >= self.stale.for_key(key) {
            return None;
        }
        entry.value.clone().downcast::<T>().ok()
    }

    pub async fn put<T: Send + Sync + 'static>(&self, key: QueryKey, value: Arc<T>) {
        self.slots.write().await.entries.insert(
            key,
            Entry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Serve `key` from cache, or run `fetch` and store its result.
    /// Errors are never cached, nor are results that an invalidation
    /// overtook.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>, ClientError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if let Some(hit) = self.fresh::<T>(&key).await {
            tracing::trace!(?key, "cache hit");
            return Ok(hit);
        }
        let started = self.slots.read().await.generation(&key);
        tracing::debug!(?key, "fetching");
        let value = Arc::new(fetch().await?);

        let mut slots = self.slots.write().await;
        if slots.generation(&key) == started {
            slots.entries.insert(
                key,
                Entry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                },
            );
        } else {
            tracing::debug!(?key, "discarding result invalidated during fetch");
        }
        Ok(value)
    }

    pub async fn invalidate(&self, key: &QueryKey) {
        self.slots.write().await.remove(key);
    }

    /// Drop everything a change to `id` could have affected.
    pub async fn invalidate_incident(&self, id: Option<&IncidentId>) {
        let mut slots = self.slots.write().await;
        slots.remove(&QueryKey::Incidents);
        slots.remove(&QueryKey::Stats);
        match id {
            Some(id) => slots.remove(&QueryKey::Incident(id.clone())),
            None => {
                slots
                    .entries
                    .retain(|key, _| !matches!(key, QueryKey::Incident(_)));
                slots.epoch += 1;
            }
        }
    }

    pub async fn clear(&self) {
        let mut slots = self.slots.write().await;
        slots.entries.clear();
        slots.epoch += 1;
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.slots.read().await.entries.contains_key(key)
    }
}

// ── Query client ─────────────────────────────────────────────────────────────

/// An [`IncidentApi`] behind a [`QueryCache`].
pub struct QueryClient<A> {
    api: Arc<A>,
    cache: QueryCache,
}

impl<A: IncidentApi> QueryClient<A> {
    pub fn new(api: A, stale: StaleTimes) -> Self {
        QueryClient {
            api: Arc::new(api),
            cache: QueryCache::new(stale),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn login(&self, form: &LoginForm) -> Result<Session, ClientError> {
        form.validate()?;
        let session = self.api.login(form).await?;
        self.cache.clear().await;
        Ok(session)
    }

    // ── Reads ──

    pub async fn incidents(&self) -> Result<Arc<Vec<Incident>>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::Incidents, || self.api.list_incidents())
            .await
    }

    pub async fn incident(&self, id: &IncidentId) -> Result<Arc<Incident>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::Incident(id.clone()), || self.api.get_incident(id))
            .await
    }

    pub async fn stats(&self) -> Result<Arc<IncidentStats>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::Stats, || self.api.stats())
            .await
    }

    pub async fn users(&self) -> Result<Arc<Vec<User>>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::Users, || self.api.list_users())
            .await
    }

    pub async fn stations(&self) -> Result<Arc<Vec<Station>>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::Stations, || self.api.list_stations())
            .await
    }

    pub async fn organizations(&self) -> Result<Arc<Vec<Organization>>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::Organizations, || self.api.list_organizations())
            .await
    }

    /// Bypass freshness: drop the cached list and fetch it again.
    pub async fn refetch_incidents(&self) -> Result<Arc<Vec<Incident>>, ClientError> {
        self.cache.invalidate(&QueryKey::Incidents).await;
        self.incidents().await
    }

    pub async fn refetch_stats(&self) -> Result<Arc<IncidentStats>, ClientError> {
        self.cache.invalidate(&QueryKey::Stats).await;
        self.stats().await
    }

    /// Resolve the signed-in account from the user directory.
    pub async fn current_user(&self, id: &str) -> Result<User, ClientError> {
        let users = self.users().await?;
        users
            .iter()
            .find(|u| u.id.as_str() == id)
            .cloned()
            .ok_or_else(|| ClientError::Unauthorized {
                message: format!("user '{}' is not known to the backend", id),
            })
    }

    // ── Mutations ──

    /// Checked against `current` before sending.
    pub async fn update_incident(
        &self,
        current: &Incident,
        update: &IncidentUpdate,
    ) -> Result<Incident, ClientError> {
        update.validate(current)?;
        let updated = self.api.update_incident(&current.id, update).await?;
        self.cache.invalidate_incident(Some(&current.id)).await;
        Ok(updated)
    }

    pub async fn assign_incident(
        &self,
        id: &IncidentId,
        form: &AssignForm,
    ) -> Result<Incident, ClientError> {
        form.validate()?;
        let updated = self.api.assign_incident(id, form).await?;
        self.cache.invalidate_incident(Some(id)).await;
        Ok(updated)
    }

    pub async fn escalate_incident(
        &self,
        id: &IncidentId,
        form: &EscalationForm,
    ) -> Result<Incident, ClientError> {
        form.validate()?;
        let updated = self.api.escalate_incident(id, form).await?;
        self.cache.invalidate_incident(Some(id)).await;
        Ok(updated)
    }

    pub async fn bulk(&self, request: &BulkRequest) -> Result<BulkOutcome, ClientError> {
        request.validate()?;
        let outcome = self.api.bulk(request).await?;
        if request.action != dispatch_core::BulkAction::Export {
            self.cache.invalidate_incident(None).await;
        }
        Ok(outcome)
    }
}

// ── Menu actions ─────────────────────────────────────────────────────────────

/// Extra input some menu actions need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInput {
    /// Target of Assign Staff, Assign (org-wide) and Reassign.
    pub assignee: Option<UserId>,
    /// Escalation reason.
    pub reason: Option<String>,
}

impl<A: IncidentApi> QueryClient<A> {
    /// Carry out a menu action for `user`.
    ///
    /// The action must be on the user's menu for `current`; the menu is the
    /// gate, so status changes skip the advisory transition check (admins
    /// may resolve from any open status).
    pub async fn perform(
        &self,
        current: &Incident,
        user: &User,
        action: IncidentAction,
        input: ActionInput,
    ) -> Result<Incident, ClientError> {
        if !is_permitted(current, user, action) {
            return Err(ClientError::NotPermitted {
                action: action.label().to_string(),
                incident: current.display_id(),
            });
        }
        tracing::info!(incident = %current.id, action = %action, "performing action");

        let id = &current.id;
        let updated = match action.transition() {
            Transition::SetStatus(status) => {
                self.api
                    .update_incident(id, &IncidentUpdate::status(status))
                    .await?
            }
            Transition::AssignToSelf => {
                self.api
                    .assign_incident(id, &AssignForm::to(user.id.clone()))
                    .await?
            }
            Transition::AssignStaff | Transition::AssignOrganization | Transition::Reassign => {
                let form = AssignForm {
                    assigned_to_id: input.assignee,
                    notes: None,
                };
                form.validate()?;
                self.api.assign_incident(id, &form).await?
            }
            Transition::Escalate => {
                let form = EscalationForm::new(input.reason.unwrap_or_default());
                form.validate()?;
                self.api.escalate_incident(id, &form).await?
            }
            Transition::None => {
                let mut errors = ValidationErrors::new();
                errors.push("action", format!("{} does not change the incident", action.label()));
                return Err(errors.into());
            }
        };
        self.cache.invalidate_incident(Some(id)).await;
        Ok(updated)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dispatch_core::{BulkAction, Status};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use time::macros::datetime;

    fn incident(id: &str, status: Status) -> Incident {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": "fire",
            "priority": "high",
            "status": status.as_str(),
            "title": "Kitchen fire",
            "location": { "address": "1 Main St" },
            "createdAt": "2025-03-01T08:00:00Z",
            "updatedAt": "2025-03-01T08:00:00Z"
        }))
        .unwrap()
    }

    /// Counts list fetches; every mutation succeeds.
    #[derive(Default)]
    struct CountingApi {
        list_calls: AtomicUsize,
        stats_calls: AtomicUsize,
        /// Set once an assignment went through.
        assigned: AtomicBool,
        /// When set, the first list fetch waits here after reading state.
        list_gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl IncidentApi for CountingApi {
        async fn login(&self, _form: &LoginForm) -> Result<Session, ClientError> {
            Err(ClientError::Unauthorized {
                message: "Invalid credentials".into(),
            })
        }
        async fn list_incidents(&self) -> Result<Vec<Incident>, ClientError> {
            let call = self.list_calls.fetch_add(1, Ordering::SeqCst);
            let status = if self.assigned.load(Ordering::SeqCst) {
                Status::Assigned
            } else {
                Status::Reported
            };
            if let (0, Some(gate)) = (call, &self.list_gate) {
                gate.notified().await;
            }
            Ok(vec![incident("1", status)])
        }
        async fn get_incident(&self, id: &IncidentId) -> Result<Incident, ClientError> {
            Ok(incident(id.as_str(), Status::Reported))
        }
        async fn stats(&self) -> Result<IncidentStats, ClientError> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            Ok(IncidentStats::default())
        }
        async fn update_incident(
            &self,
            id: &IncidentId,
            update: &IncidentUpdate,
        ) -> Result<Incident, ClientError> {
            let mut updated = incident(id.as_str(), Status::Reported);
            if let Some(status) = update.status {
                updated.status = status;
            }
            updated.updated_at = datetime!(2025-03-01 09:00 UTC);
            Ok(updated)
        }
        async fn assign_incident(
            &self,
            id: &IncidentId,
            _form: &AssignForm,
        ) -> Result<Incident, ClientError> {
            self.assigned.store(true, Ordering::SeqCst);
            Ok(incident(id.as_str(), Status::Assigned))
        }
        async fn escalate_incident(
            &self,
            _id: &IncidentId,
            _form: &EscalationForm,
        ) -> Result<Incident, ClientError> {
            Err(ClientError::Api {
                status: 409,
                message: "Incident is not in progress".into(),
            })
        }
        async fn bulk(&self, _request: &BulkRequest) -> Result<BulkOutcome, ClientError> {
            Ok(BulkOutcome::Csv(b"id\n1\n".to_vec()))
        }
        async fn list_users(&self) -> Result<Vec<User>, ClientError> {
            Ok(vec![serde_json::from_value(serde_json::json!({
                "id": 5, "name": "Ada", "email": "ada@example.org", "role": "station_staff"
            }))
            .unwrap()])
        }
        async fn list_stations(&self) -> Result<Vec<Station>, ClientError> {
            Ok(vec![])
        }
        async fn list_organizations(&self) -> Result<Vec<Organization>, ClientError> {
            Ok(vec![])
        }
    }

    fn client() -> QueryClient<CountingApi> {
        QueryClient::new(CountingApi::default(), StaleTimes::default())
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_reads_hit_cache_until_stale() {
        let client = client();
        client.incidents().await.unwrap();
        client.incidents().await.unwrap();
        assert_eq!(client.api().list_calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(16)).await;
        client.incidents().await.unwrap();
        assert_eq!(client.api().list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_invalidates_list_and_stats() {
        let client = client();
        client.incidents().await.unwrap();
        client.stats().await.unwrap();

        let current = incident("1", Status::Reported);
        client
            .assign_incident(&current.id, &AssignForm::to("5".into()))
            .await
            .unwrap();
        assert!(!client.cache().contains(&QueryKey::Incidents).await);

        client.incidents().await.unwrap();
        client.stats().await.unwrap();
        assert_eq!(client.api().list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.api().stats_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_overtaken_by_mutation_is_not_cached() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(QueryClient::new(
            CountingApi {
                list_gate: Some(Arc::clone(&gate)),
                ..CountingApi::default()
            },
            StaleTimes::default(),
        ));

        let reader = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.incidents().await.unwrap() })
        };
        while client.api().list_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        client
            .assign_incident(&IncidentId::from("1"), &AssignForm::to("5".into()))
            .await
            .unwrap();
        gate.notify_one();
        let in_flight = reader.await.unwrap();
        assert_eq!(in_flight[0].status, Status::Reported);
        assert!(!client.cache().contains(&QueryKey::Incidents).await);

        let after = client.incidents().await.unwrap();
        assert_eq!(after[0].status, Status::Assigned);
        assert_eq!(client.api().list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_discards_in_flight_fetches_of_any_key() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(QueryClient::new(
            CountingApi {
                list_gate: Some(Arc::clone(&gate)),
                ..CountingApi::default()
            },
            StaleTimes::default(),
        ));
        let reader = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.incidents().await.unwrap() })
        };
        while client.api().list_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        client.cache().clear().await;
        gate.notify_one();
        reader.await.unwrap();
        assert!(!client.cache().contains(&QueryKey::Incidents).await);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_mutation_keeps_cache_and_surfaces_message() {
        let client = client();
        client.incidents().await.unwrap();
        let err = client
            .escalate_incident(&IncidentId::from("1"), &EscalationForm::new("needs backup"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Incident is not in progress");
        assert!(client.cache().contains(&QueryKey::Incidents).await);
    }

    #[tokio::test(start_paused = true)]
    async fn illegal_transition_never_reaches_api() {
        let client = client();
        let current = incident("1", Status::Reported);
        let err = client
            .update_incident(&current, &IncidentUpdate::status(Status::Resolved))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let ok = client
            .update_incident(&current, &IncidentUpdate::status(Status::Assigned))
            .await
            .unwrap();
        assert_eq!(ok.status, Status::Assigned);
    }

    #[tokio::test(start_paused = true)]
    async fn export_does_not_invalidate() {
        let client = client();
        client.incidents().await.unwrap();
        let request = BulkRequest::new(BulkAction::Export, vec![IncidentId::from("1")]);
        let outcome = client.bulk(&request).await.unwrap();
        assert_eq!(outcome.csv(), Some(&b"id\n1\n"[..]));
        assert!(client.cache().contains(&QueryKey::Incidents).await);
    }

    #[tokio::test(start_paused = true)]
    async fn current_user_resolves_from_directory() {
        let client = client();
        assert_eq!(client.current_user("5").await.unwrap().name, "Ada");
        assert!(client.current_user("6").await.unwrap_err().is_auth());
    }

    fn staff(id: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "id": id, "name": "Ada", "email": "ada@example.org", "role": "station_staff"
        }))
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn perform_refuses_actions_off_the_menu() {
        let client = client();
        let current = incident("1", Status::Reported);
        let err = client
            .perform(&current, &staff("5"), IncidentAction::Escalate, ActionInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotPermitted { .. }));
        assert_eq!(err.to_string(), "'Escalate' is not available on incident INC-0001");
    }

    #[tokio::test(start_paused = true)]
    async fn perform_take_case_assigns_self_and_invalidates() {
        let client = client();
        client.incidents().await.unwrap();
        let current = incident("1", Status::Reported);
        let updated = client
            .perform(&current, &staff("5"), IncidentAction::TakeCase, ActionInput::default())
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Assigned);
        assert!(!client.cache().contains(&QueryKey::Incidents).await);
    }

    #[tokio::test(start_paused = true)]
    async fn admin_resolve_skips_transition_check() {
        let client = client();
        let admin: User = serde_json::from_value(serde_json::json!({
            "id": 1, "role": "super_admin", "organizationId": "o"
        }))
        .unwrap();
        let current = incident("1", Status::Reported);
        let updated = client
            .perform(&current, &admin, IncidentAction::Resolve, ActionInput::default())
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn view_details_is_not_performable() {
        let client = client();
        let current = incident("1", Status::Reported);
        let err = client
            .perform(&current, &staff("5"), IncidentAction::ViewDetails, ActionInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn refetch_bypasses_freshness() {
        let client = client();
        client.incidents().await.unwrap();
        client.refetch_incidents().await.unwrap();
        assert_eq!(client.api().list_calls.load(Ordering::SeqCst), 2);
    }
}
