//! In-memory collaborators for exercising the reconciler without a cluster
//!
//! Both fakes count their calls, can be told to fail a given operation, and
//! can share a [`CallLog`] so tests can assert on the order of side effects
//! across the control plane and the remote system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reconciler_phase_api::{ControlPlane, ObjectKey, RemoteSystem, Workload};
use reconciler_utils::error::{ControlPlaneError, RemoteError};
use reconciler_utils::types::Condition;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Desired shape of a machine pool, compared against the remote copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSpec {
    pub replicas: u32,
    pub instance_type: String,
}

/// A machine-pool-like workload with public fields for direct manipulation.
#[derive(Debug, Clone, Default)]
pub struct TestWorkload {
    pub kind: String,
    pub group: String,
    pub namespace: String,
    pub name: String,
    pub creation_timestamp: Option<DateTime<Utc>>,
    pub deletion_timestamp: Option<DateTime<Utc>>,
    pub finalizers: Vec<String>,
    pub conditions: Vec<Condition>,
    pub spec: PoolSpec,
}

impl TestWorkload {
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            kind: "MachinePool".to_string(),
            group: "infra.example.io".to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            spec: PoolSpec {
                replicas: 3,
                instance_type: "standard-4".to_string(),
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, kind: &str, group: &str) -> Self {
        self.kind = kind.to_string();
        self.group = group.to_string();
        self
    }

    #[must_use]
    pub fn with_spec(mut self, spec: PoolSpec) -> Self {
        self.spec = spec;
        self
    }

    #[must_use]
    pub fn with_finalizer(mut self, finalizer: &str) -> Self {
        self.finalizers.push(finalizer.to_string());
        self
    }

    /// Stamp a creation time, as the control plane does on first write.
    #[must_use]
    pub fn persisted(mut self) -> Self {
        self.creation_timestamp = Some(Utc::now());
        self
    }

    /// Stamp a deletion time, as the control plane does when deletion is requested.
    #[must_use]
    pub fn deleting(mut self) -> Self {
        self.deletion_timestamp = Some(Utc::now());
        self
    }
}

impl Workload for TestWorkload {
    type Spec = PoolSpec;

    fn kind(&self) -> &str {
        &self.kind
    }

    fn group(&self) -> &str {
        &self.group
    }

    fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }

    fn creation_timestamp(&self) -> Option<DateTime<Utc>> {
        self.creation_timestamp
    }

    fn deletion_timestamp(&self) -> Option<DateTime<Utc>> {
        self.deletion_timestamp
    }

    fn finalizers(&self) -> &[String] {
        &self.finalizers
    }

    fn finalizers_mut(&mut self) -> &mut Vec<String> {
        &mut self.finalizers
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.conditions
    }

    fn spec(&self) -> &PoolSpec {
        &self.spec
    }
}

/// Ordered record of side effects, shared between fakes.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.0).push(entry.into());
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    /// Position of the first entry equal to `entry`.
    #[must_use]
    pub fn position(&self, entry: &str) -> Option<usize> {
        lock(&self.0).iter().position(|e| e == entry)
    }
}

/// Control plane backed by a map, with physical removal once a deleting
/// object has no finalizers left.
#[derive(Debug, Default)]
pub struct InMemoryControlPlane {
    objects: Mutex<HashMap<ObjectKey, TestWorkload>>,
    failures: Mutex<HashMap<&'static str, ControlPlaneError>>,
    log: CallLog,
    get_calls: AtomicUsize,
    update_calls: AtomicUsize,
    update_status_calls: AtomicUsize,
}

impl InMemoryControlPlane {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Store an object as-is, replacing any existing copy.
    pub fn insert(&self, object: TestWorkload) {
        lock(&self.objects).insert(object.key(), object);
    }

    #[must_use]
    pub fn stored(&self, key: &ObjectKey) -> Option<TestWorkload> {
        lock(&self.objects).get(key).cloned()
    }

    /// Make every call to `operation` (`get`, `update` or `update_status`) fail.
    pub fn fail(&self, operation: &'static str, error: ControlPlaneError) {
        lock(&self.failures).insert(operation, error);
    }

    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn update_status_calls(&self) -> usize {
        self.update_status_calls.load(Ordering::SeqCst)
    }

    fn injected(&self, operation: &'static str) -> Result<(), ControlPlaneError> {
        match lock(&self.failures).get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ControlPlane<TestWorkload> for InMemoryControlPlane {
    async fn get(&self, key: &ObjectKey) -> Result<Option<TestWorkload>, ControlPlaneError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.injected("get")?;
        Ok(self.stored(key))
    }

    async fn update(&self, object: &TestWorkload) -> Result<TestWorkload, ControlPlaneError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.injected("update")?;
        let key = object.key();
        let mut objects = lock(&self.objects);
        if !objects.contains_key(&key) {
            return Err(ControlPlaneError::NotFound { key });
        }
        self.log.record(format!("control-plane.update {}", object.finalizers.join(",")));
        if object.deletion_timestamp.is_some() && object.finalizers.is_empty() {
            objects.remove(&key);
        } else {
            objects.insert(key, object.clone());
        }
        Ok(object.clone())
    }

    async fn update_status(
        &self,
        object: &TestWorkload,
    ) -> Result<TestWorkload, ControlPlaneError> {
        self.update_status_calls.fetch_add(1, Ordering::SeqCst);
        self.injected("update_status")?;
        let key = object.key();
        let mut objects = lock(&self.objects);
        let stored = objects
            .get_mut(&key)
            .ok_or(ControlPlaneError::NotFound { key })?;
        stored.conditions = object.conditions.clone();
        self.log.record("control-plane.update_status");
        Ok(stored.clone())
    }
}

/// Remote system backed by a map of specs keyed by remote identifier.
#[derive(Debug)]
pub struct InMemoryRemote {
    specs: Mutex<HashMap<String, PoolSpec>>,
    failures: Mutex<HashMap<&'static str, RemoteError>>,
    latency: Mutex<Option<Duration>>,
    ready: AtomicBool,
    log: CallLog,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    is_ready_calls: AtomicUsize,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self {
            specs: Mutex::default(),
            failures: Mutex::default(),
            latency: Mutex::default(),
            ready: AtomicBool::new(true),
            log: CallLog::default(),
            get_calls: AtomicUsize::default(),
            create_calls: AtomicUsize::default(),
            update_calls: AtomicUsize::default(),
            delete_calls: AtomicUsize::default(),
            is_ready_calls: AtomicUsize::default(),
        }
    }
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Identifier the remote uses for a workload, `<namespace>-<name>`.
    #[must_use]
    pub fn id_for(object: &TestWorkload) -> String {
        format!("{}-{}", object.namespace, object.name)
    }

    pub fn insert(&self, id: &str, spec: PoolSpec) {
        lock(&self.specs).insert(id.to_string(), spec);
    }

    #[must_use]
    pub fn stored(&self, id: &str) -> Option<PoolSpec> {
        lock(&self.specs).get(id).cloned()
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Delay every call by `latency` before it touches state.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = Some(latency);
    }

    /// Make every call to `operation` (`get`, `create`, `update`, `delete` or
    /// `is_ready`) fail.
    pub fn fail(&self, operation: &'static str, error: RemoteError) {
        lock(&self.failures).insert(operation, error);
    }

    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_ready_calls(&self) -> usize {
        self.is_ready_calls.load(Ordering::SeqCst)
    }

    /// Total calls that could have side effects or observe remote state.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.get_calls()
            + self.create_calls()
            + self.update_calls()
            + self.delete_calls()
            + self.is_ready_calls()
    }

    async fn enter(&self, counter: &AtomicUsize, operation: &'static str) -> Result<(), RemoteError> {
        counter.fetch_add(1, Ordering::SeqCst);
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match lock(&self.failures).get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteSystem<TestWorkload> for InMemoryRemote {
    fn remote_id(&self, desired: &TestWorkload) -> String {
        Self::id_for(desired)
    }

    async fn get(&self, id: &str) -> Result<Option<PoolSpec>, RemoteError> {
        self.enter(&self.get_calls, "get").await?;
        Ok(self.stored(id))
    }

    async fn create(&self, id: &str, spec: &PoolSpec) -> Result<(), RemoteError> {
        self.enter(&self.create_calls, "create").await?;
        let mut specs = lock(&self.specs);
        if specs.contains_key(id) {
            return Err(RemoteError::Conflict {
                id: id.to_string(),
                reason: "already exists".to_string(),
            });
        }
        specs.insert(id.to_string(), spec.clone());
        self.log.record(format!("remote.create {id}"));
        Ok(())
    }

    async fn update(&self, id: &str, spec: &PoolSpec) -> Result<(), RemoteError> {
        self.enter(&self.update_calls, "update").await?;
        let mut specs = lock(&self.specs);
        let stored = specs
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound { id: id.to_string() })?;
        *stored = spec.clone();
        self.log.record(format!("remote.update {id}"));
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.enter(&self.delete_calls, "delete").await?;
        if lock(&self.specs).remove(id).is_none() {
            return Err(RemoteError::NotFound { id: id.to_string() });
        }
        self.log.record(format!("remote.delete {id}"));
        Ok(())
    }

    async fn is_ready(&self, id: &str) -> Result<bool, RemoteError> {
        self.enter(&self.is_ready_calls, "is_ready").await?;
        if !lock(&self.specs).contains_key(id) {
            return Err(RemoteError::NotFound { id: id.to_string() });
        }
        Ok(self.ready.load(Ordering::SeqCst))
    }
}
