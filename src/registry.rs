//! Backend registry and lifecycle management.
//!
//! The registry owns the roster of loaded backends and drives the one load
//! pass the process ever performs. Loading large checkpoints takes tens of
//! seconds per backend, so the pass runs on a dedicated background thread
//! while the hosting service keeps answering unrelated requests; readiness
//! is published through [`BackendRegistry::status`].
//!
//! Lifecycle: UNINITIALIZED -> LOADING -> READY (at least one backend
//! loaded) or NOT_READY (none loaded). Both end states are terminal; a
//! fresh pass requires a process restart. No backend is ever removed after
//! a successful load, so `ready` can never regress.

use crate::backend::loader::BackendLoader;
use crate::backend::{BackendSpec, ClassifierBackend};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// Non-blocking snapshot of the registry lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStatus {
    /// At least one backend is loaded and the load pass has finished.
    pub ready: bool,
    /// A load pass is in progress.
    pub loading: bool,
    /// Number of successfully loaded backends.
    pub loaded_count: usize,
    /// Number of backends configured in the roster.
    pub total_count: usize,
}

/// State behind the registry mutex: the handle list plus the lifecycle
/// scalars, updated together so readers always see a consistent snapshot.
struct RegistryState {
    /// Loaded backends in insertion order (roster order filtered by success).
    handles: Vec<(String, Arc<dyn ClassifierBackend>)>,
    loading: bool,
    ready: bool,
    total_count: usize,
}

/// Owns the roster of loaded backends and publishes readiness.
///
/// The registry is the only component that mutates the handle list, and only
/// from the loader thread. Everything else reads snapshots.
pub struct BackendRegistry {
    state: Mutex<RegistryState>,
    /// Guards idempotence of `begin_loading`.
    load_started: AtomicBool,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.status();
        f.debug_struct("BackendRegistry")
            .field("status", &status)
            .finish()
    }
}

impl BackendRegistry {
    /// Creates an empty, uninitialized registry.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                handles: Vec::new(),
                loading: false,
                ready: false,
                total_count: 0,
            }),
            load_started: AtomicBool::new(false),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        // A poisoned lock means a loader panic; the state itself is still
        // consistent because every critical section updates it atomically.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the background load pass for the given roster.
    ///
    /// `loading` is set synchronously before this returns, so a status query
    /// issued immediately afterwards already reflects the in-progress pass.
    /// The pass itself runs on a dedicated thread; the caller is never
    /// blocked on checkpoint IO.
    ///
    /// Idempotent: the first call returns the loader thread's join handle,
    /// every later call is a no-op returning `None`.
    pub fn begin_loading(
        self: &Arc<Self>,
        roster: Vec<BackendSpec>,
        loader: Arc<dyn BackendLoader>,
    ) -> Option<JoinHandle<()>> {
        if self.load_started.swap(true, Ordering::SeqCst) {
            return None;
        }

        {
            let mut state = self.lock_state();
            state.loading = true;
            state.total_count = roster.len();
        }

        let registry = Arc::clone(self);
        Some(std::thread::spawn(move || {
            registry.run_load_pass(&roster, loader.as_ref());
        }))
    }

    /// Runs the load pass to completion on the current thread.
    fn run_load_pass(&self, roster: &[BackendSpec], loader: &dyn BackendLoader) {
        let total = roster.len();
        tracing::info!("loading {total} backends in the background");

        for spec in roster {
            if !spec.weights_path.exists() {
                tracing::warn!(
                    backend = %spec.name,
                    path = %spec.weights_path.display(),
                    "weight file not found, skipping backend"
                );
                continue;
            }

            match loader.load(spec) {
                Ok(backend) => {
                    let loaded = {
                        let mut state = self.lock_state();
                        if state.handles.iter().any(|(name, _)| name == &spec.name) {
                            tracing::warn!(
                                backend = %spec.name,
                                "duplicate backend name in roster, skipping"
                            );
                            state.handles.len()
                        } else {
                            state.handles.push((spec.name.clone(), Arc::from(backend)));
                            state.handles.len()
                        }
                    };
                    tracing::info!(backend = %spec.name, "loaded ({loaded}/{total})");
                }
                Err(err) => {
                    tracing::error!(
                        backend = %spec.name,
                        error = %err,
                        "failed to load backend"
                    );
                    // Checkpoint buffers owned by the failed load are dropped
                    // here, before the next backend starts allocating.
                    drop(err);
                }
            }
        }

        let mut state = self.lock_state();
        state.loading = false;
        state.ready = !state.handles.is_empty();
        let loaded = state.handles.len();
        drop(state);

        tracing::info!("load pass finished: {loaded}/{total} backends available");
    }

    /// Returns a consistent snapshot of the lifecycle state.
    ///
    /// Safe to call concurrently with an in-progress load pass.
    pub fn status(&self) -> RegistryStatus {
        let state = self.lock_state();
        RegistryStatus {
            ready: state.ready,
            loading: state.loading,
            loaded_count: state.handles.len(),
            total_count: state.total_count,
        }
    }

    /// Returns the loaded backends in insertion order.
    ///
    /// Handles are cheap clones of shared references; invoking them does not
    /// hold the registry lock.
    pub fn handles(&self) -> Vec<(String, Arc<dyn ClassifierBackend>)> {
        self.lock_state().handles.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::adapter::RawPrediction;
    use crate::backend::{BackendArch, CheckpointLayout};
    use crate::core::errors::{RetinaError, RetinaResult, SimpleError};
    use crate::preprocess::PreprocessedInput;
    use std::collections::HashSet;
    use std::sync::Barrier;

    #[derive(Debug)]
    struct StubBackend;

    impl ClassifierBackend for StubBackend {
        fn classify(&self, _input: &PreprocessedInput) -> RetinaResult<RawPrediction> {
            Ok(RawPrediction {
                class_index: 0,
                confidence: 1.0,
                probabilities: vec![1.0, 0.0, 0.0, 0.0, 0.0],
            })
        }
    }

    struct StubLoader {
        fail: HashSet<String>,
    }

    impl StubLoader {
        fn flawless() -> Self {
            Self {
                fail: HashSet::new(),
            }
        }

        fn failing(names: &[&str]) -> Self {
            Self {
                fail: names.iter().map(|n| n.to_string()).collect(),
            }
        }
    }

    impl BackendLoader for StubLoader {
        fn load(&self, spec: &BackendSpec) -> RetinaResult<Box<dyn ClassifierBackend>> {
            if self.fail.contains(&spec.name) {
                Err(RetinaError::model_load(
                    &spec.name,
                    "stubbed checkpoint corruption",
                    SimpleError::new("boom"),
                ))
            } else {
                Ok(Box::new(StubBackend))
            }
        }
    }

    /// A loader that parks on a barrier before the first backend finishes,
    /// letting tests observe the mid-load state deterministically.
    struct BlockingLoader {
        barrier: Arc<Barrier>,
    }

    impl BackendLoader for BlockingLoader {
        fn load(&self, _spec: &BackendSpec) -> RetinaResult<Box<dyn ClassifierBackend>> {
            self.barrier.wait();
            Ok(Box::new(StubBackend))
        }
    }

    fn roster_with_existing_weights(dir: &std::path::Path, names: &[&str]) -> Vec<BackendSpec> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(format!("{}.onnx", name.replace(' ', "_")));
                std::fs::write(&path, b"weights").unwrap();
                BackendSpec::new(*name, BackendArch::VitB16, path, CheckpointLayout::Flat)
            })
            .collect()
    }

    #[test]
    fn test_load_pass_reaches_ready_with_all_backends() {
        let dir = tempfile::tempdir().unwrap();
        let roster = roster_with_existing_weights(dir.path(), &["A", "B", "C"]);

        let registry = Arc::new(BackendRegistry::new());
        let handle = registry
            .begin_loading(roster, Arc::new(StubLoader::flawless()))
            .unwrap();
        handle.join().unwrap();

        let status = registry.status();
        assert!(status.ready);
        assert!(!status.loading);
        assert_eq!(status.loaded_count, 3);
        assert_eq!(status.total_count, 3);

        let names: Vec<String> = registry.handles().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn test_missing_weight_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut roster = roster_with_existing_weights(dir.path(), &["A", "C"]);
        roster.insert(
            1,
            BackendSpec::new(
                "B",
                BackendArch::VitB16,
                dir.path().join("nowhere.onnx"),
                CheckpointLayout::Flat,
            ),
        );

        let registry = Arc::new(BackendRegistry::new());
        registry
            .begin_loading(roster, Arc::new(StubLoader::flawless()))
            .unwrap()
            .join()
            .unwrap();

        let status = registry.status();
        assert!(status.ready);
        assert_eq!(status.loaded_count, 2);
        assert_eq!(status.total_count, 3);

        let names: Vec<String> = registry.handles().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["A", "C"]);
    }

    #[test]
    fn test_one_failing_backend_never_drags_down_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let roster = roster_with_existing_weights(dir.path(), &["A", "B", "C"]);

        let registry = Arc::new(BackendRegistry::new());
        registry
            .begin_loading(roster, Arc::new(StubLoader::failing(&["B"])))
            .unwrap()
            .join()
            .unwrap();

        let status = registry.status();
        assert!(status.ready);
        assert_eq!(status.loaded_count, 2);

        let names: Vec<String> = registry.handles().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["A", "C"]);
    }

    #[test]
    fn test_total_load_failure_is_terminal_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let roster = roster_with_existing_weights(dir.path(), &["A", "B"]);

        let registry = Arc::new(BackendRegistry::new());
        registry
            .begin_loading(roster, Arc::new(StubLoader::failing(&["A", "B"])))
            .unwrap()
            .join()
            .unwrap();

        let status = registry.status();
        assert!(!status.ready);
        assert!(!status.loading);
        assert_eq!(status.loaded_count, 0);
        assert_eq!(status.total_count, 2);
    }

    #[test]
    fn test_begin_loading_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let roster = roster_with_existing_weights(dir.path(), &["A"]);

        let registry = Arc::new(BackendRegistry::new());
        let first = registry.begin_loading(roster.clone(), Arc::new(StubLoader::flawless()));
        let second = registry.begin_loading(roster, Arc::new(StubLoader::flawless()));

        assert!(second.is_none());
        first.unwrap().join().unwrap();
        assert_eq!(registry.status().loaded_count, 1);
    }

    #[test]
    fn test_status_mid_load_reports_loading_and_no_backends() {
        let dir = tempfile::tempdir().unwrap();
        let roster = roster_with_existing_weights(dir.path(), &["A"]);

        let barrier = Arc::new(Barrier::new(2));
        let loader = Arc::new(BlockingLoader {
            barrier: Arc::clone(&barrier),
        });

        let registry = Arc::new(BackendRegistry::new());
        let handle = registry.begin_loading(roster, loader).unwrap();

        // The loader thread is parked on the barrier; nothing is loaded yet.
        let status = registry.status();
        assert!(status.loading);
        assert!(!status.ready);
        assert_eq!(status.loaded_count, 0);
        assert_eq!(status.total_count, 1);

        barrier.wait();
        handle.join().unwrap();
        assert!(registry.status().ready);
    }

    #[test]
    fn test_duplicate_roster_names_are_collapsed() {
        let dir = tempfile::tempdir().unwrap();
        let mut roster = roster_with_existing_weights(dir.path(), &["A"]);
        roster.push(roster[0].clone());

        let registry = Arc::new(BackendRegistry::new());
        registry
            .begin_loading(roster, Arc::new(StubLoader::flawless()))
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(registry.status().loaded_count, 1);
    }

    #[test]
    fn test_status_serializes_with_wire_field_names() {
        let registry = BackendRegistry::new();
        let json = serde_json::to_value(registry.status()).unwrap();
        assert_eq!(json["ready"], false);
        assert_eq!(json["loading"], false);
        assert_eq!(json["loaded_count"], 0);
        assert_eq!(json["total_count"], 0);
    }
}
