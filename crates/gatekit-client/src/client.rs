// crates/gatekit-client/src/client.rs
// ============================================================================
// Module: Gatekit Client
// Description: Facade wiring the spec store, evaluator, and exposure logger.
// Purpose: §4.I "Client facade".
// Dependencies: gatekit-core, gatekit-eval, gatekit-exposure, gatekit-store
// ============================================================================

//! ## Overview
//! [`Client`] owns a [`SpecStore`], an [`OverrideStore`], an optional
//! [`PersistedMediator`]-wrapped [`PersistentStorage`], and an
//! [`ExposureLogger`]. [`Client::new`] runs the full §4.C initialization
//! order on a background thread and waits up to `init_timeout` for it to
//! settle; if that elapses the client is returned anyway, evaluating
//! against an empty/uninitialized snapshot until the background init
//! completes and installs the real one (§5 "Cancellation/timeout"). Every
//! public entry point runs through [`PanicGuard::run`] (§7).

use std::sync::Arc;
use std::sync::RwLock;
use std::sync::mpsc;
use std::thread;

use gatekit_core::SystemClock;
use gatekit_core::clock::Clock;
use gatekit_core::interfaces::DataAdapter;
use gatekit_core::interfaces::IpCountryLookup;
use gatekit_core::interfaces::NoopObservabilityClient;
use gatekit_core::interfaces::ObservabilityClient;
use gatekit_core::interfaces::PersistentStorage;
use gatekit_core::interfaces::StickyValues;
use gatekit_core::interfaces::Transport;
use gatekit_core::interfaces::UserAgentLookup;
use gatekit_core::result::EvalReason;
use gatekit_core::result::EvalResult;
use gatekit_core::result::EvaluationDetails;
use gatekit_core::result::SnapshotSource;
use gatekit_core::spec::ConfigSpec;
use gatekit_core::user::User;
use gatekit_eval::EvalContext;
use gatekit_eval::Evaluator;
use gatekit_eval::overrides::Override;
use gatekit_eval::overrides::OverrideStore;
use gatekit_eval::persisted::PersistedMediator;
use gatekit_eval::persisted::should_persist;
use gatekit_exposure::ExposureEvent;
use gatekit_exposure::ExposureKind;
use gatekit_exposure::ExposureLogger;
use gatekit_store::SpecStore;
use serde_json::Value;
use serde_json::json;

use crate::config::ClientOptions;
use crate::error::ClientError;
use crate::panic_guard::PanicGuard;

/// The kind of spec a [`Client`] entry point is evaluating, used to select
/// which snapshot map to read and which [`ExposureKind`] to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecKind {
    Gate,
    DynamicConfig,
    Experiment,
    Layer,
}

impl SpecKind {
    const fn exposure_kind(self) -> ExposureKind {
        match self {
            Self::Gate => ExposureKind::Gate,
            Self::DynamicConfig => ExposureKind::Config,
            Self::Experiment => ExposureKind::Experiment,
            Self::Layer => ExposureKind::Layer,
        }
    }
}

/// Facade over the spec store, evaluator, and exposure logger.
pub struct Client {
    state: Arc<RwLock<Option<Arc<SpecStore>>>>,
    clock: Arc<dyn Clock>,
    overrides: OverrideStore,
    persistent_storage: Option<Arc<dyn PersistentStorage>>,
    exposure_logger: Arc<ExposureLogger>,
    ip_lookup: Option<Arc<dyn IpCountryLookup>>,
    ua_lookup: Option<Arc<dyn UserAgentLookup>>,
    options: ClientOptions,
    panics: PanicGuard,
}

impl Client {
    /// Builds a client with a real wall clock and no observability sink.
    pub fn new(
        sdk_key: impl Into<String>,
        options: ClientOptions,
        transport: Arc<dyn Transport>,
        data_adapter: Option<Arc<dyn DataAdapter>>,
        persistent_storage: Option<Arc<dyn PersistentStorage>>,
    ) -> Result<Self, ClientError> {
        Self::with_collaborators(
            sdk_key,
            options,
            transport,
            data_adapter,
            persistent_storage,
            Arc::new(SystemClock),
            Arc::new(NoopObservabilityClient),
        )
    }

    /// Builds a client with an explicit clock and observability sink,
    /// primarily for tests and for callers that want their own diagnostics
    /// wiring.
    pub fn with_collaborators(
        sdk_key: impl Into<String>,
        options: ClientOptions,
        transport: Arc<dyn Transport>,
        data_adapter: Option<Arc<dyn DataAdapter>>,
        persistent_storage: Option<Arc<dyn PersistentStorage>>,
        clock: Arc<dyn Clock>,
        observability: Arc<dyn ObservabilityClient>,
    ) -> Result<Self, ClientError> {
        let sdk_key = sdk_key.into();
        let state: Arc<RwLock<Option<Arc<SpecStore>>>> = Arc::new(RwLock::new(None));
        let (ready_tx, ready_rx) = mpsc::channel();

        let init_state = Arc::clone(&state);
        let init_clock = Arc::clone(&clock);
        let init_transport = Arc::clone(&transport);
        let store_options = options.store.clone();
        thread::Builder::new()
            .name("gatekit-client-init".to_string())
            .spawn(move || {
                let result = SpecStore::initialize(sdk_key, init_transport, data_adapter, init_clock, &store_options);
                match result {
                    Ok(store) => {
                        *init_state.write().expect("client state lock poisoned") = Some(store);
                        let _ = ready_tx.send(Ok(()));
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                    }
                }
            })
            .map_err(|err| ClientError::Init(gatekit_store::StoreInitError::ThreadSpawnFailed(err.to_string())))?;

        match ready_rx.recv_timeout(options.init_timeout) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(ClientError::Init(err)),
            Err(mpsc::RecvTimeoutError::Timeout | mpsc::RecvTimeoutError::Disconnected) => {
                tracing::warn!(timeout = ?options.init_timeout, "client init timed out; continuing uninitialized");
            }
        }

        let exposure_logger = ExposureLogger::start(transport, options.exposure_max_queue_size, options.exposure_flush_interval);

        Ok(Self {
            state,
            clock,
            overrides: OverrideStore::new(),
            persistent_storage,
            exposure_logger,
            ip_lookup: None,
            ua_lookup: None,
            options,
            panics: PanicGuard::new(observability),
        })
    }

    /// Attaches an IP→country lookup used by `ip_based` conditions.
    #[must_use]
    pub fn with_ip_lookup(mut self, lookup: Arc<dyn IpCountryLookup>) -> Self {
        self.ip_lookup = Some(lookup);
        self
    }

    /// Attaches a User-Agent lookup used by `ua_based` conditions.
    #[must_use]
    pub fn with_ua_lookup(mut self, lookup: Arc<dyn UserAgentLookup>) -> Self {
        self.ua_lookup = Some(lookup);
        self
    }

    /// Registers a local gate override, bypassing evaluation entirely.
    pub fn override_gate(&self, name: impl Into<String>, value: bool) {
        self.overrides.override_gate(name, value);
    }

    /// Registers a local dynamic config/experiment/layer override.
    pub fn override_config(&self, name: impl Into<String>, value: Value) {
        self.overrides.override_config(name, value);
    }

    /// Checks a feature gate.
    #[must_use]
    pub fn check_gate(&self, name: &str, user: &User) -> bool {
        self.evaluate(SpecKind::Gate, name, user).value
    }

    /// Reads a dynamic config.
    #[must_use]
    pub fn get_dynamic_config(&self, name: &str, user: &User) -> EvalResult {
        self.evaluate(SpecKind::DynamicConfig, name, user)
    }

    /// Reads an experiment, applying sticky/persisted bucketing when a
    /// [`PersistentStorage`] is configured and the experiment is active.
    #[must_use]
    pub fn get_experiment(&self, name: &str, user: &User) -> EvalResult {
        self.evaluate(SpecKind::Experiment, name, user)
    }

    /// Reads a layer, resolving delegation to its allocated experiment.
    #[must_use]
    pub fn get_layer(&self, name: &str, user: &User) -> EvalResult {
        self.evaluate(SpecKind::Layer, name, user)
    }

    /// Logs an exposure for `name` regardless of `disable_log_exposures`
    /// (§4.F's manual-logging contract).
    pub fn manually_log_exposure(&self, kind: ExposureKind, name: &str, user: &User) {
        let spec_kind = match kind {
            ExposureKind::Gate => SpecKind::Gate,
            ExposureKind::Config => SpecKind::DynamicConfig,
            ExposureKind::Experiment => SpecKind::Experiment,
            ExposureKind::Layer => SpecKind::Layer,
        };
        let result = self.evaluate_without_logging(spec_kind, name, user);
        self.exposure_logger.manually_log(self.build_event(kind, name, user, &result, true));
    }

    /// Stops the exposure flush thread and the spec store's background
    /// threads, flushing and joining as specified in §5.
    pub fn shutdown(self) {
        self.exposure_logger.shutdown();
        if let Some(store) = self.state.read().expect("client state lock poisoned").clone() {
            store.shutdown();
        }
    }

    fn evaluate(&self, kind: SpecKind, name: &str, user: &User) -> EvalResult {
        let result = self.evaluate_without_logging(kind, name, user);
        if !self.options.disable_log_exposures {
            self.exposure_logger.log(self.build_event(kind.exposure_kind(), name, user, &result, false));
        }
        result
    }

    fn evaluate_without_logging(&self, kind: SpecKind, name: &str, user: &User) -> EvalResult {
        if user.is_empty_user() {
            tracing::warn!(name, "empty user; returning zero value without evaluating");
            return EvalResult::unrecognized(self.uninitialized_details());
        }

        if let Some(over) = self.overrides.get(name) {
            return self.apply_override(over);
        }

        let outcome = self.panics.run("evaluate", || self.evaluate_against_store(kind, name, user));
        outcome.unwrap_or_else(|| EvalResult::unrecognized(self.uninitialized_details()))
    }

    fn apply_override(&self, over: Override) -> EvalResult {
        let details = self.uninitialized_details();
        match over {
            Override::Gate(value) => EvalResult::local_override(value, json!(value), details),
            Override::Config(value) => EvalResult::local_override(value.as_bool().unwrap_or(false), value, details),
        }
    }

    fn evaluate_against_store(&self, kind: SpecKind, name: &str, user: &User) -> EvalResult {
        let Some(store) = self.state.read().expect("client state lock poisoned").clone() else {
            return EvalResult::unrecognized(self.uninitialized_details());
        };
        let snapshot = store.snapshot();

        let spec = match kind {
            SpecKind::Gate => snapshot.get_gate(name),
            SpecKind::DynamicConfig | SpecKind::Experiment => snapshot.get_dynamic_config(name),
            SpecKind::Layer => snapshot.get_layer(name),
        };

        if let Some(sticky) = spec.filter(|spec| spec.is_active_experiment()).and_then(|spec| self.load_sticky(spec, user)) {
            return sticky;
        }

        let ctx = EvalContext::new();
        let mut evaluator = Evaluator::new(&snapshot, self.clock.as_ref());
        if let Some(lookup) = &self.ip_lookup {
            evaluator = evaluator.with_ip_lookup(lookup.as_ref());
        }
        if let Some(lookup) = &self.ua_lookup {
            evaluator = evaluator.with_ua_lookup(lookup.as_ref());
        }

        let result = match kind {
            SpecKind::Gate => evaluator.eval_gate(name, user, &ctx),
            SpecKind::DynamicConfig | SpecKind::Experiment => evaluator.eval_config(name, user, &ctx),
            SpecKind::Layer => evaluator.eval_layer(name, user, &ctx),
        };

        let result = result.unwrap_or_else(|_| EvalResult::unrecognized(self.uninitialized_details()));

        if let Some(spec) = spec.filter(|spec| spec.is_active_experiment()) {
            self.save_sticky(spec, user, name, &result);
        }

        result
    }

    fn load_sticky(&self, spec: &ConfigSpec, user: &User) -> Option<EvalResult> {
        let storage = self.persistent_storage.as_deref()?;
        let mediator = PersistedMediator::new(storage);
        let loaded = mediator.load(user, &spec.id_type);
        let values = loaded.get(spec.name.as_str())?;
        Some(result_from_sticky(spec, values, self.uninitialized_details()))
    }

    fn save_sticky(&self, spec: &ConfigSpec, user: &User, name: &str, result: &EvalResult) {
        let Some(storage) = self.persistent_storage.as_deref() else {
            return;
        };
        let mediator = PersistedMediator::new(storage);
        if should_persist(spec.is_active_experiment(), result.is_experiment_group) {
            mediator.save(user, &spec.id_type, name, sticky_from_result(result));
        } else if result.is_experiment_group == Some(false) {
            mediator.delete(user, &spec.id_type, name);
        }
    }

    fn build_event(
        &self,
        kind: ExposureKind,
        name: &str,
        user: &User,
        result: &EvalResult,
        is_manual_exposure: bool,
    ) -> ExposureEvent {
        ExposureEvent {
            kind,
            name: name.to_string(),
            rule_id: result.rule_id.as_str().to_string(),
            value: result.json_value.clone(),
            secondary_exposures: result.secondary_exposures.clone(),
            evaluation_details: result.evaluation_details,
            user: user.clone(),
            time: self.clock.unix_seconds(),
            is_manual_exposure,
        }
    }

    fn uninitialized_details(&self) -> EvaluationDetails {
        EvaluationDetails {
            source: SnapshotSource::Uninitialized,
            reason: EvalReason::Unrecognized,
            config_sync_time: 0,
            init_time: 0,
            server_time: self.clock.unix_seconds(),
            has_seen_analytical_gates: false,
        }
    }
}

fn result_from_sticky(spec: &ConfigSpec, values: &StickyValues, details: EvaluationDetails) -> EvalResult {
    EvalResult {
        value: values.value,
        json_value: values.json_value.clone(),
        rule_id: gatekit_core::identifiers::RuleId::new(values.rule_id.as_str()),
        group_name: values.group_name.as_deref().map(gatekit_core::identifiers::GroupName::new),
        id_type: gatekit_core::identifiers::IdType::new(spec.id_type.as_str()),
        secondary_exposures: values.secondary_exposures.clone(),
        undelegated_secondary_exposures: values.undelegated_secondary_exposures.clone(),
        config_delegate: values.config_delegate.as_deref().map(gatekit_core::identifiers::SpecName::new),
        explicit_parameters: values.explicit_parameters.clone(),
        evaluation_details: EvaluationDetails {
            reason: EvalReason::Persisted,
            config_sync_time: values.time,
            ..details
        },
        is_experiment_group: Some(true),
        derived_device_metadata: None,
        unsupported: false,
    }
}

fn sticky_from_result(result: &EvalResult) -> StickyValues {
    StickyValues {
        value: result.value,
        json_value: result.json_value.clone(),
        rule_id: result.rule_id.as_str().to_string(),
        group_name: result.group_name.as_ref().map(|name| name.as_str().to_string()),
        secondary_exposures: result.secondary_exposures.clone(),
        undelegated_secondary_exposures: result.undelegated_secondary_exposures.clone(),
        config_delegate: result.config_delegate.as_ref().map(|name| name.as_str().to_string()),
        explicit_parameters: result.explicit_parameters.clone(),
        time: result.evaluation_details.config_sync_time,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use gatekit_core::clock::FakeClock;
    use gatekit_core::interfaces::DataAdapterError;
    use gatekit_core::interfaces::PersistentStorageError;
    use gatekit_core::interfaces::TransportError;
    use gatekit_core::spec::IdListDirectory;
    use gatekit_core::spec::WireConfigSpec;
    use gatekit_core::spec::WireSpecPayload;
    use gatekit_core::spec::rule::WireRule;
    use gatekit_store::StoreOptions;

    use super::*;

    struct GateTransport;

    impl Transport for GateTransport {
        fn download_config_specs(&self, _since_time: i64) -> Result<WireSpecPayload, TransportError> {
            Ok(WireSpecPayload {
                has_updates: true,
                time: 1,
                feature_gates: vec![WireConfigSpec {
                    name: gatekit_core::identifiers::SpecName::new("always_on"),
                    spec_type: gatekit_core::spec::SpecType::FeatureGate,
                    salt: "s".to_string(),
                    enabled: true,
                    rules: vec![WireRule {
                        id: gatekit_core::identifiers::RuleId::new("rule_1"),
                        group_name: None,
                        salt: None,
                        pass_percentage: 100.0,
                        conditions: vec![gatekit_core::spec::condition::WireCondition {
                            condition_type: gatekit_core::spec::condition::ConditionType::Public,
                            operator: None,
                            field: None,
                            target_value: serde_json::Value::Null,
                            additional_values: serde_json::Value::Null,
                            id_type: gatekit_core::identifiers::IdType::new(""),
                        }],
                        return_value: serde_json::json!(true),
                        id_type: gatekit_core::identifiers::IdType::new(""),
                        config_delegate: None,
                        is_experiment_group: None,
                    }],
                    default_value: serde_json::json!(false),
                    id_type: String::new(),
                    entity: None,
                    explicit_parameters: std::collections::BTreeSet::new(),
                    is_active: None,
                    has_shared_params: false,
                    target_app_ids: Vec::new(),
                }],
                dynamic_configs: vec![WireConfigSpec {
                    name: gatekit_core::identifiers::SpecName::new("my_experiment"),
                    spec_type: gatekit_core::spec::SpecType::DynamicConfig,
                    salt: "s".to_string(),
                    enabled: true,
                    rules: vec![WireRule {
                        id: gatekit_core::identifiers::RuleId::new("rule_1"),
                        group_name: Some(gatekit_core::identifiers::GroupName::new("Test")),
                        salt: None,
                        pass_percentage: 100.0,
                        conditions: vec![gatekit_core::spec::condition::WireCondition {
                            condition_type: gatekit_core::spec::condition::ConditionType::Public,
                            operator: None,
                            field: None,
                            target_value: serde_json::Value::Null,
                            additional_values: serde_json::Value::Null,
                            id_type: gatekit_core::identifiers::IdType::new(""),
                        }],
                        return_value: serde_json::json!({"color": "blue"}),
                        id_type: gatekit_core::identifiers::IdType::new(""),
                        config_delegate: None,
                        is_experiment_group: Some(true),
                    }],
                    default_value: serde_json::json!({}),
                    id_type: String::new(),
                    entity: None,
                    explicit_parameters: std::collections::BTreeSet::new(),
                    is_active: Some(true),
                    has_shared_params: false,
                    target_app_ids: Vec::new(),
                }],
                layer_configs: Vec::new(),
                layers: BTreeMap::new(),
                id_lists: BTreeMap::new(),
                sdk_keys_to_app_ids: BTreeMap::new(),
                hashed_sdk_keys_to_app_ids: BTreeMap::new(),
                hashed_sdk_key_used: None,
            })
        }

        fn get_id_lists(&self) -> Result<IdListDirectory, TransportError> {
            Ok(IdListDirectory::new())
        }

        fn get_id_list(&self, _url: &str, _range_start: u64) -> Result<Vec<u8>, TransportError> {
            Ok(Vec::new())
        }

        fn post(&self, _path: &str, _body: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }
    }

    struct BlockingTransport {
        unblocked: AtomicBool,
    }

    impl Transport for BlockingTransport {
        fn download_config_specs(&self, _since_time: i64) -> Result<WireSpecPayload, TransportError> {
            while !self.unblocked.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(WireSpecPayload {
                has_updates: true,
                time: 1,
                feature_gates: Vec::new(),
                dynamic_configs: Vec::new(),
                layer_configs: Vec::new(),
                layers: BTreeMap::new(),
                id_lists: BTreeMap::new(),
                sdk_keys_to_app_ids: BTreeMap::new(),
                hashed_sdk_keys_to_app_ids: BTreeMap::new(),
                hashed_sdk_key_used: None,
            })
        }

        fn get_id_lists(&self) -> Result<IdListDirectory, TransportError> {
            Ok(IdListDirectory::new())
        }

        fn get_id_list(&self, _url: &str, _range_start: u64) -> Result<Vec<u8>, TransportError> {
            Ok(Vec::new())
        }

        fn post(&self, _path: &str, _body: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn fast_store_options() -> StoreOptions {
        StoreOptions {
            config_sync_interval: Duration::from_secs(3600),
            id_list_sync_interval: Duration::from_secs(3600),
            bootstrap_values: None,
            enable_id_lists: false,
        }
    }

    #[test]
    fn check_gate_reads_through_to_the_installed_snapshot() {
        let client = Client::with_collaborators(
            "secret",
            ClientOptions {
                store: fast_store_options(),
                init_timeout: Duration::from_secs(5),
                ..ClientOptions::default()
            },
            Arc::new(GateTransport),
            None,
            None,
            Arc::new(FakeClock::new(1_700_000_000_000)),
            Arc::new(NoopObservabilityClient),
        )
        .expect("initializes");

        assert!(client.check_gate("always_on", &User::with_user_id("u1")));
        assert!(!client.check_gate("missing", &User::with_user_id("u1")));
        client.shutdown();
    }

    #[test]
    fn init_timeout_returns_an_uninitialized_client_instead_of_blocking() {
        let client = Client::with_collaborators(
            "secret",
            ClientOptions {
                store: fast_store_options(),
                init_timeout: Duration::from_millis(20),
                ..ClientOptions::default()
            },
            Arc::new(BlockingTransport { unblocked: AtomicBool::new(false) }),
            None,
            None,
            Arc::new(FakeClock::new(1_700_000_000_000)),
            Arc::new(NoopObservabilityClient),
        )
        .expect("returns a client rather than erroring");

        assert!(!client.check_gate("whatever", &User::with_user_id("u1")));
        client.shutdown();
    }

    #[test]
    fn gate_override_short_circuits_evaluation() {
        let client = Client::with_collaborators(
            "secret",
            ClientOptions {
                store: fast_store_options(),
                init_timeout: Duration::from_secs(5),
                ..ClientOptions::default()
            },
            Arc::new(GateTransport),
            None,
            None,
            Arc::new(FakeClock::new(1_700_000_000_000)),
            Arc::new(NoopObservabilityClient),
        )
        .expect("initializes");

        client.override_gate("always_on", false);
        assert!(!client.check_gate("always_on", &User::with_user_id("u1")));
        client.shutdown();
    }

    struct PanickingStorage;

    impl PersistentStorage for PanickingStorage {
        fn load(&self, _user_key: &str) -> Result<BTreeMap<String, StickyValues>, PersistentStorageError> {
            panic!("storage exploded");
        }

        fn save(&self, _user_key: &str, _config_name: &str, _values: StickyValues) -> Result<(), PersistentStorageError> {
            Ok(())
        }

        fn delete(&self, _user_key: &str, _config_name: &str) -> Result<(), PersistentStorageError> {
            Ok(())
        }
    }

    #[test]
    fn panicking_persistent_storage_does_not_take_down_get_experiment() {
        let client = Client::with_collaborators(
            "secret",
            ClientOptions {
                store: fast_store_options(),
                init_timeout: Duration::from_secs(5),
                ..ClientOptions::default()
            },
            Arc::new(GateTransport),
            None,
            Some(Arc::new(PanickingStorage)),
            Arc::new(FakeClock::new(1_700_000_000_000)),
            Arc::new(NoopObservabilityClient),
        )
        .expect("initializes");

        let result = client.get_experiment("my_experiment", &User::with_user_id("u1"));
        assert_eq!(result.json_value, serde_json::json!({"color": "blue"}));
        client.shutdown();
    }

    struct FailingAdapter;

    impl DataAdapter for FailingAdapter {
        fn initialize(&self) -> Result<(), DataAdapterError> {
            Ok(())
        }

        fn shutdown(&self) -> Result<(), DataAdapterError> {
            Err(DataAdapterError::AdapterFailure("boom".to_string()))
        }

        fn get(&self, _key: &str) -> Result<Option<String>, DataAdapterError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), DataAdapterError> {
            Ok(())
        }

        fn should_be_used_for_querying_updates(&self, _key: &str) -> bool {
            false
        }
    }

    #[test]
    fn shutdown_survives_a_failing_adapter_hook() {
        let client = Client::with_collaborators(
            "secret",
            ClientOptions {
                store: fast_store_options(),
                init_timeout: Duration::from_secs(5),
                ..ClientOptions::default()
            },
            Arc::new(GateTransport),
            Some(Arc::new(FailingAdapter)),
            None,
            Arc::new(FakeClock::new(1_700_000_000_000)),
            Arc::new(NoopObservabilityClient),
        )
        .expect("initializes");
        client.shutdown();
    }

    struct ExposureCapturingTransport {
        posted_bodies: Mutex<Vec<Vec<u8>>>,
    }

    impl Transport for ExposureCapturingTransport {
        fn download_config_specs(&self, since_time: i64) -> Result<WireSpecPayload, TransportError> {
            GateTransport.download_config_specs(since_time)
        }

        fn get_id_lists(&self) -> Result<IdListDirectory, TransportError> {
            Ok(IdListDirectory::new())
        }

        fn get_id_list(&self, _url: &str, _range_start: u64) -> Result<Vec<u8>, TransportError> {
            Ok(Vec::new())
        }

        fn post(&self, _path: &str, body: &[u8]) -> Result<(), TransportError> {
            self.posted_bodies.lock().expect("lock").push(body.to_vec());
            Ok(())
        }
    }

    #[test]
    fn manually_logged_exposure_is_tagged_as_manual() {
        let transport = Arc::new(ExposureCapturingTransport { posted_bodies: Mutex::new(Vec::new()) });
        let client = Client::with_collaborators(
            "secret",
            ClientOptions {
                store: fast_store_options(),
                init_timeout: Duration::from_secs(5),
                ..ClientOptions::default()
            },
            Arc::clone(&transport) as Arc<dyn Transport>,
            None,
            None,
            Arc::new(FakeClock::new(1_700_000_000_000)),
            Arc::new(NoopObservabilityClient),
        )
        .expect("initializes");

        let user = User::with_user_id("u1");
        client.manually_log_exposure(ExposureKind::Gate, "always_on", &user);
        assert!(client.check_gate("always_on", &user));
        client.shutdown();

        let bodies = transport.posted_bodies.lock().expect("lock");
        let events: Vec<serde_json::Value> = bodies
            .iter()
            .flat_map(|body| serde_json::from_slice::<Vec<serde_json::Value>>(body).unwrap_or_default())
            .collect();
        let manual_count = events.iter().filter(|event| event["is_manual_exposure"] == serde_json::json!(true)).count();
        let automatic_count = events.iter().filter(|event| event["is_manual_exposure"] == serde_json::json!(false)).count();
        assert_eq!(manual_count, 1);
        assert_eq!(automatic_count, 1);
    }
}
