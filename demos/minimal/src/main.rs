// demos/minimal/src/main.rs
// ============================================================================
// Module: Gatekit Minimal Demo
// Description: Minimal end-to-end Gatekit client run using in-memory
// collaborators.
// Purpose: Demonstrate Client construction, check_gate, and get_experiment.
// Dependencies: gatekit-client, gatekit-core
// ============================================================================

//! ## Overview
//! Runs a minimal Gatekit client against an in-memory spec payload. This
//! demo is backend-agnostic and suitable for quick verification; it does not
//! talk to any network.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;

use gatekit_client::Client;
use gatekit_client::ClientOptions;
use gatekit_core::identifiers::GroupName;
use gatekit_core::identifiers::IdType;
use gatekit_core::identifiers::RuleId;
use gatekit_core::identifiers::SpecName;
use gatekit_core::interfaces::DataAdapter;
use gatekit_core::interfaces::DataAdapterError;
use gatekit_core::interfaces::PersistentStorage;
use gatekit_core::interfaces::PersistentStorageError;
use gatekit_core::interfaces::StickyValues;
use gatekit_core::interfaces::Transport;
use gatekit_core::interfaces::TransportError;
use gatekit_core::spec::ConditionType;
use gatekit_core::spec::IdListDirectory;
use gatekit_core::spec::SpecType;
use gatekit_core::spec::WireCondition;
use gatekit_core::spec::WireConfigSpec;
use gatekit_core::spec::WireRule;
use gatekit_core::spec::WireSpecPayload;
use gatekit_core::user::User;
use serde_json::json;

/// Error type for demo preconditions.
#[derive(Debug)]
struct DemoError(String);

impl std::fmt::Display for DemoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for DemoError {}

/// Transport that serves a single feature gate and a single active
/// experiment from an in-memory payload, never touching the network.
struct InMemoryTransport;

impl Transport for InMemoryTransport {
    fn download_config_specs(&self, _since_time: i64) -> Result<WireSpecPayload, TransportError> {
        Ok(WireSpecPayload {
            has_updates: true,
            time: 1,
            feature_gates: vec![WireConfigSpec {
                name: SpecName::new("new_checkout"),
                spec_type: SpecType::FeatureGate,
                salt: "checkout-salt".to_string(),
                enabled: true,
                rules: vec![WireRule {
                    id: RuleId::new("rollout"),
                    group_name: None,
                    salt: None,
                    pass_percentage: 100.0,
                    conditions: vec![WireCondition {
                        condition_type: ConditionType::Public,
                        operator: None,
                        field: None,
                        target_value: serde_json::Value::Null,
                        additional_values: serde_json::Value::Null,
                        id_type: IdType::new(""),
                    }],
                    return_value: json!(true),
                    id_type: IdType::new(""),
                    config_delegate: None,
                    is_experiment_group: None,
                }],
                default_value: json!(false),
                id_type: String::new(),
                entity: None,
                explicit_parameters: BTreeSet::new(),
                is_active: None,
                has_shared_params: false,
                target_app_ids: Vec::new(),
            }],
            dynamic_configs: vec![WireConfigSpec {
                name: SpecName::new("button_color_experiment"),
                spec_type: SpecType::DynamicConfig,
                salt: "experiment-salt".to_string(),
                enabled: true,
                rules: vec![WireRule {
                    id: RuleId::new("treatment"),
                    group_name: Some(GroupName::new("Treatment")),
                    salt: None,
                    pass_percentage: 100.0,
                    conditions: vec![WireCondition {
                        condition_type: ConditionType::Public,
                        operator: None,
                        field: None,
                        target_value: serde_json::Value::Null,
                        additional_values: serde_json::Value::Null,
                        id_type: IdType::new(""),
                    }],
                    return_value: json!({"color": "teal"}),
                    id_type: IdType::new(""),
                    config_delegate: None,
                    is_experiment_group: Some(true),
                }],
                default_value: json!({"color": "blue"}),
                id_type: String::new(),
                entity: None,
                explicit_parameters: BTreeSet::new(),
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

/// Data adapter backed by an in-process map, used only to demonstrate the
/// wiring point; this demo's transport always serves a full payload anyway.
#[derive(Default)]
struct InMemoryDataAdapter {
    entries: Mutex<BTreeMap<String, String>>,
}

impl DataAdapter for InMemoryDataAdapter {
    fn initialize(&self) -> Result<(), DataAdapterError> {
        Ok(())
    }

    fn shutdown(&self) -> Result<(), DataAdapterError> {
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, DataAdapterError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| DataAdapterError::AdapterFailure("adapter mutex poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DataAdapterError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DataAdapterError::AdapterFailure("adapter mutex poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn should_be_used_for_querying_updates(&self, _key: &str) -> bool {
        false
    }
}

/// Sticky-experiment storage backed by an in-process map.
#[derive(Default)]
struct InMemoryPersistentStorage {
    rows: Mutex<BTreeMap<String, BTreeMap<String, StickyValues>>>,
}

impl PersistentStorage for InMemoryPersistentStorage {
    fn load(&self, user_key: &str) -> Result<BTreeMap<String, StickyValues>, PersistentStorageError> {
        Ok(self
            .rows
            .lock()
            .map_err(|_| PersistentStorageError::AdapterFailure("storage mutex poisoned".to_string()))?
            .get(user_key)
            .cloned()
            .unwrap_or_default())
    }

    fn save(&self, user_key: &str, config_name: &str, values: StickyValues) -> Result<(), PersistentStorageError> {
        self.rows
            .lock()
            .map_err(|_| PersistentStorageError::AdapterFailure("storage mutex poisoned".to_string()))?
            .entry(user_key.to_string())
            .or_default()
            .insert(config_name.to_string(), values);
        Ok(())
    }

    fn delete(&self, user_key: &str, config_name: &str) -> Result<(), PersistentStorageError> {
        if let Some(row) = self
            .rows
            .lock()
            .map_err(|_| PersistentStorageError::AdapterFailure("storage mutex poisoned".to_string()))?
            .get_mut(user_key)
        {
            row.remove(config_name);
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let options = ClientOptions {
        init_timeout: Duration::from_secs(5),
        ..ClientOptions::default()
    };

    let client = Client::new(
        "demo-sdk-key",
        options,
        std::sync::Arc::new(InMemoryTransport),
        Some(std::sync::Arc::new(InMemoryDataAdapter::default())),
        Some(std::sync::Arc::new(InMemoryPersistentStorage::default())),
    )
    .map_err(|err| DemoError(err.to_string()))?;

    let user = User::with_user_id("demo-user-1");

    let checkout_enabled = client.check_gate("new_checkout", &user);
    tracing::info!(checkout_enabled, "evaluated feature gate");

    let experiment = client.get_experiment("button_color_experiment", &user);
    tracing::info!(value = %experiment.json_value, rule_id = %experiment.rule_id, "evaluated experiment");

    client.shutdown();
    Ok(())
}
