// crates/gatekit-eval/src/evaluator.rs
// ============================================================================
// Module: Gatekit Evaluator
// Description: The recursive gate/dynamic-config/layer evaluation algorithm.
// Purpose: §4.E "Evaluation algorithm".
// Dependencies: gatekit-core
// ============================================================================

//! ## Overview
//! [`Evaluator`] borrows one [`Snapshot`] and a [`Clock`] for the lifetime
//! of a single call. Its three public entry points — [`Evaluator::eval_gate`],
//! [`Evaluator::eval_config`], [`Evaluator::eval_layer`] — share one private
//! rule-matching loop ([`Evaluator::eval_spec`]) that walks a spec's rules in
//! order, evaluates each rule's conditions via [`crate::conditions`], and
//! either returns the first rule that both matches and buckets, delegates to
//! another dynamic config, or falls through to the spec's default value.
//! Dependent-gate recursion (`pass_gate`/`fail_gate`) and delegate
//! recursion both route back through [`Evaluator::eval_gate`]/
//! [`Evaluator::eval_config`] with [`EvalContext::nested`], so
//! [`MAX_RECURSION_DEPTH`] bounds every recursive path uniformly.

use std::collections::BTreeMap;

use gatekit_core::EvalResult;
use gatekit_core::clock::Clock;
use gatekit_core::identifiers::SpecName;
use gatekit_core::interfaces::IpCountryLookup;
use gatekit_core::interfaces::UserAgentLookup;
use gatekit_core::result::EvalReason;
use gatekit_core::result::EvaluationDetails;
use gatekit_core::result::dedup_push_secondary_exposure;
use gatekit_core::snapshot::Snapshot;
use gatekit_core::spec::ConfigSpec;
use gatekit_core::spec::Rule;
use gatekit_core::user::User;
use serde_json::json;

use crate::bucketing::pass_percent;
use crate::conditions::evaluate_condition;
use crate::context::EvalContext;
use crate::error::EvaluatorError;
use crate::tristate::TriState;

/// Evaluates gates, dynamic configs, and layers against one [`Snapshot`].
pub struct Evaluator<'a> {
    snapshot: &'a Snapshot,
    clock: &'a dyn Clock,
    ip_lookup: Option<&'a dyn IpCountryLookup>,
    ua_lookup: Option<&'a dyn UserAgentLookup>,
}

impl<'a> Evaluator<'a> {
    /// Builds an evaluator over `snapshot`, reading wall-clock time through
    /// `clock`.
    #[must_use]
    pub fn new(snapshot: &'a Snapshot, clock: &'a dyn Clock) -> Self {
        Self {
            snapshot,
            clock,
            ip_lookup: None,
            ua_lookup: None,
        }
    }

    /// Attaches an IP→country lookup for `ip_based` conditions.
    #[must_use]
    pub fn with_ip_lookup(mut self, lookup: &'a dyn IpCountryLookup) -> Self {
        self.ip_lookup = Some(lookup);
        self
    }

    /// Attaches a User-Agent lookup for `ua_based` conditions.
    #[must_use]
    pub fn with_ua_lookup(mut self, lookup: &'a dyn UserAgentLookup) -> Self {
        self.ua_lookup = Some(lookup);
        self
    }

    /// Evaluates a feature gate.
    pub fn eval_gate(&self, name: &str, user: &User, ctx: &EvalContext) -> Result<EvalResult, EvaluatorError> {
        self.eval_named(&self.snapshot.gates, name, user, ctx)
    }

    /// Evaluates a dynamic config or experiment.
    pub fn eval_config(&self, name: &str, user: &User, ctx: &EvalContext) -> Result<EvalResult, EvaluatorError> {
        self.eval_named(&self.snapshot.dynamic_configs, name, user, ctx)
    }

    /// Evaluates a layer, resolving delegation to its allocated experiment
    /// exactly as [`Evaluator::eval_spec`] would for any `config_delegate`.
    pub fn eval_layer(&self, name: &str, user: &User, ctx: &EvalContext) -> Result<EvalResult, EvaluatorError> {
        self.eval_named(&self.snapshot.layers, name, user, ctx)
    }

    fn eval_named(
        &self,
        specs: &BTreeMap<String, ConfigSpec>,
        name: &str,
        user: &User,
        ctx: &EvalContext,
    ) -> Result<EvalResult, EvaluatorError> {
        let Some(spec) = specs.get(name) else {
            return Ok(EvalResult::unrecognized(self.details(EvalReason::Unrecognized, false)));
        };
        self.eval_spec(spec, user, ctx)
    }

    /// §4.E `eval`: disabled short-circuit, rule iteration, delegation,
    /// default fallback.
    fn eval_spec(&self, spec: &ConfigSpec, user: &User, ctx: &EvalContext) -> Result<EvalResult, EvaluatorError> {
        if !spec.enabled {
            return Ok(self.terminal_result(spec, Vec::new(), EvalReason::Disabled, false));
        }

        let mut secondary_exposures = Vec::new();
        let mut has_seen_analytical_gates = false;
        for rule in &spec.rules {
            let matched = match self.rule_conditions_hold(rule, user, ctx, &mut secondary_exposures, &mut has_seen_analytical_gates)? {
                TriState::True => true,
                TriState::False => false,
                TriState::Unknown => {
                    tracing::warn!(spec = %spec.name.as_str(), rule = %rule.id.as_str(), "unsupported condition; falling back to unsupported reason");
                    return Ok(self.terminal_result(spec, secondary_exposures, EvalReason::Unsupported, has_seen_analytical_gates));
                }
            };
            if !matched {
                continue;
            }
            if !pass_percent(user, rule, spec) {
                continue;
            }
            return self.finish_match(spec, rule, user, ctx, secondary_exposures, has_seen_analytical_gates);
        }

        Ok(self.terminal_result(spec, secondary_exposures, EvalReason::Default, has_seen_analytical_gates))
    }

    /// Evaluates every condition in a rule, short-circuiting to `Unknown` on
    /// the first unsupported condition and accumulating secondary exposures
    /// along the way (§4.E: all conditions must pass for the rule to match).
    fn rule_conditions_hold(
        &self,
        rule: &Rule,
        user: &User,
        ctx: &EvalContext,
        secondary_exposures: &mut Vec<gatekit_core::SecondaryExposure>,
        has_seen_analytical_gates: &mut bool,
    ) -> Result<TriState, EvaluatorError> {
        for condition in &rule.conditions {
            let needs_recursion = matches!(
                condition.condition_type,
                gatekit_core::spec::ConditionType::PassGate | gatekit_core::spec::ConditionType::FailGate
            );
            let nested_ctx = if needs_recursion {
                let Some(nested_ctx) = ctx.nested() else {
                    return Err(EvaluatorError::RecursionLimitExceeded);
                };
                Some(nested_ctx)
            } else {
                None
            };
            let outcome = evaluate_condition(
                condition,
                user,
                self.snapshot,
                self.clock,
                self.ip_lookup,
                self.ua_lookup,
                ctx.target_app_id.as_deref(),
                |gate_name| {
                    let call_ctx = nested_ctx.as_ref().unwrap_or(ctx);
                    self.eval_gate(gate_name, user, call_ctx)
                },
            )?;

            if let Some(exposure) = outcome.secondary_exposure {
                dedup_push_secondary_exposure(secondary_exposures, exposure);
            }
            if outcome.is_analytical_gate {
                *has_seen_analytical_gates = true;
            }

            match outcome.state {
                TriState::True => {}
                TriState::False => return Ok(TriState::False),
                TriState::Unknown => return Ok(TriState::Unknown),
            }
        }
        Ok(TriState::True)
    }

    /// Builds the result for a rule whose conditions held and which
    /// bucketed into the passing percentage, resolving `config_delegate`
    /// recursion when present (§4.E delegation, §8 scenario 3).
    fn finish_match(
        &self,
        spec: &ConfigSpec,
        rule: &Rule,
        user: &User,
        ctx: &EvalContext,
        secondary_exposures: Vec<gatekit_core::SecondaryExposure>,
        has_seen_analytical_gates: bool,
    ) -> Result<EvalResult, EvaluatorError> {
        let undelegated_secondary_exposures = secondary_exposures.clone();

        if let Some(delegate_name) = &rule.config_delegate {
            let Some(nested_ctx) = ctx.nested() else {
                return Err(EvaluatorError::RecursionLimitExceeded);
            };
            return self.finish_delegated_match(
                spec,
                rule,
                delegate_name,
                user,
                &nested_ctx,
                secondary_exposures,
                undelegated_secondary_exposures,
                has_seen_analytical_gates,
            );
        }

        Ok(EvalResult {
            value: rule.return_value.as_bool().unwrap_or(false),
            json_value: rule.return_value.clone(),
            rule_id: rule.id.clone(),
            group_name: rule.group_name.clone(),
            id_type: rule.id_type.clone(),
            secondary_exposures,
            undelegated_secondary_exposures,
            config_delegate: None,
            explicit_parameters: Vec::new(),
            evaluation_details: self.details(EvalReason::Rule, has_seen_analytical_gates),
            is_experiment_group: rule.is_experiment_group,
            derived_device_metadata: None,
            unsupported: false,
        })
    }

    /// Evaluates the delegate config and rewrites its result to carry the
    /// delegating rule's identity plus the union of both rules' secondary
    /// exposures, exactly as §4.E's delegation contract requires.
    fn finish_delegated_match(
        &self,
        spec: &ConfigSpec,
        rule: &Rule,
        delegate_name: &SpecName,
        user: &User,
        nested_ctx: &EvalContext,
        mut secondary_exposures: Vec<gatekit_core::SecondaryExposure>,
        undelegated_secondary_exposures: Vec<gatekit_core::SecondaryExposure>,
        has_seen_analytical_gates: bool,
    ) -> Result<EvalResult, EvaluatorError> {
        let delegate_result = self.eval_config(delegate_name.as_str(), user, nested_ctx)?;
        for exposure in &delegate_result.secondary_exposures {
            dedup_push_secondary_exposure(&mut secondary_exposures, exposure.clone());
        }
        let has_seen_analytical_gates =
            has_seen_analytical_gates || delegate_result.evaluation_details.has_seen_analytical_gates;

        let explicit_parameters: Vec<String> = self
            .snapshot
            .resolve_delegate(delegate_name)
            .map(|delegate_spec| delegate_spec.explicit_parameters.iter().cloned().collect())
            .unwrap_or_default();

        let mut explicit_parameters = explicit_parameters;
        if spec.has_shared_params {
            explicit_parameters.sort_unstable();
        }

        Ok(EvalResult {
            value: delegate_result.value,
            json_value: delegate_result.json_value,
            rule_id: delegate_result.rule_id,
            group_name: delegate_result.group_name,
            id_type: rule.id_type.clone(),
            secondary_exposures,
            undelegated_secondary_exposures,
            config_delegate: Some(delegate_name.clone()),
            explicit_parameters,
            evaluation_details: self.details(EvalReason::Rule, has_seen_analytical_gates),
            is_experiment_group: delegate_result.is_experiment_group,
            derived_device_metadata: None,
            unsupported: false,
        })
    }

    /// Builds a default/disabled/unsupported-reason result carrying
    /// whatever secondary exposures accumulated before the short-circuit.
    fn terminal_result(
        &self,
        spec: &ConfigSpec,
        secondary_exposures: Vec<gatekit_core::SecondaryExposure>,
        reason: EvalReason,
        has_seen_analytical_gates: bool,
    ) -> EvalResult {
        let is_unsupported = reason == EvalReason::Unsupported;
        EvalResult {
            value: spec.default_value.as_bool().unwrap_or(false),
            json_value: if is_unsupported { json!({}) } else { spec.default_value.clone() },
            rule_id: gatekit_core::identifiers::RuleId::new(rule_id_for(reason)),
            group_name: None,
            id_type: gatekit_core::identifiers::IdType::new(spec.id_type.as_str()),
            undelegated_secondary_exposures: secondary_exposures.clone(),
            secondary_exposures,
            config_delegate: None,
            explicit_parameters: Vec::new(),
            evaluation_details: self.details(reason, has_seen_analytical_gates),
            is_experiment_group: None,
            derived_device_metadata: None,
            unsupported: is_unsupported,
        }
    }

    fn details(&self, reason: EvalReason, has_seen_analytical_gates: bool) -> EvaluationDetails {
        EvaluationDetails {
            source: self.snapshot.source,
            reason,
            config_sync_time: self.snapshot.last_sync_time,
            init_time: self.snapshot.initial_sync_time,
            server_time: self.clock.unix_seconds(),
            has_seen_analytical_gates,
        }
    }
}

/// Sentinel rule id for a terminal (non-matched) result (§4.E).
const fn rule_id_for(reason: EvalReason) -> &'static str {
    match reason {
        EvalReason::Disabled => "disabled",
        EvalReason::Unsupported => "",
        _ => "default",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use gatekit_core::identifiers::IdType;
    use gatekit_core::identifiers::RuleId;
    use gatekit_core::identifiers::SpecName;
    use gatekit_core::spec::condition::Condition;
    use gatekit_core::spec::condition::ConditionType;
    use gatekit_core::spec::config_spec::SpecType;
    use gatekit_core::SystemClock;
    use serde_json::json;

    use super::*;

    fn public_condition() -> Condition {
        Condition {
            condition_type: ConditionType::Public,
            operator: None,
            field: None,
            target_value: serde_json::Value::Null,
            additional_values: serde_json::Value::Null,
            id_type: IdType::new(""),
            user_bucket_set: None,
            compiled_pattern: None,
        }
    }

    fn gate_with_rule(name: &str, percentage: f64, return_value: bool) -> ConfigSpec {
        ConfigSpec {
            name: SpecName::new(name),
            spec_type: SpecType::FeatureGate,
            salt: "salt".to_string(),
            enabled: true,
            rules: vec![Rule {
                id: RuleId::new("rule_1"),
                group_name: None,
                salt: None,
                pass_percentage: percentage,
                conditions: vec![public_condition()],
                return_value: json!(return_value),
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
        }
    }

    fn snapshot_with_gate(spec: ConfigSpec) -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.gates.insert(spec.name.as_str().to_string(), spec);
        snapshot
    }

    #[test]
    fn unrecognized_gate_returns_unrecognized_reason() {
        let snapshot = Snapshot::default();
        let clock = SystemClock;
        let evaluator = Evaluator::new(&snapshot, &clock);
        let result = evaluator
            .eval_gate("missing", &User::with_user_id("u1"), &EvalContext::new())
            .expect("no recursion");
        assert_eq!(result.evaluation_details.reason, EvalReason::Unrecognized);
        assert!(!result.value);
    }

    #[test]
    fn fully_rolled_out_public_gate_passes() {
        let snapshot = snapshot_with_gate(gate_with_rule("my_gate", 100.0, true));
        let clock = SystemClock;
        let evaluator = Evaluator::new(&snapshot, &clock);
        let result = evaluator
            .eval_gate("my_gate", &User::with_user_id("u1"), &EvalContext::new())
            .expect("no recursion");
        assert!(result.value);
        assert_eq!(result.evaluation_details.reason, EvalReason::Rule);
        assert_eq!(result.rule_id.as_str(), "rule_1");
    }

    #[test]
    fn zero_percent_rule_falls_through_to_default() {
        let snapshot = snapshot_with_gate(gate_with_rule("my_gate", 0.0, true));
        let clock = SystemClock;
        let evaluator = Evaluator::new(&snapshot, &clock);
        let result = evaluator
            .eval_gate("my_gate", &User::with_user_id("u1"), &EvalContext::new())
            .expect("no recursion");
        assert!(!result.value);
        assert_eq!(result.evaluation_details.reason, EvalReason::Default);
    }

    fn pass_gate_condition(target: &str) -> Condition {
        Condition {
            condition_type: ConditionType::PassGate,
            operator: None,
            field: None,
            target_value: json!(target),
            additional_values: serde_json::Value::Null,
            id_type: IdType::new(""),
            user_bucket_set: None,
            compiled_pattern: None,
        }
    }

    #[test]
    fn non_segment_dependent_gate_sets_analytical_gates_flag() {
        let dependency = gate_with_rule("dependency_gate", 100.0, true);
        let mut main = gate_with_rule("main_gate", 100.0, true);
        main.rules[0].conditions = vec![pass_gate_condition("dependency_gate")];

        let mut snapshot = Snapshot::default();
        snapshot.gates.insert(dependency.name.as_str().to_string(), dependency);
        snapshot.gates.insert(main.name.as_str().to_string(), main);
        let clock = SystemClock;
        let evaluator = Evaluator::new(&snapshot, &clock);
        let result = evaluator
            .eval_gate("main_gate", &User::with_user_id("u1"), &EvalContext::new())
            .expect("no recursion");
        assert!(result.value);
        assert!(result.evaluation_details.has_seen_analytical_gates);
    }

    #[test]
    fn segment_prefixed_dependent_gate_does_not_set_analytical_gates_flag() {
        let dependency = gate_with_rule("segment:internal", 100.0, true);
        let mut main = gate_with_rule("main_gate", 100.0, true);
        main.rules[0].conditions = vec![pass_gate_condition("segment:internal")];

        let mut snapshot = Snapshot::default();
        snapshot.gates.insert(dependency.name.as_str().to_string(), dependency);
        snapshot.gates.insert(main.name.as_str().to_string(), main);
        let clock = SystemClock;
        let evaluator = Evaluator::new(&snapshot, &clock);
        let result = evaluator
            .eval_gate("main_gate", &User::with_user_id("u1"), &EvalContext::new())
            .expect("no recursion");
        assert!(result.value);
        assert!(!result.evaluation_details.has_seen_analytical_gates);
    }

    #[test]
    fn disabled_gate_short_circuits_before_rules() {
        let mut spec = gate_with_rule("my_gate", 100.0, true);
        spec.enabled = false;
        let snapshot = snapshot_with_gate(spec);
        let clock = SystemClock;
        let evaluator = Evaluator::new(&snapshot, &clock);
        let result = evaluator
            .eval_gate("my_gate", &User::with_user_id("u1"), &EvalContext::new())
            .expect("no recursion");
        assert_eq!(result.evaluation_details.reason, EvalReason::Disabled);
        assert_eq!(result.rule_id.as_str(), "disabled");
    }
}
