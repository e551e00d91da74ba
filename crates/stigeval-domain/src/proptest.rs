//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Set comparison semantics
//! - Not-applicable gating and zero impact
//! - OR alternation across check groups
//! - Deterministic, repeatable evaluation

use crate::assertion::{set_equals, set_includes};
use crate::cancel::CancelToken;
use crate::engine::{EvalContext, evaluate, evaluate_control};
use crate::error::ProviderError;
use crate::model::{
    ApplicabilityRule, Assertion, Branch, BranchId, Branching, CheckGroup, Control, ControlTags,
    FactQuery, RoleClass, RoleExclusion, ValueExpr,
};
use crate::provider::MemoryProvider;
use crate::test_support::{policy, role_facts};
use proptest::prelude::*;
use stigeval_types::{Impact, Status, Value, ids};

// ============================================================================
// Strategies
// ============================================================================

fn arb_sid() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(ids::SID_BUILTIN_GUESTS.to_string()),
        (1000u32..1100, 500u32..520).prop_map(|(d, rid)| format!("S-1-5-21-{d}-{rid}")),
    ]
}

fn arb_sid_set() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(arb_sid(), 0..6).prop_map(|s| s.into_iter().collect())
}

fn arb_impact() -> impl Strategy<Value = Impact> {
    (0u32..=10).prop_map(|n| Impact::new(f64::from(n) / 10.0).unwrap_or(Impact::ZERO))
}

fn right() -> FactQuery {
    FactQuery::security_policy("SeDenyInteractiveLogonRight")
}

/// DC-excluded control with one set-equality group per expected set.
fn alternation_control(impact: Impact, expected: &[Vec<String>]) -> Control {
    Control {
        id: "V-PROP".to_string(),
        title: "property".to_string(),
        impact,
        tags: ControlTags::default(),
        applicability: ApplicabilityRule {
            exclude: Some(RoleExclusion {
                roles: vec![RoleClass::DomainController],
                note: "dc".to_string(),
            }),
            branching: Branching::Single,
            exemptions: Vec::new(),
        },
        branches: vec![Branch::any_of(
            BranchId::All,
            expected
                .iter()
                .map(|set| {
                    CheckGroup::all(vec![Assertion::set_equals(
                        right(),
                        ValueExpr::literal(Value::List(set.clone())),
                    )])
                })
                .collect(),
        )],
    }
}

/// The same alternation on both membership branches.
fn membership_control(impact: Impact, expected: &[Vec<String>]) -> Control {
    let single = alternation_control(impact, expected);
    let groups = single.branches[0].any_of.clone();
    Control {
        applicability: ApplicabilityRule {
            branching: Branching::ByMembership,
            ..single.applicability
        },
        branches: vec![
            Branch::any_of(BranchId::Workgroup, groups.clone()),
            Branch::any_of(BranchId::Domain, groups),
        ],
        ..single
    }
}

fn run(control: &Control, provider: &MemoryProvider) -> Option<stigeval_types::ControlResult> {
    let policy = policy();
    let cancel = CancelToken::new();
    let ctx = EvalContext {
        provider,
        policy: &policy,
        cancel: &cancel,
    };
    evaluate_control(control, &ctx).ok()
}

// ============================================================================
// Set semantics
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn set_equals_ignores_order(set in arb_sid_set(), seed in any::<u64>()) {
        let mut shuffled = set.clone();
        let len = shuffled.len();
        if len > 1 {
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();
        }
        prop_assert!(set_equals(&Value::List(shuffled), &Value::List(set)));
    }

    #[test]
    fn set_equals_is_symmetric(a in arb_sid_set(), b in arb_sid_set()) {
        let (a, b) = (Value::List(a), Value::List(b));
        prop_assert_eq!(set_equals(&a, &b), set_equals(&b, &a));
    }

    #[test]
    fn every_member_is_included(set in arb_sid_set()) {
        let actual = Value::List(set.clone());
        for sid in set {
            prop_assert!(set_includes(&actual, &Value::Text(sid)));
        }
    }
}

// ============================================================================
// Engine invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn domain_controllers_are_always_not_applicable(
        role in 4i64..=5,
        impact in arb_impact(),
        actual in arb_sid_set(),
        expected in arb_sid_set(),
    ) {
        let provider = role_facts(MemoryProvider::new(), role, "corp.example")
            .with(right(), Value::List(actual));
        let control = alternation_control(impact, &[expected]);

        let result = run(&control, &provider).expect("not cancelled");
        prop_assert_eq!(result.status, Status::NotApplicable);
        prop_assert_eq!(result.impact, Impact::ZERO);
        prop_assert!(result.evidence.is_empty());
        prop_assert_eq!(provider.queried(), vec![FactQuery::new(ids::FACT_DOMAIN_ROLE)]);
    }

    #[test]
    fn domain_controllers_never_read_membership(
        role in 4i64..=5,
        domain in prop_oneof![
            Just(None),
            Just(Some("WORKGROUP")),
            Just(Some("corp.example")),
        ],
        fail_domain in any::<bool>(),
        actual in arb_sid_set(),
        expected in arb_sid_set(),
    ) {
        let mut provider = MemoryProvider::new()
            .with(FactQuery::new(ids::FACT_DOMAIN_ROLE), Value::text(role.to_string()))
            .with(right(), Value::List(actual));
        if fail_domain {
            provider = provider.with_error(
                FactQuery::new(ids::FACT_DOMAIN_NAME),
                ProviderError::Timeout(5000),
            );
        } else if let Some(domain) = domain {
            provider = provider.with(FactQuery::new(ids::FACT_DOMAIN_NAME), Value::text(domain));
        }

        let result = run(&membership_control(Impact::MEDIUM, &[expected]), &provider)
            .expect("not cancelled");
        prop_assert_eq!(result.status, Status::NotApplicable);
        prop_assert_eq!(result.impact, Impact::ZERO);
        prop_assert_eq!(provider.queried(), vec![FactQuery::new(ids::FACT_DOMAIN_ROLE)]);
    }

    #[test]
    fn any_matching_group_passes(
        role in 0i64..=3,
        actual in arb_sid_set(),
        decoys in prop::collection::vec(arb_sid_set(), 0..3),
        position in 0usize..4,
    ) {
        let mut groups: Vec<Vec<String>> = decoys
            .into_iter()
            .filter(|d| !set_equals(&Value::List(d.clone()), &Value::List(actual.clone())))
            .collect();
        let failing = groups.clone();
        groups.insert(position.min(groups.len()), actual.clone());

        let provider = role_facts(MemoryProvider::new(), role, "WORKGROUP")
            .with(right(), Value::List(actual));

        let result = run(&alternation_control(Impact::MEDIUM, &groups), &provider)
            .expect("not cancelled");
        prop_assert_eq!(result.status, Status::Passed);

        if !failing.is_empty() {
            let result = run(&alternation_control(Impact::MEDIUM, &failing), &provider)
                .expect("not cancelled");
            prop_assert_eq!(result.status, Status::Failed);
            prop_assert_eq!(result.impact, Impact::MEDIUM);
        }
    }

    #[test]
    fn evaluation_is_repeatable(
        role in 0i64..=5,
        actual in arb_sid_set(),
        expected in prop::collection::vec(arb_sid_set(), 1..3),
    ) {
        let provider = role_facts(MemoryProvider::new(), role, "corp.example")
            .with(right(), Value::List(actual));
        let controls = vec![alternation_control(Impact::MEDIUM, &expected)];
        let policy = policy();
        let cancel = CancelToken::new();
        let ctx = EvalContext {
            provider: &provider,
            policy: &policy,
            cancel: &cancel,
        };

        let first = evaluate(&controls, &ctx);
        let second = evaluate(&controls, &ctx);
        prop_assert_eq!(first.verdict, second.verdict);
        prop_assert_eq!(first.results, second.results);
        prop_assert_eq!(first.data, second.data);
    }
}
