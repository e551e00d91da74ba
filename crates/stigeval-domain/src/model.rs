use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use stigeval_types::{Impact, Value, ids};

/// A named question for the fact provider: the fact name plus string parameters.
///
/// Registry facts are keyed by value name with `source = registry` and the key path;
/// security-policy facts by user-right name with `source = security_policy`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactQuery {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl FactQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn registry(key: &str, value_name: &str) -> Self {
        Self::new(value_name)
            .with_param(ids::PARAM_SOURCE, ids::SOURCE_REGISTRY)
            .with_param(ids::PARAM_KEY, key)
    }

    pub fn security_policy(right: &str) -> Self {
        Self::new(right).with_param(ids::PARAM_SOURCE, ids::SOURCE_SECURITY_POLICY)
    }

    pub fn account_sid(account: &str) -> Self {
        Self::new(ids::LOOKUP_ACCOUNT_SID).with_param(ids::PARAM_ACCOUNT, account)
    }
}

impl fmt::Display for FactQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.params.is_empty() {
            return Ok(());
        }
        f.write_str("[")?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("]")
    }
}

/// Expected value of an assertion: either fixed, or looked up at evaluation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueExpr {
    Literal { value: Value },
    Lookup { query: FactQuery },
}

impl ValueExpr {
    pub fn literal(value: impl Into<Value>) -> Self {
        ValueExpr::Literal {
            value: value.into(),
        }
    }

    pub fn lookup(query: FactQuery) -> Self {
        ValueExpr::Lookup { query }
    }

    pub fn account_sid(account: &str) -> Self {
        Self::lookup(FactQuery::account_sid(account))
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExpr::Literal { value } => write!(f, "{value}"),
            ValueExpr::Lookup { query } => write!(f, "lookup {query}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Check {
    Exists,
    Equals { expected: ValueExpr },
    SetEquals { expected: ValueExpr },
    SetIncludes { expected: ValueExpr },
}

impl Check {
    pub fn expected(&self) -> Option<&ValueExpr> {
        match self {
            Check::Exists => None,
            Check::Equals { expected }
            | Check::SetEquals { expected }
            | Check::SetIncludes { expected } => Some(expected),
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Exists => f.write_str("exists"),
            Check::Equals { expected } => write!(f, "equals {expected}"),
            Check::SetEquals { expected } => write!(f, "set equals {expected}"),
            Check::SetIncludes { expected } => write!(f, "includes {expected}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub fact: FactQuery,
    pub check: Check,
}

impl Assertion {
    pub fn exists(fact: FactQuery) -> Self {
        Self {
            fact,
            check: Check::Exists,
        }
    }

    pub fn equals(fact: FactQuery, expected: ValueExpr) -> Self {
        Self {
            fact,
            check: Check::Equals { expected },
        }
    }

    pub fn set_equals(fact: FactQuery, expected: ValueExpr) -> Self {
        Self {
            fact,
            check: Check::SetEquals { expected },
        }
    }

    pub fn includes(fact: FactQuery, expected: ValueExpr) -> Self {
        Self {
            fact,
            check: Check::SetIncludes { expected },
        }
    }
}

/// Assertions that must all hold (logical AND).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckGroup {
    pub all: Vec<Assertion>,
}

impl CheckGroup {
    pub fn all(assertions: Vec<Assertion>) -> Self {
        Self { all: assertions }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchId {
    All,
    Workgroup,
    Domain,
}

impl BranchId {
    pub fn as_str(self) -> &'static str {
        match self {
            BranchId::All => "all",
            BranchId::Workgroup => "workgroup",
            BranchId::Domain => "domain",
        }
    }
}

/// Accepted configuration variants for one applicability branch (logical OR over groups).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub any_of: Vec<CheckGroup>,
}

impl Branch {
    pub fn any_of(id: BranchId, groups: Vec<CheckGroup>) -> Self {
        Self { id, any_of: groups }
    }
}

/// Coarse host role categories a rule can exclude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleClass {
    Workstation,
    StandaloneServer,
    MemberServer,
    DomainController,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleExclusion {
    pub roles: Vec<RoleClass>,
    pub note: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branching {
    /// One branch (`all`) regardless of domain membership.
    #[default]
    Single,
    /// `workgroup` or `domain`, from the host's domain membership.
    ByMembership,
}

/// Operator-declared exemption: when `input` is true and `branch` is selected,
/// the control is not applicable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemption {
    pub input: String,
    pub branch: BranchId,
    pub note: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicabilityRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<RoleExclusion>,
    #[serde(default)]
    pub branching: Branching,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exemptions: Vec<Exemption>,
}

impl ApplicabilityRule {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn reads_machine_role(&self) -> bool {
        self.exclude.is_some()
    }

    pub fn selectable_branches(&self) -> &'static [BranchId] {
        match self.branching {
            Branching::Single => &[BranchId::All],
            Branching::ByMembership => &[BranchId::Workgroup, BranchId::Domain],
        }
    }
}

/// Benchmark cross-references carried through to listings. Not used for evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stig_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srg: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cci: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nist: Vec<String>,
}

impl ControlTags {
    pub fn is_empty(&self) -> bool {
        *self == ControlTags::default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    pub title: String,
    /// Declared severity; configuration may override it.
    pub impact: Impact,
    #[serde(default, skip_serializing_if = "ControlTags::is_empty")]
    pub tags: ControlTags,
    #[serde(default)]
    pub applicability: ApplicabilityRule,
    pub branches: Vec<Branch>,
}

impl Control {
    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.iter().find(|b| b.id == id)
    }

    /// Check that every branch the rule can select exists and is non-empty.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.id.trim().is_empty() {
            return Err(ModelError::EmptyId);
        }

        let selectable = self.applicability.selectable_branches();
        let mut seen = BTreeSet::new();
        for branch in &self.branches {
            if !seen.insert(branch.id) {
                return Err(ModelError::DuplicateBranch {
                    control: self.id.clone(),
                    branch: branch.id.as_str().to_string(),
                });
            }
            if !selectable.contains(&branch.id) {
                return Err(ModelError::UnreachableBranch {
                    control: self.id.clone(),
                    branch: branch.id.as_str().to_string(),
                });
            }
            if branch.any_of.is_empty() {
                return Err(ModelError::EmptyBranch {
                    control: self.id.clone(),
                    branch: branch.id.as_str().to_string(),
                });
            }
            if let Some(group) = branch.any_of.iter().position(|g| g.all.is_empty()) {
                return Err(ModelError::EmptyGroup {
                    control: self.id.clone(),
                    branch: branch.id.as_str().to_string(),
                    group,
                });
            }
        }

        for id in selectable {
            if !seen.contains(id) {
                return Err(ModelError::MissingBranch {
                    control: self.id.clone(),
                    branch: id.as_str().to_string(),
                });
            }
        }

        for exemption in &self.applicability.exemptions {
            if !selectable.contains(&exemption.branch) {
                return Err(ModelError::UnreachableExemption {
                    control: self.id.clone(),
                    input: exemption.input.clone(),
                    branch: exemption.branch.as_str().to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_control(branching: Branching, branches: Vec<Branch>) -> Control {
        Control {
            id: "V-1".to_string(),
            title: "t".to_string(),
            impact: Impact::MEDIUM,
            tags: ControlTags::default(),
            applicability: ApplicabilityRule {
                exclude: None,
                branching,
                exemptions: Vec::new(),
            },
            branches,
        }
    }

    fn group() -> CheckGroup {
        CheckGroup::all(vec![Assertion::exists(FactQuery::registry("HKLM\\X", "Y"))])
    }

    #[test]
    fn fact_query_display_is_canonical() {
        let q = FactQuery::registry("HKLM\\Tcpip6", "DisableIPSourceRouting");
        assert_eq!(
            q.to_string(),
            "DisableIPSourceRouting[key=HKLM\\Tcpip6; source=registry]"
        );
        assert_eq!(FactQuery::new("host.domain").to_string(), "host.domain");
    }

    #[test]
    fn validate_requires_every_selectable_branch() {
        let control = registry_control(
            Branching::ByMembership,
            vec![Branch::any_of(BranchId::Workgroup, vec![group()])],
        );
        assert_eq!(
            control.validate(),
            Err(ModelError::MissingBranch {
                control: "V-1".to_string(),
                branch: "domain".to_string(),
            })
        );
    }

    #[test]
    fn validate_rejects_unreachable_and_empty_branches() {
        let control = registry_control(
            Branching::Single,
            vec![Branch::any_of(BranchId::Domain, vec![group()])],
        );
        assert!(matches!(
            control.validate(),
            Err(ModelError::UnreachableBranch { .. })
        ));

        let control = registry_control(
            Branching::Single,
            vec![Branch::any_of(BranchId::All, vec![CheckGroup::all(Vec::new())])],
        );
        assert!(matches!(control.validate(), Err(ModelError::EmptyGroup { .. })));
    }

    #[test]
    fn control_round_trips_through_json() {
        let control = registry_control(
            Branching::Single,
            vec![Branch::any_of(
                BranchId::All,
                vec![CheckGroup::all(vec![
                    Assertion::equals(
                        FactQuery::registry("HKLM\\X", "Y"),
                        ValueExpr::literal(Value::Integer(2)),
                    ),
                    Assertion::includes(
                        FactQuery::security_policy("SeDenyBatchLogonRight"),
                        ValueExpr::account_sid("Domain Admins"),
                    ),
                ])],
            )],
        );
        let json = serde_json::to_value(&control).expect("serialize");
        assert_eq!(json["branches"][0]["any_of"][0]["all"][0]["check"]["op"], "equals");
        assert_eq!(
            json["branches"][0]["any_of"][0]["all"][1]["check"]["expected"]["kind"],
            "lookup"
        );
        let back: Control = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, control);
    }
}
