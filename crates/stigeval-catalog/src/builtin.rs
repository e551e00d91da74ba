//! Windows Server 2016 STIG controls shipped with the tool.

use stigeval_domain::model::{
    ApplicabilityRule, Assertion, Branch, BranchId, Branching, CheckGroup, Control, ControlTags,
    Exemption, FactQuery, RoleClass, RoleExclusion, ValueExpr,
};
use stigeval_types::{Impact, Value, ids};

const TCPIP6_PARAMETERS: &str =
    "HKEY_LOCAL_MACHINE\\System\\CurrentControlSet\\Services\\Tcpip6\\Parameters";
const NETLOGON_PARAMETERS: &str =
    "HKEY_LOCAL_MACHINE\\System\\CurrentControlSet\\Services\\Netlogon\\Parameters";

const NOTE_DOMAIN_CONTROLLER: &str = "This system is a domain controller, therefore this control is not applicable as it only applies to member servers and standalone systems";
const NOTE_AD_ONLY_SYSTEM: &str = "This system is dedicated to the management of Active Directory, therefore this system is exempt from this control";

pub fn controls() -> Vec<Control> {
    vec![v73499(), v73643(), v73763(), v73771()]
}

fn tags(stig_id: &str, rule_id: &str, srg: &str, cci: &[&str], nist: &[&str]) -> ControlTags {
    ControlTags {
        stig_id: Some(stig_id.to_string()),
        rule_id: Some(rule_id.to_string()),
        srg: Some(srg.to_string()),
        cci: cci.iter().map(|s| s.to_string()).collect(),
        nist: nist.iter().map(|s| s.to_string()).collect(),
    }
}

/// `value_name` exists under `key` and equals `expected`.
fn registry_dword(key: &str, value_name: &str, expected: i64) -> Vec<Branch> {
    let fact = FactQuery::registry(key, value_name);
    vec![Branch::any_of(
        BranchId::All,
        vec![CheckGroup::all(vec![
            Assertion::exists(fact.clone()),
            Assertion::equals(fact, ValueExpr::literal(Value::Integer(expected))),
        ])],
    )]
}

fn member_server_rule(exemptions: Vec<Exemption>) -> ApplicabilityRule {
    ApplicabilityRule {
        exclude: Some(RoleExclusion {
            roles: vec![RoleClass::DomainController],
            note: NOTE_DOMAIN_CONTROLLER.to_string(),
        }),
        branching: Branching::ByMembership,
        exemptions,
    }
}

/// Either exactly the built-in Guests group, or nobody.
fn guests_or_empty(right: &str) -> Branch {
    let fact = FactQuery::security_policy(right);
    Branch::any_of(
        BranchId::Workgroup,
        vec![
            CheckGroup::all(vec![Assertion::set_equals(
                fact.clone(),
                ValueExpr::literal(Value::list([ids::SID_BUILTIN_GUESTS])),
            )]),
            CheckGroup::all(vec![Assertion::set_equals(
                fact,
                ValueExpr::literal(Value::List(Vec::new())),
            )]),
        ],
    )
}

fn denies_domain_admins(right: &str) -> Branch {
    let fact = FactQuery::security_policy(right);
    Branch::any_of(
        BranchId::Domain,
        vec![CheckGroup::all(vec![
            Assertion::includes(
                fact.clone(),
                ValueExpr::account_sid(ids::ACCOUNT_DOMAIN_ADMINS),
            ),
            Assertion::includes(fact, ValueExpr::account_sid(ids::ACCOUNT_ENTERPRISE_ADMINS)),
        ])],
    )
}

fn v73499() -> Control {
    Control {
        id: "V-73499".to_string(),
        title: "Internet Protocol version 6 (IPv6) source routing must be configured to the highest protection level to prevent IP source routing.".to_string(),
        impact: Impact::LOW,
        tags: tags(
            "WN16-CC-000040",
            "SV-88151r1_rule",
            "SRG-OS-000480-GPOS-00227",
            &["CCI-000366"],
            &["CM-6 b", "Rev_4"],
        ),
        applicability: ApplicabilityRule::always(),
        branches: registry_dword(TCPIP6_PARAMETERS, "DisableIPSourceRouting", 2),
    }
}

fn v73643() -> Control {
    Control {
        id: "V-73643".to_string(),
        title: "Windows Server 2016 must be configured to require a strong session key."
            .to_string(),
        impact: Impact::MEDIUM,
        tags: tags(
            "WN16-SO-000130",
            "SV-88307r1_rule",
            "SRG-OS-000423-GPOS-00187",
            &["CCI-002418", "CCI-002421"],
            &["SC-8", "SC-8 (1)", "Rev_4"],
        ),
        applicability: ApplicabilityRule::always(),
        branches: registry_dword(NETLOGON_PARAMETERS, "RequireStrongKey", 1),
    }
}

// The domain branch checks SeDenyNetworkLogonRight, not the batch logon right.
fn v73763() -> Control {
    Control {
        id: "V-73763".to_string(),
        title: "The Deny log on as a batch job user right on member servers must be configured to prevent access from highly privileged domain accounts on domain systems and from unauthenticated access on all systems.".to_string(),
        impact: Impact::MEDIUM,
        tags: tags(
            "WN16-MS-000380",
            "SV-88427r1_rule",
            "SRG-OS-000080-GPOS-00048",
            &["CCI-000213"],
            &["AC-3", "Rev_4"],
        ),
        applicability: member_server_rule(Vec::new()),
        branches: vec![
            guests_or_empty("SeDenyBatchLogonRight"),
            denies_domain_admins("SeDenyNetworkLogonRight"),
        ],
    }
}

fn v73771() -> Control {
    Control {
        id: "V-73771".to_string(),
        title: "The Deny log on locally user right on member servers must be configured to prevent access from highly privileged domain accounts on domain systems and from unauthenticated access on all systems.".to_string(),
        impact: Impact::MEDIUM,
        tags: tags(
            "WN16-MS-000400",
            "SV-88435r1_rule",
            "SRG-OS-000080-GPOS-00048",
            &["CCI-000213"],
            &["AC-3", "Rev_4"],
        ),
        applicability: member_server_rule(vec![Exemption {
            input: ids::INPUT_AD_ONLY_SYSTEM.to_string(),
            branch: BranchId::Domain,
            note: NOTE_AD_ONLY_SYSTEM.to_string(),
        }]),
        branches: vec![
            guests_or_empty("SeDenyInteractiveLogonRight"),
            denies_domain_admins("SeDenyNetworkLogonRight"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_controls_are_valid() {
        for control in controls() {
            control.validate().expect("valid built-in control");
        }
    }

    #[test]
    fn ids_are_unique_and_sorted() {
        let ids: Vec<String> = controls().into_iter().map(|c| c.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn only_member_server_controls_read_role_facts() {
        let reading: Vec<String> = controls()
            .into_iter()
            .filter(|c| c.applicability.reads_machine_role())
            .map(|c| c.id)
            .collect();
        assert_eq!(reading, vec!["V-73763", "V-73771"]);
    }
}
