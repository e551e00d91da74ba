//! Host role facts consumed by applicability rules.

use crate::error::EvalError;
use crate::model::RoleClass;
use stigeval_types::{Value, ids};

/// `Win32_ComputerSystem.DomainRole`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MachineRole {
    StandaloneWorkstation,
    MemberWorkstation,
    StandaloneServer,
    MemberServer,
    BackupDomainController,
    PrimaryDomainController,
}

impl MachineRole {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MachineRole::StandaloneWorkstation),
            1 => Some(MachineRole::MemberWorkstation),
            2 => Some(MachineRole::StandaloneServer),
            3 => Some(MachineRole::MemberServer),
            4 => Some(MachineRole::BackupDomainController),
            5 => Some(MachineRole::PrimaryDomainController),
            _ => None,
        }
    }

    pub fn class(self) -> RoleClass {
        match self {
            MachineRole::StandaloneWorkstation | MachineRole::MemberWorkstation => {
                RoleClass::Workstation
            }
            MachineRole::StandaloneServer => RoleClass::StandaloneServer,
            MachineRole::MemberServer => RoleClass::MemberServer,
            MachineRole::BackupDomainController | MachineRole::PrimaryDomainController => {
                RoleClass::DomainController
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainMembership {
    Workgroup,
    DomainJoined,
}

impl DomainMembership {
    /// `WORKGROUP` means standalone; any other non-empty name is a domain.
    pub fn from_domain_name(raw: &str) -> Option<Self> {
        let name = raw.trim();
        if name.is_empty() {
            None
        } else if name.eq_ignore_ascii_case(ids::WORKGROUP_TOKEN) {
            Some(DomainMembership::Workgroup)
        } else {
            Some(DomainMembership::DomainJoined)
        }
    }
}

/// Where applicability rules read role facts from.
///
/// A rule asks for a fact only when it reaches the step that needs it, so a fact the
/// rule never gets to cannot fail the control.
pub trait RoleSource {
    fn role_fact(&mut self, name: &'static str) -> Result<Option<Value>, EvalError>;

    fn machine_role(&mut self) -> Result<MachineRole, EvalError> {
        parse_machine_role(self.role_fact(ids::FACT_DOMAIN_ROLE)?.as_ref())
    }

    fn membership(&mut self) -> Result<DomainMembership, EvalError> {
        parse_membership(self.role_fact(ids::FACT_DOMAIN_NAME)?.as_ref())
    }
}

/// Role facts known up front.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleFacts {
    pub domain_role: Option<Value>,
    pub domain: Option<Value>,
}

impl RoleSource for RoleFacts {
    fn role_fact(&mut self, name: &'static str) -> Result<Option<Value>, EvalError> {
        Ok(match name {
            ids::FACT_DOMAIN_ROLE => self.domain_role.clone(),
            ids::FACT_DOMAIN_NAME => self.domain.clone(),
            _ => None,
        })
    }
}

fn parse_machine_role(raw: Option<&Value>) -> Result<MachineRole, EvalError> {
    let raw = raw.ok_or_else(|| {
        EvalError::Applicability(format!("{} is not reported", ids::FACT_DOMAIN_ROLE))
    })?;
    raw.as_integer()
        .and_then(MachineRole::from_code)
        .ok_or_else(|| {
            EvalError::Applicability(format!("{} = {raw} is not a known role", ids::FACT_DOMAIN_ROLE))
        })
}

fn parse_membership(raw: Option<&Value>) -> Result<DomainMembership, EvalError> {
    let raw = raw.ok_or_else(|| {
        EvalError::Applicability(format!("{} is not reported", ids::FACT_DOMAIN_NAME))
    })?;
    let parsed = match raw {
        Value::Text(name) => DomainMembership::from_domain_name(name),
        _ => None,
    };
    parsed.ok_or_else(|| {
        EvalError::Applicability(format!(
            "{} = {raw} is neither a workgroup nor a domain name",
            ids::FACT_DOMAIN_NAME
        ))
    })
}
