//! Stable identifiers for facts, lookups, operator inputs and result codes.
//!
//! Fact names are dotted for host facts; registry and security-policy facts use the
//! native value/right name and carry their origin in the `source` parameter.

// Host role facts (WMI Win32_ComputerSystem)
pub const FACT_DOMAIN_ROLE: &str = "host.domain_role";
pub const FACT_DOMAIN_NAME: &str = "host.domain";

// Fact query parameters
pub const PARAM_SOURCE: &str = "source";
pub const PARAM_KEY: &str = "key";
pub const SOURCE_REGISTRY: &str = "registry";
pub const SOURCE_SECURITY_POLICY: &str = "security_policy";

// Deferred lookups
pub const LOOKUP_ACCOUNT_SID: &str = "account.sid";
pub const PARAM_ACCOUNT: &str = "account";

// Well-known accounts
pub const ACCOUNT_DOMAIN_ADMINS: &str = "Domain Admins";
pub const ACCOUNT_ENTERPRISE_ADMINS: &str = "Enterprise Admins";
pub const SID_BUILTIN_GUESTS: &str = "S-1-5-32-546";

// Domain membership token reported by standalone hosts
pub const WORKGROUP_TOKEN: &str = "WORKGROUP";

// Operator inputs
pub const INPUT_AD_ONLY_SYSTEM: &str = "is_AD_only_system";

// Result codes: not applicable
pub const CODE_ROLE_OUT_OF_SCOPE: &str = "role_out_of_scope";
pub const CODE_EXEMPT_BY_INPUT: &str = "exempt_by_input";

// Result codes: error
pub const CODE_PROVIDER_ERROR: &str = "provider_error";
pub const CODE_RESOLUTION_ERROR: &str = "resolution_error";
pub const CODE_APPLICABILITY_ERROR: &str = "applicability_error";

// Tool-level
pub const CODE_RUNTIME_ERROR: &str = "runtime_error";
pub const REASON_CONTROLS_ABANDONED: &str = "controls_abandoned";
pub const REASON_ERRORS_PRESENT: &str = "errors_present";
pub const REASON_FINDINGS_PRESENT: &str = "findings_present";
