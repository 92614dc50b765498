//! Virtual machine scale set state migrations.
//!
//! | From | To | Step |
//! |------|----|------|
//! | 0 | 1 | Adopt the canonical resource ID (lookup by `resource_group_name` + `name`) |
//! | 1 | 2 | Re-identify set members under hash scheme 2 |
//!
//! ## Hash scheme 2
//!
//! - `network_profile`: `name`, `primary`
//! - `os_profile_linux_config`: `disable_password_authentication`
//! - string sets of IDs inside `network_profile.*.ip_configuration.*`: the ID itself
//!
//! Everything else, including the Linux config's `ssh_keys` list and any
//! attribute this table does not name, passes through unchanged.

use crate::hashing::{HashField, SetHasher};
use crate::rewrite::{PathRewriter, RewriteRule};
use crate::step::{IdentifierAdoption, MigrationStep, MigrationTable};

/// Resource name used in logs.
pub const SCALE_SET_RESOURCE: &str = "virtual machine scale set";

/// Latest schema version of scale set state.
pub const SCALE_SET_SCHEMA_VERSION: u32 = 2;

/// String sets of resource IDs inside each IP configuration.
pub const IP_CONFIGURATION_ID_SETS: [&str; 4] = [
    "application_gateway_backend_address_pool_ids",
    "application_security_group_ids",
    "load_balancer_backend_address_pool_ids",
    "load_balancer_inbound_nat_rules_ids",
];

/// Identifier contract of `network_profile` members.
pub fn network_profile_hasher() -> SetHasher {
    SetHasher::fields([HashField::scalar("name"), HashField::scalar("primary").or("false")])
}

/// Identifier contract of `os_profile_linux_config` members.
pub fn linux_config_hasher() -> SetHasher {
    SetHasher::fields([HashField::scalar("disable_password_authentication").or("false")])
}

/// Rewrites taking version 1 state to version 2.
///
/// `network_profile` is re-identified before its nested ID sets are
/// rewritten below the new member identifier.
pub fn v1_to_v2() -> PathRewriter {
    let id_sets = IP_CONFIGURATION_ID_SETS
        .iter()
        .map(|set| RewriteRule::rehash(*set, SetHasher::StringValue));

    PathRewriter::new([
        RewriteRule::rehash("network_profile", network_profile_hasher())
            .with_nested([RewriteRule::list("ip_configuration", "ip_configuration").with_nested(id_sets)]),
        RewriteRule::rehash("os_profile_linux_config", linux_config_hasher()),
    ])
}

/// Transition table for scale set state.
pub fn scale_set_table() -> MigrationTable {
    MigrationTable::new(
        SCALE_SET_RESOURCE,
        [
            MigrationStep::AdoptIdentifier(IdentifierAdoption::new("resource_group_name", "name")),
            MigrationStep::Reshape(v1_to_v2()),
        ],
    )
}
