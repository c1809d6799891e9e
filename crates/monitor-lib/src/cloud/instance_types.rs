//! Burst-credit ceilings per instance type

use crate::models::InstanceType;
use std::collections::HashMap;
use std::sync::OnceLock;

static INSTANCE_TYPES: OnceLock<HashMap<&'static str, InstanceType>> = OnceLock::new();

const TABLE: &[InstanceType] = &[
    InstanceType { name: "t2.nano", maximum_credits: 72.0, credits_earned_per_hour: 3.0 },
    InstanceType { name: "t2.micro", maximum_credits: 144.0, credits_earned_per_hour: 6.0 },
    InstanceType { name: "t2.small", maximum_credits: 288.0, credits_earned_per_hour: 12.0 },
    InstanceType { name: "t2.medium", maximum_credits: 576.0, credits_earned_per_hour: 24.0 },
    InstanceType { name: "t3.nano", maximum_credits: 144.0, credits_earned_per_hour: 6.0 },
    InstanceType { name: "t3.micro", maximum_credits: 288.0, credits_earned_per_hour: 12.0 },
];

fn table() -> &'static HashMap<&'static str, InstanceType> {
    INSTANCE_TYPES.get_or_init(|| TABLE.iter().map(|entry| (entry.name, *entry)).collect())
}

/// Look up an instance type, falling back to [`InstanceType::UNKNOWN`]
pub fn instance_type(name: &str) -> InstanceType {
    table()
        .get(name.trim())
        .copied()
        .unwrap_or(InstanceType::UNKNOWN)
}

/// Names of every instance type with a known credit ceiling
pub fn known_instance_types() -> Vec<&'static str> {
    let mut names: Vec<_> = table().keys().copied().collect();
    names.sort_unstable();
    names
}
