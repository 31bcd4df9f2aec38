//! EC2 instance types accepted for provisioned nodes.

/// Every accepted instance family with its exact size suffixes.
const EC2_INSTANCE_TYPES: &[(&str, &[&str])] = &[
    ("t2", &["nano", "micro", "small", "medium", "large", "xlarge", "2xlarge"]),
    ("m4", &["large", "xlarge", "2xlarge", "4xlarge", "10xlarge", "16xlarge"]),
    ("m3", &["medium", "large", "xlarge", "2xlarge"]),
    ("c5", &["large", "xlarge", "2xlarge", "4xlarge", "9xlarge", "18xlarge"]),
    ("c4", &["large", "xlarge", "2xlarge", "4xlarge", "8xlarge"]),
    ("c3", &["large", "xlarge", "2xlarge", "4xlarge", "8xlarge"]),
    ("x1", &["16xlarge", "32xlarge"]),
    ("x1e", &["32xlarge"]),
    ("r4", &["large", "xlarge", "2xlarge", "4xlarge", "8xlarge", "16xlarge"]),
    ("r3", &["large", "xlarge", "2xlarge", "4xlarge", "8xlarge"]),
    ("p3", &["2xlarge", "8xlarge", "16xlarge"]),
    ("p2", &["xlarge", "8xlarge", "16xlarge"]),
    ("g3", &["4xlarge", "8xlarge", "16xlarge"]),
    ("f1", &["16xlarge"]),
    ("i3", &["large", "xlarge", "2xlarge", "4xlarge", "8xlarge", "16xlarge"]),
    ("d2", &["xlarge", "2xlarge", "4xlarge", "8xlarge"]),
];

/// Returns true if `value` is exactly one of the known EC2 instance types.
#[must_use]
pub fn is_valid_instance_type(value: &str) -> bool {
    let Some((family, size)) = value.split_once('.') else {
        return false;
    };

    EC2_INSTANCE_TYPES
        .iter()
        .find(|(f, _)| *f == family)
        .is_some_and(|(_, sizes)| sizes.contains(&size))
}

/// Returns every accepted instance type.
#[must_use]
pub fn known_instance_types() -> Vec<String> {
    EC2_INSTANCE_TYPES
        .iter()
        .flat_map(|(family, sizes)| sizes.iter().map(move |size| format!("{family}.{size}")))
        .collect()
}
