/// Substrings of YAML parser messages paired with a suggested fix.
pub(crate) const YAML_HINTS: [(&str, &str); 4] = [
    (
        "did not find expected '-'",
        "start each entry of targets, customTarget or extraCompiler with '-'",
    ),
    (
        "mapping values are not allowed",
        "quote recipe lines and flags that contain ':'",
    ),
    (
        "found character that cannot start any token",
        "quote values that begin with '@', '`' or '%'",
    ),
    (
        "unknown escape character",
        "use single quotes for recipe lines containing backslashes",
    ),
];
