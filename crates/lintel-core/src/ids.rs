//! ID prefix constants for generated entity ids.
//!
//! Ids are short prefixed hex strings (e.g. `rul-a3f8b2c1`) generated by
//! the database layer. The prefix makes ids self-describing in logs.

pub const PREFIX_RULE: &str = "rul";
pub const PREFIX_PARAM: &str = "par";
pub const PREFIX_ACTIVE_RULE: &str = "act";
pub const PREFIX_PROFILE: &str = "prf";

/// All known prefixes, for exhaustive id-format tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_RULE,
    PREFIX_PARAM,
    PREFIX_ACTIVE_RULE,
    PREFIX_PROFILE,
];
