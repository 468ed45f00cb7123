//! Part-name rules shared by the classifier and the result assembler.

use crate::limits::ARRAY_SUFFIX;

/// Names that collide with built-in object properties in the JavaScript clients these
/// forms usually come from. Parts carrying one of them are dropped without error.
pub const RESERVED_FIELD_NAMES: &[&str] = &[
    "__proto__",
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
    "constructor",
    "hasOwnProperty",
    "isPrototypeOf",
    "propertyIsEnumerable",
    "toLocaleString",
    "toString",
    "valueOf",
];

/// Check whether a part name is reserved. Matching is exact (case-sensitive).
pub fn is_reserved_field_name(name: &str) -> bool {
    RESERVED_FIELD_NAMES.contains(&name)
        || RESERVED_FIELD_NAMES.contains(&normalize_field_name(name))
}

/// Strip one trailing array marker: `"tags[]"` becomes `"tags"`.
pub fn normalize_field_name(name: &str) -> &str {
    name.strip_suffix(ARRAY_SUFFIX).unwrap_or(name)
}

/// Whether the wire name carries the array marker.
pub fn has_array_suffix(name: &str) -> bool {
    name.ends_with(ARRAY_SUFFIX)
}
