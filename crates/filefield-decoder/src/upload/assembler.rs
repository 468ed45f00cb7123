use filefield_core::validation::{has_array_suffix, normalize_field_name};
use filefield_core::{FieldValue, FileValue, ResultRecord};

/// Store a scalar value under its normalized name.
///
/// A wire name with the array marker is always stored as a list.
pub fn append_scalar(record: &mut ResultRecord, name: &str, value: String) {
    record.append(
        normalize_field_name(name),
        FieldValue::Text(value),
        has_array_suffix(name),
    );
}

/// Store an admitted file under `key`; `as_sequence` is set for fields accepting more
/// than one file.
pub fn append_file(record: &mut ResultRecord, key: &str, file: FileValue, as_sequence: bool) {
    record.append(key, FieldValue::File(file), as_sequence);
}
