use bytes::Bytes;
use serde::{Serialize, Serializer};

/// A file part that passed every check, with its content held in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileValue {
    /// Part name as it appeared on the wire (array marker included).
    pub field_name: String,
    pub filename: String,
    pub media_type: String,
    pub encoding: String,
    #[serde(rename = "size", serialize_with = "serialize_content_len")]
    pub content: Bytes,
}

impl FileValue {
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

fn serialize_content_len<S: Serializer>(content: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(content.len() as u64)
}
