pub mod health;
pub mod photo_upload;

pub use health::health;
pub use photo_upload::{upload_photo, UploadPhoto};
