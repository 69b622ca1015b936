//! Profile picture outbound adapters.

mod http_source;

pub use http_source::{AvatarHttpSource, MAX_PROFILE_IMAGE_BYTES};
