mod status;

pub use self::status::{Status, reason_phrase};
