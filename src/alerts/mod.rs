//! Scoped alert helpers
//!
//! An [`AlertHelper`] writes typed notifications (error, info, success,
//! warning) into a shared [`AlertStore`](crate::storage::AlertStore) and
//! reads back or clears only the ones it created.

pub mod config;
pub mod helper;

pub use config::{
    Alert, AlertDecodeError, AlertKind, HelperConfig, MessageExtraction, ReservedFields,
    CREATED_AT_FIELD, HELPER_ID_FIELD, MESSAGE_FIELD, TYPE_FIELD,
};
pub use helper::AlertHelper;
