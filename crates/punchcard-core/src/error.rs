//! Error types for `punchcard-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("user not found for pass serial {0:?}")]
  PassSerialNotFound(String),

  #[error("reward notification not found: {0}")]
  NotificationNotFound(Uuid),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("phone number {0:?} is already registered")]
  DuplicatePhone(String),

  #[error("pass serial {0:?} is already assigned to another user")]
  DuplicatePassSerial(String),

  /// A visit or notification referenced a user that does not exist.
  #[error("foreign key violation: user {0} does not exist")]
  ForeignKey(Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse error category, used by outer layers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Validation,
  Conflict,
  ForeignKey,
  Internal,
}

/// Implemented by every error type a [`crate::store::LoyaltyStore`] backend
/// can return.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::UserNotFound(_)
      | Self::PassSerialNotFound(_)
      | Self::NotificationNotFound(_) => ErrorKind::NotFound,
      Self::Validation(_) => ErrorKind::Validation,
      Self::DuplicatePhone(_) | Self::DuplicatePassSerial(_) => {
        ErrorKind::Conflict
      }
      Self::ForeignKey(_) => ErrorKind::ForeignKey,
    }
  }
}
