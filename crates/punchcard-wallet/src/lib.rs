//! Outbound integrations with the wallet-pass and messaging providers.
//!
//! The API layer only sees the [`PassProvider`] and [`RewardNotifier`]
//! ports. The implementations shipped here simulate the providers: passes
//! are issued locally and messages are written to the log.

pub mod error;
pub mod notifier;
pub mod pass;

pub use error::{Error, Result};
pub use notifier::{
  DispatchResponse, LedgerNotifier, RewardNotificationRequest, RewardNotifier,
};
pub use pass::{
  PassCreationRequest, PassProvider, PassResponse, PassUpdateRequest,
  SimulatedPassProvider,
};

#[cfg(any(test, feature = "mock"))]
pub use notifier::MockRewardNotifier;
#[cfg(any(test, feature = "mock"))]
pub use pass::MockPassProvider;
