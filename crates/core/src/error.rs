//! Error types for dmodel
//!
//! This module defines all error types used throughout the workspace.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Faults are reported in two layers:
//!
//! - [`SystemError`]: a structured fault carrying an [`ErrorCode`]
//!   (subsystem, component, condition) and a diagnostic string. Guarded reads
//!   that an aspect refuses surface as a `SystemError` with
//!   [`ErrCondition::Corrupt`].
//! - [`Error`]: the workspace-wide error enum. Every variant maps onto an
//!   [`ErrorCode`] through [`Error::code`] so callers can route faults
//!   without matching on variants.

use crate::config::ConfigError;
use crate::types::{ItemId, StoreId};
use std::fmt;
use thiserror::Error;

/// Result type alias for dmodel operations
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Error Codes
// ============================================================================

/// Subsystem that raised a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrSystem {
    /// The domain-model framework itself
    Framework,
    /// Application code built on top of the framework
    Application,
}

/// Component within the subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrComponent {
    /// Guarded data access (data items)
    Runtime,
    /// Data item ownership and lifecycle (data stores)
    Store,
    /// Aspect chain and aspect factories
    Aspect,
    /// Configuration loading
    Config,
}

/// Condition that was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrCondition {
    /// A live value could not be read validly
    Corrupt,
    /// A handle refers to an item that no longer exists
    Stale,
    /// A handle refers to an item owned by a different store
    NotOwned,
    /// An argument or configuration value was rejected
    InvalidArgument,
    /// A configuration source could not be read
    Unavailable,
    /// A fixed-size resource has no room left
    Exhausted,
}

impl fmt::Display for ErrSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for ErrComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for ErrCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Structured fault code: subsystem, component and condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Subsystem that raised the fault
    pub system: ErrSystem,
    /// Component within the subsystem
    pub component: ErrComponent,
    /// Condition that was detected
    pub condition: ErrCondition,
}

impl ErrorCode {
    /// Create a new error code
    pub const fn new(system: ErrSystem, component: ErrComponent, condition: ErrCondition) -> Self {
        Self {
            system,
            component,
            condition,
        }
    }

    /// Shorthand for a framework-level code
    pub const fn framework(component: ErrComponent, condition: ErrCondition) -> Self {
        Self::new(ErrSystem::Framework, component, condition)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.system, self.component, self.condition)
    }
}

// ============================================================================
// SystemError
// ============================================================================

/// A typed fault with a structured code and a human-readable diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct SystemError {
    code: ErrorCode,
    message: String,
}

impl SystemError {
    /// Create a new system error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A `Framework/<component>/Corrupt` fault
    pub fn corrupt(component: ErrComponent, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::framework(component, ErrCondition::Corrupt),
            message,
        )
    }

    /// The structured fault code
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The fault condition
    pub fn condition(&self) -> ErrCondition {
        self.code.condition
    }

    /// The diagnostic message
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// Error
// ============================================================================

/// Error types for dmodel
#[derive(Debug, Error)]
pub enum Error {
    /// Structured fault raised by the guarded access protocol
    #[error(transparent)]
    System(#[from] SystemError),

    /// The item behind a handle has been destroyed
    #[error("stale item handle {0}: the item was destroyed")]
    StaleItem(ItemId),

    /// The handle was issued by another store
    #[error("item {item} belongs to store {owner}, not to store {store}")]
    ForeignItem {
        /// Item the handle points at
        item: ItemId,
        /// Store that issued the handle
        owner: StoreId,
        /// Store the handle was presented to
        store: StoreId,
    },

    /// An item with this name already exists in the store
    #[error("duplicate item name '{0}'")]
    DuplicateName(String),

    /// The store has used up its item id space
    #[error("store {0} cannot hold any more items")]
    StoreFull(StoreId),

    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Structured fault code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::System(e) => e.code(),
            Error::StaleItem(_) => ErrorCode::framework(ErrComponent::Store, ErrCondition::Stale),
            Error::ForeignItem { .. } => {
                ErrorCode::framework(ErrComponent::Store, ErrCondition::NotOwned)
            }
            Error::DuplicateName(_) => {
                ErrorCode::framework(ErrComponent::Store, ErrCondition::InvalidArgument)
            }
            Error::StoreFull(_) => {
                ErrorCode::framework(ErrComponent::Store, ErrCondition::Exhausted)
            }
            Error::Config(ConfigError::Io { .. }) => {
                ErrorCode::framework(ErrComponent::Config, ErrCondition::Unavailable)
            }
            Error::Config(_) => {
                ErrorCode::framework(ErrComponent::Config, ErrCondition::InvalidArgument)
            }
        }
    }

    /// True for the integrity fault raised by a refused read
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::System(e) if e.condition() == ErrCondition::Corrupt)
    }
}
