//! Shared types for the conversion bot
//!
//! This crate holds the transport-independent vocabulary used by the
//! dispatch engine and the Telegram front end: payload references, inbound
//! events, owner identities, resolutions and the static extension catalog.

pub mod catalog;
pub mod events;
pub mod owner;
pub mod payload;
pub mod resolution;

// Re-export commonly used types
pub use catalog::{ExtensionCatalog, Family, FamilyMatch, FamilyMenu, SpecialOp};
pub use events::{BotCommand, EventPayload, InboundEvent};
pub use owner::OwnerId;
pub use payload::{PayloadKind, PayloadRef, PayloadSource, StickerFormat};
pub use resolution::{RejectReason, Resolution};
