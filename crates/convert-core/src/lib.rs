//! Conversation engine for the conversion bot
//!
//! Owns per-user sessions, decides what each reply means and runs the
//! resulting jobs in the background. The chat transport and the converters
//! are reached through the [`MessagingGateway`] and [`ConverterRegistry`]
//! traits so the engine can be tested without either.

pub mod clock;
pub mod error;
pub mod gateway;
pub mod job;
pub mod menu;
pub mod registry;
pub mod resolver;
pub mod router;
pub mod runner;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use clock::{Clock, SystemClock};
pub use error::{ConverterError, JobError, RouterError};
pub use gateway::{Markup, MessageRef, MessagingGateway, OutgoingFile, OutgoingText, UploadKind};
pub use job::{Job, JobOutcome, JobReport, Operation, StatusSink};
pub use registry::{ConversionRequest, ConverterRegistry, JobInput};
pub use resolver::DispatchResolver;
pub use router::{EventRouter, Routed, RouterConfig};
pub use runner::JobRunner;
pub use store::{Session, SessionStore};
