//! Event router
//!
//! Entry point for every inbound event. Media opens (or replaces) the owner's
//! session, text replies consume it, commands are answered directly. Jobs are
//! handed to the [`JobRunner`] and never awaited here.

use tracing::{debug, info};
use uuid::Uuid;

use convert_types::{
    BotCommand, EventPayload, ExtensionCatalog, FamilyMatch, InboundEvent, PayloadKind,
    PayloadSource, RejectReason, Resolution,
};

use crate::clock::{Clock, SystemClock};
use crate::error::RouterError;
use crate::gateway::{Markup, MessagingGateway, OutgoingText};
use crate::job::{Job, Operation};
use crate::menu;
use crate::registry::ConverterRegistry;
use crate::resolver::DispatchResolver;
use crate::runner::JobRunner;
use crate::store::{Session, SessionStore};

const TELEGRAM_LINK: &str = "https://t.me/";
const MAGNET_PREFIX: &str = "magnet:?";

/// Optional behaviours, all on by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Relay `t.me` links
    pub links: bool,
    /// Fetch magnet URIs
    pub magnets: bool,
    /// Hand session-less private text to the `other` converter
    pub free_text: bool,
    pub make: bool,
    pub rename: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            links: true,
            magnets: true,
            free_text: true,
            make: true,
            rename: true,
        }
    }
}

/// What the router did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Replied,
    SessionOpened { kind: PayloadKind },
    Dispatched { job_id: Uuid },
    Rejected { reason: RejectReason },
    Cancelled { had_session: bool },
    NoSession,
    Ignored,
}

#[derive(Clone)]
pub struct EventRouter<G, R, C: Clock = SystemClock> {
    store: SessionStore<C>,
    resolver: DispatchResolver,
    runner: JobRunner<G, R>,
    gateway: G,
    config: RouterConfig,
}

impl<G, R, C> EventRouter<G, R, C>
where
    G: MessagingGateway,
    R: ConverterRegistry,
    C: Clock,
{
    pub fn new(
        store: SessionStore<C>,
        runner: JobRunner<G, R>,
        gateway: G,
        config: RouterConfig,
    ) -> Self {
        Self {
            store,
            resolver: DispatchResolver::new(ExtensionCatalog::new()),
            runner,
            gateway,
            config,
        }
    }

    pub fn store(&self) -> &SessionStore<C> {
        &self.store
    }

    fn catalog(&self) -> &ExtensionCatalog {
        self.resolver.catalog()
    }

    /// Handle one inbound event.
    ///
    /// Session changes are applied before any reply is sent, so a failed reply
    /// never leaves the store half-updated.
    pub async fn handle(&self, event: InboundEvent) -> Result<Routed, RouterError> {
        match &event.payload {
            EventPayload::Command { command } => self.handle_command(&event, command).await,
            EventPayload::Media { source } => self.open_session(&event, source.clone()).await,
            EventPayload::Text { text } => self.handle_text(&event, text).await,
        }
    }

    async fn send(&self, message: OutgoingText) -> Result<(), RouterError> {
        self.gateway
            .reply(message)
            .await
            .map(|_| ())
            .map_err(|e| RouterError::Gateway(e.to_string()))
    }

    async fn answer(&self, event: &InboundEvent, text: impl Into<String>) -> Result<(), RouterError> {
        self.send(OutgoingText::new(event.chat_id, text).reply_to(event.message_id))
            .await
    }

    async fn dispatch(&self, job: Job) -> Result<Routed, RouterError> {
        let job_id = self.runner.dispatch(job).await;
        Ok(Routed::Dispatched { job_id })
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    async fn handle_command(
        &self,
        event: &InboundEvent,
        command: &BotCommand,
    ) -> Result<Routed, RouterError> {
        debug!(owner = %event.owner, ?command, "Handling command");

        match command {
            BotCommand::Start => {
                self.answer(event, menu::welcome_text(event.sender_name.as_deref()))
                    .await?;
                Ok(Routed::Replied)
            }
            BotCommand::Help => {
                self.answer(event, menu::help_text(self.catalog())).await?;
                Ok(Routed::Replied)
            }
            BotCommand::Cancel => {
                let had_session = self.store.take(&event.owner).await.is_some();
                info!(owner = %event.owner, had_session, "Cancel requested");
                self.send(
                    OutgoingText::new(event.chat_id, menu::CANCELLED)
                        .reply_to(event.message_id)
                        .markup(Markup::RemoveKeyboard),
                )
                .await?;
                Ok(Routed::Cancelled { had_session })
            }
            BotCommand::Make => {
                if !self.config.make {
                    self.answer(event, menu::FEATURE_DISABLED).await?;
                    return Ok(Routed::Replied);
                }
                let session = self
                    .store
                    .take_if(&event.owner, |s| s.payload_kind == PayloadKind::Text)
                    .await;
                match session {
                    Some(session) => {
                        self.dispatch(Job::new(event.owner.clone(), Operation::Make, session.payload))
                            .await
                    }
                    None => {
                        self.answer(event, menu::MAKE_NEEDS_TEXT).await?;
                        Ok(Routed::NoSession)
                    }
                }
            }
            BotCommand::Rename { name } => {
                if !self.config.rename {
                    self.answer(event, menu::FEATURE_DISABLED).await?;
                    return Ok(Routed::Replied);
                }
                let Some(name) = name else {
                    self.answer(event, menu::RENAME_USAGE).await?;
                    return Ok(Routed::Replied);
                };
                let session = self
                    .store
                    .take_if(&event.owner, |s| s.payload_kind != PayloadKind::Text)
                    .await;
                match session {
                    Some(session) => {
                        let operation = Operation::Rename { name: name.clone() };
                        self.dispatch(Job::new(event.owner.clone(), operation, session.payload))
                            .await
                    }
                    None => {
                        self.answer(event, menu::NO_ACTIVE_OPERATION).await?;
                        Ok(Routed::NoSession)
                    }
                }
            }
        }
    }

    // ── Media ─────────────────────────────────────────────────────────────────

    async fn open_session(
        &self,
        event: &InboundEvent,
        source: PayloadSource,
    ) -> Result<Routed, RouterError> {
        let payload = event.payload_ref(source);
        let kind = payload.kind();
        let source_ext = payload.source.source_extension();
        let family = self.catalog().family_for(kind, source_ext.as_deref());

        self.store.put(event.owner.clone(), payload).await;
        info!(
            owner = %event.owner,
            kind = %kind,
            source_ext = source_ext.as_deref().unwrap_or("-"),
            "Session opened"
        );

        let family_menu = family.map(|f| self.catalog().menu(f));
        let text = menu::session_prompt(
            kind,
            source_ext.as_deref(),
            family_menu.as_ref(),
            event.sender_name.as_deref(),
        );
        let mut message = OutgoingText::new(event.chat_id, text).reply_to(event.message_id);
        if let Some(family_menu) = &family_menu {
            message = message.markup(Markup::Keyboard {
                rows: family_menu.rows(menu::MENU_WIDTH),
                placeholder: menu::PLACEHOLDER.to_string(),
            });
        }
        self.send(message).await?;

        Ok(Routed::SessionOpened { kind })
    }

    // ── Text ──────────────────────────────────────────────────────────────────

    async fn handle_text(&self, event: &InboundEvent, text: &str) -> Result<Routed, RouterError> {
        if self.config.links && text.contains(TELEGRAM_LINK) {
            let input = event.payload_ref(PayloadSource::Text {
                text: text.to_string(),
            });
            return self
                .dispatch(Job::new(event.owner.clone(), Operation::FetchLink, input))
                .await;
        }

        if self.config.magnets && text.trim_start().starts_with(MAGNET_PREFIX) {
            let input = event.payload_ref(PayloadSource::Text {
                text: text.trim().to_string(),
            });
            return self
                .dispatch(Job::new(event.owner.clone(), Operation::FetchMagnet, input))
                .await;
        }

        match self.store.take(&event.owner).await {
            Some(session) => self.resolve_reply(event, session, text).await,
            None => self.handle_unsolicited_text(event, text).await,
        }
    }

    async fn resolve_reply(
        &self,
        event: &InboundEvent,
        session: Session,
        text: &str,
    ) -> Result<Routed, RouterError> {
        let resolution = self.resolver.resolve(&session, text);
        debug!(owner = %event.owner, ?resolution, "Resolved reply");

        let operation = match resolution {
            Resolution::SpecialOp { op } => Operation::Special { op },
            Resolution::Conversion { from, to } => Operation::Convert { from, to },
            Resolution::Rejected { reason } => {
                info!(owner = %event.owner, reason = %reason, "Reply rejected");
                let text = match reason {
                    RejectReason::SameExtension => menu::SAME_EXTENSION,
                    RejectReason::UnsupportedPayload | RejectReason::UnparseableFilename => {
                        menu::UNSUPPORTED
                    }
                };
                self.send(
                    OutgoingText::new(event.chat_id, text)
                        .reply_to(event.message_id)
                        .markup(Markup::RemoveKeyboard),
                )
                .await?;
                return Ok(Routed::Rejected { reason });
            }
        };

        self.dispatch(Job::new(event.owner.clone(), operation, session.payload))
            .await
    }

    async fn handle_unsolicited_text(
        &self,
        event: &InboundEvent,
        text: &str,
    ) -> Result<Routed, RouterError> {
        if !event.is_private {
            debug!(owner = %event.owner, "Ignoring group text without a session");
            return Ok(Routed::Ignored);
        }

        let multi_line = text.trim().contains('\n');
        if multi_line && self.config.make {
            let payload = event.payload_ref(PayloadSource::Text {
                text: text.to_string(),
            });
            self.store.put(event.owner.clone(), payload).await;
            self.answer(event, menu::MAKE_HINT).await?;
            return Ok(Routed::SessionOpened {
                kind: PayloadKind::Text,
            });
        }

        let looks_like_choice = !matches!(self.catalog().classify(text), FamilyMatch::Unknown);
        if looks_like_choice || !self.config.free_text {
            self.answer(event, menu::NO_ACTIVE_OPERATION).await?;
            return Ok(Routed::NoSession);
        }

        let input = event.payload_ref(PayloadSource::Text {
            text: text.to_string(),
        });
        self.dispatch(Job::new(event.owner.clone(), Operation::Other, input))
            .await
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
