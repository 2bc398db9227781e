//! Message handler for Telegram updates

use teloxide::prelude::*;
use teloxide::types::Message;
use tracing::{debug, error};

use convert_core::{Clock, ConverterRegistry, EventRouter, MessagingGateway, Routed};
use convert_types::EventPayload;

use crate::gateway::TelegramGateway;
use crate::health::AppState;
use crate::inbound;
use crate::registry::ProcessRegistry;

pub type BotRouter = EventRouter<TelegramGateway, ProcessRegistry<TelegramGateway>>;

/// Handle every incoming message
pub async fn handle_message(msg: Message, router: BotRouter, health: AppState) -> ResponseResult<()> {
    route_message(&msg, &router, &health).await;
    Ok(())
}

/// Feed one message through the router and update the metrics.
///
/// Returns `None` when the message is not something the bot reacts to.
pub async fn route_message<G, R, C>(
    msg: &Message,
    router: &EventRouter<G, R, C>,
    health: &AppState,
) -> Option<Routed>
where
    G: MessagingGateway,
    R: ConverterRegistry,
    C: Clock,
{
    let Some(event) = inbound::to_event(msg) else {
        debug!(chat_id = msg.chat.id.0, message_id = msg.id.0, "Skipping message");
        return None;
    };

    health.increment_events().await;
    if let EventPayload::Command { .. } = event.payload {
        health.increment_commands().await;
    }

    let owner = event.owner.clone();
    let routed = match router.handle(event).await {
        Ok(routed) => routed,
        Err(e) => {
            error!(owner = %owner, error = %e, "Failed to handle message");
            health.increment_errors().await;
            return None;
        }
    };

    debug!(owner = %owner, routed = ?routed, "Message handled");
    health.record_routed(&routed).await;
    health.set_sessions_pending(router.store().len().await).await;
    Some(routed)
}
