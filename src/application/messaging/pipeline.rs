//! Execution pipeline - Runs a matched command phase by phase

use std::fmt;

use super::parser::message_without_keyword;
use super::router::{Delivery, ReplyRouter, ReplyTarget};
use crate::application::errors::{BotError, CommandError};
use crate::domain::entities::{Attachment, Command, CommandContext, CommandResult, PhaseOutcome, Reply, Response};
use crate::domain::traits::MessagingApi;

/// Fallback text of a card message for clients that cannot render cards
pub const CARD_FALLBACK_TEXT: &str = "This bot requires a client which can render cards.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreCardLoadReply,
    PreExecute,
    Execute,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::PreCardLoadReply => write!(f, "pre_card_load_reply"),
            Phase::PreExecute => write!(f, "pre_execute"),
            Phase::Execute => write!(f, "execute"),
        }
    }
}

/// Turn a phase result into an outcome, recovering reply errors
///
/// Any other command error is returned to the caller.
pub fn guard_phase(phase: Phase, result: CommandResult) -> Result<PhaseOutcome, BotError> {
    match result {
        Ok(reply) => Ok(PhaseOutcome { reply, one_to_one: false }),
        Err(CommandError::Reply {
            reply_message,
            reply_one_to_one,
            debug_message,
        }) => {
            tracing::warn!("BotException in {}: {}", phase, debug_message);
            Ok(PhaseOutcome {
                reply: Some(Reply::Text(reply_message)),
                one_to_one: reply_one_to_one,
            })
        }
        Err(e) => Err(BotError::Command(e)),
    }
}

async fn run_phase(
    phase: Phase,
    command: &dyn Command,
    message: &str,
    ctx: &CommandContext<'_>,
) -> Result<PhaseOutcome, BotError> {
    let result = match phase {
        Phase::PreCardLoadReply => command.pre_card_load_reply(message, ctx).await,
        Phase::PreExecute => command.pre_execute(message, ctx).await,
        Phase::Execute => command.card_callback(message, ctx).await,
    };
    guard_phase(phase, result)
}

fn card_message(card: &serde_json::Value) -> Response {
    Response::new()
        .with_text(CARD_FALLBACK_TEXT)
        .with_attachment(Attachment::adaptive_card(card.clone()))
}

/// A matched command about to run
pub struct Invocation<'a> {
    pub command: &'a dyn Command,
    pub raw_message: &'a str,
    pub is_card_callback: bool,
}

/// Run every phase of `invocation`, delivering each reply as it is produced
pub async fn execute(
    invocation: Invocation<'_>,
    ctx: &CommandContext<'_>,
    api: &dyn MessagingApi,
    router: &ReplyRouter,
    target: &ReplyTarget<'_>,
) -> Result<Delivery, BotError> {
    let command = invocation.command;
    let message = message_without_keyword(command.keyword(), invocation.raw_message);

    if command.delete_previous_message() {
        if let Some(previous) = ctx.event.message_id.as_deref() {
            tracing::info!("delete_previous_message is set. Deleting message with ID: {}", previous);
            api.delete_message(previous).await?;
        }
    }

    let final_outcome = match command.card().filter(|_| !invocation.is_card_callback) {
        Some(card) => {
            let pre_card = run_phase(Phase::PreCardLoadReply, command, message, ctx).await?;
            router.deliver_outcome(pre_card, target).await?;
            PhaseOutcome {
                reply: Some(Reply::Response(card_message(card))),
                one_to_one: false,
            }
        }
        None => {
            let pre_execute = run_phase(Phase::PreExecute, command, message, ctx).await?;
            router.deliver_outcome(pre_execute, target).await?;
            run_phase(Phase::Execute, command, message, ctx).await?
        }
    };

    router.deliver_outcome(final_outcome, target).await
}
