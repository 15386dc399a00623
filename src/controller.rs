use rand::rngs::StdRng;
use rand::Rng;
use teloxide::types::{ChatId, Message};

use crate::error::Error;
use crate::gate::ChanceGate;
use crate::messages::{self, Templates};
use crate::registry::{ChanceRegistry, ChatChance};
use crate::reply_queue::Transport;

/// Anything that arrived in a chat.
pub trait Inbound {
    fn chat_id(&self) -> ChatId;
}

impl Inbound for Message {
    fn chat_id(&self) -> ChatId {
        self.chat.id
    }
}

#[cfg(test)]
impl Inbound for ChatId {
    fn chat_id(&self) -> ChatId {
        *self
    }
}

/// Outcome of [`ChanceController::process`], handing the message back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<M> {
    Admitted(M),
    Rejected(M),
}

pub struct ChanceController<T, R = StdRng> {
    registry: ChanceRegistry,
    gate: ChanceGate<R>,
    templates: Templates,
    transport: T,
}

/// Reads a chance the lenient way: leading whitespace, an optional sign and
/// the leading digits; anything after them is ignored. Saturates on overflow.
fn parse_chance(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let digits: Vec<i64> = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .map(|b| i64::from(b - b'0'))
        .collect();

    if digits.is_empty() {
        return None;
    }

    let magnitude = digits
        .into_iter()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(d));

    Some(if negative { -magnitude } else { magnitude })
}

impl<T: Transport, R: Rng> ChanceController<T, R> {
    pub fn new(
        registry: ChanceRegistry,
        gate: ChanceGate<R>,
        templates: Templates,
        transport: T,
    ) -> Self {
        Self {
            registry,
            gate,
            templates,
            transport,
        }
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &ChanceRegistry {
        &self.registry
    }

    pub async fn show_chance(&self, chat_id: ChatId) -> Result<(), Error> {
        let current = self.registry.get_chance_for(chat_id).await?;
        let text = messages::format(&self.templates.show_chance, Some(current.into()), None);
        self.transport.send_message(chat_id, text);
        Ok(())
    }

    /// Updates the chance of a chat from user input.
    ///
    /// Input without a number is answered like [`show_chance`](Self::show_chance).
    /// Values above 100 are capped, negative values are rejected before
    /// anything is read or sent. The reply is queued before the registry is
    /// written and reports the chance as it was before the update.
    pub async fn set_chance(&self, chat_id: ChatId, raw_value: &str) -> Result<(), Error> {
        let Some(requested) = parse_chance(raw_value) else {
            return self.show_chance(chat_id).await;
        };

        if requested < 0 {
            return Err(Error::InvalidArgument(format!(
                "chance must not be negative, got {requested}"
            )));
        }

        let next = requested.min(100) as u8;
        let current = self.registry.get_chance_for(chat_id).await?;

        let text = messages::format(
            &self.templates.set_chance,
            Some(current.into()),
            Some(next.into()),
        );
        self.transport.send_message(chat_id, text);

        log::info!("Chance for {chat_id} changed from {current} to {next}");

        if next == 0 {
            self.registry.remove(chat_id).await?;
        } else {
            self.registry
                .upsert(ChatChance {
                    chat_id,
                    chance: next,
                })
                .await?;
        }

        Ok(())
    }

    /// Runs an inbound message through the gate. Chats without an entry are
    /// always rejected. Nothing is sent and nothing is written.
    pub async fn process<M: Inbound>(&self, message: M) -> Result<Decision<M>, Error> {
        let chats = self.registry.list_chats().await?;
        let chat_id = message.chat_id();

        let Some(chat) = chats.iter().find(|c| c.chat_id == chat_id) else {
            return Ok(Decision::Rejected(message));
        };

        if self.gate.admit(chat.chance) {
            Ok(Decision::Admitted(message))
        } else {
            Ok(Decision::Rejected(message))
        }
    }
}
