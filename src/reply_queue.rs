use std::time::Duration;

use teloxide::prelude::*;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

/// Replies delivered per tick of the courier.
const BURST: usize = 20;
const TICK: Duration = Duration::from_secs(1);

/// Outbound side of the chat: best effort, nothing is awaited.
pub trait Transport: Send + Sync {
    fn send_message(&self, chat_id: ChatId, text: String);
}

/// Hands replies to a background courier task that delivers at most
/// [`BURST`] of them per second.
#[derive(Clone)]
pub struct ReplyQueue {
    outbox: mpsc::UnboundedSender<(ChatId, String)>,
}

struct Courier {
    bot: Bot,
    inbox: mpsc::UnboundedReceiver<(ChatId, String)>,
    pace: Interval,
}

impl Courier {
    async fn run(mut self) {
        let mut batch = Vec::with_capacity(BURST);

        while self.inbox.recv_many(&mut batch, BURST).await > 0 {
            for (chat_id, text) in batch.drain(..) {
                if let Err(e) = self.bot.send_message(chat_id, text).await {
                    log::warn!("Reply to {chat_id} dropped: {e}");
                }
            }
            self.pace.tick().await;
        }

        log::info!("Reply queue closed");
    }
}

impl ReplyQueue {
    pub fn new(bot: Bot) -> Self {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let mut pace = tokio::time::interval(TICK);
        pace.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::spawn(Courier { bot, inbox, pace }.run());

        Self { outbox }
    }
}

impl Transport for ReplyQueue {
    fn send_message(&self, chat_id: ChatId, text: String) {
        if let Err(mpsc::error::SendError((chat_id, _))) = self.outbox.send((chat_id, text)) {
            log::error!("Reply queue is gone, reply to {chat_id} lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_replies_keep_their_order() {
        let (outbox, mut inbox) = mpsc::unbounded_channel();
        let queue = ReplyQueue { outbox };

        queue.send_message(ChatId(1), "first".to_owned());
        queue.send_message(ChatId(2), "second".to_owned());

        assert_eq!(inbox.try_recv().unwrap(), (ChatId(1), "first".to_owned()));
        assert_eq!(inbox.try_recv().unwrap(), (ChatId(2), "second".to_owned()));
    }

    #[test]
    fn closed_queue_drops_replies() {
        let (outbox, inbox) = mpsc::unbounded_channel();
        drop(inbox);

        ReplyQueue { outbox }.send_message(ChatId(1), "lost".to_owned());
    }
}
