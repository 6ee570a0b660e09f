//! Update polling loop, event decoding and reply rendering

use super::{InlineKeyboardButton, InlineKeyboardMarkup, TelegramClient, Update};
use crate::dispatch::DispatchHandle;
use crate::models::{ConversationId, Delivery, InboundEvent, MenuOption, OutboundMessage};
use crate::Result;
use std::time::Duration;
use tracing::{debug, info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// A decoded update plus what is needed to answer it
#[derive(Debug, Clone)]
pub struct Incoming {
    pub event: InboundEvent,
    pub chat_id: i64,
    /// Message carrying the pressed button, for in-place edits
    pub message_id: Option<i64>,
}

/// Decode a raw update; `None` for anything the dialogue does not consume.
pub fn decode(update: &Update) -> Option<Incoming> {
    if let Some(callback) = &update.callback_query {
        let message = callback.message.as_ref()?;
        let data = callback.data.as_deref()?;

        return Some(Incoming {
            event: InboundEvent::button(ConversationId::from(message.chat.id), data),
            chat_id: message.chat.id,
            message_id: Some(message.message_id),
        });
    }

    let message = update.message.as_ref()?;
    let text = message.text.as_deref()?;
    let conversation_id = ConversationId::from(message.chat.id);

    let event = match parse_command(text) {
        Some(command) => InboundEvent::command(conversation_id, &command),
        None => InboundEvent::text(conversation_id, text),
    };

    Some(Incoming {
        event,
        chat_id: message.chat.id,
        message_id: None,
    })
}

/// `/start@my_bot now` → `start`
fn parse_command(text: &str) -> Option<String> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or_default();

    if name.is_empty() {
        None
    } else {
        Some(name.to_ascii_lowercase())
    }
}

/// One button per row, in option order.
pub fn keyboard(options: &[MenuOption]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: options
            .iter()
            .map(|option| {
                vec![InlineKeyboardButton {
                    text: option.label.clone(),
                    callback_data: option.value.clone(),
                }]
            })
            .collect(),
    }
}

pub struct TelegramPoller {
    client: TelegramClient,
    dispatcher: DispatchHandle,
    poll_timeout: Duration,
}

impl TelegramPoller {
    pub fn new(client: TelegramClient, dispatcher: DispatchHandle, poll_timeout: Duration) -> Self {
        Self {
            client,
            dispatcher,
            poll_timeout,
        }
    }

    /// Poll forever. Returns only if the dispatcher goes away.
    pub async fn run(&self) -> Result<()> {
        let mut offset = 0;
        info!("Telegram polling started");

        loop {
            let updates = match self.client.get_updates(offset, self.poll_timeout).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.process(&update).await?;
            }
        }
    }

    async fn process(&self, update: &Update) -> Result<()> {
        if let Some(callback) = &update.callback_query {
            if let Err(e) = self.client.answer_callback_query(&callback.id).await {
                warn!(error = %e, "Failed to acknowledge callback query");
            }
        }

        let Some(incoming) = decode(update) else {
            debug!(update_id = update.update_id, "Skipping unsupported update");
            return Ok(());
        };

        let replies = self.dispatcher.submit(incoming.event.clone()).await?;
        render(&self.client, &incoming, replies).await;

        Ok(())
    }
}

/// Deliver replies in order; failures are logged, never propagated.
pub async fn render(client: &TelegramClient, incoming: &Incoming, replies: Vec<OutboundMessage>) {
    for reply in replies {
        let markup = reply.options.as_deref().map(keyboard);

        let result = match (reply.delivery, incoming.message_id) {
            (Delivery::EditPrevious, Some(message_id)) => {
                client
                    .edit_message_text(incoming.chat_id, message_id, &reply.text, markup.as_ref())
                    .await
            }
            _ => {
                client
                    .send_message(incoming.chat_id, &reply.text, markup.as_ref())
                    .await
            }
        };

        match result {
            Ok(()) => {}
            Err(e) if e.to_string().contains("message is not modified") => {
                debug!(chat_id = incoming.chat_id, "Edit skipped, message unchanged");
            }
            Err(e) => {
                warn!(chat_id = incoming.chat_id, error = %e, "Failed to deliver reply");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;
    use axum::{extract::Path, extract::State, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn update(raw: Value) -> Update {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_decode_command() {
        let incoming = decode(&update(json!({
            "update_id": 1,
            "message": { "message_id": 10, "chat": { "id": 42 }, "text": "/Start@rates_bot hello" }
        })))
        .unwrap();

        assert_eq!(incoming.event.kind, EventKind::Command);
        assert_eq!(incoming.event.payload, "start");
        assert_eq!(incoming.event.conversation_id.as_str(), "42");
        assert_eq!(incoming.message_id, None);
    }

    #[test]
    fn test_decode_text() {
        let incoming = decode(&update(json!({
            "update_id": 2,
            "message": { "message_id": 11, "chat": { "id": 42 }, "text": "150.5" }
        })))
        .unwrap();

        assert_eq!(incoming.event.kind, EventKind::Text);
        assert_eq!(incoming.event.payload, "150.5");
    }

    #[test]
    fn test_decode_button() {
        let incoming = decode(&update(json!({
            "update_id": 3,
            "callback_query": {
                "id": "q1",
                "data": "HOME_TO_FOREIGN",
                "message": { "message_id": 12, "chat": { "id": 42 }, "text": "Choose an action:" }
            }
        })))
        .unwrap();

        assert_eq!(incoming.event.kind, EventKind::Button);
        assert_eq!(incoming.event.payload, "HOME_TO_FOREIGN");
        assert_eq!(incoming.message_id, Some(12));
    }

    #[test]
    fn test_decode_skips_unsupported_updates() {
        // Photo without text
        assert!(decode(&update(json!({
            "update_id": 4,
            "message": { "message_id": 13, "chat": { "id": 42 } }
        })))
        .is_none());

        // Callback from an inline message has no chat
        assert!(decode(&update(json!({
            "update_id": 5,
            "callback_query": { "id": "q2", "data": "USD" }
        })))
        .is_none());

        // Bare slash is plain text, not a command
        let incoming = decode(&update(json!({
            "update_id": 6,
            "message": { "message_id": 14, "chat": { "id": 42 }, "text": "/" }
        })))
        .unwrap();
        assert_eq!(incoming.event.kind, EventKind::Text);
    }

    #[test]
    fn test_keyboard_one_button_per_row() {
        let markup = keyboard(&[MenuOption::new("USD", "USD"), MenuOption::new("EUR", "EUR")]);

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].callback_data, "EUR");
    }

    type Calls = Arc<Mutex<Vec<(String, Value)>>>;

    async fn fake_bot_api(
        State(calls): State<Calls>,
        Path((_bot, method)): Path<(String, String)>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        calls.lock().await.push((method.clone(), body));

        if method == "editMessageText" {
            return Json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: message is not modified"
            }));
        }
        Json(json!({ "ok": true, "result": true }))
    }

    #[tokio::test]
    async fn test_render_edits_and_sends() {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/:bot/:method", post(fake_bot_api))
            .with_state(calls.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = TelegramClient::new(
            &format!("http://{}", addr),
            "123:abc",
            Duration::from_secs(1),
        )
        .unwrap();

        let incoming = Incoming {
            event: InboundEvent::button(ConversationId::from(42_i64), "USD"),
            chat_id: 42,
            message_id: Some(12),
        };
        let replies = vec![
            OutboundMessage {
                text: "Enter the amount in RUB:".to_string(),
                options: None,
                delivery: Delivery::EditPrevious,
            },
            OutboundMessage {
                text: "Choose an action:".to_string(),
                options: Some(vec![MenuOption::new("A", "HOME_TO_FOREIGN")]),
                delivery: Delivery::NewMessage,
            },
        ];

        render(&client, &incoming, replies).await;

        let calls = calls.lock().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "editMessageText");
        assert_eq!(calls[0].1["message_id"], 12);
        assert_eq!(calls[1].0, "sendMessage");
        assert_eq!(calls[1].1["chat_id"], 42);
        assert_eq!(
            calls[1].1["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "HOME_TO_FOREIGN"
        );
    }
}
