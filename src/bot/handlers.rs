//! Message handlers for the Telegram front end.
//!
//! Every runtime failure inside a handler is converted to a user-visible
//! `❌`-prefixed message at the endpoint boundary; nothing here crashes the
//! dispatch loop.

use crate::bot::AppContext;
use crate::config::REPLY_CHUNK_SIZE;
use crate::llm::{payload, ChatRequest, SamplingParams};
use crate::utils;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info};

/// Caption used when a photo arrives without text
const DEFAULT_PHOTO_CAPTION: &str = "Analiza esta imagen, patrón.";

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Comandos disponibles:")]
pub enum Command {
    #[command(description = "Iniciar el bot.")]
    Start,
    #[command(description = "Mostrar esta ayuda.")]
    Help,
    #[command(description = "Estado del sistema.")]
    Status,
}

/// Sender identifier, or 0 when Telegram omits the user.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Reply to a sender the gate rejected. The inference caller is never
/// touched on this path.
pub async fn handle_denied(bot: Bot, msg: Message) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    info!("Rejected sender {user_id}");
    bot.send_message(msg.chat.id, crate::bot::gate::AccessGate::denial_message(user_id))
        .await?;
    Ok(())
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<AppContext>,
) -> Result<()> {
    let text = match cmd {
        Command::Start => {
            let name = msg
                .from
                .as_ref()
                .map_or_else(|| "patrón".to_string(), |u| u.first_name.clone());
            format!(
                "🔱 BATUTO-ART OS 🔱\n\n\
                 ¡Hola {name}!\n\n\
                 📤 Envía texto o una imagen (con o sin pie de foto) para un análisis completo.\n\n\
                 Usa /help para ver los comandos."
            )
        }
        Command::Help => Command::descriptions().to_string(),
        Command::Status => format!(
            "📊 Estado del Sistema:\n\n\
             🤖 Bot: ACTIVO\n\
             🧠 Modelo: {}\n\
             🌐 API: SambaNova\n\
             ✅ Estado: Operativo al 100%\n\n\
             Última verificación: {}",
            ctx.registry.default().model_id,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        ),
    };

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

pub async fn handle_text(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> Result<()> {
    let text = msg.text().unwrap_or("");
    // Commands are handled by their own branch
    if text.starts_with('/') {
        return Ok(());
    }

    info!(
        "Text from {}: {}",
        get_user_id_safe(&msg),
        utils::truncate_str(text, 100)
    );

    let processing = bot
        .send_message(msg.chat.id, "🔄 Procesando texto...")
        .await?;

    let response = run_completion(&ctx, None, ChatRequest::text(text)).await;
    deliver(&bot, &msg, processing.id, &response).await
}

pub async fn handle_photo(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> Result<()> {
    let photo = msg
        .photo()
        .and_then(|sizes| sizes.last())
        .ok_or_else(|| anyhow!("no photo in message"))?;
    let caption = msg.caption().unwrap_or(DEFAULT_PHOTO_CAPTION).to_string();

    info!("Photo from {}", get_user_id_safe(&msg));

    let processing = bot
        .send_message(msg.chat.id, "🔄 Descargando imagen...")
        .await?;

    // Highest-resolution variant is the last entry
    let file = bot.get_file(photo.file.id.clone()).await?;
    let mut buffer = Vec::new();
    bot.download_file(&file.path, &mut buffer).await?;

    let image = image::load_from_memory(&buffer)
        .map_err(|e| anyhow!("no pude decodificar la imagen: {e}"))?;

    edit_best_effort(&bot, msg.chat.id, processing.id, "🔥 Ejecutando análisis...").await;

    let response = run_completion(&ctx, None, ChatRequest::with_image(caption, image)).await;
    deliver(&bot, &msg, processing.id, &response).await
}

/// Resolve the persona, build the payload and run the resilient call.
///
/// Always yields a user-facing string: retry exhaustion and malformed
/// responses come back as `❌`-prefixed text, never as a panic or an error
/// escaping the dispatch loop.
pub async fn run_completion(
    ctx: &AppContext,
    requested_persona: Option<&str>,
    request: ChatRequest,
) -> String {
    let persona = ctx.registry.resolve(requested_persona, request.has_image());
    debug!("Resolved persona {} ({})", persona.name, persona.model_id);

    let params = SamplingParams::from(ctx.settings.as_ref());
    let body = match payload::build_payload(persona, &request, params) {
        Ok(body) => body,
        Err(e) => return format!("❌ Error en el búnker: {e}"),
    };

    match ctx.caller.complete(&body).await {
        Ok(text) => text,
        Err(e) => {
            error!("Chat completion failed: {e}");
            format!("❌ Error en la conexión: {e}")
        }
    }
}

/// Send a response, chunked and labeled when it exceeds the message limit,
/// and update the processing message to reflect completion.
async fn deliver(bot: &Bot, msg: &Message, processing_id: MessageId, response: &str) -> Result<()> {
    let parts = utils::chunk_reply(response, REPLY_CHUNK_SIZE);

    if parts.len() > 1 {
        edit_best_effort(
            bot,
            msg.chat.id,
            processing_id,
            "📝 Respuesta larga, enviando en partes...",
        )
        .await;
        for (i, part) in parts.iter().enumerate() {
            bot.send_message(msg.chat.id, format!("Parte {}:\n{part}", i + 1))
                .await?;
        }
    } else {
        edit_best_effort(bot, msg.chat.id, processing_id, "✅ Análisis completado:").await;
        if let Some(part) = parts.first() {
            bot.send_message(msg.chat.id, part).await?;
        }
    }

    Ok(())
}

/// Edit a status message, swallowing failures. The status line is cosmetic;
/// a failed edit must not abort delivery of the actual response.
async fn edit_best_effort(bot: &Bot, chat_id: ChatId, msg_id: MessageId, text: &str) {
    if let Err(e) = bot.edit_message_text(chat_id, msg_id, text).await {
        debug!("Status edit skipped: {e}");
    }
}

/// Endpoint boundary: log the failure and try to tell the user, swallowing
/// any secondary failure from the notification itself.
pub async fn report_handler_error(bot: &Bot, msg: &Message, err: &anyhow::Error) {
    error!("Handler error: {err}");
    let _ = bot
        .send_message(msg.chat.id, format!("❌ Error: {err}"))
        .await;
}
