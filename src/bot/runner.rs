//! Dispatcher wiring for the Telegram front end.

use crate::bot::handlers::{self, get_user_id_safe, Command};
use crate::bot::AppContext;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the Telegram polling loop until it finishes or the token fires.
pub async fn run_bot(ctx: Arc<AppContext>, shutdown: CancellationToken) {
    let bot = Bot::new(ctx.settings.telegram_token.clone());
    let handler = setup_handler();

    info!("Bot is running...");

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .enable_ctrlc_handler()
        .build();

    tokio::select! {
        () = dispatcher.dispatch() => {}
        () = shutdown.cancelled() => {
            info!("Telegram front end shutting down");
        }
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        // Gate first: rejected senders get the denial reply and nothing else
        .branch(
            dptree::filter(|msg: Message, ctx: Arc<AppContext>| {
                !ctx.gate.permits(get_user_id_safe(&msg))
            })
            .endpoint(|bot: Bot, msg: Message| async move {
                if let Err(e) = handlers::handle_denied(bot.clone(), msg.clone()).await {
                    handlers::report_handler_error(&bot, &msg, &e).await;
                }
                respond(())
            }),
        )
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(
                    |bot: Bot, msg: Message, cmd: Command, ctx: Arc<AppContext>| async move {
                        if let Err(e) =
                            handlers::handle_command(bot.clone(), msg.clone(), cmd, ctx).await
                        {
                            handlers::report_handler_error(&bot, &msg, &e).await;
                        }
                        respond(())
                    },
                ),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.photo().is_some())
                .endpoint(|bot: Bot, msg: Message, ctx: Arc<AppContext>| async move {
                    if let Err(e) = handlers::handle_photo(bot.clone(), msg.clone(), ctx).await {
                        handlers::report_handler_error(&bot, &msg, &e).await;
                    }
                    respond(())
                }),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some())
                .endpoint(|bot: Bot, msg: Message, ctx: Arc<AppContext>| async move {
                    if let Err(e) = handlers::handle_text(bot.clone(), msg.clone(), ctx).await {
                        handlers::report_handler_error(&bot, &msg, &e).await;
                    }
                    respond(())
                }),
        )
}
