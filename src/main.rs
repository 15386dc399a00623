use std::sync::Arc;

use chancebot::config::Config;
use chancebot::database::SqliteStore;
use chancebot::messages::{self, HELP_MESSAGE};
use chancebot::reply_queue::ReplyQueue;
use chancebot::{ChanceController, ChanceGate, ChanceRegistry, Decision, Error};
use dptree::deps;
use teloxide::macros::BotCommands;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;

type Controller = ChanceController<ReplyQueue>;

#[derive(BotCommands, Clone, Debug)]
#[command(
    rename_rule = "snake_case",
    description = "These commands are supported:"
)]
enum Command {
    #[command(description = "show this text.")]
    Help,
    #[command(description = "show the reply chance of this chat.")]
    Chance,
    #[command(description = "set the reply chance of this chat (0 to 100).")]
    SetChance(String),
}

async fn answer(
    bot: Bot,
    msg: Message,
    cmd: Command,
    controller: Arc<Controller>,
) -> ResponseResult<()> {
    log::info!("{:?}", cmd);
    let chat_id = msg.chat.id;

    let result = match cmd {
        Command::Help => {
            bot.send_message(chat_id, HELP_MESSAGE)
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
        Command::Chance => controller.show_chance(chat_id).await,
        Command::SetChance(value) => controller.set_chance(chat_id, &value).await,
    };

    let reply = match result {
        Ok(()) => return Ok(()),
        Err(Error::InvalidArgument(e)) => {
            log::info!("{chat_id}: {e}");
            messages::invalid_chance()
        }
        Err(e) => {
            log::error!("Storage error: {e}");
            messages::internal_error()
        }
    };

    bot.send_message(chat_id, reply)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

async fn gate_message(
    bot: Bot,
    msg: Message,
    controller: Arc<Controller>,
    config: Arc<Config>,
) -> ResponseResult<()> {
    match controller.process(msg).await {
        Ok(Decision::Admitted(msg)) => {
            bot.send_message(msg.chat.id, config.reply_message.clone())
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
        }
        Ok(Decision::Rejected(msg)) => log::debug!("{}: message {} not answered", msg.chat.id, msg.id.0),
        Err(e) => log::error!("Storage error: {e}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    log::info!("Starting bot...");

    let config = Config::from_env()?;
    let store = SqliteStore::connect(&config.database_url).await?;

    let bot = Bot::from_env();
    let controller: Arc<Controller> = Arc::new(ChanceController::new(
        ChanceRegistry::new(Arc::new(store), config.doc_path.clone()),
        ChanceGate::from_os_rng(),
        config.templates.clone(),
        ReplyQueue::new(bot.clone()),
    ));
    let config = Arc::new(config);

    let handler = Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(answer))
        .branch(dptree::endpoint(gate_message));

    Dispatcher::builder(bot, handler)
        .dependencies(deps![controller, config])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
