//! Builds the [poise::Framework] running the attendance and PERSCOM commands.

use itertools::Itertools;

use crate::commands;
use crate::serenity;
use crate::BotError;
use crate::Config;
use crate::Context;
use crate::Data;

type Framework = poise::Framework<Data, BotError>;
type Command = poise::Command<Data, BotError>;

/// Construct the framework. `data` is completed with the notify list once
/// the bot is connected and knows its owners.
pub(super) fn framework(config: Config, data: Data) -> Framework {
    poise::Framework::builder()
        .options(framework_options())
        .setup(|ctx, rdy, fw| framework_setup(ctx, rdy, fw, config, data))
        .build()
}

fn framework_options() -> poise::FrameworkOptions<Data, BotError> {
    poise::FrameworkOptions {
        commands: commands::list(),
        on_error: |e| crate::log::handle_framework_error(e),
        pre_command: |ctx| Box::pin(async move { tracing::info!("{} started.", invocation(&ctx)) }),
        post_command: |ctx| Box::pin(async move { tracing::info!("{} finished.", invocation(&ctx)) }),
        ..Default::default()
    }
}

/// "'/attendance' by Ayla in guild 123" for command logs.
fn invocation(ctx: &Context<'_>) -> String {
    let cmd = &ctx.command().name;
    let user = &ctx.author().name;
    match ctx.guild_id() {
        Some(guild) => format!("'/{cmd}' by {user} in guild {guild}"),
        None => format!("'/{cmd}' by {user} in DMs"),
    }
}

/// Slash names of `commands`, for the startup log.
fn command_names(commands: &[Command]) -> String {
    commands.iter().map(|c| format!("/{}", c.name)).join(", ")
}

fn framework_setup<'a>(
    ctx: &'a serenity::Context,
    rdy: &'a serenity::Ready,
    fw: &'a Framework,
    config: Config,
    mut data: Data,
) -> poise::BoxFuture<'a, Result<Data, BotError>> {
    Box::pin(async move {
        let commands = &commands::list();
        let app_commands = poise::builtins::create_application_commands(commands);

        serenity::Command::set_global_commands(&ctx, app_commands.clone()).await?;
        tracing::info!("Registered {} globally.", command_names(commands));

        // Global registration can take a while to show up, guild commands don't.
        if let Some(dev_guild) = config.dev_guild() {
            dev_guild.set_commands(ctx, app_commands).await?;
            tracing::info!("Registered {} on dev guild {dev_guild}.", command_names(commands));
        }

        data.notify_list = config.notify_list(fw);
        tracing::info!(
            "{} is tracking attendance in {} guilds, {} users get bug reports.",
            rdy.user.name,
            rdy.guilds.len(),
            data.notify_list.len()
        );

        Ok(data)
    })
}
