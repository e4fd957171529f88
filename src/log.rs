//! Logging functionality and error reporting.
//! The logging library of choice is [tracing].

use itertools::Itertools;
use poise::BoxFuture;
use poise::CreateReply;
use poise::FrameworkError;
use serenity::CreateMessage;
use tracing::debug;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::error::UserError;
use crate::serenity;
use crate::BotError;
use crate::Config;
use crate::Context;
use crate::Data;

/// The name of this crate, used to set filter target.
const THIS_CRATE: &str = env!("CARGO_CRATE_NAME");

/// Boxed layer so console and file layers can be composed freely.
type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Setup format layers, tracing subscribers, and installs tracing.
/// The returned guard must be kept alive for file logs to be flushed.
pub(super) fn install_tracing(config: &Config) -> Option<WorkerGuard> {
    let debug = config.console_debug();

    // By default, all INFO traces and above are shown.
    let target = if debug {
        Targets::new()
            .with_default(LevelFilter::INFO)
            .with_target(THIS_CRATE, LevelFilter::DEBUG)
    } else {
        Targets::new().with_default(LevelFilter::INFO)
    };

    // Put file logs in `log_dir` as "{THIS_CRATE}.log.{TIMESTAMP}" on an hourly basis.
    let (log_layer, guard) = if config.logs_enabled() {
        let appender =
            tracing_appender::rolling::hourly(config.log_dir(), format!("{THIS_CRATE}.log"));
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(file_layer(debug, target.clone(), writer)), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer(debug, target))
        .with(log_layer)
        .init();

    guard
}

/// Pretty, colored output to stdout. File and line are only shown in debug mode.
fn console_layer<S>(debug: bool, target: Targets) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(true)
        .with_file(debug)
        .with_line_number(debug)
        .with_level(true)
        .with_target(true)
        .with_timer(ChronoLocal::rfc_3339())
        .pretty()
        .with_filter(target)
        .boxed()
}

/// Compact, uncolored output for log files.
fn file_layer<S, W>(debug: bool, target: Targets, writer: W) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_ansi(false)
        .with_file(debug)
        .with_line_number(debug)
        .with_level(true)
        .with_target(true)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(writer)
        .compact()
        .with_filter(target)
        .boxed()
}

/// Defines how each [FrameworkError] is handled.
///
/// - Errors caused by the user get an [ephemeral_reply] and a debug log.
/// - Outages of PERSCOM, the attendance store or discord are logged as errors
///   and the user is asked to try again later.
/// - Anything else is a bug: logged as an error and sent to the notify list.
pub fn handle_framework_error(err: FrameworkError<Data, BotError>) -> BoxFuture<()> {
    Box::pin(async move {
        match err {
            // ---
            // Errors invisible to users.
            // ---
            FrameworkError::Setup { error, .. } => error!("Error during startup: {error}"),
            FrameworkError::EventHandler { error, event, .. } => {
                error!("Error while handling event. Event: {event:#?} Error:{error}")
            }
            FrameworkError::UnknownCommand { .. } => error!("Prefix commands are not supported."),
            FrameworkError::UnknownInteraction { interaction, .. } => {
                let name = &interaction.data.name;
                error!("Received unknown interaction: {name}")
            }
            FrameworkError::DynamicPrefix { .. } => error!("Dynamic prefixes are not supported."),

            // ---
            // Errors returned by commands.
            // ---
            FrameworkError::Command {
                error: BotError::UserError(user_error),
                ctx,
                ..
            } => {
                Response::builder()
                    .ctx(&ctx)
                    .reply(user_error.to_string())
                    .source(user_error)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::Command { error, ctx, .. } if is_upstream(&error) => {
                Response::builder()
                    .ctx(&ctx)
                    .reply("That service is unavailable right now. Please try again later.")
                    .source(error)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::Command { error, ctx, .. } => {
                Response::builder()
                    .ctx(&ctx)
                    .reply("Something went wrong... A bug report has been sent.")
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandPanic { payload, ctx, .. } => {
                Response::builder()
                    .ctx(&ctx)
                    .reply("Something went horribly wrong... A bug report has been sent.")
                    .source(BotError::Panic { payload })
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandStructureMismatch {
                description, ctx, ..
            } => {
                let error = BotError::CommandStructureMismatch {
                    description: description.to_string(),
                };
                Response::builder()
                    .ctx(&ctx.into())
                    .reply("Command structure mismatch. Please wait until discord catches up to a bot update.")
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }

            // ---
            // Framework checks the user failed.
            // ---
            other => match (other.ctx(), failed_check(&other)) {
                (Some(ctx), Some((source, add_info))) => {
                    Response::builder()
                        .ctx(&ctx)
                        .reply(source.to_string())
                        .source(source)
                        .maybe_add_info(add_info)
                        .build()
                        .send()
                        .await;
                }
                _ => error!("Unhandled framework error, the dev must have forgotten something..."),
            },
        }
    })
}

/// The user-facing error for a failed framework check, with optional extra info to log.
fn failed_check(err: &FrameworkError<Data, BotError>) -> Option<(BotError, Option<String>)> {
    let user_error = match err {
        FrameworkError::SubcommandRequired { ctx } => {
            let subcmds = ctx
                .command()
                .subcommands
                .iter()
                .map(|s| s.name.as_str())
                .join(", ");
            UserError::MissingSubcommand { subcmds }
        }
        FrameworkError::ArgumentParse { error, input, .. } => {
            let user_error = UserError::BadArgs {
                input: input.clone(),
            };
            return Some((user_error.into(), Some(error.to_string())));
        }
        FrameworkError::CooldownHit {
            remaining_cooldown, ..
        } => UserError::OnCooldown {
            remaining_cooldown: *remaining_cooldown,
        },
        FrameworkError::MissingBotPermissions {
            missing_permissions,
            ..
        } => UserError::MissingBotPermissions {
            missing_permissions: *missing_permissions,
        },
        FrameworkError::MissingUserPermissions {
            missing_permissions,
            ..
        } => UserError::MissingUserPermissions {
            missing_permissions: *missing_permissions,
        },
        FrameworkError::NotAnOwner { .. } => UserError::NotOwner,
        FrameworkError::GuildOnly { .. } => UserError::GuildOnly,
        FrameworkError::DmOnly { .. } => UserError::DmOnly,
        FrameworkError::NsfwOnly { .. } => UserError::NsfwOnly,
        FrameworkError::CommandCheckFailed { error, .. } => {
            let error = BotError::CheckFailed {
                reason: error.as_ref().map(|e| e.to_string()),
            };
            return Some((error, None));
        }
        _ => return None,
    };
    Some((user_error.into(), None))
}

/// Errors caused by a service being unreachable rather than a bug.
fn is_upstream(error: &BotError) -> bool {
    matches!(
        error,
        BotError::AttendanceUnavailable { .. }
            | BotError::MembersUnavailable { .. }
            | BotError::PerscomStatus { .. }
            | BotError::Http(_)
    )
}

/// Sends an ephemeral reply to the [Context] author.
async fn ephemeral_reply(ctx: &Context<'_>, content: impl Into<String>) {
    let reply = CreateReply::default().ephemeral(true).content(content);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send ephemeral reply. {e}")
    };
}

/// Sends a notification (via private message) to users in the notify list.
/// If message fails, only log and don't retry.
async fn notify_bug(ctx: &Context<'_>, content: impl Into<String>) {
    let message = CreateMessage::new().content(content);

    for user in &ctx.data().notify_list {
        if let Err(e) = user.direct_message(ctx, message.clone()).await {
            error!("Failed to send bug notification. {e}");
        }
    }
}

/// Helper function to create debug information from [Context]
fn debug_info(ctx: &Context) -> String {
    let user = &ctx.author().name;
    let cmd = &ctx.command().name;
    let user_input = ctx.invocation_string();
    format!("{user} tried to use {cmd} with {user_input}.")
}

/// Structured response to errors.
/// Always logs as at least [debug level](tracing::debug), but is upgraded to
/// [error level](tracing::error) if `is_error` is set.
/// Additionally, notify messages are accompanied by [debug info](debug_info).
#[derive(bon::Builder)]
#[builder(on(String, into))]
struct Response<'a> {
    /// The context of the response
    ctx: &'a Context<'a>,
    /// The reason for this reply, usually the error causing the response.
    #[builder(into)]
    source: BotError,
    /// Optional ephemeral reply to user.
    reply: Option<String>,
    /// Additional information to log
    add_info: Option<String>,
    /// Set to `true` to log as error.
    #[builder(default = false)]
    is_error: bool,
    /// Set to `true` to send notifications of the error.
    /// Does nothing if `is_error` is false.
    #[builder(default = false)]
    notify: bool,
}

impl Response<'_> {
    /// Execute the response
    async fn send(&self) {
        let ctx = self.ctx;

        let log_message = match &self.add_info {
            Some(info) => format!("{} | {info}", self.source),
            None => self.source.to_string(),
        };

        if self.is_error {
            error!("{log_message}");
            if self.notify {
                let content = format!("Debug Info: {}\n{log_message}", debug_info(ctx));
                notify_bug(ctx, content).await;
            }
        } else {
            debug!("{log_message}");
        }

        if let Some(ref reply) = self.reply {
            ephemeral_reply(ctx, reply).await;
        }
    }
}
