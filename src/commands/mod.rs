mod registry;

pub use registry::{all_commands, CommandInvocation};

use crate::core::app::App;
use crate::core::message::AppMessageKind;
use crate::core::render::RenderSink;

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    /// Submit the text with retrieval regardless of the sidebar toggle.
    ProcessWithRetrieval(String),
}

const KEY_HELP: &str = "Keys: Esc leaves typing, then t types, s opens the sidebar, \
Enter sends, q quits. Alt+Enter inserts a newline. Ctrl+C quits anywhere.";

pub fn process_input(app: &mut App, input: &str, sink: &mut dyn RenderSink) -> CommandResult {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command_name = parts.next().unwrap_or_default();
    let args = parts.next().unwrap_or("").trim();

    match registry::find_command(command_name) {
        Some(command) => {
            let invocation = CommandInvocation {
                input: trimmed,
                args,
            };
            (command.handler)(app, invocation, sink)
        }
        None => {
            app.add_notice(
                AppMessageKind::Error,
                format!("Unknown command: {trimmed}. Type /help for a list of commands."),
                sink,
            );
            CommandResult::Continue
        }
    }
}

pub(super) fn handle_help(
    app: &mut App,
    _invocation: CommandInvocation<'_>,
    sink: &mut dyn RenderSink,
) -> CommandResult {
    let mut help = String::from("Commands:\n");
    for command in all_commands() {
        help.push_str(&format!("  {:<16} {}\n", command.usage, command.help));
    }
    help.push_str(KEY_HELP);
    app.add_notice(AppMessageKind::Info, help, sink);
    CommandResult::Continue
}

pub(super) fn handle_model(
    app: &mut App,
    invocation: CommandInvocation<'_>,
    sink: &mut dyn RenderSink,
) -> CommandResult {
    if invocation.args.is_empty() {
        let message = format!("Current model: {}", app.session.model());
        app.add_notice(AppMessageKind::Info, message, sink);
    } else {
        app.select_model(invocation.args, sink);
    }
    CommandResult::Continue
}

pub(super) fn handle_rag(
    app: &mut App,
    invocation: CommandInvocation<'_>,
    sink: &mut dyn RenderSink,
) -> CommandResult {
    if invocation.args.is_empty() {
        app.add_notice(AppMessageKind::Info, "No query provided for retrieval.", sink);
        return CommandResult::Continue;
    }
    CommandResult::ProcessWithRetrieval(invocation.args.to_string())
}

pub(super) fn handle_clear(
    app: &mut App,
    _invocation: CommandInvocation<'_>,
    sink: &mut dyn RenderSink,
) -> CommandResult {
    app.clear_transcript(sink);
    CommandResult::Continue
}

pub(super) fn handle_log(
    app: &mut App,
    invocation: CommandInvocation<'_>,
    sink: &mut dyn RenderSink,
) -> CommandResult {
    let result = if invocation.args.is_empty() {
        app.logging.toggle_logging()
    } else {
        app.logging.set_log_file(invocation.args.to_string())
    };
    match result {
        Ok(message) => app.set_status(message, sink),
        Err(e) => app.set_status(format!("Log error: {e}"), sink),
    }
    CommandResult::Continue
}
