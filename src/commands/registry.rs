use super::CommandResult;
use crate::core::app::App;
use crate::core::render::RenderSink;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>, &mut dyn RenderSink) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands and key bindings.",
        handler: super::handle_help,
    },
    Command {
        name: "model",
        usage: "/model [name]",
        help: "Show the current model or switch to another one.",
        handler: super::handle_model,
    },
    Command {
        name: "rag",
        usage: "/rag <query>",
        help: "Ask one question with retrieved context.",
        handler: super::handle_rag,
    },
    Command {
        name: "clear",
        usage: "/clear",
        help: "Clear the conversation, keeping the preprompt.",
        handler: super::handle_clear,
    },
    Command {
        name: "log",
        usage: "/log [filename]",
        help: "Toggle transcript logging or set the log file.",
        handler: super::handle_log,
    },
];
