use super::handlers::{config, core, io};
use super::CommandResult;
use crate::core::session::TutorSession;

pub type CommandHandler = fn(&mut TutorSession, CommandInvocation<'_>) -> CommandResult;

pub struct CommandUsage {
    pub syntax: &'static str,
    pub description: &'static str,
}

pub struct Command {
    pub name: &'static str,
    pub usages: &'static [CommandUsage],
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

impl<'a> CommandInvocation<'a> {
    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.split_whitespace().nth(index)
    }

    pub fn args_len(&self) -> usize {
        self.args.split_whitespace().count()
    }

    /// Everything after the first `skip` words, whitespace preserved.
    pub fn rest_from(&self, skip: usize) -> &'a str {
        let mut rest = self.args.trim_start();
        for _ in 0..skip {
            rest = match rest.find(char::is_whitespace) {
                Some(end) => rest[end..].trim_start(),
                None => "",
            };
        }
        rest.trim_end()
    }
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
        usages: &[CommandUsage {
            syntax: "/help",
            description: "Show available commands.",
        }],
        handler: core::handle_help,
    },
    Command {
        name: "history",
        usages: &[CommandUsage {
            syntax: "/history",
            description: "Show the conversation so far.",
        }],
        handler: core::handle_history,
    },
    Command {
        name: "feedback",
        usages: &[CommandUsage {
            syntax: "/feedback",
            description: "Show the latest feedback and your most common errors.",
        }],
        handler: core::handle_feedback,
    },
    Command {
        name: "goals",
        usages: &[CommandUsage {
            syntax: "/goals",
            description: "List your learning goals.",
        }],
        handler: core::handle_goals,
    },
    Command {
        name: "goal",
        usages: &[
            CommandUsage {
                syntax: "/goal add <text>",
                description: "Add a goal.",
            },
            CommandUsage {
                syntax: "/goal edit <n> <text>",
                description: "Replace goal number n.",
            },
            CommandUsage {
                syntax: "/goal delete <n>",
                description: "Remove goal number n.",
            },
        ],
        handler: core::handle_goal,
    },
    Command {
        name: "progress",
        usages: &[CommandUsage {
            syntax: "/progress",
            description: "Show scores, practice time and the history chart.",
        }],
        handler: core::handle_progress,
    },
    Command {
        name: "journal",
        usages: &[CommandUsage {
            syntax: "/journal",
            description: "Show journal entries, newest first.",
        }],
        handler: core::handle_journal,
    },
    Command {
        name: "settings",
        usages: &[CommandUsage {
            syntax: "/settings",
            description: "Show the current settings.",
        }],
        handler: config::handle_settings,
    },
    Command {
        name: "provider",
        usages: &[CommandUsage {
            syntax: "/provider [openai|groq|anthropic]",
            description: "Show or switch the chat provider.",
        }],
        handler: config::handle_provider,
    },
    Command {
        name: "model",
        usages: &[CommandUsage {
            syntax: "/model [id]",
            description: "Show or set the model for the current provider.",
        }],
        handler: config::handle_model,
    },
    Command {
        name: "language",
        usages: &[CommandUsage {
            syntax: "/language [name]",
            description: "Show or switch the language you are learning.",
        }],
        handler: config::handle_language,
    },
    Command {
        name: "mode",
        usages: &[CommandUsage {
            syntax: "/mode [casual|structured]",
            description: "Switch conversation style; toggles without an argument.",
        }],
        handler: config::handle_mode,
    },
    Command {
        name: "voice",
        usages: &[CommandUsage {
            syntax: "/voice [name]",
            description: "List voices or pick one.",
        }],
        handler: config::handle_voice,
    },
    Command {
        name: "tts",
        usages: &[CommandUsage {
            syntax: "/tts [on|off]",
            description: "Speak tutor replies; toggles without an argument.",
        }],
        handler: config::handle_tts,
    },
    Command {
        name: "prompt",
        usages: &[
            CommandUsage {
                syntax: "/prompt [text]",
                description: "Show or replace the system prompt.",
            },
            CommandUsage {
                syntax: "/prompt reset",
                description: "Restore the configured system prompt.",
            },
        ],
        handler: config::handle_prompt,
    },
    Command {
        name: "record",
        usages: &[CommandUsage {
            syntax: "/record <file.wav>",
            description: "Transcribe a recording and send it as your message.",
        }],
        handler: io::handle_record,
    },
    Command {
        name: "health",
        usages: &[CommandUsage {
            syntax: "/health",
            description: "Check the speech endpoints.",
        }],
        handler: io::handle_health,
    },
    Command {
        name: "dump",
        usages: &[CommandUsage {
            syntax: "/dump [filename]",
            description: "Export the conversation to a text file.",
        }],
        handler: io::handle_dump,
    },
    Command {
        name: "quit",
        usages: &[CommandUsage {
            syntax: "/quit",
            description: "Leave the tutor.",
        }],
        handler: core::handle_quit,
    },
];
