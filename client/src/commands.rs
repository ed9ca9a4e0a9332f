use thiserror::Error;

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reload and show the conversation list.
    List,
    /// Start a draft conversation.
    New,
    Open(i64),
    Delete(i64),
    /// Filter the list; an empty query shows everything.
    Search(String),
    /// Dismiss the last error.
    Dismiss,
    Help,
    Quit,
    /// Anything that is not a slash command is sent as a message.
    Send(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '/{0}'. Type /help for a list.")]
    Unknown(String),

    #[error("/{0} needs a conversation id")]
    MissingId(&'static str),

    #[error("'{0}' is not a conversation id")]
    InvalidId(String),
}

pub const HELP: &str = "\
/list            reload and show conversations
/new             start a new conversation
/open <id>       open a conversation
/delete <id>     delete a conversation
/search [text]   filter conversations by message text
/dismiss         hide the last error
/help            show this help
/quit            exit
anything else    send it as a message";

fn parse_id(name: &'static str, arg: &str) -> Result<i64, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingId(name));
    }
    arg.parse().map_err(|_| CommandError::InvalidId(arg.to_string()))
}

impl Command {
    /// Parses a line; blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Command::Send(line.to_string())));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let command = match name {
            "list" | "ls" => Command::List,
            "new" => Command::New,
            "open" => Command::Open(parse_id("open", arg)?),
            "delete" | "rm" => Command::Delete(parse_id("delete", arg)?),
            "search" => Command::Search(arg.to_string()),
            "dismiss" => Command::Dismiss,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}
