//! REPL input parsing.

use std::path::PathBuf;

use erpa_core::workflow::WorkflowCommand;

/// Slash commands offered for completion, with the argument each expects.
pub const COMMANDS: &[(&str, Option<&str>)] = &[
    ("/attach", Some("<path>")),
    ("/run", Some("<n>")),
    ("/confirm", None),
    ("/cancel", None),
    ("/show", None),
    ("/modify", Some("<change>")),
    ("/new", None),
    ("/clear", None),
    ("/help", None),
];

/// Inline hint for a partially typed line.
///
/// Completes a command name while it is being typed, then shows the
/// argument placeholder once the name is complete.
pub fn hint_for(line: &str) -> Option<String> {
    if !line.starts_with('/') {
        return None;
    }
    if let Some(name) = line.strip_suffix(' ') {
        if name.contains(' ') {
            return None;
        }
        return argument_of(name).map(str::to_string);
    }
    if line.contains(' ') {
        return None;
    }
    match COMMANDS.iter().find(|(name, _)| *name == line) {
        Some((_, argument)) => argument.map(|argument| format!(" {argument}")),
        None => COMMANDS
            .iter()
            .find(|(name, _)| name.starts_with(line))
            .map(|(name, _)| name[line.len()..].to_string()),
    }
}

fn argument_of(name: &str) -> Option<&'static str> {
    COMMANDS
        .iter()
        .find(|(command, _)| *command == name)
        .and_then(|(_, argument)| *argument)
}

/// True when the line starts with a slash command no prefix of which is known.
pub fn is_unknown_command(line: &str) -> bool {
    let Some(name) = line.split_whitespace().next() else {
        return false;
    };
    name.starts_with('/') && !COMMANDS.iter().any(|(command, _)| command.starts_with(name))
}

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Quit,
    Help,
    Message(String),
    Attach(PathBuf),
    Run(usize),
    Workflow(WorkflowCommand),
    NewChat,
    ClearHistory,
    Invalid(String),
}

impl ReplCommand {
    /// Parses a trimmed, non-empty line.
    pub fn parse(line: &str) -> Self {
        if line == "quit" || line == "exit" {
            return Self::Quit;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Message(line.to_string());
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };

        match (name, argument) {
            ("help", _) => Self::Help,
            ("new", _) => Self::NewChat,
            ("clear", _) => Self::ClearHistory,
            ("confirm", _) => Self::Workflow(WorkflowCommand::Confirm),
            ("cancel", _) => Self::Workflow(WorkflowCommand::Cancel),
            ("show", _) => Self::Workflow(WorkflowCommand::ShowData),
            ("modify", "") => Self::Invalid("Usage: /modify <change to apply>".to_string()),
            ("modify", text) => Self::Workflow(WorkflowCommand::Modify(text.to_string())),
            ("attach", "") => Self::Invalid("Usage: /attach <path to PDF or image>".to_string()),
            ("attach", path) => Self::Attach(PathBuf::from(path)),
            ("run", number) => match number.parse::<usize>() {
                Ok(n) if n > 0 => Self::Run(n),
                _ => Self::Invalid("Usage: /run <suggestion number>".to_string()),
            },
            (other, _) => Self::Invalid(format!("Unknown command: /{other}")),
        }
    }
}

pub fn help_text() -> &'static str {
    "Type a question to ask the assistant.\n\
     /attach <path>   attach a PDF or image to the next message\n\
     /run <n>         run suggestion n from the last reply\n\
     /confirm /cancel /show   answer a pending PDF extraction\n\
     /modify <text>   change the extracted order\n\
     /new             start a new chat\n\
     /clear           clear the server-side history and start over\n\
     quit             exit"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            ReplCommand::parse("how many customers?"),
            ReplCommand::Message("how many customers?".into())
        );
    }

    #[test]
    fn test_workflow_commands() {
        assert_eq!(
            ReplCommand::parse("/confirm"),
            ReplCommand::Workflow(WorkflowCommand::Confirm)
        );
        assert_eq!(
            ReplCommand::parse("/modify change qty to 20"),
            ReplCommand::Workflow(WorkflowCommand::Modify("change qty to 20".into()))
        );
        assert!(matches!(ReplCommand::parse("/modify"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn test_run_requires_positive_number() {
        assert_eq!(ReplCommand::parse("/run 2"), ReplCommand::Run(2));
        assert!(matches!(ReplCommand::parse("/run 0"), ReplCommand::Invalid(_)));
        assert!(matches!(ReplCommand::parse("/run x"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn test_hint_completes_name_then_shows_argument() {
        assert_eq!(hint_for("/at").as_deref(), Some("tach"));
        assert_eq!(hint_for("/attach").as_deref(), Some(" <path>"));
        assert_eq!(hint_for("/run ").as_deref(), Some("<n>"));
        assert_eq!(hint_for("/modify qty to 5"), None);
        assert_eq!(hint_for("/confirm"), None);
        assert_eq!(hint_for("/zz"), None);
        assert_eq!(hint_for("hello"), None);
    }

    #[test]
    fn test_unknown_command_detection() {
        assert!(is_unknown_command("/teleport now"));
        assert!(!is_unknown_command("/mod"));
        assert!(!is_unknown_command("/run 2"));
        assert!(!is_unknown_command("plain text"));
    }

    #[test]
    fn test_every_command_parses() {
        for (name, argument) in COMMANDS {
            let line = match argument {
                Some(_) if *name == "/run" => format!("{name} 1"),
                Some(_) => format!("{name} something"),
                None => name.to_string(),
            };
            assert!(
                !matches!(ReplCommand::parse(&line), ReplCommand::Invalid(_)),
                "{line}"
            );
        }
    }

    #[test]
    fn test_attach_and_unknown() {
        assert_eq!(
            ReplCommand::parse("/attach ./orders/po.pdf"),
            ReplCommand::Attach(PathBuf::from("./orders/po.pdf"))
        );
        assert_eq!(
            ReplCommand::parse("/teleport"),
            ReplCommand::Invalid("Unknown command: /teleport".into())
        );
        assert_eq!(ReplCommand::parse("quit"), ReplCommand::Quit);
    }
}
