use crate::application::errors::CommandError;
use crate::domain::entities::{Command, CommandRegistry, Content, Message};

/// Service for managing and executing commands
pub struct CommandService {
    registry: CommandRegistry,
    prefix: String,
}

impl CommandService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            prefix: prefix.into(),
        }
    }

    pub fn register(&mut self, command: Command) {
        self.registry.register(command);
    }

    pub fn register_defaults(&mut self) {
        self.register(
            Command::new("help")
                .with_description("Show help message")
                .with_usage("/help [command]"),
        );

        self.register(
            Command::new("version")
                .with_description("Show bot version")
                .with_handler(|_| Ok(format!("levelbot v{}", env!("CARGO_PKG_VERSION")))),
        );
    }

    pub fn handle(&self, message: &Message) -> Result<Option<String>, CommandError> {
        let Content::Command { name, args } = &message.content else {
            return Ok(None);
        };

        if name == "help" {
            return Ok(Some(self.get_help(args.first().map(String::as_str))));
        }

        let cmd = self
            .registry
            .find(name)
            .ok_or_else(|| CommandError::NotFound(name.clone()))?;

        if let Some(handler) = &cmd.handler {
            Ok(Some(handler(message.clone())?))
        } else {
            Ok(Some(format!("Command {} not implemented", cmd.name)))
        }
    }

    pub fn get_help(&self, command: Option<&str>) -> String {
        if let Some(name) = command {
            if let Some(cmd) = self.registry.get(name) {
                let mut help = format!(
                    "/{} - {}",
                    cmd.name,
                    cmd.description.as_deref().unwrap_or("No description")
                );
                if let Some(usage) = &cmd.usage {
                    help.push_str(&format!("\nUsage: {}", usage));
                }
                return help;
            }
            return format!("Command /{} not found", name);
        }

        let mut help = "Available commands:\n".to_string();
        let mut names: Vec<&Command> = self.registry.all().collect();
        names.sort_by(|a, b| a.name.cmp(&b.name));
        for cmd in names {
            help.push_str(&format!(
                "  /{} - {}\n",
                cmd.name,
                cmd.description.as_deref().unwrap_or("")
            ));
        }
        help
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_command_is_an_error() {
        let commands = CommandService::new("/");
        let msg = Message::from_command("1", "nope", vec![]);
        assert!(matches!(
            commands.handle(&msg),
            Err(CommandError::NotFound(_))
        ));
    }

    #[test]
    fn non_command_messages_are_skipped() {
        let commands = CommandService::new("/");
        let msg = Message::from_text("1", "just chatting");
        assert!(matches!(commands.handle(&msg), Ok(None)));
    }

    #[test]
    fn help_lists_registered_commands() {
        let mut commands = CommandService::new("/");
        commands.register_defaults();
        let help = commands.get_help(None);
        assert!(help.contains("/version"));
    }
}
