use crate::commands::CommandResult;

pub const WELCOME: &str = "Welcome to Our Application\n\nThis is the home page of the application. \
Use the commands below to access the other tools.\n\n  valprop optimize   Comprehensive Value \
Proposition Optimizer\n  valprop ask        Cuitini Chatbot, answered by a hosted assistant\n  \
valprop config     Inspect effective configuration\n  valprop doctor     Run readiness checks";

pub fn run() -> CommandResult {
    CommandResult::text(WELCOME)
}
