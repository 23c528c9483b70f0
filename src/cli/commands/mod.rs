pub(crate) mod common;

mod check;
mod lsp;

use super::CommandDescriptor;
use check::parse as parse_check_command;
use lsp::parse as parse_lsp_command;

const COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "check",
        aliases: &[],
        parser: parse_check_command,
    },
    CommandDescriptor {
        name: "lsp",
        aliases: &["serve"],
        parser: parse_lsp_command,
    },
];

pub(crate) fn descriptors() -> &'static [CommandDescriptor] {
    COMMANDS
}
