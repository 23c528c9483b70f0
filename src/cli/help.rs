use std::fmt::Write;

#[derive(Debug, Clone)]
struct OptionGuide {
    flag: &'static str,
    description: &'static str,
}

#[derive(Debug, Clone)]
struct CommandGuide {
    names: &'static [&'static str],
    summary: &'static str,
    usage: &'static [&'static str],
    options: &'static [OptionGuide],
    examples: &'static [&'static str],
}

const GLOBAL_OPTIONS: &[OptionGuide] = &[
    OptionGuide {
        flag: "-h, --help",
        description: "Show contextual help information.",
    },
    OptionGuide {
        flag: "--version",
        description: "Print quill version and build metadata.",
    },
];

const COMMAND_GUIDES: &[CommandGuide] = &[
    CommandGuide {
        names: &["check"],
        summary: "Parse source files and validate their guarded overload groups.",
        usage: &["quill check <file>... [options]"],
        options: &[
            OptionGuide {
                flag: "--error-format <format>",
                description: "Select diagnostic format (human, json, short); defaults depend on TTY.",
            },
            OptionGuide {
                flag: "--log-format <format>",
                description: "Select log output format (auto, text, json).",
            },
            OptionGuide {
                flag: "--log-level <level>",
                description: "Set log verbosity (error, warn, info, debug, trace).",
            },
        ],
        examples: &[
            "quill check src/main.ql",
            "quill check src/main.ql src/util.ql --error-format json",
        ],
    },
    CommandGuide {
        names: &["lsp", "serve"],
        summary: "Run the quill language server over stdio (JSON-RPC 2.0).",
        usage: &["quill lsp [options]"],
        options: &[
            OptionGuide {
                flag: "--log-format <format>",
                description: "Select log output format (auto, text, json).",
            },
            OptionGuide {
                flag: "--log-level <level>",
                description: "Set log verbosity (error, warn, info, debug, trace).",
            },
        ],
        examples: &["quill lsp --log-level debug"],
    },
    CommandGuide {
        names: &["version", "--version", "-V"],
        summary: "Display quill version, commit hash, and build metadata.",
        usage: &["quill --version", "quill version"],
        options: &[],
        examples: &["quill --version"],
    },
];

pub(crate) fn render_general_help() -> String {
    let mut out = String::new();
    out.push_str("quill – toolchain for the quill guarded-overload language\n\n");
    out.push_str("USAGE:\n  quill <command> [options]\n\n");
    out.push_str("COMMANDS:\n");
    for guide in COMMAND_GUIDES {
        let canonical = guide.names[0];
        let _ = writeln!(out, "  {canonical:11} {}", guide.summary);
    }
    out.push('\n');
    out.push_str("GLOBAL OPTIONS:\n");
    for option in GLOBAL_OPTIONS {
        let _ = writeln!(out, "  {:18} {}", option.flag, option.description);
    }
    out.push('\n');
    out.push_str("Use `quill help <command>` to view detailed usage and examples.");
    out.push('\n');
    out
}

pub(crate) fn render_command_help(topic: &str) -> Option<String> {
    let guide = find_guide(topic)?;
    let mut out = String::new();
    let canonical = guide.names[0];
    let _ = writeln!(out, "quill {canonical} – {}", guide.summary);
    out.push('\n');

    out.push_str("USAGE:\n");
    for usage in guide.usage {
        let _ = writeln!(out, "  {usage}");
    }

    if guide.names.len() > 1 {
        out.push('\n');
        out.push_str("ALIASES:\n");
        for alias in &guide.names[1..] {
            let _ = writeln!(out, "  {alias}");
        }
    }

    if !guide.options.is_empty() {
        out.push('\n');
        out.push_str("OPTIONS:\n");
        for option in guide.options {
            let _ = writeln!(out, "  {:24} {}", option.flag, option.description);
        }
    }

    if !guide.examples.is_empty() {
        out.push('\n');
        out.push_str("EXAMPLES:\n");
        for example in guide.examples {
            let _ = writeln!(out, "  {example}");
        }
    }

    out.push('\n');
    out.push_str("All commands accept `-h`/`--help` for contextual guidance.");
    out.push('\n');
    Some(out)
}

pub(crate) fn available_topics() -> impl Iterator<Item = &'static str> {
    COMMAND_GUIDES.iter().map(|guide| guide.names[0])
}

pub(crate) fn format_unknown_topic(topic: &str) -> String {
    let mut known = available_topics().collect::<Vec<_>>();
    known.sort_unstable();
    format!(
        "unknown help topic '{topic}'; available commands: {}",
        known.join(", ")
    )
}

fn find_guide(topic: &str) -> Option<&'static CommandGuide> {
    let lower = topic.to_ascii_lowercase();
    COMMAND_GUIDES.iter().find(|guide| {
        guide
            .names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&lower))
    })
}
