use anyhow::{anyhow, bail, Result};
use beatthebank_types::Command;
use lazy_static::lazy_static;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Group {
    Session,
    Vaults,
    Voice,
}

impl Group {
    const ALL: [Group; 3] = [Group::Session, Group::Vaults, Group::Voice];

    fn title(self) -> &'static str {
        match self {
            Group::Session => "Session",
            Group::Vaults => "Vaults",
            Group::Voice => "Voice",
        }
    }
}

/// One slash command. `name` is what prefixes resolve against.
pub struct CommandDef {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub args: &'static str,
    pub desc: &'static str,
    pub group: Group,
}

impl CommandDef {
    fn usage(&self) -> String {
        if self.args.is_empty() {
            format!("/{}", self.name)
        } else {
            format!("/{} {}", self.name, self.args)
        }
    }

    fn answers_to(&self, word: &str) -> bool {
        self.name == word || self.aliases.contains(&word)
    }
}

lazy_static! {
    pub static ref COMMANDS: Vec<CommandDef> = vec![
        CommandDef { name: "help", aliases: &["h", "?"], args: "", desc: "Show this palette", group: Group::Session },
        CommandDef { name: "status", aliases: &[], args: "", desc: "Show vault, amount and status", group: Group::Session },
        CommandDef { name: "name", aliases: &[], args: "<name>", desc: "Set player name", group: Group::Session },
        CommandDef { name: "quit", aliases: &["exit", "q"], args: "", desc: "Exit", group: Group::Session },
        CommandDef { name: "start", aliases: &["restart"], args: "", desc: "Start over with fresh vaults", group: Group::Vaults },
        CommandDef { name: "continue", aliases: &["c"], args: "", desc: "Open the next vault", group: Group::Vaults },
        CommandDef { name: "stop", aliases: &["s"], args: "", desc: "Take the money and reveal the rest", group: Group::Vaults },
        CommandDef { name: "speech", aliases: &["voice"], args: "", desc: "Toggle voice continue (type \"continue\")", group: Group::Voice },
    ];
}

/// What a line of input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandAction {
    Game(Command),
    Status,
    Help,
    Utterance(String),
    Empty,
}

/// Find the command a word names: exact name or alias first, then a unique prefix.
fn resolve(word: &str) -> Result<&'static CommandDef> {
    if let Some(def) = COMMANDS.iter().find(|def| def.answers_to(word)) {
        return Ok(def);
    }
    let matches: Vec<&CommandDef> = COMMANDS
        .iter()
        .filter(|def| !word.is_empty() && def.name.starts_with(word))
        .collect();
    match matches.as_slice() {
        [def] => Ok(*def),
        [] => bail!("Unknown command /{word} (try /help)"),
        many => {
            let names: Vec<String> = many.iter().map(|def| format!("/{}", def.name)).collect();
            bail!("/{word} is ambiguous: {}", names.join(", "))
        }
    }
}

pub fn parse_line(line: &str) -> Result<CommandAction> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(CommandAction::Empty);
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(CommandAction::Utterance(trimmed.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let word = parts.next().unwrap_or("").to_lowercase();
    let def = resolve(&word)?;
    let action = match def.name {
        "help" => CommandAction::Help,
        "status" => CommandAction::Status,
        "name" => {
            let name = parts.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                return Err(anyhow!("Usage: {}", def.usage()));
            }
            CommandAction::Game(Command::SetName(name))
        }
        "quit" => CommandAction::Game(Command::Quit),
        "start" => CommandAction::Game(Command::StartOver),
        "continue" => CommandAction::Game(Command::Continue),
        "stop" => CommandAction::Game(Command::Stop),
        "speech" => CommandAction::Game(Command::ToggleSpeech),
        other => bail!("/{other} has no action"),
    };
    Ok(action)
}

pub fn render_help() -> String {
    let mut out = String::new();
    for group in Group::ALL {
        out.push_str(&format!("\n[{}]\n", group.title()));
        for def in COMMANDS.iter().filter(|def| def.group == group) {
            let mut line = format!("  {:<16} {}", def.usage(), def.desc);
            if !def.aliases.is_empty() {
                let aliases: Vec<String> = def.aliases.iter().map(|a| format!("/{a}")).collect();
                line.push_str(&format!(" (also {})", aliases.join(" ")));
            }
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}
