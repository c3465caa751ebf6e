//! Slash command parsing
//!
//! Themes and ideas are addressed by the 1-based numbers `/ideas` prints;
//! parsing converts them to 0-based positions.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Quit,
    New,
    Sessions,
    Switch(String),
    Rename(String),
    Delete(String),
    Status,
    Transcript,
    Upload(Vec<String>),
    Skip,
    Retry,
    Platform(String),
    Strategy(Option<u32>),
    Versions,
    Ideas,
    More,
    Toggle { theme: usize, idea: usize },
    Move { theme: usize, idea: usize, to: String },
    Add { theme: usize, text: String },
    RefineIdeas(String),
    Regen(Option<usize>),
    Similar { theme: usize, idea: usize },
    Write { theme: usize, idea: usize },
    Draft,
    Refine(String),
    Edit(String),
    Review,
    Drafts,
    Restore(usize),
    Export(ExportTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Strategy,
    Post,
}

/// (usage, description) for `/help`
pub const HELP: &[(&str, &str)] = &[
    ("/help", "Show this help"),
    ("/quit", "Exit"),
    ("/new", "Start a new session"),
    ("/sessions", "List sessions, most recent first"),
    ("/switch <id>", "Switch to a session (id suffix is enough)"),
    ("/rename <title>", "Rename the active session"),
    ("/delete <id>", "Delete a session"),
    ("/status", "Show the active session's stage"),
    ("/transcript", "Show the full conversation"),
    ("/upload <file>...", "Upload a resume or writing samples"),
    ("/skip", "Skip the resume or the writing samples"),
    ("/retry", "Retry a failed strategy generation"),
    ("/platform <name>", "Set the target platform"),
    ("/strategy [n]", "Show the current strategy or version n"),
    ("/versions", "List strategy versions"),
    ("/ideas", "Show the post ideas"),
    ("/more", "Generate more ideas from the strategy"),
    ("/toggle <t> <i>", "Check or uncheck idea i of theme t"),
    ("/move <t> <i> <theme>", "Move an idea to another theme"),
    ("/add <t> <text>", "Add your own idea to theme t"),
    ("/refine-ideas <critique>", "Rewrite the checked ideas"),
    ("/regen [t]", "Replace unchecked ideas of theme t, or of all themes"),
    ("/similar <t> <i>", "More ideas like idea i of theme t"),
    ("/write <t> <i>", "Draft a post from an idea"),
    ("/draft", "Show the current draft and critique"),
    ("/refine <feedback>", "Revise the draft"),
    ("/edit <text>", "Replace the draft text"),
    ("/review", "Get a fresh critique of the draft"),
    ("/drafts", "List draft history"),
    ("/restore <n>", "Restore draft n from history"),
    ("/export strategy|post", "Write a markdown export"),
];

/// Parse a line starting with `/`
pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let cmd = match head {
        "/help" | "/h" => ReplCommand::Help,
        "/quit" | "/q" | "/exit" => ReplCommand::Quit,
        "/new" => ReplCommand::New,
        "/sessions" | "/ls" => ReplCommand::Sessions,
        "/switch" => ReplCommand::Switch(required(rest, "/switch <id>")?),
        "/rename" => ReplCommand::Rename(required(rest, "/rename <title>")?),
        "/delete" => ReplCommand::Delete(required(rest, "/delete <id>")?),
        "/status" => ReplCommand::Status,
        "/transcript" => ReplCommand::Transcript,
        "/upload" => {
            if args.is_empty() {
                return Err("Usage: /upload <file>...".to_string());
            }
            ReplCommand::Upload(args.iter().map(|s| s.to_string()).collect())
        }
        "/skip" => ReplCommand::Skip,
        "/retry" => ReplCommand::Retry,
        "/platform" => ReplCommand::Platform(required(rest, "/platform <name>")?),
        "/strategy" => match args.first() {
            Some(n) => ReplCommand::Strategy(Some(n.parse().map_err(|_| format!("Not a version number: {}", n))?)),
            None => ReplCommand::Strategy(None),
        },
        "/versions" => ReplCommand::Versions,
        "/ideas" => ReplCommand::Ideas,
        "/more" => ReplCommand::More,
        "/toggle" => {
            let (theme, idea) = two_positions(&args, "/toggle <t> <i>")?;
            ReplCommand::Toggle { theme, idea }
        }
        "/move" => {
            let (theme, idea) = two_positions(&args, "/move <t> <i> <theme>")?;
            let to = args[2..].join(" ");
            if to.is_empty() {
                return Err("Usage: /move <t> <i> <theme>".to_string());
            }
            ReplCommand::Move { theme, idea, to }
        }
        "/add" => {
            let usage = "/add <t> <text>";
            let theme = position(args.first().copied(), usage)?;
            let text = args[1..].join(" ");
            if text.is_empty() {
                return Err(format!("Usage: {}", usage));
            }
            ReplCommand::Add { theme, text }
        }
        "/refine-ideas" => ReplCommand::RefineIdeas(required(rest, "/refine-ideas <critique>")?),
        "/regen" => match args.first() {
            None | Some(&"all") => ReplCommand::Regen(None),
            Some(t) => ReplCommand::Regen(Some(position(Some(*t), "/regen [t]")?)),
        },
        "/similar" => {
            let (theme, idea) = two_positions(&args, "/similar <t> <i>")?;
            ReplCommand::Similar { theme, idea }
        }
        "/write" => {
            let (theme, idea) = two_positions(&args, "/write <t> <i>")?;
            ReplCommand::Write { theme, idea }
        }
        "/draft" => ReplCommand::Draft,
        "/refine" => ReplCommand::Refine(required(rest, "/refine <feedback>")?),
        "/edit" => ReplCommand::Edit(required(rest, "/edit <text>")?),
        "/review" => ReplCommand::Review,
        "/drafts" => ReplCommand::Drafts,
        "/restore" => ReplCommand::Restore(position(args.first().copied(), "/restore <n>")?),
        "/export" => match args.first().copied() {
            Some("strategy") => ReplCommand::Export(ExportTarget::Strategy),
            Some("post") | Some("draft") => ReplCommand::Export(ExportTarget::Post),
            _ => return Err("Usage: /export strategy|post".to_string()),
        },
        other => return Err(format!("Unknown command: {}", other)),
    };
    Ok(cmd)
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("Usage: {}", usage))
    } else {
        Ok(rest.to_string())
    }
}

/// 1-based number to 0-based position
fn position(arg: Option<&str>, usage: &str) -> Result<usize, String> {
    match arg.and_then(|a| a.parse::<usize>().ok()) {
        Some(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Usage: {}", usage)),
    }
}

fn two_positions(args: &[&str], usage: &str) -> Result<(usize, usize), String> {
    Ok((
        position(args.first().copied(), usage)?,
        position(args.get(1).copied(), usage)?,
    ))
}
