//! Interactive evolution-line lookups.
//!
//! By default we use `rustyline` for line editing, history, and tab completion
//! of Digimon names. A minimal stdin-based fallback exists behind
//! `--no-default-features`.

use anyhow::Result;
#[cfg(feature = "repl-rustyline")]
use anyhow::anyhow;
use colored::Colorize;
#[cfg(not(feature = "repl-rustyline"))]
use std::io::{self, Write};

use digivolve_query::{EvolutionService, LineageOptions};

use crate::render;

const PROMPT: &str = "digimon> ";

pub(crate) fn cmd_repl(service: &EvolutionService) -> Result<()> {
    #[cfg(feature = "repl-rustyline")]
    {
        cmd_repl_rustyline(service)
    }
    #[cfg(not(feature = "repl-rustyline"))]
    {
        cmd_repl_simple(service)
    }
}

fn print_banner(service: &EvolutionService) {
    println!("{}", "Digivolve REPL".green().bold());
    println!(
        "{} Digimon loaded. Type a name to see its evolution line, `help` for commands.",
        service.graph().len()
    );
    println!("Empty line, `exit`, `quit` or `salir` leaves.\n");
}

#[cfg(not(feature = "repl-rustyline"))]
fn cmd_repl_simple(service: &EvolutionService) -> Result<()> {
    print_banner(service);

    let stdin = io::stdin();
    loop {
        print!("{}", PROMPT.cyan().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        if let ReplControl::Exit = dispatch_line(service, &line) {
            break;
        }
    }

    Ok(())
}

#[cfg(feature = "repl-rustyline")]
fn cmd_repl_rustyline(service: &EvolutionService) -> Result<()> {
    use rustyline::error::ReadlineError;
    use rustyline::Editor;

    print_banner(service);

    let helper = NameCompleter::new(service.graph().names().map(str::to_string).collect());
    let mut rl: Editor<NameCompleter, rustyline::history::DefaultHistory> =
        Editor::new().map_err(|e| anyhow!("failed to init rustyline: {e}"))?;
    rl.set_helper(Some(helper));

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => continue,
            Err(e) => return Err(anyhow!("readline error: {e}")),
        };

        if !line.trim().is_empty() {
            rl.add_history_entry(line.trim())
                .map_err(|e| anyhow!("failed to record history: {e}"))?;
        }

        if let ReplControl::Exit = dispatch_line(service, &line) {
            break;
        }
    }

    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Exit,
    Help,
    /// `:json <name>`
    Json(String),
    /// `:depth <n> <name>`
    Depth(usize, String),
    Lookup(String),
    Invalid(String),
}

enum ReplControl {
    Continue,
    Exit,
}

fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "" | "exit" | "quit" | "salir" => return ReplCommand::Exit,
        "help" | ":help" => return ReplCommand::Help,
        _ => {}
    }

    if let Some(rest) = line.strip_prefix(":json") {
        return ReplCommand::Json(rest.trim().to_string());
    }
    if let Some(rest) = line.strip_prefix(":depth") {
        let rest = rest.trim();
        let (n, name) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        return match n.parse::<usize>() {
            Ok(n) if !name.trim().is_empty() => ReplCommand::Depth(n, name.trim().to_string()),
            _ => ReplCommand::Invalid("usage: :depth <n> <name>".to_string()),
        };
    }
    ReplCommand::Lookup(line.to_string())
}

fn dispatch_line(service: &EvolutionService, line: &str) -> ReplControl {
    match parse_line(line) {
        ReplCommand::Exit => return ReplControl::Exit,
        ReplCommand::Help => print_help(),
        ReplCommand::Json(name) => println!("{}", service.get_evolution_line_json(&name)),
        ReplCommand::Depth(n, name) => render::print_response(
            &service.get_evolution_line_with(&name, LineageOptions::with_max_depth(Some(n))),
        ),
        ReplCommand::Lookup(name) => render::print_response(&service.get_evolution_line(&name)),
        ReplCommand::Invalid(msg) => eprintln!("{} {msg}", "error:".red().bold()),
    }
    println!();
    ReplControl::Continue
}

fn print_help() {
    println!("Commands:");
    println!("  <name>              evolution line (previous and next, transitive)");
    println!("  :depth <n> <name>   evolution line limited to n hops");
    println!("  :json <name>        raw JSON response");
    println!("  help                this message");
    println!("  exit | quit | salir leave (an empty line also leaves)");
}

// ============================================================================
// Tab completion (rustyline)
// ============================================================================

#[cfg(feature = "repl-rustyline")]
struct NameCompleter {
    names: Vec<String>,
}

#[cfg(feature = "repl-rustyline")]
impl NameCompleter {
    fn new(mut names: Vec<String>) -> Self {
        names.sort_by_key(|n| n.to_lowercase());
        Self { names }
    }

    /// Names whose lowercase form starts with `prefix` (case-insensitive).
    fn candidates(&self, prefix: &str) -> Vec<rustyline::completion::Pair> {
        let prefix = prefix.to_lowercase();
        self.names
            .iter()
            .filter(|n| n.to_lowercase().starts_with(&prefix))
            .map(|n| rustyline::completion::Pair {
                display: n.clone(),
                replacement: n.clone(),
            })
            .collect()
    }
}

#[cfg(feature = "repl-rustyline")]
impl rustyline::Helper for NameCompleter {}

#[cfg(feature = "repl-rustyline")]
impl rustyline::highlight::Highlighter for NameCompleter {}

#[cfg(feature = "repl-rustyline")]
impl rustyline::hint::Hinter for NameCompleter {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        None
    }
}

#[cfg(feature = "repl-rustyline")]
impl rustyline::validate::Validator for NameCompleter {}

#[cfg(feature = "repl-rustyline")]
impl rustyline::completion::Completer for NameCompleter {
    type Candidate = rustyline::completion::Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let head = &line[..pos];
        let start = name_start(head);
        Ok((start, self.candidates(&head[start..])))
    }
}

/// Byte offset where the name argument begins. Names may contain spaces, so
/// the whole remainder after the command (if any) is completed.
#[cfg(feature = "repl-rustyline")]
fn name_start(head: &str) -> usize {
    let skip_ws = |from: usize| from + (head[from..].len() - head[from..].trim_start().len());
    if head.starts_with(":json") {
        return skip_ws(":json".len());
    }
    if head.starts_with(":depth") {
        let n_start = skip_ws(":depth".len());
        let n_end = head[n_start..]
            .find(char::is_whitespace)
            .map(|i| n_start + i)
            .unwrap_or(head.len());
        return skip_ws(n_end);
    }
    0
}
