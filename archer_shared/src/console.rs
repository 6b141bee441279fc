//! Developer console.
//!
//! Provides:
//! - Console variables (cvars) with typed values and flags
//! - Command registration and execution
//! - Command history
//! - Quote-aware line parsing
//!
//! The game registers its own cvars and routes lines it does not handle
//! itself (`press`, `click`, ...) here.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, bail, Context};

/// Console variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum CvarValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl CvarValue {
    /// Parses console input: int, then float, then bool, then string.
    pub fn parse(s: &str) -> Self {
        if let Ok(v) = s.parse::<i64>() {
            CvarValue::Int(v)
        } else if let Ok(v) = s.parse::<f64>() {
            CvarValue::Float(v)
        } else if s == "true" {
            CvarValue::Bool(true)
        } else if s == "false" {
            CvarValue::Bool(false)
        } else {
            CvarValue::String(s.trim_matches('"').to_string())
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            CvarValue::Float(v) => Some(*v),
            CvarValue::Int(v) => Some(*v as f64),
            CvarValue::String(s) => s.parse().ok(),
            CvarValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            CvarValue::Bool(v) => *v,
            CvarValue::Int(v) => *v != 0,
            CvarValue::Float(v) => *v != 0.0,
            CvarValue::String(s) => !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false"),
        }
    }
}

impl std::fmt::Display for CvarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CvarValue::Int(v) => write!(f, "{}", v),
            CvarValue::Float(v) => write!(f, "{}", v),
            CvarValue::String(v) => write!(f, "\"{}\"", v),
            CvarValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

bitflags::bitflags! {
    /// Cvar flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CvarFlags: u32 {
        const NONE = 0;
        const ARCHIVE = 1 << 0;   // Mirrors a config file value
        const READ_ONLY = 1 << 1; // Reported, never set from the console
    }
}

impl CvarFlags {
    /// Short tags for `cvarlist`, e.g. `[archive read-only]`.
    pub fn tags(self) -> String {
        let mut tags = Vec::new();
        if self.contains(CvarFlags::ARCHIVE) {
            tags.push("archive");
        }
        if self.contains(CvarFlags::READ_ONLY) {
            tags.push("read-only");
        }
        if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(" "))
        }
    }
}

/// Console variable metadata.
#[derive(Debug, Clone)]
pub struct Cvar {
    pub value: CvarValue,
    pub default: CvarValue,
    pub description: String,
    pub flags: CvarFlags,
}

type CvarTable = Arc<RwLock<BTreeMap<String, Cvar>>>;

/// Command handler function type.
pub type CommandHandler =
    Box<dyn Fn(&[&str], &mut ConsoleContext) -> anyhow::Result<()> + Send + Sync>;

/// Context passed to command handlers.
pub struct ConsoleContext {
    /// Output lines for the caller to print.
    pub output: Vec<String>,
    cvars: CvarTable,
}

impl ConsoleContext {
    pub fn print(&mut self, msg: impl Into<String>) {
        self.output.push(msg.into());
    }

    pub fn get_cvar(&self, name: &str) -> Option<CvarValue> {
        self.cvars.read().ok()?.get(name).map(|c| c.value.clone())
    }

    pub fn set_cvar(&self, name: &str, value: CvarValue) -> anyhow::Result<()> {
        write_cvar(&self.cvars, name, value)
    }
}

fn write_cvar(cvars: &CvarTable, name: &str, value: CvarValue) -> anyhow::Result<()> {
    let mut cvars = cvars.write().map_err(|_| anyhow!("cvar lock poisoned"))?;
    match cvars.get_mut(name) {
        Some(cvar) if cvar.flags.contains(CvarFlags::READ_ONLY) => {
            bail!("{} is read-only", name)
        }
        Some(cvar) => {
            cvar.value = value;
            Ok(())
        }
        None => bail!("unknown cvar: {}", name),
    }
}

/// The console.
pub struct Console {
    cvars: CvarTable,
    commands: HashMap<String, CommandHandler>,
    history: Vec<String>,
    max_history: usize,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        let mut console = Self {
            cvars: Arc::new(RwLock::new(BTreeMap::new())),
            commands: HashMap::new(),
            history: Vec::new(),
            max_history: 64,
        };
        console.register_builtin_commands();
        console
    }

    fn register_builtin_commands(&mut self) {
        self.register_command("echo", |args, ctx| {
            ctx.print(args.join(" "));
            Ok(())
        });

        self.register_command("cvarlist", |_args, ctx| {
            let lines: Vec<String> = {
                let cvars = ctx.cvars.read().map_err(|_| anyhow!("cvar lock poisoned"))?;
                cvars
                    .iter()
                    .map(|(name, cvar)| {
                        format!(
                            "  {} = {}{} ({})",
                            name,
                            cvar.value,
                            cvar.flags.tags(),
                            cvar.description
                        )
                    })
                    .collect()
            };
            for line in lines {
                ctx.print(line);
            }
            Ok(())
        });

        self.register_command("set", |args, ctx| {
            if args.len() < 2 {
                bail!("usage: set <cvar> <value>");
            }
            let value = CvarValue::parse(&args[1..].join(" "));
            ctx.print(format!("{} = {}", args[0], value));
            ctx.set_cvar(args[0], value)
        });

        self.register_command("reset", |args, ctx| {
            let Some(name) = args.first() else {
                bail!("usage: reset <cvar>");
            };
            let default = {
                let cvars = ctx.cvars.read().map_err(|_| anyhow!("cvar lock poisoned"))?;
                cvars.get(*name).map(|c| c.default.clone())
            };
            match default {
                Some(value) => ctx.set_cvar(name, value),
                None => bail!("unknown cvar: {}", name),
            }
        });
    }

    /// Registers a console variable.
    pub fn register_cvar(&mut self, name: &str, default: CvarValue, description: &str, flags: CvarFlags) {
        let cvar = Cvar {
            value: default.clone(),
            default,
            description: description.to_string(),
            flags,
        };
        if let Ok(mut cvars) = self.cvars.write() {
            cvars.insert(name.to_string(), cvar);
        }
    }

    /// Registers a command.
    pub fn register_command<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[&str], &mut ConsoleContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.commands.insert(name.to_string(), Box::new(handler));
    }

    /// Names of all registered commands, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Executes a console command line.
    pub fn exec(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return Ok(Vec::new());
        }

        self.history.push(line.to_string());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        let tokens = parse_command_line(line);
        let Some((cmd_name, rest)) = tokens.split_first() else {
            return Ok(Vec::new());
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        let mut ctx = ConsoleContext {
            output: Vec::new(),
            cvars: Arc::clone(&self.cvars),
        };

        if let Some(handler) = self.commands.get(cmd_name.as_str()) {
            handler(&args, &mut ctx).with_context(|| format!("command '{}'", cmd_name))?;
            return Ok(ctx.output);
        }

        // Bare cvar name queries it; cvar name plus value sets it.
        let current = self
            .cvars
            .read()
            .ok()
            .and_then(|cvars| cvars.get(cmd_name.as_str()).map(|c| (c.value.clone(), c.default.clone())));
        match current {
            Some((value, default)) if args.is_empty() => {
                ctx.print(format!("{} = {} (default: {})", cmd_name, value, default));
            }
            Some(_) => {
                let value = CvarValue::parse(&args.join(" "));
                self.set_cvar(cmd_name, value.clone())?;
                ctx.print(format!("{} = {}", cmd_name, value));
            }
            None => ctx.print(format!("Unknown command: {}", cmd_name)),
        }
        Ok(ctx.output)
    }

    /// Gets a cvar value.
    pub fn get_cvar(&self, name: &str) -> Option<CvarValue> {
        self.cvars.read().ok()?.get(name).map(|c| c.value.clone())
    }

    /// Sets a cvar value.
    pub fn set_cvar(&self, name: &str, value: CvarValue) -> anyhow::Result<()> {
        write_cvar(&self.cvars, name, value)
    }

    /// Overwrites a cvar regardless of flags. For values the game itself owns.
    pub fn publish(&self, name: &str, value: CvarValue) {
        if let Ok(mut cvars) = self.cvars.write() {
            if let Some(cvar) = cvars.get_mut(name) {
                cvar.value = value;
            }
        }
    }

    /// Gets command history.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

/// Parses a command line into tokens, respecting quotes.
fn parse_command_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
