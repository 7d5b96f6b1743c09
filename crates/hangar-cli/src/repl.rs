//! Interactive REPL (Read-Eval-Print-Loop) for Hangar.
//!
//! Provides an interactive statement shell over an in-memory database, with
//! command history, line editing and multi-line input support.

use std::borrow::Cow;
use std::time::Instant;

use anyhow::Result;
use hangar_db::{bootstrap, Database, DatabaseResult, StatementResult, Value};
use hangar_sql::parser::{Parser, StatementKind};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{CompletionType, Config, EditMode, Editor, Helper};
use tracing::{debug, error, info};

use crate::commands::{Command, CommandResult};
use crate::config::CliConfig;
use crate::formatter::{self, OutputFormat};

/// The REPL prompt shown when waiting for input.
const PROMPT: &str = "hangar> ";

/// The prompt while a BEGIN is open.
const TRANSACTION_PROMPT: &str = "hangar*> ";

/// Keywords offered for completion.
const KEYWORDS: &[&str] = &[
    "SELECT",
    "FROM",
    "WHERE",
    "AND",
    "INSERT",
    "INTO",
    "VALUES",
    "UPDATE",
    "SET",
    "DELETE",
    "CREATE",
    "TABLE",
    "IF",
    "NOT",
    "EXISTS",
    "NULL",
    "PRIMARY",
    "KEY",
    "AUTOINCREMENT",
    "UNIQUE",
    "DEFAULT",
    "ORDER",
    "BY",
    "LIMIT",
    "BEGIN",
    "TRANSACTION",
    "COMMIT",
    "ROLLBACK",
    "PRAGMA",
    "INTEGER",
    "REAL",
    "TEXT",
    "DATETIME",
];

/// REPL helper for rustyline.
struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map(|i| i + 1)
            .unwrap_or(0);

        let word_upper = line[start..pos].to_uppercase();

        let matches: Vec<Pair> = KEYWORDS
            .iter()
            .filter(|kw| kw.starts_with(&word_upper))
            .map(|kw| Pair {
                display: kw.to_string(),
                replacement: kw.to_string(),
            })
            .collect();

        Ok((start, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let trimmed = ctx.input().trim();

        if trimmed.is_empty() || trimmed.starts_with('\\') || trimmed.ends_with(';') {
            return Ok(ValidationResult::Valid(None));
        }

        Ok(ValidationResult::Incomplete)
    }
}

impl Helper for ReplHelper {}

/// Interactive shell over one in-memory database.
pub struct Repl {
    /// CLI configuration.
    config: CliConfig,
    /// The database the shell runs statements against.
    db: Database,
    /// Output format.
    format: OutputFormat,
    /// Timing mode enabled.
    timing: bool,
    /// Parameters bound to the next statement.
    params: Vec<Value>,
}

impl Repl {
    /// Creates a shell with a fresh database, bootstrapping the platform
    /// schema if configured.
    pub fn new(config: CliConfig, format: OutputFormat) -> Result<Self> {
        let db = Database::new(config.database.clone());
        if config.bootstrap {
            bootstrap::init_schema(&db)?;
        }

        Ok(Self {
            timing: config.timing,
            config,
            db,
            format,
            params: Vec::new(),
        })
    }

    /// Prints the welcome banner.
    pub fn print_banner(&self) {
        println!("Hangar shell v{}", env!("CARGO_PKG_VERSION"));
        println!("In-memory database; nothing is written to disk.");
        println!("Type \\? for help, \\q to quit.\n");
    }

    /// Runs the main REPL loop.
    pub fn run(&mut self) -> Result<()> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .max_history_size(self.config.history_size)?
            .build();

        let mut editor: Editor<ReplHelper, DefaultHistory> = Editor::with_config(rl_config)?;
        editor.set_helper(Some(ReplHelper));

        let history_file = self.config.history_path();
        if let Some(ref path) = history_file {
            if path.exists() {
                if let Err(e) = editor.load_history(path) {
                    debug!("Failed to load history: {}", e);
                }
            }
        }

        loop {
            match editor.readline(self.prompt()) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if let Err(e) = editor.add_history_entry(line) {
                        debug!("Failed to record history: {}", e);
                    }

                    match self.process_line(line) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("\\q");
                    break;
                }
                Err(e) => {
                    error!("Readline error: {}", e);
                    break;
                }
            }
        }

        if let Some(ref path) = history_file {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    debug!("Failed to create history directory: {}", e);
                }
            }
            if let Err(e) = editor.save_history(path) {
                debug!("Failed to save history: {}", e);
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn prompt(&self) -> &'static str {
        if self.db.in_transaction() {
            TRANSACTION_PROMPT
        } else {
            PROMPT
        }
    }

    /// Processes a single line of input. Returns true when the shell
    /// should exit.
    pub fn process_line(&mut self, line: &str) -> Result<bool> {
        if line.starts_with('\\') {
            return self.process_command(line);
        }

        self.execute_script(line);
        Ok(false)
    }

    /// Processes a backslash command.
    fn process_command(&mut self, line: &str) -> Result<bool> {
        let cmd = Command::parse(line);

        match cmd.execute(self)? {
            CommandResult::Continue => Ok(false),
            CommandResult::Exit => Ok(true),
            CommandResult::Output(msg) => {
                println!("{}", msg);
                Ok(false)
            }
            CommandResult::ToggleTiming(enabled) => {
                self.timing = enabled;
                if enabled {
                    println!("Timing is on.");
                } else {
                    println!("Timing is off.");
                }
                Ok(false)
            }
            CommandResult::SetFormat(format) => {
                self.format = format;
                println!("Output format set to {}.", format);
                Ok(false)
            }
        }
    }

    /// Executes every statement in `content`, printing each result.
    /// Errors are printed and do not stop later statements.
    pub fn execute_script(&mut self, content: &str) {
        for statement in Parser::split_statements(content) {
            if let Err(e) = self.execute_and_print(statement) {
                eprintln!("ERROR: {}", e);
            }
        }
    }

    /// Executes every statement in `content`, stopping at the first error.
    pub fn run_script(&mut self, content: &str) -> DatabaseResult<()> {
        for statement in Parser::split_statements(content) {
            self.execute_and_print(statement)?;
        }
        Ok(())
    }

    /// Executes one statement and prints its result.
    pub fn execute_and_print(&mut self, sql: &str) -> DatabaseResult<()> {
        let output = self.render(sql)?;
        println!("{}", output);
        Ok(())
    }

    /// Executes one statement and renders its result in the current format.
    ///
    /// Parameters set with `\bind` are consumed by this statement.
    pub fn render(&mut self, sql: &str) -> DatabaseResult<String> {
        let start = Instant::now();
        let params = std::mem::take(&mut self.params);
        info!("Executing: {}", sql);

        let result = if params.is_empty() {
            self.db.execute(sql)?
        } else {
            self.execute_prepared(sql, &params)?
        };

        let mut output = self.format_result(&result);
        if self.timing {
            output.push_str(&format!(
                "\nTime: {:.3}ms",
                start.elapsed().as_secs_f64() * 1000.0
            ));
        }
        Ok(output)
    }

    fn execute_prepared(&self, sql: &str, params: &[Value]) -> DatabaseResult<StatementResult> {
        let statement = self.db.prepare(sql);
        match statement.kind() {
            StatementKind::Select => Ok(StatementResult::Rows(statement.fetch_many(params)?)),
            _ => Ok(StatementResult::Changed(statement.run(params)?)),
        }
    }

    fn format_result(&self, result: &StatementResult) -> String {
        match result {
            StatementResult::Rows(rows) => {
                let count = format!("({} row{})", rows.len(), plural(rows.len()));
                if rows.is_empty() {
                    count
                } else {
                    let table = formatter::format_rows(rows, self.format);
                    format!("{}\n{}", table.trim_end(), count)
                }
            }
            StatementResult::Changed(run) => {
                let changes = format!("{} row{} affected", run.changes, plural(run.changes as usize));
                match run.last_insert_id {
                    Some(id) => format!("{} (last insert id {})", changes, id),
                    None => changes,
                }
            }
            other => other.display(),
        }
    }

    /// Binds parameters to the next statement.
    pub fn bind(&mut self, params: Vec<Value>) {
        self.params = params;
    }

    /// Returns the parameters waiting for the next statement.
    pub fn pending_params(&self) -> &[Value] {
        &self.params
    }

    /// Returns the database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns true if timing display is on.
    pub fn timing(&self) -> bool {
        self.timing
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
