//! Special backslash commands for the REPL.
//!
//! Provides commands like `\d`, `\dt`, `\bind`, `\q`, etc.

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table};
use hangar_db::{bootstrap, Value};

use crate::formatter::OutputFormat;
use crate::repl::Repl;

/// Result of executing a command.
pub enum CommandResult {
    /// Continue the REPL.
    Continue,
    /// Exit the REPL.
    Exit,
    /// Output a message.
    Output(String),
    /// Toggle timing mode.
    ToggleTiming(bool),
    /// Set output format.
    SetFormat(OutputFormat),
}

/// A parsed command.
#[derive(Debug)]
pub enum Command {
    /// Quit the REPL.
    Quit,
    /// Show help.
    Help,
    /// Describe a relation.
    Describe(Option<String>),
    /// List relations.
    ListTables,
    /// Bind parameters (a JSON array) to the next statement.
    Bind(Option<String>),
    /// Toggle timing.
    Timing,
    /// Set output format.
    Format(String),
    /// Show version.
    Version,
    /// Clear screen.
    Clear,
    /// Execute a file.
    Include(String),
    /// Create the booking platform relations.
    Bootstrap,
    /// Begin a transaction.
    Begin,
    /// Commit transaction.
    Commit,
    /// Rollback transaction.
    Rollback,
    /// Show database statistics.
    Status,
    /// Unknown command.
    Unknown(String),
}

impl Command {
    /// Parses a command string.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let cmd = input.strip_prefix('\\').unwrap_or(input);

        let (name, args) = match cmd.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim().to_string())),
            None => (cmd, None),
        };
        let args = args.filter(|a| !a.is_empty());

        match name.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Command::Quit,
            "?" | "h" | "help" => Command::Help,
            "d" => Command::Describe(args),
            "dt" | "tables" => Command::ListTables,
            "bind" | "p" => Command::Bind(args),
            "timing" | "t" => Command::Timing,
            "format" | "f" => Command::Format(args.unwrap_or_else(|| "table".to_string())),
            "version" | "v" => Command::Version,
            "clear" | "cls" => Command::Clear,
            "i" | "include" => Command::Include(args.unwrap_or_default()),
            "bootstrap" => Command::Bootstrap,
            "begin" => Command::Begin,
            "commit" => Command::Commit,
            "rollback" => Command::Rollback,
            "status" | "s" => Command::Status,
            other => Command::Unknown(other.to_string()),
        }
    }

    /// Executes the command.
    pub fn execute(&self, repl: &mut Repl) -> Result<CommandResult> {
        match self {
            Command::Quit => Ok(CommandResult::Exit),

            Command::Help => Ok(CommandResult::Output(Self::help_text())),

            Command::Describe(Some(name)) => Ok(CommandResult::Output(describe(repl, name))),

            Command::Describe(None) | Command::ListTables => {
                Ok(CommandResult::Output(list_tables(repl)))
            }

            Command::Bind(None) => Ok(CommandResult::Output(pending(repl))),

            Command::Bind(Some(json)) => {
                let params: Vec<Value> = serde_json::from_str(json)
                    .context("parameters must be a JSON array of null, numbers, booleans or strings")?;
                let count = params.len();
                repl.bind(params);
                Ok(CommandResult::Output(format!(
                    "Bound {} parameter{} to the next statement.",
                    count,
                    if count == 1 { "" } else { "s" }
                )))
            }

            Command::Timing => Ok(CommandResult::ToggleTiming(!repl.timing())),

            Command::Format(format) => match format.parse::<OutputFormat>() {
                Ok(fmt) => Ok(CommandResult::SetFormat(fmt)),
                Err(message) => Ok(CommandResult::Output(message)),
            },

            Command::Version => Ok(CommandResult::Output(format!(
                "Hangar shell v{}",
                env!("CARGO_PKG_VERSION")
            ))),

            Command::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                Ok(CommandResult::Continue)
            }

            Command::Include(path) => {
                if path.is_empty() {
                    return Ok(CommandResult::Output("Usage: \\i <filename>".to_string()));
                }
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path))?;
                repl.execute_script(&content);
                Ok(CommandResult::Continue)
            }

            Command::Bootstrap => {
                bootstrap::init_schema(repl.database())?;
                Ok(CommandResult::Output(format!(
                    "Booking platform schema ready ({} relations).",
                    bootstrap::SCHEMA.len()
                )))
            }

            Command::Begin => {
                repl.execute_and_print("BEGIN")?;
                Ok(CommandResult::Continue)
            }

            Command::Commit => {
                repl.execute_and_print("COMMIT")?;
                Ok(CommandResult::Continue)
            }

            Command::Rollback => {
                repl.execute_and_print("ROLLBACK")?;
                Ok(CommandResult::Continue)
            }

            Command::Status => Ok(CommandResult::Output(status(repl))),

            Command::Unknown(cmd) => Ok(CommandResult::Output(format!(
                "Unknown command '\\{}'. Type \\? for help.",
                cmd
            ))),
        }
    }

    /// Returns help text.
    fn help_text() -> String {
        r#"Hangar Shell Commands
=====================

General:
  \q, \quit       Exit the shell
  \?, \help       Show this help
  \v, \version    Show version information
  \clear, \cls    Clear screen
  \s, \status     Show database statistics

Schema:
  \d [NAME]       Describe a relation
  \dt, \tables    List all relations
  \bootstrap      Create the booking platform relations

Parameters:
  \bind JSON      Bind a JSON array to the next statement's ? placeholders
  \bind []        Clear bound parameters
  \bind           Show bound parameters

Transaction:
  \begin          Start a transaction
  \commit         Commit the transaction
  \rollback       Rollback the transaction

Display:
  \t, \timing     Toggle timing display
  \f FORMAT       Set output format (table, json, csv, raw)

Files:
  \i FILE         Execute statements from file

Type statements followed by a semicolon to execute them.
"#
        .to_string()
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn list_tables(repl: &Repl) -> String {
    let db = repl.database();
    let names = db.relation_names();
    if names.is_empty() {
        return "No relations.".to_string();
    }

    let mut table = new_table();
    table.set_header(vec!["relation", "rows"]);
    for name in names {
        let rows = db.describe(&name).map(|(_, rows)| rows).unwrap_or(0);
        table.add_row(vec![Cell::new(name), Cell::new(rows)]);
    }
    table.to_string()
}

fn describe(repl: &Repl, name: &str) -> String {
    let Some((columns, rows)) = repl.database().describe(name) else {
        return format!("Relation '{}' does not exist.", name);
    };
    if columns.is_empty() {
        return format!("Relation '{}' has no declared columns ({} rows).", name, rows);
    }

    let mut table = new_table();
    table.set_header(vec!["column", "type", "constraints"]);
    for column in &columns {
        let mut constraints = Vec::new();
        if column.primary_key {
            constraints.push("PRIMARY KEY");
        }
        if column.unique {
            constraints.push("UNIQUE");
        }
        if column.not_null {
            constraints.push("NOT NULL");
        }
        table.add_row(vec![
            Cell::new(&column.name),
            Cell::new(&column.data_type),
            Cell::new(constraints.join(" ")),
        ]);
    }
    format!("{}\n({} rows stored)", table, rows)
}

fn pending(repl: &Repl) -> String {
    let params = repl.pending_params();
    if params.is_empty() {
        return "No parameters bound.".to_string();
    }
    match serde_json::to_string(params) {
        Ok(json) => format!("Next statement binds {}", json),
        Err(e) => format!("Cannot display bound parameters: {}", e),
    }
}

fn status(repl: &Repl) -> String {
    let stats = repl.database().stats();
    format!(
        "Relations: {}\n\
         Rows: {}\n\
         Statements executed: {}\n\
         In transaction: {}\n\
         Uptime: {}s",
        stats.relations,
        stats.total_rows,
        stats.statements_executed,
        if stats.in_transaction { "yes" } else { "no" },
        stats.uptime.as_secs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;

    fn shell() -> Repl {
        Repl::new(CliConfig::default(), OutputFormat::Table).unwrap()
    }

    #[test]
    fn test_parse_quit() {
        assert!(matches!(Command::parse("\\q"), Command::Quit));
        assert!(matches!(Command::parse("\\quit"), Command::Quit));
        assert!(matches!(Command::parse("\\exit"), Command::Quit));
    }

    #[test]
    fn test_parse_help() {
        assert!(matches!(Command::parse("\\?"), Command::Help));
        assert!(matches!(Command::parse("\\h"), Command::Help));
        assert!(matches!(Command::parse("\\help"), Command::Help));
    }

    #[test]
    fn test_parse_describe() {
        match Command::parse("\\d users") {
            Command::Describe(Some(name)) => assert_eq!(name, "users"),
            other => panic!("Expected Describe, got {:?}", other),
        }
        assert!(matches!(Command::parse("\\d"), Command::Describe(None)));
    }

    #[test]
    fn test_parse_format() {
        match Command::parse("\\f json") {
            Command::Format(fmt) => assert_eq!(fmt, "json"),
            other => panic!("Expected Format, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bind() {
        match Command::parse("\\bind [\"ana@x.io\", 3]") {
            Command::Bind(Some(json)) => assert_eq!(json, "[\"ana@x.io\", 3]"),
            other => panic!("Expected Bind, got {:?}", other),
        }
        assert!(matches!(Command::parse("\\bind  "), Command::Bind(None)));
    }

    #[test]
    fn test_parse_unknown() {
        match Command::parse("\\xyz") {
            Command::Unknown(cmd) => assert_eq!(cmd, "xyz"),
            other => panic!("Expected Unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_sets_params() {
        let mut repl = shell();
        let result = Command::parse("\\bind [\"Ana\", 2, 1.5, null, true]")
            .execute(&mut repl)
            .unwrap();
        assert!(matches!(result, CommandResult::Output(_)));
        assert_eq!(
            repl.pending_params(),
            &[
                Value::text("Ana"),
                Value::Integer(2),
                Value::Real(1.5),
                Value::Null,
                Value::Integer(1)
            ]
        );

        assert!(Command::parse("\\bind {\"a\": 1}").execute(&mut repl).is_err());
    }

    #[test]
    fn test_bind_without_args_shows_pending() {
        let mut repl = shell();
        match Command::parse("\\bind").execute(&mut repl).unwrap() {
            CommandResult::Output(text) => assert_eq!(text, "No parameters bound."),
            _ => panic!("Expected output"),
        }

        Command::parse("\\bind [\"Ana\", 2]").execute(&mut repl).unwrap();
        match Command::parse("\\bind").execute(&mut repl).unwrap() {
            CommandResult::Output(text) => assert_eq!(text, "Next statement binds [\"Ana\",2]"),
            _ => panic!("Expected output"),
        }
        assert_eq!(repl.pending_params().len(), 2);

        Command::parse("\\bind []").execute(&mut repl).unwrap();
        assert!(repl.pending_params().is_empty());
    }

    #[test]
    fn test_describe_and_list() {
        let mut repl = shell();
        Command::parse("\\bootstrap").execute(&mut repl).unwrap();

        let listing = list_tables(&repl);
        assert!(listing.contains("bookings"));
        assert!(listing.contains("payments"));

        let users = describe(&repl, "users");
        assert!(users.contains("email"));
        assert!(users.contains("UNIQUE"));
        assert!(describe(&repl, "missing").contains("does not exist"));
    }

    #[test]
    fn test_timing_toggles() {
        let mut repl = shell();
        match Command::Timing.execute(&mut repl).unwrap() {
            CommandResult::ToggleTiming(enabled) => assert!(enabled),
            _ => panic!("Expected ToggleTiming"),
        }
    }
}
