//! Shell command parsing

use std::str::FromStr;

use cms_lib::model::EntityKind;

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Search(String),
    Page(usize),
    Next,
    Prev,
    Size(usize),
    Use(EntityKind),
    Reload,
    New,
    Edit(String),
    Form,
    /// Field key and raw text; empty text clears the field.
    Set(String, String),
    Save,
    Cancel,
    Delete(String),
    Entities,
    Dashboard,
    Help,
    Quit,
}

/// Reason a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Invalid(String),
}

pub const HELP: &str = "\
Commands:
  list                 show the current page
  search <term>        filter by the searchable fields (empty clears)
  page <n>             jump to page n
  next | prev          move one page
  size <n>             rows per page
  use <entity>         switch table (see 'entities')
  reload               fetch records again
  new                  open an empty form
  edit <id>            open the form for a record
  form                 show the open form
  set <field> [value]  fill a form field (no value clears it)
  save                 submit the open form
  cancel               close the form without saving
  delete <id>          delete a record after confirmation
  entities             list available tables
  dashboard            record counts per table
  help                 show this text
  quit                 leave the shell";

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "list" | "ls" => Command::List,
            "search" | "find" => Command::Search(rest.to_string()),
            "page" => Command::Page(number(rest, "page <n>")?),
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "size" => Command::Size(number(rest, "size <n>")?),
            "use" => {
                if rest.is_empty() {
                    return Err(ParseError::Usage("use <entity>"));
                }
                let entity = rest
                    .parse::<EntityKind>()
                    .map_err(|e| ParseError::Invalid(e.to_string()))?;
                Command::Use(entity)
            }
            "reload" => Command::Reload,
            "new" | "create" => Command::New,
            "edit" => Command::Edit(argument(rest, "edit <id>")?),
            "form" => Command::Form,
            "set" => {
                let (key, value) = match rest.split_once(char::is_whitespace) {
                    Some((key, value)) => (key, value.trim()),
                    None => (rest, ""),
                };
                Command::Set(argument(key, "set <field> [value]")?, value.to_string())
            }
            "save" | "submit" => Command::Save,
            "cancel" => Command::Cancel,
            "delete" | "rm" => Command::Delete(argument(rest, "delete <id>")?),
            "entities" => Command::Entities,
            "dashboard" | "stats" => Command::Dashboard,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn argument(rest: &str, usage: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::Usage(usage))
    } else {
        Ok(rest.to_string())
    }
}

fn number(rest: &str, usage: &'static str) -> Result<usize, ParseError> {
    rest.parse().map_err(|_| ParseError::Usage(usage))
}
