//! Parses a single REPL input line into a `Command`. Grammar and error
//! strings are fixed by the external interface; the parser's job is only
//! to recognize them, not to be forgiving.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::err;
use crate::errors::Error;
use crate::record::Record;

static SIGNED_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+$").unwrap());

pub enum MetaCommand {
    Exit,
    Btree,
    Constants,
    Unrecognized,
}

pub enum Command {
    Insert(Record),
    Select,
    Meta(MetaCommand),
}

/// Parses one line of input. The line is never empty (the REPL skips blank
/// input before calling this).
pub fn parse(line: &str) -> Result<Command, Error> {
    if let Some(meta) = line.strip_prefix('.') {
        return Ok(Command::Meta(parse_meta(meta)));
    }

    let mut words = line.split_whitespace();
    match words.next() {
        Some("insert") => parse_insert(words),
        Some("select") => {
            if words.next().is_some() {
                Err(err!(Parse, "Syntax error. Could not parse statement."))
            } else {
                Ok(Command::Select)
            }
        }
        _ => Err(err!(
            Parse,
            "Unrecognized keyword at start of '{}'.",
            line
        )),
    }
}

fn parse_meta(meta: &str) -> MetaCommand {
    match meta {
        "exit" => MetaCommand::Exit,
        "btree" => MetaCommand::Btree,
        "constants" => MetaCommand::Constants,
        _ => MetaCommand::Unrecognized,
    }
}

fn parse_insert<'a>(mut words: impl Iterator<Item = &'a str>) -> Result<Command, Error> {
    let id_str = words.next();
    let username = words.next();
    let email = words.next();
    let trailing = words.next();

    let (id_str, username, email) = match (id_str, username, email, trailing) {
        (Some(id), Some(u), Some(e), None) => (id, u, e),
        _ => return Err(err!(Parse, "Syntax error. Could not parse statement.")),
    };

    if !SIGNED_INTEGER.is_match(id_str) {
        return Err(err!(Parse, "Syntax error. Could not parse statement."));
    }
    if id_str.starts_with('-') {
        return Err(err!(Parse, "Id must be postive number."));
    }
    let id: u32 = id_str
        .parse()
        .map_err(|_| err!(Parse, "Syntax error. Could not parse statement."))?;

    match Record::new(id, username, email) {
        Some(record) => Ok(Command::Insert(record)),
        None => Err(err!(Parse, "String is too long.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(line: &str) -> Command {
        parse(line).unwrap_or_else(|e| panic!("expected ok, got {}", e))
    }

    #[test]
    fn parses_insert() {
        match parse_ok("insert 1 alice alice@x") {
            Command::Insert(record) => {
                assert_eq!(record.id, 1);
                assert_eq!(record.username, "alice");
                assert_eq!(record.email, "alice@x");
            }
            _ => panic!("expected insert"),
        }
    }

    #[test]
    fn parses_select() {
        assert!(matches!(parse_ok("select"), Command::Select));
    }

    #[test]
    fn rejects_negative_id() {
        let err = parse("insert -3 a a@x").unwrap_err();
        assert_eq!(err.to_string(), "Id must be postive number.");
    }

    #[test]
    fn rejects_over_long_username() {
        let username: String = std::iter::repeat('a').take(33).collect();
        let err = parse(&format!("insert 1 {} a@x", username)).unwrap_err();
        assert_eq!(err.to_string(), "String is too long.");
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = parse("insert 1 alice").unwrap_err();
        assert_eq!(err.to_string(), "Syntax error. Could not parse statement.");
    }

    #[test]
    fn rejects_id_beyond_u32_range() {
        let err = parse("insert 4294967296 a a@x").unwrap_err();
        assert_eq!(err.to_string(), "Syntax error. Could not parse statement.");
    }

    #[test]
    fn rejects_unknown_keyword() {
        let err = parse("delete 1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unrecognized keyword at start of 'delete 1'."
        );
    }

    #[test]
    fn meta_exit_and_unrecognized() {
        assert!(matches!(
            parse(".exit").unwrap(),
            Command::Meta(MetaCommand::Exit)
        ));
        assert!(matches!(
            parse(".foo").unwrap(),
            Command::Meta(MetaCommand::Unrecognized)
        ));
    }
}
