//! Operator commands.

use crate::error::{TerminalError, TerminalResult};

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `load <code>`, or a bare code.
    Load(String),
    Scan,
    Add,
    Cart,
    Buy,
    Reset,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  <code> | load <code>   look a product up
  scan                   read one code from the scanner (Ctrl-C cancels)
  add                    add the loaded product to the cart
  cart                   show the cart
  buy                    submit the purchase
  reset                  start a new transaction
  help                   show this help
  quit                   exit";

impl Command {
    /// Parses one input line. Blank lines yield `None`.
    ///
    /// A single word that is not a command is taken as a product code if it
    /// contains a digit, so typos of command names are not sent as lookups.
    pub fn parse(line: &str) -> TerminalResult<Option<Command>> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("load", [code]) => Command::Load(code.to_string()),
            ("load", _) => return Err(TerminalError::MissingArgument("load <code>")),
            ("scan", []) => Command::Scan,
            ("add", []) => Command::Add,
            ("cart", []) => Command::Cart,
            ("buy", []) => Command::Buy,
            ("reset", []) => Command::Reset,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            (_, []) if head.chars().any(|c| c.is_ascii_digit()) => Command::Load(head.to_string()),
            _ => return Err(TerminalError::UnknownCommand(line.trim().to_string())),
        };

        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_code_is_a_lookup() {
        assert_eq!(
            Command::parse("4901777300446").unwrap(),
            Some(Command::Load("4901777300446".into()))
        );
        assert_eq!(
            Command::parse("  load SKU-12 ").unwrap(),
            Some(Command::Load("SKU-12".into()))
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(Command::parse("scan").unwrap(), Some(Command::Scan));
        assert_eq!(Command::parse("ADD").unwrap(), Some(Command::Add));
        assert_eq!(Command::parse("buy").unwrap(), Some(Command::Buy));
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_rejects_unknown_and_incomplete() {
        assert!(matches!(
            Command::parse("ad"),
            Err(TerminalError::UnknownCommand(_))
        ));
        assert!(matches!(
            Command::parse("load"),
            Err(TerminalError::MissingArgument(_))
        ));
        assert!(matches!(
            Command::parse("scan now"),
            Err(TerminalError::UnknownCommand(_))
        ));
    }
}
