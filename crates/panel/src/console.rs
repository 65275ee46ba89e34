//! Line commands accepted by the interactive console.

use std::fmt;

/// Help text printed by `help` and after unknown commands.
pub const HELP: &str = "\
commands:
  page <n|id>          show page n (1-based) or the page with this id
  press <row> [btn]    press a row (button, card, toggle, entry, navigation)
  toggle <row>         flip a toggle or toggle card
  slide <row> <value>  move a slider
  select <row> <opt>   choose a selection option
  entry <row> <text>   type into an entry and apply
  open <row>           open a navigation row or expand an expander
  back                 pop the current sub-page
  search [query]       search all pages; no query leaves search
  reload               reload the document from disk
  show                 print the current page
  quit                 exit";

/// A parsed console command. Rows are 1-based as printed by `show`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Show a page.
    Page(PageRef),
    /// Press a row; the second value picks a button in linked groups.
    Press(usize, usize),
    /// Flip a toggle.
    Toggle(usize),
    /// Move a slider.
    Slide(usize, f64),
    /// Choose a selection option.
    Select(usize, String),
    /// Type into an entry and apply.
    Entry(usize, String),
    /// Open a navigation row or expander.
    Open(usize),
    /// Pop a sub-page.
    Back,
    /// Search, or leave search when empty.
    Search(String),
    /// Reload the document.
    Reload,
    /// Print the current page.
    Show,
    /// Print help.
    Help,
    /// Exit.
    Quit,
}

/// How a `page` command names its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    /// 0-based index.
    Index(usize),
    /// Page id.
    Id(String),
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a 1-based row number into a 0-based index.
fn row(arg: Option<&str>) -> Result<usize, ParseError> {
    let arg = arg.ok_or_else(|| ParseError("missing row number".into()))?;
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(ParseError(format!("not a row number: {arg}"))),
    }
}

/// Everything after the first `skip` words, re-joined.
fn rest(line: &str, skip: usize) -> String {
    line.split_whitespace()
        .skip(skip)
        .collect::<Vec<_>>()
        .join(" ")
}

impl ConsoleCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Result<Self, ParseError>> {
        let mut words = line.split_whitespace();
        let verb = words.next()?;
        let arg = words.next();
        let parsed = match verb {
            "page" => match arg {
                None => Err(ParseError("missing page".into())),
                Some(a) => match a.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(Self::Page(PageRef::Index(n - 1))),
                    _ => Ok(Self::Page(PageRef::Id(a.to_string()))),
                },
            },
            "press" => row(arg).and_then(|r| {
                let button = match words.next() {
                    None => 0,
                    Some(b) => match b.parse::<usize>() {
                        Ok(n) if n > 0 => n - 1,
                        _ => return Err(ParseError(format!("not a button number: {b}"))),
                    },
                };
                Ok(Self::Press(r, button))
            }),
            "toggle" => row(arg).map(Self::Toggle),
            "slide" => row(arg).and_then(|r| {
                let v = words
                    .next()
                    .ok_or_else(|| ParseError("missing value".into()))?;
                v.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| Self::Slide(r, v))
                    .ok_or_else(|| ParseError(format!("not a number: {v}")))
            }),
            "select" => row(arg).and_then(|r| match rest(line, 2) {
                s if s.is_empty() => Err(ParseError("missing option".into())),
                s => Ok(Self::Select(r, s)),
            }),
            "entry" => row(arg).map(|r| Self::Entry(r, rest(line, 2))),
            "open" => row(arg).map(Self::Open),
            "back" => Ok(Self::Back),
            "search" => Ok(Self::Search(rest(line, 1))),
            "reload" => Ok(Self::Reload),
            "show" | "ls" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(ParseError(format!("unknown command: {other}"))),
        };
        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(line: &str) -> ConsoleCommand {
        ConsoleCommand::parse(line).unwrap().unwrap()
    }

    #[test]
    fn rows_are_one_based() {
        assert_eq!(ok("press 1"), ConsoleCommand::Press(0, 0));
        assert_eq!(ok("press 3 2"), ConsoleCommand::Press(2, 1));
        assert_eq!(ok("slide 2 40.5"), ConsoleCommand::Slide(1, 40.5));
        assert!(ConsoleCommand::parse("press 0").unwrap().is_err());
        assert!(ConsoleCommand::parse("slide 1 loud").unwrap().is_err());
    }

    #[test]
    fn pages_by_number_or_id() {
        assert_eq!(ok("page 2"), ConsoleCommand::Page(PageRef::Index(1)));
        assert_eq!(ok("page audio"), ConsoleCommand::Page(PageRef::Id("audio".into())));
    }

    #[test]
    fn free_text_arguments_keep_spaces() {
        assert_eq!(
            ok("select 4 power   saver"),
            ConsoleCommand::Select(3, "power saver".into())
        );
        assert_eq!(ok("search night light"), ConsoleCommand::Search("night light".into()));
        assert_eq!(ok("search"), ConsoleCommand::Search(String::new()));
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert!(ConsoleCommand::parse("   ").is_none());
        assert!(ConsoleCommand::parse("dance").unwrap().is_err());
        assert_eq!(ok("q"), ConsoleCommand::Quit);
    }
}
