//! services/reader/src/command.rs
//!
//! Parses the lines typed into the terminal front-end.

use crate::screens::typography::{FontFamily, TypographyError};
use crate::session::guard::{Route, UnknownRoute};

pub const HELP: &str = "\
Commands:
  go <path>                         open /, /login, /register, /dashboard or /document/<id>
  login <email> <password>          sign in
  register <name> <email> <password>  create an account (name may not contain spaces)
  logout                            sign out (dashboard)
  new                               create a document (dashboard)
  open <id>                         open a document
  edit <text>                       replace the original text (use \\n for line breaks)
  save                              save the original text
  convert                           convert the original text
  rename <name>                     rename the document
  font <family>                     Arial, Helvetica, Verdana, OpenDyslexic, Comic Sans
  size <px>                         font size, 12-32
  spacing <em>                      letter spacing, 0-0.5
  line-height <ratio>               line height, 1-3
  color <#rrggbb>                   text colour
  background <#rrggbb>              background colour
  show                              redraw the current screen
  help                              this text
  quit                              leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Go(Route),
    Login { email: String, password: String },
    Register { display_name: String, email: String, password: String },
    Logout,
    New,
    Open(String),
    Edit(String),
    Save,
    Convert,
    Rename(String),
    Font(FontFamily),
    Size(u32),
    Spacing(f32),
    LineHeight(f32),
    Color(String),
    Background(String),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Type a command, or 'help' for the list.")]
    Empty,
    #[error("Unknown command '{0}'. Type 'help' for the list.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Route(#[from] UnknownRoute),
    #[error(transparent)]
    Typography(#[from] TypographyError),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match verb.to_ascii_lowercase().as_str() {
            "" => return Err(ParseError::Empty),
            "go" => match args.as_slice() {
                [path] => Command::Go(Route::parse(path)?),
                _ => return Err(ParseError::Usage("go <path>")),
            },
            "login" => match args.as_slice() {
                [email, password] => Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                _ => return Err(ParseError::Usage("login <email> <password>")),
            },
            "register" => match args.as_slice() {
                [display_name, email, password] => Command::Register {
                    display_name: display_name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                },
                _ => return Err(ParseError::Usage("register <name> <email> <password>")),
            },
            "logout" => Command::Logout,
            "new" => Command::New,
            "open" => match args.as_slice() {
                [id] => Command::Open(id.to_string()),
                _ => return Err(ParseError::Usage("open <id>")),
            },
            "edit" => Command::Edit(rest.replace("\\n", "\n")),
            "save" => Command::Save,
            "convert" => Command::Convert,
            "rename" if !rest.is_empty() => Command::Rename(rest.to_string()),
            "rename" => return Err(ParseError::Usage("rename <name>")),
            "font" if !rest.is_empty() => Command::Font(rest.parse()?),
            "font" => return Err(ParseError::Usage("font <family>")),
            "size" => Command::Size(number(rest, "size <px>")?),
            "spacing" => Command::Spacing(number(rest, "spacing <em>")?),
            "line-height" => Command::LineHeight(number(rest, "line-height <ratio>")?),
            "color" if !rest.is_empty() => Command::Color(rest.to_string()),
            "color" => return Err(ParseError::Usage("color <#rrggbb>")),
            "background" if !rest.is_empty() => Command::Background(rest.to_string()),
            "background" => return Err(ParseError::Usage("background <#rrggbb>")),
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn number<T: std::str::FromStr>(raw: &str, usage: &'static str) -> Result<T, ParseError> {
    raw.parse().map_err(|_| ParseError::Usage(usage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_auth_commands() {
        assert_eq!(
            Command::parse("login ada@example.com hunter22").unwrap(),
            Command::Login {
                email: "ada@example.com".to_string(),
                password: "hunter22".to_string()
            }
        );
        assert_eq!(
            Command::parse("register Ada ada@example.com hunter22").unwrap(),
            Command::Register {
                display_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "hunter22".to_string()
            }
        );
        assert_eq!(
            Command::parse("login ada@example.com").unwrap_err(),
            ParseError::Usage("login <email> <password>")
        );
    }

    #[test]
    fn edit_keeps_the_whole_line() {
        assert_eq!(
            Command::parse("edit The cat sat.\\n\\nOn the mat.").unwrap(),
            Command::Edit("The cat sat.\n\nOn the mat.".to_string())
        );
        assert_eq!(Command::parse("edit").unwrap(), Command::Edit(String::new()));
    }

    #[test]
    fn parses_navigation() {
        assert_eq!(Command::parse("go /dashboard").unwrap(), Command::Go(Route::Dashboard));
        assert_eq!(Command::parse("open abc").unwrap(), Command::Open("abc".to_string()));
        assert!(matches!(Command::parse("go /nowhere"), Err(ParseError::Route(_))));
    }

    #[test]
    fn parses_typography() {
        assert_eq!(Command::parse("font comic sans").unwrap(), Command::Font(FontFamily::ComicSans));
        assert_eq!(Command::parse("size 20").unwrap(), Command::Size(20));
        assert_eq!(Command::parse("spacing 0.25").unwrap(), Command::Spacing(0.25));
        assert_eq!(Command::parse("line-height 2").unwrap(), Command::LineHeight(2.0));
        assert!(Command::parse("size big").is_err());
        assert!(matches!(Command::parse("font Papyrus"), Err(ParseError::Typography(_))));
    }

    #[test]
    fn rejects_blank_and_unknown() {
        assert_eq!(Command::parse("   ").unwrap_err(), ParseError::Empty);
        assert_eq!(Command::parse("dance").unwrap_err(), ParseError::Unknown("dance".to_string()));
        assert_eq!(Command::parse("QUIT").unwrap(), Command::Quit);
    }
}
