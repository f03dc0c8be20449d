//! Parsing of terminal command lines

use shared::Position;
use thiserror::Error;

/// A command typed by the player
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Guess that `character_id` hides at the normalized point
    Click { position: Position, character_id: u32 },
    Scores,
    /// Start the current image again, or switch to another one
    Restart { image_id: Option<u32> },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty input")]
    Empty,
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("coordinates must be between 0 and 1")]
    OutOfRange,
}

const CLICK_USAGE: &str = "click <x> <y> <characterId>";
const RESTART_USAGE: &str = "restart [imageId]";

pub const HELP_TEXT: &str = "\
Commands:
  click <x> <y> <id>   guess character <id> at normalized point (x, y)
  scores               show the leaderboard for this image
  restart [imageId]    start this image (or another) from scratch
  help                 show this message
  quit                 leave the game";

impl Command {
    pub fn parse(line: &str) -> Result<Command, ParseError> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        match verb.as_str() {
            "click" | "c" => parse_click(&args),
            "scores" | "s" if args.is_empty() => Ok(Command::Scores),
            "restart" | "r" => match args.as_slice() {
                [] => Ok(Command::Restart { image_id: None }),
                [id] => id
                    .parse()
                    .map(|id| Command::Restart { image_id: Some(id) })
                    .map_err(|_| ParseError::Usage(RESTART_USAGE)),
                _ => Err(ParseError::Usage(RESTART_USAGE)),
            },
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            _ => Err(ParseError::Unknown(verb)),
        }
    }
}

fn parse_click(args: &[&str]) -> Result<Command, ParseError> {
    let [x, y, id] = args else {
        return Err(ParseError::Usage(CLICK_USAGE));
    };

    let x: f64 = x.parse().map_err(|_| ParseError::Usage(CLICK_USAGE))?;
    let y: f64 = y.parse().map_err(|_| ParseError::Usage(CLICK_USAGE))?;
    let character_id: u32 = id.parse().map_err(|_| ParseError::Usage(CLICK_USAGE))?;

    let position = Position::new(x, y);
    if !position.is_normalized() {
        return Err(ParseError::OutOfRange);
    }

    Ok(Command::Click {
        position,
        character_id,
    })
}
