//! Text rendering for the terminal player

use crate::game::{format_time, ClickResult, ClientGameState};
use shared::{ImageSummary, ScoresResponse};
use std::fmt::Write;
use std::time::Instant;

/// Draws the puzzle board as a character grid. Found characters are marked
/// with the first letter of their name at the position the server reported.
pub struct Renderer {
    width: usize,
    height: usize,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            width: width.max(2),
            height: height.max(2),
        }
    }

    /// Status line: image name, progress and clock
    pub fn status_line(&self, state: &ClientGameState, now: Instant) -> String {
        match state.puzzle() {
            Some(puzzle) => format!(
                "{} | found {}/{} | Time: {}",
                puzzle.image_name,
                state.found_count(),
                state.total_characters(),
                format_time(state.display_elapsed(now))
            ),
            None => "No game in progress".to_string(),
        }
    }

    pub fn board(&self, state: &ClientGameState) -> String {
        let mut grid = vec![vec!['.'; self.width]; self.height];
        for marker in state.markers() {
            let column = cell(marker.position.x, self.width);
            let row = cell(marker.position.y, self.height);
            grid[row][column] = marker
                .name
                .chars()
                .next()
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or('*');
        }

        let border = format!("+{}+", "-".repeat(self.width));
        let mut out = String::new();
        let _ = writeln!(out, "{}", border);
        for row in grid {
            let _ = writeln!(out, "|{}|", row.into_iter().collect::<String>());
        }
        out.push_str(&border);
        out
    }

    /// Characters still hidden, with the ids to click them by
    pub fn remaining(&self, state: &ClientGameState) -> String {
        let remaining = state.remaining();
        if remaining.is_empty() {
            return "All characters found".to_string();
        }
        let list: Vec<String> = remaining
            .iter()
            .map(|character| format!("{} (id {})", character.name, character.id))
            .collect();
        format!("Find: {}", list.join(", "))
    }

    pub fn render(&self, state: &ClientGameState, now: Instant) -> String {
        format!(
            "{}\n{}\n{}",
            self.status_line(state, now),
            self.board(state),
            self.remaining(state)
        )
    }
}

fn cell(coordinate: f64, cells: usize) -> usize {
    let index = (coordinate.clamp(0.0, 1.0) * cells as f64) as usize;
    index.min(cells - 1)
}

pub fn click_result(result: &ClickResult) -> String {
    match result {
        ClickResult::Found { name, position } => {
            format!("Found {} at ({:.2}, {:.2})!", name, position.x, position.y)
        }
        ClickResult::Completed { name, time } => format!(
            "Found {}! You found everyone in {:.2} seconds ({}).",
            name,
            time,
            format_time(*time)
        ),
        ClickResult::Missed { message } => message.clone(),
    }
}

pub fn image_list(images: &[ImageSummary]) -> String {
    if images.is_empty() {
        return "No puzzles available".to_string();
    }
    let mut out = String::from("Puzzles:");
    for image in images {
        let _ = write!(out, "\n  {:>3}  {}", image.id, image.name);
    }
    out
}

pub fn score_table(scores: &ScoresResponse) -> String {
    let mut out = format!("High scores: {}", scores.image_name);
    if scores.scores.is_empty() {
        out.push_str("\n  (none yet)");
        return out;
    }
    for (rank, score) in scores.scores.iter().enumerate() {
        let _ = write!(
            out,
            "\n  {:>2}. {:<32} {:>8.2}s",
            rank + 1,
            score.name,
            score.time
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{CharacterSummary, HighScore, Position, PuzzleView, ValidateResponse};

    fn state() -> ClientGameState {
        let mut state = ClientGameState::new();
        state.load_puzzle(
            PuzzleView {
                image_id: 1,
                image_name: "Classic Waldo".to_string(),
                image_url: "https://example.com/waldo1.jpg".to_string(),
                characters: vec![
                    CharacterSummary {
                        id: 1,
                        name: "Waldo".to_string(),
                        icon_url: None,
                    },
                    CharacterSummary {
                        id: 3,
                        name: "odlaw".to_string(),
                        icon_url: None,
                    },
                ],
                found: vec![],
                elapsed: 65.0,
            },
            Instant::now(),
        );
        state
    }

    #[test]
    fn test_board_places_markers() {
        let mut state = state();
        state.apply_validation(1, &ValidateResponse::hit(Position::new(0.45, 0.6)));
        state.apply_validation(3, &ValidateResponse::hit(Position::new(1.0, 0.0)));

        let board = Renderer::new(10, 5).board(&state);
        let rows: Vec<&str> = board.lines().collect();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0], "+----------+");
        assert_eq!(rows[1], "|.........O|");
        assert_eq!(rows[4], "|....W.....|");
    }

    #[test]
    fn test_status_and_remaining() {
        let state = state();
        let renderer = Renderer::new(10, 5);
        let status = renderer.status_line(&state, Instant::now());
        assert!(status.starts_with("Classic Waldo | found 0/2 | Time: 1:0"));
        assert_eq!(
            renderer.remaining(&state),
            "Find: Waldo (id 1), odlaw (id 3)"
        );

        let empty = ClientGameState::new();
        assert_eq!(renderer.status_line(&empty, Instant::now()), "No game in progress");
    }

    #[test]
    fn test_score_table() {
        let scores = ScoresResponse {
            scores: vec![HighScore {
                id: 1,
                name: "Ada".to_string(),
                time: 12.345,
                image_id: 1,
                created_at: 0,
            }],
            image_name: "Classic Waldo".to_string(),
        };
        let table = score_table(&scores);
        assert!(table.starts_with("High scores: Classic Waldo"));
        assert!(table.contains(" 1. Ada"));
        assert!(table.contains("12.35s") || table.contains("12.34s"));

        let empty = ScoresResponse {
            scores: vec![],
            image_name: "No levels available".to_string(),
        };
        assert!(score_table(&empty).ends_with("(none yet)"));
    }

    #[test]
    fn test_click_messages() {
        let completed = ClickResult::Completed {
            name: "Odlaw".to_string(),
            time: 75.5,
        };
        assert!(click_result(&completed).contains("(1:15)"));
        assert_eq!(
            click_result(&ClickResult::Missed {
                message: "Try again!".to_string()
            }),
            "Try again!"
        );
        assert_eq!(image_list(&[]), "No puzzles available");
    }
}
