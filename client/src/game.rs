use shared::{CharacterSummary, Position, PuzzleView, ValidateResponse, MSG_MISS};
use std::collections::BTreeSet;
use std::time::Instant;

/// A character found during this run, drawn at the position the server reported
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub character_id: u32,
    pub name: String,
    pub position: Position,
}

/// What a validation response meant for the local display
#[derive(Debug, Clone, PartialEq)]
pub enum ClickResult {
    Found { name: String, position: Position },
    Completed { name: String, time: f64 },
    Missed { message: String },
}

/// Client-side view of the current puzzle.
///
/// Nothing here is authoritative. Found characters and the final time always
/// come from server responses, and the running clock is for display only.
pub struct ClientGameState {
    puzzle: Option<PuzzleView>,
    found: BTreeSet<u32>,
    markers: Vec<Marker>,
    clock_base: f64,
    synced_at: Instant,
    completion_time: Option<f64>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            puzzle: None,
            found: BTreeSet::new(),
            markers: Vec::new(),
            clock_base: 0.0,
            synced_at: Instant::now(),
            completion_time: None,
        }
    }

    /// Replaces local state with a freshly fetched puzzle
    pub fn load_puzzle(&mut self, view: PuzzleView, now: Instant) {
        self.found = view.found.iter().copied().collect();
        self.markers.clear();
        self.clock_base = view.elapsed;
        self.synced_at = now;
        self.completion_time = None;
        self.puzzle = Some(view);
    }

    pub fn puzzle(&self) -> Option<&PuzzleView> {
        self.puzzle.as_ref()
    }

    pub fn image_id(&self) -> Option<u32> {
        self.puzzle.as_ref().map(|puzzle| puzzle.image_id)
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn found_count(&self) -> usize {
        self.found.len()
    }

    pub fn total_characters(&self) -> usize {
        self.puzzle
            .as_ref()
            .map(|puzzle| puzzle.characters.len())
            .unwrap_or(0)
    }

    pub fn is_found(&self, character_id: u32) -> bool {
        self.found.contains(&character_id)
    }

    /// Characters not yet found, in display order
    pub fn remaining(&self) -> Vec<&CharacterSummary> {
        match &self.puzzle {
            Some(puzzle) => puzzle
                .characters
                .iter()
                .filter(|character| !self.found.contains(&character.id))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn character_name(&self, character_id: u32) -> String {
        self.puzzle
            .as_ref()
            .and_then(|puzzle| puzzle.characters.iter().find(|c| c.id == character_id))
            .map(|character| character.name.clone())
            .unwrap_or_else(|| format!("#{}", character_id))
    }

    pub fn completion_time(&self) -> Option<f64> {
        self.completion_time
    }

    pub fn is_complete(&self) -> bool {
        self.completion_time.is_some()
    }

    /// Records the outcome of a click on `character_id`
    pub fn apply_validation(
        &mut self,
        character_id: u32,
        response: &ValidateResponse,
    ) -> ClickResult {
        let position = match (response.success, response.position) {
            (true, Some(position)) => position,
            _ => {
                return ClickResult::Missed {
                    message: response
                        .message
                        .clone()
                        .unwrap_or_else(|| MSG_MISS.to_string()),
                }
            }
        };

        let name = self.character_name(character_id);
        if self.found.insert(character_id) {
            self.markers.push(Marker {
                character_id,
                name: name.clone(),
                position,
            });
        }

        match (response.is_complete(), response.time) {
            (true, Some(time)) => {
                // The clock stops at the server's measurement
                self.completion_time = Some(time);
                ClickResult::Completed { name, time }
            }
            _ => ClickResult::Found { name, position },
        }
    }

    /// Seconds shown on the clock at `now`
    pub fn display_elapsed(&self, now: Instant) -> f64 {
        match self.completion_time {
            Some(time) => time,
            None if self.puzzle.is_some() => {
                self.clock_base + now.saturating_duration_since(self.synced_at).as_secs_f64()
            }
            None => 0.0,
        }
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats whole seconds as `m:ss`
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::MSG_ALREADY_FOUND;
    use std::time::Duration;

    fn view() -> PuzzleView {
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
                    id: 2,
                    name: "Wizard".to_string(),
                    icon_url: None,
                },
            ],
            found: vec![],
            elapsed: 4.0,
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(9.9), "0:09");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn test_hit_places_marker_at_reported_position() {
        let mut state = ClientGameState::new();
        state.load_puzzle(view(), Instant::now());

        let result = state.apply_validation(1, &ValidateResponse::hit(Position::new(0.45, 0.6)));
        assert_eq!(
            result,
            ClickResult::Found {
                name: "Waldo".to_string(),
                position: Position::new(0.45, 0.6)
            }
        );
        assert_eq!(state.found_count(), 1);
        assert_eq!(state.markers()[0].position, Position::new(0.45, 0.6));
        assert_eq!(state.remaining().len(), 1);
        assert!(!state.is_complete());
    }

    #[test]
    fn test_miss_and_already_found_leave_state_alone() {
        let mut state = ClientGameState::new();
        state.load_puzzle(view(), Instant::now());

        let result = state.apply_validation(2, &ValidateResponse::failure(MSG_MISS));
        assert_eq!(
            result,
            ClickResult::Missed {
                message: "Try again!".to_string()
            }
        );
        let result = state.apply_validation(1, &ValidateResponse::failure(MSG_ALREADY_FOUND));
        assert!(matches!(result, ClickResult::Missed { .. }));
        assert_eq!(state.found_count(), 0);
        assert!(state.markers().is_empty());
    }

    #[test]
    fn test_completion_freezes_clock() {
        let start = Instant::now();
        let mut state = ClientGameState::new();
        state.load_puzzle(view(), start);

        state.apply_validation(1, &ValidateResponse::hit(Position::new(0.45, 0.6)));
        let result =
            state.apply_validation(2, &ValidateResponse::completed(Position::new(0.7, 0.2), 12.5));
        assert_eq!(
            result,
            ClickResult::Completed {
                name: "Wizard".to_string(),
                time: 12.5
            }
        );
        assert!(state.is_complete());
        assert_approx_eq!(state.display_elapsed(start + Duration::from_secs(90)), 12.5);
    }

    #[test]
    fn test_display_clock_runs_from_server_elapsed() {
        let start = Instant::now();
        let mut state = ClientGameState::new();
        assert_approx_eq!(state.display_elapsed(start), 0.0);

        state.load_puzzle(view(), start);
        assert_approx_eq!(state.display_elapsed(start + Duration::from_secs(3)), 7.0);
    }

    #[test]
    fn test_load_puzzle_restores_found_set() {
        let mut resumed = view();
        resumed.found = vec![2];

        let mut state = ClientGameState::new();
        state.load_puzzle(resumed, Instant::now());
        assert!(state.is_found(2));
        assert_eq!(state.remaining()[0].name, "Waldo");
        assert_eq!(state.character_name(99), "#99");
    }
}
