//! A single named position in a blueprint's graph.

use super::BlueprintId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type StateId = u64;

/// One state of a blueprint: a value the owning record field can take.
///
/// The `is_initial` and `is_terminal` flags are mutually exclusive; setting
/// either clears the other, and [`State::set_as_intermediate`] clears both.
/// Position and color are presentation hints for the graph editor and carry
/// no semantics.
///
/// # Example
///
/// ```rust
/// use trellis::definition::State;
///
/// let mut state = State::new(1, 1, "New", Some("new".to_string()));
/// state.set_as_initial();
/// assert!(state.is_initial());
///
/// state.set_as_terminal();
/// assert!(state.is_terminal());
/// assert!(!state.is_initial());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    id: StateId,
    blueprint_id: BlueprintId,
    name: String,
    field_option_value: Option<String>,
    color: Option<String>,
    is_initial: bool,
    is_terminal: bool,
    position: i32,
    metadata: Map<String, Value>,
}

impl State {
    pub fn new(
        id: StateId,
        blueprint_id: BlueprintId,
        name: impl Into<String>,
        field_option_value: Option<String>,
    ) -> Self {
        Self {
            id,
            blueprint_id,
            name: name.into(),
            field_option_value,
            color: None,
            is_initial: false,
            is_terminal: false,
            position: 0,
            metadata: Map::new(),
        }
    }

    /// Rehydrate from storage, bypassing the flag setters.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: StateId,
        blueprint_id: BlueprintId,
        name: String,
        field_option_value: Option<String>,
        color: Option<String>,
        is_initial: bool,
        is_terminal: bool,
        position: i32,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            blueprint_id,
            name,
            field_option_value,
            color,
            is_initial,
            is_terminal,
            position,
            metadata,
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn blueprint_id(&self) -> BlueprintId {
        self.blueprint_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The external field-option value this state mirrors.
    pub fn field_option_value(&self) -> Option<&str> {
        self.field_option_value.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Flag as the entry state, clearing the terminal flag.
    pub fn set_as_initial(&mut self) {
        self.is_initial = true;
        self.is_terminal = false;
    }

    /// Flag as a terminal state, clearing the initial flag.
    pub fn set_as_terminal(&mut self) {
        self.is_terminal = true;
        self.is_initial = false;
    }

    /// Clear both flags.
    pub fn set_as_intermediate(&mut self) {
        self.is_initial = false;
        self.is_terminal = false;
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_field_option_value(&mut self, value: Option<String>) {
        self.field_option_value = value;
    }

    pub fn set_color(&mut self, color: Option<String>) {
        self.color = color;
    }

    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    /// Merge new entries into the metadata map. Existing keys not present
    /// in `patch` are kept.
    pub fn update_metadata(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.metadata.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> State {
        State::new(1, 1, "New", Some("new".to_string()))
    }

    #[test]
    fn new_state_is_intermediate() {
        let state = state();
        assert!(!state.is_initial());
        assert!(!state.is_terminal());
    }

    #[test]
    fn initial_and_terminal_are_mutually_exclusive() {
        let mut state = state();

        state.set_as_initial();
        assert!(state.is_initial());
        assert!(!state.is_terminal());

        state.set_as_terminal();
        assert!(state.is_terminal());
        assert!(!state.is_initial());

        state.set_as_initial();
        assert!(state.is_initial());
        assert!(!state.is_terminal());
    }

    #[test]
    fn intermediate_clears_both_flags() {
        let mut state = state();
        state.set_as_initial();
        state.set_as_intermediate();
        assert!(!state.is_initial());
        assert!(!state.is_terminal());

        state.set_as_terminal();
        state.set_as_intermediate();
        assert!(!state.is_initial());
        assert!(!state.is_terminal());
    }

    #[test]
    fn metadata_merge_keeps_existing_keys() {
        let mut state = state();
        let mut first = Map::new();
        first.insert("kanban_column".to_string(), json!(2));
        first.insert("icon".to_string(), json!("star"));
        state.update_metadata(first);

        let mut second = Map::new();
        second.insert("icon".to_string(), json!("flag"));
        state.update_metadata(second);

        assert_eq!(state.metadata().get("kanban_column"), Some(&json!(2)));
        assert_eq!(state.metadata().get("icon"), Some(&json!("flag")));
    }

    #[test]
    fn rename_and_presentation_setters() {
        let mut state = state();
        state.rename("Fresh");
        state.set_color(Some("#00ff00".to_string()));
        state.set_position(3);

        assert_eq!(state.name(), "Fresh");
        assert_eq!(state.color(), Some("#00ff00"));
        assert_eq!(state.position(), 3);
    }

    #[test]
    fn state_round_trips_through_serde() {
        let mut state = state();
        state.set_as_initial();
        let json = serde_json::to_string(&state).unwrap();
        let back: State = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
