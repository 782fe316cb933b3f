//! A guarded edge between two blueprint states.

use super::state::StateId;
use super::BlueprintId;
use crate::condition::Condition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type TransitionId = u64;

/// An input the acting user must supply before the transition can proceed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub field: String,
    pub label: Option<String>,
    pub is_required: bool,
}

impl Requirement {
    pub fn required(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: None,
            is_required: true,
        }
    }

    pub fn optional(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: None,
            is_required: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label shown to the user; falls back to the field name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field)
    }
}

/// Configuration for one side effect to run after the transition succeeds.
///
/// The blob is interpreted by an external action runner; this core only
/// stores it and collects results keyed by `key`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    pub key: String,
    pub action_type: String,
    pub parameters: Value,
    pub display_order: i32,
    pub is_active: bool,
}

impl ActionConfig {
    pub fn new(key: impl Into<String>, action_type: impl Into<String>, parameters: Value) -> Self {
        Self {
            key: key.into(),
            action_type: action_type.into(),
            parameters,
            display_order: 0,
            is_active: true,
        }
    }
}

/// Approval gate configuration. Its presence on a transition means an
/// external approval decision must land before the transition can complete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalConfig {
    pub approver_ids: Vec<u64>,
    pub require_all: bool,
    pub auto_reject_days: Option<u32>,
}

impl ApprovalConfig {
    pub fn any_of(approver_ids: Vec<u64>) -> Self {
        Self {
            approver_ids,
            require_all: false,
            auto_reject_days: None,
        }
    }

    pub fn all_of(approver_ids: Vec<u64>) -> Self {
        Self {
            approver_ids,
            require_all: true,
            auto_reject_days: None,
        }
    }
}

/// A directed edge of the blueprint graph.
///
/// A transition with no source state is an entry transition, used to seed
/// a newly created record into the graph.
///
/// # Example
///
/// ```rust
/// use trellis::definition::Transition;
///
/// let transition = Transition::new(1, 1, Some(1), 2, "Qualify");
/// assert_eq!(transition.button_label(), "Qualify");
/// assert!(!transition.is_entry());
/// assert!(!transition.requires_approval());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    id: TransitionId,
    blueprint_id: BlueprintId,
    from_state_id: Option<StateId>,
    to_state_id: StateId,
    name: String,
    description: Option<String>,
    button_label: Option<String>,
    display_order: i32,
    is_active: bool,
    conditions: Vec<Condition>,
    requirements: Vec<Requirement>,
    actions: Vec<ActionConfig>,
    approval: Option<ApprovalConfig>,
}

impl Transition {
    pub fn new(
        id: TransitionId,
        blueprint_id: BlueprintId,
        from_state_id: Option<StateId>,
        to_state_id: StateId,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            blueprint_id,
            from_state_id,
            to_state_id,
            name: name.into(),
            description: None,
            button_label: None,
            display_order: 0,
            is_active: true,
            conditions: Vec::new(),
            requirements: Vec::new(),
            actions: Vec::new(),
            approval: None,
        }
    }

    /// Rehydrate from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: TransitionId,
        blueprint_id: BlueprintId,
        from_state_id: Option<StateId>,
        to_state_id: StateId,
        name: String,
        description: Option<String>,
        button_label: Option<String>,
        display_order: i32,
        is_active: bool,
        conditions: Vec<Condition>,
        requirements: Vec<Requirement>,
        actions: Vec<ActionConfig>,
        approval: Option<ApprovalConfig>,
    ) -> Self {
        Self {
            id,
            blueprint_id,
            from_state_id,
            to_state_id,
            name,
            description,
            button_label,
            display_order,
            is_active,
            conditions,
            requirements,
            actions,
            approval,
        }
    }

    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn blueprint_id(&self) -> BlueprintId {
        self.blueprint_id
    }

    pub fn from_state_id(&self) -> Option<StateId> {
        self.from_state_id
    }

    pub fn to_state_id(&self) -> StateId {
        self.to_state_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Button text for the UI; falls back to the transition name.
    pub fn button_label(&self) -> &str {
        self.button_label.as_deref().unwrap_or(&self.name)
    }

    pub fn display_order(&self) -> i32 {
        self.display_order
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// An entry transition has no source state and seeds new records.
    pub fn is_entry(&self) -> bool {
        self.from_state_id.is_none()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn actions(&self) -> &[ActionConfig] {
        &self.actions
    }

    pub fn approval(&self) -> Option<&ApprovalConfig> {
        self.approval.as_ref()
    }

    pub fn requires_approval(&self) -> bool {
        self.approval.is_some()
    }

    pub fn has_requirements(&self) -> bool {
        !self.requirements.is_empty()
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn set_button_label(&mut self, label: Option<String>) {
        self.button_label = label;
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn set_display_order(&mut self, order: i32) {
        self.display_order = order;
    }

    pub fn add_condition(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn add_requirement(&mut self, requirement: Requirement) {
        self.requirements.push(requirement);
    }

    pub fn add_action(&mut self, action: ActionConfig) {
        self.actions.push(action);
    }

    pub fn set_approval(&mut self, approval: Option<ApprovalConfig>) {
        self.approval = approval;
    }

    /// Display labels of every required input that is absent or null in
    /// the supplied data. Empty means the requirements are satisfied.
    pub fn missing_requirements(&self, data: &Map<String, Value>) -> Vec<String> {
        self.requirements
            .iter()
            .filter(|requirement| requirement.is_required)
            .filter(|requirement| {
                matches!(data.get(&requirement.field), None | Some(Value::Null))
            })
            .map(|requirement| requirement.display_label().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn button_label_falls_back_to_name() {
        let mut transition = Transition::new(1, 1, Some(1), 2, "Qualify");
        assert_eq!(transition.button_label(), "Qualify");

        transition.set_button_label(Some("Mark as qualified".to_string()));
        assert_eq!(transition.button_label(), "Mark as qualified");
    }

    #[test]
    fn entry_transition_has_no_source() {
        let entry = Transition::new(1, 1, None, 1, "Create");
        assert!(entry.is_entry());

        let edge = Transition::new(2, 1, Some(1), 2, "Qualify");
        assert!(!edge.is_entry());
    }

    #[test]
    fn approval_presence_marks_the_gate() {
        let mut transition = Transition::new(1, 1, Some(2), 3, "Close");
        assert!(!transition.requires_approval());

        transition.set_approval(Some(ApprovalConfig::any_of(vec![7])));
        assert!(transition.requires_approval());
    }

    #[test]
    fn missing_requirements_reports_labels() {
        let mut transition = Transition::new(1, 1, Some(1), 2, "Qualify");
        transition.add_requirement(Requirement::required("budget").with_label("Budget"));
        transition.add_requirement(Requirement::required("contact"));
        transition.add_requirement(Requirement::optional("notes"));

        let mut data = Map::new();
        data.insert("contact".to_string(), json!("a@example.com"));

        let missing = transition.missing_requirements(&data);
        assert_eq!(missing, vec!["Budget".to_string()]);
    }

    #[test]
    fn null_counts_as_missing() {
        let mut transition = Transition::new(1, 1, Some(1), 2, "Qualify");
        transition.add_requirement(Requirement::required("budget"));

        let mut data = Map::new();
        data.insert("budget".to_string(), Value::Null);

        assert_eq!(transition.missing_requirements(&data), vec!["budget"]);
    }

    #[test]
    fn satisfied_requirements_are_empty() {
        let mut transition = Transition::new(1, 1, Some(1), 2, "Qualify");
        transition.add_requirement(Requirement::required("budget"));

        let mut data = Map::new();
        data.insert("budget".to_string(), json!(10_000));

        assert!(transition.missing_requirements(&data).is_empty());
        assert!(transition.has_requirements());
    }

    #[test]
    fn transition_round_trips_through_serde() {
        let mut transition = Transition::new(1, 1, Some(1), 2, "Qualify");
        transition.add_action(ActionConfig::new(
            "notify-owner",
            "notify_user",
            json!({"user_ids": [3]}),
        ));
        transition.set_approval(Some(ApprovalConfig::all_of(vec![1, 2])));

        let json = serde_json::to_string(&transition).unwrap();
        let back: Transition = serde_json::from_str(&json).unwrap();
        assert_eq!(transition, back);
    }
}
