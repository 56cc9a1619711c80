//! Capability registry.
//!
//! Static catalog of conversation modes. The orchestrator only looks entries
//! up here; which service call a capability ends up in is decided by the
//! dispatch table in [`crate::handlers`].

use shared::capability::{CapabilityId, CapabilitySpec, InteractiveAffordance, Lifecycle};

use crate::prompts::{activation, hints, instructions, labels};

/// Shorthand for the common case: one-shot, no override, no affordance.
const fn basic(
    id: CapabilityId,
    display_label: &'static str,
    activation_prompt: &'static str,
    input_hint: &'static str,
) -> CapabilitySpec {
    CapabilitySpec {
        id,
        display_label,
        activation_prompt: Some(activation_prompt),
        system_instruction_override: None,
        interactive_affordance: None,
        requires_attachment_before_text: false,
        lifecycle: Lifecycle::OneShot,
        input_hint,
    }
}

const fn with_instruction(mut spec: CapabilitySpec, instruction: &'static str) -> CapabilitySpec {
    spec.system_instruction_override = Some(instruction);
    spec
}

const fn needs_upload(mut spec: CapabilitySpec) -> CapabilitySpec {
    spec.interactive_affordance = Some(InteractiveAffordance::RequestUpload);
    spec.requires_attachment_before_text = true;
    spec
}

const fn sticky(mut spec: CapabilitySpec) -> CapabilitySpec {
    spec.lifecycle = Lifecycle::Sticky;
    spec
}

/// Catalog in display order
const STANDARD_CAPABILITIES: [CapabilitySpec; 19] = [
    basic(
        CapabilityId::VISUAL_STORY,
        labels::VISUAL_STORY,
        activation::VISUAL_STORY,
        hints::VISUAL_STORY,
    ),
    basic(
        CapabilityId::CREATE_IMAGE,
        labels::CREATE_IMAGE,
        activation::CREATE_IMAGE,
        hints::CREATE_IMAGE,
    ),
    basic(
        CapabilityId::CREATE_VIDEO,
        labels::CREATE_VIDEO,
        activation::CREATE_VIDEO,
        hints::CREATE_VIDEO,
    ),
    needs_upload(basic(
        CapabilityId::EDIT_IMAGE,
        labels::EDIT_IMAGE,
        activation::EDIT_IMAGE,
        hints::EDIT_IMAGE,
    )),
    needs_upload(basic(
        CapabilityId::DESCRIBE_IMAGE,
        labels::DESCRIBE_IMAGE,
        activation::DESCRIBE_IMAGE,
        hints::DESCRIBE_IMAGE,
    )),
    basic(
        CapabilityId::WEB_SEARCH,
        labels::WEB_SEARCH,
        activation::WEB_SEARCH,
        hints::WEB_SEARCH,
    ),
    with_instruction(
        basic(
            CapabilityId::PROGRAMMING_ASSISTANT,
            labels::PROGRAMMING_ASSISTANT,
            activation::PROGRAMMING_ASSISTANT,
            hints::PROGRAMMING_ASSISTANT,
        ),
        instructions::PROGRAMMING_ASSISTANT,
    ),
    with_instruction(
        basic(
            CapabilityId::RECIPE_GENERATOR,
            labels::RECIPE_GENERATOR,
            activation::RECIPE_GENERATOR,
            hints::RECIPE_GENERATOR,
        ),
        instructions::RECIPE_GENERATOR,
    ),
    with_instruction(
        basic(
            CapabilityId::WORKOUT_PLANNER,
            labels::WORKOUT_PLANNER,
            activation::WORKOUT_PLANNER,
            hints::WORKOUT_PLANNER,
        ),
        instructions::WORKOUT_PLANNER,
    ),
    with_instruction(
        basic(
            CapabilityId::TRIP_PLANNER,
            labels::TRIP_PLANNER,
            activation::TRIP_PLANNER,
            hints::TRIP_PLANNER,
        ),
        instructions::TRIP_PLANNER,
    ),
    with_instruction(
        basic(
            CapabilityId::SPEECH_WRITER,
            labels::SPEECH_WRITER,
            activation::SPEECH_WRITER,
            hints::SPEECH_WRITER,
        ),
        instructions::SPEECH_WRITER,
    ),
    with_instruction(
        basic(
            CapabilityId::RESUME_ASSISTANT,
            labels::RESUME_ASSISTANT,
            activation::RESUME_ASSISTANT,
            hints::RESUME_ASSISTANT,
        ),
        instructions::RESUME_ASSISTANT,
    ),
    sticky(with_instruction(
        basic(
            CapabilityId::LANGUAGE_TUTOR,
            labels::LANGUAGE_TUTOR,
            activation::LANGUAGE_TUTOR,
            hints::LANGUAGE_TUTOR,
        ),
        instructions::LANGUAGE_TUTOR,
    )),
    with_instruction(
        basic(
            CapabilityId::COLOR_PALETTE,
            labels::COLOR_PALETTE,
            activation::COLOR_PALETTE,
            hints::COLOR_PALETTE,
        ),
        instructions::COLOR_PALETTE,
    ),
    with_instruction(
        basic(
            CapabilityId::DREAM_INTERPRETER,
            labels::DREAM_INTERPRETER,
            activation::DREAM_INTERPRETER,
            hints::DREAM_INTERPRETER,
        ),
        instructions::DREAM_INTERPRETER,
    ),
    basic(
        CapabilityId::CREATE_CHART,
        labels::CREATE_CHART,
        activation::CREATE_CHART,
        hints::CREATE_CHART,
    ),
    basic(
        CapabilityId::ANALYZE_DOCUMENT,
        labels::ANALYZE_DOCUMENT,
        activation::ANALYZE_DOCUMENT,
        hints::ANALYZE_DOCUMENT,
    ),
    CapabilitySpec {
        interactive_affordance: Some(InteractiveAffordance::OfferRandomStart),
        ..basic(
            CapabilityId::INTERACTIVE_STORY,
            labels::INTERACTIVE_STORY,
            activation::INTERACTIVE_STORY,
            hints::INTERACTIVE_STORY,
        )
    },
    sticky(basic(
        CapabilityId::PERSONALITY_MODE,
        labels::PERSONALITY_MODE,
        activation::PERSONALITY_MODE,
        hints::PERSONALITY_MODE,
    )),
];

/// Read-only capability lookup
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    entries: Vec<CapabilitySpec>,
}

impl CapabilityRegistry {
    /// The built-in catalog
    pub fn standard() -> Self {
        Self::from_entries(STANDARD_CAPABILITIES.to_vec())
    }

    pub fn from_entries(entries: Vec<CapabilitySpec>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: CapabilityId) -> Option<&CapabilitySpec> {
        self.entries.iter().find(|spec| spec.id == id)
    }

    /// Look up by the textual id, e.g. from a command line.
    pub fn find(&self, id: &str) -> Option<&CapabilitySpec> {
        self.entries.iter().find(|spec| spec.id.as_str() == id)
    }

    pub fn all(&self) -> &[CapabilitySpec] {
        &self.entries
    }

    /// Unknown ids count as one-shot.
    pub fn is_sticky(&self, id: CapabilityId) -> bool {
        self.get(id).map(CapabilitySpec::is_sticky).unwrap_or(false)
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let registry = CapabilityRegistry::standard();
        let ids: HashSet<_> = registry.all().iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 19);
    }

    #[test]
    fn test_only_persona_and_tutor_are_sticky() {
        let registry = CapabilityRegistry::standard();
        let sticky: Vec<_> = registry
            .all()
            .iter()
            .filter(|s| s.is_sticky())
            .map(|s| s.id)
            .collect();
        assert_eq!(
            sticky,
            vec![CapabilityId::LANGUAGE_TUTOR, CapabilityId::PERSONALITY_MODE]
        );
    }

    #[test]
    fn test_upload_gating() {
        let registry = CapabilityRegistry::standard();
        for spec in registry.all() {
            let gated = spec.id == CapabilityId::EDIT_IMAGE || spec.id == CapabilityId::DESCRIBE_IMAGE;
            assert_eq!(spec.requires_attachment_before_text, gated, "{}", spec.id);
            if gated {
                assert_eq!(
                    spec.interactive_affordance,
                    Some(InteractiveAffordance::RequestUpload)
                );
            }
        }
        assert_eq!(
            registry
                .get(CapabilityId::INTERACTIVE_STORY)
                .and_then(|s| s.interactive_affordance),
            Some(InteractiveAffordance::OfferRandomStart)
        );
    }

    #[test]
    fn test_instruction_overrides() {
        let registry = CapabilityRegistry::standard();
        let overridden = registry
            .all()
            .iter()
            .filter(|s| s.system_instruction_override.is_some())
            .count();
        assert_eq!(overridden, 9);
        assert!(registry
            .get(CapabilityId::WEB_SEARCH)
            .unwrap()
            .system_instruction_override
            .is_none());
    }

    #[test]
    fn test_find_by_text() {
        let registry = CapabilityRegistry::standard();
        assert_eq!(
            registry.find("create_chart").map(|s| s.id),
            Some(CapabilityId::CREATE_CHART)
        );
        assert!(registry.find("time_travel").is_none());
        assert!(!registry.is_sticky(CapabilityId::new("time_travel")));
    }
}
