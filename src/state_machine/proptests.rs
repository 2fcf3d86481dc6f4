//! Property-based tests for the state machine
//!
//! These tests drive random action sequences through `transition` and check
//! the invariants that must hold for every sequence.

use super::state::Applied;
use super::*;
use crate::analysis::AnalysisResult;
use crate::i18n::{Language, MessageId};
use crate::transcript::{ImageBlob, Role, TranscriptEntry};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_image() -> impl Strategy<Value = ImageBlob> {
    (
        proptest::collection::vec(any::<u8>(), 1..16),
        prop_oneof![Just("image/png"), Just("image/jpeg"), Just("image/webp")],
    )
        .prop_map(|(bytes, content_type)| ImageBlob::new(bytes, content_type))
}

fn arb_result() -> impl Strategy<Value = AnalysisResult> {
    prop_oneof![
        "[a-z ]{1,20}".prop_map(AnalysisResult::Described),
        "[A-Z0-9 ]{0,10}".prop_map(AnalysisResult::Failed),
    ]
}

fn arb_choice() -> impl Strategy<Value = SocialChoice> {
    prop_oneof![Just(SocialChoice::Yes), Just(SocialChoice::No)]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_image().prop_map(|image| Event::ImageSubmitted { image }),
        arb_choice().prop_map(|choice| Event::SocialChoice { choice }),
        "[a-z ]{0,12}".prop_map(|text| Event::TextSubmitted { text }),
        arb_result().prop_map(|result| Event::DescribeCompleted { result }),
        arb_result().prop_map(|result| Event::PostsCompleted { result }),
    ]
}

/// Feed an event through the pure transition and fold it in, as the runtime does
fn step_once(state: &mut ConversationState, event: Event) -> Option<Applied> {
    let completes_call = !event.is_user_action();
    transition(state, event)
        .ok()
        .map(|result| state.apply(result, completes_call))
}

fn is_consistent(state: &ConversationState) -> bool {
    match state.step() {
        Step::AnalyzingImage => state.pending() == Some(PendingCall::DescribeImage),
        Step::AwaitingSocialConfirmation => {
            state.description().is_some()
                && matches!(state.pending(), None | Some(PendingCall::GeneratePosts))
        }
        Step::Idle | Step::AwaitingImage => state.pending().is_none(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // The transcript only ever grows, and nothing already in it changes
    #[test]
    fn prop_transcript_is_append_only(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ConversationState::new(Language::En);

        for event in events {
            let before: Vec<TranscriptEntry> = state.transcript().entries().to_vec();
            step_once(&mut state, event);
            let after = state.transcript().entries();

            prop_assert!(after.len() >= before.len());
            prop_assert_eq!(&after[..before.len()], &before[..]);
        }
    }

    // Step, pending call and stored description never disagree
    #[test]
    fn prop_state_stays_consistent(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ConversationState::new(Language::En);
        prop_assert!(is_consistent(&state));

        for event in events {
            step_once(&mut state, event);
            prop_assert!(is_consistent(&state), "inconsistent: {:?}", state);
        }
    }

    // Affordances are exactly the function of the current step
    #[test]
    fn prop_affordances_follow_step(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ConversationState::new(Language::Pt);

        for event in events {
            step_once(&mut state, event);
            prop_assert_eq!(state.affordances(), state.step().affordances());
        }
    }

    // A remote call is only ever scheduled when none is in flight
    #[test]
    fn prop_at_most_one_call_in_flight(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ConversationState::new(Language::En);

        for event in events {
            let was_pending = state.pending().is_some();
            if let Some(applied) = step_once(&mut state, event) {
                if applied.remote_call.is_some() {
                    prop_assert!(!was_pending);
                }
            }
        }
    }

    // Image submission is ignored unless awaiting an image
    #[test]
    fn prop_image_only_accepted_when_awaiting(
        events in proptest::collection::vec(arb_event(), 0..20),
        image in arb_image(),
    ) {
        let mut state = ConversationState::new(Language::En);
        for event in events {
            step_once(&mut state, event);
        }

        let accepted = transition(&state, Event::ImageSubmitted { image }).is_ok();
        prop_assert_eq!(accepted, state.step() == Step::AwaitingImage);
    }

    // Declining always adds one user and one assistant entry and waits for an image
    #[test]
    fn prop_decline_always_returns_to_awaiting_image(
        description in "[a-z ]{1,20}",
        image in arb_image(),
    ) {
        let mut state = ConversationState::new(Language::Es);
        step_once(&mut state, Event::ImageSubmitted { image });
        step_once(&mut state, Event::DescribeCompleted {
            result: AnalysisResult::Described(description),
        });

        let applied = step_once(&mut state, Event::SocialChoice { choice: SocialChoice::No });
        let applied = applied.expect("decline accepted");
        let entries = state.transcript().entries();

        prop_assert_eq!(applied.appended.len(), 2);
        prop_assert_eq!(entries[applied.appended.start].role, Role::User);
        prop_assert_eq!(entries[applied.appended.start + 1].role, Role::Assistant);
        prop_assert_eq!(state.step(), Step::AwaitingImage);
    }

    // The posts request always carries the most recent successful description
    #[test]
    fn prop_posts_use_latest_description(
        descriptions in proptest::collection::vec("[a-z]{1,12}", 1..5),
        image in arb_image(),
    ) {
        let mut state = ConversationState::new(Language::En);

        for description in &descriptions {
            step_once(&mut state, Event::ImageSubmitted { image: image.clone() });
            step_once(&mut state, Event::DescribeCompleted {
                result: AnalysisResult::Failed("flaky".to_string()),
            });
            step_once(&mut state, Event::ImageSubmitted { image: image.clone() });
            step_once(&mut state, Event::DescribeCompleted {
                result: AnalysisResult::Described(description.clone()),
            });

            let applied = step_once(&mut state, Event::SocialChoice { choice: SocialChoice::Yes })
                .expect("yes accepted");
            prop_assert_eq!(
                applied.remote_call,
                Some(Effect::GeneratePosts { description: description.clone() })
            );

            step_once(&mut state, Event::PostsCompleted {
                result: AnalysisResult::Described("posts".to_string()),
            });
            prop_assert_eq!(state.step(), Step::AwaitingImage);
        }
    }

    // Successful description: one user entry then two assistant entries
    #[test]
    fn prop_image_round_adds_user_then_two_assistant_entries(
        image in arb_image(),
        description in "[a-z ]{1,20}",
    ) {
        let mut state = ConversationState::new(Language::En);

        let submitted = step_once(&mut state, Event::ImageSubmitted { image }).expect("accepted");
        prop_assert_eq!(state.step(), Step::AnalyzingImage);
        let completed = step_once(&mut state, Event::DescribeCompleted {
            result: AnalysisResult::Described(description),
        }).expect("accepted");

        let entries = state.transcript().entries();
        let roles: Vec<Role> = (submitted.appended.start..completed.appended.end)
            .map(|i| entries[i].role)
            .collect();
        prop_assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Assistant]);
        prop_assert_eq!(
            entries[completed.appended.start].message_id(),
            Some(MessageId::ImageDescriptionPrefix)
        );
        prop_assert_eq!(state.step(), Step::AwaitingSocialConfirmation);
    }
}
