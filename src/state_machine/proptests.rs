//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::service::{ChatReply, ServiceErrorKind, StartReply};
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new(Duration::from_millis(10))
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z ?]{1,20}".prop_filter("non-blank", |s| !s.trim().is_empty())
}

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t\n]{0,5}"
}

fn arb_session() -> impl Strategy<Value = Session> {
    ("[a-z0-9]{6,12}", arb_text()).prop_map(|(session_id, topic)| Session { session_id, topic })
}

fn arb_transcript() -> impl Strategy<Value = Transcript> {
    proptest::collection::vec((any::<bool>(), arb_text()), 0..5).prop_map(|entries| {
        let mut transcript = Transcript::default();
        for (is_agent, text) in entries {
            if is_agent {
                transcript.push_agent(text);
            } else {
                transcript.push_user(text);
            }
        }
        transcript
    })
}

fn arb_phase() -> impl Strategy<Value = Phase> {
    prop_oneof![
        Just(Phase::Idle),
        arb_text().prop_map(|topic| Phase::Starting { topic }),
        (arb_session(), arb_text(), any::<bool>(), 1u32..12).prop_map(
            |(session, question, answer_in_flight, questions_asked)| Phase::Chatting {
                session,
                question,
                answer_in_flight,
                questions_asked,
            }
        ),
        (arb_session(), arb_text())
            .prop_map(|(session, report)| Phase::ReportPending { session, report }),
        (arb_session(), arb_text(), any::<bool>()).prop_map(|(session, report, downloading)| {
            Phase::ReportReady {
                session,
                report,
                downloading,
                last_saved: None,
            }
        }),
    ]
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    (arb_phase(), arb_transcript()).prop_map(|(phase, transcript)| SessionState { phase, transcript })
}

fn arb_error_kind() -> impl Strategy<Value = ServiceErrorKind> {
    prop_oneof![
        Just(ServiceErrorKind::Network),
        Just(ServiceErrorKind::Timeout),
        Just(ServiceErrorKind::Decode),
        Just(ServiceErrorKind::Remote),
        Just(ServiceErrorKind::Unknown),
    ]
}

fn arb_chat_reply() -> impl Strategy<Value = ChatReply> {
    prop_oneof![
        arb_text().prop_map(ChatReply::NextQuestion),
        arb_text().prop_map(ChatReply::Report),
        arb_text().prop_map(ChatReply::Failure),
    ]
}

fn arb_start_reply() -> impl Strategy<Value = StartReply> {
    prop_oneof![
        ("[a-z0-9]{6,12}", proptest::option::of(arb_text()))
            .prop_map(|(session_id, question)| StartReply::Started { session_id, question }),
        arb_text().prop_map(StartReply::Failure),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        prop_oneof![arb_text(), arb_blank()].prop_map(|topic| Event::StartRequested { topic }),
        prop_oneof![arb_text(), arb_blank()].prop_map(|text| Event::AnswerSubmitted { text }),
        Just(Event::DownloadRequested),
        arb_start_reply().prop_map(Event::StartResolved),
        arb_text().prop_map(|message| Event::StartFailed { message }),
        arb_chat_reply().prop_map(Event::ChatResolved),
        arb_text().prop_map(|message| Event::ChatFailed { message }),
        Just(Event::ReportDelayElapsed),
        "/tmp/[a-z]{4}\\.pdf".prop_map(|p| Event::ArtifactSaved { path: p.into() }),
        (arb_text(), arb_error_kind())
            .prop_map(|(message, kind)| Event::DownloadFailed { message, kind }),
        arb_text().prop_map(|message| Event::ArtifactSaveFailed { message }),
    ]
}

// ============================================================================
// Invariant Checks
// ============================================================================

/// A session id exists exactly in the phases after a successful start
fn session_matches_phase(state: &SessionState) -> bool {
    match state.phase_kind() {
        PhaseKind::Idle | PhaseKind::Starting => state.session_id().is_none(),
        PhaseKind::Chatting | PhaseKind::ReportPending | PhaseKind::ReportReady => {
            state.session_id().is_some()
        }
    }
}

fn pending_only_while_chatting(state: &SessionState) -> bool {
    state.pending_question().is_none() || state.phase_kind() == PhaseKind::Chatting
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: structural invariants hold along any event sequence
    #[test]
    fn prop_transitions_preserve_invariants(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = SessionState::default();
        let ctx = test_context();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                state = result.new_state;
                prop_assert!(session_matches_phase(&state), "Session/phase mismatch: {:?}", state);
                prop_assert!(pending_only_while_chatting(&state), "Stray pending question: {:?}", state);
            }
        }
    }

    // Invariant 2: the transcript only grows, and old entries are a prefix
    #[test]
    fn prop_transcript_is_append_only(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_context(), event) {
            let before = state.transcript.entries();
            let after = result.new_state.transcript.entries();
            prop_assert!(after.len() >= before.len());
            prop_assert_eq!(&after[..before.len()], before);
            prop_assert!(after.len() - before.len() <= 1, "At most one entry per event");
        }
    }

    // Invariant 3: a rejected action changes nothing because there is no new state
    #[test]
    fn prop_blank_topic_is_noop(topic in arb_blank()) {
        let result = transition(&SessionState::default(), &test_context(), Event::StartRequested { topic });
        prop_assert_eq!(result.unwrap_err(), TransitionError::EmptyInput);
    }

    // Invariant 4: a non-empty topic always moves Idle to Starting with one request
    #[test]
    fn prop_start_enters_starting(topic in arb_text()) {
        let result = transition(&SessionState::default(), &test_context(), Event::StartRequested { topic: topic.clone() }).unwrap();
        prop_assert_eq!(result.new_state.phase_kind(), PhaseKind::Starting);
        prop_assert_eq!(result.effects, vec![Effect::RequestStart { topic }]);
    }

    // Invariant 5: every start outcome lands in Chatting with a question or Idle with one message
    #[test]
    fn prop_start_resolves_to_chatting_or_idle(topic in arb_text(), reply in arb_start_reply()) {
        let starting = SessionState { phase: Phase::Starting { topic }, transcript: Transcript::default() };
        let state = transition(&starting, &test_context(), Event::StartResolved(reply)).unwrap().new_state;
        match state.phase_kind() {
            PhaseKind::Chatting => {
                prop_assert!(state.pending_question().is_some());
                prop_assert_eq!(state.transcript.len(), 1);
            }
            PhaseKind::Idle => {
                prop_assert_eq!(state.transcript.len(), 1);
                prop_assert_eq!(state.transcript.last().unwrap().origin, Origin::Agent);
            }
            other => prop_assert!(false, "Unexpected phase {:?}", other),
        }
    }

    // Invariant 6: an answer is recorded before any reply exists
    #[test]
    fn prop_answer_recorded_immediately(session in arb_session(), question in arb_text(), text in arb_text()) {
        let state = SessionState {
            phase: Phase::Chatting { session, question, answer_in_flight: false, questions_asked: 1 },
            transcript: Transcript::default(),
        };
        let result = transition(&state, &test_context(), Event::AnswerSubmitted { text: text.clone() }).unwrap();
        let last = result.new_state.transcript.last().unwrap();
        prop_assert_eq!(last.origin, Origin::User);
        prop_assert_eq!(&last.text, &text);
        prop_assert!(result.new_state.is_answering());
    }

    // Invariant 7: each chat reply produces exactly one kind of outcome
    #[test]
    fn prop_chat_reply_single_outcome(session in arb_session(), question in arb_text(), reply in arb_chat_reply()) {
        let state = SessionState {
            phase: Phase::Chatting { session, question: question.clone(), answer_in_flight: true, questions_asked: 3 },
            transcript: Transcript::default(),
        };
        let result = transition(&state, &test_context(), Event::ChatResolved(reply.clone())).unwrap();
        let next = result.new_state;
        match reply {
            ChatReply::NextQuestion(q) => {
                prop_assert_eq!(next.pending_question(), Some(q.as_str()));
                prop_assert_eq!(next.questions_asked(), 4);
                prop_assert!(result.effects.is_empty());
            }
            ChatReply::Report(_) => {
                prop_assert_eq!(next.phase_kind(), PhaseKind::ReportPending);
                prop_assert!(next.transcript.is_empty());
                let is_schedule = matches!(result.effects.as_slice(), [Effect::ScheduleReportReady { .. }]);
                prop_assert!(is_schedule);
            }
            ChatReply::Failure(m) => {
                prop_assert_eq!(next.pending_question(), Some(question.as_str()));
                prop_assert_eq!(&next.transcript.last().unwrap().text, &remote_error_message(&m));
                prop_assert!(result.effects.is_empty());
            }
        }
    }

    // Invariant 8: download outside ReportReady is rejected, never a panic
    #[test]
    fn prop_download_requires_report_ready(state in arb_state()) {
        let result = transition(&state, &test_context(), Event::DownloadRequested);
        match &state.phase {
            Phase::ReportReady { downloading: false, .. } => prop_assert!(result.is_ok()),
            Phase::ReportReady { downloading: true, .. } => {
                prop_assert_eq!(result.unwrap_err(), TransitionError::Busy("Download"));
            }
            _ => prop_assert_eq!(result.unwrap_err(), TransitionError::ReportNotReady),
        }
    }

    // Invariant 9: once ready, nothing leaves ReportReady
    #[test]
    fn prop_report_ready_is_resting(state in arb_state(), event in arb_event()) {
        if state.phase_kind() == PhaseKind::ReportReady {
            if let Ok(result) = transition(&state, &test_context(), event) {
                prop_assert_eq!(result.new_state.phase_kind(), PhaseKind::ReportReady);
                prop_assert_eq!(result.new_state.session_id(), state.session_id());
            }
        }
    }

    // Invariant 10: nothing returns to Idle once a session exists
    #[test]
    fn prop_idle_not_reachable_from_session(state in arb_state(), event in arb_event()) {
        if state.session_id().is_some() {
            if let Ok(result) = transition(&state, &test_context(), event) {
                prop_assert_ne!(result.new_state.phase_kind(), PhaseKind::Idle);
            }
        }
    }
}
