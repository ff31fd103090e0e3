//! Screen lifecycle state machine.
//!
//! Host callbacks arrive as [`ScreenEvent`]s. [`transition`] maps the
//! current state and one event to the next state plus the side effects
//! the screen must perform. It touches nothing itself.

use crate::contract::ScanResult;
use crate::permission::{PermissionState, PERMISSION_DENIED_NOTICE, REQUEST_CAMERA_PERMISSIONS};

/// Lifecycle position of one screen instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Constructed, not yet shown.
    Created,
    /// Waiting for the answer to a permission request.
    AwaitingPermission,
    /// Camera bound (or binding attempted) and frames flowing.
    CameraActive,
    /// A payload was accepted and is being returned.
    Reporting,
    /// Finishing without a value.
    Cancelled,
    /// Torn down; every further event is ignored.
    Terminated,
}

/// Inputs to the screen, from the host or from the screen's own workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    /// Screen shown; carries the permission state checked at that moment.
    Start {
        /// Access state at creation.
        permission: PermissionState,
    },
    /// Answer to a permission request.
    PermissionResult {
        /// Code the request was tagged with.
        request_code: i32,
        /// Access state after the answer.
        permission: PermissionState,
    },
    /// The reporter accepted a decoded payload.
    ResultReady(String),
    /// The user backed out.
    CancelRequested,
    /// The result has been recorded.
    Finished,
    /// The host destroyed the screen.
    Destroyed,
}

/// Side effects requested by a transition, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the provider for camera access.
    RequestPermission {
        /// Code to tag the request with.
        request_code: i32,
    },
    /// Show a short notice to the user.
    ShowNotice(&'static str),
    /// Unbind any running session, then bind a new one.
    StartCamera,
    /// Record what the caller receives.
    Finish(ScanResult),
    /// Close the reporter, unbind the camera and stop the worker.
    Teardown,
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the event.
    pub state: ScreenState,
    /// Effects to apply, in order.
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: ScreenState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn to(state: ScreenState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

fn denied() -> Transition {
    Transition::to(
        ScreenState::Cancelled,
        vec![
            Effect::ShowNotice(PERMISSION_DENIED_NOTICE),
            Effect::Finish(ScanResult::Cancelled),
        ],
    )
}

/// Computes the next state and effects for `event` in `state`.
pub fn transition(state: ScreenState, event: &ScreenEvent) -> Transition {
    use ScreenState::*;

    match (state, event) {
        (Terminated, _) => Transition::stay(Terminated),
        (_, ScreenEvent::Destroyed) => Transition::to(Terminated, vec![Effect::Teardown]),

        (Created, ScreenEvent::Start { permission }) => {
            if permission.is_granted() {
                Transition::to(CameraActive, vec![Effect::StartCamera])
            } else {
                Transition::to(
                    AwaitingPermission,
                    vec![Effect::RequestPermission {
                        request_code: REQUEST_CAMERA_PERMISSIONS,
                    }],
                )
            }
        }

        (
            AwaitingPermission | CameraActive,
            ScreenEvent::PermissionResult {
                request_code,
                permission,
            },
        ) => {
            if *request_code != REQUEST_CAMERA_PERMISSIONS {
                Transition::stay(state)
            } else if permission.is_granted() {
                // A late grant rebinds; the session manager unbinds first.
                Transition::to(CameraActive, vec![Effect::StartCamera])
            } else {
                denied()
            }
        }

        (CameraActive, ScreenEvent::ResultReady(text)) => Transition::to(
            Reporting,
            vec![Effect::Finish(ScanResult::Scanned(text.clone()))],
        ),

        (Created | AwaitingPermission | CameraActive, ScreenEvent::CancelRequested) => {
            Transition::to(Cancelled, vec![Effect::Finish(ScanResult::Cancelled)])
        }

        (Reporting | Cancelled, ScreenEvent::Finished) => {
            Transition::to(Terminated, vec![Effect::Teardown])
        }

        _ => Transition::stay(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn granted_result(code: i32) -> ScreenEvent {
        ScreenEvent::PermissionResult {
            request_code: code,
            permission: PermissionState::Granted,
        }
    }

    #[test]
    fn test_pre_granted_skips_request() {
        let t = transition(
            ScreenState::Created,
            &ScreenEvent::Start {
                permission: PermissionState::Granted,
            },
        );
        assert_eq!(t.state, ScreenState::CameraActive);
        assert_eq!(t.effects, vec![Effect::StartCamera]);
    }

    #[test]
    fn test_missing_permission_is_requested() {
        let t = transition(
            ScreenState::Created,
            &ScreenEvent::Start {
                permission: PermissionState::Denied,
            },
        );
        assert_eq!(t.state, ScreenState::AwaitingPermission);
        assert_eq!(
            t.effects,
            vec![Effect::RequestPermission { request_code: 10 }]
        );
    }

    #[test]
    fn test_denial_shows_notice_and_cancels() {
        let t = transition(
            ScreenState::AwaitingPermission,
            &ScreenEvent::PermissionResult {
                request_code: 10,
                permission: PermissionState::Denied,
            },
        );
        assert_eq!(t.state, ScreenState::Cancelled);
        assert_eq!(
            t.effects,
            vec![
                Effect::ShowNotice("Camera permission required"),
                Effect::Finish(ScanResult::Cancelled),
            ]
        );
    }

    #[test]
    fn test_foreign_request_code_ignored() {
        let t = transition(ScreenState::AwaitingPermission, &granted_result(11));
        assert_eq!(t, Transition::stay(ScreenState::AwaitingPermission));
    }

    #[test]
    fn test_grant_starts_camera() {
        let t = transition(ScreenState::AwaitingPermission, &granted_result(10));
        assert_eq!(t.state, ScreenState::CameraActive);
        assert_eq!(t.effects, vec![Effect::StartCamera]);
    }

    #[test]
    fn test_result_finishes_then_terminates() {
        let t = transition(
            ScreenState::CameraActive,
            &ScreenEvent::ResultReady("https://example.com".into()),
        );
        assert_eq!(t.state, ScreenState::Reporting);
        assert_eq!(
            t.effects,
            vec![Effect::Finish(ScanResult::Scanned(
                "https://example.com".into()
            ))]
        );

        let t = transition(t.state, &ScreenEvent::Finished);
        assert_eq!(t.state, ScreenState::Terminated);
        assert_eq!(t.effects, vec![Effect::Teardown]);
    }

    #[test]
    fn test_second_result_ignored_while_reporting() {
        let t = transition(
            ScreenState::Reporting,
            &ScreenEvent::ResultReady("late".into()),
        );
        assert_eq!(t, Transition::stay(ScreenState::Reporting));
    }

    #[test]
    fn test_destroy_tears_down() {
        let t = transition(ScreenState::CameraActive, &ScreenEvent::Destroyed);
        assert_eq!(t.state, ScreenState::Terminated);
        assert_eq!(t.effects, vec![Effect::Teardown]);
    }

    fn any_event() -> impl Strategy<Value = ScreenEvent> {
        let permission = prop_oneof![
            Just(PermissionState::Granted),
            Just(PermissionState::Denied)
        ];
        prop_oneof![
            permission
                .clone()
                .prop_map(|permission| ScreenEvent::Start { permission }),
            (9..12i32, permission).prop_map(|(request_code, permission)| {
                ScreenEvent::PermissionResult {
                    request_code,
                    permission,
                }
            }),
            "[a-z]{1,6}".prop_map(ScreenEvent::ResultReady),
            Just(ScreenEvent::CancelRequested),
            Just(ScreenEvent::Finished),
            Just(ScreenEvent::Destroyed),
        ]
    }

    proptest! {
        #[test]
        fn terminated_is_absorbing(events in proptest::collection::vec(any_event(), 0..16)) {
            for event in &events {
                let t = transition(ScreenState::Terminated, event);
                prop_assert_eq!(t.state, ScreenState::Terminated);
                prop_assert!(t.effects.is_empty());
            }
        }

        #[test]
        fn at_most_one_finish(events in proptest::collection::vec(any_event(), 0..32)) {
            let mut state = ScreenState::Created;
            let mut finishes = 0;
            let mut teardowns = 0;
            for event in &events {
                let t = transition(state, event);
                finishes += t.effects.iter().filter(|e| matches!(e, Effect::Finish(_))).count();
                teardowns += t.effects.iter().filter(|e| matches!(e, Effect::Teardown)).count();
                state = t.state;
            }
            prop_assert!(finishes <= 1);
            prop_assert!(teardowns <= 1);
        }

        #[test]
        fn notice_only_with_cancel(events in proptest::collection::vec(any_event(), 0..32)) {
            let mut state = ScreenState::Created;
            for event in &events {
                let t = transition(state, event);
                if t.effects.iter().any(|e| matches!(e, Effect::ShowNotice(_))) {
                    prop_assert_eq!(t.state, ScreenState::Cancelled);
                    prop_assert!(t.effects.contains(&Effect::Finish(ScanResult::Cancelled)));
                }
                state = t.state;
            }
        }
    }
}
