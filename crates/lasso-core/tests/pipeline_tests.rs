//! End-to-end pipeline tests
//!
//! These drive full selection sessions with a scripted event source and the
//! mock capture backend: no display, no external tools. Each test pins one
//! behavioral property of the pipeline: mode fallback, cancellation paths,
//! extraction results, and the live-mode conceal-before-recapture ordering.

use std::sync::{Arc, Mutex};

use lasso_core::capture::mock::{CallLog, MockBackend};
use lasso_core::capture::{CaptureBackend, backend_for};
use lasso_core::error::SelectError;
use lasso_core::extract::ExtractOptions;
use lasso_core::model::{
    BackendKind, CaptureMode, Compositor, LogicalPoint, LogicalRect, Monitor, PhysicalRect,
    SessionEnvironment,
};
use lasso_core::overlay::{Modifiers, OverlayEvent, ScriptedEvents};
use lasso_core::session::{SelectionSession, SessionOutcome, run_session};

/// Single unscaled 100x100 monitor, backend list populated
fn test_env(layer_shell: bool) -> SessionEnvironment {
    SessionEnvironment {
        compositor: if layer_shell {
            Compositor::Hyprland
        } else {
            Compositor::Gnome
        },
        backends: vec![BackendKind::WlrScreencopy],
        layer_shell,
        monitors: vec![Monitor {
            id:       0,
            name:     "TEST-1".to_string(),
            scale:    1.0,
            logical:  LogicalRect::new(0.0, 0.0, 100.0, 100.0),
            physical: PhysicalRect::new(0, 0, 100, 100),
        }],
    }
}

fn mock_backend() -> MockBackend {
    MockBackend::new(PhysicalRect::new(0, 0, 100, 100))
}

#[test]
fn live_request_without_layer_shell_falls_back_to_static() {
    let session = SelectionSession::new(test_env(false), CaptureMode::Live);
    let effective = session.effective_mode();
    assert_eq!(effective.mode, CaptureMode::Static);
    assert!(effective.fell_back);
}

#[test]
fn live_request_with_layer_shell_stays_live() {
    let session = SelectionSession::new(test_env(true), CaptureMode::Live);
    let effective = session.effective_mode();
    assert_eq!(effective.mode, CaptureMode::Live);
    assert!(!effective.fell_back);
}

#[tokio::test]
async fn rectangle_extraction_from_static_session() {
    let events = ScriptedEvents::drag(
        &[(10.0, 10.0), (30.0, 20.0), (50.0, 40.0)],
        Modifiers::ctrl(),
        (100.0, 100.0),
    );
    let backend = mock_backend();

    let selection = run_session(test_env(false), CaptureMode::Static, events, &backend)
        .await
        .unwrap()
        .expect("rectangle drag must produce a selection");

    assert_eq!((selection.width(), selection.height()), (40, 30));
    assert!(selection.image.pixels().all(|p| p[3] == 255));
}

#[tokio::test]
async fn ellipse_extraction_masks_corners() {
    let events = ScriptedEvents::drag(
        &[(0.0, 0.0), (20.0, 10.0)],
        Modifiers::ctrl_shift(),
        (100.0, 100.0),
    );
    let backend = mock_backend();

    let selection = run_session(test_env(false), CaptureMode::Static, events, &backend)
        .await
        .unwrap()
        .expect("ellipse drag must produce a selection");

    assert_eq!((selection.width(), selection.height()), (20, 10));
    assert_eq!(selection.image.get_pixel(0, 0)[3], 0);
    assert_eq!(selection.image.get_pixel(10, 5)[3], 255);
}

#[tokio::test]
async fn freeform_extraction_masks_outside_polygon() {
    // A right triangle over the top-left of the screen
    let events = ScriptedEvents::drag(
        &[(0.0, 0.0), (40.0, 0.0), (0.0, 40.0)],
        Modifiers::none(),
        (100.0, 100.0),
    );
    let backend = mock_backend();

    let selection = run_session(test_env(false), CaptureMode::Static, events, &backend)
        .await
        .unwrap()
        .expect("freeform drag must produce a selection");

    assert_eq!((selection.width(), selection.height()), (40, 40));
    assert_eq!(selection.image.get_pixel(2, 2)[3], 255);
    assert_eq!(selection.image.get_pixel(39, 39)[3], 0);
}

#[tokio::test]
async fn freeform_under_three_points_cancels() {
    let events = ScriptedEvents::drag(
        &[(10.0, 10.0), (40.0, 10.0)],
        Modifiers::none(),
        (100.0, 100.0),
    );
    let backend = mock_backend();

    let outcome = run_session(test_env(false), CaptureMode::Static, events, &backend)
        .await
        .unwrap();
    assert!(outcome.is_none());
}

/// Consumer that counts deliveries, for asserting none happened
#[derive(Default)]
struct CountingConsumer {
    deliveries: Mutex<usize>,
}

impl lasso_core::handoff::SelectionConsumer for CountingConsumer {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn deliver(&self, _selection: lasso_core::ExtractedSelection) -> Result<(), SelectError> {
        *self.deliveries.lock().unwrap() += 1;
        Ok(())
    }
}

#[tokio::test]
async fn escape_mid_drag_cancels_with_no_handoff() {
    for modifiers in [Modifiers::none(), Modifiers::ctrl(), Modifiers::ctrl_shift()] {
        let events = ScriptedEvents::new(
            vec![
                OverlayEvent::PointerDown {
                    point: LogicalPoint::new(10.0, 10.0),
                    modifiers,
                },
                OverlayEvent::PointerMove {
                    point: LogicalPoint::new(60.0, 60.0),
                },
                OverlayEvent::KeyEscape,
                // Anything after Escape must not resurrect the session
                OverlayEvent::PointerUp {
                    point: LogicalPoint::new(60.0, 60.0),
                },
            ],
            (100.0, 100.0),
        );
        let backend = mock_backend();
        let consumer = CountingConsumer::default();

        let outcome = run_session(test_env(false), CaptureMode::Static, events, &backend)
            .await
            .unwrap();
        if let Some(selection) = outcome {
            lasso_core::handoff::hand_off(selection, &consumer).unwrap();
        }
        assert_eq!(*consumer.deliveries.lock().unwrap(), 0, "escape must yield zero handoffs");
    }
}

#[tokio::test]
async fn modifier_switch_mid_drag_becomes_rectangle() {
    let events = ScriptedEvents::new(
        vec![
            OverlayEvent::PointerDown {
                point:     LogicalPoint::new(10.0, 10.0),
                modifiers: Modifiers::none(),
            },
            OverlayEvent::PointerMove {
                point: LogicalPoint::new(25.0, 18.0),
            },
            OverlayEvent::ModifiersChanged {
                modifiers: Modifiers::ctrl(),
            },
            OverlayEvent::PointerMove {
                point: LogicalPoint::new(50.0, 40.0),
            },
            OverlayEvent::PointerUp {
                point: LogicalPoint::new(50.0, 40.0),
            },
        ],
        (100.0, 100.0),
    );
    let backend = mock_backend();

    let selection = run_session(test_env(false), CaptureMode::Static, events, &backend)
        .await
        .unwrap()
        .expect("reclassified drag must produce a selection");

    // Anchor preserved at the original down point: bounds (10,10)-(50,40),
    // and a rectangle is fully opaque
    assert_eq!((selection.width(), selection.height()), (40, 30));
    assert!(selection.image.pixels().all(|p| p[3] == 255));
}

#[tokio::test]
async fn enter_selects_whole_surface() {
    let events = ScriptedEvents::new(vec![OverlayEvent::KeyEnter], (100.0, 100.0));
    let backend = mock_backend();

    let selection = run_session(test_env(false), CaptureMode::Static, events, &backend)
        .await
        .unwrap()
        .expect("enter must select the whole surface");
    assert_eq!((selection.width(), selection.height()), (100, 100));
}

#[tokio::test]
async fn closed_surface_cancels() {
    let events = ScriptedEvents::new(vec![], (100.0, 100.0));
    let backend = mock_backend();
    let outcome = run_session(test_env(false), CaptureMode::Static, events, &backend)
        .await
        .unwrap();
    assert!(outcome.is_none());
}

#[tokio::test]
async fn live_session_conceals_before_recapture() {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let events = ScriptedEvents::drag(
        &[(10.0, 10.0), (50.0, 40.0)],
        Modifiers::ctrl(),
        (100.0, 100.0),
    )
    .with_log(log.clone());
    let probe = events.probe();
    let backend = mock_backend().with_log(log.clone());

    let selection = run_session(test_env(true), CaptureMode::Live, events, &backend)
        .await
        .unwrap()
        .expect("live rectangle drag must produce a selection");

    assert_eq!((selection.width(), selection.height()), (40, 30));
    assert!(probe.hidden());
    // The surface was hidden strictly before the post-draw re-capture, and
    // no full-screen pre-capture happened in live mode.
    assert_eq!(*log.lock().unwrap(), vec!["hide", "capture_region"]);
}

#[tokio::test]
async fn static_session_precaptures_before_events() {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let events = ScriptedEvents::drag(
        &[(10.0, 10.0), (50.0, 40.0)],
        Modifiers::ctrl(),
        (100.0, 100.0),
    )
    .with_log(log.clone());
    let backend = mock_backend().with_log(log.clone());

    run_session(test_env(false), CaptureMode::Static, events, &backend)
        .await
        .unwrap()
        .expect("static rectangle drag must produce a selection");

    // Full-screen capture happens before any overlay interaction, and the
    // pre-captured frame serves extraction with no second capture call.
    let calls = log.lock().unwrap();
    assert_eq!(calls[0], "capture_full_screen");
    assert!(!calls.iter().any(|c| c == "capture_region"));
}

#[tokio::test]
async fn capture_failure_is_fatal_not_retried() {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let backend = MockBackend::new(PhysicalRect::new(0, 0, 100, 100))
        .with_log(log.clone())
        .with_error(SelectError::CaptureUnavailable {
            backend: BackendKind::WlrScreencopy,
            reason:  "simulated".to_string(),
        });
    let events = ScriptedEvents::drag(
        &[(10.0, 10.0), (50.0, 40.0)],
        Modifiers::ctrl(),
        (100.0, 100.0),
    );

    let result = run_session(test_env(false), CaptureMode::Static, events, &backend).await;
    assert!(matches!(result, Err(SelectError::CaptureUnavailable { .. })));
    // Exactly one capture attempt: the session never retries on its own
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn hidpi_session_maps_logical_to_physical() {
    // One monitor at scale 2: a 2560x1440 panel drawn at 1280x720 logical
    let env = SessionEnvironment {
        compositor:  Compositor::Hyprland,
        backends:    vec![BackendKind::WlrScreencopy],
        layer_shell: true,
        monitors:    vec![Monitor {
            id:       0,
            name:     "eDP-1".to_string(),
            scale:    2.0,
            logical:  LogicalRect::new(0.0, 0.0, 1280.0, 720.0),
            physical: PhysicalRect::new(0, 0, 2560, 1440),
        }],
    };
    let backend = MockBackend::new(PhysicalRect::new(0, 0, 2560, 1440));
    let events = ScriptedEvents::drag(
        &[(100.0, 100.0), (300.0, 250.0)],
        Modifiers::ctrl(),
        (1280.0, 720.0),
    );

    let selection = run_session(env, CaptureMode::Static, events, &backend)
        .await
        .unwrap()
        .expect("scaled drag must produce a selection");

    // 200x150 logical at scale 2 = 400x300 physical pixels
    assert_eq!((selection.width(), selection.height()), (400, 300));
}

#[tokio::test]
async fn session_extract_options_are_applied() {
    let events = ScriptedEvents::drag(
        &[(0.0, 0.0), (80.0, 80.0)],
        Modifiers::ctrl(),
        (100.0, 100.0),
    );
    let backend = mock_backend();
    let session = SelectionSession::new(test_env(false), CaptureMode::Static)
        .with_extract_options(ExtractOptions {
            feather:       0.0,
            max_dimension: Some(40),
        });

    let outcome = session.run(events, &backend).await.unwrap();
    match outcome {
        SessionOutcome::Completed(selection) => {
            assert_eq!((selection.width(), selection.height()), (40, 40));
        }
        SessionOutcome::Cancelled => panic!("expected completion"),
    }
}

#[test]
fn backend_dispatch_matches_catalog() {
    let env = test_env(true);
    let backend = backend_for(&env).unwrap();
    assert_eq!(backend.kind(), BackendKind::WlrScreencopy);

    let mut empty = test_env(true);
    empty.backends.clear();
    assert!(matches!(
        backend_for(&empty),
        Err(SelectError::NoBackendAvailable)
    ));
}
