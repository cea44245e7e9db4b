use super::*;
use crate::config::CameraConfig;
use crate::error::{CameraError, PosecamError, UNSUPPORTED_HOST_MESSAGE};
use crate::events::{EventBus, PosecamEvent};
use std::sync::Arc;

fn create_test_camera_config() -> CameraConfig {
    CameraConfig {
        facing: FacingMode::Front,
        resolution: (32, 24),
        front_device: 0,
        back_device: 1,
    }
}

fn create_session(backend: Arc<MockCameraBackend>) -> (CameraSession, Arc<EventBus>) {
    let event_bus = Arc::new(EventBus::new(64));
    let session = CameraSessionBuilder::new()
        .config(create_test_camera_config())
        .backend(backend)
        .event_bus(Arc::clone(&event_bus))
        .build()
        .unwrap();
    (session, event_bus)
}

#[tokio::test]
async fn test_camera_builder_validation() {
    let result = CameraSessionBuilder::new().build();
    match result {
        Err(PosecamError::System { message }) => {
            assert!(message.contains("Camera configuration must be specified"));
        }
        _ => panic!("Expected system error for missing configuration"),
    }

    let result = CameraSessionBuilder::new()
        .config(create_test_camera_config())
        .build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_start_attaches_stream() {
    let backend = Arc::new(MockCameraBackend::new());
    let (mut session, _bus) = create_session(Arc::clone(&backend));
    assert_eq!(session.state(), CameraSessionState::Idle);

    session.start(FacingMode::Front).await.unwrap();

    assert_eq!(session.state(), CameraSessionState::Ready);
    assert!(session.error().is_none());
    assert_eq!(session.facing_mode(), FacingMode::Front);

    let frame = session.video().current_frame().unwrap();
    assert_eq!((frame.width, frame.height), (32, 24));
}

#[tokio::test]
async fn test_stop_releases_all_tracks_and_restart_succeeds() {
    let backend = Arc::new(MockCameraBackend::new());
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    session.start(FacingMode::Front).await.unwrap();
    assert_eq!(backend.live_streams(), 1);

    session.stop();
    assert_eq!(backend.live_streams(), 0);
    assert_eq!(session.state(), CameraSessionState::Idle);
    assert!(!session.video().has_source());

    // Repeated stop is harmless
    session.stop();

    session.start(FacingMode::Back).await.unwrap();
    assert_eq!(session.state(), CameraSessionState::Ready);
    assert_eq!(backend.live_streams(), 1);
    assert_eq!(backend.issued_streams().len(), 2);
}

#[tokio::test]
async fn test_restart_never_holds_two_streams() {
    let backend = Arc::new(MockCameraBackend::new());
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    for _ in 0..5 {
        session.start(FacingMode::Front).await.unwrap();
        assert_eq!(backend.live_streams(), 1);
    }

    let issued = backend.issued_streams();
    assert_eq!(issued.len(), 5);
    assert!(issued[..4].iter().all(|s| !s.is_active()));
}

#[tokio::test]
async fn test_failures_are_classified() {
    let cases = [
        (PlatformCause::PermissionDenied, CameraError::permission_denied()),
        (PlatformCause::NotFound, CameraError::device_not_found()),
        (PlatformCause::NotReadable, CameraError::device_unreadable()),
        (
            PlatformCause::Other("OverconstrainedError".to_string()),
            CameraError::generic(),
        ),
    ];

    for (cause, expected) in cases {
        let backend = Arc::new(MockCameraBackend::new());
        let (mut session, _bus) = create_session(Arc::clone(&backend));

        backend.fail_next(cause);
        let err = session.start(FacingMode::Front).await.unwrap_err();

        assert_eq!(err, expected);
        assert_eq!(session.state(), CameraSessionState::Error);
        assert_eq!(session.error(), Some(&expected));
        assert!(!session.video().has_source());
    }
}

#[tokio::test]
async fn test_failed_restart_releases_previous_stream() {
    let backend = Arc::new(MockCameraBackend::new());
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    session.start(FacingMode::Front).await.unwrap();
    backend.fail_next(PlatformCause::NotReadable);

    assert!(session.start(FacingMode::Back).await.is_err());
    assert_eq!(backend.live_streams(), 0);
    assert_eq!(session.state(), CameraSessionState::Error);
}

#[tokio::test]
async fn test_dead_stream_is_released_not_attached() {
    let backend = Arc::new(MockCameraBackend::new());
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    backend.deliver_dead_stream_next();
    let err = session.start(FacingMode::Front).await.unwrap_err();

    assert_eq!(err, CameraError::device_unreadable());
    assert!(!session.video().has_source());
    assert_eq!(backend.live_streams(), 0);
}

#[tokio::test]
async fn test_retry_recovers_after_error() {
    let backend = Arc::new(MockCameraBackend::new());
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    backend.fail_next(PlatformCause::PermissionDenied);
    assert!(session.start(FacingMode::Back).await.is_err());

    session.retry().await.unwrap();
    assert_eq!(session.state(), CameraSessionState::Ready);
    assert!(session.error().is_none());
    assert_eq!(session.facing_mode(), FacingMode::Front);
}

#[tokio::test]
async fn test_unsupported_host() {
    let backend = Arc::new(MockCameraBackend::unsupported());
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    let err = session.start(FacingMode::Front).await.unwrap_err();
    assert_eq!(err.message(), UNSUPPORTED_HOST_MESSAGE);
    assert_eq!(session.state(), CameraSessionState::Error);
    assert!(backend.issued_streams().is_empty());
}

#[tokio::test]
async fn test_flip_switches_facing_with_two_cameras() {
    let backend = Arc::new(MockCameraBackend::new());
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    session.start(FacingMode::Front).await.unwrap();
    assert!(session.settle_device_check().await);
    assert!(session.can_flip());

    assert!(session.flip().await.unwrap());
    assert_eq!(session.facing_mode(), FacingMode::Back);
    assert_eq!(backend.live_streams(), 1);

    let latest = backend.issued_streams().pop().unwrap();
    assert_eq!(latest.facing(), FacingMode::Back);
}

#[tokio::test]
async fn test_flip_disabled_with_single_camera() {
    let backend = Arc::new(MockCameraBackend::with_devices(vec![
        DeviceInfo::video_input("only", "Only camera"),
        DeviceInfo {
            id: "mic".to_string(),
            label: "Microphone".to_string(),
            kind: DeviceKind::AudioInput,
        },
    ]));
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    session.start(FacingMode::Front).await.unwrap();
    assert!(!session.settle_device_check().await);

    assert!(!session.flip().await.unwrap());
    assert_eq!(session.facing_mode(), FacingMode::Front);
    assert_eq!(backend.issued_streams().len(), 1);
}

#[tokio::test]
async fn test_flip_disabled_when_enumeration_fails() {
    let backend = Arc::new(MockCameraBackend::new());
    backend.fail_enumeration(Some(PlatformCause::Other("SecurityError".to_string())));
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    session.start(FacingMode::Front).await.unwrap();
    assert!(!session.settle_device_check().await);
    assert!(!session.can_flip());
}

#[tokio::test]
async fn test_flip_disabled_unless_ready() {
    let backend = Arc::new(MockCameraBackend::new());
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    backend.fail_next(PlatformCause::NotFound);
    assert!(session.start(FacingMode::Front).await.is_err());
    session.settle_device_check().await;

    assert!(session.has_multiple_cameras());
    assert!(!session.can_flip());
    assert!(!session.flip().await.unwrap());
}

#[tokio::test]
async fn test_state_changes_are_published() {
    let backend = Arc::new(MockCameraBackend::new());
    let (mut session, bus) = create_session(Arc::clone(&backend));
    let mut rx = bus.subscribe();

    backend.fail_next(PlatformCause::PermissionDenied);
    let _ = session.start(FacingMode::Front).await;

    let mut states = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PosecamEvent::CameraStateChanged { state, error, .. } = event {
            states.push((state, error.is_some()));
        }
    }

    assert_eq!(
        states,
        vec![
            (CameraSessionState::Loading, false),
            (CameraSessionState::Error, true),
        ]
    );
}

#[tokio::test]
async fn test_drop_releases_stream() {
    let backend = Arc::new(MockCameraBackend::new());
    let (mut session, _bus) = create_session(Arc::clone(&backend));

    session.start(FacingMode::Front).await.unwrap();
    let video = session.video();
    drop(session);

    assert_eq!(backend.live_streams(), 0);
    assert!(!video.has_source());
}
