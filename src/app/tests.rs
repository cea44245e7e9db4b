use super::*;
use crate::camera::{CameraSessionState, FacingMode, MockCameraBackend, PlatformCause};
use crate::config::PosecamConfig;
use crate::detector::{ScriptedLandmarker, ScriptedLoader};
use crate::events::PosecamEvent;
use crate::pose::NormalizedLandmark;
use crate::templates::TemplateStore;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio::sync::broadcast;

fn create_test_config(temp_dir: &TempDir) -> PosecamConfig {
    let mut config = PosecamConfig::default();
    config.camera.resolution = (32, 24);
    config.overlay.display_resolution = (64, 48);
    config.overlay.device_pixel_ratio = 1.0;
    config.capture.path = temp_dir.path().join("captures").display().to_string();
    config.system.keyboard = false;
    config
}

/// A body whose joints sit where `template_id` expects them, as seen by `facing`
fn body_matching(template_id: &str, facing: FacingMode) -> Vec<NormalizedLandmark> {
    let template = TemplateStore::builtin().find(template_id).unwrap();
    let mut body = vec![NormalizedLandmark::new(0.5, 0.95); 33];
    for reference in template.reference_landmarks {
        let x = if facing.is_mirrored() {
            1.0 - reference.x
        } else {
            reference.x
        };
        body[reference.index] = NormalizedLandmark::new(x, reference.y);
    }
    body
}

fn create_app(
    config: PosecamConfig,
    backend: Arc<MockCameraBackend>,
    body: Vec<NormalizedLandmark>,
) -> PosecamApp {
    let loader = Arc::new(ScriptedLoader::new(ScriptedLandmarker::constant(body)));
    PosecamApp::new(config, backend, loader).unwrap()
}

async fn next_alignment(events: &mut broadcast::Receiver<PosecamEvent>) -> Option<bool> {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(PosecamEvent::AlignmentChanged { aligned, .. }) => return aligned,
                Ok(_) => continue,
                Err(e) => panic!("Event bus failed: {}", e),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(2), wait).await.ok()
}

#[tokio::test]
async fn test_app_creation() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = create_app(
        create_test_config(&temp_dir),
        Arc::new(MockCameraBackend::new()),
        Vec::new(),
    );

    assert!(app.get_all_component_states().is_empty());
    assert!(app.selected_template().is_none());
    assert!(!app.is_detecting());

    app.initialize().unwrap();
    assert_eq!(
        app.get_component_state("camera"),
        Some(ComponentState::Stopped)
    );
    assert!(app.get_component_state("keyboard").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_start_opens_front_camera_and_detects() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MockCameraBackend::new());
    let mut app = create_app(create_test_config(&temp_dir), Arc::clone(&backend), Vec::new());

    app.initialize().unwrap();
    app.start().await.unwrap();

    assert_eq!(app.session().state(), CameraSessionState::Ready);
    assert_eq!(app.session().facing_mode(), FacingMode::Front);
    assert!(app.is_detecting());
    assert_eq!(
        app.get_component_state("camera"),
        Some(ComponentState::Running)
    );

    assert_eq!(app.shutdown().await.unwrap(), 0);
    assert_eq!(backend.live_streams(), 0);
    assert!(!app.is_detecting());
}

#[tokio::test(start_paused = true)]
async fn test_alignment_published_once_per_change() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = create_app(
        create_test_config(&temp_dir),
        Arc::new(MockCameraBackend::new()),
        body_matching("profile", FacingMode::Front),
    );
    let mut events = app.event_bus().subscribe();

    app.start().await.unwrap();
    app.select_template_by_id("profile").await.unwrap();

    assert_eq!(next_alignment(&mut events).await, Some(true));
    assert!(app.is_aligned());

    // Steady matching frames do not republish
    assert_eq!(next_alignment(&mut events).await, None);

    // Clearing the template drops alignment
    app.select_template(None).await.unwrap();
    assert_eq!(next_alignment(&mut events).await, Some(false));
    assert!(!app.is_aligned());

    app.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_alignment_dropped_when_frames_stop() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MockCameraBackend::new());
    let mut app = create_app(
        create_test_config(&temp_dir),
        Arc::clone(&backend),
        body_matching("profile", FacingMode::Front),
    );
    let mut events = app.event_bus().subscribe();

    app.start().await.unwrap();
    app.select_template_by_id("profile").await.unwrap();
    assert_eq!(next_alignment(&mut events).await, Some(true));

    for stream in backend.issued_streams() {
        stream.set_frame(None);
    }

    assert_eq!(next_alignment(&mut events).await, Some(false));
    assert!(!app.is_aligned());
    assert_eq!(app.session().state(), CameraSessionState::Ready);
    assert!(app.is_detecting());

    app.shutdown().await.unwrap();
    assert!(!app.is_detecting());
}

#[tokio::test(start_paused = true)]
async fn test_unmirrored_body_does_not_align_on_front_camera() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = create_app(
        create_test_config(&temp_dir),
        Arc::new(MockCameraBackend::new()),
        body_matching("profile", FacingMode::Back),
    );
    let mut events = app.event_bus().subscribe();

    app.start().await.unwrap();
    app.select_template_by_id("profile").await.unwrap();

    assert_eq!(next_alignment(&mut events).await, None);
    assert!(!app.is_aligned());

    app.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_no_template_never_aligns() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = create_app(
        create_test_config(&temp_dir),
        Arc::new(MockCameraBackend::new()),
        body_matching("casual-standing", FacingMode::Front),
    );
    let mut events = app.event_bus().subscribe();

    app.start().await.unwrap();
    assert_eq!(next_alignment(&mut events).await, None);

    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_template_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = create_app(
        create_test_config(&temp_dir),
        Arc::new(MockCameraBackend::new()),
        Vec::new(),
    );

    assert!(app.select_template(Some(42)).await.is_err());
    assert!(app.select_template_by_id("handstand").await.is_err());
    assert!(app.selected_template().is_none());

    app.select_template(Some(1)).await.unwrap();
    assert_eq!(app.selected_template().unwrap().id, "fashion-editorial");
}

#[tokio::test(start_paused = true)]
async fn test_camera_failure_is_recoverable() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MockCameraBackend::new());
    backend.fail_next(PlatformCause::PermissionDenied);
    let mut app = create_app(create_test_config(&temp_dir), Arc::clone(&backend), Vec::new());

    app.initialize().unwrap();
    app.start().await.unwrap();

    assert_eq!(app.session().state(), CameraSessionState::Error);
    assert!(!app.is_detecting());
    assert_eq!(
        app.get_component_state("camera"),
        Some(ComponentState::Failed)
    );

    let exit = app
        .handle_event(PosecamEvent::RetryRequested {
            timestamp: SystemTime::now(),
        })
        .await;
    assert!(exit.is_none());
    assert_eq!(app.session().state(), CameraSessionState::Ready);
    assert!(app.is_detecting());

    app.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_flip_restarts_detection_on_back_camera() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MockCameraBackend::new());
    let mut app = create_app(create_test_config(&temp_dir), Arc::clone(&backend), Vec::new());

    app.start().await.unwrap();
    // Let the device enumeration finish
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(app.session().has_multiple_cameras());

    app.handle_event(PosecamEvent::FlipRequested {
        timestamp: SystemTime::now(),
    })
    .await;

    assert_eq!(app.session().facing_mode(), FacingMode::Back);
    assert!(app.is_detecting());
    assert_eq!(backend.live_streams(), 1);

    app.shutdown().await.unwrap();
    assert_eq!(backend.live_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_capture_request_exports_photo() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir);
    let capture_dir = config.capture.path.clone();
    let mut app = create_app(config, Arc::new(MockCameraBackend::new()), Vec::new());

    // Before the camera is up the request only produces a notice
    app.handle_event(PosecamEvent::CaptureRequested {
        timestamp: SystemTime::now(),
    })
    .await;
    assert_eq!(app.notice().as_deref(), Some("Camera not ready"));
    assert!(std::fs::read_dir(&capture_dir).is_err());

    app.start().await.unwrap();
    app.handle_event(PosecamEvent::CaptureRequested {
        timestamp: SystemTime::now(),
    })
    .await;

    assert_eq!(app.notice().as_deref(), Some("Photo saved"));
    assert_eq!(std::fs::read_dir(&capture_dir).unwrap().count(), 1);

    app.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_quit_request_ends_run() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = create_app(
        create_test_config(&temp_dir),
        Arc::new(MockCameraBackend::new()),
        Vec::new(),
    );

    let exit = app
        .handle_event(PosecamEvent::ShutdownRequested {
            timestamp: SystemTime::now(),
            reason: "test".to_string(),
        })
        .await;
    assert_eq!(exit, Some(ShutdownReason::UserRequest));
}

#[tokio::test(start_paused = true)]
async fn test_overlay_follows_template() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = create_app(
        create_test_config(&temp_dir),
        Arc::new(MockCameraBackend::new()),
        Vec::new(),
    );
    app.start().await.unwrap();

    let guide = app.render_overlay();
    assert_eq!(guide.dimensions(), (64, 48));

    app.select_template_by_id("casual-standing").await.unwrap();
    let with_silhouette = app.render_overlay();

    let drawn = |image: &image::RgbaImage| image.pixels().filter(|p| p[3] > 0).count();
    assert!(drawn(&with_silhouette) > drawn(&guide));
    assert_eq!(app.hint().text, crate::overlay::HINT_TEXT);

    app.shutdown().await.unwrap();
}
