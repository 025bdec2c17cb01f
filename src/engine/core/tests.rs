use super::*;
use crate::engine::backend::DesktopStubBackend;
use crate::timing::ManualClock;

impl TransportController {
    /// Controller over a stub backend driven by a manual clock
    pub(crate) fn new_test(config: AppConfig) -> (Self, Arc<DesktopStubBackend>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0.0));
        let backend = Arc::new(DesktopStubBackend::with_manual_clock(Arc::clone(&clock)));
        let controller = Self::with_backend(config, backend.clone())
            .expect("default test config is valid");
        (controller, backend, clock)
    }
}

fn wait_for_clicks(backend: &DesktopStubBackend, count: usize) -> Vec<f64> {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        let clicks = backend.scheduled_clicks();
        if clicks.len() >= count || std::time::Instant::now() > deadline {
            return clicks;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_start_runs_first_pass_synchronously() {
    let (controller, backend, _clock) = TransportController::new_test(AppConfig::default());

    controller.start().unwrap();

    assert_eq!(controller.run_state(), RunState::Running);
    assert_eq!(backend.scheduled_clicks(), vec![0.0]);
    controller.stop().unwrap();
}

#[test]
fn test_double_start_and_stop_are_noops() {
    let (controller, backend, _clock) = TransportController::new_test(AppConfig::default());
    let mut events = controller.subscribe_events();

    controller.start().unwrap();
    controller.start().unwrap();
    assert_eq!(backend.sessions_opened(), 1);

    controller.stop().unwrap();
    controller.stop().unwrap();
    assert_eq!(controller.run_state(), RunState::Idle);

    let mut started = 0;
    let mut stopped = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            MetronomeEvent::Started { .. } => started += 1,
            MetronomeEvent::Stopped => stopped += 1,
            MetronomeEvent::Beat { .. } => {}
        }
    }
    assert_eq!((started, stopped), (1, 1));
}

#[test]
fn test_unavailable_clock_keeps_idle() {
    let (controller, backend, _clock) = TransportController::new_test(AppConfig::default());
    backend.set_available(false);

    let err = controller.start().unwrap_err();
    assert!(matches!(err, MetronomeError::ClockUnavailable { .. }));
    assert_eq!(controller.run_state(), RunState::Idle);
    assert_eq!(backend.live_sessions(), 0);

    backend.set_available(true);
    controller.start().unwrap();
    assert!(controller.is_running());
}

#[test]
fn test_poll_picks_up_clock_progress() {
    let (controller, backend, clock) = TransportController::new_test(AppConfig::default());
    controller.start().unwrap();

    clock.set(0.45);
    assert_eq!(wait_for_clicks(&backend, 2), vec![0.0, 0.5]);

    controller.stop().unwrap();
}

#[test]
fn test_stop_releases_session_and_halts_scheduling() {
    let (controller, backend, clock) = TransportController::new_test(AppConfig::default());
    controller.start().unwrap();
    assert_eq!(backend.live_sessions(), 1);

    controller.stop().unwrap();
    assert_eq!(backend.live_sessions(), 0);

    clock.set(5.0);
    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(backend.scheduled_clicks(), vec![0.0]);
}

#[test]
fn test_toggle_alternates_state() {
    let (controller, _backend, _clock) = TransportController::new_test(AppConfig::default());

    assert_eq!(controller.toggle().unwrap(), RunState::Running);
    assert_eq!(controller.toggle().unwrap(), RunState::Idle);
    assert_eq!(controller.toggle().unwrap(), RunState::Running);
    controller.stop().unwrap();
}

#[test]
fn test_tempo_guard() {
    let (controller, _backend, _clock) = TransportController::new_test(AppConfig::default());

    controller.set_tempo(0.0);
    assert_eq!(controller.tempo().beat_interval(), 0.5);

    controller.set_tempo(-5.0);
    assert_eq!(controller.tempo().beat_interval(), 0.5);

    controller.set_tempo_text("abc");
    assert_eq!(controller.tempo().beat_interval(), 0.5);

    controller.set_tempo_text(" 60 ");
    assert_eq!(controller.tempo().bpm(), 60.0);
}

#[test]
fn test_invalid_configured_tempo_uses_default() {
    let mut config = AppConfig::default();
    config.transport.tempo_bpm = f64::NAN;
    let (controller, _backend, _clock) = TransportController::new_test(config);

    assert_eq!(controller.tempo().bpm(), 120.0);
}

#[test]
fn test_invalid_scheduler_config_rejected() {
    let mut config = AppConfig::default();
    config.scheduler.poll_interval_ms = 100;
    let backend = Arc::new(DesktopStubBackend::new());

    let result = TransportController::with_backend(config, backend);
    assert!(matches!(result, Err(MetronomeError::InvalidConfig { .. })));
}

#[test]
fn test_attach_honours_auto_start() {
    let (controller, _backend, _clock) = TransportController::new_test(AppConfig::default());
    controller.attach().unwrap();
    assert!(controller.is_attached());
    assert!(!controller.is_running());

    let mut config = AppConfig::default();
    config.transport.auto_start = true;
    let (controller, _backend, _clock) = TransportController::new_test(config);
    controller.attach().unwrap();
    assert!(controller.is_running());

    controller.detach().unwrap();
    assert!(!controller.is_attached());
    assert!(!controller.is_running());
}

#[test]
fn test_set_playing_maps_to_transport() {
    let (controller, _backend, _clock) = TransportController::new_test(AppConfig::default());

    controller.set_playing(true).unwrap();
    assert!(controller.is_running());
    controller.set_playing(false).unwrap();
    assert!(!controller.is_running());
}

#[test]
fn test_drop_stops_transport() {
    let (controller, backend, _clock) = TransportController::new_test(AppConfig::default());
    controller.start().unwrap();
    assert_eq!(backend.live_sessions(), 1);

    drop(controller);
    assert_eq!(backend.live_sessions(), 0);
}

#[test]
fn test_toggle_reports_poisoned_lock() {
    let (controller, backend, _clock) = TransportController::new_test(AppConfig::default());
    let controller = Arc::new(controller);

    let poisoner = Arc::clone(&controller);
    let result = std::thread::spawn(move || {
        let _guard = poisoner.session.lock().unwrap();
        panic!("poison the session lock");
    })
    .join();
    assert!(result.is_err());

    assert!(matches!(
        controller.toggle(),
        Err(MetronomeError::LockPoisoned { .. })
    ));
    assert_eq!(backend.sessions_opened(), 0);
}
