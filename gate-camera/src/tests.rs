//! Testes do módulo gate-camera

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::*;

// ═══════════════════════════════════════════════════════════════════════════════
// FONTES E COLABORADORES DE TESTE
// ═══════════════════════════════════════════════════════════════════════════════

/// Driver montado a partir de uma closure
struct FnDriver<F>(F);

impl<F> CameraDriver for FnDriver<F>
where
    F: Fn(&FeedId) -> CameraResult<Box<dyn FrameSource>> + Send + Sync,
{
    fn open(&self, feed: &FeedId) -> CameraResult<Box<dyn FrameSource>> {
        (self.0)(feed)
    }
}

/// Frames uniformes: todos os pixels carregam o número de sequência
struct UniformSource {
    sequence: u64,
    releases: Arc<AtomicUsize>,
}

impl FrameSource for UniformSource {
    fn read_frame(&mut self) -> CameraResult<Frame> {
        self.sequence += 1;
        Ok(Frame::filled(64, 48, Pixel::gray((self.sequence % 256) as u8), self.sequence))
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_micros(200)
    }
}

/// Bloqueia na leitura até o `Sender` de teste ser descartado
struct BlockingSource {
    gate: Receiver<()>,
    releases: Arc<AtomicUsize>,
}

impl FrameSource for BlockingSource {
    fn read_frame(&mut self) -> CameraResult<Frame> {
        let _ = self.gate.recv();
        Err(CameraError::ReadFailed("gate closed".into()))
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Produz `frames` frames e depois falha
struct FlakySource {
    remaining: u32,
    sequence: u64,
}

impl FrameSource for FlakySource {
    fn read_frame(&mut self) -> CameraResult<Frame> {
        if self.remaining == 0 {
            return Err(CameraError::ReadFailed("cable unplugged".into()));
        }
        self.remaining -= 1;
        self.sequence += 1;
        Ok(Frame::filled(4, 4, Pixel::gray(200), self.sequence))
    }

    fn release(&mut self) {}

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(1)
    }
}

/// Fonte sem intervalo: lê tão rápido quanto o loop permite
struct UnpacedSource {
    sequence: u64,
}

impl FrameSource for UnpacedSource {
    fn read_frame(&mut self) -> CameraResult<Frame> {
        self.sequence += 1;
        Ok(Frame::filled(2, 2, Pixel::gray(50), self.sequence))
    }

    fn release(&mut self) {}

    fn frame_interval(&self) -> Duration {
        Duration::ZERO
    }
}

/// Sink que verifica se cada frame gravado é uniforme
#[derive(Default)]
struct CheckingSink {
    written: AtomicUsize,
    torn: AtomicUsize,
}

impl ImageSink for CheckingSink {
    fn write_image(&self, frame: &Frame, _path: &Path) -> CameraResult<()> {
        let first = frame.pixels[0];
        if !frame.is_complete() || frame.pixels.iter().any(|p| *p != first) {
            self.torn.fetch_add(1, Ordering::SeqCst);
        }
        self.written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sink que sempre falha
struct BrokenSink;

impl ImageSink for BrokenSink {
    fn write_image(&self, _frame: &Frame, _path: &Path) -> CameraResult<()> {
        Err(CameraError::WriteFailed("disk full".into()))
    }
}

#[derive(Default)]
struct RecordingDisplay {
    shown: AtomicUsize,
    closed: Mutex<Vec<FeedId>>,
}

impl FrameDisplay for RecordingDisplay {
    fn show(&self, _feed: &FeedId, _frame: &Frame) {
        self.shown.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self, feed: &FeedId) {
        self.closed.lock().unwrap().push(feed.clone());
    }
}

fn quick_config() -> CameraOrchestratorConfig {
    CameraOrchestratorConfig {
        stop_timeout_ms: 500,
        show_on_start: false,
    }
}

fn uniform_orchestrator(releases: Arc<AtomicUsize>) -> CameraOrchestrator {
    let driver = FnDriver(move |_feed: &FeedId| -> CameraResult<Box<dyn FrameSource>> {
        Ok(Box::new(UniformSource {
            sequence: 0,
            releases: releases.clone(),
        }))
    });
    CameraOrchestrator::new(Arc::new(driver), quick_config())
}

fn synthetic_orchestrator() -> CameraOrchestrator {
    let config = CameraConfig {
        width: 8,
        height: 6,
        fps: 200,
    };
    CameraOrchestrator::new(Arc::new(SyntheticDriver::new(config)), quick_config())
}

fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTES DE TIPOS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_feed_id_parse() {
    assert_eq!("0".parse::<FeedId>().unwrap(), FeedId::Index(0));
    assert_eq!(" 12 ".parse::<FeedId>().unwrap(), FeedId::Index(12));
    assert_eq!(
        "rtsp://cam/1".parse::<FeedId>().unwrap(),
        FeedId::Uri("rtsp://cam/1".into())
    );
    assert!("".parse::<FeedId>().is_err());
}

#[test]
fn test_feed_id_order_and_file_stem() {
    let mut feeds = vec![FeedId::Uri("a".into()), FeedId::Index(10), FeedId::Index(2)];
    feeds.sort();
    assert_eq!(feeds, vec![FeedId::Index(2), FeedId::Index(10), FeedId::Uri("a".into())]);

    assert_eq!(FeedId::Uri("rtsp://cam/1".into()).file_stem(), "rtsp_3a_2f_2fcam_2f1");
    assert_eq!(image_file_name(&FeedId::Index(3)), "3.png");
}

#[test]
fn test_file_stem_is_distinct_per_feed() {
    let feeds = [
        FeedId::Index(0),
        FeedId::Uri("0".into()),
        FeedId::Uri("_u0".into()),
        FeedId::Uri("cam/a".into()),
        FeedId::Uri("cam_a".into()),
        FeedId::Uri("cam_2fa".into()),
        FeedId::Uri(String::new()),
    ];
    let stems: std::collections::BTreeSet<String> = feeds.iter().map(FeedId::file_stem).collect();
    assert_eq!(stems.len(), feeds.len());
    assert!(stems.iter().all(|s| !s.is_empty()));
}

#[test]
fn test_frame_helpers() {
    let frame = Frame::filled(3, 2, Pixel::new(30, 60, 90), 7);
    assert!(frame.is_complete());
    assert_eq!(frame.avg_intensity(), 60);
    assert_eq!(frame.get(2, 1), Some(&Pixel::new(30, 60, 90)));
    assert_eq!(frame.get(3, 0), None);
    assert_eq!(frame.to_rgb_bytes().len(), 18);
}

#[test]
fn test_camera_invalid_config() {
    let config = CameraConfig {
        width: 0,
        height: 0,
        fps: 30,
    };
    assert!(matches!(SyntheticCamera::new(config), Err(CameraError::InvalidConfig(_))));
}

#[test]
fn test_synthetic_camera_read_and_release() {
    let mut camera = SyntheticCamera::new(CameraConfig::default()).unwrap();
    let frame = camera.read_frame().unwrap();
    assert_eq!((frame.width, frame.height), (320, 240));
    assert!(frame.is_complete());
    assert_eq!(camera.frame_count(), 1);

    camera.release();
    assert!(matches!(camera.read_frame(), Err(CameraError::ReadFailed(_))));
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTES DE CICLO DE VIDA
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_failed_open_is_not_registered() {
    let driver = SyntheticDriver::new(CameraConfig::default()).with_offline(FeedId::Index(1));
    let cameras = CameraOrchestrator::new(Arc::new(driver), quick_config());

    let result = cameras.add_camera(FeedId::Index(1));
    assert!(matches!(result, Err(CameraError::Unavailable { .. })));
    assert!(!cameras.is_registered(&FeedId::Index(1)));
    assert_eq!(cameras.camera_count(), 0);

    cameras.add_camera(FeedId::Index(0)).unwrap();
    assert_eq!(cameras.feeds(), vec![FeedId::Index(0)]);
    cameras.quit_all().unwrap();
}

#[test]
fn test_duplicate_camera_rejected() {
    let cameras = synthetic_orchestrator();
    cameras.add_camera(FeedId::Index(0)).unwrap();
    assert_eq!(
        cameras.add_camera(FeedId::Index(0)),
        Err(CameraError::AlreadyRegistered(FeedId::Index(0)))
    );
    assert_eq!(cameras.camera_count(), 1);
    cameras.quit_all().unwrap();
}

#[test]
fn test_remove_camera() {
    let releases = Arc::new(AtomicUsize::new(0));
    let cameras = uniform_orchestrator(releases.clone());
    cameras.add_camera(FeedId::Index(0)).unwrap();
    cameras.add_camera(FeedId::Index(1)).unwrap();

    cameras.remove_camera(&FeedId::Index(0)).unwrap();
    assert_eq!(cameras.feeds(), vec![FeedId::Index(1)]);
    assert_eq!(releases.load(Ordering::SeqCst), 1);

    assert_eq!(
        cameras.remove_camera(&FeedId::Index(0)),
        Err(CameraError::NotFound(FeedId::Index(0)))
    );
    cameras.quit_all().unwrap();
}

#[test]
fn test_quit_all_releases_once_and_is_idempotent() {
    let releases = Arc::new(AtomicUsize::new(0));
    let cameras = uniform_orchestrator(releases.clone());
    for index in 0..3 {
        cameras.add_camera(FeedId::Index(index)).unwrap();
    }
    assert!(cameras.wait_until_ready(Duration::from_secs(2)));

    let started = Instant::now();
    cameras.quit_all().unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(releases.load(Ordering::SeqCst), 3);
    assert_eq!(cameras.camera_count(), 0);

    cameras.quit_all().unwrap();
    assert_eq!(releases.load(Ordering::SeqCst), 3);
}

#[test]
fn test_stuck_loop_is_reported() {
    let releases = Arc::new(AtomicUsize::new(0));
    let (gate_tx, gate_rx): (Sender<()>, Receiver<()>) = unbounded();

    let driver = {
        let releases = releases.clone();
        FnDriver(move |_feed: &FeedId| -> CameraResult<Box<dyn FrameSource>> {
            Ok(Box::new(BlockingSource {
                gate: gate_rx.clone(),
                releases: releases.clone(),
            }))
        })
    };
    let cameras = CameraOrchestrator::new(
        Arc::new(driver),
        CameraOrchestratorConfig {
            stop_timeout_ms: 100,
            show_on_start: false,
        },
    );
    cameras.add_camera(FeedId::Index(5)).unwrap();

    let started = Instant::now();
    let result = cameras.quit_all();
    assert_eq!(result, Err(CameraError::Stuck(vec![FeedId::Index(5)])));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(cameras.camera_count(), 0);

    // Liberar a fonte deixa a thread abandonada terminar
    drop(gate_tx);
    assert!(wait_for(Duration::from_secs(2), || releases.load(Ordering::SeqCst) == 1));
}

#[test]
fn test_source_failure_keeps_last_frame() {
    let driver = FnDriver(|_feed: &FeedId| -> CameraResult<Box<dyn FrameSource>> {
        Ok(Box::new(FlakySource {
            remaining: 3,
            sequence: 0,
        }))
    });
    let cameras = CameraOrchestrator::new(Arc::new(driver), quick_config()).with_sink(Arc::new(CheckingSink::default()));
    let feed = FeedId::Index(0);
    cameras.add_camera(feed.clone()).unwrap();

    assert!(wait_for(Duration::from_secs(2), || {
        cameras.exit_status(&feed).unwrap().is_some()
    }));
    assert!(matches!(cameras.exit_status(&feed).unwrap(), Some(LoopExit::SourceFailed(_))));

    let stats = cameras.stats();
    assert_eq!(stats[0].frames_read, 3);
    assert_eq!(stats[0].last_sequence, Some(3));
    assert!(!stats[0].running);

    let outcomes = cameras.capture_all(Path::new("/unused"));
    assert!(outcomes[0].is_ok());
    cameras.quit_all().unwrap();
}

#[test]
fn test_unpaced_source_keeps_running() {
    let driver = FnDriver(|_feed: &FeedId| -> CameraResult<Box<dyn FrameSource>> {
        Ok(Box::new(UnpacedSource { sequence: 0 }))
    });
    let cameras = CameraOrchestrator::new(Arc::new(driver), quick_config());
    let feed = FeedId::Index(0);
    cameras.add_camera(feed.clone()).unwrap();

    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(cameras.exit_status(&feed).unwrap(), None);
    let stats = cameras.stats();
    assert!(stats[0].running);
    assert!(stats[0].frames_read > 3);

    cameras.quit_all().unwrap();
}

#[test]
fn test_exit_status_of_blocked_loop_returns_at_once() {
    let (gate_tx, gate_rx) = unbounded::<()>();
    let driver = FnDriver(move |_feed: &FeedId| -> CameraResult<Box<dyn FrameSource>> {
        Ok(Box::new(BlockingSource {
            gate: gate_rx.clone(),
            releases: Arc::new(AtomicUsize::new(0)),
        }))
    });
    let cameras = CameraOrchestrator::new(Arc::new(driver), quick_config());
    let feed = FeedId::Index(0);
    cameras.add_camera(feed.clone()).unwrap();

    let started = Instant::now();
    for _ in 0..20 {
        assert_eq!(cameras.exit_status(&feed).unwrap(), None);
    }
    assert!(started.elapsed() < Duration::from_millis(50));

    // A fonte falha ao ser liberada; o status fica disponível sem join
    drop(gate_tx);
    assert!(wait_for(Duration::from_secs(2), || cameras.exit_status(&feed).unwrap().is_some()));
    assert!(matches!(cameras.exit_status(&feed).unwrap(), Some(LoopExit::SourceFailed(_))));
    assert_eq!(
        cameras.exit_status(&FeedId::Index(9)),
        Err(CameraError::NotFound(FeedId::Index(9)))
    );
    cameras.quit_all().unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTES DE CAPTURA
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_capture_never_sees_torn_frame() {
    let releases = Arc::new(AtomicUsize::new(0));
    let sink = Arc::new(CheckingSink::default());
    let cameras = uniform_orchestrator(releases).with_sink(sink.clone());
    cameras.add_camera(FeedId::Index(0)).unwrap();
    cameras.add_camera(FeedId::Index(1)).unwrap();
    assert!(cameras.wait_until_ready(Duration::from_secs(2)));

    for _ in 0..200 {
        let outcomes = cameras.capture_all(Path::new("/unused"));
        assert!(outcomes.iter().all(CaptureOutcome::is_ok));
    }

    assert_eq!(sink.written.load(Ordering::SeqCst), 400);
    assert_eq!(sink.torn.load(Ordering::SeqCst), 0);
    cameras.quit_all().unwrap();
}

#[test]
fn test_capture_writes_one_png_per_camera() {
    let dir = tempfile::tempdir().unwrap();
    let cameras = synthetic_orchestrator();
    cameras.add_camera(FeedId::Uri("rtsp://cam/1".into())).unwrap();
    cameras.add_camera(FeedId::Index(0)).unwrap();
    assert!(cameras.wait_until_ready(Duration::from_secs(2)));

    let outcomes = cameras.capture_all(dir.path());
    let feeds: Vec<_> = outcomes.iter().map(|o| o.feed.clone()).collect();
    assert_eq!(feeds, vec![FeedId::Index(0), FeedId::Uri("rtsp://cam/1".into())]);

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["0.png", "rtsp_3a_2f_2fcam_2f1.png"]);

    let path = outcomes[0].result.as_ref().unwrap();
    let decoder = png::Decoder::new(File::open(path).unwrap());
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).unwrap();
    assert_eq!((info.width, info.height), (8, 6));
    assert_eq!(info.color_type, png::ColorType::Rgb);

    cameras.quit_all().unwrap();
}

#[test]
fn test_similar_feeds_get_separate_images() {
    let dir = tempfile::tempdir().unwrap();
    let cameras = synthetic_orchestrator();
    let feeds = [
        FeedId::Index(0),
        FeedId::Uri("0".into()),
        FeedId::Uri("cam/a".into()),
        FeedId::Uri("cam_a".into()),
    ];
    for feed in &feeds {
        cameras.add_camera(feed.clone()).unwrap();
    }
    assert!(cameras.wait_until_ready(Duration::from_secs(2)));

    let outcomes = cameras.capture_all(dir.path());
    assert!(outcomes.iter().all(CaptureOutcome::is_ok));

    let paths: std::collections::BTreeSet<_> = outcomes
        .iter()
        .map(|o| o.result.clone().unwrap())
        .collect();
    assert_eq!(paths.len(), feeds.len());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), feeds.len());

    cameras.quit_all().unwrap();
}

#[test]
fn test_capture_before_first_frame() {
    let (gate_tx, gate_rx) = unbounded::<()>();
    let driver = FnDriver(move |_feed: &FeedId| -> CameraResult<Box<dyn FrameSource>> {
        Ok(Box::new(BlockingSource {
            gate: gate_rx.clone(),
            releases: Arc::new(AtomicUsize::new(0)),
        }))
    });
    let cameras = CameraOrchestrator::new(Arc::new(driver), quick_config());
    cameras.add_camera(FeedId::Index(0)).unwrap();

    let outcomes = cameras.capture_all(Path::new("/unused"));
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].result, Err(CaptureFailure::NoFrameYet));

    drop(gate_tx);
    cameras.quit_all().unwrap();
}

#[test]
fn test_partial_failure_is_per_camera() {
    let dir = tempfile::tempdir().unwrap();
    let cameras = synthetic_orchestrator().with_sink(Arc::new(BrokenSink));
    cameras.add_camera(FeedId::Index(0)).unwrap();
    cameras.add_camera(FeedId::Index(1)).unwrap();
    assert!(cameras.wait_until_ready(Duration::from_secs(2)));

    let outcomes = cameras.capture_all(dir.path());
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| matches!(o.result, Err(CaptureFailure::Write(_)))));
    cameras.quit_all().unwrap();
}

#[test]
fn test_png_sink_rejects_incomplete_frame() {
    let dir = tempfile::tempdir().unwrap();
    let mut frame = Frame::black(4, 4);
    frame.pixels.pop();

    let result = PngSink.write_image(&frame, &dir.path().join("x.png"));
    assert!(matches!(result, Err(CameraError::WriteFailed(_))));
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTES DE EXIBIÇÃO
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_display_toggle_and_close() {
    let display = Arc::new(RecordingDisplay::default());
    let cameras = synthetic_orchestrator().with_display(display.clone());
    let shown = FeedId::Index(0);
    let hidden = FeedId::Index(1);
    cameras.add_camera(shown.clone()).unwrap();
    cameras.add_camera(hidden.clone()).unwrap();

    assert!(!cameras.is_displaying(&shown).unwrap());
    cameras.enable_display(&shown).unwrap();
    assert!(cameras.is_displaying(&shown).unwrap());
    assert!(wait_for(Duration::from_secs(2), || display.shown.load(Ordering::SeqCst) > 0));

    cameras.quit_all().unwrap();
    assert_eq!(*display.closed.lock().unwrap(), vec![shown]);
}

#[test]
fn test_show_all_hide_all() {
    let cameras = synthetic_orchestrator();
    cameras.add_camera(FeedId::Index(0)).unwrap();
    cameras.add_camera(FeedId::Index(1)).unwrap();

    cameras.show_all();
    assert!(cameras.stats().iter().all(|s| s.displaying));
    cameras.hide_all();
    assert!(cameras.stats().iter().all(|s| !s.displaying));

    assert_eq!(
        cameras.enable_display(&FeedId::Index(9)),
        Err(CameraError::NotFound(FeedId::Index(9)))
    );
    cameras.quit_all().unwrap();
}
