use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{GenericImageView, ImageFormat, RgbImage};
use tempfile::tempdir;

use wallkeeper_core::{
    Bounds, Classification, Confirmation, Error, ExternalNotifier, ImageTransform, Outcome,
    Roots, SilentNotifier, SilentReporter, SyncAction, SyncEngine,
};

#[derive(Clone, Default)]
struct RecordingNotifier {
    refreshes: Rc<Cell<usize>>,
    opened: Rc<RefCell<Vec<PathBuf>>>,
}

impl ExternalNotifier for RecordingNotifier {
    fn refresh(&self) {
        self.refreshes.set(self.refreshes.get() + 1);
    }

    fn open_and_select(&self, path: &Path) {
        self.opened.borrow_mut().push(path.to_path_buf());
    }
}

/// Records calls and writes a placeholder file instead of decoding.
#[derive(Clone, Default)]
struct RecordingTransform {
    calls: Rc<RefCell<Vec<(PathBuf, Bounds)>>>,
}

impl ImageTransform for RecordingTransform {
    fn convert(&self, source: &Path, dest: &Path, bounds: Bounds) -> Result<(), Error> {
        self.calls.borrow_mut().push((source.to_path_buf(), bounds));
        fs::write(dest, b"jpeg")?;
        Ok(())
    }
}

struct FailingTransform;

impl ImageTransform for FailingTransform {
    fn convert(&self, source: &Path, _dest: &Path, _bounds: Bounds) -> Result<(), Error> {
        Err(Error::ConversionFailed {
            path: source.to_path_buf(),
            reason: "codec exploded".to_string(),
        })
    }
}

struct Decline;

impl Confirmation for Decline {
    fn confirm(&self, _action: SyncAction, _path: &Path) -> bool {
        false
    }
}

/// Accepts, but deletes `victim` first, as if another process got there
/// between the prompt and the write.
struct DeleteThenAccept {
    victim: PathBuf,
}

impl Confirmation for DeleteThenAccept {
    fn confirm(&self, _action: SyncAction, _path: &Path) -> bool {
        fs::remove_file(&self.victim).unwrap();
        true
    }
}

fn write_image(path: &Path, width: u32, height: u32, format: ImageFormat) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]))
        .save_with_format(path, format)
        .unwrap();
}

fn library(root: &Path) -> Roots {
    let roots = Roots::under(root.join("Pictures"));
    fs::create_dir_all(&roots.derived).unwrap();
    roots
}

fn derived_files(roots: &Roots) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(&roots.derived)
        .unwrap()
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn classify(engine: &SyncEngine, path: &Path) -> Classification {
    let index = engine.load_index();
    let resolver = engine.resolver(&index);
    resolver.classify(path)
}

#[test]
fn test_scenario_a_convert_then_removable() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let source = roots.source.join("img.png");
    write_image(&source, 3840, 1080, ImageFormat::Png);

    let notifier = RecordingNotifier::default();
    let engine = SyncEngine::new(roots.clone()).with_notifier(notifier.clone());

    assert_eq!(classify(&engine, &source), Classification::Addable);
    let dest = engine.add(&source).unwrap();
    assert_eq!(dest, roots.derived.join("img.jpg"));

    let written = image::open(&dest).unwrap();
    assert_eq!(written.dimensions(), (1920, 540));
    assert_eq!(
        image::ImageFormat::from_path(&dest).unwrap(),
        ImageFormat::Jpeg
    );

    assert_eq!(classify(&engine, &source), Classification::Removable);
    assert_eq!(notifier.refreshes.get(), 1);
}

#[test]
fn test_add_invokes_transform_with_default_bounds() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let source = roots.source.join("Trips").join("dunes.webp");
    fs::create_dir_all(source.parent().unwrap()).unwrap();
    fs::write(&source, b"not decoded by the recording transform").unwrap();

    let transform = RecordingTransform::default();
    let engine = SyncEngine::new(roots.clone())
        .with_notifier(SilentNotifier)
        .with_transform(transform.clone());

    let dest = engine.add(&source).unwrap();
    assert_eq!(dest, roots.derived.join("dunes.jpg"));
    assert_eq!(
        transform.calls.borrow().as_slice(),
        &[(source.clone(), Bounds::DEFAULT)]
    );
    assert_eq!(derived_files(&roots), vec!["dunes.jpg".to_string()]);
}

#[test]
fn test_add_copies_jpg_verbatim() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let source = roots.source.join("Trips").join("harbor.jpg");
    write_image(&source, 400, 300, ImageFormat::Jpeg);

    let transform = RecordingTransform::default();
    let engine = SyncEngine::new(roots.clone())
        .with_notifier(SilentNotifier)
        .with_transform(transform.clone());

    let dest = engine.add(&source).unwrap();
    assert_eq!(dest, roots.derived.join("harbor.jpg"));
    assert!(transform.calls.borrow().is_empty());
    assert_eq!(fs::read(&dest).unwrap(), fs::read(&source).unwrap());
}

#[test]
fn test_add_then_remove_round_trip() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let source = roots.source.join("img.png");
    write_image(&source, 64, 48, ImageFormat::Png);
    let before = derived_files(&roots);

    let engine = SyncEngine::new(roots.clone()).with_notifier(SilentNotifier);
    engine.add(&source).unwrap();
    assert_eq!(classify(&engine, &source), Classification::Removable);

    let removed = engine.remove(&source).unwrap();
    assert_eq!(removed, roots.derived.join("img.jpg"));
    assert_eq!(classify(&engine, &source), Classification::Addable);
    assert_eq!(derived_files(&roots), before);
}

#[test]
fn test_add_creates_missing_derived_root() {
    let tmp = tempdir().unwrap();
    let roots = Roots::under(tmp.path().join("Pictures"));
    let source = roots.source.join("first.png");
    write_image(&source, 16, 16, ImageFormat::Png);

    let engine = SyncEngine::new(roots.clone()).with_notifier(SilentNotifier);
    engine.add(&source).unwrap();
    assert_eq!(derived_files(&roots), vec!["first.jpg".to_string()]);
}

#[test]
fn test_add_refuses_to_overwrite() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let source = roots.source.join("Trips").join("harbor.jpg");
    write_image(&source, 8, 8, ImageFormat::Jpeg);

    // A same-named entry that the index does not count as a wallpaper.
    fs::create_dir_all(roots.derived.join("harbor.jpg")).unwrap();

    let engine = SyncEngine::new(roots.clone()).with_notifier(SilentNotifier);
    assert_eq!(classify(&engine, &source), Classification::Addable);
    match engine.add(&source) {
        Err(Error::DestinationExists(path)) => assert_eq!(path, roots.derived.join("harbor.jpg")),
        other => panic!("expected DestinationExists, got {:?}", other),
    }
}

#[test]
fn test_failed_conversion_leaves_no_file() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let source = roots.source.join("broken.png");
    fs::write(&source, b"garbage").unwrap();

    let notifier = RecordingNotifier::default();
    let engine = SyncEngine::new(roots.clone())
        .with_notifier(notifier.clone())
        .with_transform(FailingTransform);

    assert!(matches!(
        engine.add(&source),
        Err(Error::ConversionFailed { .. })
    ));
    assert!(derived_files(&roots).is_empty());
    assert_eq!(notifier.refreshes.get(), 0);
}

#[test]
fn test_raster_transform_rejects_undecodable_input() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let source = roots.source.join("broken.png");
    fs::write(&source, b"definitely not a png").unwrap();

    let engine = SyncEngine::new(roots.clone()).with_notifier(SilentNotifier);
    assert!(matches!(
        engine.add(&source),
        Err(Error::ConversionFailed { .. })
    ));
    assert!(derived_files(&roots).is_empty());
}

#[test]
fn test_add_rejects_ineligible_paths() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let outside = tmp.path().join("Downloads").join("cat.png");
    write_image(&outside, 8, 8, ImageFormat::Png);

    let engine = SyncEngine::new(roots).with_notifier(SilentNotifier);
    assert!(matches!(
        engine.add(&outside),
        Err(Error::NotEligible {
            classification: Classification::Unmanaged,
            ..
        })
    ));
    assert!(matches!(
        engine.add(&tmp.path().join("Pictures").join("ghost.png")),
        Err(Error::PathNotFound(_))
    ));
}

#[test]
fn test_remove_retries_with_reloaded_index() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let source = roots.source.join("Trips").join("glacier.png");
    write_image(&source, 8, 8, ImageFormat::Png);
    // Wallpaper present under a different extension than the one Remove targets.
    fs::write(roots.derived.join("glacier.jpeg"), b"jpeg").unwrap();

    let engine = SyncEngine::new(roots.clone()).with_notifier(SilentNotifier);
    assert_eq!(classify(&engine, &source), Classification::Removable);

    let removed = engine.remove(&source).unwrap();
    assert_eq!(removed, roots.derived.join("glacier.jpeg"));
    assert!(derived_files(&roots).is_empty());
}

#[test]
fn test_batch_add_refreshes_once_and_skips_ineligible() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let a = roots.source.join("a.png");
    let b = roots.source.join("b.jpg");
    let c = roots.source.join("c.png");
    write_image(&a, 8, 8, ImageFormat::Png);
    write_image(&b, 8, 8, ImageFormat::Jpeg);
    write_image(&c, 8, 8, ImageFormat::Png);
    fs::write(roots.derived.join("c.jpg"), b"jpeg").unwrap();
    let missing = roots.source.join("missing.png");

    let notifier = RecordingNotifier::default();
    let engine = SyncEngine::new(roots.clone()).with_notifier(notifier.clone());
    let report = engine.apply(
        SyncAction::Add,
        &[a.clone(), b.clone(), c.clone(), missing.clone()],
        &SilentReporter,
    );

    assert_eq!(
        report.completed,
        vec![
            (a, Outcome::Added(roots.derived.join("a.jpg"))),
            (b, Outcome::Added(roots.derived.join("b.jpg"))),
        ]
    );
    assert_eq!(
        report.skipped,
        vec![
            (c, Classification::Removable),
            (missing, Classification::Unmanaged),
        ]
    );
    assert!(report.failed.is_empty());
    assert_eq!(notifier.refreshes.get(), 1);
}

#[test]
fn test_batch_remove_collects_failures() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let a = roots.source.join("a.png");
    write_image(&a, 8, 8, ImageFormat::Png);
    fs::write(roots.derived.join("a.jpg"), b"jpeg").unwrap();

    let notifier = RecordingNotifier::default();
    let engine = SyncEngine::new(roots.clone()).with_notifier(notifier.clone());
    let report = engine.apply(SyncAction::Remove, &[a.clone()], &SilentReporter);

    assert_eq!(
        report.completed,
        vec![(a, Outcome::Removed(roots.derived.join("a.jpg")))]
    );
    assert!(report.mutated());
    assert_eq!(notifier.refreshes.get(), 1);
}

#[test]
fn test_declined_confirmation_leaves_disk_untouched() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let a = roots.source.join("a.png");
    write_image(&a, 8, 8, ImageFormat::Png);

    let notifier = RecordingNotifier::default();
    let engine = SyncEngine::new(roots.clone())
        .with_notifier(notifier.clone())
        .with_confirmation(Decline);
    let report = engine.apply(SyncAction::Add, &[a.clone()], &SilentReporter);

    assert_eq!(report.declined, vec![a]);
    assert!(derived_files(&roots).is_empty());
    assert_eq!(notifier.refreshes.get(), 0);
}

#[test]
fn test_source_deleted_after_confirmation_is_skipped() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let png = roots.source.join("a.png");
    let jpg = roots.source.join("b.jpg");
    write_image(&png, 8, 8, ImageFormat::Png);
    write_image(&jpg, 8, 8, ImageFormat::Jpeg);

    for source in [png, jpg] {
        let notifier = RecordingNotifier::default();
        let engine = SyncEngine::new(roots.clone())
            .with_notifier(notifier.clone())
            .with_confirmation(DeleteThenAccept {
                victim: source.clone(),
            });
        let report = engine.apply(SyncAction::Add, &[source.clone()], &SilentReporter);

        assert!(report.completed.is_empty());
        assert_eq!(report.skipped, vec![(source, Classification::Unmanaged)]);
        assert!(report.failed.is_empty());
        assert_eq!(notifier.refreshes.get(), 0);
        assert!(derived_files(&roots).is_empty());
    }
}

#[test]
fn test_wallpaper_deleted_after_confirmation_fails_not_found() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let a = roots.source.join("a.png");
    write_image(&a, 8, 8, ImageFormat::Png);
    let wallpaper = roots.derived.join("a.jpg");
    fs::write(&wallpaper, b"jpeg").unwrap();

    let notifier = RecordingNotifier::default();
    let engine = SyncEngine::new(roots.clone())
        .with_notifier(notifier.clone())
        .with_confirmation(DeleteThenAccept {
            victim: wallpaper.clone(),
        });
    let report = engine.apply(SyncAction::Remove, &[a.clone()], &SilentReporter);

    assert!(report.completed.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, a);
    assert!(matches!(&report.failed[0].1, Error::NotFound(target) if *target == wallpaper));
    assert!(!report.mutated());
    assert_eq!(notifier.refreshes.get(), 0);
}

#[test]
fn test_locate_source_opens_every_match() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let png = roots.source.join("Vacation").join("sunset.png");
    let tiff = roots.source.join("Archive").join("sunset.tiff");
    write_image(&png, 8, 8, ImageFormat::Png);
    write_image(&tiff, 8, 8, ImageFormat::Tiff);
    let wallpaper = roots.derived.join("sunset.jpg");
    fs::write(&wallpaper, b"jpeg").unwrap();

    let notifier = RecordingNotifier::default();
    let engine = SyncEngine::new(roots.clone()).with_notifier(notifier.clone());

    let found = engine.locate_source(&wallpaper).unwrap();
    assert_eq!(found, vec![tiff.clone(), png.clone()]);
    assert_eq!(notifier.opened.borrow().as_slice(), &[tiff, png]);
    assert_eq!(notifier.refreshes.get(), 0);
}

#[test]
fn test_locate_source_batch_without_matches_is_noop() {
    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let wallpaper = roots.derived.join("lonely.jpg");
    fs::write(&wallpaper, b"jpeg").unwrap();

    let notifier = RecordingNotifier::default();
    let engine = SyncEngine::new(roots).with_notifier(notifier.clone());
    let report = engine.apply(SyncAction::LocateSource, &[wallpaper.clone()], &SilentReporter);

    assert_eq!(report.skipped, vec![(wallpaper, Classification::Unmanaged)]);
    assert!(report.failed.is_empty());
    assert!(notifier.opened.borrow().is_empty());
}

#[cfg(unix)]
#[test]
fn test_command_transform_reports_exit_failure() {
    use wallkeeper_core::CommandTransform;

    let tmp = tempdir().unwrap();
    let roots = library(tmp.path());
    let source = roots.source.join("a.png");
    write_image(&source, 8, 8, ImageFormat::Png);

    let engine = SyncEngine::new(roots.clone())
        .with_notifier(SilentNotifier)
        .with_transform(CommandTransform::new("false", Vec::new()));
    assert!(matches!(
        engine.add(&source),
        Err(Error::ConversionFailed { .. })
    ));
    assert!(derived_files(&roots).is_empty());

    let copying = SyncEngine::new(roots.clone())
        .with_notifier(SilentNotifier)
        .with_transform(CommandTransform::new(
            "cp",
            vec!["{input}".to_string(), "{output}".to_string()],
        ));
    copying.add(&source).unwrap();
    assert_eq!(derived_files(&roots), vec!["a.jpg".to_string()]);
}
