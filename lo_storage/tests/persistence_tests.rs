//! ABOUTME: Integration tests for artifact writing, the debug policy and the capacity guard
//! ABOUTME: Exercises the local store against real temp directories

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use lo_storage::{
    ArtifactRole, ArtifactStore, ArtifactWriter, CapacityGuard, DebugLevel, LocalArtifactStore,
    PersistencePolicy,
};
use test_support::{count_with_suffix, fill_dir, scratch_dir};

fn image_for(role: ArtifactRole) -> DynamicImage {
    match role {
        ArtifactRole::Color => DynamicImage::ImageRgb8(RgbImage::new(32, 24)),
        _ => DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 24, Luma([90]))),
    }
}

#[tokio::test]
async fn writes_planned_roles_with_shared_timestamp() {
    let dir = scratch_dir();
    let store = LocalArtifactStore::new(dir.path());
    let writer = ArtifactWriter::new(store, 85);
    let policy = PersistencePolicy::new(DebugLevel::OnMotion);

    let label = "20240101-12-00-00.000001";
    for role in policy.plan(true) {
        writer.write(label, role, &image_for(role)).await.unwrap();
    }

    assert_eq!(writer.store().count().await.unwrap(), 5);
    for role in ArtifactRole::ALL {
        let path = dir.path().join(format!("{}_{}.jpeg", label, role));
        assert!(path.is_file(), "missing {}", path.display());
    }
}

#[tokio::test]
async fn level_zero_without_motion_writes_nothing() {
    let dir = scratch_dir();
    let writer = ArtifactWriter::new(LocalArtifactStore::new(dir.path()), 85);
    let policy = PersistencePolicy::new(DebugLevel::Off);

    for role in policy.plan(false) {
        writer
            .write("20240101-12-00-00.000002", role, &image_for(role))
            .await
            .unwrap();
    }
    assert_eq!(writer.store().count().await.unwrap(), 0);
}

#[tokio::test]
async fn always_level_writes_auxiliaries_but_no_color() {
    let dir = scratch_dir();
    let writer = ArtifactWriter::new(LocalArtifactStore::new(dir.path()), 85);
    let policy = PersistencePolicy::new(DebugLevel::Always);

    for role in policy.plan(false) {
        writer
            .write("20240101-12-00-00.000003", role, &image_for(role))
            .await
            .unwrap();
    }
    assert_eq!(count_with_suffix(dir.path(), "_color.jpeg"), 0);
    assert_eq!(count_with_suffix(dir.path(), "_average.jpeg"), 1);
    assert_eq!(writer.store().count().await.unwrap(), 4);
}

#[tokio::test]
async fn guard_tracks_writer_until_ceiling_exceeded() {
    let dir = scratch_dir();
    fill_dir(dir.path(), 3);
    let writer = ArtifactWriter::new(LocalArtifactStore::new(dir.path()), 85);
    let mut guard = CapacityGuard::open(writer.store(), 4, 1).await.unwrap();
    assert!(!guard.is_full());

    writer
        .write("a", ArtifactRole::Color, &image_for(ArtifactRole::Color))
        .await
        .unwrap();
    guard.record_write();
    assert!(!guard.check(writer.store()).await.unwrap().is_reached());
    assert!(guard.is_full());

    writer
        .write("b", ArtifactRole::Color, &image_for(ArtifactRole::Color))
        .await
        .unwrap();
    guard.record_write();
    assert!(guard.check(writer.store()).await.unwrap().is_reached());
}
