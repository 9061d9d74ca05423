use super::*;
use crate::types::TrackRecord;

const SOURCE: &str = "daap://10.0.0.2:3689";

fn track(item_id: u32, title: &str) -> TrackRecord {
    TrackRecord {
        item_id,
        title: title.to_string(),
        ..TrackRecord::default()
    }
}

#[tokio::test]
async fn test_staged_tracks_invisible_until_commit() {
    let sink = MemorySink::new();
    sink.register_source(SOURCE).await.unwrap();
    sink.insert_or_update_track(SOURCE, track(1, "one"))
        .await
        .unwrap();
    sink.insert_or_update_track(SOURCE, track(2, "two"))
        .await
        .unwrap();

    assert_eq!(sink.committed_len(SOURCE), 0);
    assert_eq!(sink.staged_len(SOURCE), 2);

    sink.commit(SOURCE).await.unwrap();
    assert_eq!(sink.committed_len(SOURCE), 2);
    assert_eq!(sink.staged_len(SOURCE), 0);
    assert_eq!(sink.track(SOURCE, 1).unwrap().title, "one");
}

#[tokio::test]
async fn test_repeated_item_id_replaces_staged_record() {
    let sink = MemorySink::new();
    sink.register_source(SOURCE).await.unwrap();
    sink.insert_or_update_track(SOURCE, track(7, "old title"))
        .await
        .unwrap();
    sink.insert_or_update_track(SOURCE, track(7, "new title"))
        .await
        .unwrap();
    sink.commit(SOURCE).await.unwrap();

    assert_eq!(sink.committed_len(SOURCE), 1);
    assert_eq!(sink.track(SOURCE, 7).unwrap().title, "new title");
}

#[tokio::test]
async fn test_rollback_discards_staged_keeps_committed() {
    let sink = MemorySink::new();
    sink.register_source(SOURCE).await.unwrap();
    sink.insert_or_update_track(SOURCE, track(1, "kept"))
        .await
        .unwrap();
    sink.commit(SOURCE).await.unwrap();

    sink.insert_or_update_track(SOURCE, track(2, "doomed"))
        .await
        .unwrap();
    sink.rollback(SOURCE).await.unwrap();

    assert_eq!(sink.committed_len(SOURCE), 1);
    assert_eq!(sink.staged_len(SOURCE), 0);
    assert!(sink.track(SOURCE, 2).is_none());
}

// The sink futures never block on I/O, so a bare executor is enough here
#[test]
fn test_delete_all_for_source() {
    tokio_test::block_on(async {
        let sink = MemorySink::new();
        sink.register_source(SOURCE).await.unwrap();
        sink.insert_or_update_track(SOURCE, track(1, "a"))
            .await
            .unwrap();
        sink.commit(SOURCE).await.unwrap();

        sink.delete_all_for_source(SOURCE).await.unwrap();
        assert!(sink.tracks(SOURCE).is_empty());
    });
}

#[tokio::test]
async fn test_sources_are_independent() {
    let other = "daap://10.0.0.9:3689";
    let sink = MemorySink::new();
    sink.register_source(SOURCE).await.unwrap();
    sink.register_source(other).await.unwrap();
    sink.insert_or_update_track(SOURCE, track(1, "mine"))
        .await
        .unwrap();
    sink.commit(SOURCE).await.unwrap();

    assert_eq!(sink.committed_len(SOURCE), 1);
    assert_eq!(sink.committed_len(other), 0);
}
