//! End-to-end indexing: upload, keywords, inline query, restart.

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use url::Url;

use memindex::channels::{upload_ack, BotContext, InboundEvent, COMMIT_ACK};
use memindex::index::IndexStore;
use memindex::media::MediaKind;
use memindex::query::{InlineResult, ResolverSettings, ResultSource};
use memindex::sessions::PendingUploadTracker;

fn settings() -> ResolverSettings {
    ResolverSettings {
        caption_base_url: Url::parse("https://memes.example.com/caption").unwrap(),
        max_results: 50,
        cache_time_secs: 10,
    }
}

fn open(dir: &Path) -> BotContext {
    let store = IndexStore::open(
        MediaKind::ALL.map(|kind| (kind, dir.join(kind.default_file_name()))),
    );
    BotContext::new(
        Arc::new(PendingUploadTracker::new()),
        Arc::new(store),
        settings(),
    )
}

async fn index(ctx: &BotContext, chat_id: i64, kind: MediaKind, reference: &str, keywords: &str) {
    let ack = ctx
        .handle(InboundEvent::Upload {
            chat_id,
            kind,
            reference: reference.to_string(),
        })
        .await;
    assert_eq!(ack, Some(upload_ack(kind)));

    let ack = ctx
        .handle(InboundEvent::Text {
            chat_id,
            text: keywords.to_string(),
        })
        .await;
    assert_eq!(ack.as_deref(), Some(COMMIT_ACK));
}

fn ids(results: &[InlineResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn indexed_media_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let ctx = open(dir.path());
        index(&ctx, 1, MediaKind::Sticker, "s1", "Doge, wow").await;
        index(&ctx, 2, MediaKind::Photo, "p1", "dog").await;
        index(&ctx, 1, MediaKind::Animated, "g1", "dog, dance").await;
    }

    for kind in MediaKind::ALL {
        assert!(dir.path().join(kind.default_file_name()).exists());
    }

    let ctx = open(dir.path());
    let answer = ctx.answer("do");
    assert_eq!(ids(&answer.results), vec!["g1", "s1", "p1"]);
    assert_eq!(answer.cache_time_secs, 10);
}

#[tokio::test]
async fn caption_query_puts_rendered_photos_first() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = open(dir.path());
    index(&ctx, 1, MediaKind::Photo, "p1", "cat").await;
    index(&ctx, 1, MediaKind::Sticker, "s1", "cat").await;

    let answer = ctx.answer("cat,such caption,much wow");
    assert_eq!(ids(&answer.results), vec!["p1,captioned", "s1", "p1"]);
    assert_eq!(
        answer.results[0].source,
        ResultSource::Rendered(
            Url::parse("https://memes.example.com/caption/p1/such%20caption/much%20wow").unwrap()
        )
    );
}

#[tokio::test]
async fn keywords_only_attach_to_the_latest_upload() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = open(dir.path());

    ctx.handle(InboundEvent::Upload {
        chat_id: 5,
        kind: MediaKind::Sticker,
        reference: "s-old".to_string(),
    })
    .await;
    index(&ctx, 5, MediaKind::Photo, "p-new", "fresh").await;

    assert_eq!(ids(&ctx.answer("fresh").results), vec!["p-new"]);

    // The pending slot was consumed; more text is just chatter.
    let reply = ctx
        .handle(InboundEvent::Text {
            chat_id: 5,
            text: "more".to_string(),
        })
        .await;
    assert_eq!(reply, None);
    assert!(ctx.answer("more").results.is_empty());
}

#[tokio::test]
async fn chats_do_not_share_pending_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = open(dir.path());

    ctx.handle(InboundEvent::Upload {
        chat_id: 1,
        kind: MediaKind::Photo,
        reference: "p1".to_string(),
    })
    .await;

    let reply = ctx
        .handle(InboundEvent::Text {
            chat_id: 2,
            text: "stolen".to_string(),
        })
        .await;
    assert_eq!(reply, None);
    assert_eq!(ctx.pending().len(), 1);
}

#[tokio::test]
async fn malformed_file_is_preserved_and_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let stickers = dir.path().join(MediaKind::Sticker.default_file_name());
    std::fs::write(&stickers, "{ not json").unwrap();

    let ctx = open(dir.path());
    assert!(ctx.answer("").results.is_empty());

    let preserved: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().contains(".corrupt-"))
        .collect();
    assert_eq!(preserved.len(), 1);

    index(&ctx, 1, MediaKind::Sticker, "s1", "hello").await;
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&stickers).unwrap()).unwrap();
    assert_eq!(saved, serde_json::json!({ "hello": ["s1"] }));
}
