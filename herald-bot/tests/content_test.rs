//! Content jobs and route handlers against an in-memory database and a recording bot.

mod common;

use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use common::{
    harness, harness_with, noon, stored_tag, MockBot, MockGenerator, StaticVideo, OWNER_ID,
    REPORT_CHAT,
};
use dispatch::{Route, RouteHandlers};
use herald_bot::ContentJob;
use herald_core::{Message, ToCoreMessage, WireMessage};
use prompt::{ChatMessage, MessageRole};
use serde_json::json;
use storage::MessageRecord;

const GROUP: i64 = -42;

fn wire(value: serde_json::Value) -> Message {
    serde_json::from_value::<WireMessage>(value)
        .expect("wire message")
        .to_core()
}

fn group_message(id: i64, user_id: i64, text: &str) -> Message {
    wire(json!({
        "message_id": id,
        "date": 1715947200,
        "chat": { "id": GROUP, "type": "supergroup", "title": "Experts" },
        "from": { "id": user_id, "is_bot": false, "first_name": "Olena", "username": "olena" },
        "text": text
    }))
}

fn at_hour(hour: u32, minute: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, hour, minute, 0).unwrap()
}

/// **Test: The daily report counts today's activity and follows up with the top words.**
///
/// **Setup:** Three human messages and one bot message today in the report chat; two
/// profanity hits today; one human message yesterday.
/// **Action:** Run the daily report.
/// **Expected:** A `daily_report` message with the profanity total, then a `wordcloud_image`
/// message listing "pizza" three times.
#[tokio::test]
async fn test_daily_report_with_activity() {
    let h = harness(MockGenerator::new()).await;
    let messages = &h.components.repos.messages;
    let seed = [
        MessageRecord::new(1, REPORT_CHAT, 10, Some("anna".into()), Some("Pizza tonight? pizza!".into()))
            .with_timestamp(at_hour(9, 0)),
        MessageRecord::new(2, REPORT_CHAT, 10, Some("anna".into()), Some("pizza again".into()))
            .with_timestamp(at_hour(10, 0)),
        MessageRecord::new(3, REPORT_CHAT, 11, Some("bohdan".into()), Some("ok".into()))
            .with_timestamp(at_hour(11, 0)),
        MessageRecord::new(4, REPORT_CHAT, 777, Some("herald_bot".into()), Some("fact".into()))
            .from_bot(Some("random_fact"))
            .with_timestamp(at_hour(11, 30)),
        MessageRecord::new(5, REPORT_CHAT, 10, Some("anna".into()), Some("yesterday words".into()))
            .with_timestamp(at_hour(11, 0) - Duration::days(1)),
    ];
    for record in &seed {
        messages.upsert(record).await.unwrap();
    }
    h.components
        .repos
        .counters
        .increment(REPORT_CHAT, noon().date_naive(), 2)
        .await
        .unwrap();

    h.components
        .content
        .run(ContentJob::DailyReport, REPORT_CHAT)
        .await
        .expect("daily report");

    let sent = h.bot.sent_to(REPORT_CHAT);
    assert_eq!(sent.len(), 2);
    let report = sent[0].text.clone().unwrap();
    assert!(report.contains("17\\.05\\.2024"), "{}", report);
    assert!(report.contains("anna"), "{}", report);
    assert!(report.contains("Profanity detected today\\: *2*"), "{}", report);
    assert!(!report.contains("yesterday"));

    let cloud = sent[1].text.clone().unwrap();
    assert!(cloud.contains("pizza \\(3\\)"), "{}", cloud);
    assert!(!cloud.contains("yesterday"));

    assert_eq!(stored_tag(&h.components, REPORT_CHAT, 500).await.as_deref(), Some("daily_report"));
    assert_eq!(stored_tag(&h.components, REPORT_CHAT, 501).await.as_deref(), Some("wordcloud_image"));
}

#[tokio::test]
async fn test_daily_report_without_words_sends_no_data_notice() {
    let h = harness(MockGenerator::new()).await;
    h.components
        .content
        .daily_report(REPORT_CHAT)
        .await
        .expect("daily report");

    assert_eq!(h.bot.sent_to(REPORT_CHAT).len(), 2);
    assert_eq!(
        stored_tag(&h.components, REPORT_CHAT, 501).await.as_deref(),
        Some("wordcloud_no_data")
    );
}

/// **Test: The morning report renders every briefing field and marks missing ones N/A.**
#[tokio::test]
async fn test_morning_report_from_briefing() {
    let h = harness(MockGenerator::new()).await;
    h.components
        .content
        .morning_report(REPORT_CHAT)
        .await
        .expect("morning report");

    let sent = h.bot.sent_to(REPORT_CHAT);
    assert_eq!(sent.len(), 1);
    let text = sent[0].text.clone().unwrap();
    assert!(text.contains("Friday"), "{}", text);
    assert!(text.contains("Kyiv"), "{}", text);
    assert!(text.contains("N/A"), "{}", text);
    assert!(text.contains("41\\.25"), "{}", text);
    assert!(text.contains("First headline"), "{}", text);
    assert_eq!(stored_tag(&h.components, REPORT_CHAT, 500).await.as_deref(), Some("daily_report"));
}

/// **Test: A failing summary is reported in the chat and returned as an error.**
///
/// **Setup:** The generator fails to summarize.
/// **Action:** Run the summary job.
/// **Expected:** `Err`; one `summary_error` message in the report chat mentioning the cause.
#[tokio::test]
async fn test_summary_failure_reports_error() {
    let mut generator = MockGenerator::new();
    generator
        .expect_summarize()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("quota exceeded")));
    let h = harness(generator).await;

    let result = h.components.content.run(ContentJob::Summary, REPORT_CHAT).await;
    assert!(result.is_err());

    let sent = h.bot.sent_to(REPORT_CHAT);
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.as_deref().unwrap().contains("quota exceeded"));
    assert_eq!(stored_tag(&h.components, REPORT_CHAT, 500).await.as_deref(), Some("summary_error"));
}

/// **Test: A job whose own send fails still returns the error.**
#[tokio::test]
async fn test_reminder_send_failure_is_returned() {
    let h = harness_with(
        MockBot::failing_for(Some(REPORT_CHAT)),
        MockGenerator::new(),
        StaticVideo::Bytes(Vec::new()),
    )
    .await;
    let result = h.components.content.cashback_reminder(REPORT_CHAT).await;
    assert!(result.is_err());
    assert!(h.bot.sent().is_empty());
}

/// **Test: The schedule mention command stores an announcement for the report chat.**
///
/// **Setup:** Clock at 12:00 UTC on 17.05.2024.
/// **Action:** "schedule 18:00 Pizza night!" from a group member.
/// **Expected:** One unsent announcement for the report chat at 18:00 today with escaped text;
/// the reply is tagged `announcement_scheduled`.
#[tokio::test]
async fn test_schedule_command_stores_announcement() {
    let h = harness(MockGenerator::new()).await;
    let msg = group_message(20, 10, "@herald_bot schedule 18:00 Pizza night!");

    h.components
        .handlers
        .mention_command(&msg, "schedule 18:00 Pizza night!")
        .await
        .unwrap();

    let due = h
        .components
        .repos
        .announcements
        .due(noon() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].chat_id, REPORT_CHAT);
    assert_eq!(due[0].message_text, "Pizza night\\!");
    assert_eq!(due[0].schedule_at, at_hour(18, 0));
    assert!(!due[0].sent);

    let reply = h.bot.sent_to(GROUP);
    assert_eq!(reply.len(), 1);
    assert_eq!(reply[0].reply_to, Some(20));
    assert!(reply[0].text.as_deref().unwrap().contains("18:00 UTC"));
    assert_eq!(
        stored_tag(&h.components, GROUP, 500).await.as_deref(),
        Some("announcement_scheduled")
    );
}

#[tokio::test]
async fn test_schedule_command_with_bad_time_sends_usage() {
    let h = harness(MockGenerator::new()).await;
    let msg = group_message(21, 10, "@herald_bot заплануй_анонс 25:99 Nope");

    h.components
        .handlers
        .mention_command(&msg, "заплануй_анонс 25:99 Nope")
        .await
        .unwrap();

    assert!(h
        .components
        .repos
        .announcements
        .due(noon() + Duration::days(2))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        stored_tag(&h.components, GROUP, 500).await.as_deref(),
        Some("announcement_format_error")
    );
}

/// **Test: The expert sees recent history without the question itself.**
///
/// **Setup:** A human line and a bot line precede the question, which is already persisted.
/// **Action:** Mention the bot with "what is rust?".
/// **Expected:** The model gets two history turns (user, assistant) and the question; the answer
/// is a reply tagged `expert_opinion`.
#[tokio::test]
async fn test_expert_history_excludes_current_message() {
    let captured: Arc<Mutex<Vec<ChatMessage>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    let mut generator = MockGenerator::new();
    generator
        .expect_expert_answer()
        .times(1)
        .returning(move |history, question| {
            assert_eq!(question, "what is rust?");
            *sink.lock().unwrap() = history;
            Ok("A language.".to_string())
        });
    let h = harness(generator).await;
    let messages = &h.components.repos.messages;
    messages
        .upsert(
            &MessageRecord::new(1, GROUP, 10, Some("olena".into()), Some("hi all".into()))
                .with_timestamp(at_hour(11, 0)),
        )
        .await
        .unwrap();
    messages
        .upsert(
            &MessageRecord::new(2, GROUP, 777, Some("herald_bot".into()), Some("hello".into()))
                .from_bot(Some("expert_opinion"))
                .with_timestamp(at_hour(11, 1)),
        )
        .await
        .unwrap();
    messages
        .upsert(
            &MessageRecord::new(3, GROUP, 10, Some("olena".into()), Some("@herald_bot what is rust?".into()))
                .with_timestamp(at_hour(11, 2)),
        )
        .await
        .unwrap();

    let msg = group_message(3, 10, "@herald_bot what is rust?");
    h.components
        .handlers
        .mention_command(&msg, "what is rust?")
        .await
        .unwrap();

    let history = captured.lock().unwrap().clone();
    assert_eq!(history.len(), 2);
    assert!(matches!(history[0].role, MessageRole::User));
    assert!(history[0].content.contains("hi all"));
    assert!(matches!(history[1].role, MessageRole::Assistant));
    assert!(history.iter().all(|m| !m.content.contains("what is rust?")));

    assert_eq!(h.bot.sent_to(GROUP)[0].reply_to, Some(3));
    assert_eq!(stored_tag(&h.components, GROUP, 500).await.as_deref(), Some("expert_opinion"));
}

/// **Test: A failed expert answer is tagged so that replying to it does not ask the model again.**
///
/// **Setup:** The generator fails once.
/// **Action:** Mention the bot with a question, then reply to the failure notice.
/// **Expected:** The notice is stored as `expert_error`; the reply is classified as ignored.
#[tokio::test]
async fn test_expert_failure_notice_ends_the_conversation() {
    let mut generator = MockGenerator::new();
    generator
        .expect_expert_answer()
        .times(1)
        .returning(|_, _| Err(anyhow::anyhow!("llm down")));
    let h = harness(generator).await;
    let msg = group_message(6, 10, "@herald_bot what is rust?");

    h.components
        .handlers
        .mention_command(&msg, "what is rust?")
        .await
        .unwrap();

    let tag = stored_tag(&h.components, GROUP, 500).await;
    assert_eq!(tag.as_deref(), Some("expert_error"));

    let reply = wire(json!({
        "message_id": 7,
        "date": 1715947260,
        "chat": { "id": GROUP, "type": "supergroup", "title": "Experts" },
        "from": { "id": 10, "is_bot": false, "first_name": "Olena" },
        "text": "try again?",
        "reply_to_message": {
            "message_id": 500,
            "chat": { "id": GROUP, "type": "supergroup" },
            "from": { "id": common::BOT_ID, "is_bot": true, "first_name": "Herald" },
            "text": "The expert is unavailable right now"
        }
    }));
    let route = dispatch::classify(&reply, &h.components.identity, tag.as_deref());
    assert!(matches!(route, Route::Ignore { .. }));
}

#[tokio::test]
async fn test_empty_mention_sends_hint() {
    let mut generator = MockGenerator::new();
    generator.expect_expert_answer().times(0);
    let h = harness(generator).await;
    let msg = group_message(4, 10, "@herald_bot");

    h.components.handlers.mention_command(&msg, "").await.unwrap();

    assert_eq!(stored_tag(&h.components, GROUP, 500).await.as_deref(), Some("expert_no_query"));
}

/// **Test: The summary mention replies in the asking chat.**
#[tokio::test]
async fn test_summary_mention_replies_with_summary() {
    let mut generator = MockGenerator::new();
    generator
        .expect_summarize()
        .times(1)
        .returning(|_| Ok("Everyone talked about pizza.".to_string()));
    let h = harness(generator).await;
    let msg = group_message(5, 10, "@herald_bot summary");

    h.components
        .handlers
        .mention_command(&msg, "summary")
        .await
        .unwrap();

    let sent = h.bot.sent_to(GROUP);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reply_to, Some(5));
    assert_eq!(stored_tag(&h.components, GROUP, 500).await.as_deref(), Some("ai_summary"));
}

fn forwarded_channel_photo() -> Message {
    wire(json!({
        "message_id": 30,
        "date": 1715947200,
        "chat": { "id": OWNER_ID, "type": "private" },
        "from": { "id": OWNER_ID, "is_bot": false, "first_name": "Owner", "username": "owner" },
        "caption": "Breaking news",
        "photo": [{ "file_id": "small" }, { "file_id": "large" }],
        "forward_origin": {
            "type": "channel",
            "chat": { "id": -1001, "type": "channel", "title": "Daily News", "username": "dailynews" },
            "message_id": 15
        }
    }))
}

/// **Test: A forwarded channel photo is translated, posted to the report chat and confirmed.**
///
/// **Setup:** The generator translates the caption.
/// **Action:** Forward-translate a channel photo post in the owner's private chat.
/// **Expected:** A photo in the report chat whose caption links the source post and carries the
/// translation (`news_forward_photo`); a `translation_confirmation` reply to the owner.
#[tokio::test]
async fn test_forward_translate_posts_to_report_chat() {
    let mut generator = MockGenerator::new();
    generator
        .expect_translate()
        .times(1)
        .returning(|text, language| {
            assert_eq!(text, "Breaking news");
            assert_eq!(language, "Ukrainian");
            Ok("Термінові новини".to_string())
        });
    let h = harness(generator).await;

    h.components
        .handlers
        .forward_translate(&forwarded_channel_photo())
        .await
        .unwrap();

    let posted = h.bot.sent_to(REPORT_CHAT);
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].kind, common::SentKind::Photo);
    let caption = posted[0].text.clone().unwrap();
    assert!(caption.contains("https://t.me/dailynews/15"), "{}", caption);
    assert!(caption.contains("Термінові новини"), "{}", caption);
    assert_eq!(
        stored_tag(&h.components, REPORT_CHAT, 500).await.as_deref(),
        Some("news_forward_photo")
    );

    let confirmation = h.bot.sent_to(OWNER_ID);
    assert_eq!(confirmation.len(), 1);
    assert_eq!(confirmation[0].reply_to, Some(30));
    assert_eq!(
        stored_tag(&h.components, OWNER_ID, 501).await.as_deref(),
        Some("translation_confirmation")
    );
}

#[tokio::test]
async fn test_forward_translate_failure_sends_nothing_to_group() {
    let mut generator = MockGenerator::new();
    generator
        .expect_translate()
        .times(1)
        .returning(|_, _| Err(anyhow::anyhow!("model down")));
    let h = harness(generator).await;

    h.components
        .handlers
        .forward_translate(&forwarded_channel_photo())
        .await
        .unwrap();

    assert!(h.bot.sent_to(REPORT_CHAT).is_empty());
    assert_eq!(
        stored_tag(&h.components, OWNER_ID, 500).await.as_deref(),
        Some("translation_error")
    );
}

#[tokio::test]
async fn test_forward_without_content_is_refused() {
    let mut generator = MockGenerator::new();
    generator.expect_translate().times(0);
    let h = harness(generator).await;
    let msg = wire(json!({
        "message_id": 31,
        "chat": { "id": OWNER_ID, "type": "private" },
        "from": { "id": OWNER_ID, "is_bot": false, "first_name": "Owner" },
        "forward_from": { "id": 8, "is_bot": false, "first_name": "Ivan" }
    }));

    h.components.handlers.forward_translate(&msg).await.unwrap();

    assert!(h.bot.sent_to(REPORT_CHAT).is_empty());
    assert_eq!(
        stored_tag(&h.components, OWNER_ID, 500).await.as_deref(),
        Some("no_content_forward")
    );
}

/// **Test: A downloaded video is uploaded as a reply; an oversized one is refused.**
#[tokio::test]
async fn test_video_download_outcomes() {
    let h = harness(MockGenerator::new()).await;
    let msg = group_message(40, 10, "https://vt.tiktok.com/ZS1/");
    h.components
        .handlers
        .download_video(&msg, "https://vt.tiktok.com/ZS1/")
        .await
        .unwrap();
    let sent = h.bot.sent_to(GROUP);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, common::SentKind::Video);
    assert_eq!(sent[0].reply_to, Some(40));
    assert_eq!(stored_tag(&h.components, GROUP, 500).await.as_deref(), Some("video_upload"));

    let big = harness_with(MockBot::new(), MockGenerator::new(), StaticVideo::TooLarge).await;
    big.components
        .handlers
        .download_video(&msg, "https://vt.tiktok.com/ZS1/")
        .await
        .unwrap();
    let sent = big.bot.sent_to(GROUP);
    assert_eq!(sent[0].kind, common::SentKind::Text);
    assert!(sent[0].text.as_deref().unwrap().contains("64\\.50 MB"));
    assert_eq!(stored_tag(&big.components, GROUP, 500).await.as_deref(), Some("video_too_large"));

    let broken = harness_with(MockBot::new(), MockGenerator::new(), StaticVideo::Unresolvable).await;
    broken
        .components
        .handlers
        .download_video(&msg, "https://vt.tiktok.com/ZS1/")
        .await
        .unwrap();
    assert_eq!(stored_tag(&broken.components, GROUP, 500).await.as_deref(), Some("video_link_error"));
}

#[tokio::test]
async fn test_refusal_text_depends_on_route() {
    let h = harness(MockGenerator::new()).await;
    let msg = wire(json!({
        "message_id": 50,
        "chat": { "id": 999, "type": "private" },
        "from": { "id": 999, "is_bot": false, "first_name": "Stranger" },
        "text": "https://instagram.com/reel/x"
    }));

    h.components
        .handlers
        .refuse(
            &msg,
            &Route::VideoDownload {
                url: "https://instagram.com/reel/x".to_string(),
            },
        )
        .await
        .unwrap();

    let sent = h.bot.sent_to(999);
    assert!(sent[0].text.as_deref().unwrap().contains("video downloads"));
    assert_eq!(stored_tag(&h.components, 999, 500).await.as_deref(), Some("permission_denied"));
}
