//! Scheduled announcements: creation from a user-given time of day, and the delivery sweep.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use dispatch::RecordingSender;
use herald_core::{markdown, BotContentType};
use storage::{AnnouncementRepository, ScheduledAnnouncement};
use tracing::{error, info, instrument};

use crate::job::ScheduledJob;
use crate::trigger::next_occurrence;

/// Parses `HH:MM` (24h). Single-digit hours are accepted.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let (hour, minute) = text.trim().split_once(':')?;
    if minute.len() != 2 {
        return None;
    }
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

/// Stores an announcement for the next occurrence of `time` after `now`. `escaped_text` must
/// already be MarkdownV2-escaped; it is sent verbatim.
pub async fn schedule_announcement(
    repo: &AnnouncementRepository,
    chat_id: i64,
    time: NaiveTime,
    escaped_text: &str,
    now: DateTime<Utc>,
) -> storage::Result<ScheduledAnnouncement> {
    let fire_at = next_occurrence(now, time);
    let id = repo.add(chat_id, escaped_text, fire_at).await?;
    Ok(ScheduledAnnouncement {
        id,
        chat_id,
        message_text: escaped_text.to_string(),
        schedule_at: fire_at,
        sent: false,
        created_at: now,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sent: usize,
    pub failed: usize,
}

/// Sends every due, unsent announcement and marks it sent. A failed send leaves the row
/// unsent for the next sweep and does not stop the others.
#[derive(Clone)]
pub struct AnnouncementSweep {
    repo: AnnouncementRepository,
    sender: RecordingSender,
}

impl AnnouncementSweep {
    pub fn new(repo: AnnouncementRepository, sender: RecordingSender) -> Self {
        Self { repo, sender }
    }

    #[instrument(skip(self))]
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> anyhow::Result<SweepReport> {
        let due = self.repo.due(now).await?;
        let mut report = SweepReport::default();

        for announcement in due {
            let body = format!(
                "📢 {}\n\n{}",
                markdown::bold("Announcement!"),
                announcement.message_text
            );
            let sent = self
                .sender
                .send_markdown(
                    announcement.chat_id,
                    body,
                    BotContentType::ScheduledAnnouncement,
                    None,
                )
                .await;

            match sent {
                Ok(_) => match self.repo.mark_sent(announcement.id).await {
                    Ok(_) => {
                        info!(id = announcement.id, chat_id = announcement.chat_id, "Announcement sent");
                        report.sent += 1;
                    }
                    Err(e) => {
                        error!(id = announcement.id, error = %e, "Announcement sent but not marked");
                        report.failed += 1;
                    }
                },
                Err(e) => {
                    error!(id = announcement.id, error = %e, "Failed to send announcement");
                    report.failed += 1;
                }
            }
        }

        if report.sent + report.failed > 0 {
            info!(sent = report.sent, failed = report.failed, "Announcement sweep finished");
        }
        Ok(report)
    }
}

#[async_trait]
impl ScheduledJob for AnnouncementSweep {
    async fn run(&self) -> anyhow::Result<()> {
        self.sweep_at(Utc::now()).await.map(|_| ())
    }
}
