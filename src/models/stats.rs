use chrono::{NaiveDate, Utc};
use serde::Serialize;

use super::business::AppointmentStatus;
use super::user_document::UserDocument;

/// Counters returned by the stats lookup (AI chat tool and `/ai/stats`)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusinessStats {
    pub total_clients: usize,
    pub total_appointments: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub upcoming: usize,
    pub today: usize,
    pub ratings_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    pub expenses_count: usize,
}

impl UserDocument {
    pub fn stats(&self) -> BusinessStats {
        self.stats_on(Utc::now().date_naive())
    }

    pub fn stats_on(&self, today: NaiveDate) -> BusinessStats {
        let mut stats = BusinessStats {
            total_clients: self.clients.len(),
            ratings_count: self.ratings.len(),
            expenses_count: self.expenses.len(),
            ..Default::default()
        };

        for appointment in &self.appointments {
            if appointment.status == AppointmentStatus::Blocked {
                continue;
            }
            stats.total_appointments += 1;
            match appointment.status {
                AppointmentStatus::Pending => stats.pending += 1,
                AppointmentStatus::Confirmed => stats.confirmed += 1,
                AppointmentStatus::Completed => stats.completed += 1,
                AppointmentStatus::Cancelled => stats.cancelled += 1,
                AppointmentStatus::Blocked => {}
            }

            let open = matches!(
                appointment.status,
                AppointmentStatus::Pending | AppointmentStatus::Confirmed
            );
            if let Ok(date) = NaiveDate::parse_from_str(&appointment.date, "%Y-%m-%d") {
                if open && date >= today {
                    stats.upcoming += 1;
                }
                if date == today {
                    stats.today += 1;
                }
            }
        }

        if !self.ratings.is_empty() {
            let total: i32 = self.ratings.iter().map(|r| r.score).sum();
            stats.average_rating = Some(total as f64 / self.ratings.len() as f64);
        }

        stats
    }
}
