use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::business::{
    Appointment, AppointmentStatus, BonusEntry, BusinessProfile, Client, Expense, Rating,
};
use crate::utils::{new_id, now_millis};

/// All of an account's business data. One per email, always saved whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDocument {
    pub business_profile: BusinessProfile,
    pub clients: Vec<Client>,
    pub appointments: Vec<Appointment>,
    pub expenses: Vec<Expense>,
    pub ratings: Vec<Rating>,
    pub bonus_entries: Vec<BonusEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    ClientNotFound(String),
    AppointmentNotFound(String),
    ExpenseNotFound(String),
    AlreadyRated(String),
    InvalidInput(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::ClientNotFound(id) => write!(f, "Client {} not found", id),
            DomainError::AppointmentNotFound(id) => write!(f, "Appointment {} not found", id),
            DomainError::ExpenseNotFound(id) => write!(f, "Expense {} not found", id),
            DomainError::AlreadyRated(id) => write!(f, "Appointment {} was already rated", id),
            DomainError::InvalidInput(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub preferences: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub preferences: Option<String>,
}

/// Booking input. The client is either referenced by id or by name
/// (created on the fly when no client with that name exists).
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BookingRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub appointment: Appointment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_client: Option<Client>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub appointment: Appointment,
    pub previous: AppointmentStatus,
    /// True only when the appointment moved into COMPLETED from another status
    pub entered_completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct NewExpense {
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub amount: f64,
    pub date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBonusEntry {
    pub description: String,
    pub amount: f64,
    pub date: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_date(date: &str) -> Result<(), DomainError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| DomainError::InvalidInput(format!("Invalid date '{}', expected YYYY-MM-DD", date)))
}

fn validate_time(time: &str) -> Result<(), DomainError> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map(|_| ())
        .map_err(|_| DomainError::InvalidInput(format!("Invalid time '{}', expected HH:MM", time)))
}

impl UserDocument {
    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn appointment(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn find_client_by_name(&self, name: &str) -> Option<&Client> {
        let wanted = name.trim().to_lowercase();
        self.clients.iter().find(|c| c.name.trim().to_lowercase() == wanted)
    }

    pub fn add_client(&mut self, input: NewClient) -> Result<Client, DomainError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidInput("Client name is required".to_string()));
        }

        let client = Client {
            id: new_id(),
            name: name.to_string(),
            email: non_empty(input.email),
            phone: non_empty(input.phone),
            notes: non_empty(input.notes),
            preferences: non_empty(input.preferences),
            last_visit: None,
            created_at: now_millis(),
        };
        self.clients.push(client.clone());
        Ok(client)
    }

    pub fn update_client(&mut self, id: &str, patch: ClientPatch) -> Result<Client, DomainError> {
        let client = self
            .clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::ClientNotFound(id.to_string()))?;

        if let Some(name) = non_empty(patch.name) {
            client.name = name;
        }
        if patch.email.is_some() {
            client.email = non_empty(patch.email);
        }
        if patch.phone.is_some() {
            client.phone = non_empty(patch.phone);
        }
        if patch.notes.is_some() {
            client.notes = non_empty(patch.notes);
        }
        if patch.preferences.is_some() {
            client.preferences = non_empty(patch.preferences);
        }
        Ok(client.clone())
    }

    /// Appointments keep their reference to a removed client.
    pub fn remove_client(&mut self, id: &str) -> Result<Client, DomainError> {
        let index = self
            .clients
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| DomainError::ClientNotFound(id.to_string()))?;
        Ok(self.clients.remove(index))
    }

    pub fn book_appointment(&mut self, request: BookingRequest) -> Result<Booking, DomainError> {
        validate_date(&request.date)?;
        validate_time(&request.time)?;

        let status = request.status.unwrap_or_default();
        let mut created_client = None;

        let client_ids = if let Some(client_id) = non_empty(request.client_id) {
            if self.client(&client_id).is_none() {
                return Err(DomainError::ClientNotFound(client_id));
            }
            vec![client_id]
        } else if let Some(name) = non_empty(request.client_name) {
            let existing = self.find_client_by_name(&name).map(|c| c.id.clone());
            match existing {
                Some(existing_id) => vec![existing_id],
                None => {
                    let client = self.add_client(NewClient {
                        name,
                        email: request.client_email,
                        phone: request.client_phone,
                        ..Default::default()
                    })?;
                    let id = client.id.clone();
                    created_client = Some(client);
                    vec![id]
                }
            }
        } else if status == AppointmentStatus::Blocked {
            Vec::new()
        } else {
            return Err(DomainError::InvalidInput(
                "A client id or client name is required".to_string(),
            ));
        };

        let appointment = Appointment {
            id: new_id(),
            client_ids,
            service_id: non_empty(request.service_id),
            date: request.date,
            time: request.time,
            status,
            notes: non_empty(request.notes),
            rating: None,
            created_at: now_millis(),
        };
        self.appointments.push(appointment.clone());

        Ok(Booking { appointment, created_client })
    }

    pub fn set_appointment_status(
        &mut self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<StatusChange, DomainError> {
        let appointment = self
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DomainError::AppointmentNotFound(id.to_string()))?;

        let previous = appointment.status;
        appointment.status = status;
        let appointment = appointment.clone();

        let entered_completed =
            status == AppointmentStatus::Completed && previous != AppointmentStatus::Completed;

        if entered_completed {
            if let Some(client_id) = appointment.primary_client_id() {
                if let Some(client) = self.clients.iter_mut().find(|c| c.id == client_id) {
                    client.last_visit = Some(appointment.date.clone());
                }
            }
        }

        Ok(StatusChange { appointment, previous, entered_completed })
    }

    pub fn remove_appointment(&mut self, id: &str) -> Result<Appointment, DomainError> {
        let index = self
            .appointments
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| DomainError::AppointmentNotFound(id.to_string()))?;
        Ok(self.appointments.remove(index))
    }

    pub fn add_expense(&mut self, input: NewExpense) -> Result<Expense, DomainError> {
        if input.description.trim().is_empty() {
            return Err(DomainError::InvalidInput("Expense description is required".to_string()));
        }
        if !input.amount.is_finite() || input.amount < 0.0 {
            return Err(DomainError::InvalidInput("Expense amount must be a positive number".to_string()));
        }
        validate_date(&input.date)?;

        let expense = Expense {
            id: new_id(),
            description: input.description.trim().to_string(),
            category: non_empty(input.category),
            amount: input.amount,
            date: input.date,
        };
        self.expenses.push(expense.clone());
        Ok(expense)
    }

    pub fn remove_expense(&mut self, id: &str) -> Result<Expense, DomainError> {
        let index = self
            .expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| DomainError::ExpenseNotFound(id.to_string()))?;
        Ok(self.expenses.remove(index))
    }

    pub fn add_bonus_entry(&mut self, input: NewBonusEntry) -> Result<BonusEntry, DomainError> {
        if input.description.trim().is_empty() {
            return Err(DomainError::InvalidInput("Bonus description is required".to_string()));
        }
        validate_date(&input.date)?;

        let entry = BonusEntry {
            id: new_id(),
            description: input.description.trim().to_string(),
            amount: input.amount,
            date: input.date,
        };
        self.bonus_entries.push(entry.clone());
        Ok(entry)
    }

    /// One rating per appointment. A rating for an appointment that no longer
    /// exists is still recorded.
    pub fn record_rating(
        &mut self,
        appointment_id: &str,
        score: i32,
        comment: Option<String>,
    ) -> Result<Rating, DomainError> {
        if !(1..=5).contains(&score) {
            return Err(DomainError::InvalidInput("Score must be between 1 and 5".to_string()));
        }
        if self.ratings.iter().any(|r| r.appointment_id == appointment_id) {
            return Err(DomainError::AlreadyRated(appointment_id.to_string()));
        }

        let rating = Rating {
            id: new_id(),
            appointment_id: appointment_id.to_string(),
            score,
            comment: non_empty(comment),
            created_at: now_millis(),
        };
        self.ratings.push(rating.clone());

        if let Some(appointment) = self.appointments.iter_mut().find(|a| a.id == appointment_id) {
            appointment.rating = Some(score);
        }
        Ok(rating)
    }
}
