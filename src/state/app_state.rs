//! Application state definitions

use super::forms::{AgentPayload, AgentStatus, FormState, TransferPayload, TransferStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Current view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Transfers,
    TransferCreate,
    Agents,
    AgentCreate,
}

impl View {
    pub fn is_form(&self) -> bool {
        matches!(self, View::TransferCreate | View::AgentCreate)
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Transfers => "Transferts",
            View::TransferCreate => "Nouveau transfert",
            View::Agents => "Agents",
            View::AgentCreate => "Nouvel agent",
        }
    }
}

/// Status filter for the transfer list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TransferStatus),
}

impl StatusFilter {
    pub fn next(&self) -> Self {
        match self {
            Self::All => Self::Only(TransferStatus::EnAttente),
            Self::Only(TransferStatus::EnAttente) => Self::Only(TransferStatus::Valide),
            Self::Only(TransferStatus::Valide) => Self::Only(TransferStatus::Rejete),
            Self::Only(TransferStatus::Rejete) => Self::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "Tous",
            Self::Only(status) => status.label(),
        }
    }

    pub fn matches(&self, status: TransferStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

/// A Ricash agency where transfers are paid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    pub id: String,
    pub nom: String,
    pub pays: String,
    pub ville: String,
}

impl Agency {
    pub fn new(
        id: impl Into<String>,
        nom: impl Into<String>,
        pays: impl Into<String>,
        ville: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            nom: nom.into(),
            pays: pays.into(),
            ville: ville.into(),
        }
    }
}

/// Distinct countries served by the agencies, sorted
pub fn countries(agencies: &[Agency]) -> Vec<String> {
    agencies
        .iter()
        .map(|a| a.pays.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Agent as listed by the back office; credentials stay server side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    pub pays: String,
    pub agence: String,
    pub agence_nom: String,
    pub role: String,
    pub identifiant: String,
    pub statut: AgentStatus,
    pub date_creation: DateTime<Utc>,
}

impl Agent {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

impl From<&AgentPayload> for Agent {
    fn from(p: &AgentPayload) -> Self {
        Self {
            id: p.id.clone(),
            nom: p.nom.clone(),
            prenom: p.prenom.clone(),
            email: p.email.clone(),
            telephone: p.telephone.clone(),
            pays: p.pays.clone(),
            agence: p.agence.clone(),
            agence_nom: p.agence_nom.clone(),
            role: p.role.clone(),
            identifiant: p.identifiant.clone(),
            statut: p.statut,
            date_creation: p.date_creation,
        }
    }
}

/// Main application state
#[derive(Debug, Default)]
pub struct AppState {
    // Navigation
    pub current_view: View,

    // Data
    pub transfers: Vec<TransferPayload>,
    pub agents: Vec<Agent>,
    pub agencies: Vec<Agency>,

    // Selection
    pub selected_index: usize,
    pub status_filter: StatusFilter,

    // Open wizard
    pub form: FormState,

    // Errors waiting to be acknowledged, oldest first
    pub error_queue: VecDeque<String>,
}

impl AppState {
    /// Move selection down
    pub fn move_selection_down(&mut self, max: usize) {
        if max > 0 && self.selected_index < max - 1 {
            self.selected_index += 1;
        }
    }

    /// Move selection up
    pub fn move_selection_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn reset_selection(&mut self) {
        self.selected_index = 0;
    }

    /// Keep the selection inside a list that may have shrunk
    pub fn clamp_selection(&mut self, len: usize) {
        self.selected_index = self.selected_index.min(len.saturating_sub(1));
    }

    pub fn cycle_status_filter(&mut self) {
        self.status_filter = self.status_filter.next();
        self.reset_selection();
    }

    /// Transfers passing the status filter, newest first
    pub fn visible_transfers(&self) -> Vec<&TransferPayload> {
        let mut transfers: Vec<_> = self
            .transfers
            .iter()
            .filter(|t| self.status_filter.matches(t.statut))
            .collect();
        transfers.sort_by(|a, b| b.date_creation.cmp(&a.date_creation));
        transfers
    }

    pub fn selected_transfer(&self) -> Option<&TransferPayload> {
        self.visible_transfers().get(self.selected_index).copied()
    }

    /// Agents, newest first
    pub fn sorted_agents(&self) -> Vec<&Agent> {
        let mut agents: Vec<_> = self.agents.iter().collect();
        agents.sort_by(|a, b| b.date_creation.cmp(&a.date_creation));
        agents
    }

    pub fn navigate(&mut self, view: View) {
        self.current_view = view;
        self.reset_selection();
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.error_queue.push_back(message.into());
    }

    pub fn current_error(&self) -> Option<&str> {
        self.error_queue.front().map(String::as_str)
    }

    pub fn dismiss_error(&mut self) {
        self.error_queue.pop_front();
    }
}
