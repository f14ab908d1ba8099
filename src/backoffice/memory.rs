//! In-process back office used by the console and the tests

use super::traits::BackOfficeTrait;
use crate::state::{Agency, Agent, AgentPayload, TransferPayload, TransferStatus};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::RwLock;

/// Agencies the service starts with
fn seed_agencies() -> Vec<Agency> {
    vec![
        Agency::new("AG-DKR-01", "Dakar Plateau", "Sénégal", "Dakar"),
        Agency::new("AG-DKR-02", "Dakar Médina", "Sénégal", "Dakar"),
        Agency::new("AG-THS-01", "Thiès Gare", "Sénégal", "Thiès"),
        Agency::new("AG-BKO-01", "Bamako Centre", "Mali", "Bamako"),
        Agency::new("AG-ABJ-01", "Abidjan Plateau", "Côte d'Ivoire", "Abidjan"),
        Agency::new("AG-PAR-01", "Paris Château Rouge", "France", "Paris"),
    ]
}

#[derive(Debug, Default)]
struct Store {
    agencies: Vec<Agency>,
    transfers: Vec<TransferPayload>,
    agents: Vec<Agent>,
}

impl Store {
    fn agency(&self, id: &str) -> Result<&Agency> {
        self.agencies
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| anyhow!("agence inconnue : {id}"))
    }
}

/// Back office held in memory, answering after a fixed latency
#[derive(Debug)]
pub struct InMemoryBackOffice {
    store: RwLock<Store>,
    latency: Duration,
}

impl Default for InMemoryBackOffice {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl InMemoryBackOffice {
    pub fn new(latency: Duration) -> Self {
        Self::with_agencies(seed_agencies(), latency)
    }

    pub fn with_agencies(agencies: Vec<Agency>, latency: Duration) -> Self {
        Self {
            store: RwLock::new(Store {
                agencies,
                ..Store::default()
            }),
            latency,
        }
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl BackOfficeTrait for InMemoryBackOffice {
    async fn list_agencies(&self) -> Result<Vec<Agency>> {
        self.delay().await;
        Ok(self.store.read().await.agencies.clone())
    }

    async fn list_transfers(&self) -> Result<Vec<TransferPayload>> {
        self.delay().await;
        Ok(self.store.read().await.transfers.clone())
    }

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.delay().await;
        Ok(self.store.read().await.agents.clone())
    }

    async fn create_transfer(&self, transfer: TransferPayload) -> Result<()> {
        self.delay().await;
        let mut store = self.store.write().await;
        if store.transfers.iter().any(|t| t.id == transfer.id) {
            bail!("le transfert {} existe déjà", transfer.id);
        }
        let agency = store.agency(&transfer.destinataire.agence)?;
        if agency.pays != transfer.destinataire.pays {
            bail!(
                "l'agence {} n'est pas située en {}",
                agency.nom,
                transfer.destinataire.pays
            );
        }
        let expected_total = transfer.montant.saturating_add(transfer.frais);
        if transfer.montant == 0 || transfer.total != expected_total {
            bail!("montant incohérent");
        }
        tracing::info!(
            id = %transfer.id,
            agence = %transfer.destinataire.agence,
            total = transfer.total,
            "Transfer created"
        );
        store.transfers.push(transfer);
        Ok(())
    }

    async fn create_agent(&self, agent: AgentPayload) -> Result<()> {
        self.delay().await;
        let mut store = self.store.write().await;
        if store.agents.iter().any(|a| a.id == agent.id) {
            bail!("l'agent {} existe déjà", agent.id);
        }
        store.agency(&agent.agence)?;
        if store
            .agents
            .iter()
            .any(|a| a.identifiant.eq_ignore_ascii_case(&agent.identifiant))
        {
            bail!("l'identifiant {} est déjà utilisé", agent.identifiant);
        }
        tracing::info!(id = %agent.id, identifiant = %agent.identifiant, "Agent created");
        store.agents.push(Agent::from(&agent));
        Ok(())
    }

    async fn set_transfer_status(&self, id: &str, status: TransferStatus) -> Result<()> {
        self.delay().await;
        let mut store = self.store.write().await;
        let transfer = store
            .transfers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("transfert introuvable : {id}"))?;
        if !transfer.statut.can_become(status) {
            bail!(
                "un transfert {} ne peut pas passer à {}",
                transfer.statut.label().to_lowercase(),
                status.label().to_lowercase()
            );
        }
        transfer.statut = status;
        tracing::info!(id, statut = %status, "Transfer status changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::wizard::{SubmissionStamp, Submittable};
    use crate::state::{AgentForm, FormPolicy, RecipientSection, SenderSection};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn transfer(id: &str, agence: &str, pays: &str) -> TransferPayload {
        TransferPayload {
            id: id.to_string(),
            expediteur: SenderSection::default(),
            destinataire: RecipientSection {
                agence: agence.to_string(),
                pays: pays.to_string(),
                ..RecipientSection::default()
            },
            montant: 500,
            frais: 15,
            total: 515,
            devise: "XOF".to_string(),
            motif: "Famille".to_string(),
            code_retrait: "RCAAAAAA".to_string(),
            statut: TransferStatus::EnAttente,
            date_creation: chrono::Utc::now(),
        }
    }

    fn agent(id: &str, login: &str) -> AgentPayload {
        let mut payload = AgentForm::default().build_payload(
            SubmissionStamp::generate(),
            &FormPolicy::default(),
            &mut StdRng::seed_from_u64(1),
        );
        payload.id = id.to_string();
        payload.identifiant = login.to_string();
        payload.agence = "AG-BKO-01".to_string();
        payload
    }

    mod transfers {
        use super::*;

        #[tokio::test]
        async fn test_create_then_list() {
            let backend = InMemoryBackOffice::default();
            backend
                .create_transfer(transfer("t1", "AG-DKR-01", "Sénégal"))
                .await
                .unwrap();
            let listed = backend.list_transfers().await.unwrap();
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0].id, "t1");
        }

        #[tokio::test]
        async fn test_duplicate_id_rejected() {
            let backend = InMemoryBackOffice::default();
            backend
                .create_transfer(transfer("t1", "AG-DKR-01", "Sénégal"))
                .await
                .unwrap();
            let err = backend
                .create_transfer(transfer("t1", "AG-DKR-01", "Sénégal"))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("existe déjà"));
        }

        #[tokio::test]
        async fn test_unknown_or_foreign_agency_rejected() {
            let backend = InMemoryBackOffice::default();
            assert!(backend
                .create_transfer(transfer("t1", "AG-XXX-01", "Sénégal"))
                .await
                .is_err());
            assert!(backend
                .create_transfer(transfer("t2", "AG-BKO-01", "Sénégal"))
                .await
                .is_err());
            assert!(backend.list_transfers().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_status_decided_once() {
            let backend = InMemoryBackOffice::default();
            backend
                .create_transfer(transfer("t1", "AG-BKO-01", "Mali"))
                .await
                .unwrap();
            backend
                .set_transfer_status("t1", TransferStatus::Valide)
                .await
                .unwrap();
            assert!(backend
                .set_transfer_status("t1", TransferStatus::Rejete)
                .await
                .is_err());
            assert!(backend
                .set_transfer_status("inconnu", TransferStatus::Valide)
                .await
                .is_err());
            let listed = backend.list_transfers().await.unwrap();
            assert_eq!(listed[0].statut, TransferStatus::Valide);
        }

        #[tokio::test]
        async fn test_latency_is_applied() {
            let backend = InMemoryBackOffice::new(Duration::from_millis(30));
            let started = tokio::time::Instant::now();
            backend.list_agencies().await.unwrap();
            assert!(started.elapsed() >= Duration::from_millis(30));
        }
    }

    mod agents {
        use super::*;

        #[tokio::test]
        async fn test_logins_are_unique() {
            let backend = InMemoryBackOffice::default();
            backend.create_agent(agent("a1", "msow")).await.unwrap();
            let err = backend
                .create_agent(agent("a2", "MSOW"))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("déjà utilisé"));
            assert_eq!(backend.list_agents().await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_unknown_agency_rejected() {
            let backend = InMemoryBackOffice::default();
            let mut payload = agent("a1", "msow");
            payload.agence = "AG-XXX".to_string();
            assert!(backend.create_agent(payload).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_seeded_agencies() {
        let backend = InMemoryBackOffice::default();
        let agencies = backend.list_agencies().await.unwrap();
        assert!(agencies.iter().any(|a| a.pays == "Mali"));
        assert!(agencies.iter().any(|a| a.pays == "Côte d'Ivoire"));
    }
}
