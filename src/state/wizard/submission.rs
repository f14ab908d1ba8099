//! Submission of a completed wizard

use super::flow::{Wizard, WizardForm};
use super::machine::StepId;
use crate::state::forms::FormPolicy;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Default bound on the creation call
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a submission did not go through. Every variant is recoverable: the
/// form is kept so the operator can fix it or retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("{count} champ(s) invalide(s) à l'étape « {step} »")]
    Validation { step: &'static str, count: usize },
    #[error("une soumission est déjà en cours")]
    Busy,
    #[error("la création a échoué : {0}")]
    Rejected(String),
    #[error("le service n'a pas répondu après {}s", .0.as_secs())]
    TimedOut(Duration),
    #[error("soumission annulée")]
    Cancelled,
}

/// Generated identity of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionStamp {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl SubmissionStamp {
    pub fn generate() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// A wizard form that turns into a creation payload
pub trait Submittable: WizardForm {
    type Payload: Clone + fmt::Debug + Send + 'static;

    fn build_payload<R: Rng + ?Sized>(
        &self,
        stamp: SubmissionStamp,
        policy: &FormPolicy,
        rng: &mut R,
    ) -> Self::Payload;
}

/// Gate around the external creation call of one wizard.
///
/// `busy` is set between [`SubmissionController::begin`] and
/// [`SubmissionController::finish`]; while it is set no other submission can
/// start.
#[derive(Debug, Clone)]
pub struct SubmissionController {
    busy: bool,
    timeout: Duration,
}

impl Default for SubmissionController {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMIT_TIMEOUT)
    }
}

impl SubmissionController {
    pub fn new(timeout: Duration) -> Self {
        Self {
            busy: false,
            timeout,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate the last step and assemble the payload.
    ///
    /// Nothing is sent on failure. On success the controller is busy until
    /// [`SubmissionController::finish`] is called.
    pub fn begin<F: Submittable>(
        &mut self,
        wizard: &mut Wizard<F>,
    ) -> Result<F::Payload, SubmitError> {
        if self.busy {
            return Err(SubmitError::Busy);
        }
        if let Err(count) = wizard.validate_final() {
            return Err(SubmitError::Validation {
                step: F::Step::last().label(),
                count,
            });
        }
        let payload = wizard.form().build_payload(
            SubmissionStamp::generate(),
            wizard.policy(),
            &mut rand::thread_rng(),
        );
        self.busy = true;
        tracing::debug!("Submission started");
        Ok(payload)
    }

    /// Record the outcome of the creation call.
    ///
    /// Success resets the wizard; failure leaves the form untouched.
    pub fn finish<F: WizardForm>(
        &mut self,
        wizard: &mut Wizard<F>,
        outcome: Result<(), SubmitError>,
    ) -> Result<(), SubmitError> {
        self.busy = false;
        match outcome {
            Ok(()) => {
                wizard.reset();
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Submission failed: {err}");
                Err(err)
            }
        }
    }

    /// Full submission: [`begin`](Self::begin), the bounded creation call,
    /// then [`finish`](Self::finish)
    #[allow(dead_code)]
    pub async fn submit<F, C, Fut>(
        &mut self,
        wizard: &mut Wizard<F>,
        create: C,
    ) -> Result<F::Payload, SubmitError>
    where
        F: Submittable,
        C: FnOnce(F::Payload) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let payload = self.begin(wizard)?;
        let outcome = run_bounded(self.timeout, create(payload.clone())).await;
        self.finish(wizard, outcome).map(|()| payload)
    }
}

/// Await a creation call under a timeout, mapping its failure
pub async fn run_bounded<Fut>(limit: Duration, call: Fut) -> Result<(), SubmitError>
where
    Fut: Future<Output = anyhow::Result<()>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(SubmitError::Rejected(format!("{err:#}"))),
        Err(_) => Err(SubmitError::TimedOut(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoffice::{BackOfficeTrait, MockBackOfficeTrait};
    use crate::state::forms::{
        AgentField, AgentForm, AmountField, AssignmentField, AccountField, IdentityField,
        RecipientField, SenderField, TransferField, TransferForm, TransferPayload, TransferStatus,
        TransferStep,
    };
    use crate::state::wizard::Position;
    use crate::state::Agency;
    use anyhow::anyhow;
    use regex::Regex;
    use std::sync::{Arc, Mutex};

    fn agencies() -> Vec<Agency> {
        vec![
            Agency::new("AG-DKR-01", "Dakar Plateau", "Sénégal", "Dakar"),
            Agency::new("AG-BKO-01", "Bamako Centre", "Mali", "Bamako"),
        ]
    }

    fn summary_wizard() -> Wizard<TransferForm> {
        let mut w = Wizard::new(FormPolicy::default());
        w.update(TransferField::Expediteur(SenderField::Nom), "Diop");
        w.update(TransferField::Expediteur(SenderField::Prenom), "Awa");
        w.update(TransferField::Expediteur(SenderField::Telephone), "+221771234567");
        w.update(TransferField::Expediteur(SenderField::Email), "awa.diop@example.com");
        w.update(TransferField::Expediteur(SenderField::Pays), "Sénégal");
        w.update(TransferField::Expediteur(SenderField::PieceIdentite), "P-889900");
        assert!(w.next());
        w.update(TransferField::Destinataire(RecipientField::Nom), "Traoré");
        w.update(TransferField::Destinataire(RecipientField::Prenom), "Issa");
        w.update(TransferField::Destinataire(RecipientField::Telephone), "+223 70 11 22 33");
        w.update(TransferField::Destinataire(RecipientField::Pays), "Mali");
        w.select(
            TransferField::Destinataire(RecipientField::Agence),
            "AG-BKO-01",
            &agencies(),
        );
        assert!(w.next());
        w.update(TransferField::Transfert(AmountField::Montant), "500");
        w.update(TransferField::Transfert(AmountField::Motif), "Soutien familial");
        assert!(w.next());
        assert!(w.is_summary());
        w
    }

    mod submit {
        use super::*;

        #[tokio::test]
        async fn test_full_flow_produces_pending_payload() {
            let mut w = summary_wizard();
            let mut controller = SubmissionController::default();
            let sent: Arc<Mutex<Vec<TransferPayload>>> = Arc::default();
            let sink = Arc::clone(&sent);

            let payload = controller
                .submit(&mut w, |p| async move {
                    sink.lock().map_err(|_| anyhow!("poisoned"))?.push(p);
                    Ok(())
                })
                .await
                .expect("submission succeeds");

            assert!(!payload.id.is_empty());
            let code = Regex::new(r"^RC[A-Z0-9]{6}$").unwrap();
            assert!(code.is_match(&payload.code_retrait), "{}", payload.code_retrait);
            assert_eq!(payload.statut, TransferStatus::EnAttente);
            assert_eq!(payload.statut.as_str(), "en_attente");
            assert_eq!(payload.montant, 500);
            assert_eq!(payload.frais, 15);
            assert_eq!(payload.total, 515);
            assert_eq!(payload.destinataire.agence_nom, "Bamako Centre");
            assert_eq!(sent.lock().unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_success_resets_wizard() {
            let mut w = summary_wizard();
            let mut controller = SubmissionController::default();
            controller
                .submit(&mut w, |_| async { Ok(()) })
                .await
                .expect("submission succeeds");
            assert_eq!(w.form(), &TransferForm::default());
            assert_eq!(w.position(), Position::Step(TransferStep::Expediteur));
            assert!(w.errors().is_empty());
            assert!(!controller.is_busy());
        }

        #[tokio::test]
        async fn test_invalid_final_step_never_calls_create() {
            let mut w: Wizard<TransferForm> = Wizard::new(FormPolicy::default());
            let mut controller = SubmissionController::default();
            let called = Arc::new(Mutex::new(false));
            let flag = Arc::clone(&called);

            let err = controller
                .submit(&mut w, |_| async move {
                    *flag.lock().unwrap() = true;
                    Ok(())
                })
                .await
                .unwrap_err();

            assert!(matches!(err, SubmitError::Validation { count: 2, .. }));
            assert!(!*called.lock().unwrap());
            assert!(!controller.is_busy());
            assert!(w
                .errors()
                .contains(TransferField::Transfert(AmountField::Montant)));
        }

        #[tokio::test]
        async fn test_rejection_keeps_form_for_retry() {
            let mut w = summary_wizard();
            let before = w.form().clone();
            let mut controller = SubmissionController::default();

            let err = controller
                .submit(&mut w, |_| async { Err(anyhow!("agence fermée")) })
                .await
                .unwrap_err();

            assert_eq!(err, SubmitError::Rejected("agence fermée".to_string()));
            assert_eq!(w.form(), &before);
            assert!(w.is_summary());
            assert!(!controller.is_busy());

            let retried = controller.submit(&mut w, |_| async { Ok(()) }).await;
            assert!(retried.is_ok());
        }

        #[tokio::test]
        async fn test_slow_call_times_out() {
            let mut w = summary_wizard();
            let mut controller = SubmissionController::new(Duration::from_millis(20));

            let err = controller
                .submit(&mut w, |_| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                })
                .await
                .unwrap_err();

            assert_eq!(err, SubmitError::TimedOut(Duration::from_millis(20)));
            assert!(w.is_summary());
            assert!(!controller.is_busy());
        }

        #[tokio::test]
        async fn test_mocked_service_failure_is_recoverable() {
            let mut mock = MockBackOfficeTrait::new();
            mock.expect_create_transfer()
                .times(1)
                .returning(|_| Err(anyhow!("service indisponible")));
            let backend: Arc<dyn BackOfficeTrait> = Arc::new(mock);

            let mut w = summary_wizard();
            let mut controller = SubmissionController::default();
            let err = controller
                .submit(&mut w, |p| async move { backend.create_transfer(p).await })
                .await
                .unwrap_err();

            assert!(matches!(err, SubmitError::Rejected(ref m) if m.contains("indisponible")));
            assert!(w.is_summary());
        }
    }

    mod busy_gate {
        use super::*;

        #[test]
        fn test_second_begin_is_refused_while_busy() {
            let mut w = summary_wizard();
            let mut controller = SubmissionController::default();
            assert!(controller.begin(&mut w).is_ok());
            assert!(controller.is_busy());
            assert_eq!(controller.begin(&mut w).unwrap_err(), SubmitError::Busy);
        }

        #[test]
        fn test_cancel_clears_busy_and_keeps_form() {
            let mut w = summary_wizard();
            let before = w.form().clone();
            let mut controller = SubmissionController::default();
            controller.begin(&mut w).expect("valid");
            let result = controller.finish(&mut w, Err(SubmitError::Cancelled));
            assert_eq!(result, Err(SubmitError::Cancelled));
            assert!(!controller.is_busy());
            assert_eq!(w.form(), &before);
        }

        #[test]
        fn test_each_begin_generates_fresh_identity() {
            let mut w = summary_wizard();
            let mut controller = SubmissionController::default();
            let first = controller.begin(&mut w).expect("valid");
            controller
                .finish(&mut w, Err(SubmitError::Cancelled))
                .unwrap_err();
            let second = controller.begin(&mut w).expect("valid");
            assert_ne!(first.id, second.id);
        }
    }

    mod agent {
        use super::*;

        #[tokio::test]
        async fn test_agent_submission_defaults_to_active() {
            let mut w: Wizard<AgentForm> = Wizard::new(FormPolicy::default());
            w.update(AgentField::Identite(IdentityField::Nom), "Sow");
            w.update(AgentField::Identite(IdentityField::Prenom), "Mariama");
            w.update(AgentField::Identite(IdentityField::Email), "m.sow@ricash.com");
            w.update(AgentField::Identite(IdentityField::Telephone), "+221 78 000 11 22");
            assert!(w.next());
            w.update(AgentField::Affectation(AssignmentField::Pays), "Sénégal");
            w.select(
                AgentField::Affectation(AssignmentField::Agence),
                "AG-DKR-01",
                &agencies(),
            );
            w.update(AgentField::Affectation(AssignmentField::Role), "caissier");
            assert!(w.next());
            w.update(AgentField::Compte(AccountField::Identifiant), "msow");
            w.update(AgentField::Compte(AccountField::MotDePasse), "secret123");
            w.update(AgentField::Compte(AccountField::Confirmation), "secret123");
            assert!(w.next());

            let mut controller = SubmissionController::default();
            let payload = controller
                .submit(&mut w, |_| async { Ok(()) })
                .await
                .expect("submission succeeds");
            assert_eq!(payload.statut.as_str(), "actif");
            assert_eq!(payload.agence_nom, "Dakar Plateau");
            assert_eq!(w.form(), &AgentForm::default());
        }
    }

    #[test]
    fn test_submit_error_messages() {
        assert_eq!(
            SubmitError::Validation {
                step: "Montant",
                count: 2
            }
            .to_string(),
            "2 champ(s) invalide(s) à l'étape « Montant »"
        );
        assert_eq!(
            SubmitError::TimedOut(Duration::from_secs(15)).to_string(),
            "le service n'a pas répondu après 15s"
        );
    }

    #[tokio::test]
    async fn test_run_bounded_maps_outcomes() {
        let ok = run_bounded(Duration::from_secs(1), async { Ok(()) }).await;
        assert_eq!(ok, Ok(()));
        let rejected =
            run_bounded(Duration::from_secs(1), async { Err(anyhow!("refusé")) }).await;
        assert_eq!(rejected, Err(SubmitError::Rejected("refusé".to_string())));
    }
}
