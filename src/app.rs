//! Application state and core logic

use crate::backoffice::BackOfficeTrait;
use crate::config::RicashConfig;
use crate::state::wizard::{run_bounded, SubmitError};
use crate::state::{AppState, FormState, TransferStatus, View};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Outcome of a background creation call, tagged with its submission number
type Outcome = (u64, Result<(), SubmitError>);

/// Creation call running on a background task
struct PendingSubmission {
    seq: u64,
    handle: JoinHandle<()>,
    /// Status message shown when the call succeeds
    success_message: String,
}

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    /// Back-office service
    backend: Arc<dyn BackOfficeTrait>,
    config: RicashConfig,
    /// Whether the app should quit
    quit: bool,
    /// Feedback shown in the status bar until the next key press
    pub status_message: Option<String>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
    pending: Option<PendingSubmission>,
    /// Last cancelled call: its sequence number and success message
    cancelled: Option<(u64, String)>,
    next_seq: u64,
}

impl App {
    /// Create a new App instance and load the back-office data
    pub async fn new(config: RicashConfig, backend: Arc<dyn BackOfficeTrait>) -> Result<Self> {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            state: AppState::default(),
            backend,
            config,
            quit: false,
            status_message: None,
            outcome_tx,
            outcome_rx,
            pending: None,
            cancelled: None,
            next_seq: 0,
        };
        app.state.agencies = app.backend.list_agencies().await?;
        app.refresh().await;
        Ok(app)
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn config(&self) -> &RicashConfig {
        &self.config
    }

    /// Push an error message to the error queue for display
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.state.push_error(message.into());
    }

    /// Reload transfers and agents from the back office
    pub async fn refresh(&mut self) {
        match self.backend.list_transfers().await {
            Ok(transfers) => self.state.transfers = transfers,
            Err(e) => self.push_error(format!("Impossible de charger les transferts : {e}")),
        }
        match self.backend.list_agents().await {
            Ok(agents) => self.state.agents = agents,
            Err(e) => self.push_error(format!("Impossible de charger les agents : {e}")),
        }
        let len = match self.state.current_view {
            View::Agents => self.state.agents.len(),
            _ => self.state.visible_transfers().len(),
        };
        self.state.clamp_selection(len);
    }

    /// Handle a key event
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Error dialog is modal
        if self.state.current_error().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_error();
            }
            return Ok(());
        }

        // Clear any status messages on key press
        self.status_message = None;

        match self.state.current_view {
            View::Transfers => self.handle_transfers_key(key).await?,
            View::Agents => self.handle_agents_key(key),
            View::TransferCreate | View::AgentCreate => self.handle_wizard_key(key),
        }
        Ok(())
    }

    /// Handle keys in the transfer list
    async fn handle_transfers_key(&mut self, key: KeyEvent) -> Result<()> {
        let count = self.state.visible_transfers().len();
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.state.move_selection_down(count),
            KeyCode::Up | KeyCode::Char('k') => self.state.move_selection_up(),
            KeyCode::Tab | KeyCode::Char('a') => self.state.navigate(View::Agents),
            KeyCode::Char('f') => self.state.cycle_status_filter(),
            KeyCode::Char('n') => self.open_wizard(View::TransferCreate),
            KeyCode::Char('v') => self.decide_selected(TransferStatus::Valide).await,
            KeyCode::Char('r') => self.decide_selected(TransferStatus::Rejete).await,
            KeyCode::Char('y') => self.copy_selected_code(),
            KeyCode::F(5) => self.refresh().await,
            _ => {}
        }
        Ok(())
    }

    /// Handle keys in the agent list
    fn handle_agents_key(&mut self, key: KeyEvent) {
        let count = self.state.agents.len();
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.state.move_selection_down(count),
            KeyCode::Up | KeyCode::Char('k') => self.state.move_selection_up(),
            KeyCode::Tab | KeyCode::Char('t') => self.state.navigate(View::Transfers),
            KeyCode::Char('n') => self.open_wizard(View::AgentCreate),
            _ => {}
        }
    }

    /// Handle keys in either wizard
    fn handle_wizard_key(&mut self, key: KeyEvent) {
        if self.state.form.is_busy() {
            if key.code == KeyCode::Esc {
                self.cancel_submission();
            }
            return;
        }
        if crate::platform::is_confirm(&key) {
            if self.state.form.is_summary() {
                self.start_submission();
            }
            return;
        }
        let agencies = &self.state.agencies;
        let form = &mut self.state.form;
        match key.code {
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Right => form.cycle_choice(true, agencies),
            KeyCode::Left => form.cycle_choice(false, agencies),
            KeyCode::Enter => {
                form.advance();
            }
            KeyCode::Esc if form.is_on_first_step() => self.close_wizard(),
            KeyCode::Esc => form.retreat(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                form.input_char(c)
            }
            _ => {}
        }
    }

    fn open_wizard(&mut self, view: View) {
        let policy = self.config.policy();
        let timeout = self.config.submit_timeout();
        self.state.form = match view {
            View::AgentCreate => FormState::agent(policy, timeout),
            _ => FormState::transfer(policy, timeout),
        };
        self.state.navigate(view);
    }

    fn close_wizard(&mut self) {
        let back = match self.state.current_view {
            View::AgentCreate => View::Agents,
            _ => View::Transfers,
        };
        self.state.form = FormState::None;
        self.state.navigate(back);
    }

    /// Validate the summary and hand the payload to a background task
    fn start_submission(&mut self) {
        let seq = self.next_seq;
        let tx = self.outcome_tx.clone();
        let backend = Arc::clone(&self.backend);

        let started = match &mut self.state.form {
            FormState::None => return,
            FormState::Transfer(session) => session.begin_submit().map(|payload| {
                let limit = session.submission.timeout();
                let message = format!("Transfert créé, code de retrait {}", payload.code_retrait);
                let handle = tokio::spawn(async move {
                    let outcome = run_bounded(limit, backend.create_transfer(payload)).await;
                    let _ = tx.send((seq, outcome));
                });
                (handle, message)
            }),
            FormState::Agent(session) => session.begin_submit().map(|payload| {
                let limit = session.submission.timeout();
                let message = format!("Agent {} créé", payload.identifiant);
                let handle = tokio::spawn(async move {
                    let outcome = run_bounded(limit, backend.create_agent(payload)).await;
                    let _ = tx.send((seq, outcome));
                });
                (handle, message)
            }),
        };

        match started {
            Ok((handle, success_message)) => {
                tracing::info!(seq, "Submission sent to the back office");
                self.next_seq += 1;
                self.pending = Some(PendingSubmission {
                    seq,
                    handle,
                    success_message,
                });
            }
            Err(err) => self.push_error(err.to_string()),
        }
    }

    /// Settle finished creation calls; called once per UI tick
    pub async fn poll_submissions(&mut self) {
        while let Ok((seq, outcome)) = self.outcome_rx.try_recv() {
            if self.pending.as_ref().map(|p| p.seq) == Some(seq) {
                if let Some(pending) = self.pending.take() {
                    self.settle(outcome, pending.success_message).await;
                }
                continue;
            }
            match self.cancelled.take() {
                Some((cancelled_seq, message)) if cancelled_seq == seq && outcome.is_ok() => {
                    self.settle_late_success(message).await;
                }
                other => {
                    self.cancelled = other;
                    tracing::debug!(seq, "Dropping outcome of a cancelled submission");
                }
            }
        }
    }

    /// A cancelled call was already stored by the back office
    async fn settle_late_success(&mut self, success_message: String) {
        tracing::warn!("Cancelled submission was stored anyway: {success_message}");
        if self.state.form.is_busy() {
            self.push_error(format!(
                "L'envoi annulé a tout de même abouti ({success_message}) ; \
                 vérifiez les doublons"
            ));
        } else {
            if self.state.current_view.is_form() {
                self.close_wizard();
            }
            self.status_message = Some(format!("{success_message} malgré l'annulation"));
        }
        self.refresh().await;
    }

    async fn settle(&mut self, outcome: Result<(), SubmitError>, success_message: String) {
        let result = match &mut self.state.form {
            FormState::None => return,
            FormState::Transfer(session) => session.finish_submit(outcome),
            FormState::Agent(session) => session.finish_submit(outcome),
        };
        match result {
            Ok(()) => {
                tracing::info!("{success_message}");
                self.close_wizard();
                self.status_message = Some(success_message);
                self.refresh().await;
            }
            Err(err) => self.push_error(err.to_string()),
        }
    }

    /// Abort the pending creation call; the form is kept
    fn cancel_submission(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.handle.is_finished() {
            // Outcome already queued; the next poll settles it
            self.pending = Some(pending);
            return;
        }
        pending.handle.abort();
        self.cancelled = Some((pending.seq, pending.success_message));
        let result = match &mut self.state.form {
            FormState::None => return,
            FormState::Transfer(session) => session.finish_submit(Err(SubmitError::Cancelled)),
            FormState::Agent(session) => session.finish_submit(Err(SubmitError::Cancelled)),
        };
        if let Err(err) = result {
            self.status_message = Some(err.to_string());
        }
    }

    /// Validate or reject the selected transfer
    async fn decide_selected(&mut self, status: TransferStatus) {
        let Some(id) = self.state.selected_transfer().map(|t| t.id.clone()) else {
            return;
        };
        match self.backend.set_transfer_status(&id, status).await {
            Ok(()) => {
                self.status_message = Some(format!("Transfert {}", status.label().to_lowercase()));
                self.refresh().await;
            }
            Err(e) => self.push_error(format!("Changement de statut impossible : {e}")),
        }
    }

    fn copy_selected_code(&mut self) {
        let Some(code) = self.state.selected_transfer().map(|t| t.code_retrait.clone()) else {
            return;
        };
        match self.copy_to_clipboard(&code) {
            Ok(()) => self.status_message = Some(format!("Code {code} copié")),
            Err(e) => self.push_error(format!("Copie impossible : {e}")),
        }
    }

    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        use arboard::Clipboard;
        let mut clipboard = Clipboard::new()?;
        clipboard.set_text(text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoffice::{InMemoryBackOffice, MockBackOfficeTrait};
    use crate::state::{Agency, AmountField, RecipientField, SenderField, TransferField};
    use anyhow::anyhow;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl_s() -> KeyEvent {
        KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)
    }

    async fn app_with(backend: Arc<dyn BackOfficeTrait>) -> App {
        App::new(RicashConfig::default(), backend)
            .await
            .expect("app starts")
    }

    async fn app() -> App {
        app_with(Arc::new(InMemoryBackOffice::default())).await
    }

    /// Open the transfer wizard and bring it to the summary
    fn fill_transfer(app: &mut App) {
        app.open_wizard(View::TransferCreate);
        let agencies = app.state.agencies.clone();
        let FormState::Transfer(session) = &mut app.state.form else {
            panic!("expected transfer wizard");
        };
        let w = &mut session.wizard;
        w.update(TransferField::Expediteur(SenderField::Nom), "Diop");
        w.update(TransferField::Expediteur(SenderField::Prenom), "Awa");
        w.update(TransferField::Expediteur(SenderField::Telephone), "+221771234567");
        w.update(TransferField::Expediteur(SenderField::Pays), "Sénégal");
        w.update(TransferField::Expediteur(SenderField::PieceIdentite), "CNI 42");
        assert!(w.next());
        w.update(TransferField::Destinataire(RecipientField::Nom), "Traoré");
        w.update(TransferField::Destinataire(RecipientField::Prenom), "Issa");
        w.update(TransferField::Destinataire(RecipientField::Telephone), "70112233");
        w.update(TransferField::Destinataire(RecipientField::Pays), "Mali");
        w.select(
            TransferField::Destinataire(RecipientField::Agence),
            "AG-BKO-01",
            &agencies,
        );
        assert!(w.next());
        w.update(TransferField::Transfert(AmountField::Montant), "500");
        w.update(TransferField::Transfert(AmountField::Motif), "Famille");
        assert!(w.next());
    }

    async fn wait_for_outcome(app: &mut App) {
        for _ in 0..200 {
            app.poll_submissions().await;
            if !app.is_submitting() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("submission never settled");
    }

    mod lists {
        use super::*;

        #[tokio::test]
        async fn test_starts_on_transfers_with_agencies() {
            let app = app().await;
            assert_eq!(app.state.current_view, View::Transfers);
            assert!(!app.state.agencies.is_empty());
            assert!(!app.should_quit());
        }

        #[tokio::test]
        async fn test_tab_switches_lists_and_q_quits() {
            let mut app = app().await;
            app.handle_key(key(KeyCode::Tab)).await.unwrap();
            assert_eq!(app.state.current_view, View::Agents);
            app.handle_key(key(KeyCode::Tab)).await.unwrap();
            assert_eq!(app.state.current_view, View::Transfers);
            app.handle_key(key(KeyCode::Char('q'))).await.unwrap();
            assert!(app.should_quit());
        }

        #[tokio::test]
        async fn test_n_opens_wizards() {
            let mut app = app().await;
            app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
            assert_eq!(app.state.current_view, View::TransferCreate);
            assert!(matches!(app.state.form, FormState::Transfer(_)));
            app.handle_key(key(KeyCode::Esc)).await.unwrap();
            assert_eq!(app.state.current_view, View::Transfers);
            assert!(matches!(app.state.form, FormState::None));

            app.state.navigate(View::Agents);
            app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
            assert!(matches!(app.state.form, FormState::Agent(_)));
        }

        #[tokio::test]
        async fn test_error_dialog_is_modal() {
            let mut app = app().await;
            app.push_error("boom");
            app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
            assert_eq!(app.state.current_view, View::Transfers);
            app.handle_key(key(KeyCode::Enter)).await.unwrap();
            assert!(app.state.current_error().is_none());
        }
    }

    mod wizard {
        use super::*;

        #[tokio::test]
        async fn test_typing_goes_to_focused_field() {
            let mut app = app().await;
            app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
            for c in "Diop".chars() {
                app.handle_key(key(KeyCode::Char(c))).await.unwrap();
            }
            app.handle_key(key(KeyCode::Tab)).await.unwrap();
            app.handle_key(key(KeyCode::Char('A'))).await.unwrap();
            let FormState::Transfer(session) = &app.state.form else {
                panic!("expected transfer wizard");
            };
            assert_eq!(session.wizard.form().expediteur.nom, "Diop");
            assert_eq!(session.wizard.form().expediteur.prenom, "A");
        }

        #[tokio::test]
        async fn test_enter_on_invalid_step_stays() {
            let mut app = app().await;
            app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
            app.handle_key(key(KeyCode::Enter)).await.unwrap();
            let FormState::Transfer(session) = &app.state.form else {
                panic!("expected transfer wizard");
            };
            assert!(!session.wizard.errors().is_empty());
            assert!(app.state.form.is_on_first_step());
        }

        #[tokio::test]
        async fn test_confirm_outside_summary_does_nothing() {
            let mut app = app().await;
            app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
            app.handle_key(ctrl_s()).await.unwrap();
            assert!(!app.is_submitting());
        }
    }

    mod submission {
        use super::*;

        #[tokio::test]
        async fn test_confirmed_transfer_lands_in_list() {
            let mut app = app().await;
            fill_transfer(&mut app);
            app.handle_key(ctrl_s()).await.unwrap();
            assert!(app.is_submitting());
            assert!(app.state.form.is_busy());
            wait_for_outcome(&mut app).await;

            assert_eq!(app.state.current_view, View::Transfers);
            assert_eq!(app.state.transfers.len(), 1);
            let transfer = &app.state.transfers[0];
            assert_eq!(transfer.total, 515);
            assert_eq!(transfer.statut, TransferStatus::EnAttente);
            let message = app.status_message.clone().unwrap_or_default();
            assert!(message.contains(&transfer.code_retrait));
        }

        #[tokio::test]
        async fn test_validate_then_reject_is_refused() {
            let mut app = app().await;
            fill_transfer(&mut app);
            app.handle_key(ctrl_s()).await.unwrap();
            wait_for_outcome(&mut app).await;

            app.handle_key(key(KeyCode::Char('v'))).await.unwrap();
            assert_eq!(app.state.transfers[0].statut, TransferStatus::Valide);
            app.handle_key(key(KeyCode::Char('r'))).await.unwrap();
            assert!(app.state.current_error().is_some());
            assert_eq!(app.state.transfers[0].statut, TransferStatus::Valide);
        }

        #[tokio::test]
        async fn test_rejected_call_keeps_form_and_reports() {
            let mut mock = MockBackOfficeTrait::new();
            mock.expect_list_agencies().returning(|| {
                Ok(vec![Agency::new("AG-BKO-01", "Bamako Centre", "Mali", "Bamako")])
            });
            mock.expect_list_transfers().returning(|| Ok(Vec::new()));
            mock.expect_list_agents().returning(|| Ok(Vec::new()));
            mock.expect_create_transfer()
                .times(1)
                .returning(|_| Err(anyhow!("agence fermée")));
            let mut app = app_with(Arc::new(mock)).await;

            fill_transfer(&mut app);
            app.handle_key(ctrl_s()).await.unwrap();
            wait_for_outcome(&mut app).await;

            assert_eq!(app.state.current_view, View::TransferCreate);
            assert!(app.state.form.is_summary());
            assert!(!app.state.form.is_busy());
            assert!(app
                .state
                .current_error()
                .is_some_and(|e| e.contains("agence fermée")));
        }

        #[tokio::test]
        async fn test_esc_while_busy_cancels() {
            let mut app = app().await;
            fill_transfer(&mut app);
            app.backend = Arc::new(InMemoryBackOffice::new(Duration::from_secs(30)));

            app.handle_key(ctrl_s()).await.unwrap();
            assert!(app.is_submitting());
            app.handle_key(key(KeyCode::Char('x'))).await.unwrap();
            app.handle_key(key(KeyCode::Esc)).await.unwrap();

            assert!(!app.is_submitting());
            assert!(!app.state.form.is_busy());
            assert!(app.state.form.is_summary());
            assert_eq!(app.status_message.as_deref(), Some("soumission annulée"));

            app.poll_submissions().await;
            assert!(app.state.transfers.is_empty());
        }

        #[tokio::test]
        async fn test_esc_after_completion_does_not_cancel() {
            let mut app = app().await;
            fill_transfer(&mut app);
            app.handle_key(ctrl_s()).await.unwrap();
            for _ in 0..200 {
                if app.pending.as_ref().is_some_and(|p| p.handle.is_finished()) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }

            app.handle_key(key(KeyCode::Esc)).await.unwrap();
            assert!(app.is_submitting());
            assert_ne!(app.status_message.as_deref(), Some("soumission annulée"));

            app.poll_submissions().await;
            assert_eq!(app.state.current_view, View::Transfers);
            assert!(matches!(app.state.form, FormState::None));
            assert_eq!(app.backend.list_transfers().await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_cancelled_call_that_still_lands_closes_wizard() {
            let mut app = app().await;
            fill_transfer(&mut app);
            app.backend = Arc::new(InMemoryBackOffice::new(Duration::from_secs(30)));
            app.handle_key(ctrl_s()).await.unwrap();
            app.handle_key(key(KeyCode::Esc)).await.unwrap();
            assert!(app.state.form.is_summary());

            let (seq, _) = app.cancelled.clone().expect("cancelled call recorded");
            app.outcome_tx.send((seq, Ok(()))).unwrap();
            app.poll_submissions().await;

            assert_eq!(app.state.current_view, View::Transfers);
            assert!(matches!(app.state.form, FormState::None));
            assert!(app
                .status_message
                .as_deref()
                .is_some_and(|m| m.contains("malgré l'annulation")));
        }

        #[tokio::test]
        async fn test_late_failure_of_cancelled_call_is_dropped() {
            let mut app = app().await;
            fill_transfer(&mut app);
            app.backend = Arc::new(InMemoryBackOffice::new(Duration::from_secs(30)));
            app.handle_key(ctrl_s()).await.unwrap();
            app.handle_key(key(KeyCode::Esc)).await.unwrap();

            let (seq, _) = app.cancelled.clone().expect("cancelled call recorded");
            app.outcome_tx
                .send((seq, Err(SubmitError::TimedOut(Duration::from_secs(15)))))
                .unwrap();
            app.poll_submissions().await;

            assert!(app.state.form.is_summary());
            assert!(app.state.current_error().is_none());
        }
    }
}
