//! Interactive terminal front end
//!
//! Reads lines from stdin while chat turns complete in the background.

use crate::auth::{AuthProvider, AuthenticatedUser};
use crate::history::{ClearOutcome, HistoryAggregator, LoadOutcome, CLEAR_CONFIRMATION_PROMPT};
use crate::render;
use crate::session::SessionController;
use crate::state_machine::TransitionError;
use crate::transport::{CatalogTransport, ChatTransport, HistoryTransport};
use crossterm::style::Stylize;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    History,
    Show(usize),
    Clear,
    Symptoms,
    Conditions,
    Logout,
    Quit,
    Help,
    /// Bare number: quick reply selection, or plain text if none matches
    Number(usize),
    Say(String),
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('/') {
            let mut parts = rest.split_whitespace();
            let name = parts.next().unwrap_or_default();
            return match (name, parts.next()) {
                ("new", _) => Command::New,
                ("history", _) => Command::History,
                ("show", Some(n)) => n
                    .parse()
                    .map_or_else(|_| Command::Unknown(trimmed.to_string()), Command::Show),
                ("clear", _) => Command::Clear,
                ("symptoms", _) => Command::Symptoms,
                ("conditions", _) => Command::Conditions,
                ("logout", _) => Command::Logout,
                ("quit" | "exit", _) => Command::Quit,
                ("help", _) => Command::Help,
                _ => Command::Unknown(trimmed.to_string()),
            };
        }
        match trimmed.parse::<usize>() {
            Ok(n) => Command::Number(n),
            Err(_) => Command::Say(line.to_string()),
        }
    }
}

fn clear_notice(outcome: ClearOutcome) -> &'static str {
    match outcome {
        ClearOutcome::Cleared => "History cleared.",
        ClearOutcome::Declined => "Cancelled.",
        ClearOutcome::Superseded => {
            "History cleared on the server. Run /history to refresh the list."
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

struct Repl<'a, T: ChatTransport + HistoryTransport + CatalogTransport + 'static, A> {
    transport: Arc<T>,
    auth: &'a A,
    user: AuthenticatedUser,
    controller: SessionController<T>,
    history: HistoryAggregator<T>,
    lines: Lines<BufReader<Stdin>>,
    /// Number of log entries already printed for the active session
    shown: usize,
}

/// Run the interactive loop until `/quit`, `/logout` or end of input
pub async fn run<T, A>(transport: Arc<T>, auth: &A) -> Result<(), Box<dyn std::error::Error>>
where
    T: ChatTransport + HistoryTransport + CatalogTransport + 'static,
    A: AuthProvider,
{
    let user = auth
        .identity()
        .and_then(|identity| identity.authenticated())
        .ok_or("No signed-in user. Set SYMPTOM_CHAT_USER to choose a username.")?;

    let mut repl = Repl {
        controller: SessionController::new(Arc::clone(&transport)),
        history: HistoryAggregator::new(Arc::clone(&transport)),
        transport,
        auth,
        user,
        lines: BufReader::new(tokio::io::stdin()).lines(),
        shown: 0,
    };
    repl.run().await
}

impl<T, A> Repl<'_, T, A>
where
    T: ChatTransport + HistoryTransport + CatalogTransport + 'static,
    A: AuthProvider,
{
    async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        print!("{}", render::welcome_banner(self.user.username()));
        self.controller.start_session(&self.user);
        self.refresh();

        loop {
            tokio::select! {
                line = self.lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    if !self.handle_line(&line).await? {
                        break;
                    }
                }
                Some(outcome) = self.controller.next_outcome() => {
                    if self.controller.apply_outcome(outcome) {
                        self.refresh();
                    }
                }
            }
        }
        Ok(())
    }

    /// Print log entries not shown yet, then quick replies or the typing indicator
    fn refresh(&mut self) {
        let Some(conversation) = self.controller.conversation() else {
            return;
        };
        let messages = conversation.messages();
        for message in messages.iter().skip(self.shown) {
            print!("{}", render::render_message(message));
        }
        self.shown = messages.len();

        if conversation.is_busy() {
            println!("{}", render::typing_indicator());
        } else {
            print!("{}", render::render_suggestions(conversation.suggestions()));
        }
        let _ = std::io::stdout().flush();
    }

    /// Returns false when the loop should stop
    async fn handle_line(&mut self, line: &str) -> Result<bool, Box<dyn std::error::Error>> {
        match Command::parse(line) {
            Command::Quit => return Ok(false),
            Command::Logout => {
                self.auth.logout();
                println!("Signed out.");
                return Ok(false);
            }
            Command::Help => println!("{}", render::help_text()),
            Command::New => {
                if self.controller.reset_session().is_some() {
                    self.shown = 0;
                    if let Some(session) = self.controller.session() {
                        let notice = format!(
                            "Started a new consultation at {}.",
                            render::format_time(session.created_at)
                        );
                        println!("{}", notice.bold());
                    }
                    self.refresh();
                }
            }
            Command::History => self.show_history().await,
            Command::Show(n) => self.show_entry(n),
            Command::Clear => self.clear_history().await?,
            Command::Symptoms => match self.transport.symptoms().await {
                Ok(symptoms) => print!("{}", render::render_catalog("Known symptoms", &symptoms)),
                Err(e) => println!("{}", format!("Could not load symptoms: {e}").red()),
            },
            Command::Conditions => match self.transport.conditions().await {
                Ok(conditions) => {
                    print!("{}", render::render_catalog("Known conditions", &conditions));
                }
                Err(e) => println!("{}", format!("Could not load conditions: {e}").red()),
            },
            Command::Number(n) => {
                let selected = n
                    .checked_sub(1)
                    .and_then(|index| self.controller.submit_suggestion(index));
                let result = selected.unwrap_or_else(|| self.controller.submit(line));
                self.after_submit(result);
            }
            Command::Say(text) => {
                let result = self.controller.submit(&text);
                self.after_submit(result);
            }
            Command::Unknown(command) => {
                println!("Unknown command {command}. Type /help for a list.");
            }
        }
        Ok(true)
    }

    fn after_submit(&mut self, result: Result<(), TransitionError>) {
        match result {
            Ok(()) => self.refresh(),
            Err(TransitionError::Busy) => {
                println!("{}", "Please wait for the current reply.".dim());
            }
            Err(e) if e.is_input_rejection() => {}
            Err(e) => tracing::warn!(error = %e, "Submission rejected"),
        }
    }

    async fn show_history(&mut self) {
        match self.history.load(&self.user).await {
            Ok(LoadOutcome::Loaded { .. } | LoadOutcome::Superseded) => {}
            Err(e) => println!("{}", e.to_string().red()),
        }
        print!(
            "{}",
            render::render_history_list(&self.history.snapshot(), self.history.stats())
        );
    }

    fn show_entry(&mut self, number: usize) {
        let selected = number
            .checked_sub(1)
            .is_some_and(|index| self.history.select(index));
        if !selected {
            println!("No history entry {number}. Use /history to list consultations.");
            return;
        }
        let snapshot = self.history.snapshot();
        if let Some(entry) = snapshot.selected_entry() {
            print!("{}", render::render_history_detail(entry));
        }
        self.history.clear_selection();
    }

    async fn clear_history(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        println!("{CLEAR_CONFIRMATION_PROMPT} [y/N]");
        let answer = self.lines.next_line().await?.unwrap_or_default();
        let confirmed = is_affirmative(&answer);

        match self
            .history
            .clear_all(&self.user, &|_: &str| confirmed)
            .await
        {
            Ok(outcome) => println!("{}", clear_notice(outcome)),
            Err(e) => {
                println!("{}", e.to_string().red().bold());
                println!("Press Enter to continue.");
                self.lines.next_line().await?;
            }
        }
        Ok(())
    }
}
