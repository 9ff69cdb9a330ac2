//! Generic session runtime.
//!
//! The Runtime drives one session, coordinating between:
//! - [`ChannelManager`]: the push side, one live socket at a time
//! - [`Backend`]: the request/response side
//! - [`Surface`]: whatever shows the view model
//!
//! Every input ends up as an [`Action`] passed through [`reduce`]. HTTP
//! requests run as background tasks tagged with the channel generation that
//! issued them; completions from an older generation are discarded, and all
//! outstanding requests are aborted whenever the channel changes.

use std::{future::Future, time::Duration};

use aryu_core::{ChannelConfig, SessionContext};
use aryu_proto::{ClientCommand, ItemId, Resource, ResourceKind};
use tokio::{
    sync::mpsc,
    task::JoinSet,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    Action, ApiError, Backend, ChannelHandle, ChannelManager, Draft, Intent, PendingItem, Surface,
    Transport, ViewModel, reduce,
};

/// Shown when a user without quiz control tries to start a question.
pub const START_NOT_PERMITTED: &str = "You do not have permission to start questions.";

/// Result of a background request, applied on the runtime's task.
#[derive(Debug, Default)]
struct Outcome {
    actions: Vec<Action>,
    refetch: bool,
}

impl Outcome {
    fn new(actions: Vec<Action>, refetch: bool) -> Self {
        Self { actions, refetch }
    }
}

#[derive(Debug)]
struct Completion {
    generation: u64,
    outcome: Outcome,
}

#[derive(Debug, Clone, Copy)]
struct Countdown {
    timer_key: u64,
    deadline: Instant,
}

/// Generic runtime that orchestrates channel, backend, and surface.
///
/// # Type Parameters
///
/// - `T`: Socket transport
/// - `B`: HTTP backend
/// - `S`: Presentation surface
pub struct Runtime<T, B, S>
where
    T: Transport,
    B: Backend,
    S: Surface,
{
    channel: ChannelManager<T>,
    backend: B,
    surface: S,
    session: SessionContext,
    config: ChannelConfig,
    view: ViewModel,
    handle: Option<ChannelHandle>,
    requests: JoinSet<Completion>,
    next_local_id: u64,
    countdown: Option<Countdown>,
}

impl<T, B, S> Runtime<T, B, S>
where
    T: Transport,
    B: Backend,
    S: Surface,
{
    /// Create a runtime for a signed-in session.
    pub fn new(
        transport: T,
        backend: B,
        surface: S,
        config: ChannelConfig,
        session: SessionContext,
    ) -> Self {
        let channel = ChannelManager::new(transport, config.clone(), &session);
        Self {
            channel,
            backend,
            surface,
            session,
            config,
            view: ViewModel::new(),
            handle: None,
            requests: JoinSet::new(),
            next_local_id: 1,
            countdown: None,
        }
    }

    /// Current view model.
    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    /// Run until [`Intent::Quit`] arrives or the intent queue closes.
    ///
    /// Each cycle waits for whichever comes first: a user intent, a channel
    /// frame, a finished request, the poll tick, or the quiz countdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface fails.
    pub async fn run(mut self, mut intents: mpsc::Receiver<Intent>) -> Result<(), S::Error> {
        self.surface.render(&self.view)?;

        let period = self.config.poll_interval;
        let mut poll = time::interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let countdown = self.countdown;
            let deadline = countdown.map_or_else(Instant::now, |c| c.deadline);

            tokio::select! {
                intent = intents.recv() => {
                    let Some(intent) = intent else { break };
                    if intent == Intent::Quit {
                        break;
                    }
                    let reopened = matches!(intent, Intent::Open(_));
                    self.handle_intent(intent).await?;
                    if reopened {
                        poll.reset();
                    }
                },
                Some(action) = self.channel.recv(), if self.channel.is_open() => {
                    let action = self.claim_echo(action);
                    self.apply(vec![action])?;
                },
                Some(joined) = self.requests.join_next(), if !self.requests.is_empty() => {
                    match joined {
                        Ok(completion) => self.complete(completion)?,
                        Err(e) if e.is_cancelled() => {},
                        Err(e) => tracing::error!(error = %e, "request task failed"),
                    }
                },
                _ = poll.tick(), if self.handle.is_some() => {
                    tracing::debug!("poll refetch");
                    self.refetch();
                },
                () = time::sleep_until(deadline), if countdown.is_some() => {
                    self.countdown = None;
                    if countdown.is_some_and(|c| c.timer_key == self.view.quiz().timer_key()) {
                        self.apply(vec![Action::TimerElapsed])?;
                    }
                },
            }
        }

        self.shutdown();
        Ok(())
    }

    async fn handle_intent(&mut self, intent: Intent) -> Result<(), S::Error> {
        match intent {
            Intent::Open(resource) => self.open(resource).await,
            Intent::Send(draft) => self.send(draft),
            Intent::MarkRead(id) => self.mark_read(id),
            Intent::MarkAllRead => self.mark_all_read(),
            Intent::StartQuestion(index) => self.start_question(index),
            Intent::Refresh => {
                self.refetch();
                Ok(())
            },
            Intent::DismissNotice => self.apply(vec![Action::DismissNotice]),
            Intent::Close => self.close(),
            Intent::Quit => Ok(()),
        }
    }

    async fn open(&mut self, resource: Resource) -> Result<(), S::Error> {
        self.requests.abort_all();
        self.countdown = None;

        let (handle, actions) = self.channel.open(resource).await;
        self.handle = Some(handle);
        self.apply(actions)?;
        self.refetch();
        Ok(())
    }

    fn close(&mut self) -> Result<(), S::Error> {
        self.requests.abort_all();
        self.countdown = None;

        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let actions = self.channel.close(&handle);
        self.apply(actions)
    }

    fn send(&mut self, draft: Draft) -> Result<(), S::Error> {
        let Some(resource) = self.resource() else {
            tracing::warn!("send without an open resource");
            return Ok(());
        };
        if draft.is_empty() {
            tracing::debug!("ignoring empty draft");
            return Ok(());
        }

        let local_id = self.next_local_id;
        self.next_local_id += 1;
        self.apply(vec![Action::PendingAdded(PendingItem {
            local_id,
            body: draft.body.clone(),
            attachment_names: draft.attachment_names(),
        })])?;

        let backend = self.backend.clone();
        let limit = self.config.request_timeout;
        self.spawn(async move {
            match within(limit, backend.send(&resource, &draft)).await {
                Ok(item) => Outcome::new(vec![Action::PendingConfirmed { local_id, item }], true),
                Err(err) => {
                    tracing::warn!(%resource, local_id, error = %err, "send failed");
                    let reason = err.user_message();
                    Outcome::new(vec![Action::PendingFailed { local_id, reason }], false)
                },
            }
        });
        Ok(())
    }

    fn mark_read(&mut self, id: ItemId) -> Result<(), S::Error> {
        let Some(resource) = self.resource() else {
            return Ok(());
        };
        self.apply(vec![Action::MarkRead { id }])?;

        let backend = self.backend.clone();
        let limit = self.config.request_timeout;
        self.spawn(async move {
            match within(limit, backend.mark_read(&resource, id)).await {
                Ok(()) => match within(limit, backend.get_one(&resource, id)).await {
                    Ok(item) => Outcome::new(vec![Action::ItemDelivered(item)], false),
                    Err(err) => {
                        tracing::debug!(%resource, id, error = %err, "item refetch failed, reloading list");
                        Outcome::new(Vec::new(), true)
                    },
                },
                Err(err) => {
                    tracing::warn!(%resource, id, error = %err, "mark read failed");
                    Outcome::new(vec![Action::RequestFailed { message: err.user_message() }], true)
                },
            }
        });
        Ok(())
    }

    fn mark_all_read(&mut self) -> Result<(), S::Error> {
        let Some(resource) = self.resource() else {
            return Ok(());
        };
        self.apply(vec![Action::MarkAllRead])?;

        let backend = self.backend.clone();
        let limit = self.config.request_timeout;
        self.spawn(async move {
            match within(limit, backend.mark_all_read(&resource)).await {
                Ok(()) => Outcome::new(Vec::new(), true),
                Err(err) => {
                    tracing::warn!(%resource, error = %err, "mark all read failed");
                    Outcome::new(vec![Action::RequestFailed { message: err.user_message() }], true)
                },
            }
        });
        Ok(())
    }

    /// Ask the server to start a question. The countdown does not start
    /// until the server's `start_question` push arrives.
    fn start_question(&mut self, question_index: usize) -> Result<(), S::Error> {
        if !self.session.can_start_quiz() {
            tracing::warn!(user_id = self.session.user_id(), "start refused, missing permission");
            return self.apply(vec![Action::RequestFailed { message: START_NOT_PERMITTED.into() }]);
        }

        let Some(handle) = self.handle.clone().filter(|h| h.resource().kind == ResourceKind::Quiz)
        else {
            tracing::warn!(question_index, "start requested outside a quiz room");
            return Ok(());
        };

        match self.channel.send(&handle, &ClientCommand::StartQuestion { question_index }) {
            Ok(()) => self.apply(vec![Action::StartRequested { question_index }]),
            Err(err) => self.apply(vec![Action::RequestFailed {
                message: format!(
                    "Could not start question {}: {err}",
                    question_index.saturating_add(1)
                ),
            }]),
        }
    }

    /// Turn the server's echo of our own message into the confirmation of
    /// the matching pending entry, so it is not shown twice while the HTTP
    /// send is still in flight.
    fn claim_echo(&self, action: Action) -> Action {
        let Action::ItemDelivered(item) = action else {
            return action;
        };
        if item.sender.as_ref().is_none_or(|s| s.id != self.session.user_id()) {
            return Action::ItemDelivered(item);
        }

        let pending = self.view.pending().iter().find(|p| {
            p.body == item.body && p.attachment_names.len() == item.attachments.len()
        });
        match pending {
            Some(pending) => {
                tracing::debug!(local_id = pending.local_id, id = item.id, "own message echoed");
                Action::PendingConfirmed { local_id: pending.local_id, item }
            },
            None => Action::ItemDelivered(item),
        }
    }

    /// Reload the authoritative state of the current resource.
    fn refetch(&mut self) {
        let Some(resource) = self.resource() else {
            return;
        };

        let backend = self.backend.clone();
        let limit = self.config.request_timeout;
        self.spawn(async move {
            let loaded = match resource.kind {
                ResourceKind::Quiz => {
                    within(limit, backend.list_questions(&resource)).await.map(Action::QuestionsLoaded)
                },
                ResourceKind::Chat | ResourceKind::Notifications => {
                    within(limit, backend.list_items(&resource)).await.map(Action::HistorySnapshot)
                },
            };

            let action = loaded.unwrap_or_else(|err| {
                tracing::warn!(%resource, error = %err, "refetch failed");
                Action::RequestFailed { message: err.user_message() }
            });
            Outcome::new(vec![action], false)
        });
    }

    fn complete(&mut self, completion: Completion) -> Result<(), S::Error> {
        if completion.generation != self.generation() {
            tracing::debug!(generation = completion.generation, "discarding stale completion");
            return Ok(());
        }

        let Outcome { actions, refetch } = completion.outcome;
        if !actions.is_empty() {
            self.apply(actions)?;
        }
        if refetch {
            self.refetch();
        }
        Ok(())
    }

    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let generation = self.generation();
        self.requests.spawn(async move { Completion { generation, outcome: request.await } });
    }

    /// Reduce a batch of actions, toast new errors, and render once.
    fn apply(&mut self, actions: Vec<Action>) -> Result<(), S::Error> {
        for action in &actions {
            tracing::trace!(action = action.name(), "apply");
            if let Some(message) = action.error_message() {
                self.surface.toast(message)?;
            }
            self.view = reduce(&self.view, action);
        }
        self.sync_countdown();
        self.surface.render(&self.view)
    }

    /// Arm the countdown for a newly acknowledged question, or disarm it
    /// once the quiz stops running.
    fn sync_countdown(&mut self) {
        let quiz = self.view.quiz();
        if !quiz.is_running() {
            self.countdown = None;
            return;
        }
        if self.countdown.is_some_and(|c| c.timer_key == quiz.timer_key()) {
            return;
        }

        let duration = quiz
            .question()
            .filter(|q| Some(q.index) == quiz.current_question_index())
            .and_then(|q| q.duration_secs);
        self.countdown = duration.map(|secs| Countdown {
            timer_key: quiz.timer_key(),
            deadline: Instant::now() + Duration::from_secs(u64::from(secs)),
        });
    }

    fn resource(&self) -> Option<Resource> {
        self.handle.as_ref().map(|h| h.resource().clone())
    }

    fn generation(&self) -> u64 {
        self.handle.as_ref().map_or(0, ChannelHandle::generation)
    }

    fn shutdown(&mut self) {
        self.requests.abort_all();
        self.countdown = None;
        self.handle = None;
        self.channel.close_current();
        tracing::info!("runtime stopped");
    }
}

async fn within<T>(
    limit: Duration,
    request: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    time::timeout(limit, request).await.unwrap_or(Err(ApiError::Timeout))
}
