use std::time::Duration;

use color_eyre::eyre::Result;
use futures::StreamExt;
use ratatui::{Terminal, prelude::Backend};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::{
    application::Application,
    command::{Action, Command},
    subscription::SubscriptionManager,
};

/// Drives an [`Application`]: runs commands, keeps subscriptions in sync,
/// and redraws whenever a message changed the model.
///
/// Redraws are capped by the frame rate; a burst of messages inside one frame
/// produces a single draw.
pub struct Runtime<A: Application> {
    app: A,
    init: Option<Command<A::Message>>,
    tx: mpsc::UnboundedSender<Action<A::Message>>,
    rx: mpsc::UnboundedReceiver<Action<A::Message>>,
    subscriptions: SubscriptionManager<A::Message>,
    frame_duration: Duration,
}

impl<A: Application> Runtime<A> {
    /// Builds the application from `flags`. Nothing runs until [`Runtime::run`].
    pub fn new(flags: A::Flags, frame_rate: u32) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (app, init) = A::new(flags);
        let subscriptions = SubscriptionManager::new(tx.clone());
        let frame_duration = Duration::from_millis(1000 / u64::from(frame_rate.max(1)));

        Self {
            app,
            init: Some(init),
            tx,
            rx,
            subscriptions,
            frame_duration,
        }
    }

    fn execute(&self, cmd: Command<A::Message>) {
        let Some(mut stream) = cmd.stream else {
            return;
        };
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(action) = stream.next().await {
                if tx.send(action).is_err() {
                    break;
                }
            }
        });
    }

    fn process(&mut self, msg: A::Message) {
        let cmd = self.app.update(msg);
        self.execute(cmd);
        self.subscriptions.update(self.app.subscriptions());
    }

    /// Runs the event loop until the application emits [`Action::Quit`].
    ///
    /// # Errors
    ///
    /// Returns an error if drawing to the terminal fails. Running subscriptions
    /// are shut down before it is returned.
    pub async fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut ticker = interval(self.frame_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if let Some(init) = self.init.take() {
            self.execute(init);
        }
        self.subscriptions.update(self.app.subscriptions());
        info!(frame = ?self.frame_duration, "runtime started");

        let mut dirty = true;
        let result: Result<()> = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if dirty {
                        if let Err(e) = terminal.draw(|frame| self.app.view(frame)) {
                            error!(error = %e, "draw failed");
                            break Err(e.into());
                        }
                        dirty = false;
                    }
                }
                Some(action) = self.rx.recv() => match action {
                    Action::Message(msg) => {
                        self.process(msg);
                        dirty = true;
                    }
                    Action::Quit => {
                        debug!("quit requested");
                        break Ok(());
                    }
                },
            }
        };

        // Subscriptions stop on every exit path, draw failures included.
        self.subscriptions.shutdown().await;
        info!("runtime stopped");
        result
    }
}
