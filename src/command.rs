use futures::{
    FutureExt, StreamExt,
    stream::{self, BoxStream, select_all},
};

/// An action that can be performed by a command.
///
/// Actions are emitted by command streams and subscription tasks and are
/// consumed by the runtime loop.
pub enum Action<Msg> {
    /// Deliver a message to the application's update function.
    Message(Msg),

    /// Stop the runtime loop and shut down subscriptions.
    Quit,
}

/// A one-shot side effect returned from `Application::new` or `Application::update`.
///
/// The runtime spawns the command on a tokio task and forwards every action it
/// produces back into the event loop.
///
/// # Examples
///
/// ```
/// use usertable::command::Command;
///
/// enum Message {
///     Loaded(usize),
/// }
///
/// let cmd = Command::perform(async { 3 }, Message::Loaded);
/// ```
pub struct Command<Msg: Send + 'static> {
    pub(crate) stream: Option<BoxStream<'static, Action<Msg>>>,
}

impl<Msg: Send + 'static> Command<Msg> {
    /// A command that does nothing.
    pub fn none() -> Self {
        Self { stream: None }
    }

    /// Runs `future` and converts its output into a message with `f`.
    pub fn perform<A>(
        future: impl Future<Output = A> + Send + 'static,
        f: impl FnOnce(A) -> Msg + Send + 'static,
    ) -> Self {
        Self::future(future.map(f))
    }

    /// Runs a future that produces a message directly.
    pub fn future(future: impl Future<Output = Msg> + Send + 'static) -> Self {
        Self {
            stream: Some(future.into_stream().map(Action::Message).boxed()),
        }
    }

    /// Emits a single action immediately.
    ///
    /// ```
    /// use usertable::command::{Action, Command};
    ///
    /// let quit: Command<()> = Command::effect(Action::Quit);
    /// ```
    pub fn effect(action: Action<Msg>) -> Self {
        Self {
            stream: Some(stream::once(async move { action }).boxed()),
        }
    }

    /// Runs several commands concurrently. Message order is not guaranteed and
    /// `Command::none()` entries are dropped.
    pub fn batch(commands: impl IntoIterator<Item = Self>) -> Self {
        let streams: Vec<_> = commands.into_iter().filter_map(|cmd| cmd.stream).collect();

        if streams.is_empty() {
            Self::none()
        } else {
            Self {
                stream: Some(select_all(streams).boxed()),
            }
        }
    }

    /// Returns `true` if the command has no side effect.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.stream.is_none()
    }
}
