use ratatui::Frame;

use crate::{command::Command, subscription::Subscription};

/// A terminal application following the Elm Architecture.
///
/// # Type Parameters
///
/// * `Message` - Everything that can happen to the model. Must be `Send + 'static`.
/// * `Flags` - Configuration handed to [`Application::new`].
///
/// # Example
///
/// ```
/// use ratatui::Frame;
/// use usertable::{application::Application, command::{Action, Command}, subscription::Subscription};
///
/// enum Message {
///     Quit,
/// }
///
/// struct Idle;
///
/// impl Application for Idle {
///     type Message = Message;
///     type Flags = ();
///
///     fn new(_flags: ()) -> (Self, Command<Message>) {
///         (Idle, Command::none())
///     }
///
///     fn update(&mut self, msg: Message) -> Command<Message> {
///         match msg {
///             Message::Quit => Command::effect(Action::Quit),
///         }
///     }
///
///     fn view(&self, _frame: &mut Frame<'_>) {}
///
///     fn subscriptions(&self) -> Vec<Subscription<Message>> {
///         vec![]
///     }
/// }
/// ```
pub trait Application: Sized {
    /// The messages the application processes.
    type Message: Send + 'static;

    /// Initial configuration. Use `()` when none is needed.
    type Flags: Send;

    /// Builds the initial model and an optional startup command.
    fn new(flags: Self::Flags) -> (Self, Command<Self::Message>);

    /// Applies a message to the model. All state changes happen here.
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;

    /// Draws the model. Must only read from `self`.
    fn view(&self, frame: &mut Frame<'_>);

    /// Event sources the model currently wants.
    ///
    /// Called at startup and after every update; the runtime diffs the result
    /// by [`SubscriptionId`](crate::subscription::SubscriptionId) so returning
    /// the same subscription again does not restart it.
    fn subscriptions(&self) -> Vec<Subscription<Self::Message>>;
}
