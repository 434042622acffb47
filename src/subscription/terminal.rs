use std::hash::{DefaultHasher, Hash, Hasher};
use std::io;

use crossterm::event::{Event, EventStream};
use futures::{StreamExt, stream::BoxStream};

use super::{SubscriptionId, SubscriptionSource};

/// Terminal input events from crossterm's `EventStream`.
///
/// Yields `Ok(event)` for each key, mouse, resize or focus event. A read error
/// is yielded once as `Err` and ends the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalEvents;

impl TerminalEvents {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SubscriptionSource for TerminalEvents {
    type Output = Result<Event, io::Error>;

    fn stream(&self) -> BoxStream<'static, Self::Output> {
        EventStream::new()
            .scan(false, |failed, item| {
                if *failed {
                    return futures::future::ready(None);
                }
                *failed = item.is_err();
                futures::future::ready(Some(item))
            })
            .boxed()
    }

    fn id(&self) -> SubscriptionId {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        SubscriptionId::of::<Self>(hasher.finish())
    }
}

impl Hash for TerminalEvents {
    fn hash<H: Hasher>(&self, state: &mut H) {
        "terminal".hash(state);
    }
}
