use anyhow::Result;

use crate::tracker::event::FocusInterval;

/// Represents an interval processor. Realistically this abstracts over where intervals end up.
pub trait EventProcessor {
    fn process_next(
        &mut self,
        message: FocusInterval,
    ) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
