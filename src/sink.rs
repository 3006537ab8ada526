//! Host text sink and the per-tick update

use crate::projector::{AnyProvider, TransientFailure};

/// Text widget owned by the host application
pub trait DisplaySink {
    type Handle;

    /// Look up a widget by name. `None` when nothing by that name exists.
    fn acquire(&self, name: &str) -> Option<Self::Handle>;

    fn update_text(&self, handle: &Self::Handle, text: &str);

    fn release(&self, handle: Self::Handle);
}

/// Holds an acquired handle and releases it when dropped
pub struct SinkGuard<'a, S: DisplaySink> {
    sink: &'a S,
    handle: Option<S::Handle>,
}

impl<'a, S: DisplaySink> SinkGuard<'a, S> {
    pub fn acquire(sink: &'a S, name: &str) -> Self {
        let handle = sink.acquire(name);
        if handle.is_none() {
            tracing::debug!("Text source '{}' not found", name);
        }
        SinkGuard { sink, handle }
    }

    /// Write `text` if the handle resolved. Returns whether a write happened.
    pub fn update_text(&self, text: &str) -> bool {
        match &self.handle {
            Some(handle) => {
                self.sink.update_text(handle, text);
                true
            }
            None => false,
        }
    }
}

impl<S: DisplaySink> Drop for SinkGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.sink.release(handle);
        }
    }
}

/// Run one tick: acquire the sink, project, write, release.
///
/// On a transient failure the sink is left untouched and the failure is
/// handed back to the caller.
pub fn run_tick<S: DisplaySink>(
    sink: &S,
    sink_name: &str,
    provider: &AnyProvider,
    identifier: &str,
) -> Result<(), TransientFailure> {
    let guard = SinkGuard::acquire(sink, sink_name);

    match provider.project(identifier) {
        Ok(text) => {
            guard.update_text(text.as_str());
            Ok(())
        }
        Err(err) => {
            tracing::warn!("{}", err);
            Err(err)
        }
    }
}
