//! Root-change event plumbing.
//!
//! Collaborators send events through a crossbeam channel instead of calling
//! into the manager directly. The listener thread is the sole consumer and
//! runs until the sending side disconnects.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

use crate::error::Result;
use crate::manager::FileIndexManager;
use crate::vfs::Vfs;

/// An event sent from the project-root collaborator to the index listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootEvent {
    /// The project root changed; rebuild immediately.
    RootChanged,
    /// The tree changed under the current root; rebuild on the next query.
    Invalidated,
    /// The collaborator encountered an error worth recording.
    Error(String),
}

/// Spawns the listener thread that drives `manager` from `events`.
///
/// The thread exits when every sender is dropped.
pub fn spawn_root_listener<V>(
    manager: Arc<FileIndexManager<V>>,
    events: Receiver<RootEvent>,
) -> Result<JoinHandle<()>>
where
    V: Vfs + 'static,
{
    let handle = thread::Builder::new()
        .name("file-index-root-listener".to_string())
        .spawn(move || {
            for event in events {
                match event {
                    RootEvent::RootChanged => {
                        manager.handle_root_changed();
                    }
                    RootEvent::Invalidated => manager.mark_dirty(),
                    RootEvent::Error(message) => {
                        log::warn!("file index root provider error: {message}");
                    }
                }
            }
        })?;
    Ok(handle)
}
