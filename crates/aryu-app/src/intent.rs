//! Runtime inputs from the user.

use aryu_proto::{ItemId, Resource};

use crate::Draft;

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Bind the session to a resource, replacing the current one.
    Open(Resource),

    /// Send a message to the current resource.
    Send(Draft),

    /// Mark one item as read.
    MarkRead(ItemId),

    /// Mark every item as read.
    MarkAllRead,

    /// Ask the server to start a quiz question.
    StartQuestion(usize),

    /// Refetch the current resource now.
    Refresh,

    /// Clear the current notice.
    DismissNotice,

    /// Close the current channel without quitting.
    Close,

    /// Tear down and stop the runtime.
    Quit,
}
