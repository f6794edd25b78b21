mod heartbeat;
mod read;
mod write;

pub(crate) use self::heartbeat::{task as heartbeat, HEARTBEAT_INTERVAL};
pub(crate) use self::read::task as read;
pub(crate) use self::write::task as write;
