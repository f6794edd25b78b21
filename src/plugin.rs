use futures::future::{self, Either};
use futures::prelude::*;
use futures::sync::mpsc::{unbounded, UnboundedSender};
use futures_locks::RwLock;
use stream_util::Debounceable;

use crate::command::Command;
use crate::config::Filter;
use crate::host::Envelope;
use crate::operation::{self, Context};

/// Receives host traffic and starts cast operations.
///
/// Commands pass through a trailing-edge debounce: a burst of commands within
/// the debounce window starts a single operation for the last one.
pub struct Plugin {
    filter: RwLock<Filter>,
    commands: UnboundedSender<Command>,
}

impl Plugin {
    /// Returns the plugin and the pump future that spawns operations. The
    /// pump finishes once the plugin is dropped.
    pub fn new(context: Context) -> (Self, impl Future<Item = (), Error = ()>) {
        let filter = RwLock::new(Filter::default());
        let (commands, rx) = unbounded::<Command>();
        let current = filter.clone();
        let pump = rx
            .debounce(context.settings.debounce)
            .for_each(move |command| {
                let context = context.clone();
                current.read().map(move |filter| {
                    debug!("starting cast for {:?}", command.casting_application);
                    tokio::spawn(operation::run(&context, (*filter).clone(), command));
                })
            });
        (Self { filter, commands }, pump)
    }

    pub fn handle(&self, envelope: Envelope) -> impl Future<Item = (), Error = ()> {
        match envelope {
            Envelope::Config { options } => {
                let filter = Filter::from(options);
                if !filter.has_criteria() {
                    warn!("auto discovery is off and no chromecast name is set");
                }
                info!("discovery filter is now {:?}", filter);
                Either::A(self.filter.write().map(move |mut current| {
                    *current = filter;
                }))
            }
            Envelope::Message { payload } => {
                self.on_message(payload);
                Either::B(future::ok(()))
            }
        }
    }

    pub fn on_message(&self, payload: Option<serde_json::Value>) {
        let command = match payload.and_then(Command::from_payload) {
            Some(command) => command,
            None => {
                debug!("message without a command");
                return;
            }
        };
        if self.commands.unbounded_send(command).is_err() {
            warn!("command pump has stopped");
        }
    }
}
