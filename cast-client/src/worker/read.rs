use std::io;

use futures::prelude::*;

use crate::channel::{Error, Responder};
use crate::proto::CastMessage;

pub(crate) fn task(
    source: impl Stream<Item = CastMessage, Error = io::Error>,
    responder: Responder,
) -> impl Future<Item = (), Error = ()> {
    source
        .map_err(|err| warn!("Error on read: {:?}", err))
        .for_each(move |message| match responder.handle(&message) {
            Ok(()) => Ok(()),
            Err(Error::StatusSend) => {
                // Nobody is listening for status anymore.
                debug!("status receiver dropped, stopping read");
                Err(())
            }
            Err(err) => {
                // Malformed payloads are skipped.
                warn!(
                    "read handler error in namespace {}: {:?}",
                    message.get_namespace(),
                    err
                );
                Ok(())
            }
        })
}
