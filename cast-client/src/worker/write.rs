use std::io;

use futures::prelude::*;

use crate::proto::CastMessage;

pub(crate) fn task(
    sink: impl Sink<SinkItem = CastMessage, SinkError = io::Error>,
    outbound: impl Stream<Item = CastMessage, Error = ()>,
) -> impl Future<Item = (), Error = ()> {
    outbound
        .forward(sink.sink_map_err(|err| warn!("Error on sink write: {:?}", err)))
        .map(|_| ())
        .or_else(|err| {
            warn!("Error on write: {:?}", err);
            Ok(())
        })
}
