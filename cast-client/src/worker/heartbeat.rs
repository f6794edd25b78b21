use std::time::Duration;

use futures::prelude::*;
use stream_util::{Cancelable, Valve};
use tokio_timer::Interval;

use crate::channel::heartbeat::Request;
use crate::channel::Channel;

pub(crate) const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Keep the connection alive by pinging the receiver until the valve closes.
pub(crate) fn task(
    valve: Valve,
    heartbeat: Channel,
    period: Duration,
) -> impl Future<Item = (), Error = ()> {
    Interval::new_interval(period)
        .cancel(valve)
        .map_err(|err| warn!("Error on heartbeat interval: {:?}", err))
        .for_each(move |_| {
            heartbeat
                .send(&Request::Ping)
                .map_err(|err| debug!("heartbeat stopped: {:?}", err))
        })
}
