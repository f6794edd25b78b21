// stream-util is based on stream-cancel@0.4.4
// <https://github.com/jonhoo/stream-cancel>
//
// MIT License
//
// Copyright (c) 2016 Jon Gjengset

#[macro_use]
extern crate log;

use std::fmt;
use std::time::{Duration, Instant};

use futures::future::Shared;
use futures::prelude::*;
use futures::sync::mpsc::UnboundedReceiver;
use futures::sync::oneshot;
use tokio_timer::Delay;

/// Owning half of a [`Valve`]. Terminating the trigger, or dropping it,
/// closes every clone of the paired valve.
#[derive(Debug)]
pub struct Trigger(oneshot::Sender<()>);

impl Trigger {
    pub fn terminate(self) {
        let _ = self.0.send(());
    }
}

/// A cloneable future that resolves once its `Trigger` fires.
#[derive(Clone)]
pub struct Valve(Shared<oneshot::Receiver<()>>);

impl fmt::Debug for Valve {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Valve")
    }
}

impl Future for Valve {
    type Item = ();
    type Error = ();

    fn poll(&mut self) -> Poll<Self::Item, Self::Error> {
        match self.0.poll() {
            Ok(Async::NotReady) => Ok(Async::NotReady),
            // A dropped trigger closes the valve just like a terminated one.
            Ok(Async::Ready(_)) | Err(_) => Ok(Async::Ready(())),
        }
    }
}

pub fn valve() -> (Trigger, Valve) {
    let (trigger, valve) = oneshot::channel();
    (Trigger(trigger), Valve(valve.shared()))
}

#[derive(Debug, Eq, PartialEq)]
enum DrainState {
    Active,
    Draining,
}

#[derive(Debug)]
pub struct Drain<S> {
    receiver: S,
    until: Valve,
    state: DrainState,
}

impl<T> Stream for Drain<UnboundedReceiver<T>> {
    type Item = T;
    type Error = ();

    fn poll(&mut self) -> Poll<Option<Self::Item>, Self::Error> {
        if self.state == DrainState::Active {
            if let Ok(Async::Ready(_)) = self.until.poll() {
                // Close the receiver so senders are rejected, then keep
                // yielding whatever is already buffered.
                self.receiver.close();
                self.state = DrainState::Draining;
            }
        }
        self.receiver.poll()
    }
}

pub trait Drainable: Stream {
    fn drain(self, valve: Valve) -> Drain<Self>
    where
        Self: Sized,
    {
        Drain {
            receiver: self,
            until: valve,
            state: DrainState::Active,
        }
    }
}

impl<S> Drainable for S where S: Stream {}

#[derive(Debug)]
pub struct Cancel<S> {
    stream: S,
    until: Valve,
}

impl<S> Stream for Cancel<S>
where
    S: Stream,
{
    type Item = S::Item;
    type Error = S::Error;

    fn poll(&mut self) -> Poll<Option<Self::Item>, Self::Error> {
        if let Ok(Async::Ready(_)) = self.until.poll() {
            return Ok(Async::Ready(None));
        }
        self.stream.poll()
    }
}

pub trait Cancelable: Stream {
    fn cancel(self, valve: Valve) -> Cancel<Self>
    where
        Self: Sized,
    {
        Cancel {
            stream: self,
            until: valve,
        }
    }
}

impl<S> Cancelable for S where S: Stream {}

/// Trailing-edge debounce. Every item restarts the quiet window; only the
/// most recent item of a burst is yielded once the window elapses. A pending
/// item is flushed immediately when the underlying stream ends.
pub struct Debounce<S>
where
    S: Stream,
{
    stream: S,
    window: Duration,
    pending: Option<S::Item>,
    delay: Option<Delay>,
    exhausted: bool,
}

impl<S> Stream for Debounce<S>
where
    S: Stream,
{
    type Item = S::Item;
    type Error = S::Error;

    fn poll(&mut self) -> Poll<Option<Self::Item>, Self::Error> {
        while !self.exhausted {
            match self.stream.poll()? {
                Async::Ready(Some(item)) => {
                    if self.pending.replace(item).is_some() {
                        trace!("debounce superseded a pending item");
                    }
                    let deadline = Instant::now() + self.window;
                    match self.delay {
                        Some(ref mut delay) => delay.reset(deadline),
                        None => self.delay = Some(Delay::new(deadline)),
                    }
                }
                Async::Ready(None) => self.exhausted = true,
                Async::NotReady => break,
            }
        }
        if self.pending.is_none() {
            return if self.exhausted {
                Ok(Async::Ready(None))
            } else {
                Ok(Async::NotReady)
            };
        }
        if !self.exhausted {
            if let Some(ref mut delay) = self.delay {
                match delay.poll() {
                    Ok(Async::NotReady) => return Ok(Async::NotReady),
                    Ok(Async::Ready(())) => {}
                    Err(err) => warn!("Error on debounce timer: {:?}", err),
                }
            }
        }
        self.delay = None;
        Ok(Async::Ready(self.pending.take()))
    }
}

pub trait Debounceable: Stream {
    fn debounce(self, window: Duration) -> Debounce<Self>
    where
        Self: Sized,
    {
        Debounce {
            stream: self,
            window,
            pending: None,
            delay: None,
            exhausted: false,
        }
    }
}

impl<S> Debounceable for S where S: Stream {}
