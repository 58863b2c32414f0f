//! The paginator on its own task.
//!
//! A [`FeedEngine`] owns one [`Paginator`] and its observer. Screens talk to
//! it through a cloneable [`FeedHandle`]; every state change and every
//! observer callback happens on the engine task, in order. Fetches run on
//! their own tasks and report back, so a slow backend never blocks commands.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::traits::{LiveStream, PagedSource, PrefixLookup};

use super::error::FeedError;
use super::observer::FeedObserver;
use super::paginator::{
    Completion, FeedStatus, FetchRequest, Fetched, Paginator, PaginatorConfig, Ticket,
};
use super::query::Query;

/// How a request sent through a [`FeedHandle`] ended.
#[derive(Debug, Clone)]
pub enum Settlement {
    /// The fetch was merged (or, for a blank search, the list cleared).
    Applied(FeedStatus),
    /// Nothing was fetched: in flight, exhausted, or nothing loaded yet.
    Ignored,
    /// A later `load` or `refresh` replaced this request.
    Superseded,
    /// The fetch failed; the list is unchanged.
    Failed(FeedError),
    /// The engine has stopped.
    Closed,
}

impl Settlement {
    pub fn is_applied(&self) -> bool {
        matches!(self, Settlement::Applied(_))
    }
}

/// Resolves when the request it was returned for settles.
///
/// Dropping it does not cancel the request.
#[derive(Debug)]
#[must_use = "dropping a Settle ignores the outcome, not the request"]
pub struct Settle {
    rx: oneshot::Receiver<Settlement>,
}

impl Future for Settle {
    type Output = Settlement;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Settlement> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(Settlement::Closed))
    }
}

enum Command<Q: Query> {
    Load(Q, oneshot::Sender<Settlement>),
    LoadMore(oneshot::Sender<Settlement>),
    Refresh(oneshot::Sender<Settlement>),
    Live(Q::Item),
    Status(oneshot::Sender<FeedStatus>),
}

type Done<Q> = (
    FetchRequest<Q>,
    Result<Fetched<<Q as Query>::Item>, FeedError>,
);

/// Sends commands to a running [`FeedEngine`].
///
/// The engine stops once every handle (and every attached live stream) is
/// gone.
#[derive(Debug)]
pub struct FeedHandle<Q: Query> {
    commands: mpsc::UnboundedSender<Command<Q>>,
}

impl<Q: Query> Clone for FeedHandle<Q> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<Q: Query> FeedHandle<Q> {
    /// Load `query` from the first page, superseding anything in flight.
    pub fn load(&self, query: Q) -> Settle {
        self.request(|reply| Command::Load(query, reply))
    }

    /// Fetch the next page; settles as [`Settlement::Ignored`] when the
    /// engine declines.
    pub fn load_more(&self) -> Settle {
        self.request(Command::LoadMore)
    }

    /// Re-fetch the first page of the current query.
    pub fn refresh(&self) -> Settle {
        self.request(Command::Refresh)
    }

    /// Merge one realtime item.
    pub fn push_live(&self, item: Q::Item) {
        if self.commands.send(Command::Live(item)).is_err() {
            debug!("Feed engine stopped; dropping live item");
        }
    }

    /// Forward a realtime subscription into the engine until it ends.
    ///
    /// Stream errors are logged and skipped. Abort the returned task to
    /// detach.
    pub fn attach_live(&self, mut stream: LiveStream<Q::Item>) -> JoinHandle<()> {
        let commands = self.commands.clone();
        tokio::spawn(async move {
            while let Some(next) = stream.next().await {
                match next {
                    Ok(item) => {
                        if commands.send(Command::Live(item)).is_err() {
                            break;
                        }
                    }
                    Err(error) => warn!(%error, "Live subscription error"),
                }
            }
            debug!("Live subscription ended");
        })
    }

    /// A snapshot of the engine's state, or `None` once it has stopped.
    pub async fn status(&self) -> Option<FeedStatus> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(Command::Status(tx)).ok()?;
        rx.await.ok()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn request(&self, command: impl FnOnce(oneshot::Sender<Settlement>) -> Command<Q>) -> Settle {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(command(tx)).is_err() {
            debug!("Feed engine stopped");
        }
        Settle { rx }
    }
}

/// Runs a [`Paginator`] against a source.
pub struct FeedEngine<Q: Query, S, O> {
    paginator: Paginator<Q>,
    source: Arc<S>,
    observer: O,
    completions: mpsc::UnboundedSender<Done<Q>>,
    waiters: HashMap<Ticket, oneshot::Sender<Settlement>>,
}

impl<Q, S, O> FeedEngine<Q, S, O>
where
    Q: Query,
    S: PagedSource<Q> + PrefixLookup + 'static,
    O: FeedObserver<Q::Item> + 'static,
{
    /// Spawn an engine on the current runtime.
    pub fn spawn(source: Arc<S>, config: PaginatorConfig, observer: O) -> FeedHandle<Q> {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let engine = Self {
            paginator: Paginator::new(config),
            source,
            observer,
            completions: completions_tx,
            waiters: HashMap::new(),
        };
        tokio::spawn(engine.run(commands_rx, completions_rx));

        FeedHandle {
            commands: commands_tx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command<Q>>,
        mut completions: mpsc::UnboundedReceiver<Done<Q>>,
    ) {
        debug!("Feed engine started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some((request, outcome)) = completions.recv() => {
                    self.settle(request, outcome);
                }
            }
        }

        debug!("Feed engine stopped");
    }

    fn handle(&mut self, command: Command<Q>) {
        match command {
            Command::Load(query, reply) => match self.paginator.load(query, &mut self.observer) {
                Some(request) => self.dispatch(request, reply),
                None => {
                    let _ = reply.send(Settlement::Applied(self.paginator.status()));
                }
            },
            Command::LoadMore(reply) => match self.paginator.load_more() {
                Some(request) => self.dispatch(request, reply),
                None => {
                    let _ = reply.send(Settlement::Ignored);
                }
            },
            Command::Refresh(reply) => match self.paginator.refresh() {
                Some(request) => self.dispatch(request, reply),
                None => {
                    let _ = reply.send(Settlement::Ignored);
                }
            },
            Command::Live(item) => self.paginator.insert_live(item, &mut self.observer),
            Command::Status(reply) => {
                let _ = reply.send(self.paginator.status());
            }
        }
    }

    fn dispatch(&mut self, request: FetchRequest<Q>, reply: oneshot::Sender<Settlement>) {
        self.waiters.insert(request.ticket, reply);

        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let outcome = request.run(source.as_ref()).await;
            let _ = completions.send((request, outcome));
        });
    }

    fn settle(&mut self, request: FetchRequest<Q>, outcome: Result<Fetched<Q::Item>, FeedError>) {
        let ticket = request.ticket;
        let settlement = match self.paginator.complete(request, outcome, &mut self.observer) {
            Completion::Applied => Settlement::Applied(self.paginator.status()),
            Completion::Stale => Settlement::Superseded,
            Completion::Failed(error) => Settlement::Failed(error),
        };

        if let Some(reply) = self.waiters.remove(&ticket) {
            let _ = reply.send(settlement);
        }
    }
}
