//! Presentation-side contract of the pagination engine.

use tokio::sync::mpsc;

use super::error::FeedError;

/// Receives list changes from a [`Paginator`](super::Paginator).
///
/// Callbacks run on the engine's owning sequence, in the order the changes
/// were applied.
pub trait FeedObserver<T>: Send {
    /// The whole list was replaced; reload the view.
    fn on_items_replaced(&mut self, items: &[T]);

    /// `items` were appended; insert rows `at..at + items.len()`.
    fn on_items_appended(&mut self, items: &[T], at: usize);

    /// A live item was inserted at `index`.
    fn on_item_inserted(&mut self, item: &T, index: usize);

    /// A refresh settled, successfully or not; dismiss the refresh indicator.
    fn on_refresh_completed(&mut self);

    /// A load or refresh found nothing; show "no results".
    fn on_no_result(&mut self);

    /// A request failed; the list is unchanged.
    fn on_fetch_failed(&mut self, error: &FeedError);
}

/// A list change, as an owned value.
#[derive(Debug, Clone)]
pub enum FeedEvent<T> {
    ItemsReplaced(Vec<T>),
    ItemsAppended { items: Vec<T>, at: usize },
    ItemInserted { item: T, index: usize },
    RefreshCompleted,
    NoResult,
    FetchFailed(FeedError),
}

/// Records every change, in order.
impl<T: Clone + Send> FeedObserver<T> for Vec<FeedEvent<T>> {
    fn on_items_replaced(&mut self, items: &[T]) {
        self.push(FeedEvent::ItemsReplaced(items.to_vec()));
    }

    fn on_items_appended(&mut self, items: &[T], at: usize) {
        self.push(FeedEvent::ItemsAppended {
            items: items.to_vec(),
            at,
        });
    }

    fn on_item_inserted(&mut self, item: &T, index: usize) {
        self.push(FeedEvent::ItemInserted {
            item: item.clone(),
            index,
        });
    }

    fn on_refresh_completed(&mut self) {
        self.push(FeedEvent::RefreshCompleted);
    }

    fn on_no_result(&mut self) {
        self.push(FeedEvent::NoResult);
    }

    fn on_fetch_failed(&mut self, error: &FeedError) {
        self.push(FeedEvent::FetchFailed(error.clone()));
    }
}

/// Forwards every change to a channel; a closed receiver drops events.
impl<T: Clone + Send> FeedObserver<T> for mpsc::UnboundedSender<FeedEvent<T>> {
    fn on_items_replaced(&mut self, items: &[T]) {
        let _ = self.send(FeedEvent::ItemsReplaced(items.to_vec()));
    }

    fn on_items_appended(&mut self, items: &[T], at: usize) {
        let _ = self.send(FeedEvent::ItemsAppended {
            items: items.to_vec(),
            at,
        });
    }

    fn on_item_inserted(&mut self, item: &T, index: usize) {
        let _ = self.send(FeedEvent::ItemInserted {
            item: item.clone(),
            index,
        });
    }

    fn on_refresh_completed(&mut self) {
        let _ = self.send(FeedEvent::RefreshCompleted);
    }

    fn on_no_result(&mut self) {
        let _ = self.send(FeedEvent::NoResult);
    }

    fn on_fetch_failed(&mut self, error: &FeedError) {
        let _ = self.send(FeedEvent::FetchFailed(error.clone()));
    }
}
